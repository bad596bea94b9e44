//! Parser for ffmpeg's `-progress` key=value stream.

/// Turns `-progress` lines into a completion percentage against a known duration.
#[derive(Debug, Clone)]
pub struct ProgressParser {
    duration_us: Option<u64>,
}

impl ProgressParser {
    pub fn new(duration_secs: Option<f64>) -> Self {
        let duration_us = duration_secs
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| (d * 1_000_000.0) as u64);
        Self { duration_us }
    }

    /// Returns the percentage carried by `line`, if any.
    pub fn update_from_line(&self, line: &str) -> Option<u8> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            "progress" if value == "end" => Some(100),
            // ffmpeg reports microseconds under both names.
            "out_time_us" | "out_time_ms" => value.parse::<u64>().ok().and_then(|us| self.percent_of(us)),
            "out_time" => parse_clock(value).and_then(|us| self.percent_of(us)),
            _ => None,
        }
    }

    fn percent_of(&self, elapsed_us: u64) -> Option<u8> {
        let total = self.duration_us?;
        let pct = (elapsed_us as u128 * 100 / total as u128).min(100);
        Some(pct as u8)
    }
}

/// `HH:MM:SS.micros` to microseconds.
fn parse_clock(s: &str) -> Option<u64> {
    let mut parts = s.trim().splitn(3, ':');
    let h: u64 = parts.next()?.parse().ok()?;
    let m: u64 = parts.next()?.parse().ok()?;
    let sec: f64 = parts.next()?.parse().ok()?;
    if sec < 0.0 {
        return None;
    }
    Some((h * 3600 + m * 60) * 1_000_000 + (sec * 1_000_000.0) as u64)
}

/// Parses `ffprobe ... -of default=noprint_wrappers=1:nokey=1` duration output.
/// `N/A` and empty output mean the duration is unknown.
pub fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(|l| l.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}
