use crate::core::catalog;
use crate::core::error::ValidationError;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

pub type JobId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Succeeded | ItemStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::InvalidResolution { width, height });
        }
        Ok(Self { width, height })
    }

    /// Accepts a catalog key (`720p`, `original`, ...) or an explicit `WxH`.
    /// `Ok(None)` means "keep the source dimensions".
    pub fn parse(raw: &str) -> Result<Option<Self>, ValidationError> {
        let s = raw.trim();
        if let Some(preset) = catalog::resolution_preset(s) {
            return Ok(preset.size.map(|(width, height)| Self { width, height }));
        }

        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| ValidationError::UnparsableResolution(raw.to_string()))?;
        let width = w.trim().parse::<u32>()
            .map_err(|_| ValidationError::UnparsableResolution(raw.to_string()))?;
        let height = h.trim().parse::<u32>()
            .map_err(|_| ValidationError::UnparsableResolution(raw.to_string()))?;
        Self::new(width, height).map(Some)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The settings profile applied to every item of one job.
///
/// `codec` and `bitrate` stay `None` unless chosen explicitly; the backend
/// then falls back to its own defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSettings {
    pub output_format: String,
    pub resolution: Option<Resolution>,
    pub bitrate: Option<String>,
    pub codec: Option<String>,
}

impl ConversionSettings {
    pub fn new(
        output_format: &str,
        resolution: Option<Resolution>,
        bitrate: Option<String>,
        codec: Option<String>,
    ) -> Result<Self, ValidationError> {
        let settings = Self { output_format: normalize_extension(output_format), resolution, bitrate, codec };
        settings.validate()?;
        Ok(settings)
    }

    /// Checks a profile however it was built. `output_format` must already be
    /// normalized (leading dot, lower case).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !catalog::SUPPORTED_OUTPUT_FORMATS.contains(&self.output_format.as_str()) {
            return Err(ValidationError::UnsupportedOutputFormat(self.output_format.clone()));
        }
        if let Some(r) = self.resolution {
            Resolution::new(r.width, r.height)?;
        }
        if let Some(b) = &self.bitrate {
            if !is_bitrate_token(b) {
                return Err(ValidationError::InvalidBitrate(b.clone()));
            }
        }
        if let Some(c) = &self.codec {
            if !catalog::CODEC_IDS.contains(&c.as_str()) {
                return Err(ValidationError::UnknownCodec(c.clone()));
            }
        }
        Ok(())
    }
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            output_format: catalog::DEFAULT_OUTPUT_FORMAT.to_string(),
            resolution: None,
            bitrate: None,
            codec: None,
        }
    }
}

/// `mp4`, `.MP4` and `.mp4` all name the same container.
pub fn normalize_extension(raw: &str) -> String {
    let s = raw.trim().to_ascii_lowercase();
    if s.starts_with('.') { s } else { format!(".{}", s) }
}

/// `<integer>k`, e.g. `500k`.
pub fn is_bitrate_token(s: &str) -> bool {
    match s.strip_suffix('k') {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJobItem {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub status: ItemStatus,
    pub error_message: Option<String>,
}

impl ConversionJobItem {
    pub fn new(input_path: PathBuf, output_path: PathBuf) -> Self {
        Self { input_path, output_path, status: ItemStatus::Pending, error_message: None }
    }

    /// Moves the item forward in its lifecycle. Terminal items never change again.
    pub fn transition(&mut self, next: ItemStatus, error_message: Option<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        let allowed = matches!(
            (self.status, next),
            (ItemStatus::Pending, ItemStatus::Running)
                | (ItemStatus::Running, ItemStatus::Succeeded)
                | (ItemStatus::Running, ItemStatus::Failed)
        );
        if allowed {
            self.status = next;
            self.error_message = error_message;
        }
        allowed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub input_path: PathBuf,
    pub error_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub total_count: usize,
    pub succeeded_count: usize,
    pub failed_items: Vec<FailedItem>,
}

impl BatchResult {
    pub fn new(total_count: usize) -> Self {
        Self { total_count, ..Default::default() }
    }

    pub fn failed_count(&self) -> usize {
        self.failed_items.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed_items.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut s = format!(
            "Batch conversion completed: {}/{} successful",
            self.succeeded_count, self.total_count
        );
        if !self.failed_items.is_empty() {
            s.push_str(&format!(", {} failed", self.failed_items.len()));
        }
        s
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleOutcome {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_reject_unknown_format_and_bad_tokens() {
        assert!(matches!(
            ConversionSettings::new(".gif", None, None, None),
            Err(ValidationError::UnsupportedOutputFormat(f)) if f == ".gif"
        ));
        assert!(matches!(
            ConversionSettings::new(".mp4", None, Some("1000".into()), None),
            Err(ValidationError::InvalidBitrate(_))
        ));
        assert!(matches!(
            ConversionSettings::new(".mp4", None, None, Some("h264".into())),
            Err(ValidationError::UnknownCodec(_))
        ));
        assert!(matches!(
            ConversionSettings::new(".mp4", Some(Resolution { width: 0, height: 480 }), None, None),
            Err(ValidationError::InvalidResolution { width: 0, height: 480 })
        ));
    }

    #[test]
    fn settings_normalize_format() {
        let s = ConversionSettings::new("MKV", None, Some("2000k".into()), Some("libx265".into())).unwrap();
        assert_eq!(s.output_format, ".mkv");
        assert_eq!(s.bitrate.as_deref(), Some("2000k"));
    }

    #[test]
    fn hand_built_settings_are_checked_too() {
        assert!(ConversionSettings::default().validate().is_ok());

        let raw = ConversionSettings { output_format: "mp4".into(), ..ConversionSettings::default() };
        assert!(matches!(raw.validate(), Err(ValidationError::UnsupportedOutputFormat(_))));

        let zero = ConversionSettings { resolution: Some(Resolution { width: 0, height: 0 }), ..ConversionSettings::default() };
        assert!(matches!(zero.validate(), Err(ValidationError::InvalidResolution { .. })));

        let bitrate = ConversionSettings { bitrate: Some("fast".into()), ..ConversionSettings::default() };
        assert!(matches!(bitrate.validate(), Err(ValidationError::InvalidBitrate(_))));

        let codec = ConversionSettings { codec: Some("prores".into()), ..ConversionSettings::default() };
        assert!(matches!(codec.validate(), Err(ValidationError::UnknownCodec(_))));
    }

    #[test]
    fn bitrate_tokens() {
        assert!(is_bitrate_token("500k"));
        assert!(is_bitrate_token("10000k"));
        assert!(!is_bitrate_token("k"));
        assert!(!is_bitrate_token("5M"));
        assert!(!is_bitrate_token("1.5k"));
    }

    #[test]
    fn resolution_parse_accepts_keys_and_dimensions() {
        assert_eq!(Resolution::parse("original").unwrap(), None);
        assert_eq!(Resolution::parse("720p").unwrap(), Some(Resolution { width: 1280, height: 720 }));
        assert_eq!(Resolution::parse("1080x1920").unwrap(), Some(Resolution { width: 1080, height: 1920 }));
        assert!(Resolution::parse("wide").is_err());
        assert!(Resolution::parse("0x720").is_err());
    }

    #[test]
    fn item_lifecycle_is_one_way() {
        let mut item = ConversionJobItem::new("a.mov".into(), "out/a.mp4".into());
        assert!(!item.transition(ItemStatus::Succeeded, None));
        assert!(item.transition(ItemStatus::Running, None));
        assert!(item.transition(ItemStatus::Failed, Some("boom".into())));
        assert!(!item.transition(ItemStatus::Running, None));
        assert_eq!(item.status, ItemStatus::Failed);
        assert_eq!(item.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn summary_mentions_failures_only_when_present() {
        let mut r = BatchResult::new(3);
        r.succeeded_count = 3;
        assert_eq!(r.summary(), "Batch conversion completed: 3/3 successful");
        r.succeeded_count = 2;
        r.failed_items.push(FailedItem { input_path: "b.avi".into(), error_message: "x".into() });
        assert_eq!(r.summary(), "Batch conversion completed: 2/3 successful, 1 failed");
    }
}
