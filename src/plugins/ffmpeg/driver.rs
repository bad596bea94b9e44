use async_trait::async_trait;
use std::ffi::OsString;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::core::error::ConversionError;
use crate::plugins::ffmpeg::progress::{parse_duration, ProgressParser};
use crate::plugins::registry::{BackendContext, TranscodeBackend, TranscodeRequest};

/// Lines of stderr kept for error messages.
const STDERR_TAIL_LINES: usize = 8;

#[derive(Debug, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }

    /// Arguments for one conversion. Codec and bitrate are only passed when
    /// set, so ffmpeg's defaults apply otherwise.
    pub fn build_args(req: &TranscodeRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            req.source.clone().into_os_string(),
        ];

        if let Some(r) = req.resolution {
            args.push("-vf".into());
            args.push(format!("scale={}:{}", r.width, r.height).into());
        }
        if let Some(codec) = &req.codec {
            args.push("-c:v".into());
            args.push(codec.into());
        }
        if let Some(bitrate) = &req.bitrate {
            args.push("-b:v".into());
            args.push(bitrate.into());
        }

        args.extend(["-progress", "pipe:1", "-nostats"].map(OsString::from));
        args.push(req.dest.clone().into_os_string());
        args
    }

    async fn probe_duration(&self, req: &TranscodeRequest, ctx: &BackendContext) -> Result<Option<f64>, ConversionError> {
        let out = Command::new(&ctx.ffprobe_bin)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(&req.source)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ConversionError::Spawn {
                program: ctx.ffprobe_bin.display().to_string(),
                source,
            })?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(ConversionError::Probe(tail(&stderr, STDERR_TAIL_LINES).unwrap_or_else(|| out.status.to_string())));
        }
        Ok(parse_duration(&String::from_utf8_lossy(&out.stdout)))
    }
}

fn tail(text: &str, n: usize) -> Option<String> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return None;
    }
    Some(lines[lines.len().saturating_sub(n)..].join("; "))
}

#[async_trait]
impl TranscodeBackend for FfmpegBackend {
    fn name(&self) -> &'static str { "ffmpeg" }

    async fn prepare(&self, ctx: &BackendContext) -> Result<(), ConversionError> {
        for bin in [&ctx.ffmpeg_bin, &ctx.ffprobe_bin] {
            which::which(bin).map_err(|e| ConversionError::Spawn {
                program: bin.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
            })?;
        }
        Ok(())
    }

    async fn transcode(
        &self,
        req: &TranscodeRequest,
        ctx: &BackendContext,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<(), ConversionError> {
        let duration = self.probe_duration(req, ctx).await?;
        debug!(source = %req.source.display(), ?duration, "probed source");
        let parser = ProgressParser::new(duration);

        let args = Self::build_args(req);
        debug!(bin = %ctx.ffmpeg_bin.display(), ?args, "spawning ffmpeg");

        let mut child = Command::new(&ctx.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ConversionError::Spawn {
                program: ctx.ffmpeg_bin.display().to_string(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| ConversionError::Backend("ffmpeg stdout not captured".into()))?;
        let mut stderr = child.stderr.take().ok_or_else(|| ConversionError::Backend("ffmpeg stderr not captured".into()))?;

        // stderr is drained concurrently with the progress pipe.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        on_progress(0);
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(pct) = parser.update_from_line(&line) {
                on_progress(pct);
            }
        }

        let status = child.wait().await?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let detail = tail(&stderr_text, STDERR_TAIL_LINES).unwrap_or_else(|| "no error output".to_string());
            return Err(ConversionError::Backend(format!("ffmpeg exited with {}: {}", status, detail)));
        }

        on_progress(100);
        Ok(())
    }
}
