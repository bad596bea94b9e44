use async_trait::async_trait;
use crate::core::error::ConversionError;
use crate::core::model::Resolution;
use clap::{ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct BackendContext {
    pub ffmpeg_bin: PathBuf,
    pub ffprobe_bin: PathBuf,
}

impl Default for BackendContext {
    fn default() -> Self {
        Self { ffmpeg_bin: "ffmpeg".into(), ffprobe_bin: "ffprobe".into() }
    }
}

/// One call into the transcoding engine. Optional fields that are `None`
/// must not be passed to the engine at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub resolution: Option<Resolution>,
    pub bitrate: Option<String>,
    pub codec: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConvertCliConfig {
    pub backend: String,
    pub backend_ctx: BackendContext,
}

pub trait CliPlugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn augment_convert_command(&self, cmd: Command) -> Command;
    fn apply_convert_matches(&self, matches: &ArgMatches, cfg: &mut ConvertCliConfig) -> anyhow::Result<()>;
}

#[async_trait]
pub trait TranscodeBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Optional: check that the engine is usable before a job starts.
    async fn prepare(&self, _ctx: &BackendContext) -> Result<(), ConversionError> {
        Ok(())
    }

    /// Converts one file. `on_progress` receives 0..=100.
    async fn transcode(
        &self,
        req: &TranscodeRequest,
        ctx: &BackendContext,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<(), ConversionError>;
}

pub struct PluginRegistry {
    backends: Vec<Arc<dyn TranscodeBackend>>,
    cli_plugins: Vec<Box<dyn CliPlugin>>,
}

impl PluginRegistry {
    pub fn with_defaults() -> Self {
        let mut reg = Self { backends: vec![], cli_plugins: vec![] };

        reg.backends.push(Arc::new(crate::plugins::ffmpeg::driver::FfmpegBackend::new()));

        reg.cli_plugins.push(Box::new(crate::plugins::ffmpeg::cli::FfmpegCliPlugin::new()));
        reg
    }

    pub fn augment_convert_command(&self, cmd: Command) -> Command {
        self.cli_plugins
            .iter()
            .fold(cmd, |c, p| p.augment_convert_command(c))
    }

    pub fn apply_convert_matches(&self, matches: &ArgMatches, cfg: &mut ConvertCliConfig) -> anyhow::Result<()> {
        for p in &self.cli_plugins {
            tracing::debug!(plugin = p.name(), "applying cli options");
            p.apply_convert_matches(matches, cfg)?;
        }
        Ok(())
    }

    pub fn backend(&self, name: &str) -> Option<Arc<dyn TranscodeBackend>> {
        self.backends.iter().find(|b| b.name() == name).cloned()
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }
}
