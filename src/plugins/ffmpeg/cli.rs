use crate::plugins::registry::{CliPlugin, ConvertCliConfig};
use clap::{Arg, ArgMatches, Command};

pub struct FfmpegCliPlugin;

impl FfmpegCliPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl CliPlugin for FfmpegCliPlugin {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn augment_convert_command(&self, cmd: Command) -> Command {
        cmd.arg(
            Arg::new("ffmpeg_bin")
                .long("ffmpeg-bin")
                .help_heading("FFMPEG")
                .help("Path to the ffmpeg binary")
                .default_value("ffmpeg")
                .num_args(1),
        )
        .arg(
            Arg::new("ffprobe_bin")
                .long("ffprobe-bin")
                .help_heading("FFMPEG")
                .help("Path to the ffprobe binary (used to read source duration)")
                .default_value("ffprobe")
                .num_args(1),
        )
    }

    fn apply_convert_matches(&self, matches: &ArgMatches, cfg: &mut ConvertCliConfig) -> anyhow::Result<()> {
        if let Some(v) = matches.get_one::<String>("ffmpeg_bin") {
            cfg.backend_ctx.ffmpeg_bin = v.into();
        }
        if let Some(v) = matches.get_one::<String>("ffprobe_bin") {
            cfg.backend_ctx.ffprobe_bin = v.into();
        }
        Ok(())
    }
}
