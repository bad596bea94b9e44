mod core;
mod i18n;
mod plugins;

use crate::core::catalog;
use crate::core::engine::Engine;
use crate::core::error::ValidationError;
use crate::core::events::{EngineEvent, ProgressEvent, ProgressScope};
use crate::core::model::{is_bitrate_token, ConversionSettings, ItemStatus, JobStatus, Resolution};
use crate::core::paths::display_name;
use clap::{Arg, ArgAction, ArgMatches, Command};
use i18n::{get_messages, Locale};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use plugins::registry::{BackendContext, ConvertCliConfig, PluginRegistry};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

fn build_cli(registry: &PluginRegistry) -> Command {
    let convert = Command::new("convert")
        .about("Convert one or more video files")
        .arg(
            Arg::new("inputs")
                .help("Input video files")
                .action(ArgAction::Append)
                .num_args(1..)
                .required(true),
        )
        .arg(
            Arg::new("out_dir")
                .long("out-dir")
                .help("Existing output directory")
                .required(true)
                .num_args(1),
        )
        .arg(
            Arg::new("preset")
                .long("preset")
                .help(format!("Start from a named preset: {}", catalog::preset_names().join(", ")))
                .num_args(1),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .help("Output container extension, e.g. .mp4 or mkv")
                .num_args(1),
        )
        .arg(
            Arg::new("resolution")
                .long("resolution")
                .help("original, 1080p, 720p, 480p, 360p, 240p or WxH")
                .num_args(1),
        )
        .arg(
            Arg::new("codec")
                .long("codec")
                .help("Video codec id or label, or `auto` for the backend default")
                .num_args(1),
        )
        .arg(
            Arg::new("bitrate")
                .long("bitrate")
                .help("Video bitrate like 1000k or a preset label, or `auto` for the backend default")
                .num_args(1),
        )
        .arg(
            Arg::new("batch")
                .long("batch")
                .help("Convert every input with the same settings and report a batch summary")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .help("Transcoding backend")
                .default_value("ffmpeg")
                .num_args(1),
        )
        .arg(
            Arg::new("locale")
                .long("locale")
                .help("Terminal output language (en, zh)")
                .default_value("en")
                .num_args(1),
        );

    let convert = registry.augment_convert_command(convert);
    let check_tools = registry.augment_convert_command(
        Command::new("check-tools").about("Check that the transcoding tools can be found"),
    );

    Command::new("converter")
        .about("Video converter with batch processing - plugin based")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .help("Debug logging (RUST_LOG takes precedence)")
                .action(ArgAction::SetTrue),
        )
        .subcommand(convert)
        .subcommand(Command::new("presets").about("List conversion presets and option tables"))
        .subcommand(check_tools)
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "OrangeConverter=debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Preset first, then explicit flags on top. Without a preset the catalog
/// defaults apply: `.mp4`, libx264, 1000k, original size.
fn resolve_settings(m: &ArgMatches) -> Result<ConversionSettings, ValidationError> {
    let mut settings = match m.get_one::<String>("preset") {
        Some(name) => catalog::preset_settings(name)?,
        None => ConversionSettings {
            output_format: catalog::DEFAULT_OUTPUT_FORMAT.to_string(),
            resolution: None,
            bitrate: Some(catalog::DEFAULT_BITRATE.to_string()),
            codec: Some(catalog::DEFAULT_CODEC.to_string()),
        },
    };

    if let Some(f) = m.get_one::<String>("format") {
        settings.output_format = f.clone();
    }
    if let Some(r) = m.get_one::<String>("resolution") {
        settings.resolution = Resolution::parse(r)?;
    }
    if let Some(c) = m.get_one::<String>("codec") {
        settings.codec = match c.as_str() {
            "auto" => None,
            other => Some(
                catalog::codec_option(other)
                    .ok_or_else(|| ValidationError::UnknownCodec(other.to_string()))?
                    .to_string(),
            ),
        };
    }
    if let Some(b) = m.get_one::<String>("bitrate") {
        settings.bitrate = match b.as_str() {
            "auto" => None,
            other => match catalog::bitrate_option(other) {
                Some(token) => Some(token.to_string()),
                None if is_bitrate_token(other) => Some(other.to_string()),
                None => return Err(ValidationError::InvalidBitrate(other.to_string())),
            },
        };
    }

    ConversionSettings::new(&settings.output_format, settings.resolution, settings.bitrate, settings.codec)
}

fn print_presets() {
    println!("Presets:");
    for p in catalog::CONVERSION_PRESETS {
        let res = p
            .resolution
            .map(|(w, h)| format!("{}x{}", w, h))
            .unwrap_or_else(|| "original".to_string());
        println!("- {} [{} {} {} {}]", p.name, p.format, p.codec, res, p.bitrate);
        println!("  {}", catalog::preset_description(p.name));
    }

    println!();
    println!("Resolutions:");
    for r in catalog::RESOLUTION_PRESETS {
        println!("- {:<10} {}", r.key, r.label);
    }
    println!("Codecs:");
    for (label, id) in catalog::CODEC_OPTIONS {
        println!("- {:<12} {}", id, label);
    }
    println!("Bitrates:");
    for (label, token) in catalog::BITRATE_PRESETS {
        println!("- {:<12} {}", token, label);
    }
    println!("Output formats: {}", catalog::SUPPORTED_OUTPUT_FORMATS.join(" "));
    println!("Input formats: {}", catalog::SUPPORTED_INPUT_FORMATS.join(" "));
}

fn check_tools(registry: &PluginRegistry, m: &ArgMatches) -> anyhow::Result<()> {
    let mut cfg = ConvertCliConfig { backend: "ffmpeg".to_string(), backend_ctx: BackendContext::default() };
    registry.apply_convert_matches(m, &mut cfg)?;
    let msgs = get_messages(Locale::En);

    let mut missing = 0;
    for bin in [&cfg.backend_ctx.ffmpeg_bin, &cfg.backend_ctx.ffprobe_bin] {
        match which::which(bin) {
            Ok(p) => println!("{:<10} {} ({})", bin.display(), msgs.tool_found, p.display()),
            Err(_) => {
                missing += 1;
                println!("{:<10} {}", bin.display(), msgs.tool_missing);
            }
        }
    }
    if missing > 0 {
        anyhow::bail!("{} tool(s) missing", missing);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let registry = PluginRegistry::with_defaults();
    let app = build_cli(&registry);
    let matches = app.get_matches();

    init_tracing(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("convert", m)) => {
            let locale = Locale::parse(m.get_one::<String>("locale").map(String::as_str).unwrap_or("en"));
            let msgs = get_messages(locale);

            let out_dir: PathBuf = m.get_one::<String>("out_dir").map(PathBuf::from).unwrap_or_default();
            let inputs: Vec<PathBuf> = m
                .get_many::<String>("inputs")
                .map(|v| v.map(PathBuf::from).collect())
                .unwrap_or_default();
            let batch_mode = m.get_flag("batch");
            let settings = resolve_settings(m)?;

            let mut cfg = ConvertCliConfig {
                backend: m.get_one::<String>("backend").cloned().unwrap_or_else(|| "ffmpeg".to_string()),
                backend_ctx: BackendContext::default(),
            };
            registry.apply_convert_matches(m, &mut cfg)?;

            let backend = registry.backend(&cfg.backend).ok_or_else(|| {
                anyhow::anyhow!("unknown backend {} (available: {})", cfg.backend, registry.backend_names().join(", "))
            })?;
            backend.prepare(&cfg.backend_ctx).await?;

            let engine = Engine::new(backend, cfg.backend_ctx.clone());
            let mut rx = engine.subscribe();

            let job_id = engine.start(inputs, out_dir, settings, batch_mode).await?;
            println!("{}: {}", msgs.job_started, job_id);

            let ui_job_id = job_id;
            let ui_task = tokio::spawn(async move {
                let mp = MultiProgress::new();
                let sty_item = ProgressStyle::with_template("{prefix} {bar:40.cyan/blue} {pos:>3}% {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar());
                let sty_overall = ProgressStyle::with_template("{prefix} {bar:40.green/white} {pos:>3}%")
                    .unwrap_or_else(|_| ProgressStyle::default_bar());

                let mut bars: HashMap<usize, ProgressBar> = HashMap::new();
                let mut current: Option<usize> = None;
                let mut overall: Option<ProgressBar> = None;
                let mut outcomes: Vec<(String, ItemStatus)> = vec![];

                loop {
                    let evt = match rx.recv().await {
                        Ok(e) => e,
                        Err(RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "progress display fell behind");
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };
                    if evt.job_id() != ui_job_id {
                        continue;
                    }

                    match evt {
                        EngineEvent::JobStatusChanged { job_id, status } => {
                            let _ = mp.println(format!("[{}] {} -> {:?}", msgs.job_prefix, job_id, status));
                            if matches!(status, JobStatus::Completed | JobStatus::Failed) && !outcomes.is_empty() {
                                let _ = mp.println(format!("{}:", msgs.summary_header));
                                for (name, st) in &outcomes {
                                    let label = if *st == ItemStatus::Succeeded { msgs.status_done } else { msgs.status_failed };
                                    let _ = mp.println(format!("- {} {}", label, name));
                                }
                            }
                        }
                        EngineEvent::Job { event, .. } => match event {
                            ProgressEvent::Log(line) => {
                                let _ = mp.println(format!("[{}] {}", msgs.log_prefix, line));
                            }
                            ProgressEvent::ItemStatus { index, input, status } => match status {
                                ItemStatus::Running => {
                                    let pb = mp.add(ProgressBar::new(100));
                                    pb.set_style(sty_item.clone());
                                    pb.set_prefix(format!("[{}]", display_name(&input)));
                                    bars.insert(index, pb);
                                    current = Some(index);
                                }
                                ItemStatus::Succeeded | ItemStatus::Failed => {
                                    if let Some(pb) = bars.remove(&index) {
                                        if status == ItemStatus::Succeeded {
                                            pb.finish_with_message(msgs.status_done);
                                        } else {
                                            pb.abandon_with_message(msgs.status_failed);
                                        }
                                    }
                                    outcomes.push((display_name(&input), status));
                                }
                                ItemStatus::Pending => {}
                            },
                            ProgressEvent::Percent { scope: ProgressScope::Item, value } => {
                                if let Some(pb) = current.and_then(|i| bars.get(&i)) {
                                    pb.set_position(value as u64);
                                }
                            }
                            ProgressEvent::Percent { scope: ProgressScope::Overall, value } => {
                                let pb = overall.get_or_insert_with(|| {
                                    let pb = mp.add(ProgressBar::new(100));
                                    pb.set_style(sty_overall.clone());
                                    pb.set_prefix(format!("[{}]", msgs.overall_label));
                                    pb
                                });
                                pb.set_position(value as u64);
                            }
                        },
                        EngineEvent::Completed { success, message, .. } => {
                            if let Some(pb) = overall.take() {
                                pb.finish();
                            }
                            let prefix = if success { msgs.status_done } else { msgs.error_prefix };
                            let _ = mp.println(format!("[{}] {}", prefix, message));
                            break;
                        }
                    }
                }
            });

            let completion = engine.take_completion(job_id).await;
            let _ = ui_task.await;

            println!("{}: {}", msgs.job_finished, job_id);
            match completion {
                Some(c) if c.success => {}
                Some(c) => {
                    for f in c.batch.iter().flat_map(|b| b.failed_items.iter()) {
                        eprintln!("[{}] {}: {}", msgs.error_prefix, display_name(&f.input_path), f.error_message);
                    }
                    anyhow::bail!("{}", c.message)
                }
                None => anyhow::bail!("job {} vanished", job_id),
            }
        }
        Some(("presets", _)) => print_presets(),
        Some(("check-tools", m)) => check_tools(&registry, m)?,
        _ => {}
    }

    Ok(())
}
