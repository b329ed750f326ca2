use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use splatseq::logging::{LoggingConfig, init_logging};

#[derive(Parser, Debug)]
#[command(
    name = "splatseq",
    version,
    about = "Encode per-object splat attribute images into per-attribute videos"
)]
struct Cli {
    /// Input file or directory of point-cloud files (not needed with --rebuild).
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output root (holds sog/, sequences/ and videos/).
    #[arg(long)]
    output: PathBuf,

    /// Converter executable, invoked as `<converter> [args...] <input> <meta.json>`.
    #[arg(long, default_value = "splat-transform")]
    converter: PathBuf,

    /// Extra argument passed to the converter before the paths (repeatable).
    #[arg(long = "converter-arg", allow_hyphen_values = true)]
    converter_args: Vec<String>,

    /// Input extension to pick up (repeatable). Defaults to ply, splat, ksplat and spz.
    #[arg(long = "input-ext")]
    input_exts: Vec<String>,

    /// Drop inputs whose conversion fails instead of aborting.
    #[arg(long, default_value_t = false)]
    skip_failed_inputs: bool,

    /// Forced video width (requires --height).
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Forced video height (requires --width).
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// x264 CRF, 0..=51 (lower is better).
    #[arg(long, default_value_t = 15)]
    quality: u32,

    /// Keyframe interval in frames.
    #[arg(long, default_value_t = 30)]
    keyint: u32,

    /// Output frame rate.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Backdrop colour as RRGGBB.
    #[arg(long, default_value = "000000")]
    background: String,

    /// Skip the ffprobe frame-count check.
    #[arg(long, default_value_t = false)]
    no_verify: bool,

    /// Fallback used when ffmpeg cannot decode a sequence.
    #[arg(long, value_enum, default_value_t = FallbackArg::Image)]
    fallback: FallbackArg,

    /// Parallel converter/encoder jobs (defaults to available cores).
    #[arg(long)]
    jobs: Option<usize>,

    /// Delete existing converter output instead of suffixing new directories.
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Re-sequence and re-encode existing sog/ output without converting.
    #[arg(long, default_value_t = false)]
    rebuild: bool,

    /// Fail on frame index mismatches instead of warning.
    #[arg(long, default_value_t = false)]
    strict_frames: bool,

    /// Default log filter (overridden by RUST_LOG).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log as JSON lines.
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FallbackArg {
    Image,
    Dwebp,
    None,
}

impl From<FallbackArg> for splatseq::FallbackKind {
    fn from(value: FallbackArg) -> Self {
        match value {
            FallbackArg::Image => Self::Image,
            FallbackArg::Dwebp => Self::Dwebp,
            FallbackArg::None => Self::None,
        }
    }
}

fn config_from_cli(cli: Cli) -> anyhow::Result<splatseq::PipelineConfig> {
    let mut cfg = splatseq::PipelineConfig::new(cli.output);
    cfg.input = cli.input;
    cfg.converter.program = cli.converter;
    cfg.converter.extra_args = cli.converter_args;
    if !cli.input_exts.is_empty() {
        cfg.converter.input_exts = cli
            .input_exts
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
    }
    if cli.skip_failed_inputs {
        cfg.converter.on_failure = splatseq::ConvertFailurePolicy::Skip;
    }

    cfg.encode.frame_size = match (cli.width, cli.height) {
        (Some(width), Some(height)) => Some(splatseq::Canvas { width, height }),
        (None, None) => None,
        _ => anyhow::bail!("--width and --height must be given together"),
    };
    cfg.encode.quality = cli.quality;
    cfg.encode.keyframe_interval = cli.keyint;
    cfg.encode.fps = cli.fps;
    cfg.encode.background = splatseq::Rgb8::parse_hex(&cli.background)?;
    cfg.encode.verify = !cli.no_verify;

    cfg.fallback = cli.fallback.into();
    cfg.jobs = cli.jobs;
    cfg.overwrite = cli.overwrite;
    cfg.rebuild = cli.rebuild;
    if cli.strict_frames {
        cfg.mismatch_policy = splatseq::MismatchPolicy::Fail;
    }
    Ok(cfg)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LoggingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    let cfg = config_from_cli(cli)?;
    cfg.validate()?;
    if !splatseq::is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg is required on PATH to encode attribute videos");
    }

    let executors = splatseq::Executors::from_config(&cfg);
    let summary = splatseq::run(&cfg, &executors)?;

    eprintln!(
        "encoded {} attribute videos for {} frames ({} objects)",
        summary.videos.len(),
        summary.frames,
        summary.objects
    );
    if !summary.fallback_used.is_empty() {
        eprintln!("fallback used for: {}", summary.fallback_used.join(", "));
    }
    if !summary.mismatches.is_empty() {
        eprintln!(
            "warning: {} frame index mismatches; attribute videos may be out of sync",
            summary.mismatches.len()
        );
        for m in &summary.mismatches {
            eprintln!("  {m}");
        }
    }
    for video in &summary.missing_videos {
        eprintln!("warning: missing video {}", video.display());
    }
    eprintln!("wrote {}", summary.manifest.display());
    Ok(())
}
