mod config;
mod request;

use std::path::PathBuf;

use anyhow::Context;
use channelcast_core::FfmpegVersion;
use channelcast_transcoder::capabilities::{FfmpegCapabilities, HardwareCapabilities};
use channelcast_transcoder::{CommandGenerator, ffprobe, probe};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use request::BuildRequest;

#[derive(Parser, Debug)]
#[command(name = "ffpipe", about = "Compile transcode requests into ffmpeg invocations")]
struct Cli {
    /// Transcoder configuration (JSON); `CHANNELCAST_*` variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the command line for a JSON build request
    Build(BuildArgs),
    /// Detect ffmpeg features and hardware capabilities
    Probe,
    /// Run ffprobe on a file or URL
    Media {
        /// File path or URL
        locator: String,
    },
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Build request (JSON)
    #[arg(short, long)]
    request: PathBuf,

    /// Detect capabilities instead of reading them from the request
    #[arg(long)]
    probe: bool,

    /// Build the error screen for the request instead of its media
    #[arg(long)]
    error_screen: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Build(args) => {
            let text = std::fs::read_to_string(&args.request)
                .with_context(|| format!("failed to read {}", args.request.display()))?;
            let request: BuildRequest =
                serde_json::from_str(&text).context("failed to parse build request")?;

            let (ffmpeg, hardware) = if args.probe {
                detect(&config).await
            } else {
                (
                    request.ffmpeg.clone().unwrap_or_default(),
                    request.hardware.clone().unwrap_or_default(),
                )
            };

            let pipeline = request
                .build(&config, &ffmpeg, &hardware, args.error_screen)
                .context("failed to build pipeline")?;
            let command = CommandGenerator::generate(&pipeline);
            info!(arguments = command.arguments.len(), "pipeline built");
            println!("{}", serde_json::to_string_pretty(&command)?);
        }
        Command::Probe => {
            let (ffmpeg, hardware) = detect(&config).await;
            let report = serde_json::json!({ "ffmpeg": ffmpeg, "hardware": hardware });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Media { locator } => {
            let media = ffprobe::probe(&config.ffprobe_path, &locator)
                .await
                .with_context(|| format!("failed to probe {locator}"))?;
            println!("{}", serde_json::to_string_pretty(&media)?);
        }
    }

    Ok(())
}

async fn detect(
    config: &channelcast_transcoder::TranscoderConfig,
) -> (FfmpegCapabilities, HardwareCapabilities) {
    let ffmpeg = probe::detect_ffmpeg(&config.ffmpeg_path).await;
    if ffmpeg.version == FfmpegVersion::default() {
        info!("ffmpeg version unknown, treating as oldest");
    }
    let hardware = probe::detect_hardware(config, &ffmpeg).await;
    (ffmpeg, hardware)
}
