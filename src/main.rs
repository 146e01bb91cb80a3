use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, Level};

use lineart::{config::Config, workflow::Workflow};

#[derive(Parser)]
#[command(
    name = "lineart",
    version,
    about = "Turn a video into a line-art rendering",
    long_about = "lineart draws the Canny edges of every frame as thick lines on a flat background, puts the original audio back and optionally previews the result."
)]
struct Cli {
    /// Input video file
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for the converted video, extracted audio and final output
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recompute outputs that already exist
    #[arg(long)]
    overwrite: bool,

    /// Skip the preview window
    #[arg(long)]
    no_preview: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting lineart v{}", env!("CARGO_PKG_VERSION"));

    let config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    let workflow = Workflow::new(config)
        .with_overwrite(cli.overwrite)
        .with_preview(!cli.no_preview);

    let report = match workflow.run(&cli.input, &cli.output_dir).await {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e.user_message());
            return Err(e.into());
        }
    };

    info!("Converted video: {:?} ({:?})", report.paths.converted, report.converted);
    info!("Audio: {:?} ({:?})", report.paths.audio, report.audio);
    info!("Final output: {:?} ({:?})", report.paths.final_video, report.muxed);
    Ok(())
}
