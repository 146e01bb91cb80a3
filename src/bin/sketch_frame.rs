// Apply the line-art pipeline to one still image

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use lineart::{
    config::Config,
    lineart::{FrameFilter, LineArtFilter},
    video::Frame,
};

#[derive(Parser)]
#[command(name = "sketch_frame", version, about = "Render one image (PNG/JPEG) as line art")]
struct Cli {
    /// Input image
    input: PathBuf,

    /// Output PNG
    #[arg(short, long, default_value = "sketch.png")]
    output: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let image = image::open(&cli.input)
        .with_context(|| format!("could not read {}", cli.input.display()))?
        .to_rgb8();
    let frame = Frame::new(image);
    frame.ensure_not_empty()?;

    let filter = LineArtFilter::new(&config.pipeline);
    let mask = filter.mask(&frame)?;
    info!(
        "{}x{}: {} edge pixels after dilation",
        frame.width(),
        frame.height(),
        mask.edge_count()
    );

    let rendered = filter.apply(&frame)?;
    rendered
        .save_png(&cli.output)
        .with_context(|| format!("could not write {}", cli.output.display()))?;

    info!("Saved {}", cli.output.display());
    Ok(())
}
