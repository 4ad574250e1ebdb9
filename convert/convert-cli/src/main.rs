use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing::level_filters::LevelFilter;
use trmnl_convert::{open_image, to_monochrome, RenderOptions};
use trmnl_epd::EPD_7IN5_V2;

/// Convert an image into a packed 1-bit frame for the 7.5" panel.
#[derive(Parser)]
struct Args {
    file_input: PathBuf,
    file_output: PathBuf,
    /// Also write the thresholded image as a PNG
    #[clap(long)]
    preview: Option<PathBuf>,
    /// Invert the threshold (dark mode)
    #[clap(short, long)]
    dark: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_max_level(LevelFilter::INFO).init();

    let args = Args::parse();
    let img = open_image(&args.file_input)?;
    let mono = to_monochrome(&img, EPD_7IN5_V2, RenderOptions::new(args.dark));
    info!("Thresholded to {}x{}", EPD_7IN5_V2.width(), EPD_7IN5_V2.height());

    if let Some(preview) = args.preview {
        mono.to_gray_image().save(&preview)?;
        info!("Saved preview {}", preview.display());
    }

    let frame = mono.pack();
    fs::write(&args.file_output, frame.as_bytes())?;
    info!("Wrote {} bytes to {}", frame.len(), args.file_output.display());
    Ok(())
}
