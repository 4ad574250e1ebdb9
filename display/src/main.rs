use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;
use tracing::info;
use tracing::metadata::LevelFilter;
use trmnl_convert::PackedFrame;
use trmnl_epd::{Epd7in5V2, Panel, PinConfig, CLEAR_WHITE, EPD_7IN5_V2};

/// Push a packed frame file to the panel, then put it to sleep.
#[derive(Debug, Parser)]
struct Args {
    file: PathBuf,
    /// Seconds to leave the image up before clearing
    #[clap(long)]
    clear_after: Option<u64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_max_level(LevelFilter::DEBUG).init();
    let args = Args::parse();
    info!("Reading file...");
    let frame = PackedFrame::from_bytes(EPD_7IN5_V2, fs::read(&args.file)?)?;

    info!("File loaded. Init driver.");
    let mut device = Epd7in5V2::initialize(EPD_7IN5_V2, &PinConfig::default())?;
    info!("Device init. Clearing display");
    device.clear(CLEAR_WHITE)?;
    info!("Cleared. Sending image...");
    device.write_frame(&frame)?;

    if let Some(secs) = args.clear_after {
        info!("Image sent. Waiting {}s", secs);
        sleep(Duration::from_secs(secs));
        device.clear(CLEAR_WHITE)?;
    }

    info!("Sleeping display...");
    device.sleep()?;
    info!("Complete");
    Ok(())
}
