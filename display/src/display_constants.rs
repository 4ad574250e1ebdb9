use trmnl_convert::PanelGeometry;

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 480;

/// Waveshare 7.5" V2, landscape.
pub const EPD_7IN5_V2: PanelGeometry = match PanelGeometry::new(WIDTH, HEIGHT) {
    Ok(geometry) => geometry,
    Err(_) => panic!("zero panel dimension"),
};

pub const SPI_DEVICE: &str = "/dev/spidev0.0";
pub const SPI_SPEED_HZ: u32 = 4_000_000;
/// Default spidev `bufsiz`; larger transfers are rejected by the kernel.
pub const SPI_CHUNK_BYTES: usize = 4_096;
