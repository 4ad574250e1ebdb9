//! Panel capability for the Waveshare 7.5" V2 e-paper display.
//!
//! [`Panel`] is what the rest of the system drives; [`Epd7in5V2`] is the
//! hardware implementation over Linux spidev and Raspberry Pi GPIO.

mod display_constants;
pub mod e_paper_display_driver;

pub use crate::display_constants::EPD_7IN5_V2;
pub use crate::e_paper_display_driver::epd7in5_v2::{Epd7in5V2, EpdError};
pub use crate::e_paper_display_driver::gpio_pin::{GpioPin, PinConfig};

use trmnl_convert::{PackedFrame, PanelGeometry};

/// Fill byte for [`Panel::clear`] that leaves the panel white.
pub const CLEAR_WHITE: u8 = 0xFF;

/// A bistable monochrome panel.
pub trait Panel {
    type Error: std::error::Error + Send + Sync + 'static;

    fn geometry(&self) -> PanelGeometry;

    /// Fill the whole panel. `fill` is panel-native: set bits are white.
    fn clear(&mut self, fill: u8) -> Result<(), Self::Error>;

    /// Show a frame. Its length must equal `geometry().frame_len()`.
    fn write_frame(&mut self, frame: &PackedFrame) -> Result<(), Self::Error>;

    /// Enter low-power deep sleep.
    fn sleep(&mut self) -> Result<(), Self::Error>;
}
