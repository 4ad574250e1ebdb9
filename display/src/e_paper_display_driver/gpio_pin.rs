use crate::display_constants::SPI_DEVICE;
use std::path::PathBuf;

/// BCM pin numbers used by the Waveshare e-Paper HAT.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum GpioPin {
    /// Serial communication chip select, driven by spidev as CE0
    SerialSelectPin = 8,

    /// Data/command control signal, write command (Command) when the level is low; write data (Data/parameter) when the level is high
    DataCommandPin = 25,
    /// Reset, active low
    ResetPin = 17,
    /// This pin indicates the driver status. Low while busy.
    BusyPin = 24,
    /// Panel power switch on HAT rev 2.3 and later
    PowerPin = 18,
}

impl From<GpioPin> for u8 {
    fn from(value: GpioPin) -> Self {
        value as u8
    }
}

/// Where the panel is wired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinConfig {
    /// spidev node; its chip select line is the panel's CS
    pub spi_device: PathBuf,
    pub reset: u8,
    pub data_command: u8,
    pub busy: u8,
    pub power: Option<u8>,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            spi_device: PathBuf::from(SPI_DEVICE),
            reset: GpioPin::ResetPin.into(),
            data_command: GpioPin::DataCommandPin.into(),
            busy: GpioPin::BusyPin.into(),
            power: Some(GpioPin::PowerPin.into()),
        }
    }
}
