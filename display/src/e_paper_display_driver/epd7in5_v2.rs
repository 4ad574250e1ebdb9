use crate::display_constants::{SPI_CHUNK_BYTES, SPI_SPEED_HZ};
use crate::e_paper_display_driver::command_code::{resolution_data, CommandCode, CDI_SLEEP_DATA};
use crate::e_paper_display_driver::gpio_pin::PinConfig;
use crate::Panel;
use embedded_hal::spi::SpiDevice;
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{SPIError, SpidevDevice};
use rppal::gpio::Level::{High, Low};
use rppal::gpio::{Error as GpioError, Gpio, InputPin, OutputPin};
use std::io;
use std::thread::sleep;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};
use trmnl_convert::{FrameSizeError, PackedFrame, PanelGeometry};

/// A full refresh takes about four seconds; anything past this is a wedged panel.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum EpdError {
    #[error(transparent)]
    Spi(#[from] SPIError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Gpio(#[from] GpioError),
    #[error(transparent)]
    FrameSize(#[from] FrameSizeError),
    #[error("panel still busy after {0:?}")]
    BusyTimeout(Duration),
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum SendMode {
    Command,
    Data,
}

/// Waveshare 7.5" V2 (800x480, black/white) on hardware SPI.
pub struct Epd7in5V2 {
    spi: SpidevDevice,
    data_or_cmd_pin: OutputPin,
    reset_pin: OutputPin,
    busy_pin: InputPin,
    power_pin: Option<OutputPin>,
    send_mode: SendMode,
    geometry: PanelGeometry,
}

impl Epd7in5V2 {
    /// Claim the bus and pins, reset the controller and run the boot sequence.
    pub fn initialize(geometry: PanelGeometry, pins: &PinConfig) -> Result<Self, EpdError> {
        let mut spi = SpidevDevice::open(&pins.spi_device)?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(SPI_SPEED_HZ)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.configure(&options)?;

        let gpio = Gpio::new()?;
        let data_or_cmd_pin = gpio.get(pins.data_command)?.into_output_low();
        let reset_pin = gpio.get(pins.reset)?.into_output_high();
        let busy_pin = gpio.get(pins.busy)?.into_input();
        let power_pin = match pins.power {
            Some(pin) => Some(gpio.get(pin)?.into_output_high()),
            None => None,
        };
        debug!("Pins claimed: {:?}", pins);

        let mut this = Epd7in5V2 {
            spi,
            data_or_cmd_pin,
            reset_pin,
            busy_pin,
            power_pin,
            send_mode: SendMode::Command,
            geometry,
        };
        this.init()?;
        Ok(this)
    }

    fn init(&mut self) -> Result<(), EpdError> {
        info!("EPD init...");
        self.reset();

        self.send_command(CommandCode::BtstP)?;
        self.send_command(CommandCode::Pwr)?;
        self.send_command(CommandCode::PowerOn)?;
        sleep(Duration::from_millis(100));
        self.wait_for_not_busy()?;

        self.send_command(CommandCode::Psr)?;
        let resolution = resolution_data(self.geometry.width(), self.geometry.height());
        self.send_command_with(CommandCode::Tres, &resolution)?;
        for command in [CommandCode::DualSpi, CommandCode::Cdi, CommandCode::Tcon] {
            self.send_command(command)?;
        }
        info!("EPD init done");
        Ok(())
    }

    fn reset(&mut self) {
        for (level, millis) in [(High, 20), (Low, 2), (High, 20)] {
            debug!("Reset: {:?}", level);
            self.reset_pin.write(level);
            sleep(Duration::from_millis(millis));
        }
    }

    fn set_send_mode(&mut self, send_mode: SendMode) {
        if send_mode == self.send_mode {
            return;
        }
        match send_mode {
            SendMode::Command => self.data_or_cmd_pin.set_low(),
            SendMode::Data => self.data_or_cmd_pin.set_high(),
        }
        self.send_mode = send_mode;
    }

    fn spi_write(&mut self, bytes: &[u8]) -> Result<(), EpdError> {
        if bytes.len() > 32 {
            debug!("Spi write {} bytes", bytes.len());
        } else {
            debug!("Spi write {:02X?}", bytes);
        }
        for chunk in bytes.chunks(SPI_CHUNK_BYTES) {
            self.spi.write(chunk)?;
        }
        Ok(())
    }

    fn send_command(&mut self, command_code: CommandCode) -> Result<(), EpdError> {
        self.send_command_with(command_code, command_code.data().unwrap_or_default())
    }

    fn send_command_with(&mut self, command_code: CommandCode, data: &[u8]) -> Result<(), EpdError> {
        self.set_send_mode(SendMode::Command);
        self.spi_write(&[command_code.cmd()])?;
        if !data.is_empty() {
            self.set_send_mode(SendMode::Data);
            self.spi_write(data)?;
        }
        Ok(())
    }

    fn wait_for_not_busy(&mut self) -> Result<(), EpdError> {
        debug!("waiting for not busy");
        let started = Instant::now();
        loop {
            self.send_command(CommandCode::GetStatus)?;
            if self.busy_pin.read() == High {
                break;
            }
            if started.elapsed() > BUSY_TIMEOUT {
                return Err(EpdError::BusyTimeout(BUSY_TIMEOUT));
            }
            sleep(Duration::from_millis(10));
        }
        sleep(Duration::from_millis(20));
        Ok(())
    }

    fn turn_display_on(&mut self) -> Result<(), EpdError> {
        info!("Write DRF");
        self.send_command(CommandCode::Drf)?;
        sleep(Duration::from_millis(100));
        self.wait_for_not_busy()?;
        info!("Display refreshed");
        Ok(())
    }

    fn check_len(&self, len: usize) -> Result<(), FrameSizeError> {
        let expected = self.geometry.frame_len();
        if len != expected {
            return Err(FrameSizeError {
                expected,
                provided: len,
            });
        }
        Ok(())
    }
}

impl Panel for Epd7in5V2 {
    type Error = EpdError;

    fn geometry(&self) -> PanelGeometry {
        self.geometry
    }

    fn clear(&mut self, fill: u8) -> Result<(), EpdError> {
        let len = self.geometry.frame_len();
        self.send_command_with(CommandCode::Dtm1, &vec![fill; len])?;
        self.send_command_with(CommandCode::Dtm2, &vec![!fill; len])?;
        self.turn_display_on()
    }

    fn write_frame(&mut self, frame: &PackedFrame) -> Result<(), EpdError> {
        self.check_len(frame.len())?;
        let old: Vec<u8> = frame.as_bytes().iter().map(|b| !b).collect();
        self.send_command_with(CommandCode::Dtm1, &old)?;
        self.send_command_with(CommandCode::Dtm2, frame.as_bytes())?;
        self.turn_display_on()
    }

    fn sleep(&mut self) -> Result<(), EpdError> {
        self.send_command_with(CommandCode::Cdi, &CDI_SLEEP_DATA)?;
        self.send_command(CommandCode::Pof)?;
        self.wait_for_not_busy()?;
        self.send_command(CommandCode::DeepSleep)?;
        sleep(Duration::from_secs(2));
        Ok(())
    }
}

impl Drop for Epd7in5V2 {
    fn drop(&mut self) {
        self.data_or_cmd_pin.set_low();
        self.reset_pin.set_low();
        if let Some(power_pin) = self.power_pin.as_mut() {
            power_pin.set_low();
        }
    }
}
