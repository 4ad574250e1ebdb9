#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandCode {
    Psr = 0x00,
    Pwr = 0x01,
    Pof = 0x02,
    PowerOn = 0x04,
    BtstP = 0x06,
    DeepSleep = 0x07,
    /// Old data RAM
    Dtm1 = 0x10,
    Drf = 0x12,
    /// New data RAM, set bits are black
    Dtm2 = 0x13,
    DualSpi = 0x15,
    Cdi = 0x50,
    Tcon = 0x60,
    Tres = 0x61,
    GetStatus = 0x71,
}

const PSR_DATA: [u8; 1] = [0x1F]; // KW mode, OTP LUT
const PWR_DATA: [u8; 4] = [0x07, 0x07, 0x28, 0x17];
const BTST_P_DATA: [u8; 4] = [0x17, 0x17, 0x28, 0x17];
const DEEP_SLEEP_DATA: [u8; 1] = [0xA5];
const DUAL_SPI_DATA: [u8; 1] = [0x00];
const CDI_DATA: [u8; 2] = [0x10, 0x07];
const TCON_DATA: [u8; 1] = [0x22];

/// Border floating, written before power off.
pub const CDI_SLEEP_DATA: [u8; 1] = [0xF7];

impl CommandCode {
    pub fn cmd(self) -> u8 {
        self as u8
    }

    /// Fixed parameter bytes, if the command has any.
    pub fn data(&self) -> Option<&'static [u8]> {
        match self {
            CommandCode::Psr => Some(&PSR_DATA),
            CommandCode::Pwr => Some(&PWR_DATA),
            CommandCode::Pof => None,
            CommandCode::PowerOn => None,
            CommandCode::BtstP => Some(&BTST_P_DATA),
            CommandCode::DeepSleep => Some(&DEEP_SLEEP_DATA),
            CommandCode::Dtm1 => None, // the frame itself
            CommandCode::Drf => None,
            CommandCode::Dtm2 => None, // the frame itself
            CommandCode::DualSpi => Some(&DUAL_SPI_DATA),
            CommandCode::Cdi => Some(&CDI_DATA),
            CommandCode::Tcon => Some(&TCON_DATA),
            CommandCode::Tres => None, // depends on geometry, see `resolution_data`
            CommandCode::GetStatus => None,
        }
    }
}

/// TRES payload: source (width) then gate (height), big-endian 16 bit each.
pub fn resolution_data(width: u32, height: u32) -> [u8; 4] {
    let [_, _, w_hi, w_lo] = width.to_be_bytes();
    let [_, _, h_hi, h_lo] = height.to_be_bytes();
    [w_hi, w_lo, h_hi, h_lo]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_for_7in5() {
        assert_eq!(resolution_data(800, 480), [0x03, 0x20, 0x01, 0xE0]);
    }

    #[test]
    fn frame_commands_carry_no_fixed_data() {
        for code in [CommandCode::Dtm1, CommandCode::Dtm2, CommandCode::Tres] {
            assert_eq!(code.data(), None);
        }
        assert_eq!(CommandCode::DeepSleep.data(), Some(&[0xA5][..]));
    }
}
