use image::Rgba;

/// Gray level at or above which a pixel is paper (unless inverted).
pub const THRESHOLD: u8 = 128;

/// The two states of a monochrome panel pixel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Pixel {
    /// Dark / on. Packs to a set bit.
    Ink,
    /// Light / off. Packs to a clear bit.
    Paper,
}

/// Rendering choices fixed for the lifetime of the process.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Flip which side of [`THRESHOLD`] maps to ink ("dark mode").
    pub invert_threshold: bool,
}

impl RenderOptions {
    pub fn new(invert_threshold: bool) -> Self {
        Self { invert_threshold }
    }

    pub fn classify(&self, gray: u8) -> Pixel {
        let light = gray >= THRESHOLD;
        if light != self.invert_threshold {
            Pixel::Paper
        } else {
            Pixel::Ink
        }
    }
}

/// Expand an 8-bit channel to 16 bits, premultiplied by alpha.
fn expand(channel: u8, alpha: u8) -> u32 {
    (channel as u32 * 257) * alpha as u32 / 255
}

/// ITU-R BT.601 luma on 16-bit channels, reduced to 8 bits.
pub fn luma(pixel: &Rgba<u8>) -> u8 {
    let [r, g, b, a] = pixel.0;
    let (r, g, b) = (expand(r, a), expand(g, a), expand(b, a));
    ((r * 299 + g * 587 + b * 114) / 1000 >> 8) as u8
}
