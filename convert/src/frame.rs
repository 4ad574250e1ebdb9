use crate::color::Pixel;
use image::{GrayImage, Luma};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid panel geometry {width}x{height}")]
pub struct GeometryError {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("frame is {provided} bytes, panel expects {expected}")]
pub struct FrameSizeError {
    pub expected: usize,
    pub provided: usize,
}

/// Pixel resolution of the target panel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PanelGeometry {
    width: u32,
    height: u32,
}

impl PanelGeometry {
    pub const fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes in a packed frame, one bit per pixel rounded up.
    pub fn frame_len(&self) -> usize {
        self.pixel_count().div_ceil(8)
    }
}

/// A bitmap at exactly panel resolution, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonochromeBitmap {
    geometry: PanelGeometry,
    pixels: Vec<Pixel>,
}

impl MonochromeBitmap {
    pub fn from_fn<F>(geometry: PanelGeometry, mut pixel_at: F) -> Self
    where
        F: FnMut(u32, u32) -> Pixel,
    {
        let mut pixels = Vec::with_capacity(geometry.pixel_count());
        for y in 0..geometry.height {
            for x in 0..geometry.width {
                pixels.push(pixel_at(x, y));
            }
        }
        Self { geometry, pixels }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.geometry.width || y >= self.geometry.height {
            return None;
        }
        let index = y as usize * self.geometry.width as usize + x as usize;
        self.pixels.get(index).copied()
    }

    /// Pack MSB-first, ink as a set bit.
    ///
    /// Pixel `(x, y)` lands in byte `(y * width + x) / 8` at bit `7 - x % 8`.
    /// When `width` is not a multiple of 8 the bit only follows `x`, so
    /// neighbouring rows can share a bit; the panel width is always aligned.
    pub fn pack(&self) -> PackedFrame {
        let width = self.geometry.width as usize;
        let mut bytes = vec![0u8; self.geometry.frame_len()];
        for (i, pixel) in self.pixels.iter().enumerate() {
            if *pixel == Pixel::Ink {
                bytes[i / 8] |= 1 << (7 - (i % width) % 8);
            }
        }
        PackedFrame { bytes }
    }

    /// Black and white rendering, handy for checking a conversion by eye.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.geometry.width, self.geometry.height, |x, y| {
            match self.pixel(x, y) {
                Some(Pixel::Ink) => Luma([0]),
                _ => Luma([255]),
            }
        })
    }
}

/// The device-ready frame buffer handed to the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFrame {
    bytes: Vec<u8>,
}

impl PackedFrame {
    /// Wrap bytes produced elsewhere, e.g. a frame file written by the converter CLI.
    pub fn from_bytes(geometry: PanelGeometry, bytes: Vec<u8>) -> Result<Self, FrameSizeError> {
        if bytes.len() != geometry.frame_len() {
            return Err(FrameSizeError {
                expected: geometry.frame_len(),
                provided: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
