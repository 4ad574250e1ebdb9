pub mod color;
pub mod frame;

pub use crate::color::{luma, Pixel, RenderOptions, THRESHOLD};
pub use crate::frame::{FrameSizeError, GeometryError, MonochromeBitmap, PackedFrame, PanelGeometry};

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageDecoder, ImageError, ImageReader};
use std::path::Path;
use tracing::debug;

/// Decode an image file, sniffing the format from its content and applying
/// any EXIF orientation.
pub fn open_image(file: &Path) -> Result<DynamicImage, ImageError> {
    let mut decoder = ImageReader::open(file)?
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    debug!("Opened image {} ({}x{})", file.display(), img.width(), img.height());
    Ok(img)
}

/// Resize to the panel with nearest-neighbor sampling and threshold the luma.
pub fn to_monochrome(
    source: &DynamicImage,
    geometry: PanelGeometry,
    options: RenderOptions,
) -> MonochromeBitmap {
    let rgba = source.to_rgba8();
    let resized = if rgba.dimensions() == (geometry.width(), geometry.height()) {
        rgba
    } else {
        imageops::resize(&rgba, geometry.width(), geometry.height(), FilterType::Nearest)
    };
    MonochromeBitmap::from_fn(geometry, |x, y| {
        options.classify(luma(resized.get_pixel(x, y)))
    })
}

/// Turn any decoded image into a frame for the panel. Never fails.
pub fn convert(
    source: &DynamicImage,
    geometry: PanelGeometry,
    options: RenderOptions,
) -> PackedFrame {
    to_monochrome(source, geometry, options).pack()
}
