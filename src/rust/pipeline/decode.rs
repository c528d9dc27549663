use image::{DynamicImage, GrayImage, Luma};

use crate::error::DecodeError;
use crate::models::{MediaType, PixelGrid};

/// Decodes `bytes` as the declared encoding and forces single-channel
/// grayscale, whatever the source colour model.
///
/// Media-type admission is the caller's job; this only checks that the
/// data really is the declared format.
pub fn decode(bytes: &[u8], declared: MediaType) -> Result<PixelGrid, DecodeError> {
    let actual = image::guess_format(bytes).map_err(DecodeError::Unidentified)?;
    if actual != declared.image_format() {
        return Err(DecodeError::FormatMismatch {
            declared: declared.as_str(),
            actual: actual.to_mime_type().to_string(),
        });
    }

    let img = image::load_from_memory_with_format(bytes, actual).map_err(DecodeError::Malformed)?;
    Ok(PixelGrid(to_gray(img)))
}

/// ITU-R 601-2 luma: `L = (299 R + 587 G + 114 B) / 1000`, rounded.
///
/// Colour images go through this transform; single-channel sources are only
/// narrowed to 8 bits and alpha is dropped.
pub fn to_gray(img: DynamicImage) -> GrayImage {
    if !img.color().has_color() {
        return img.to_luma8();
    }
    let rgb = img.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000;
        Luma([luma as u8])
    })
}
