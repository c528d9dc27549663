use image::imageops::{self, FilterType};
use ndarray::Array4;

use crate::error::ClassificationError;
use crate::models::{InputTensor, PixelGrid, INPUT_SIZE};

/// Bilinear resampling with antialiasing on downscale.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Resizes to 28×28 (aspect ratio is not kept), rescales intensities to
/// `[0, 1]` and adds the batch and channel axes.
pub fn prepare(grid: &PixelGrid) -> Result<InputTensor, ClassificationError> {
    if grid.width() == 0 || grid.height() == 0 {
        return Err(ClassificationError::Preprocess(format!(
            "image has no pixels ({}x{})",
            grid.width(),
            grid.height()
        )));
    }

    let resized = imageops::resize(&grid.0, INPUT_SIZE, INPUT_SIZE, RESIZE_FILTER);
    let side = INPUT_SIZE as usize;
    let data: Vec<f32> = resized
        .into_raw()
        .into_iter()
        .map(|p| f32::from(p) / 255.0)
        .collect();

    Array4::from_shape_vec((1, 1, side, side), data)
        .map(InputTensor)
        .map_err(|e| ClassificationError::Preprocess(e.to_string()))
}
