use image::imageops::FilterType;
use ndarray::Array4;
use std::path::Path;

use crate::error::PipelineError;

/// Spatial resolution a model expects. Channels are always RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    pub height: u32,
    pub width: u32,
}

impl InputShape {
    pub const CHANNELS: usize = 3;

    pub fn square(size: u32) -> Self {
        Self {
            height: size,
            width: size,
        }
    }

    /// Full batch shape, `(1, H, W, 3)`.
    pub fn batch_dims(&self) -> [usize; 4] {
        [1, self.height as usize, self.width as usize, Self::CHANNELS]
    }
}

/// Single-image NHWC batch with intensities in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct ImageTensor {
    data: Array4<f32>,
}

impl ImageTensor {
    pub fn from_array(data: Array4<f32>) -> Self {
        Self { data }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    /// Contiguous row-major values, for handing to a model runtime.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    pub fn check_shape(&self, expected: InputShape) -> Result<(), PipelineError> {
        let dims = expected.batch_dims();
        if self.shape() != dims {
            return Err(PipelineError::ShapeMismatch {
                expected: dims,
                actual: self.shape().to_vec(),
            });
        }
        Ok(())
    }
}

pub fn normalize(path: &Path, shape: InputShape) -> Result<ImageTensor, PipelineError> {
    let decode_error = |reason: String| PipelineError::ImageDecode {
        path: path.to_path_buf(),
        reason,
    };

    let image = image::ImageReader::open(path)
        .map_err(|e| decode_error(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?
        .decode()
        .map_err(|e| decode_error(e.to_string()))?;

    // to_rgb8 folds grayscale, alpha and 16-bit sources down to 8-bit RGB.
    let rgb = image.to_rgb8();
    let resized = image::imageops::resize(&rgb, shape.width, shape.height, FilterType::Triangle);
    log::debug!(
        "Normalized {} from {}x{} to {}x{}",
        path.display(),
        rgb.width(),
        rgb.height(),
        shape.width,
        shape.height
    );

    let data = Array4::from_shape_fn(shape.batch_dims(), |(_, y, x, c)| {
        resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    });
    Ok(ImageTensor::from_array(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn assert_normalized(tensor: &ImageTensor, shape: InputShape) {
        assert_eq!(tensor.shape(), shape.batch_dims());
        assert!(tensor.data().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn rgb_png_is_resized_and_scaled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.png");
        RgbImage::from_pixel(300, 200, Rgb([255, 0, 51])).save(&path).unwrap();

        let shape = InputShape::square(128);
        let tensor = normalize(&path, shape).unwrap();
        assert_normalized(&tensor, shape);

        let data = tensor.data();
        assert!((data[[0, 10, 10, 0]] - 1.0).abs() < 1e-6);
        assert!(data[[0, 10, 10, 1]].abs() < 1e-6);
        assert!((data[[0, 10, 10, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn grayscale_and_alpha_sources_become_three_channels() {
        let dir = TempDir::new().unwrap();
        let shape = InputShape {
            height: 150,
            width: 120,
        };

        let gray = dir.path().join("gray.png");
        GrayImage::from_pixel(64, 64, Luma([128])).save(&gray).unwrap();
        let tensor = normalize(&gray, shape).unwrap();
        assert_normalized(&tensor, shape);
        let px = tensor.data()[[0, 0, 0, 0]];
        assert_eq!(px, tensor.data()[[0, 0, 0, 2]]);

        let rgba = dir.path().join("rgba.png");
        RgbaImage::from_pixel(10, 500, Rgba([0, 255, 0, 10])).save(&rgba).unwrap();
        assert_normalized(&normalize(&rgba, shape).unwrap(), shape);

        let deep = dir.path().join("deep.png");
        let sixteen: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(33, 17, Luma([u16::MAX]));
        sixteen.save(&deep).unwrap();
        let tensor = normalize(&deep, shape).unwrap();
        assert_normalized(&tensor, shape);
        assert!((tensor.data()[[0, 5, 5, 1]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn jpeg_with_misleading_extension_still_decodes() {
        let dir = TempDir::new().unwrap();
        let jpeg = dir.path().join("scan.jpg");
        RgbImage::from_pixel(40, 40, Rgb([10, 20, 30])).save(&jpeg).unwrap();
        let renamed = dir.path().join("scan.upload");
        std::fs::rename(&jpeg, &renamed).unwrap();

        let shape = InputShape::square(32);
        assert_normalized(&normalize(&renamed, shape).unwrap(), shape);
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an image").unwrap();

        let err = normalize(file.path(), InputShape::square(128)).unwrap_err();
        assert!(matches!(err, PipelineError::ImageDecode { .. }));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let err = normalize(&dir.path().join("absent.png"), InputShape::square(128)).unwrap_err();
        assert!(matches!(err, PipelineError::ImageDecode { .. }));
    }

    #[test]
    fn check_shape_rejects_other_resolutions() {
        let tensor = ImageTensor::from_array(Array4::zeros((1, 64, 64, 3)));
        assert!(tensor.check_shape(InputShape::square(64)).is_ok());
        let err = tensor.check_shape(InputShape::square(128)).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch { .. }));
    }
}
