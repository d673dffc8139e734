use std::path::Path;

use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use half::f16;
use image::{DynamicImage, ImageReader, RgbImage};
use ndarray::Array4;

use crate::error::{ClassifyError, Result};
use crate::model::{ElementKind, InputSpec, Layout};

#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    pub mean: [f32; 3],
    pub std: [f32; 3],
    /// Fixed `(width, height)`; the model's own input size is used when unset.
    pub size: Option<(u32, u32)>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            mean: [127.5; 3],
            std: [127.5; 3],
            size: None,
        }
    }
}

/// Batch-of-one input tensor in the element type the model expects.
#[derive(Debug, Clone)]
pub enum InputTensor {
    U8(Array4<u8>),
    F32(Array4<f32>),
    F16(Array4<f16>),
}

impl InputTensor {
    pub fn shape(&self) -> &[usize] {
        match self {
            InputTensor::U8(a) => a.shape(),
            InputTensor::F32(a) => a.shape(),
            InputTensor::F16(a) => a.shape(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Processor {
    pub config: PreprocessConfig,
}

pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| ClassifyError::io(path, e))?;
    Ok(reader.decode()?)
}

impl Processor {
    /// Create a new instance of the Processor struct
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Converts to RGB and resizes to exactly `width` x `height`, ignoring aspect ratio.
    pub fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> Result<RgbImage> {
        let src = DynamicImage::ImageRgb8(image.to_rgb8());
        if src.width() == width && src.height() == height {
            return Ok(src.into_rgb8());
        }

        let mut dst = Image::new(width, height, PixelType::U8x3);
        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::CatmullRom));
        Resizer::new().resize(&src, &mut dst, &options)?;

        RgbImage::from_raw(width, height, dst.buffer().to_vec()).ok_or_else(|| {
            ClassifyError::UnsupportedInput(format!(
                "resized buffer does not match {width}x{height}"
            ))
        })
    }

    /// Resizes and lays out the image as the tensor described by `spec`.
    /// u8 models get raw pixels; float models get `(pixel - mean) / std`.
    pub fn preprocess(&self, image: &DynamicImage, spec: &InputSpec) -> Result<InputTensor> {
        let (width, height) = self.config.size.unwrap_or((spec.width, spec.height));
        let rgb = self.resize(image, width, height)?;

        let mean = self.config.mean;
        let std = self.config.std;
        let normalize = |c: usize, p: u8| (p as f32 - mean[c]) / std[c];

        let tensor = match spec.kind {
            ElementKind::U8 => InputTensor::U8(fill(&rgb, spec.layout, |_, p| p)),
            ElementKind::F32 => InputTensor::F32(fill(&rgb, spec.layout, normalize)),
            ElementKind::F16 => InputTensor::F16(fill(&rgb, spec.layout, |c, p| {
                f16::from_f32(normalize(c, p))
            })),
        };
        Ok(tensor)
    }
}

fn fill<T>(rgb: &RgbImage, layout: Layout, value: impl Fn(usize, u8) -> T) -> Array4<T> {
    let (w, h) = (rgb.width() as usize, rgb.height() as usize);
    match layout {
        Layout::Nhwc => Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
            value(c, rgb.get_pixel(x as u32, y as u32)[c])
        }),
        Layout::Nchw => Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
            value(c, rgb.get_pixel(x as u32, y as u32)[c])
        }),
    }
}
