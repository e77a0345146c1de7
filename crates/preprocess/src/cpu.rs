use crate::PreprocessResult;
use crate::config::{DEFAULT_INPUT_SIZE, LETTERBOX_COLOR};
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use ndarray::{Array, IxDyn};
use std::default::Default;

/// Geometry of an aspect-preserving resize into the model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub new_width: u32,
    pub new_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Letterboxes RGB images into the model input tensor.
///
/// Every call allocates its own canvas and tensor, so one preprocessor can be
/// shared by concurrent requests.
#[derive(Debug, Clone)]
pub struct CpuPreProcessor {
    pub input_size: (u32, u32),
}

impl CpuPreProcessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self { input_size }
    }

    /// Preprocess RGB pixel data in HWC order.
    pub fn preprocess(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<PreprocessResult> {
        let _s = span!("preprocess");

        if width == 0 || height == 0 {
            anyhow::bail!("Cannot preprocess an empty {}x{} image", width, height);
        }

        let (input_width, input_height) = self.input_size;
        if input_width == 0 || input_height == 0 {
            anyhow::bail!(
                "Model input size {}x{} has no area",
                input_width,
                input_height
            );
        }

        let expected_size = width as usize * height as usize * 3;
        if pixels.len() != expected_size {
            anyhow::bail!(
                "Buffer size mismatch: expected {}, got {} bytes",
                expected_size,
                pixels.len()
            );
        }

        tracing::trace!(width, height, "Preprocessing image");

        let letterbox = self.letterbox(width, height);
        let canvas = self.resize_and_letterbox(pixels, width, height, &letterbox)?;
        let tensor = self.normalize(&canvas)?;

        Ok(PreprocessResult {
            tensor,
            scale: letterbox.scale,
            offset_x: letterbox.offset_x as f32,
            offset_y: letterbox.offset_y as f32,
        })
    }

    /// Compute the scale and padding that fit `width`x`height` into the input size.
    pub fn letterbox(&self, width: u32, height: u32) -> Letterbox {
        let (input_width, input_height) = self.input_size;
        let scale =
            (input_width as f32 / width as f32).min(input_height as f32 / height as f32);

        let new_width = ((width as f32 * scale).round() as u32).clamp(1, input_width);
        let new_height = ((height as f32 * scale).round() as u32).clamp(1, input_height);

        Letterbox {
            scale,
            new_width,
            new_height,
            offset_x: (input_width - new_width) / 2,
            offset_y: (input_height - new_height) / 2,
        }
    }

    fn resize_and_letterbox(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        letterbox: &Letterbox,
    ) -> anyhow::Result<Vec<u8>> {
        let _s = span!("resize_and_letterbox");

        let src = ImageRef::new(width, height, pixels, PixelType::U8x3)?;
        let mut resized = Image::new(letterbox.new_width, letterbox.new_height, PixelType::U8x3);

        Resizer::new().resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        let (input_width, input_height) = self.input_size;
        let mut canvas = vec![LETTERBOX_COLOR; input_width as usize * input_height as usize * 3];

        let resized_data = resized.buffer();
        let stride = input_width as usize * 3;
        let row_len = letterbox.new_width as usize * 3;

        for y in 0..letterbox.new_height as usize {
            let src_row = y * row_len;
            let dst_row = (y + letterbox.offset_y as usize) * stride
                + letterbox.offset_x as usize * 3;

            canvas[dst_row..dst_row + row_len]
                .copy_from_slice(&resized_data[src_row..src_row + row_len]);
        }

        Ok(canvas)
    }

    fn normalize(&self, canvas: &[u8]) -> anyhow::Result<Array<f32, IxDyn>> {
        let _s = span!("normalize");

        let (width, height) = (self.input_size.0 as usize, self.input_size.1 as usize);
        let spatial = width * height;

        let mut output = vec![0.0f32; 3 * spatial];

        for (i, px) in canvas.chunks_exact(3).enumerate() {
            output[i] = px[0] as f32 / 255.0;
            output[i + spatial] = px[1] as f32 / 255.0;
            output[i + 2 * spatial] = px[2] as f32 / 255.0;
        }

        Ok(Array::from_shape_vec(
            IxDyn(&[1, 3, height, width]),
            output,
        )?)
    }
}

impl Default for CpuPreProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}
