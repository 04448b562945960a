use std::fmt;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader, RgbImage, RgbaImage};
use serde::Serialize;

use super::error::Result;

/// How an image is fitted into the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Whole image visible, letterboxed when the aspect ratios differ.
    Fit,
    /// Canvas fully covered, cropped when the aspect ratios differ.
    #[default]
    Fill,
}

impl ScaleMode {
    pub fn scale(self, canvas: (u32, u32), image: (u32, u32)) -> f32 {
        let x_scale = canvas.0 as f32 / image.0.max(1) as f32;
        let y_scale = canvas.1 as f32 / image.1.max(1) as f32;
        match self {
            ScaleMode::Fit => x_scale.min(y_scale),
            ScaleMode::Fill => x_scale.max(y_scale),
        }
    }

    /// Scale and centre `image` inside `canvas`.
    pub fn place(self, canvas: (u32, u32), image: (u32, u32)) -> Placement {
        let scale = self.scale(canvas, image);
        let width = ((image.0 as f32 * scale).round() as u32).max(1);
        let height = ((image.1 as f32 * scale).round() as u32).max(1);
        Placement {
            scale,
            x: (canvas.0 as i64 - width as i64) / 2,
            y: (canvas.1 as i64 - height as i64) / 2,
            width,
            height,
        }
    }
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleMode::Fit => f.write_str("fit"),
            ScaleMode::Fill => f.write_str("fill"),
        }
    }
}

/// Where a scaled image lands on the canvas. `x`/`y` go negative when cropping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub scale: f32,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Decode an image and rotate/flip it according to its EXIF orientation tag.
pub fn load_image_respecting_exif(path: &Path) -> Result<DynamicImage> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Centre-crop to the target aspect ratio, then resize to exactly `target_w`x`target_h`.
pub fn clamp_aspect_resize(image: &DynamicImage, target_w: u32, target_h: u32) -> RgbImage {
    let (src_w, src_h) = image.dimensions();
    if src_w == target_w && src_h == target_h {
        return image.to_rgb8();
    }

    let src_ratio = src_w as f32 / src_h as f32;
    let target_ratio = target_w as f32 / target_h as f32;

    let crop_image: DynamicImage = if (src_ratio - target_ratio).abs() < 1e-6 {
        image.clone()
    } else if src_ratio > target_ratio {
        let desired_width = ((target_ratio * src_h as f32).round() as u32).clamp(1, src_w);
        let x = (src_w - desired_width) / 2;
        image.crop_imm(x, 0, desired_width, src_h)
    } else {
        let desired_height = ((src_w as f32 / target_ratio).round() as u32).clamp(1, src_h);
        let y = (src_h - desired_height) / 2;
        image.crop_imm(0, y, src_w, desired_height)
    };

    crop_image
        .resize_exact(target_w, target_h, FilterType::Triangle)
        .to_rgb8()
}

pub fn resize_for_placement(image: &RgbaImage, placement: &Placement) -> RgbaImage {
    if image.dimensions() == (placement.width, placement.height) {
        return image.clone();
    }
    imageops::resize(image, placement.width, placement.height, FilterType::Triangle)
}

/// RGBA8 frame buffer the render loop composites into.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        debug_assert_eq!(frame.len(), width as usize * height as usize * 4);
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn clear(&mut self) {
        for px in self.frame.chunks_exact_mut(4) {
            px.copy_from_slice(&[0, 0, 0, 255]);
        }
    }

    /// Add `image * weight` onto the canvas at (`x`, `y`).
    ///
    /// Drawing two layers with weights `1 - b` and `b` over a cleared canvas gives a
    /// cross-fade whose weights sum to one everywhere, letterbox bars included.
    pub fn blend(&mut self, image: &RgbaImage, x: i64, y: i64, weight: f32) {
        let weight = weight.clamp(0.0, 1.0);
        if weight <= 0.0 {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + image.width() as i64).min(self.width as i64);
        let y1 = (y + image.height() as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let canvas_width = self.width as usize;
        for cy in y0..y1 {
            let sy = (cy - y) as u32;
            for cx in x0..x1 {
                let sx = (cx - x) as u32;
                let src = image.get_pixel(sx, sy).0;
                let a = weight * (src[3] as f32 / 255.0);
                let offset = (cy as usize * canvas_width + cx as usize) * 4;
                let dst = &mut self.frame[offset..offset + 4];
                for c in 0..3 {
                    let v = dst[c] as f32 + src[c] as f32 * a;
                    dst[c] = v.round().clamp(0.0, 255.0) as u8;
                }
                dst[3] = 255;
            }
        }
    }
}
