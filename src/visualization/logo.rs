//! Logo overlay, scaled into a box given in figure fractions.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::{plotting_error, RenderError, Result};

/// Pixel rectangle on the canvas, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Fit an image of `image_dims` into `bounds` (`[left, bottom, width, height]`
/// as fractions of the canvas, measured from the bottom-left corner) keeping
/// its aspect ratio, anchored to the box's top-right corner.
pub fn place_in_box(image_dims: (u32, u32), bounds: [f64; 4], canvas: (u32, u32)) -> Placement {
    let (cw, ch) = (f64::from(canvas.0), f64::from(canvas.1));
    let [left, bottom, width, height] = bounds;

    let box_left = left * cw;
    let box_top = ch - (bottom + height) * ch;
    let box_w = width * cw;
    let box_h = height * ch;

    let (iw, ih) = (f64::from(image_dims.0.max(1)), f64::from(image_dims.1.max(1)));
    let scale = (box_w / iw).min(box_h / ih);
    let w = (iw * scale).round().max(1.0);
    let h = (ih * scale).round().max(1.0);

    Placement {
        x: (box_left + box_w - w).round() as i32,
        y: box_top.round() as i32,
        width: w as u32,
        height: h as u32,
    }
}

/// A decoded logo image.
#[derive(Debug, Clone)]
pub struct Logo {
    image: RgbaImage,
}

impl Logo {
    /// Decode the image at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .map_err(|source| RenderError::Logo {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        Ok(Self { image })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Scale the logo into `bounds` and blend it over `root`.
    pub fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>, bounds: [f64; 4]) -> Result<()> {
        let placement = place_in_box(self.dimensions(), bounds, root.dim_in_pixel());
        let scaled = imageops::resize(
            &self.image,
            placement.width,
            placement.height,
            FilterType::Triangle,
        );

        for (px, py, pixel) in scaled.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            if a == 0 {
                continue;
            }
            let color = RGBColor(r, g, b).mix(f64::from(a) / 255.0);
            root.draw_pixel(
                (placement.x + px as i32, placement.y + py as i32),
                &color,
            )
            .map_err(plotting_error)?;
        }
        Ok(())
    }
}
