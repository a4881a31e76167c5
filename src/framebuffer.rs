//! Flat RGB pixel store mirroring the display's pixel grid.
//!
//! Pixels are stored row-major, three bytes per pixel in R, G, B order, so
//! pixel `(x, y)` lives at byte offset `(x + y * side) * 3`. The buffer is
//! allocated once at construction and only ever overwritten in place; its
//! length is `3 * side^2` for its whole lifetime.

use crate::{Color, DisplaySize, Error, Result};
use image::RgbImage;

pub struct FrameBuffer {
    size: DisplaySize,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    /// Create a buffer filled with `background`.
    pub fn new(size: DisplaySize, background: Color) -> Self {
        let mut buffer = Self {
            size,
            pixels: vec![0; size.frame_byte_count()],
        };
        buffer.fill(background);
        buffer
    }

    pub fn size(&self) -> DisplaySize {
        self.size
    }

    pub fn side(&self) -> i32 {
        self.size.side() as i32
    }

    /// Raw bytes in device order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Overwrite every pixel with `color`.
    pub fn fill(&mut self, color: impl Into<Color>) {
        let rgb = color.into().to_array();
        for chunk in self.pixels.chunks_exact_mut(3) {
            chunk.copy_from_slice(&rgb);
        }
    }

    /// Same as [`fill`](Self::fill).
    pub fn clear(&mut self, color: impl Into<Color>) {
        self.fill(color);
    }

    /// Set the pixel at `(x, y)`. Coordinates off the panel are ignored.
    pub fn write_pixel(&mut self, x: i32, y: i32, color: impl Into<Color>) {
        let side = self.side();
        if !(0..side).contains(&x) || !(0..side).contains(&y) {
            tracing::debug!(
                "Invalid coordinates given: ({}, {}) (maximum coordinates are ({}, {}))",
                x,
                y,
                side - 1,
                side - 1
            );
            return;
        }

        self.write_pixel_at_index(x + y * side, color);
    }

    /// Set the pixel at a flat index (`x + y * side`). Out-of-range indices are ignored.
    pub fn write_pixel_at_index(&mut self, index: i32, color: impl Into<Color>) {
        let pixel_count = self.size.pixel_count() as i32;
        if !(0..pixel_count).contains(&index) {
            tracing::debug!(
                "Invalid index given: {} (maximum index is {})",
                index,
                pixel_count - 1
            );
            return;
        }

        let offset = index as usize * 3;
        self.pixels[offset..offset + 3].copy_from_slice(&color.into().to_array());
    }

    /// Read back the pixel at `(x, y)`, or `None` if it is off the panel.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        let side = self.side();
        if !(0..side).contains(&x) || !(0..side).contains(&y) {
            return None;
        }
        let offset = ((x + y * side) * 3) as usize;
        let rgb = &self.pixels[offset..offset + 3];
        Some(Color::new(rgb[0], rgb[1], rgb[2]))
    }

    /// Replace the whole buffer with a raw RGB frame of exactly `3 * side^2` bytes.
    pub fn load_raw(&mut self, data: &[u8]) -> Result<()> {
        let expected = self.pixels.len();
        if data.len() != expected {
            return Err(Error::FrameSize {
                expected,
                actual: data.len(),
            });
        }
        self.pixels.copy_from_slice(data);
        Ok(())
    }

    /// Copy the buffer into an image, e.g. for a PNG preview.
    pub fn to_image(&self) -> RgbImage {
        let side = self.size.side();
        RgbImage::from_fn(side, side, |x, y| {
            let offset = ((x + y * side) * 3) as usize;
            image::Rgb([
                self.pixels[offset],
                self.pixels[offset + 1],
                self.pixels[offset + 2],
            ])
        })
    }
}
