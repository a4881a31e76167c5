//! Drawing primitives built on the frame buffer's pixel writes.
//!
//! Nothing here checks bounds itself except the image blit; every pixel goes
//! through [`FrameBuffer::write_pixel`], which drops anything off the panel.
//! Shapes that hang over an edge are therefore clipped, never rejected.

use crate::glyph::{GLYPH_ADVANCE, GLYPH_WIDTH, GlyphResolver};
use crate::{Color, Error, FrameBuffer, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage};
use std::collections::BTreeSet;
use std::path::Path;

/// Filter used when an image has to be shrunk to fit the display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMode {
    /// Nearest neighbour, keeps hard pixel edges.
    #[default]
    PixelArt,
    /// Lanczos, for photos.
    Smooth,
}

impl ResampleMode {
    pub fn filter(self) -> FilterType {
        match self {
            ResampleMode::PixelArt => FilterType::Nearest,
            ResampleMode::Smooth => FilterType::Lanczos3,
        }
    }
}

fn lerp(start: i32, end: i32, interpolant: f64) -> f64 {
    start as f64 + interpolant * (i64::from(end) - i64::from(start)) as f64
}

/// Chebyshev distance between two points.
fn minimum_amount_of_steps(start: (i32, i32), stop: (i32, i32)) -> i64 {
    let dx = (i64::from(start.0) - i64::from(stop.0)).abs();
    let dy = (i64::from(start.1) - i64::from(stop.1)).abs();
    dx.max(dy)
}

/// The point drawn at `step` of `steps`, rounded half-to-even.
fn line_point(start: (i32, i32), stop: (i32, i32), step: i64, steps: i64) -> (i32, i32) {
    let interpolant = if steps == 0 {
        0.0
    } else {
        step as f64 / steps as f64
    };
    // Interpolating between two i32 values stays in range; `as` saturates regardless.
    (
        lerp(start.0, stop.0, interpolant).round_ties_even() as i32,
        lerp(start.1, stop.1, interpolant).round_ties_even() as i32,
    )
}

/// Steps along one axis whose rounded coordinate may land in `[0, side)`.
///
/// Widened by half a pixel plus one step on each end; callers still check
/// every point. `None` means the axis never enters the panel.
fn visible_steps(start: i32, end: i32, steps: i64, side: i32) -> Option<(i64, i64)> {
    let delta = i64::from(end) - i64::from(start);
    if delta == 0 {
        return (0..side).contains(&start).then_some((0, steps));
    }

    let scale = steps as f64 / delta as f64;
    let enter = (-0.5 - start as f64) * scale;
    let leave = (side as f64 - 0.5 - start as f64) * scale;
    let (low, high) = if enter <= leave {
        (enter, leave)
    } else {
        (leave, enter)
    };

    let low = (low.floor() as i64).saturating_sub(1).max(0);
    let high = (high.ceil() as i64).saturating_add(1).min(steps);
    (low <= high).then_some((low, high))
}

/// Every pixel covered by the line from `start` to `stop`, both ends included.
///
/// Each axis is interpolated independently in `steps + 1` samples and
/// rounded half-to-even; the set collapses points that round to the same
/// pixel. Iteration order is the set's order, not the drawing direction.
/// The set holds one point per step, so very long lines are expensive; see
/// [`visible_line_points`] for the part that lands on a panel.
pub fn line_points(start: (i32, i32), stop: (i32, i32)) -> BTreeSet<(i32, i32)> {
    let steps = minimum_amount_of_steps(start, stop);
    (0..=steps)
        .map(|step| line_point(start, stop, step, steps))
        .collect()
}

/// The points of [`line_points`] that fall inside a `side` x `side` panel.
///
/// Only the steps that can reach the panel are sampled, so the work is
/// bounded by the panel size however far the endpoints lie outside it.
pub fn visible_line_points(start: (i32, i32), stop: (i32, i32), side: i32) -> BTreeSet<(i32, i32)> {
    let steps = minimum_amount_of_steps(start, stop);
    let (Some(x_steps), Some(y_steps)) = (
        visible_steps(start.0, stop.0, steps, side),
        visible_steps(start.1, stop.1, steps, side),
    ) else {
        return BTreeSet::new();
    };

    let first = x_steps.0.max(y_steps.0);
    let last = x_steps.1.min(y_steps.1);
    (first..=last)
        .map(|step| line_point(start, stop, step, steps))
        .filter(|&(x, y)| (0..side).contains(&x) && (0..side).contains(&y))
        .collect()
}

/// Shrink `image` so it fits a `side` x `side` panel.
///
/// Images that already fit come back untouched. Otherwise `pad` picks between
/// letterboxing onto a black square and a plain aspect-preserving thumbnail.
pub fn fit_to_display(image: DynamicImage, side: u32, mode: ResampleMode, pad: bool) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= side && height <= side {
        return image;
    }

    let resized = image.resize(side, side, mode.filter());
    let fitted = if pad {
        let resized = resized.to_rgb8();
        let mut canvas = RgbImage::new(side, side);
        let x = (side - resized.width()) / 2;
        let y = (side - resized.height()) / 2;
        imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
        DynamicImage::ImageRgb8(canvas)
    } else {
        resized
    };

    tracing::debug!(
        "Resized image to fit on screen: ({}, {}) -> ({}, {})",
        width,
        height,
        fitted.width(),
        fitted.height()
    );
    fitted
}

/// Decode an image file from disk.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.with_guessed_format().map_err(image::ImageError::IoError))
        .and_then(|reader| reader.decode())
        .map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })
}

impl FrameBuffer {
    pub fn draw_line(&mut self, start: (i32, i32), stop: (i32, i32), color: impl Into<Color>) {
        let color = color.into();
        for (x, y) in visible_line_points(start, stop, self.side()) {
            self.write_pixel(x, y, color);
        }
    }

    /// Fill the inclusive rectangle spanned by the two corners.
    ///
    /// Corners given in the wrong order describe an empty rectangle. Both
    /// ranges are clipped to the panel before any pixel is visited.
    pub fn draw_filled_rectangle(
        &mut self,
        top_left: (i32, i32),
        bottom_right: (i32, i32),
        color: impl Into<Color>,
    ) {
        let color = color.into();
        let last = self.side() - 1;
        for y in top_left.1.max(0)..=bottom_right.1.min(last) {
            for x in top_left.0.max(0)..=bottom_right.0.min(last) {
                self.write_pixel(x, y, color);
            }
        }
    }

    /// Draw one glyph with its top-left cell at `xy`. Characters without a glyph draw nothing.
    pub fn draw_character(
        &mut self,
        font: &impl GlyphResolver,
        character: char,
        xy: (i32, i32),
        color: impl Into<Color>,
    ) {
        let Some(glyph) = font.resolve(character) else {
            return;
        };
        let color = color.into();

        for (index, &bit) in glyph.iter().enumerate() {
            if bit == 1 {
                let local_x = (index % GLYPH_WIDTH) as i32;
                let local_y = (index / GLYPH_WIDTH) as i32;
                // Cells past i32::MAX are off the panel anyway.
                let (Some(x), Some(y)) = (xy.0.checked_add(local_x), xy.1.checked_add(local_y))
                else {
                    continue;
                };
                self.write_pixel(x, y, color);
            }
        }
    }

    /// Draw a string left to right, one glyph every four columns.
    pub fn draw_text(
        &mut self,
        font: &impl GlyphResolver,
        text: &str,
        xy: (i32, i32),
        color: impl Into<Color>,
    ) {
        let color = color.into();
        for (index, character) in text.chars().enumerate() {
            let offset = i64::try_from(index)
                .unwrap_or(i64::MAX)
                .saturating_mul(i64::from(GLYPH_ADVANCE));
            // Every later character starts even further right.
            let Ok(x) = i32::try_from(offset.saturating_add(i64::from(xy.0))) else {
                break;
            };
            self.draw_character(font, character, (x, xy.1), color);
        }
    }

    /// Blit `image` with its top-left corner at `xy`, shrinking it first if
    /// it is larger than the display. Pixels landing off the panel are skipped.
    pub fn draw_image(&mut self, image: DynamicImage, xy: (i32, i32), mode: ResampleMode, pad: bool) {
        let side = self.side();
        let rgb = fit_to_display(image, side as u32, mode, pad).to_rgb8();

        for (x, y, pixel) in rgb.enumerate_pixels() {
            let Some(placed_x) = xy.0.checked_add(x as i32) else {
                continue;
            };
            if !(0..side).contains(&placed_x) {
                continue;
            }
            let Some(placed_y) = xy.1.checked_add(y as i32) else {
                continue;
            };
            if !(0..side).contains(&placed_y) {
                continue;
            }
            self.write_pixel(placed_x, placed_y, *pixel);
        }
    }
}
