//! Local destinations for frames pushed in simulated mode.
//!
//! A sink receives exactly what the device would have received (the raw
//! row-major RGB buffer) together with the frame id it would have been
//! sent under.

use image::RgbImage;
use image::imageops::{self, FilterType};
use std::path::PathBuf;

pub trait SimulatorSink {
    fn display(&mut self, buffer: &[u8], frame_id: u32);
}

/// Side length of a square RGB buffer.
fn side_of(buffer: &[u8]) -> u32 {
    ((buffer.len() / 3) as f64).sqrt() as u32
}

/// Logs each frame instead of showing it.
#[derive(Debug, Default)]
pub struct TraceSink;

impl SimulatorSink for TraceSink {
    fn display(&mut self, buffer: &[u8], frame_id: u32) {
        let side = side_of(buffer);
        tracing::info!("Simulated frame {} ({}x{})", frame_id, side, side);
    }
}

/// Writes every frame to a PNG file, scaled up so single pixels are visible.
///
/// The file is overwritten on each push, so an image viewer that reloads on
/// change acts as a live preview.
pub struct PngSink {
    path: PathBuf,
    scale: u32,
}

impl PngSink {
    pub fn new(path: impl Into<PathBuf>, scale: u32) -> Self {
        Self {
            path: path.into(),
            scale: scale.max(1),
        }
    }

    fn render(&self, buffer: &[u8]) -> Option<RgbImage> {
        let side = side_of(buffer);
        if side == 0 || buffer.len() != (side * side * 3) as usize {
            return None;
        }
        let img = RgbImage::from_raw(side, side, buffer.to_vec())?;
        if self.scale == 1 {
            return Some(img);
        }
        Some(imageops::resize(
            &img,
            side * self.scale,
            side * self.scale,
            FilterType::Nearest,
        ))
    }
}

impl SimulatorSink for PngSink {
    fn display(&mut self, buffer: &[u8], frame_id: u32) {
        let Some(img) = self.render(buffer) else {
            tracing::warn!("Simulated frame {} is not a square RGB buffer", frame_id);
            return;
        };

        match img.save(&self.path) {
            Ok(()) => tracing::debug!("Frame {} written to {}", frame_id, self.path.display()),
            Err(e) => tracing::warn!("Failed to write frame {} to {}: {}", frame_id, self.path.display(), e),
        }
    }
}

/// Mirrors frames onto a locally attached HUB75 panel.
///
/// Frames smaller than the panel are drawn in the top-left corner.
#[cfg(feature = "hardware")]
pub struct MatrixSink {
    matrix: rpi_led_matrix::LedMatrix,
    canvas: Option<rpi_led_matrix::LedCanvas>,
}

#[cfg(feature = "hardware")]
impl MatrixSink {
    /// Open the panel with Adafruit bonnet wiring and the given dimensions.
    pub fn open(rows: u32, cols: u32) -> Result<Self, Box<dyn std::error::Error>> {
        use rpi_led_matrix::{LedMatrix, LedMatrixOptions, LedRuntimeOptions};

        let mut options = LedMatrixOptions::new();
        options.set_rows(rows);
        options.set_cols(cols);
        options.set_hardware_mapping("adafruit-hat");
        options.set_pwm_bits(8)?;
        options.set_pwm_lsb_nanoseconds(130);

        let mut rt_options = LedRuntimeOptions::new();
        rt_options.set_gpio_slowdown(2); // Pi Zero 2 W requires slowdown=2

        let matrix = LedMatrix::new(Some(options), Some(rt_options))?;
        let canvas = Some(matrix.offscreen_canvas());
        Ok(Self { matrix, canvas })
    }
}

#[cfg(feature = "hardware")]
impl SimulatorSink for MatrixSink {
    fn display(&mut self, buffer: &[u8], frame_id: u32) {
        let Some(mut canvas) = self.canvas.take() else {
            return;
        };
        let side = side_of(buffer) as usize;

        canvas.clear();
        for (index, rgb) in buffer.chunks_exact(3).enumerate() {
            let color = rpi_led_matrix::LedColor {
                red: rgb[0],
                green: rgb[1],
                blue: rgb[2],
            };
            canvas.set((index % side) as i32, (index / side) as i32, &color);
        }
        self.canvas = Some(self.matrix.swap(canvas));
        tracing::debug!("Frame {} mirrored to LED panel", frame_id);
    }
}
