//! Drive a Divoom Pixoo LED display from Rust.
//!
//! The crate keeps an in-memory RGB frame buffer for a square 16, 32 or
//! 64 pixel display, rasterizes primitives into it (pixels, lines,
//! rectangles, 3x5 glyph text, images) and pushes the buffer to the device
//! as a single-frame animation. A simulated mode routes frames to a local
//! sink instead of the network.
//!
//! Module map:
//! - [`framebuffer`] flat pixel store and the pixel write primitives
//! - [`raster`] lines, rectangles, glyphs and image blits on top of it
//! - [`transmit`] frame counter lifecycle and payload dispatch
//! - [`pixoo`] the session object tying the above together
//! - [`render`] and [`server`] the HTTP control server used by the binary

pub mod command;
pub mod error;
pub mod framebuffer;
pub mod glyph;
pub mod media;
pub mod pixoo;
pub mod raster;
pub mod render;
pub mod server;
pub mod simulator;
pub mod tools;
pub mod transmit;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{Channel, Command, CommandChannel, HttpChannel, Reply, TextScrollDirection};
pub use error::{Error, Result};
pub use framebuffer::FrameBuffer;
pub use glyph::{Font3x5, GlyphResolver};
pub use pixoo::Pixoo;
pub use raster::ResampleMode;
pub use simulator::SimulatorSink;

// ── Display size ───────────────────────────────────────────────────

/// Supported Pixoo panel sizes. The display is always square.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplaySize {
    S16,
    S32,
    #[default]
    S64,
}

impl DisplaySize {
    /// Length of one side in pixels.
    pub fn side(self) -> u32 {
        match self {
            DisplaySize::S16 => 16,
            DisplaySize::S32 => 32,
            DisplaySize::S64 => 64,
        }
    }

    /// Total number of pixels on the panel.
    pub fn pixel_count(self) -> u32 {
        self.side() * self.side()
    }

    /// Number of bytes needed for a raw RGB frame (3 bytes per pixel).
    pub fn frame_byte_count(self) -> usize {
        (self.pixel_count() * 3) as usize
    }
}

impl TryFrom<u32> for DisplaySize {
    type Error = Error;

    fn try_from(side: u32) -> Result<Self> {
        match side {
            16 => Ok(DisplaySize::S16),
            32 => Ok(DisplaySize::S32),
            64 => Ok(DisplaySize::S64),
            other => Err(Error::InvalidSize(other)),
        }
    }
}

// ── Color ──────────────────────────────────────────────────────────

/// A plain RGB triple. Out-of-range integer input is clamped on the way in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from arbitrary integers, clamping each channel to 0-255.
    pub fn clamped(r: i32, g: i32, b: i32) -> Self {
        Self {
            r: clamp(r, 0, 255) as u8,
            g: clamp(g, 0, 255) as u8,
            b: clamp(b, 0, 255) as u8,
        }
    }

    /// Format as `#RRGGBB` with uppercase hex digits, as the device expects.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<(i32, i32, i32)> for Color {
    fn from((r, g, b): (i32, i32, i32)) -> Self {
        Color::clamped(r, g, b)
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Color::new(r, g, b)
    }
}

impl From<image::Rgb<u8>> for Color {
    fn from(pixel: image::Rgb<u8>) -> Self {
        Color::new(pixel[0], pixel[1], pixel[2])
    }
}

/// Named colors.
pub struct Palette;

impl Palette {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const CYAN: Color = Color::new(0, 255, 255);
    pub const MAGENTA: Color = Color::new(255, 0, 255);
}

/// Clamp `value` into `[minimum, maximum]`.
pub fn clamp(value: i32, minimum: i32, maximum: i32) -> i32 {
    value.max(minimum).min(maximum)
}

// ── Session configuration ──────────────────────────────────────────

/// Knobs for a [`Pixoo`] session.
///
/// Passed by value into the session constructors; there is no global state,
/// so several sessions can coexist (one per display, or one per test).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixooConfig {
    pub size: DisplaySize,
    /// Reset the remote animation id automatically once the threshold is hit.
    pub auto_refresh: bool,
    pub refresh_threshold: u32,
    /// Frame delay sent with every pushed frame, in milliseconds.
    pub frame_delay_ms: u32,
    /// Color the buffer is filled with when the session starts.
    pub background: Color,
}

impl Default for PixooConfig {
    fn default() -> Self {
        Self {
            size: DisplaySize::default(),
            auto_refresh: true,
            refresh_threshold: 32,
            frame_delay_ms: 1000,
            background: Palette::BLACK,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // ── DisplaySize tests ──────────────────────────────────────────

    #[test]
    fn display_size_default_is_64() {
        assert_eq!(DisplaySize::default().side(), 64);
    }

    #[rstest]
    #[case(16, 768)]
    #[case(32, 3072)]
    #[case(64, 12288)]
    fn test_frame_byte_count(#[case] side: u32, #[case] expected: usize) {
        let size = DisplaySize::try_from(side).unwrap();
        assert_eq!(size.frame_byte_count(), expected);
        assert_eq!(size.side(), side);
    }

    #[rstest]
    #[case(0)]
    #[case(8)]
    #[case(48)]
    #[case(128)]
    fn unsupported_sizes_are_rejected(#[case] side: u32) {
        let err = DisplaySize::try_from(side).unwrap_err();
        assert!(matches!(err, Error::InvalidSize(s) if s == side));
    }

    // ── Color tests ────────────────────────────────────────────────

    #[test]
    fn color_clamps_out_of_range_channels() {
        assert_eq!(Color::from((-5, 300, 128)), Color::new(0, 255, 128));
    }

    #[rstest]
    #[case(Palette::BLACK, "#000000")]
    #[case(Palette::WHITE, "#FFFFFF")]
    #[case(Color::new(10, 171, 3), "#0AAB03")]
    fn test_to_hex(#[case] color: Color, #[case] expected: &str) {
        assert_eq!(color.to_hex(), expected);
    }

    #[rstest]
    #[case(-1, 0, 100, 0)]
    #[case(50, 0, 100, 50)]
    #[case(101, 0, 100, 100)]
    #[case(25, 0, 19, 19)]
    fn test_clamp(#[case] value: i32, #[case] min: i32, #[case] max: i32, #[case] expected: i32) {
        assert_eq!(clamp(value, min, max), expected);
    }

    #[test]
    fn config_defaults_match_device_limits() {
        let config = PixooConfig::default();
        assert_eq!(config.refresh_threshold, 32);
        assert!(config.auto_refresh);
        assert_eq!(config.frame_delay_ms, 1000);
        assert_eq!(config.background, Palette::BLACK);
    }
}
