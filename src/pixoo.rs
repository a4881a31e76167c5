//! The session object: one frame buffer, one counter, one destination.

use crate::command::{Channel, Command, CommandChannel, TextScrollDirection};
use crate::glyph::{Font3x5, GlyphResolver};
use crate::raster::{self, ResampleMode};
use crate::simulator::SimulatorSink;
use crate::tools::{ScoreBoard, StopWatch, StopWatchAction};
use crate::transmit::{Link, Transmitter};
use crate::{Color, DisplaySize, FrameBuffer, PixooConfig, Result, clamp};
use image::DynamicImage;
use std::path::Path;

/// Options for [`Pixoo::send_text`]; the defaults match the device's own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextOptions {
    /// Slot 0-19; sending to the same slot replaces the previous text.
    pub identifier: i32,
    pub font: u32,
    pub width: u32,
    pub speed: u32,
    pub direction: TextScrollDirection,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            identifier: 1,
            font: 2,
            width: 64,
            speed: 0,
            direction: TextScrollDirection::Left,
        }
    }
}

/// A drawing session against one Pixoo (real or simulated).
///
/// All drawing happens in memory; nothing reaches the display until
/// [`push`](Self::push). The session is single-threaded: every method runs
/// to completion, including any device round trip, before returning.
pub struct Pixoo<F: GlyphResolver = Font3x5> {
    buffer: FrameBuffer,
    transmitter: Transmitter,
    font: F,
}

impl Pixoo<Font3x5> {
    /// Connect to a device, loading its current animation id.
    pub fn connect(config: PixooConfig, channel: impl CommandChannel + 'static) -> Result<Self> {
        Self::with_link(config, Link::Device(Box::new(channel)), Font3x5)
    }

    /// Run against a local sink instead of a device.
    pub fn simulated(config: PixooConfig, sink: impl SimulatorSink + 'static) -> Result<Self> {
        Self::with_link(config, Link::Simulated(Box::new(sink)), Font3x5)
    }
}

impl<F: GlyphResolver> Pixoo<F> {
    pub fn with_link(config: PixooConfig, link: Link, font: F) -> Result<Self> {
        let mut transmitter = Transmitter::new(link, &config);
        transmitter.initialize()?;
        Ok(Self {
            buffer: FrameBuffer::new(config.size, config.background),
            transmitter,
            font,
        })
    }

    pub fn size(&self) -> DisplaySize {
        self.buffer.size()
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn is_simulated(&self) -> bool {
        self.transmitter.is_simulated()
    }

    /// Id the last frame was sent under.
    pub fn counter(&self) -> u32 {
        self.transmitter.counter()
    }

    pub fn frames_sent(&self) -> u64 {
        self.transmitter.frames_sent()
    }

    // ── Drawing ────────────────────────────────────────────────────

    pub fn fill(&mut self, color: impl Into<Color>) {
        self.buffer.fill(color);
    }

    pub fn clear(&mut self, color: impl Into<Color>) {
        self.buffer.clear(color);
    }

    pub fn draw_pixel(&mut self, xy: (i32, i32), color: impl Into<Color>) {
        self.buffer.write_pixel(xy.0, xy.1, color);
    }

    pub fn draw_pixel_at_index(&mut self, index: i32, color: impl Into<Color>) {
        self.buffer.write_pixel_at_index(index, color);
    }

    pub fn draw_line(&mut self, start: (i32, i32), stop: (i32, i32), color: impl Into<Color>) {
        self.buffer.draw_line(start, stop, color);
    }

    pub fn draw_filled_rectangle(
        &mut self,
        top_left: (i32, i32),
        bottom_right: (i32, i32),
        color: impl Into<Color>,
    ) {
        self.buffer.draw_filled_rectangle(top_left, bottom_right, color);
    }

    pub fn draw_character(&mut self, character: char, xy: (i32, i32), color: impl Into<Color>) {
        self.buffer.draw_character(&self.font, character, xy, color);
    }

    pub fn draw_text(&mut self, text: &str, xy: (i32, i32), color: impl Into<Color>) {
        self.buffer.draw_text(&self.font, text, xy, color);
    }

    pub fn draw_image(&mut self, image: DynamicImage, xy: (i32, i32), mode: ResampleMode, pad: bool) {
        self.buffer.draw_image(image, xy, mode, pad);
    }

    /// Load an image file and draw it like [`draw_image`](Self::draw_image).
    pub fn draw_image_file(
        &mut self,
        path: &Path,
        xy: (i32, i32),
        mode: ResampleMode,
        pad: bool,
    ) -> Result<()> {
        let image = raster::load_image(path)?;
        self.draw_image(image, xy, mode, pad);
        Ok(())
    }

    /// Replace the buffer with a raw RGB frame.
    pub fn load_frame(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.load_raw(data)
    }

    // ── Transmission ───────────────────────────────────────────────

    /// Send the current buffer to the display as the next frame.
    pub fn push(&mut self) -> Result<()> {
        self.transmitter.push(&self.buffer)
    }

    // ── Device operations (no-ops when simulated) ──────────────────

    /// Have the device render and scroll `text` itself.
    pub fn send_text(
        &mut self,
        text: &str,
        xy: (i32, i32),
        color: Color,
        options: TextOptions,
    ) -> Result<()> {
        self.send(Command::SendText {
            text_id: clamp(options.identifier, 0, 19) as u8,
            x: xy.0,
            y: xy.1,
            dir: options.direction.index(),
            font: options.font,
            text_width: options.width,
            speed: options.speed,
            text_string: text.to_string(),
            color: color.to_hex(),
            align: 1,
        })
    }

    /// Brightness in percent; values outside 0-100 are clamped.
    pub fn set_brightness(&mut self, brightness: i32) -> Result<()> {
        self.send(Command::SetBrightness {
            brightness: clamp(brightness, 0, 100) as u8,
        })
    }

    pub fn set_channel(&mut self, channel: Channel) -> Result<()> {
        self.send(Command::SetChannel {
            select_index: channel.index(),
        })
    }

    pub fn set_clock(&mut self, clock_id: u32) -> Result<()> {
        self.send(Command::SetClock { clock_id })
    }

    pub fn set_face(&mut self, face_id: u32) -> Result<()> {
        self.set_clock(face_id)
    }

    pub fn set_custom_page(&mut self, index: u32) -> Result<()> {
        self.send(Command::SetCustomPage {
            custom_page_index: index,
        })
    }

    /// Select custom page `index` and switch to the custom channel.
    pub fn set_custom_channel(&mut self, index: u32) -> Result<()> {
        self.set_custom_page(index)?;
        self.set_channel(Channel::Custom)
    }

    pub fn set_screen(&mut self, on: bool) -> Result<()> {
        self.send(Command::SetScreen {
            on_off: u8::from(on),
        })
    }

    pub fn set_screen_on(&mut self) -> Result<()> {
        self.set_screen(true)
    }

    pub fn set_screen_off(&mut self) -> Result<()> {
        self.set_screen(false)
    }

    pub fn set_visualizer(&mut self, equalizer_position: u32) -> Result<()> {
        self.send(Command::SetVisualizer {
            eq_position: equalizer_position,
        })
    }

    /// Start (or just set up) the device's countdown timer.
    pub fn set_timer(&mut self, minutes: u32, seconds: u32, start: bool) -> Result<()> {
        self.send(Command::SetTimer {
            minute: minutes,
            second: seconds,
            status: u8::from(start),
        })
    }

    /// Open the scoreboard tool, sending the starting scores.
    pub fn score_board(&mut self, blue: u32, red: u32) -> Result<ScoreBoard<'_, F>> {
        ScoreBoard::open(self, blue, red)
    }

    pub fn set_stop_watch(&mut self, action: StopWatchAction) -> Result<()> {
        self.send(Command::SetStopWatch {
            status: action.status(),
        })
    }

    /// Open the stopwatch tool, which resets it.
    pub fn stop_watch(&mut self) -> Result<StopWatch<'_, F>> {
        StopWatch::open(self)
    }

    pub(crate) fn send(&mut self, command: Command) -> Result<()> {
        self.transmitter.send(command).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CommandLog, RecordingChannel, RecordingSink};
    use crate::{Error, Palette};
    use pretty_assertions::assert_eq;

    fn config(size: DisplaySize) -> PixooConfig {
        PixooConfig {
            size,
            ..PixooConfig::default()
        }
    }

    fn device() -> (Pixoo, CommandLog) {
        let (channel, log) = RecordingChannel::new(0);
        let pixoo = Pixoo::connect(config(DisplaySize::S16), channel).unwrap();
        log.clear();
        (pixoo, log)
    }

    #[test]
    fn session_starts_filled_with_background() {
        let (sink, _) = RecordingSink::new();
        let config = PixooConfig {
            size: DisplaySize::S32,
            background: Palette::BLUE,
            ..PixooConfig::default()
        };
        let pixoo = Pixoo::simulated(config, sink).unwrap();

        assert_eq!(pixoo.buffer().as_bytes().len(), 32 * 32 * 3);
        assert_eq!(pixoo.buffer().pixel(31, 31), Some(Palette::BLUE));
        assert_eq!(pixoo.counter(), 1);
    }

    #[test]
    fn connect_loads_counter_from_device() {
        let (channel, log) = RecordingChannel::new(9);
        let pixoo = Pixoo::connect(config(DisplaySize::S64), channel).unwrap();
        assert_eq!(pixoo.counter(), 9);
        assert_eq!(log.names(), vec!["Draw/GetHttpGifId"]);
    }

    #[test]
    fn simulated_push_delivers_drawn_buffer() {
        let (sink, frames) = RecordingSink::new();
        let mut pixoo = Pixoo::simulated(config(DisplaySize::S16), sink).unwrap();

        pixoo.draw_line((0, 0), (15, 15), Palette::WHITE);
        pixoo.draw_text("HI", (2, 2), Palette::RED);
        pixoo.push().unwrap();

        let frames = frames.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, pixoo.buffer().as_bytes());
        assert_eq!(frames[0].1, 2);
        assert_eq!(pixoo.frames_sent(), 1);
    }

    #[test]
    fn device_operations_are_skipped_when_simulated() {
        let (sink, frames) = RecordingSink::new();
        let mut pixoo = Pixoo::simulated(config(DisplaySize::S16), sink).unwrap();

        pixoo.set_brightness(50).unwrap();
        pixoo.set_channel(Channel::Cloud).unwrap();
        pixoo.set_screen_off().unwrap();
        pixoo.send_text("hello", (0, 0), Palette::WHITE, TextOptions::default()).unwrap();

        assert!(frames.frames().is_empty());
    }

    #[test]
    fn brightness_is_clamped() {
        let (mut pixoo, log) = device();
        pixoo.set_brightness(150).unwrap();
        pixoo.set_brightness(-3).unwrap();

        assert_eq!(
            log.commands(),
            vec![
                Command::SetBrightness { brightness: 100 },
                Command::SetBrightness { brightness: 0 },
            ]
        );
    }

    #[test]
    fn send_text_clamps_identifier_and_formats_color() {
        let (mut pixoo, log) = device();
        let options = TextOptions {
            identifier: 42,
            direction: TextScrollDirection::Right,
            ..TextOptions::default()
        };
        pixoo.send_text("abc", (1, 2), Color::new(255, 16, 0), options).unwrap();

        assert_eq!(
            log.commands(),
            vec![Command::SendText {
                text_id: 19,
                x: 1,
                y: 2,
                dir: 1,
                font: 2,
                text_width: 64,
                speed: 0,
                text_string: "abc".to_string(),
                color: "#FF1000".to_string(),
                align: 1,
            }]
        );
    }

    #[test]
    fn custom_channel_selects_page_then_channel() {
        let (mut pixoo, log) = device();
        pixoo.set_custom_channel(2).unwrap();

        assert_eq!(
            log.commands(),
            vec![
                Command::SetCustomPage {
                    custom_page_index: 2
                },
                Command::SetChannel { select_index: 3 },
            ]
        );
    }

    #[test]
    fn face_screen_visualizer_and_timer_commands() {
        let (mut pixoo, log) = device();
        pixoo.set_face(5).unwrap();
        pixoo.set_screen_on().unwrap();
        pixoo.set_visualizer(1).unwrap();
        pixoo.set_timer(2, 30, true).unwrap();

        assert_eq!(
            log.commands(),
            vec![
                Command::SetClock { clock_id: 5 },
                Command::SetScreen { on_off: 1 },
                Command::SetVisualizer { eq_position: 1 },
                Command::SetTimer {
                    minute: 2,
                    second: 30,
                    status: 1
                },
            ]
        );
    }

    #[test]
    fn device_errors_surface_to_caller() {
        let (channel, _) = RecordingChannel::new(0);
        let channel = channel.failing_on("Channel/SetBrightness");
        let mut pixoo = Pixoo::connect(config(DisplaySize::S16), channel).unwrap();

        assert!(matches!(pixoo.set_brightness(10), Err(Error::Device { .. })));
    }

    #[test]
    fn load_frame_then_push_sends_it() {
        let (mut pixoo, log) = device();
        let frame: Vec<u8> = (0..16 * 16 * 3).map(|i| (i % 251) as u8).collect();
        pixoo.load_frame(&frame).unwrap();
        pixoo.push().unwrap();

        assert_eq!(pixoo.buffer().as_bytes(), frame.as_slice());
        assert_eq!(log.count("Draw/SendHttpGif"), 1);
    }

    #[test]
    fn draw_image_file_reports_missing_files() {
        let (mut pixoo, _) = device();
        let err = pixoo
            .draw_image_file(Path::new("/nope.png"), (0, 0), ResampleMode::PixelArt, false)
            .unwrap_err();
        assert!(matches!(err, Error::Image { .. }));
    }
}
