//! Render thread: owns the Pixoo session and executes commands from a channel.
//!
//! A session is single-threaded by design (one buffer, one counter, blocking
//! device round trips), so it lives on a dedicated `std::thread`. The async
//! HTTP server sends [`RenderRequest`]s through an `mpsc` channel and awaits
//! the outcome on a `oneshot` carried inside each request.

use crate::command::{Channel, HttpChannel};
use crate::pixoo::TextOptions;
use crate::raster::ResampleMode;
use crate::simulator::{PngSink, TraceSink};
use crate::tools::StopWatchAction;
use crate::{Color, Error, Pixoo, PixooConfig, Result};
use serde::Serialize;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

// ── Commands ─────────────────────────────────────────────────────────

/// Work for the render thread. Drawing commands only touch the buffer;
/// `Push` and the device commands reach the display.
#[derive(Debug)]
pub enum RenderCommand {
    Fill(Color),
    Pixel {
        xy: (i32, i32),
        color: Color,
    },
    Line {
        start: (i32, i32),
        stop: (i32, i32),
        color: Color,
    },
    Rectangle {
        top_left: (i32, i32),
        bottom_right: (i32, i32),
        color: Color,
    },
    Text {
        text: String,
        xy: (i32, i32),
        color: Color,
    },
    Image {
        path: PathBuf,
        xy: (i32, i32),
        mode: ResampleMode,
        pad: bool,
    },
    /// Replace the buffer with a raw RGB frame and push it.
    Frame(Vec<u8>),
    Push,
    /// Encode the current buffer as PNG.
    Preview,
    SetBrightness(i32),
    SetChannel(Channel),
    SetScreen(bool),
    DeviceText {
        text: String,
        xy: (i32, i32),
        color: Color,
        options: TextOptions,
    },
    Timer {
        minutes: u32,
        seconds: u32,
        start: bool,
    },
    ScoreBoard {
        blue: u32,
        red: u32,
    },
    StopWatch(StopWatchAction),
}

#[derive(Debug, PartialEq, Eq)]
pub enum RenderReply {
    Done,
    Png(Vec<u8>),
}

pub struct RenderRequest {
    pub command: RenderCommand,
    pub respond_to: oneshot::Sender<Result<RenderReply>>,
}

// ── Session setup ────────────────────────────────────────────────────

/// Where the render thread's session sends frames.
#[derive(Clone, Debug)]
pub enum Target {
    Device { address: String, timeout: Duration },
    Simulated { preview_png: Option<PathBuf> },
    /// Simulated, mirrored onto a local LED panel.
    #[cfg(feature = "hardware")]
    Panel { rows: u32, cols: u32 },
}

/// Open the session for `target`. Device targets make their first request here.
pub fn open_session(target: &Target, config: PixooConfig) -> Result<Pixoo, Box<dyn std::error::Error>> {
    let pixoo = match target {
        Target::Device { address, timeout } => {
            Pixoo::connect(config, HttpChannel::new(address, *timeout))?
        }
        Target::Simulated {
            preview_png: Some(path),
        } => Pixoo::simulated(config, PngSink::new(path, 8))?,
        Target::Simulated { preview_png: None } => Pixoo::simulated(config, TraceSink)?,
        #[cfg(feature = "hardware")]
        Target::Panel { rows, cols } => {
            let sink = crate::simulator::MatrixSink::open(*rows, *cols)?;
            Pixoo::simulated(config, sink)?
        }
    };
    Ok(pixoo)
}

// ── Status ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Starting,
    Device,
    Simulated,
}

/// Shared status that the HTTP server reads to report the session state.
#[derive(Clone, Serialize, utoipa::ToSchema)]
pub struct DisplayStatus {
    pub mode: SessionMode,
    /// Display side in pixels
    pub size: u32,
    /// Animation id of the last pushed frame
    pub counter: u32,
    /// Frames pushed since the server started
    pub frames_sent: u64,
    /// Most recent failure, if any
    pub last_error: Option<String>,
    /// Server version
    pub version: String,
}

impl DisplayStatus {
    pub fn new(size: u32) -> Self {
        Self {
            mode: SessionMode::Starting,
            size,
            counter: 0,
            frames_sent: 0,
            last_error: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn update(&mut self, pixoo: &Pixoo) {
        self.mode = if pixoo.is_simulated() {
            SessionMode::Simulated
        } else {
            SessionMode::Device
        };
        self.size = pixoo.size().side();
        self.counter = pixoo.counter();
        self.frames_sent = pixoo.frames_sent();
    }
}

// ── Command execution ────────────────────────────────────────────────

/// Run one command against the session.
pub fn handle_command(pixoo: &mut Pixoo, command: RenderCommand) -> Result<RenderReply> {
    match command {
        RenderCommand::Fill(color) => pixoo.fill(color),
        RenderCommand::Pixel { xy, color } => pixoo.draw_pixel(xy, color),
        RenderCommand::Line { start, stop, color } => pixoo.draw_line(start, stop, color),
        RenderCommand::Rectangle {
            top_left,
            bottom_right,
            color,
        } => pixoo.draw_filled_rectangle(top_left, bottom_right, color),
        RenderCommand::Text { text, xy, color } => pixoo.draw_text(&text, xy, color),
        RenderCommand::Image {
            path,
            xy,
            mode,
            pad,
        } => {
            pixoo.draw_image_file(&path, xy, mode, pad)?;
            tracing::info!("Drew image: {}", path.display());
        }
        RenderCommand::Frame(data) => {
            pixoo.load_frame(&data)?;
            pixoo.push()?;
        }
        RenderCommand::Push => pixoo.push()?,
        RenderCommand::Preview => {
            let mut png = Cursor::new(Vec::new());
            pixoo
                .buffer()
                .to_image()
                .write_to(&mut png, image::ImageFormat::Png)
                .map_err(Error::Encode)?;
            return Ok(RenderReply::Png(png.into_inner()));
        }
        RenderCommand::SetBrightness(value) => pixoo.set_brightness(value)?,
        RenderCommand::SetChannel(channel) => pixoo.set_channel(channel)?,
        RenderCommand::SetScreen(on) => pixoo.set_screen(on)?,
        RenderCommand::DeviceText {
            text,
            xy,
            color,
            options,
        } => pixoo.send_text(&text, xy, color, options)?,
        RenderCommand::Timer {
            minutes,
            seconds,
            start,
        } => pixoo.set_timer(minutes, seconds, start)?,
        RenderCommand::ScoreBoard { blue, red } => {
            pixoo.score_board(blue, red)?;
        }
        RenderCommand::StopWatch(action) => pixoo.set_stop_watch(action)?,
    }
    Ok(RenderReply::Done)
}

// ── Render loop ──────────────────────────────────────────────────────

/// Main render loop. Runs on a dedicated thread and owns the session.
///
/// Returns when the channel is closed (all senders dropped), or right away
/// if the session can't be opened; the dropped receiver then makes every
/// HTTP handler report the render thread as gone.
pub fn render_loop(
    rx: Receiver<RenderRequest>,
    status: Arc<Mutex<DisplayStatus>>,
    target: Target,
    config: PixooConfig,
) {
    let mut pixoo = match open_session(&target, config) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Failed to open Pixoo session: {}", e);
            status.lock().unwrap().last_error = Some(e.to_string());
            return;
        }
    };
    status.lock().unwrap().update(&pixoo);

    tracing::info!(
        "Render thread started (counter {}), waiting for commands...",
        pixoo.counter()
    );

    while let Ok(request) = rx.recv() {
        let result = handle_command(&mut pixoo, request.command);

        {
            let mut s = status.lock().unwrap();
            s.update(&pixoo);
            if let Err(e) = &result {
                tracing::error!("Command failed: {}", e);
                s.last_error = Some(e.to_string());
            }
        }

        // The handler may have given up waiting; nothing to do then.
        let _ = request.respond_to.send(result);
    }

    tracing::info!("Render thread: channel closed, shutting down.");
}
