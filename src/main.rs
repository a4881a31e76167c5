//! Pixoo HTTP API Server
//!
//! Runs a web server that owns one Pixoo drawing session. Any device on the
//! LAN can draw into the frame buffer, push frames, stream raw frames or
//! change device settings via simple HTTP requests.
//!
//! ## Architecture
//! - **Render thread** (std::thread): owns the session, executes commands
//! - **HTTP server** (tokio/axum): accepts API requests, sends commands via channel
//!
//! ## Usage
//! ```sh
//! ./target/release/pixoo-rs --address 192.168.1.50 --size 64 --port 8080
//! ./target/release/pixoo-rs --simulated --preview-png /tmp/pixoo.png
//! ```

use clap::Parser;
use pixoo_rs::render::{DisplayStatus, Target, render_loop};
use pixoo_rs::server::{self, AppState};
use pixoo_rs::{DisplaySize, PixooConfig};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Pixoo HTTP API Server
#[derive(Parser)]
#[command(name = "pixoo-rs")]
#[command(about = "HTTP API server for drawing on a Divoom Pixoo")]
#[command(version)]
struct Args {
    /// IP address or host name of the Pixoo
    #[arg(long, required_unless_present = "simulated")]
    address: Option<String>,

    /// Run without a device; pushed frames go to a local simulator
    #[arg(long)]
    simulated: bool,

    /// In simulated mode, write every pushed frame to this PNG file
    #[arg(long)]
    preview_png: Option<PathBuf>,

    /// In simulated mode, mirror frames onto a local LED panel of this many rows/cols
    #[cfg(feature = "hardware")]
    #[arg(long)]
    mirror_panel: Option<u32>,

    /// Display side in pixels (16, 32 or 64)
    #[arg(long, default_value = "64")]
    size: u32,

    /// Do not reset the device's animation id automatically
    #[arg(long)]
    no_auto_refresh: bool,

    /// Animation id at which the device counter is reset
    #[arg(long, default_value = "32")]
    refresh_threshold: u32,

    /// Frame delay sent with each pushed frame, in milliseconds
    #[arg(long, default_value = "1000")]
    frame_delay: u32,

    /// Device request timeout in seconds
    #[arg(long, default_value = "5")]
    timeout_secs: u64,

    /// Root directory containing an images/ subdirectory
    #[arg(long, default_value = ".")]
    media_dir: PathBuf,

    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Log out-of-bounds writes, counter changes and every push
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn target(&self) -> Target {
        #[cfg(feature = "hardware")]
        if let Some(side) = self.mirror_panel {
            return Target::Panel {
                rows: side,
                cols: side,
            };
        }

        match (&self.address, self.simulated) {
            (Some(address), false) => Target::Device {
                address: address.clone(),
                timeout: Duration::from_secs(self.timeout_secs),
            },
            _ => Target::Simulated {
                preview_png: self.preview_png.clone(),
            },
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let default_level = if args.debug { "pixoo_rs=debug,info" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let size = match DisplaySize::try_from(args.size) {
        Ok(size) => size,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let config = PixooConfig {
        size,
        auto_refresh: !args.no_auto_refresh,
        refresh_threshold: args.refresh_threshold,
        frame_delay_ms: args.frame_delay,
        ..PixooConfig::default()
    };
    let target = args.target();

    let media_dir = args.media_dir.canonicalize().unwrap_or_else(|_| {
        eprintln!("Warning: could not canonicalize media dir, using as-is");
        args.media_dir.clone()
    });

    tracing::info!("Pixoo HTTP Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Display: {}x{}", size.side(), size.side());
    tracing::info!("Target: {:?}", target);
    tracing::info!("Media dir: {}", media_dir.display());
    tracing::info!("Port: {}", args.port);

    // Create the channel for sending commands to the render thread.
    let (tx, rx) = mpsc::channel();

    // Shared session status: render thread writes, HTTP handlers read.
    let status = Arc::new(Mutex::new(DisplayStatus::new(size.side())));

    // Spawn the render thread. It opens the session itself, so a device
    // that is unreachable at startup shows up in the status endpoint.
    let render_status = status.clone();
    std::thread::spawn(move || {
        render_loop(rx, render_status, target, config);
    });

    let app_state = AppState {
        command_tx: tx,
        status,
        media_dir,
        size,
    };

    let app = server::create_router(app_state);

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", args.port);
    tracing::info!("Try: curl http://localhost:{}/api/v1/status", args.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    // Run the server; blocks until the process is killed
    axum::serve(listener, app).await.expect("Server error");
}
