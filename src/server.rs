//! HTTP API server: axum router and request handlers.
//!
//! Handlers never touch the session directly. Each one turns its request
//! into a [`RenderCommand`], hands it to the render thread and awaits the
//! result, so drawing and pushes stay strictly sequential.

use crate::command::{Channel, TextScrollDirection};
use crate::media::{self, ImageEntry};
use crate::pixoo::TextOptions;
use crate::raster::ResampleMode;
use crate::render::{DisplayStatus, RenderCommand, RenderReply, RenderRequest, SessionMode};
use crate::tools::StopWatchAction;
use crate::{Color, DisplaySize, Error, Palette};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

type ApiResult<T = StatusCode> = Result<T, (StatusCode, String)>;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Channel to send commands to the render thread
    pub command_tx: Sender<RenderRequest>,
    /// Shared session status (render thread writes, handlers read)
    pub status: Arc<Mutex<DisplayStatus>>,
    /// Root directory for media files (images/)
    pub media_dir: PathBuf,
    /// Display size the session was opened with
    pub size: DisplaySize,
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        get_status,
        get_images,
        post_draw_fill,
        post_draw_pixel,
        post_draw_line,
        post_draw_rectangle,
        post_draw_text,
        post_draw_image,
        post_display_push,
        post_display_clear,
        get_display_preview,
        post_brightness,
        post_channel,
        post_screen,
        post_device_text,
        post_timer,
        post_scoreboard,
        post_stopwatch,
    ),
    components(schemas(
        DisplayStatus,
        SessionMode,
        ImageEntry,
        ColorRequest,
        PixelRequest,
        LineRequest,
        RectangleRequest,
        TextRequest,
        ImageRequest,
        BrightnessRequest,
        ChannelRequest,
        ScreenRequest,
        DeviceTextRequest,
        TimerRequest,
        ScoreBoardRequest,
        StopWatchRequest,
        ResampleMode,
        Channel,
        TextScrollDirection,
        StopWatchAction,
    )),
    tags(
        (name = "draw", description = "Frame buffer drawing (nothing is shown until push)"),
        (name = "display", description = "Frame transmission"),
        (name = "device", description = "Pass-through device settings (ignored when simulated)"),
        (name = "tools", description = "In-device tools"),
        (name = "system", description = "System status endpoints"),
    ),
    info(
        title = "Pixoo API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP API for drawing on and pushing frames to a Divoom Pixoo"
    )
)]
pub struct ApiDoc;

// ── Request types ────────────────────────────────────────────────────

fn default_color() -> [i32; 3] {
    [255, 255, 255]
}

fn to_color(rgb: [i32; 3]) -> Color {
    Color::clamped(rgb[0], rgb[1], rgb[2])
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ColorRequest {
    /// RGB color [red, green, blue]; each channel is clamped to 0-255
    #[schema(value_type = Vec<i32>, example = "[0, 0, 0]")]
    color: [i32; 3],
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct PixelRequest {
    x: i32,
    y: i32,
    #[serde(default = "default_color")]
    #[schema(value_type = Vec<i32>, example = "[255, 0, 0]")]
    color: [i32; 3],
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LineRequest {
    /// Start point [x, y]
    #[schema(value_type = Vec<i32>, example = "[0, 0]")]
    start: [i32; 2],
    /// End point [x, y], included in the line
    #[schema(value_type = Vec<i32>, example = "[63, 63]")]
    stop: [i32; 2],
    #[serde(default = "default_color")]
    #[schema(value_type = Vec<i32>, example = "[255, 255, 255]")]
    color: [i32; 3],
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RectangleRequest {
    #[schema(value_type = Vec<i32>, example = "[2, 2]")]
    top_left: [i32; 2],
    /// Inclusive; a corner left of or above `top_left` draws nothing
    #[schema(value_type = Vec<i32>, example = "[10, 6]")]
    bottom_right: [i32; 2],
    #[serde(default = "default_color")]
    #[schema(value_type = Vec<i32>, example = "[0, 255, 0]")]
    color: [i32; 3],
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct TextRequest {
    /// Text drawn with the built-in 3x5 font, 4 pixels per character
    #[schema(example = "HELLO")]
    text: String,
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    #[serde(default = "default_color")]
    #[schema(value_type = Vec<i32>, example = "[255, 255, 255]")]
    color: [i32; 3],
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ImageRequest {
    /// Path to image file relative to media directory
    #[schema(example = "images/test.png")]
    path: String,
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    /// Filter used when the image is larger than the display
    #[serde(default)]
    resample: ResampleMode,
    /// Letterbox oversized images instead of thumbnailing them
    #[serde(default)]
    pad: bool,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct BrightnessRequest {
    /// Brightness level (0-100), clamped
    #[schema(example = 75, minimum = 0, maximum = 100)]
    value: i32,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChannelRequest {
    channel: Channel,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ScreenRequest {
    on: bool,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct DeviceTextRequest {
    text: String,
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    #[serde(default = "default_color")]
    #[schema(value_type = Vec<i32>, example = "[255, 255, 255]")]
    color: [i32; 3],
    /// Text slot 0-19, clamped
    #[serde(default = "default_text_id")]
    identifier: i32,
    #[serde(default = "default_font")]
    font: u32,
    #[serde(default = "default_text_width")]
    width: u32,
    #[serde(default)]
    speed: u32,
    #[serde(default)]
    direction: TextScrollDirection,
}

fn default_text_id() -> i32 {
    TextOptions::default().identifier
}

fn default_font() -> u32 {
    TextOptions::default().font
}

fn default_text_width() -> u32 {
    TextOptions::default().width
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct TimerRequest {
    minutes: u32,
    seconds: u32,
    /// Start counting down immediately
    #[serde(default = "default_true")]
    start: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ScoreBoardRequest {
    blue: u32,
    red: u32,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct StopWatchRequest {
    action: StopWatchAction,
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/images", get(get_images))
        .route("/api/v1/draw/fill", post(post_draw_fill))
        .route("/api/v1/draw/pixel", post(post_draw_pixel))
        .route("/api/v1/draw/line", post(post_draw_line))
        .route("/api/v1/draw/rectangle", post(post_draw_rectangle))
        .route("/api/v1/draw/text", post(post_draw_text))
        .route("/api/v1/draw/image", post(post_draw_image))
        .route("/api/v1/display/push", post(post_display_push))
        .route("/api/v1/display/clear", post(post_display_clear))
        .route("/api/v1/display/frame", post(post_display_frame))
        .route("/api/v1/display/preview", get(get_display_preview))
        .route("/api/v1/display/stream", get(ws_display_stream))
        .route("/api/v1/device/brightness", post(post_brightness))
        .route("/api/v1/device/channel", post(post_channel))
        .route("/api/v1/device/screen", post(post_screen))
        .route("/api/v1/device/text", post(post_device_text))
        .route("/api/v1/tools/timer", post(post_timer))
        .route("/api/v1/tools/scoreboard", post(post_scoreboard))
        .route("/api/v1/tools/stopwatch", post(post_stopwatch))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Dispatch ─────────────────────────────────────────────────────────

fn render_thread_gone() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Render thread gone".to_string(),
    )
}

/// Map a session error to an HTTP status. Device-side failures are 502s.
fn error_response(err: Error) -> (StatusCode, String) {
    let status = match &err {
        Error::InvalidSize(_) | Error::FrameSize { .. } => StatusCode::BAD_REQUEST,
        Error::Image { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Transport { .. } | Error::Device { .. } | Error::MalformedReply { .. } => {
            StatusCode::BAD_GATEWAY
        }
        Error::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Send `command` to the render thread and wait for it to finish.
async fn dispatch(state: &AppState, command: RenderCommand) -> ApiResult<RenderReply> {
    let (respond_to, reply) = oneshot::channel();
    state
        .command_tx
        .send(RenderRequest {
            command,
            respond_to,
        })
        .map_err(|_| render_thread_gone())?;

    reply
        .await
        .map_err(|_| render_thread_gone())?
        .map_err(error_response)
}

async fn run(state: &AppState, command: RenderCommand) -> ApiResult {
    dispatch(state, command).await?;
    Ok(StatusCode::OK)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /api/v1/status - return current session state
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "system",
    responses(
        (status = 200, description = "Current session status", body = DisplayStatus)
    )
)]
async fn get_status(State(state): State<AppState>) -> Json<DisplayStatus> {
    let status = state.status.lock().unwrap().clone();
    Json(status)
}

/// GET /api/v1/images - list available images
#[utoipa::path(
    get,
    path = "/api/v1/images",
    tag = "system",
    responses(
        (status = 200, description = "List of available images", body = Vec<ImageEntry>)
    )
)]
async fn get_images(State(state): State<AppState>) -> Json<Vec<ImageEntry>> {
    Json(media::list_images(&state.media_dir, state.size.side()))
}

/// POST /api/v1/draw/fill - fill the whole buffer with one color
#[utoipa::path(post, path = "/api/v1/draw/fill", tag = "draw", request_body = ColorRequest,
    responses((status = 200, description = "Buffer filled")))]
async fn post_draw_fill(State(state): State<AppState>, Json(req): Json<ColorRequest>) -> ApiResult {
    run(&state, RenderCommand::Fill(to_color(req.color))).await
}

/// POST /api/v1/draw/pixel - set one pixel (off-panel coordinates are ignored)
#[utoipa::path(post, path = "/api/v1/draw/pixel", tag = "draw", request_body = PixelRequest,
    responses((status = 200, description = "Pixel drawn")))]
async fn post_draw_pixel(State(state): State<AppState>, Json(req): Json<PixelRequest>) -> ApiResult {
    let command = RenderCommand::Pixel {
        xy: (req.x, req.y),
        color: to_color(req.color),
    };
    run(&state, command).await
}

/// POST /api/v1/draw/line - draw a line, both endpoints included
#[utoipa::path(post, path = "/api/v1/draw/line", tag = "draw", request_body = LineRequest,
    responses((status = 200, description = "Line drawn")))]
async fn post_draw_line(State(state): State<AppState>, Json(req): Json<LineRequest>) -> ApiResult {
    let command = RenderCommand::Line {
        start: (req.start[0], req.start[1]),
        stop: (req.stop[0], req.stop[1]),
        color: to_color(req.color),
    };
    run(&state, command).await
}

/// POST /api/v1/draw/rectangle - fill an inclusive rectangle
#[utoipa::path(post, path = "/api/v1/draw/rectangle", tag = "draw", request_body = RectangleRequest,
    responses((status = 200, description = "Rectangle drawn")))]
async fn post_draw_rectangle(
    State(state): State<AppState>,
    Json(req): Json<RectangleRequest>,
) -> ApiResult {
    let command = RenderCommand::Rectangle {
        top_left: (req.top_left[0], req.top_left[1]),
        bottom_right: (req.bottom_right[0], req.bottom_right[1]),
        color: to_color(req.color),
    };
    run(&state, command).await
}

/// POST /api/v1/draw/text - draw text with the built-in font
#[utoipa::path(post, path = "/api/v1/draw/text", tag = "draw", request_body = TextRequest,
    responses((status = 200, description = "Text drawn")))]
async fn post_draw_text(State(state): State<AppState>, Json(req): Json<TextRequest>) -> ApiResult {
    let command = RenderCommand::Text {
        text: req.text,
        xy: (req.x, req.y),
        color: to_color(req.color),
    };
    run(&state, command).await
}

/// POST /api/v1/draw/image - draw an image from the media directory
#[utoipa::path(
    post,
    path = "/api/v1/draw/image",
    tag = "draw",
    request_body = ImageRequest,
    responses(
        (status = 200, description = "Image drawn"),
        (status = 404, description = "Image not found"),
        (status = 400, description = "Invalid path"),
        (status = 422, description = "Image could not be decoded")
    )
)]
async fn post_draw_image(State(state): State<AppState>, Json(req): Json<ImageRequest>) -> ApiResult {
    let path = validate_media_path(&state.media_dir, &req.path)?;
    let command = RenderCommand::Image {
        path,
        xy: (req.x, req.y),
        mode: req.resample,
        pad: req.pad,
    };
    run(&state, command).await
}

/// POST /api/v1/display/push - send the buffer to the display
#[utoipa::path(
    post,
    path = "/api/v1/display/push",
    tag = "display",
    responses(
        (status = 200, description = "Frame pushed"),
        (status = 502, description = "Device request failed")
    )
)]
async fn post_display_push(State(state): State<AppState>) -> ApiResult {
    run(&state, RenderCommand::Push).await
}

/// POST /api/v1/display/clear - fill with black and push
#[utoipa::path(post, path = "/api/v1/display/clear", tag = "display",
    responses((status = 200, description = "Display cleared")))]
async fn post_display_clear(State(state): State<AppState>) -> ApiResult {
    dispatch(&state, RenderCommand::Fill(Palette::BLACK)).await?;
    run(&state, RenderCommand::Push).await
}

/// POST /api/v1/display/frame - replace the buffer with a raw RGB frame and push it
///
/// Expects `application/octet-stream` body with exactly side*side*3 bytes.
async fn post_display_frame(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let expected = state.size.frame_byte_count();
    if body.len() != expected {
        let side = state.size.side();
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Expected {} bytes ({}x{}x3 RGB), got {} bytes",
                expected,
                side,
                side,
                body.len()
            ),
        ));
    }

    run(&state, RenderCommand::Frame(body.to_vec())).await
}

/// GET /api/v1/display/preview - current buffer as PNG
#[utoipa::path(
    get,
    path = "/api/v1/display/preview",
    tag = "display",
    responses(
        (status = 200, description = "PNG of the frame buffer")
    )
)]
async fn get_display_preview(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    match dispatch(&state, RenderCommand::Preview).await? {
        RenderReply::Png(png) => Ok(([(header::CONTENT_TYPE, "image/png")], png)),
        RenderReply::Done => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Render thread returned no preview".to_string(),
        )),
    }
}

/// POST /api/v1/device/brightness - set display brightness (0-100)
#[utoipa::path(post, path = "/api/v1/device/brightness", tag = "device", request_body = BrightnessRequest,
    responses((status = 200, description = "Brightness updated")))]
async fn post_brightness(
    State(state): State<AppState>,
    Json(req): Json<BrightnessRequest>,
) -> ApiResult {
    run(&state, RenderCommand::SetBrightness(req.value)).await
}

/// POST /api/v1/device/channel - switch the device channel
#[utoipa::path(post, path = "/api/v1/device/channel", tag = "device", request_body = ChannelRequest,
    responses((status = 200, description = "Channel switched")))]
async fn post_channel(State(state): State<AppState>, Json(req): Json<ChannelRequest>) -> ApiResult {
    run(&state, RenderCommand::SetChannel(req.channel)).await
}

/// POST /api/v1/device/screen - turn the screen on or off
#[utoipa::path(post, path = "/api/v1/device/screen", tag = "device", request_body = ScreenRequest,
    responses((status = 200, description = "Screen switched")))]
async fn post_screen(State(state): State<AppState>, Json(req): Json<ScreenRequest>) -> ApiResult {
    run(&state, RenderCommand::SetScreen(req.on)).await
}

/// POST /api/v1/device/text - device-rendered scrolling text
#[utoipa::path(post, path = "/api/v1/device/text", tag = "device", request_body = DeviceTextRequest,
    responses((status = 200, description = "Text sent")))]
async fn post_device_text(
    State(state): State<AppState>,
    Json(req): Json<DeviceTextRequest>,
) -> ApiResult {
    let command = RenderCommand::DeviceText {
        text: req.text,
        xy: (req.x, req.y),
        color: to_color(req.color),
        options: TextOptions {
            identifier: req.identifier,
            font: req.font,
            width: req.width,
            speed: req.speed,
            direction: req.direction,
        },
    };
    run(&state, command).await
}

/// POST /api/v1/tools/timer - start the countdown timer
#[utoipa::path(post, path = "/api/v1/tools/timer", tag = "tools", request_body = TimerRequest,
    responses((status = 200, description = "Timer set")))]
async fn post_timer(State(state): State<AppState>, Json(req): Json<TimerRequest>) -> ApiResult {
    let command = RenderCommand::Timer {
        minutes: req.minutes,
        seconds: req.seconds,
        start: req.start,
    };
    run(&state, command).await
}

/// POST /api/v1/tools/scoreboard - show the scoreboard with both scores
#[utoipa::path(post, path = "/api/v1/tools/scoreboard", tag = "tools", request_body = ScoreBoardRequest,
    responses((status = 200, description = "Scores sent")))]
async fn post_scoreboard(
    State(state): State<AppState>,
    Json(req): Json<ScoreBoardRequest>,
) -> ApiResult {
    let command = RenderCommand::ScoreBoard {
        blue: req.blue,
        red: req.red,
    };
    run(&state, command).await
}

/// POST /api/v1/tools/stopwatch - start, stop or reset the stopwatch
#[utoipa::path(post, path = "/api/v1/tools/stopwatch", tag = "tools", request_body = StopWatchRequest,
    responses((status = 200, description = "Stopwatch updated")))]
async fn post_stopwatch(
    State(state): State<AppState>,
    Json(req): Json<StopWatchRequest>,
) -> ApiResult {
    run(&state, RenderCommand::StopWatch(req.action)).await
}

// ── WebSocket streaming ─────────────────────────────────────────────

/// GET /api/v1/display/stream - WebSocket endpoint for streaming raw RGB frames.
///
/// Each binary message of exactly side*side*3 bytes replaces the buffer and
/// is pushed as one frame. Text messages are ignored.
async fn ws_display_stream(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_stream_socket(socket, state))
}

async fn handle_stream_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("WebSocket stream client connected");
    let mut frame_count: u64 = 0;

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("WebSocket receive error: {}", e);
                break;
            }
        };

        match msg {
            Message::Binary(data) => {
                let expected = state.size.frame_byte_count();
                if data.len() != expected {
                    tracing::warn!(
                        "WebSocket frame: expected {} bytes, got {}",
                        expected,
                        data.len()
                    );
                    continue;
                }

                match dispatch(&state, RenderCommand::Frame(data.to_vec())).await {
                    Ok(_) => frame_count += 1,
                    Err((status, message)) if status == StatusCode::INTERNAL_SERVER_ERROR => {
                        tracing::error!("{}, closing WebSocket", message);
                        break;
                    }
                    Err((_, message)) => tracing::warn!("WebSocket frame not pushed: {}", message),
                }
            }
            Message::Close(_) => break,
            _ => {} // Ignore text, ping/pong handled by axum
        }
    }

    tracing::info!(
        "WebSocket stream client disconnected ({} frames pushed)",
        frame_count
    );
}

// ── Path validation ──────────────────────────────────────────────────

/// Resolve `relative_path` inside the media directory, rejecting anything
/// that escapes it (e.g., `../../etc/passwd`).
fn validate_media_path(media_dir: &Path, relative_path: &str) -> ApiResult<PathBuf> {
    let canonical = media_dir.join(relative_path).canonicalize().map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            format!("Path not found: {relative_path}"),
        )
    })?;

    let canonical_media = media_dir.canonicalize().map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Media directory not found".to_string(),
        )
    })?;

    if !canonical.starts_with(&canonical_media) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Path is outside the media directory".to_string(),
        ));
    }

    Ok(canonical)
}
