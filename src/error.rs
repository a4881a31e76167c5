//! Error type shared by the whole crate.
//!
//! Geometry problems never show up here: out-of-bounds pixel writes are
//! dropped silently by the frame buffer. What remains is bad configuration,
//! anything that went wrong talking to the device, and local I/O.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported display size {0} (valid sizes are 16, 32 and 64)")]
    InvalidSize(u32),

    #[error("request for {command} failed: {source}")]
    Transport {
        command: &'static str,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("device rejected {command} with error code {code}")]
    Device { command: &'static str, code: i64 },

    #[error("malformed reply to {command}: {reason}")]
    MalformedReply {
        command: &'static str,
        reason: String,
    },

    #[error("expected a frame of {expected} bytes, got {actual}")]
    FrameSize { expected: usize, actual: usize },

    #[error("failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode frame preview: {0}")]
    Encode(#[source] image::ImageError),
}
