//! Image discovery for the `/api/v1/images` endpoint.
//!
//! Scans `<media_dir>/images` for files the `image` crate can decode and
//! reports each one's pixel size, so clients can tell up front which images
//! will be shrunk to fit the display.

use serde::Serialize;
use std::fs;
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Information about a single image file.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ImageEntry {
    /// Filename (e.g., "sunset.png")
    pub name: String,
    /// Relative path from media dir (e.g., "images/sunset.png")
    pub path: String,
    /// Pixel width, if the header could be read
    pub width: Option<u32>,
    /// Pixel height, if the header could be read
    pub height: Option<u32>,
    /// True when the image is larger than the display and will be resized
    pub needs_resize: bool,
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// List images under `media_dir/images`, sorted by name.
pub fn list_images(media_dir: &Path, side: u32) -> Vec<ImageEntry> {
    let Ok(read_dir) = fs::read_dir(media_dir.join("images")) else {
        return Vec::new();
    };

    let mut entries: Vec<ImageEntry> = read_dir
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_image_extension(path))
        .map(|path| {
            let name = path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned();
            let dimensions = image::image_dimensions(&path).ok();
            ImageEntry {
                path: format!("images/{name}"),
                name,
                width: dimensions.map(|(w, _)| w),
                height: dimensions.map(|(_, h)| h),
                needs_resize: dimensions.is_some_and(|(w, h)| w > side || h > side),
            }
        })
        .collect();

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}
