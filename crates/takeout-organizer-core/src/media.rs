use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;

static MEDIA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|mp4|mov|heic|webp|gif|avi)$").unwrap());

/// Check if a filename has one of the supported photo/video extensions.
pub fn is_media(filename: &str) -> bool {
    MEDIA_RE.is_match(filename)
}

/// Where a media file's timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// `title` of a sidecar matched the filename.
    Matched,
    /// Filesystem modification time.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Media {
    /// Absolute path in the source tree
    pub path: PathBuf,
    /// Just the filename
    pub filename: String,
    /// Resolved date
    pub date: Option<NaiveDateTime>,
    /// How `date` was resolved
    pub date_source: Option<DateSource>,
}

impl Media {
    pub fn new(path: PathBuf, filename: String) -> Self {
        Self {
            path,
            filename,
            date: None,
            date_source: None,
        }
    }
}

/// Split a filename into stem and extension (the extension keeps its dot).
///
/// Leading dots belong to the stem, so `.jpg` has no extension.
pub fn split_extension(filename: &str) -> (&str, &str) {
    let leading = filename.len() - filename.trim_start_matches('.').len();
    match filename[leading..].rfind('.') {
        Some(pos) => filename.split_at(leading + pos),
        None => (filename, ""),
    }
}
