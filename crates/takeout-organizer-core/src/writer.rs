use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime};
use filetime::FileTime;
use serde::{Deserialize, Serialize};

use crate::date;
use crate::media::{split_extension, Media};

/// What happens to the source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Leave the source in place
    #[default]
    Copy = 0,
    /// Remove the source once placed
    Move = 1,
}

impl TransferMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMode::Copy => "copy",
            TransferMode::Move => "move",
        }
    }
}

impl TryFrom<u8> for TransferMode {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        match code {
            0 => Ok(TransferMode::Copy),
            1 => Ok(TransferMode::Move),
            other => Err(other),
        }
    }
}

/// `<root>/<YYYY>/<month name>` for a date.
pub fn target_dir(output_dir: &Path, date: &NaiveDateTime) -> PathBuf {
    output_dir
        .join(date.year().to_string())
        .join(date::month_name(date))
}

/// Candidate name for the n-th collision; 0 is the original name.
fn candidate_name(filename: &str, n: u32) -> String {
    if n == 0 {
        return filename.to_string();
    }
    let (stem, ext) = split_extension(filename);
    format!("{}_{}{}", stem, n, ext)
}

/// Reserve a free name in `dir`: `name.ext`, then `name_1.ext`, `name_2.ext`, ...
///
/// The winning path is created empty with create-new semantics, so two
/// callers probing the same directory can never end up with the same name.
pub fn claim_destination(dir: &Path, filename: &str) -> io::Result<PathBuf> {
    let mut n = 0u32;
    loop {
        let candidate = dir.join(candidate_name(filename, n));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
        n = n
            .checked_add(1)
            .ok_or_else(|| io::Error::other("no free destination name"))?;
    }
}

/// Copy contents, then carry over access and modification times.
fn copy_with_times(src: &Path, dest: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    fs::copy(src, dest)?;
    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    filetime::set_file_times(dest, atime, mtime)
}

/// Copy, removing the partial destination on failure.
fn copy_file(src: &Path, dest: &Path) -> io::Result<()> {
    copy_with_times(src, dest).inspect_err(|_| {
        fs::remove_file(dest).ok();
    })
}

/// Move by rename, falling back to copy + delete (e.g. across filesystems).
///
/// If the copy lands but the source cannot be deleted, both files remain.
fn move_file(src: &Path, dest: &Path) -> io::Result<()> {
    if fs::rename(src, dest).is_ok() {
        return Ok(());
    }
    copy_file(src, dest)?;
    fs::remove_file(src)
}

/// Put one media file into its dated folder and return the final path.
pub fn place(media: &Media, output_dir: &Path, mode: TransferMode) -> io::Result<PathBuf> {
    let date = media
        .date
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "media has no resolved date"))?;

    let dir = target_dir(output_dir, &date);
    fs::create_dir_all(&dir)?;

    let dest = claim_destination(&dir, &media.filename)?;
    match mode {
        TransferMode::Copy => copy_file(&media.path, &dest)?,
        TransferMode::Move => move_file(&media.path, &dest)?,
    }
    Ok(dest)
}
