use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use walkdir::WalkDir;

use crate::media::{self, Media};

/// Source tree walker.
///
/// Entries are visited in file-name order within each directory, so two runs
/// over the same tree see files in the same order on every platform.
pub struct SourceTree<'a> {
    root: &'a Path,
    exclude: Option<&'a Path>,
}

impl<'a> SourceTree<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self { root, exclude: None }
    }

    /// Skip a subtree (the destination, when it lives inside the source).
    pub fn excluding(mut self, dir: Option<&'a Path>) -> Self {
        self.exclude = dir.filter(|d| *d != self.root);
        self
    }

    /// Every regular file under the root.
    pub fn files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        WalkDir::new(self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| self.exclude.map_or(true, |ex| e.path() != ex))
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    None
                }
            })
            .filter(|e| {
                // Symlinked files count; symlinked directories are not descended into
                e.file_type().is_file()
                    || (e.path_is_symlink() && fs::metadata(e.path()).is_ok_and(|m| m.is_file()))
            })
            .map(|e| e.into_path())
    }

    /// Sidecar JSON files, excluding album-level `metadata.json`.
    pub fn sidecars(&self) -> Vec<PathBuf> {
        self.files().filter(|p| is_sidecar(&file_name(p))).collect()
    }

    /// Media files, in walk order.
    pub fn media(&self) -> Vec<Media> {
        self.files()
            .filter_map(|path| {
                let filename = file_name(&path);
                media::is_media(&filename).then(|| Media::new(path, filename))
            })
            .collect()
    }
}

/// Check if a filename is a sidecar that should be indexed.
pub fn is_sidecar(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.ends_with(".json") && lower != "metadata.json"
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
