use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use log::debug;
use serde::Serialize;

use crate::date::json::{parse_google_json, SidecarOutcome, SkipReason};
use crate::scan::SourceTree;
use crate::ThrottledProgress;

/// Sidecars that did not make it into the index, by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipSummary(BTreeMap<SkipReason, u64>);

impl SkipSummary {
    pub fn record(&mut self, reason: SkipReason) {
        *self.0.entry(reason).or_default() += 1;
    }

    pub fn count(&self, reason: SkipReason) -> u64 {
        self.0.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

/// Map of original filename (sidecar `title`) -> capture time.
///
/// Built once by [`build_index`] and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    dates: HashMap<String, NaiveDateTime>,
    parsed: u64,
    skipped: SkipSummary,
}

impl MetadataIndex {
    pub fn get(&self, filename: &str) -> Option<NaiveDateTime> {
        self.dates.get(filename).copied()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Sidecars that parsed, including ones whose title was later overwritten.
    pub fn parsed(&self) -> u64 {
        self.parsed
    }

    pub fn skipped(&self) -> &SkipSummary {
        &self.skipped
    }

    fn apply(&mut self, path: &Path, outcome: SidecarOutcome) {
        match outcome {
            SidecarOutcome::Parsed { title, taken } => {
                self.parsed += 1;
                if let Some(prev) = self.dates.insert(title, taken) {
                    debug!("{}: replaces earlier date {} for same title", path.display(), prev);
                }
            }
            SidecarOutcome::Skipped(reason) => {
                debug!("{}: sidecar skipped ({:?})", path.display(), reason);
                self.skipped.record(reason);
            }
        }
    }
}

/// Read every sidecar under the tree and index titles to capture dates.
///
/// Sidecars are applied in walk order, so for a repeated title the
/// lexicographically later path wins.
pub fn build_index(tree: &SourceTree, progress: &ThrottledProgress) -> MetadataIndex {
    let sidecars = tree.sidecars();
    let total = sidecars.len() as u64;
    let mut index = MetadataIndex::default();

    for (i, path) in sidecars.iter().enumerate() {
        let outcome = match fs::read(path) {
            Ok(bytes) => parse_google_json(&bytes),
            Err(_) => SidecarOutcome::Skipped(SkipReason::Unreadable),
        };
        index.apply(path, outcome);
        progress.report("index", i as u64 + 1, total, "Indexing JSON sidecars");
    }

    index
}
