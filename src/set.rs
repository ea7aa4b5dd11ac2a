//! A collection of per-file coverage, keyed by canonical source path.
//!
//! Adding a file whose path is already present merges the new observation
//! into the existing entry instead of storing a second copy.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::error::Result;
use crate::model::{CoverageStats, FileCoverage};
use crate::paths::canonical_path;

/// What `add_file` did with its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    Merged,
}

#[derive(Debug, Default)]
pub struct CoverageSet {
    files: BTreeMap<String, FileCoverage>,
}

impl CoverageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `file`, or merge it into the entry for the same path.
    ///
    /// A failed merge leaves the existing entry untouched; the reason has
    /// already been reported to `diag`.
    pub fn add_file(&mut self, file: FileCoverage, diag: &dyn Diagnostics) -> Result<AddOutcome> {
        match self.files.entry(file.source_path().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(file);
                Ok(AddOutcome::Inserted)
            }
            Entry::Occupied(mut slot) => {
                slot.get_mut().merge(file, diag)?;
                Ok(AddOutcome::Merged)
            }
        }
    }

    pub fn remove_all_data(&mut self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Look up a file; `path` is canonicalized first.
    pub fn get(&self, path: &str) -> Option<&FileCoverage> {
        self.files.get(&canonical_path(path))
    }

    /// Files in path order.
    pub fn files(&self) -> impl Iterator<Item = &FileCoverage> {
        self.files.values()
    }

    /// Totals across every file. Coverage is computed from the summed
    /// counts, so large files weigh more than small ones.
    pub fn stats(&self) -> CoverageStats {
        self.files
            .values()
            .fold(CoverageStats::default(), |mut acc, file| {
                acc += file.stats();
                acc
            })
    }

    /// Drain every file's warning queue, in path order.
    pub fn take_warnings(&mut self) -> Vec<Diagnostic> {
        let mut drained = Vec::new();
        for (path, file) in &mut self.files {
            drained.extend(file.take_warnings().into_iter().map(|message| Diagnostic {
                severity: Severity::Warning,
                path: path.clone(),
                message,
            }));
        }
        drained
    }
}

/// A `CoverageSet` behind one lock, for callers that add files from several
/// threads at once. Every operation holds the lock for its whole duration, so
/// two observations of the same path never merge concurrently.
#[derive(Debug, Default)]
pub struct SharedCoverageSet {
    inner: Mutex<CoverageSet>,
}

impl SharedCoverageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, file: FileCoverage, diag: &dyn Diagnostics) -> Result<AddOutcome> {
        self.lock().add_file(file, diag)
    }

    pub fn remove_all_data(&self) {
        self.lock().remove_all_data();
    }

    pub fn stats(&self) -> CoverageStats {
        self.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn into_inner(self) -> CoverageSet {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, CoverageSet> {
        // Merges validate before mutating, so a panic mid-merge cannot leave
        // an entry half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
