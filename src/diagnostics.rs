//! Where per-path errors and warnings go.
//!
//! Parsing and merging never abort a whole ingestion pass. Anything worth
//! telling the user is handed to a [`Diagnostics`] sink at the point it is
//! detected, tagged with the source path it concerns, and processing moves on.

use std::sync::{Mutex, PoisonError};

/// Receiver for errors and warnings raised while parsing or merging.
///
/// Methods take `&self` so a single sink can be shared by parse tasks
/// running on several threads.
pub trait Diagnostics {
    fn error(&self, path: &str, message: &str);
    fn warning(&self, path: &str, message: &str);
}

/// Forwards everything to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn error(&self, path: &str, message: &str) {
        log::error!("{path}: {message}");
    }

    fn warning(&self, path: &str, message: &str) {
        log::warn!("{path}: {message}");
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn error(&self, _path: &str, _message: &str) {}
    fn warning(&self, _path: &str, _message: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One reported condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub path: String,
    pub message: String,
}

/// Keeps every reported condition in memory, in report order.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    pub fn errors(&self) -> Vec<Diagnostic> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.with_severity(Severity::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn with_severity(&self, severity: Severity) -> Vec<Diagnostic> {
        self.lock()
            .iter()
            .filter(|d| d.severity == severity)
            .cloned()
            .collect()
    }

    fn push(&self, severity: Severity, path: &str, message: &str) {
        self.lock().push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.to_string(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        // A panicking reporter cannot leave a Vec half-written.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn error(&self, path: &str, message: &str) {
        self.push(Severity::Error, path, message);
    }

    fn warning(&self, path: &str, message: &str) {
        self.push(Severity::Warning, path, message);
    }
}
