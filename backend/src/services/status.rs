//! Status line, progress bar and status history.
//!
//! In-memory tracker shared by the session and the HTTP layer. Every change
//! bumps a revision counter so pollers (the SSE stream) can tell when there is
//! something new to send.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Entries kept in the history before the oldest are dropped.
const MAX_HISTORY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Loading,
    Success,
    Warning,
    Error,
    Info,
}

/// A single status message with timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Monotonic sequence number, starting at 1.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: StatusKind,
    pub message: String,
}

/// Point-in-time view of the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub current: Option<StatusEntry>,
    /// `None` hides the progress bar.
    pub progress: Option<u8>,
    pub revision: u64,
}

#[derive(Default)]
struct StatusInner {
    current: Option<StatusEntry>,
    progress: Option<u8>,
    history: VecDeque<StatusEntry>,
    next_seq: u64,
    revision: u64,
}

/// Receives batch progress and intermediate status messages.
pub trait ProgressSink: Send + Sync {
    fn progress(&self, percent: u8);

    fn report(&self, _kind: StatusKind, _message: &str) {}
}

#[derive(Clone, Default)]
pub struct StatusTracker {
    inner: Arc<RwLock<StatusInner>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the status line and append it to the history.
    pub fn set(&self, kind: StatusKind, message: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.next_seq += 1;
        let entry = StatusEntry {
            seq: inner.next_seq,
            timestamp: Utc::now(),
            kind,
            message: message.into(),
        };
        inner.history.push_back(entry.clone());
        if inner.history.len() > MAX_HISTORY {
            inner.history.pop_front();
        }
        inner.current = Some(entry);
        inner.revision += 1;
    }

    pub fn loading(&self, message: impl Into<String>) {
        self.set(StatusKind::Loading, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.set(StatusKind::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.set(StatusKind::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.set(StatusKind::Error, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.set(StatusKind::Info, message);
    }

    /// Set the progress bar; values above 100 are clamped.
    pub fn set_progress(&self, percent: u8) {
        let mut inner = self.inner.write();
        inner.progress = Some(percent.min(100));
        inner.revision += 1;
    }

    pub fn hide_progress(&self) {
        let mut inner = self.inner.write();
        inner.progress = None;
        inner.revision += 1;
    }

    pub fn current(&self) -> Option<StatusEntry> {
        self.inner.read().current.clone()
    }

    pub fn progress_value(&self) -> Option<u8> {
        self.inner.read().progress
    }

    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = self.inner.read();
        StatusSnapshot {
            current: inner.current.clone(),
            progress: inner.progress,
            revision: inner.revision,
        }
    }

    /// History entries with `seq > after`, oldest first.
    pub fn entries_since(&self, after: u64) -> Vec<StatusEntry> {
        self.inner
            .read()
            .history
            .iter()
            .filter(|e| e.seq > after)
            .cloned()
            .collect()
    }
}

impl ProgressSink for StatusTracker {
    fn progress(&self, percent: u8) {
        self.set_progress(percent);
    }

    fn report(&self, kind: StatusKind, message: &str) {
        self.set(kind, message);
    }
}
