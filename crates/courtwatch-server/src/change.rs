//! Change detection between polls.
//!
//! A poll's result is reduced to an order-stable summary string. A
//! notification is due when the summary is non-empty and differs from the
//! one last committed. The cached summary lives only in memory and starts
//! empty at process start.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

/// Shared change detector, locked for the whole of a poll.
pub type SharedChangeDetector = Arc<Mutex<ChangeDetector>>;

/// Creates a new shared change detector with an empty summary.
pub fn new_change_detector() -> SharedChangeDetector {
    Arc::new(Mutex::new(ChangeDetector::new()))
}

/// Builds the summary of one poll: today's lines then tomorrow's, one per line.
pub fn summary(today: &[String], tomorrow: &[String]) -> String {
    today
        .iter()
        .chain(tomorrow)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns true if `new` warrants a notification given the `cached` summary.
///
/// An empty summary never notifies. Any byte difference does, reordering
/// included.
pub fn should_notify(new: &str, cached: &str) -> bool {
    !new.is_empty() && new != cached
}

/// Short SHA-256 fingerprint of a summary, for logs.
pub fn summary_digest(summary: &str) -> String {
    let digest = Sha256::digest(summary.as_bytes());
    hex::encode(&digest[..8])
}

/// Holds the last committed summary.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: String,
}

impl ChangeDetector {
    /// Creates a detector with an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `new` differs from the committed summary and is non-empty.
    pub fn should_notify(&self, new: &str) -> bool {
        should_notify(new, &self.last)
    }

    /// Replaces the committed summary.
    pub fn commit(&mut self, new: String) {
        self.last = new;
    }

    /// Returns the committed summary.
    pub fn last_summary(&self) -> &str {
        &self.last
    }
}
