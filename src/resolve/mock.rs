//! resolve::mock
//!
//! Mock revision lookup for deterministic testing.
//!
//! # Design
//!
//! The mock serves scripted answers from memory and records every call,
//! so tests can assert both resolution results and how often the
//! expensive lookups were actually invoked (the whole point of the
//! single-flight caches). Per-call scripts allow modelling transient
//! behavior such as an empty annotation on the first attempt.
//!
//! # Example
//!
//! ```
//! use blamecast::resolve::mock::MockLookup;
//! use blamecast::resolve::{RevisionId, RevisionLookup};
//!
//! # tokio_test::block_on(async {
//! let lookup = MockLookup::new();
//! lookup.set_history("src/a.rs", vec![RevisionId::new("c1")]);
//! lookup.set_committer(RevisionId::new("c1"), "alice");
//!
//! let history = lookup.annotate("src/a.rs").await.unwrap();
//! assert_eq!(history.len(), 1);
//! assert_eq!(lookup.annotate_calls("src/a.rs"), 1);
//! # });
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::lookup::{LookupError, RevisionHistory, RevisionId, RevisionLookup};

/// Mock revision lookup for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockLookup {
    inner: Arc<Mutex<MockLookupInner>>,
}

#[derive(Debug, Default)]
struct MockLookupInner {
    /// Steady-state per-file histories.
    histories: HashMap<String, RevisionHistory>,
    /// Scripted per-file answers, consumed in order before `histories`.
    annotate_script: HashMap<String, VecDeque<RevisionHistory>>,
    /// Committer per revision.
    committers: HashMap<RevisionId, String>,
    /// Files whose annotation should fail hard.
    fail_annotate: Vec<String>,
    /// Revisions whose committer lookup should fail hard.
    fail_committer: Vec<RevisionId>,
    /// Recorded annotate calls.
    annotate_calls: Vec<String>,
    /// Recorded committer calls.
    committer_calls: Vec<RevisionId>,
}

impl MockLookup {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the steady-state history for a file.
    pub fn set_history(&self, file_path: impl Into<String>, history: RevisionHistory) {
        self.lock().histories.insert(file_path.into(), history);
    }

    /// Queue one scripted annotate answer for a file. Scripted answers
    /// are served in order before the steady-state history.
    pub fn push_annotate_result(&self, file_path: impl Into<String>, history: RevisionHistory) {
        self.lock()
            .annotate_script
            .entry(file_path.into())
            .or_default()
            .push_back(history);
    }

    /// Set the committer for a revision.
    pub fn set_committer(&self, revision: RevisionId, committer: impl Into<String>) {
        self.lock().committers.insert(revision, committer.into());
    }

    /// Make annotation of a file fail with a backend error.
    pub fn fail_annotate(&self, file_path: impl Into<String>) {
        self.lock().fail_annotate.push(file_path.into());
    }

    /// Make the committer lookup for a revision fail.
    pub fn fail_committer(&self, revision: RevisionId) {
        self.lock().fail_committer.push(revision);
    }

    /// How many times `annotate` was called for a file.
    pub fn annotate_calls(&self, file_path: &str) -> usize {
        self.lock()
            .annotate_calls
            .iter()
            .filter(|p| p.as_str() == file_path)
            .count()
    }

    /// How many times `committer_of` was called for a revision.
    pub fn committer_calls(&self, revision: &RevisionId) -> usize {
        self.lock()
            .committer_calls
            .iter()
            .filter(|r| *r == revision)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockLookupInner> {
        self.inner.lock().expect("mock lookup poisoned")
    }
}

#[async_trait]
impl RevisionLookup for MockLookup {
    async fn annotate(&self, file_path: &str) -> Result<RevisionHistory, LookupError> {
        let mut inner = self.lock();
        inner.annotate_calls.push(file_path.to_string());

        if inner.fail_annotate.iter().any(|p| p == file_path) {
            return Err(LookupError::Annotate {
                path: file_path.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        if let Some(script) = inner.annotate_script.get_mut(file_path) {
            if let Some(history) = script.pop_front() {
                return Ok(history);
            }
        }

        Ok(inner.histories.get(file_path).cloned().unwrap_or_default())
    }

    async fn committer_of(&self, revision: &RevisionId) -> Result<String, LookupError> {
        let mut inner = self.lock();
        inner.committer_calls.push(revision.clone());

        if inner.fail_committer.iter().any(|r| r == revision) {
            return Err(LookupError::Backend("injected failure".to_string()));
        }

        inner
            .committers
            .get(revision)
            .cloned()
            .ok_or_else(|| LookupError::UnknownRevision(revision.to_string()))
    }
}
