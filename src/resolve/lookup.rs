//! resolve::lookup
//!
//! Boundary trait for revision-history lookups.
//!
//! # Design
//!
//! The history-backed resolver needs two expensive external answers: "who
//! last touched each line of this file" and "who committed this
//! revision". The mechanism behind them — shelling out to a VCS tool,
//! calling a library, hitting an API — is deliberately abstracted behind
//! this narrow trait; only the contract matters:
//!
//! - `annotate` returns the per-line revision ids of a file, ordered and
//!   1-based by position. An *empty* sequence is a legitimate answer for
//!   a transient backend failure (callers layer their retry policy on
//!   top of it).
//! - `committer_of` returns the committer identity for one revision.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from revision-history lookups.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The file could not be annotated.
    #[error("annotate failed for {path}: {reason}")]
    Annotate {
        /// Repository-relative file path.
        path: String,
        /// Backend-specific reason.
        reason: String,
    },

    /// The revision has no committer record.
    #[error("unknown revision: {0}")]
    UnknownRevision(String),

    /// The backend itself failed (unreachable, corrupt, ...).
    #[error("lookup backend error: {0}")]
    Backend(String),
}

/// Identifier of one revision in the history backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionId(String);

impl RevisionId {
    /// Wrap a backend-native revision identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RevisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-line revision history of one file.
///
/// Index 0 holds the revision that last touched line 1.
pub type RevisionHistory = Vec<RevisionId>;

/// External lookup of line-level and revision-level history.
#[async_trait]
pub trait RevisionLookup: Send + Sync {
    /// Revision ids of a file, one per line, ordered by line number.
    ///
    /// An empty result means the backend transiently failed to produce
    /// an annotation, not that the file has zero lines worth of history.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] for non-transient failures.
    async fn annotate(&self, file_path: &str) -> Result<RevisionHistory, LookupError>;

    /// Committer identity of one revision.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownRevision`] when the backend has no
    /// record of `revision`.
    async fn committer_of(&self, revision: &RevisionId) -> Result<String, LookupError>;
}
