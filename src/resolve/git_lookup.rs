//! resolve::git_lookup
//!
//! Revision lookup over a local git checkout.
//!
//! # Design
//!
//! Implements [`RevisionLookup`] with libgit2: `annotate` runs a blame of
//! the file at HEAD and flattens the hunks into one revision id per line;
//! `committer_of` reads the committer signature of a commit. libgit2 is
//! synchronous, so both run on the blocking pool, and the repository is
//! opened per call (a `git2::Repository` is not `Sync`).

use std::path::PathBuf;

use async_trait::async_trait;
use git2::{BlameOptions, Oid, Repository};

use super::lookup::{LookupError, RevisionHistory, RevisionId, RevisionLookup};

/// [`RevisionLookup`] backed by a local git repository.
#[derive(Debug, Clone)]
pub struct GitRevisionLookup {
    /// Path to the repository's working directory.
    repo_path: PathBuf,
}

impl GitRevisionLookup {
    /// Create a lookup over the repository at `repo_path`.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    fn open(repo_path: &PathBuf) -> Result<Repository, LookupError> {
        Repository::open(repo_path).map_err(|e| LookupError::Backend(e.message().to_string()))
    }
}

#[async_trait]
impl RevisionLookup for GitRevisionLookup {
    async fn annotate(&self, file_path: &str) -> Result<RevisionHistory, LookupError> {
        let repo_path = self.repo_path.clone();
        let path = PathBuf::from(file_path);
        let display_path = file_path.to_string();

        tokio::task::spawn_blocking(move || {
            let repo = Self::open(&repo_path)?;
            let mut options = BlameOptions::new();
            let blame = repo
                .blame_file(&path, Some(&mut options))
                .map_err(|e| LookupError::Annotate {
                    path: display_path.clone(),
                    reason: e.message().to_string(),
                })?;

            // Hunks come back ordered by final line; flatten to one
            // revision id per line.
            let mut history = RevisionHistory::new();
            for hunk in blame.iter() {
                let id = hunk.final_commit_id().to_string();
                for _ in 0..hunk.lines_in_hunk() {
                    history.push(RevisionId::new(id.clone()));
                }
            }
            Ok(history)
        })
        .await
        .map_err(|e| LookupError::Backend(format!("blame task failed: {e}")))?
    }

    async fn committer_of(&self, revision: &RevisionId) -> Result<String, LookupError> {
        let repo_path = self.repo_path.clone();
        let revision = revision.clone();

        tokio::task::spawn_blocking(move || {
            let repo = Self::open(&repo_path)?;
            let oid = Oid::from_str(revision.as_str())
                .map_err(|_| LookupError::UnknownRevision(revision.to_string()))?;
            let commit = repo
                .find_commit(oid)
                .map_err(|_| LookupError::UnknownRevision(revision.to_string()))?;

            let committer = commit.committer();
            let identity = committer
                .name()
                .filter(|n| !n.is_empty())
                .or_else(|| committer.email())
                .unwrap_or_default()
                .to_string();
            Ok(identity)
        })
        .await
        .map_err(|e| LookupError::Backend(format!("committer task failed: {e}")))?
    }
}
