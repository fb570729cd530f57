//! resolve::history
//!
//! History-backed author resolution.
//!
//! # Design
//!
//! Each issue resolves independently: annotate the issue's file to get
//! the per-line revision history, take the revision that last touched the
//! issue's line, and ask the backend who committed it. Both answers are
//! expensive, so they go through [`SingleFlightCache`]s — one keyed by
//! file path, one by revision id — shared by every worker of the batch.
//!
//! Resolution runs with bounded parallelism (a semaphore of
//! `worker_count` permits). No ordering exists between issues; the caller
//! gets control back only after every worker has finished, which is the
//! barrier the aggregation stage relies on.
//!
//! # Failure policy
//!
//! - Empty annotation: retried up to `annotate_attempts` times inside the
//!   compute closure (under the file's single-flight lock, so retries
//!   never defeat deduplication), then accepted and cached.
//! - Line beyond the annotated history: logged as a warning, issue left
//!   unresolved.
//! - Any lookup error: logged, that one issue left unresolved, nothing
//!   cached, sibling issues unaffected.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::lookup::{LookupError, RevisionHistory, RevisionId, RevisionLookup};
use super::traits::AuthorResolver;
use crate::core::types::{AuthorIdentity, Issue, UNKNOWN_LINE};
use crate::sync::SingleFlightCache;

/// Attributes issues to authors through cached revision-history lookups.
pub struct HistoryResolver {
    inner: Arc<ResolverInner>,
}

struct ResolverInner {
    /// External history backend.
    lookup: Arc<dyn RevisionLookup>,
    /// File path → per-line revision history.
    histories: SingleFlightCache<String, RevisionHistory>,
    /// Revision id → committer identity.
    committers: SingleFlightCache<RevisionId, String>,
    /// Concurrent per-issue resolutions.
    worker_count: usize,
    /// Annotate attempts before accepting an empty history.
    annotate_attempts: usize,
}

impl HistoryResolver {
    /// Create a resolver over `lookup`.
    ///
    /// `worker_count` bounds concurrent resolutions; `annotate_attempts`
    /// bounds the retry-on-empty loop. Both must be at least 1 (the
    /// config layer validates this).
    pub fn new(
        lookup: Arc<dyn RevisionLookup>,
        worker_count: usize,
        annotate_attempts: usize,
    ) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                lookup,
                histories: SingleFlightCache::new(),
                committers: SingleFlightCache::new(),
                worker_count: worker_count.max(1),
                annotate_attempts: annotate_attempts.max(1),
            }),
        }
    }

    /// Number of files whose history has been cached so far.
    pub fn cached_files(&self) -> usize {
        self.inner.histories.len()
    }

    /// Number of revisions whose committer has been cached so far.
    pub fn cached_revisions(&self) -> usize {
        self.inner.committers.len()
    }
}

impl ResolverInner {
    /// Resolve one issue's committer, or `None` when the issue cannot be
    /// attributed (line out of range, empty history).
    async fn resolve_one(
        &self,
        file_path: &str,
        issue_line: i64,
    ) -> Result<Option<String>, LookupError> {
        // Unknown-line sentinel (and anything else non-positive) folds to
        // line 1: file-level findings are attributed to the first line.
        let line: usize = if issue_line < 1 { 1 } else { issue_line as usize };

        let history = self.file_history(file_path).await?;
        if history.len() < line {
            warn!(
                path = %file_path,
                line,
                available = history.len(),
                "cannot attribute a line beyond the annotated history"
            );
            return Ok(None);
        }

        let revision = history[line - 1].clone();
        let committer = self.committer(revision).await?;
        Ok(Some(committer))
    }

    /// Cached per-line history of a file, with bounded retry on empty
    /// annotations.
    async fn file_history(&self, file_path: &str) -> Result<RevisionHistory, LookupError> {
        let lookup = Arc::clone(&self.lookup);
        let attempts = self.annotate_attempts;
        self.histories
            .get_or_compute(file_path.to_string(), |path| async move {
                let mut history = RevisionHistory::new();
                for attempt in 1..=attempts {
                    debug!(path = %path, attempt, "annotate");
                    history = lookup.annotate(&path).await?;
                    if !history.is_empty() {
                        break;
                    }
                }
                if history.is_empty() {
                    warn!(path = %path, attempts, "annotation still empty after retries");
                }
                Ok(history)
            })
            .await
    }

    /// Cached committer of a revision.
    async fn committer(&self, revision: RevisionId) -> Result<String, LookupError> {
        let lookup = Arc::clone(&self.lookup);
        self.committers
            .get_or_compute(revision, |rev| async move {
                debug!(revision = %rev, "committer lookup");
                lookup.committer_of(&rev).await
            })
            .await
    }
}

#[async_trait]
impl AuthorResolver for HistoryResolver {
    async fn resolve_all(&self, issues: &mut [Issue]) {
        let semaphore = Arc::new(Semaphore::new(self.inner.worker_count));
        let mut workers: JoinSet<(usize, Option<String>)> = JoinSet::new();

        for (index, issue) in issues.iter().enumerate() {
            let inner = Arc::clone(&self.inner);
            let semaphore = Arc::clone(&semaphore);
            let file_path = issue.file_path.clone();
            let line = issue.line;
            let issue_key = issue.key.clone();

            workers.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    // The semaphore is never closed while workers run.
                    Err(_) => return (index, None),
                };
                match inner.resolve_one(&file_path, line).await {
                    Ok(committer) => (index, committer),
                    Err(err) => {
                        warn!(
                            issue = %issue_key,
                            path = %file_path,
                            error = %err,
                            "author resolution failed"
                        );
                        (index, None)
                    }
                }
            });
        }

        // Full barrier: every worker finishes before the batch returns.
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, Some(committer))) => {
                    issues[index].resolved_author = AuthorIdentity::from_account(committer);
                }
                Ok((_, None)) => {}
                Err(err) => warn!(error = %err, "resolver worker panicked"),
            }
        }
    }
}
