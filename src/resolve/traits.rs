//! resolve::traits
//!
//! Author-resolution strategy contract.
//!
//! # Design
//!
//! Both strategies — the cheap direct-field copy and the history-backed
//! lookup — satisfy one contract and share no state; the pipeline selects
//! one from configuration and holds it as a trait object.
//!
//! `resolve_all` is infallible by design: a resolution failure is a
//! per-issue event that is logged and leaves that issue's
//! `resolved_author` empty. Aborting the whole batch is never the
//! strategy's decision.

use async_trait::async_trait;

use crate::core::types::Issue;

/// Resolves the author of every issue in a batch.
///
/// Implementations mutate each issue's `resolved_author` in place and
/// must leave it empty for issues they cannot attribute.
#[async_trait]
pub trait AuthorResolver: Send + Sync {
    /// Resolve the authors of `issues`.
    ///
    /// Returns only after every issue has been attempted; callers may
    /// rely on that as a synchronization barrier before aggregation.
    async fn resolve_all(&self, issues: &mut [Issue]);
}
