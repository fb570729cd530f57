//! resolve::direct
//!
//! Direct author resolution from the scanner's own hint.
//!
//! Git-backed scanner projects already attach the author's email to each
//! issue, so resolution is a field copy: no I/O, no concurrency, no
//! failure modes.

use async_trait::async_trait;

use super::traits::AuthorResolver;
use crate::core::types::{AuthorIdentity, Issue};

/// Copies each issue's raw author hint into its resolved email.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectResolver;

impl DirectResolver {
    /// Create the direct resolver.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuthorResolver for DirectResolver {
    async fn resolve_all(&self, issues: &mut [Issue]) {
        for issue in issues.iter_mut() {
            issue.resolved_author = match &issue.author_hint {
                Some(hint) => AuthorIdentity::from_email(hint.clone()),
                None => AuthorIdentity::default(),
            };
        }
    }
}
