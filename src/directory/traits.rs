//! directory::traits
//!
//! User-directory abstraction for recipient lookup.
//!
//! # Design
//!
//! The aggregator needs to turn a resolved author identity into concrete
//! recipients (account, email, display name). The directory behind that
//! — LDAP, a REST service, a flat file — is not this crate's concern, so
//! it sits behind one async trait. An empty result is a valid answer
//! ("nobody known for this identity"); the routing decision for that case
//! belongs to the caller.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{AuthorIdentity, UserInfo};

/// Errors from directory lookups.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The directory could not be reached.
    #[error("directory unreachable: {0}")]
    Unreachable(String),

    /// The directory answered with an error.
    #[error("directory lookup failed: {0}")]
    LookupFailed(String),
}

/// Looks up users matching an author identity.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Users matching `identity` (non-empty account name equal, or
    /// non-empty email equal), in the directory's preference order.
    ///
    /// An empty result is valid and means "no match".
    ///
    /// # Errors
    ///
    /// Returns a [`DirectoryError`] when the directory itself fails;
    /// callers treat this as a recoverable per-group event.
    async fn find_users(&self, identity: &AuthorIdentity) -> Result<Vec<UserInfo>, DirectoryError>;
}
