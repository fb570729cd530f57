//! directory::mock
//!
//! In-memory user directory for deterministic testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{DirectoryError, UserDirectory};
use crate::core::types::{AuthorIdentity, UserInfo};

/// Mock directory serving a fixed roster.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
    inner: Arc<Mutex<MockDirectoryInner>>,
}

#[derive(Debug, Default)]
struct MockDirectoryInner {
    /// Known users, matched by identity equivalence.
    roster: Vec<UserInfo>,
    /// When set, every lookup fails with this error.
    fail_with: Option<DirectoryError>,
    /// Recorded lookups.
    lookups: Vec<AuthorIdentity>,
}

impl MockDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user to the roster.
    pub fn add_user(&self, user: UserInfo) {
        self.lock().roster.push(user);
    }

    /// Make every lookup fail.
    pub fn fail_with(&self, error: DirectoryError) {
        self.lock().fail_with = Some(error);
    }

    /// Number of lookups performed.
    pub fn lookup_count(&self) -> usize {
        self.lock().lookups.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockDirectoryInner> {
        self.inner.lock().expect("mock directory poisoned")
    }
}

#[async_trait]
impl UserDirectory for MockDirectory {
    async fn find_users(&self, identity: &AuthorIdentity) -> Result<Vec<UserInfo>, DirectoryError> {
        let mut inner = self.lock();
        inner.lookups.push(identity.clone());

        if let Some(err) = &inner.fail_with {
            return Err(err.clone());
        }

        Ok(inner
            .roster
            .iter()
            .filter(|user| identity.matches(&user.identity()))
            .cloned()
            .collect())
    }
}
