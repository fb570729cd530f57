//! source::mock
//!
//! In-memory issue source for deterministic testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{IssueSource, SourceError};
use crate::core::types::{CoverageSummary, Issue};

/// Mock source serving a fixed issue list and coverage summary.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    inner: Arc<Mutex<MockSourceInner>>,
}

#[derive(Debug, Default)]
struct MockSourceInner {
    issues: Vec<Issue>,
    coverage: CoverageSummary,
    fail_issues: bool,
    fail_coverage: bool,
}

impl MockSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the issues to serve.
    pub fn set_issues(&self, issues: Vec<Issue>) {
        self.lock().issues = issues;
    }

    /// Set the coverage summary to serve.
    pub fn set_coverage(&self, coverage: CoverageSummary) {
        self.lock().coverage = coverage;
    }

    /// Make `fetch_issues` fail.
    pub fn fail_issues(&self) {
        self.lock().fail_issues = true;
    }

    /// Make `fetch_coverage_summary` fail.
    pub fn fail_coverage(&self) {
        self.lock().fail_coverage = true;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockSourceInner> {
        self.inner.lock().expect("mock source poisoned")
    }
}

#[async_trait]
impl IssueSource for MockSource {
    async fn fetch_issues(&self) -> Result<Vec<Issue>, SourceError> {
        let inner = self.lock();
        if inner.fail_issues {
            return Err(SourceError::Network("injected failure".to_string()));
        }
        Ok(inner.issues.clone())
    }

    async fn fetch_coverage_summary(&self) -> Result<CoverageSummary, SourceError> {
        let inner = self.lock();
        if inner.fail_coverage {
            return Err(SourceError::Network("injected failure".to_string()));
        }
        Ok(inner.coverage)
    }
}
