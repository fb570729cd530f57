//! source::traits
//!
//! Issue-source abstraction.
//!
//! The pipeline treats fetched issues as already deduplicated and
//! filtered input; where they come from (a scanner HTTP API, a file, a
//! test fixture) is behind this trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{CoverageSummary, Issue};

/// Errors from the issue source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The scanner answered with a non-success status.
    #[error("scanner API error: status {status}")]
    Api {
        /// HTTP status code.
        status: u16,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// The scanner's response could not be decoded.
    #[error("malformed scanner response: {0}")]
    Malformed(String),
}

/// Supplies the issues and the coverage summary for one pipeline run.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Fetch the open issues, in scanner order.
    async fn fetch_issues(&self) -> Result<Vec<Issue>, SourceError>;

    /// Fetch the test-coverage summary.
    async fn fetch_coverage_summary(&self) -> Result<CoverageSummary, SourceError>;
}
