//! publish
//!
//! Report-consumer abstraction.
//!
//! The pipeline hands finished reports (and the occasional coverage
//! notice) to a sink and makes no assumption about delivery — mail,
//! chat, a dashboard, a test fixture. Transport and templating live
//! behind this trait, outside this crate.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{CoverageSummary, Report};

/// Errors from publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The sink rejected or failed to deliver the payload.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Receives the finished reports of one pipeline run.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Deliver per-recipient issue reports, in aggregation order.
    async fn publish_reports(&self, reports: &[Report]) -> Result<(), PublishError>;

    /// Deliver a coverage notice (only called when coverage is not
    /// green).
    async fn publish_coverage(
        &self,
        project_name: &str,
        summary: &CoverageSummary,
    ) -> Result<(), PublishError>;
}

/// Mock sink recording everything it receives.
#[derive(Debug, Clone, Default)]
pub struct MockSink {
    inner: Arc<Mutex<MockSinkInner>>,
}

#[derive(Debug, Default)]
struct MockSinkInner {
    reports: Vec<Report>,
    coverage: Vec<(String, CoverageSummary)>,
}

impl MockSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received so far, across all publishes.
    pub fn reports(&self) -> Vec<Report> {
        self.lock().reports.clone()
    }

    /// Coverage notices received so far.
    pub fn coverage_notices(&self) -> Vec<(String, CoverageSummary)> {
        self.lock().coverage.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockSinkInner> {
        self.inner.lock().expect("mock sink poisoned")
    }
}

#[async_trait]
impl ReportSink for MockSink {
    async fn publish_reports(&self, reports: &[Report]) -> Result<(), PublishError> {
        self.lock().reports.extend_from_slice(reports);
        Ok(())
    }

    async fn publish_coverage(
        &self,
        project_name: &str,
        summary: &CoverageSummary,
    ) -> Result<(), PublishError> {
        self.lock()
            .coverage
            .push((project_name.to_string(), *summary));
        Ok(())
    }
}
