//! pipeline
//!
//! End-to-end orchestration: fetch → resolve → aggregate → publish.
//!
//! # Design
//!
//! The pipeline owns its collaborators as trait objects and runs them in
//! a fixed order. Resolution is the only concurrent stage; `resolve_all`
//! returns only after every worker finishes, so aggregation always
//! observes fully-resolved issues. The coverage branch runs after the
//! issue branch and publishes only when coverage is not green.
//!
//! Per-issue and per-group failures are absorbed by the stages that own
//! them; only source and sink failures abort the run, and that decision
//! surfaces to the caller as a [`PipelineError`].

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::{PipelineConfig, ResolverKind};
use crate::directory::UserDirectory;
use crate::publish::{PublishError, ReportSink};
use crate::report::ReportAggregator;
use crate::resolve::{AuthorResolver, DirectResolver, HistoryResolver, RevisionLookup};
use crate::source::{IssueSource, SourceError};

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The issue source failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The report sink failed.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Issues fetched from the source.
    pub issues_fetched: usize,
    /// Reports handed to the sink.
    pub reports_published: usize,
    /// Whether a coverage notice was published.
    pub coverage_published: bool,
}

/// Build the configured resolution strategy.
///
/// The history strategy needs a revision-lookup backend; the direct
/// strategy ignores it.
pub fn build_resolver(
    config: &PipelineConfig,
    lookup: Arc<dyn RevisionLookup>,
) -> Arc<dyn AuthorResolver> {
    match config.resolver {
        ResolverKind::Direct => Arc::new(DirectResolver::new()),
        ResolverKind::History => Arc::new(HistoryResolver::new(
            lookup,
            config.worker_count,
            config.annotate_attempts,
        )),
    }
}

/// Runs the full notification pipeline for one project.
pub struct Pipeline {
    project_name: String,
    source: Arc<dyn IssueSource>,
    resolver: Arc<dyn AuthorResolver>,
    aggregator: ReportAggregator,
    sink: Arc<dyn ReportSink>,
}

impl Pipeline {
    /// Assemble a pipeline from its collaborators.
    pub fn new(
        config: &PipelineConfig,
        source: Arc<dyn IssueSource>,
        resolver: Arc<dyn AuthorResolver>,
        directory: Arc<dyn UserDirectory>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            project_name: config.project_name.clone(),
            source,
            resolver,
            aggregator: ReportAggregator::new(
                directory,
                config.max_issues_per_user,
                config.routing_policy,
            ),
            sink,
        }
    }

    /// Run the issue branch, then the coverage branch.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] when the source or the sink fails;
    /// everything else degrades per issue or per group inside the
    /// stages.
    pub async fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        let mut outcome = PipelineOutcome::default();
        self.handle_issues(&mut outcome).await?;
        self.handle_coverage(&mut outcome).await?;
        Ok(outcome)
    }

    async fn handle_issues(&self, outcome: &mut PipelineOutcome) -> Result<(), PipelineError> {
        info!(project = %self.project_name, "fetching issues");
        let mut issues = self.source.fetch_issues().await?;
        outcome.issues_fetched = issues.len();
        if issues.is_empty() {
            info!("no issues returned, nothing to report");
            return Ok(());
        }
        info!(count = issues.len(), "issues fetched");

        info!("resolving authors");
        self.resolver.resolve_all(&mut issues).await;
        for issue in &issues {
            debug!(
                key = %issue.key,
                path = %issue.file_path,
                line = issue.line,
                author = %issue.resolved_author,
                "resolved"
            );
        }

        info!("building reports");
        let reports = self
            .aggregator
            .create_reports(&self.project_name, &issues)
            .await;
        info!(count = reports.len(), "reports built");

        self.sink.publish_reports(&reports).await?;
        outcome.reports_published = reports.len();
        Ok(())
    }

    async fn handle_coverage(&self, outcome: &mut PipelineOutcome) -> Result<(), PipelineError> {
        info!("fetching coverage summary");
        let summary = self.source.fetch_coverage_summary().await?;
        if summary.is_green() {
            info!("coverage green, no notice");
            return Ok(());
        }

        info!(
            failed = summary.failed_tests,
            errored = summary.errored_tests,
            "coverage not green, publishing notice"
        );
        self.sink
            .publish_coverage(&self.project_name, &summary)
            .await?;
        outcome.coverage_published = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{CoverageSummary, Issue, IssueKind, Severity};
    use crate::directory::MockDirectory;
    use crate::publish::MockSink;
    use crate::source::MockSource;

    fn issue(key: &str, author: &str) -> Issue {
        Issue::new(
            key,
            "acme:p:src/a.rs",
            "rust:S100",
            "msg",
            "src/a.rs",
            1,
            IssueKind::Bug,
            Severity::Major,
            Some(author.to_string()),
        )
    }

    fn pipeline(source: &MockSource, sink: &MockSink) -> Pipeline {
        let config = PipelineConfig {
            project_name: "super-project".to_string(),
            ..PipelineConfig::default()
        };
        Pipeline::new(
            &config,
            Arc::new(source.clone()),
            Arc::new(DirectResolver::new()),
            Arc::new(MockDirectory::new()),
            Arc::new(sink.clone()),
        )
    }

    #[tokio::test]
    async fn empty_fetch_short_circuits_reporting() {
        let source = MockSource::new();
        let sink = MockSink::new();

        let outcome = pipeline(&source, &sink).run().await.expect("run");

        assert_eq!(outcome.issues_fetched, 0);
        assert_eq!(outcome.reports_published, 0);
        assert!(sink.reports().is_empty());
    }

    #[tokio::test]
    async fn publishes_one_report_per_author() {
        let source = MockSource::new();
        source.set_issues(vec![
            issue("k1", "alice@example.com"),
            issue("k2", "bob@example.com"),
            issue("k3", "alice@example.com"),
        ]);
        let sink = MockSink::new();

        let outcome = pipeline(&source, &sink).run().await.expect("run");

        assert_eq!(outcome.issues_fetched, 3);
        assert_eq!(outcome.reports_published, 2);
        let reports = sink.reports();
        assert_eq!(reports[0].project_name, "super-project");
        assert_eq!(reports[0].warning_count, 2);
    }

    #[tokio::test]
    async fn green_coverage_publishes_nothing() {
        let source = MockSource::new();
        let sink = MockSink::new();

        let outcome = pipeline(&source, &sink).run().await.expect("run");

        assert!(!outcome.coverage_published);
        assert!(sink.coverage_notices().is_empty());
    }

    #[tokio::test]
    async fn red_coverage_publishes_notice() {
        let source = MockSource::new();
        source.set_coverage(CoverageSummary {
            failed_tests: 2,
            errored_tests: 0,
        });
        let sink = MockSink::new();

        let outcome = pipeline(&source, &sink).run().await.expect("run");

        assert!(outcome.coverage_published);
        let notices = sink.coverage_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].0, "super-project");
        assert_eq!(notices[0].1.failed_tests, 2);
    }

    #[tokio::test]
    async fn source_failure_aborts_run() {
        let source = MockSource::new();
        source.fail_issues();
        let sink = MockSink::new();

        let err = pipeline(&source, &sink).run().await.expect_err("must fail");
        assert!(matches!(err, PipelineError::Source(_)));
    }

    #[tokio::test]
    async fn build_resolver_selects_strategy() {
        let lookup = Arc::new(crate::resolve::mock::MockLookup::new());

        let direct = PipelineConfig::default();
        build_resolver(&direct, lookup.clone());

        let history = PipelineConfig {
            resolver: ResolverKind::History,
            ..PipelineConfig::default()
        };
        build_resolver(&history, lookup);
    }
}
