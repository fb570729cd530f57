//! core
//!
//! Domain types and configuration for the pipeline.

pub mod config;
pub mod types;

pub use config::{ConfigError, PipelineConfig, ResolverKind, RoutingPolicy};
pub use types::{
    AuthorIdentity, CoverageSummary, FileReport, Issue, IssueKind, Report, Severity, UserInfo,
};
