//! core::types
//!
//! Domain types for the resolution and aggregation pipeline.
//!
//! # Types
//!
//! - [`Issue`] - One static-analysis finding with location, kind, severity
//! - [`IssueKind`] / [`Severity`] - Scanner classification of a finding
//! - [`AuthorIdentity`] - Resolved author of an issue (account and/or email)
//! - [`UserInfo`] - A directory entry describing a recipient
//! - [`Report`] / [`FileReport`] - Per-recipient bundle of ranked issues
//! - [`CoverageSummary`] - Test failure counts from the scanner
//!
//! # Lifecycle
//!
//! An [`Issue`] is created once per fetch cycle, mutated exactly once by a
//! resolver (the `resolved_author` field), and read-only thereafter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel line number meaning "unknown line".
///
/// Some scanners report file-level findings without a line; the
/// history-backed resolver substitutes line 1 for these.
pub const UNKNOWN_LINE: i64 = -1;

/// Classification of a finding, as reported by the scanner.
///
/// Unknown values deserialize to [`IssueKind::Other`] rather than failing,
/// since scanners grow new kinds over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    Bug,
    Vulnerability,
    CodeSmell,
    #[serde(other)]
    Other,
}

/// Severity of a finding, as reported by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Blocker,
    Critical,
    Major,
    Minor,
    Info,
    #[serde(other)]
    Other,
}

/// One static-analysis finding.
///
/// # Example
///
/// ```
/// use blamecast::core::types::{Issue, IssueKind, Severity};
///
/// let issue = Issue::new(
///     "AYx1",
///     "acme:super-project:src/safe_dictionary.rs",
///     "rust:S2931",
///     "Dispose of this resource",
///     "src/safe_dictionary.rs",
///     42,
///     IssueKind::Bug,
///     Severity::Major,
///     Some("dev@example.com".to_string()),
/// );
/// assert!(issue.resolved_author.is_anonymous());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable identifier of the issue in the scanner.
    pub key: String,
    /// Owning component path in the scanner
    /// (e.g. `acme:super-project:src/safe_dictionary.rs`).
    pub component: String,
    /// Rule identifier (e.g. `rust:S2931`).
    pub rule: String,
    /// Human-readable message.
    pub message: String,
    /// File path, relative to the repository root.
    pub file_path: String,
    /// 1-based line number, or [`UNKNOWN_LINE`] when the scanner did not
    /// attach one.
    pub line: i64,
    /// Kind of finding.
    pub kind: IssueKind,
    /// Severity of the finding.
    pub severity: Severity,
    /// Raw author hint supplied by the scanner (an email for git-backed
    /// projects), if any.
    pub author_hint: Option<String>,
    /// Identity attributed to the issue by a resolver. Empty until
    /// resolution runs; empty afterwards means "unresolved".
    pub resolved_author: AuthorIdentity,
}

impl Issue {
    /// Create an unresolved issue.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        key: impl Into<String>,
        component: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
        file_path: impl Into<String>,
        line: i64,
        kind: IssueKind,
        severity: Severity,
        author_hint: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            component: component.into(),
            rule: rule.into(),
            message: message.into(),
            file_path: file_path.into(),
            line,
            kind,
            severity,
            author_hint,
            resolved_author: AuthorIdentity::default(),
        }
    }
}

/// The identity attributed to an issue after resolution.
///
/// At least one of the fields should be present after a successful
/// resolution; both absent means "unresolved" and routes the issue to the
/// anonymous bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorIdentity {
    /// Account name in the version-control system (e.g. a domain login).
    pub account_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
}

impl AuthorIdentity {
    /// Identity carrying only an account name.
    pub fn from_account(account: impl Into<String>) -> Self {
        Self {
            account_name: some_nonempty(account.into()),
            email: None,
        }
    }

    /// Identity carrying only an email.
    pub fn from_email(email: impl Into<String>) -> Self {
        Self {
            account_name: None,
            email: some_nonempty(email.into()),
        }
    }

    /// True when neither an account name nor an email is present.
    pub fn is_anonymous(&self) -> bool {
        self.grouping_key().is_empty()
    }

    /// Serialized grouping key: account name if present, else email, else
    /// the empty string (the anonymous bucket).
    pub fn grouping_key(&self) -> &str {
        nonempty(&self.account_name)
            .or_else(|| nonempty(&self.email))
            .unwrap_or("")
    }

    /// Equivalence used when matching a candidate against this identity:
    /// non-empty account names equal, or non-empty emails equal.
    pub fn matches(&self, candidate: &AuthorIdentity) -> bool {
        if let Some(account) = nonempty(&self.account_name) {
            if Some(account) == nonempty(&candidate.account_name) {
                return true;
            }
        }
        if let Some(email) = nonempty(&self.email) {
            if Some(email) == nonempty(&candidate.email) {
                return true;
            }
        }
        false
    }
}

impl std::fmt::Display for AuthorIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_anonymous() {
            write!(f, "<unresolved>")
        } else {
            write!(f, "{}", self.grouping_key())
        }
    }
}

fn nonempty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

fn some_nonempty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// A directory entry describing a report recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Account name in the directory.
    pub account_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
}

impl UserInfo {
    /// The well-known recipient for issues that could not be attributed
    /// to anyone.
    pub fn anonymous() -> Self {
        Self {
            account_name: Some("anonymous".to_string()),
            email: Some("anonymous@anonymous.invalid".to_string()),
            display_name: Some("Anonymous".to_string()),
        }
    }

    /// True when the entry carries an email address.
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// The identity this entry answers for, used when matching against
    /// resolution criteria.
    pub fn identity(&self) -> AuthorIdentity {
        AuthorIdentity {
            account_name: self.account_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Issues of one report that share a file, in rank order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// Repository-relative file path.
    pub file_path: String,
    /// Issues in this file, ordered by rank.
    pub issues: Vec<Issue>,
}

/// Per-recipient bundle of ranked, capped, file-grouped issues.
///
/// Exactly one report exists per distinct resolved-author grouping key
/// (including the anonymous bucket when at least one issue failed to
/// resolve).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Project the issues belong to.
    pub project_name: String,
    /// Primary recipient (first directory match, or anonymous).
    pub main_recipient: UserInfo,
    /// Every recipient the directory returned for this author.
    pub recipients: Vec<UserInfo>,
    /// Ranked issues grouped by file, in first-occurrence order after
    /// ranking.
    pub file_reports: Vec<FileReport>,
    /// Total issue count for this author before capping, so recipients
    /// can see how many were omitted.
    pub warning_count: usize,
    /// When the report was assembled.
    pub generated_at: DateTime<Utc>,
}

impl Report {
    /// Total number of issues retained after capping.
    pub fn issue_count(&self) -> usize {
        self.file_reports.iter().map(|f| f.issues.len()).sum()
    }
}

/// Test-coverage summary fetched alongside the issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSummary {
    /// Number of failed tests.
    pub failed_tests: u64,
    /// Number of errored tests.
    pub errored_tests: u64,
}

impl CoverageSummary {
    /// True when there is nothing to report.
    pub fn is_green(&self) -> bool {
        self.failed_tests == 0 && self.errored_tests == 0
    }
}
