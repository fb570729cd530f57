//! source::scanner
//!
//! HTTP client for a SonarQube-style scanner API.
//!
//! # Design
//!
//! Thin boundary plumbing: page through `/api/issues/search` per issue
//! type (most urgent types first, so the fetch cap keeps the issues that
//! matter), map the wire issues into domain [`Issue`]s, and read the
//! test-failure metrics from `/api/measures/component`. Blacklisted
//! rules are dropped at fetch time so no later stage sees them.
//!
//! Authentication is a user token sent as the basic-auth username with an
//! empty password, which is what scanners of this family expect.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::traits::{IssueSource, SourceError};
use crate::core::types::{CoverageSummary, Issue, IssueKind, Severity, UNKNOWN_LINE};

/// Metrics requested for the coverage summary.
const COVERAGE_METRICS: &str = "test_failures,test_errors";

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

/// Connection settings for the scanner API.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Base URL of the scanner (e.g. `https://sonar.example.com`).
    pub base_url: String,
    /// Project key whose issues to fetch.
    pub project_key: String,
    /// User token. Required for the scanner to reveal issue authors.
    pub token: Option<String>,
    /// Issue types to fetch, in priority order.
    pub issue_types: Vec<String>,
    /// Stop fetching once this many issues are collected.
    pub max_issue_count: usize,
    /// Page size for the search endpoint.
    pub page_size: usize,
    /// Rules whose issues are dropped at fetch time.
    pub rule_blacklist: Vec<String>,
}

impl ScannerConfig {
    /// Settings for `project_key` on the scanner at `base_url`, with the
    /// historical defaults (all types, cap 200, pages of 50).
    pub fn new(base_url: impl Into<String>, project_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            project_key: project_key.into(),
            token: None,
            issue_types: ["BUG", "VULNERABILITY", "SECURITY_HOTSPOT", "CODE_SMELL"]
                .map(String::from)
                .to_vec(),
            max_issue_count: 200,
            page_size: 50,
            rule_blacklist: Vec::new(),
        }
    }
}

/// [`IssueSource`] over a scanner HTTP API.
#[derive(Debug, Clone)]
pub struct ScannerClient {
    client: Client,
    config: ScannerConfig,
}

/// One page of `/api/issues/search`.
#[derive(Debug, Deserialize)]
struct IssueSearchPage {
    issues: Vec<WireIssue>,
}

/// Issue as the scanner serializes it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIssue {
    key: String,
    component: String,
    rule: String,
    message: String,
    #[serde(default)]
    line: Option<i64>,
    #[serde(default)]
    text_range: Option<WireTextRange>,
    #[serde(rename = "type")]
    kind: IssueKind,
    severity: Severity,
    #[serde(default)]
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTextRange {
    start_line: i64,
}

/// `/api/measures/component` response.
#[derive(Debug, Deserialize)]
struct MeasuresOutput {
    component: MeasuresComponent,
}

#[derive(Debug, Deserialize)]
struct MeasuresComponent {
    #[serde(default)]
    measures: Vec<WireMeasure>,
}

#[derive(Debug, Deserialize)]
struct WireMeasure {
    metric: String,
    value: String,
}

impl ScannerClient {
    /// Create a client for the scanner described by `config`.
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut request = self.client.get(&url).query(query);
        if let Some(token) = &self.config.token {
            request = request.basic_auth(token, Some(""));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Api {
                status: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))
    }

    async fn fetch_page(
        &self,
        issue_type: &str,
        page: usize,
    ) -> Result<IssueSearchPage, SourceError> {
        debug!(issue_type, page, "scanner issue search");
        let page_size = self.config.page_size.to_string();
        let page_index = page.to_string();
        self.get_json(
            "/api/issues/search",
            &[
                ("componentKeys", self.config.project_key.as_str()),
                ("ps", page_size.as_str()),
                ("p", page_index.as_str()),
                ("s", "SEVERITY"),
                ("asc", "false"),
                ("types", issue_type),
                ("statuses", "OPEN"),
            ],
        )
        .await
    }

    /// Strip the project-key prefix from a component to get the
    /// repository-relative file path.
    fn file_path(&self, component: &str) -> String {
        component
            .strip_prefix(&format!("{}:", self.config.project_key))
            .unwrap_or(component)
            .to_string()
    }

    fn parse_issue(&self, wire: WireIssue) -> Issue {
        let line = wire
            .line
            .or(wire.text_range.map(|r| r.start_line))
            .unwrap_or(UNKNOWN_LINE);
        Issue::new(
            wire.key,
            wire.component.clone(),
            wire.rule,
            wire.message,
            self.file_path(&wire.component),
            line,
            wire.kind,
            wire.severity,
            wire.author.filter(|a| !a.is_empty()),
        )
    }
}

#[async_trait::async_trait]
impl IssueSource for ScannerClient {
    async fn fetch_issues(&self) -> Result<Vec<Issue>, SourceError> {
        let mut issues = Vec::new();

        'types: for issue_type in &self.config.issue_types {
            let mut page = 0;
            loop {
                if issues.len() >= self.config.max_issue_count {
                    break 'types;
                }
                page += 1;
                let result = self.fetch_page(issue_type, page).await?;
                if result.issues.is_empty() {
                    break;
                }
                for wire in result.issues {
                    if issues.len() >= self.config.max_issue_count {
                        break 'types;
                    }
                    let issue = self.parse_issue(wire);
                    if self.config.rule_blacklist.contains(&issue.rule) {
                        debug!(rule = %issue.rule, key = %issue.key, "blacklisted rule, skipping");
                        continue;
                    }
                    issues.push(issue);
                }
            }
        }

        Ok(issues)
    }

    async fn fetch_coverage_summary(&self) -> Result<CoverageSummary, SourceError> {
        let output: MeasuresOutput = self
            .get_json(
                "/api/measures/component",
                &[
                    ("component", self.config.project_key.as_str()),
                    ("metricKeys", COVERAGE_METRICS),
                ],
            )
            .await?;

        let mut summary = CoverageSummary::default();
        for measure in output.component.measures {
            let value = measure.value.parse::<u64>().unwrap_or_else(|_| {
                warn!(metric = %measure.metric, value = %measure.value, "non-numeric measure");
                0
            });
            match measure.metric.as_str() {
                "test_failures" => summary.failed_tests = value,
                "test_errors" => summary.errored_tests = value,
                _ => {}
            }
        }
        Ok(summary)
    }
}
