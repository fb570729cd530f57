//! report
//!
//! Aggregation of resolved issues into per-recipient reports.
//!
//! # Design
//!
//! Aggregation is single-threaded and deterministic: it runs after the
//! resolution barrier and produces the same reports for the same input,
//! every time.
//!
//! 1. Issues are grouped by the resolved author's grouping key (account
//!    name, else email, else the anonymous bucket), in first-encounter
//!    order.
//! 2. Recipients come from the user directory; an unresolved group routes
//!    to the well-known anonymous recipient, and a directory *failure* is
//!    a recoverable per-group event handled by the configured
//!    [`RoutingPolicy`].
//! 3. Issues are ranked by `10 * kind + severity` (lower is more urgent),
//!    with a stable sort so ties keep fetch order, then capped at
//!    `max_issues_per_user`. `warning_count` records the uncapped size.
//! 4. The capped issues are grouped by file in first-occurrence order
//!    after ranking.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::core::config::RoutingPolicy;
use crate::core::types::{FileReport, Issue, IssueKind, Report, Severity, UserInfo};
use crate::directory::UserDirectory;

/// Rank priority of an issue kind. Bugs outrank everything.
fn kind_priority(kind: IssueKind) -> u32 {
    match kind {
        IssueKind::Bug => 1,
        IssueKind::Vulnerability => 2,
        IssueKind::CodeSmell => 3,
        IssueKind::Other => 4,
    }
}

/// Rank priority of a severity.
fn severity_priority(severity: Severity) -> u32 {
    match severity {
        Severity::Blocker => 1,
        Severity::Critical => 2,
        Severity::Major => 3,
        Severity::Minor => 4,
        Severity::Info | Severity::Other => 5,
    }
}

/// Composite rank of an issue: kind dominates severity, lower shows
/// first.
pub fn rank(issue: &Issue) -> u32 {
    10 * kind_priority(issue.kind) + severity_priority(issue.severity)
}

/// Builds per-recipient reports from resolved issues.
pub struct ReportAggregator {
    /// Recipient lookup.
    directory: Arc<dyn UserDirectory>,
    /// Maximum issues retained per recipient after ranking.
    max_issues_per_user: usize,
    /// Fallback when a group's directory lookup fails.
    routing_policy: RoutingPolicy,
}

impl ReportAggregator {
    /// Create an aggregator routing recipients through `directory`.
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        max_issues_per_user: usize,
        routing_policy: RoutingPolicy,
    ) -> Self {
        Self {
            directory,
            max_issues_per_user: max_issues_per_user.max(1),
            routing_policy,
        }
    }

    /// Aggregate `issues` into one report per distinct resolved author.
    ///
    /// Report order is the first-encounter order of author grouping keys
    /// in `issues`. Every issue lands in exactly one report; the
    /// anonymous report exists only when at least one issue failed to
    /// resolve.
    pub async fn create_reports(&self, project_name: &str, issues: &[Issue]) -> Vec<Report> {
        let groups = group_by_author(issues);

        let mut reports = Vec::with_capacity(groups.len());
        for (key, group_issues) in groups {
            let recipients = match self.recipients_for(&key, &group_issues).await {
                Some(recipients) => recipients,
                None => continue, // RoutingPolicy::Skip on a failed lookup
            };

            let main_recipient = recipients
                .first()
                .cloned()
                .unwrap_or_else(UserInfo::anonymous);

            let warning_count = group_issues.len();
            let mut ranked: Vec<Issue> = group_issues.into_iter().cloned().collect();
            ranked.sort_by_key(rank); // stable: ties keep fetch order
            ranked.truncate(self.max_issues_per_user);

            info!(
                recipient = %main_recipient.email.as_deref().unwrap_or("<none>"),
                total = warning_count,
                retained = ranked.len(),
                "report assembled"
            );

            reports.push(Report {
                project_name: project_name.to_string(),
                main_recipient,
                recipients,
                file_reports: group_by_file(ranked),
                warning_count,
                generated_at: Utc::now(),
            });
        }
        reports
    }

    /// Resolve the recipient list for one group, or `None` when the
    /// group should be skipped.
    async fn recipients_for(&self, key: &str, group_issues: &[&Issue]) -> Option<Vec<UserInfo>> {
        // Unassigned bucket: route straight to the anonymous recipient.
        if key.is_empty() {
            return Some(vec![UserInfo::anonymous()]);
        }

        // Representative identity: the group shares one grouping key, so
        // the first issue's identity stands for all of them.
        let criteria = &group_issues[0].resolved_author;

        match self.directory.find_users(criteria).await {
            Ok(users) if users.is_empty() => {
                // Known identity, unknown to the directory: address the
                // identity itself rather than dropping the report.
                Some(vec![UserInfo {
                    account_name: criteria.account_name.clone(),
                    email: criteria.email.clone(),
                    display_name: Some(key.to_string()),
                }])
            }
            Ok(users) => Some(users),
            Err(err) => match self.routing_policy {
                RoutingPolicy::Anonymous => {
                    warn!(author = %key, error = %err, "directory lookup failed, routing to anonymous");
                    Some(vec![UserInfo::anonymous()])
                }
                RoutingPolicy::Skip => {
                    warn!(author = %key, error = %err, "directory lookup failed, skipping report");
                    None
                }
            },
        }
    }
}

/// Group issues by author grouping key, in first-encounter order.
fn group_by_author(issues: &[Issue]) -> Vec<(String, Vec<&Issue>)> {
    let mut order: Vec<(String, Vec<&Issue>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for issue in issues {
        let key = issue.resolved_author.grouping_key();
        match index.get(key) {
            Some(&at) => order[at].1.push(issue),
            None => {
                index.insert(key, order.len());
                order.push((key.to_string(), vec![issue]));
            }
        }
    }
    order
}

/// Group ranked issues by file path, preserving rank order inside each
/// file and first-occurrence order across files.
fn group_by_file(ranked: Vec<Issue>) -> Vec<FileReport> {
    let mut order: Vec<FileReport> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for issue in ranked {
        match index.get(issue.file_path.as_str()) {
            Some(&at) => order[at].issues.push(issue),
            None => {
                index.insert(issue.file_path.clone(), order.len());
                order.push(FileReport {
                    file_path: issue.file_path.clone(),
                    issues: vec![issue],
                });
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AuthorIdentity;
    use crate::directory::{DirectoryError, MockDirectory};

    fn issue(key: &str, path: &str, kind: IssueKind, severity: Severity, author: &str) -> Issue {
        let mut issue = Issue::new(
            key,
            format!("acme:p:{path}"),
            "rust:S100",
            "msg",
            path,
            1,
            kind,
            severity,
            None,
        );
        if !author.is_empty() {
            issue.resolved_author = AuthorIdentity::from_account(author);
        }
        issue
    }

    fn aggregator(directory: &MockDirectory, cap: usize) -> ReportAggregator {
        ReportAggregator::new(Arc::new(directory.clone()), cap, RoutingPolicy::Anonymous)
    }

    fn roster_user(account: &str) -> UserInfo {
        UserInfo {
            account_name: Some(account.to_string()),
            email: Some(format!("{account}@example.com")),
            display_name: Some(account.to_string()),
        }
    }

    mod rank_tests {
        use super::*;

        #[test]
        fn kind_dominates_severity() {
            let bug_major = issue("a", "f", IssueKind::Bug, Severity::Major, "x");
            let smell_blocker = issue("b", "f", IssueKind::CodeSmell, Severity::Blocker, "x");
            // 10*1+3 = 13 beats 10*3+1 = 31
            assert!(rank(&bug_major) < rank(&smell_blocker));
        }

        #[test]
        fn severity_breaks_kind_ties() {
            let blocker = issue("a", "f", IssueKind::Bug, Severity::Blocker, "x");
            let info = issue("b", "f", IssueKind::Bug, Severity::Info, "x");
            assert!(rank(&blocker) < rank(&info));
        }

        #[test]
        fn unknown_classifications_sink_last() {
            let other = issue("a", "f", IssueKind::Other, Severity::Other, "x");
            assert_eq!(rank(&other), 45);
        }
    }

    mod grouping_tests {
        use super::*;

        #[tokio::test]
        async fn groups_in_first_encounter_order() {
            let directory = MockDirectory::new();
            directory.add_user(roster_user("alice"));
            directory.add_user(roster_user("bob"));

            let issues = vec![
                issue("1", "f1", IssueKind::Bug, Severity::Major, "bob"),
                issue("2", "f1", IssueKind::Bug, Severity::Major, "alice"),
                issue("3", "f2", IssueKind::Bug, Severity::Major, "bob"),
            ];
            let reports = aggregator(&directory, 30).create_reports("p", &issues).await;

            assert_eq!(reports.len(), 2);
            assert_eq!(reports[0].main_recipient.account_name.as_deref(), Some("bob"));
            assert_eq!(reports[0].warning_count, 2);
            assert_eq!(reports[1].main_recipient.account_name.as_deref(), Some("alice"));
        }

        #[tokio::test]
        async fn every_issue_lands_in_exactly_one_report() {
            let directory = MockDirectory::new();
            directory.add_user(roster_user("alice"));

            let issues = vec![
                issue("1", "f1", IssueKind::Bug, Severity::Major, "alice"),
                issue("2", "f2", IssueKind::CodeSmell, Severity::Info, ""),
                issue("3", "f1", IssueKind::Vulnerability, Severity::Minor, "alice"),
            ];
            let reports = aggregator(&directory, 30).create_reports("p", &issues).await;

            let total: usize = reports.iter().map(Report::issue_count).sum();
            assert_eq!(total, issues.len());
        }

        #[tokio::test]
        async fn anonymous_bucket_only_when_unresolved_issues_exist() {
            let directory = MockDirectory::new();
            directory.add_user(roster_user("alice"));

            let issues = vec![issue("1", "f1", IssueKind::Bug, Severity::Major, "alice")];
            let reports = aggregator(&directory, 30).create_reports("p", &issues).await;

            assert_eq!(reports.len(), 1);
            assert_ne!(
                reports[0].main_recipient.account_name.as_deref(),
                Some("anonymous")
            );
        }

        #[tokio::test]
        async fn unresolved_issues_route_to_anonymous() {
            let directory = MockDirectory::new();

            let issues = vec![issue("1", "f1", IssueKind::Bug, Severity::Major, "")];
            let reports = aggregator(&directory, 30).create_reports("p", &issues).await;

            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].main_recipient, UserInfo::anonymous());
            // The anonymous bucket never hits the directory.
            assert_eq!(directory.lookup_count(), 0);
        }
    }

    mod capping_tests {
        use super::*;

        #[tokio::test]
        async fn caps_issues_but_counts_all() {
            let directory = MockDirectory::new();
            directory.add_user(roster_user("alice"));

            let issues: Vec<Issue> = (0..5)
                .map(|i| {
                    issue(
                        &format!("k{i}"),
                        "f1",
                        IssueKind::CodeSmell,
                        Severity::Minor,
                        "alice",
                    )
                })
                .collect();
            let reports = aggregator(&directory, 2).create_reports("p", &issues).await;

            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].issue_count(), 2);
            assert_eq!(reports[0].warning_count, 5);
        }

        #[tokio::test]
        async fn cap_keeps_the_most_urgent() {
            let directory = MockDirectory::new();
            directory.add_user(roster_user("alice"));

            let issues = vec![
                issue("smell", "f1", IssueKind::CodeSmell, Severity::Blocker, "alice"),
                issue("bug", "f2", IssueKind::Bug, Severity::Major, "alice"),
                issue("vuln", "f3", IssueKind::Vulnerability, Severity::Minor, "alice"),
            ];
            let reports = aggregator(&directory, 2).create_reports("p", &issues).await;

            let kept: Vec<&str> = reports[0]
                .file_reports
                .iter()
                .flat_map(|f| f.issues.iter().map(|i| i.key.as_str()))
                .collect();
            assert_eq!(kept, vec!["bug", "vuln"]);
        }
    }

    mod ordering_tests {
        use super::*;

        #[tokio::test]
        async fn bug_major_outranks_code_smell_blocker() {
            let directory = MockDirectory::new();
            directory.add_user(roster_user("alice"));

            let issues = vec![
                issue("bug", "f1", IssueKind::Bug, Severity::Major, "alice"),
                issue("smell", "f1", IssueKind::CodeSmell, Severity::Blocker, "alice"),
            ];
            let reports = aggregator(&directory, 30).create_reports("p", &issues).await;

            let keys: Vec<&str> = reports[0].file_reports[0]
                .issues
                .iter()
                .map(|i| i.key.as_str())
                .collect();
            assert_eq!(keys, vec!["bug", "smell"]);
        }

        #[tokio::test]
        async fn ties_keep_fetch_order() {
            let directory = MockDirectory::new();
            directory.add_user(roster_user("alice"));

            let issues = vec![
                issue("first", "f1", IssueKind::Bug, Severity::Major, "alice"),
                issue("second", "f1", IssueKind::Bug, Severity::Major, "alice"),
            ];
            let reports = aggregator(&directory, 30).create_reports("p", &issues).await;

            let keys: Vec<&str> = reports[0].file_reports[0]
                .issues
                .iter()
                .map(|i| i.key.as_str())
                .collect();
            assert_eq!(keys, vec!["first", "second"]);
        }

        #[tokio::test]
        async fn files_in_first_occurrence_order_after_ranking() {
            let directory = MockDirectory::new();
            directory.add_user(roster_user("alice"));

            // After ranking: bug (f2), vuln (f1), smell (f2).
            let issues = vec![
                issue("smell", "f2", IssueKind::CodeSmell, Severity::Major, "alice"),
                issue("vuln", "f1", IssueKind::Vulnerability, Severity::Major, "alice"),
                issue("bug", "f2", IssueKind::Bug, Severity::Major, "alice"),
            ];
            let reports = aggregator(&directory, 30).create_reports("p", &issues).await;

            let files: Vec<&str> = reports[0]
                .file_reports
                .iter()
                .map(|f| f.file_path.as_str())
                .collect();
            assert_eq!(files, vec!["f2", "f1"]);
            let f2_keys: Vec<&str> = reports[0].file_reports[0]
                .issues
                .iter()
                .map(|i| i.key.as_str())
                .collect();
            assert_eq!(f2_keys, vec!["bug", "smell"]);
        }

        #[tokio::test]
        async fn aggregation_is_idempotent() {
            let directory = MockDirectory::new();
            directory.add_user(roster_user("alice"));

            let issues = vec![
                issue("1", "f1", IssueKind::Bug, Severity::Major, "alice"),
                issue("2", "f2", IssueKind::CodeSmell, Severity::Info, ""),
            ];
            let aggregator = aggregator(&directory, 30);

            let first = aggregator.create_reports("p", &issues).await;
            let second = aggregator.create_reports("p", &issues).await;

            assert_eq!(first.len(), second.len());
            for (a, b) in first.iter().zip(second.iter()) {
                assert_eq!(a.main_recipient, b.main_recipient);
                assert_eq!(a.file_reports, b.file_reports);
                assert_eq!(a.warning_count, b.warning_count);
            }
        }
    }

    mod recipient_tests {
        use super::*;

        #[tokio::test]
        async fn unknown_identity_synthesizes_recipient() {
            let directory = MockDirectory::new();

            let issues = vec![issue("1", "f1", IssueKind::Bug, Severity::Major, "ghost")];
            let reports = aggregator(&directory, 30).create_reports("p", &issues).await;

            assert_eq!(reports.len(), 1);
            assert_eq!(
                reports[0].main_recipient.account_name.as_deref(),
                Some("ghost")
            );
            assert_eq!(directory.lookup_count(), 1);
        }

        #[tokio::test]
        async fn directory_failure_falls_back_to_anonymous() {
            let directory = MockDirectory::new();
            directory.fail_with(DirectoryError::Unreachable("ldap down".to_string()));

            let issues = vec![issue("1", "f1", IssueKind::Bug, Severity::Major, "alice")];
            let reports = aggregator(&directory, 30).create_reports("p", &issues).await;

            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].main_recipient, UserInfo::anonymous());
        }

        #[tokio::test]
        async fn skip_policy_drops_failed_group_only() {
            let directory = MockDirectory::new();
            directory.fail_with(DirectoryError::Unreachable("ldap down".to_string()));
            let aggregator =
                ReportAggregator::new(Arc::new(directory.clone()), 30, RoutingPolicy::Skip);

            let issues = vec![
                issue("1", "f1", IssueKind::Bug, Severity::Major, "alice"),
                issue("2", "f1", IssueKind::Bug, Severity::Major, ""),
            ];
            let reports = aggregator.create_reports("p", &issues).await;

            // alice's group is dropped; the anonymous bucket (which never
            // consults the directory) survives.
            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].main_recipient, UserInfo::anonymous());
        }
    }
}
