//! Read-only view of a finished analysis, as the decoration pass consumes it.
//!
//! The analysis engine, the blame computation and the markdown rendering all
//! live outside this crate. They are reached through [`AnalysisContext`] and
//! [`BlameLookup`] so the pass can be driven by a JSON report
//! ([`report::AnalysisReport`]) or by any other producer.

pub mod report;

use serde::{Deserialize, Serialize};

/// Metric key of the quality-gate condition whose value becomes the status coverage.
pub const NEW_COVERAGE_METRIC: &str = "new_coverage";

/// Overall quality-gate verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityGateStatus {
    Ok,
    Error,
}

/// Evaluation result of a single quality-gate condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    Ok,
    Warn,
    Error,
    NoValue,
}

/// One quality-gate condition (e.g. `new_coverage`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub metric_key: String,
    pub status: EvaluationStatus,
    /// Raw metric value as reported by the engine; absent for `NO_VALUE`.
    #[serde(default)]
    pub value: Option<String>,
}

/// Issue workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    Open,
    Confirmed,
    Reopened,
    Resolved,
    Closed,
    ToReview,
    InReview,
    Reviewed,
}

impl IssueStatus {
    /// Everything except `CLOSED` and `RESOLVED` counts as open.
    pub fn is_open(self) -> bool {
        !matches!(self, IssueStatus::Closed | IssueStatus::Resolved)
    }
}

/// An issue raised on a component (file) of the analysed project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentIssue {
    /// Component key the blame lookup is indexed by.
    pub component: String,
    /// Repository-relative path, when the component maps to a tracked file.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    pub status: IssueStatus,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Pre-rendered markdown body for the inline comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Everything the decoration pass needs to know about one analysis.
pub trait AnalysisContext {
    /// Revision the analysis ran on; the build status is attached to it.
    fn commit_sha(&self) -> &str;

    /// Merge request IID (the "branch name" of a pull-request analysis).
    fn merge_request_id(&self) -> &str;

    fn project_key(&self) -> &str;

    fn scanner_property(&self, key: &str) -> Option<&str>;

    fn quality_gate_status(&self) -> QualityGateStatus;

    fn find_condition(&self, metric_key: &str) -> Option<&Condition>;

    fn issues(&self) -> &[ComponentIssue];

    /// SCM path of the file an issue was raised on, if any.
    fn scm_path(&self, issue: &ComponentIssue) -> Option<String>;

    /// Body of the summary discussion.
    fn render_summary(&self) -> String;

    /// Body of the inline discussion for one issue.
    fn render_issue(&self, issue: &ComponentIssue) -> String;
}

/// Maps `(component, line)` to the revision that last touched the line.
pub trait BlameLookup {
    /// `None` when no changeset is recorded for that line.
    fn revision_for_line(&self, component: &str, line: u32) -> Option<&str>;
}
