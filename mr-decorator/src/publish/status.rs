//! Commit build status: state, coverage and the status URL query.
//!
//! See <https://docs.gitlab.com/ee/api/commits.html#set-the-pipeline-status-of-a-commit>.

use reqwest::Url;
use serde::Serialize;
use tracing::debug;

use crate::analysis::{
    AnalysisContext, Condition, EvaluationStatus, NEW_COVERAGE_METRIC, QualityGateStatus,
};
use crate::errors::{ConfigError, DecorateResult, RemoteApiError};
use crate::git_providers::remote::{RawResponse, expect_status};

/// Display name of the status in the MR pipeline widget.
pub const STATUS_NAME: &str = "SonarQube";
pub const STATUS_DESCRIPTION: &str = "SonarQube Status";

/// Body fragment GitLab answers with when the same state is posted twice.
pub const TRANSITION_CONFLICT_MARKER: &str = "Cannot transition status";

/// What happened to the status post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusOutcome {
    /// GitLab created the status (201).
    Posted,
    /// GitLab refused the transition because the commit already has that state.
    AlreadySet,
}

/// `success` for a passed gate, `failed` for anything else.
pub fn commit_state(gate: QualityGateStatus) -> &'static str {
    match gate {
        QualityGateStatus::Ok => "success",
        _ => "failed",
    }
}

/// Coverage reported with the status: `0` when the condition has no value.
pub fn coverage_value(condition: &Condition) -> String {
    match (condition.status, condition.value.as_deref()) {
        (EvaluationStatus::NoValue, _) | (_, None) => "0".to_string(),
        (_, Some(v)) => v.to_string(),
    }
}

/// Link back to the analysis of this merge request on the dashboard.
pub fn dashboard_url(public_root: &str, project_key: &str, merge_request_id: &str) -> String {
    format!(
        "{}/dashboard?id={}&pullRequest={}",
        public_root.trim_end_matches('/'),
        urlencoding::encode(project_key),
        urlencoding::encode(merge_request_id)
    )
}

/// Query parameters of the status POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRequest {
    pub state: &'static str,
    pub target_url: String,
    pub coverage: String,
}

impl StatusRequest {
    /// Derives the request from the analysis. Fails when the new-coverage
    /// condition is missing from the quality gate.
    pub fn from_context<C: AnalysisContext + ?Sized>(
        ctx: &C,
        public_root: &str,
    ) -> DecorateResult<Self> {
        let condition = ctx
            .find_condition(NEW_COVERAGE_METRIC)
            .ok_or(ConfigError::MissingCondition(NEW_COVERAGE_METRIC))?;
        Ok(Self {
            state: commit_state(ctx.quality_gate_status()),
            target_url: dashboard_url(public_root, ctx.project_key(), ctx.merge_request_id()),
            coverage: coverage_value(condition),
        })
    }

    /// Status endpoint URL with every parameter encoded exactly once.
    pub fn url(&self, status_url: &str) -> DecorateResult<String> {
        let mut url = Url::parse(status_url)
            .map_err(|e| RemoteApiError::InvalidUrl(format!("{status_url}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("name", STATUS_NAME)
            .append_pair("state", self.state)
            .append_pair("target_url", &self.target_url)
            .append_pair("description", STATUS_DESCRIPTION)
            .append_pair("coverage", &self.coverage);
        Ok(url.into())
    }
}

/// Maps the status POST response: the transition quirk counts as success,
/// otherwise 201 is required.
pub fn interpret_status_response(
    url: &str,
    state: &str,
    resp: RawResponse,
) -> DecorateResult<StatusOutcome> {
    if resp.body.contains(TRANSITION_CONFLICT_MARKER) {
        debug!(state, "transition status is already set");
        return Ok(StatusOutcome::AlreadySet);
    }
    expect_status(url, 201, resp)?;
    Ok(StatusOutcome::Posted)
}
