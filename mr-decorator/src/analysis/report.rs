//! JSON analysis report posted to the trigger endpoint.
//!
//! Carries the already-computed analysis: gate verdict, conditions, issues
//! with pre-rendered comment bodies, and the blame table for the lines those
//! issues sit on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{
    AnalysisContext, BlameLookup, ComponentIssue, Condition, QualityGateStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub commit_sha: String,
    pub merge_request_id: String,
    pub project_key: String,
    #[serde(default)]
    pub scanner_properties: HashMap<String, String>,
    pub quality_gate: QualityGateStatus,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub issues: Vec<ComponentIssue>,
    /// component -> line -> revision
    #[serde(default)]
    pub blame: HashMap<String, HashMap<u32, String>>,
    #[serde(default)]
    pub summary_comment: Option<String>,
}

impl AnalysisContext for AnalysisReport {
    fn commit_sha(&self) -> &str {
        &self.commit_sha
    }

    fn merge_request_id(&self) -> &str {
        &self.merge_request_id
    }

    fn project_key(&self) -> &str {
        &self.project_key
    }

    fn scanner_property(&self, key: &str) -> Option<&str> {
        self.scanner_properties.get(key).map(String::as_str)
    }

    fn quality_gate_status(&self) -> QualityGateStatus {
        self.quality_gate
    }

    fn find_condition(&self, metric_key: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.metric_key == metric_key)
    }

    fn issues(&self) -> &[ComponentIssue] {
        &self.issues
    }

    fn scm_path(&self, issue: &ComponentIssue) -> Option<String> {
        issue.path.clone().filter(|p| !p.trim().is_empty())
    }

    fn render_summary(&self) -> String {
        if let Some(body) = &self.summary_comment {
            return body.clone();
        }
        let verdict = match self.quality_gate {
            QualityGateStatus::Ok => "passed",
            QualityGateStatus::Error => "failed",
        };
        let open = self.issues.iter().filter(|i| i.status.is_open()).count();
        format!(
            "Analysis of `{}`: quality gate {verdict}, {open} open issue{}",
            self.project_key,
            if open == 1 { "" } else { "s" }
        )
    }

    fn render_issue(&self, issue: &ComponentIssue) -> String {
        if let Some(body) = &issue.comment {
            return body.clone();
        }
        match &issue.severity {
            Some(sev) => format!("**{sev}**: {}", issue.message),
            None => issue.message.clone(),
        }
    }
}

impl BlameLookup for AnalysisReport {
    fn revision_for_line(&self, component: &str, line: u32) -> Option<&str> {
        self.blame
            .get(component)
            .and_then(|lines| lines.get(&line))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{EvaluationStatus, IssueStatus, NEW_COVERAGE_METRIC};

    fn report() -> AnalysisReport {
        serde_json::from_str(
            r#"{
                "commit_sha": "abc123",
                "merge_request_id": "42",
                "project_key": "my-project",
                "scanner_properties": { "gitlab.api.url": "https://gitlab.example/api/v4" },
                "quality_gate": "ERROR",
                "conditions": [
                    { "metric_key": "new_coverage", "status": "NO_VALUE" },
                    { "metric_key": "new_bugs", "status": "ERROR", "value": "3" }
                ],
                "issues": [
                    { "component": "proj:foo.go", "path": "foo.go", "line": 10,
                      "status": "OPEN", "severity": "MAJOR", "message": "Remove this." },
                    { "component": "proj:bar.go", "line": 3, "status": "CLOSED",
                      "comment": "pre-rendered" }
                ],
                "blame": { "proj:foo.go": { "10": "b" } },
                "unknown_field": true
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn deserializes_and_answers_lookups() {
        let r = report();
        assert_eq!(r.scanner_property("gitlab.api.url"), Some("https://gitlab.example/api/v4"));
        assert_eq!(r.scanner_property("gitlab.repository.slug"), None);
        let cov = r.find_condition(NEW_COVERAGE_METRIC).unwrap();
        assert_eq!(cov.status, EvaluationStatus::NoValue);
        assert!(cov.value.is_none());
        assert_eq!(r.issues()[1].status, IssueStatus::Closed);
    }

    #[test]
    fn blame_is_keyed_by_component_and_line() {
        let r = report();
        assert_eq!(r.revision_for_line("proj:foo.go", 10), Some("b"));
        assert_eq!(r.revision_for_line("proj:foo.go", 11), None);
        assert_eq!(r.revision_for_line("proj:bar.go", 3), None);
    }

    #[test]
    fn renders_fallback_bodies() {
        let r = report();
        assert_eq!(
            r.render_summary(),
            "Analysis of `my-project`: quality gate failed, 1 open issue"
        );
        assert_eq!(r.render_issue(&r.issues[0]), "**MAJOR**: Remove this.");
        assert_eq!(r.render_issue(&r.issues[1]), "pre-rendered");
    }

    #[test]
    fn blank_path_is_not_a_path() {
        let mut r = report();
        r.issues[0].path = Some("  ".into());
        assert_eq!(r.scm_path(&r.issues[0]), None);
        assert_eq!(r.scm_path(&r.issues[1]), None);
    }
}
