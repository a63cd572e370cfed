//! GitLab publisher: commit status and MR discussions.
//!
//! API:
//! - POST /projects/:id/statuses/:sha                    (query parameters, no body)
//! - POST /projects/:id/merge_requests/:iid/discussions  (form body)
//!
//! Inline positions need `base_sha` + `start_sha` + `head_sha` from the MR diff refs.

use reqwest::header::HeaderMap;
use tracing::{debug, info};

use crate::errors::{DecorateResult, RemoteApiError};
use crate::git_providers::remote::{RemoteApiClient, expect_status};
use crate::git_providers::types::{CommentPayload, MergeRequestRef};
use crate::publish::status::{StatusOutcome, StatusRequest, interpret_status_response};

/// Posts the build status for the analysed revision.
pub async fn post_status(
    remote: &RemoteApiClient,
    status_url: &str,
    headers: &HeaderMap,
    request: &StatusRequest,
) -> DecorateResult<StatusOutcome> {
    let url = request.url(status_url)?;
    debug!(state = request.state, coverage = %request.coverage, "posting commit status");
    let resp = remote.post_empty(&url, headers).await?;
    let outcome = interpret_status_response(&url, request.state, resp)?;
    if outcome == StatusOutcome::Posted {
        info!(state = request.state, "status posted");
    }
    Ok(outcome)
}

/// Posts one discussion (summary or inline). Expects 201.
pub async fn post_comment(
    remote: &RemoteApiClient,
    discussions_url: &str,
    headers: &HeaderMap,
    payload: &CommentPayload,
) -> DecorateResult<()> {
    debug!(
        url = discussions_url,
        path = payload.get("position[new_path]"),
        line = payload.get("position[new_line]"),
        "posting discussion"
    );
    let resp = remote.post_form(discussions_url, headers, payload).await?;
    expect_status(discussions_url, 201, resp)?;
    info!("comment posted");
    Ok(())
}

/// Summary discussion: body only.
pub fn summary_payload(body: impl Into<String>) -> CommentPayload {
    CommentPayload::new().field("body", body)
}

/// Inline discussion anchored on a line of the MR's new version.
///
/// Fails when the MR did not report all three diff-ref SHAs.
pub fn inline_payload(
    body: impl Into<String>,
    merge_request: &MergeRequestRef,
    path: &str,
    line: u32,
) -> DecorateResult<CommentPayload> {
    let refs = merge_request.diff_refs.as_ref();
    let sha = |name: &'static str, value: Option<&String>| {
        value.cloned().ok_or_else(|| {
            RemoteApiError::InvalidResponse(format!(
                "merge request !{} has no diff_refs.{name}",
                merge_request.iid
            ))
        })
    };
    let base_sha = sha("base_sha", refs.and_then(|r| r.base_sha.as_ref()))?;
    let start_sha = sha("start_sha", refs.and_then(|r| r.start_sha.as_ref()))?;
    let head_sha = sha("head_sha", refs.and_then(|r| r.head_sha.as_ref()))?;

    Ok(CommentPayload::new()
        .field("body", body)
        .field("position[base_sha]", base_sha)
        .field("position[start_sha]", start_sha)
        .field("position[head_sha]", head_sha)
        .field("position[new_path]", path)
        .field("position[new_line]", line.to_string())
        .field("position[position_type]", "text"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git_providers::types::DiffRefs;

    fn mr(refs: Option<DiffRefs>) -> MergeRequestRef {
        MergeRequestRef {
            iid: 7,
            title: None,
            web_url: None,
            diff_refs: refs,
        }
    }

    #[test]
    fn inline_payload_carries_position() {
        let refs = DiffRefs {
            base_sha: Some("base".into()),
            start_sha: Some("start".into()),
            head_sha: Some("head".into()),
        };
        let p = inline_payload("Fix me", &mr(Some(refs)), "foo.go", 10).unwrap();
        let names: Vec<&str> = p.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "body",
                "position[base_sha]",
                "position[start_sha]",
                "position[head_sha]",
                "position[new_path]",
                "position[new_line]",
                "position[position_type]",
            ]
        );
        assert_eq!(p.get("position[base_sha]"), Some("base"));
        assert_eq!(p.get("position[start_sha]"), Some("start"));
        assert_eq!(p.get("position[head_sha]"), Some("head"));
        assert_eq!(p.get("position[new_line]"), Some("10"));
        assert_eq!(p.get("position[position_type]"), Some("text"));
    }

    #[test]
    fn inline_payload_needs_every_sha() {
        let refs = DiffRefs {
            base_sha: Some("base".into()),
            start_sha: None,
            head_sha: Some("head".into()),
        };
        let err = inline_payload("x", &mr(Some(refs)), "a.rs", 1).unwrap_err();
        assert!(err.to_string().contains("diff_refs.start_sha"));
        assert!(inline_payload("x", &mr(None), "a.rs", 1).is_err());
    }

    #[test]
    fn summary_payload_is_body_only() {
        let p = summary_payload("## Analysis");
        assert_eq!(p.fields().len(), 1);
        assert_eq!(p.get("body"), Some("## Analysis"));
    }
}
