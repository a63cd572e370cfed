use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use chrono::Utc;
use mr_decorator::decorate_merge_request;
use tracing::{debug, info, instrument, warn};

use crate::{
    core::{
        app_state::AppState,
        http::response_envelope::{ApiErrorDetail, ApiResponse},
    },
    error_handler::AppError,
    routes::decorate_mr::{
        decorate_mr_request::DecorateMrRequest, decorate_mr_response::DecorateMrResponse,
    },
};

/// Compares the shared trigger secret; `Err` holds the ready-made rejection.
fn check_secret(expected: &str, provided: &str) -> Result<(), Response> {
    let expected = expected.trim();
    let provided = provided.trim();

    if expected.is_empty() {
        let details = vec![ApiErrorDetail::at(
            "secret",
            "Trigger secret is not configured on the server side.",
        )];
        return Err(ApiResponse::<()>::error(
            "SERVER_CONFIG_ERROR",
            "Trigger secret is not configured.",
            details,
        )
        .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    if provided.is_empty() || provided != expected {
        let details = vec![ApiErrorDetail::at(
            "secret",
            "Secret does not match the configured trigger secret.",
        )];
        return Err(
            ApiResponse::<()>::error("UNAUTHORIZED", "Invalid trigger secret.", details)
                .into_response_with_status(StatusCode::UNAUTHORIZED),
        );
    }

    Ok(())
}

/// Decorates a GitLab merge request with the posted analysis.
///
/// Expects `{ "secret": ..., "report": { ... } }`. On a matching secret the
/// pass posts the commit status, the summary discussion and the inline
/// discussions, then answers with what it did.
#[instrument(
    name = "decorate_mr_route",
    skip(state, headers, body),
    fields(
        project = %body.report.project_key,
        merge_request = %body.report.merge_request_id,
    )
)]
pub async fn decorate_mr_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<DecorateMrRequest>,
) -> Response {
    if let Some(id) = headers.get("X-Request-Id").and_then(|h| h.to_str().ok()) {
        debug!(%id, "request id attached");
    }

    if let Err(rejection) = check_secret(&state.config.trigger_secret, &body.secret) {
        warn!("decoration trigger rejected");
        return rejection;
    }

    info!(revision = %body.report.commit_sha, "starting merge request decoration");

    let cfg = state.config.provider_config();
    match decorate_merge_request(&cfg, &body.report, &body.report).await {
        Ok(outcome) => ApiResponse::success(DecorateMrResponse {
            message: format!(
                "Merge request decorated: {} inline comment(s), {} skipped.",
                outcome.inline_posted, outcome.skipped
            ),
            outcome,
            finished_at: Utc::now(),
        })
        .into_response_with_status(StatusCode::OK),
        Err(err) => {
            let err = AppError::from(err);
            warn!(error = %err, "decoration failed");
            let (status, envelope) = ApiResponse::from_app_error(&err);
            envelope.into_response_with_status(status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app_state::AppConfig;
    use mr_decorator::AnalysisReport;
    use serde_json::{Value, json};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const SECRET: &str = "s3cret";

    fn state(trigger_secret: &str) -> Arc<AppState> {
        Arc::new(AppState {
            config: AppConfig {
                api_address: "127.0.0.1:0".into(),
                gitlab_token: "tok".into(),
                public_root_url: "https://sonar.example".into(),
                trigger_secret: trigger_secret.into(),
            },
        })
    }

    fn report(api_url: &str) -> AnalysisReport {
        serde_json::from_value(json!({
            "commit_sha": "c",
            "merge_request_id": "3",
            "project_key": "proj",
            "scanner_properties": {
                "gitlab.api.url": api_url,
                "gitlab.repository.slug": "group/project"
            },
            "quality_gate": "OK",
            "conditions": [{ "metric_key": "new_coverage", "status": "OK", "value": "90" }],
            "issues": [
                { "component": "proj:a.rs", "path": "a.rs", "line": 4,
                  "status": "OPEN", "comment": "Fix me" }
            ],
            "blame": { "proj:a.rs": { "4": "b" } }
        }))
        .unwrap()
    }

    async fn call(state: Arc<AppState>, secret: &str, report: AnalysisReport) -> (StatusCode, Value) {
        let body = DecorateMrRequest {
            secret: secret.into(),
            report,
        };
        let res = decorate_mr_route(State(state), HeaderMap::new(), Json(body)).await;
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn wrong_secret_is_unauthorized() {
        let (status, body) = call(state(SECRET), "nope", report("http://127.0.0.1:9")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        assert_eq!(body["error"]["details"][0]["path"], "secret");
    }

    #[tokio::test]
    async fn unset_server_secret_is_a_server_error() {
        let (status, body) = call(state("  "), SECRET, report("http://127.0.0.1:9")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "SERVER_CONFIG_ERROR");
    }

    #[tokio::test]
    async fn incomplete_analysis_is_unprocessable() {
        let mut report = report("http://127.0.0.1:9");
        report.conditions.clear();
        let (status, body) = call(state(SECRET), SECRET, report).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_ANALYSIS");
    }

    #[tokio::test]
    async fn gitlab_failure_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("404 Project Not Found"))
            .mount(&server)
            .await;

        let api = format!("{}/api/v4", server.uri());
        let (status, body) = call(state(SECRET), SECRET, report(&api)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "DECORATION_FAILED");
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("404 Project Not Found")
        );
    }

    #[tokio::test]
    async fn successful_pass_reports_outcome() {
        let server = MockServer::start().await;
        let mr = "/api/v4/projects/group%2Fproject/merge_requests/3";
        Mock::given(method("GET"))
            .and(path(format!("{mr}/commits")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "id": "a" }, { "id": "b" }])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(mr))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "iid": 3,
                "diff_refs": { "base_sha": "b0", "start_sha": "s0", "head_sha": "h0" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v4/projects/group%2Fproject/statuses/c"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{mr}/discussions")))
            .respond_with(ResponseTemplate::new(201))
            .expect(2)
            .mount(&server)
            .await;

        let api = format!("{}/api/v4", server.uri());
        let (status, body) = call(state(SECRET), SECRET, report(&api)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["outcome"]["status"], "posted");
        assert_eq!(body["data"]["outcome"]["commits"], 2);
        assert_eq!(body["data"]["outcome"]["inline_posted"], 1);
        assert_eq!(body["data"]["outcome"]["skipped"], 0);
        assert!(body["data"]["finished_at"].is_string());
    }
}
