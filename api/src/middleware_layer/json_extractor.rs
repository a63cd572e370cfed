use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

const DESERIALIZE_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

/// Field path from axum's rejection text, e.g. `report.issues[0].line`.
fn json_path_from_rejection(msg: &str) -> Option<String> {
    let rest = msg.trim().strip_prefix(DESERIALIZE_PREFIX)?;
    let (path, _) = rest.split_once(": ")?;
    if path.is_empty() || path.contains(char::is_whitespace) {
        return None;
    }
    Some(path.to_string())
}

fn hint_for(msg: &str) -> Option<String> {
    if msg.contains("expected a sequence") {
        Some("Expected an array for this field (e.g. [\"item1\", \"item2\"]).".into())
    } else if msg.contains("expected a map") || msg.contains("expected struct") {
        Some("Expected a JSON object here (e.g. { \"field\": \"value\" }).".into())
    } else if msg.contains("missing field") {
        Some("A required field is absent from the request body.".into())
    } else if msg.contains("unknown variant") {
        Some("Enum values are SCREAMING_SNAKE_CASE (e.g. \"OK\", \"NO_VALUE\").".into())
    } else {
        None
    }
}

fn ensure_request_id(parts: &mut axum::http::response::Parts) -> String {
    if let Some(v) = parts
        .headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        return v.to_string();
    }
    let now = Utc::now();
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros() * 1000);
    let id = format!("req-{nanos}");
    if let Ok(value) = HeaderValue::from_str(&id) {
        parts.headers.insert("X-Request-Id", value);
    }
    id
}

fn is_json(parts: &axum::http::response::Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Rewrites plain-text extractor rejections (400/422) into the JSON envelope.
/// Responses that already carry JSON pass through untouched.
pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    if !(status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY) {
        return res;
    }

    let (mut parts, bytes) = take_body(res).await;
    if is_json(&parts) {
        return Response::from_parts(parts, bytes.into());
    }

    let original = String::from_utf8_lossy(&bytes);
    let req_id = ensure_request_id(&mut parts);
    debug!(%req_id, %status, "mapping extractor rejection");

    let detail = ApiErrorDetail {
        path: json_path_from_rejection(&original),
        hint: hint_for(&original),
    };

    let envelope = ApiResponse::<()>::error(
        if status == StatusCode::BAD_REQUEST {
            "BAD_REQUEST"
        } else {
            "UNPROCESSABLE_ENTITY"
        },
        original.trim(),
        vec![detail],
    );

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_taken_from_deserialize_error() {
        let msg = "Failed to deserialize the JSON body into the target type: \
                   report.issues[0].line: invalid type: string \"x\", expected u32 at line 1 column 80";
        assert_eq!(
            json_path_from_rejection(msg).as_deref(),
            Some("report.issues[0].line")
        );
    }

    #[test]
    fn root_level_errors_have_no_path() {
        let msg = "Failed to deserialize the JSON body into the target type: \
                   missing field `secret` at line 1 column 2";
        assert_eq!(json_path_from_rejection(msg), None);
        let msg = "Failed to deserialize the JSON body into the target type: \
                   invalid type: integer `1`, expected struct DecorateMrRequest";
        assert_eq!(json_path_from_rejection(msg), None);
        assert_eq!(json_path_from_rejection("Failed to parse the request body as JSON"), None);
    }

    #[test]
    fn hints_follow_serde_wording() {
        assert!(hint_for("invalid type: map, expected a sequence").unwrap().contains("array"));
        assert!(hint_for("missing field `report`").is_some());
        assert!(hint_for("unknown variant `PASSED`").unwrap().contains("NO_VALUE"));
        assert_eq!(hint_for("EOF while parsing"), None);
    }

    #[test]
    fn request_id_is_generated_once() {
        let (mut parts, _) = Response::new(Body::empty()).into_parts();
        let first = ensure_request_id(&mut parts);
        assert!(first.starts_with("req-"));
        assert_eq!(ensure_request_id(&mut parts), first);
    }
}
