//! GitLab REST transport: single GET, paginated GET, form POST.
//!
//! Every call takes the pass-wide header map by reference. Status codes are
//! checked against the endpoint contract (200 for GET); any other status is
//! fatal and carries the response body for diagnostics.

use std::{collections::HashSet, sync::OnceLock, time::Duration};

use regex::Regex;
use reqwest::{
    Client,
    header::{HeaderMap, LINK},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::errors::{DecorateResult, RemoteApiError};
use crate::git_providers::types::{CommentPayload, Page};

/// Status and body of a POST, left for the caller to validate.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct RemoteApiClient {
    http: Client,
}

impl RemoteApiClient {
    /// Client with the transport timeouts used for every decoration pass.
    pub fn new() -> DecorateResult<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http })
    }

    /// GET a single resource. Expects 200.
    pub async fn fetch_one<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> DecorateResult<T> {
        let resp = self.http.get(url).headers(headers.clone()).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        if status != 200 {
            return Err(unexpected_status(url, 200, status, body).into());
        }
        debug!(url, "resource received");
        Ok(decode_lenient(&body)?)
    }

    /// GET one page of a listing and read its `next` link.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> DecorateResult<Page<T>> {
        let resp = self.http.get(url).headers(headers.clone()).send().await?;
        let status = resp.status().as_u16();
        let next = resp
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);
        let body = resp.text().await?;
        if status != 200 {
            return Err(unexpected_status(url, 200, status, body).into());
        }
        let items: Vec<T> = decode_lenient(&body)?;
        Ok(Page { items, next })
    }

    /// GET every page of a listing, following `rel="next"` until none is left.
    ///
    /// Items keep page order and the server's order within a page. A `next`
    /// link that points at an already fetched page is fatal.
    pub async fn fetch_paged<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> DecorateResult<Vec<T>> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = Some(url.to_string());

        while let Some(current) = cursor.take() {
            if !visited.insert(current.clone()) {
                error!(url = %current, "server repeated a pagination link");
                return Err(RemoteApiError::PaginationLoop(current).into());
            }
            let page: Page<T> = self.fetch_page(&current, headers).await?;
            debug!(url = %current, count = page.items.len(), "page received");
            items.extend(page.items);
            if page.next.is_some() {
                debug!("getting next page");
            }
            cursor = page.next;
        }

        Ok(items)
    }

    /// POST a URL-form-encoded body. The response is not interpreted.
    pub async fn post_form(
        &self,
        url: &str,
        headers: &HeaderMap,
        payload: &CommentPayload,
    ) -> DecorateResult<RawResponse> {
        let resp = self
            .http
            .post(url)
            .headers(headers.clone())
            .form(payload.fields())
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(RawResponse { status, body })
    }

    /// POST without a body (all parameters travel in the query string).
    pub async fn post_empty(&self, url: &str, headers: &HeaderMap) -> DecorateResult<RawResponse> {
        let resp = self.http.post(url).headers(headers.clone()).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(RawResponse { status, body })
    }
}

/// Fails a response whose status is not the documented one, logging the body.
pub fn expect_status(url: &str, expected: u16, resp: RawResponse) -> DecorateResult<RawResponse> {
    if resp.status != expected {
        return Err(unexpected_status(url, expected, resp.status, resp.body).into());
    }
    Ok(resp)
}

fn unexpected_status(url: &str, expected: u16, actual: u16, body: String) -> RemoteApiError {
    error!(url, expected, actual, body = %body, "error returned by the GitLab API");
    RemoteApiError::UnexpectedStatus {
        url: url.to_string(),
        expected,
        actual,
        body,
    }
}

fn link_entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<([^>]+)>;\s*rel="([^"]+)""#).expect("static regex"))
}

/// URL of the `rel="next"` entry of a `Link` header value, if any.
///
/// The relation name is compared case-sensitively.
pub fn next_link(link_header: &str) -> Option<String> {
    link_entry_re()
        .captures_iter(link_header)
        .find(|caps| &caps[2] == "next")
        .map(|caps| caps[1].to_string())
}

/// Decodes a GitLab body with the same tolerance for every type:
/// unknown fields are ignored, a lone value is accepted where a list is
/// expected, and `[]` is accepted as an absent value.
pub fn decode_lenient<T: DeserializeOwned>(body: &str) -> Result<T, RemoteApiError> {
    let value: Value = serde_json::from_str(body)?;
    let first = match T::deserialize(&value) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };
    let retry = match value {
        Value::Array(items) if items.is_empty() => Value::Null,
        Value::Array(_) => return Err(first.into()),
        other => Value::Array(vec![other]),
    };
    T::deserialize(retry).map_err(|_| first.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Commit {
        id: String,
    }

    #[test]
    fn next_link_picks_next_among_many() {
        let header = concat!(
            r#"<https://gitlab.example/api/v4/projects/1/merge_requests/2/commits?page=1&per_page=2>; rel="prev", "#,
            r#"<https://gitlab.example/api/v4/projects/1/merge_requests/2/commits?page=3&per_page=2>; rel="next", "#,
            r#"<https://gitlab.example/api/v4/projects/1/merge_requests/2/commits?page=1&per_page=2>; rel="first""#
        );
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://gitlab.example/api/v4/projects/1/merge_requests/2/commits?page=3&per_page=2")
        );
    }

    #[test]
    fn next_link_absent() {
        assert_eq!(next_link(r#"<https://x/a?page=1>; rel="first", <https://x/a?page=4>; rel="last""#), None);
        assert_eq!(next_link(""), None);
    }

    #[test]
    fn next_link_relation_is_case_sensitive() {
        assert_eq!(next_link(r#"<https://x/a?page=2>; rel="Next""#), None);
    }

    #[test]
    fn next_link_tolerates_missing_space() {
        assert_eq!(
            next_link(r#"<https://x/a?page=2>;rel="next""#).as_deref(),
            Some("https://x/a?page=2")
        );
    }

    #[test]
    fn lenient_ignores_unknown_fields() {
        let c: Commit = decode_lenient(r#"{"id":"a","short_id":"a","title":"t"}"#).unwrap();
        assert_eq!(c.id, "a");
    }

    #[test]
    fn lenient_single_value_as_list() {
        let list: Vec<Commit> = decode_lenient(r#"{"id":"a"}"#).unwrap();
        assert_eq!(list, vec![Commit { id: "a".into() }]);
    }

    #[test]
    fn lenient_empty_array_as_absent() {
        let c: Option<Commit> = decode_lenient("[]").unwrap();
        assert!(c.is_none());
        let list: Vec<Commit> = decode_lenient("[]").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn lenient_keeps_the_original_error() {
        let err = decode_lenient::<Commit>(r#"{"sha":"a"}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `id`"));
    }

    #[test]
    fn expect_status_rejects_other_codes() {
        let resp = RawResponse {
            status: 500,
            body: "oops".into(),
        };
        let err = expect_status("https://x", 201, resp).unwrap_err();
        assert!(err.to_string().contains("oops"));
        assert!(
            expect_status("https://x", 201, RawResponse { status: 201, body: String::new() }).is_ok()
        );
    }
}
