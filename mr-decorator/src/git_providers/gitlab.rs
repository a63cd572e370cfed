//! GitLab resolvers (REST v4) for the merge request under decoration.
//!
//! Endpoints used:
//! - GET /projects/:id/merge_requests/:iid
//! - GET /projects/:id/merge_requests/:iid/commits   (Link-header pagination)

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::info;

use crate::analysis::AnalysisContext;
use crate::errors::{ConfigError, DecorateResult, RemoteApiError};
use crate::git_providers::remote::RemoteApiClient;
use crate::git_providers::types::{CommitId, MergeRequestRef};

/// Scanner property holding the GitLab API root, e.g. `https://gitlab.com/api/v4`.
pub const GITLAB_API_URL_PROPERTY: &str = "gitlab.api.url";
/// Scanner property holding the project path, e.g. `group/project`.
pub const GITLAB_REPOSITORY_SLUG_PROPERTY: &str = "gitlab.repository.slug";

/// URLs of every resource touched by one decoration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLabEndpoints {
    pub status: String,
    pub merge_request: String,
    pub commits: String,
    pub discussions: String,
}

impl GitLabEndpoints {
    /// Resolves the endpoints from the analysis' scanner properties.
    ///
    /// Both the API URL and the repository slug are required.
    pub fn from_context<C: AnalysisContext + ?Sized>(ctx: &C) -> DecorateResult<Self> {
        let api_url = ctx
            .scanner_property(GITLAB_API_URL_PROPERTY)
            .ok_or(ConfigError::MissingScannerProperty(GITLAB_API_URL_PROPERTY))?;
        let slug = ctx
            .scanner_property(GITLAB_REPOSITORY_SLUG_PROPERTY)
            .ok_or(ConfigError::MissingScannerProperty(
                GITLAB_REPOSITORY_SLUG_PROPERTY,
            ))?;
        Self::new(api_url, slug, ctx.merge_request_id(), ctx.commit_sha())
    }

    pub fn new(
        api_url: &str,
        slug: &str,
        merge_request_id: &str,
        revision: &str,
    ) -> DecorateResult<Self> {
        let api = api_url.trim_end_matches('/');
        reqwest::Url::parse(api)
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{api_url}: {e}")))?;

        let project = format!("{api}/projects/{}", urlencoding::encode(slug));
        let status = format!("{project}/statuses/{}", urlencoding::encode(revision));
        let merge_request = format!(
            "{project}/merge_requests/{}",
            urlencoding::encode(merge_request_id)
        );
        let commits = format!("{merge_request}/commits");
        let discussions = format!("{merge_request}/discussions");

        info!(url = %status, "status url");
        info!(url = %commits, "MR commits url");
        info!(url = %discussions, "MR discussion url");

        Ok(Self {
            status,
            merge_request,
            commits,
            discussions,
        })
    }
}

/// Headers sent with every request of a pass. Built once, borrowed everywhere.
pub fn build_gitlab_headers(token: &str) -> DecorateResult<HeaderMap> {
    let mut h = HeaderMap::new();
    h.insert(USER_AGENT, HeaderValue::from_static("mr-decorator/0.1"));
    h.insert(ACCEPT, HeaderValue::from_static("application/json"));
    // GitLab Private Token header:
    h.insert(
        "PRIVATE-TOKEN",
        HeaderValue::from_str(token).map_err(|_| RemoteApiError::InvalidHeader("PRIVATE-TOKEN"))?,
    );
    Ok(h)
}

#[derive(Debug, Clone)]
pub struct GitLabClient {
    remote: RemoteApiClient,
}

impl GitLabClient {
    pub fn new(remote: RemoteApiClient) -> Self {
        Self { remote }
    }

    pub fn remote(&self) -> &RemoteApiClient {
        &self.remote
    }

    /// Lists the ids of every commit in the MR, across all pages.
    ///
    /// `commits_url` is [`GitLabEndpoints::commits`].
    pub async fn list_merge_request_commits(
        &self,
        commits_url: &str,
        headers: &HeaderMap,
    ) -> DecorateResult<Vec<CommitId>> {
        let raw: Vec<GitLabCommit> = self.remote.fetch_paged(commits_url, headers).await?;
        info!(count = raw.len(), "MR commits received");
        Ok(raw.into_iter().map(|c| c.id).collect())
    }

    /// Fetches MR metadata, including `diff_refs`.
    pub async fn get_merge_request(
        &self,
        merge_request_url: &str,
        headers: &HeaderMap,
    ) -> DecorateResult<MergeRequestRef> {
        let mr: MergeRequestRef = self.remote.fetch_one(merge_request_url, headers).await?;
        info!(iid = mr.iid, "merge request received");
        Ok(mr)
    }
}

// --- GitLab response shapes (subset of fields we actually use) ---

#[derive(Debug, Deserialize)]
struct GitLabCommit {
    id: String,
}
