//! Decoration pass: report one finished analysis back to its merge request.
//!
//! Order is fixed: commit list and MR metadata, then the build status, then
//! the summary discussion, then one inline discussion per accepted issue.
//! The first fatal error aborts the rest; whatever was already posted stays.

pub mod filter;
pub mod gitlab;
pub mod status;

use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::analysis::{AnalysisContext, BlameLookup};
use crate::errors::DecorateResult;
use crate::git_providers::gitlab::{GitLabClient, GitLabEndpoints, build_gitlab_headers};
use crate::git_providers::remote::RemoteApiClient;
use crate::git_providers::{CommitSet, ProviderConfig};
use crate::publish::status::{StatusOutcome, StatusRequest};

/// What a completed pass did.
#[derive(Debug, Clone, Serialize)]
pub struct DecorationOutcome {
    pub status: StatusOutcome,
    /// Commits found in the merge request.
    pub commits: usize,
    /// Inline discussions posted (the summary is not counted).
    pub inline_posted: usize,
    /// Open issues that did not get an inline discussion.
    pub skipped: usize,
}

/// Decorates the merge request of `ctx` with a fresh transport client.
pub async fn decorate_merge_request<C, B>(
    cfg: &ProviderConfig,
    ctx: &C,
    blame: &B,
) -> DecorateResult<DecorationOutcome>
where
    C: AnalysisContext + ?Sized,
    B: BlameLookup + ?Sized,
{
    let client = GitLabClient::new(RemoteApiClient::new()?);
    decorate_with(&client, cfg, ctx, blame).await
}

/// Decorates the merge request of `ctx` through `client`.
pub async fn decorate_with<C, B>(
    client: &GitLabClient,
    cfg: &ProviderConfig,
    ctx: &C,
    blame: &B,
) -> DecorateResult<DecorationOutcome>
where
    C: AnalysisContext + ?Sized,
    B: BlameLookup + ?Sized,
{
    let t0 = Instant::now();
    info!(
        project = ctx.project_key(),
        merge_request = ctx.merge_request_id(),
        revision = ctx.commit_sha(),
        "decoration started"
    );

    // Everything that can fail without the network fails here.
    let endpoints = GitLabEndpoints::from_context(ctx)?;
    let status_request = StatusRequest::from_context(ctx, &cfg.public_root_url)?;
    let headers = build_gitlab_headers(&cfg.token)?;

    let commits: CommitSet = client
        .list_merge_request_commits(&endpoints.commits, &headers)
        .await?
        .into_iter()
        .collect();
    let merge_request = client
        .get_merge_request(&endpoints.merge_request, &headers)
        .await?;

    let status =
        gitlab::post_status(client.remote(), &endpoints.status, &headers, &status_request).await?;

    let summary = gitlab::summary_payload(ctx.render_summary());
    gitlab::post_comment(client.remote(), &endpoints.discussions, &headers, &summary).await?;

    let selection = filter::select_inline_comments(ctx, blame, &commits, &merge_request)?;
    for payload in &selection.payloads {
        gitlab::post_comment(client.remote(), &endpoints.discussions, &headers, payload).await?;
    }

    info!(
        commits = commits.len(),
        inline = selection.payloads.len(),
        skipped = selection.skipped,
        "decoration done in {} ms",
        t0.elapsed().as_millis()
    );

    Ok(DecorationOutcome {
        status,
        commits: commits.len(),
        inline_posted: selection.payloads.len(),
        skipped: selection.skipped,
    })
}
