//! Issue-to-commit filter.
//!
//! An MR diff can only anchor comments on lines introduced by its own
//! commits. An issue gets an inline comment only when it is open, has a path
//! and a line, and the line is blamed on a commit of the MR.

use tracing::{debug, info};

use crate::analysis::{AnalysisContext, BlameLookup, ComponentIssue};
use crate::errors::DecorateResult;
use crate::git_providers::types::{CommentPayload, CommitSet, MergeRequestRef};
use crate::publish::gitlab::inline_payload;

/// Verdict for one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueDecision {
    /// Inline comment to post.
    Comment(CommentPayload),
    /// Closed or resolved.
    NotOpen,
    /// No SCM path or no line number.
    NoLocation,
    /// No changeset recorded for the line.
    NoBlame { path: String, line: u32 },
    /// Line last touched by a commit outside the MR.
    OutsideMergeRequest {
        path: String,
        line: u32,
        revision: String,
    },
}

/// Inline comments accepted for one pass.
#[derive(Debug, Clone, Default)]
pub struct InlineSelection {
    pub payloads: Vec<CommentPayload>,
    /// Open issues that did not qualify for an inline comment.
    pub skipped: usize,
}

/// Decides whether `issue` gets an inline comment.
pub fn decide<C, B>(
    ctx: &C,
    blame: &B,
    commits: &CommitSet,
    merge_request: &MergeRequestRef,
    issue: &ComponentIssue,
) -> DecorateResult<IssueDecision>
where
    C: AnalysisContext + ?Sized,
    B: BlameLookup + ?Sized,
{
    if !issue.status.is_open() {
        return Ok(IssueDecision::NotOpen);
    }
    let (Some(path), Some(line)) = (ctx.scm_path(issue), issue.line) else {
        return Ok(IssueDecision::NoLocation);
    };
    let Some(revision) = blame.revision_for_line(&issue.component, line) else {
        return Ok(IssueDecision::NoBlame { path, line });
    };
    if !commits.contains(revision) {
        return Ok(IssueDecision::OutsideMergeRequest {
            path,
            line,
            revision: revision.to_string(),
        });
    }

    let body = ctx.render_issue(issue);
    let payload = inline_payload(body, merge_request, &path, line)?;
    Ok(IssueDecision::Comment(payload))
}

/// Runs [`decide`] over every issue of the analysis, logging each skip.
pub fn select_inline_comments<C, B>(
    ctx: &C,
    blame: &B,
    commits: &CommitSet,
    merge_request: &MergeRequestRef,
) -> DecorateResult<InlineSelection>
where
    C: AnalysisContext + ?Sized,
    B: BlameLookup + ?Sized,
{
    let mut selection = InlineSelection::default();
    for issue in ctx.issues() {
        match decide(ctx, blame, commits, merge_request, issue)? {
            IssueDecision::Comment(payload) => selection.payloads.push(payload),
            IssueDecision::NotOpen => {}
            IssueDecision::NoLocation => {
                debug!(component = %issue.component, "skipping issue without path or line");
                selection.skipped += 1;
            }
            IssueDecision::NoBlame { path, line } => {
                debug!("skipping {}:{} since no changeset is recorded for it", path, line);
                selection.skipped += 1;
            }
            IssueDecision::OutsideMergeRequest {
                path,
                line,
                revision,
            } => {
                info!(
                    "skipping {}:{} since commit {} does not belong to the MR",
                    path, line, revision
                );
                selection.skipped += 1;
            }
        }
    }
    Ok(selection)
}
