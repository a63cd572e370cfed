//! Data model shared by the GitLab resolvers and the publisher.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Opaque commit SHA in GitLab's namespace.
pub type CommitId = String;

/// De-duplicated commits of one merge request. Built once per pass.
#[derive(Debug, Clone, Default)]
pub struct CommitSet {
    ids: HashSet<CommitId>,
}

impl CommitSet {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<CommitId> for CommitSet {
    fn from_iter<I: IntoIterator<Item = CommitId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Triple of SHAs used to bind inline comments to the MR diff.
///
/// GitLab may send `null` for any of them on a freshly created MR,
/// so they stay optional until a payload actually needs them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffRefs {
    #[serde(default)]
    pub base_sha: Option<String>,
    #[serde(default)]
    pub start_sha: Option<String>,
    #[serde(default)]
    pub head_sha: Option<String>,
}

/// Merge request metadata we need for decoration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequestRef {
    pub iid: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    /// Absent on some GitLab versions; treated like three null SHAs.
    #[serde(default)]
    pub diff_refs: Option<DiffRefs>,
}

/// Form body sent to the discussions endpoint, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentPayload {
    fields: Vec<(String, String)>,
}

impl CommentPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// URL of the following page (`Link: <..>; rel="next"`).
    pub next: Option<String>,
}
