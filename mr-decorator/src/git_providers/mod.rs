//! GitLab I/O: transport, resolvers and the shared data model.

pub mod gitlab;
pub mod remote;
pub mod types;

pub use types::*;

/// Connection settings for the GitLab instance, independent of any analysis.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Access token sent as `PRIVATE-TOKEN`.
    pub token: String,
    /// Public root of the analysis dashboard, target of the status link.
    pub public_root_url: String,
}
