//! Public entry for the mr-decorator pipeline.
//!
//! Reports a finished code-quality analysis back to its GitLab merge request:
//!
//! 1) **Resolve**: endpoints from the scanner properties, coverage from the
//!    quality gate, auth headers from the provider config.
//! 2) **Fetch**: every commit of the MR (Link-header pagination) and the
//!    MR diff refs.
//! 3) **Status**: commit build status on the analysed revision, tolerating
//!    GitLab's "Cannot transition status" answer.
//! 4) **Comments**: one summary discussion, then one inline discussion per
//!    open issue whose line is blamed on a commit of the MR.
//!
//! Logging goes through `tracing`; every fatal condition is an [`errors::Error`].

pub mod analysis;
pub mod errors;
pub mod git_providers;
pub mod publish;

// -----------------------------------------------------------------------------
// Convenience re-exports for downstream users
// -----------------------------------------------------------------------------

pub use analysis::report::AnalysisReport;
pub use analysis::{AnalysisContext, BlameLookup};
pub use errors::{ConfigError, DecorateResult, Error, RemoteApiError};
pub use git_providers::ProviderConfig;
pub use publish::{DecorationOutcome, decorate_merge_request, decorate_with};
