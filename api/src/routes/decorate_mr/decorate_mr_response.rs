use chrono::{DateTime, Utc};
use mr_decorator::DecorationOutcome;
use serde::Serialize;

/// Response body returned after a decoration pass completed.
#[derive(Debug, Serialize)]
pub struct DecorateMrResponse {
    pub message: String,
    pub outcome: DecorationOutcome,
    pub finished_at: DateTime<Utc>,
}
