use mr_decorator::AnalysisReport;
use serde::Deserialize;

/// Request body for decorating a GitLab merge request with a finished analysis.
///
/// Sent by the analysis pipeline once the quality gate has been computed.
#[derive(Debug, Deserialize)]
pub struct DecorateMrRequest {
    /// Shared secret used to protect the endpoint from unauthorized calls.
    pub secret: String,
    /// The analysis to report, including blame for the lines its issues sit on.
    pub report: AnalysisReport,
}
