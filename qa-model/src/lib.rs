//! Wire records shared by the PDF QA client crates.
//!
//! Field names follow the backend's JSON exactly (`db_path`, `top_k`, ...).
//! Collections default to empty when the backend omits them.

use serde::{Deserialize, Serialize};

/// Number of neighbours requested by the semantic search card.
pub const DEFAULT_TOP_K: usize = 6;

/// Bounds of the confidence threshold passed to `/api/ask`.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

pub const THRESHOLD_RANGE: ThresholdRange = ThresholdRange {
    min: 0.20,
    max: 0.70,
    step: 0.05,
    default: 0.35,
};

/// Result of `POST /api/index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexResponse {
    /// Opaque handle of the per-document index; scopes every later query.
    pub db_path: String,
    /// Opaque handle of the stored PDF; used to build viewer links.
    pub pdf_path: String,
    /// Number of text lines the backend indexed, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_indexed: Option<u64>,
}

/// Body of `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub db_path: String,
    pub query: String,
}

/// One keyword hit. `snippet` carries backend highlight markup and must be
/// sanitized before display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtsHit {
    pub page: u32,
    pub line: u32,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<FtsHit>,
}

/// Body of `POST /api/semantic_search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticSearchRequest {
    pub db_path: String,
    pub query: String,
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticHit {
    pub page: u32,
    pub line: u32,
    pub score: f32,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SemanticSearchResponse {
    #[serde(default)]
    pub results: Vec<SemanticHit>,
}

/// Body of `POST /api/ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    pub db_path: String,
    pub question: String,
    pub threshold: f32,
}

/// A passage the answer was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub page: u32,
    pub line: u32,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: String,
    /// Ordered as returned by the backend.
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

/// Error payload the backend sends with non-2xx statuses (e.g. missing upload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    /// Extracts the `error` field from a response body, if it is one.
    pub fn parse(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error)
    }
}
