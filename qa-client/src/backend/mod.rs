use std::path::Path;

use qa_model::{AskResponse, FtsHit, IndexResponse, SemanticHit};
use thiserror::Error;

mod http;

pub use http::HttpBackend;

/// Paths of the backend routes, relative to the base URL.
pub mod endpoints {
    pub const INDEX: &str = "/api/index";
    pub const SEARCH: &str = "/api/search";
    pub const SEMANTIC_SEARCH: &str = "/api/semantic_search";
    pub const ASK: &str = "/api/ask";
    pub const PDF: &str = "/api/pdf";
}

/// Errors that can be produced by backend calls.
///
/// Payloads are plain strings so outcomes can be cloned into UI state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("invalid client configuration: {message}")]
    InvalidConfiguration { message: String },
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },
    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },
}

/// Core interface to the QA backend. One call is one request/response.
pub trait QaBackend: Send + Sync {
    /// Uploads a document and has the backend index it.
    fn index(&self, file: &Path) -> Result<IndexResponse, ClientError>;
    /// Keyword search scoped to `db_path`.
    fn search(&self, db_path: &str, query: &str) -> Result<Vec<FtsHit>, ClientError>;
    /// Embedding search scoped to `db_path`; order is whatever the backend returns.
    fn semantic_search(&self, db_path: &str, query: &str, top_k: usize) -> Result<Vec<SemanticHit>, ClientError>;
    fn ask(&self, db_path: &str, question: &str, threshold: f32) -> Result<AskResponse, ClientError>;
    /// Raw bytes of the stored PDF.
    fn fetch_pdf(&self, pdf_path: &str) -> Result<Vec<u8>, ClientError>;
    fn base_url(&self) -> &str;
}
