//! In-memory backend answering every call from a fixed script.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use qa_client::{ClientError, QaBackend};
use qa_model::{AskResponse, FtsHit, IndexResponse, SemanticHit, SourceRef};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Index(PathBuf),
    Search { db_path: String, query: String },
    Semantic { db_path: String, query: String, top_k: usize },
    Ask { db_path: String, question: String, threshold: f32 },
    Pdf(String),
}

pub struct ScriptedBackend {
    pub index: Result<IndexResponse, ClientError>,
    pub search: Result<Vec<FtsHit>, ClientError>,
    pub semantic: Result<Vec<SemanticHit>, ClientError>,
    pub ask: Result<AskResponse, ClientError>,
    pub calls: Mutex<Vec<Call>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            index: Ok(IndexResponse {
                db_path: "uploads/manual.pdf.db".into(),
                pdf_path: "uploads/manual.pdf".into(),
                lines_indexed: Some(128),
            }),
            search: Ok(vec![FtsHit { page: 3, line: 14, snippet: "the [torque] spec".into() }]),
            semantic: Ok(vec![
                SemanticHit { page: 5, line: 2, score: 0.8123, text: "tighten to 40 nm".into() },
                SemanticHit { page: 1, line: 9, score: 0.4011, text: "safety notes".into() },
            ]),
            ask: Ok(AskResponse {
                answer: "40 Nm.".into(),
                sources: vec![SourceRef { page: 5, line: 2, score: 0.812 }],
            }),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedBackend {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

pub fn transport_error(endpoint: &str) -> ClientError {
    ClientError::Transport { endpoint: endpoint.into(), message: "connection refused".into() }
}

impl QaBackend for ScriptedBackend {
    fn index(&self, file: &Path) -> Result<IndexResponse, ClientError> {
        self.record(Call::Index(file.to_path_buf()));
        self.index.clone()
    }

    fn search(&self, db_path: &str, query: &str) -> Result<Vec<FtsHit>, ClientError> {
        self.record(Call::Search { db_path: db_path.into(), query: query.into() });
        self.search.clone()
    }

    fn semantic_search(&self, db_path: &str, query: &str, top_k: usize) -> Result<Vec<SemanticHit>, ClientError> {
        self.record(Call::Semantic { db_path: db_path.into(), query: query.into(), top_k });
        self.semantic.clone()
    }

    fn ask(&self, db_path: &str, question: &str, threshold: f32) -> Result<AskResponse, ClientError> {
        self.record(Call::Ask { db_path: db_path.into(), question: question.into(), threshold });
        self.ask.clone()
    }

    fn fetch_pdf(&self, pdf_path: &str) -> Result<Vec<u8>, ClientError> {
        self.record(Call::Pdf(pdf_path.into()));
        Ok(b"%PDF-1.4".to_vec())
    }

    fn base_url(&self) -> &str {
        "http://127.0.0.1:5000"
    }
}
