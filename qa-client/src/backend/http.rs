use std::fs;
use std::path::Path;

use qa_model::{
    AskRequest, AskResponse, ErrorBody, FtsHit, IndexResponse, SearchRequest, SearchResponse, SemanticHit,
    SemanticSearchRequest, SemanticSearchResponse,
};
use reqwest::blocking::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{endpoints, ClientError, QaBackend};
use crate::config::ClientConfig;

/// Blocking reqwest implementation of [`QaBackend`].
///
/// Calls block the current thread; front-ends run them on worker threads.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: ClientConfig,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfiguration { message: e.to_string() })?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }

    fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let resp = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .map_err(|e| transport(endpoint, e))?;
        read_json(endpoint, resp)
    }
}

impl QaBackend for HttpBackend {
    fn index(&self, file: &Path) -> Result<IndexResponse, ClientError> {
        let endpoint = endpoints::INDEX;
        let bytes = fs::read(file).map_err(|e| ClientError::Io {
            path: file.display().to_string(),
            message: e.to_string(),
        })?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        debug!(endpoint, file = %file.display(), size = bytes.len(), "uploading document");
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for(file))
            .map_err(|e| ClientError::InvalidConfiguration { message: e.to_string() })?;
        let form = multipart::Form::new().part("file", part);
        let resp = self
            .client
            .post(self.url(endpoint))
            .multipart(form)
            .send()
            .map_err(|e| transport(endpoint, e))?;
        read_json(endpoint, resp).inspect_err(|e| warn!(endpoint, error = %e, "index failed"))
    }

    fn search(&self, db_path: &str, query: &str) -> Result<Vec<FtsHit>, ClientError> {
        let endpoint = endpoints::SEARCH;
        debug!(endpoint, db_path, query, "keyword search");
        let body = SearchRequest { db_path: db_path.to_string(), query: query.to_string() };
        self.post_json::<_, SearchResponse>(endpoint, &body)
            .map(|r| r.results)
            .inspect_err(|e| warn!(endpoint, error = %e, "search failed"))
    }

    fn semantic_search(&self, db_path: &str, query: &str, top_k: usize) -> Result<Vec<SemanticHit>, ClientError> {
        let endpoint = endpoints::SEMANTIC_SEARCH;
        debug!(endpoint, db_path, query, top_k, "semantic search");
        let body = SemanticSearchRequest { db_path: db_path.to_string(), query: query.to_string(), top_k };
        self.post_json::<_, SemanticSearchResponse>(endpoint, &body)
            .map(|r| r.results)
            .inspect_err(|e| warn!(endpoint, error = %e, "semantic search failed"))
    }

    fn ask(&self, db_path: &str, question: &str, threshold: f32) -> Result<AskResponse, ClientError> {
        let endpoint = endpoints::ASK;
        debug!(endpoint, db_path, threshold, "asking question");
        let body = AskRequest { db_path: db_path.to_string(), question: question.to_string(), threshold };
        self.post_json(endpoint, &body)
            .inspect_err(|e| warn!(endpoint, error = %e, "ask failed"))
    }

    fn fetch_pdf(&self, pdf_path: &str) -> Result<Vec<u8>, ClientError> {
        let endpoint = endpoints::PDF;
        debug!(endpoint, pdf_path, "downloading pdf");
        let resp = self
            .client
            .get(self.url(endpoint))
            .query(&[("path", pdf_path)])
            .send()
            .map_err(|e| transport(endpoint, e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().map_err(|e| transport(endpoint, e))?;
            return Err(status_error(endpoint, status.as_u16(), &body));
        }
        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| transport(endpoint, e))
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

fn read_json<R: DeserializeOwned>(endpoint: &str, resp: Response) -> Result<R, ClientError> {
    let status = resp.status();
    let body = resp.text().map_err(|e| transport(endpoint, e))?;
    if !status.is_success() {
        return Err(status_error(endpoint, status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(|e| ClientError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

fn status_error(endpoint: &str, status: u16, body: &str) -> ClientError {
    let message = ErrorBody::parse(body).unwrap_or_else(|| body.trim().to_string());
    ClientError::Status { endpoint: endpoint.to_string(), status, message }
}

fn transport(endpoint: &str, err: reqwest::Error) -> ClientError {
    ClientError::Transport { endpoint: endpoint.to_string(), message: err.to_string() }
}

fn mime_for(file: &Path) -> &'static str {
    match file.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
