use std::sync::{Arc, RwLock};

use qa_client::{ClientConfig, ClientError, HttpBackend, QaBackend, ViewerLinks};
use tracing::info;

pub mod session;
pub mod snippet;
pub mod threshold;

pub use session::{Intent, Outcome, Request, RequestKind, SessionState, Status, Ticket, ASK_FAILED_ANSWER};
pub use snippet::{Snippet, Span};
pub use threshold::Threshold;

/// Binds a backend to one [`SessionState`].
///
/// `update` and `complete` are split so a front-end can run the request
/// elsewhere (see [`Request::execute`]); `run` does all three inline.
pub struct QaService {
    backend: Arc<dyn QaBackend>,
    links: ViewerLinks,
    state: RwLock<SessionState>,
}

impl QaService {
    pub fn new(backend: Arc<dyn QaBackend>) -> Self {
        let links = ViewerLinks::new(backend.base_url());
        Self { backend, links, state: RwLock::new(SessionState::new()) }
    }

    /// Convenience constructor over [`HttpBackend`].
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let backend = HttpBackend::new(config)?;
        info!(base_url = backend.base_url(), "backend configured");
        Ok(Self::new(Arc::new(backend)))
    }

    pub fn backend(&self) -> Arc<dyn QaBackend> {
        Arc::clone(&self.backend)
    }

    /// Points the service at another backend. Session state is kept.
    pub fn replace_backend(&mut self, backend: Arc<dyn QaBackend>) {
        self.links = ViewerLinks::new(backend.base_url());
        self.backend = backend;
    }

    pub fn links(&self) -> &ViewerLinks {
        &self.links
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        match self.state.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Applies an intent and returns the request to issue, if any.
    pub fn update(&self, intent: Intent) -> Option<Request> {
        let mut guard = self.state.write().unwrap_or_else(|p| p.into_inner());
        let (next, request) = guard.dispatch(intent);
        *guard = next;
        drop(guard);
        request
    }

    pub fn complete(&self, outcome: Outcome) -> SessionState {
        let mut guard = self.state.write().unwrap_or_else(|p| p.into_inner());
        let next = guard.complete(outcome);
        *guard = next.clone();
        next
    }

    /// Applies an intent and, when it issues a request, runs it on the
    /// calling thread before returning the resulting state.
    pub fn run(&self, intent: Intent) -> SessionState {
        match self.update(intent) {
            Some(request) => {
                let outcome = request.execute(self.backend.as_ref());
                self.complete(outcome)
            }
            None => self.state(),
        }
    }

    /// Viewer URL for a hit, or `None` before any document is indexed.
    pub fn pdf_link(&self, page: u32, highlight: &str) -> Option<String> {
        let state = self.state();
        if state.pdf_path.is_empty() {
            return None;
        }
        Some(self.links.pdf_url(&state.pdf_path, page, highlight))
    }
}
