use std::fmt;
use std::path::PathBuf;

use qa_client::{ClientError, QaBackend};
use qa_model::{AskResponse, FtsHit, IndexResponse, SemanticHit, SourceRef, DEFAULT_TOP_K};
use tracing::debug;

use crate::threshold::Threshold;

/// Answer shown when the ask call fails for any reason.
pub const ASK_FAILED_ANSWER: &str = "Failed to get answer.";

/// Single status line shared by all cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ready,
    Uploading,
    Indexed,
    Searching,
    FtsDone,
    SemanticSearching,
    SemanticDone,
    Thinking,
    Answered,
    Error,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Ready => "Ready",
            Status::Uploading => "Uploading...",
            Status::Indexed => "Indexed",
            Status::Searching => "Searching...",
            Status::FtsDone => "FTS done",
            Status::SemanticSearching => "Semantic searching...",
            Status::SemanticDone => "Semantic done",
            Status::Thinking => "Thinking...",
            Status::Answered => "Answered",
            Status::Error => "Error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Index,
    Fts,
    Semantic,
    Ask,
}

/// Identifies one issued request. Only the latest ticket per kind may
/// update the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub kind: RequestKind,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counters {
    index: u64,
    fts: u64,
    semantic: u64,
    ask: u64,
}

impl Counters {
    fn get(&self, kind: RequestKind) -> u64 {
        match kind {
            RequestKind::Index => self.index,
            RequestKind::Fts => self.fts,
            RequestKind::Semantic => self.semantic,
            RequestKind::Ask => self.ask,
        }
    }

    fn set(&mut self, kind: RequestKind, value: u64) {
        match kind {
            RequestKind::Index => self.index = value,
            RequestKind::Fts => self.fts = value,
            RequestKind::Semantic => self.semantic = value,
            RequestKind::Ask => self.ask = value,
        }
    }
}

/// User actions fed into [`SessionState::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    SelectFile(PathBuf),
    SetFtsQuery(String),
    SetSemanticQuery(String),
    SetQuestion(String),
    SetThreshold(f32),
    /// Reuse an index produced earlier instead of uploading again.
    Attach { db_path: String, pdf_path: String },
    SubmitIndex,
    SubmitFts,
    SubmitSemantic,
    SubmitAsk,
}

/// A backend call the session wants issued.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Index { ticket: Ticket, file: PathBuf },
    Fts { ticket: Ticket, db_path: String, query: String },
    Semantic { ticket: Ticket, db_path: String, query: String, top_k: usize },
    Ask { ticket: Ticket, db_path: String, question: String, threshold: Threshold },
}

impl Request {
    pub fn ticket(&self) -> Ticket {
        match self {
            Request::Index { ticket, .. }
            | Request::Fts { ticket, .. }
            | Request::Semantic { ticket, .. }
            | Request::Ask { ticket, .. } => *ticket,
        }
    }

    /// Performs the call. Blocking; safe to run on a worker thread.
    pub fn execute(&self, backend: &dyn QaBackend) -> Outcome {
        match self {
            Request::Index { ticket, file } => Outcome::Indexed { ticket: *ticket, result: backend.index(file) },
            Request::Fts { ticket, db_path, query } => Outcome::Fts {
                ticket: *ticket,
                result: backend.search(db_path, query),
            },
            Request::Semantic { ticket, db_path, query, top_k } => Outcome::Semantic {
                ticket: *ticket,
                result: backend.semantic_search(db_path, query, *top_k),
            },
            Request::Ask { ticket, db_path, question, threshold } => Outcome::Answered {
                ticket: *ticket,
                result: backend.ask(db_path, question, threshold.value()),
            },
        }
    }
}

/// Completion of a [`Request`], fed into [`SessionState::complete`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Indexed { ticket: Ticket, result: Result<IndexResponse, ClientError> },
    Fts { ticket: Ticket, result: Result<Vec<FtsHit>, ClientError> },
    Semantic { ticket: Ticket, result: Result<Vec<SemanticHit>, ClientError> },
    Answered { ticket: Ticket, result: Result<AskResponse, ClientError> },
}

impl Outcome {
    pub fn ticket(&self) -> Ticket {
        match self {
            Outcome::Indexed { ticket, .. }
            | Outcome::Fts { ticket, .. }
            | Outcome::Semantic { ticket, .. }
            | Outcome::Answered { ticket, .. } => *ticket,
        }
    }
}

/// Everything the front-ends render. Transitions never mutate in place;
/// they return the next state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub file: Option<PathBuf>,
    pub db_path: String,
    pub pdf_path: String,
    pub lines_indexed: Option<u64>,
    pub status: Status,
    pub last_error: Option<String>,

    pub fts_query: String,
    pub fts_results: Vec<FtsHit>,

    pub semantic_query: String,
    pub semantic_results: Vec<SemanticHit>,

    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub threshold: Threshold,

    issued: Counters,
    completed: Counters,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            file: None,
            db_path: String::new(),
            pdf_path: String::new(),
            lines_indexed: None,
            status: Status::Ready,
            last_error: None,
            fts_query: String::new(),
            fts_results: Vec::new(),
            semantic_query: String::new(),
            semantic_results: Vec::new(),
            question: String::new(),
            answer: String::new(),
            sources: Vec::new(),
            threshold: Threshold::default(),
            issued: Counters::default(),
            completed: Counters::default(),
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once an index (uploaded or attached) scopes the queries.
    pub fn has_index(&self) -> bool {
        !self.db_path.is_empty()
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.issued.get(kind) > self.completed.get(kind)
    }

    pub fn is_busy(&self) -> bool {
        [RequestKind::Index, RequestKind::Fts, RequestKind::Semantic, RequestKind::Ask]
            .into_iter()
            .any(|k| self.is_pending(k))
    }

    /// Applies a user intent. Submissions without their prerequisite (a
    /// file, or an index) leave the state untouched and issue nothing.
    pub fn dispatch(&self, intent: Intent) -> (SessionState, Option<Request>) {
        let mut next = self.clone();
        let request = match intent {
            Intent::SelectFile(path) => {
                next.file = Some(path);
                None
            }
            Intent::SetFtsQuery(q) => {
                next.fts_query = q;
                None
            }
            Intent::SetSemanticQuery(q) => {
                next.semantic_query = q;
                None
            }
            Intent::SetQuestion(q) => {
                next.question = q;
                None
            }
            Intent::SetThreshold(v) => {
                next.threshold = Threshold::new(v);
                None
            }
            Intent::Attach { db_path, pdf_path } => {
                if db_path.trim().is_empty() {
                    return (self.clone(), None);
                }
                next.invalidate_all();
                next.apply_index(IndexResponse { db_path, pdf_path, lines_indexed: None });
                None
            }
            Intent::SubmitIndex => {
                let Some(file) = next.file.clone() else {
                    return (self.clone(), None);
                };
                next.status = Status::Uploading;
                next.last_error = None;
                Some(Request::Index { ticket: next.issue(RequestKind::Index), file })
            }
            Intent::SubmitFts => {
                if !self.has_index() {
                    return (self.clone(), None);
                }
                next.status = Status::Searching;
                next.last_error = None;
                next.fts_results.clear();
                Some(Request::Fts {
                    ticket: next.issue(RequestKind::Fts),
                    db_path: next.db_path.clone(),
                    query: next.fts_query.clone(),
                })
            }
            Intent::SubmitSemantic => {
                if !self.has_index() {
                    return (self.clone(), None);
                }
                next.status = Status::SemanticSearching;
                next.last_error = None;
                next.semantic_results.clear();
                Some(Request::Semantic {
                    ticket: next.issue(RequestKind::Semantic),
                    db_path: next.db_path.clone(),
                    query: next.semantic_query.clone(),
                    top_k: DEFAULT_TOP_K,
                })
            }
            Intent::SubmitAsk => {
                if !self.has_index() {
                    return (self.clone(), None);
                }
                next.status = Status::Thinking;
                next.last_error = None;
                next.answer.clear();
                next.sources.clear();
                Some(Request::Ask {
                    ticket: next.issue(RequestKind::Ask),
                    db_path: next.db_path.clone(),
                    question: next.question.clone(),
                    threshold: next.threshold,
                })
            }
        };
        if let Some(req) = &request {
            debug!(ticket = ?req.ticket(), "request issued");
        }
        (next, request)
    }

    /// Applies a finished request. Outcomes whose ticket is no longer the
    /// latest of its kind are dropped.
    pub fn complete(&self, outcome: Outcome) -> SessionState {
        let ticket = outcome.ticket();
        if ticket.seq != self.issued.get(ticket.kind) {
            debug!(?ticket, latest = self.issued.get(ticket.kind), "dropping stale outcome");
            return self.clone();
        }
        let mut next = self.clone();
        next.completed.set(ticket.kind, ticket.seq);
        match outcome {
            Outcome::Indexed { result: Ok(resp), .. } => {
                next.invalidate(&[RequestKind::Fts, RequestKind::Semantic, RequestKind::Ask]);
                next.apply_index(resp);
            }
            Outcome::Fts { result: Ok(hits), .. } => {
                next.fts_results = hits;
                next.status = Status::FtsDone;
            }
            Outcome::Semantic { result: Ok(hits), .. } => {
                next.semantic_results = hits;
                next.status = Status::SemanticDone;
            }
            Outcome::Answered { result: Ok(resp), .. } => {
                next.answer = resp.answer;
                next.sources = resp.sources;
                next.status = Status::Answered;
            }
            Outcome::Answered { result: Err(err), .. } => {
                next.answer = ASK_FAILED_ANSWER.to_string();
                next.sources.clear();
                next.fail(err);
            }
            Outcome::Indexed { result: Err(err), .. }
            | Outcome::Fts { result: Err(err), .. }
            | Outcome::Semantic { result: Err(err), .. } => next.fail(err),
        }
        next
    }

    fn issue(&mut self, kind: RequestKind) -> Ticket {
        let seq = self.issued.get(kind) + 1;
        self.issued.set(kind, seq);
        Ticket { kind, seq }
    }

    /// Makes every in-flight request of `kinds` stale without marking it pending.
    fn invalidate(&mut self, kinds: &[RequestKind]) {
        for &kind in kinds {
            let seq = self.issued.get(kind) + 1;
            self.issued.set(kind, seq);
            self.completed.set(kind, seq);
        }
    }

    fn invalidate_all(&mut self) {
        self.invalidate(&[RequestKind::Index, RequestKind::Fts, RequestKind::Semantic, RequestKind::Ask]);
    }

    fn apply_index(&mut self, resp: IndexResponse) {
        self.db_path = resp.db_path;
        self.pdf_path = resp.pdf_path;
        self.lines_indexed = resp.lines_indexed;
        self.status = Status::Indexed;
        self.last_error = None;
        self.answer.clear();
        self.sources.clear();
        self.fts_results.clear();
        self.semantic_results.clear();
    }

    fn fail(&mut self, err: ClientError) {
        self.status = Status::Error;
        self.last_error = Some(err.to_string());
    }
}
