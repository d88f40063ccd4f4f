mod support;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use qa_client::{ClientConfig, ClientError};
use qa_service::{Intent, QaService, Status, ASK_FAILED_ANSWER};
use support::{transport_error, Call, ScriptedBackend};

fn service_with(backend: ScriptedBackend) -> (QaService, Arc<ScriptedBackend>) {
    let backend = Arc::new(backend);
    (QaService::new(backend.clone()), backend)
}

#[test]
fn full_flow_uploads_searches_and_asks() {
    let (svc, backend) = service_with(ScriptedBackend::default());

    svc.update(Intent::SelectFile(PathBuf::from("manual.pdf")));
    let state = svc.run(Intent::SubmitIndex);
    assert_eq!(state.status, Status::Indexed);
    assert_eq!(state.db_path, "uploads/manual.pdf.db");

    svc.update(Intent::SetFtsQuery("torque".into()));
    let state = svc.run(Intent::SubmitFts);
    assert_eq!(state.status, Status::FtsDone);
    assert_eq!(state.fts_results.len(), 1);

    svc.update(Intent::SetSemanticQuery("tightening".into()));
    let state = svc.run(Intent::SubmitSemantic);
    assert_eq!(state.status, Status::SemanticDone);
    assert_eq!(state.semantic_results.len(), 2);

    svc.update(Intent::SetQuestion("What torque?".into()));
    let state = svc.run(Intent::SubmitAsk);
    assert_eq!(state.status, Status::Answered);
    assert_eq!(state.answer, "40 Nm.");
    assert_eq!(state.sources.len(), 1);

    let calls = backend.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], Call::Index(PathBuf::from("manual.pdf")));
    assert_eq!(
        calls[1],
        Call::Search { db_path: "uploads/manual.pdf.db".into(), query: "torque".into() }
    );
    assert!(matches!(&calls[2], Call::Semantic { top_k: 6, .. }));
    match &calls[3] {
        Call::Ask { threshold, question, .. } => {
            assert_eq!(question, "What torque?");
            assert!((threshold - 0.35).abs() < 1e-6);
        }
        other => panic!("expected ask call, got {other:?}"),
    }
}

#[test]
fn search_without_index_issues_no_request() {
    let (svc, backend) = service_with(ScriptedBackend::default());
    svc.update(Intent::SetFtsQuery("torque".into()));
    let before = svc.state();

    let after = svc.run(Intent::SubmitFts);

    assert_eq!(after, before);
    assert!(backend.calls().is_empty());
}

#[test]
fn ask_transport_failure_uses_fallback_answer() {
    let backend = ScriptedBackend { ask: Err(transport_error("/api/ask")), ..ScriptedBackend::default() };
    let (svc, _) = service_with(backend);
    svc.update(Intent::Attach { db_path: "a.db".into(), pdf_path: "a.pdf".into() });

    let state = svc.run(Intent::SubmitAsk);

    assert_eq!(state.answer, ASK_FAILED_ANSWER);
    assert_eq!(state.status, Status::Error);
    assert!(state.sources.is_empty());
    assert!(state.last_error.is_some());
}

#[test]
fn index_failure_is_not_silent() {
    let backend = ScriptedBackend { index: Err(transport_error("/api/index")), ..ScriptedBackend::default() };
    let (svc, _) = service_with(backend);
    svc.update(Intent::SelectFile(PathBuf::from("manual.pdf")));

    let state = svc.run(Intent::SubmitIndex);

    assert_eq!(state.status, Status::Error);
    assert!(!state.has_index());
    assert!(state.last_error.unwrap_or_default().contains("connection refused"));
}

#[test]
fn requests_can_run_on_worker_threads() {
    let (svc, _) = service_with(ScriptedBackend::default());
    svc.update(Intent::Attach { db_path: "a.db".into(), pdf_path: "a.pdf".into() });
    let request = svc.update(Intent::SubmitSemantic).expect("index attached");
    assert!(svc.state().is_busy());

    let backend = svc.backend();
    let outcome = thread::spawn(move || request.execute(backend.as_ref()))
        .join()
        .expect("worker completes");
    let state = svc.complete(outcome);

    assert_eq!(state.status, Status::SemanticDone);
    assert!(!state.is_busy());
}

#[test]
fn pdf_link_requires_known_pdf_path() {
    let (svc, _) = service_with(ScriptedBackend::default());
    assert_eq!(svc.pdf_link(3, "foo"), None);

    svc.update(Intent::Attach { db_path: "x.db".into(), pdf_path: "/tmp/x.pdf".into() });

    assert_eq!(
        svc.pdf_link(3, "foo").as_deref(),
        Some("http://127.0.0.1:5000/api/pdf?path=%2Ftmp%2Fx.pdf#page=3&search=foo")
    );
}

#[test]
fn connect_validates_config_and_builds_matching_links() {
    let svc = QaService::connect(ClientConfig::default().with_base_url("http://qa.internal:9000/"))
        .expect("http url is accepted");
    assert_eq!(svc.links().base_url(), "http://qa.internal:9000");
    assert_eq!(svc.backend().base_url(), "http://qa.internal:9000");
    assert_eq!(svc.links().pdf_url("a.pdf", 2, ""), "http://qa.internal:9000/api/pdf?path=a.pdf#page=2");

    let err = QaService::connect(ClientConfig::default().with_base_url("ftp://qa.internal"))
        .err()
        .expect("non-http url is rejected");
    assert!(matches!(err, ClientError::InvalidConfiguration { .. }));
}
