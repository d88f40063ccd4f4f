use qa_model::{AskRequest, AskResponse, ErrorBody, IndexResponse, SearchResponse, SemanticSearchRequest};
use serde_json::json;

#[test]
fn index_response_tolerates_missing_line_count() {
    let resp: IndexResponse =
        serde_json::from_value(json!({"db_path": "uploads/a.pdf.db", "pdf_path": "uploads/a.pdf"})).expect("decodes");

    assert_eq!(resp.lines_indexed, None);
    let back = serde_json::to_value(&resp).expect("encodes");
    assert!(back.get("lines_indexed").is_none());
}

#[test]
fn missing_collections_decode_as_empty() {
    let search: SearchResponse = serde_json::from_value(json!({})).expect("decodes");
    let ask: AskResponse = serde_json::from_value(json!({"answer": "n/a"})).expect("decodes");

    assert!(search.results.is_empty());
    assert_eq!(ask.answer, "n/a");
    assert!(ask.sources.is_empty());
}

#[test]
fn request_bodies_use_backend_field_names() {
    let semantic = SemanticSearchRequest { db_path: "a.db".into(), query: "q".into(), top_k: 6 };
    let ask = AskRequest { db_path: "a.db".into(), question: "why?".into(), threshold: 0.5 };

    assert_eq!(
        serde_json::to_value(&semantic).expect("encodes"),
        json!({"db_path": "a.db", "query": "q", "top_k": 6})
    );
    assert_eq!(
        serde_json::to_value(&ask).expect("encodes"),
        json!({"db_path": "a.db", "question": "why?", "threshold": 0.5})
    );
}

#[test]
fn error_body_parse_only_accepts_error_objects() {
    assert_eq!(ErrorBody::parse(r#"{"error":"No file uploaded"}"#).as_deref(), Some("No file uploaded"));
    assert_eq!(ErrorBody::parse("Not Found"), None);
    assert_eq!(ErrorBody::parse(r#"{"message":"x"}"#), None);
}
