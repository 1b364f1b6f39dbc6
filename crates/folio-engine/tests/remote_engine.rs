//! Integration tests for RemoteEngine against an in-process stub service

use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use folio_engine::{EngineError, ExtractionEngine, RemoteEngine};
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;

async fn stub_extract(headers: HeaderMap) -> impl IntoResponse {
    match headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        Some("valid-key") => (
            StatusCode::OK,
            Json(json!({
                "pdf_name": "quarterly",
                "total_pages": 3,
                "pages_with_tables": 2,
                "total_tables_extracted": 3,
                "extracted_titles": ["Revenue", "Costs", "Headcount"],
                "tables": [
                    {"file_name": "quarterly_page2_table1.csv", "csv": "q,rev\n1,10\n"},
                    {"file_name": "quarterly_page2_table2.csv", "csv": "q,cost\n1,4\n"},
                    {"file_name": "../../escape.csv", "csv": "x\n"}
                ]
            })),
        )
            .into_response(),
        Some("unsupported") => (StatusCode::UNPROCESSABLE_ENTITY, "not a pdf").into_response(),
        _ => (StatusCode::UNAUTHORIZED, "bad key").into_response(),
    }
}

/// Start the stub service and return its base URL
async fn spawn_stub() -> String {
    let app = Router::new().route("/v1/extract", post(stub_extract));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn write_document(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("quarterly.pdf");
    std::fs::write(&path, b"%PDF-1.7 stub").unwrap();
    path
}

#[tokio::test]
async fn test_successful_extraction_writes_tables() {
    let url = spawn_stub().await;
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let doc = write_document(&input);

    let engine = RemoteEngine::new(url, output.path()).unwrap();
    let record = engine.extract(&doc, "valid-key").await.unwrap();

    assert_eq!(record.source_name, "quarterly");
    assert_eq!(record.page_count, 3);
    assert_eq!(record.pages_with_tables, 2);
    assert_eq!(record.table_count, 3);
    assert_eq!(record.extracted_titles, vec!["Revenue", "Costs", "Headcount"]);
    assert_eq!(record.artifact_paths().len(), 3);

    let out_dir = record.output_directory.clone().unwrap();
    assert!(out_dir.starts_with(output.path()));
    for path in record.artifact_paths() {
        assert!(path.is_file());
        // Service-supplied names never escape the output directory
        assert_eq!(path.parent().unwrap(), out_dir.as_path());
    }

    let first = std::fs::read_to_string(&record.artifact_paths()[0]).unwrap();
    assert_eq!(first, "q,rev\n1,10\n");
}

#[tokio::test]
async fn test_rejected_credential() {
    let url = spawn_stub().await;
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let doc = write_document(&input);

    let engine = RemoteEngine::new(url, output.path()).unwrap();
    let result = engine.extract(&doc, "nope").await;

    assert!(matches!(result, Err(EngineError::InvalidCredential)));
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unsupported_document() {
    let url = spawn_stub().await;
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let doc = write_document(&input);

    let engine = RemoteEngine::new(url, output.path()).unwrap();
    let result = engine.extract(&doc, "unsupported").await;

    match result {
        Err(EngineError::UnsupportedDocument(msg)) => assert_eq!(msg, "not a pdf"),
        other => panic!("Expected UnsupportedDocument, got {:?}", other),
    }
}
