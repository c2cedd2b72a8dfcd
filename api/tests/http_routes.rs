use std::path::Path;
use std::sync::Arc;

use api::{AppConfig, AppState, router};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use manual_index::QueryService;
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "manual-search-test-boundary";

/// Minimal structurally valid PNG carrying `payload`.
fn fake_png(payload: &[u8]) -> Vec<u8> {
    let mut v = b"\x89PNG\r\n\x1a\n".to_vec();
    v.extend_from_slice(&[0, 0, 0, 13]);
    v.extend_from_slice(b"IHDR");
    v.extend_from_slice(payload);
    v.extend_from_slice(&[0, 0, 0, 0]);
    v.extend_from_slice(b"IEND");
    v.extend_from_slice(&[0xAE, 0x42, 0x60, 0x82]);
    v
}

fn write_corpus(dir: &Path) -> std::path::PathBuf {
    let mut lines = String::new();
    for page in 1..=3u32 {
        let name = format!("page-{page}.png");
        std::fs::write(dir.join(&name), fake_png(format!("page-{page}").as_bytes())).unwrap();
        lines.push_str(&format!(
            "{{\"id\": {page}, \"vehicle\": \"X123\", \"manual\": \"Engine\", \"page\": {page}, \"text\": \"Engine manual page {page}\", \"image\": \"{name}\"}}\n"
        ));
    }
    let manifest = dir.join("corpus.jsonl");
    std::fs::write(&manifest, lines).unwrap();
    manifest
}

fn write_text_corpus(dir: &Path) -> std::path::PathBuf {
    let lines: String = (1..=3u32)
        .map(|page| {
            format!(
                "{{\"id\": {page}, \"vehicle\": \"X123\", \"manual\": \"Engine\", \"page\": {page}, \"text\": \"Engine manual page {page}\"}}\n"
            )
        })
        .collect();
    let manifest = dir.join("text.jsonl");
    std::fs::write(&manifest, lines).unwrap();
    manifest
}

fn config(corpus: Option<&Path>) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.service.embedding.dim = 64;
    cfg.service.corpus_path = corpus.map(Path::to_path_buf);
    cfg
}

async fn app(corpus: Option<&Path>, load: bool) -> Router {
    let cfg = config(corpus);
    let service = Arc::new(QueryService::from_config(cfg.service.clone()).unwrap());
    if load {
        service.rebuild_from_corpus(None).await.unwrap();
    }
    router(Arc::new(AppState::new(service, cfg)))
}

fn multipart(uri: &str, field: &str, filename: Option<&str>, content: &[u8]) -> Request<Body> {
    let disposition = match filename {
        Some(f) => format!("form-data; name=\"{field}\"; filename=\"{f}\""),
        None => format!("form-data; name=\"{field}\""),
    };
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json(res: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn image_search_returns_matching_page() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_corpus(dir.path());
    let app = app(Some(&manifest), true).await;

    let res = app
        .oneshot(multipart("/search", "image", Some("q.png"), &fake_png(b"page-2")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let body = json(res).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["vehicle"], "X123");
    assert_eq!(body["manual"], "Engine");
    assert_eq!(body["match_type"], "exact_image");
    assert_eq!(body["confidence"], "high");
    assert!((body["score"].as_f64().unwrap() - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn text_search_and_top_k() {
    let dir = tempfile::tempdir().unwrap();
    let text_app = app(Some(&write_text_corpus(dir.path())), true).await;
    let res = text_app
        .oneshot(multipart("/search", "text", None, b"Engine manual page 3"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json(res).await["page"], 3);

    let manifest = write_corpus(dir.path());
    let app = app(Some(&manifest), true).await;

    let res = app
        .oneshot(multipart("/search/top?k=2", "image", Some("q.png"), &fake_png(b"page-1")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["page"], 1);
    assert!(results[0]["score"].as_f64() >= results[1]["score"].as_f64());
}

#[tokio::test]
async fn unready_index_is_service_unavailable() {
    let app = app(None, false).await;

    let res = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["ready"], false);

    let res = app
        .oneshot(multipart("/search", "image", Some("q.png"), &fake_png(b"page-2")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json(res).await;
    assert_eq!(body["error"], "NOT_READY");
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn bad_uploads_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_corpus(dir.path());
    let app = app(Some(&manifest), true).await;

    let res = app
        .clone()
        .oneshot(multipart("/search", "file", Some("q.png"), &fake_png(b"x")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(res).await["error"], "BAD_REQUEST");

    let res = app
        .clone()
        .oneshot(multipart("/search", "image", Some("q.png"), b"not an image at all"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(res).await["error"], "UNSUPPORTED_INPUT");

    let req = Request::builder()
        .method("POST")
        .uri("/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(res).await["error"], "BAD_MULTIPART");
}

#[tokio::test]
async fn stats_and_records() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_corpus(dir.path());
    let app = app(Some(&manifest), true).await;

    let body = json(app.clone().oneshot(get("/stats")).await.unwrap()).await;
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["vehicles"], 1);
    assert_eq!(body["device"], "cpu");
    assert_eq!(body["ready"], true);
    assert_eq!(body["index_kind"], "flat");
    assert_eq!(body["dimension"], 64);

    let res = app.clone().oneshot(get("/records/2")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res).await;
    assert_eq!(body["text"], "Engine manual page 2");
    assert!(body.get("embedding").is_none());

    let res = app.clone().oneshot(get("/records/99")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(res).await["error"], "RECORD_NOT_FOUND");

    let res = app.clone().oneshot(get("/records/abc")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.oneshot(get("/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(res).await["error"], "NOT_FOUND");
}

#[tokio::test]
async fn rebuild_endpoint_reports_and_readies() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_corpus(dir.path());
    let app = app(Some(&manifest), false).await;

    let req = Request::builder()
        .method("POST")
        .uri("/index/rebuild")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["indexed"], 3);
    assert_eq!(body["data"]["skipped"], 0);

    let body = json(app.oneshot(get("/")).await.unwrap()).await;
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn rebuild_without_corpus_is_an_error_envelope() {
    let app = app(None, false).await;
    let req = Request::builder()
        .method("POST")
        .uri("/index/rebuild")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "CONFIG_ERROR");
}

#[tokio::test]
async fn request_id_is_propagated() {
    let app = app(None, false).await;
    let req = Request::builder()
        .uri("/stats")
        .header("X-Request-Id", "trace-42")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-42");
}
