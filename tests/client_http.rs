use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use lcds::{
    ApiError, ClientConfig, Difficulty, DifficultyFilter, FilterState, HttpProblemApi,
    ProblemApi, SaveRequest, SortOrder, UploadFile,
};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct StubLog {
    queries: Arc<Mutex<Vec<String>>>,
    bodies: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

async fn list(State(log): State<StubLog>, RawQuery(query): RawQuery) -> Json<Value> {
    log.queries
        .lock()
        .expect("stub log lock should not be poisoned")
        .push(query.unwrap_or_default());
    Json(json!({
        "problems": [{
            "slug": "1-two-sum",
            "number": 1,
            "title": "Two Sum",
            "difficulty": "Easy",
            "tags": ["Array"],
            "date": "2024-01-01",
            "url": "https://leetcode.com/problems/two-sum/",
            "body": "# Two Sum",
            "filename": "0001-two-sum.md"
        }]
    }))
}

async fn detail(Path(slug): Path<String>) -> impl IntoResponse {
    if slug == "1-two-sum" {
        (
            StatusCode::OK,
            Json(json!({"slug": slug, "title": "Two Sum", "difficulty": "Easy"})),
        )
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"detail": "Problem not found"})))
    }
}

async fn save(Json(request): Json<Value>) -> impl IntoResponse {
    if request["markdown"].as_str().unwrap_or_default().trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Markdown content is empty"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"title": "Climbing Stairs", "path": "problems/70-climbing-stairs.md"})),
    )
}

async fn upload(State(log): State<StubLog>, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let content_type = headers
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    log.bodies
        .lock()
        .expect("stub log lock should not be poisoned")
        .push((content_type, body.to_vec()));
    Json(json!({
        "success": 1,
        "uploaded": [{"title": "Two Sum", "path": "problems/1-two-sum.md"}],
        "errors": ["notes.txt: Not a markdown file"]
    }))
}

async fn spawn_stub() -> (SocketAddr, StubLog) {
    let log = StubLog::default();
    let app = Router::new()
        .route("/api/stats", get(|| async { Json(json!({"total": 2, "easy": 1, "medium": 1, "hard": 0})) }))
        .route("/api/tags", get(|| async { Json(json!({"tags": ["Array", "Stack"]})) }))
        .route("/api/problems", get(list))
        .route("/api/problems/{slug}", get(detail))
        .route("/api/editor/save", post(save))
        .route("/api/upload", post(upload))
        .route("/broken/api/stats", get(|| async { "not json" }))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, log)
}

fn client(addr: SocketAddr, prefix: &str) -> HttpProblemApi {
    let cfg = ClientConfig::with_base_url(&format!("http://{addr}{prefix}")).unwrap();
    HttpProblemApi::new(&cfg).unwrap()
}

#[tokio::test]
async fn list_problems_sends_mandatory_and_optional_params() {
    let (addr, log) = spawn_stub().await;
    let api = client(addr, "/");

    let problems = api.list_problems(&FilterState::default()).await.unwrap();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].difficulty, Difficulty::Easy);

    let filters = FilterState {
        search: "two sum".to_string(),
        difficulty: DifficultyFilter::Only(Difficulty::Medium),
        tag: "Hash Table".to_string(),
        sort: SortOrder::DifficultyDesc,
    };
    api.list_problems(&filters).await.unwrap();

    let queries = log.queries.lock().unwrap().clone();
    assert_eq!(
        queries,
        vec![
            "difficulty=All&sort=number_asc".to_string(),
            "difficulty=Medium&sort=difficulty_desc&search=two+sum&tag=Hash+Table".to_string(),
        ]
    );
}

#[tokio::test]
async fn stats_and_tags_decode() {
    let (addr, _) = spawn_stub().await;
    let api = client(addr, "");

    let stats = api.stats().await.unwrap();
    assert_eq!((stats.total, stats.easy, stats.hard), (2, 1, 0));
    assert_eq!(api.tags().await.unwrap(), vec!["Array", "Stack"]);
}

#[tokio::test]
async fn missing_problem_maps_to_not_found() {
    let (addr, _) = spawn_stub().await;
    let api = client(addr, "/");

    assert_eq!(api.get_problem("1-two-sum").await.unwrap().title, "Two Sum");
    assert_eq!(
        api.get_problem("nope").await.unwrap_err(),
        ApiError::NotFound {
            slug: "nope".to_string()
        }
    );
}

#[tokio::test]
async fn save_errors_surface_server_detail() {
    let (addr, _) = spawn_stub().await;
    let api = client(addr, "/");

    let saved = api
        .save_markdown(&SaveRequest {
            markdown: "# 70. Climbing Stairs".to_string(),
            filename: None,
        })
        .await
        .unwrap();
    assert_eq!(saved.path, "problems/70-climbing-stairs.md");

    let err = api
        .save_markdown(&SaveRequest {
            markdown: " ".to_string(),
            filename: Some("x.md".to_string()),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Server {
            status: 400,
            detail: "Markdown content is empty".to_string()
        }
    );
    assert_eq!(err.user_message(), "Markdown content is empty");
}

#[tokio::test]
async fn upload_posts_multipart_files() {
    let (addr, log) = spawn_stub().await;
    let api = client(addr, "/");

    let report = api
        .upload(&[
            UploadFile::new("0001-two-sum.md", "# 1. Two Sum"),
            UploadFile::new("notes.txt", "plain"),
        ])
        .await
        .unwrap();
    assert_eq!(report.success, 1);
    assert_eq!(report.errors, vec!["notes.txt: Not a markdown file"]);

    let bodies = log.bodies.lock().unwrap().clone();
    let (content_type, body) = &bodies[0];
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(body);
    assert!(body.contains("name=\"files\"; filename=\"0001-two-sum.md\""));
    assert!(body.contains("name=\"files\"; filename=\"notes.txt\""));
}

#[tokio::test]
async fn invalid_json_is_a_decode_error() {
    let (addr, _) = spawn_stub().await;
    let api = client(addr, "/broken/");

    assert!(matches!(
        api.stats().await.unwrap_err(),
        ApiError::Decode { .. }
    ));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(addr, "/");
    assert!(matches!(
        api.list_problems(&FilterState::default()).await.unwrap_err(),
        ApiError::Network { .. }
    ));
}
