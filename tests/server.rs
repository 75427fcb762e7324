//! Integration tests for the HTTP API.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rustpapers::server::{router, AppState, SharedState};
use rustpapers::store::RecordStore;
use rustpapers::survey::SurveyConfig;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_state(survey: SurveyConfig) -> SharedState {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    Arc::new(AppState {
        store: RecordStore::open(dir).unwrap(),
        survey,
    })
}

async fn send(state: SharedState, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = router(state).oneshot(request).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(state: SharedState, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(state, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(state: SharedState, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(state, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(make_state(SurveyConfig::default()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_list_and_search() {
    let state = make_state(SurveyConfig::default());
    let (status, json) = get_json(state.clone(), "/api/records").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);

    let (_, json) = get_json(state, "/api/records?q=GRAPH").await;
    assert_eq!(json["records"], json!(["graph_agents_2024.json"]));
}

#[tokio::test]
async fn test_record_blocks_and_markdown() {
    let state = make_state(SurveyConfig::default());
    let (status, json) = get_json(state.clone(), "/api/records/graph_agents_2024.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["blocks"][0]["type"], "heading");
    assert_eq!(json["blocks"][0]["level"], 1);

    let request = Request::builder()
        .uri("/api/records/graph_agents_2024.json?format=markdown")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(state, request).await;
    assert_eq!(status, StatusCode::OK);
    let md = String::from_utf8(body).unwrap();
    assert!(md.starts_with("# Graph-Guided Agents"));
}

#[tokio::test]
async fn test_record_errors() {
    let state = make_state(SurveyConfig::default());
    let (status, json) = get_json(state.clone(), "/api/records/missing.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("missing.json"));

    let (status, _) = get_json(state.clone(), "/api/records/broken.json").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = get_json(state, "/api/records/graph_agents_2024.json?format=pdf").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_subjects_and_papers() {
    let state = make_state(SurveyConfig::default());
    let (_, json) = get_json(state.clone(), "/api/subjects").await;
    assert_eq!(json, json!(["Biology", "NLP"]));

    let (_, json) = get_json(state, "/api/subjects/Biology/papers").await;
    assert_eq!(json, json!(["graph_agents_2024.json"]));
}

#[tokio::test]
async fn test_catalog_year_filter() {
    let state = make_state(SurveyConfig::default());
    let (_, json) = get_json(state.clone(), "/api/catalog").await;
    assert_eq!(json["years"], json!([2024, 2022]));
    assert_eq!(json["entries"].as_array().unwrap().len(), 3);

    let (_, json) = get_json(state.clone(), "/api/catalog?years=2022").await;
    assert_eq!(json["entries"][0]["title"], "A Survey of Retrieval for Science");
    assert_eq!(json["entries"].as_array().unwrap().len(), 1);

    let (status, _) = get_json(state, "/api/catalog?years=abc").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_navigate_round_trip() {
    let state = make_state(SurveyConfig::default());
    let (status, json) = post_json(state.clone(), "/api/navigate", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["view"]["message"].is_string());

    let (_, json) = post_json(
        state.clone(),
        "/api/navigate",
        json!({"action": {"action": "choose_subject", "subject": "NLP"}}),
    )
    .await;
    assert_eq!(json["state"]["paper"], "graph_agents_2024.json");
    assert_eq!(json["view"]["selected"], "graph_agents_2024.json");

    // A failed action keeps the previous selection.
    let previous = json["state"].clone();
    let (_, json) = post_json(
        state,
        "/api/navigate",
        json!({"state": previous, "action": {"action": "select", "id": "nope.json"}}),
    )
    .await;
    assert_eq!(json["state"], previous);
    assert!(json["error"].as_str().unwrap().contains("nope.json"));
}

#[tokio::test]
async fn test_survey_pass_through() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "  **Inputs to the Workflow**\nText.  "}}],
            "usage": {"prompt_tokens": 100, "completion_tokens": 20, "total_tokens": 120}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let state = make_state(SurveyConfig {
        base_url: format!("{}/v1", mock.uri()),
        ..Default::default()
    });
    let (status, json) = post_json(
        state,
        "/api/survey",
        json!({"ids": ["graph_agents_2024.json", "retrieval_survey_2022.json"], "api_key": "sk-test"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "**Inputs to the Workflow**\nText.");
    assert_eq!(json["usage"]["total_tokens"], 120);

    let requests = mock.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["max_tokens"], 12000);
    let user = sent["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("Here are 2 JSON files representing selected papers:"));
    assert!(user.contains("Graph-Guided Agents for Hypothesis Generation"));
}

#[tokio::test]
async fn test_survey_service_failure() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&mock)
        .await;

    let state = make_state(SurveyConfig {
        base_url: mock.uri(),
        api_key: "sk-test".into(),
        ..Default::default()
    });
    let (status, json) = post_json(
        state.clone(),
        "/api/survey",
        json!({"ids": ["graph_agents_2024.json"]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("quota exceeded"));

    let (status, _) = post_json(state.clone(), "/api/survey", json!({"ids": []})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post_json(state, "/api/survey", json!({"ids": ["missing.json"]})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_survey_without_api_key() {
    let state = make_state(SurveyConfig::default());
    let (status, json) = post_json(
        state,
        "/api/survey",
        json!({"ids": ["graph_agents_2024.json"]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("API key"));
}
