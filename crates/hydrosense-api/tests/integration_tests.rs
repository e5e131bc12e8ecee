//! Integration tests for the HydroSense API.
//!
//! Each test builds its own router over in-memory state with a fixed linear
//! model and a mock completion service.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use hydrosense_advisor::{AdvisoryResponder, MockCompletion, ProviderError};
use hydrosense_api::create_router;
use hydrosense_api::handlers::{HealthResponse, ParametersResponse, SessionCreated};
use hydrosense_api::state::AppState;
use hydrosense_core::config::{HydroConfig, ScalerMode};
use hydrosense_core::FEATURE_COUNT;
use hydrosense_predict::{LinearClassifier, ModelState, PotabilityPredictor, StandardScaler};
use hydrosense_session::SessionOrchestrator;

// =============================================================================
// Helpers
// =============================================================================

const REFERENCE_SAMPLE: &str = r#"{
    "pH": 7.0, "Hardness": 100.0, "Solids": 500.0, "Chloramines": 4.0,
    "Sulfate": 250.0, "Conductivity": 400.0, "Organic_carbon": 10.0,
    "Trihalomethanes": 50.0, "Turbidity": 3.0
}"#;

fn loaded_predictor() -> PotabilityPredictor {
    // Positive pH weight on a persisted scaler centred at pH 7.
    let mut weights = vec![0.0; FEATURE_COUNT];
    weights[0] = 1.0;
    let classifier = Arc::new(LinearClassifier {
        weights,
        intercept: 0.0,
    });
    let mut mean = vec![0.0; FEATURE_COUNT];
    mean[0] = 7.0;
    let scaler = StandardScaler::new(mean, vec![1.0; FEATURE_COUNT]).unwrap();
    PotabilityPredictor::new(
        Arc::new(ModelState::loaded(classifier, Some(scaler))),
        ScalerMode::Persisted,
    )
}

fn make_state(predictor: PotabilityPredictor, completion: MockCompletion) -> AppState {
    let config = HydroConfig::default();
    let orchestrator = SessionOrchestrator::new(
        predictor,
        AdvisoryResponder::new(Arc::new(completion)),
        config.chat.clone(),
    );
    AppState::new(config, orchestrator)
}

fn make_app() -> axum::Router {
    create_router(make_state(
        loaded_predictor(),
        MockCompletion::with_text("Consider drip irrigation."),
    ))
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn put_json(uri: &str, json: &str) -> Request<Body> {
    Request::put(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_session(app: &axum::Router, uri: &str) -> Uuid {
    let resp = app.clone().oneshot(post_empty(uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: SessionCreated = serde_json::from_value(body_json(resp).await).unwrap();
    created.id
}

// =============================================================================
// Health and parameters
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = make_app();
    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let health: HealthResponse = serde_json::from_value(body_json(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert!(health.model_loaded);
    assert_eq!(health.scaler_mode, ScalerMode::Persisted);
    assert_eq!(health.llm_model, "mock");
    assert_eq!(health.active_sessions, 0);
}

#[tokio::test]
async fn test_parameters_english() {
    let app = make_app();
    let resp = app.oneshot(get("/parameters")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let params: ParametersResponse = serde_json::from_value(body_json(resp).await).unwrap();
    assert_eq!(params.parameters.len(), 9);
    let ph = &params.parameters[0];
    assert_eq!(ph.key, "pH");
    assert_eq!((ph.min, ph.max, ph.default), (0.0, 14.0, 7.0));
    assert_eq!(ph.optimal.as_deref(), Some("6.5 - 8.5"));
    let solids = &params.parameters[2];
    assert_eq!(solids.label, "Total Dissolved Solids (ppm)");
}

#[tokio::test]
async fn test_parameters_japanese() {
    let app = make_app();
    let resp = app.oneshot(get("/parameters?lang=ja")).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["language"], "Japanese");
    assert_eq!(json["optimal_ranges_title"], "📊 最適範囲");
}

#[tokio::test]
async fn test_parameters_unknown_language() {
    let app = make_app();
    let resp = app.oneshot(get("/parameters?lang=fr")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "bad_request");
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn test_session_lifecycle() {
    let app = make_app();
    let id = create_session(&app, "/sessions").await;

    let resp = app.clone().oneshot(get(&format!("/sessions/{}", id))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["id"], id.to_string());
    assert!(json["sample"].is_null());

    let resp = app.clone().oneshot(get("/sessions")).await.unwrap();
    let listing = body_json(resp).await;
    assert_eq!(listing["sessions"].as_array().unwrap().len(), 1);
    assert_eq!(listing["busy"], 0);

    let resp = app.clone().oneshot(delete(&format!("/sessions/{}", id))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.oneshot(get(&format!("/sessions/{}", id))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = make_app();
    let uri = format!("/sessions/{}/analyze", Uuid::new_v4());
    let resp = app.oneshot(post_json(&uri, REFERENCE_SAMPLE)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "not_found");
}

#[tokio::test]
async fn test_malformed_session_id_is_json_400() {
    let app = make_app();
    let requests = vec![
        get("/sessions/not-a-uuid"),
        delete("/sessions/not-a-uuid"),
        post_json("/sessions/not-a-uuid/analyze", REFERENCE_SAMPLE),
        post_json("/sessions/12345/chat", r#"{"message": "hi"}"#),
        put_json("/sessions/not-a-uuid/language", r#"{"language": "ja"}"#),
    ];
    for req in requests {
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "bad_request");
        assert!(json["message"].as_str().unwrap().contains("id"));
    }
}

// =============================================================================
// Analyze
// =============================================================================

#[tokio::test]
async fn test_analyze_reference_sample() {
    let app = make_app();
    let id = create_session(&app, "/sessions").await;

    let uri = format!("/sessions/{}/analyze", id);
    let resp = app.clone().oneshot(post_json(&uri, REFERENCE_SAMPLE)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["result"]["status"], "predicted");
    let label = json["label"].as_u64().unwrap();
    assert!(label == 0 || label == 1);
    assert!(json["out_of_optimal"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_analyze_flags_parameters_outside_guidance() {
    let app = make_app();
    let id = create_session(&app, "/sessions").await;
    let uri = format!("/sessions/{}/analyze", id);

    let hard = REFERENCE_SAMPLE.replace("\"Hardness\": 100.0", "\"Hardness\": 350.0");
    let resp = app.oneshot(post_json(&uri, &hard)).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["out_of_optimal"], serde_json::json!(["Hardness"]));
}

#[tokio::test]
async fn test_analyze_result_depends_on_input() {
    let app = make_app();
    let id = create_session(&app, "/sessions").await;
    let uri = format!("/sessions/{}/analyze", id);

    let acidic = REFERENCE_SAMPLE.replace("\"pH\": 7.0", "\"pH\": 5.0");
    let resp = app.clone().oneshot(post_json(&uri, &acidic)).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["label"], 0);
    assert_eq!(json["title"], "Water Needs Treatment");

    let alkaline = REFERENCE_SAMPLE.replace("\"pH\": 7.0", "\"pH\": 8.0");
    let resp = app.oneshot(post_json(&uri, &alkaline)).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["label"], 1);
    assert_eq!(json["title"], "Water is Suitable for Irrigation");
}

#[tokio::test]
async fn test_analyze_out_of_range_is_422() {
    let app = make_app();
    let id = create_session(&app, "/sessions").await;
    let uri = format!("/sessions/{}/analyze", id);

    let bad = REFERENCE_SAMPLE.replace("\"pH\": 7.0", "\"pH\": 15.0");
    let resp = app.oneshot(post_json(&uri, &bad)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "unprocessable_entity");
    assert!(json["message"].as_str().unwrap().contains("pH"));
}

#[tokio::test]
async fn test_analyze_missing_field_is_422() {
    let app = make_app();
    let id = create_session(&app, "/sessions").await;
    let uri = format!("/sessions/{}/analyze", id);

    let resp = app.oneshot(post_json(&uri, r#"{"pH": 7.0}"#)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_analyze_without_model_reports_unavailable() {
    let state = make_state(
        PotabilityPredictor::new(
            Arc::new(ModelState::unavailable("model artifact not found")),
            ScalerMode::RefitPerSample,
        ),
        MockCompletion::new(),
    );
    let app = create_router(state);
    let id = create_session(&app, "/sessions").await;

    let uri = format!("/sessions/{}/analyze", id);
    let resp = app.oneshot(post_json(&uri, REFERENCE_SAMPLE)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["result"]["status"], "unavailable");
    assert!(json["label"].is_null());
    assert_eq!(json["title"], "Prediction model is not loaded");
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_before_analyze_is_409_localized() {
    let app = make_app();
    let id = create_session(&app, "/sessions?lang=ja").await;

    let uri = format!("/sessions/{}/chat", id);
    let resp = app
        .clone()
        .oneshot(post_json(&uri, r#"{"message": "hello"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let json = body_json(resp).await;
    assert_eq!(
        json["message"],
        "相談を開始する前に、まず水質パラメータを分析してください。"
    );

    let resp = app.oneshot(get(&format!("/sessions/{}", id))).await.unwrap();
    assert!(body_json(resp).await["transcript"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_exchange_appends_two_turns() {
    let app = make_app();
    let id = create_session(&app, "/sessions").await;
    app.clone()
        .oneshot(post_json(&format!("/sessions/{}/analyze", id), REFERENCE_SAMPLE))
        .await
        .unwrap();

    let uri = format!("/sessions/{}/chat", id);
    for expected in [2, 4] {
        let resp = app
            .clone()
            .oneshot(post_json(&uri, r#"{"message": "What crops suit this water?"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["reply"]["role"], "assistant");
        assert_eq!(json["reply"]["content"], "Consider drip irrigation.");
        assert_eq!(json["turn_count"], expected);
    }

    let resp = app.oneshot(get(&format!("/sessions/{}", id))).await.unwrap();
    let json = body_json(resp).await;
    let transcript = json["transcript"].as_array().unwrap();
    assert_eq!(transcript[0]["role"], "user");
    assert_eq!(transcript[1]["role"], "assistant");
}

#[tokio::test]
async fn test_chat_provider_failure_still_200() {
    let app = create_router(make_state(
        loaded_predictor(),
        MockCompletion::failing(ProviderError::MissingApiKey("GROQ_API_KEY".into())),
    ));
    let id = create_session(&app, "/sessions").await;
    app.clone()
        .oneshot(post_json(&format!("/sessions/{}/analyze", id), REFERENCE_SAMPLE))
        .await
        .unwrap();

    let resp = app
        .oneshot(post_json(&format!("/sessions/{}/chat", id), r#"{"message": "hi"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert!(json["reply"]["content"]
        .as_str()
        .unwrap()
        .starts_with("Error: "));
}

#[tokio::test]
async fn test_chat_empty_message_is_400() {
    let app = make_app();
    let id = create_session(&app, "/sessions").await;
    app.clone()
        .oneshot(post_json(&format!("/sessions/{}/analyze", id), REFERENCE_SAMPLE))
        .await
        .unwrap();

    let resp = app
        .oneshot(post_json(&format!("/sessions/{}/chat", id), r#"{"message": "  "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Clear, reset, language
// =============================================================================

#[tokio::test]
async fn test_clear_chat_and_reset_params() {
    let app = make_app();
    let id = create_session(&app, "/sessions").await;
    app.clone()
        .oneshot(post_json(&format!("/sessions/{}/analyze", id), REFERENCE_SAMPLE))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(&format!("/sessions/{}/chat", id), r#"{"message": "hi"}"#))
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(delete(&format!("/sessions/{}/sample", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let json = body_json(app.clone().oneshot(get(&format!("/sessions/{}", id))).await.unwrap()).await;
    assert!(json["sample"].is_null());
    assert_eq!(json["transcript"].as_array().unwrap().len(), 2);

    let resp = app
        .clone()
        .oneshot(delete(&format!("/sessions/{}/chat", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let json = body_json(app.oneshot(get(&format!("/sessions/{}", id))).await.unwrap()).await;
    assert!(json["transcript"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_set_language() {
    let app = make_app();
    let id = create_session(&app, "/sessions").await;

    let uri = format!("/sessions/{}/language", id);
    let resp = app
        .clone()
        .oneshot(put_json(&uri, r#"{"language": "ja"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let json = body_json(app.clone().oneshot(get(&format!("/sessions/{}", id))).await.unwrap()).await;
    assert_eq!(json["language"], "Japanese");

    let resp = app
        .oneshot(put_json(&uri, r#"{"language": "klingon"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
