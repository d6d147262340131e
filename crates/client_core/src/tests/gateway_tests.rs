use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::Sentiment,
    error::ErrorCode,
    protocol::{
        BatchEntry, BatchStatistics, SentimentResult, SentimentShares, SentimentTally,
        ResponseMetadata,
    },
};
use tokio::{net::TcpListener, sync::Mutex};

use super::*;
use crate::{
    connectivity::{ConnectivityMonitor, ServerStatus},
    session::{AnalysisSession, SessionPhase},
};

#[derive(Clone)]
struct GatewayState {
    analyze_requests: Arc<Mutex<Vec<AnalyzeRequest>>>,
    batch_requests: Arc<Mutex<Vec<AnalyzeBatchRequest>>>,
}

fn result_for(text: &str, index: Option<usize>) -> SentimentResult {
    SentimentResult {
        sentiment: Sentiment::Positive,
        confidence: 0.95,
        stars: 5,
        emoji: "😊".to_string(),
        sentiment_score: 0.9,
        raw_label: Some("5 stars".to_string()),
        text_original: text.to_string(),
        text_analyzed: None,
        text_truncated: false,
        text_length: Some(text.len()),
        processing_time: 0.12,
        index,
    }
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: Some(true),
        timestamp: Some("2026-08-22T10:00:00".to_string()),
    })
}

async fn handle_model_info() -> Json<ModelInfo> {
    Json(ModelInfo {
        model_name: "nlptown/bert-base-multilingual-uncased-sentiment".to_string(),
        task: Some("sentiment-analysis".to_string()),
        framework: Some("transformers".to_string()),
        device: Some("cpu".to_string()),
    })
}

async fn handle_analyze(
    State(state): State<GatewayState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, Json<ApiError>)> {
    state.analyze_requests.lock().await.push(request.clone());
    if request.text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::MissingText, "No text provided")),
        ));
    }
    Ok(Json(AnalyzeResponse {
        success: true,
        result: Some(result_for(&request.text, None)),
        error: None,
        metadata: Some(ResponseMetadata {
            preprocessed: Some(request.preprocess),
            total_texts: None,
            api_version: Some("1.0".to_string()),
        }),
    }))
}

async fn handle_analyze_batch(
    State(state): State<GatewayState>,
    Json(request): Json<AnalyzeBatchRequest>,
) -> Result<Json<AnalyzeBatchResponse>, (StatusCode, Json<ApiError>)> {
    state.batch_requests.lock().await.push(request.clone());
    if request.texts.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::MissingTexts, "No texts provided")),
        ));
    }
    let results: Vec<BatchEntry> = request
        .texts
        .iter()
        .enumerate()
        .map(|(index, text)| BatchEntry::Item(result_for(text, Some(index))))
        .collect();
    let total = results.len();
    Ok(Json(AnalyzeBatchResponse {
        success: true,
        results,
        statistics: Some(BatchStatistics {
            total,
            valid: total,
            errors: 0,
            sentiments: SentimentTally {
                positive: total as u64,
                negative: 0,
                neutral: 0,
            },
            average_confidence: 0.95,
            percentages: SentimentShares {
                positive: 100.0,
                negative: 0.0,
                neutral: 0.0,
            },
        }),
        error: None,
        metadata: Some(ResponseMetadata {
            preprocessed: Some(request.preprocess),
            total_texts: Some(total),
            api_version: Some("1.0".to_string()),
        }),
    }))
}

async fn handle_stats() -> Json<ServiceStats> {
    Json(ServiceStats {
        total_analyzed: 12,
        valid_results: 11,
        errors: 1,
        sentiments: SentimentTally {
            positive: 7,
            negative: 3,
            neutral: 1,
        },
        percentages: SentimentShares {
            positive: 63.6,
            negative: 27.3,
            neutral: 9.1,
        },
        average_confidence: 0.91,
        average_stars: 3.8,
        average_processing_time: 0.08,
        last_analysis: Some("2026-08-22T10:00:00".to_string()),
        message: None,
    })
}

async fn handle_malformed_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"unexpected": "shape"}))
}

async fn handle_plain_failure() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn spawn_misbehaving_gateway() -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/health", get(handle_malformed_health))
        .route("/api/analyze", post(handle_plain_failure));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn spawn_gateway() -> Result<(String, GatewayState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = GatewayState {
        analyze_requests: Arc::new(Mutex::new(Vec::new())),
        batch_requests: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/model-info", get(handle_model_info))
        .route("/api/analyze", post(handle_analyze))
        .route("/api/analyze-batch", post(handle_analyze_batch))
        .route("/api/stats", get(handle_stats))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

#[tokio::test]
async fn analyze_round_trip_decodes_result() {
    let (server_url, state) = spawn_gateway().await.expect("spawn gateway");
    let gateway = HttpGateway::new(&server_url).expect("gateway");

    let response = gateway
        .analyze("I love this product", true)
        .await
        .expect("analyze");

    assert!(response.success);
    let result = response.result.expect("result");
    assert_eq!(result.sentiment, Sentiment::Positive);
    assert_eq!(result.confidence, 0.95);
    assert_eq!(result.stars, 5);
    assert_eq!(result.text_original, "I love this product");

    let seen = state.analyze_requests.lock().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].text, "I love this product");
    assert!(seen[0].preprocess);
}

#[tokio::test]
async fn batch_round_trip_preserves_order() {
    let (server_url, state) = spawn_gateway().await.expect("spawn gateway");
    let gateway = HttpGateway::new(&server_url).expect("gateway");

    let texts = vec!["first text".to_string(), "second text".to_string()];
    let response = gateway.analyze_batch(&texts, false).await.expect("batch");

    assert!(response.success);
    assert_eq!(response.results.len(), 2);
    for (position, entry) in response.results.iter().enumerate() {
        let result = entry.result().expect("item");
        assert_eq!(result.index, Some(position));
        assert_eq!(result.text_original, texts[position]);
    }
    assert_eq!(response.statistics.expect("statistics").total, 2);

    let seen = state.batch_requests.lock().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].texts, texts);
    assert!(!seen[0].preprocess);
}

#[tokio::test]
async fn health_and_model_info_decode() {
    let (server_url, _state) = spawn_gateway().await.expect("spawn gateway");
    let gateway = HttpGateway::new(&server_url).expect("gateway");

    let health = gateway.check_health().await.expect("health");
    assert!(health.is_healthy());
    assert_eq!(health.model_loaded, Some(true));

    let info = gateway.model_info().await.expect("model info");
    assert_eq!(
        info.model_name,
        "nlptown/bert-base-multilingual-uncased-sentiment"
    );
    assert_eq!(info.device.as_deref(), Some("cpu"));
}

#[tokio::test]
async fn service_stats_decode() {
    let (server_url, _state) = spawn_gateway().await.expect("spawn gateway");
    let gateway = HttpGateway::new(&server_url).expect("gateway");

    let stats = gateway.service_stats().await.expect("stats");
    assert_eq!(stats.total_analyzed, 12);
    assert_eq!(stats.sentiments.positive, 7);
    assert_eq!(stats.last_analysis.as_deref(), Some("2026-08-22T10:00:00"));
}

#[tokio::test]
async fn rejection_body_surfaces_in_error() {
    let (server_url, _state) = spawn_gateway().await.expect("spawn gateway");
    let gateway = HttpGateway::new(&server_url).expect("gateway");

    let err = gateway.analyze("   ", true).await.expect_err("must fail");
    let rendered = format!("{err:#}");
    assert!(
        rendered.contains("gateway rejected the request (400 Bad Request)"),
        "unexpected error: {rendered}"
    );
    assert!(
        rendered.contains("No text provided"),
        "unexpected error: {rendered}"
    );
}

#[tokio::test]
async fn malformed_success_body_is_transport_error() {
    let server_url = spawn_misbehaving_gateway().await.expect("spawn gateway");
    let gateway = HttpGateway::new(&server_url).expect("gateway");

    gateway.check_health().await.expect_err("must fail");
}

#[tokio::test]
async fn undecodable_rejection_falls_back_to_bare_status() {
    let server_url = spawn_misbehaving_gateway().await.expect("spawn gateway");
    let gateway = HttpGateway::new(&server_url).expect("gateway");

    let err = gateway.analyze("hello", true).await.expect_err("must fail");
    let rendered = format!("{err:#}");
    assert!(
        rendered.contains("gateway returned 500"),
        "unexpected error: {rendered}"
    );
}

#[tokio::test]
async fn unreachable_gateway_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let gateway = HttpGateway::new(&format!("http://{addr}")).expect("gateway");
    gateway.check_health().await.expect_err("must fail");
    gateway.analyze("hello", true).await.expect_err("must fail");
}

#[test]
fn origin_validation_rejects_missing_scheme() {
    assert!(HttpGateway::new("localhost:5000").is_err());
    assert!(HttpGateway::new("not a url").is_err());

    let gateway = HttpGateway::new("http://localhost:5000/").expect("valid origin");
    assert_eq!(gateway.origin(), "http://localhost:5000");
}

#[tokio::test]
async fn end_to_end_probe_then_analyze_flow() {
    let (server_url, _state) = spawn_gateway().await.expect("spawn gateway");
    let gateway: Arc<dyn SentimentGateway> =
        Arc::new(HttpGateway::new(&server_url).expect("gateway"));

    let monitor = ConnectivityMonitor::new(gateway.clone());
    monitor.check().await;
    assert_eq!(monitor.status().await, ServerStatus::Online);
    assert!(monitor.model_info().await.is_some());

    let session = AnalysisSession::new(gateway);
    session.submit("I love this product").await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Success);
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(
        snapshot.result.expect("result").text_original,
        "I love this product"
    );
}
