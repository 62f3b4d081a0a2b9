//! Router tests
//!
//! Requests go through the full router (layers included) with
//! `tower::ServiceExt::oneshot`; models are built in memory.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use etherparse::PacketBuilder;
use pcap_file::pcap::{PcapPacket, PcapWriter};
use serde_json::{json, Value};
use tower::ServiceExt;

use pulse_core::analysis::{FlowPredictor, PacketAnalyzer};
use pulse_core::features::{FlowSchema, FEATURE_COUNT};
use pulse_core::model::{Aggregation, LoadedModel, Node, SplitRule, Tree, TreeEnsemble};

use crate::config::Config;
use crate::storage::UploadStore;
use crate::{create_router, AppState};

const BOUNDARY: &str = "pulse-test-boundary";

// ============================================================================
// FIXTURES
// ============================================================================

fn config(dir: &Path) -> Config {
    Config {
        port: 0,
        upload_dir: dir.join("uploads"),
        max_upload_bytes: 1024 * 1024,
        packet_model_path: dir.join("packet_model.json"),
        flow_model_path: dir.join("xgboost.json"),
        flow_features_path: dir.join("selected_features.csv"),
        default_max_details: 100,
        environment: "test".to_string(),
    }
}

/// dst port 80 → DDoS, everything else → Normal
fn packet_model() -> TreeEnsemble {
    let stump = Tree {
        class_index: 1,
        nodes: vec![
            Node::Split { feature: 4, threshold: 80.0, left: 1, right: 2, missing_left: true },
            Node::Leaf { value: vec![0.0] },
            Node::Split { feature: 4, threshold: 81.0, left: 3, right: 4, missing_left: true },
            Node::Leaf { value: vec![8.0] },
            Node::Leaf { value: vec![0.0] },
        ],
    };
    TreeEnsemble {
        name: None,
        aggregation: Aggregation::Softmax,
        num_features: FEATURE_COUNT,
        num_classes: 5,
        base_score: vec![3.0, 0.0, 0.0, 0.0, 0.0],
        split_rule: SplitRule::LessThan,
        class_labels: vec![],
        feature_names: vec![],
        trees: vec![stump],
    }
}

/// Destination Port < 1000 → BENIGN, otherwise DDoS (class 3)
fn flow_model() -> TreeEnsemble {
    let mut low = vec![0.0; 4];
    low[0] = 1.0;
    let mut high = vec![0.0; 4];
    high[3] = 1.0;
    TreeEnsemble {
        name: Some("xgboost.json".to_string()),
        aggregation: Aggregation::Average,
        num_features: 2,
        num_classes: 4,
        base_score: vec![],
        split_rule: SplitRule::LessThan,
        class_labels: vec![],
        feature_names: vec![],
        trees: vec![Tree {
            class_index: 0,
            nodes: vec![
                Node::Split { feature: 0, threshold: 1000.0, left: 1, right: 2, missing_left: true },
                Node::Leaf { value: low },
                Node::Leaf { value: high },
            ],
        }],
    }
}

fn state(dir: &Path, with_packets: bool, with_flows: bool) -> AppState {
    let config = config(dir);

    let packets = with_packets.then(|| {
        let model = LoadedModel::from_ensemble(packet_model()).unwrap();
        Arc::new(PacketAnalyzer::from_model(Arc::new(model)).unwrap())
    });
    let flows = with_flows.then(|| {
        let model = LoadedModel::from_ensemble(flow_model()).unwrap();
        let schema = FlowSchema::new(vec!["Destination Port".to_string(), "Flow Duration".to_string()]);
        Arc::new(FlowPredictor::new(Arc::new(model), schema).unwrap())
    });

    AppState {
        uploads: Arc::new(UploadStore::new(&config.upload_dir).unwrap()),
        config: Arc::new(config),
        packets,
        flows,
    }
}

fn tcp_frame(dst_port: u16) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([2, 0, 0, 0, 0, 1], [2, 0, 0, 0, 0, 2])
        .ipv4([10, 1, 1, 1], [10, 1, 1, 2], 64)
        .tcp(40000, dst_port, 1, 1024);
    let mut frame = Vec::with_capacity(builder.size(0));
    builder.write(&mut frame, &[]).unwrap();
    frame
}

/// Three packets: DDoS, Normal, DDoS
fn sample_pcap() -> Vec<u8> {
    let mut writer = PcapWriter::new(Vec::new()).unwrap();
    for (i, port) in [80u16, 443, 80].iter().enumerate() {
        let frame = tcp_frame(*port);
        let packet = PcapPacket::new(Duration::from_millis(i as u64), frame.len() as u32, &frame);
        writer.write_packet(&packet).unwrap();
    }
    writer.into_writer()
}

fn multipart(uri: &str, field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn json_post(uri: &str, value: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(value.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// ============================================================================
// INFO & HEALTH
// ============================================================================

#[tokio::test]
async fn test_index() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(create_router(state(dir.path(), true, true)), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Pulse Sniffer API");
    assert!(body["endpoints"]["POST /analyze"].is_string());
}

#[tokio::test]
async fn test_health_reports_models() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(create_router(state(dir.path(), true, false)), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["flow_model_loaded"], false);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_missing_models_do_not_stop_the_server() {
    let dir = tempfile::tempdir().unwrap();
    // nothing exists at the configured model paths
    let state = AppState::load(config(dir.path())).unwrap();
    assert!(state.packets.is_none());
    assert!(state.flows.is_none());

    let (_, body) = send(create_router(state.clone()), get("/health")).await;
    assert_eq!(body["model_loaded"], false);

    let (status, body) = send(
        create_router(state),
        json_post("/analyze", json!({ "filename": "x.pcap" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], 503);
}

// ============================================================================
// UPLOAD
// ============================================================================

#[tokio::test]
async fn test_upload_stores_file() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), true, false);
    let upload_dir = state.config.upload_dir.clone();

    let (status, body) = send(
        create_router(state),
        multipart("/upload", "file", "office capture.pcap", &sample_pcap()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "File uploaded successfully");
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.ends_with("_office_capture.pcap"));
    assert!(upload_dir.join(filename).exists());
}

#[tokio::test]
async fn test_upload_rejections() {
    let dir = tempfile::tempdir().unwrap();
    let cases = [
        ("other", "a.pcap", "No file provided"),
        ("file", "", "No file selected"),
        ("file", "notes.txt", "Invalid file type. Allowed: pcap, pcapng, cap"),
    ];

    for (field, filename, message) in cases {
        let app = create_router(state(dir.path(), true, false));
        let (status, body) = send(app, multipart("/upload", field, filename, b"data")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", message);
        assert_eq!(body["error"], message);
        assert_eq!(body["status"], 400);
    }
}

#[tokio::test]
async fn test_upload_without_multipart_body() {
    let dir = tempfile::tempdir().unwrap();

    let app = create_router(state(dir.path(), true, false));
    let (status, body) = send(app, json_post("/upload", json!({ "file": "a.pcap" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No file provided", "status": 400 }));

    let app = create_router(state(dir.path(), true, false));
    let (status, body) = send(app, json_post("/analyze-quick", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No file provided", "status": 400 }));
}

#[tokio::test]
async fn test_upload_over_limit() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = state(dir.path(), true, false);
    let mut config = (*state.config).clone();
    config.max_upload_bytes = 2 * 1024 * 1024;
    state.config = Arc::new(config);

    let big = vec![0u8; 3 * 1024 * 1024];
    let (status, body) = send(create_router(state), multipart("/upload", "file", "big.pcap", &big)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "File too large. Maximum size is 2MB");
}

// ============================================================================
// ANALYZE
// ============================================================================

#[tokio::test]
async fn test_analyze_stored_file() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), true, false);
    let stored = state.uploads.save("sample.pcap", &sample_pcap()).await.unwrap();

    let (status, body) = send(
        create_router(state),
        json_post("/analyze", json!({ "filename": stored.filename, "max_details": 0 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["filename"], stored.filename.as_str());
    assert_eq!(body["total_packets"], 3);
    assert_eq!(body["summary"]["counts"]["DDoS"], 2);
    assert_eq!(body["summary"]["counts"]["Normal"], 1);
    assert_eq!(body["summary"]["percentages"]["Normal"], 33.33);
    assert_eq!(body["threats_detected"], 2);
    // max_details 0 keeps only threats
    assert_eq!(body["packet_details"].as_array().unwrap().len(), 2);
    assert_eq!(body["threat_packets"][1]["packet_number"], 3);
}

#[tokio::test]
async fn test_analyze_negative_max_details_lists_threats_only() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), true, false);
    let stored = state.uploads.save("sample.pcap", &sample_pcap()).await.unwrap();

    let (status, body) = send(
        create_router(state),
        json_post("/analyze", json!({ "filename": stored.filename, "max_details": -1 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], stored.filename.as_str());
    assert_eq!(body["packet_details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_analyze_malformed_body() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), true, false);
    let stored = state.uploads.save("sample.pcap", &sample_pcap()).await.unwrap();

    let app = create_router(state.clone());
    let (status, body) = send(
        app,
        json_post("/analyze", json!({ "filename": stored.filename, "max_details": "5" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Invalid request body: "), "{}", message);

    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(create_router(state), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No filename provided");
}

#[tokio::test]
async fn test_analyze_json_errors() {
    let dir = tempfile::tempdir().unwrap();

    let app = create_router(state(dir.path(), true, false));
    let (status, body) = send(app, json_post("/analyze", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No filename provided");

    let app = create_router(state(dir.path(), true, false));
    let (status, body) = send(app, json_post("/analyze", json!({ "filename": "missing.pcap" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "File not found");

    let app = create_router(state(dir.path(), true, false));
    let (status, _) = send(app, json_post("/analyze", json!({ "filename": "../../etc/passwd" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_analyze_unreadable_capture() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), true, false);
    let stored = state.uploads.save("broken.pcap", b"definitely not a capture").await.unwrap();

    let (status, body) = send(
        create_router(state),
        json_post("/analyze", json!({ "filename": stored.filename })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("Analysis failed: "));
}

#[tokio::test]
async fn test_analyze_multipart_upload() {
    let dir = tempfile::tempdir().unwrap();

    let app = create_router(state(dir.path(), true, false));
    let (status, body) = send(app, multipart("/analyze", "file", "live.pcap", &sample_pcap())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["filename"].as_str().unwrap().ends_with("_live.pcap"));
    assert_eq!(body["packet_details"].as_array().unwrap().len(), 3);

    let app = create_router(state(dir.path(), true, false));
    let (status, body) = send(app, multipart("/analyze", "file", "live.exe", b"MZ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid file");
}

#[tokio::test]
async fn test_analyze_quick() {
    let dir = tempfile::tempdir().unwrap();

    let app = create_router(state(dir.path(), true, false));
    let (status, body) = send(app, multipart("/analyze-quick", "file", "q.pcap", &sample_pcap())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"]["DDoS"], 2);
    assert_eq!(body["packets_analyzed"], 3);
    assert_eq!(body["top_threats"][0]["type"], "DDoS");
    assert_eq!(body["top_threats"][0]["packet"], 1);

    let app = create_router(state(dir.path(), true, false));
    let (status, body) = send(app, multipart("/analyze-quick", "file", "q.pcap", b"garbage")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Failed to read PCAP: "));

    let app = create_router(state(dir.path(), true, false));
    let (status, body) = send(app, multipart("/analyze-quick", "upload", "q.pcap", b"")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file provided");
}

// ============================================================================
// STATS
// ============================================================================

#[tokio::test]
async fn test_stats() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), true, false);
    for i in 0..12 {
        std::fs::write(state.uploads.dir().join(format!("{:02}_c.pcap", i)), b"x").unwrap();
    }
    std::fs::write(state.uploads.dir().join("readme.md"), b"x").unwrap();

    let (status, body) = send(create_router(state), get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_files_uploaded"], 12);

    let recent = body["recent_files"].as_array().unwrap();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0], "02_c.pcap");
    assert_eq!(recent[9], "11_c.pcap");

    assert_eq!(body["model_info"]["loaded"], true);
    assert_eq!(body["model_info"]["attack_types"]["0"], "Normal");
    assert_eq!(body["model_info"]["attack_types"]["4"], "Malware");
}

// ============================================================================
// FLOW SERVICE
// ============================================================================

#[tokio::test]
async fn test_flow_service() {
    let dir = tempfile::tempdir().unwrap();

    let (status, body) = send(create_router(state(dir.path(), false, true)), get("/api/v1/flows/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "model": "xgboost.json" }));

    let (_, body) = send(create_router(state(dir.path(), false, true)), get("/api/v1/flows/metadata")).await;
    assert_eq!(body["num_features"], 2);
    assert_eq!(body["features"][0], "Destination Port");
    assert_eq!(body["class_labels"][0], "BENIGN");
    assert_eq!(body["predict_proba"], true);

    let records = json!({ "records": [
        { "Destination Port": 443.0, "Flow Duration": 12.0 },
        { "Destination Port": 8080.0 }
    ]});
    let (status, body) = send(
        create_router(state(dir.path(), false, true)),
        json_post("/api/v1/flows/predict", records),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "xgboost.json");
    assert_eq!(body["predictions"], json!(["BENIGN", "DDoS"]));
    assert_eq!(body["class_probabilities"][1]["DDoS"], 1.0);
    assert_eq!(body["class_probabilities"][0].as_object().unwrap().len(), 4);
}

#[tokio::test]
async fn test_flow_service_errors() {
    let dir = tempfile::tempdir().unwrap();

    let (status, body) = send(
        create_router(state(dir.path(), false, true)),
        json_post("/api/v1/flows/predict", json!({ "records": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "records must not be empty");

    let (status, body) = send(create_router(state(dir.path(), false, false)), get("/api/v1/flows")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = send(create_router(state(dir.path(), false, false)), get("/api/v1/flows/metadata")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_flow_predict_body_rejections() {
    let dir = tempfile::tempdir().unwrap();

    let bad = json!({ "records": [{ "Destination Port": "abc" }] });
    let (status, body) = send(
        create_router(state(dir.path(), false, true)),
        json_post("/api/v1/flows/predict", bad.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["error"].is_string());

    // model availability is checked before the body
    let (status, body) = send(
        create_router(state(dir.path(), false, false)),
        json_post("/api/v1/flows/predict", bad),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Flow model not loaded");

    // test config allows 1MB
    let oversized = json!({
        "records": [{ "Destination Port": 80.0 }],
        "padding": "x".repeat(2 * 1024 * 1024),
    });
    let (status, body) = send(
        create_router(state(dir.path(), false, true)),
        json_post("/api/v1/flows/predict", oversized),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "File too large. Maximum size is 1MB");
}
