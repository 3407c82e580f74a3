//! Dashboard API over a live listener

use std::net::SocketAddr;

use hubstats::config::ServerConfig;
use hubstats::server::DashboardServer;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::net::TcpListener;

use super::fixtures::scenario_snapshots;
use crate::common::session_with;

/// Serve the scenario snapshots on an ephemeral port
async fn spawn_server() -> SocketAddr {
    let session = session_with(scenario_snapshots());
    let config = ServerConfig {
        enable_request_logging: false,
        ..ServerConfig::default()
    };
    let server = DashboardServer::from_session(config, &session)
        .await
        .expect("build server");

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    addr
}

async fn get(addr: SocketAddr, path: &str) -> (StatusCode, Value) {
    let response = reqwest::get(format!("http://{addr}{path}"))
        .await
        .expect("request");
    let status = response.status();
    let body = response.json::<Value>().await.expect("json body");
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let addr = spawn_server().await;
    let (status, body) = get(addr, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["rows"]["models"], 5);
    assert_eq!(body["data"]["rows"]["spaces"], 4);
}

#[tokio::test]
async fn test_trends() {
    let addr = spawn_server().await;
    let (status, body) = get(addr, "/api/trends").await;

    assert_eq!(status, StatusCode::OK);
    let first = &body["data"][0];
    assert_eq!(first["month"], "2023-01");
    assert_eq!(first["modelCount"], 2);
    assert_eq!(first["datasetCount"], 1);
    assert_eq!(first["spaceCount"], 0);
}

#[tokio::test]
async fn test_license_and_sdk_distributions() {
    let addr = spawn_server().await;

    let (_, body) = get(addr, "/api/licenses/models").await;
    assert_eq!(
        body["data"],
        serde_json::json!([
            {"label": "mit", "count": 3},
            {"label": "apache-2.0", "count": 2}
        ])
    );

    let (_, body) = get(addr, "/api/licenses/datasets").await;
    assert_eq!(body["data"][0]["label"], "cc-by-4.0");

    let (_, body) = get(addr, "/api/sdks?top=1").await;
    assert_eq!(
        body["data"],
        serde_json::json!([
            {"label": "gradio", "count": 2},
            {"label": "Other", "count": 2}
        ])
    );
}

#[tokio::test]
async fn test_dashboard_bundle() {
    let addr = spawn_server().await;
    let (status, body) = get(addr, "/api/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    for key in ["trends", "modelLicenses", "datasetLicenses", "spaceSdks", "computedAt"] {
        assert!(body["data"].get(key).is_some(), "{key}");
    }
}

#[tokio::test]
async fn test_growth() {
    let addr = spawn_server().await;
    let (status, body) = get(addr, "/api/growth?base=X").await;

    assert_eq!(status, StatusCode::OK);
    let points = body["data"]["points"].as_array().unwrap();
    assert_eq!(points[0]["month"], "2023-04");
    assert_eq!(points[0]["cumulativeCount"], 0);
    assert_eq!(points.last().unwrap()["cumulativeCount"], 2);
    assert_eq!(body["data"]["base"], "X");
}

#[tokio::test]
async fn test_growth_unknown_base_is_empty() {
    let addr = spawn_server().await;
    let (status, body) = get(addr, "/api/growth?base=org/unknown").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["points"], serde_json::json!([]));
}

#[tokio::test]
async fn test_growth_rejects_bad_input() {
    let addr = spawn_server().await;

    let (status, body) = get(addr, "/api/growth?base=x%27%3B%20DROP%20TABLE%20models").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("base"));

    let (status, _) = get(addr, "/api/growth").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
