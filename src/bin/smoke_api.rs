//! End-to-end walk through the HTTP API against an in-memory database.
//!
//! The token client is built from the environment. Without `CONTRACT_ADDRESS`
//! every reward fails, which exercises the best-effort path.

use edupoints_service::{api, blockchain::EduPointsClient, config::Config, db, logging, state::AppState};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const WALLET: &str = "0xde709f2102306220921060314715629080e2fb77";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging("info", logging::LogFormat::Pretty);
    info!("Starting API smoke run...");

    let mut config = Config::from_env();
    config.server_port = 3333;
    let addr = config.server_addr();

    let db_pool = db::connection::establish_in_memory().await?;
    let token_client = Arc::new(EduPointsClient::new(&config)?);
    let app_state = Arc::new(AppState::new(config, db_pool, token_client));

    let shutdown = CancellationToken::new();
    let server_shutdown = shutdown.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let server = tokio::spawn(async move {
        let app = api::create_router(app_state);
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
        {
            error!("Server error: {}", e);
        }
    });
    sleep(Duration::from_millis(200)).await;

    let client = reqwest::Client::new();
    let base_url = format!("http://{}", addr);

    info!("===== Students =====");
    let response = client
        .post(format!("{}/api/students", base_url))
        .json(&json!({
            "name": "Ada Lovelace",
            "email": "ada@uni.edu",
            "student_code": "S-001",
            "department": "Mathematics",
            "wallet_address": WALLET,
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await?;
    let student_id = body["data"]["id"].as_i64().ok_or("student id missing")?;
    info!("✅ Registered student {}", student_id);

    let response = client
        .post(format!("{}/api/students", base_url))
        .json(&json!({"name": "Ada", "email": "ada@uni.edu", "student_code": "S-001"}))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    info!("✅ Duplicate registration rejected");

    info!("===== Catalog =====");
    let response = client
        .post(format!("{}/api/courses", base_url))
        .json(&json!({
            "title": "Intro to Rust",
            "sections": [
                {"title": "Basics", "materials": [{"title": "Ownership"}, {"title": "Borrowing"}]},
                {"title": "Async", "materials": [{"title": "Futures"}, {"title": "Tokio"}]},
            ]
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let course: Value = response.json().await?;
    let course_id = course["data"]["id"].as_i64().ok_or("course id missing")?;
    let material_ids: Vec<i64> = course["data"]["sections"]
        .as_array()
        .ok_or("sections missing")?
        .iter()
        .flat_map(|s| s["materials"].as_array().cloned().unwrap_or_default())
        .filter_map(|m| m["id"].as_i64())
        .collect();
    assert_eq!(material_ids.len(), 4);
    info!("✅ Created course {} with {} materials", course_id, material_ids.len());

    info!("===== Enrollment =====");
    let response = client
        .post(format!("{}/api/courses/{}/enroll", base_url, course_id))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    info!("✅ Missing X-Student-Id rejected");

    let response = client
        .post(format!("{}/api/courses/{}/enroll", base_url, course_id))
        .header("X-Student-Id", student_id.to_string())
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let receipt: Value = response.json().await?;
    assert_eq!(receipt["data"]["progress_rows"], 4);
    info!("✅ Enrolled, reward status: {}", receipt["data"]["reward"]["status"]);

    let response = client
        .post(format!("{}/api/courses/{}/enroll", base_url, course_id))
        .header("X-Student-Id", student_id.to_string())
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    info!("✅ Second enrollment rejected");

    info!("===== Progress =====");
    let mut milestones = Vec::new();
    for material_id in &material_ids {
        let response = client
            .put(format!("{}/api/materials/{}/complete", base_url, material_id))
            .header("X-Student-Id", student_id.to_string())
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let report: Value = response.json().await?;
        if let Some(m) = report["data"]["hitMilestone"].as_u64() {
            milestones.push(m);
        }
    }
    assert_eq!(milestones, vec![25, 50, 75, 100]);
    info!("✅ Milestones reported: {:?}", milestones);

    let response = client
        .put(format!("{}/api/materials/{}/complete", base_url, material_ids[0]))
        .header("X-Student-Id", student_id.to_string())
        .send()
        .await?;
    let report: Value = response.json().await?;
    assert!(report["data"]["hitMilestone"].is_null());
    info!("✅ Re-completion reports no milestone");

    info!("===== Ledger =====");
    let response = client
        .get(format!("{}/api/wallets/{}/transactions?limit=10", base_url, WALLET))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let total = response
        .headers()
        .get("X-Total-Count")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("0")
        .to_string();
    info!("✅ Ledger holds {} entries for {}", total, WALLET);

    let response = client
        .get(format!("{}/api/wallets/not-a-wallet/transactions", base_url))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    info!("✅ Invalid wallet rejected");

    shutdown.cancel();
    server.await?;
    info!("Smoke run finished");
    Ok(())
}
