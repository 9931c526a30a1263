//! Full-stack tests: bootstrap from canned configuration, then drive
//! the facade the way a client would.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::path::Path;
use tower::ServiceExt;
use weft_runtime::bootstrap;
use weft_sdk::sim::SimNetwork;
use weft_topology::testing::{sample_app, sample_network};

fn seeded_network() -> SimNetwork {
    let sdk = SimNetwork::new();
    for (org_name, org) in &sample_network().organizations {
        for (user, cfg) in &org.users {
            sdk.register_secret(org_name, user, &cfg.secret);
        }
    }
    sdk
}

async fn booted(sdk: &SimNetwork, store_dir: &Path) -> weft_runtime::Runtime {
    let mut app = sample_app();
    app.store_path_prefix = format!("{}/store-", store_dir.display());
    bootstrap(&sample_network(), app, Path::new("."), sdk)
        .await
        .expect("bootstrap")
}

fn post(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_provisions_everything() {
    let dir = tempfile::tempdir().unwrap();
    let sdk = seeded_network();
    let _runtime = booted(&sdk, dir.path()).await;

    assert!(sdk.channel_exists("mychannel"));
    assert!(sdk.peer_joined("mychannel", "org0/peer0"));
    assert!(sdk.peer_joined("mychannel", "org0/peer1"));
    assert!(sdk.peer_joined("mychannel", "org1/peer0"));
    // Instantiation seeded the initial accounts.
    assert_eq!(sdk.balance("mychannel", "alice"), Some(123));
    assert_eq!(sdk.balance("mychannel", "bob"), Some(456));
    // Each bootstrap user hit the CA exactly once.
    assert_eq!(sdk.enroll_count("admin"), 1);
    assert_eq!(sdk.enroll_count("Admin"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_waits_out_channel_visibility() {
    let dir = tempfile::tempdir().unwrap();
    let sdk = seeded_network();
    sdk.set_channel_visibility_delay(3);
    let _runtime = booted(&sdk, dir.path()).await;
    assert!(sdk.peer_joined("mychannel", "org1/peer0"));
}

#[tokio::test(start_paused = true)]
async fn test_facade_transfer_and_queries() {
    let dir = tempfile::tempdir().unwrap();
    let sdk = seeded_network();
    let runtime = booted(&sdk, dir.path()).await;

    let response = runtime
        .router()
        .oneshot(post(
            "/transfer?invoking_user_name=Admin&from_account_name=alice&to_account_name=bob&amount=20",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(sdk.balance("mychannel", "alice"), Some(103));
    assert_eq!(sdk.balance("mychannel", "bob"), Some(476));

    let response = runtime
        .router()
        .oneshot(get(
            "/query_balance?invoking_user_name=Admin&account_name=alice",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "103");
}

#[tokio::test(start_paused = true)]
async fn test_facade_creates_account_with_identity() {
    let dir = tempfile::tempdir().unwrap();
    let sdk = seeded_network();
    let runtime = booted(&sdk, dir.path()).await;

    let response = runtime
        .router()
        .oneshot(post(
            "/create_account?invoking_user_name=Admin&account_name=carol&initial_balance=500",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(sdk.balance("mychannel", "carol"), Some(500));
    assert_eq!(sdk.enroll_count("carol"), 1);

    let response = runtime
        .router()
        .oneshot(get("/query_account_names?invoking_user_name=Admin"))
        .await
        .unwrap();
    let names: Vec<String> = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(names, vec!["alice", "bob", "carol"]);
}

#[tokio::test(start_paused = true)]
async fn test_lost_commit_event_reports_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let sdk = seeded_network();
    let runtime = booted(&sdk, dir.path()).await;

    sdk.suppress_commit_events(true);
    let response = runtime
        .router()
        .oneshot(post(
            "/transfer?invoking_user_name=Admin&from_account_name=alice&to_account_name=bob&amount=20",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(json["message"].as_str().unwrap().contains("not committed"));
    // Every opened commit stream was released despite the failure.
    assert_eq!(sdk.streams_opened(), sdk.streams_closed());
}

#[tokio::test(start_paused = true)]
async fn test_restart_reuses_stored_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let sdk = seeded_network();
    let runtime = booted(&sdk, dir.path()).await;
    drop(runtime);

    // A process restart re-runs enrollment against the same store; the
    // CA must not see a second enroll for any bootstrap user.
    let app = {
        let mut app = sample_app();
        app.store_path_prefix = format!("{}/store-", dir.path().display());
        app
    };
    let topology =
        weft_topology::Topology::build(&sample_network(), &app, Path::new("."), &sdk).unwrap();
    let org0 = topology.organization("org0").unwrap().clone();
    let manager =
        weft_provisioner::EnrollmentManager::create_store(org0, &app.store_path_prefix).unwrap();
    manager
        .enroll_all(&sample_network().organizations["org0"].users)
        .await
        .unwrap();
    assert_eq!(sdk.enroll_count("admin"), 1);
}
