//! The four account endpoints.
//!
//! Every endpoint names its caller through the `invoking_user_name`
//! query parameter; the gateway resolves that enrollment id against the
//! facade organization's credential store. Write endpoints go through
//! the full submit pipeline and only answer once the transaction
//! commits; queries answer with the raw chaincode payload.
//!
//! Parameter sets are exact: a missing or unexpected query key is a 400
//! before any ledger work happens.

use crate::error::ApiError;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use weft_gateway::{TransactionGateway, TransactionRequest, TransactionResult};
use weft_provisioner::EnrollmentManager;
use weft_sdk::types::RegistrationRequest;
use weft_topology::config::RegistrarConfig;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<TransactionGateway>,
    pub enrollment: Arc<EnrollmentManager>,
    pub registrar: RegistrarConfig,
}

/// Assemble the facade router. When `client_dir` is given, its contents
/// are served for any path the API does not claim.
pub fn router(state: AppState, client_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route("/create_account", post(create_account))
        .route("/transfer", post(transfer))
        .route("/query_balance", get(query_balance))
        .route("/query_account_names", get(query_account_names))
        .with_state(state);
    if let Some(dir) = client_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }
    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateAccountParams {
    invoking_user_name: String,
    account_name: String,
    initial_balance: i64,
}

async fn create_account(
    State(state): State<AppState>,
    Query(params): Query<CreateAccountParams>,
) -> Result<Json<TransactionResult>, ApiError> {
    let request = RegistrationRequest {
        enrollment_id: params.account_name.clone(),
        secret: None,
        role: "user".to_string(),
        affiliation: state.registrar.affiliation.clone(),
    };
    state
        .enrollment
        .register_and_enroll(&request, &state.registrar.user)
        .await?;

    let result = state
        .gateway
        .submit(
            &params.invoking_user_name,
            &TransactionRequest {
                fcn: "create_account".to_string(),
                args: vec![
                    params.account_name.clone(),
                    params.initial_balance.to_string(),
                ],
            },
        )
        .await?;
    info!(account = %params.account_name, tx_id = %result.tx_id, "account created");
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransferParams {
    invoking_user_name: String,
    from_account_name: String,
    to_account_name: String,
    amount: i64,
}

async fn transfer(
    State(state): State<AppState>,
    Query(params): Query<TransferParams>,
) -> Result<Json<TransactionResult>, ApiError> {
    let result = state
        .gateway
        .submit(
            &params.invoking_user_name,
            &TransactionRequest {
                fcn: "transfer".to_string(),
                args: vec![
                    params.from_account_name,
                    params.to_account_name,
                    params.amount.to_string(),
                ],
            },
        )
        .await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BalanceParams {
    invoking_user_name: String,
    account_name: String,
}

async fn query_balance(
    State(state): State<AppState>,
    Query(params): Query<BalanceParams>,
) -> Result<String, ApiError> {
    let result = state
        .gateway
        .query(
            &params.invoking_user_name,
            &TransactionRequest {
                fcn: "query_balance".to_string(),
                args: vec![params.account_name],
            },
        )
        .await?;
    Ok(result.payload)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NamesParams {
    invoking_user_name: String,
}

async fn query_account_names(
    State(state): State<AppState>,
    Query(params): Query<NamesParams>,
) -> Result<String, ApiError> {
    let result = state
        .gateway
        .query(
            &params.invoking_user_name,
            &TransactionRequest {
                fcn: "query_account_names".to_string(),
                args: Vec::new(),
            },
        )
        .await?;
    Ok(result.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;
    use weft_gateway::{GatewayError, IdentityResolver};
    use weft_provisioner::{ChaincodeInstaller, ChannelProvisioner};
    use weft_sdk::sim::SimNetwork;
    use weft_sdk::types::Identity;
    use weft_topology::testing::{sample_app, sample_network};
    use weft_topology::Topology;

    struct StoreResolver(Arc<EnrollmentManager>);

    #[async_trait]
    impl IdentityResolver for StoreResolver {
        async fn resolve(&self, enrollment_id: &str) -> Result<Option<Identity>, GatewayError> {
            self.0
                .identity(enrollment_id)
                .map_err(|err| GatewayError::Identity(err.to_string()))
        }
    }

    fn admin(org: &str) -> Identity {
        Identity {
            enrollment_id: "Admin".to_string(),
            organization: org.to_string(),
            certificate_pem: "cert".to_string(),
            private_key_pem: "key".to_string(),
        }
    }

    async fn facade(network: &SimNetwork, store_dir: &Path) -> Router {
        network.register_secret("org0", "admin", "adminpw");
        network.register_secret("org0", "Admin", "org0Adminpw");
        let app = sample_app();
        let topology =
            Topology::build(&sample_network(), &app, Path::new("."), network).unwrap();
        let channels = ChannelProvisioner::new(app.readiness.clone(), ".");
        let installer = ChaincodeInstaller::new(app.readiness.clone());
        let channel = &app.channels["mychannel"];
        let spec = channel.chaincode.to_spec();

        let org0 = topology.organization("org0").unwrap().clone();
        let org1 = topology.organization("org1").unwrap().clone();
        channels
            .create("mychannel", channel, &org0, &admin("org0"))
            .await
            .unwrap();
        channels.wait_until_ready("mychannel", &org0).await.unwrap();
        channels.join("mychannel", &org0, &admin("org0")).await.unwrap();
        channels.join("mychannel", &org1, &admin("org1")).await.unwrap();
        for org in [&org0, &org1] {
            installer
                .install(
                    &org.channel("mychannel").unwrap().peers,
                    &spec,
                    &admin(&org.name),
                )
                .await
                .unwrap();
        }
        installer
            .instantiate(
                org0.channel("mychannel").unwrap(),
                &spec,
                "init",
                &["alice".into(), "123".into(), "bob".into(), "456".into()],
                &admin("org0"),
            )
            .await
            .unwrap();

        let prefix = format!("{}/store-", store_dir.display());
        let enrollment =
            Arc::new(EnrollmentManager::create_store(org0.clone(), &prefix).unwrap());
        enrollment.enroll("admin", "adminpw").await.unwrap();
        enrollment.enroll("Admin", "org0Adminpw").await.unwrap();
        let gateway = TransactionGateway::new(
            org0,
            "mychannel",
            spec.id,
            Arc::new(StoreResolver(Arc::clone(&enrollment))),
            Duration::from_secs(30),
        )
        .unwrap();

        router(
            AppState {
                gateway: Arc::new(gateway),
                enrollment,
                registrar: app.registrar.clone(),
            },
            None,
        )
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    fn post(uri: &str) -> Request<Body> {
        Request::post(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_account_registers_and_commits() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        let app = facade(&network, dir.path()).await;

        let response = app
            .oneshot(post(
                "/create_account?invoking_user_name=Admin&account_name=carol&initial_balance=500",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["tx_id"].as_str().unwrap().starts_with("Admin-"));
        assert_eq!(network.balance("mychannel", "carol"), Some(500));
        // carol's identity was registered and enrolled on the way.
        assert_eq!(network.enroll_count("carol"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_moves_funds() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        let app = facade(&network, dir.path()).await;

        let response = app
            .oneshot(post(
                "/transfer?invoking_user_name=Admin&from_account_name=alice&to_account_name=bob&amount=20",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(network.balance("mychannel", "alice"), Some(103));
        assert_eq!(network.balance("mychannel", "bob"), Some(476));
    }

    #[tokio::test(start_paused = true)]
    async fn test_account_holder_may_move_only_own_funds() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        let app = facade(&network, dir.path()).await;

        let response = app
            .clone()
            .oneshot(post(
                "/create_account?invoking_user_name=Admin&account_name=carol&initial_balance=500",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // carol, enrolled on account creation, may spend her own balance.
        let response = app
            .clone()
            .oneshot(post(
                "/transfer?invoking_user_name=carol&from_account_name=carol&to_account_name=bob&amount=100",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(network.balance("mychannel", "carol"), Some(400));
        assert_eq!(network.balance("mychannel", "bob"), Some(556));

        // But not anyone else's.
        let response = app
            .oneshot(post(
                "/transfer?invoking_user_name=carol&from_account_name=alice&to_account_name=bob&amount=1",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("not authorized"));
        assert_eq!(network.balance("mychannel", "alice"), Some(123));
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_balance_returns_raw_payload() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        let app = facade(&network, dir.path()).await;

        let response = app
            .oneshot(
                Request::get("/query_balance?invoking_user_name=Admin&account_name=bob")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "456");
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_account_names() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        let app = facade(&network, dir.path()).await;

        let response = app
            .oneshot(
                Request::get("/query_account_names?invoking_user_name=Admin")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let names: Vec<String> =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(names, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chaincode_error_maps_to_500_message() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        let app = facade(&network, dir.path()).await;

        let response = app
            .oneshot(post(
                "/transfer?invoking_user_name=Admin&from_account_name=alice&to_account_name=bob&amount=-5",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("negative"));
        assert_eq!(network.balance("mychannel", "alice"), Some(123));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_query_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        let app = facade(&network, dir.path()).await;

        let response = app
            .oneshot(post(
                "/transfer?invoking_user_name=Admin&from_account_name=alice&to_account_name=bob&amount=20&memo=x",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(network.balance("mychannel", "alice"), Some(123));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_query_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        let app = facade(&network, dir.path()).await;

        let response = app
            .oneshot(post("/create_account?account_name=carol&initial_balance=500"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(network.enroll_count("carol"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_account_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        let app = facade(&network, dir.path()).await;

        let response = app
            .oneshot(post(
                "/create_account?invoking_user_name=Admin&account_name=alice&initial_balance=1",
            ))
            .await
            .unwrap();
        // alice exists on the ledger; registration of the identity is new
        // but the chaincode rejects the account.
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("already exists"));
    }
}
