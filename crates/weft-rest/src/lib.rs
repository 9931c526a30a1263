//! # weft-rest
//!
//! Thin HTTP facade over the transaction gateway: four account
//! endpoints plus an optional static client. Invocations answer with
//! the JSON commit result only after the backing transaction commits;
//! queries answer with the raw chaincode payload.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{router, AppState};

use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;

/// Serve the router until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
