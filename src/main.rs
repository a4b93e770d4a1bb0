#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]

use std::net::SocketAddr;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use axum_client_ip::ClientIpSource;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::api::Error;
use crate::api::JwtKeys;
use crate::api::router;
use crate::storage::Database;
use crate::users::ensure_initial_user;
use crate::utils::env_var;
use crate::utils::env_var_or_else;

mod api;
mod client_ip;
mod contacts;
mod graceful_shutdown;
mod leads;
mod meetings;
mod password;
mod storage;
#[cfg(all(test, not(feature = "postgres")))]
mod tests;
mod users;
mod utils;

const DEFAULT_RUST_LOG: &str = "meetly=debug,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let storage = storage::setup().await?;
    let app = setup_app(storage).await?;

    let address = setup_address()?;
    tracing::info!("Listening on {}", address);

    let listener = TcpListener::bind(address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(graceful_shutdown::handler())
    .await?;

    Ok(())
}

/// Create and setup the app with its dependencies
///
/// # Errors
///
/// Will return `Err` if the initial user can not be ensured
pub async fn setup_app(storage: Database) -> Result<Router> {
    ensure_initial_user(&storage).await?;

    Ok(create_router(storage))
}

/// Create the router for Meetly
fn create_router(storage: Database) -> Router {
    let jwt_keys = setup_jwt_keys();

    Router::new()
        .nest("/api", router())
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(ClientIpSource::ConnectInfo.into_extension())
        .layer(Extension(storage))
        .layer(Extension(jwt_keys))
}

/// Everything outside the API
async fn route_not_found() -> Error {
    Error::not_found("Route not found")
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(
            env_var_or_else("RUST_LOG", || DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}

fn setup_jwt_keys() -> JwtKeys {
    use crate::password::generate;

    let jwt_secret = env_var_or_else("JWT_SECRET", || {
        let jwt_secret = generate();
        tracing::info!("`JWT_SECRET` is not set, generating temporary one: {jwt_secret}");
        jwt_secret
    });

    JwtKeys::new(jwt_secret.as_bytes())
}

fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Some(port) = env_var("PORT") {
        address.set_port(port.parse::<u16>()?);
    }

    Ok(address)
}
