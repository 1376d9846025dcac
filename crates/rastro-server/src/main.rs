//! # rastro-server
//!
//! HTTP server for the rastro lost-pet beacon scanning node.
//!
//! This binary provides:
//! - REST API for scanner control, the detection log, and advisories
//! - OpenAPI documentation at `/api/openapi.json`
//! - Structured logging to file and stdout
//!
//! ## Running
//!
//! ```bash
//! # Development
//! cargo run --package rastro-server
//!
//! # Production (on the node)
//! ./rastro-server
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use rastro_server::api;
use rastro_server::logging;
use rastro_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration first: the log filter and file sink come from it
    let state = AppState::new()?;
    logging::init(&state.config().log)?;

    info!("Starting rastro-server");

    let port = state.config().server.port;

    let app = api::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
