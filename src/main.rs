// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

use std::env;
use std::net::SocketAddr;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use workflow_gate::api::router;
use workflow_gate::config::{
    AUTH_CONFIG_PATH_ENV, DEFAULT_AUTH_CONFIG_PATH, DEFAULT_TOKEN_SECRET,
};
use workflow_gate::state::AppState;
use workflow_gate::store::{ConfigStore, JsonConfigStore};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config_path = env::var(AUTH_CONFIG_PATH_ENV)
        .unwrap_or_else(|_| DEFAULT_AUTH_CONFIG_PATH.to_string());
    let store = JsonConfigStore::load(&config_path);
    if store.secret() == DEFAULT_TOKEN_SECRET {
        warn!("TOKEN_SECRET is unset; tokens are signed with the insecure default");
    }

    let state = AppState::new(store);
    let app = router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    info!(%addr, config = %config_path, "workflow gate listening (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
