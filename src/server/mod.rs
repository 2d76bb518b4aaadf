use crate::config::Config;
use crate::pipeline::PipelineHandle;
use crate::registry::AppsFile;
use crate::shutdown::ShutdownSignals;
use crate::supervisor::SupervisorHandle;
use crate::token;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

pub mod url;
#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct State {
    pub config: &'static Config,
    pub pipeline: PipelineHandle,
    pub supervisor: SupervisorHandle,
}

#[derive(Deserialize, Debug)]
pub struct TriggerParams {
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Serialize, Debug)]
pub struct TriggerAck {
    pub message: String,
    pub timestamp: u64,
}

impl TriggerAck {
    fn received() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            message: "Webhook received".to_string(),
            timestamp,
        }
    }
}

pub async fn serve(state: State, shutdown: ShutdownSignals) {
    let port = state.config.port;

    let app = Router::new()
        .route("/webhook", get(trigger))
        .layer(Extension(state));

    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind port {port}: {err}");
            shutdown.token.cancel();
            return;
        }
    };

    info!("Port forwarding server running on port {port}. Ready to receive webhooks.");

    let token = shutdown.token.clone();
    if let Err(err) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
    {
        error!("Webhook server failed: {err}");
        shutdown.token.cancel();
    }
}

/// The single trigger endpoint. Always acks with a 200 so callers learn
/// nothing from probing; side effects only happen for a verified token
/// and a registered app.
async fn trigger(
    Extension(state): Extension<State>,
    Query(params): Query<TriggerParams>,
) -> (StatusCode, Json<TriggerAck>) {
    info!("Webhook received for app '{}'", params.app);

    tokio::spawn(async move {
        dispatch(state, params).await;
    });

    (StatusCode::OK, Json(TriggerAck::received()))
}

async fn dispatch(state: State, params: TriggerParams) {
    let expected = &state.config.tunnel.client_name;
    let client = match token::verify(&params.token, &state.config.secret, expected) {
        Ok(client) => client,
        Err(err) => {
            warn!("Rejected trigger for app '{}': {err}", params.app);
            return;
        }
    };

    // re-read the registry so apps.toml edits apply without a restart
    let apps = match AppsFile::load(state.config.apps_file.as_deref()) {
        Ok(apps) => apps,
        Err(err) => {
            warn!("Registry unavailable, ignoring trigger: {err:#}");
            return;
        }
    };

    let Some(app) = apps.lookup(&params.app) else {
        warn!("Trigger from {client} for unknown app '{}'", params.app);
        return;
    };

    state.pipeline.dispatch(app.clone()).await;
    state.supervisor.reload().await;
}
