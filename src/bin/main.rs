//! homeport keeps a network tunnel client running on this machine and
//! executes registered app pipelines when an authenticated webhook
//! arrives. It is meant to run as a service next to the apps it deploys.
//!

use homeport::control;
use homeport::daemon;
use tracing_subscriber::{EnvFilter, prelude::*};

#[tokio::main]
async fn main() {
    // setup logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let daemon_should_run = control::execute().await;

    if daemon_should_run {
        daemon::run().await;
    }
}
