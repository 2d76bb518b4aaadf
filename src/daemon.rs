use crate::config::Config;
use crate::pipeline::PipelineHandle;
use crate::registry::AppsFile;
use crate::report;
use crate::server::{self, State};
use crate::shutdown::ShutdownHandler;
use crate::supervisor::SupervisorHandle;
use tracing::{error, info, warn};

pub async fn run() {
    let config: &'static Config = match Config::new() {
        Ok(config) => Box::leak(Box::new(config)),
        Err(err) => {
            error!("Configuration error: {err:#}");
            return;
        }
    };

    let shutdown = ShutdownHandler::new();

    let supervisor = SupervisorHandle::new(shutdown.signals(), &config.tunnel);

    let pipeline = PipelineHandle::new(shutdown.signals());

    // a broken registry only costs the startup report; every trigger
    // re-reads the file anyway
    let apps = AppsFile::load(config.apps_file.as_deref()).unwrap_or_else(|err| {
        warn!("Could not read the app registry: {err:#}");
        AppsFile::default()
    });

    report::print(config, &apps);

    let state = State {
        config,
        pipeline,
        supervisor,
    };
    tokio::spawn(server::serve(state, shutdown.signals()));

    // block here until a signal or a task asks us to stop
    shutdown.wait().await;

    info!("homeport is shutting down");
}
