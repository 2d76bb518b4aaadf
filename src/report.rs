use crate::config::Config;
use crate::registry::AppsFile;
use crate::server::url;

/// Operator facing startup report. Diagnostics go through tracing; this
/// block is what a human reads right after starting the service.
pub fn print(config: &Config, apps: &AppsFile) {
    println!("Operating System: {}", std::env::consts::OS);
    println!("Architecture: {}", std::env::consts::ARCH);
    println!();
    println!(
        "Supervising tunnel client {} -> {} as '{}'",
        config.tunnel.binary.display(),
        config.tunnel.server,
        config.tunnel.client_name
    );
    println!("Listening for webhooks on port {}", config.port);
    println!();

    if apps.apps.is_empty() {
        println!("No apps registered. Add entries to apps.toml to get trigger URLs.");
        return;
    }

    println!("Trigger URLs:");
    for app in &apps.apps {
        match url::webhook_url(config, &app.name) {
            Ok(link) => println!("  {} -> {}", app.name, link),
            Err(err) => println!("  {} -> unavailable ({err})", app.name),
        }
    }
    println!();
}
