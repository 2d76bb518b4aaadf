use anyhow::Context;
use std::env;
use std::path::PathBuf;

/// Everything the daemon needs to know, read once at startup and never
/// mutated afterwards.
#[derive(Debug)]
pub struct Config {
    pub tunnel: TunnelConfig,
    /// Shared secret that signs webhook credentials.
    pub secret: String,
    /// HTTP listen port for the trigger endpoint.
    pub port: u16,
    /// Externally reachable base for generated trigger URLs.
    pub base_url: String,
    /// Explicit registry location, overriding the usual lookup.
    pub apps_file: Option<String>,
}

#[derive(Debug)]
pub struct TunnelConfig {
    pub binary: PathBuf,
    pub server: String,
    pub user: String,
    pub token: String,
    pub client_name: String,
}

impl TunnelConfig {
    /// Fixed argv layout the tunnel client expects.
    pub fn args(&self) -> Vec<String> {
        vec![
            "client".to_string(),
            "-server".to_string(),
            self.server.clone(),
            "-user".to_string(),
            self.user.clone(),
            "-token".to_string(),
            self.token.clone(),
            "-client-name".to_string(),
            self.client_name.clone(),
        ]
    }
}

impl Config {
    pub fn new() -> anyhow::Result<Config> {
        _ = dotenvy::dotenv();

        let tunnel = TunnelConfig {
            binary: env::var("TUNNEL_CLIENT_BIN")
                .context("TUNNEL_CLIENT_BIN is required.")?
                .into(),
            server: env::var("TUNNEL_SERVER").context("TUNNEL_SERVER is required.")?,
            user: env::var("TUNNEL_USER").context("TUNNEL_USER is required.")?,
            token: env::var("TUNNEL_AUTH_TOKEN").context("TUNNEL_AUTH_TOKEN is required.")?,
            client_name: env::var("TUNNEL_CLIENT_NAME")
                .context("TUNNEL_CLIENT_NAME is required.")?,
        };

        // the tunnel server exposes this machine under its client name
        let base_url = match env::var("WEBHOOK_BASE_URL") {
            Ok(url) => url.trim_end_matches('/').to_string(),
            Err(_) => format!("https://{}.{}", tunnel.client_name, tunnel.server),
        };

        Ok(Config {
            tunnel,
            secret: env::var("WEBHOOK_SECRET").context("WEBHOOK_SECRET is required.")?,
            port: match env::var("PORT") {
                Ok(port) => port.parse().context("PORT must be a number")?,
                Err(_) => 3333,
            },
            base_url,
            apps_file: env::var("APPS_FILE").ok(),
        })
    }
}
