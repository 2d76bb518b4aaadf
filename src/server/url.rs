use crate::config::Config;
use crate::token::{self, TokenError};

/// Build the shareable trigger URL for one app: the configured base URL
/// with the app name and a freshly issued credential as query
/// parameters.
pub fn webhook_url(config: &Config, app: &str) -> Result<String, TokenError> {
    let credential = token::issue(&config.secret, &config.tunnel.client_name)?;

    Ok(format!(
        "{}/webhook?app={}&token={}",
        config.base_url, app, credential
    ))
}
