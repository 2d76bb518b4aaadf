use super::{State, TriggerParams, dispatch, trigger};
use crate::config::{Config, TunnelConfig};
use crate::pipeline::PipelineHandle;
use crate::shutdown::ShutdownHandler;
use crate::supervisor::SupervisorHandle;
use crate::token;
use axum::Extension;
use axum::extract::Query;
use axum::http::StatusCode;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tokio::time::{Duration, sleep};

pub(crate) fn test_config(secret: &str, client: &str, apps_file: Option<&str>) -> Config {
    Config {
        tunnel: TunnelConfig {
            binary: PathBuf::from("/opt/tunnel/client"),
            server: "tunnel.example.com".to_string(),
            user: "admin".to_string(),
            token: "tunnel-token".to_string(),
            client_name: client.to_string(),
        },
        secret: secret.to_string(),
        port: 3333,
        base_url: format!("https://{client}.tunnel.example.com"),
        apps_file: apps_file.map(|p| p.to_string()),
    }
}

fn test_state(config: &'static Config) -> State {
    let shutdown = ShutdownHandler::new();
    let pipeline = PipelineHandle::new(shutdown.signals());
    // stand-in tunnel client that stays alive and swallows its stdin
    let supervisor = SupervisorHandle::with_command(
        shutdown.signals(),
        PathBuf::from("sh"),
        vec!["-c".to_string(), "sleep 30".to_string()],
    );

    State {
        config,
        pipeline,
        supervisor,
    }
}

fn registry_with(name: &str, dir: &std::path::Path, command: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temporary file");
    writeln!(
        file,
        r#"
[[app]]
name = "{name}"
path = "{}"
commands = ["{command}"]
"#,
        dir.display()
    )
    .expect("Failed to write to temporary file");
    file
}

#[test]
fn ack_carries_message_and_timestamp() {
    let ack = super::TriggerAck::received();
    let json = serde_json::to_value(&ack).expect("ack should serialize");

    assert_eq!(json["message"], "Webhook received");
    assert!(json["timestamp"].as_u64().is_some());
}

async fn marker_appears(dir: &std::path::Path, marker: &str) -> bool {
    for _ in 0..100 {
        if dir.join(marker).exists() {
            return true;
        }
        sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn verified_trigger_runs_the_pipeline() {
    let workdir = tempfile::tempdir().expect("Failed to create temp dir");
    let registry = registry_with("blog", workdir.path(), "touch triggered");

    let config: &'static Config = Box::leak(Box::new(test_config(
        "a-secret",
        "living-room",
        registry.path().to_str(),
    )));
    let state = test_state(config);

    let credential = token::issue("a-secret", "living-room").expect("issue should work");
    dispatch(
        state,
        TriggerParams {
            app: "blog".to_string(),
            token: credential,
        },
    )
    .await;

    assert!(
        marker_appears(workdir.path(), "triggered").await,
        "verified trigger never ran its pipeline"
    );
}

#[tokio::test]
async fn invalid_token_runs_nothing_but_still_acks() {
    let workdir = tempfile::tempdir().expect("Failed to create temp dir");
    let registry = registry_with("blog", workdir.path(), "touch triggered");

    let config: &'static Config = Box::leak(Box::new(test_config(
        "a-secret",
        "living-room",
        registry.path().to_str(),
    )));
    let state = test_state(config);

    let (status, ack) = trigger(
        Extension(state),
        Query(TriggerParams {
            app: "blog".to_string(),
            token: "not.a-token".to_string(),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(ack.0.timestamp > 0);

    sleep(Duration::from_millis(500)).await;
    assert!(
        !workdir.path().join("triggered").exists(),
        "a forged trigger must not run the pipeline"
    );
}

#[tokio::test]
async fn token_for_another_client_runs_nothing() {
    let workdir = tempfile::tempdir().expect("Failed to create temp dir");
    let registry = registry_with("blog", workdir.path(), "touch triggered");

    let config: &'static Config = Box::leak(Box::new(test_config(
        "a-secret",
        "living-room",
        registry.path().to_str(),
    )));
    let state = test_state(config);

    let stolen = token::issue("a-secret", "someone-else").expect("issue should work");
    dispatch(
        state,
        TriggerParams {
            app: "blog".to_string(),
            token: stolen,
        },
    )
    .await;

    sleep(Duration::from_millis(500)).await;
    assert!(!workdir.path().join("triggered").exists());
}

#[tokio::test]
async fn unknown_app_runs_nothing() {
    let workdir = tempfile::tempdir().expect("Failed to create temp dir");
    let registry = registry_with("blog", workdir.path(), "touch triggered");

    let config: &'static Config = Box::leak(Box::new(test_config(
        "a-secret",
        "living-room",
        registry.path().to_str(),
    )));
    let state = test_state(config);

    let credential = token::issue("a-secret", "living-room").expect("issue should work");
    dispatch(
        state,
        TriggerParams {
            app: "no-such-app".to_string(),
            token: credential,
        },
    )
    .await;

    sleep(Duration::from_millis(500)).await;
    assert!(!workdir.path().join("triggered").exists());
}

#[tokio::test]
async fn unreadable_registry_runs_nothing() {
    let config: &'static Config = Box::leak(Box::new(test_config(
        "a-secret",
        "living-room",
        Some("/definitely/not/here/apps.toml"),
    )));
    let state = test_state(config);

    let credential = token::issue("a-secret", "living-room").expect("issue should work");
    // nothing to assert beyond "does not panic and does not hang"
    dispatch(
        state,
        TriggerParams {
            app: "blog".to_string(),
            token: credential,
        },
    )
    .await;
}
