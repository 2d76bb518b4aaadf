use super::SupervisorHandle;
use super::actor::{TunnelStatus, launch};
use crate::shutdown::ShutdownHandler;
use std::path::{Path, PathBuf};
use tokio::time::{Duration, sleep};

fn sh(script: &str) -> (PathBuf, Vec<String>) {
    (
        PathBuf::from("sh"),
        vec!["-c".to_string(), script.to_string()],
    )
}

async fn wait_for_status(handle: &SupervisorHandle, wanted: TunnelStatus) -> bool {
    for _ in 0..100 {
        if handle.status().await == wanted {
            return true;
        }
        sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn launch_fails_for_a_missing_binary() {
    assert!(launch(Path::new("/definitely/not/a/real/binary"), &[]).is_err());
}

#[tokio::test]
async fn child_exit_code_is_reported() {
    let shutdown = ShutdownHandler::new();
    let (binary, args) = sh("exit 0");
    let handle = SupervisorHandle::with_command(shutdown.signals(), binary, args);

    assert!(
        wait_for_status(&handle, TunnelStatus::Exited(0)).await,
        "supervisor never reported the exit"
    );
}

#[tokio::test]
async fn reload_reaches_the_client_over_stdin() {
    let shutdown = ShutdownHandler::new();
    // the client blocks on stdin and turns the reload line into an
    // observable exit code
    let (binary, args) = sh("read line && exit 7");
    let handle = SupervisorHandle::with_command(shutdown.signals(), binary, args);

    assert!(
        wait_for_status(&handle, TunnelStatus::Running).await,
        "tunnel client never started"
    );

    handle.reload().await;

    assert!(
        wait_for_status(&handle, TunnelStatus::Exited(7)).await,
        "tunnel client never saw the reload signal"
    );
}

#[tokio::test]
async fn failed_launch_leaves_the_supervisor_responsive() {
    let shutdown = ShutdownHandler::new();
    let handle = SupervisorHandle::with_command(
        shutdown.signals(),
        PathBuf::from("/definitely/not/a/real/binary"),
        vec![],
    );

    assert!(
        wait_for_status(&handle, TunnelStatus::Failed).await,
        "supervisor never reported the failed launch"
    );

    // a reload against a dead client is dropped, not a crash
    handle.reload().await;
    assert_eq!(handle.status().await, TunnelStatus::Failed);
}
