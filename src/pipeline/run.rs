use crate::registry::AppEntry;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::info;

/// A pipeline that ran to the end.
#[derive(Debug, PartialEq, Eq)]
pub struct Completed {
    pub commands_run: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("working directory {0} does not exist")]
    DirectoryNotFound(PathBuf),

    #[error("command {index} `{command}` failed to start: {source}")]
    Launch {
        index: usize,
        command: String,
        source: std::io::Error,
    },

    #[error("command {index} `{command}` exited with code {code}")]
    CommandFailed {
        index: usize,
        command: String,
        code: i32,
    },
}

/// Run one app's commands in order, stopping at the first failure.
///
/// Every command gets its own `sh -c` child rooted at the app's
/// directory through `current_dir`, so concurrent runs never observe
/// each other's working directory.
pub async fn execute(app: &AppEntry) -> Result<Completed, RunError> {
    let dir = Path::new(&app.path);

    let dir_exists = tokio::fs::metadata(dir)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if !dir_exists {
        return Err(RunError::DirectoryNotFound(dir.to_path_buf()));
    }

    for (index, command) in app.commands.iter().enumerate() {
        info!("[{}] $ {}", app.name, command);

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunError::Launch {
                index,
                command: command.clone(),
                source,
            })?;

        let stdout = forward_lines(&app.name, child.stdout.take());
        let stderr = forward_lines(&app.name, child.stderr.take());

        let status = child.wait().await.map_err(|source| RunError::Launch {
            index,
            command: command.clone(),
            source,
        })?;

        // drain the forwarders so this command's output is in the log
        // before the next command starts or the failure is reported
        _ = tokio::join!(stdout, stderr);

        if !status.success() {
            return Err(RunError::CommandFailed {
                index,
                command: command.clone(),
                code: status.code().unwrap_or(-1),
            });
        }
    }

    Ok(Completed {
        commands_run: app.commands.len(),
    })
}

fn forward_lines(
    app: &str,
    stream: Option<impl AsyncRead + Unpin + Send + 'static>,
) -> tokio::task::JoinHandle<()> {
    let app = app.to_owned();
    tokio::spawn(async move {
        if let Some(stream) = stream {
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!("[{app}] {line}");
            }
        }
    })
}
