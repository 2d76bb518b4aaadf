use crate::config::Config;
use crate::registry::AppsFile;
use crate::server::url;
use anyhow::Result;
use clap::{Parser, Subcommand};

/// Supervisor for the home tunnel client and its app pipelines
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the trigger URL for a registered app
    Url {
        #[arg(help = "Name of the app in apps.toml")]
        app: String,
    },
    /// List the apps known to the registry
    Apps,
}

pub async fn execute() -> bool {
    let mut daemon_should_run = false;
    let args = Args::parse();

    match args.command {
        Some(Commands::Url { app }) => {
            if let Err(err) = print_url(&app) {
                eprintln!("{err:#}");
            }
        }
        Some(Commands::Apps) => {
            if let Err(err) = print_apps() {
                eprintln!("{err:#}");
            }
        }
        None => daemon_should_run = true,
    }

    daemon_should_run
}

fn print_url(app: &str) -> Result<()> {
    let config = Config::new()?;
    let apps = AppsFile::load(config.apps_file.as_deref())?;

    if apps.lookup(app).is_none() {
        anyhow::bail!("App '{app}' is not in the registry");
    }

    println!("{}", url::webhook_url(&config, app)?);
    Ok(())
}

fn print_apps() -> Result<()> {
    _ = dotenvy::dotenv();
    let location = std::env::var("APPS_FILE").ok();
    let apps = AppsFile::load(location.as_deref())?;

    if apps.apps.is_empty() {
        println!("No apps registered");
        return Ok(());
    }

    for app in &apps.apps {
        println!("{} ({}) - {} commands", app.name, app.path, app.commands.len());
    }
    Ok(())
}
