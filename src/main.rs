use anyhow::Result;
use clap::{Parser, Subcommand};
use redmine_launcher::config;
use redmine_launcher::integrations::cache::CacheStore;
use redmine_launcher::integrations::redmine::RedmineClient;
use redmine_launcher::launcher::{session, Item, Workflow};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "redmine-launcher")]
#[command(about = "Redmine issues, projects and timesheets for your launcher")]
#[command(version)]
struct Args {
    /// Path to config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Path to cache file
    #[arg(long)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List results for a command (or the command menu for an empty keyword)
    Items {
        keyword: String,

        /// Text typed after the keyword
        #[arg(default_value = "")]
        query: String,

        /// State payload from a previous listing
        #[arg(long, default_value = "")]
        data: String,
    },

    /// Perform the action bound to a selected item
    Do {
        keyword: String,

        /// Action payload
        #[arg(long)]
        data: String,
    },

    /// Log in with your Redmine username and password
    Login,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the results
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("redmine_launcher=info".parse()?),
        )
        .init();

    let config_path = match args.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let cache_path = match args.cache {
        Some(path) => path,
        None => config::default_cache_path()?,
    };

    let config = config::load_or_default(&config_path);
    let client = RedmineClient::from_config(&config)?;
    let store = CacheStore::open(cache_path);
    let mut wf = Workflow::new(config, store, Arc::new(client)).with_config_path(config_path);

    match args.command {
        Command::Items {
            keyword,
            query,
            data,
        } => {
            let items = if keyword.is_empty() {
                wf.menu(&query)
            } else {
                match wf.items(&keyword, &query, &data).await {
                    Ok(items) => items,
                    Err(e) => {
                        tracing::warn!("{:#}", e);
                        vec![Item::error("Error", &e)]
                    }
                }
            };
            println!("{}", serde_json::json!({ "items": items }));
        }
        Command::Do { keyword, data } => {
            let result = wf.run(&keyword, &data).await;
            if let Err(e) = &result {
                tracing::warn!("{:#}", e);
            }
            if let Some(line) = status_line(result) {
                println!("{}", line);
            }
        }
        Command::Login => {
            let message = login_prompt(&mut wf).await?;
            println!("{}", message);
        }
    }

    Ok(())
}

/// Line shown by the launcher after an action, failures included
fn status_line(result: Result<String>) -> Option<String> {
    match result {
        Ok(message) if message.is_empty() => None,
        Ok(message) => Some(message),
        Err(e) => Some(format!("Error: {}", e)),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

async fn login_prompt(wf: &mut Workflow) -> Result<String> {
    let server_url = if wf.config.has_server() {
        wf.config.server_url.clone()
    } else {
        prompt("Redmine server URL: ")?
    };
    if server_url.is_empty() {
        anyhow::bail!("A server URL is required");
    }

    println!("Logging in to {}", server_url);
    let username = prompt("Username: ")?;
    let password = prompt("Password: ")?;

    session::login(wf, &server_url, &username, &password).await
}
