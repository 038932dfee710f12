use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aiverse::config::{load_dotenv, AiverseConfig};
use aiverse::event::{progress_percent, DispatchEvent, EventHandler};
use aiverse::report::{export_markdown, render_outcome, render_text};
use aiverse::roster::{build_tasks, default_roster, select_agents};
use aiverse::tools::builtin_registry;
use aiverse::{Dispatcher, ResultSet};
use async_trait::async_trait;
use clap::Parser;
use futures_util::StreamExt;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser, Debug)]
#[command(
    name = "aiverse",
    version,
    about = "Ask one question to several LLM agents at once"
)]
struct Cli {
    /// Question to ask; prompted for on stdin when omitted.
    #[arg(long)]
    query: Option<String>,

    /// Ask the agents one after another instead of concurrently.
    #[arg(long)]
    sequential: bool,

    /// Give up on an agent after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the underlying error below each failure placeholder.
    #[arg(long)]
    show_errors: bool,

    /// Write one markdown file per agent into this directory.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Only ask these agents (comma separated, e.g. `--agents kimi,google`).
    #[arg(long, value_delimiter = ',')]
    agents: Vec<String>,
}

/// Logs the progress bar position as agents finish.
struct ProgressLogger;

#[async_trait]
impl EventHandler for ProgressLogger {
    async fn on_dispatch_event(&self, event: &DispatchEvent) {
        match event {
            DispatchEvent::DispatchStarted { total, .. } => {
                info!("Launching {} agent(s)", total);
            }
            DispatchEvent::TaskCompleted {
                agent_name,
                completed,
                total,
                ..
            } => {
                info!(
                    "{}% - {}/{} agents completed - {} just finished",
                    progress_percent(*completed, *total),
                    completed,
                    total,
                    agent_name
                );
            }
            DispatchEvent::DispatchCompleted {
                total,
                failures,
                elapsed,
                ..
            } => {
                info!(
                    "All {} agent(s) responded ({} failed) in {:.1}s",
                    total,
                    failures,
                    elapsed.as_secs_f64()
                );
            }
        }
    }
}

async fn read_query() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Enter your query: ").await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    Ok(lines.next_line().await?.unwrap_or_default())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    aiverse::init_logger();
    load_dotenv();
    let cli = Cli::parse();

    let query = match cli.query {
        Some(query) => query,
        None => read_query().await?,
    };
    let query = query.trim().to_string();
    if query.is_empty() {
        warn!("Empty query, nothing to ask");
        eprintln!("Please enter a query.");
        return Ok(());
    }

    let config = AiverseConfig::from_env();
    let roster = if cli.agents.is_empty() {
        default_roster()
    } else {
        select_agents(&default_roster(), &cli.agents)?
    };
    let tools = builtin_registry(&config).await?;
    let tasks = build_tasks(&roster, &query, &config, Some(tools));

    let mut dispatcher = Dispatcher::new().with_event_handler(Arc::new(ProgressLogger));
    if let Some(secs) = cli.timeout_secs {
        dispatcher = dispatcher.with_timeout(Duration::from_secs(secs));
    }

    let results = if cli.sequential {
        let results = dispatcher.dispatch_sequential(tasks).await?;
        println!("{}", render_text(&results, cli.show_errors));
        results
    } else {
        let mut stream = dispatcher.dispatch_streaming(tasks).await?;
        let mut results = ResultSet::new();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut interrupted = false;

        loop {
            tokio::select! {
                item = stream.next() => match item {
                    Some((name, outcome)) => {
                        println!("{}", render_outcome(&name, &outcome, cli.show_errors));
                        results.insert(name, outcome);
                    }
                    None => break,
                },
                _ = &mut ctrl_c, if !interrupted => {
                    warn!("Interrupted, cancelling {} remaining agent(s)", stream.remaining());
                    stream.cancel();
                    interrupted = true;
                }
            }
        }
        results
    };

    if let Some(dir) = cli.export_dir {
        for path in export_markdown(&results, &roster, &dir)? {
            println!("Saved {}", path.display());
        }
    }
    Ok(())
}
