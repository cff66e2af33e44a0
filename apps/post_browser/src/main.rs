use std::{io::Write, path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{DraftField, HttpPostStore, PostBoard};
use tokio::io::BufReader;
use tracing::info;

mod browse;
mod config;
mod render;

#[derive(Parser, Debug)]
#[command(about = "Browse and submit posts against a remote post store")]
struct Cli {
    /// Config file; defaults to ./browser.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    store_url: Option<String>,
    /// Discard the draft when the composer is closed.
    #[arg(long)]
    reset_draft_on_close: bool,
    #[arg(long)]
    log_filter: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive page (default).
    Browse,
    /// Load and print the posts once.
    List,
    /// Submit one post and print the refreshed list.
    Post {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long, default_value = "")]
        author: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(url) = cli.store_url {
        settings.store_url = url;
    }
    if cli.reset_draft_on_close {
        settings.reset_draft_on_close = true;
    }
    if let Some(filter) = cli.log_filter {
        settings.log_filter = filter;
    }

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();
    info!(store_url = %settings.store_url, "starting post browser");

    let store = HttpPostStore::with_timeout(
        &settings.store_url,
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    let board = PostBoard::new(std::sync::Arc::new(store), settings.draft_retention());
    let mut stdout = std::io::stdout();

    match cli.command.unwrap_or(Command::Browse) {
        Command::Browse => {
            browse::run(&board, BufReader::new(tokio::io::stdin()), &mut stdout).await?;
        }
        Command::List => {
            let outcome = board.list.load().await;
            print!("{}", render::header());
            print!("{}", render::post_list(&board.list.state()));
            outcome?;
        }
        Command::Post {
            title,
            body,
            author,
        } => {
            let composer = &board.composer;
            composer.open();
            composer.update_field(DraftField::Title, title);
            composer.update_field(DraftField::Body, body);
            composer.update_field(DraftField::Author, author);

            let missing = composer.state().draft.missing_fields();
            if !missing.is_empty() {
                let names: Vec<&str> = missing.iter().map(|field| field.as_str()).collect();
                bail!("missing required fields: {}", names.join(", "));
            }

            let post = composer.submit().await?;
            println!("created post {}", post.id);
            print!("{}", render::post_list(&board.list.state()));
        }
    }

    stdout.flush()?;
    Ok(())
}
