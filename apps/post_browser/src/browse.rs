//! Line-driven browse loop: the page's buttons and form inputs as commands.

use std::io::Write;

use anyhow::{bail, Context, Result};
use client_core::{ClientError, DraftField, PostBoard};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::render;

const HELP: &str = "\
commands:
  refresh                      reload posts from the store
  new                          open the composer
  set <title|body|author> TEXT fill in a draft field
  show                         show the composer
  submit                       send the draft as a new post
  cancel                       close the composer
  dismiss                      hide error notices
  help                         show this text
  quit                         leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Refresh,
    New,
    Set(DraftField, String),
    Show,
    Submit,
    Cancel,
    Dismiss,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<BrowseCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let command = match verb.to_ascii_lowercase().as_str() {
        "refresh" | "r" => BrowseCommand::Refresh,
        "new" | "n" => BrowseCommand::New,
        "set" => {
            let rest = rest.trim_start();
            let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if field.is_empty() {
                bail!("usage: set <title|body|author> TEXT");
            }
            BrowseCommand::Set(field.parse()?, value.trim_start().to_string())
        }
        "show" => BrowseCommand::Show,
        "submit" => BrowseCommand::Submit,
        "cancel" | "close" => BrowseCommand::Cancel,
        "dismiss" => BrowseCommand::Dismiss,
        "help" | "?" => BrowseCommand::Help,
        "quit" | "exit" | "q" => BrowseCommand::Quit,
        other => bail!("unknown command '{other}'; type `help`"),
    };
    Ok(Some(command))
}

/// Runs the loop until `quit` or end of input. Loads the list once on entry.
pub async fn run<R, W>(board: &PostBoard, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{}", render::header())?;
    let _ = board.list.load().await;
    write!(out, "{}", render::post_list(&board.list.state()))?;
    writeln!(out, "type `help` for commands")?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "{err}")?;
                continue;
            }
        };
        if command == BrowseCommand::Quit {
            break;
        }
        apply(board, command, out).await?;
        out.flush()?;
    }
    Ok(())
}

async fn apply<W: Write>(board: &PostBoard, command: BrowseCommand, out: &mut W) -> Result<()> {
    let composer = &board.composer;
    match command {
        BrowseCommand::Refresh => {
            let _ = board.list.load().await;
            write!(out, "{}", render::post_list(&board.list.state()))?;
        }
        BrowseCommand::New => {
            composer.open();
            write!(out, "{}", render::composer(&composer.state()))?;
        }
        BrowseCommand::Set(field, value) => {
            if !composer.state().visible {
                writeln!(out, "open the composer with `new` first")?;
            } else {
                composer.update_field(field, value);
            }
        }
        BrowseCommand::Show => write!(out, "{}", render::composer(&composer.state()))?,
        BrowseCommand::Submit => submit(board, out).await?,
        BrowseCommand::Cancel => {
            composer.close();
            write!(out, "{}", render::composer(&composer.state()))?;
        }
        BrowseCommand::Dismiss => {
            board.list.dismiss_error();
            composer.dismiss_error();
        }
        BrowseCommand::Help => write!(out, "{HELP}")?,
        BrowseCommand::Quit => {}
    }
    Ok(())
}

async fn submit<W: Write>(board: &PostBoard, out: &mut W) -> Result<()> {
    let state = board.composer.state();
    if !state.visible {
        writeln!(out, "open the composer with `new` first")?;
        return Ok(());
    }
    let missing = state.draft.missing_fields();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|field| field.as_str()).collect();
        writeln!(out, "please fill in: {}", names.join(", "))?;
        return Ok(());
    }

    match board.composer.submit().await {
        Ok(post) => {
            writeln!(out, "created post {}", post.id)?;
            write!(out, "{}", render::post_list(&board.list.state()))?;
        }
        Err(ClientError::SubmitInFlight) => writeln!(out, "already submitting; please wait")?,
        Err(ClientError::Store(_)) => {
            write!(out, "{}", render::composer(&board.composer.state()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/browse_tests.rs"]
mod tests;
