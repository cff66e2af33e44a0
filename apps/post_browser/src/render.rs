//! Plain-text rendering of the page: header, post cards, notices, the composer.

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use client_core::{ComposerState, DraftField, ListState};
use shared::{domain::Timestamp, protocol::Post};

pub const TITLE: &str = "Crypto Blog";
pub const TAGLINE: &str = "Explore the latest in cryptocurrency and blockchain technology";
const RULE: &str = "----------------------------------------";

pub fn header() -> String {
    format!("{TITLE}\n{TAGLINE}\n")
}

pub fn format_timestamp(timestamp: Timestamp) -> String {
    let local: DateTime<Local> = timestamp.to_local();
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn post_card(post: &Post) -> String {
    format!(
        "{}\nBy {} | {}\n{}\n",
        post.title,
        post.author,
        format_timestamp(post.timestamp),
        post.body
    )
}

pub fn post_list(state: &ListState) -> String {
    let mut out = String::new();
    if let Some(err) = &state.last_error {
        let _ = writeln!(out, "! {err} (type `dismiss` to hide)");
    }
    if state.loading {
        out.push_str("Loading posts...\n");
        return out;
    }
    if state.posts.is_empty() {
        out.push_str("No posts yet.\n");
        return out;
    }
    for post in &state.posts {
        let _ = writeln!(out, "{RULE}");
        out.push_str(&post_card(post));
    }
    let _ = writeln!(out, "{RULE}");
    out
}

pub fn composer(state: &ComposerState) -> String {
    let mut out = String::new();
    if !state.visible {
        out.push_str("Composer closed. Type `new` to create a post.\n");
        return out;
    }
    out.push_str("Create New Post\n");
    for field in DraftField::ALL {
        let value = state.draft.field(field);
        let shown = if value.is_empty() { "<required>" } else { value };
        let _ = writeln!(out, "  {field:<6} : {shown}");
    }
    if state.submitting {
        out.push_str("Submitting...\n");
    }
    if let Some(err) = &state.last_error {
        let _ = writeln!(out, "! {err} (edit and `submit` again, or `dismiss`)");
    }
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
