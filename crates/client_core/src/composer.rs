//! Post composer: the draft form, its visibility, and submission.

use std::{fmt, str::FromStr, sync::Arc};

use shared::protocol::Post;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, StoreError},
    list::ListRefresher,
    store::PostStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    Title,
    Body,
    Author,
}

impl DraftField {
    pub const ALL: [DraftField; 3] = [DraftField::Title, DraftField::Body, DraftField::Author];

    pub fn as_str(self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::Body => "body",
            DraftField::Author => "author",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown draft field '{0}' (expected title, body or author)")]
pub struct UnknownDraftField(pub String);

impl FromStr for DraftField {
    type Err = UnknownDraftField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(DraftField::Title),
            "body" => Ok(DraftField::Body),
            "author" => Ok(DraftField::Author),
            _ => Err(UnknownDraftField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftPost {
    pub title: String,
    pub body: String,
    pub author: String,
}

impl DraftPost {
    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::Title => &self.title,
            DraftField::Body => &self.body,
            DraftField::Author => &self.author,
        }
    }

    fn field_mut(&mut self, field: DraftField) -> &mut String {
        match field {
            DraftField::Title => &mut self.title,
            DraftField::Body => &mut self.body,
            DraftField::Author => &mut self.author,
        }
    }

    /// The composer never enforces this; forms check it before submitting.
    pub fn missing_fields(&self) -> Vec<DraftField> {
        DraftField::ALL
            .into_iter()
            .filter(|field| self.field(*field).is_empty())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// What `close()` does with an unsubmitted draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftRetention {
    #[default]
    KeepOnClose,
    ResetOnClose,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposerState {
    pub draft: DraftPost,
    pub visible: bool,
    pub submitting: bool,
    pub last_error: Option<StoreError>,
}

pub struct PostComposer {
    store: Arc<dyn PostStore>,
    list: Arc<dyn ListRefresher>,
    retention: DraftRetention,
    state: watch::Sender<ComposerState>,
}

impl PostComposer {
    pub fn new(store: Arc<dyn PostStore>, list: Arc<dyn ListRefresher>) -> Self {
        let (state, _) = watch::channel(ComposerState::default());
        Self {
            store,
            list,
            retention: DraftRetention::default(),
            state,
        }
    }

    pub fn with_retention(mut self, retention: DraftRetention) -> Self {
        self.retention = retention;
        self
    }

    pub fn state(&self) -> ComposerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ComposerState> {
        self.state.subscribe()
    }

    pub fn open(&self) {
        self.state.send_if_modified(|state| !std::mem::replace(&mut state.visible, true));
    }

    pub fn close(&self) {
        let reset = self.retention == DraftRetention::ResetOnClose;
        self.state.send_if_modified(|state| {
            let mut changed = std::mem::replace(&mut state.visible, false);
            if reset && state.draft != DraftPost::default() {
                state.draft = DraftPost::default();
                changed = true;
            }
            changed
        });
    }

    pub fn update_field(&self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        self.state.send_if_modified(|state| {
            let slot = state.draft.field_mut(field);
            if *slot == value {
                return false;
            }
            *slot = value;
            true
        });
    }

    pub fn dismiss_error(&self) {
        self.state.send_if_modified(|state| state.last_error.take().is_some());
    }

    /// Creates the draft as a post, then closes, clears the draft and reloads the
    /// list once. A failed create leaves the draft and visibility untouched.
    pub async fn submit(&self) -> Result<Post, ClientError> {
        let acquired = self.state.send_if_modified(|state| {
            if state.submitting {
                return false;
            }
            state.submitting = true;
            true
        });
        if !acquired {
            warn!("submit ignored; previous submission still in flight");
            return Err(ClientError::SubmitInFlight);
        }

        let draft = self.state.borrow().draft.clone();
        self.list.begin_mutation();
        let mut guard = SubmitGuard {
            composer: self,
            mutation_open: true,
        };
        debug!(title = %draft.title, author = %draft.author, "submitting post");

        match self
            .store
            .create_post(&draft.title, &draft.body, &draft.author)
            .await
        {
            Ok(post) => {
                info!(post_id = %post.id, "post created");
                self.state.send_modify(|state| {
                    state.visible = false;
                    state.draft = DraftPost::default();
                    state.last_error = None;
                });
                // complete_mutation releases the list's hold itself, even if dropped.
                guard.mutation_open = false;
                if let Err(err) = self.list.complete_mutation().await {
                    debug!(error = %err, "refresh after create failed");
                }
                Ok(post)
            }
            Err(err) => {
                warn!(error = %err, "failed to create post");
                self.state
                    .send_modify(|state| state.last_error = Some(err.clone()));
                Err(err.into())
            }
        }
    }
}

// Clears the in-flight flag and the list's loading hold however submit ends,
// including when its future is dropped mid-request.
struct SubmitGuard<'a> {
    composer: &'a PostComposer,
    mutation_open: bool,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if self.mutation_open {
            self.composer.list.abort_mutation();
        }
        self.composer
            .state
            .send_modify(|state| state.submitting = false);
    }
}

#[cfg(test)]
#[path = "tests/composer_tests.rs"]
mod tests;
