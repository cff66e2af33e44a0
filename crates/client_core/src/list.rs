//! Post list state: the fetched posts, the loading flag and the last fetch failure.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use shared::protocol::Post;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{error::StoreError, store::PostStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    pub posts: Vec<Post>,
    pub loading: bool,
    pub last_error: Option<StoreError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { count: usize },
    /// Another load was running; it will fetch once more before it finishes.
    Queued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum FetchPhase {
    #[default]
    Idle,
    Running,
    FollowUpQueued,
}

#[derive(Debug, Default)]
struct Activity {
    fetch: FetchPhase,
    mutations: usize,
}

impl Activity {
    fn busy(&self) -> bool {
        self.fetch != FetchPhase::Idle || self.mutations > 0
    }
}

/// Holds the list's loading flag across a create and refreshes after it.
#[async_trait]
pub trait ListRefresher: Send + Sync {
    fn begin_mutation(&self);
    fn abort_mutation(&self);
    async fn complete_mutation(&self) -> Result<LoadOutcome, StoreError>;
}

pub struct PostListController {
    store: Arc<dyn PostStore>,
    state: watch::Sender<ListState>,
    activity: Mutex<Activity>,
}

// Returns the fetch phase to idle even when the load future is dropped mid-request.
struct FetchGuard<'a> {
    list: &'a PostListController,
    armed: bool,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut activity = self.list.activity();
            activity.fetch = FetchPhase::Idle;
            self.list.publish_loading(&activity);
            debug!("load dropped before completion");
        }
    }
}

struct MutationRelease<'a> {
    list: &'a PostListController,
}

impl Drop for MutationRelease<'_> {
    fn drop(&mut self) {
        self.list.abort_mutation();
    }
}

impl PostListController {
    /// Starts empty and idle; the front end is expected to call `load()` right away.
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        let (state, _) = watch::channel(ListState::default());
        Self {
            store,
            state,
            activity: Mutex::new(Activity::default()),
        }
    }

    pub fn state(&self) -> ListState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state.subscribe()
    }

    pub fn dismiss_error(&self) {
        self.state.send_if_modified(|state| state.last_error.take().is_some());
    }

    /// A failure keeps the previous list and sets `last_error`; nothing is retried.
    pub async fn load(&self) -> Result<LoadOutcome, StoreError> {
        {
            let mut activity = self.activity();
            match activity.fetch {
                FetchPhase::Idle => activity.fetch = FetchPhase::Running,
                FetchPhase::Running | FetchPhase::FollowUpQueued => {
                    activity.fetch = FetchPhase::FollowUpQueued;
                    debug!("load already in flight; queued a follow-up fetch");
                    return Ok(LoadOutcome::Queued);
                }
            }
            self.publish_loading(&activity);
        }
        let mut guard = FetchGuard {
            list: self,
            armed: true,
        };

        loop {
            let outcome = self.fetch_once().await;

            let follow_up = {
                let mut activity = self.activity();
                if activity.fetch == FetchPhase::FollowUpQueued {
                    activity.fetch = FetchPhase::Running;
                    true
                } else {
                    activity.fetch = FetchPhase::Idle;
                    self.publish_loading(&activity);
                    false
                }
            };
            if !follow_up {
                guard.armed = false;
                return outcome.map(|count| LoadOutcome::Loaded { count });
            }
        }
    }

    async fn fetch_once(&self) -> Result<usize, StoreError> {
        debug!("requesting posts from store");
        match self.store.get_posts().await {
            Ok(posts) => {
                let count = posts.len();
                self.state.send_modify(|state| {
                    state.posts = posts;
                    state.last_error = None;
                });
                info!(count, "loaded posts");
                Ok(count)
            }
            Err(err) => {
                warn!(error = %err, "failed to load posts");
                self.state
                    .send_modify(|state| state.last_error = Some(err.clone()));
                Err(err)
            }
        }
    }

    fn activity(&self) -> MutexGuard<'_, Activity> {
        self.activity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_loading(&self, activity: &Activity) {
        let busy = activity.busy();
        self.state.send_if_modified(|state| {
            let changed = state.loading != busy;
            state.loading = busy;
            changed
        });
    }
}

#[async_trait]
impl ListRefresher for PostListController {
    fn begin_mutation(&self) {
        let mut activity = self.activity();
        activity.mutations += 1;
        self.publish_loading(&activity);
    }

    fn abort_mutation(&self) {
        let mut activity = self.activity();
        activity.mutations = activity.mutations.saturating_sub(1);
        self.publish_loading(&activity);
    }

    async fn complete_mutation(&self) -> Result<LoadOutcome, StoreError> {
        let _release = MutationRelease { list: self };
        self.load().await
    }
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;
