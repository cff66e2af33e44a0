//! Client-side state for browsing and submitting posts against a remote store.

use std::sync::Arc;

pub mod composer;
pub mod error;
pub mod list;
pub mod store;

pub use composer::{ComposerState, DraftField, DraftPost, DraftRetention, PostComposer};
pub use error::{ClientError, StoreError};
pub use list::{ListRefresher, ListState, LoadOutcome, PostListController};
pub use store::{HttpPostStore, PostStore};

/// The list and the composer wired to one store, as a page would hold them.
pub struct PostBoard {
    pub list: Arc<PostListController>,
    pub composer: PostComposer,
}

impl PostBoard {
    pub fn new(store: Arc<dyn PostStore>, retention: DraftRetention) -> Self {
        let list = Arc::new(PostListController::new(Arc::clone(&store)));
        let composer = PostComposer::new(store, list.clone()).with_retention(retention);
        Self { list, composer }
    }
}

#[cfg(test)]
#[path = "tests/fake_store.rs"]
mod fake_store;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
