use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::{
    fake_store::FakePostStore,
    list::{LoadOutcome, PostListController},
};
use async_trait::async_trait;
use std::time::Duration;
use tokio::{sync::Semaphore, time::timeout};

fn wire(store: &Arc<FakePostStore>) -> (Arc<PostListController>, PostComposer) {
    let list = Arc::new(PostListController::new(store.clone()));
    let composer = PostComposer::new(store.clone(), list.clone());
    (list, composer)
}

fn fill(composer: &PostComposer, title: &str, body: &str, author: &str) {
    composer.update_field(DraftField::Title, title);
    composer.update_field(DraftField::Body, body);
    composer.update_field(DraftField::Author, author);
}

fn btc_draft() -> DraftPost {
    DraftPost {
        title: "BTC".to_string(),
        body: "rising".to_string(),
        author: "bob".to_string(),
    }
}

#[derive(Default)]
struct RecordingRefresher {
    begins: AtomicUsize,
    aborts: AtomicUsize,
    completes: AtomicUsize,
}

#[async_trait]
impl ListRefresher for RecordingRefresher {
    fn begin_mutation(&self) {
        self.begins.fetch_add(1, Ordering::SeqCst);
    }

    fn abort_mutation(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }

    async fn complete_mutation(&self) -> Result<LoadOutcome, StoreError> {
        self.completes.fetch_add(1, Ordering::SeqCst);
        Ok(LoadOutcome::Loaded { count: 1 })
    }
}

#[test]
fn update_field_overwrites_only_the_named_field() {
    let store = Arc::new(FakePostStore::default());
    let (_, composer) = wire(&store);

    composer.update_field(DraftField::Body, "rising");

    assert_eq!(
        composer.state().draft,
        DraftPost {
            title: String::new(),
            body: "rising".to_string(),
            author: String::new(),
        }
    );
}

#[test]
fn update_field_is_idempotent() {
    let store = Arc::new(FakePostStore::default());
    let (_, composer) = wire(&store);
    composer.update_field(DraftField::Title, "BTC");
    let once = composer.state().draft;
    let mut rx = composer.subscribe();

    for _ in 0..5 {
        composer.update_field(DraftField::Title, "BTC");
    }

    assert_eq!(composer.state().draft, once);
    assert!(!rx.has_changed().expect("sender alive"));
}

#[test]
fn update_field_accepts_empty_values() {
    let store = Arc::new(FakePostStore::default());
    let (_, composer) = wire(&store);
    composer.update_field(DraftField::Author, "bob");

    composer.update_field(DraftField::Author, "");

    assert_eq!(composer.state().draft, DraftPost::default());
}

#[test]
fn close_keeps_draft_by_default() {
    let store = Arc::new(FakePostStore::default());
    let (_, composer) = wire(&store);
    composer.open();
    fill(&composer, "BTC", "rising", "bob");

    composer.close();
    assert!(!composer.state().visible);
    assert_eq!(composer.state().draft, btc_draft());

    composer.open();
    assert!(composer.state().visible);
    assert_eq!(composer.state().draft, btc_draft());
}

#[test]
fn reset_on_close_policy_discards_draft() {
    let store = Arc::new(FakePostStore::default());
    let list = Arc::new(PostListController::new(store.clone()));
    let composer =
        PostComposer::new(store.clone(), list).with_retention(DraftRetention::ResetOnClose);
    composer.open();
    fill(&composer, "BTC", "rising", "bob");

    composer.close();

    let state = composer.state();
    assert!(!state.visible);
    assert_eq!(state.draft, DraftPost::default());
}

#[tokio::test]
async fn successful_submit_closes_resets_and_reloads_once() {
    let store = Arc::new(FakePostStore::default());
    let (list, composer) = wire(&store);
    list.load().await.expect("initial load");
    composer.open();
    fill(&composer, "BTC", "rising", "bob");

    let created = composer.submit().await.expect("submit");

    assert_eq!(created.title, "BTC");
    assert_eq!(
        *store.create_requests.lock().await,
        vec![shared::protocol::CreatePostRequest {
            title: "BTC".to_string(),
            body: "rising".to_string(),
            author: "bob".to_string(),
        }]
    );
    let state = composer.state();
    assert!(!state.visible);
    assert!(!state.submitting);
    assert_eq!(state.draft, DraftPost::default());
    assert_eq!(store.fetch_count(), 2, "one initial load plus one refresh");

    let list_state = list.state();
    assert_eq!(list_state.posts, vec![created]);
    assert!(!list_state.loading);
}

#[tokio::test]
async fn failed_submit_keeps_draft_and_stays_open() {
    let store = Arc::new(FakePostStore::default());
    store.fail_creates("canister rejected call").await;
    let (list, composer) = wire(&store);
    composer.open();
    fill(&composer, "BTC", "rising", "bob");

    let err = composer.submit().await.expect_err("submit must fail");

    assert!(matches!(err, ClientError::Store(StoreError::Create { .. })));
    let state = composer.state();
    assert_eq!(state.draft, btc_draft());
    assert!(state.visible);
    assert!(!state.submitting);
    assert!(state.last_error.is_some());
    assert!(!list.state().loading);
    assert_eq!(store.fetch_count(), 0, "no refresh after a failed create");
}

#[tokio::test]
async fn retry_after_failure_succeeds_and_clears_error() {
    let store = Arc::new(FakePostStore::default());
    store.fail_creates("busy").await;
    let (_, composer) = wire(&store);
    composer.open();
    fill(&composer, "BTC", "rising", "bob");
    composer.submit().await.expect_err("first attempt fails");

    store.clear_failures().await;
    composer.submit().await.expect("retry");

    let state = composer.state();
    assert_eq!(state.last_error, None);
    assert_eq!(store.create_count().await, 2);
}

#[tokio::test]
async fn loading_is_held_for_the_whole_create_and_refresh_waits_for_it() {
    let gate = Arc::new(Semaphore::new(0));
    let store = Arc::new(FakePostStore::default().gate_creates(gate.clone()));
    let (list, composer) = wire(&store);
    let composer = Arc::new(composer);
    fill(&composer, "BTC", "rising", "bob");

    let task = tokio::spawn({
        let composer = composer.clone();
        async move { composer.submit().await }
    });
    store.create_started.notified().await;

    assert!(list.state().loading);
    assert!(composer.state().submitting);
    assert_eq!(store.fetch_count(), 0, "no load before the create returns");

    gate.add_permits(1);
    task.await.expect("join").expect("submit");

    assert_eq!(store.fetch_count(), 1);
    assert!(!list.state().loading);
}

#[tokio::test]
async fn second_submit_while_pending_is_rejected() {
    let gate = Arc::new(Semaphore::new(0));
    let store = Arc::new(FakePostStore::default().gate_creates(gate.clone()));
    let (_, composer) = wire(&store);
    let composer = Arc::new(composer);
    fill(&composer, "BTC", "rising", "bob");

    let first = tokio::spawn({
        let composer = composer.clone();
        async move { composer.submit().await }
    });
    store.create_started.notified().await;

    let second = composer.submit().await;
    assert_eq!(second, Err(ClientError::SubmitInFlight));

    gate.add_permits(1);
    first.await.expect("join").expect("first submit");
    assert_eq!(store.create_count().await, 1);
}

#[tokio::test]
async fn refresh_failure_after_create_still_reports_the_post() {
    let store = Arc::new(FakePostStore::default());
    store.fail_fetches("gateway timeout").await;
    let (list, composer) = wire(&store);
    composer.open();
    fill(&composer, "BTC", "rising", "bob");

    let created = composer.submit().await.expect("create succeeded");

    assert_eq!(created.author, "bob");
    assert!(!composer.state().visible);
    let list_state = list.state();
    assert!(!list_state.loading);
    assert!(matches!(list_state.last_error, Some(StoreError::Fetch { .. })));
}

#[tokio::test]
async fn submit_signals_refresher_exactly_once_per_outcome() {
    let store = Arc::new(FakePostStore::default());
    let refresher = Arc::new(RecordingRefresher::default());
    let composer = PostComposer::new(store.clone(), refresher.clone());
    fill(&composer, "BTC", "rising", "bob");

    composer.submit().await.expect("submit");
    assert_eq!(refresher.begins.load(Ordering::SeqCst), 1);
    assert_eq!(refresher.completes.load(Ordering::SeqCst), 1);
    assert_eq!(refresher.aborts.load(Ordering::SeqCst), 0);

    store.fail_creates("nope").await;
    fill(&composer, "BTC", "rising", "bob");
    composer.submit().await.expect_err("submit must fail");
    assert_eq!(refresher.begins.load(Ordering::SeqCst), 2);
    assert_eq!(refresher.completes.load(Ordering::SeqCst), 1);
    assert_eq!(refresher.aborts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dismiss_error_clears_create_failure_only() {
    let store = Arc::new(FakePostStore::default());
    store.fail_creates("nope").await;
    let (_, composer) = wire(&store);
    fill(&composer, "BTC", "rising", "bob");
    composer.submit().await.expect_err("submit must fail");

    composer.dismiss_error();

    let state = composer.state();
    assert_eq!(state.last_error, None);
    assert_eq!(state.draft, btc_draft());
}

#[test]
fn missing_fields_reports_empty_inputs_in_form_order() {
    let mut draft = DraftPost {
        body: "rising".to_string(),
        ..DraftPost::default()
    };
    assert_eq!(
        draft.missing_fields(),
        vec![DraftField::Title, DraftField::Author]
    );
    assert!(!draft.is_complete());

    draft.title = "BTC".to_string();
    draft.author = "bob".to_string();
    assert!(draft.is_complete());
}

#[test]
fn draft_field_parses_case_insensitively() {
    assert_eq!("Title".parse::<DraftField>().expect("title"), DraftField::Title);
    assert_eq!(" body ".parse::<DraftField>().expect("body"), DraftField::Body);
    assert_eq!("AUTHOR".parse::<DraftField>().expect("author"), DraftField::Author);
    assert!("tags".parse::<DraftField>().is_err());
}


#[tokio::test]
async fn dropped_submit_releases_in_flight_flag_and_loading() {
    let gate = Arc::new(Semaphore::new(0));
    let store = Arc::new(FakePostStore::default().gate_creates(gate.clone()));
    let (list, composer) = wire(&store);
    composer.open();
    fill(&composer, "BTC", "rising", "bob");

    timeout(Duration::from_millis(20), composer.submit())
        .await
        .expect_err("create is held open");

    let state = composer.state();
    assert!(!state.submitting);
    assert!(state.visible);
    assert_eq!(state.draft, btc_draft());
    assert!(!list.state().loading);

    gate.add_permits(1);
    composer.submit().await.expect("next submit goes through");
    assert_eq!(store.create_count().await, 2);
    assert!(!list.state().loading);
}

#[tokio::test]
async fn dropped_submit_during_refresh_leaves_list_usable() {
    let gate = Arc::new(Semaphore::new(0));
    let store = Arc::new(FakePostStore::default().gate_fetches(gate.clone()));
    let (list, composer) = wire(&store);
    composer.open();
    fill(&composer, "BTC", "rising", "bob");

    timeout(Duration::from_millis(20), composer.submit())
        .await
        .expect_err("refresh is held open");

    let state = composer.state();
    assert!(!state.submitting);
    assert!(!state.visible);
    assert!(!list.state().loading);

    gate.add_permits(1);
    let outcome = list.load().await.expect("manual reload");
    assert_eq!(outcome, LoadOutcome::Loaded { count: 1 });
    assert_eq!(store.fetch_count(), 2);
}
