#![allow(clippy::float_cmp)]

use std::sync::atomic::Ordering;
use std::time::Duration;

use canvas::camera::Point;
use canvas::doc::{ItemContent, LinkContent, Placement};
use canvas::input::{Modifiers, WheelDelta};
use serde_json::json;

use super::*;
use crate::crypto;
use crate::mock_api::MockApi;
use crate::persistence::StaticPassword;

// =============================================================
// Helpers
// =============================================================

fn session(api: &Arc<MockApi>) -> BoardSession<MockApi> {
    BoardSession::new(Arc::clone(api), &ClientConfig::default(), BoardRegistry::in_memory())
}

async fn loaded(api: &Arc<MockApi>) -> BoardSession<MockApi> {
    let mut s = session(api);
    s.load("B1", &StaticPassword(None)).await.unwrap();
    s.with_engine(|engine| engine.set_viewport(800.0, 600.0));
    s
}

fn note_at(s: &mut BoardSession<MockApi>, x: f64) -> ItemId {
    s.mutate(|store| store.add_note("n", "yellow", Placement::sized(x, 0.0, 300.0, 200.0))).unwrap().id
}

fn page(item: &BoardItem) -> (&str, &str) {
    match &item.content {
        ItemContent::Link(LinkContent::Page(page)) => (page.title.as_str(), page.description.as_str()),
        other => panic!("expected page link, got {other:?}"),
    }
}

async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
}

// =============================================================
// Debounced saving
// =============================================================

#[tokio::test(start_paused = true)]
async fn ten_rapid_updates_produce_one_save_with_final_state() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    let id = note_at(&mut s, 0.0);

    for i in 1..=10 {
        s.mutate(|store| store.update_item_position(&id, Placement::at(f64::from(i) * 10.0, 0.0)));
        advance(100).await;
        assert!(!s.poll_save().await.unwrap());
    }
    assert_eq!(api.save_count(), 0);

    advance(1000).await;
    assert!(s.poll_save().await.unwrap());
    assert!(!s.poll_save().await.unwrap());

    let saves = api.saves();
    assert_eq!(saves.len(), 1);
    let saved = saves[0].clone().into_board().unwrap();
    assert_eq!(saved.data.items[0].x_position, 100.0);
}

#[tokio::test(start_paused = true)]
async fn camera_moves_never_schedule_saves() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    s.dispatch(&InputEvent::Wheel {
        pos: Point::new(10.0, 10.0),
        delta: WheelDelta { dx: 0.0, dy: -1.0 },
        modifiers: Modifiers { ctrl: true, ..Default::default() },
    });
    assert!(s.store().camera().zoom > 1.0);
    assert!(!s.has_pending_save());
    advance(5000).await;
    assert!(!s.poll_save().await.unwrap());
    assert_eq!(api.save_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn flush_saves_immediately_and_cancels_debounce() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    note_at(&mut s, 0.0);
    s.flush().await.unwrap();
    assert_eq!(api.save_count(), 1);
    assert!(!s.has_pending_save());
    advance(2000).await;
    assert!(!s.poll_save().await.unwrap());
    assert_eq!(api.save_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn save_failure_is_recorded_then_cleared_by_next_save() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    api.fail_saves.store(true, Ordering::SeqCst);
    note_at(&mut s, 0.0);
    advance(1000).await;
    assert!(s.poll_save().await.is_err());
    assert_eq!(s.store().error(), Some(SAVE_FAILED));
    assert!(!s.has_pending_save());

    api.fail_saves.store(false, Ordering::SeqCst);
    note_at(&mut s, 400.0);
    advance(1000).await;
    assert!(s.poll_save().await.unwrap());
    assert_eq!(s.store().error(), None);
    assert_eq!(api.saves()[0].clone().into_board().unwrap().data.items.len(), 2);
}

#[tokio::test]
async fn flush_without_board_is_not_loaded() {
    let api = Arc::new(MockApi::default());
    let mut s = session(&api);
    assert!(matches!(s.flush().await, Err(PersistError::NotLoaded)));
}

// =============================================================
// Loading
// =============================================================

#[tokio::test]
async fn load_failure_leaves_board_unloaded_with_error() {
    let api = Arc::new(MockApi::default());
    let mut s = session(&api);
    assert!(s.load("missing", &StaticPassword(None)).await.is_err());
    assert!(s.store().board().is_none());
    assert_eq!(s.store().error(), Some(LOAD_FAILED));

    assert!(s.mutate(|store| store.add_note("x", "yellow", Placement::at(0.0, 0.0))).is_none());
    assert!(!s.has_pending_save());
}

#[tokio::test]
async fn load_remembers_board_in_registry() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let s = loaded(&api).await;
    assert_eq!(s.registry().last().unwrap().board_id, "B1");
    assert_eq!(s.registry().last().unwrap().title, "Mock board");
}

#[tokio::test(start_paused = true)]
async fn switching_boards_saves_pending_edit_first() {
    let api = Arc::new(MockApi::empty_board("B1"));
    api.boards.lock().unwrap().insert("B2".into(), json!({"title": "Other", "items": []}));
    let mut s = loaded(&api).await;
    note_at(&mut s, 40.0);
    assert!(s.has_pending_save());

    s.load("B2", &StaticPassword(None)).await.unwrap();
    let saves = api.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].board_id, "B1");
    assert_eq!(saves[0].clone().into_board().unwrap().data.items.len(), 1);

    advance(2000).await;
    assert!(!s.poll_save().await.unwrap());
    assert_eq!(s.store().board_id(), Some("B2"));
    assert_eq!(api.save_count(), 1);
}

#[tokio::test]
async fn load_entry_without_history_creates_a_board() {
    let api = Arc::new(MockApi::default());
    let mut s = session(&api);
    s.load("load", &StaticPassword(None)).await.unwrap();
    assert_eq!(s.store().board_id(), Some("SEEDED"));
    assert_eq!(s.registry().get("SEEDED").unwrap().title, "New TackPad");
}

#[tokio::test]
async fn set_title_updates_board_and_registry() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    assert!(s.set_title("Roadmap"));
    assert_eq!(s.store().title(), Some("Roadmap"));
    assert_eq!(s.registry().get("B1").unwrap().title, "Roadmap");
    assert!(s.has_pending_save());
}

#[tokio::test]
async fn encrypted_board_saves_back_encrypted() {
    let envelope = crypto::encrypt(&json!({"title": "Vault", "items": []}), "pw").unwrap();
    let api = Arc::new(MockApi::with_board("B1", serde_json::to_value(envelope).unwrap()));
    let mut s = session(&api);
    s.load("B1", &StaticPassword(Some("pw".into()))).await.unwrap();
    assert!(s.is_encrypted());
    assert_eq!(s.store().title(), Some("Vault"));

    note_at(&mut s, 0.0);
    s.flush().await.unwrap();
    let sent = &api.saves()[0].data;
    assert!(crypto::is_encrypted(sent));
    assert!(!sent.to_string().contains("Vault"));
}

#[tokio::test]
async fn decrypt_failure_resets_everything() {
    let envelope = crypto::encrypt(&json!({"items": []}), "right").unwrap();
    let api = Arc::new(MockApi::with_board("B1", serde_json::to_value(envelope).unwrap()));
    let mut s = session(&api);
    let err = s.load("B1", &StaticPassword(Some("wrong".into()))).await.unwrap_err();

    assert!(err.is_decrypt_failure());
    assert!(s.store().board().is_none());
    assert_eq!(s.store().error(), Some(DECRYPT_FAILED));
    assert!(!s.is_encrypted());
    assert!(!s.has_pending_save());
    assert!(!s.can_undo());
}

#[tokio::test]
async fn setting_password_schedules_reencrypted_save() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    s.set_password(Some("pw".into()));
    assert!(s.has_pending_save());
    s.flush().await.unwrap();
    assert!(crypto::is_encrypted(&api.saves()[0].data));
}

// =============================================================
// Links
// =============================================================

#[tokio::test]
async fn link_item_is_placeholder_until_metadata_resolves() {
    let api = Arc::new(MockApi::empty_board("B1"));
    api.set_metadata("html", json!({"title": "Example"}));
    let mut s = loaded(&api).await;

    let item = s.add_link_item("https://example.com").unwrap();
    assert!(page(&item).1.contains("Loading"));

    let completion = s.next_completion().await.unwrap();
    assert!(s.handle_completion(completion));
    assert_eq!(page(s.store().item(&item.id).unwrap()).0, "Example");
    assert_eq!(api.metadata_requests.lock().unwrap().as_slice(), ["https://example.com"]);
}

#[tokio::test]
async fn metadata_failure_falls_back_to_hostname() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    let item = s.add_link_item("https://example.com/page").unwrap();

    let completion = s.next_completion().await.unwrap();
    s.handle_completion(completion);
    let (title, description) = page(s.store().item(&item.id).unwrap());
    assert_eq!(title, "Link to example.com");
    assert_eq!(description, "A link to example.com");
}

#[tokio::test]
async fn metadata_for_deleted_item_is_ignored() {
    let api = Arc::new(MockApi::empty_board("B1"));
    api.set_metadata("html", json!({"title": "Example"}));
    let mut s = loaded(&api).await;
    let item = s.add_link_item("https://example.com").unwrap();
    s.mutate(|store| {
        store.set_selected_id(Some(&item.id));
        store.delete_selected()
    });

    let completion = s.next_completion().await.unwrap();
    assert!(!s.handle_completion(completion));
    assert!(s.store().items().is_empty());
}

#[tokio::test]
async fn pasted_url_fetches_metadata() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    let actions = s.paste("  https://example.com/x  ");
    assert!(matches!(actions[0], Action::ItemCreated(_)));
    s.next_completion().await.unwrap();
    assert_eq!(api.metadata_requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn non_link_link_request_is_rejected() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    assert!(s.add_link_item("ftp://example.com").is_none());
    assert!(!s.has_pending_save());
}

// =============================================================
// History
// =============================================================

#[tokio::test(start_paused = true)]
async fn undo_and_redo_walk_debounced_snapshots() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    let id = note_at(&mut s, 0.0);
    advance(600).await;
    s.poll_save().await.unwrap();

    s.mutate(|store| store.update_item_position(&id, Placement::at(500.0, 0.0)));
    advance(600).await;
    s.poll_save().await.unwrap();

    assert!(s.undo());
    assert_eq!(s.store().item(&id).unwrap().x_position, 0.0);
    assert!(s.undo());
    assert!(s.store().items().is_empty());
    assert!(!s.undo());

    assert!(s.redo());
    assert_eq!(s.store().item(&id).unwrap().x_position, 0.0);
    assert!(s.has_pending_save());
}

#[tokio::test(start_paused = true)]
async fn undo_commits_pending_snapshot_first() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    note_at(&mut s, 0.0);
    assert!(s.can_undo());
    assert!(s.undo());
    assert!(s.store().items().is_empty());
    assert!(s.can_redo());
}

// =============================================================
// Run loop
// =============================================================

#[tokio::test(start_paused = true)]
async fn run_flushes_pending_save_on_close() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    let (tx, rx) = mpsc::channel(16);
    let (actions_tx, mut actions_rx) = mpsc::unbounded_channel();

    for i in 0..5 {
        tx.send(Command::AddNote(format!("note {i}"))).await.unwrap();
    }
    drop(tx);
    s.run(rx, actions_tx).await.unwrap();

    assert_eq!(api.save_count(), 1);
    assert_eq!(api.saves()[0].clone().into_board().unwrap().data.items.len(), 5);
    assert!(matches!(actions_rx.recv().await, Some(Action::ItemCreated(_))));
}

#[tokio::test(start_paused = true)]
async fn run_saves_after_quiet_period() {
    let api = Arc::new(MockApi::empty_board("B1"));
    let mut s = loaded(&api).await;
    let (tx, rx) = mpsc::channel(16);
    let (actions_tx, _actions_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        let result = s.run(rx, actions_tx).await;
        (s, result)
    });

    tx.send(Command::AddNote("one".into())).await.unwrap();
    tx.send(Command::SetTitle("Loop".into())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(api.save_count(), 1);

    drop(tx);
    let (s, result) = handle.await.unwrap();
    result.unwrap();
    assert_eq!(api.save_count(), 1);
    assert_eq!(s.store().title(), Some("Loop"));
}
