#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

// =============================================================
// Helpers
// =============================================================

fn empty_board() -> Board {
    Board { board_id: "BOARD-1".into(), data: BoardData { title: Some("Test".into()), items: Vec::new() } }
}

fn loaded() -> BoardStore {
    let mut store = BoardStore::new();
    store.load(empty_board());
    store
}

fn with_list(store: &mut BoardStore, tasks: &[&str]) -> (ItemId, Vec<TaskId>) {
    let list = store.add_todo_list(Placement::at(0.0, 0.0)).unwrap().id;
    let ids = tasks.iter().map(|t| store.add_task(&list, t).unwrap().task_id).collect();
    (list, ids)
}

fn task_texts(store: &BoardStore, list: &str) -> Vec<String> {
    store.item(list).unwrap().todo().unwrap().tasks.iter().map(|t| t.content.clone()).collect()
}

// =============================================================
// Unloaded store
// =============================================================

#[test]
fn every_mutation_is_noop_without_board() {
    let mut store = BoardStore::new();
    assert!(store.add_note("x", "yellow", Placement::at(0.0, 0.0)).is_none());
    assert!(!store.update_item("STICKY-1", &ItemPatch::position(1.0, 1.0)));
    assert!(store.delete_selected().is_none());
    assert!(!store.set_title("t"));
    assert!(store.add_task("TODO-1", "task").is_none());
    assert!(!store.move_task_between_lists("A", "T", "B", 0));
    assert!(store.add_link_placeholder("https://example.com", Placement::at(0.0, 0.0)).is_none());
    assert!(!store.resolve_link_metadata("LINK-1", &LinkMetadata::Unavailable));
    assert!(!store.restore(BoardData::default()));
    assert!(store.items().is_empty());
    assert_eq!(store.revision(), 0);
}

#[test]
fn view_transform_does_not_bump_revision() {
    let mut store = loaded();
    store.set_scale(1.5);
    store.set_translate(10.0, 20.0);
    assert_eq!(store.revision(), 0);
    assert_eq!(store.camera().zoom, 1.5);
    assert_eq!(store.camera().pan_x, 10.0);
    store.set_scale(100.0);
    assert_eq!(store.camera().zoom, crate::consts::MAX_ZOOM);
}

// =============================================================
// Items
// =============================================================

#[test]
fn add_then_update_always_finds_item() {
    let mut store = loaded();
    for _ in 0..50 {
        let item = store.add_note("n", "yellow", Placement::at(0.0, 0.0)).unwrap();
        assert!(store.update_item(&item.id, &ItemPatch::position(5.0, 5.0)));
    }
}

#[test]
fn add_item_uses_kind_prefix_and_default_size() {
    let mut store = loaded();
    let todo = store.add_todo_list(Placement::at(10.0, 20.0)).unwrap();
    assert!(todo.id.starts_with("TODO-"));
    assert_eq!((todo.width, todo.height), ItemKind::Todo.default_size());
    assert_eq!(todo.todo().unwrap().title, "Todo List");

    let timer = store.add_timer(Placement::sized(0.0, 0.0, 320.0, 180.0)).unwrap();
    assert_eq!((timer.width, timer.height), (320.0, 180.0));
    assert_eq!(timer.content, ItemContent::Timer(TimerContent::default()));
}

#[test]
fn ids_are_unique() {
    let mut store = loaded();
    for _ in 0..200 {
        store.add_text_widget(Placement::at(0.0, 0.0));
    }
    let mut ids: Vec<_> = store.items().iter().map(|i| i.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 200);
}

#[test]
fn mutations_bump_revision() {
    let mut store = loaded();
    let note = store.add_note("a", "yellow", Placement::at(0.0, 0.0)).unwrap();
    let r1 = store.revision();
    assert!(store.update_note_content(&note.id, Some("b"), None));
    assert!(store.revision() > r1);
    assert_eq!(store.item(&note.id).unwrap().content, ItemContent::Note(NoteContent { text: "b".into(), color: "yellow".into() }));
}

#[test]
fn update_missing_item_is_silent_noop() {
    let mut store = loaded();
    let rev = store.revision();
    assert!(!store.update_item("STICKY-NOPE", &ItemPatch::position(1.0, 2.0)));
    assert_eq!(store.revision(), rev);
}

#[test]
fn kind_specific_updates_reject_other_kinds() {
    let mut store = loaded();
    let note = store.add_note("a", "yellow", Placement::at(0.0, 0.0)).unwrap();
    assert!(!store.update_todo_title(&note.id, "x"));
    assert!(!store.update_timer_settings(&note.id, Some(TimerType::LongBreak), None));
    assert!(!store.update_text_widget(&note.id, "x"));
}

#[test]
fn timer_settings_update_only_given_fields() {
    let mut store = loaded();
    let timer = store.add_timer(Placement::at(0.0, 0.0)).unwrap();
    assert!(store.update_timer_settings(&timer.id, Some(TimerType::ShortBreak), None));
    assert!(store.update_timer_settings(&timer.id, None, Some(5.0)));
    assert_eq!(
        store.item(&timer.id).unwrap().content,
        ItemContent::Timer(TimerContent { timer_type: Some(TimerType::ShortBreak), duration: Some(5.0) })
    );
}

#[test]
fn text_widget_and_title_updates() {
    let mut store = loaded();
    let text = store.add_text_widget(Placement::at(0.0, 0.0)).unwrap();
    assert!(store.update_text_widget(&text.id, "hello"));
    assert_eq!(store.item(&text.id).unwrap().content, ItemContent::Text(TextContent { text: "hello".into() }));
    assert!(store.set_title("Renamed"));
    assert_eq!(store.title(), Some("Renamed"));
}

#[test]
fn lock_and_position_helpers() {
    let mut store = loaded();
    let note = store.add_note("a", "yellow", Placement::at(0.0, 0.0)).unwrap();
    assert!(store.set_item_lock(&note.id, true));
    assert!(store.item(&note.id).unwrap().is_locked());
    assert!(store.update_item_position(&note.id, Placement::at(7.0, 8.0)));
    let item = store.item(&note.id).unwrap();
    assert_eq!((item.x_position, item.y_position, item.width), (7.0, 8.0, 300.0));
}

// =============================================================
// Selection / delete
// =============================================================

#[test]
fn selection_only_accepts_existing_items() {
    let mut store = loaded();
    let note = store.add_note("a", "yellow", Placement::at(0.0, 0.0)).unwrap();
    assert!(!store.set_selected_id(Some("STICKY-MISSING")));
    assert!(store.set_selected_id(Some(&note.id)));
    assert!(!store.set_selected_id(Some(&note.id)));
    assert_eq!(store.selected_id(), Some(note.id.as_str()));
    assert!(store.set_selected_id(None));
    assert_eq!(store.selected_id(), None);
}

#[test]
fn delete_selected_removes_and_clears() {
    let mut store = loaded();
    let a = store.add_note("a", "yellow", Placement::at(0.0, 0.0)).unwrap();
    let b = store.add_note("b", "yellow", Placement::at(0.0, 0.0)).unwrap();
    store.set_selected_id(Some(&a.id));
    assert_eq!(store.delete_selected(), Some(a.id.clone()));
    assert!(store.item(&a.id).is_none());
    assert!(store.item(&b.id).is_some());
    assert_eq!(store.selected_id(), None);
    assert!(store.delete_selected().is_none());
}

#[test]
fn restore_drops_dangling_selection() {
    let mut store = loaded();
    let a = store.add_note("a", "yellow", Placement::at(0.0, 0.0)).unwrap();
    store.set_selected_id(Some(&a.id));
    assert!(store.restore(BoardData { title: None, items: Vec::new() }));
    assert_eq!(store.selected_id(), None);
    assert!(store.items().is_empty());
}

// =============================================================
// Todo lists
// =============================================================

#[test]
fn add_task_rejects_blank_text() {
    let mut store = loaded();
    let (list, _) = with_list(&mut store, &[]);
    assert!(store.add_task(&list, "   ").is_none());
    let task = store.add_task(&list, "write tests").unwrap();
    assert!(task.task_id.starts_with("TASK-"));
    assert!(!task.completed);
}

#[test]
fn task_update_toggle_delete() {
    let mut store = loaded();
    let (list, ids) = with_list(&mut store, &["a", "b"]);
    assert!(store.update_task(&list, &ids[0], "A"));
    assert!(!store.update_task(&list, &ids[0], ""));
    assert!(store.toggle_task_completion(&list, &ids[1]));
    assert!(store.item(&list).unwrap().todo().unwrap().tasks[1].completed);
    assert!(store.delete_task(&list, &ids[0]));
    assert!(!store.delete_task(&list, &ids[0]));
    assert_eq!(task_texts(&store, &list), vec!["b"]);
}

#[test]
fn reorder_requires_permutation() {
    let mut store = loaded();
    let (list, ids) = with_list(&mut store, &["a", "b", "c"]);
    assert!(!store.reorder_tasks(&list, &[ids[0].clone(), ids[1].clone()]));
    assert!(!store.reorder_tasks(&list, &[ids[0].clone(), ids[0].clone(), ids[1].clone()]));
    assert_eq!(task_texts(&store, &list), vec!["a", "b", "c"]);
    assert!(store.reorder_tasks(&list, &[ids[2].clone(), ids[0].clone(), ids[1].clone()]));
    assert_eq!(task_texts(&store, &list), vec!["c", "a", "b"]);
}

#[test]
fn move_task_within_list() {
    let mut store = loaded();
    let (list, _) = with_list(&mut store, &["a", "b", "c"]);
    assert!(store.move_task(&list, 0, 2));
    assert_eq!(task_texts(&store, &list), vec!["b", "c", "a"]);
    assert!(store.move_task(&list, 2, 99));
    assert_eq!(task_texts(&store, &list), vec!["b", "c", "a"]);
    assert!(!store.move_task(&list, 5, 0));
}

#[test]
fn move_between_lists_keeps_identity_and_order() {
    let mut store = loaded();
    let (src, src_ids) = with_list(&mut store, &["a", "b"]);
    let (dst, _) = with_list(&mut store, &["x", "y"]);
    store.toggle_task_completion(&src, &src_ids[1]);

    assert!(store.move_task_between_lists(&src, &src_ids[1], &dst, 1));
    assert_eq!(task_texts(&store, &src), vec!["a"]);
    assert_eq!(task_texts(&store, &dst), vec!["x", "b", "y"]);
    let moved = &store.item(&dst).unwrap().todo().unwrap().tasks[1];
    assert_eq!(moved.task_id, src_ids[1]);
    assert!(moved.completed);
}

#[test]
fn move_between_lists_clamps_index() {
    let mut store = loaded();
    let (src, ids) = with_list(&mut store, &["a"]);
    let (dst, _) = with_list(&mut store, &["x"]);
    assert!(store.move_task_between_lists(&src, &ids[0], &dst, 42));
    assert_eq!(task_texts(&store, &dst), vec!["x", "a"]);
}

#[test]
fn move_to_invalid_target_leaves_task_in_source() {
    let mut store = loaded();
    let (src, ids) = with_list(&mut store, &["a"]);
    let note = store.add_note("n", "yellow", Placement::at(0.0, 0.0)).unwrap();
    let rev = store.revision();
    assert!(!store.move_task_between_lists(&src, &ids[0], &note.id, 0));
    assert!(!store.move_task_between_lists(&src, &ids[0], "TODO-MISSING", 0));
    assert!(!store.move_task_between_lists(&src, "TASK-MISSING", &src, 0));
    assert_eq!(task_texts(&store, &src), vec!["a"]);
    assert_eq!(store.revision(), rev);
}

#[test]
fn move_within_same_list_reorders() {
    let mut store = loaded();
    let (list, ids) = with_list(&mut store, &["a", "b", "c"]);
    assert!(store.move_task_between_lists(&list, &ids[0], &list, 2));
    assert_eq!(task_texts(&store, &list), vec!["b", "c", "a"]);
}

#[test]
fn task_drag_is_scoped_value() {
    let mut store = loaded();
    let (src, ids) = with_list(&mut store, &["a"]);
    let (dst, _) = with_list(&mut store, &[]);
    assert!(TaskDrag::begin(&store, &src, "TASK-MISSING").is_none());
    let drag = TaskDrag::begin(&store, &src, &ids[0]).unwrap();
    assert!(drag.drop_on(&mut store, &dst, 0));
    assert_eq!(task_texts(&store, &dst), vec!["a"]);

    // abandoned drags change nothing
    let abandoned = TaskDrag::begin(&store, &dst, &ids[0]);
    drop(abandoned);
    assert_eq!(task_texts(&store, &dst), vec!["a"]);
}

// =============================================================
// Links
// =============================================================

#[test]
fn link_placeholder_then_html_metadata() {
    let mut store = loaded();
    let item = store.add_link_placeholder("https://example.com", Placement::at(0.0, 0.0)).unwrap();
    let ItemContent::Link(LinkContent::Page(page)) = &item.content else {
        panic!("expected page link");
    };
    assert!(page.description.contains("Loading"));
    assert_eq!(page.title, "Link to example.com");

    let metadata = LinkMetadata::from_wire("html", &json!({ "title": "Example" }));
    assert!(store.resolve_link_metadata(&item.id, &metadata));
    let ItemContent::Link(LinkContent::Page(page)) = &store.item(&item.id).unwrap().content else {
        panic!("expected page link");
    };
    assert_eq!(page.title, "Example");
    assert_eq!(page.description, "A link to example.com");
}

#[test]
fn link_placeholder_rejects_non_web_urls() {
    let mut store = loaded();
    assert!(store.add_link_placeholder("ftp://example.com", Placement::at(0.0, 0.0)).is_none());
    assert!(store.add_link_placeholder("not a url", Placement::at(0.0, 0.0)).is_none());
}

#[test]
fn link_failure_falls_back() {
    let mut store = loaded();
    let item = store.add_link_placeholder("https://example.com/a", Placement::at(0.0, 0.0)).unwrap();
    assert!(store.resolve_link_metadata(&item.id, &LinkMetadata::Unavailable));
    let ItemContent::Link(LinkContent::Page(page)) = &store.item(&item.id).unwrap().content else {
        panic!("expected page link");
    };
    assert_eq!(page.description, "A link to example.com");
    assert!(!page.description.contains("Loading"));
}

#[test]
fn link_oembed_replaces_content_and_size() {
    let mut store = loaded();
    let item = store.add_link_placeholder("https://youtube.com/watch?v=1", Placement::at(0.0, 0.0)).unwrap();
    let metadata = LinkMetadata::from_wire(
        "oembed",
        &json!({ "html": "<iframe/>", "width": 480, "height": 270, "type": "video", "thumbnail_url": "t.jpg" }),
    );
    assert!(store.resolve_link_metadata(&item.id, &metadata));
    let item = store.item(&item.id).unwrap();
    assert_eq!((item.width, item.height), (480.0, 270.0));
    let ItemContent::Link(LinkContent::Embed(embed)) = &item.content else {
        panic!("expected embed link");
    };
    assert_eq!(embed.embed_type, "video");
    assert_eq!(embed.url, "https://youtube.com/watch?v=1");
}

#[test]
fn late_metadata_for_deleted_item_is_noop() {
    let mut store = loaded();
    let item = store.add_link_placeholder("https://example.com", Placement::at(0.0, 0.0)).unwrap();
    store.set_selected_id(Some(&item.id));
    store.delete_selected();
    let rev = store.revision();
    assert!(!store.resolve_link_metadata(&item.id, &LinkMetadata::Unavailable));
    assert_eq!(store.revision(), rev);
}

#[test]
fn metadata_from_wire_variants() {
    assert_eq!(LinkMetadata::from_wire("error", &json!({})), LinkMetadata::Unavailable);
    assert_eq!(
        LinkMetadata::from_wire("fallback", &json!({ "title": "example.com", "url": "https://example.com" })),
        LinkMetadata::Page { title: Some("example.com".into()), image: None, description: None }
    );
    let LinkMetadata::Embed { width, height, .. } =
        LinkMetadata::from_wire("oembed", &json!({ "thumbnail_width": 320, "thumbnail_height": 180 }))
    else {
        panic!("expected embed");
    };
    assert_eq!((width, height), (Some(320.0), Some(180.0)));
}

// =============================================================
// Paste
// =============================================================

#[test]
fn classify_paste_rules() {
    assert_eq!(classify_paste("https://example.com"), Some(PasteKind::Link("https://example.com".into())));
    assert_eq!(classify_paste("short"), Some(PasteKind::Text("short".into())));
    let long = "x".repeat(101);
    assert_eq!(classify_paste(&long), Some(PasteKind::Note(long.clone())));
    assert_eq!(classify_paste("mailto:someone@example.com"), Some(PasteKind::Text("mailto:someone@example.com".into())));
    assert_eq!(classify_paste("  \n "), None);
}

#[test]
fn paste_creates_centred_item() {
    let mut store = loaded();
    let item = store.paste_text("hello", Point::new(0.0, 0.0)).unwrap();
    assert_eq!(item.kind(), ItemKind::Text);
    assert_eq!((item.x_position, item.y_position), (-150.0, -50.0));
    assert_eq!(item.content, ItemContent::Text(TextContent { text: "hello".into() }));

    let link = store.paste_text("https://example.com", Point::new(100.0, 100.0)).unwrap();
    assert_eq!(link.kind(), ItemKind::Link);
    assert_eq!((link.x_position, link.y_position), (-100.0, 0.0));
}
