use super::*;

fn titled(title: &str) -> BoardData {
    BoardData { title: Some(title.into()), items: Vec::new() }
}

#[test]
fn undo_redo_walk_the_timeline() {
    let mut h = History::default();
    h.reset(titled("a"));
    assert!(h.commit(titled("b")));
    assert!(h.commit(titled("c")));

    assert_eq!(h.undo(), Some(titled("b")));
    assert_eq!(h.undo(), Some(titled("a")));
    assert_eq!(h.undo(), None);
    assert!(h.can_redo());
    assert_eq!(h.redo(), Some(titled("b")));
    assert_eq!(h.redo(), Some(titled("c")));
    assert_eq!(h.redo(), None);
}

#[test]
fn identical_commit_is_ignored() {
    let mut h = History::default();
    h.reset(titled("a"));
    assert!(!h.commit(titled("a")));
    assert!(!h.can_undo());
}

#[test]
fn commit_after_undo_drops_redo_branch() {
    let mut h = History::default();
    h.reset(titled("a"));
    h.commit(titled("b"));
    h.undo();
    h.commit(titled("x"));
    assert!(!h.can_redo());
    assert_eq!(h.undo(), Some(titled("a")));
}

#[test]
fn capacity_bounds_undo_depth() {
    let mut h = History::with_capacity(3);
    h.reset(titled("0"));
    for i in 1..=10 {
        h.commit(titled(&i.to_string()));
    }
    assert_eq!(h.len(), 3);
    assert_eq!(h.undo(), Some(titled("9")));
    assert_eq!(h.undo(), Some(titled("8")));
    assert_eq!(h.undo(), Some(titled("7")));
    assert_eq!(h.undo(), None);
}

#[test]
fn first_commit_without_reset_has_nothing_to_undo() {
    let mut h = History::default();
    assert!(h.commit(titled("a")));
    assert!(h.is_empty());
    assert!(h.undo().is_none());
}
