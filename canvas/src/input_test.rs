use super::*;

// =============================================================
// Modifiers
// =============================================================

#[test]
fn modifiers_default_all_false() {
    let m = Modifiers::default();
    assert!(!m.shift);
    assert!(!m.ctrl);
    assert!(!m.alt);
    assert!(!m.meta);
}

#[test]
fn zoom_modifier_is_ctrl_or_meta() {
    assert!(Modifiers { ctrl: true, ..Default::default() }.zoom());
    assert!(Modifiers { meta: true, ..Default::default() }.zoom());
    assert!(!Modifiers { shift: true, alt: true, ..Default::default() }.zoom());
}

// =============================================================
// Button / PointerKind
// =============================================================

#[test]
fn button_variants_are_distinct() {
    assert_ne!(Button::Primary, Button::Middle);
    assert_ne!(Button::Middle, Button::Secondary);
}

#[test]
fn pointer_kind_defaults_to_mouse() {
    assert_eq!(PointerKind::default(), PointerKind::Mouse);
}

// =============================================================
// Key
// =============================================================

#[test]
fn key_new_and_as_str() {
    let k = Key::new("Escape");
    assert_eq!(k.as_str(), "Escape");
    assert_eq!(k, Key("Escape".into()));
}

// =============================================================
// Target / InputEvent
// =============================================================

#[test]
fn handle_target_carries_item_and_grip() {
    let t = Target::Handle("STICKY-1".into(), Handle::Se);
    assert_ne!(t, Target::Item("STICKY-1".into()));
    assert_ne!(t, Target::Canvas);
}

#[test]
fn events_compare_by_value() {
    let a = InputEvent::PointerUp { pointer: 1, pos: Point::new(1.0, 2.0) };
    let b = InputEvent::PointerUp { pointer: 1, pos: Point::new(1.0, 2.0) };
    assert_eq!(a, b);
    assert_ne!(a, InputEvent::PointerCancel { pointer: 1 });
}
