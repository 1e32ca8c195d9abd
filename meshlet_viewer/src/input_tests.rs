//! Unit tests for input.rs

use super::*;

// ============================================================================
// KeyState
// ============================================================================

#[test]
fn test_key_state_cycle() {
    let mut state = KeyState::Idle;
    let held = [true, true, true, false, false];
    let expected = [KeyState::Down, KeyState::Repeat, KeyState::Repeat, KeyState::Up, KeyState::Idle];

    for (held, expected) in held.into_iter().zip(expected) {
        state = state.advance(held);
        assert_eq!(state, expected);
    }
}

#[test]
fn test_key_state_press_right_after_release() {
    assert_eq!(KeyState::Up.advance(true), KeyState::Down);
}

#[test]
fn test_is_held() {
    assert!(KeyState::Down.is_held());
    assert!(KeyState::Repeat.is_held());
    assert!(!KeyState::Up.is_held());
    assert!(!KeyState::Idle.is_held());
}

// ============================================================================
// Input
// ============================================================================

#[test]
fn test_events_take_effect_on_next_frame() {
    let mut input = Input::new();
    input.key_event(KeyCode::KeyW, true);
    assert_eq!(input.key(KeyCode::KeyW), KeyState::Idle);

    input.advance_frame();
    assert_eq!(input.key(KeyCode::KeyW), KeyState::Down);

    input.advance_frame();
    assert_eq!(input.key(KeyCode::KeyW), KeyState::Repeat);

    input.key_event(KeyCode::KeyW, false);
    input.advance_frame();
    assert_eq!(input.key(KeyCode::KeyW), KeyState::Up);

    input.advance_frame();
    assert_eq!(input.key(KeyCode::KeyW), KeyState::Idle);
}

#[test]
fn test_tap_within_one_frame_reads_down_then_up() {
    let mut input = Input::new();
    input.key_event(KeyCode::Escape, true);
    input.key_event(KeyCode::Escape, false);

    input.advance_frame();
    assert_eq!(input.key(KeyCode::Escape), KeyState::Down);

    input.advance_frame();
    assert_eq!(input.key(KeyCode::Escape), KeyState::Up);

    input.advance_frame();
    assert_eq!(input.key(KeyCode::Escape), KeyState::Idle);
}

#[test]
fn test_mouse_click_within_one_frame_is_seen() {
    let mut input = Input::new();
    input.mouse_button_event(MouseButton::Left, true);
    input.mouse_button_event(MouseButton::Left, false);
    input.advance_frame();

    assert_eq!(input.mouse_button(MouseButton::Left), KeyState::Down);
}

#[test]
fn test_mouse_buttons() {
    let mut input = Input::new();
    input.mouse_button_event(MouseButton::Right, true);
    input.advance_frame();

    assert_eq!(input.mouse_button(MouseButton::Right), KeyState::Down);
    assert_eq!(input.mouse_button(MouseButton::Left), KeyState::Idle);
}

#[test]
fn test_mouse_motion_accumulates_per_frame() {
    let mut input = Input::new();
    input.mouse_motion_event(2.0, -1.0);
    input.mouse_motion_event(3.0, 4.0);
    input.advance_frame();
    assert_eq!(input.mouse_motion(), Some((5.0, 3.0)));

    input.advance_frame();
    assert_eq!(input.mouse_motion(), None);
}

#[test]
fn test_focus_lost_releases_keys() {
    let mut input = Input::new();
    input.key_event(KeyCode::ShiftLeft, true);
    input.advance_frame();
    input.focus_lost();
    input.advance_frame();

    assert_eq!(input.key(KeyCode::ShiftLeft), KeyState::Up);
}

// ============================================================================
// InputModule
// ============================================================================

#[test]
fn test_escape_stops() {
    let input = Rc::new(RefCell::new(Input::new()));
    let mut module = InputModule::new(Rc::clone(&input));

    assert_eq!(module.pre_update(0.016), UpdateStatus::Continue);
    input.borrow_mut().key_event(KeyCode::Escape, true);
    assert_eq!(module.pre_update(0.016), UpdateStatus::Stop);
}
