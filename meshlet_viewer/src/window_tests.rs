//! Unit tests for window.rs

use super::*;

#[test]
fn test_resize_is_reported_once() {
    let mut state = WindowState::new((700, 700));
    state.resized(800, 600);

    assert_eq!(state.size(), (800, 600));
    assert_eq!(state.take_resize(), Some((800, 600)));
    assert_eq!(state.take_resize(), None);
}

#[test]
fn test_same_size_is_not_a_resize() {
    let mut state = WindowState::new((700, 700));
    state.resized(700, 700);
    assert_eq!(state.take_resize(), None);
}

#[test]
fn test_resizes_collapse_to_last() {
    let mut state = WindowState::new((700, 700));
    state.resized(640, 480);
    state.resized(0, 0);
    assert_eq!(state.take_resize(), Some((0, 0)));
}

#[test]
fn test_close_request_stops() {
    let state = Rc::new(RefCell::new(WindowState::new((700, 700))));
    let mut module = WindowModule::new(Rc::clone(&state), "test");

    assert_eq!(module.pre_update(0.016), UpdateStatus::Continue);
    state.borrow_mut().request_close();
    assert_eq!(module.pre_update(0.016), UpdateStatus::Stop);
}
