/// Keyboard and mouse state, advanced once per frame
///
/// winit delivers press and release events between frames. They update the
/// raw "held" sets; `InputModule::pre_update` then turns the held sets into
/// per-frame states so every module sees the same snapshot for the frame.
/// A press is latched until the next frame, so a tap shorter than a frame
/// still reads as `Down` once.

use meshlet_engine::meshlet3d::app::{Module, UpdateStatus};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// Per-frame state of one key or button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    #[default]
    Idle,
    /// Pressed this frame
    Down,
    /// Held since an earlier frame
    Repeat,
    /// Released this frame
    Up,
}

impl KeyState {
    /// Next state given whether the key is currently held
    pub fn advance(self, held: bool) -> Self {
        match (self, held) {
            (KeyState::Idle | KeyState::Up, true) => KeyState::Down,
            (KeyState::Down | KeyState::Repeat, true) => KeyState::Repeat,
            (KeyState::Down | KeyState::Repeat, false) => KeyState::Up,
            (KeyState::Idle | KeyState::Up, false) => KeyState::Idle,
        }
    }

    pub fn is_held(self) -> bool {
        matches!(self, KeyState::Down | KeyState::Repeat)
    }
}

/// Held set plus the per-frame states derived from it
#[derive(Debug)]
struct StateTable<K> {
    held: FxHashSet<K>,
    /// Pressed since the last advance, even if already released
    pressed: FxHashSet<K>,
    states: FxHashMap<K, KeyState>,
}

impl<K: Copy + Eq + Hash> StateTable<K> {
    fn new() -> Self {
        Self { held: FxHashSet::default(), pressed: FxHashSet::default(), states: FxHashMap::default() }
    }

    fn set_held(&mut self, key: K, held: bool) {
        if held {
            self.held.insert(key);
            self.pressed.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    fn advance(&mut self) {
        for &key in self.held.iter().chain(&self.pressed) {
            self.states.entry(key).or_default();
        }
        let (held, pressed) = (&self.held, &self.pressed);
        self.states.retain(|key, state| {
            *state = state.advance(held.contains(key) || pressed.contains(key));
            *state != KeyState::Idle
        });
        self.pressed.clear();
    }

    fn get(&self, key: K) -> KeyState {
        self.states.get(&key).copied().unwrap_or_default()
    }

    fn clear_held(&mut self) {
        self.held.clear();
        self.pressed.clear();
    }
}

/// Input snapshot shared by the viewer modules
#[derive(Debug)]
pub struct Input {
    keys: StateTable<KeyCode>,
    mouse_buttons: StateTable<MouseButton>,
    pending_motion: Option<(f32, f32)>,
    frame_motion: Option<(f32, f32)>,
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Input {
    pub fn new() -> Self {
        Self {
            keys: StateTable::new(),
            mouse_buttons: StateTable::new(),
            pending_motion: None,
            frame_motion: None,
        }
    }

    // ===== EVENTS =====

    pub fn key_event(&mut self, key: KeyCode, pressed: bool) {
        self.keys.set_held(key, pressed);
    }

    pub fn mouse_button_event(&mut self, button: MouseButton, pressed: bool) {
        self.mouse_buttons.set_held(button, pressed);
    }

    /// Accumulate raw mouse motion until the next frame
    pub fn mouse_motion_event(&mut self, dx: f32, dy: f32) {
        let (x, y) = self.pending_motion.unwrap_or((0.0, 0.0));
        self.pending_motion = Some((x + dx, y + dy));
    }

    /// Focus loss: every key counts as released, so none stays stuck
    pub fn focus_lost(&mut self) {
        self.keys.clear_held();
        self.mouse_buttons.clear_held();
    }

    // ===== FRAME =====

    /// Derive this frame's states from what is held now
    pub fn advance_frame(&mut self) {
        self.keys.advance();
        self.mouse_buttons.advance();
        self.frame_motion = self.pending_motion.take();
    }

    // ===== QUERIES =====

    pub fn key(&self, key: KeyCode) -> KeyState {
        self.keys.get(key)
    }

    pub fn mouse_button(&self, button: MouseButton) -> KeyState {
        self.mouse_buttons.get(button)
    }

    /// Mouse delta of this frame, `None` if the mouse did not move
    pub fn mouse_motion(&self) -> Option<(f32, f32)> {
        self.frame_motion
    }
}

/// Advances the shared input and requests a stop on Escape
pub struct InputModule {
    input: Rc<RefCell<Input>>,
}

impl InputModule {
    pub fn new(input: Rc<RefCell<Input>>) -> Self {
        Self { input }
    }
}

impl Module for InputModule {
    fn name(&self) -> &str {
        "Input"
    }

    fn pre_update(&mut self, _dt: f32) -> UpdateStatus {
        let mut input = self.input.borrow_mut();
        input.advance_frame();

        if input.key(KeyCode::Escape) == KeyState::Down {
            UpdateStatus::Stop
        } else {
            UpdateStatus::Continue
        }
    }
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
