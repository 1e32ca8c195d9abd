//! Unit tests for application.rs
//!
//! Mock modules record every hook call into a shared journal.

use crate::app::{Application, Module, UpdateStatus};
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::rc::Rc;

// ============================================================================
// Mock module
// ============================================================================

type Journal = Rc<RefCell<Vec<String>>>;

struct MockModule {
    name: String,
    journal: Journal,
    fail_init: bool,
    fail_clean_up: bool,
    pre_update_status: UpdateStatus,
    update_status: UpdateStatus,
    post_update_status: UpdateStatus,
}

impl MockModule {
    fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            fail_init: false,
            fail_clean_up: false,
            pre_update_status: UpdateStatus::Continue,
            update_status: UpdateStatus::Continue,
            post_update_status: UpdateStatus::Continue,
        }
    }

    fn record(&self, hook: &str) {
        self.journal.borrow_mut().push(format!("{}.{}", self.name, hook));
    }
}

impl Module for MockModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self) -> Result<()> {
        self.record("init");
        if self.fail_init {
            return Err(Error::InitializationFailed(self.name.clone()));
        }
        Ok(())
    }

    fn pre_update(&mut self, _dt: f32) -> UpdateStatus {
        self.record("pre");
        self.pre_update_status
    }

    fn update(&mut self, _dt: f32) -> UpdateStatus {
        self.record("update");
        self.update_status
    }

    fn post_update(&mut self, _dt: f32) -> UpdateStatus {
        self.record("post");
        self.post_update_status
    }

    fn clean_up(&mut self) -> Result<()> {
        self.record("clean");
        if self.fail_clean_up {
            return Err(Error::BackendError(self.name.clone()));
        }
        Ok(())
    }
}

/// Module relying on every default hook
struct IdleModule;

impl Module for IdleModule {
    fn name(&self) -> &str {
        "Idle"
    }
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.borrow().clone()
}

// ============================================================================
// INIT TESTS
// ============================================================================

#[test]
fn test_init_runs_in_order() {
    let journal = Journal::default();
    let mut app = Application::new();
    app.add_module(Box::new(MockModule::new("a", &journal)));
    app.add_module(Box::new(MockModule::new("b", &journal)));

    assert!(app.init().is_ok());
    assert_eq!(entries(&journal), vec!["a.init", "b.init"]);
}

#[test]
fn test_init_stops_at_first_failure() {
    let journal = Journal::default();
    let mut failing = MockModule::new("b", &journal);
    failing.fail_init = true;

    let mut app = Application::new();
    app.add_module(Box::new(MockModule::new("a", &journal)));
    app.add_module(Box::new(failing));
    app.add_module(Box::new(MockModule::new("c", &journal)));

    let result = app.init();
    assert!(matches!(result, Err(Error::InitializationFailed(ref name)) if name == "b"));
    assert_eq!(entries(&journal), vec!["a.init", "b.init"]);
}

// ============================================================================
// UPDATE TESTS
// ============================================================================

#[test]
fn test_update_runs_passes_in_order() {
    let journal = Journal::default();
    let mut app = Application::new();
    app.add_module(Box::new(MockModule::new("a", &journal)));
    app.add_module(Box::new(MockModule::new("b", &journal)));

    assert_eq!(app.update(0.016), UpdateStatus::Continue);
    assert_eq!(
        entries(&journal),
        vec!["a.pre", "b.pre", "a.update", "b.update", "a.post", "b.post"]
    );
}

#[test]
fn test_update_returns_first_stop() {
    let journal = Journal::default();
    let mut stopping = MockModule::new("a", &journal);
    stopping.pre_update_status = UpdateStatus::Stop;

    let mut app = Application::new();
    app.add_module(Box::new(stopping));
    app.add_module(Box::new(MockModule::new("b", &journal)));

    assert_eq!(app.update(0.016), UpdateStatus::Stop);
    assert_eq!(entries(&journal), vec!["a.pre"]);
}

#[test]
fn test_update_returns_error_from_post_update() {
    let journal = Journal::default();
    let mut failing = MockModule::new("b", &journal);
    failing.post_update_status = UpdateStatus::Error;

    let mut app = Application::new();
    app.add_module(Box::new(MockModule::new("a", &journal)));
    app.add_module(Box::new(failing));

    assert_eq!(app.update(0.016), UpdateStatus::Error);
    assert_eq!(entries(&journal).last().map(String::as_str), Some("b.post"));
}

#[test]
fn test_update_error_in_update_skips_post() {
    let journal = Journal::default();
    let mut failing = MockModule::new("a", &journal);
    failing.update_status = UpdateStatus::Error;

    let mut app = Application::new();
    app.add_module(Box::new(failing));

    assert_eq!(app.update(0.016), UpdateStatus::Error);
    assert!(!entries(&journal).contains(&"a.post".to_string()));
}

// ============================================================================
// CLEAN UP TESTS
// ============================================================================

#[test]
fn test_clean_up_runs_in_reverse() {
    let journal = Journal::default();
    let mut app = Application::new();
    app.add_module(Box::new(MockModule::new("a", &journal)));
    app.add_module(Box::new(MockModule::new("b", &journal)));
    app.add_module(Box::new(MockModule::new("c", &journal)));

    assert!(app.clean_up().is_ok());
    assert_eq!(entries(&journal), vec!["c.clean", "b.clean", "a.clean"]);
}

#[test]
fn test_clean_up_stops_at_first_failure() {
    let journal = Journal::default();
    let mut failing = MockModule::new("b", &journal);
    failing.fail_clean_up = true;

    let mut app = Application::new();
    app.add_module(Box::new(MockModule::new("a", &journal)));
    app.add_module(Box::new(failing));
    app.add_module(Box::new(MockModule::new("c", &journal)));

    assert!(app.clean_up().is_err());
    assert_eq!(entries(&journal), vec!["c.clean", "b.clean"]);
}

// ============================================================================
// DEFAULT HOOKS
// ============================================================================

#[test]
fn test_default_hooks_continue() {
    let mut app = Application::new();
    app.add_module(Box::new(IdleModule));

    assert_eq!(app.module_count(), 1);
    assert!(app.init().is_ok());
    assert_eq!(app.update(1.0), UpdateStatus::Continue);
    assert!(app.clean_up().is_ok());
}

#[test]
fn test_empty_application() {
    let mut app = Application::default();
    assert!(app.init().is_ok());
    assert_eq!(app.update(0.0), UpdateStatus::Continue);
    assert!(app.clean_up().is_ok());
}
