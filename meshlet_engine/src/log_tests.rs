//! Unit tests for log.rs
//!
//! Tests LogSeverity ordering, LogEntry, DefaultLogger output paths and the
//! error-producing macros.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::meshlet3d::{Engine, Error};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "meshlet3d::test".to_string(),
        message: format!("{:?} message", severity),
        file,
        line,
    }
}

/// Captures (severity, message) pairs
struct CaptureLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String)>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push((entry.severity, entry.message.clone()));
    }
}

fn capture() -> Arc<Mutex<Vec<(LogSeverity, String)>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_debug_names() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_with_location() {
    let e = entry(LogSeverity::Error, Some("vulkan_frame.rs"), Some(42));
    assert_eq!(e.source, "meshlet3d::test");
    assert_eq!(e.file, Some("vulkan_frame.rs"));
    assert_eq!(e.line, Some(42));
}

#[test]
fn test_log_entry_clone() {
    let e1 = entry(LogSeverity::Warn, None, None);
    let e2 = e1.clone();
    assert_eq!(e1.severity, e2.severity);
    assert_eq!(e1.message, e2.message);
    assert_eq!(e1.timestamp, e2.timestamp);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        // Both branches: with and without file:line
        logger.log(&entry(severity, None, None));
        logger.log(&entry(severity, Some("test.rs"), Some(7)));
    }
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
}

// ============================================================================
// ERROR MACRO TESTS
// ============================================================================

#[test]
#[serial]
fn test_engine_err_logs_and_builds_backend_error() {
    let entries = capture();

    let err = crate::engine_err!("meshlet3d::test", "vkCreateBuffer failed: {}", -2);

    match err {
        Error::BackendError(msg) => assert_eq!(msg, "vkCreateBuffer failed: -2"),
        other => panic!("unexpected variant {:?}", other),
    }
    let logged = entries.lock().unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].0, LogSeverity::Error);

    Engine::reset_logger();
}
