/// Vulkan debug messenger - validation layer messages with colored output
///
/// The callback filters messages by severity and category, prints them in
/// color to stderr and/or appends them to a log file, counts them per
/// severity, and can panic or abort on the first validation error.

use ash::vk;
use colored::*;
use meshlet_engine::meshlet3d::{Result, Error};
use meshlet_engine::meshlet3d::render::{
    DebugSeverity, DebugOutput, DebugMessageFilter, ValidationStats, RendererConfig,
};
use meshlet_engine::engine_error;
use rustc_hash::FxHashMap;
use std::ffi::CStr;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Callback configuration, read on every message
static DEBUG_CONFIG: Mutex<Option<DebugConfig>> = Mutex::new(None);

/// Per-severity message counters
static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Occurrences per message text, for the `[×n]` repeat marker
static MESSAGE_TRACKER: Mutex<Option<MessageTracker>> = Mutex::new(None);

/// Debug configuration for the callback
#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub severity: DebugSeverity,
    pub output: DebugOutput,
    pub message_filter: DebugMessageFilter,
    pub break_on_error: bool,
    pub panic_on_error: bool,
    pub enable_stats: bool,
}

impl DebugConfig {
    pub fn from_renderer_config(config: &RendererConfig) -> Self {
        Self {
            severity: config.debug_severity,
            output: config.debug_output.clone(),
            message_filter: config.debug_message_filter,
            break_on_error: config.break_on_validation_error,
            panic_on_error: config.panic_on_error,
            enable_stats: config.enable_validation_stats,
        }
    }
}

struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn record(&self, severity: vk::DebugUtilsMessageSeverityFlagsEXT) {
        let counter = if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            &self.errors
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            &self.warnings
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            &self.info
        } else {
            &self.verbose
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get_stats(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

#[derive(Default)]
struct MessageTracker {
    messages: FxHashMap<String, u32>,
}

impl MessageTracker {
    fn track_message(&mut self, message: &str) -> u32 {
        let count = self.messages.entry(message.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    fn repeated_count(&self) -> usize {
        self.messages.values().filter(|&&count| count > 1).count()
    }
}

// ===== CONFIGURATION =====

/// Install the callback configuration and reset the statistics
pub fn init_debug_config(config: DebugConfig) {
    VALIDATION_STATS.reset();

    if let Ok(mut tracker) = MESSAGE_TRACKER.lock() {
        *tracker = Some(MessageTracker::default());
    }
    if let Ok(mut current) = DEBUG_CONFIG.lock() {
        *current = Some(config);
    }
}

/// Remove the callback configuration.
///
/// Messages arriving afterwards (during instance teardown) are dropped.
pub fn cleanup_debug_config() {
    if let Ok(mut current) = DEBUG_CONFIG.lock() {
        *current = None;
    }
}

/// Get current validation statistics
pub fn get_validation_stats() -> ValidationStats {
    VALIDATION_STATS.get_stats()
}

/// Print validation statistics report
pub fn print_validation_stats_report() {
    let stats = get_validation_stats();

    if stats.total() == 0 {
        println!("\n{}", "✓ No validation messages".green().bold());
        return;
    }

    println!("\n{}", "=== Validation Statistics Report ===".bright_blue().bold());

    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }

    println!("  {} {}", "Total:".white().bold(), stats.total());

    if let Ok(tracker_guard) = MESSAGE_TRACKER.lock() {
        let repeated = tracker_guard.as_ref().map_or(0, MessageTracker::repeated_count);
        if repeated > 0 {
            println!("\n  {} {} message(s) appeared multiple times", "ℹ".cyan(), repeated);
        }
    }

    println!("{}\n", "====================================".bright_blue().bold());
}

// ===== FILTERS =====

/// Severities the messenger is created with
pub fn severity_flags(severity: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    match severity {
        DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    }
}

pub(crate) fn passes_severity(
    filter: DebugSeverity,
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
) -> bool {
    severity_flags(filter).intersects(severity)
}

/// "Validation", "Performance" or "General"
pub(crate) fn message_category(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

pub(crate) fn passes_category(
    filter: &DebugMessageFilter,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
) -> bool {
    match message_category(message_type) {
        "Validation" => filter.show_validation,
        "Performance" => filter.show_performance,
        _ => filter.show_general,
    }
}

// ===== MESSENGER =====

/// Debug utils loader plus the messenger created from it.
///
/// Destroyed explicitly by the owning instance, before `vkDestroyInstance`.
pub struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    pub fn new(entry: &ash::Entry, instance: &ash::Instance, config: DebugConfig) -> Result<Self> {
        let loader = ash::ext::debug_utils::Instance::new(entry, instance);
        let severity = severity_flags(config.severity);

        init_debug_config(config);

        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(severity)
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
            )
            .pfn_user_callback(Some(vulkan_debug_callback));

        let messenger = unsafe {
            loader.create_debug_utils_messenger(&debug_info, None)
        }
        .map_err(|e| {
            cleanup_debug_config();
            engine_error!("meshlet3d::vulkan", "Failed to create debug messenger: {:?}", e);
            Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
        })?;

        Ok(Self { loader, messenger })
    }

    /// # Safety
    ///
    /// Must be called once, before the instance it was created from is destroyed.
    pub unsafe fn destroy(&self) {
        cleanup_debug_config();
        self.loader.destroy_debug_utils_messenger(self.messenger, None);
    }
}

/// Vulkan debug messenger callback
///
/// Called by the validation layers from any thread.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = *p_callback_data;
    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown"
    } else {
        CStr::from_ptr(callback_data.p_message_id_name)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };

    let config = match DEBUG_CONFIG.lock() {
        Ok(guard) => match guard.as_ref() {
            Some(cfg) => cfg.clone(),
            None => return vk::FALSE,
        },
        Err(_) => return vk::FALSE,
    };

    if !passes_severity(config.severity, message_severity)
        || !passes_category(&config.message_filter, message_type)
    {
        return vk::FALSE;
    }

    if config.enable_stats {
        VALIDATION_STATS.record(message_severity);
    }

    let is_error = message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR);
    let (severity_str, severity_colored) = if is_error {
        ("ERROR", "ERROR".red().bold())
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        ("WARNING", "WARNING".yellow().bold())
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        ("INFO", "INFO".cyan())
    } else {
        ("VERBOSE", "VERBOSE".bright_black())
    };
    let type_str = message_category(message_type);

    let occurrence_count = if config.enable_stats {
        match MESSAGE_TRACKER.lock() {
            Ok(mut guard) => guard.get_or_insert_with(MessageTracker::default).track_message(message),
            Err(_) => 1,
        }
    } else {
        1
    };

    let repeat_indicator = if occurrence_count > 1 {
        format!(" [×{}]", occurrence_count)
    } else {
        String::new()
    };

    let console_output = format!(
        "{} {} [{}]{}\n  ├─ {}: {}\n  └─ {}\n",
        "[VULKAN".bright_blue().bold(),
        format!("{}]", severity_colored).bright_blue().bold(),
        type_str.bright_black(),
        repeat_indicator.yellow(),
        "Message ID".bright_black(),
        message_id_name.white(),
        message.white()
    );

    let file_output = format!(
        "[VULKAN {}] [{}]{}\n  ├─ Message ID: {}\n  └─ {}\n",
        severity_str, type_str, repeat_indicator, message_id_name, message
    );

    match &config.output {
        DebugOutput::Console => eprint!("{}", console_output),
        DebugOutput::File(path) => write_to_file(path, &file_output),
        DebugOutput::Both(path) => {
            eprint!("{}", console_output);
            write_to_file(path, &file_output);
        }
    }

    if config.panic_on_error && is_error {
        panic!(
            "\n⚠️  PANIC ON ERROR (Strict Mode)\nMessage ID: {}\nType: {}\nMessage: {}\n",
            message_id_name, type_str, message
        );
    }

    // Abort so an attached debugger stops on the offending call
    if config.break_on_error && is_error {
        eprintln!(
            "\n{}\n  Context: {} [{}]\n  Message: {}\n",
            "⚠️  BREAK ON VALIDATION ERROR - Aborting execution".red().bold(),
            message_id_name.yellow(),
            type_str.cyan(),
            message.white()
        );
        std::process::abort();
    }

    vk::FALSE
}

fn write_to_file(path: &str, message: &str) {
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{}", message);
    }
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
