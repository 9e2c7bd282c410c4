//! Address Space Event Logging
//!
//! Structured events for page allocation and operation linking, useful for:
//! - Watching a call site relink as a table becomes heterogeneous
//! - Debugging
//! - Tooling that consumes JSON event streams
//!
//! Log Levels:
//! - WARN: Refused allocations
//! - INFO: Page allocations
//! - DEBUG: Snapshot publication, link decisions
//! - TRACE: Relinks
//!
//! Plain diagnostics go through the `log` facade; this module is for the
//! event stream an [`crate::AddressSpace`] emits when `verbose` is set.

use crate::page::PageKind;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Log level for vmem events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

/// Vmem event types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VmemEvent {
    /// New page appended to an address space
    PageAllocated {
        space: u64,
        page_id: u32,
        kind: PageKind,
    },

    /// New snapshot published, previous one invalidated
    SnapshotPublished {
        space: u64,
        generation: u64,
        pages: usize,
    },

    /// Operation resolved to a guarded accessor
    Linked {
        space: u64,
        operation: String,
        kind: PageKind,
        generation: u64,
    },

    /// Operation not applicable
    LinkRejected { space: u64, operation: String },

    /// Call site discarded a stale accessor
    Relinked {
        space: u64,
        operation: String,
        relinks: u64,
    },

    /// Allocation refused
    AllocationRejected {
        space: u64,
        requested: usize,
        reason: String,
    },
}

/// Logger configuration
#[derive(Debug, Clone)]
pub struct VmemLoggerConfig {
    /// Minimum log level
    pub level: LogLevel,

    /// Enable console output
    pub console: bool,

    /// Enable JSON format
    pub json: bool,

    /// Enable timestamps
    pub timestamps: bool,

    /// Keep events in memory
    pub record: bool,

    /// Most recent events kept when recording; older ones are dropped
    pub max_events: usize,
}

/// Default size of the in-memory event buffer
pub const DEFAULT_MAX_EVENTS: usize = 4096;

impl Default for VmemLoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: true,
            json: false,
            timestamps: true,
            record: true,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

/// Event logger
pub struct VmemLogger {
    config: VmemLoggerConfig,
    events: Mutex<VecDeque<(Instant, VmemEvent)>>,
    enabled: AtomicBool,
}

impl VmemLogger {
    /// Create new logger
    pub fn new(config: VmemLoggerConfig) -> Self {
        Self {
            config,
            events: Mutex::new(VecDeque::new()),
            enabled: AtomicBool::new(true),
        }
    }

    /// Enable logging
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Disable logging
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Log an event
    pub fn log(&self, event: VmemEvent) {
        if !self.is_enabled() {
            return;
        }

        if Self::event_level(&event) > self.config.level {
            return;
        }

        if self.config.console {
            self.output_console(&event);
        }

        if self.config.record && self.config.max_events > 0 {
            let mut events = self.events.lock();
            if events.len() >= self.config.max_events {
                events.pop_front();
            }
            events.push_back((Instant::now(), event));
        }
    }

    /// Get log level for event
    fn event_level(event: &VmemEvent) -> LogLevel {
        match event {
            VmemEvent::AllocationRejected { .. } => LogLevel::Warn,
            VmemEvent::PageAllocated { .. } => LogLevel::Info,
            VmemEvent::SnapshotPublished { .. }
            | VmemEvent::Linked { .. }
            | VmemEvent::LinkRejected { .. } => LogLevel::Debug,
            VmemEvent::Relinked { .. } => LogLevel::Trace,
        }
    }

    /// Output to console
    fn output_console(&self, event: &VmemEvent) {
        let mut line = String::new();
        if self.config.timestamps {
            let now = chrono::Local::now();
            line.push_str(&format!("[{}] ", now.format("%Y-%m-%d %H:%M:%S%.3f")));
        }

        if self.config.json {
            match serde_json::to_string(event) {
                Ok(json) => line.push_str(&json),
                Err(_) => return,
            }
        } else {
            line.push_str(&Self::format_human(event));
        }

        eprintln!("{}", line);
    }

    /// Render an event in human-readable form
    pub fn format_human(event: &VmemEvent) -> String {
        match event {
            VmemEvent::PageAllocated {
                space,
                page_id,
                kind,
            } => format!(
                "[VMEM] Space {}: page {} allocated ({} page, start {:#010x})",
                space,
                page_id,
                kind,
                crate::address::page_start(*page_id)
            ),
            VmemEvent::SnapshotPublished {
                space,
                generation,
                pages,
            } => format!(
                "[VMEM] Space {}: snapshot {} published ({} pages)",
                space, generation, pages
            ),
            VmemEvent::Linked {
                space,
                operation,
                kind,
                generation,
            } => format!(
                "[VMEM] Space {}: linked {} for {} pages against snapshot {}",
                space, operation, kind, generation
            ),
            VmemEvent::LinkRejected { space, operation } => {
                format!("[VMEM] Space {}: {} is not applicable", space, operation)
            },
            VmemEvent::Relinked {
                space,
                operation,
                relinks,
            } => format!(
                "[VMEM] Space {}: {} relinked ({} so far)",
                space, operation, relinks
            ),
            VmemEvent::AllocationRejected {
                space,
                requested,
                reason,
            } => format!(
                "[VMEM] Space {}: allocation of {} bytes rejected: {}",
                space, requested, reason
            ),
        }
    }

    /// Get recorded events, oldest first
    pub fn get_events(&self) -> Vec<(Instant, VmemEvent)> {
        self.events.lock().iter().cloned().collect()
    }

    /// Clear all events
    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }
}

impl Default for VmemLogger {
    fn default() -> Self {
        Self::new(VmemLoggerConfig::default())
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL_LOGGER: Mutex<VmemLogger> = Mutex::new(VmemLogger::default());
}

/// Log an event to the global logger
pub fn log_event(event: VmemEvent) {
    GLOBAL_LOGGER.lock().log(event);
}

/// Configure the global logger
pub fn configure_logger(config: VmemLoggerConfig) {
    *GLOBAL_LOGGER.lock() = VmemLogger::new(config);
}

/// Events recorded by the global logger
pub fn recorded_events() -> Vec<VmemEvent> {
    GLOBAL_LOGGER
        .lock()
        .get_events()
        .into_iter()
        .map(|(_, event)| event)
        .collect()
}

/// Get global logger event count
pub fn get_event_count() -> usize {
    GLOBAL_LOGGER.lock().event_count()
}
