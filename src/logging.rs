//! Logging for the entrypoint
//!
//! Plain diagnostics go through the `log` macros. Supervisor lifecycle events
//! are emitted as one line each with a JSON payload so container log
//! collectors can pick them apart.

use log::{error, info, warn, LevelFilter};
use serde_json::json;
use std::io::Write;

/// Initialize the stderr logger; `RUST_LOG` overrides the default `info` level
pub fn init_logger() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} arpwatch-entrypoint: {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))
}

/// Severity of a lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventLevel {
    Error,
    Warn,
    Info,
}

/// Structured lifecycle events for the supervised arpwatch process
#[derive(Debug, Clone, Default)]
pub struct SupervisorLogger;

impl SupervisorLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn log_launch(&self, pid: u32, command_line: &[String]) {
        let data = json!({
            "event": "arpwatch_launched",
            "pid": pid,
            "command": command_line,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        self.log_structured(EventLevel::Info, "Started arpwatch", &data);
    }

    pub fn log_settled(&self, pid: u32) {
        let data = json!({
            "event": "arpwatch_running",
            "pid": pid,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        self.log_structured(EventLevel::Info, "arpwatch is running, supervising", &data);
    }

    pub fn log_launch_failure(&self, status: &str) {
        let data = json!({
            "event": "arpwatch_launch_failed",
            "status": status,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        self.log_structured(EventLevel::Error, "arpwatch did not come up", &data);
    }

    pub fn log_child_exit(&self, pid: u32, status: &str) {
        let data = json!({
            "event": "arpwatch_exited",
            "pid": pid,
            "status": status,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        self.log_structured(EventLevel::Error, "arpwatch exited", &data);
    }

    pub fn log_shutdown(&self, signal: &str) {
        let data = json!({
            "event": "shutdown",
            "signal": signal,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        self.log_structured(EventLevel::Info, "Shutting down", &data);
    }

    pub fn log_forced_kill(&self, pid: u32) {
        let data = json!({
            "event": "arpwatch_killed",
            "pid": pid,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        self.log_structured(EventLevel::Warn, "arpwatch ignored SIGTERM, killed", &data);
    }

    fn log_structured(&self, level: EventLevel, message: &str, data: &serde_json::Value) {
        match level {
            EventLevel::Error => error!("{} | {}", message, data),
            EventLevel::Warn => warn!("{} | {}", message, data),
            EventLevel::Info => info!("{} | {}", message, data),
        }
    }
}
