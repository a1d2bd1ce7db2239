//! Liveness probing of the supervised process through the process table

use std::path::Path;
use sysinfo::{Pid, PidExt, ProcessExt, ProcessStatus, System, SystemExt};

/// Linux truncates process names to this many bytes
const COMM_LEN: usize = 15;

/// What the process table says about a pid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    /// Running, but under another name than the wrapped executable
    Renamed(String),
    /// Exited and waiting to be reaped
    Zombie,
    Gone,
}

impl Liveness {
    pub fn is_alive(&self) -> bool {
        matches!(self, Liveness::Alive | Liveness::Renamed(_))
    }
}

/// Source of liveness verdicts for the supervised pid
pub trait Probe {
    fn check(&mut self, pid: u32) -> Liveness;
}

/// [`Probe`] backed by the process table
pub struct LivenessProbe {
    system: System,
    expected_name: String,
}

impl LivenessProbe {
    /// Probe for processes started from `binary`
    pub fn new(binary: &str) -> Self {
        Self {
            system: System::new(),
            expected_name: process_name(binary),
        }
    }
}

impl Probe for LivenessProbe {
    fn check(&mut self, pid: u32) -> Liveness {
        let pid = Pid::from_u32(pid);
        if !self.system.refresh_process(pid) {
            return Liveness::Gone;
        }

        match self.system.process(pid) {
            None => Liveness::Gone,
            Some(process) => match process.status() {
                ProcessStatus::Zombie | ProcessStatus::Dead => Liveness::Zombie,
                _ if process.name() == self.expected_name => Liveness::Alive,
                _ => Liveness::Renamed(process.name().to_string()),
            },
        }
    }
}

/// Name the kernel reports for a process started from `binary`
fn process_name(binary: &str) -> String {
    let name = Path::new(binary)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| binary.to_string());

    let mut end = name.len().min(COMM_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}
