//! Error taxonomy for the entrypoint
//!
//! Every variant maps onto exit code 1; only a signal-driven shutdown exits 0.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Likely causes printed when arpwatch does not come up
pub const LAUNCH_CHECKLIST: &[&str] = &[
    "the arpwatch binary is not installed on PATH, or ARPWATCH_BIN points at the wrong file",
    "the interface name is invalid or does not exist in this network namespace",
    "the container lacks the NET_RAW and NET_ADMIN capabilities",
    "the container is not running with host networking (--network host)",
    "the data directory is not writable by the arpwatch user",
];

#[derive(Debug, Error)]
pub enum EntrypointError {
    #[error("ARPWATCH_INTERFACE is required but was not set; set it to the interface to monitor, e.g. ARPWATCH_INTERFACE=eth0")]
    MissingInterface,

    #[error(
        "running as uid {euid} without root privileges; arpwatch needs root to open a raw socket. \
         Run as root, or set ARPWATCH_SKIP_PRIVDROP=true if capabilities were granted to the arpwatch user"
    )]
    PrivilegeRequired { euid: u32 },

    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidSetting {
        name: String,
        value: String,
        reason: String,
    },

    #[error("failed to load configuration file {}: {reason}", path.display())]
    ConfigFile { path: PathBuf, reason: String },

    #[error("{}", render_spawn_failure(binary, source))]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", render_launch_failure(status.as_ref(), output))]
    LaunchFailed {
        status: Option<ExitStatus>,
        output: Vec<String>,
    },

    #[error("arpwatch terminated unexpectedly ({})", describe_status(status.as_ref()))]
    ChildExited { status: Option<ExitStatus> },

    #[error("supervisor I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EntrypointError>;

/// Human description of an exit status, `None` meaning it vanished unobserved
pub fn describe_status(status: Option<&ExitStatus>) -> String {
    use std::os::unix::process::ExitStatusExt;

    match status {
        Some(status) => match (status.code(), status.signal()) {
            (Some(code), _) => format!("exit code {}", code),
            (None, Some(signal)) => format!("killed by signal {}", signal),
            _ => "unknown status".to_string(),
        },
        None => "process no longer running".to_string(),
    }
}

fn render_spawn_failure(binary: &str, source: &std::io::Error) -> String {
    let mut message = format!("failed to start {}: {}", binary, source);
    push_checklist(&mut message);
    message
}

fn render_launch_failure(status: Option<&ExitStatus>, output: &[String]) -> String {
    let mut message = format!(
        "arpwatch failed to start ({})",
        describe_status(status)
    );

    if output.is_empty() {
        message.push_str("\nNo output was captured from arpwatch.");
    } else {
        message.push_str("\nCaptured output:");
        for line in output {
            message.push_str("\n  ");
            message.push_str(line);
        }
    }

    push_checklist(&mut message);
    message
}

fn push_checklist(message: &mut String) {
    message.push_str("\nLikely causes:");
    for cause in LAUNCH_CHECKLIST {
        message.push_str("\n  - ");
        message.push_str(cause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn test_missing_interface_names_variable() {
        let message = EntrypointError::MissingInterface.to_string();
        assert!(message.contains("ARPWATCH_INTERFACE"));
    }

    #[test]
    fn test_launch_failure_lists_output_and_checklist() {
        let err = EntrypointError::LaunchFailed {
            status: Some(ExitStatus::from_raw(1 << 8)),
            output: vec!["eth9: No such device".to_string()],
        };
        let message = err.to_string();

        assert!(message.contains("exit code 1"));
        assert!(message.contains("eth9: No such device"));
        assert!(message.contains("Likely causes:"));
        for cause in LAUNCH_CHECKLIST {
            assert!(message.contains(cause));
        }
    }

    #[test]
    fn test_spawn_failure_lists_checklist() {
        let err = EntrypointError::Spawn {
            binary: "/opt/arpwatch".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let message = err.to_string();

        assert!(message.starts_with("failed to start /opt/arpwatch"));
        assert!(message.contains("Likely causes:"));
        assert!(message.contains("ARPWATCH_BIN"));
    }

    #[test]
    fn test_describe_status_signal_and_vanished() {
        assert_eq!(describe_status(Some(&ExitStatus::from_raw(9))), "killed by signal 9");
        assert_eq!(describe_status(None), "process no longer running");
    }
}
