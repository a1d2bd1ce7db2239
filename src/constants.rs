//! Global constants for arpwatch-entrypoint
//!
//! Centralized location for names, paths and timing defaults

use std::time::Duration;

/// Name of the wrapped binary, also the token that selects the normal flow
pub const ARPWATCH_BINARY: &str = "arpwatch";

/// Fixed non-root identity arpwatch switches to with `-u`
pub const ARPWATCH_USER: &str = "arpwatch";

/// Default base directory for per-interface `.dat` files
pub const DEFAULT_DATA_DIR: &str = "/var/lib/arpwatch";

/// Extension of the per-interface database arpwatch keeps
pub const DATA_FILE_EXTENSION: &str = "dat";

pub const ENV_INTERFACE: &str = "ARPWATCH_INTERFACE";
pub const ENV_NETWORK: &str = "ARPWATCH_NETWORK";
pub const ENV_OPTIONS: &str = "ARPWATCH_OPTS";
pub const ENV_DATA_DIR: &str = "ARPWATCH_DATA_DIR";
pub const ENV_SKIP_PRIVDROP: &str = "ARPWATCH_SKIP_PRIVDROP";
pub const ENV_BINARY: &str = "ARPWATCH_BIN";
pub const ENV_CONFIG: &str = "ARPWATCH_CONFIG";

/// Pause after launch before the first liveness check
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Interval of the supervision poll loop
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How long a forwarded SIGTERM may take before the child is killed
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Upper bound for the settle delay and shutdown grace, in seconds
pub const MAX_SETTLE_SECS: f64 = 60.0;

/// Accepted range for the poll interval, in seconds
pub const MIN_POLL_SECS: f64 = 0.1;
pub const MAX_POLL_SECS: f64 = 300.0;

/// Number of child output lines kept for diagnostic replay
pub const CAPTURE_LINES: usize = 200;
