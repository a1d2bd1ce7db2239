#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Variables the entrypoint reads; cleared so the host environment cannot leak in
pub const ENTRYPOINT_VARS: &[&str] = &[
    "ARPWATCH_INTERFACE",
    "ARPWATCH_NETWORK",
    "ARPWATCH_OPTS",
    "ARPWATCH_DATA_DIR",
    "ARPWATCH_SKIP_PRIVDROP",
    "ARPWATCH_BIN",
    "ARPWATCH_CONFIG",
    "RUST_LOG",
];

/// Scratch data directory plus fake arpwatch binaries
pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> anyhow::Result<Self> {
        Ok(TestEnvironment {
            temp_dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Install an executable shell script named `arpwatch` under `dir_name`
    pub fn fake_arpwatch(&self, dir_name: &str, body: &str) -> anyhow::Result<PathBuf> {
        let dir = self.temp_dir.path().join(dir_name);
        fs::create_dir_all(&dir)?;
        let path = dir.join("arpwatch");

        fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    /// An arpwatch stand-in that stays up until signalled
    pub fn long_running_arpwatch(&self) -> anyhow::Result<PathBuf> {
        self.fake_arpwatch("long", "echo \"fake arpwatch $*\"\nexec sleep 60")
    }

    /// An arpwatch stand-in that fails the way a bad interface does
    pub fn failing_arpwatch(&self) -> anyhow::Result<PathBuf> {
        self.fake_arpwatch(
            "failing",
            "echo \"arpwatch: ioctl SIOCGIFADDR: No such device\" >&2\nexit 1",
        )
    }

    /// An arpwatch stand-in that exits cleanly on SIGINT or SIGTERM, like arpwatch does
    pub fn trapping_arpwatch(&self) -> anyhow::Result<PathBuf> {
        self.fake_arpwatch(
            "trapping",
            "trap 'exit 0' INT TERM\nwhile true; do sleep 0.1; done",
        )
    }

    /// An arpwatch stand-in that runs briefly and then exits cleanly
    pub fn short_lived_arpwatch(&self) -> anyhow::Result<PathBuf> {
        self.fake_arpwatch("short", "sleep 1\nexit 0")
    }
}

/// Entrypoint command with a clean, non-root-safe environment
pub fn entrypoint(env: &TestEnvironment) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo_bin_cmd!("arpwatch-entrypoint");
    for var in ENTRYPOINT_VARS {
        cmd.env_remove(var);
    }
    cmd.env("ARPWATCH_DATA_DIR", env.path())
        .env("ARPWATCH_SKIP_PRIVDROP", "true")
        .timeout(Duration::from_secs(20));
    cmd
}

/// Spawn the entrypoint supervising `binary`, polling every half second
pub fn spawn_supervisor(
    env: &TestEnvironment,
    binary: &Path,
    settle_delay: &str,
) -> std::io::Result<Child> {
    supervisor_command(env, binary, settle_delay).spawn()
}

/// The command behind [`spawn_supervisor`], for callers that need to adjust it
pub fn supervisor_command(env: &TestEnvironment, binary: &Path, settle_delay: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_arpwatch-entrypoint"));
    for var in ENTRYPOINT_VARS {
        cmd.env_remove(var);
    }
    cmd.env("ARPWATCH_INTERFACE", "lo")
        .env("ARPWATCH_DATA_DIR", env.path())
        .env("ARPWATCH_SKIP_PRIVDROP", "true")
        .env("ARPWATCH_BIN", binary)
        .args(["--settle-delay", settle_delay, "--poll-interval", "0.5"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd
}

/// Poll `child` until it exits or `timeout` passes
pub fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(Some(status)) = child.try_wait() {
            return Some(status);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    let _ = child.kill();
    None
}

pub fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}
