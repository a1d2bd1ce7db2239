//! Process supervisor
//!
//! Launches arpwatch as a foreground child and drives a single-shot state
//! machine:
//!
//! - Launching: wait out the settle delay, racing child exit and signals
//! - Supervising: wait for child exit, probing liveness every poll interval
//! - Exit: `Ok(Outcome::Shutdown)` on SIGINT/SIGTERM, an error otherwise
//!
//! Nothing is ever restarted; restart policy belongs to the orchestrator.

pub mod capture;
pub mod liveness;

use log::{debug, warn};
use std::os::unix::process::CommandExt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::SupervisorTimings;
use crate::constants::{ARPWATCH_BINARY, CAPTURE_LINES};
use crate::error::{describe_status, EntrypointError, Result};
use crate::logging::SupervisorLogger;
use crate::translator::Translation;
use capture::{OutputCapture, Stream};
use liveness::{Liveness, LivenessProbe, Probe};

/// Upper bound on waiting for the output forwarders after the child is gone
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// How long a child exit waits for a group-wide signal that may still be in flight
const SIGNAL_LINGER: Duration = Duration::from_millis(100);

/// How a supervision run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Operator asked us to stop; carries the signal name
    Shutdown(&'static str),
}

/// True when `command` should replace the entrypoint instead of running arpwatch
pub fn is_escape_hatch(command: &[String]) -> bool {
    match command.first() {
        None => false,
        Some(first) => {
            std::path::Path::new(first)
                .file_name()
                .map_or(true, |name| name != ARPWATCH_BINARY)
        }
    }
}

/// Replace this process with `command`; only returns on failure
pub fn exec_command(command: &[String]) -> anyhow::Error {
    let Some((program, args)) = command.split_first() else {
        return anyhow::anyhow!("no command given");
    };

    let err = std::process::Command::new(program).args(args).exec();
    anyhow::Error::new(err).context(format!("failed to exec {}", program))
}

/// Termination signals the supervisor reacts to
struct ShutdownSignals {
    terminate: Signal,
    interrupt: Signal,
}

impl ShutdownSignals {
    fn register() -> Result<Self> {
        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.interrupt.recv() => "SIGINT",
        }
    }

    /// A signal already delivered, or one arriving within `window`
    async fn pending(&mut self, window: Duration) -> Option<&'static str> {
        tokio::time::timeout(window, self.recv()).await.ok()
    }
}

/// Launch arpwatch per `translation` and supervise it until it exits or we are signalled
pub async fn run(translation: &Translation, timings: SupervisorTimings) -> Result<Outcome> {
    let mut probe = LivenessProbe::new(&translation.binary);
    supervise(translation, timings, &mut probe).await
}

/// [`run`] with the liveness verdicts supplied by `probe`
///
/// A shutdown signal always takes precedence over a child exit seen at the
/// same moment: Ctrl-C under `docker run -it` reaches the whole process
/// group, so arpwatch may exit from the very signal that asked us to stop.
pub async fn supervise<P: Probe>(
    translation: &Translation,
    timings: SupervisorTimings,
    probe: &mut P,
) -> Result<Outcome> {
    let logger = SupervisorLogger::new();
    let mut signals = ShutdownSignals::register()?;

    let command_line = translation.command_line();
    let mut child = Command::new(&translation.binary)
        .args(translation.args.to_argv())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| EntrypointError::Spawn {
            binary: translation.binary.clone(),
            source,
        })?;
    let pid = child.id().unwrap_or_default();

    let capture = OutputCapture::new(CAPTURE_LINES);
    let mut forwarders = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        forwarders.push(capture.forward(stdout, Stream::Stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        forwarders.push(capture.forward(stderr, Stream::Stderr));
    }
    logger.log_launch(pid, &command_line);

    // Launching
    tokio::select! {
        biased;
        signal_name = signals.recv() => {
            return Ok(shutdown(&mut child, signal_name, timings.shutdown_grace, &logger).await);
        }
        status = child.wait() => {
            let status = Some(status?);
            if let Some(signal_name) = signals.pending(SIGNAL_LINGER).await {
                return Ok(shutdown(&mut child, signal_name, timings.shutdown_grace, &logger).await);
            }
            return Err(launch_failed(&logger, status, forwarders, &capture).await);
        }
        _ = tokio::time::sleep(timings.settle_delay) => {}
    }

    if !probe.check(pid).is_alive() {
        let status = reap(&mut child).await?;
        return Err(launch_failed(&logger, status, forwarders, &capture).await);
    }
    logger.log_settled(pid);

    // Supervising
    let mut ticker = tokio::time::interval(timings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            signal_name = signals.recv() => {
                return Ok(shutdown(&mut child, signal_name, timings.shutdown_grace, &logger).await);
            }
            status = child.wait() => {
                let status = Some(status?);
                if let Some(signal_name) = signals.pending(SIGNAL_LINGER).await {
                    return Ok(shutdown(&mut child, signal_name, timings.shutdown_grace, &logger).await);
                }
                return Err(child_exited(&logger, pid, status, forwarders).await);
            }
            _ = ticker.tick() => {
                match probe.check(pid) {
                    Liveness::Alive => debug!("arpwatch (pid {}) alive", pid),
                    Liveness::Renamed(name) => debug!("pid {} alive as {:?}", pid, name),
                    Liveness::Zombie | Liveness::Gone => {
                        let status = reap(&mut child).await?;
                        return Err(child_exited(&logger, pid, status, forwarders).await);
                    }
                }
            }
        }
    }
}

/// Collect the exit status of a child the probe reported dead
async fn reap(child: &mut Child) -> Result<Option<ExitStatus>> {
    match child.try_wait()? {
        Some(status) => Ok(Some(status)),
        // Zombie not yet visible to try_wait; give it a moment
        None => match tokio::time::timeout(DRAIN_TIMEOUT, child.wait()).await {
            Ok(status) => Ok(Some(status?)),
            Err(_) => Ok(None),
        },
    }
}

async fn drain(forwarders: Vec<JoinHandle<()>>) {
    for handle in forwarders {
        if tokio::time::timeout(DRAIN_TIMEOUT, handle).await.is_err() {
            debug!("Output forwarder still busy, not waiting further");
        }
    }
}

async fn launch_failed(
    logger: &SupervisorLogger,
    status: Option<ExitStatus>,
    forwarders: Vec<JoinHandle<()>>,
    capture: &OutputCapture,
) -> EntrypointError {
    drain(forwarders).await;
    logger.log_launch_failure(&describe_status(status.as_ref()));
    EntrypointError::LaunchFailed {
        status,
        output: capture.snapshot(),
    }
}

async fn child_exited(
    logger: &SupervisorLogger,
    pid: u32,
    status: Option<ExitStatus>,
    forwarders: Vec<JoinHandle<()>>,
) -> EntrypointError {
    drain(forwarders).await;
    logger.log_child_exit(pid, &describe_status(status.as_ref()));
    EntrypointError::ChildExited { status }
}

/// Forward SIGTERM to the child and give it the grace period to exit
async fn shutdown(
    child: &mut Child,
    signal_name: &'static str,
    grace: Duration,
    logger: &SupervisorLogger,
) -> Outcome {
    use nix::sys::signal::{kill, Signal as NixSignal};
    use nix::unistd::Pid;

    logger.log_shutdown(signal_name);

    // Already reaped when arpwatch went down with the same signal
    let Some(pid) = child.id() else {
        return Outcome::Shutdown(signal_name);
    };
    if let Ok(raw) = i32::try_from(pid) {
        if let Err(e) = kill(Pid::from_raw(raw), NixSignal::SIGTERM) {
            warn!("Could not forward SIGTERM to arpwatch (pid {}): {}", pid, e);
        }
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => debug!("arpwatch stopped ({})", describe_status(Some(&status))),
        Ok(Err(e)) => warn!("Failed waiting for arpwatch to stop: {}", e),
        Err(_) => {
            logger.log_forced_kill(pid);
            if let Err(e) = child.kill().await {
                warn!("Failed to kill arpwatch (pid {}): {}", pid, e);
            }
        }
    }

    Outcome::Shutdown(signal_name)
}
