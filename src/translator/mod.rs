//! Configuration translator
//!
//! Turns resolved [`Settings`] plus the privilege context into the arpwatch
//! command line, failing fast on missing configuration. Also makes sure the
//! per-interface data file exists before launch.

pub mod args;

use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::Settings;
use crate::constants::{ARPWATCH_USER, DATA_FILE_EXTENSION};
use crate::error::{EntrypointError, Result};
pub use args::{ArpwatchArgs, Flag};

/// Effective identity the entrypoint runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegeContext {
    pub euid: u32,
}

impl PrivilegeContext {
    pub fn current() -> Self {
        Self {
            euid: nix::unistd::geteuid().as_raw(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.euid == 0
    }
}

/// Result of picking one interface out of the selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSelection {
    pub name: String,
    /// Names dropped because only one interface per process is allowed
    pub ignored: Vec<String>,
}

/// What happened to `<data_dir>/<iface>.dat`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFileStatus {
    Existing,
    Created,
    Failed,
}

/// A fully translated launch plan
#[derive(Debug, Clone)]
pub struct Translation {
    pub binary: String,
    pub args: ArpwatchArgs,
    pub data_file_status: DataFileStatus,
}

impl Translation {
    /// The complete argv including the program name
    pub fn command_line(&self) -> Vec<String> {
        let mut argv = vec![self.binary.clone()];
        argv.extend(self.args.to_argv());
        argv
    }
}

/// Translate settings into an arpwatch launch plan
pub fn translate(settings: &Settings, privileges: PrivilegeContext) -> Result<Translation> {
    let selection = select_interface(settings.interface.as_deref())?;
    if !selection.ignored.is_empty() {
        warn!(
            "Multiple interfaces given; arpwatch monitors one interface per process. Using {:?}, ignoring {}. \
             Run one container per interface instead.",
            selection.name,
            selection.ignored.join(", ")
        );
    }

    let drop_privileges = match (privileges.is_root(), settings.skip_privilege_drop) {
        (true, false) => true,
        (_, true) => false,
        (false, false) => {
            return Err(EntrypointError::PrivilegeRequired {
                euid: privileges.euid,
            })
        }
    };

    if !looks_like_interface(&selection.name) {
        warn!(
            "Interface name {:?} does not look like a Linux interface name; passing it through",
            selection.name
        );
    }

    let data_file = data_file_path(&settings.data_dir, &selection.name);
    check_data_dir(&settings.data_dir);
    let owner = drop_privileges.then_some(ARPWATCH_USER);
    let data_file_status = prepare_data_file(&data_file, owner);

    let args = ArpwatchArgs::builder(selection.name, data_file)
        .network(settings.network.clone())
        .drop_privileges_to(owner.map(str::to_string))
        .extra(settings.extra_options.iter().cloned())
        .build();

    let conflicts = args.conflicting_extras();
    if !conflicts.is_empty() {
        warn!(
            "Extra options repeat generated flags ({}); they are passed after the generated ones \
             and arpwatch decides which occurrence wins",
            conflicts.join(" ")
        );
    }

    Ok(Translation {
        binary: settings.binary.clone(),
        args,
        data_file_status,
    })
}

/// Pick the first name of a possibly comma-separated selector
pub fn select_interface(selector: Option<&str>) -> Result<InterfaceSelection> {
    let selector = selector.ok_or(EntrypointError::MissingInterface)?;
    let mut names = selector.split(',').map(str::trim);

    let name = names
        .next()
        .filter(|name| !name.is_empty())
        .ok_or(EntrypointError::MissingInterface)?
        .to_string();
    let ignored = names
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    Ok(InterfaceSelection { name, ignored })
}

/// `<data_dir>/<iface>.dat`
pub fn data_file_path(data_dir: &Path, interface: &str) -> PathBuf {
    data_dir.join(format!("{}.{}", interface, DATA_FILE_EXTENSION))
}

fn looks_like_interface(name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_.:@-]{1,15}$").expect("valid interface regex"))
        .is_match(name)
}

fn check_data_dir(data_dir: &Path) {
    use nix::unistd::{access, AccessFlags};

    if !data_dir.is_dir() {
        warn!("Data directory {} does not exist", data_dir.display());
    } else if let Err(e) = access(data_dir, AccessFlags::W_OK) {
        warn!(
            "Data directory {} is not writable by the current user: {}",
            data_dir.display(),
            e
        );
    }
}

/// Create the data file when absent; never fatal since arpwatch can create it too
pub fn prepare_data_file(path: &Path, owner: Option<&str>) -> DataFileStatus {
    if path.exists() {
        debug!("Data file {} already exists", path.display());
        return DataFileStatus::Existing;
    }

    if let Err(e) = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        warn!("Could not create data file {}: {}", path.display(), e);
        return DataFileStatus::Failed;
    }
    info!("Created empty data file {}", path.display());

    if let Some(user) = owner {
        chown_to(path, user);
    }
    DataFileStatus::Created
}

fn chown_to(path: &Path, user: &str) {
    use nix::unistd::{chown, User};

    match User::from_name(user) {
        Ok(Some(user)) => {
            if let Err(e) = chown(path, Some(user.uid), Some(user.gid)) {
                warn!("Could not hand {} to user {}: {}", path.display(), user.name, e);
            }
        }
        Ok(None) => debug!("User {} not found, leaving {} owned by current user", user, path.display()),
        Err(e) => warn!("Could not look up user {}: {}", user, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupervisorTimings;
    use tempfile::tempdir;

    const ROOT: PrivilegeContext = PrivilegeContext { euid: 0 };
    const USER: PrivilegeContext = PrivilegeContext { euid: 1000 };

    fn settings(interface: Option<&str>, data_dir: &Path) -> Settings {
        Settings {
            interface: interface.map(str::to_string),
            network: None,
            extra_options: Vec::new(),
            data_dir: data_dir.to_path_buf(),
            skip_privilege_drop: false,
            binary: "arpwatch".to_string(),
            timings: SupervisorTimings::default(),
        }
    }

    #[test]
    fn test_select_interface_single() {
        let selection = select_interface(Some("eth0")).unwrap();
        assert_eq!(selection.name, "eth0");
        assert!(selection.ignored.is_empty());
    }

    #[test]
    fn test_select_interface_uses_first_trimmed() {
        let selection = select_interface(Some(" eth0 , eth1,wlan0")).unwrap();
        assert_eq!(selection.name, "eth0");
        assert_eq!(selection.ignored, vec!["eth1", "wlan0"]);
    }

    #[test]
    fn test_select_interface_missing() {
        for selector in [None, Some(""), Some("   "), Some(",eth1")] {
            assert!(
                matches!(select_interface(selector), Err(EntrypointError::MissingInterface)),
                "{:?} should be rejected",
                selector
            );
        }
    }

    #[test]
    fn test_missing_interface_checked_before_privileges() {
        let temp_dir = tempdir().unwrap();
        let err = translate(&settings(None, temp_dir.path()), USER).unwrap_err();
        assert!(matches!(err, EntrypointError::MissingInterface));
    }

    #[test]
    fn test_root_drops_privileges() {
        let temp_dir = tempdir().unwrap();
        let translation = translate(&settings(Some("eth0"), temp_dir.path()), ROOT).unwrap();

        assert!(translation.args.drops_privileges());
        let argv = translation.args.to_argv();
        assert_eq!(&argv[argv.len() - 3..], &["-N", "-u", "arpwatch"]);
    }

    #[test]
    fn test_root_with_skip_keeps_identity() {
        let temp_dir = tempdir().unwrap();
        let mut settings = settings(Some("eth0"), temp_dir.path());
        settings.skip_privilege_drop = true;

        let translation = translate(&settings, ROOT).unwrap();
        assert!(!translation.args.drops_privileges());
        assert!(!translation.args.to_argv().contains(&"-u".to_string()));
    }

    #[test]
    fn test_non_root_without_skip_fails_before_touching_disk() {
        let temp_dir = tempdir().unwrap();
        let err = translate(&settings(Some("eth0"), temp_dir.path()), USER).unwrap_err();

        assert!(matches!(err, EntrypointError::PrivilegeRequired { euid: 1000 }));
        assert!(!temp_dir.path().join("eth0.dat").exists());
    }

    #[test]
    fn test_non_root_with_skip_succeeds() {
        let temp_dir = tempdir().unwrap();
        let mut settings = settings(Some("eth0"), temp_dir.path());
        settings.skip_privilege_drop = true;

        let translation = translate(&settings, USER).unwrap();
        assert!(!translation.args.drops_privileges());
    }

    #[test]
    fn test_data_file_created_before_launch() {
        let temp_dir = tempdir().unwrap();
        let mut settings = settings(Some("eth0"), temp_dir.path());
        settings.skip_privilege_drop = true;
        let data_file = temp_dir.path().join("eth0.dat");
        assert!(!data_file.exists());

        let translation = translate(&settings, USER).unwrap();

        assert!(data_file.exists());
        assert_eq!(translation.data_file_status, DataFileStatus::Created);
        assert_eq!(translation.args.data_file(), Some(data_file.as_path()));
    }

    #[test]
    fn test_existing_data_file_untouched() {
        let temp_dir = tempdir().unwrap();
        let data_file = temp_dir.path().join("eth0.dat");
        std::fs::write(&data_file, "00:11:22:33:44:55\t10.0.0.1\t1700000000\n").unwrap();

        assert_eq!(prepare_data_file(&data_file, None), DataFileStatus::Existing);
        assert!(std::fs::read_to_string(&data_file).unwrap().contains("10.0.0.1"));
    }

    #[test]
    fn test_data_file_failure_is_not_fatal() {
        let temp_dir = tempdir().unwrap();
        let mut settings = settings(Some("eth0"), &temp_dir.path().join("missing"));
        settings.skip_privilege_drop = true;

        let translation = translate(&settings, USER).unwrap();
        assert_eq!(translation.data_file_status, DataFileStatus::Failed);
    }

    #[test]
    fn test_end_to_end_default_argv() {
        let settings = settings(Some("eth0"), Path::new("/var/lib/arpwatch"));
        let args = ArpwatchArgs::builder("eth0", data_file_path(&settings.data_dir, "eth0"))
            .drop_privileges_to(Some(ARPWATCH_USER.to_string()))
            .build();

        assert_eq!(
            args.to_argv(),
            vec!["-i", "eth0", "-f", "/var/lib/arpwatch/eth0.dat", "-N", "-u", "arpwatch"]
        );
    }

    #[test]
    fn test_network_and_extras_placement() {
        let temp_dir = tempdir().unwrap();
        let mut settings = settings(Some("eth0,eth1"), temp_dir.path());
        settings.network = Some("192.168.1.0/24".to_string());
        settings.extra_options = vec!["-p".to_string()];

        let translation = translate(&settings, ROOT).unwrap();
        let expected_file = temp_dir.path().join("eth0.dat").display().to_string();

        assert_eq!(
            translation.command_line(),
            vec![
                "arpwatch".to_string(),
                "-i".to_string(),
                "eth0".to_string(),
                "-f".to_string(),
                expected_file,
                "-n".to_string(),
                "192.168.1.0/24".to_string(),
                "-N".to_string(),
                "-u".to_string(),
                "arpwatch".to_string(),
                "-p".to_string(),
            ]
        );
    }

    #[test]
    fn test_interface_name_shapes() {
        assert!(looks_like_interface("eth0"));
        assert!(looks_like_interface("enp0s31f6"));
        assert!(looks_like_interface("br-1a2b3c4d5e6f"));
        assert!(!looks_like_interface("eth0; rm -rf /"));
        assert!(!looks_like_interface("averyveryverylongname"));
    }
}
