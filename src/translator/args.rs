//! Typed arpwatch command line
//!
//! Generated flags are enumerated; free-form tokens live in their own list and
//! are always rendered after every generated flag.

use std::path::{Path, PathBuf};

/// A flag the entrypoint itself generates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flag {
    /// `-i <iface>`
    Interface(String),
    /// `-f <file>`
    DataFile(PathBuf),
    /// `-n <net/width>`
    Network(String),
    /// `-N`, keeps arpwatch in the foreground
    Foreground,
    /// `-u <user>`
    DropPrivileges(String),
}

impl Flag {
    pub fn switch(&self) -> &'static str {
        match self {
            Flag::Interface(_) => "-i",
            Flag::DataFile(_) => "-f",
            Flag::Network(_) => "-n",
            Flag::Foreground => "-N",
            Flag::DropPrivileges(_) => "-u",
        }
    }

    fn render(&self, argv: &mut Vec<String>) {
        argv.push(self.switch().to_string());
        match self {
            Flag::Interface(value) | Flag::Network(value) | Flag::DropPrivileges(value) => {
                argv.push(value.clone())
            }
            Flag::DataFile(path) => argv.push(path.display().to_string()),
            Flag::Foreground => {}
        }
    }
}

/// Switches reserved by the generated flags
pub const GENERATED_SWITCHES: &[&str] = &["-i", "-f", "-n", "-N", "-u"];

/// Complete argument list for one arpwatch process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpwatchArgs {
    flags: Vec<Flag>,
    extra: Vec<String>,
}

impl ArpwatchArgs {
    /// Start a builder for monitoring `interface`
    pub fn builder(interface: impl Into<String>, data_file: impl Into<PathBuf>) -> ArpwatchArgsBuilder {
        ArpwatchArgsBuilder {
            interface: interface.into(),
            data_file: data_file.into(),
            network: None,
            drop_to: None,
            extra: Vec::new(),
        }
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn extra(&self) -> &[String] {
        &self.extra
    }

    pub fn interface(&self) -> &str {
        self.flags
            .iter()
            .find_map(|flag| match flag {
                Flag::Interface(name) => Some(name.as_str()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn data_file(&self) -> Option<&Path> {
        self.flags.iter().find_map(|flag| match flag {
            Flag::DataFile(path) => Some(path.as_path()),
            _ => None,
        })
    }

    pub fn drops_privileges(&self) -> bool {
        self.flags
            .iter()
            .any(|flag| matches!(flag, Flag::DropPrivileges(_)))
    }

    /// Extra tokens that repeat a switch the entrypoint already generates
    pub fn conflicting_extras(&self) -> Vec<&str> {
        self.extra
            .iter()
            .map(String::as_str)
            .filter(|token| GENERATED_SWITCHES.contains(token))
            .collect()
    }

    /// Render as an argv, without the program name
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.flags.len() * 2 + self.extra.len());
        for flag in &self.flags {
            flag.render(&mut argv);
        }
        argv.extend(self.extra.iter().cloned());
        argv
    }
}

#[derive(Debug, Clone)]
pub struct ArpwatchArgsBuilder {
    interface: String,
    data_file: PathBuf,
    network: Option<String>,
    drop_to: Option<String>,
    extra: Vec<String>,
}

impl ArpwatchArgsBuilder {
    pub fn network(mut self, network: Option<String>) -> Self {
        self.network = network;
        self
    }

    pub fn drop_privileges_to(mut self, user: Option<String>) -> Self {
        self.drop_to = user;
        self
    }

    pub fn extra<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra.extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Assemble flags in their fixed order; `-N` is always present
    pub fn build(self) -> ArpwatchArgs {
        let mut flags = vec![
            Flag::Interface(self.interface),
            Flag::DataFile(self.data_file),
        ];
        if let Some(network) = self.network {
            flags.push(Flag::Network(network));
        }
        flags.push(Flag::Foreground);
        if let Some(user) = self.drop_to {
            flags.push(Flag::DropPrivileges(user));
        }

        ArpwatchArgs {
            flags,
            extra: self.extra,
        }
    }
}
