//! CLI argument parsing module
//!
//! Handles the command-line surface using clap:
//! - Optional settings file
//! - Dry-run printing of the arpwatch command line
//! - Supervisor timing overrides
//! - The trailing command, which either names arpwatch or replaces the entrypoint

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

use crate::config::Overrides;
use crate::supervisor::is_escape_hatch;

/// What the entrypoint was asked to do
#[derive(Debug, Clone)]
pub enum Invocation {
    /// Replace this process with an arbitrary command
    Exec(Vec<String>),
    /// Configure and supervise arpwatch
    Run(RunOptions),
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub overrides: Overrides,
    pub print_args: bool,
    pub json_output: bool,
}

fn build_command() -> Command {
    Command::new("arpwatch-entrypoint")
        .version(env!("ENTRYPOINT_VERSION"))
        .long_version(concat!(env!("ENTRYPOINT_VERSION"), " (", env!("GIT_HASH"), ")"))
        .about("Configure arpwatch from the environment and supervise it")
        .long_about(
            "Container entrypoint for arpwatch. Reads ARPWATCH_INTERFACE, ARPWATCH_NETWORK, \
             ARPWATCH_OPTS, ARPWATCH_DATA_DIR and ARPWATCH_SKIP_PRIVDROP, launches arpwatch in \
             the foreground and exits when it does. Any COMMAND other than arpwatch is executed \
             in place of the entrypoint.",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML settings file; environment variables take precedence")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("print-args")
                .long("print-args")
                .help("Print the arpwatch command line instead of launching it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("With --print-args, print a JSON object")
                .requires("print-args")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("settle-delay")
                .long("settle-delay")
                .value_name("SECS")
                .help("Seconds to wait after launch before checking arpwatch is alive")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("poll-interval")
                .long("poll-interval")
                .value_name("SECS")
                .help("Seconds between liveness checks while supervising")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("command")
                .value_name("COMMAND")
                .help("`arpwatch [OPTS...]` (default) or a command to run instead")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true),
        )
}

/// Parse the process command line
pub fn parse_args() -> Invocation {
    from_matches(&build_command().get_matches())
}

/// Parse an explicit argument list
pub fn try_parse_from<I, T>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Ok(from_matches(&build_command().try_get_matches_from(args)?))
}

fn from_matches(matches: &ArgMatches) -> Invocation {
    let command: Vec<String> = matches
        .get_many::<String>("command")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    if is_escape_hatch(&command) {
        return Invocation::Exec(command);
    }

    let overrides = Overrides {
        config_path: matches.get_one::<PathBuf>("config").cloned(),
        settle_delay: matches.get_one::<f64>("settle-delay").copied(),
        poll_interval: matches.get_one::<f64>("poll-interval").copied(),
        trailing_options: command.into_iter().skip(1).collect(),
    };

    Invocation::Run(RunOptions {
        overrides,
        print_args: matches.get_flag("print-args"),
        json_output: matches.get_flag("json"),
    })
}
