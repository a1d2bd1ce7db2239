//! Output formatting module
//!
//! Renders a translated launch plan for `--print-args`, either as a shell-like
//! command line or as JSON.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::translator::{DataFileStatus, Translation};

/// JSON shape of a launch plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchPlan {
    pub binary: String,
    pub args: Vec<String>,
    pub interface: String,
    pub drop_privileges: bool,
    pub data_file_status: DataFileStatus,
}

impl From<&Translation> for LaunchPlan {
    fn from(translation: &Translation) -> Self {
        LaunchPlan {
            binary: translation.binary.clone(),
            args: translation.args.to_argv(),
            interface: translation.args.interface().to_string(),
            drop_privileges: translation.args.drops_privileges(),
            data_file_status: translation.data_file_status,
        }
    }
}

/// Command line on one line, arguments separated by single spaces
pub fn format_human(translation: &Translation) -> String {
    translation.command_line().join(" ")
}

pub fn format_json(translation: &Translation) -> Result<String> {
    Ok(serde_json::to_string_pretty(&LaunchPlan::from(translation))?)
}

pub fn print_translation(translation: &Translation, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", format_json(translation)?);
    } else {
        println!("{}", format_human(translation));
    }
    Ok(())
}
