#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use log::info;

use arpwatch_entrypoint::cli::{self, Invocation};
use arpwatch_entrypoint::config::Settings;
use arpwatch_entrypoint::logging;
use arpwatch_entrypoint::output;
use arpwatch_entrypoint::supervisor::{self, Outcome};
use arpwatch_entrypoint::translator::{self, PrivilegeContext};

fn main() -> Result<()> {
    let options = match cli::parse_args() {
        Invocation::Exec(command) => return Err(supervisor::exec_command(&command)),
        Invocation::Run(options) => options,
    };

    logging::init_logger()?;

    let settings = Settings::from_env(&options.overrides)?;
    let translation = translator::translate(&settings, PrivilegeContext::current())?;

    if options.print_args {
        return output::print_translation(&translation, options.json_output);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match runtime.block_on(supervisor::run(&translation, settings.timings))? {
        Outcome::Shutdown(signal) => info!("Stopped after {}", signal),
    }

    Ok(())
}
