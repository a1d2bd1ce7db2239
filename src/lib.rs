//! arpwatch-entrypoint - container entrypoint library
//!
//! Translates environment configuration into an arpwatch command line and
//! supervises the resulting process.

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod output;
pub mod supervisor;
pub mod translator;
