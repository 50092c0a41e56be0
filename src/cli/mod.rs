//! Command-line interface

pub mod commands;
pub mod handlers;

pub use commands::{CliArgs, Commands, ReportFormatArg, RunArgs, ValidateArgs};
pub use handlers::{handle_run, handle_validate};
