use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::report::ReportFormat;

/// Sequential multi-phase LLM pipeline orchestrator
#[derive(Parser, Debug)]
#[command(
    name = "baton",
    about = "Sequential multi-phase LLM pipeline orchestrator",
    version,
    author,
    long_about = "baton drives an ordered list of persona-bound phases against a \
                  text-completion backend, feeding each phase's output into the \
                  context of every later phase, and persists the accumulated \
                  results as a report."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Increase verbosity")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run a pipeline and persist the report",
        long_about = "Loads a pipeline definition, executes every phase in order \
                      against the configured backend, and writes the report.\n\n\
                      Examples:\n  \
                      baton run --pipeline conference.toml\n  \
                      baton run --pipeline travel.yaml --output report.json\n  \
                      baton run --pipeline conference.toml --format text --model gpt-4o"
    )]
    Run(RunArgs),

    #[command(
        about = "Validate a pipeline definition without running it",
        long_about = "Parses the definition and applies the same eager checks the \
                      runner performs (non-empty phase list, unique ids, selector \
                      references) without issuing any backend call.\n\n\
                      Examples:\n  \
                      baton validate --pipeline conference.toml"
    )]
    Validate(ValidateArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[arg(
        short = 'p',
        long,
        value_name = "FILE",
        help = "Pipeline definition file (.toml, .yaml, or .yml)"
    )]
    pub pipeline: PathBuf,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write the report to a file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "json",
        help = "Report format"
    )]
    pub format: ReportFormatArg,

    #[arg(
        short = 'm',
        long,
        value_name = "MODEL",
        help = "Primary model, overriding the definition and environment"
    )]
    pub model: Option<String>,

    #[arg(
        long,
        value_name = "MODEL",
        help = "Fallback model tried once on rate limits"
    )]
    pub fallback_model: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(
        short = 'p',
        long,
        value_name = "FILE",
        help = "Pipeline definition file (.toml, .yaml, or .yml)"
    )]
    pub pipeline: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormatArg {
    Json,
    Text,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Json => ReportFormat::Json,
            ReportFormatArg::Text => ReportFormat::Text,
        }
    }
}
