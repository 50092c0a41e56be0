use baton::cli::{handle_run, handle_validate, CliArgs, Commands};
use baton::util::{init_logging, parse_level, LoggingConfig};
use baton::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let json = env::var("BATON_LOG_JSON")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    init_logging(LoggingConfig {
        level: level_from_args(&args),
        json,
        ..LoggingConfig::default()
    });

    debug!("baton v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Run(run_args) => handle_run(run_args, args.quiet).await,
        Commands::Validate(validate_args) => handle_validate(validate_args),
    };

    std::process::exit(exit_code);
}

/// Flags win over the environment: `--log-level`, then `-v`/`-q`, then
/// `BATON_LOG_LEVEL`.
fn level_from_args(args: &CliArgs) -> Level {
    if let Some(name) = &args.log_level {
        parse_level(name).unwrap_or_else(|| {
            eprintln!(
                "Invalid log level '{}', using info. Valid levels: trace, debug, info, warn, error",
                name
            );
            Level::INFO
        })
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        env::var("BATON_LOG_LEVEL")
            .ok()
            .and_then(|name| parse_level(&name))
            .unwrap_or(Level::INFO)
    }
}
