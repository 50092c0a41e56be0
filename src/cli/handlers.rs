//! Command handlers returning process exit codes

use std::path::Path;

use tracing::{error, info};

use crate::config::BatonConfig;
use crate::pipeline::{validate_phases, PipelineDefinition, PipelineRunner, RunState};
use crate::report::{Report, ReportFormat, ReportWriter};

use super::commands::{RunArgs, ValidateArgs};

const EXIT_OK: i32 = 0;
const EXIT_RUN_FAILED: i32 = 1;
const EXIT_CONFIG_ERROR: i32 = 2;

pub async fn handle_run(args: &RunArgs, quiet: bool) -> i32 {
    let definition = match PipelineDefinition::from_path(&args.pipeline) {
        Ok(definition) => definition,
        Err(e) => {
            error!("Failed to load pipeline definition: {}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    let mut config = BatonConfig::default();
    // Precedence: CLI flag, then definition file, then environment
    if let Some(model) = args.model.clone().or_else(|| definition.model.clone()) {
        config.model = model;
    }
    if let Some(fallback) = args
        .fallback_model
        .clone()
        .or_else(|| definition.fallback_model.clone())
    {
        config.fallback_model = Some(fallback);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return EXIT_CONFIG_ERROR;
    }

    let client = match config.create_client() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create completion client: {}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    let runner = match PipelineRunner::new(
        definition.phases,
        client,
        config.policy(),
        config.model.clone(),
    ) {
        Ok(runner) => runner,
        Err(e) => {
            error!("Invalid pipeline: {}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    let outcome = runner.run().await;
    let report = Report::from_outcome(&outcome);

    if let Err(code) = emit_report(&report, args, quiet) {
        return code;
    }

    match &outcome.state {
        RunState::Completed => {
            info!(
                phases = outcome.summary.phases.len(),
                "Pipeline completed"
            );
            EXIT_OK
        }
        RunState::Failed { phase_id, kind } => {
            // Completed outputs are already in the report for inspection
            error!(
                phase = %phase_id,
                kind = %kind,
                completed = outcome.summary.phases.len(),
                "Pipeline failed"
            );
            EXIT_RUN_FAILED
        }
        other => {
            error!("Pipeline ended in non-terminal state: {:?}", other);
            EXIT_RUN_FAILED
        }
    }
}

fn emit_report(report: &Report, args: &RunArgs, quiet: bool) -> Result<(), i32> {
    let format: ReportFormat = args.format.into();

    if let Some(path) = &args.output {
        if let Err(e) = ReportWriter::write(report, path, format) {
            error!("Failed to write report: {}", e);
            return Err(EXIT_RUN_FAILED);
        }
        if !quiet {
            println!("Report written to {}", path.display());
        }
        return Ok(());
    }

    let rendered = match format {
        ReportFormat::Json => match report.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return Err(EXIT_RUN_FAILED);
            }
        },
        ReportFormat::Text => report.render_text(),
    };
    println!("{}", rendered);
    Ok(())
}

pub fn handle_validate(args: &ValidateArgs) -> i32 {
    match load_and_validate(&args.pipeline) {
        Ok(count) => {
            println!(
                "{}: {} phase(s), configuration OK",
                args.pipeline.display(),
                count
            );
            EXIT_OK
        }
        Err(message) => {
            error!("{}", message);
            EXIT_CONFIG_ERROR
        }
    }
}

fn load_and_validate(path: &Path) -> Result<usize, String> {
    let definition = PipelineDefinition::from_path(path).map_err(|e| e.to_string())?;
    validate_phases(&definition.phases).map_err(|e| e.to_string())?;
    Ok(definition.phases.len())
}
