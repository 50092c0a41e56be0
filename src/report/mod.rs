//! Durable run artifacts
//!
//! A `Report` captures the ordered `(id, output)` pairs of a finished run
//! plus per-phase flags and run metadata. JSON is the round-trippable
//! serialization; the text rendering is a one-way human view.

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::{RunOutcome, RunState};

const DIVIDER: &str = "--------------------------------------------------------------------------------";
const BANNER: &str = "================================================================================";

/// One phase's recorded output and execution flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub id: String,
    pub output: String,
    /// Context was dropped to fit the prompt budget
    #[serde(default)]
    pub truncated: bool,
    /// The fallback model produced this output
    #[serde(default)]
    pub used_fallback: bool,
    /// Completion attempts the phase needed
    #[serde(default)]
    pub attempts: usize,
}

/// Serialized rendering of a run's accumulated outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub state: RunState,
    /// Phase records in execution order
    pub phases: Vec<PhaseRecord>,
}

impl Report {
    /// Builds the report from a finished run.
    ///
    /// Record order follows the store's insertion order; flags come from the
    /// run summary, matched by phase id.
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        let phases = outcome
            .store
            .pairs()
            .into_iter()
            .map(|(id, output)| {
                let executed = outcome.summary.phases.iter().find(|p| p.id == id);
                PhaseRecord {
                    truncated: executed.map(|p| p.truncated).unwrap_or(false),
                    used_fallback: executed.map(|p| p.used_fallback).unwrap_or(false),
                    attempts: executed.map(|p| p.attempts).unwrap_or(0),
                    id,
                    output,
                }
            })
            .collect();

        Self {
            run_id: outcome.run_id,
            generated_at: Utc::now(),
            model: outcome.model.clone(),
            state: outcome.state.clone(),
            phases,
        }
    }

    /// Ordered `(id, output)` pairs, the artifact's payload.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.phases
            .iter()
            .map(|p| (p.id.clone(), p.output.clone()))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Human-readable rendering for terminals. One-way; parse the JSON form
    /// instead when the pairs need to be recovered.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(BANNER);
        out.push_str("\nPIPELINE REPORT\n");
        out.push_str(BANNER);
        out.push('\n');
        out.push_str(&format!("Run: {}\n", self.run_id));
        out.push_str(&format!(
            "Generated: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str(&format!("Model: {}\n", self.model));
        match &self.state {
            RunState::Completed => out.push_str("State: completed\n"),
            RunState::Failed { phase_id, kind } => {
                out.push_str(&format!("State: failed at '{}' ({})\n", phase_id, kind));
            }
            other => out.push_str(&format!("State: {:?}\n", other)),
        }

        for record in &self.phases {
            out.push('\n');
            out.push_str(DIVIDER);
            out.push('\n');
            out.push_str(&record.id.to_uppercase());
            let mut notes = Vec::new();
            if record.truncated {
                notes.push("truncated context");
            }
            if record.used_fallback {
                notes.push("fallback model");
            }
            if !notes.is_empty() {
                out.push_str(&format!(" ({})", notes.join(", ")));
            }
            out.push('\n');
            out.push_str(DIVIDER);
            out.push('\n');
            out.push_str(&record.output);
            out.push('\n');
        }

        out
    }
}

/// Output format for persisted reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Text,
}

/// Persists reports to disk.
pub struct ReportWriter;

impl ReportWriter {
    pub fn write(report: &Report, path: &Path, format: ReportFormat) -> anyhow::Result<()> {
        let rendered = match format {
            ReportFormat::Json => report
                .to_json()
                .context("Failed to serialize report to JSON")?,
            ReportFormat::Text => report.render_text(),
        };

        fs::write(path, rendered)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }
}
