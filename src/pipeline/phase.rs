//! Phase descriptions and context selection
//!
//! A phase is pure configuration: a stable id, opaque persona text, and a
//! rule deciding which prior outputs feed its prompt. Behavior (retry,
//! truncation, fallback) never depends on persona content.

use super::store::ContextEntry;
use serde::Deserialize;

/// Rule deciding which prior phase outputs are visible to a phase.
///
/// Parsed from pipeline definitions as `"all-prior"`, `"none"`, or a list of
/// phase ids.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SelectorDef")]
pub enum ContextSelector {
    /// All prior outputs, concatenated in pipeline order (default)
    AllPrior,
    /// No context; the phase sees only its persona
    None,
    /// Only the named prior outputs, in pipeline order
    NamedSubset(Vec<String>),
}

impl Default for ContextSelector {
    fn default() -> Self {
        ContextSelector::AllPrior
    }
}

impl ContextSelector {
    /// Filters a store snapshot down to the entries this phase may see.
    ///
    /// Pure; preserves insertion order; never invents entries.
    pub fn select(&self, snapshot: &[ContextEntry]) -> Vec<ContextEntry> {
        match self {
            ContextSelector::AllPrior => snapshot.to_vec(),
            ContextSelector::None => Vec::new(),
            ContextSelector::NamedSubset(ids) => snapshot
                .iter()
                .filter(|entry| ids.iter().any(|id| id == &entry.id))
                .cloned()
                .collect(),
        }
    }

    /// Ids referenced by this selector, for eager validation.
    pub fn referenced_ids(&self) -> &[String] {
        match self {
            ContextSelector::NamedSubset(ids) => ids,
            _ => &[],
        }
    }
}

/// Raw selector shape as it appears in definition files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SelectorDef {
    Rule(String),
    Subset(Vec<String>),
}

impl TryFrom<SelectorDef> for ContextSelector {
    type Error = String;

    fn try_from(def: SelectorDef) -> Result<Self, Self::Error> {
        match def {
            SelectorDef::Rule(rule) => match rule.as_str() {
                "all-prior" => Ok(ContextSelector::AllPrior),
                "none" => Ok(ContextSelector::None),
                other => Err(format!(
                    "Unknown context rule: {}. Valid options: \"all-prior\", \"none\", or a list of phase ids",
                    other
                )),
            },
            SelectorDef::Subset(ids) => Ok(ContextSelector::NamedSubset(ids)),
        }
    }
}

/// Static description of one pipeline stage.
///
/// Constructed once at configuration time and immutable thereafter.
#[derive(Debug, Clone, Deserialize)]
pub struct PhaseSpec {
    /// Unique, stable identifier; doubles as the context key
    pub id: String,
    /// Role/instruction text framing the phase's prompt
    pub persona: String,
    /// Which prior outputs feed this phase
    #[serde(default, rename = "context")]
    pub selector: ContextSelector,
}

impl PhaseSpec {
    /// Creates a phase with the default `all-prior` selector
    pub fn new(id: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            persona: persona.into(),
            selector: ContextSelector::AllPrior,
        }
    }

    pub fn with_selector(mut self, selector: ContextSelector) -> Self {
        self.selector = selector;
        self
    }
}
