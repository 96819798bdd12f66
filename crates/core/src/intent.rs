//! Structured output of the external intent classifier.
//!
//! The classifier itself lives outside this workspace. It turns free text
//! into a [`ParsedIntent`]; nothing downstream of this type sees raw text
//! except as the audit-trail `raw_input` stored on created records.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Tag applied by a classify intent that names no tag.
pub const DEFAULT_TAG: &str = "default";

/// Confidence assumed when the classifier omits one.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Record,
    #[default]
    Search,
    Delete,
    Classify,
    Statistics,
}

/// A classified user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIntent {
    #[serde(default)]
    pub intent: Intent,
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

impl ParsedIntent {
    /// Validate the classifier output.
    ///
    /// Confidence must lie in `[0, 1]`; a record intent needs an item.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(CoreError::Validation(format!(
                "confidence must be between 0 and 1, got {}",
                self.confidence
            )));
        }
        if self.intent == Intent::Record && self.item.trim().is_empty() {
            return Err(CoreError::Validation(
                "record intent requires a non-empty item".to_string(),
            ));
        }
        Ok(())
    }

    /// The tag to apply for a classify intent.
    pub fn tag_or_default(&self) -> &str {
        match self.tag.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => DEFAULT_TAG,
        }
    }

    /// Confidence formatted as a percentage with one decimal, e.g. `"95.0%"`.
    pub fn confidence_label(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }
}
