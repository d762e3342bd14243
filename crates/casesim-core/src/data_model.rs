//! Data Model: Case, Stage, CaseKey
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CaseError;
use crate::loader::validate_stages;

/// A single question unit of a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Context shown before the question
    pub info: String,
    /// The question itself
    pub question: String,
    /// Answer options in canonical order
    pub options: Vec<String>,
    /// Index of the correct option within `options`
    pub correct_index: usize,
    /// Hint shown after a wrong answer
    pub feedback_wrong: String,
    /// Narrative revealed once the stage is solved
    pub next_info: String,
}

impl Stage {
    /// Build a stage with empty narrative text and the default hint.
    pub fn new(question: impl Into<String>, options: Vec<String>, correct_index: usize) -> Self {
        Self {
            info: String::new(),
            question: question.into(),
            options,
            correct_index,
            feedback_wrong: crate::DEFAULT_FEEDBACK_WRONG.to_string(),
            next_info: String::new(),
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback_wrong = feedback.into();
        self
    }

    pub fn with_next_info(mut self, next_info: impl Into<String>) -> Self {
        self.next_info = next_info.into();
        self
    }

    /// Text of the correct option.
    ///
    /// Validated stages always have one; an unvalidated stage with an
    /// out-of-range index yields an empty string.
    pub fn correct_text(&self) -> &str {
        self.options
            .get(self.correct_index)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// A complete, validated branching scenario.
///
/// Only constructible through [`Case::new`] or the loader, so every `Case`
/// in circulation has passed structural validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Case {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) summary: String,
    pub(crate) stages: Vec<Stage>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub(crate) fingerprint: String,
}

impl Case {
    /// Build and validate a case in code.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        summary: impl Into<String>,
        stages: Vec<Stage>,
    ) -> Result<Self, CaseError> {
        validate_stages(&stages)?;
        Ok(Self {
            id: id.into(),
            title: title.into(),
            summary: summary.into(),
            stages,
            fingerprint: String::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Content hash of the source this case was loaded from (`blake3:<hex>`),
    /// empty for cases built in code.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Best achievable score when every stage earns `full_credit`.
    pub fn max_score(&self, full_credit: f64) -> f64 {
        self.stages.len() as f64 * full_credit
    }
}

/// Identity under which a session keeps one engine per case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseKey(String);

impl CaseKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Case> for CaseKey {
    fn from(case: &Case) -> Self {
        CaseKey(case.id.clone())
    }
}

impl From<&str> for CaseKey {
    fn from(key: &str) -> Self {
        CaseKey(key.to_string())
    }
}

impl fmt::Display for CaseKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}
