//! Case loading and structural validation.
//!
//! Case files are JSON (native format) or YAML with the same schema:
//!
//! ```text
//! id, title, summary,
//! stages: [ { info, question, options[], correct, feedback_wrong, next_info } ]
//! ```
//!
//! Every rule that makes a case unusable is enforced here, so the engine
//! never has to deal with a bad `correct` index or an empty option list.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::data_model::{Case, Stage};
use crate::error::CaseError;
use crate::DEFAULT_FEEDBACK_WRONG;

/// Raw case file as written on disk. Everything is optional so missing
/// fields surface as `MalformedCase` with the field named, not as a parser
/// message.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseFile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub stages: Option<Vec<StageFile>>,
}

/// Raw stage entry
#[derive(Debug, Clone, Deserialize)]
pub struct StageFile {
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    /// Signed so that a negative index is reported as out of range
    #[serde(default, alias = "correct_index", alias = "correctIndex")]
    pub correct: Option<i64>,
    #[serde(default, alias = "feedbackWrong")]
    pub feedback_wrong: Option<String>,
    #[serde(default, alias = "nextInfo")]
    pub next_info: Option<String>,
}

impl CaseFile {
    /// Validate and convert into a [`Case`].
    pub fn into_case(self, fallback_id: &str, fingerprint: String) -> Result<Case, CaseError> {
        let title = self
            .title
            .ok_or_else(|| CaseError::malformed("title", "required field is missing"))?;
        let raw_stages = self
            .stages
            .ok_or_else(|| CaseError::malformed("stages", "required field is missing"))?;

        let mut stages = Vec::with_capacity(raw_stages.len());
        for (i, raw) in raw_stages.into_iter().enumerate() {
            stages.push(raw.into_stage(i)?);
        }
        validate_stages(&stages)?;

        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| fallback_id.to_string());

        Ok(Case {
            id,
            title,
            summary: self.summary.unwrap_or_default(),
            stages,
            fingerprint,
        })
    }
}

impl StageFile {
    fn into_stage(self, index: usize) -> Result<Stage, CaseError> {
        let field = format!("stages[{}].correct", index);
        let correct = self
            .correct
            .ok_or_else(|| CaseError::malformed(&field, "required field is missing"))?;
        let correct_index = usize::try_from(correct).map_err(|_| {
            CaseError::malformed(&field, format!("index {} is negative", correct))
        })?;

        Ok(Stage {
            info: self.info.unwrap_or_default(),
            question: self.question.unwrap_or_default(),
            options: self.options,
            correct_index,
            feedback_wrong: self
                .feedback_wrong
                .unwrap_or_else(|| DEFAULT_FEEDBACK_WRONG.to_string()),
            next_info: self.next_info.unwrap_or_default(),
        })
    }
}

/// Structural checks shared by the loader and [`Case::new`].
pub(crate) fn validate_stages(stages: &[Stage]) -> Result<(), CaseError> {
    for (i, stage) in stages.iter().enumerate() {
        if stage.options.is_empty() {
            return Err(CaseError::malformed(
                format!("stages[{}].options", i),
                "a stage needs at least one option",
            ));
        }

        if stage.correct_index >= stage.options.len() {
            return Err(CaseError::malformed(
                format!("stages[{}].correct", i),
                format!(
                    "index {} out of range for {} options",
                    stage.correct_index,
                    stage.options.len()
                ),
            ));
        }

        // Answers are resolved by option text, so duplicates would be ambiguous.
        let mut seen = HashSet::new();
        for (j, option) in stage.options.iter().enumerate() {
            if !seen.insert(option.as_str()) {
                return Err(CaseError::malformed(
                    format!("stages[{}].options[{}]", i, j),
                    format!("duplicate option text {:?}", option),
                ));
            }
        }
    }
    Ok(())
}

fn fingerprint(bytes: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(bytes))
}

impl Case {
    /// Parse and validate a case from JSON.
    pub fn from_json(json: &str) -> Result<Self, CaseError> {
        let file: CaseFile = serde_json::from_str(json).map_err(|e| CaseError::Parse {
            format: "json",
            message: e.to_string(),
        })?;
        file.into_case("", fingerprint(json.as_bytes()))
    }

    /// Parse and validate a case from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, CaseError> {
        let file: CaseFile = serde_yaml::from_str(yaml).map_err(|e| CaseError::Parse {
            format: "yaml",
            message: e.to_string(),
        })?;
        file.into_case("", fingerprint(yaml.as_bytes()))
    }
}

/// Load a case file, picking the format from its extension.
///
/// A case without an `id` takes the file stem as its id.
pub fn load_case(path: impl AsRef<Path>) -> Result<Case, CaseError> {
    let path = path.as_ref();
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => "json",
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => "yaml",
        _ => return Err(CaseError::UnsupportedFormat(path.to_path_buf())),
    };

    let content = std::fs::read_to_string(path).map_err(|source| CaseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let file: CaseFile = if format == "json" {
        serde_json::from_str(&content).map_err(|e| CaseError::Parse {
            format,
            message: e.to_string(),
        })?
    } else {
        serde_yaml::from_str(&content).map_err(|e| CaseError::Parse {
            format,
            message: e.to_string(),
        })?
    };

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let case = file.into_case(&stem, fingerprint(content.as_bytes()))?;

    tracing::debug!(
        path = %path.display(),
        case_id = %case.id,
        stages = case.stages.len(),
        "loaded case"
    );
    Ok(case)
}
