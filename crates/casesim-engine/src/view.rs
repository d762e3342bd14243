//! Read-only projections of engine state handed to the presentation layer.
use serde::{Deserialize, Serialize};

use crate::history::HistoryEntry;

/// Where the engine is in its state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EngineState {
    InProgress { stage_index: usize, solved: bool },
    Complete,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            EngineState::InProgress {
                stage_index,
                solved: true,
            } => write!(f, "stage {} solved", stage_index),
            EngineState::InProgress { stage_index, .. } => {
                write!(f, "stage {} unsolved", stage_index)
            }
            EngineState::Complete => write!(f, "case complete"),
        }
    }
}

/// How a submitted choice was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Display index of a known option
    Resolved(usize),
    /// Did not match any option on display
    Unresolved,
}

/// Result of `submit_answer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Correct { credit: f64, attempts: usize },
    Incorrect { hint: String, selection: Selection },
}

impl Outcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, Outcome::Correct { .. })
    }
}

/// Result of `advance_stage`
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// Now on this stage
    NextStage(usize),
    Completed(CompletionSummary),
}

/// One earlier attempt on the current stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptView {
    /// 1-based
    pub number: usize,
    /// Option text, `None` for an unresolved selection
    pub choice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageView {
    pub stage_index: usize,
    pub stage_count: usize,
    pub info: String,
    pub question: String,
    /// Options in display order
    pub options: Vec<String>,
    pub attempts: Vec<AttemptView>,
    /// Hint from the last wrong answer
    pub hint: Option<String>,
    pub solved: bool,
    pub revealed: bool,
    /// Only set once the stage is solved
    pub next_info: Option<String>,
    /// Correct option text, only set once solved
    pub answer: Option<String>,
    pub reveal_available: bool,
    pub score: f64,
}

/// End-of-case summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub case_id: String,
    pub title: String,
    pub score: f64,
    pub max_score: f64,
    pub stage_count: usize,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum EngineView {
    InProgress(StageView),
    Complete(CompletionSummary),
}

impl EngineView {
    pub fn is_complete(&self) -> bool {
        matches!(self, EngineView::Complete(_))
    }

    pub fn stage(&self) -> Option<&StageView> {
        match self {
            EngineView::InProgress(stage) => Some(stage),
            EngineView::Complete(_) => None,
        }
    }

    pub fn summary(&self) -> Option<&CompletionSummary> {
        match self {
            EngineView::Complete(summary) => Some(summary),
            EngineView::InProgress(_) => None,
        }
    }
}
