//! Stage progression state machine
//!
//! ```text
//!                submit (wrong)
//!                 ┌────────┐
//!                 ▼        │
//!   ──► InProgress(i, Unsolved) ──submit (right) / reveal──► InProgress(i, Solved)
//!                 ▲                                               │
//!                 │             advance (i + 1 < N)               │
//!                 └───────────────────────────────────────────────┤
//!                                                                 │ advance (i + 1 == N)
//!                                                                 ▼
//!                                                              Complete
//! ```
//!
//! Every operation either fully applies or returns
//! `EngineError::InvalidTransition` without touching any state.

use casesim_core::{Case, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::EngineError;
use crate::history::{HistoryEntry, HistoryLog};
use crate::profile::{EngineConfig, ScoringProfile};
use crate::session::SessionId;
use crate::shuffle::{
    IdentityShuffler, OptionShuffler, ShuffleCache, ShuffleKey, ShuffleMapping, UniformShuffler,
};
use crate::view::{
    AdvanceOutcome, AttemptView, CompletionSummary, EngineState, EngineView, Outcome, Selection,
    StageView,
};

/// One submission on a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub stage_index: usize,
    pub selection: Selection,
    pub submitted_at: DateTime<Utc>,
}

/// Runs one case for one session
pub struct StageEngine {
    session_id: SessionId,
    case: Arc<Case>,
    profile: ScoringProfile,
    shuffler: Box<dyn OptionShuffler>,
    mappings: ShuffleCache,

    current: usize,
    score: f64,
    attempts: BTreeMap<usize, Vec<AttemptRecord>>,
    solved: bool,
    revealed: bool,
    stage_credit: f64,
    recorded: HashSet<usize>,
    last_hint: String,
    history: HistoryLog,
}

impl StageEngine {
    /// Create an engine; the shuffler follows `config.shuffle`.
    pub fn new(case: Arc<Case>, config: EngineConfig) -> Self {
        let shuffler: Box<dyn OptionShuffler> = if config.shuffle {
            Box::new(UniformShuffler::new())
        } else {
            Box::new(IdentityShuffler)
        };
        Self::with_shuffler(case, config, shuffler)
    }

    /// Create an engine with an explicit shuffler.
    ///
    /// `config.shuffle == false` still wins and forces the canonical order.
    pub fn with_shuffler(
        case: Arc<Case>,
        config: EngineConfig,
        shuffler: Box<dyn OptionShuffler>,
    ) -> Self {
        let shuffler: Box<dyn OptionShuffler> = if config.shuffle {
            shuffler
        } else {
            Box::new(IdentityShuffler)
        };

        let mut engine = Self {
            session_id: SessionId::new(),
            case,
            profile: config.profile,
            shuffler,
            mappings: ShuffleCache::new(),
            current: 0,
            score: 0.0,
            attempts: BTreeMap::new(),
            solved: false,
            revealed: false,
            stage_credit: 0.0,
            recorded: HashSet::new(),
            last_hint: String::new(),
            history: HistoryLog::new(),
        };
        engine.enter_stage();

        tracing::debug!(
            session = %engine.session_id,
            case_id = engine.case.id(),
            stages = engine.case.len(),
            profile = %engine.profile.name,
            shuffler = engine.shuffler.name(),
            "engine created"
        );
        engine
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Submit the text of the chosen option.
    ///
    /// Text that matches no displayed option counts as an unresolved,
    /// always-wrong attempt.
    pub fn submit_answer(&mut self, selected: &str) -> Result<Outcome, EngineError> {
        self.ensure_unsolved("submit_answer")?;
        let selection = match self.current_mapping().resolve(selected) {
            Some(index) => Selection::Resolved(index),
            None => Selection::Unresolved,
        };
        Ok(self.apply_selection(selection))
    }

    /// Submit by display position. An out-of-range index is recorded as an
    /// unresolved selection.
    pub fn submit_choice(&mut self, display_index: usize) -> Result<Outcome, EngineError> {
        self.ensure_unsolved("submit_choice")?;
        let selection = if display_index < self.current_mapping().len() {
            Selection::Resolved(display_index)
        } else {
            Selection::Unresolved
        };
        Ok(self.apply_selection(selection))
    }

    /// Give up on the current stage once the profile allows it. The stage
    /// becomes solved with no credit; returns the correct option text.
    pub fn reveal_answer(&mut self) -> Result<String, EngineError> {
        self.ensure_unsolved("reveal_answer")?;
        if !self.reveal_available() {
            return Err(self.invalid("reveal_answer"));
        }

        let answer = self.current_mapping().correct_text().to_string();
        self.solved = true;
        self.revealed = true;
        self.stage_credit = 0.0;
        self.last_hint.clear();

        tracing::info!(
            session = %self.session_id,
            stage = self.current,
            attempts = self.attempt_count(self.current),
            "answer revealed"
        );
        Ok(answer)
    }

    /// Leave a solved stage, recording it in the history first.
    pub fn advance_stage(&mut self) -> Result<AdvanceOutcome, EngineError> {
        if self.is_complete() || !self.solved {
            return Err(self.invalid("advance_stage"));
        }

        let index = self.current;
        if !self.recorded.contains(&index) {
            let entry = self.history_entry(index);
            self.history.record(entry);
            self.recorded.insert(index);
        }

        self.mappings
            .invalidate(&ShuffleKey::new(self.session_id, index));
        self.current += 1;
        self.solved = false;
        self.revealed = false;
        self.stage_credit = 0.0;
        self.last_hint.clear();

        if self.is_complete() {
            tracing::info!(
                session = %self.session_id,
                case_id = self.case.id(),
                score = self.score,
                "case complete"
            );
            return Ok(AdvanceOutcome::Completed(self.completion_summary()));
        }

        self.enter_stage();
        tracing::info!(session = %self.session_id, stage = self.current, "advanced to stage");
        Ok(AdvanceOutcome::NextStage(self.current))
    }

    /// Back to a fresh start. Valid in any state.
    pub fn reset(&mut self) {
        self.mappings.clear_session(self.session_id);
        self.current = 0;
        self.score = 0.0;
        self.attempts.clear();
        self.solved = false;
        self.revealed = false;
        self.stage_credit = 0.0;
        self.recorded.clear();
        self.last_hint.clear();
        self.history = HistoryLog::new();
        self.enter_stage();

        tracing::info!(session = %self.session_id, case_id = self.case.id(), "case reset");
    }

    // ========================================================================
    // PROJECTIONS
    // ========================================================================

    pub fn current_view(&self) -> EngineView {
        let Some(stage) = self.current_stage() else {
            return EngineView::Complete(self.completion_summary());
        };
        let mapping = self.mappings.get(&self.current_key());
        let options = match mapping {
            Some(m) => m.display_options.clone(),
            None => stage.options.clone(),
        };

        let attempts = self
            .attempts(self.current)
            .iter()
            .enumerate()
            .map(|(i, record)| AttemptView {
                number: i + 1,
                choice: match record.selection {
                    Selection::Resolved(index) => options.get(index).cloned(),
                    Selection::Unresolved => None,
                },
            })
            .collect();

        let answer = if self.solved {
            Some(match mapping {
                Some(m) => m.correct_text().to_string(),
                None => stage.correct_text().to_string(),
            })
        } else {
            None
        };

        EngineView::InProgress(StageView {
            stage_index: self.current,
            stage_count: self.case.len(),
            info: stage.info.clone(),
            question: stage.question.clone(),
            options,
            attempts,
            hint: (!self.last_hint.is_empty()).then(|| self.last_hint.clone()),
            solved: self.solved,
            revealed: self.revealed,
            next_info: self.solved.then(|| stage.next_info.clone()),
            answer,
            reveal_available: self.reveal_available(),
            score: self.score,
        })
    }

    pub fn state(&self) -> EngineState {
        if self.is_complete() {
            EngineState::Complete
        } else {
            EngineState::InProgress {
                stage_index: self.current,
                solved: self.solved,
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.case.len()
    }

    pub fn current_stage_index(&self) -> usize {
        self.current
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn max_score(&self) -> f64 {
        self.case.max_score(self.profile.full_credit())
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Attempts made on a stage, oldest first
    pub fn attempts(&self, stage_index: usize) -> &[AttemptRecord] {
        self.attempts
            .get(&stage_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Display mapping of the stage being visited, `None` once complete
    pub fn display_mapping(&self) -> Option<&ShuffleMapping> {
        self.mappings.get(&self.current_key())
    }

    pub fn last_hint(&self) -> &str {
        &self.last_hint
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn case(&self) -> &Arc<Case> {
        &self.case
    }

    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    pub fn completion_summary(&self) -> CompletionSummary {
        CompletionSummary {
            case_id: self.case.id().to_string(),
            title: self.case.title().to_string(),
            score: self.score,
            max_score: self.max_score(),
            stage_count: self.case.len(),
            history: self.history.entries().to_vec(),
        }
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn current_stage(&self) -> Option<&Stage> {
        self.case.stage(self.current)
    }

    fn current_key(&self) -> ShuffleKey {
        ShuffleKey::new(self.session_id, self.current)
    }

    /// Materialise the display mapping for the stage being entered.
    fn enter_stage(&mut self) {
        let key = self.current_key();
        let Some(stage) = self.case.stage(self.current) else {
            return;
        };
        let shuffler = &mut self.shuffler;
        self.mappings.get_or_insert_with(key, || {
            ShuffleMapping::from_order_or_identity(stage, shuffler.shuffle(stage))
        });
    }

    /// Mapping of the current stage, created if it is somehow missing.
    /// Callers must have checked that the case is not complete.
    fn current_mapping(&mut self) -> &ShuffleMapping {
        let key = self.current_key();
        let stage = &self.case.stages()[self.current];
        let shuffler = &mut self.shuffler;
        self.mappings.get_or_insert_with(key, || {
            ShuffleMapping::from_order_or_identity(stage, shuffler.shuffle(stage))
        })
    }

    fn ensure_unsolved(&self, operation: &'static str) -> Result<(), EngineError> {
        if self.is_complete() || self.solved {
            return Err(self.invalid(operation));
        }
        Ok(())
    }

    fn invalid(&self, operation: &'static str) -> EngineError {
        tracing::warn!(
            session = %self.session_id,
            operation,
            state = %self.state(),
            "rejected invalid transition"
        );
        EngineError::InvalidTransition {
            operation,
            state: self.state().to_string(),
        }
    }

    fn apply_selection(&mut self, selection: Selection) -> Outcome {
        let index = self.current;
        let correct = match selection {
            Selection::Resolved(d) => self.current_mapping().is_correct(d),
            Selection::Unresolved => false,
        };

        let records = self.attempts.entry(index).or_default();
        records.push(AttemptRecord {
            stage_index: index,
            selection,
            submitted_at: Utc::now(),
        });
        let attempts = records.len();

        if correct {
            let credit = self.profile.credit_for_attempt(attempts);
            self.score += credit;
            self.stage_credit = credit;
            self.solved = true;
            self.last_hint.clear();

            tracing::debug!(
                session = %self.session_id,
                stage = index,
                attempts,
                credit,
                "correct answer"
            );
            Outcome::Correct { credit, attempts }
        } else {
            let hint = self.case.stages()[index].feedback_wrong.clone();
            self.last_hint = hint.clone();

            tracing::debug!(
                session = %self.session_id,
                stage = index,
                attempts,
                ?selection,
                "incorrect answer"
            );
            Outcome::Incorrect { hint, selection }
        }
    }

    fn attempt_count(&self, stage_index: usize) -> usize {
        self.attempts(stage_index).len()
    }

    fn reveal_available(&self) -> bool {
        !self.is_complete()
            && !self.solved
            && self.profile.allows_reveal(self.attempt_count(self.current))
    }

    fn history_entry(&self, index: usize) -> HistoryEntry {
        let stage = &self.case.stages()[index];
        let chosen = match self.mappings.get(&ShuffleKey::new(self.session_id, index)) {
            Some(mapping) => mapping.correct_text().to_string(),
            None => stage.correct_text().to_string(),
        };

        HistoryEntry {
            stage_index: index,
            info: stage.info.clone(),
            question: stage.question.clone(),
            chosen,
            attempts_count: self.attempt_count(index),
            next_info: stage.next_info.clone(),
            credit: self.stage_credit,
            revealed: self.revealed,
            completed_at: Utc::now(),
        }
    }
}

impl fmt::Debug for StageEngine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StageEngine")
            .field("session_id", &self.session_id)
            .field("case_id", &self.case.id())
            .field("profile", &self.profile.name)
            .field("shuffler", &self.shuffler.name())
            .field("state", &self.state())
            .field("score", &self.score)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}
