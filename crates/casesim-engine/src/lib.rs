//! Case Simulator Engine: stage progression, scoring, shuffling, sessions
//!
//! Drives one user through one case at a time. The presentation layer reads
//! [`StageEngine::current_view`] and feeds choices back through
//! [`StageEngine::submit_answer`], [`StageEngine::advance_stage`] and
//! [`StageEngine::reset`]. The engine never does I/O.
//!
//! # Flow
//!
//! ```text
//! Case ──► SessionStore::get(key) ──► StageEngine
//!                                        │  ▲
//!                          current_view  │  │ submit_answer / advance_stage / reset
//!                                        ▼  │
//!                                  presentation adapter
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use casesim_core::{Case, Stage};
//! use casesim_engine::{EngineConfig, ScoringProfile, StageEngine};
//!
//! let case = Case::new("demo", "Demo", "", vec![
//!     Stage::new("Pick A", vec!["A".into(), "B".into()], 0),
//! ]).unwrap();
//!
//! let mut engine = StageEngine::new(Arc::new(case), EngineConfig::new(ScoringProfile::console()));
//!
//! assert!(!engine.submit_answer("B").unwrap().is_correct());
//! assert!(engine.submit_answer("A").unwrap().is_correct());
//! engine.advance_stage().unwrap();
//!
//! assert!(engine.is_complete());
//! assert_eq!(engine.score(), 0.5);
//! assert_eq!(engine.history().len(), 1);
//! ```

pub mod engine;
pub mod error;
pub mod history;
pub mod profile;
pub mod session;
pub mod shuffle;
pub mod view;

pub use engine::{AttemptRecord, StageEngine};
pub use error::EngineError;
pub use history::{HistoryEntry, HistoryLog, HistoryStats};
pub use profile::{EngineConfig, ScoringProfile};
pub use session::{SessionId, SessionStore};
pub use shuffle::{
    IdentityShuffler, OptionShuffler, ShuffleCache, ShuffleKey, ShuffleMapping, UniformShuffler,
};
pub use view::{
    AdvanceOutcome, AttemptView, CompletionSummary, EngineState, EngineView, Outcome, Selection,
    StageView,
};
