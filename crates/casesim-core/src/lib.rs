//! Case Simulator Core: data model, loading, validation
//!
//! A case is an ordered list of stages. Each stage shows some context, asks a
//! multiple-choice question and, once answered, reveals the next piece of the
//! narrative. This crate only knows how to describe and load cases; running
//! one is the job of `casesim-engine`.
//!
//! # Example
//!
//! ```
//! use casesim_core::Case;
//!
//! let case = Case::from_json(r#"{
//!     "id": "demo",
//!     "title": "Demo",
//!     "summary": "",
//!     "stages": [
//!         { "question": "First step?", "options": ["Secure scene", "Leave"], "correct": 0 }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(case.stage(0).unwrap().correct_text(), "Secure scene");
//! ```

pub mod data_model;
pub mod error;
pub mod loader;

pub use data_model::{Case, CaseKey, Stage};
pub use error::CaseError;
pub use loader::{load_case, CaseFile, StageFile};

/// Hint used when a stage does not define `feedback_wrong`
pub const DEFAULT_FEEDBACK_WRONG: &str = "Incorrect. Try again.";
