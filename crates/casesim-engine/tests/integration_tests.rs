//! Integration tests for the stage engine and session store.
//!
//! These walk whole cases through the public API, including the case files
//! shipped under `cases/` and `testing/fixtures/cases/`.

use casesim_core::{load_case, Case, CaseKey, Stage};
use casesim_engine::{
    AdvanceOutcome, EngineConfig, EngineState, EngineView, OptionShuffler, Outcome,
    ScoringProfile, SessionStore, StageEngine, UniformShuffler,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn workspace_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    PathBuf::from(manifest_dir)
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

fn opts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Stage 0: ["A","B"] correct 0. Stage 1: ["X","Y","Z"] correct 2.
fn scenario_case() -> Arc<Case> {
    Arc::new(
        Case::new(
            "scenario",
            "Scenario",
            "",
            vec![
                Stage::new("Pick A", opts(&["A", "B"]), 0).with_next_info("next one"),
                Stage::new("Pick Z", opts(&["X", "Y", "Z"]), 2).with_next_info("done"),
            ],
        )
        .unwrap(),
    )
}

/// Reverses option order and counts how often it is asked to.
struct CountingShuffler {
    calls: Arc<AtomicUsize>,
}

impl OptionShuffler for CountingShuffler {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn shuffle(&mut self, stage: &Stage) -> Vec<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (0..stage.options.len()).rev().collect()
    }
}

/// Always shows the first option twice.
struct RepeatingShuffler;

impl OptionShuffler for RepeatingShuffler {
    fn name(&self) -> &'static str {
        "repeating"
    }

    fn shuffle(&mut self, stage: &Stage) -> Vec<usize> {
        vec![0; stage.options.len()]
    }
}

fn counting_engine(case: Arc<Case>) -> (StageEngine, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = StageEngine::with_shuffler(
        case,
        EngineConfig::new(ScoringProfile::console()),
        Box::new(CountingShuffler {
            calls: calls.clone(),
        }),
    );
    (engine, calls)
}

// =============================================================================
// Progression
// =============================================================================

#[test]
fn test_concrete_scenario_console_profile() {
    let config = EngineConfig::new(ScoringProfile::console());
    let mut engine = StageEngine::new(scenario_case(), config);

    assert!(!engine.submit_answer("B").unwrap().is_correct());
    assert_eq!(
        engine.submit_answer("A").unwrap(),
        Outcome::Correct {
            credit: 0.5,
            attempts: 2
        }
    );
    assert_eq!(engine.advance_stage().unwrap(), AdvanceOutcome::NextStage(1));

    assert_eq!(
        engine.submit_answer("Z").unwrap(),
        Outcome::Correct {
            credit: 1.0,
            attempts: 1
        }
    );
    let AdvanceOutcome::Completed(summary) = engine.advance_stage().unwrap() else {
        panic!("expected completion");
    };

    assert_eq!(engine.state(), EngineState::Complete);
    assert_eq!(summary.score, 1.5);
    assert_eq!(summary.max_score, 2.0);
    assert_eq!(summary.history.len(), 2);
    assert_eq!(summary.history[0].attempts_count, 2);
    assert_eq!(summary.history[0].chosen, "A");
    assert_eq!(summary.history[1].attempts_count, 1);
    assert_eq!(summary.history[1].chosen, "Z");
}

#[test]
fn test_concrete_scenario_session_profile() {
    let config = EngineConfig::new(ScoringProfile::session());
    let mut engine = StageEngine::new(scenario_case(), config);

    engine.submit_answer("B").unwrap();
    engine.submit_answer("A").unwrap();
    engine.advance_stage().unwrap();
    engine.submit_answer("Z").unwrap();
    engine.advance_stage().unwrap();

    assert_eq!(engine.score(), 2.0);
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn test_all_first_attempts_reach_full_score() {
    let case = Arc::new(load_case(workspace_root().join("cases/case_demo_001.json")).unwrap());
    let n = case.len();
    let mut engine = StageEngine::new(case.clone(), EngineConfig::default());

    for i in 0..n {
        let answer = case.stage(i).unwrap().correct_text().to_string();
        assert!(engine.submit_answer(&answer).unwrap().is_correct());
        engine.advance_stage().unwrap();
    }

    assert!(engine.is_complete());
    assert_eq!(engine.score(), n as f64 * 1.0);
    assert_eq!(engine.history().len(), n);
    assert_eq!(engine.history().stats().first_try, n);
}

#[test]
fn test_empty_case_is_complete_immediately() {
    let path = workspace_root().join("testing/fixtures/cases/empty_stages.json");
    let case = Arc::new(load_case(path).unwrap());
    let engine = StageEngine::new(case, EngineConfig::default());

    assert_eq!(engine.state(), EngineState::Complete);
    assert_eq!(engine.score(), 0.0);
    let EngineView::Complete(summary) = engine.current_view() else {
        panic!("expected completion view");
    };
    assert_eq!(summary.stage_count, 0);
    assert!(summary.history.is_empty());
}

#[test]
fn test_double_advance_records_once() {
    let mut engine = StageEngine::new(scenario_case(), EngineConfig::default());
    engine.submit_answer("A").unwrap();

    engine.advance_stage().unwrap();
    let err = engine.advance_stage().unwrap_err();

    assert!(err.is_invalid_transition());
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.current_stage_index(), 1);
}

#[test]
fn test_rejected_operations_leave_state_untouched() {
    let mut engine = StageEngine::new(scenario_case(), EngineConfig::default().without_shuffle());
    engine.submit_answer("B").unwrap();
    let before = engine.current_view();

    assert!(engine.advance_stage().is_err());
    assert!(engine.reveal_answer().is_err());

    assert_eq!(engine.current_view(), before);
}

// =============================================================================
// Shuffling
// =============================================================================

#[test]
fn test_shuffle_stable_within_visit() {
    let case = Arc::new(load_case(workspace_root().join("cases/case_demo_001.json")).unwrap());
    let mut engine = StageEngine::with_shuffler(
        case.clone(),
        EngineConfig::default(),
        Box::new(UniformShuffler::with_seed(99)),
    );

    let first = engine.display_mapping().unwrap().clone();
    let again = engine.display_mapping().unwrap().clone();
    assert_eq!(first, again);

    // Wrong answers do not reshuffle
    let wrong = first
        .display_options
        .iter()
        .find(|o| o.as_str() != first.correct_text())
        .unwrap()
        .clone();
    engine.submit_answer(&wrong).unwrap();
    engine.submit_answer(&wrong).unwrap();
    assert_eq!(engine.display_mapping().unwrap(), &first);
    assert_eq!(
        engine.current_view().stage().unwrap().options,
        first.display_options
    );

    // The correct option is still found after shuffling
    assert!(engine.submit_choice(first.display_correct_index).unwrap().is_correct());
}

#[test]
fn test_shuffled_answer_maps_back_to_canonical() {
    let (mut engine, _) = counting_engine(scenario_case());

    // Reversed: stage 0 displays ["B", "A"]
    let view = engine.current_view();
    assert_eq!(view.stage().unwrap().options, vec!["B", "A"]);

    assert!(!engine.submit_choice(0).unwrap().is_correct());
    assert!(engine.submit_choice(1).unwrap().is_correct());
    assert_eq!(engine.current_view().stage().unwrap().attempts[0].choice.as_deref(), Some("B"));
}

#[test]
fn test_one_shuffle_per_visit() {
    let (mut engine, calls) = counting_engine(scenario_case());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    for _ in 0..3 {
        engine.current_view();
    }
    engine.submit_answer("B").unwrap();
    engine.submit_answer("A").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    engine.advance_stage().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Reset
// =============================================================================

#[test]
fn test_reset_matches_fresh_engine() {
    let config = EngineConfig::new(ScoringProfile::console()).without_shuffle();
    let mut engine = StageEngine::new(scenario_case(), config.clone());
    let fresh = StageEngine::new(scenario_case(), config);

    engine.submit_answer("B").unwrap();
    engine.submit_answer("A").unwrap();
    engine.advance_stage().unwrap();
    engine.submit_answer("X").unwrap();

    engine.reset();
    assert_eq!(engine.current_view(), fresh.current_view());
    assert!(engine.history().is_empty());
    assert!(engine.attempts(0).is_empty());
    assert!(engine.attempts(1).is_empty());

    // Idempotent
    engine.reset();
    assert_eq!(engine.current_view(), fresh.current_view());
}

#[test]
fn test_reset_discards_mappings() {
    let (mut engine, calls) = counting_engine(scenario_case());
    engine.submit_answer("A").unwrap();

    engine.reset();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(engine.display_mapping().is_some());
}

#[test]
fn test_reset_after_completion() {
    let mut engine = StageEngine::new(scenario_case(), EngineConfig::default());
    engine.submit_answer("A").unwrap();
    engine.advance_stage().unwrap();
    engine.submit_answer("Z").unwrap();
    engine.advance_stage().unwrap();
    assert!(engine.is_complete());

    engine.reset();
    assert_eq!(
        engine.state(),
        EngineState::InProgress {
            stage_index: 0,
            solved: false
        }
    );
    assert_eq!(engine.score(), 0.0);
}

// =============================================================================
// Session store
// =============================================================================

#[test]
fn test_identities_are_isolated() {
    let mut store = SessionStore::new(EngineConfig::default());
    let case = scenario_case();
    let a = CaseKey::new("copy_a.json");
    let b = CaseKey::new("copy_b.json");

    {
        let engine = store.get(a.clone(), case.clone());
        engine.submit_answer("A").unwrap();
        engine.advance_stage().unwrap();
    }

    let engine_b = store.get(b.clone(), case.clone());
    assert_eq!(engine_b.score(), 0.0);
    assert!(engine_b.history().is_empty());
    assert!(engine_b.attempts(0).is_empty());
    let session_b = engine_b.session_id();

    let engine_a = store.get(a.clone(), case);
    assert_eq!(engine_a.score(), 1.0);
    assert_eq!(engine_a.history().len(), 1);
    assert_ne!(engine_a.session_id(), session_b);

    assert!(store.reset(&a));
    assert_eq!(store.get_existing(&a).unwrap().score(), 0.0);
    assert_eq!(store.get_existing(&b).unwrap().current_stage_index(), 0);
}

#[test]
fn test_store_uses_shuffler_factory() {
    let calls = Arc::new(AtomicUsize::new(0));
    let factory_calls = calls.clone();
    let mut store = SessionStore::with_shuffler_factory(EngineConfig::default(), move || {
        Box::new(CountingShuffler {
            calls: factory_calls.clone(),
        }) as Box<dyn OptionShuffler>
    });

    store.get(CaseKey::new("a"), scenario_case());
    store.get(CaseKey::new("b"), scenario_case());
    store.get(CaseKey::new("a"), scenario_case());

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Guarded inputs
// =============================================================================

#[test]
fn test_non_permutation_order_falls_back_to_canonical() {
    let case = Arc::new(
        Case::new("dup", "Dup", "", vec![Stage::new("Pick B", opts(&["A", "B"]), 1)]).unwrap(),
    );
    let mut engine = StageEngine::with_shuffler(
        case,
        EngineConfig::new(ScoringProfile::console()),
        Box::new(RepeatingShuffler),
    );

    let mapping = engine.display_mapping().unwrap();
    assert_eq!(mapping.display_options, vec!["A", "B"]);
    assert_eq!(mapping.display_correct_index, 1);

    let outcome = engine.submit_answer("A").unwrap();
    assert!(!outcome.is_correct());
    assert_eq!(engine.score(), 0.0);

    assert!(engine.submit_answer("B").unwrap().is_correct());
}

#[test]
fn test_custom_credits_keep_score_non_negative() {
    assert!(ScoringProfile::console().with_credits(-3.0, 0.5).is_err());

    let profile = ScoringProfile::console().with_credits(2.0, 0.5).unwrap();
    let config = EngineConfig::new(profile).without_shuffle();
    let mut engine = StageEngine::new(scenario_case(), config);

    engine.submit_answer("A").unwrap();
    engine.advance_stage().unwrap();
    engine.submit_answer("Z").unwrap();

    assert_eq!(engine.score(), 4.0);
    assert_eq!(engine.max_score(), 4.0);
}
