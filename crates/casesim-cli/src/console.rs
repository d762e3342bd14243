//! Line-oriented console front end
//!
//! Renders the engine view after every action and maps each input line to
//! one engine operation. All I/O goes through the generic reader and writer
//! so the loop can be driven from tests.

use anyhow::Context;
use casesim_engine::{
    AdvanceOutcome, CompletionSummary, EngineError, EngineView, HistoryEntry, Outcome,
    SessionStore, StageEngine, StageView,
};
use std::io::{BufRead, Write};

use crate::catalog::{CaseCatalog, OpenCase};

/// What one input line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 0-based display index
    Choose(usize),
    /// Free text, submitted as the option text
    Answer(String),
    Advance,
    Reset,
    History,
    Switch,
    Quit,
    Unknown,
}

impl Command {
    /// Interpret `line` in the context of the current view.
    pub fn parse(line: &str, view: &EngineView) -> Self {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "q" | "quit" => return Command::Quit,
            "r" | "reset" => return Command::Reset,
            "h" | "history" => return Command::History,
            "c" | "case" => return Command::Switch,
            _ => {}
        }

        match view {
            EngineView::Complete(_) => Command::Unknown,
            EngineView::InProgress(stage) if stage.solved => match line {
                "" | "n" | "next" => Command::Advance,
                _ => Command::Unknown,
            },
            EngineView::InProgress(_) => match line.parse::<usize>() {
                Ok(n) if n >= 1 => Command::Choose(n - 1),
                _ => Command::Answer(line.to_string()),
            },
        }
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
    catalog: CaseCatalog,
    store: SessionStore,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W, catalog: CaseCatalog, store: SessionStore) -> Self {
        Self {
            input,
            output,
            catalog,
            store,
        }
    }

    /// Hand back the writer and the sessions, e.g. for inspection in tests.
    pub fn into_parts(self) -> (W, SessionStore) {
        (self.output, self.store)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Run until the user quits or input ends.
    pub fn run(&mut self, initial_case: Option<&str>) -> anyhow::Result<()> {
        let mut active = match initial_case {
            Some(name) => self.catalog.load_name(name)?,
            None => match self.choose_case()? {
                Some(open) => open,
                None => return Ok(()),
            },
        };
        self.print_header(&active)?;

        loop {
            let view = self.engine(&active).current_view();
            self.render(&view)?;

            let Some(line) = self.read_line(prompt_for(&view))? else {
                break;
            };

            match Command::parse(&line, &view) {
                Command::Quit => break,
                Command::Reset => {
                    self.store.reset(&active.key);
                    writeln!(self.output, "Case progress reset.")?;
                }
                Command::History => {
                    let entries = self.engine(&active).history().entries().to_vec();
                    self.print_history(&entries)?;
                }
                Command::Switch => match self.choose_case()? {
                    Some(open) => {
                        active = open;
                        self.print_header(&active)?;
                    }
                    None => break,
                },
                Command::Advance => {
                    let result = self.engine(&active).advance_stage();
                    self.report_advance(result)?;
                }
                Command::Choose(index) => {
                    let result = self.engine(&active).submit_choice(index);
                    self.report_submission(&active, result)?;
                }
                Command::Answer(text) => {
                    let result = self.engine(&active).submit_answer(&text);
                    self.report_submission(&active, result)?;
                }
                Command::Unknown => {
                    writeln!(
                        self.output,
                        "Unknown command. Use r (reset), h (history), c (change case), q (quit)."
                    )?;
                }
            }
        }

        self.output.flush()?;
        Ok(())
    }

    fn engine(&mut self, active: &OpenCase) -> &mut StageEngine {
        self.store.get(active.key.clone(), active.case.clone())
    }

    fn choose_case(&mut self) -> anyhow::Result<Option<OpenCase>> {
        loop {
            writeln!(self.output, "\nAvailable cases:")?;
            for (i, name) in self.catalog.names().iter().enumerate() {
                writeln!(self.output, "  {}) {}", i + 1, name)?;
            }

            let Some(line) = self.read_line("Choose case number (q to quit): ")? else {
                return Ok(None);
            };
            let line = line.trim();
            if line.eq_ignore_ascii_case("q") {
                return Ok(None);
            }

            let Ok(n) = line.parse::<usize>() else {
                writeln!(self.output, "Enter a number from the list.")?;
                continue;
            };
            if n == 0 {
                writeln!(self.output, "Enter a number from the list.")?;
                continue;
            }

            match self.catalog.load_index(n - 1) {
                Ok(open) => return Ok(Some(open)),
                Err(e) => {
                    tracing::warn!(error = %e, "case could not be opened");
                    writeln!(self.output, "Failed to open case: {:#}", e)?;
                }
            }
        }
    }

    fn report_submission(
        &mut self,
        active: &OpenCase,
        result: Result<Outcome, EngineError>,
    ) -> anyhow::Result<()> {
        match result {
            Ok(Outcome::Correct { credit, attempts }) => {
                writeln!(
                    self.output,
                    "Correct. Stage solved in {} attempt(s), +{} points.",
                    attempts, credit
                )?;
            }
            Ok(Outcome::Incorrect { .. }) => {
                writeln!(self.output, "Incorrect.")?;
                let engine = self.engine(active);
                let reveal_available = engine
                    .current_view()
                    .stage()
                    .is_some_and(|s| s.reveal_available);
                if reveal_available {
                    let answer = engine.reveal_answer()?;
                    writeln!(self.output, "Wrong again. Revealing correct action: {}", answer)?;
                }
            }
            Err(e) => writeln!(self.output, "{}", e)?,
        }
        Ok(())
    }

    fn report_advance(
        &mut self,
        result: Result<AdvanceOutcome, EngineError>,
    ) -> anyhow::Result<()> {
        match result {
            Ok(AdvanceOutcome::NextStage(_)) => {}
            Ok(AdvanceOutcome::Completed(_)) => writeln!(self.output, "\nSimulation ended.")?,
            Err(e) => writeln!(self.output, "{}", e)?,
        }
        Ok(())
    }

    fn print_header(&mut self, active: &OpenCase) -> anyhow::Result<()> {
        writeln!(self.output, "\nCASE SIMULATION: {}", active.case.title())?;
        if !active.case.summary().is_empty() {
            writeln!(self.output, "{}", active.case.summary())?;
        }
        Ok(())
    }

    fn render(&mut self, view: &EngineView) -> anyhow::Result<()> {
        match view {
            EngineView::InProgress(stage) => self.render_stage(stage),
            EngineView::Complete(summary) => self.render_summary(summary),
        }
    }

    fn render_stage(&mut self, stage: &StageView) -> anyhow::Result<()> {
        let out = &mut self.output;
        writeln!(out, "\n--- Stage {}/{}", stage.stage_index + 1, stage.stage_count)?;
        if !stage.info.is_empty() {
            writeln!(out, "{}", stage.info)?;
        }
        writeln!(out, "\nQuestion: {}", stage.question)?;
        for (i, option) in stage.options.iter().enumerate() {
            writeln!(out, "  {}) {}", i + 1, option)?;
        }

        if !stage.attempts.is_empty() {
            writeln!(out, "Previous attempts for this stage:")?;
            for attempt in &stage.attempts {
                let choice = attempt.choice.as_deref().unwrap_or("Invalid choice");
                writeln!(out, "- Attempt {}: {}", attempt.number, choice)?;
            }
        }

        if stage.solved {
            if let Some(answer) = &stage.answer {
                writeln!(out, "Correct action: {}", answer)?;
            }
            if let Some(next) = stage.next_info.as_deref().filter(|n| !n.is_empty()) {
                writeln!(out, "Next: {}", next)?;
            }
        } else if let Some(hint) = &stage.hint {
            writeln!(out, "Hint: {}", hint)?;
        }
        Ok(())
    }

    fn render_summary(&mut self, summary: &CompletionSummary) -> anyhow::Result<()> {
        writeln!(
            self.output,
            "\nSimulation complete. Score: {}/{}",
            summary.score, summary.max_score
        )?;
        self.print_history(&summary.history)
    }

    fn print_history(&mut self, entries: &[HistoryEntry]) -> anyhow::Result<()> {
        if entries.is_empty() {
            writeln!(self.output, "No completed stages yet.")?;
            return Ok(());
        }

        writeln!(self.output, "Completed stages:")?;
        for entry in entries {
            let status = if entry.revealed { "Revealed" } else { "Completed" };
            writeln!(self.output, "Stage {} - {}", entry.stage_index + 1, status)?;
            if !entry.info.is_empty() {
                writeln!(self.output, "  Given info: {}", entry.info)?;
            }
            writeln!(self.output, "  Correct action: {}", entry.chosen)?;
            writeln!(self.output, "  Attempts made: {}", entry.attempts_count)?;
            if !entry.next_info.is_empty() {
                writeln!(self.output, "  Next info revealed: {}", entry.next_info)?;
            }
        }
        Ok(())
    }

    /// `None` on end of input.
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

fn prompt_for(view: &EngineView) -> &'static str {
    match view {
        EngineView::Complete(_) => "r to restart, c to change case, q to quit: ",
        EngineView::InProgress(stage) if stage.solved => "Press Enter for the next stage: ",
        EngineView::InProgress(_) => "Enter option number: ",
    }
}
