//! Completed-stage history
//!
//! One entry per stage ever completed, appended by the engine when the user
//! leaves a solved stage. Entries are never edited or reordered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A permanent record of one completed stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Canonical stage index
    pub stage_index: usize,

    /// Context that was shown for the stage
    pub info: String,

    /// The question that was asked
    pub question: String,

    /// Text of the correct action
    pub chosen: String,

    /// Attempts made, including the successful one
    pub attempts_count: usize,

    /// Narrative revealed after the stage
    pub next_info: String,

    /// Credit earned for the stage
    pub credit: f64,

    /// Whether the answer was revealed instead of found
    #[serde(default)]
    pub revealed: bool,

    /// When the stage was left
    pub completed_at: DateTime<Utc>,
}

/// Append-only log of completed stages
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the engine appends; see `StageEngine::advance_stage`.
    pub(crate) fn record(&mut self, entry: HistoryEntry) {
        tracing::debug!(
            stage = entry.stage_index,
            attempts = entry.attempts_count,
            credit = entry.credit,
            "history entry recorded"
        );
        self.entries.push(entry);
    }

    /// Get all entries
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a canonical stage index
    pub fn get(&self, stage_index: usize) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.stage_index == stage_index)
    }

    pub fn contains_stage(&self, stage_index: usize) -> bool {
        self.get(stage_index).is_some()
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }

    /// Export to JSON Lines
    pub fn to_jsonl(&self) -> String {
        self.entries
            .iter()
            .filter_map(|e| serde_json::to_string(e).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Get statistics
    pub fn stats(&self) -> HistoryStats {
        let total = self.entries.len();
        let first_try = self
            .entries
            .iter()
            .filter(|e| e.attempts_count == 1 && !e.revealed)
            .count();
        let revealed = self.entries.iter().filter(|e| e.revealed).count();
        let total_attempts: usize = self.entries.iter().map(|e| e.attempts_count).sum();

        HistoryStats {
            total,
            first_try,
            retried: total - first_try - revealed,
            revealed,
            total_attempts,
            average_attempts: if total > 0 {
                total_attempts as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

impl<'a> IntoIterator for &'a HistoryLog {
    type Item = &'a HistoryEntry;
    type IntoIter = std::slice::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Statistics about completed stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total: usize,
    pub first_try: usize,
    pub retried: usize,
    pub revealed: usize,
    pub total_attempts: usize,
    pub average_attempts: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(stage_index: usize, attempts_count: usize, revealed: bool) -> HistoryEntry {
        HistoryEntry {
            stage_index,
            info: format!("info {}", stage_index),
            question: "Q".to_string(),
            chosen: "A".to_string(),
            attempts_count,
            next_info: String::new(),
            credit: if revealed { 0.0 } else { 1.0 },
            revealed,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_keeps_order() {
        let mut log = HistoryLog::new();
        log.record(entry(0, 1, false));
        log.record(entry(1, 3, false));

        let stages: Vec<_> = log.iter().map(|e| e.stage_index).collect();
        assert_eq!(stages, vec![0, 1]);
        assert!(log.contains_stage(1));
        assert!(!log.contains_stage(2));
    }

    #[test]
    fn test_stats() {
        let mut log = HistoryLog::new();
        log.record(entry(0, 1, false));
        log.record(entry(1, 2, false));
        log.record(entry(2, 2, true));

        let stats = log.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.first_try, 1);
        assert_eq!(stats.retried, 1);
        assert_eq!(stats.revealed, 1);
        assert_eq!(stats.total_attempts, 5);
    }

    #[test]
    fn test_export() {
        let mut log = HistoryLog::new();
        log.record(entry(0, 1, false));
        log.record(entry(1, 2, false));

        let json = log.to_json().unwrap();
        let parsed: Vec<HistoryEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(log.to_jsonl().lines().count(), 2);
    }

    #[test]
    fn test_empty_stats() {
        let stats = HistoryLog::new().stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_attempts, 0.0);
    }
}
