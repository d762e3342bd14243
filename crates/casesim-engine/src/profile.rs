//! Scoring profiles for the two retry-credit policies
//!
//! `console` is the default: full credit on the first attempt, half credit
//! on the single credited retry, nothing after that, and the answer may be
//! revealed once the retry has failed. `session` always awards full credit
//! and never reveals.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EngineError;

/// Scoring policy applied by a `StageEngine`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    /// Profile name (e.g., "console@1.0", "session@1.0")
    pub name: String,

    /// Operating mode
    pub mode: String,

    // === Credit ===

    /// Credit for a correct first attempt
    #[serde(deserialize_with = "non_negative_credit")]
    full_credit: f64,

    /// Credit for a correct credited retry
    #[serde(deserialize_with = "non_negative_credit")]
    retry_credit: f64,

    /// How many retries earn `retry_credit` (`None` = every retry)
    #[serde(default)]
    pub credited_retries: Option<u32>,

    // === Reveal ===

    /// Attempts after which the correct answer may be revealed
    #[serde(default)]
    pub reveal_after: Option<u32>,
}

impl ScoringProfile {
    /// One retry at half credit, reveal after two misses
    pub fn console() -> Self {
        Self {
            name: "console@1.0".to_string(),
            mode: "console".to_string(),
            full_credit: 1.0,
            retry_credit: 0.5,
            credited_retries: Some(1),
            reveal_after: Some(2),
        }
    }

    /// Full credit no matter how many attempts
    pub fn session() -> Self {
        Self {
            name: "session@1.0".to_string(),
            mode: "session".to_string(),
            full_credit: 1.0,
            retry_credit: 1.0,
            credited_retries: None,
            reveal_after: None,
        }
    }

    /// Load profile from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, EngineError> {
        let profile: Self =
            serde_yaml::from_str(yaml).map_err(|e| EngineError::InvalidProfile(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Replace both credit amounts; they must be finite and non-negative.
    pub fn with_credits(
        mut self,
        full_credit: f64,
        retry_credit: f64,
    ) -> Result<Self, EngineError> {
        self.full_credit = full_credit;
        self.retry_credit = retry_credit;
        self.validate()?;
        Ok(self)
    }

    pub fn full_credit(&self) -> f64 {
        self.full_credit
    }

    pub fn retry_credit(&self) -> f64 {
        self.retry_credit
    }

    /// Get profile by mode name
    pub fn for_mode(mode: &str) -> Self {
        match mode {
            "console" => Self::console(),
            "session" => Self::session(),
            _ => Self::console(), // Default to console
        }
    }

    /// Credit earned by a correct answer on attempt `attempt` (1-based).
    pub fn credit_for_attempt(&self, attempt: usize) -> f64 {
        if attempt <= 1 {
            return self.full_credit;
        }
        let retry = (attempt - 1) as u64;
        match self.credited_retries {
            Some(limit) if retry > u64::from(limit) => 0.0,
            _ => self.retry_credit,
        }
    }

    /// Whether `attempts` failed attempts unlock revealing the answer.
    pub fn allows_reveal(&self, attempts: usize) -> bool {
        match self.reveal_after {
            Some(after) => attempts >= after as usize,
            None => false,
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        let credits = [
            ("full_credit", self.full_credit),
            ("retry_credit", self.retry_credit),
        ];
        for (field, value) in credits {
            if !is_valid_credit(value) {
                return Err(EngineError::InvalidProfile(format!(
                    "{} must be a non-negative number, got {}",
                    field, value
                )));
            }
        }
        if self.reveal_after == Some(0) {
            return Err(EngineError::InvalidProfile(
                "reveal_after must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_valid_credit(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn non_negative_credit<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if is_valid_credit(value) {
        Ok(value)
    } else {
        Err(D::Error::custom(format!(
            "credit must be a non-negative number, got {}",
            value
        )))
    }
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self::console()
    }
}

/// Everything a `StageEngine` needs besides the case itself
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub profile: ScoringProfile,
    /// Randomise option order per stage visit
    pub shuffle: bool,
}

impl EngineConfig {
    pub fn new(profile: ScoringProfile) -> Self {
        Self {
            profile,
            shuffle: true,
        }
    }

    pub fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(ScoringProfile::default())
    }
}
