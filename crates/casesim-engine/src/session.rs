//! One engine per case identity.
//!
//! Keys never share state: two keys pointing at byte-identical cases still
//! get separate engines, session ids and shuffle caches.

use casesim_core::{Case, CaseKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::engine::StageEngine;
use crate::profile::EngineConfig;
use crate::shuffle::OptionShuffler;

/// Identity of one user's progression through one case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type ShufflerFactory = Box<dyn Fn() -> Box<dyn OptionShuffler> + Send>;

/// Keyed storage of engines
pub struct SessionStore {
    config: EngineConfig,
    shuffler_factory: Option<ShufflerFactory>,
    engines: HashMap<CaseKey, StageEngine>,
}

impl SessionStore {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            shuffler_factory: None,
            engines: HashMap::new(),
        }
    }

    /// Use `factory` for the shuffler of every new engine.
    pub fn with_shuffler_factory<F>(config: EngineConfig, factory: F) -> Self
    where
        F: Fn() -> Box<dyn OptionShuffler> + Send + 'static,
    {
        Self {
            config,
            shuffler_factory: Some(Box::new(factory)),
            engines: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Engine for `key`, created on first use.
    ///
    /// If the case stored under `key` differs from `case` (the file was
    /// edited, say), the old engine is dropped and a fresh one created.
    pub fn get(&mut self, key: CaseKey, case: Arc<Case>) -> &mut StageEngine {
        let stale = self
            .engines
            .get(&key)
            .is_some_and(|engine| engine.case().as_ref() != case.as_ref());
        if stale {
            tracing::warn!(key = %key, "case content changed, discarding session progress");
            self.engines.remove(&key);
        }

        let config = &self.config;
        let factory = &self.shuffler_factory;
        self.engines.entry(key).or_insert_with_key(|key| {
            tracing::debug!(key = %key, case_id = case.id(), "creating engine");
            match factory {
                Some(make) => StageEngine::with_shuffler(case, config.clone(), make()),
                None => StageEngine::new(case, config.clone()),
            }
        })
    }

    pub fn get_existing(&self, key: &CaseKey) -> Option<&StageEngine> {
        self.engines.get(key)
    }

    pub fn get_existing_mut(&mut self, key: &CaseKey) -> Option<&mut StageEngine> {
        self.engines.get_mut(key)
    }

    /// Reset the engine under `key`; `false` if there is none.
    pub fn reset(&mut self, key: &CaseKey) -> bool {
        match self.engines.get_mut(key) {
            Some(engine) => {
                engine.reset();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &CaseKey) -> Option<StageEngine> {
        self.engines.remove(key)
    }

    pub fn drop_all(&mut self) {
        tracing::debug!(sessions = self.engines.len(), "dropping all sessions");
        self.engines.clear();
    }

    pub fn contains(&self, key: &CaseKey) -> bool {
        self.engines.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Keys in sorted order
    pub fn keys(&self) -> Vec<&CaseKey> {
        let mut keys: Vec<_> = self.engines.keys().collect();
        keys.sort();
        keys
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("config", &self.config)
            .field("engines", &self.engines)
            .finish_non_exhaustive()
    }
}
