//! Durable chain grouping and per-chain lift numbers.
//!
//! Chain membership is planner-side state, so it is kept in a small store
//! keyed by task id and re-applied whenever tasks are reloaded. A task whose
//! chain was broken is recorded with a `solo-` placeholder so a reload cannot
//! bring the old chain back.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{ChainId, Task, TaskId};

const STORE_FILE_NAME: &str = "chains.json";

/// Task → chain membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainMap(BTreeMap<TaskId, ChainId>);

impl ChainMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership as currently recorded on the tasks.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        Self(
            tasks
                .into_iter()
                .filter_map(|t| {
                    t.chain_id
                        .clone()
                        .filter(ChainId::is_groupable)
                        .map(|c| (t.id.clone(), c))
                })
                .collect(),
        )
    }

    /// Record every task on `tasks` with its current chain.
    pub fn record<'a>(&mut self, tasks: impl IntoIterator<Item = &'a Task>) {
        for task in tasks {
            if let Some(chain) = &task.chain_id {
                self.0.insert(task.id.clone(), chain.clone());
            }
        }
    }

    /// Mark `task` as explicitly out of any chain.
    pub fn release(&mut self, task: &TaskId) {
        self.0.insert(task.clone(), ChainId::solo(task));
    }

    pub fn get(&self, task: &TaskId) -> Option<&ChainId> {
        self.0.get(task)
    }

    pub fn insert(&mut self, task: TaskId, chain: ChainId) {
        self.0.insert(task, chain);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskId, &ChainId)> {
        self.0.iter()
    }

    /// Forget tasks that are not in `tasks`. Returns how many were dropped.
    pub fn retain_tasks(&mut self, tasks: &[Task]) -> usize {
        let before = self.0.len();
        self.0.retain(|id, _| tasks.iter().any(|t| &t.id == id));
        before - self.0.len()
    }

    /// True when some task is recorded in `chain`.
    pub fn references(&self, chain: &ChainId) -> bool {
        self.0.values().any(|c| c == chain)
    }

    /// Drop entries with a blank task id or chain id.
    pub fn validated(self) -> Self {
        let before = self.0.len();
        let kept: BTreeMap<TaskId, ChainId> = self
            .0
            .into_iter()
            .filter(|(task, chain)| !task.as_str().trim().is_empty() && !chain.as_str().trim().is_empty())
            .collect();
        if kept.len() != before {
            warn!(dropped = before - kept.len(), "invalid chain entries dropped");
        }
        Self(kept)
    }

    /// Set each task's chain from the map, keeping its own chain when the map
    /// has no entry. Placeholder entries clear the task's chain. Returns how
    /// many tasks were changed.
    pub fn apply(&self, tasks: &mut [Task]) -> usize {
        let mut changed = 0;
        for task in tasks.iter_mut() {
            let Some(chain) = self.0.get(&task.id) else {
                continue;
            };
            let wanted = Some(chain.clone()).filter(ChainId::is_groupable);
            if task.chain_id != wanted {
                task.chain_id = wanted;
                changed += 1;
            }
        }
        changed
    }
}

/// Chain → lift number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LiftMap(BTreeMap<ChainId, String>);

impl LiftMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chain: &ChainId) -> Option<&str> {
        self.0.get(chain).map(String::as_str)
    }

    pub fn set(&mut self, chain: ChainId, lift: impl Into<String>) {
        self.0.insert(chain, lift.into());
    }

    /// Record `lift` unless the chain already has one.
    pub fn assign_if_absent(&mut self, chain: &ChainId, lift: impl Into<String>) -> bool {
        if self.0.contains_key(chain) {
            return false;
        }
        self.0.insert(chain.clone(), lift.into());
        true
    }

    /// Drop lift numbers of chains no task in `chains` belongs to. Returns how
    /// many were dropped.
    pub fn retain_chains(&mut self, chains: &ChainMap) -> usize {
        let before = self.0.len();
        self.0.retain(|chain, _| chains.references(chain));
        before - self.0.len()
    }

    pub fn remove(&mut self, chain: &ChainId) -> Option<String> {
        self.0.remove(chain)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validated(self) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|(chain, lift)| chain.is_groupable() && !lift.trim().is_empty())
                .collect(),
        )
    }
}

/// On-disk document holding both maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedChains {
    #[serde(default)]
    pub chains: ChainMap,
    #[serde(default)]
    pub lifts: LiftMap,
}

impl PersistedChains {
    pub fn validated(self) -> Self {
        Self {
            chains: self.chains.validated(),
            lifts: self.lifts.validated(),
        }
    }
}

/// Get/set access to persisted chain data. The medium is up to the implementor.
pub trait ChainStore {
    fn load(&self) -> Result<PersistedChains>;

    fn save(&self, data: &PersistedChains) -> Result<()>;

    fn load_chain_map(&self) -> Result<ChainMap> {
        Ok(self.load()?.chains)
    }

    fn save_chain_map(&self, chains: &ChainMap) -> Result<()> {
        let mut data = self.load()?;
        data.chains = chains.clone();
        self.save(&data)
    }
}

/// Chain data kept in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonChainStore {
    path: PathBuf,
}

impl JsonChainStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform data directory, if one can be determined.
    pub fn in_data_dir() -> Option<Self> {
        let dirs = ProjectDirs::from("", "", "flight-planner")?;
        Some(Self::new(dirs.data_dir().join(STORE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChainStore for JsonChainStore {
    /// A missing file is an empty store.
    fn load(&self) -> Result<PersistedChains> {
        if !self.path.exists() {
            return Ok(PersistedChains::default());
        }
        let json = std::fs::read_to_string(&self.path)?;
        let data: PersistedChains = serde_json::from_str(&json)?;
        let data = data.validated();
        debug!(
            path = %self.path.display(),
            chains = data.chains.len(),
            lifts = data.lifts.len(),
            "chain store loaded"
        );
        Ok(data)
    }

    fn save(&self, data: &PersistedChains) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), chains = data.chains.len(), "chain store saved");
        Ok(())
    }
}

/// Chain data held in memory.
#[derive(Debug, Default)]
pub struct MemoryChainStore {
    data: Mutex<PersistedChains>,
}

impl MemoryChainStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChainStore for MemoryChainStore {
    fn load(&self) -> Result<PersistedChains> {
        let data = self
            .data
            .lock()
            .map(|d| d.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone());
        Ok(data.validated())
    }

    fn save(&self, data: &PersistedChains) -> Result<()> {
        let mut guard = self
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = data.clone();
        Ok(())
    }
}
