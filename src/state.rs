use crate::manifest::Address;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use reconcile::{AttributeRecord, NewState, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Current on-disk format version
pub const STATE_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Persisted record of every tracked instance
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StateFile {
    pub version: u32,

    /// Incremented on every save
    pub serial: u64,

    /// Last time the state was saved
    pub last_updated: DateTime<Utc>,

    /// Tracked instances by address
    #[serde(default)]
    pub resources: BTreeMap<String, StateEntry>,
}

/// Last known state of one instance
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub kind: ResourceKind,
    pub attributes: AttributeRecord,
}

// ============================================================================
// StateFile Implementation
// ============================================================================

impl StateFile {
    /// Load state from disk, or return empty state if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file {} does not exist, using empty state", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version > STATE_VERSION {
            bail!(
                "State file {} has format version {}, this build understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        for (address, entry) in &state.resources {
            let parsed: Address = address
                .parse()
                .with_context(|| format!("Invalid address in state file: {address}"))?;
            if parsed.kind != entry.kind {
                bail!("State entry {address} is recorded as {}", entry.kind);
            }
        }

        log::debug!(
            "Loaded state serial {} ({} resources) from {}",
            state.serial,
            state.resources.len(),
            path.display()
        );
        Ok(state)
    }

    /// Bump the serial and timestamp, then write to disk
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        self.version = STATE_VERSION;
        self.serial += 1;
        self.last_updated = Utc::now();

        let mut content =
            serde_json::to_string_pretty(&self).context("Failed to serialize state to JSON")?;
        content.push('\n');

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state serial {} to {}", self.serial, path.display());
        Ok(())
    }

    pub fn get(&self, address: &str) -> Option<&StateEntry> {
        self.resources.get(address)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.resources.contains_key(address)
    }

    pub fn set(&mut self, address: &Address, attributes: AttributeRecord) {
        self.resources.insert(
            address.to_string(),
            StateEntry {
                kind: address.kind,
                attributes,
            },
        );
    }

    pub fn remove(&mut self, address: &str) -> Option<StateEntry> {
        self.resources.remove(address)
    }

    /// Persist or clear an address as the reconciler instructs
    pub fn apply_new_state(&mut self, address: &Address, new_state: NewState) {
        match new_state {
            NewState::Persist(record) => self.set(address, record),
            NewState::Clear => {
                self.remove(&address.to_string());
            }
        }
    }

    /// Tracked addresses with their entries, in address order
    pub fn entries(&self) -> impl Iterator<Item = (Address, &StateEntry)> {
        self.resources
            .iter()
            .filter_map(|(address, entry)| address.parse().ok().map(|a| (a, entry)))
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            serial: 0,
            last_updated: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
