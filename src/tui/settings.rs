use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const API_BASE_KEY: &str = "API_BASE";
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8010";

// ── Key/value storage ─────────────────────────────────────────────────────────

pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Settings kept as a flat TOML table of strings.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/mia-chat/settings.toml`, when the platform has a config dir.
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|d| Self::new(d.join("mia-chat").join("settings.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<BTreeMap<String, String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };
        toml::from_str(&content)
            .with_context(|| format!("Malformed settings file {}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_table() {
            Ok(mut table) => table.remove(key),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable settings");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut table = self.read_table()?;
        table.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string(&table)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write to {}", self.path.display()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ── API base URL ──────────────────────────────────────────────────────────────

pub fn normalize_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Persisted API base URL, or the default when nothing usable is stored.
pub fn load(store: &dyn KeyValueStore) -> String {
    store
        .get(API_BASE_KEY)
        .filter(|v| !v.trim().is_empty())
        .map(|v| normalize_base(&v))
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

#[derive(Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The value was stored; the application context must be rebuilt.
    Reload,
    /// Blank input, nothing stored.
    Ignored,
}

pub fn save(store: &mut dyn KeyValueStore, url: &str) -> Result<SaveOutcome> {
    let url = url.trim();
    if url.is_empty() {
        return Ok(SaveOutcome::Ignored);
    }
    store.set(API_BASE_KEY, url)?;
    tracing::info!(api_base = url, "saved API base URL");
    Ok(SaveOutcome::Reload)
}
