//! Asset catalog collaborator and its background loader.
//!
//! Button and background images live outside the config document. Sources
//! fetch raw bytes by name; [`AssetLoader`] runs fetches on a worker thread and
//! keeps only the newest answer per name. A failed fetch means "no image"; it
//! never surfaces as an editing error.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by asset sources.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("asset '{0}' not found")]
    Missing(String),

    #[error("invalid asset name '{0}'")]
    InvalidName(String),

    #[error("failed to read asset '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("catalog worker is not running")]
    Disconnected,

    #[error("failed to start catalog worker: {0}")]
    Spawn(#[source] io::Error),
}

/// Where image bytes come from.
pub trait AssetSource: Send + Sync {
    /// Fetch one asset by name.
    fn fetch(&self, name: &str) -> Result<Vec<u8>, CatalogError>;

    /// Names available from this source, sorted.
    fn list(&self) -> Result<Vec<String>, CatalogError>;
}

/// In-memory catalog, mostly for tests and bundled templates.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.assets.insert(name.into(), bytes.into());
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, CatalogError> {
        self.assets
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::Missing(name.to_string()))
    }

    fn list(&self) -> Result<Vec<String>, CatalogError> {
        let mut names: Vec<String> = self.assets.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Flat directory of image files.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn check_asset_name(name: &str) -> Result<(), CatalogError> {
    let invalid = name.trim().is_empty()
        || name.contains(['/', '\\'])
        || name == "."
        || name == "..";
    if invalid {
        return Err(CatalogError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl AssetSource for DirectorySource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, CatalogError> {
        check_asset_name(name)?;
        fs::read(self.root.join(name)).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => CatalogError::Missing(name.to_string()),
            _ => CatalogError::Io {
                name: name.to_string(),
                source: err,
            },
        })
    }

    fn list(&self) -> Result<Vec<String>, CatalogError> {
        let entries = fs::read_dir(&self.root).map_err(|source| CatalogError::Io {
            name: self.root.display().to_string(),
            source,
        })?;
        let mut names = Vec::new();
        for entry in entries.flatten() {
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if let (true, Some(name)) = (is_file, entry.file_name().to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Resolution state of a requested asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetState {
    Pending,
    Ready(Arc<[u8]>),
    Unavailable,
}

struct FetchRequest {
    name: String,
    generation: u64,
}

struct FetchResult {
    name: String,
    generation: u64,
    payload: Option<Vec<u8>>,
}

/// Background fetcher with last-request-wins semantics per asset name.
pub struct AssetLoader {
    tx: Sender<FetchRequest>,
    rx: Receiver<FetchResult>,
    generations: HashMap<String, u64>,
    states: HashMap<String, AssetState>,
    stale_dropped: usize,
}

impl AssetLoader {
    /// Start the worker thread over `source`.
    ///
    /// The worker exits once the loader is dropped.
    ///
    /// # Errors
    /// Returns [`CatalogError::Spawn`] when the thread cannot be created.
    pub fn spawn(source: Arc<dyn AssetSource>) -> Result<Self, CatalogError> {
        let (tx, rx_cmd) = crossbeam_channel::unbounded::<FetchRequest>();
        let (tx_evt, rx) = crossbeam_channel::unbounded::<FetchResult>();

        thread::Builder::new()
            .name("padedit-catalog".to_string())
            .spawn(move || {
                for req in rx_cmd.iter() {
                    let payload = match source.fetch(&req.name) {
                        Ok(bytes) => Some(bytes),
                        Err(err) => {
                            warn!(asset = req.name.as_str(), error = %err, "asset fetch failed");
                            None
                        }
                    };
                    let result = FetchResult {
                        name: req.name,
                        generation: req.generation,
                        payload,
                    };
                    if tx_evt.send(result).is_err() {
                        break;
                    }
                }
            })
            .map_err(CatalogError::Spawn)?;

        Ok(Self {
            tx,
            rx,
            generations: HashMap::new(),
            states: HashMap::new(),
            stale_dropped: 0,
        })
    }

    /// Queue a fetch; any earlier in-flight answer for `name` becomes stale.
    ///
    /// # Errors
    /// Returns [`CatalogError::Disconnected`] when the worker has stopped.
    pub fn request(&mut self, name: &str) -> Result<(), CatalogError> {
        let generation = self.generations.entry(name.to_string()).or_insert(0);
        *generation += 1;
        let generation = *generation;
        self.tx
            .send(FetchRequest {
                name: name.to_string(),
                generation,
            })
            .map_err(|_| CatalogError::Disconnected)?;
        self.states.insert(name.to_string(), AssetState::Pending);
        debug!(asset = name, generation, "asset requested");
        Ok(())
    }

    /// Apply every finished fetch without blocking.
    ///
    /// # Returns
    /// Names whose state changed.
    pub fn poll(&mut self) -> Vec<String> {
        let results: Vec<FetchResult> = self.rx.try_iter().collect();
        results
            .into_iter()
            .filter_map(|result| self.apply(result))
            .collect()
    }

    /// Block until the newest request for `name` resolves or `timeout` passes.
    ///
    /// # Returns
    /// The resolved state, or `None` on timeout or when `name` was never
    /// requested.
    pub fn wait_for(&mut self, name: &str, timeout: Duration) -> Option<&AssetState> {
        if !self.generations.contains_key(name) {
            return None;
        }
        let deadline = Instant::now() + timeout;
        while matches!(self.states.get(name), Some(AssetState::Pending)) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(result) => {
                    self.apply(result);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None;
                }
            }
        }
        self.states.get(name)
    }

    pub fn state(&self, name: &str) -> Option<&AssetState> {
        self.states.get(name)
    }

    /// Bytes of a resolved asset.
    pub fn bytes(&self, name: &str) -> Option<Arc<[u8]>> {
        match self.states.get(name) {
            Some(AssetState::Ready(bytes)) => Some(Arc::clone(bytes)),
            _ => None,
        }
    }

    /// Answers discarded because a newer request superseded them.
    pub fn stale_dropped(&self) -> usize {
        self.stale_dropped
    }

    fn apply(&mut self, result: FetchResult) -> Option<String> {
        if self.generations.get(&result.name) != Some(&result.generation) {
            self.stale_dropped += 1;
            debug!(
                asset = result.name.as_str(),
                generation = result.generation,
                "dropping stale asset"
            );
            return None;
        }
        let state = match result.payload {
            Some(bytes) => AssetState::Ready(Arc::from(bytes)),
            None => AssetState::Unavailable,
        };
        self.states.insert(result.name.clone(), state);
        Some(result.name)
    }
}
