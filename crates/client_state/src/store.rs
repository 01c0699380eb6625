use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ClientStateError;

/// Key for the persisted active session id.
pub const ACTIVE_SESSION_KEY: &str = "active_session_id";
/// Key for the persisted active user id.
pub const USER_ID_KEY: &str = "user_id";

const STATE_VERSION: u32 = 1;

/// Durable key/value capability injected into the client core.
pub trait StateStore: Send {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, persisting it durably.
    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientStateError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    #[serde(default)]
    values: BTreeMap<String, String>,
}

/// JSON-file-backed state store.
///
/// The file is read once on open and rewritten wholesale on every set.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStateStore {
    /// Opens the store at `path`, starting empty when the file does not
    /// exist yet.
    pub fn open(path: &Path) -> Result<Self, ClientStateError> {
        let path = path.to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => {
                let parsed =
                    serde_json::from_str::<StateFile>(&contents).map_err(|source| {
                        ClientStateError::Parse {
                            path: path.clone(),
                            source,
                        }
                    })?;
                if parsed.version != STATE_VERSION {
                    return Err(ClientStateError::UnsupportedVersion {
                        path,
                        found: parsed.version,
                    });
                }
                parsed.values
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(ClientStateError::io("reading state file", &path, source)),
        };

        Ok(Self { path, values })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), ClientStateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| {
                ClientStateError::io("creating state directory", parent, source)
            })?;
        }

        let file = StateFile {
            version: STATE_VERSION,
            values: self.values.clone(),
        };
        let contents =
            serde_json::to_string_pretty(&file).map_err(|source| ClientStateError::Serialize {
                path: self.path.clone(),
                source,
            })?;
        fs::write(&self.path, contents)
            .map_err(|source| ClientStateError::io("writing state file", &self.path, source))
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientStateError> {
        self.values.insert(key.to_string(), value.to_string());
        self.persist()
    }
}

/// In-memory state store for tests and embedders without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: BTreeMap<String, String>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientStateError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
