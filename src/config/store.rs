use std::cell::RefCell;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::{Table, Value};
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid store file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize store: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Persisted key/value configuration. Keys are dotted paths such as
/// `player.run_in_background`.
pub trait ConfigStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }
}

/// TOML-backed store. Dotted keys map onto nested tables, so
/// `web_app.last_uri` is written as `[web_app] last_uri = "..."`.
///
/// Every write is flushed to disk when the store has a path.
#[derive(Debug, Default)]
pub struct TomlStore {
    path: Option<PathBuf>,
    table: RefCell<Table>,
}

impl TomlStore {
    /// Store that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let table = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str::<Table>(&content).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Table::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        debug!(path = %path.display(), keys = table.len(), "opened config store");
        Ok(Self {
            path: Some(path),
            table: RefCell::new(table),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = toml::to_string(&*self.table.borrow())?;
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

impl ConfigStore for TomlStore {
    fn get(&self, key: &str) -> Option<Value> {
        let table = self.table.borrow();
        let mut parts = key.split('.').peekable();
        let mut current = &*table;
        while let Some(part) = parts.next() {
            let value = current.get(part)?;
            if parts.peek().is_none() {
                return Some(value.clone());
            }
            current = value.as_table()?;
        }
        None
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        {
            let mut table = self.table.borrow_mut();
            let mut parts: Vec<&str> = key.split('.').collect();
            let leaf = parts.pop().unwrap_or(key);
            let mut current = &mut *table;
            for part in parts {
                let entry = current
                    .entry(part.to_string())
                    .or_insert_with(|| Value::Table(Table::new()));
                if !entry.is_table() {
                    *entry = Value::Table(Table::new());
                }
                current = match entry {
                    Value::Table(t) => t,
                    _ => unreachable!("entry was just made a table"),
                };
            }
            current.insert(leaf.to_string(), value);
        }
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let removed = {
            let mut table = self.table.borrow_mut();
            let mut parts: Vec<&str> = key.split('.').collect();
            let leaf = parts.pop().unwrap_or(key);
            let mut current = Some(&mut *table);
            for part in parts {
                current = current.and_then(|t| t.get_mut(part)).and_then(Value::as_table_mut);
            }
            current.and_then(|t| t.remove(leaf)).is_some()
        };
        if removed { self.flush() } else { Ok(()) }
    }
}
