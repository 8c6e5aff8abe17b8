use std::{
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tracing::info;

use super::Storage;
use crate::error::{Error, Result};

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::StorageUnavailable(format!("create {} failed: {}", dir.display(), e))
        })?;
        info!("file storage at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(name).with_extension("json")
    }
}

fn unavailable(key: &str, e: impl std::fmt::Display) -> Error {
    Error::StorageUnavailable(format!("{}: {}", key, e))
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(unavailable(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // write beside the target then rename, readers never see half a file
        let mut file = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| unavailable(key, e))?;
        file.write_all(value.as_bytes())
            .map_err(|e| unavailable(key, e))?;
        file.persist(self.path(key))
            .map_err(|e| unavailable(key, e))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get("registrations").unwrap(), None);
        storage.set("registrations", "[]").unwrap();
        assert_eq!(storage.get("registrations").unwrap().as_deref(), Some("[]"));
        storage.set("registrations", "[1]").unwrap();
        assert_eq!(storage.get("registrations").unwrap().as_deref(), Some("[1]"));
        storage.remove("registrations").unwrap();
        assert_eq!(storage.get("registrations").unwrap(), None);
        storage.remove("registrations").unwrap();
    }

    #[test]
    fn keys_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        storage.set("../escape", "x").unwrap();
        assert!(dir.path().join("___escape.json").exists());
        assert_eq!(storage.get("../escape").unwrap().as_deref(), Some("x"));
    }
}
