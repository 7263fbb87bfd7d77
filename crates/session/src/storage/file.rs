use super::StorageBackend;
use crate::error::StorageError;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Storage persisted as a JSON object in a single file
///
/// Every operation re-reads the file, so entries written by an earlier run
/// (or another process) are visible. Writes go to a temporary sibling that
/// is renamed over the original, so a crash never leaves half the entries.
/// A file that is not valid JSON is reported by reads and replaced by the
/// next write.
///
/// All file access is blocking `std::fs` with an `fsync` per write. Callers
/// on an async runtime run it inline; the file holds two short tokens.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Use `path` as the backing file, creating its parent directory
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        debug!("Using session storage at: {}", path.display());
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Current entries for a read-modify-write, starting over from an empty
    /// map when the file is corrupt. The flag tells whether it was.
    fn read_for_update(&self) -> Result<(BTreeMap<String, String>, bool), StorageError> {
        match self.read() {
            Ok(entries) => Ok((entries, false)),
            Err(StorageError::Serialization(e)) => {
                warn!(
                    "Discarding corrupt session storage at {}: {e}",
                    self.path.display()
                );
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let tmp = self.tmp_path();
        let contents = serde_json::to_vec_pretty(entries)?;

        let mut file = create_private(&tmp)?;
        file.write_all(&contents)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("session"), OsString::from);
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Open for writing, readable by the owner only on Unix
fn create_private(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read()?.remove(key))
    }

    fn set_items(&self, items: &[(&str, &str)]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut entries, _) = self.read_for_update()?;
        for (key, value) in items {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        self.write(&entries)
    }

    fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut entries, corrupt) = self.read_for_update()?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before && !corrupt {
            return Ok(());
        }
        self.write(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let storage = FileStorage::open(&path).unwrap();
        storage
            .set_items(&[("authToken", "A"), ("refreshToken", "R")])
            .unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("authToken").unwrap().as_deref(), Some("A"));
        assert_eq!(
            reopened.get_item("refreshToken").unwrap().as_deref(),
            Some("R")
        );
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path().join("session.json")).unwrap();
        assert_eq!(storage.get_item("authToken").unwrap(), None);
        storage.remove_items(&["authToken"]).unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_remove_items_keeps_other_entries() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path().join("session.json")).unwrap();
        storage
            .set_items(&[("authToken", "A"), ("refreshToken", "R"), ("theme", "dark")])
            .unwrap();

        storage.remove_items(&["authToken", "refreshToken"]).unwrap();

        assert_eq!(storage.get_item("authToken").unwrap(), None);
        assert_eq!(storage.get_item("refreshToken").unwrap(), None);
        assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("dark"));
        assert!(!storage.tmp_path().exists());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert!(matches!(
            storage.get_item("authToken"),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_corrupt_file_is_replaced_on_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{truncated").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        storage.remove_items(&["authToken", "refreshToken"]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
        assert_eq!(storage.get_item("authToken").unwrap(), None);

        fs::write(&path, "{truncated").unwrap();
        storage
            .set_items(&[("authToken", "A"), ("refreshToken", "R")])
            .unwrap();
        assert_eq!(storage.get_item("authToken").unwrap().as_deref(), Some("A"));
        assert_eq!(storage.get_item("refreshToken").unwrap().as_deref(), Some("R"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set_items(&[("authToken", "A")]).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
