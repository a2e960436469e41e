//! File-based storage backend for persistent storage.

use crate::backend::{validate_document_name, StorageBackend};
use crate::error::StorageResult;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File extension used for document files.
pub const DOCUMENT_EXTENSION: &str = "cbor";

/// A directory-based storage backend.
///
/// Each document is stored as `<root>/<name>.cbor`. Data survives process
/// restarts.
///
/// # Durability
///
/// - `store()` writes to a temporary file in the same directory and renames
///   it over the target, so a document is either fully old or fully new
/// - `sync()` calls `File::sync_all()` on every document and the directory
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
/// Writers are serialized by an internal lock.
///
/// # Example
///
/// ```no_run
/// use dataport_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("data")).unwrap();
/// backend.store("persons", b"persistent data").unwrap();
/// backend.sync().unwrap();  // Ensure data is durable
/// ```
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Opens or creates a file backend rooted at the given directory.
    ///
    /// The directory (and its parents) is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, or if the path
    /// exists and is not a directory.
    pub fn open(root: &Path) -> StorageResult<Self> {
        fs::create_dir_all(root)?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            )
            .into());
        }

        Ok(Self {
            root: root.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the file backing `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid.
    pub fn document_path(&self, name: &str) -> StorageResult<PathBuf> {
        validate_document_name(name)?;
        Ok(self.root.join(format!("{name}.{DOCUMENT_EXTENSION}")))
    }
}

impl StorageBackend for FileBackend {
    fn load(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.document_path(name)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.document_path(name)?;
        let _guard = self.write_lock.lock();

        let mut temp = NamedTempFile::new_in(&self.root)?;
        temp.write_all(data)?;
        temp.flush()?;
        temp.persist(&path).map_err(|err| err.error)?;

        Ok(())
    }

    fn remove(&self, name: &str) -> StorageResult<bool> {
        let path = self.document_path(name)?;
        let _guard = self.write_lock.lock();

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn names(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if validate_document_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn sync(&self) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        for name in self.names()? {
            File::open(self.document_path(&name)?)?.sync_all()?;
        }
        // Directory fsync persists the renames; not supported on every platform.
        #[cfg(unix)]
        File::open(&self.root)?.sync_all()?;
        Ok(())
    }
}
