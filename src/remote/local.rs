//! Directory-backed [`RemoteStore`].

use std::fs;
use std::path::{Path, PathBuf};

use super::{RemoteError, RemoteStore};

/// Serves `root/<folder>/<name>` from the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFolderStore {
    root: PathBuf,
}

impl LocalFolderStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn folder_path(&self, folder: &str) -> PathBuf {
        self.root.join(folder.trim_matches('/'))
    }
}

impl RemoteStore for LocalFolderStore {
    fn list_files(&self, folder: &str) -> Result<Vec<String>, RemoteError> {
        let dir = self.folder_path(folder);
        if !dir.is_dir() {
            return Err(RemoteError::NotFound(dir.display().to_string()));
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn fetch_file(&self, folder: &str, name: &str) -> Result<Vec<u8>, RemoteError> {
        let path = self.folder_path(folder).join(name);
        if !path.is_file() {
            return Err(RemoteError::NotFound(path.display().to_string()));
        }
        Ok(fs::read(path)?)
    }
}
