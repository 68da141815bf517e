//! Remote document store collaborator.
//!
//! The pipeline only needs two capabilities from a store: list the file names in a folder and
//! fetch the raw bytes of one file. [`local::LocalFolderStore`] serves a directory tree;
//! [`sharepoint::SharePointStore`] (feature `sharepoint`) talks to the SharePoint REST API.

pub mod download;
pub mod local;
#[cfg(feature = "sharepoint")]
pub mod sharepoint;

use thiserror::Error;

pub use download::download_all_new_files;
pub use local::LocalFolderStore;
#[cfg(feature = "sharepoint")]
pub use sharepoint::SharePointStore;

/// Error returned by a [`RemoteStore`].
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Credentials were rejected or missing.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The store could not be reached.
    #[error("transport error contacting {url}: {message}")]
    Transport { url: String, message: String },

    /// The store answered with an unexpected status or payload.
    #[error("unexpected response from {url}: {message}")]
    Protocol { url: String, message: String },

    /// The requested file or folder does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Local filesystem error (for directory-backed stores).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A store of files grouped into folders.
pub trait RemoteStore: Send + Sync {
    /// Names of the files directly inside `folder`.
    fn list_files(&self, folder: &str) -> Result<Vec<String>, RemoteError>;

    /// Raw bytes of `folder/name`.
    fn fetch_file(&self, folder: &str, name: &str) -> Result<Vec<u8>, RemoteError>;
}
