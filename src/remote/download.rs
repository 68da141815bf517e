//! Bulk download of new remote files into a local cache directory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use super::{RemoteError, RemoteStore};
use crate::error::{ConnectionTarget, IngestionError, IngestionResult};
use crate::ingestion::SourceFormat;

/// Download every supported file of `folder` that is not yet present in `destination_dir`.
///
/// Files are matched by name only; names with directory parts are skipped. The directory is created if missing. Each file is first
/// written to a `.part` sibling and renamed once complete, so an interrupted download is
/// retried by the next call. Returns the local paths written by this call, in listing order.
pub fn download_all_new_files(
    store: &dyn RemoteStore,
    folder: &str,
    destination_dir: impl AsRef<Path>,
) -> IngestionResult<Vec<PathBuf>> {
    let destination_dir = destination_dir.as_ref();
    fs::create_dir_all(destination_dir)?;

    let names = store.list_files(folder).map_err(remote_unavailable)?;
    let mut downloaded = Vec::new();
    for name in names {
        if !SourceFormat::is_supported(&name) {
            debug!(%name, "skipping unsupported file");
            continue;
        }
        if !is_plain_file_name(&name) {
            warn!(%name, "skipping remote name that is not a plain file name");
            continue;
        }
        let local_path = destination_dir.join(&name);
        if local_path.exists() {
            debug!(%name, "already downloaded");
            continue;
        }

        let bytes = store
            .fetch_file(folder, &name)
            .map_err(|e| download_error(&name, &local_path, e.to_string()))?;
        let partial = destination_dir.join(format!("{name}.part"));
        fs::write(&partial, &bytes)
            .and_then(|()| fs::rename(&partial, &local_path))
            .map_err(|e| download_error(&name, &local_path, e.to_string()))?;

        info!(%name, bytes = bytes.len(), path = %local_path.display(), "downloaded");
        downloaded.push(local_path);
    }
    Ok(downloaded)
}

/// True when `name` is a single normal path component, so joining it stays inside the cache.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Map a listing/authentication failure to a fatal connection error.
pub(crate) fn remote_unavailable(error: RemoteError) -> IngestionError {
    IngestionError::ConnectionFailed {
        target: ConnectionTarget::RemoteStore,
        message: error.to_string(),
    }
}

fn download_error(name: &str, path: &Path, message: String) -> IngestionError {
    IngestionError::Download {
        name: name.to_owned(),
        path: path.to_path_buf(),
        message,
    }
}
