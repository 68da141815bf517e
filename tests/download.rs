use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use sheet_sql_ingest::IngestionError;
use sheet_sql_ingest::config::IngestConfig;
use sheet_sql_ingest::db::SqliteSessionFactory;
use sheet_sql_ingest::error::ConnectionTarget;
use sheet_sql_ingest::pipeline::Ingestor;
use sheet_sql_ingest::remote::{LocalFolderStore, RemoteError, RemoteStore, download_all_new_files};

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("sheet-sql-ingest-{name}-{nanos}"));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Serves a fixed listing and records every fetch.
struct FixedStore {
    names: Vec<String>,
    fetched: Mutex<Vec<String>>,
}

impl FixedStore {
    fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            fetched: Mutex::new(Vec::new()),
        }
    }
}

impl RemoteStore for FixedStore {
    fn list_files(&self, _folder: &str) -> Result<Vec<String>, RemoteError> {
        Ok(self.names.clone())
    }

    fn fetch_file(&self, _folder: &str, name: &str) -> Result<Vec<u8>, RemoteError> {
        self.fetched.lock().unwrap().push(name.to_string());
        Ok(format!("id\n{name}\n").into_bytes())
    }
}

struct Unauthorized;

impl RemoteStore for Unauthorized {
    fn list_files(&self, _folder: &str) -> Result<Vec<String>, RemoteError> {
        Err(RemoteError::Auth("401 Unauthorized".to_string()))
    }

    fn fetch_file(&self, _folder: &str, _name: &str) -> Result<Vec<u8>, RemoteError> {
        Err(RemoteError::Auth("401 Unauthorized".to_string()))
    }
}

#[test]
fn second_download_fetches_nothing() {
    let dest = tmp_dir("download-idempotent");
    let store = FixedStore::new(&["a.csv", "Sales-Report.xlsx"]);

    let first = download_all_new_files(&store, "api", &dest).unwrap();
    let second = download_all_new_files(&store, "api", &dest).unwrap();

    assert_eq!(first, vec![dest.join("a.csv"), dest.join("Sales-Report.xlsx")]);
    assert!(second.is_empty());
    assert_eq!(store.fetched.lock().unwrap().len(), 2);
    assert_eq!(fs::read_to_string(dest.join("a.csv")).unwrap(), "id\na.csv\n");
}

#[test]
fn unsupported_files_are_not_downloaded() {
    let dest = tmp_dir("download-unsupported");
    let store = FixedStore::new(&["notes.txt", "report.pdf", "data.CSV"]);

    let downloaded = download_all_new_files(&store, "api", &dest).unwrap();

    assert_eq!(downloaded, vec![dest.join("data.CSV")]);
    assert_eq!(store.fetched.lock().unwrap().clone(), vec!["data.CSV".to_string()]);
}

#[test]
fn files_already_present_are_kept() {
    let dest = tmp_dir("download-existing");
    fs::write(dest.join("a.csv"), "local copy").unwrap();
    let store = FixedStore::new(&["a.csv", "b.csv"]);

    let downloaded = download_all_new_files(&store, "api", &dest).unwrap();

    assert_eq!(downloaded, vec![dest.join("b.csv")]);
    assert_eq!(fs::read_to_string(dest.join("a.csv")).unwrap(), "local copy");
}

#[test]
fn names_with_directory_parts_are_skipped() {
    let root = tmp_dir("download-traversal");
    let dest = root.join("cache");
    let store = FixedStore::new(&["../escape.csv", "sub/inner.csv", "/abs.csv", "ok.csv"]);

    let downloaded = download_all_new_files(&store, "api", &dest).unwrap();

    assert_eq!(downloaded, vec![dest.join("ok.csv")]);
    assert_eq!(store.fetched.lock().unwrap().clone(), vec!["ok.csv".to_string()]);
    assert!(!root.join("escape.csv").exists());
    assert!(!dest.join("sub").exists());
}

#[test]
fn rejected_listing_is_a_connection_failure() {
    let dest = tmp_dir("download-auth");

    let err = download_all_new_files(&Unauthorized, "api", &dest).unwrap_err();

    assert!(matches!(
        err,
        IngestionError::ConnectionFailed {
            target: ConnectionTarget::RemoteStore,
            ..
        }
    ));
}

#[test]
fn ingestor_downloads_from_configured_folder() {
    let remote = tmp_dir("download-remote");
    let dest = tmp_dir("download-dest");
    fs::create_dir_all(remote.join("api")).unwrap();
    fs::copy("tests/fixtures/people.csv", remote.join("api").join("people.csv")).unwrap();
    let config = IngestConfig::default();
    let sessions = SqliteSessionFactory::new(config.database.clone());
    let ing = Ingestor::new(config, sessions).with_store(LocalFolderStore::new(&remote));

    let downloaded = ing.download_all_new_files(&dest).unwrap();

    assert_eq!(downloaded, vec![dest.join("people.csv")]);
    assert!(!dest.join("people.csv.part").exists());
}
