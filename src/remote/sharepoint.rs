//! SharePoint REST implementation of [`RemoteStore`].
//!
//! Files are listed with `GetFolderByServerRelativeUrl('{folder}')/Files` and downloaded with
//! `GetFileByServerRelativeUrl('{folder}/{name}')/$value`. Requests carry an OAuth bearer
//! token; acquiring that token is the caller's concern.

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use serde::Deserialize;

use super::{RemoteError, RemoteStore};
use crate::config::RemoteConfig;

const JSON_NOMETADATA: &str = "application/json;odata=nometadata";

#[derive(Debug, Deserialize)]
struct FileListing {
    value: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    #[serde(rename = "Name")]
    name: String,
}

/// HTTP client for one SharePoint site.
#[derive(Debug, Clone)]
pub struct SharePointStore {
    client: Client,
    site_url: String,
    access_token: String,
}

impl SharePointStore {
    /// Build a store from `config`.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RemoteError::Transport {
                url: config.site_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            site_url: config.site_url.trim_end_matches('/').to_owned(),
            access_token: config.access_token.clone(),
        })
    }

    fn list_url(&self, folder: &str) -> String {
        format!(
            "{}/_api/web/GetFolderByServerRelativeUrl('{}')/Files?$select=Name",
            self.site_url,
            odata_literal(folder)
        )
    }

    fn file_url(&self, folder: &str, name: &str) -> String {
        let path = format!("{}/{}", folder.trim_end_matches('/'), name);
        format!(
            "{}/_api/web/GetFileByServerRelativeUrl('{}')/$value",
            self.site_url,
            odata_literal(&path)
        )
    }

    fn get(&self, url: &str, accept: &str) -> Result<Response, RemoteError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, accept)
            .send()
            .map_err(|e| RemoteError::Transport {
                url: url.to_owned(),
                message: e.to_string(),
            })?;
        check_status(url, response)
    }
}

impl RemoteStore for SharePointStore {
    fn list_files(&self, folder: &str) -> Result<Vec<String>, RemoteError> {
        let url = self.list_url(folder);
        let listing: FileListing = self
            .get(&url, JSON_NOMETADATA)?
            .json()
            .map_err(|e| RemoteError::Protocol {
                url: url.clone(),
                message: e.to_string(),
            })?;
        Ok(listing.value.into_iter().map(|f| f.name).collect())
    }

    fn fetch_file(&self, folder: &str, name: &str) -> Result<Vec<u8>, RemoteError> {
        let url = self.file_url(folder, name);
        let bytes = self
            .get(&url, "application/octet-stream")?
            .bytes()
            .map_err(|e| RemoteError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;
        Ok(bytes.to_vec())
    }
}

fn check_status(url: &str, response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    match status {
        s if s.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(RemoteError::Auth(format!("{url} answered {status}")))
        }
        StatusCode::NOT_FOUND => Err(RemoteError::NotFound(url.to_owned())),
        _ => Err(RemoteError::Protocol {
            url: url.to_owned(),
            message: format!("status {status}"),
        }),
    }
}

/// Escape a value for use inside an OData single-quoted string literal.
fn odata_literal(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn store() -> SharePointStore {
        SharePointStore::new(&RemoteConfig {
            site_url: "https://contoso.sharepoint.com/sites/data/".to_string(),
            folder: "/sites/data/Shared Documents/api".to_string(),
            access_token: "token".to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn urls_escape_quotes() {
        let s = store();
        assert_eq!(
            s.list_url("/sites/data/O'Neil"),
            "https://contoso.sharepoint.com/sites/data/_api/web/GetFolderByServerRelativeUrl('/sites/data/O''Neil')/Files?$select=Name"
        );
        assert_eq!(
            s.file_url("/sites/data/api/", "Sales-Report.xlsx"),
            "https://contoso.sharepoint.com/sites/data/_api/web/GetFileByServerRelativeUrl('/sites/data/api/Sales-Report.xlsx')/$value"
        );
    }

    #[test]
    fn listing_payload_deserializes() {
        let listing: FileListing =
            serde_json::from_str(r#"{"value":[{"Name":"a.csv"},{"Name":"Sales-Report.xlsx"}]}"#).unwrap();
        let names: Vec<_> = listing.value.into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["a.csv", "Sales-Report.xlsx"]);
    }
}
