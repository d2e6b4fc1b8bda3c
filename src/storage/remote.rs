//! HTTP storage reader
//!
//! Reads study documents served by a static web server. Servers cannot list
//! directories, so each listed directory must carry a precomputed listing
//! document (a JSON array of [`DirEntry`]).

use super::{DirEntry, StorageReader, join_path};

/// File name of the listing document expected inside each listed directory
pub const DEFAULT_LISTING_FILE: &str = "directory_listing.json";

/// Reads study documents relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpReader {
    base_url: String,
    client: reqwest::Client,
    listing_file: String,
}

impl HttpReader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            listing_file: DEFAULT_LISTING_FILE.to_string(),
        }
    }

    /// Use a different listing document name.
    pub fn with_listing_file(mut self, name: impl Into<String>) -> Self {
        self.listing_file = name.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl StorageReader for HttpReader {
    async fn read_text(&self, path: &str) -> Option<String> {
        let url = self.resolve_full_path(path);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::debug!("Request for {} failed: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            log::debug!("Request for {} returned {}", url, response.status());
            return None;
        }

        match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                log::debug!("Failed to read body of {}: {}", url, e);
                None
            }
        }
    }

    async fn list_directory(&self, path: &str) -> Option<Vec<DirEntry>> {
        let listing = join_path(path, &self.listing_file);
        let text = self.read_text(&listing).await?;

        match serde_json::from_str::<Vec<DirEntry>>(&text) {
            Ok(entries) => Some(entries),
            Err(e) => {
                log::debug!("Malformed directory listing {}: {}", listing, e);
                None
            }
        }
    }

    fn resolve_full_path(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
