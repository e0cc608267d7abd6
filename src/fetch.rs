use anyhow::{Context, Result};
use async_trait::async_trait;

/// Retrieves a remote or local document as text.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, location: &str) -> Result<String>;
}

/// `http(s)://` locations go over the network, anything else is a file path.
#[derive(Debug, Default, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, location: &str) -> Result<String> {
        if is_remote(location) {
            let response = self
                .client
                .get(location)
                .send()
                .await
                .with_context(|| format!("Request to {} failed", location))?
                .error_for_status()
                .with_context(|| format!("{} returned an error status", location))?;
            Ok(response.text().await?)
        } else {
            tokio::fs::read_to_string(location)
                .await
                .with_context(|| format!("Failed to read {}", location))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    /// In-memory fetcher; unknown locations fail.
    #[derive(Default)]
    pub struct MemoryFetcher {
        pub documents: HashMap<String, String>,
    }

    impl MemoryFetcher {
        pub fn with(mut self, location: &str, body: &str) -> Self {
            self.documents.insert(location.to_string(), body.to_string());
            self
        }
    }

    #[async_trait]
    impl Fetcher for MemoryFetcher {
        async fn fetch_text(&self, location: &str) -> Result<String> {
            self.documents
                .get(location)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("404 for {}", location))
        }
    }

    #[test]
    fn classifies_locations() {
        assert!(is_remote("https://docs.google.com/x.csv"));
        assert!(!is_remote("data/ap_assembly.geojson"));
    }

    #[tokio::test]
    async fn reads_local_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "AC,Name\nPK01,Alice\n").unwrap();
        let text = HttpFetcher::new()
            .fetch_text(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert!(text.starts_with("AC,Name"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let result = HttpFetcher::new().fetch_text("/nonexistent/boundaries.geojson").await;
        assert!(result.is_err());
    }
}
