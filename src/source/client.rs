// Metadata HTTP client.
// Downloads the versions index and summary archives and maps HTTP failures.

use bytes::Bytes;
use reqwest::{
    Client, Response,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::debug;

use crate::config::MetaConfig;
use crate::error::{MetaError, Result};

const CLIENT_USER_AGENT: &str = concat!("mcmeta/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the upstream metadata repository.
#[derive(Debug, Clone)]
pub struct MetaClient {
    client: Client,
    versions_url: String,
    archive_url: String,
}

impl MetaClient {
    /// Create a client for the URLs in `config`.
    pub fn new(config: &MetaConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            versions_url: config.versions_url.clone(),
            archive_url: config.archive_url.trim_end_matches('/').to_string(),
        })
    }

    /// Make a GET request, describing the resource as `what` in errors.
    pub async fn get(&self, url: &str, what: &str) -> Result<Response> {
        debug!(url, "downloading {what}");
        let response = self.client.get(url).send().await?;
        check_response(response, what)
    }

    /// Download the gzipped versions index.
    pub async fn fetch_versions(&self) -> Result<Bytes> {
        let response = self.get(&self.versions_url, "version data").await?;
        Ok(response.bytes().await?)
    }

    /// Download the gzipped summary tarball of `version`.
    pub async fn fetch_summary_archive(&self, version: &str) -> Result<Bytes> {
        let response = self
            .get(&self.summary_archive_url(version), "version summary")
            .await?;
        Ok(response.bytes().await?)
    }

    /// URL of the summary tarball of `version`.
    pub fn summary_archive_url(&self, version: &str) -> String {
        format!("{}/{}-summary", self.archive_url, version)
    }
}

/// Check response status and convert errors.
fn check_response(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == reqwest::StatusCode::NOT_FOUND {
        Err(MetaError::NotFound(response.url().to_string()))
    } else {
        Err(MetaError::Status {
            what: what.to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_archive_url() {
        let config = MetaConfig::default().with_archive_url("http://localhost:8080/tags/");
        let client = MetaClient::new(&config).unwrap();
        assert_eq!(
            client.summary_archive_url("1.19.2"),
            "http://localhost:8080/tags/1.19.2-summary"
        );
    }

    #[test]
    fn test_default_urls() {
        let client = MetaClient::new(&MetaConfig::default()).unwrap();
        assert!(client.versions_url.ends_with("/summary/versions/data.json.gz"));
        assert_eq!(
            client.summary_archive_url("1.19.2"),
            "https://codeload.github.com/misode/mcmeta/tar.gz/refs/tags/1.19.2-summary"
        );
    }
}
