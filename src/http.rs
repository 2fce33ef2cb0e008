//! HTTP client wrapper for file store requests.

use bytes::Bytes;
use reqwest::{Body, Client, Response};
use tracing::debug;

use crate::error::{FileDropError, Result};

/// HTTP client for making requests to the file store.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a new HTTP client with a proxy.
    pub fn with_proxy(proxy: &str) -> Result<Self> {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| FileDropError::Config(format!("Invalid proxy: {}", e)))?;

        let client = Client::builder()
            .proxy(proxy)
            .build()
            .map_err(|e| FileDropError::Config(format!("Failed to build client: {}", e)))?;

        Ok(Self { client })
    }

    /// Make a GET request and return the response body as text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        Ok(check_status(response)?.text().await?)
    }

    /// Make a GET request and return the raw response body.
    pub async fn get_bytes(&self, url: &str) -> Result<Bytes> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        Ok(check_status(response)?.bytes().await?)
    }

    /// Make a PUT request with a raw binary body.
    ///
    /// The content type is always `application/octet-stream`.
    pub async fn put(&self, url: &str, body: impl Into<Body>) -> Result<()> {
        debug!(url, "PUT");
        let response = self
            .client
            .put(url)
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .await?;
        check_status(response)?;
        Ok(())
    }

    /// Make a DELETE request.
    pub async fn delete(&self, url: &str) -> Result<()> {
        debug!(url, "DELETE");
        let response = self.client.delete(url).send().await?;
        check_status(response)?;
        Ok(())
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn check_status(response: Response) -> Result<Response> {
    if !response.status().is_success() {
        return Err(FileDropError::HttpError(response.status().as_u16()));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let _client = HttpClient::new();
        let _default = HttpClient::default();
    }

    #[test]
    fn test_proxy_creation() {
        let client = HttpClient::with_proxy("http://127.0.0.1:8080");
        assert!(client.is_ok());
    }

    #[test]
    fn test_proxy_invalid() {
        let res = HttpClient::with_proxy(":::::::");
        assert!(matches!(res, Err(FileDropError::Config(_))));
    }
}
