//! HTTP client shared by the manifest fetch and artifact downloads

use std::time::Duration;

use futures::TryStreamExt;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response};

use crate::storage::ObjectBody;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Thin wrapper over `reqwest::Client` that applies the bearer-token rule
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    token: Option<String>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpClient {
    /// Build a client; an empty token means no `Authorization` header is sent
    pub fn new(token: Option<String>, connect_timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("depsync/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self::with_client(client, token))
    }

    /// Wrap an already-configured client
    pub fn with_client(client: Client, token: Option<String>) -> Self {
        let token = token.filter(|t| !t.is_empty());
        Self { client, token }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Authenticated GET that fails on non-success status codes
    pub async fn get(&self, url: &str) -> reqwest::Result<Response> {
        self.authorize(self.client.get(url))
            .send()
            .await?
            .error_for_status()
    }

    /// Open a streaming download of `url`
    pub async fn download(&self, url: &str) -> reqwest::Result<Download> {
        let response = self.get(url).await?;
        let content_length = response.content_length();
        let body: ObjectBody = Box::pin(response.bytes_stream().map_err(std::io::Error::other));
        Ok(Download {
            body,
            content_length,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }
}

/// Open download stream and its declared length
pub struct Download {
    pub body: ObjectBody,
    pub content_length: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_is_dropped() {
        let http = HttpClient::with_client(Client::new(), Some(String::new()));
        assert!(!http.has_token());

        let http = HttpClient::with_client(Client::new(), Some("ghp_x".into()));
        assert!(http.has_token());
    }

    #[test]
    fn test_debug_redacts_token() {
        let http = HttpClient::with_client(Client::new(), Some("ghp_secret".into()));
        let rendered = format!("{:?}", http);
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
