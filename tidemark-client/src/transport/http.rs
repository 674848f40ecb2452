/// reqwest-backed transport
///
/// Owns the connection pool, base URL, and credentials. Requests carry HTTP
/// Basic auth (`key:secret`) and a crate-versioned user agent; gzip response
/// bodies are decompressed before they reach the caller. One wire attempt
/// per call, no retries.
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::transport::{HttpResponse, Transport, Verb};
use crate::{ClientConfig, ClientError, Result};

#[derive(Debug)]
pub struct HttpTransport {
    base_url: Url,
    http: reqwest::Client,
    key: String,
    secret: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate().map_err(ClientError::Config)?;
        let base_url = config.base_url().map_err(ClientError::Config)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("tidemark-rust/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            base_url,
            http,
            key: config.key.clone(),
            secret: config.secret.clone(),
        })
    }

    fn url(&self, route: &str) -> Result<Url> {
        self.base_url
            .join(route)
            .map_err(|e| ClientError::Transport(format!("invalid route {:?}: {}", route, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        verb: Verb,
        route: &str,
        body: Option<Bytes>,
        headers: &HashMap<String, String>,
    ) -> Result<HttpResponse> {
        let url = self.url(route)?;

        let mut builder = match verb {
            Verb::Get => self.http.get(url),
            Verb::Post => self.http.post(url),
            Verb::Put => self.http.put(url),
            Verb::Delete => self.http.delete(url),
        };

        builder = builder.basic_auth(&self.key, Some(&self.secret));

        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = body {
            if !headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
                builder = builder.header("Content-Type", "application/json");
            }
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        debug!("{} {} -> {}", verb, route, status);

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_builds_from_config() {
        let config = ClientConfig::new("my-key", "my-secret", "api.example.com");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.base_url.as_str(), "https://api.example.com/");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ClientConfig::new("", "secret", "api.example.com");
        let err = HttpTransport::new(&config).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_url_joins_routes() {
        let config = ClientConfig::new("k", "s", "localhost")
            .with_port(4242)
            .with_insecure();
        let transport = HttpTransport::new(&config).unwrap();

        let url = transport.url("/v2/devices/pump-4").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4242/v2/devices/pump-4");
    }
}
