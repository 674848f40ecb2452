/// Client configuration for credentials and connection parameters
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key used as the basic-auth username
    pub key: String,

    /// API secret used as the basic-auth password
    pub secret: String,

    /// Backend hostname, without scheme
    pub host: String,

    /// Backend port
    /// Default: 443
    pub port: u16,

    /// Use HTTPS when true, plain HTTP when false
    /// Default: true
    pub secure: bool,

    /// Per-request timeout
    /// Default: 30 seconds
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with default connection parameters
    pub fn new(
        key: impl Into<String>,
        secret: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            host: host.into(),
            port: 443,
            secure: true,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the backend port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Use plain HTTP instead of HTTPS
    pub fn with_insecure(mut self) -> Self {
        self.secure = false;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.key.is_empty() {
            return Err("key must not be empty".to_string());
        }

        if self.host.is_empty() {
            return Err("host must not be empty".to_string());
        }

        if self.host.contains("://") {
            return Err("host must not include a scheme".to_string());
        }

        Ok(())
    }

    /// Root URL routes are joined onto
    pub fn base_url(&self) -> Result<Url, String> {
        let scheme = if self.secure { "https" } else { "http" };
        Url::parse(&format!("{}://{}:{}/", scheme, self.host, self.port))
            .map_err(|e| format!("invalid host {:?}: {}", self.host, e))
    }
}
