use std::fmt;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;

/// Service endpoints a request can be posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Search,
    Retrieval,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Search => write!(f, "Search"),
            Service::Retrieval => write!(f, "Retrieval"),
        }
    }
}

/// Status and body of one exchange, whatever the status was.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One request, one response. Retrying is the caller's business.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, service: Service, payload: String) -> Result<RawResponse>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(protocol: &str, environment: &str) -> HttpTransport {
        HttpTransport {
            client: reqwest::Client::new(),
            base_url: format!("{protocol}://{environment}/wsapi/v1/services"),
        }
    }

    pub fn from_config(config: &Config) -> HttpTransport {
        Self::new(&config.protocol, &config.environment)
    }

    /// Point the transport at an arbitrary base, e.g. a local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> HttpTransport {
        HttpTransport {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, service: Service) -> String {
        format!("{}/{}", self.base_url, service)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, service: Service, payload: String) -> Result<RawResponse> {
        let res = self
            .client
            .post(self.url(service))
            .header("Content-Type", "text/xml; charset=UTF-8")
            .header("SOAPAction", "")
            .body(payload)
            .send()
            .await?;
        let status = res.status().as_u16();
        let body = res.text().await?;
        Ok(RawResponse { status, body })
    }
}
