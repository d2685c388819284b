//! HTTP transport used to talk to ArcGIS REST endpoints.
//!
//! The pipeline only needs "POST a form, get the body back", expressed by the
//! [`Transport`] trait. [`HttpTransport`] implements it with `reqwest`; tests
//! substitute scripted implementations.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::error::TransportError;

/// Form fields of a request, sent `application/x-www-form-urlencoded`.
pub type FormFields = Vec<(String, String)>;

/// Sends form-encoded POST requests and returns the response body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `form` to `url` and return the response body as text.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the request fails or the server
    /// answers with a non-success status.
    async fn post(&self, url: &str, form: &[(String, String)]) -> Result<String, TransportError>;
}

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Skip TLS certificate validation (self-signed on-premise servers).
    pub accept_invalid_certs: bool,
    /// Overall timeout of one request.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            timeout: Some(Duration::from_secs(120)),
            user_agent: concat!("esri2sf/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TransportConfig {
    #[must_use]
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the TLS backend cannot be
    /// initialised.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(config.accept_invalid_certs);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|err| TransportError::Client {
            message: err.to_string(),
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, form: &[(String, String)]) -> Result<String, TransportError> {
        debug!("POST {url} ({} form fields)", form.len());
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|err| TransportError::Request {
                url: url.to_string(),
                source: Box::new(err),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|err| TransportError::Request {
            url: url.to_string(),
            source: Box::new(err),
        })
    }
}

/// Build form fields from borrowed pairs.
#[must_use]
pub fn form_fields(pairs: &[(&str, &str)]) -> FormFields {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates_certificates() {
        let config = TransportConfig::default();
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.timeout, Some(Duration::from_secs(120)));
        assert!(config.user_agent.starts_with("esri2sf/"));
    }

    #[test]
    fn config_builders() {
        let config = TransportConfig::default()
            .with_accept_invalid_certs(true)
            .with_timeout(None);
        assert!(config.accept_invalid_certs);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn http_transport_builds_from_config() {
        let transport = HttpTransport::new(&TransportConfig::default().with_accept_invalid_certs(true));
        assert!(transport.is_ok());
    }

    #[test]
    fn form_fields_are_owned_pairs() {
        let form = form_fields(&[("f", "json"), ("where", "1=1")]);
        assert_eq!(
            form,
            vec![
                ("f".to_string(), "json".to_string()),
                ("where".to_string(), "1=1".to_string())
            ]
        );
    }
}
