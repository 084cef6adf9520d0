//! HTTP seam between the protocol logic and the network.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use super::config::ClientConfig;
use super::error::{AuthError, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` pairs.
    Form(Vec<(String, String)>),
}

/// A transport-agnostic HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn post(url: impl Into<String>, body: Body) -> Self {
        Self {
            method: Method::Post,
            body,
            ..Self::get(url)
        }
    }

    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Value of the first header with this name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes requests. Any status code is a successful exchange; only
/// network-level failures are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// `reqwest` transport presenting a client certificate on every connection.
#[derive(Debug, Clone)]
pub struct MtlsTransport {
    client: reqwest::Client,
}

impl MtlsTransport {
    /// Load the PEM certificate and key named in `config` and build the client.
    ///
    /// # Errors
    /// [`AuthError::CertificateNotFound`] if either file is missing,
    /// [`AuthError::InvalidCertificate`] if they cannot be used as an identity.
    pub fn from_config(config: &ClientConfig) -> Result<Self, AuthError> {
        let identity = load_identity(&config.cert_path, &config.key_path)?;
        let client = reqwest::Client::builder()
            .identity(identity)
            .timeout(config.timeout())
            .build()
            .map_err(|e| AuthError::InvalidCertificate(e.to_string()))?;
        Ok(Self { client })
    }
}

/// Check that both files exist before touching them.
pub fn check_certificate_files(cert_path: &Path, key_path: &Path) -> Result<(), AuthError> {
    if !cert_path.is_file() {
        return Err(AuthError::CertificateNotFound {
            what: "certificate",
            path: cert_path.to_path_buf(),
        });
    }
    if !key_path.is_file() {
        return Err(AuthError::CertificateNotFound {
            what: "private key",
            path: key_path.to_path_buf(),
        });
    }
    Ok(())
}

fn load_identity(cert_path: &Path, key_path: &Path) -> Result<reqwest::Identity, AuthError> {
    check_certificate_files(cert_path, key_path)?;
    let read = |path: &Path| {
        fs::read(path)
            .map_err(|e| AuthError::InvalidCertificate(format!("{}: {e}", path.display())))
    };
    let mut pem = read(cert_path)?;
    if !pem.ends_with(b"\n") {
        pem.push(b'\n');
    }
    pem.extend(read(key_path)?);
    reqwest::Identity::from_pem(&pem).map_err(|e| AuthError::InvalidCertificate(e.to_string()))
}

#[async_trait]
impl Transport for MtlsTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Form(pairs) => builder.form(&pairs),
        };

        debug!(method = ?request.method, url = %request.url, "sending request");
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!(status, bytes = body.len(), "received response");

        Ok(ApiResponse { status, body })
    }
}
