use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::ValidationError;

/// What part of an HTTP exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "timed out",
            Self::Connect => "connection failed",
            Self::Request => "request failed",
            Self::Body => "reading response failed",
        })
    }
}

/// A network-level failure. Never retried by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Request
        };
        Self::new(kind, err.to_string())
    }
}

/// Failures while setting up credentials or issuing an access token.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Certificate or private key file does not exist.
    #[error("{what} not found: {}", path.display())]
    CertificateNotFound { what: &'static str, path: PathBuf },

    /// The PEM files exist but could not be read or turned into a TLS identity.
    #[error("invalid client certificate: {0}")]
    InvalidCertificate(String),

    /// The token endpoint answered with a non-success status.
    #[error("token request failed with HTTP {status}: {body}")]
    AuthRequestFailed { status: u16, body: String },

    /// A success response without a usable `access_token`.
    #[error("invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("token request failed: {0}")]
    Transport(#[from] TransportError),
}

/// Errors from document generation and lookup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Blank or malformed identifier passed by the caller.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("document not found: {0}")]
    NotFound(String),

    /// HTTP 401/403 from a lookup.
    #[error("not authorized (HTTP {status}): {body}")]
    Authorization { status: u16, body: String },

    /// Any other non-success lookup status.
    #[error("remote error (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    /// Generation answered with something other than 200/201.
    #[error("document rejected (HTTP {status}): {body}")]
    RemoteRejection { status: u16, body: String },

    /// A success status whose body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("could not serialize request: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status carried by a remote failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authorization { status, .. }
            | Self::Remote { status, .. }
            | Self::RemoteRejection { status, .. } => Some(*status),
            Self::Auth(AuthError::AuthRequestFailed { status, .. }) => Some(*status),
            _ => None,
        }
    }
}
