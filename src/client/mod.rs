//! Authenticated client for the invoicing API.
//!
//! A [`Session`] owns the configuration, the mTLS transport and the shared
//! [`TokenCache`]; [`DocumentGenerator`] and [`DocumentLookup`] are built on
//! top of it and can be cloned freely.
//!
//! ```no_run
//! use boleto::client::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_file(&ClientConfig::default_path()?)?;
//! let session = Session::connect(config)?;
//! let lookup = DocumentLookup::new(session);
//! let page = lookup.list_by_tax_id("356.490.490-50", 1, 20).await?;
//! println!("{} documents", page.len());
//! # Ok(())
//! # }
//! ```

mod auth;
mod config;
mod error;
mod generator;
mod lookup;
mod remote;
mod transport;

use std::sync::Arc;

pub use auth::{
    AuthToken, ClientCredentialsIssuer, DEFAULT_EXPIRES_IN_SECS, IssuedToken, MAX_CACHE_SECS,
    TokenCache, TokenIssuer, cache_lifetime,
};
pub use config::{CONFIG_ENV, ClientConfig, ConfigError, normalize_base_url};
pub use error::{AuthError, ClientError, TransportError, TransportErrorKind};
pub use generator::{BatchReport, DocumentGenerator};
pub use lookup::{DocumentLookup, LIST_KEYS, ListShape, normalize_list_response};
pub use remote::*;
pub use transport::{
    ApiRequest, ApiResponse, Body, Method, MtlsTransport, Transport, check_certificate_files,
};

/// Configuration, transport and credentials shared by every API call.
#[derive(Clone)]
pub struct Session {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenCache>,
}

impl Session {
    /// Build the mTLS transport and a token cache for `config`.
    ///
    /// # Errors
    /// Fails immediately if the certificate or key file is missing or unusable.
    pub fn connect(config: ClientConfig) -> Result<Self, AuthError> {
        let transport: Arc<dyn Transport> = Arc::new(MtlsTransport::from_config(&config)?);
        let issuer = ClientCredentialsIssuer::new(
            Arc::clone(&transport),
            config.auth_url.clone(),
            config.client_id.clone(),
        );
        Ok(Self::with_transport(config, transport, TokenCache::new(issuer)))
    }

    /// Assemble a session from parts, e.g. an in-memory transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        tokens: TokenCache,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            tokens: Arc::new(tokens),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }
}
