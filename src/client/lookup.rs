//! Document lookup by id and by customer tax ID.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::Session;
use super::error::ClientError;
use super::remote::{DocumentPage, RemoteDocument};
use super::transport::{ApiRequest, ApiResponse};
use crate::core::strip_formatting;

/// List keys the remote service has been seen to use.
pub const LIST_KEYS: [&str; 3] = ["data", "items", "invoices"];

/// Known shapes of a list response.
#[derive(Debug, Clone, PartialEq)]
pub enum ListShape {
    /// A top-level JSON array.
    Bare(Vec<Value>),
    /// An object carrying the list under one of [`LIST_KEYS`].
    Keyed {
        key: &'static str,
        items: Vec<Value>,
        rest: Map<String, Value>,
    },
    /// Anything else; kept whole as metadata.
    Unrecognized(Map<String, Value>),
}

impl ListShape {
    pub fn classify(value: Value) -> Result<Self, ClientError> {
        match value {
            Value::Array(items) => Ok(Self::Bare(items)),
            Value::Object(mut map) => {
                for key in LIST_KEYS {
                    match map.remove(key) {
                        Some(Value::Array(items)) => {
                            return Ok(Self::Keyed {
                                key,
                                items,
                                rest: map,
                            });
                        }
                        Some(other) => {
                            map.insert(key.to_string(), other);
                        }
                        None => {}
                    }
                }
                Ok(Self::Unrecognized(map))
            }
            other => Err(ClientError::InvalidResponse(format!(
                "expected a list or an object, got {other}"
            ))),
        }
    }
}

/// Bring any known list response into `{documents, metadata}` form.
///
/// A nested `meta` object is flattened into the metadata map.
pub fn normalize_list_response(value: Value) -> Result<DocumentPage, ClientError> {
    let (items, rest) = match ListShape::classify(value)? {
        ListShape::Bare(items) => (items, Map::new()),
        ListShape::Keyed { key, items, rest } => {
            debug!(key, count = items.len(), "list response");
            (items, rest)
        }
        ListShape::Unrecognized(map) => {
            warn!("list response has no recognised list key");
            (Vec::new(), map)
        }
    };

    let mut metadata = Map::new();
    for (k, v) in rest {
        match v {
            Value::Object(inner) if k == "meta" => metadata.extend(inner),
            v => {
                metadata.insert(k, v);
            }
        }
    }

    let documents = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<RemoteDocument>(item) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(index = i, error = %e, "skipping unreadable list item");
                None
            }
        })
        .collect();

    Ok(DocumentPage {
        documents,
        metadata,
    })
}

/// Reads documents back from the invoicing API.
#[derive(Clone)]
pub struct DocumentLookup {
    session: Session,
}

impl DocumentLookup {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Fetch one document.
    ///
    /// # Errors
    /// [`ClientError::InvalidArgument`] for a blank id, [`ClientError::NotFound`]
    /// on 404, [`ClientError::Authorization`] on 401/403,
    /// [`ClientError::Remote`] for any other failure status.
    pub async fn get_by_id(&self, id: &str) -> Result<RemoteDocument, ClientError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ClientError::InvalidArgument(
                "document id must not be empty".into(),
            ));
        }

        let url = self
            .session
            .config()
            .invoice_url(id)
            .map_err(|e| ClientError::InvalidArgument(e.to_string()))?;
        let resp = self.send(ApiRequest::get(url)).await?;
        let resp = check_status(resp, id)?;
        serde_json::from_str(&resp.body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// List documents for a customer CPF/CNPJ (formatted or bare digits).
    ///
    /// Only length and digits are checked here; the check digits are left to
    /// the remote search.
    pub async fn list_by_tax_id(
        &self,
        tax_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<DocumentPage, ClientError> {
        let digits = strip_formatting(tax_id);
        if digits.is_empty() {
            return Err(ClientError::InvalidArgument(
                "tax ID must not be empty".into(),
            ));
        }
        if !matches!(digits.len(), 11 | 14) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ClientError::InvalidArgument(format!(
                "'{tax_id}' is not a CPF (11 digits) or CNPJ (14 digits)"
            )));
        }

        let request = ApiRequest::get(self.session.config().invoices_url())
            .query("search", &digits)
            .query("page", page)
            .query("perPage", per_page);
        let resp = self.send(request).await?;
        let resp = check_status(resp, &digits)?;

        let value: Value = serde_json::from_str(&resp.body)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        normalize_list_response(value)
    }

    /// Current status of a document.
    pub async fn status(&self, id: &str) -> Result<Option<String>, ClientError> {
        Ok(self.get_by_id(id).await?.status)
    }

    /// Whether a document is settled. Any failure reads as "not paid".
    pub async fn is_paid(&self, id: &str) -> bool {
        match self.get_by_id(id).await {
            Ok(doc) => doc.is_paid(),
            Err(e) => {
                warn!(id, error = %e, "could not determine payment status");
                false
            }
        }
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let headers = self.session.tokens().auth_headers().await?;
        let resp = self.session.transport().execute(request.headers(headers)).await?;
        debug!(status = resp.status, "lookup response");
        Ok(resp)
    }
}

fn check_status(resp: ApiResponse, what: &str) -> Result<ApiResponse, ClientError> {
    match resp.status {
        _ if resp.is_success() => Ok(resp),
        404 => Err(ClientError::NotFound(what.to_string())),
        401 | 403 => Err(ClientError::Authorization {
            status: resp.status,
            body: resp.body,
        }),
        status => Err(ClientError::Remote {
            status,
            body: resp.body,
        }),
    }
}
