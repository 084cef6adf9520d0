//! Read model for documents returned by the invoicing API.
//!
//! Every field is optional on the wire; anything not modelled here is kept
//! in [`RemoteDocument::extra`]. Fields are read leniently: a `null` list,
//! a float amount or a numeric id never fails the whole document, and a
//! value of the wrong shape reads as absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Statuses that count as settled.
pub const PAID_STATUSES: [&str; 3] = ["PAID", "SETTLED", "CONFIRMED"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteDocument {
    #[serde(deserialize_with = "lenient::string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub status: Option<String>,
    /// Centavos.
    #[serde(deserialize_with = "lenient::cents")]
    pub amount: Option<i64>,
    /// Centavos.
    #[serde(deserialize_with = "lenient::cents")]
    pub total_amount: Option<i64>,
    /// Centavos.
    #[serde(deserialize_with = "lenient::cents")]
    pub total_paid: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub due_date: Option<String>,
    /// Settlement date, present once paid.
    #[serde(deserialize_with = "lenient::string")]
    pub occurrence_date: Option<String>,
    #[serde(deserialize_with = "lenient::object")]
    pub customer: Option<RemoteCustomer>,
    #[serde(deserialize_with = "lenient::list")]
    pub services: Vec<RemoteService>,
    #[serde(deserialize_with = "lenient::object")]
    pub payment_terms: Option<RemotePaymentTerms>,
    #[serde(deserialize_with = "lenient::object")]
    pub payment_options: Option<RemotePaymentOptions>,
    #[serde(deserialize_with = "lenient::object")]
    pub pix: Option<RemotePix>,
    #[serde(deserialize_with = "lenient::string")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteCustomer {
    #[serde(deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::object")]
    pub document: Option<RemoteTaxId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteTaxId {
    #[serde(deserialize_with = "lenient::string")]
    pub identity: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteService {
    #[serde(deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::cents")]
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemotePaymentTerms {
    #[serde(deserialize_with = "lenient::string")]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemotePaymentOptions {
    #[serde(deserialize_with = "lenient::object")]
    pub bank_slip: Option<RemoteBankSlip>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteBankSlip {
    /// Linha digitável.
    #[serde(deserialize_with = "lenient::string")]
    pub digitable: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub barcode: Option<String>,
    /// PDF download link.
    #[serde(deserialize_with = "lenient::string")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemotePix {
    /// PIX copy-and-paste payload.
    #[serde(deserialize_with = "lenient::string")]
    pub emv: Option<String>,
}

impl RemoteDocument {
    pub fn is_paid(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| PAID_STATUSES.contains(&s))
    }

    /// Top-level due date, falling back to `payment_terms.due_date`.
    pub fn effective_due_date(&self) -> Option<&str> {
        self.due_date
            .as_deref()
            .filter(|d| !d.is_empty())
            .or_else(|| self.payment_terms.as_ref()?.due_date.as_deref())
    }

    /// Settlement date, only for paid documents.
    pub fn paid_date(&self) -> Option<&str> {
        if self.is_paid() {
            self.occurrence_date.as_deref()
        } else {
            None
        }
    }

    /// Service descriptions (or names) joined with `" | "`.
    pub fn service_summary(&self) -> String {
        self.services
            .iter()
            .filter_map(|s| {
                s.description
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .or(s.name.as_deref())
                    .filter(|d| !d.is_empty())
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer.as_ref()?.name.as_deref()
    }

    /// Amount in centavos (`amount`, else `total_amount`).
    pub fn amount_cents(&self) -> Option<i64> {
        self.amount.or(self.total_amount)
    }

    fn bank_slip(&self) -> Option<&RemoteBankSlip> {
        self.payment_options.as_ref()?.bank_slip.as_ref()
    }

    pub fn digitable_line(&self) -> Option<&str> {
        self.bank_slip()?.digitable.as_deref()
    }

    pub fn barcode(&self) -> Option<&str> {
        self.bank_slip()?.barcode.as_deref()
    }

    pub fn pdf_url(&self) -> Option<&str> {
        self.bank_slip()?.url.as_deref()
    }

    pub fn pix_emv(&self) -> Option<&str> {
        self.pix.as_ref()?.emv.as_deref()
    }
}

mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings as-is; numbers and booleans in their JSON spelling.
    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Integer centavos; floats and numeric strings are rounded.
    pub fn cents<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let round = |f: f64| f.is_finite().then(|| f.round() as i64);
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(round)),
            Some(Value::String(s)) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(round))
            }
            _ => None,
        })
    }

    pub fn object<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(Option::<Value>::deserialize(d)?.and_then(|v| serde_json::from_value(v).ok()))
    }

    /// `null` or a non-array reads as empty; unreadable items are dropped.
    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}

/// Format centavos as Brazilian currency, e.g. `123456` → `R$ 1.234,56`.
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let reais = (abs / 100).to_string();
    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, c) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("{sign}R$ {grouped},{:02}", abs % 100)
}

/// One page of lookup results in a uniform shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentPage {
    pub documents: Vec<RemoteDocument>,
    /// Every other top-level field of the response (pagination and the like).
    pub metadata: Map<String, Value>,
}

impl DocumentPage {
    /// Order by `created_at`, most recent first. ISO timestamps sort lexically.
    pub fn sort_newest_first(&mut self) {
        self.documents
            .sort_by(|a, b| b.created_at.as_deref().cmp(&a.created_at.as_deref()));
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
