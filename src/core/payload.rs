//! Wire representation of a [`DocumentRequest`].
//!
//! Optional sub-objects (`address`, `interest_monthly_percent`, `fine`) are
//! left out entirely when absent; they are never sent as `null` or `{}`.

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::types::*;

/// Placeholder the remote service expects when an address has no complement.
pub const NO_COMPLEMENT: &str = "N/A";

/// The JSON body POSTed to the invoices endpoint.
#[derive(Debug, Serialize)]
pub struct WirePayload<'a> {
    pub code: &'a str,
    pub customer: WireCustomer<'a>,
    pub services: Vec<WireService<'a>>,
    pub payment_terms: WirePaymentTerms,
    pub notification: WireNotification<'a>,
    pub payment_forms: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct WireCustomer<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub document: WireDocument<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<WireAddress<'a>>,
}

#[derive(Debug, Serialize)]
pub struct WireDocument<'a> {
    pub identity: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct WireAddress<'a> {
    pub street: &'a str,
    pub number: &'a str,
    pub district: &'a str,
    pub city: &'a str,
    pub state: &'a str,
    pub complement: &'a str,
    pub zip_code: &'a str,
}

#[derive(Debug, Serialize)]
pub struct WireService<'a> {
    pub name: &'a str,
    pub description: &'a str,
    /// Integer centavos.
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct WirePaymentTerms {
    pub due_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_monthly_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fine: Option<WireFine>,
}

#[derive(Debug, Serialize)]
pub struct WireFine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WireNotification<'a> {
    pub name: &'a str,
    pub channels: Vec<WireChannel<'a>>,
}

#[derive(Debug, Serialize)]
pub struct WireChannel<'a> {
    pub channel: &'static str,
    pub contact: &'a str,
    pub rules: Vec<&'static str>,
}

impl DocumentRequest {
    /// Borrowing view of this request in the shape the invoicing API expects.
    pub fn to_wire_payload(&self) -> WirePayload<'_> {
        let customer = &self.customer;
        let terms = &self.payment_terms;

        WirePayload {
            code: &self.code,
            customer: WireCustomer {
                name: customer.name(),
                email: customer.email(),
                document: WireDocument {
                    identity: customer.tax_id().identity(),
                    kind: customer.tax_id().kind().code(),
                },
                address: customer.address().map(|a| WireAddress {
                    street: a.street(),
                    number: a.number(),
                    district: a.district(),
                    city: a.city(),
                    state: a.state(),
                    complement: a.complement().unwrap_or(NO_COMPLEMENT),
                    zip_code: a.zip_code(),
                }),
            },
            services: self
                .services
                .iter()
                .map(|s| WireService {
                    name: s.name(),
                    description: s.description(),
                    amount: s.amount_cents(),
                })
                .collect(),
            payment_terms: WirePaymentTerms {
                due_date: terms.due_date().format(DATE_FORMAT).to_string(),
                interest_monthly_percent: terms
                    .interest()
                    .and_then(InterestTerm::monthly_rate_percent)
                    .and_then(|r| r.to_f64()),
                fine: terms.fine().map(|f| WireFine {
                    amount: f.amount_cents(),
                    date: f.date().map(|d| d.format(DATE_FORMAT).to_string()),
                }),
            },
            notification: WireNotification {
                name: self.notification.name(),
                channels: self
                    .notification
                    .channels()
                    .iter()
                    .map(|c| WireChannel {
                        channel: c.kind().code(),
                        contact: c.contact(),
                        rules: c.rules().map(|r| r.code()).collect(),
                    })
                    .collect(),
            },
            payment_forms: self.payment_forms.iter().map(PaymentForm::code).collect(),
        }
    }

    /// The wire payload as a JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self.to_wire_payload())
    }
}

#[cfg(test)]
mod tests {
    use super::super::builder::{AddressBuilder, DocumentRequestBuilder};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base() -> DocumentRequestBuilder {
        DocumentRequestBuilder::new("BOL-001")
            .customer("Ana Souza", "ana@example.com", "356.490.490-50")
            .add_service("Consultoria", "Consultoria mensal", dec!(100.50))
            .due_date(date(2030, 1, 11))
            .email_notifications()
            .today(date(2030, 1, 10))
    }

    #[test]
    fn optional_objects_omitted() {
        let json = base().build().unwrap().to_json().unwrap();
        let customer = json["customer"].as_object().unwrap();
        assert!(!customer.contains_key("address"));
        let terms = json["payment_terms"].as_object().unwrap();
        assert!(!terms.contains_key("interest_monthly_percent"));
        assert!(!terms.contains_key("fine"));
        assert_eq!(terms["due_date"], "2030-01-11");
    }

    #[test]
    fn optional_objects_present() {
        let json = base()
            .address(AddressBuilder::new("Rua A", "10", "Centro", "Recife", "pe", "50000-000"))
            .interest(dec!(2.5))
            .fine(dec!(10))
            .build()
            .unwrap()
            .to_json()
            .unwrap();

        assert_eq!(json["customer"]["address"]["state"], "PE");
        assert_eq!(json["customer"]["address"]["complement"], "N/A");
        assert_eq!(json["payment_terms"]["interest_monthly_percent"], 2.5);
        assert_eq!(json["payment_terms"]["fine"]["amount"], 1000);
        assert!(json["payment_terms"]["fine"].get("date").is_none());
    }

    #[test]
    fn amounts_in_cents_and_document_type() {
        let json = base().build().unwrap().to_json().unwrap();
        assert_eq!(json["services"][0]["amount"], 10050);
        assert_eq!(json["customer"]["document"]["identity"], "35649049050");
        assert_eq!(json["customer"]["document"]["type"], "CPF");
        assert_eq!(json["payment_forms"], serde_json::json!(["BANK_SLIP", "PIX"]));
    }
}
