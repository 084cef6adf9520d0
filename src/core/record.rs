//! Raw tabular input and its mapping into a [`DocumentRequest`].
//!
//! Spreadsheet and JSON rows arrive with Portuguese column names and cells
//! that may be text or numbers. [`RawRecord`] is the explicit contract for
//! that input; [`RawRecord::to_request`] is the only place where the
//! stringly-typed cells are parsed.

use std::fmt;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::ValidationError;
use super::money::{MonetaryValue, parse_amount};
use super::tax_id::TaxId;
use super::types::*;

/// Monthly interest applied when a row does not set `juros_mensal`.
pub const DEFAULT_MONTHLY_INTEREST: Decimal = dec!(1.0);
/// Fine applied when a row does not set `multa` (R$ 5,00).
pub const DEFAULT_FINE: Decimal = dec!(5.00);

/// A spreadsheet cell: text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Trimmed text of the cell, or `None` for a blank text cell.
    pub fn text(&self) -> Option<String> {
        let s = match self {
            Cell::Integer(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        };
        (!s.is_empty()).then_some(s)
    }

    fn monetary(&self) -> MonetaryValue {
        match self {
            Cell::Integer(i) => MonetaryValue::from(*i),
            Cell::Float(f) => MonetaryValue::Float(*f),
            Cell::Text(s) => MonetaryValue::Text(s.clone()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(x) => write!(f, "{x}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// One input row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "codigo", default)]
    pub code: Option<Cell>,
    #[serde(rename = "nome", default)]
    pub name: Option<Cell>,
    #[serde(default)]
    pub email: Option<Cell>,
    #[serde(rename = "documento", default)]
    pub tax_id: Option<Cell>,
    #[serde(rename = "servico_nome", default)]
    pub service_name: Option<Cell>,
    #[serde(rename = "servico_descricao", default)]
    pub service_description: Option<Cell>,
    #[serde(rename = "valor", default)]
    pub amount: Option<Cell>,
    #[serde(rename = "data_vencimento", default)]
    pub due_date: Option<Cell>,
    #[serde(rename = "juros_mensal", default)]
    pub monthly_interest: Option<Cell>,
    #[serde(rename = "multa", default)]
    pub fine: Option<Cell>,
    #[serde(rename = "telefone", default)]
    pub phone: Option<Cell>,
    #[serde(rename = "rua", default)]
    pub street: Option<Cell>,
    #[serde(rename = "numero", default)]
    pub number: Option<Cell>,
    #[serde(rename = "bairro", default)]
    pub district: Option<Cell>,
    #[serde(rename = "cidade", default)]
    pub city: Option<Cell>,
    #[serde(rename = "estado", default)]
    pub state: Option<Cell>,
    #[serde(rename = "cep", default)]
    pub zip_code: Option<Cell>,
    #[serde(rename = "complemento", default)]
    pub complement: Option<Cell>,
}

/// What to do with a due date that is malformed or already past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueDatePolicy {
    /// Fail the row with a validation error.
    #[default]
    Reject,
    /// Substitute tomorrow and log a warning.
    NextDay,
}

/// Defaults and policies applied while mapping rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingOptions {
    pub default_interest: Decimal,
    pub default_fine: Decimal,
    pub due_date_policy: DueDatePolicy,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            default_interest: DEFAULT_MONTHLY_INTEREST,
            default_fine: DEFAULT_FINE,
            due_date_policy: DueDatePolicy::Reject,
        }
    }
}

fn text(cell: &Option<Cell>) -> Option<String> {
    cell.as_ref().and_then(Cell::text)
}

fn required(cell: &Option<Cell>, column: &str) -> Result<String, ValidationError> {
    text(cell).ok_or_else(|| ValidationError::required(column))
}

fn amount(cell: &Cell, column: &str) -> Result<Decimal, ValidationError> {
    parse_amount(cell.monetary()).map_err(|e| ValidationError::new(column, e.to_string()))
}

/// Normalize a Brazilian phone number to `+55…` form.
///
/// Punctuation and spaces are dropped; numbers that already carry the `55`
/// country code get a `+`, anything else is prefixed with `+55`.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '-') && !c.is_whitespace())
        .collect();
    if digits.starts_with("+55") {
        digits
    } else if digits.starts_with("55") {
        format!("+{digits}")
    } else {
        format!("+55{digits}")
    }
}

impl RawRecord {
    /// Map this row into a validated request, using the local date as "today".
    pub fn to_request(&self, options: &MappingOptions) -> Result<DocumentRequest, ValidationError> {
        self.to_request_as_of(options, chrono::Local::now().date_naive())
    }

    /// Map this row into a validated request.
    ///
    /// Column mapping: `codigo` → code, `nome`/`email`/`documento` → customer,
    /// `servico_nome`/`servico_descricao`/`valor` → the single service line,
    /// `data_vencimento` → due date, `juros_mensal`/`multa` → interest and fine
    /// (with defaults). The address is attached only when every required
    /// address column is present. Every channel carries all four rules: EMAIL
    /// always, SMS when `telefone` is present.
    pub fn to_request_as_of(
        &self,
        options: &MappingOptions,
        today: NaiveDate,
    ) -> Result<DocumentRequest, ValidationError> {
        let code = required(&self.code, "codigo")?;
        let name = required(&self.name, "nome")?;
        let email = required(&self.email, "email")?;
        let raw_tax_id = required(&self.tax_id, "documento")?;

        let tax_id = TaxId::parse(&raw_tax_id)
            .map_err(|e| ValidationError::new("documento", e.to_string()))?;

        let address = self.address().map_err(|e| e.nested("customer.address"))?;
        let customer =
            CustomerInfo::new(name, email, tax_id, address).map_err(|e| e.nested("customer"))?;

        let service_amount = match &self.amount {
            Some(cell) => amount(cell, "valor")?,
            None => return Err(ValidationError::required("valor")),
        };
        let service = ServiceLine::new(
            required(&self.service_name, "servico_nome")?,
            required(&self.service_description, "servico_descricao")?,
            service_amount,
        )
        .map_err(|e| e.nested("services[0]"))?;

        let rate = match text(&self.monthly_interest) {
            Some(_) => self
                .monthly_interest
                .as_ref()
                .map(|c| amount(c, "juros_mensal"))
                .transpose()?,
            None => Some(options.default_interest),
        };
        let interest = InterestTerm::new(rate).map_err(|e| e.nested("juros_mensal"))?;

        let fine_amount = match text(&self.fine) {
            Some(_) => self.fine.as_ref().map(|c| amount(c, "multa")).transpose()?,
            None => Some(options.default_fine),
        };
        let fine = FineTerm::new(None, fine_amount).map_err(|e| e.nested("multa"))?;

        let due_date = self.due_date(options.due_date_policy, today)?;
        let payment_terms = PaymentTerms::new_as_of(due_date, Some(interest), Some(fine), today)
            .map_err(|e| e.nested("payment_terms"))?;

        let mut channels = vec![
            NotificationChannel::new(ChannelKind::Email, customer.email(), NotificationRule::ALL)
                .map_err(|e| e.nested("notification.channels[0]"))?,
        ];
        if let Some(phone) = text(&self.phone) {
            channels.push(
                NotificationChannel::new(
                    ChannelKind::Sms,
                    normalize_phone(&phone),
                    NotificationRule::ALL,
                )
                .map_err(|e| e.nested("telefone"))?,
            );
        }
        let notification = Notification::new(customer.name().to_string(), channels)
            .map_err(|e| e.nested("notification"))?;

        DocumentRequest::new(code, customer, vec![service], payment_terms, notification)
    }

    fn address(&self) -> Result<Option<Address>, ValidationError> {
        let fields = [
            text(&self.street),
            text(&self.number),
            text(&self.district),
            text(&self.city),
            text(&self.state),
            text(&self.zip_code),
        ];
        let [
            Some(street),
            Some(number),
            Some(district),
            Some(city),
            Some(state),
            Some(zip_code),
        ] = fields
        else {
            return Ok(None);
        };
        Address::validated(
            street,
            number,
            district,
            city,
            state,
            zip_code,
            text(&self.complement),
        )
        .map(Some)
    }

    fn due_date(&self, policy: DueDatePolicy, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
        let raw = required(&self.due_date, "data_vencimento")?;
        let parsed = parse_iso_date("data_vencimento", &raw);

        let problem = match &parsed {
            Ok(date) if *date < today => {
                format!("due date {date} is in the past (today is {today})")
            }
            Ok(date) => return Ok(*date),
            Err(e) => e.message.clone(),
        };

        match policy {
            DueDatePolicy::Reject => Err(ValidationError::new("data_vencimento", problem)),
            DueDatePolicy::NextDay => {
                let tomorrow = today
                    .checked_add_days(Days::new(1))
                    .ok_or_else(|| ValidationError::new("data_vencimento", problem.clone()))?;
                warn!(due_date = %raw, substitute = %tomorrow, "{problem}; using tomorrow");
                Ok(tomorrow)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2030, 1, 10)
    }

    fn row() -> RawRecord {
        RawRecord {
            code: Some("12345".into()),
            name: Some("João da Silva".into()),
            email: Some("joao@email.com".into()),
            tax_id: Some("356.490.490-50".into()),
            service_name: Some("Consultoria".into()),
            service_description: Some("Consultoria mensal".into()),
            amount: Some(100.50.into()),
            due_date: Some("2030-01-11".into()),
            phone: Some("(11) 98765-4321".into()),
            ..Default::default()
        }
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_phone("(11) 98765-4321"), "+5511987654321");
        assert_eq!(normalize_phone("5511987654321"), "+5511987654321");
        assert_eq!(normalize_phone("+55 11 98765-4321"), "+5511987654321");
    }

    #[test]
    fn defaults_applied() {
        let req = row().to_request_as_of(&MappingOptions::default(), today()).unwrap();
        let terms = req.payment_terms();
        assert_eq!(
            terms.interest().unwrap().monthly_rate_percent(),
            Some(dec!(1.0))
        );
        assert_eq!(terms.fine().unwrap().amount_cents(), Some(500));
        assert_eq!(req.notification().channels().len(), 2);
        assert_eq!(req.notification().channels()[1].contact(), "+5511987654321");
    }

    #[test]
    fn custom_interest_and_fine() {
        let mut r = row();
        r.monthly_interest = Some(2.5.into());
        r.fine = Some("10,00".into());
        let req = r.to_request_as_of(&MappingOptions::default(), today()).unwrap();
        let terms = req.payment_terms();
        assert_eq!(terms.interest().unwrap().monthly_rate_percent(), Some(dec!(2.5)));
        assert_eq!(terms.fine().unwrap().amount_cents(), Some(1000));
    }

    #[test]
    fn partial_address_ignored() {
        let mut r = row();
        r.street = Some("Rua A".into());
        r.city = Some("Recife".into());
        let req = r.to_request_as_of(&MappingOptions::default(), today()).unwrap();
        assert!(req.customer().address().is_none());
    }

    #[test]
    fn full_address_attached() {
        let mut r = row();
        r.street = Some("Rua Exemplo".into());
        r.number = Some(Cell::Integer(123));
        r.district = Some("Centro".into());
        r.city = Some("São Paulo".into());
        r.state = Some("sp".into());
        r.zip_code = Some("01234567".into());
        r.complement = Some("Sala 45".into());
        let req = r.to_request_as_of(&MappingOptions::default(), today()).unwrap();
        let address = req.customer().address().unwrap();
        assert_eq!(address.number(), "123");
        assert_eq!(address.state(), "SP");
        assert_eq!(address.zip_code(), "01234-567");
        assert_eq!(address.complement(), Some("Sala 45"));
    }

    #[test]
    fn past_due_date_rejected_by_default() {
        let mut r = row();
        r.due_date = Some("2030-01-01".into());
        let err = r
            .to_request_as_of(&MappingOptions::default(), today())
            .unwrap_err();
        assert_eq!(err.field, "data_vencimento");
    }

    #[test]
    fn past_due_date_rolled_forward_when_lenient() {
        let options = MappingOptions {
            due_date_policy: DueDatePolicy::NextDay,
            ..Default::default()
        };
        let mut r = row();
        r.due_date = Some("2030-01-01".into());
        let req = r.to_request_as_of(&options, today()).unwrap();
        assert_eq!(req.payment_terms().due_date(), date(2030, 1, 11));

        r.due_date = Some("not a date".into());
        let req = r.to_request_as_of(&options, today()).unwrap();
        assert_eq!(req.payment_terms().due_date(), date(2030, 1, 11));
    }

    #[test]
    fn missing_column_reported() {
        let mut r = row();
        r.email = Some("   ".into());
        let err = r
            .to_request_as_of(&MappingOptions::default(), today())
            .unwrap_err();
        assert_eq!(err.field, "email");
    }

    #[test]
    fn sub_centavo_amount_reported() {
        let mut r = row();
        r.amount = Some("0,001".into());
        let err = r
            .to_request_as_of(&MappingOptions::default(), today())
            .unwrap_err();
        assert_eq!(err.field, "services[0].amount");
    }

    #[test]
    fn bad_tax_id_reported() {
        let mut r = row();
        r.tax_id = Some("123.456.789-10".into());
        let err = r
            .to_request_as_of(&MappingOptions::default(), today())
            .unwrap_err();
        assert_eq!(err.field, "documento");
    }

    #[test]
    fn deserializes_mixed_cells() {
        let json = r#"{
            "codigo": 12345,
            "nome": "Maria",
            "email": "maria@email.com",
            "documento": "529.982.247-25",
            "servico_nome": "Aula",
            "servico_descricao": "Aula particular",
            "valor": "R$ 1.234,56",
            "data_vencimento": "2030-02-01"
        }"#;
        let r: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.code, Some(Cell::Integer(12345)));
        let req = r.to_request_as_of(&MappingOptions::default(), today()).unwrap();
        assert_eq!(req.code(), "12345");
        assert_eq!(req.services()[0].amount_cents(), 123456);
        assert_eq!(req.notification().channels().len(), 1);
    }
}
