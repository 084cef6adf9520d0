use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::money::to_cents;
use super::tax_id::TaxId;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern is valid")
});

/// Date format used on the wire and accepted from raw input.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn non_empty(field: &str, value: impl Into<String>) -> Result<String, ValidationError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(trimmed.to_string())
}

/// Parse an ISO `YYYY-MM-DD` calendar date.
pub fn parse_iso_date(field: &str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ValidationError::new(field, format!("'{value}' is not a valid date in YYYY-MM-DD format"))
    })
}

/// Customer postal address. Built through [`AddressBuilder`](super::AddressBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub(crate) street: String,
    pub(crate) number: String,
    pub(crate) district: String,
    pub(crate) city: String,
    pub(crate) state: String,
    pub(crate) zip_code: String,
    pub(crate) complement: Option<String>,
}

impl Address {
    pub(crate) fn validated(
        street: String,
        number: String,
        district: String,
        city: String,
        state: String,
        zip_code: String,
        complement: Option<String>,
    ) -> Result<Self, ValidationError> {
        let street = non_empty("street", street)?;
        let number = non_empty("number", number)?;
        let district = non_empty("district", district)?;
        let city = non_empty("city", city)?;
        let state = non_empty("state", state)?.to_uppercase();
        let zip_code = normalize_zip_code(&non_empty("zip_code", zip_code)?)?;
        let complement = complement
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            street,
            number,
            district,
            city,
            state,
            zip_code,
            complement,
        })
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn district(&self) -> &str {
        &self.district
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Upper-cased state (UF) code.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// CEP in `NNNNN-NNN` form.
    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }

    pub fn complement(&self) -> Option<&str> {
        self.complement.as_deref()
    }
}

/// Reduce a CEP to its digits and re-format it as `NNNNN-NNN`.
fn normalize_zip_code(raw: &str) -> Result<String, ValidationError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 8 || raw.chars().any(|c| c.is_alphabetic()) {
        return Err(ValidationError::new(
            "zip_code",
            format!("'{raw}' is not a valid CEP (expected 8 digits)"),
        ));
    }
    Ok(format!("{}-{}", &digits[..5], &digits[5..]))
}

/// The billed customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerInfo {
    name: String,
    email: String,
    tax_id: TaxId,
    address: Option<Address>,
}

impl CustomerInfo {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        tax_id: TaxId,
        address: Option<Address>,
    ) -> Result<Self, ValidationError> {
        let name = non_empty("name", name)?;
        let email = non_empty("email", email)?.to_lowercase();
        if !EMAIL_RE.is_match(&email) {
            return Err(ValidationError::new(
                "email",
                format!("'{email}' is not a valid email address"),
            ));
        }
        Ok(Self {
            name,
            email,
            tax_id,
            address,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn tax_id(&self) -> &TaxId {
        &self.tax_id
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }
}

/// One billed service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceLine {
    name: String,
    description: String,
    amount: Decimal,
}

impl ServiceLine {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Result<Self, ValidationError> {
        let name = non_empty("name", name)?;
        let description = non_empty("description", description)?;
        if amount <= Decimal::ZERO {
            return Err(ValidationError::new(
                "amount",
                format!("must be greater than zero, got {amount}"),
            ));
        }
        match to_cents(amount) {
            None => return Err(ValidationError::new("amount", "amount is too large")),
            Some(cents) if cents < 1 => {
                return Err(ValidationError::new(
                    "amount",
                    format!("must be at least R$ 0,01, got {amount}"),
                ));
            }
            Some(_) => {}
        }
        Ok(Self {
            name,
            description,
            amount,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Amount in reais.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Amount in integer centavos.
    pub fn amount_cents(&self) -> i64 {
        to_cents(self.amount).unwrap_or_default()
    }
}

/// Delivery channel for payment reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelKind {
    Email,
    Sms,
    Whatsapp,
}

impl ChannelKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Sms => "SMS",
            Self::Whatsapp => "WHATSAPP",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "EMAIL" => Some(Self::Email),
            "SMS" => Some(Self::Sms),
            "WHATSAPP" => Some(Self::Whatsapp),
            _ => None,
        }
    }
}

/// When a reminder is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotificationRule {
    #[serde(rename = "NOTIFY_FIVE_DAYS_BEFORE_DUE_DATE")]
    FiveDaysBeforeDueDate,
    #[serde(rename = "NOTIFY_TWO_DAYS_BEFORE_DUE_DATE")]
    TwoDaysBeforeDueDate,
    #[serde(rename = "NOTIFY_ON_DUE_DATE")]
    OnDueDate,
    #[serde(rename = "NOTIFY_WHEN_PAID")]
    WhenPaid,
}

impl NotificationRule {
    /// Every rule, in the order the remote service documents them.
    pub const ALL: [NotificationRule; 4] = [
        Self::FiveDaysBeforeDueDate,
        Self::TwoDaysBeforeDueDate,
        Self::OnDueDate,
        Self::WhenPaid,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::FiveDaysBeforeDueDate => "NOTIFY_FIVE_DAYS_BEFORE_DUE_DATE",
            Self::TwoDaysBeforeDueDate => "NOTIFY_TWO_DAYS_BEFORE_DUE_DATE",
            Self::OnDueDate => "NOTIFY_ON_DUE_DATE",
            Self::WhenPaid => "NOTIFY_WHEN_PAID",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "NOTIFY_FIVE_DAYS_BEFORE_DUE_DATE" => Some(Self::FiveDaysBeforeDueDate),
            "NOTIFY_TWO_DAYS_BEFORE_DUE_DATE" => Some(Self::TwoDaysBeforeDueDate),
            "NOTIFY_ON_DUE_DATE" => Some(Self::OnDueDate),
            "NOTIFY_WHEN_PAID" => Some(Self::WhenPaid),
            _ => None,
        }
    }
}

/// A reminder channel with its trigger rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationChannel {
    kind: ChannelKind,
    contact: String,
    rules: BTreeSet<NotificationRule>,
}

impl NotificationChannel {
    pub fn new(
        kind: ChannelKind,
        contact: impl Into<String>,
        rules: impl IntoIterator<Item = NotificationRule>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            kind,
            contact: non_empty("contact", contact)?,
            rules: rules.into_iter().collect(),
        })
    }

    /// Build a channel from wire codes, rejecting unknown kinds or rules.
    pub fn from_codes(
        kind: &str,
        contact: impl Into<String>,
        rules: &[&str],
    ) -> Result<Self, ValidationError> {
        let kind = ChannelKind::from_code(kind).ok_or_else(|| {
            ValidationError::new("channel", format!("unknown notification channel '{kind}'"))
        })?;
        let rules = rules
            .iter()
            .map(|r| {
                NotificationRule::from_code(r).ok_or_else(|| {
                    ValidationError::new("rules", format!("unknown notification rule '{r}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(kind, contact, rules)
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn rules(&self) -> impl Iterator<Item = NotificationRule> + '_ {
        self.rules.iter().copied()
    }
}

/// Notification plan: who is notified, over which channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    name: String,
    channels: Vec<NotificationChannel>,
}

impl Notification {
    pub fn new(
        name: impl Into<String>,
        channels: Vec<NotificationChannel>,
    ) -> Result<Self, ValidationError> {
        let name = non_empty("name", name)?;
        if channels.is_empty() {
            return Err(ValidationError::new(
                "channels",
                "at least one notification channel is required",
            ));
        }
        Ok(Self { name, channels })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channels(&self) -> &[NotificationChannel] {
        &self.channels
    }
}

/// Monthly interest charged after the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct InterestTerm {
    monthly_rate_percent: Option<Decimal>,
}

impl InterestTerm {
    pub fn new(monthly_rate_percent: Option<Decimal>) -> Result<Self, ValidationError> {
        if let Some(rate) = monthly_rate_percent {
            if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                return Err(ValidationError::new(
                    "rate",
                    format!("monthly interest must be between 0 and 100%, got {rate}"),
                ));
            }
        }
        Ok(Self {
            monthly_rate_percent,
        })
    }

    pub fn monthly_rate_percent(&self) -> Option<Decimal> {
        self.monthly_rate_percent
    }

    pub fn is_empty(&self) -> bool {
        self.monthly_rate_percent.is_none()
    }
}

/// Late-payment fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FineTerm {
    date: Option<NaiveDate>,
    amount: Option<Decimal>,
}

impl FineTerm {
    pub fn new(date: Option<NaiveDate>, amount: Option<Decimal>) -> Result<Self, ValidationError> {
        if let Some(amount) = amount {
            if amount < Decimal::ZERO {
                return Err(ValidationError::new(
                    "amount",
                    format!("fine must be greater than or equal to zero, got {amount}"),
                ));
            }
            match to_cents(amount) {
                None => return Err(ValidationError::new("amount", "fine is too large")),
                // A positive fine that rounds away would be sent as zero
                Some(0) if amount > Decimal::ZERO => {
                    return Err(ValidationError::new(
                        "amount",
                        format!("fine must be zero or at least R$ 0,01, got {amount}"),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(Self { date, amount })
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Fine in reais.
    pub fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    pub fn amount_cents(&self) -> Option<i64> {
        self.amount.and_then(to_cents)
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.amount.is_none()
    }
}

/// Due date plus optional interest and fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentTerms {
    due_date: NaiveDate,
    interest: Option<InterestTerm>,
    fine: Option<FineTerm>,
}

impl PaymentTerms {
    /// Build payment terms, rejecting due dates before today (local time).
    pub fn new(
        due_date: NaiveDate,
        interest: Option<InterestTerm>,
        fine: Option<FineTerm>,
    ) -> Result<Self, ValidationError> {
        Self::new_as_of(due_date, interest, fine, Local::now().date_naive())
    }

    /// Same as [`PaymentTerms::new`] with an explicit "today".
    pub fn new_as_of(
        due_date: NaiveDate,
        interest: Option<InterestTerm>,
        fine: Option<FineTerm>,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        if due_date < today {
            return Err(ValidationError::new(
                "due_date",
                format!("due date {due_date} is in the past (today is {today})"),
            ));
        }
        Ok(Self {
            due_date,
            interest: interest.filter(|i| !i.is_empty()),
            fine: fine.filter(|f| !f.is_empty()),
        })
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn interest(&self) -> Option<&InterestTerm> {
        self.interest.as_ref()
    }

    pub fn fine(&self) -> Option<&FineTerm> {
        self.fine.as_ref()
    }
}

/// Accepted settlement rails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentForm {
    BankSlip,
    Pix,
}

impl PaymentForm {
    pub const DEFAULT: [PaymentForm; 2] = [Self::BankSlip, Self::Pix];

    pub fn code(&self) -> &'static str {
        match self {
            Self::BankSlip => "BANK_SLIP",
            Self::Pix => "PIX",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "BANK_SLIP" => Some(Self::BankSlip),
            "PIX" => Some(Self::Pix),
            _ => None,
        }
    }
}

/// The aggregate submitted to the invoicing service.
///
/// Every part is validated when it is constructed; once a `DocumentRequest`
/// exists it is complete and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRequest {
    pub(crate) code: String,
    pub(crate) customer: CustomerInfo,
    pub(crate) services: Vec<ServiceLine>,
    pub(crate) payment_terms: PaymentTerms,
    pub(crate) notification: Notification,
    pub(crate) payment_forms: Vec<PaymentForm>,
}

impl DocumentRequest {
    pub fn new(
        code: impl Into<String>,
        customer: CustomerInfo,
        services: Vec<ServiceLine>,
        payment_terms: PaymentTerms,
        notification: Notification,
    ) -> Result<Self, ValidationError> {
        let code = non_empty("code", code)?;
        if services.is_empty() {
            return Err(ValidationError::new(
                "services",
                "at least one service line is required",
            ));
        }
        Ok(Self {
            code,
            customer,
            services,
            payment_terms,
            notification,
            payment_forms: PaymentForm::DEFAULT.to_vec(),
        })
    }

    /// Replace the default `[BANK_SLIP, PIX]` payment forms.
    pub fn with_payment_forms(mut self, forms: Vec<PaymentForm>) -> Result<Self, ValidationError> {
        if forms.is_empty() {
            return Err(ValidationError::new(
                "payment_forms",
                "at least one payment form is required",
            ));
        }
        self.payment_forms = forms;
        Ok(self)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    pub fn services(&self) -> &[ServiceLine] {
        &self.services
    }

    pub fn payment_terms(&self) -> &PaymentTerms {
        &self.payment_terms
    }

    pub fn notification(&self) -> &Notification {
        &self.notification
    }

    pub fn payment_forms(&self) -> &[PaymentForm] {
        &self.payment_forms
    }

    /// Sum of all service lines, in reais.
    pub fn total_amount(&self) -> Decimal {
        self.services.iter().map(ServiceLine::amount).sum()
    }
}
