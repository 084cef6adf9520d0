use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;

use super::error::ValidationError;
use super::tax_id::TaxId;
use super::types::*;

/// Builder for constructing a validated [`DocumentRequest`].
///
/// Parts are validated in dependency order (tax ID, address, customer,
/// services, interest/fine, payment terms, channels); the first failure
/// aborts the build with an error scoped to the offending field.
///
/// ```
/// use boleto::core::*;
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let today = NaiveDate::from_ymd_opt(2030, 1, 10).unwrap();
/// let request = DocumentRequestBuilder::new("BOL-001")
///     .customer("Ana Souza", "ana@example.com", "529.982.247-25")
///     .address(AddressBuilder::new("Rua das Flores", "123", "Centro", "São Paulo", "sp", "01234567"))
///     .add_service("Consultoria", "Consultoria mensal", dec!(1500))
///     .due_date(NaiveDate::from_ymd_opt(2030, 2, 10).unwrap())
///     .interest(dec!(1))
///     .fine(dec!(5))
///     .email_notifications()
///     .today(today)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.customer().address().unwrap().zip_code(), "01234-567");
/// ```
pub struct DocumentRequestBuilder {
    code: String,
    customer: Option<(String, String, String)>,
    address: Option<AddressBuilder>,
    services: Vec<(String, String, Decimal)>,
    due_date: Option<NaiveDate>,
    interest_rate: Option<Decimal>,
    fine_amount: Option<Decimal>,
    fine_date: Option<NaiveDate>,
    notification_name: Option<String>,
    channels: Vec<(ChannelKind, String, Vec<NotificationRule>)>,
    email_notifications: bool,
    payment_forms: Option<Vec<PaymentForm>>,
    today: Option<NaiveDate>,
}

impl DocumentRequestBuilder {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            customer: None,
            address: None,
            services: Vec::new(),
            due_date: None,
            interest_rate: None,
            fine_amount: None,
            fine_date: None,
            notification_name: None,
            channels: Vec::new(),
            email_notifications: false,
            payment_forms: None,
            today: None,
        }
    }

    /// Customer name, email and CPF/CNPJ (formatted or bare digits).
    pub fn customer(
        mut self,
        name: impl Into<String>,
        email: impl Into<String>,
        tax_id: impl Into<String>,
    ) -> Self {
        self.customer = Some((name.into(), email.into(), tax_id.into()));
        self
    }

    pub fn address(mut self, address: AddressBuilder) -> Self {
        self.address = Some(address);
        self
    }

    pub fn add_service(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        self.services.push((name.into(), description.into(), amount));
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    /// Monthly interest in percent.
    pub fn interest(mut self, monthly_rate_percent: Decimal) -> Self {
        self.interest_rate = Some(monthly_rate_percent);
        self
    }

    /// Fine amount in reais.
    pub fn fine(mut self, amount: Decimal) -> Self {
        self.fine_amount = Some(amount);
        self
    }

    pub fn fine_date(mut self, date: NaiveDate) -> Self {
        self.fine_date = Some(date);
        self
    }

    /// Name shown in notifications (defaults to the customer name).
    pub fn notification_name(mut self, name: impl Into<String>) -> Self {
        self.notification_name = Some(name.into());
        self
    }

    pub fn add_channel(
        mut self,
        kind: ChannelKind,
        contact: impl Into<String>,
        rules: impl IntoIterator<Item = NotificationRule>,
    ) -> Self {
        self.channels
            .push((kind, contact.into(), rules.into_iter().collect()));
        self
    }

    /// Add an EMAIL channel to the customer's address with every rule.
    pub fn email_notifications(mut self) -> Self {
        self.email_notifications = true;
        self
    }

    pub fn payment_forms(mut self, forms: Vec<PaymentForm>) -> Self {
        self.payment_forms = Some(forms);
        self
    }

    /// Override "today" for the due-date check (defaults to the local date).
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn build(self) -> Result<DocumentRequest, ValidationError> {
        let (name, email, raw_tax_id) = self
            .customer
            .ok_or_else(|| ValidationError::required("customer"))?;

        let tax_id = TaxId::parse(&raw_tax_id).map_err(|e| {
            ValidationError::from(e).nested("customer")
        })?;

        let address = self
            .address
            .map(AddressBuilder::build)
            .transpose()
            .map_err(|e| e.nested("customer.address"))?;

        let customer = CustomerInfo::new(name, email, tax_id, address)
            .map_err(|e| e.nested("customer"))?;

        let services = self
            .services
            .into_iter()
            .enumerate()
            .map(|(i, (name, description, amount))| {
                ServiceLine::new(name, description, amount)
                    .map_err(|e| e.nested(&format!("services[{i}]")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let interest = InterestTerm::new(self.interest_rate)
            .map_err(|e| e.nested("payment_terms.interest"))?;
        let fine = FineTerm::new(self.fine_date, self.fine_amount)
            .map_err(|e| e.nested("payment_terms.fine"))?;

        let due_date = self
            .due_date
            .ok_or_else(|| ValidationError::required("payment_terms.due_date"))?;
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let payment_terms = PaymentTerms::new_as_of(due_date, Some(interest), Some(fine), today)
            .map_err(|e| e.nested("payment_terms"))?;

        let mut channels = Vec::new();
        if self.email_notifications {
            channels.push(
                NotificationChannel::new(
                    ChannelKind::Email,
                    customer.email(),
                    NotificationRule::ALL,
                )
                .map_err(|e| e.nested("notification.channels[0]"))?,
            );
        }
        for (kind, contact, rules) in self.channels {
            let index = channels.len();
            channels.push(
                NotificationChannel::new(kind, contact, rules)
                    .map_err(|e| e.nested(&format!("notification.channels[{index}]")))?,
            );
        }
        let notification_name = self
            .notification_name
            .unwrap_or_else(|| customer.name().to_string());
        let notification =
            Notification::new(notification_name, channels).map_err(|e| e.nested("notification"))?;

        let request =
            DocumentRequest::new(self.code, customer, services, payment_terms, notification)?;

        match self.payment_forms {
            Some(forms) => request.with_payment_forms(forms),
            None => Ok(request),
        }
    }
}

/// Builder for [`Address`]. Validation runs in [`AddressBuilder::build`].
#[derive(Debug, Clone)]
pub struct AddressBuilder {
    street: String,
    number: String,
    district: String,
    city: String,
    state: String,
    zip_code: String,
    complement: Option<String>,
}

impl AddressBuilder {
    pub fn new(
        street: impl Into<String>,
        number: impl Into<String>,
        district: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            number: number.into(),
            district: district.into(),
            city: city.into(),
            state: state.into(),
            zip_code: zip_code.into(),
            complement: None,
        }
    }

    pub fn complement(mut self, complement: impl Into<String>) -> Self {
        self.complement = Some(complement.into());
        self
    }

    pub fn build(self) -> Result<Address, ValidationError> {
        Address::validated(
            self.street,
            self.number,
            self.district,
            self.city,
            self.state,
            self.zip_code,
            self.complement,
        )
    }
}
