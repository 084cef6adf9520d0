//! Document submission, one at a time or as a batch.

use chrono::NaiveDate;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::Session;
use super::error::ClientError;
use super::remote::RemoteDocument;
use super::transport::{ApiRequest, Body};
use crate::core::{DocumentRequest, MappingOptions, RawRecord};

/// Outcome of [`DocumentGenerator::generate_batch`]. Rows are 1-based.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<(usize, RemoteDocument)>,
    pub failed: Vec<(usize, ClientError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Turns raw rows or validated requests into remote documents.
#[derive(Clone)]
pub struct DocumentGenerator {
    session: Session,
    options: MappingOptions,
    today: Option<NaiveDate>,
}

impl DocumentGenerator {
    /// Row defaults come from [`ClientConfig::mapping_options`].
    ///
    /// [`ClientConfig::mapping_options`]: super::ClientConfig::mapping_options
    pub fn new(session: Session) -> Self {
        let options = session.config().mapping_options();
        Self {
            session,
            options,
            today: None,
        }
    }

    pub fn with_options(mut self, options: MappingOptions) -> Self {
        self.options = options;
        self
    }

    /// Pin "today" for due-date checks instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn options(&self) -> &MappingOptions {
        &self.options
    }

    /// Map a raw row into a validated request without sending anything.
    pub fn build_request(&self, record: &RawRecord) -> Result<DocumentRequest, ClientError> {
        let request = match self.today {
            Some(today) => record.to_request_as_of(&self.options, today)?,
            None => record.to_request(&self.options)?,
        };
        Ok(request)
    }

    /// Validate a raw row and submit it.
    pub async fn generate(&self, record: &RawRecord) -> Result<RemoteDocument, ClientError> {
        let request = self.build_request(record)?;
        self.submit(&request).await
    }

    /// Submit an already validated request.
    ///
    /// Each call sends a fresh `Idempotency-Key`.
    ///
    /// # Errors
    /// [`ClientError::RemoteRejection`] for any status other than 200/201;
    /// auth and transport failures are passed through.
    pub async fn submit(&self, request: &DocumentRequest) -> Result<RemoteDocument, ClientError> {
        let payload = request.to_json()?;
        let headers = self.session.tokens().auth_headers().await?;
        let idempotency_key = Uuid::new_v4().to_string();

        let api_request = ApiRequest::post(self.session.config().invoices_url(), Body::Json(payload))
            .headers(headers)
            .header("Idempotency-Key", idempotency_key.as_str());

        let resp = self.session.transport().execute(api_request).await?;
        match resp.status {
            200 | 201 => {
                let doc: RemoteDocument = serde_json::from_str(&resp.body)
                    .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
                info!(
                    code = request.code(),
                    id = doc.id.as_deref().unwrap_or("-"),
                    %idempotency_key,
                    "document generated"
                );
                Ok(doc)
            }
            status => {
                error!(code = request.code(), status, body = %resp.body, "document rejected");
                Err(ClientError::RemoteRejection {
                    status,
                    body: resp.body,
                })
            }
        }
    }

    /// Generate every row in order. A failing row is logged and recorded;
    /// later rows are still processed.
    pub async fn generate_batch(&self, records: &[RawRecord]) -> BatchReport {
        let mut report = BatchReport::default();
        for (index, record) in records.iter().enumerate() {
            let row = index + 1;
            match self.generate(record).await {
                Ok(doc) => report.succeeded.push((row, doc)),
                Err(e) => {
                    warn!(row, error = %e, "row failed");
                    report.failed.push((row, e));
                }
            }
        }
        info!(
            total = report.total(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "batch finished"
        );
        report
    }
}
