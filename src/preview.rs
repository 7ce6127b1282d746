//! Report preview cache.
//!
//! A preview is generated by one request and downloaded by another. `submit`
//! renders the pdf and stores it together with the layout and data under a
//! fresh key. `fetch` serves the stored pdf, or renders again from the stored
//! layout when a spreadsheet is requested.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::render::{OutputFormat, RenderError, RenderJob, ReportError, ReportRenderer};
use crate::storage::{Database, DatabaseError, NewReportRequest, SweepPolicy};

/// Length of a preview key (a hyphenated UUID)
pub const KEY_LENGTH: usize = 36;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("report not found")]
    NotFound,
    #[error("failed to initialize report: {0}")]
    Init(String),
    #[error("error generating report: {0}")]
    Render(RenderError),
    #[error("Database error: {0}")]
    Storage(#[from] DatabaseError),
    #[error("Invalid cached report: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RenderError> for PreviewError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Init(msg) => PreviewError::Init(msg),
            other => PreviewError::Render(other),
        }
    }
}

/// Result of a preview submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The preview was rendered and can be fetched with this key
    Created(String),
    /// The layout contains errors; nothing was stored
    Rejected(Vec<ReportError>),
}

pub struct PreviewCache {
    db: Database,
    renderer: Arc<dyn ReportRenderer>,
    policy: SweepPolicy,
}

impl PreviewCache {
    pub fn new(db: Database, renderer: Arc<dyn ReportRenderer>, policy: SweepPolicy) -> Self {
        Self {
            db,
            renderer,
            policy,
        }
    }

    /// Validate and render a preview, then store it under a new key.
    ///
    /// Old previews are swept before the new one is stored. Only the pdf is
    /// rendered here; other formats are rendered on fetch.
    pub fn submit(
        &self,
        layout: serde_json::Value,
        data: serde_json::Value,
        is_test_data: bool,
        format: OutputFormat,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, PreviewError> {
        let job = RenderJob::new(layout, data, is_test_data);

        let errors = self.renderer.validate(&job)?;
        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "Preview rejected");
            return Ok(SubmitOutcome::Rejected(errors));
        }

        let stats = self.db.sweep_report_requests(now, &self.policy)?;
        if stats.expired > 0 || stats.evicted > 0 {
            tracing::debug!(
                expired = stats.expired,
                evicted = stats.evicted,
                "Swept preview cache"
            );
        }

        let start = Instant::now();
        let pdf_file = match self.renderer.render(&job, OutputFormat::Pdf) {
            Ok(pdf_file) => pdf_file,
            Err(RenderError::Report(error)) => {
                return Ok(SubmitOutcome::Rejected(vec![error]));
            }
            Err(e) => return Err(e.into()),
        };

        let key = uuid::Uuid::new_v4().to_string();
        self.db.insert_report_request(NewReportRequest {
            key: &key,
            report_definition: serde_json::to_string(&job.layout)?,
            data: serde_json::to_string(&job.data)?,
            is_test_data: job.is_test_data,
            pdf_file: Some(&pdf_file[..]),
            created_on: now,
        })?;

        tracing::debug!(
            key = %key,
            format = %format,
            bytes = pdf_file.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Stored report preview"
        );

        Ok(SubmitOutcome::Created(key))
    }

    /// Return the preview stored under `key` in the requested format.
    pub fn fetch(&self, key: &str, format: OutputFormat) -> Result<Bytes, PreviewError> {
        if key.len() != KEY_LENGTH {
            return Err(PreviewError::NotFound);
        }

        let cached = self
            .db
            .get_report_request(key)?
            .ok_or(PreviewError::NotFound)?;

        if format == OutputFormat::Pdf {
            if let Some(pdf_file) = cached.pdf_file {
                return Ok(Bytes::from(pdf_file));
            }
        }

        let job = RenderJob::new(
            serde_json::from_str(&cached.request.report_definition)?,
            serde_json::from_str(&cached.request.data)?,
            cached.request.is_test_data,
        );
        if let Some(error) = self.renderer.validate(&job)?.into_iter().next() {
            return Err(PreviewError::Render(RenderError::Report(error)));
        }

        Ok(self.renderer.render(&job, format)?)
    }
}
