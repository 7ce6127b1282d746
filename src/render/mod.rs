//! Report rendering.
//!
//! Rendering sits behind [`ReportRenderer`] so the layout engine can be swapped
//! out. [`BasicRenderer`] understands text and table elements and writes
//! simple pdf and xlsx documents.

mod basic;
mod layout;
mod pdf;
mod xlsx;

pub use basic::BasicRenderer;

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output formats a report can be rendered to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pdf,
    Xlsx,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(OutputFormat::Pdf),
            "xlsx" => Ok(OutputFormat::Xlsx),
            other => Err(RenderError::Init(format!("unsupported output format '{other}'"))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A layout document paired with the data to fill it.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub layout: serde_json::Value,
    pub data: serde_json::Value,
    /// Data was entered in the designer, so values may arrive as strings
    pub is_test_data: bool,
}

impl RenderJob {
    pub fn new(layout: serde_json::Value, data: serde_json::Value, is_test_data: bool) -> Self {
        Self {
            layout,
            data,
            is_test_data,
        }
    }
}

/// A problem in a layout document, addressed to the object and field the
/// designer should highlight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportError {
    pub object_id: Option<i64>,
    pub field: String,
    pub msg_key: String,
    #[serde(default)]
    pub info: Option<String>,
}

impl ReportError {
    pub fn new(msg_key: &str, object_id: Option<i64>, field: &str) -> Self {
        Self {
            object_id,
            field: field.to_string(),
            msg_key: msg_key.to_string(),
            info: None,
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.msg_key, self.field)?;
        if let Some(id) = self.object_id {
            write!(f, " on object {id}")?;
        }
        if let Some(ref info) = self.info {
            write!(f, ": {info}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    /// The layout or data could not be read at all
    #[error("{0}")]
    Init(String),
    /// The layout is readable but could not be rendered
    #[error("report error: {0}")]
    Report(ReportError),
    /// Writing the output document failed
    #[error("output error: {0}")]
    Output(String),
}

/// A report layout engine.
pub trait ReportRenderer: Send + Sync {
    /// Check a job for structural errors. An empty list means it can be rendered.
    fn validate(&self, job: &RenderJob) -> Result<Vec<ReportError>, RenderError>;

    /// Render a job that passed validation.
    fn render(&self, job: &RenderJob, format: OutputFormat) -> Result<Bytes, RenderError>;
}
