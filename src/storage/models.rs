use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A music album stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: u64,
    pub name: String,
    pub artist: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub best_of_compilation: bool,
}

/// Validated album fields, used for both inserts and updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumValues {
    pub name: String,
    pub artist: String,
    pub year: Option<i32>,
    pub best_of_compilation: bool,
}

impl AlbumValues {
    pub fn into_album(self, id: u64) -> Album {
        Album {
            id,
            name: self.name,
            artist: self.artist,
            year: self.year,
            best_of_compilation: self.best_of_compilation,
        }
    }
}

/// A stored report layout, one per report type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub id: u64,
    pub report_type: String,
    pub report_definition: serde_json::Value,
    #[serde(default)]
    pub remark: Option<String>,
    pub last_modified_at: DateTime<Utc>,
}

/// A preview cache row. The rendered pdf is kept separately in
/// `REPORT_REQUEST_FILES` under the same key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub id: u64,
    pub key: String,
    /// Layout document as JSON text
    pub report_definition: String,
    /// Report data as JSON text
    pub data: String,
    pub is_test_data: bool,
    pub pdf_file_size: u64,
    pub created_on: DateTime<Utc>,
}

/// A preview cache row together with its cached pdf, if any.
#[derive(Debug, Clone)]
pub struct CachedReport {
    pub request: ReportRequest,
    pub pdf_file: Option<Vec<u8>>,
}
