//! Shared test helpers for handler tests.

use std::sync::Arc;

use crate::config::{Config, ServerConfig};
use crate::render::BasicRenderer;
use crate::report_template::{albums_report_template, ALBUMS_REPORT};
use crate::storage::Database;
use crate::AppState;

/// Create a test AppState with a temporary database and a seeded albums report.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");

    let config = Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        ..Default::default()
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    db.ensure_report_definition(ALBUMS_REPORT, &albums_report_template(), chrono::Utc::now())
        .expect("Failed to seed report definition");

    Arc::new(AppState::new(config, db, Arc::new(BasicRenderer::new())))
}

/// Text strings drawn on the pages of a PDF, in content stream order.
pub fn pdf_strings(pdf: &[u8]) -> Vec<String> {
    let doc = lopdf::Document::load_mem(pdf).expect("Failed to parse pdf");
    let mut strings = Vec::new();
    for page_id in doc.get_pages().into_values() {
        let content = doc.get_page_content(page_id).expect("Failed to read page");
        let content = lopdf::content::Content::decode(&content).expect("Failed to decode page");
        for op in content.operations.into_iter().filter(|op| op.operator == "Tj") {
            if let Some(lopdf::Object::String(bytes, _)) = op.operands.first() {
                strings.push(bytes.iter().map(|&b| b as char).collect());
            }
        }
    }
    strings
}
