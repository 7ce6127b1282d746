//! album-reports - An album catalogue with a report designer backend
//!
//! This crate provides:
//! - Album CRUD with form validation and filtering by year
//! - Stored report layouts, one per report type, edited in a report designer
//! - A report preview cache that links a render request to a later download
//! - redb embedded database for all persisted state

pub mod api;
pub mod config;
pub mod preview;
pub mod render;
pub mod report_template;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;
use preview::PreviewCache;
use render::ReportRenderer;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub renderer: Arc<dyn ReportRenderer>,
    pub preview: PreviewCache,
}

impl AppState {
    pub fn new(config: Config, db: Database, renderer: Arc<dyn ReportRenderer>) -> Self {
        let preview = PreviewCache::new(
            db.clone(),
            Arc::clone(&renderer),
            (&config.preview).into(),
        );
        Self {
            config,
            db,
            renderer,
            preview,
        }
    }
}
