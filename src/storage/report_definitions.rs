use chrono::{DateTime, Utc};
use redb::{ReadableTable, WriteTransaction};

use super::db::{next_id, Database, DatabaseError};
use super::models::ReportDefinition;
use super::tables::*;

impl Database {
    // ========================================================================
    // Report definition operations
    // ========================================================================

    /// Get the layout stored for a report type
    pub fn get_report_definition(
        &self,
        report_type: &str,
    ) -> Result<Option<ReportDefinition>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(REPORT_DEFINITIONS)?;

        match table.get(report_type)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or replace the layout of a report type. An existing row keeps its id and remark.
    pub fn save_report_definition(
        &self,
        report_type: &str,
        layout: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<ReportDefinition, DatabaseError> {
        let write_txn = self.begin_write()?;
        let definition = {
            let existing = read_definition(&write_txn, report_type)?;
            let definition = match existing {
                Some(mut definition) => {
                    definition.report_definition = layout;
                    definition.last_modified_at = now;
                    definition
                }
                None => ReportDefinition {
                    id: next_id(&write_txn, "report_definitions")?,
                    report_type: report_type.to_string(),
                    report_definition: layout,
                    remark: None,
                    last_modified_at: now,
                },
            };
            write_definition(&write_txn, &definition)?;
            definition
        };
        write_txn.commit()?;
        Ok(definition)
    }

    /// Store `default` for the report type unless a layout already exists.
    /// Returns true if the default was inserted.
    pub fn ensure_report_definition(
        &self,
        report_type: &str,
        default: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let created = if read_definition(&write_txn, report_type)?.is_some() {
            false
        } else {
            let definition = ReportDefinition {
                id: next_id(&write_txn, "report_definitions")?,
                report_type: report_type.to_string(),
                report_definition: default.clone(),
                remark: None,
                last_modified_at: now,
            };
            write_definition(&write_txn, &definition)?;
            true
        };
        write_txn.commit()?;
        Ok(created)
    }
}

fn read_definition(
    write_txn: &WriteTransaction,
    report_type: &str,
) -> Result<Option<ReportDefinition>, DatabaseError> {
    let table = write_txn.open_table(REPORT_DEFINITIONS)?;
    let result = match table.get(report_type)? {
        Some(data) => Some(rmp_serde::from_slice(data.value())?),
        None => None,
    };
    Ok(result)
}

fn write_definition(
    write_txn: &WriteTransaction,
    definition: &ReportDefinition,
) -> Result<(), DatabaseError> {
    let mut table = write_txn.open_table(REPORT_DEFINITIONS)?;
    let data = rmp_serde::to_vec_named(definition)?;
    table.insert(definition.report_type.as_str(), data.as_slice())?;
    Ok(())
}
