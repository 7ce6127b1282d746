use redb::TableDefinition;

/// Albums: id -> Album (msgpack)
pub const ALBUMS: TableDefinition<u64, &[u8]> = TableDefinition::new("albums");

/// Report layouts: report_type -> ReportDefinition (msgpack)
pub const REPORT_DEFINITIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("report_definitions");

/// Preview cache rows: key -> ReportRequest (msgpack)
pub const REPORT_REQUESTS: TableDefinition<&str, &[u8]> = TableDefinition::new("report_requests");

/// Rendered pdf bytes of a preview cache row: key -> raw pdf
pub const REPORT_REQUEST_FILES: TableDefinition<&str, &[u8]> =
    TableDefinition::new("report_request_files");

/// Id sequences: table name -> last issued id
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");
