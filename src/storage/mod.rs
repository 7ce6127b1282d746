mod albums;
pub mod db;
pub mod models;
mod report_definitions;
mod report_requests;
mod tables;

pub use db::{Database, DatabaseError};
pub use report_requests::{NewReportRequest, SweepPolicy, SweepStats};
pub use tables::*;
