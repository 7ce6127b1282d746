mod admin;
mod albums;
mod reports;

use serde_json::Value;

pub use admin::health;
pub use albums::{album_data, album_index, album_report, edit_album, save_album};
pub use reports::{
    cors_headers, edit_report, run_report_get, run_report_options, run_report_put, save_report,
};

/// Form-style truthiness: null, false, zero and empty values are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
