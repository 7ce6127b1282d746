use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::is_truthy;
use crate::api::response::{ApiError, AppJson, AppQuery};
use crate::preview::SubmitOutcome;
use crate::render::{OutputFormat, ReportError};
use crate::report_template::ALBUMS_REPORT;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct EditReportResponse {
    pub report_definition: Value,
}

#[derive(Debug, Deserialize)]
pub struct RunParams {
    #[serde(default, rename = "outputFormat")]
    pub output_format: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

/// Preview request sent by the report designer
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub report: Value,
    #[serde(default)]
    pub data: Value,
    #[serde(default, rename = "isTestData")]
    pub is_test_data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportErrorsResponse {
    pub errors: Vec<ReportError>,
}

#[derive(Debug, Serialize)]
pub struct SaveReportResponse {
    pub status: &'static str,
}

/// Layout members that must be present when a report is saved
const LAYOUT_FIELDS: [&str; 5] = [
    "docElements",
    "styles",
    "parameters",
    "documentProperties",
    "version",
];

const CORS_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, PUT, OPTIONS"),
    (
        "access-control-allow-headers",
        "Origin, X-Requested-With, X-HTTP-Method-Override, Content-Type, Accept, Z-Key",
    ),
];

// ============================================================================
// Handlers
// ============================================================================

/// The stored albums report layout, for loading into the designer.
pub async fn edit_report(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EditReportResponse>, ApiError> {
    let definition = state
        .db
        .get_report_definition(ALBUMS_REPORT)?
        .ok_or_else(|| ApiError::internal("no report_definition available"))?;

    Ok(Json(EditReportResponse {
        report_definition: definition.report_definition,
    }))
}

/// CORS preflight for the designer's cross-site preview requests.
/// The headers themselves are added by [`cors_headers`].
pub async fn run_report_options() {}

/// Render a preview and store it for a following GET.
/// Responds with `key:<key>`, or with the layout errors for the designer to highlight.
pub async fn run_report_put(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<RunParams>,
    AppJson(req): AppJson<RunRequest>,
) -> Result<Response, ApiError> {
    submit_preview(&state, &params, req)
}

/// Download a stored preview in the requested format.
pub async fn run_report_get(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<RunParams>,
) -> Result<Response, ApiError> {
    fetch_preview(&state, &params)
}

/// Store the layout saved in the designer.
pub async fn save_report(
    State(state): State<Arc<AppState>>,
    Path(report_type): Path<String>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<SaveReportResponse>, ApiError> {
    if report_type != ALBUMS_REPORT {
        return Err(ApiError::bad_request("report_type not supported"));
    }

    if LAYOUT_FIELDS.iter().any(|field| !body.contains_key(*field)) {
        return Err(ApiError::bad_request("invalid request values"));
    }

    let layout: Map<String, Value> = LAYOUT_FIELDS
        .iter()
        .filter_map(|field| body.get(*field).map(|v| (field.to_string(), v.clone())))
        .collect();

    state
        .db
        .save_report_definition(&report_type, Value::Object(layout), Utc::now())?;

    tracing::info!(report_type = %report_type, "Saved report definition");
    Ok(Json(SaveReportResponse { status: "ok" }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Response mapper for `/report/run`. Extractor rejections pass through it too,
/// so the designer can read every error.
pub async fn cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    for (name, value) in CORS_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    response
}

fn output_format(params: &RunParams) -> Result<OutputFormat, ApiError> {
    params
        .output_format
        .as_deref()
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| ApiError::bad_request("outputFormat parameter missing or invalid"))
}

fn submit_preview(
    state: &AppState,
    params: &RunParams,
    req: RunRequest,
) -> Result<Response, ApiError> {
    let format = output_format(params)?;

    let outcome = state
        .preview
        .submit(
            req.report,
            req.data,
            is_truthy(&req.is_test_data),
            format,
            Utc::now(),
        )?;

    Ok(match outcome {
        SubmitOutcome::Created(key) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("key:{key}"),
        )
            .into_response(),
        SubmitOutcome::Rejected(errors) => Json(ReportErrorsResponse { errors }).into_response(),
    })
}

fn fetch_preview(state: &AppState, params: &RunParams) -> Result<Response, ApiError> {
    let format = output_format(params)?;
    let key = params
        .key
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("report key missing"))?;

    let report_file = state.preview.fetch(key, format)?;

    let disposition = format!(
        "inline; filename=\"report-{}.{}\"",
        Utc::now().format("%Y-%m-%d-%H%M%S"),
        format.extension()
    );
    let mut response = report_file.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}
