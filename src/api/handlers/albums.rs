use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::is_truthy;
use crate::api::response::{ApiError, AppJson, AppQuery};
use crate::render::{OutputFormat, RenderJob};
use crate::report_template::ALBUMS_REPORT;
use crate::storage::models::{Album, AlbumValues};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct YearParams {
    #[serde(default)]
    pub year: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AlbumIndexResponse {
    pub albums: Vec<Album>,
}

#[derive(Debug, Serialize)]
pub struct EditAlbumResponse {
    pub is_new: bool,
    pub album: Value,
}

#[derive(Debug, Deserialize)]
pub struct SaveAlbumRequest {
    #[serde(default)]
    pub album: Value,
}

/// A validation message for a single form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub msg: String,
}

impl FieldError {
    fn new(field: &str, msg: &str) -> Self {
        Self {
            field: field.to_string(),
            msg: msg.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveAlbumResponse {
    pub errors: Vec<FieldError>,
}

const MAX_TEXT_LENGTH: usize = 100;
const MIN_YEAR: i64 = 1900;
const MAX_YEAR: i64 = 2100;

const MSG_EMPTY: &str = "the field must not be empty";
const MSG_TOO_LONG: &str = "the field must not be longer than 100 characters";
const MSG_NOT_A_NUMBER: &str = "the field must contain a number";
const MSG_INVALID_YEAR: &str = "the field must contain a valid year";

// ============================================================================
// Handlers
// ============================================================================

/// Albums as a JSON array, optionally filtered by year.
pub async fn album_data(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<YearParams>,
) -> Result<Json<Vec<Album>>, ApiError> {
    let year = parse_year(params.year.as_deref())?;
    Ok(Json(state.db.list_albums(year)?))
}

pub async fn album_index(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AlbumIndexResponse>, ApiError> {
    Ok(Json(AlbumIndexResponse {
        albums: state.db.list_albums(None)?,
    }))
}

/// Form data for a new album, or for an existing one when an id is given.
/// An unknown id redirects back to the index.
pub async fn edit_album(
    State(state): State<Arc<AppState>>,
    id: Option<Path<String>>,
) -> Result<Response, ApiError> {
    let Some(Path(raw_id)) = id else {
        return Ok(Json(EditAlbumResponse {
            is_new: true,
            album: json!({
                "id": "",
                "name": "",
                "artist": "",
                "year": null,
                "best_of_compilation": false,
            }),
        })
        .into_response());
    };

    let album_id: u64 = raw_id
        .parse()
        .map_err(|_| ApiError::bad_request("invalid argument"))?;

    match state.db.get_album(album_id)? {
        Some(album) => Ok(Json(EditAlbumResponse {
            is_new: false,
            album: serde_json::to_value(album)
                .map_err(|e| ApiError::internal(e.to_string()))?,
        })
        .into_response()),
        None => Ok(Redirect::to("/album/index").into_response()),
    }
}

/// Validate and store an album. Validation problems are returned as field
/// errors with a 200 status so the form can show them.
pub async fn save_album(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SaveAlbumRequest>,
) -> Result<Json<SaveAlbumResponse>, ApiError> {
    let album = req
        .album
        .as_object()
        .ok_or_else(|| ApiError::bad_request("invalid values"))?;

    let album_id = parse_album_id(album.get("id"))?;

    let values = match validate_album(album) {
        Ok(values) => values,
        Err(errors) => return Ok(Json(SaveAlbumResponse { errors })),
    };

    match album_id {
        Some(id) => {
            if state.db.update_album(id, values)? {
                tracing::debug!(album_id = id, "Updated album");
            } else {
                tracing::debug!(album_id = id, "Album to update does not exist");
            }
        }
        None => {
            let album = state.db.insert_album(values)?;
            tracing::debug!(album_id = album.id, "Created album");
        }
    }

    Ok(Json(SaveAlbumResponse { errors: Vec::new() }))
}

/// Render the albums report as a pdf using the stored layout.
pub async fn album_report(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<YearParams>,
) -> Result<Response, ApiError> {
    let year = parse_year(params.year.as_deref())?;
    let albums = state.db.list_albums(year)?;

    let definition = state
        .db
        .get_report_definition(ALBUMS_REPORT)?
        .ok_or_else(|| ApiError::internal("no report_definition available"))?;

    let data = json!({
        "year": year,
        "albums": albums,
        "current_date": Utc::now().to_rfc3339(),
    });
    let job = RenderJob::new(definition.report_definition, data, false);

    let report_error = |msg: String| ApiError::internal(format!("report error: {msg}"));

    let errors = state
        .renderer
        .validate(&job)
        .map_err(|e| report_error(e.to_string()))?;
    if let Some(error) = errors.first() {
        // A stored layout should never contain errors unless it was saved without testing
        tracing::warn!(error = %error, "Stored albums report has errors");
        return Err(report_error(error.to_string()));
    }

    let pdf_file = state
        .renderer
        .render(&job, OutputFormat::Pdf)
        .map_err(|e| report_error(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, OutputFormat::Pdf.content_type()),
            (header::CONTENT_DISPOSITION, "inline; filename=\"albums.pdf\""),
        ],
        pdf_file,
    )
        .into_response())
}

// ============================================================================
// Helpers
// ============================================================================

/// An absent or empty year means no filter.
fn parse_year(raw: Option<&str>) -> Result<Option<i32>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request("invalid year parameter")),
    }
}

/// An empty, zero or missing id means a new album.
fn parse_album_id(value: Option<&Value>) -> Result<Option<u64>, ApiError> {
    let invalid = || ApiError::bad_request("invalid album id");
    match value {
        None => Ok(None),
        Some(v) if !is_truthy(v) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

fn text_field(
    album: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let text = match album.get(field) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            errors.push(FieldError::new(field, MSG_EMPTY));
            return None;
        }
    };
    if text.chars().count() > MAX_TEXT_LENGTH {
        errors.push(FieldError::new(field, MSG_TOO_LONG));
        return None;
    }
    Some(text)
}

fn year_field(album: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<i32> {
    let value = album.get("year").filter(|v| is_truthy(v))?;

    let year = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match year {
        None => {
            errors.push(FieldError::new("year", MSG_NOT_A_NUMBER));
            None
        }
        Some(y) if !(MIN_YEAR..=MAX_YEAR).contains(&y) => {
            errors.push(FieldError::new("year", MSG_INVALID_YEAR));
            None
        }
        Some(y) => Some(y as i32),
    }
}

/// Check the submitted album fields, returning every problem found.
pub fn validate_album(album: &Map<String, Value>) -> Result<AlbumValues, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = text_field(album, "name", &mut errors);
    let artist = text_field(album, "artist", &mut errors);
    let year = year_field(album, &mut errors);
    let best_of_compilation = album
        .get("best_of_compilation")
        .map(is_truthy)
        .unwrap_or(false);

    match (name, artist) {
        (Some(name), Some(artist)) if errors.is_empty() => Ok(AlbumValues {
            name,
            artist,
            year,
            best_of_compilation,
        }),
        _ => Err(errors),
    }
}
