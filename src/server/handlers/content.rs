//! Content codec and projection handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::content::{FieldMap, FieldOption, to_display, to_storage};
use crate::project::{self, Values};

use super::super::state::AppState;

/// Request body for the token codec.
#[derive(Debug, Deserialize)]
pub struct CodecRequest {
    pub content: String,
    #[serde(default)]
    pub fields: Vec<FieldOption>,
}

/// Request body for projection.
#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub content: String,
    #[serde(default)]
    pub values: Values,
    /// Escape values for insertion into paragraph HTML.
    #[serde(default)]
    pub markup: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ContentResponse {
    pub content: String,
}

/// POST /api/content/display - storage form to display form.
pub async fn display(Json(req): Json<CodecRequest>) -> Json<ContentResponse> {
    let fields = FieldMap::from_options(&req.fields);
    Json(ContentResponse {
        content: to_display(&req.content, &fields),
    })
}

/// POST /api/content/storage - display form back to storage form.
///
/// Rejects option lists where two fields share a label: the conversion
/// would be ambiguous.
pub async fn storage(
    Json(req): Json<CodecRequest>,
) -> Result<Json<ContentResponse>, (StatusCode, String)> {
    let fields = FieldMap::from_options(&req.fields);
    let collisions = fields.label_collisions();
    if !collisions.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Fields share a label: {}", collisions.join(", ")),
        ));
    }
    Ok(Json(ContentResponse {
        content: to_storage(&req.content, &fields.invert()),
    }))
}

/// POST /api/content/project - substitute values into content.
pub async fn project(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProjectRequest>,
) -> Json<ContentResponse> {
    let config = &state.rotulo.projector;
    let content = if req.markup {
        project::project_markup(&req.content, &req.values, config, Local::now())
    } else {
        project::project(&req.content, &req.values, config)
    };
    Json(ContentResponse { content })
}
