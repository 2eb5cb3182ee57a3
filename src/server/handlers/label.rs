//! Label render and check handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::label::{ElementTypeMeta, Issue, Label, RenderedElement, element_types};
use crate::project::Values;

use super::super::state::AppState;

/// Request body for render and check.
///
/// The label is taken as raw JSON so that a malformed document gets a
/// readable 400 instead of the extractor's generic rejection.
#[derive(Debug, Deserialize)]
pub struct LabelRequest {
    pub label: serde_json::Value,
    #[serde(default)]
    pub values: Values,
}

fn parse_label(value: serde_json::Value) -> Result<Label, (StatusCode, String)> {
    serde_json::from_value(value).map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid label: {}", e)))
}

/// POST /api/label/render - project every element.
pub async fn render(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LabelRequest>,
) -> Result<Json<Vec<RenderedElement>>, (StatusCode, String)> {
    let label = parse_label(req.label)?;
    Ok(Json(label.render(&req.values, &state.rotulo.projector)))
}

/// POST /api/label/check - duplicate keys and unencodable payloads.
pub async fn check(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LabelRequest>,
) -> Result<Json<Vec<Issue>>, (StatusCode, String)> {
    let label = parse_label(req.label)?;
    Ok(Json(label.check(&req.values, &state.rotulo.projector)))
}

/// GET /api/label/element-types - element palette for the designer.
pub async fn types() -> Json<Vec<ElementTypeMeta>> {
    Json(element_types())
}
