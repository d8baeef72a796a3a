use crate::field::error::FieldError;
use crate::field::export::CoordinateExporter;
use crate::field::geometry::polygon_area_to_acres;
use crate::field::store::FieldRepository;
use crate::field::types::{FieldId, FieldRecord, NewField};
use crate::web::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct AppState {
    pub store: Arc<dyn FieldRepository>,
    pub exporter: CoordinateExporter,
}

/// A stored field plus its derived size in acres
#[derive(Serialize)]
pub struct FieldView {
    #[serde(flatten)]
    pub field: FieldRecord,
    pub size: f64,
}

impl From<FieldRecord> for FieldView {
    fn from(field: FieldRecord) -> Self {
        let size = polygon_area_to_acres(&field.coordinates);
        Self { field, size }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManipalRequest {
    #[serde(default)]
    pub field_id: Option<FieldId>,
}

pub async fn create_field_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewField>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(field) = payload?;
    let filename = state.store.create(field)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Field data saved successfully",
            "filename": filename,
        })),
    ))
}

pub async fn list_fields_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let fields: Vec<FieldView> = state
        .store
        .list()?
        .into_iter()
        .map(FieldView::from)
        .collect();

    Ok(Json(json!({
        "success": true,
        "fields": fields,
    })))
}

pub async fn get_field_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let field = FieldView::from(state.store.get_by_id(&id)?);

    Ok(Json(json!({
        "success": true,
        "field": field,
    })))
}

pub async fn delete_field_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.store.delete_by_id(&id)?;

    Ok(Json(json!({
        "success": true,
        "message": "Field deleted successfully",
    })))
}

/// Snapshot one field's coordinates into the shared export file
pub async fn update_manipal_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateManipalRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let field_id = request
        .field_id
        .map(|id| id.to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| FieldError::validation("Field ID is required"))?;

    let coordinates = state.exporter.export(state.store.as_ref(), &field_id)?;

    Ok(Json(json!({
        "success": true,
        "message": "manipal.json updated successfully",
        "coordinates": coordinates,
    })))
}
