use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use parking_core::{ListResult, ServiceError};

use crate::fee::FeeQuote;
use crate::model::{AssignRequest, SlotPatch, SlotView};
use crate::registry::SlotRegistry;

type RegistryState = Arc<SlotRegistry>;

pub fn router(registry: Arc<SlotRegistry>) -> Router {
    Router::new()
        .route("/slots", post(create_slot).get(list_slots))
        .route("/slots/@available", get(list_available))
        .route("/slots/@assign", post(assign_vehicle))
        .route(
            "/slots/{id}",
            get(get_slot).put(update_slot).delete(delete_slot),
        )
        .route("/slots/{id}/@fee", get(compute_fee))
        .route("/slots/{id}/@release", post(release_slot))
        .with_state(registry)
}

/// Unwrap a JSON body, reporting malformed input as a validation failure.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    payload
        .map(|Json(v)| v)
        .map_err(|rejection| ServiceError::Validation(rejection.body_text()))
}

// ---------------------------------------------------------------------------
// POST /slots
// ---------------------------------------------------------------------------

async fn create_slot(
    State(registry): State<RegistryState>,
) -> Result<(StatusCode, Json<SlotView>), ServiceError> {
    let slot = registry.create_slot()?;
    Ok((StatusCode::CREATED, Json(SlotView::from(&slot))))
}

// ---------------------------------------------------------------------------
// GET /slots
// ---------------------------------------------------------------------------

async fn list_slots(
    State(registry): State<RegistryState>,
) -> Result<Json<ListResult<SlotView>>, ServiceError> {
    let slots = registry.list_slots()?;
    Ok(Json(ListResult::new(slots.iter().map(SlotView::from).collect())))
}

// ---------------------------------------------------------------------------
// GET /slots/@available
// ---------------------------------------------------------------------------

async fn list_available(
    State(registry): State<RegistryState>,
) -> Result<Json<ListResult<SlotView>>, ServiceError> {
    let slots = registry.list_available()?;
    Ok(Json(ListResult::new(slots.iter().map(SlotView::from).collect())))
}

// ---------------------------------------------------------------------------
// POST /slots/@assign
// ---------------------------------------------------------------------------

async fn assign_vehicle(
    State(registry): State<RegistryState>,
    payload: Result<Json<AssignRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let req = body(payload)?;

    // argon2 hashing blocks; run it off the async workers.
    let assignment = tokio::task::spawn_blocking(move || registry.assign_vehicle(&req.plate))
        .await
        .map_err(|e| ServiceError::Internal(format!("assignment task failed: {e}")))??;

    Ok(Json(json!({
        "assigned": true,
        "id": assignment.id,
        "number": assignment.number,
    })))
}

// ---------------------------------------------------------------------------
// GET /slots/{id}
// ---------------------------------------------------------------------------

async fn get_slot(
    State(registry): State<RegistryState>,
    Path(id): Path<String>,
) -> Result<Json<SlotView>, ServiceError> {
    let slot = registry.get_slot(&id)?;
    Ok(Json(SlotView::from(&slot)))
}

// ---------------------------------------------------------------------------
// PUT /slots/{id}
// ---------------------------------------------------------------------------

async fn update_slot(
    State(registry): State<RegistryState>,
    Path(id): Path<String>,
    payload: Result<Json<SlotPatch>, JsonRejection>,
) -> Result<Json<SlotView>, ServiceError> {
    let patch = body(payload)?;
    let slot = registry.update_slot(&id, &patch)?;
    Ok(Json(SlotView::from(&slot)))
}

// ---------------------------------------------------------------------------
// DELETE /slots/{id}
// ---------------------------------------------------------------------------

async fn delete_slot(
    State(registry): State<RegistryState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    registry.delete_slot(&id)?;
    Ok(Json(json!({ "deleted": true })))
}

// ---------------------------------------------------------------------------
// GET /slots/{id}/@fee
// ---------------------------------------------------------------------------

async fn compute_fee(
    State(registry): State<RegistryState>,
    Path(id): Path<String>,
) -> Result<Json<FeeQuote>, ServiceError> {
    Ok(Json(registry.compute_fee(&id)?))
}

// ---------------------------------------------------------------------------
// POST /slots/{id}/@release
// ---------------------------------------------------------------------------

async fn release_slot(
    State(registry): State<RegistryState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    registry.release_slot(&id)?;
    Ok(Json(json!({ "released": true })))
}
