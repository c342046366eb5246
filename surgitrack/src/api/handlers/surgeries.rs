//! Surgery record handlers.
//!
//! Recording a surgery is the one write that spans all three equipment
//! registries: the repository decrements every listed instrument and
//! claims a fresh consumable unit per demand inside a single
//! transaction, so a refused decrement or an empty shelf aborts the
//! whole record.

use crate::{
    AppState,
    api::models::BulkDeleteResponse,
    api::models::surgeries::{
        DeleteSurgeriesQuery, ListSurgeriesQuery, SurgeryCreate, SurgeryResponse, SurgeryUpdate,
    },
    api::models::users::CurrentUser,
    auth::permissions,
    db::handlers::Surgeries,
    db::models::surgeries::{SurgeryFilter, SurgeryRecordDBRequest, SurgeryUpdateDBRequest},
    errors::{Error, Result},
    types::{Operation, Resource, SurgeryId},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/surgeries",
    tag = "surgeries",
    summary = "List surgery records",
    description = "List surgery records, optionally filtered by department, patient, staff or date range",
    params(ListSurgeriesQuery),
    responses(
        (status = 200, description = "List of surgery records", body = [SurgeryResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_surgeries(
    State(state): State<AppState>,
    Query(query): Query<ListSurgeriesQuery>,
    _current_user: CurrentUser,
) -> Result<Json<Vec<SurgeryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut surgeries = Surgeries::new(&mut conn);

    let filter = SurgeryFilter::from(&query);
    let records = surgeries.list(&filter).await?;

    Ok(Json(records.into_iter().map(SurgeryResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/surgeries",
    tag = "surgeries",
    summary = "Record a surgery",
    description = "Insert an immutable surgery record. Staff are given by display name and must \
                   each match exactly one registered user. Every listed instrument has one use \
                   deducted and every consumable demand claims and tags one fresh unit; if any \
                   of that fails the record is not inserted. Nurses and administrators only.",
    request_body = SurgeryCreate,
    responses(
        (status = 201, description = "The inserted record", body = SurgeryResponse),
        (status = 400, description = "Invalid request data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "A listed instrument does not exist"),
        (status = 409, description = "Not enough fresh consumable stock"),
        (status = 422, description = "A staff name is unknown or ambiguous, or an instrument is out of uses"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn record_surgery(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<SurgeryCreate>,
) -> Result<(StatusCode, Json<SurgeryResponse>)> {
    permissions::require(&current_user, Resource::Surgeries, Operation::Record)?;

    if request.patient_name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Patient name must not be empty".to_string(),
        });
    }
    if request.procedure_name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Procedure name must not be empty".to_string(),
        });
    }
    if request.chief_surgeon.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Chief surgeon must not be empty".to_string(),
        });
    }

    let ward = state.config.ward_offset().ok_or_else(|| Error::Internal {
        operation: "resolve the ward clock offset".to_string(),
    })?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut surgeries = Surgeries::new(&mut conn);
    let record = surgeries.record(&SurgeryRecordDBRequest::from(request), ward).await?;

    Ok((StatusCode::CREATED, Json(SurgeryResponse::from(record))))
}

#[utoipa::path(
    get,
    path = "/surgeries/{id}",
    tag = "surgeries",
    summary = "Get surgery record",
    description = "Fetch one surgery record by id",
    params(
        ("id" = i64, Path, description = "Surgery record id"),
    ),
    responses(
        (status = 200, description = "The surgery record", body = SurgeryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Surgery record not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_surgery(
    State(state): State<AppState>,
    Path(id): Path<SurgeryId>,
    _current_user: CurrentUser,
) -> Result<Json<SurgeryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut surgeries = Surgeries::new(&mut conn);

    let record = surgeries.get_by_id(id).await?.ok_or(Error::NotFound {
        resource: Resource::Surgeries,
        id: id.to_string(),
    })?;

    Ok(Json(SurgeryResponse::from(record)))
}

#[utoipa::path(
    put,
    path = "/surgeries/{id}",
    tag = "surgeries",
    summary = "Correct a surgery record",
    description = "Update fields of a recorded surgery. Supplying `instruments` or `consumables` \
                   re-runs the stock side effects; units consumed by the original record stay \
                   consumed. Nurses and administrators only.",
    params(
        ("id" = i64, Path, description = "Surgery record id"),
    ),
    request_body = SurgeryUpdate,
    responses(
        (status = 200, description = "The corrected record", body = SurgeryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Surgery record not found"),
        (status = 409, description = "Not enough fresh consumable stock"),
        (status = 422, description = "A staff name is unknown or ambiguous, or an instrument is out of uses"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_surgery(
    State(state): State<AppState>,
    Path(id): Path<SurgeryId>,
    current_user: CurrentUser,
    Json(request): Json<SurgeryUpdate>,
) -> Result<Json<SurgeryResponse>> {
    permissions::require(&current_user, Resource::Surgeries, Operation::Update)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut surgeries = Surgeries::new(&mut conn);
    let record = surgeries.update(id, &SurgeryUpdateDBRequest::from(request)).await?;

    Ok(Json(SurgeryResponse::from(record)))
}

#[utoipa::path(
    delete,
    path = "/surgeries/{id}",
    tag = "surgeries",
    summary = "Delete surgery record",
    description = "Remove one surgery record. Consumed equipment stays consumed. \
                   Administrators only.",
    params(
        ("id" = i64, Path, description = "Surgery record id"),
    ),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Surgery record not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_surgery(
    State(state): State<AppState>,
    Path(id): Path<SurgeryId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    permissions::require(&current_user, Resource::Surgeries, Operation::Delete)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut surgeries = Surgeries::new(&mut conn);

    if !surgeries.delete(id).await? {
        return Err(Error::NotFound {
            resource: Resource::Surgeries,
            id: id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/surgeries",
    tag = "surgeries",
    summary = "Delete surgery records by filter",
    description = "Remove every record matching the filter. At least one filter parameter is \
                   required. Administrators only.",
    params(DeleteSurgeriesQuery),
    responses(
        (status = 200, description = "Number of records deleted", body = BulkDeleteResponse),
        (status = 400, description = "No filter parameters supplied"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_surgeries(
    State(state): State<AppState>,
    Query(query): Query<DeleteSurgeriesQuery>,
    current_user: CurrentUser,
) -> Result<Json<BulkDeleteResponse>> {
    permissions::require(&current_user, Resource::Surgeries, Operation::Delete)?;

    if query.is_empty() {
        return Err(Error::BadRequest {
            message: "Refusing to delete all surgery records: supply at least one filter parameter".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut surgeries = Surgeries::new(&mut conn);
    let deleted = surgeries.delete_where(&SurgeryFilter::from(&query)).await?;

    Ok(Json(BulkDeleteResponse { deleted }))
}
