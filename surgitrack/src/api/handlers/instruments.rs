//! Instrument handlers: batch registration, revision, usage counters.

use crate::{
    AppState,
    api::models::BulkDeleteResponse,
    api::models::instruments::{
        DecrementRequest, DeleteInstrumentsQuery, InstrumentResponse, InstrumentUpdate, InstrumentsCreate, ListInstrumentsQuery,
        RemainingUsesSpec,
    },
    api::models::users::CurrentUser,
    auth::permissions,
    db::handlers::{Instruments, Repository},
    db::models::instruments::{InstrumentCreateDBRequest, InstrumentFilter, InstrumentUpdateDBRequest},
    errors::{Error, Result},
    types::{InstrumentId, MAX_REMAINING_USES, MIN_REMAINING_USES, Operation, Resource},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::warn;

#[utoipa::path(
    get,
    path = "/instruments",
    tag = "instruments",
    summary = "List instruments",
    description = "List registered instruments, optionally filtered by name, counter value or usability",
    params(ListInstrumentsQuery),
    responses(
        (status = 200, description = "List of instruments", body = [InstrumentResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_instruments(
    State(state): State<AppState>,
    Query(query): Query<ListInstrumentsQuery>,
    _current_user: CurrentUser,
) -> Result<Json<Vec<InstrumentResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut instruments = Instruments::new(&mut conn);

    let filter = InstrumentFilter::from(&query);
    let rows = instruments.list(&filter).await?;

    Ok(Json(rows.into_iter().map(InstrumentResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/instruments",
    tag = "instruments",
    summary = "Register instruments",
    description = "Register a batch of instruments with sequential ids and print labels for them. \
                   Counters default to a fresh instrument's ceiling. Administrators only.",
    request_body = InstrumentsCreate,
    responses(
        (status = 201, description = "Registered instruments in input order", body = [InstrumentResponse]),
        (status = 400, description = "Invalid request data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register_instruments(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<InstrumentsCreate>,
) -> Result<(StatusCode, Json<Vec<InstrumentResponse>>)> {
    permissions::require(&current_user, Resource::Instruments, Operation::Create)?;

    if request.names.is_empty() {
        return Err(Error::BadRequest {
            message: "At least one instrument name is required".to_string(),
        });
    }

    let spec = request.remaining_uses.unwrap_or(RemainingUsesSpec::Shared(MAX_REMAINING_USES));
    let counters = spec.resolve(request.names.len()).map_err(|message| Error::BadRequest { message })?;
    if let Some(out_of_range) = counters.iter().find(|c| **c < MIN_REMAINING_USES || **c > MAX_REMAINING_USES) {
        return Err(Error::BadRequest {
            message: format!("Counter {out_of_range} is outside [{MIN_REMAINING_USES}, {MAX_REMAINING_USES}]"),
        });
    }

    let requests: Vec<InstrumentCreateDBRequest> = request
        .names
        .into_iter()
        .zip(counters)
        .map(|(name, remaining_uses)| InstrumentCreateDBRequest { name, remaining_uses })
        .collect();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut instruments = Instruments::new(&mut conn);
    let created = instruments.insert_batch(&requests).await?;

    // Label generation happens after the insert committed. A failed label
    // leaves the registration standing and can be reprinted later.
    for instrument in &created {
        if let Err(e) = state.artifacts.generate(instrument.id).await {
            warn!("Failed to generate label for instrument {}: {}", instrument.id, e);
        }
    }

    Ok((StatusCode::CREATED, Json(created.into_iter().map(InstrumentResponse::from).collect())))
}

#[utoipa::path(
    get,
    path = "/instruments/{id}",
    tag = "instruments",
    summary = "Get instrument",
    params(
        ("id" = i64, Path, description = "Instrument id"),
    ),
    responses(
        (status = 200, description = "Instrument", body = InstrumentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Instrument not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_instrument(
    State(state): State<AppState>,
    Path(id): Path<InstrumentId>,
    _current_user: CurrentUser,
) -> Result<Json<InstrumentResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut instruments = Instruments::new(&mut conn);

    let instrument = instruments.get_by_id(id).await?.ok_or(Error::NotFound {
        resource: Resource::Instruments,
        id: id.to_string(),
    })?;

    Ok(Json(InstrumentResponse::from(instrument)))
}

#[utoipa::path(
    put,
    path = "/instruments/{id}",
    tag = "instruments",
    summary = "Revise instrument",
    description = "Revise an instrument's name or set its counter outright. Administrators only.",
    params(
        ("id" = i64, Path, description = "Instrument id"),
    ),
    request_body = InstrumentUpdate,
    responses(
        (status = 200, description = "Revised instrument", body = InstrumentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Instrument not found"),
        (status = 422, description = "Counter outside the permitted range"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_instrument(
    State(state): State<AppState>,
    Path(id): Path<InstrumentId>,
    current_user: CurrentUser,
    Json(request): Json<InstrumentUpdate>,
) -> Result<Json<InstrumentResponse>> {
    permissions::require(&current_user, Resource::Instruments, Operation::Update)?;

    let update = InstrumentUpdateDBRequest {
        name: request.name,
        remaining_uses: request.remaining_uses,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut instruments = Instruments::new(&mut conn);
    let instrument = instruments.update(id, &update).await?;

    Ok(Json(InstrumentResponse::from(instrument)))
}

#[utoipa::path(
    post,
    path = "/instruments/{id}/decrement",
    tag = "instruments",
    summary = "Decrement usage counter",
    description = "Consume uses from an instrument's counter. A counter at 0 may be taken to -1, \
                   which retires the instrument. Nurses and administrators only.",
    params(
        ("id" = i64, Path, description = "Instrument id"),
    ),
    request_body = DecrementRequest,
    responses(
        (status = 200, description = "Instrument after the decrement", body = InstrumentResponse),
        (status = 400, description = "Invalid request data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Instrument not found"),
        (status = 422, description = "Decrement would leave the counter outside the permitted range"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn decrement_instrument(
    State(state): State<AppState>,
    Path(id): Path<InstrumentId>,
    current_user: CurrentUser,
    Json(request): Json<DecrementRequest>,
) -> Result<Json<InstrumentResponse>> {
    permissions::require(&current_user, Resource::Instruments, Operation::Decrement)?;

    let by = request.by.unwrap_or(1);
    if by < 1 {
        return Err(Error::BadRequest {
            message: "Decrement must consume at least one use".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut instruments = Instruments::new(&mut conn);
    let instrument = instruments.decrement(id, by).await?;

    Ok(Json(InstrumentResponse::from(instrument)))
}

#[utoipa::path(
    delete,
    path = "/instruments/{id}",
    tag = "instruments",
    summary = "Delete instrument",
    description = "Remove one instrument from the registry. Administrators only.",
    params(
        ("id" = i64, Path, description = "Instrument id"),
    ),
    responses(
        (status = 204, description = "Instrument deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Instrument not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_instrument(
    State(state): State<AppState>,
    Path(id): Path<InstrumentId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    permissions::require(&current_user, Resource::Instruments, Operation::Delete)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut instruments = Instruments::new(&mut conn);

    if !instruments.delete(id).await? {
        return Err(Error::NotFound {
            resource: Resource::Instruments,
            id: id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/instruments",
    tag = "instruments",
    summary = "Delete instruments by filter",
    description = "Remove every instrument matching the filter. At least one filter parameter is \
                   required. Administrators only.",
    params(DeleteInstrumentsQuery),
    responses(
        (status = 200, description = "Number of instruments deleted", body = BulkDeleteResponse),
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
pub async fn delete_instruments(
    State(state): State<AppState>,
    Query(query): Query<DeleteInstrumentsQuery>,
    current_user: CurrentUser,
) -> Result<Json<BulkDeleteResponse>> {
    permissions::require(&current_user, Resource::Instruments, Operation::Delete)?;

    if query.id.is_none() && query.name.is_none() && query.usable.is_none() {
        return Err(Error::BadRequest {
            message: "Refusing to delete all instruments: supply at least one filter parameter".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut instruments = Instruments::new(&mut conn);
    let deleted = instruments.delete_where(&InstrumentFilter::from(&query)).await?;

    Ok(Json(BulkDeleteResponse { deleted }))
}
