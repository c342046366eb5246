//! Consumable stock handlers: restocking, stock queries, unit tagging.

use crate::{
    AppState,
    api::models::BulkDeleteResponse,
    api::models::consumables::{
        ConsumableResponse, DeleteConsumablesQuery, ListConsumablesQuery, RestockRequest, StockLevelResponse, StockQuery, TagRequest,
    },
    api::models::users::CurrentUser,
    auth::permissions,
    db::handlers::Consumables,
    db::models::consumables::ConsumableFilter,
    errors::{Error, Result},
    types::{ConsumableId, Operation, Resource},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/consumables",
    tag = "consumables",
    summary = "List consumable units",
    description = "List individual consumable units, optionally filtered by product name or usage state",
    params(ListConsumablesQuery),
    responses(
        (status = 200, description = "List of consumable units", body = [ConsumableResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_consumables(
    State(state): State<AppState>,
    Query(query): Query<ListConsumablesQuery>,
    _current_user: CurrentUser,
) -> Result<Json<Vec<ConsumableResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut consumables = Consumables::new(&mut conn);

    let filter = ConsumableFilter::from(&query);
    let units = consumables.list(&filter).await?;

    Ok(Json(units.into_iter().map(ConsumableResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/consumables",
    tag = "consumables",
    summary = "Restock a consumable",
    description = "Insert a number of fresh units of one product, each getting its own sequential id. \
                   Administrators only.",
    request_body = RestockRequest,
    responses(
        (status = 201, description = "Freshly stocked units in id order", body = [ConsumableResponse]),
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
pub async fn restock_consumables(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<RestockRequest>,
) -> Result<(StatusCode, Json<Vec<ConsumableResponse>>)> {
    permissions::require(&current_user, Resource::Consumables, Operation::Create)?;

    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Product name must not be empty".to_string(),
        });
    }
    if request.count < 1 {
        return Err(Error::BadRequest {
            message: "Restock count must be at least 1".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut consumables = Consumables::new(&mut conn);
    let units = consumables.restock(&request.name, request.count).await?;

    Ok((StatusCode::CREATED, Json(units.into_iter().map(ConsumableResponse::from).collect())))
}

#[utoipa::path(
    get,
    path = "/consumables/stock",
    tag = "consumables",
    summary = "Fresh stock levels",
    description = "Count the fresh (untagged) units per product name",
    params(StockQuery),
    responses(
        (status = 200, description = "Fresh unit counts per product", body = [StockLevelResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_stock_levels(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
    _current_user: CurrentUser,
) -> Result<Json<Vec<StockLevelResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut consumables = Consumables::new(&mut conn);

    let names = query.name.map(|name| vec![name]);
    let levels = consumables.stock_levels(names.as_ref()).await?;

    Ok(Json(levels.into_iter().map(StockLevelResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/consumables/{id}",
    tag = "consumables",
    summary = "Get consumable unit",
    description = "Fetch one consumable unit by id",
    params(
        ("id" = i64, Path, description = "Consumable unit id"),
    ),
    responses(
        (status = 200, description = "The consumable unit", body = ConsumableResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Consumable unit not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_consumable(
    State(state): State<AppState>,
    Path(id): Path<ConsumableId>,
    _current_user: CurrentUser,
) -> Result<Json<ConsumableResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut consumables = Consumables::new(&mut conn);

    let unit = consumables.get_by_id(id).await?.ok_or(Error::NotFound {
        resource: Resource::Consumables,
        id: id.to_string(),
    })?;

    Ok(Json(ConsumableResponse::from(unit)))
}

#[utoipa::path(
    post,
    path = "/consumables/{id}/tag",
    tag = "consumables",
    summary = "Tag a unit as used",
    description = "Stamp one unit with its usage note, taking it out of fresh stock for good. \
                   Nurses and administrators only.",
    params(
        ("id" = i64, Path, description = "Consumable unit id"),
    ),
    request_body = TagRequest,
    responses(
        (status = 200, description = "The tagged unit", body = ConsumableResponse),
        (status = 400, description = "Invalid request data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Consumable unit not found"),
        (status = 409, description = "Unit is already tagged"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn tag_consumable(
    State(state): State<AppState>,
    Path(id): Path<ConsumableId>,
    current_user: CurrentUser,
    Json(request): Json<TagRequest>,
) -> Result<Json<ConsumableResponse>> {
    permissions::require(&current_user, Resource::Consumables, Operation::Tag)?;

    // An empty note would leave the unit looking fresh
    if request.description.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Tag description must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut consumables = Consumables::new(&mut conn);
    let unit = consumables.tag(id, &request.description).await?;

    Ok(Json(ConsumableResponse::from(unit)))
}

#[utoipa::path(
    delete,
    path = "/consumables/{id}",
    tag = "consumables",
    summary = "Delete consumable unit",
    description = "Remove one unit from the registry. Administrators only.",
    params(
        ("id" = i64, Path, description = "Consumable unit id"),
    ),
    responses(
        (status = 204, description = "Unit deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Consumable unit not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_consumable(
    State(state): State<AppState>,
    Path(id): Path<ConsumableId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    permissions::require(&current_user, Resource::Consumables, Operation::Delete)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut consumables = Consumables::new(&mut conn);

    if !consumables.delete(id).await? {
        return Err(Error::NotFound {
            resource: Resource::Consumables,
            id: id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/consumables",
    tag = "consumables",
    summary = "Delete consumable units by filter",
    description = "Remove every unit matching the filter. At least one filter parameter is \
                   required. Administrators only.",
    params(DeleteConsumablesQuery),
    responses(
        (status = 200, description = "Number of units deleted", body = BulkDeleteResponse),
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
pub async fn delete_consumables(
    State(state): State<AppState>,
    Query(query): Query<DeleteConsumablesQuery>,
    current_user: CurrentUser,
) -> Result<Json<BulkDeleteResponse>> {
    permissions::require(&current_user, Resource::Consumables, Operation::Delete)?;

    if query.id.is_none() && query.name.is_none() && query.fresh.is_none() {
        return Err(Error::BadRequest {
            message: "Refusing to delete all consumables: supply at least one filter parameter".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut consumables = Consumables::new(&mut conn);
    let deleted = consumables.delete_where(&ConsumableFilter::from(&query)).await?;

    Ok(Json(BulkDeleteResponse { deleted }))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            BulkDeleteResponse,
            consumables::{ConsumableResponse, StockLevelResponse},
            users::Role,
        },
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_restock_creates_fresh_units(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;

        let response = server
            .post("/api/v1/consumables")
            .add_header("authorization", bearer(&admin, &config))
            .json(&json!({"name": "无菌壁套", "count": 3}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let units: Vec<ConsumableResponse> = response.json();
        assert_eq!(units.len(), 3);
        assert!(units.iter().all(|u| u.name == "无菌壁套" && u.description.is_empty()));
        assert_eq!(units[2].id, units[0].id + 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_restock_is_admin_only_and_validates_count(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;
        let nurse = create_test_user(&pool, Role::Nurse).await;

        let response = server
            .post("/api/v1/consumables")
            .add_header("authorization", bearer(&nurse, &config))
            .json(&json!({"name": "无菌壁套", "count": 3}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .post("/api/v1/consumables")
            .add_header("authorization", bearer(&admin, &config))
            .json(&json!({"name": "无菌壁套", "count": 0}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_stock_levels_reflect_tagging(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;
        let nurse = create_test_user(&pool, Role::Nurse).await;
        let auth = bearer(&admin, &config);

        let response = server
            .post("/api/v1/consumables")
            .add_header("authorization", &auth)
            .json(&json!({"name": "无菌壁套", "count": 2}))
            .await;
        let units: Vec<ConsumableResponse> = response.json();

        // A nurse tags the first unit after use
        let response = server
            .post(&format!("/api/v1/consumables/{}/tag", units[0].id))
            .add_header("authorization", bearer(&nurse, &config))
            .json(&json!({"description": "三号机械臂术中使用"}))
            .await;
        response.assert_status_ok();
        let tagged: ConsumableResponse = response.json();
        assert_eq!(tagged.description, "三号机械臂术中使用");

        let response = server.get("/api/v1/consumables/stock").add_header("authorization", &auth).await;
        response.assert_status_ok();
        let levels: Vec<StockLevelResponse> = response.json();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].fresh, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_tag_refuses_empty_and_double_tagging(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;
        let auth = bearer(&admin, &config);

        let response = server
            .post("/api/v1/consumables")
            .add_header("authorization", &auth)
            .json(&json!({"name": "无菌壁套", "count": 1}))
            .await;
        let units: Vec<ConsumableResponse> = response.json();
        let id = units[0].id;

        let response = server
            .post(&format!("/api/v1/consumables/{id}/tag"))
            .add_header("authorization", &auth)
            .json(&json!({"description": "  "}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .post(&format!("/api/v1/consumables/{id}/tag"))
            .add_header("authorization", &auth)
            .json(&json!({"description": "术中使用"}))
            .await;
        response.assert_status_ok();

        let response = server
            .post(&format!("/api/v1/consumables/{id}/tag"))
            .add_header("authorization", &auth)
            .json(&json!({"description": "再次使用"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_tag_requires_nurse_or_admin(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;
        let doctor = create_test_user(&pool, Role::Doctor).await;

        let response = server
            .post("/api/v1/consumables")
            .add_header("authorization", bearer(&admin, &config))
            .json(&json!({"name": "无菌壁套", "count": 1}))
            .await;
        let units: Vec<ConsumableResponse> = response.json();

        let response = server
            .post(&format!("/api/v1/consumables/{}/tag", units[0].id))
            .add_header("authorization", bearer(&doctor, &config))
            .json(&json!({"description": "术中使用"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bulk_delete_consumed_units(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let config = create_test_config();
        let admin = create_test_admin(&pool).await;
        let auth = bearer(&admin, &config);

        let response = server
            .post("/api/v1/consumables")
            .add_header("authorization", &auth)
            .json(&json!({"name": "无菌壁套", "count": 2}))
            .await;
        let units: Vec<ConsumableResponse> = response.json();

        let response = server
            .post(&format!("/api/v1/consumables/{}/tag", units[0].id))
            .add_header("authorization", &auth)
            .json(&json!({"description": "术中使用"}))
            .await;
        response.assert_status_ok();

        // An unfiltered wipe is refused
        let response = server.delete("/api/v1/consumables").add_header("authorization", &auth).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // Clear out the consumed units only
        let response = server
            .delete("/api/v1/consumables")
            .add_query_param("fresh", "false")
            .add_header("authorization", &auth)
            .await;
        response.assert_status_ok();
        let result: BulkDeleteResponse = response.json();
        assert_eq!(result.deleted, 1);

        let response = server.get("/api/v1/consumables").add_header("authorization", &auth).await;
        let remaining: Vec<ConsumableResponse> = response.json();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, units[1].id);
    }
}
