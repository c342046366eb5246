//! OpenAPI documentation for the equipment tracking API.
//!
//! The generated spec is served at `/api-docs/openapi.json` and rendered
//! by Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Registers the session token scheme referenced by the handlers.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "session_token".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token authentication. Log in at `/authentication/login` and \
                            send the returned token in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_SESSION_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Everything mounted under `/api/v1`.
#[derive(OpenApi)]
#[openapi(
    paths(
        // Staff accounts
        api::handlers::users::list_users,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        // Instruments
        api::handlers::instruments::list_instruments,
        api::handlers::instruments::register_instruments,
        api::handlers::instruments::get_instrument,
        api::handlers::instruments::update_instrument,
        api::handlers::instruments::decrement_instrument,
        api::handlers::instruments::delete_instrument,
        api::handlers::instruments::delete_instruments,
        // Consumable stock
        api::handlers::consumables::list_consumables,
        api::handlers::consumables::restock_consumables,
        api::handlers::consumables::get_stock_levels,
        api::handlers::consumables::get_consumable,
        api::handlers::consumables::tag_consumable,
        api::handlers::consumables::delete_consumable,
        api::handlers::consumables::delete_consumables,
        // Surgery records
        api::handlers::surgeries::list_surgeries,
        api::handlers::surgeries::record_surgery,
        api::handlers::surgeries::get_surgery,
        api::handlers::surgeries::update_surgery,
        api::handlers::surgeries::delete_surgery,
        api::handlers::surgeries::delete_surgeries,
        // Staff message box
        api::handlers::messages::list_messages,
        api::handlers::messages::create_message,
        api::handlers::messages::review_message,
        api::handlers::messages::delete_message,
        api::handlers::messages::delete_messages,
    ),
    components(
        schemas(
            api::models::BulkDeleteResponse,
            api::models::pagination::Pagination,
            api::models::users::Role,
            api::models::users::UserResponse,
            api::models::users::UserUpdate,
            api::models::instruments::RemainingUsesSpec,
            api::models::instruments::InstrumentsCreate,
            api::models::instruments::InstrumentUpdate,
            api::models::instruments::DecrementRequest,
            api::models::instruments::InstrumentResponse,
            api::models::consumables::RestockRequest,
            api::models::consumables::TagRequest,
            api::models::consumables::ConsumableResponse,
            api::models::consumables::StockLevelResponse,
            api::models::surgeries::ConsumableUseRequest,
            api::models::surgeries::SurgeryCreate,
            api::models::surgeries::SurgeryUpdate,
            api::models::surgeries::SurgeryResponse,
            api::models::messages::MessageStatus,
            api::models::messages::MessagePriority,
            api::models::messages::MessageCreate,
            api::models::messages::MessageReview,
            api::models::messages::MessageResponse,
            crate::db::models::surgeries::InstrumentUse,
            crate::types::Department,
        )
    )
)]
struct ApiV1Doc;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::login,
        api::handlers::auth::me,
        api::handlers::auth::register,
    ),
    nest(
        (path = "/api/v1", api = ApiV1Doc)
    ),
    components(
        schemas(
            api::models::auth::LoginRequest,
            api::models::auth::LoginResponse,
            api::models::users::UserCreate,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentication", description = "Log in with a staff id and password to obtain a session token, \
inspect the logged-in account, and register new staff."),
        (name = "users", description = "Staff accounts with hospital-issued ids and one of three roles: \
doctor, nurse or administrator. The role decides what the account may do elsewhere in the API."),
        (name = "instruments", description = "Reusable robotic instruments with a per-instrument usage counter. \
Each use deducts one from the counter; an instrument whose counter falls below -1 is refused and must be retired."),
        (name = "consumables", description = "Single-use sterile stock tracked per unit. Restocking inserts fresh \
units; tagging stamps a unit with its usage note and removes it from fresh stock for good."),
        (name = "surgeries", description = "Immutable records of performed surgeries. Recording one atomically \
deducts instrument uses and claims fresh consumable units; if any side effect fails, nothing is written."),
        (name = "messages", description = "Message box for equipment and maintenance notes. Doctors post, \
administrators review and leave feedback."),
    ),
    info(
        title = "Surgical Equipment Tracking API",
        version = "1.0.0",
        description = "Equipment and case tracking for a robotic surgery department: instrument \
usage counters, per-unit consumable stock, immutable surgery records and a staff message box.

## Authentication

Log in at `/authentication/login` with a staff id and password. Every other endpoint expects \
the returned session token in the `Authorization` header:

```
Authorization: Bearer YOUR_SESSION_TOKEN
```

Tokens expire after a configurable lifetime; log in again to get a fresh one.",
    )
)]
pub struct ApiDoc;
