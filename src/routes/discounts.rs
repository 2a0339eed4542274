use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::discounts::{ApplyDiscountRequest, DiscountApplied, DiscountList, DiscountRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Discount,
    response::{ApiResponse, Deleted},
    routes::params::DiscountQuery,
    services::discount_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_discounts).post(create_discount))
        .route("/apply", post(apply_discount))
        .route("/search", get(search_discounts))
        .route(
            "/{id}",
            get(get_discount).put(update_discount).delete(delete_discount),
        )
}

#[utoipa::path(
    post,
    path = "/api/discounts/apply",
    request_body = ApplyDiscountRequest,
    responses(
        (status = 200, description = "Discount computed against the current cart", body = ApiResponse<DiscountApplied>),
        (status = 400, description = "Usage limit reached, empty cart or minimum order value not met"),
        (status = 404, description = "Unknown, inactive or expired code"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn apply_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ApplyDiscountRequest>,
) -> AppResult<Json<ApiResponse<DiscountApplied>>> {
    let resp = discount_service::apply_discount(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/discounts",
    params(DiscountQuery),
    responses(
        (status = 200, description = "Discounts, newest first (admin only)", body = ApiResponse<DiscountList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn list_discounts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DiscountQuery>,
) -> AppResult<Json<ApiResponse<DiscountList>>> {
    let resp = discount_service::list_discounts(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/discounts/search",
    params(DiscountQuery),
    responses(
        (status = 200, description = "Discounts matching code and/or name (admin only)", body = ApiResponse<DiscountList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn search_discounts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DiscountQuery>,
) -> AppResult<Json<ApiResponse<DiscountList>>> {
    let resp = discount_service::search_discounts(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/discounts",
    request_body = DiscountRequest,
    responses(
        (status = 201, description = "Discount created", body = ApiResponse<Discount>),
        (status = 400, description = "Validation failure or duplicate name/code"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn create_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DiscountRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Discount>>)> {
    let resp = discount_service::create_discount(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/discounts/{id}",
    params(("id" = Uuid, Path, description = "Discount ID")),
    responses(
        (status = 200, description = "Discount", body = ApiResponse<Discount>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn get_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    let resp = discount_service::get_discount(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/discounts/{id}",
    params(("id" = Uuid, Path, description = "Discount ID")),
    request_body = DiscountRequest,
    responses(
        (status = 200, description = "Discount updated", body = ApiResponse<Discount>),
        (status = 400, description = "Validation failure or duplicate name/code"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn update_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DiscountRequest>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    let resp = discount_service::update_discount(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/discounts/{id}",
    params(("id" = Uuid, Path, description = "Discount ID")),
    responses(
        (status = 200, description = "Discount deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn delete_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Deleted>>> {
    let resp = discount_service::delete_discount(&state, &user, id).await?;
    Ok(Json(resp))
}
