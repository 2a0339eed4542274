use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::discounts::{ApplyDiscountRequest, DiscountApplied, DiscountList, DiscountRequest},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        discounts::{
            ActiveModel as DiscountActive, Column as DiscountCol, DiscountType,
            Entity as Discounts, Model as DiscountModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Discount,
    response::{ApiResponse, Deleted, Meta},
    routes::params::{DiscountQuery, Pagination},
    services::cart_service,
    state::AppState,
};

/// Codes are matched case-insensitively and stored upper-case.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Field-level checks shared by create and update. Returns the parsed discount type.
pub fn validate_discount_request(payload: &DiscountRequest) -> AppResult<DiscountType> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    if payload.discount_code.trim().is_empty() {
        return Err(AppError::Validation("discount_code must not be empty".into()));
    }
    let discount_type = payload
        .discount_type
        .parse::<DiscountType>()
        .map_err(|_| AppError::Validation("discount_type must be PERCENTAGE or FIXED".into()))?;
    if payload.discount_value <= 0 {
        return Err(AppError::Validation(
            "discount_value must be greater than 0".into(),
        ));
    }
    if discount_type == DiscountType::Percentage && payload.discount_value > 100 {
        return Err(AppError::Validation(
            "percentage discount cannot exceed 100".into(),
        ));
    }
    if payload.min_order_value < 0 || payload.max_discount_amount < 0 || payload.max_usage < 0 {
        return Err(AppError::Validation(
            "min_order_value, max_discount_amount and max_usage cannot be negative".into(),
        ));
    }
    if payload.start_date >= payload.end_date {
        return Err(AppError::Validation(
            "start_date must be earlier than end_date".into(),
        ));
    }
    Ok(discount_type)
}

/// Name and code must be globally unique; `exclude` skips the record being updated.
async fn ensure_unique<C: ConnectionTrait>(
    db: &C,
    name: &str,
    code: &str,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let mut by_name = Discounts::find().filter(DiscountCol::Name.eq(name));
    let mut by_code = Discounts::find().filter(DiscountCol::DiscountCode.eq(code));
    if let Some(id) = exclude {
        by_name = by_name.filter(DiscountCol::Id.ne(id));
        by_code = by_code.filter(DiscountCol::Id.ne(id));
    }

    if by_name.one(db).await?.is_some() {
        return Err(AppError::DuplicateName(name.to_string()));
    }
    if by_code.one(db).await?.is_some() {
        return Err(AppError::DuplicateCode(code.to_string()));
    }
    Ok(())
}

pub async fn create_discount(
    state: &AppState,
    user: &AuthUser,
    payload: DiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    ensure_admin(user)?;
    let discount_type = validate_discount_request(&payload)?;
    let name = payload.name.trim().to_string();
    let code = normalize_code(&payload.discount_code);
    ensure_unique(&state.orm, &name, &code, None).await?;

    let now = Utc::now();
    let discount = DiscountActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        discount_code: Set(code),
        discount_type: Set(discount_type),
        discount_value: Set(payload.discount_value),
        min_order_value: Set(payload.min_order_value),
        max_discount_amount: Set(payload.max_discount_amount),
        max_usage: Set(payload.max_usage),
        usage_count: Set(0),
        start_date: Set(payload.start_date.into()),
        end_date: Set(payload.end_date.into()),
        is_active: Set(payload.is_active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(discount_id = %discount.id, code = %discount.discount_code, "discount created");
    audit::record(
        &state.orm,
        user.user_id,
        "discount_create",
        "discounts",
        serde_json::json!({ "discount_id": discount.id, "code": discount.discount_code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Discount created",
        Discount::from(discount),
        None,
    ))
}

pub async fn update_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: DiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    ensure_admin(user)?;
    let existing = Discounts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Discount"))?;

    let discount_type = validate_discount_request(&payload)?;
    let name = payload.name.trim().to_string();
    let code = normalize_code(&payload.discount_code);
    ensure_unique(&state.orm, &name, &code, Some(id)).await?;

    let mut active: DiscountActive = existing.into();
    active.name = Set(name);
    active.discount_code = Set(code);
    active.discount_type = Set(discount_type);
    active.discount_value = Set(payload.discount_value);
    active.min_order_value = Set(payload.min_order_value);
    active.max_discount_amount = Set(payload.max_discount_amount);
    active.max_usage = Set(payload.max_usage);
    active.start_date = Set(payload.start_date.into());
    active.end_date = Set(payload.end_date.into());
    active.is_active = Set(payload.is_active);
    active.updated_at = Set(Utc::now().into());
    let discount = active.update(&state.orm).await?;

    tracing::info!(discount_id = %discount.id, "discount updated");
    audit::record(
        &state.orm,
        user.user_id,
        "discount_update",
        "discounts",
        serde_json::json!({ "discount_id": discount.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Discount updated",
        Discount::from(discount),
        None,
    ))
}

pub async fn get_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Discount>> {
    ensure_admin(user)?;
    let discount = Discounts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Discount"))?;

    Ok(ApiResponse::success("OK", Discount::from(discount), None))
}

pub async fn delete_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_admin(user)?;
    let result = Discounts::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Discount"));
    }

    tracing::info!(discount_id = %id, "discount deleted");
    audit::record(
        &state.orm,
        user.user_id,
        "discount_delete",
        "discounts",
        serde_json::json!({ "discount_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Discount deleted",
        Deleted { id },
        None,
    ))
}

/// Admin listing; `search` matches name or code.
pub async fn list_discounts(
    state: &AppState,
    user: &AuthUser,
    query: DiscountQuery,
) -> AppResult<ApiResponse<DiscountList>> {
    ensure_admin(user)?;
    let mut condition = Condition::all();
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(name_matches(search))
                .add(DiscountCol::DiscountCode.contains(normalize_code(search))),
        );
    }
    find_page(state, condition, query.pagination()).await
}

/// Admin search with independent code and name filters.
pub async fn search_discounts(
    state: &AppState,
    user: &AuthUser,
    query: DiscountQuery,
) -> AppResult<ApiResponse<DiscountList>> {
    ensure_admin(user)?;
    let mut condition = Condition::all();
    if let Some(code) = query.code.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(DiscountCol::DiscountCode.contains(normalize_code(code)));
    }
    if let Some(name) = query.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(name_matches(name));
    }
    find_page(state, condition, query.pagination()).await
}

fn name_matches(fragment: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(DiscountCol::Name)))
        .like(format!("%{}%", fragment.to_lowercase()))
}

async fn find_page(
    state: &AppState,
    condition: Condition,
    pagination: Pagination,
) -> AppResult<ApiResponse<DiscountList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Discounts::find()
        .filter(condition)
        .order_by_desc(DiscountCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Discount::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        DiscountList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn apply_discount(
    state: &AppState,
    user: &AuthUser,
    payload: ApplyDiscountRequest,
) -> AppResult<ApiResponse<DiscountApplied>> {
    let code = normalize_code(&payload.code);
    let now = Utc::now();

    let discount = Discounts::find()
        .filter(DiscountCol::DiscountCode.eq(code.as_str()))
        .one(&state.orm)
        .await?
        .filter(|discount| discount.is_live_at(now))
        .ok_or_else(|| {
            AppError::NotFound("Discount code does not exist or is no longer valid".into())
        })?;

    if !discount.has_usage_left() {
        return Err(AppError::UsageExceeded);
    }

    let cart = cart_service::find_cart(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::EmptyCart)?;
    let item_count = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .count(&state.orm)
        .await?;
    if item_count == 0 {
        return Err(AppError::EmptyCart);
    }

    let cart_total = cart.total_price;
    if cart_total < discount.min_order_value {
        return Err(AppError::MinOrderValue {
            min_order_value: discount.min_order_value,
        });
    }

    let discount_amount = discount.amount_for(cart_total);
    consume_usage(&state.orm, &discount, now.into()).await?;

    tracing::info!(
        user_id = %user.user_id,
        code = %discount.discount_code,
        cart_total,
        discount_amount,
        "discount applied"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "discount_apply",
        "discounts",
        serde_json::json!({
            "discount_id": discount.id,
            "cart_id": cart.id,
            "discount_amount": discount_amount,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Discount applied",
        DiscountApplied {
            discount_amount,
            cart_total,
            final_amount: cart_total - discount_amount,
        },
        None,
    ))
}

/// Increment-and-check in one statement so concurrent applies cannot exceed `max_usage`.
pub async fn consume_usage<C: ConnectionTrait>(
    db: &C,
    discount: &DiscountModel,
    now: DateTime<FixedOffset>,
) -> AppResult<()> {
    let result = Discounts::update_many()
        .col_expr(
            DiscountCol::UsageCount,
            Expr::col(DiscountCol::UsageCount).add(1),
        )
        .col_expr(DiscountCol::UpdatedAt, Expr::value(now))
        .filter(DiscountCol::Id.eq(discount.id))
        .filter(
            Condition::any()
                .add(DiscountCol::MaxUsage.eq(0))
                .add(Expr::col(DiscountCol::UsageCount).lt(Expr::col(DiscountCol::MaxUsage))),
        )
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!(discount_id = %discount.id, "discount usage race lost");
        return Err(AppError::UsageExceeded);
    }
    Ok(())
}
