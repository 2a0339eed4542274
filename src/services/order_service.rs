use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders,
            Model as OrderModel, OrderStatus,
        },
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem},
    response::{ApiResponse, Deleted, Meta},
    routes::params::{OrderListQuery, OrderSearchQuery},
    services::{
        discount_service::normalize_code,
        variant::{ensure_variant_available, normalize_variant},
    },
    state::AppState,
};

const ORDER_NUMBER_ATTEMPTS: usize = 10;

/// `ORD-YYYYMMDD-NNNN` with a random four digit suffix.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::rng().random_range(1000..=9999);
    format!("ORD-{}-{suffix}", now.format("%Y%m%d"))
}

async fn allocate_order_number<C: ConnectionTrait>(
    db: &C,
    now: DateTime<Utc>,
) -> AppResult<String> {
    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        let candidate = generate_order_number(now);
        let taken = Orders::find()
            .filter(OrderCol::OrderId.eq(candidate.as_str()))
            .count(db)
            .await?
            > 0;
        if !taken {
            return Ok(candidate);
        }
        tracing::debug!(order_id = %candidate, "order number taken, drawing again");
    }
    Err(AppError::Internal(anyhow::anyhow!(
        "could not allocate a unique order number"
    )))
}

/// Amount and line checks that need no I/O.
pub fn validate_order_request(payload: &CreateOrderRequest) -> AppResult<()> {
    if payload.order_items.is_empty() {
        return Err(AppError::EmptyOrder);
    }
    if payload.payment_method.trim().is_empty() {
        return Err(AppError::Validation("payment_method must not be empty".into()));
    }
    if payload.total_amount < 0 || payload.discount_amount < 0 || payload.final_amount < 0 {
        return Err(AppError::Validation("amounts cannot be negative".into()));
    }
    if payload.total_amount - payload.discount_amount != payload.final_amount {
        return Err(AppError::Validation(
            "final_amount must equal total_amount - discount_amount".into(),
        ));
    }
    for item in &payload.order_items {
        if item.quantity < 1 {
            return Err(AppError::Validation(format!(
                "quantity of {} must be greater than 0",
                item.name
            )));
        }
        if item.price < 0 {
            return Err(AppError::Validation(format!(
                "price of {} cannot be negative",
                item.name
            )));
        }
        if item.name.trim().is_empty() {
            return Err(AppError::Validation("item name must not be empty".into()));
        }
    }
    Ok(())
}

/// Validates every line against the catalog first, then writes the order and its
/// snapshots in one transaction so a failing line never leaves an order behind.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    validate_order_request(&payload)?;

    let product_ids: Vec<Uuid> = payload.order_items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let now = Utc::now();
    let order_pk = Uuid::new_v4();
    let mut lines = Vec::with_capacity(payload.order_items.len());
    for item in &payload.order_items {
        let product = products
            .get(&item.product_id)
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", item.name)))?;
        let size = normalize_variant(item.selected_size.clone());
        let color = normalize_variant(item.selected_color.clone());
        ensure_variant_available(product, size.as_deref(), color.as_deref())?;

        // Snapshot what the customer saw, not the live catalog row.
        lines.push(OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_pk),
            product_id: Set(item.product_id),
            name: Set(item.name.trim().to_string()),
            price: Set(item.price),
            quantity: Set(item.quantity),
            image: Set(item.image.clone()),
            selected_size: Set(size),
            selected_color: Set(color),
            created_at: Set(now.into()),
        });
    }

    let discount_code = payload
        .discount_code
        .as_deref()
        .map(normalize_code)
        .filter(|c| !c.is_empty());

    let txn = state.orm.begin().await?;
    let order_number = allocate_order_number(&txn, now).await?;
    let order = OrderActive {
        id: Set(order_pk),
        order_id: Set(order_number),
        user_id: Set(user.user_id),
        address_id: Set(payload.address_id),
        payment_method: Set(payload.payment_method.trim().to_string()),
        status: Set(OrderStatus::Pending),
        total_amount: Set(payload.total_amount),
        discount_amount: Set(payload.discount_amount),
        final_amount: Set(payload.final_amount),
        discount_code: Set(discount_code),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        items.push(OrderItem::from(line.insert(&txn).await?));
    }
    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        order_id = %order.order_id,
        items = items.len(),
        final_amount = order.final_amount,
        "order created"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "order_number": order.order_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        None,
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;
    if order.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    let mut orders = attach_items(&state.orm, vec![order]).await?;
    let data = orders
        .pop()
        .ok_or_else(|| AppError::not_found("Order"))?;
    Ok(ApiResponse::success("OK", data, None))
}

pub async fn list_user_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let items = attach_items(&state.orm, orders).await?;
    Ok(ApiResponse::success("OK", OrderList { items }, None))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_deref().filter(|s| !s.trim().is_empty()) {
        let status = status
            .parse::<OrderStatus>()
            .map_err(AppError::InvalidStatus)?;
        condition = condition.add(OrderCol::Status.eq(status));
    }

    find_page(state, condition, query.pagination()).await
}

pub async fn search_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderSearchQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let fragment = query
        .order_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("order_id is required to search".into()))?;

    let condition = Condition::all().add(OrderCol::OrderId.contains(fragment.to_uppercase()));
    find_page(state, condition, query.pagination()).await
}

async fn find_page(
    state: &AppState,
    condition: Condition,
    pagination: crate::routes::params::Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = attach_items(&state.orm, orders).await?;
    Ok(ApiResponse::success(
        "OK",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Membership in the five known statuses is the only transition rule.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let status = payload
        .status
        .parse::<OrderStatus>()
        .map_err(AppError::InvalidStatus)?;

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;
    let previous = existing.status;

    let mut active: OrderActive = existing.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    tracing::info!(
        order_id = %order.order_id,
        from = %previous,
        to = %order.status,
        "order status updated"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status.to_string() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order status updated",
        Order::from(order),
        None,
    ))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let removed = OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .exec(&txn)
        .await?;
    Orders::delete_by_id(order.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.order_id,
        items = removed.rows_affected,
        "order deleted"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": order.id, "order_number": order.order_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order deleted",
        Deleted { id: order.id },
        None,
    ))
}

/// Loads the line items of `orders` with one query, preserving the order of `orders`.
async fn attach_items<C: ConnectionTrait>(
    db: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderWithItems>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(ids))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(db)
        .await?
    {
        by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItem::from(item));
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: by_order.remove(&order.id).unwrap_or_default(),
            order: Order::from(order),
        })
        .collect())
}
