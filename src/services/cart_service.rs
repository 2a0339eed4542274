use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    entity::{
        cart_items::{
            ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems,
            Model as CartItemModel,
        },
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem},
    response::ApiResponse,
    services::variant::{ensure_variant_available, normalize_variant},
    state::AppState,
};

pub async fn find_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Option<CartModel>> {
    Ok(Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Returns the user's cart, creating an empty one on first access.
pub async fn get_or_create_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<CartModel> {
    if let Some(cart) = find_cart(db, user_id).await? {
        return Ok(cart);
    }

    let now = Utc::now();
    let created = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total_price: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await;

    match created {
        Ok(cart) => {
            tracing::debug!(user_id = %user_id, cart_id = %cart.id, "cart created");
            Ok(cart)
        }
        // Another request created it first; the unique index on user_id rejected ours.
        Err(err) => find_cart(db, user_id).await?.ok_or(AppError::OrmError(err)),
    }
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    let view = load_cart_view(&state.orm, cart).await?;
    let message = if view.items.is_empty() {
        "Cart is empty"
    } else {
        "OK"
    };
    Ok(ApiResponse::success(message, view, None))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    if payload.quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }
    let size = normalize_variant(payload.selected_size);
    let color = normalize_variant(payload.selected_color);

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    ensure_variant_available(&product, size.as_deref(), color.as_deref())?;

    let cart = get_or_create_cart(&state.orm, user.user_id).await?;

    let txn = state.orm.begin().await?;
    let existing = CartItems::find()
        .filter(line_condition(
            cart.id,
            product.id,
            size.as_deref(),
            color.as_deref(),
        ))
        .one(&txn)
        .await?;

    let item = match existing {
        Some(item) => {
            let quantity = item.quantity.saturating_add(payload.quantity);
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.update(&txn).await?
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(payload.quantity),
                price: Set(product.price),
                selected_size: Set(size),
                selected_color: Set(color),
                created_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await?
        }
    };
    let cart = recalculate_total(&txn, cart).await?;
    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        cart_id = %cart.id,
        product_id = %product.id,
        quantity = item.quantity,
        total_price = cart.total_price,
        "cart item added"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({
            "item_id": item.id,
            "product_id": product.id,
            "quantity": item.quantity,
        }),
    )
    .await;

    let view = load_cart_view(&state.orm, cart).await?;
    Ok(ApiResponse::success("Added to cart", view, None))
}

pub async fn update_item_quantity(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    if payload.quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be a positive integer".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;
    let (cart, item) = find_owned_item(&txn, user.user_id, item_id).await?;

    let mut active: CartItemActive = item.into();
    active.quantity = Set(payload.quantity);
    active.update(&txn).await?;

    let cart = recalculate_total(&txn, cart).await?;
    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        item_id = %item_id,
        quantity = payload.quantity,
        total_price = cart.total_price,
        "cart item updated"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "item_id": item_id, "quantity": payload.quantity }),
    )
    .await;

    let view = load_cart_view(&state.orm, cart).await?;
    Ok(ApiResponse::success("Cart updated", view, None))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    let txn = state.orm.begin().await?;
    let (cart, item) = find_owned_item(&txn, user.user_id, item_id).await?;

    item.delete(&txn).await?;
    let cart = recalculate_total(&txn, cart).await?;
    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        item_id = %item_id,
        total_price = cart.total_price,
        "cart item removed"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "item_id": item_id }),
    )
    .await;

    let view = load_cart_view(&state.orm, cart).await?;
    Ok(ApiResponse::success("Removed from cart", view, None))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;

    let txn = state.orm.begin().await?;
    let deleted = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;
    let cart = recalculate_total(&txn, cart).await?;
    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        removed = deleted.rows_affected,
        "cart cleared"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "cart_clear",
        "carts",
        serde_json::json!({ "cart_id": cart.id, "removed": deleted.rows_affected }),
    )
    .await;

    Ok(ApiResponse::success(
        "Cart cleared",
        Cart::resolve(cart, Vec::new()),
        None,
    ))
}

/// Recomputes `total_price` from the stored items; never patched incrementally.
pub async fn recalculate_total<C: ConnectionTrait>(db: &C, cart: CartModel) -> AppResult<CartModel> {
    let items = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .all(db)
        .await?;
    let total = sum_subtotals(&items);

    let mut active: CartActive = cart.into();
    active.total_price = Set(total);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(db).await?)
}

pub async fn load_cart_view<C: ConnectionTrait>(db: &C, cart: CartModel) -> AppResult<Cart> {
    let items = CartItems::find()
        .find_also_related(Products)
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .order_by_asc(CartItemCol::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|(item, product)| CartItem::resolve(item, product))
        .collect();

    Ok(Cart::resolve(cart, items))
}

/// Looks an item up through its cart so one user can never touch another user's lines.
async fn find_owned_item<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    item_id: Uuid,
) -> AppResult<(CartModel, CartItemModel)> {
    let item = CartItems::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Cart item"))?;

    let cart = Carts::find_by_id(item.cart_id)
        .one(db)
        .await?
        .filter(|cart| cart.user_id == user_id)
        .ok_or_else(|| AppError::not_found("Cart item"))?;

    Ok((cart, item))
}

fn sum_subtotals(items: &[CartItemModel]) -> i64 {
    items
        .iter()
        .map(CartItemModel::subtotal)
        .fold(0i64, i64::saturating_add)
}

/// Same product with the same optional size and color; absence only matches absence.
fn line_condition(
    cart_id: Uuid,
    product_id: Uuid,
    size: Option<&str>,
    color: Option<&str>,
) -> Condition {
    let condition = Condition::all()
        .add(CartItemCol::CartId.eq(cart_id))
        .add(CartItemCol::ProductId.eq(product_id));
    let condition = match size {
        Some(size) => condition.add(CartItemCol::SelectedSize.eq(size)),
        None => condition.add(CartItemCol::SelectedSize.is_null()),
    };
    match color {
        Some(color) => condition.add(CartItemCol::SelectedColor.eq(color)),
        None => condition.add(CartItemCol::SelectedColor.is_null()),
    }
}
