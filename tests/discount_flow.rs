mod common;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use storefront_api::{
    dto::{
        cart::{AddToCartRequest, UpdateCartItemRequest},
        discounts::{ApplyDiscountRequest, DiscountRequest},
    },
    entity::discounts::{self, DiscountType},
    error::AppError,
    routes::params::DiscountQuery,
    services::{cart_service, discount_service},
};
use uuid::Uuid;

fn apply(code: &str) -> ApplyDiscountRequest {
    ApplyDiscountRequest { code: code.into() }
}

fn request(name: &str, code: &str, discount_type: &str, value: i64) -> DiscountRequest {
    let now = Utc::now();
    DiscountRequest {
        name: name.into(),
        discount_code: code.into(),
        discount_type: discount_type.into(),
        discount_value: value,
        min_order_value: 0,
        max_discount_amount: 0,
        max_usage: 0,
        start_date: now - Duration::hours(1),
        end_date: now + Duration::days(30),
        is_active: true,
    }
}

#[tokio::test]
async fn minimum_value_then_success_then_usage_limit() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::customer();
    let widget = common::create_product(&state, "Widget", 80, &[], &[]).await?;
    let d1 = common::create_discount(&state, "D1", DiscountType::Fixed, 50, 100, 0, 1).await?;

    let cart = cart_service::add_item(
        &state,
        &user,
        AddToCartRequest {
            product_id: widget.id,
            quantity: 1,
            selected_size: None,
            selected_color: None,
        },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(cart.total_price, 80);

    let err = discount_service::apply_discount(&state, &user, apply("D1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MinOrderValue { min_order_value: 100 }));

    // Reprice the line so the cart reaches 150.
    let mut product: storefront_api::entity::products::ActiveModel = widget.into();
    product.price = Set(150);
    let widget = product.update(&state.orm).await?;
    cart_service::remove_item(&state, &user, cart.items[0].id).await?;
    let cart = cart_service::add_item(
        &state,
        &user,
        AddToCartRequest {
            product_id: widget.id,
            quantity: 1,
            selected_size: None,
            selected_color: None,
        },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(cart.total_price, 150);

    let applied = discount_service::apply_discount(&state, &user, apply("d1"))
        .await?
        .data
        .expect("applied");
    assert_eq!(applied.discount_amount, 50);
    assert_eq!(applied.cart_total, 150);
    assert_eq!(applied.final_amount, 100);

    let stored = discounts::Entity::find_by_id(d1.id)
        .one(&state.orm)
        .await?
        .expect("discount");
    assert_eq!(stored.usage_count, 1);

    let err = discount_service::apply_discount(&state, &user, apply("D1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UsageExceeded));
    Ok(())
}

#[tokio::test]
async fn percentage_is_capped_and_fixed_is_verbatim() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::customer();
    let jacket = common::create_product(&state, "Jacket", 1000, &[], &[]).await?;
    common::create_discount(&state, "TWENTY", DiscountType::Percentage, 20, 0, 150, 0).await?;
    common::create_discount(&state, "THIRTY", DiscountType::Fixed, 30, 0, 0, 0).await?;

    cart_service::add_item(
        &state,
        &user,
        AddToCartRequest {
            product_id: jacket.id,
            quantity: 1,
            selected_size: None,
            selected_color: None,
        },
    )
    .await?;

    let applied = discount_service::apply_discount(&state, &user, apply("TWENTY"))
        .await?
        .data
        .expect("applied");
    assert_eq!(applied.discount_amount, 150);
    assert_eq!(applied.final_amount, 850);

    let applied = discount_service::apply_discount(&state, &user, apply("THIRTY"))
        .await?
        .data
        .expect("applied");
    assert_eq!(applied.discount_amount, 30);
    assert_eq!(applied.final_amount, 970);
    Ok(())
}

#[tokio::test]
async fn unknown_inactive_and_expired_codes_are_not_found() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::customer();

    let err = discount_service::apply_discount(&state, &user, apply("NOPE"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let inactive = common::create_discount(&state, "OFF", DiscountType::Fixed, 10, 0, 0, 0).await?;
    let mut active: discounts::ActiveModel = inactive.into();
    active.is_active = Set(false);
    active.update(&state.orm).await?;
    let err = discount_service::apply_discount(&state, &user, apply("OFF"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let expired = common::create_discount(&state, "OLD", DiscountType::Fixed, 10, 0, 0, 0).await?;
    let mut active: discounts::ActiveModel = expired.into();
    active.end_date = Set((Utc::now() - Duration::days(1)).into());
    active.update(&state.orm).await?;
    let err = discount_service::apply_discount(&state, &user, apply("OLD"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn empty_cart_cannot_take_a_discount() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::customer();
    let discount = common::create_discount(&state, "FREE", DiscountType::Fixed, 10, 0, 0, 5).await?;

    let err = discount_service::apply_discount(&state, &user, apply("FREE"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));

    // Cart exists but holds nothing.
    cart_service::get_cart(&state, &user).await?;
    let err = discount_service::apply_discount(&state, &user, apply("FREE"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));

    let stored = discounts::Entity::find_by_id(discount.id)
        .one(&state.orm)
        .await?
        .expect("discount");
    assert_eq!(stored.usage_count, 0);
    Ok(())
}

#[tokio::test]
async fn unlimited_usage_keeps_counting() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::customer();
    let mug = common::create_product(&state, "Mug", 40, &[], &[]).await?;
    let discount = common::create_discount(&state, "ALWAYS", DiscountType::Fixed, 5, 0, 0, 0).await?;

    let cart = cart_service::add_item(
        &state,
        &user,
        AddToCartRequest {
            product_id: mug.id,
            quantity: 1,
            selected_size: None,
            selected_color: None,
        },
    )
    .await?
    .data
    .expect("cart");
    cart_service::update_item_quantity(
        &state,
        &user,
        cart.items[0].id,
        UpdateCartItemRequest { quantity: 2 },
    )
    .await?;

    for _ in 0..3 {
        discount_service::apply_discount(&state, &user, apply("ALWAYS")).await?;
    }
    let stored = discounts::Entity::find_by_id(discount.id)
        .one(&state.orm)
        .await?
        .expect("discount");
    assert_eq!(stored.usage_count, 3);
    Ok(())
}

#[tokio::test]
async fn admin_crud_enforces_unique_name_and_code() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin();

    let created = discount_service::create_discount(
        &state,
        &admin,
        request("Summer", "summer15", "percentage", 15),
    )
    .await?
    .data
    .expect("discount");
    assert_eq!(created.discount_code, "SUMMER15");
    assert_eq!(created.discount_type, DiscountType::Percentage);
    assert_eq!(created.usage_count, 0);

    let err = discount_service::create_discount(
        &state,
        &admin,
        request("Summer", "OTHER", "FIXED", 10),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::DuplicateName(_)));

    let err = discount_service::create_discount(
        &state,
        &admin,
        request("Winter", "Summer15", "FIXED", 10),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::DuplicateCode(_)));

    // Updating a discount with its own name and code is not a conflict.
    let updated = discount_service::update_discount(
        &state,
        &admin,
        created.id,
        request("Summer", "SUMMER15", "PERCENTAGE", 25),
    )
    .await?
    .data
    .expect("discount");
    assert_eq!(updated.discount_value, 25);

    let err = discount_service::create_discount(
        &state,
        &admin,
        request("Broken", "BROKEN", "PERCENTAGE", 120),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    discount_service::delete_discount(&state, &admin, created.id).await?;
    let err = discount_service::get_discount(&state, &admin, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = discount_service::delete_discount(&state, &admin, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn listing_and_search_are_admin_only() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin();
    let user = common::customer();

    for (name, code) in [("Spring Fling", "SPRING5"), ("Autumn Leaves", "FALL5"), ("Spring Break", "BREAK9")] {
        discount_service::create_discount(&state, &admin, request(name, code, "FIXED", 5)).await?;
    }

    let err = discount_service::list_discounts(&state, &user, DiscountQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let page = discount_service::list_discounts(
        &state,
        &admin,
        DiscountQuery {
            per_page: Some(2),
            ..Default::default()
        },
    )
    .await?;
    let meta = page.meta.expect("pagination");
    assert_eq!(meta.total_items, 3);
    assert_eq!(meta.total_pages, 2);
    assert_eq!(page.data.expect("list").items.len(), 2);

    let found = discount_service::search_discounts(
        &state,
        &admin,
        DiscountQuery {
            name: Some("spring".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("list");
    assert_eq!(found.items.len(), 2);

    let found = discount_service::search_discounts(
        &state,
        &admin,
        DiscountQuery {
            code: Some("fall".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("list");
    assert_eq!(found.items.len(), 1);
    assert_eq!(found.items[0].discount_code, "FALL5");
    Ok(())
}

#[tokio::test]
async fn fixed_discount_larger_than_the_cart_is_granted_in_full() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::customer();
    let pen = common::create_product(&state, "Pen", 20, &[], &[]).await?;
    common::create_discount(&state, "BIGFIX", DiscountType::Fixed, 30, 0, 0, 0).await?;

    cart_service::add_item(
        &state,
        &user,
        AddToCartRequest {
            product_id: pen.id,
            quantity: 1,
            selected_size: None,
            selected_color: None,
        },
    )
    .await?;

    let applied = discount_service::apply_discount(&state, &user, apply("BIGFIX"))
        .await?
        .data
        .expect("applied");
    assert_eq!(applied.cart_total, 20);
    assert_eq!(applied.discount_amount, 30);
    assert_eq!(applied.final_amount, -10);
    Ok(())
}

#[tokio::test]
async fn concurrent_applies_never_exceed_max_usage() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let first = common::customer();
    let second = common::customer();
    let mug = common::create_product(&state, "Mug", 40, &[], &[]).await?;
    let discount = common::create_discount(&state, "ONCE", DiscountType::Fixed, 5, 0, 0, 1).await?;

    for user in [&first, &second] {
        cart_service::add_item(
            &state,
            user,
            AddToCartRequest {
                product_id: mug.id,
                quantity: 1,
                selected_size: None,
                selected_color: None,
            },
        )
        .await?;
    }

    let (a, b) = tokio::join!(
        discount_service::apply_discount(&state, &first, apply("ONCE")),
        discount_service::apply_discount(&state, &second, apply("ONCE")),
    );
    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::UsageExceeded)))
    );

    let stored = discounts::Entity::find_by_id(discount.id)
        .one(&state.orm)
        .await?
        .expect("discount");
    assert_eq!(stored.usage_count, 1);
    Ok(())
}

#[tokio::test]
async fn usage_increment_loses_to_a_newer_count() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let loaded = common::create_discount(&state, "LAST", DiscountType::Fixed, 5, 0, 0, 1).await?;

    // Another apply consumed the last unit after `loaded` was read.
    let mut bumped: discounts::ActiveModel = loaded.clone().into();
    bumped.usage_count = Set(1);
    bumped.update(&state.orm).await?;

    assert!(loaded.has_usage_left());
    let err = discount_service::consume_usage(&state.orm, &loaded, Utc::now().into())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UsageExceeded));

    let stored = discounts::Entity::find_by_id(loaded.id)
        .one(&state.orm)
        .await?
        .expect("discount");
    assert_eq!(stored.usage_count, 1);
    Ok(())
}
