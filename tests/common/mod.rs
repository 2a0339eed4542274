#![allow(dead_code)]

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use storefront_api::{
    db::run_migrations,
    entity::{
        discounts::{self, DiscountType},
        products::{self, VariantList},
    },
    middleware::auth::AuthUser,
    state::AppState,
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

/// Fresh in-memory database with every migration applied.
///
/// A single connection keeps the in-memory database alive for the whole test.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let orm = Database::connect(options).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, JWT_SECRET))
}

pub fn customer() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: "user".into(),
    }
}

pub fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: "admin".into(),
    }
}

fn variants(values: &[&str]) -> VariantList {
    VariantList(values.iter().map(|v| v.to_string()).collect())
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    sizes: &[&str],
    colors: &[&str],
) -> anyhow::Result<products::Model> {
    let product = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(Some(format!("{name} for testing"))),
        image: Set(Some(format!("https://cdn.example.com/{name}.png"))),
        price: Set(price),
        sale_price: Set(None),
        is_sale: Set(false),
        stock: Set(25),
        sizes: Set(variants(sizes)),
        colors: Set(variants(colors)),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

/// Inserts a discount that is live for the next week.
pub async fn create_discount(
    state: &AppState,
    code: &str,
    discount_type: DiscountType,
    value: i64,
    min_order_value: i64,
    max_discount_amount: i64,
    max_usage: i32,
) -> anyhow::Result<discounts::Model> {
    let now = Utc::now();
    let discount = discounts::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(format!("{code} promotion")),
        discount_code: Set(code.to_string()),
        discount_type: Set(discount_type),
        discount_value: Set(value),
        min_order_value: Set(min_order_value),
        max_discount_amount: Set(max_discount_amount),
        max_usage: Set(max_usage),
        usage_count: Set(0),
        start_date: Set((now - Duration::hours(1)).into()),
        end_date: Set((now + Duration::days(7)).into()),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(discount)
}
