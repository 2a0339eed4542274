use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        discounts::{self, DiscountType},
        products::{self, VariantList},
    },
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url, config.db_max_connections).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    seed_products(&orm).await?;
    seed_discounts(&orm).await?;

    println!("Seed completed");
    Ok(())
}

fn variants(values: &[&str]) -> VariantList {
    VariantList(values.iter().map(|v| v.to_string()).collect())
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let products = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 550000, 50, &["S", "M", "L", "XL"][..], &["Black", "Orange"][..]),
        ("Ferris Mug", "Coffee tastes better with Ferris", 120000, 100, &[][..], &["White"][..]),
        ("Rust Sticker Pack", "Decorate your laptop", 50000, 200, &[][..], &[][..]),
        ("Crab T-Shirt", "Soft cotton tee", 180000, 75, &["S", "M", "L"][..], &["Red", "Navy"][..]),
    ];

    for (name, desc, price, stock, sizes, colors) in products {
        let exists = products::Entity::find()
            .filter(products::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(desc.to_string())),
            image: Set(None),
            price: Set(price),
            sale_price: Set(None),
            is_sale: Set(false),
            stock: Set(stock),
            sizes: Set(variants(sizes)),
            colors: Set(variants(colors)),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_discounts(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let discounts = vec![
        ("Welcome ten percent", "WELCOME10", DiscountType::Percentage, 10, 100000, 50000, 0),
        ("Flat thirty thousand", "FLAT30K", DiscountType::Fixed, 30000, 200000, 0, 100),
    ];

    let now = Utc::now();
    for (name, code, discount_type, value, min_order_value, max_discount_amount, max_usage) in discounts {
        let exists = discounts::Entity::find()
            .filter(discounts::Column::DiscountCode.eq(code))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        discounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            discount_code: Set(code.to_string()),
            discount_type: Set(discount_type),
            discount_value: Set(value),
            min_order_value: Set(min_order_value),
            max_discount_amount: Set(max_discount_amount),
            max_usage: Set(max_usage),
            usage_count: Set(0),
            start_date: Set(now.into()),
            end_date: Set((now + Duration::days(90)).into()),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded discounts");
    Ok(())
}
