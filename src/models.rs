use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    cart_items, carts, discounts,
    discounts::DiscountType,
    order_items, orders,
    orders::OrderStatus,
    products,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: i64,
    pub sale_price: Option<i64>,
    pub is_sale: bool,
    pub stock: i32,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            image: model.image,
            price: model.price,
            sale_price: model.sale_price,
            is_sale: model.is_sale,
            stock: model.stock,
            sizes: model.sizes.0,
            colors: model.colors.0,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// A cart line resolved against the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product: Option<Product>,
    pub quantity: i32,
    pub price: i64,
    pub subtotal: i64,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    pub fn resolve(item: cart_items::Model, product: Option<products::Model>) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product: product.map(Product::from),
            quantity: item.quantity,
            price: item.price,
            subtotal: item.subtotal(),
            selected_size: item.selected_size,
            selected_color: item.selected_color,
            created_at: item.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    pub total_price: i64,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn resolve(cart: carts::Model, items: Vec<CartItem>) -> Self {
        Self {
            id: cart.id,
            user_id: cart.user_id,
            items,
            total_price: cart.total_price,
            updated_at: cart.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Discount {
    pub id: Uuid,
    pub name: String,
    pub discount_code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_order_value: i64,
    pub max_discount_amount: i64,
    pub max_usage: i32,
    pub usage_count: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<discounts::Model> for Discount {
    fn from(model: discounts::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            discount_code: model.discount_code,
            discount_type: model.discount_type,
            discount_value: model.discount_value,
            min_order_value: model.min_order_value,
            max_discount_amount: model.max_discount_amount,
            max_usage: model.max_usage,
            usage_count: model.usage_count,
            start_date: model.start_date.with_timezone(&Utc),
            end_date: model.end_date.with_timezone(&Utc),
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub payment_method: String,
    pub status: OrderStatus,
    pub total_amount: i64,
    pub discount_amount: i64,
    pub final_amount: i64,
    pub discount_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            user_id: model.user_id,
            address_id: model.address_id,
            payment_method: model.payment_method,
            status: model.status,
            total_amount: model.total_amount,
            discount_amount: model.discount_amount,
            final_amount: model.final_amount,
            discount_code: model.discount_code,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub image: Option<String>,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            name: model.name,
            price: model.price,
            quantity: model.quantity,
            image: model.image,
            selected_size: model.selected_size,
            selected_color: model.selected_color,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
