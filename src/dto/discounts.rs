use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Discount;

/// Body of discount create and update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DiscountRequest {
    pub name: String,
    pub discount_code: String,
    /// `PERCENTAGE` or `FIXED`.
    pub discount_type: String,
    pub discount_value: i64,
    #[serde(default)]
    pub min_order_value: i64,
    #[serde(default)]
    pub max_discount_amount: i64,
    #[serde(default)]
    pub max_usage: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyDiscountRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DiscountApplied {
    pub discount_amount: i64,
    pub cart_total: i64,
    pub final_amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscountList {
    pub items: Vec<Discount>,
}
