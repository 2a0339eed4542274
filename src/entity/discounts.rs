use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscountType {
    #[sea_orm(string_value = "PERCENTAGE")]
    Percentage,
    #[sea_orm(string_value = "FIXED")]
    Fixed,
}

impl FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERCENTAGE" => Ok(DiscountType::Percentage),
            "FIXED" => Ok(DiscountType::Fixed),
            other => Err(format!("Unknown discount type '{other}'")),
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountType::Percentage => f.write_str("PERCENTAGE"),
            DiscountType::Fixed => f.write_str("FIXED"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "discounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub discount_code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_order_value: i64,
    /// 0 means no cap.
    pub max_discount_amount: i64,
    /// 0 means unlimited.
    pub max_usage: i32,
    pub usage_count: i32,
    pub start_date: DateTimeWithTimeZone,
    pub end_date: DateTimeWithTimeZone,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Active and inside its validity window at `now` (both ends inclusive).
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && now >= self.start_date.with_timezone(&Utc)
            && now <= self.end_date.with_timezone(&Utc)
    }

    pub fn has_usage_left(&self) -> bool {
        self.max_usage == 0 || self.usage_count < self.max_usage
    }

    /// Discount granted on a cart worth `cart_total`. FIXED is the configured value as-is.
    pub fn amount_for(&self, cart_total: i64) -> i64 {
        match self.discount_type {
            DiscountType::Percentage => {
                let raw = cart_total.max(0).saturating_mul(self.discount_value) / 100;
                if self.max_discount_amount > 0 {
                    raw.min(self.max_discount_amount)
                } else {
                    raw
                }
            }
            DiscountType::Fixed => self.discount_value,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
