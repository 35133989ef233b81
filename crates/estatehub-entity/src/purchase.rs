//! Purchase entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// An acquisition of a property from a seller.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    /// Purchase id.
    pub id: i64,
    /// Property that was acquired.
    pub property_id: i64,
    /// Selling account.
    pub seller_id: i64,
    /// When the purchase was recorded.
    pub purchase_date: DateTime<Utc>,
    /// Price paid.
    pub initial_price: f64,
    /// Account that recorded the purchase (0 = unowned).
    pub owner_id: i64,
}

/// Writable fields of a purchase.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PurchaseInput {
    /// Property that was acquired.
    #[validate(range(min = 1))]
    pub property_id: i64,
    /// Selling account.
    #[validate(range(min = 1))]
    pub seller_id: i64,
    /// Price paid.
    #[validate(range(min = 0.0, message = "initial_price must not be negative"))]
    pub initial_price: f64,
}
