//! Real-estate listing entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A property listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Property {
    /// Listing id.
    pub id: i64,
    /// Street address.
    pub address: String,
    /// Kind of property: apartment, house, land.
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub property_type: String,
    /// Asking price.
    pub price: f64,
    /// Account that created the listing (0 = unowned).
    pub owner_id: i64,
    /// Listing status: available, sold, purchased.
    pub status: String,
    /// Creation time.
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

/// Writable fields of a property.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PropertyInput {
    /// Street address.
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    /// Kind of property.
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type is required"))]
    pub property_type: String,
    /// Asking price.
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
    /// Listing status.
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "available".to_string()
}
