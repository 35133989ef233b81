//! The closed set of collections reachable through the generic CRUD routes.
//!
//! Table names and column lists only ever come from the variants below, so
//! SQL built from a [`ResourceKind`] never contains caller-supplied text.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;
use validator::Validate;

use estatehub_core::error::AppError;
use estatehub_core::result::AppResult;

use crate::property::{Property, PropertyInput};
use crate::purchase::{Purchase, PurchaseInput};
use crate::sale::{Sale, SaleInput};
use crate::user::{User, UserRole};

/// Owner id marking a record that belongs to nobody.
pub const UNOWNED: i64 = 0;

/// A collection exposed under `/api/{resource}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// `properties`
    Property,
    /// `sales`
    Sale,
    /// `purchases`
    Purchase,
    /// `users`
    User,
}

impl ResourceKind {
    /// Every known collection.
    pub const ALL: [ResourceKind; 4] = [Self::Property, Self::Sale, Self::Purchase, Self::User];

    /// Resolve a route segment against the allow-list.
    ///
    /// Fails closed with `InvalidResource` for anything not in [`Self::ALL`].
    pub fn from_name(name: &str) -> AppResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.table() == name)
            .ok_or_else(|| AppError::invalid_resource(name))
    }

    /// Table (and route segment) name.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Property => "properties",
            Self::Sale => "sales",
            Self::Purchase => "purchases",
            Self::User => "users",
        }
    }

    /// Columns written by insert and update, in bind order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Property => &["address", "type", "price", "status"],
            Self::Sale => &["property_id", "buyer_id", "final_price"],
            Self::Purchase => &["property_id", "seller_id", "initial_price"],
            Self::User => &["role_id"],
        }
    }

    /// Column holding the owning account. A user account owns itself.
    pub fn owner_column(&self) -> &'static str {
        match self {
            Self::User => "id",
            _ => "owner_id",
        }
    }

    /// Whether records of this kind are created through the generic routes.
    ///
    /// Accounts are only created by registration.
    pub fn supports_insert(&self) -> bool {
        !matches!(self, Self::User)
    }

    /// `INSERT ... RETURNING *` with the owner bound last.
    pub fn insert_sql(&self) -> String {
        let columns = self.columns();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
        format!(
            "INSERT INTO {} ({}, owner_id) VALUES ({}, ${}) RETURNING *",
            self.table(),
            columns.join(", "),
            placeholders.join(", "),
            columns.len() + 1
        )
    }

    /// `UPDATE ... RETURNING *` with the id bound last.
    pub fn update_sql(&self) -> String {
        let columns = self.columns();
        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ${}", i + 1))
            .collect();
        let touch = match self {
            Self::Property | Self::User => ", updated_at = NOW()",
            Self::Sale | Self::Purchase => "",
        };
        format!(
            "UPDATE {} SET {}{} WHERE id = ${} RETURNING *",
            self.table(),
            assignments.join(", "),
            touch,
            columns.len() + 1
        )
    }

    /// Parse and validate a JSON request body for this collection.
    pub fn parse_payload(&self, body: serde_json::Value) -> AppResult<ResourcePayload> {
        fn decode<T: serde::de::DeserializeOwned + Validate>(
            kind: ResourceKind,
            body: serde_json::Value,
        ) -> AppResult<T> {
            let input: T = serde_json::from_value(body).map_err(|e| {
                AppError::validation(format!("Invalid {} payload: {e}", kind.table()))
            })?;
            input
                .validate()
                .map_err(|e| AppError::validation(e.to_string()))?;
            Ok(input)
        }

        Ok(match self {
            Self::Property => ResourcePayload::Property(decode(*self, body)?),
            Self::Sale => ResourcePayload::Sale(decode(*self, body)?),
            Self::Purchase => ResourcePayload::Purchase(decode(*self, body)?),
            Self::User => ResourcePayload::User(decode(*self, body)?),
        })
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Role change for an account; the only writable field of `users`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserRoleInput {
    /// New role.
    pub role: UserRole,
}

/// Validated write payload, one variant per collection.
#[derive(Debug, Clone)]
pub enum ResourcePayload {
    /// Property fields.
    Property(PropertyInput),
    /// Sale fields.
    Sale(SaleInput),
    /// Purchase fields.
    Purchase(PurchaseInput),
    /// Account role change.
    User(UserRoleInput),
}

impl ResourcePayload {
    /// The collection this payload writes to.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Property(_) => ResourceKind::Property,
            Self::Sale(_) => ResourceKind::Sale,
            Self::Purchase(_) => ResourceKind::Purchase,
            Self::User(_) => ResourceKind::User,
        }
    }

    /// Bind the values for [`ResourceKind::columns`], in order.
    pub fn bind<'q, O>(
        &'q self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        match self {
            Self::Property(p) => query
                .bind(&p.address)
                .bind(&p.property_type)
                .bind(p.price)
                .bind(&p.status),
            Self::Sale(s) => query.bind(s.property_id).bind(s.buyer_id).bind(s.final_price),
            Self::Purchase(p) => query
                .bind(p.property_id)
                .bind(p.seller_id)
                .bind(p.initial_price),
            Self::User(u) => query.bind(u.role.id()),
        }
    }
}

/// A stored record of any collection.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResourceRecord {
    /// Property row.
    Property(Property),
    /// Sale row.
    Sale(Sale),
    /// Purchase row.
    Purchase(Purchase),
    /// User row (password hash never serialized).
    User(User),
}

impl ResourceRecord {
    /// Primary key.
    pub fn id(&self) -> i64 {
        match self {
            Self::Property(p) => p.id,
            Self::Sale(s) => s.id,
            Self::Purchase(p) => p.id,
            Self::User(u) => u.id,
        }
    }

    /// Owning account id (0 = unowned).
    pub fn owner_id(&self) -> i64 {
        match self {
            Self::Property(p) => p.owner_id,
            Self::Sale(s) => s.owner_id,
            Self::Purchase(p) => p.owner_id,
            Self::User(u) => u.id,
        }
    }

    /// Whether the record names `user_id` as a sale buyer or purchase seller.
    pub fn references_account(&self, user_id: i64) -> bool {
        match self {
            Self::Sale(s) => s.buyer_id == user_id,
            Self::Purchase(p) => p.seller_id == user_id,
            Self::Property(_) | Self::User(_) => false,
        }
    }

    /// Clear the owner so the record becomes [`UNOWNED`]. No-op for accounts.
    pub fn disown(&mut self) {
        match self {
            Self::Property(p) => p.owner_id = UNOWNED,
            Self::Sale(s) => s.owner_id = UNOWNED,
            Self::Purchase(p) => p.owner_id = UNOWNED,
            Self::User(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estatehub_core::ErrorKind;

    #[test]
    fn test_from_name_allow_list() {
        assert_eq!(ResourceKind::from_name("properties").unwrap(), ResourceKind::Property);
        assert_eq!(ResourceKind::from_name("users").unwrap(), ResourceKind::User);

        let err = ResourceKind::from_name("secrets").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidResource);

        let err = ResourceKind::from_name("properties; DROP TABLE users").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidResource);
    }

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            ResourceKind::Sale.insert_sql(),
            "INSERT INTO sales (property_id, buyer_id, final_price, owner_id) \
             VALUES ($1, $2, $3, $4) RETURNING *"
        );
    }

    #[test]
    fn test_update_sql() {
        assert_eq!(
            ResourceKind::Property.update_sql(),
            "UPDATE properties SET address = $1, type = $2, price = $3, status = $4, \
             updated_at = NOW() WHERE id = $5 RETURNING *"
        );
        assert_eq!(
            ResourceKind::Purchase.update_sql(),
            "UPDATE purchases SET property_id = $1, seller_id = $2, initial_price = $3 \
             WHERE id = $4 RETURNING *"
        );
    }

    #[test]
    fn test_parse_payload() {
        let payload = ResourceKind::Property
            .parse_payload(serde_json::json!({
                "address": "1 Main St",
                "type": "house",
                "price": 250000.0
            }))
            .unwrap();
        match payload {
            ResourcePayload::Property(p) => assert_eq!(p.status, "available"),
            other => panic!("unexpected payload {other:?}"),
        }

        let err = ResourceKind::Sale
            .parse_payload(serde_json::json!({"property_id": 1}))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = ResourceKind::Property
            .parse_payload(serde_json::json!({
                "address": "",
                "type": "house",
                "price": 1.0
            }))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_user_payload_role_only() {
        let payload = ResourceKind::User
            .parse_payload(serde_json::json!({"role": "agent"}))
            .unwrap();
        assert_eq!(payload.kind(), ResourceKind::User);
        assert!(!ResourceKind::User.supports_insert());
    }
}
