//! In-process store backed by `DashMap`.
//!
//! Implements both store traits with the same observable behavior as the
//! PostgreSQL repositories. Used by the test suites and for running the
//! server without a database.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use estatehub_core::error::AppError;
use estatehub_core::result::AppResult;
use estatehub_entity::resource::{ResourceKind, ResourcePayload, ResourceRecord};
use estatehub_entity::user::{CreateUser, Identity, User, UserRole};
use estatehub_entity::{Property, Purchase, Sale};

use crate::store::{IdentityStore, ResourceStore, StoredCredential};

/// Accounts and owned records held in memory.
#[derive(Debug)]
pub struct MemoryStore {
    users: DashMap<i64, User>,
    records: DashMap<(ResourceKind, i64), ResourceRecord>,
    next_user_id: AtomicI64,
    next_record_id: AtomicI64,
    queries: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            records: DashMap::new(),
            next_user_id: AtomicI64::new(1),
            next_record_id: AtomicI64::new(1),
            queries: AtomicUsize::new(0),
        }
    }

    /// Number of trait calls served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Insert an account directly, bypassing registration.
    pub fn seed_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> User {
        let now = Utc::now();
        let user = User {
            id: self.next_user_id.fetch_add(1, Ordering::SeqCst),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role_id: role.id(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        user
    }

    /// Mark an account as disabled or enabled.
    pub fn set_active(&self, user_id: i64, active: bool) {
        if let Some(mut user) = self.users.get_mut(&user_id) {
            user.is_active = active;
        }
    }

    /// Insert a record as-is, keeping its id and owner.
    pub fn put_record(&self, record: ResourceRecord) {
        match record {
            ResourceRecord::User(user) => {
                self.users.insert(user.id, user);
            }
            other => {
                let kind = kind_of(&other);
                self.next_record_id.fetch_max(other.id() + 1, Ordering::SeqCst);
                self.records.insert((kind, other.id()), other);
            }
        }
    }

    fn touch(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }

    fn find_user_by_login(&self, identifier: &str) -> Option<User> {
        let needle = identifier.to_lowercase();
        let mut matches: Vec<User> = self
            .users
            .iter()
            .filter(|u| u.username.to_lowercase() == needle || u.email.to_lowercase() == needle)
            .map(|u| u.clone())
            .collect();
        matches.sort_by_key(|u| u.id);
        matches.into_iter().next()
    }

    /// Drop an account and release the records it owned.
    ///
    /// `Conflict` while a sale or purchase still names the account.
    fn remove_account(&self, id: i64) -> AppResult<bool> {
        if !self.users.contains_key(&id) {
            return Ok(false);
        }
        if self.records.iter().any(|r| r.value().references_account(id)) {
            return Err(account_in_use(id));
        }

        for mut entry in self.records.iter_mut() {
            if entry.value().owner_id() == id {
                entry.value_mut().disown();
            }
        }
        Ok(self.users.remove(&id).is_some())
    }

    fn login_matches(&self, username: &str, email: &str) -> bool {
        let username = username.to_lowercase();
        let email = email.to_lowercase();
        self.users
            .iter()
            .any(|u| u.username.to_lowercase() == username || u.email.to_lowercase() == email)
    }

    fn collect(&self, kind: ResourceKind, owner: Option<i64>) -> Vec<ResourceRecord> {
        let mut out: Vec<ResourceRecord> = match kind {
            ResourceKind::User => self
                .users
                .iter()
                .filter(|u| owner.is_none_or(|o| u.id == o))
                .map(|u| ResourceRecord::User(u.clone()))
                .collect(),
            _ => self
                .records
                .iter()
                .filter(|entry| entry.key().0 == kind)
                .filter(|entry| owner.is_none_or(|o| entry.value().owner_id() == o))
                .map(|entry| entry.value().clone())
                .collect(),
        };
        out.sort_by_key(|r| std::cmp::Reverse(r.id()));
        out
    }
}

fn kind_of(record: &ResourceRecord) -> ResourceKind {
    match record {
        ResourceRecord::Property(_) => ResourceKind::Property,
        ResourceRecord::Sale(_) => ResourceKind::Sale,
        ResourceRecord::Purchase(_) => ResourceKind::Purchase,
        ResourceRecord::User(_) => ResourceKind::User,
    }
}

fn not_found(kind: ResourceKind, id: i64) -> AppError {
    AppError::not_found(format!("{kind} record {id} not found"))
}

fn account_in_use(id: i64) -> AppError {
    AppError::conflict(format!(
        "User {id} is still a sale buyer or purchase seller"
    ))
}

fn identity_of(user: &User) -> AppResult<Identity> {
    user.identity().ok_or_else(|| {
        AppError::internal(format!(
            "User {} has unknown role id {}",
            user.id, user.role_id
        ))
    })
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_role_by_name(&self, name: &str) -> AppResult<i32> {
        self.touch();
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == name)
            .map(|role| role.id())
            .ok_or_else(|| AppError::not_found(format!("Role '{name}' not found")))
    }

    async fn find_identity_by_login_identifier(
        &self,
        identifier: &str,
    ) -> AppResult<StoredCredential> {
        self.touch();
        let user = self
            .find_user_by_login(identifier)
            .ok_or_else(|| AppError::not_found("User not found"))?;

        Ok(StoredCredential {
            identity: identity_of(&user)?,
            password_hash: user.password_hash,
            is_active: user.is_active,
        })
    }

    async fn find_identity_by_id(&self, id: i64) -> AppResult<Identity> {
        self.touch();
        let user = self
            .users
            .get(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        identity_of(&user)
    }

    async fn login_taken(&self, username: &str, email: &str) -> AppResult<bool> {
        self.touch();
        Ok(self.login_matches(username, email))
    }

    async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        self.touch();
        if self.login_matches(&user.username, &user.email) {
            return Err(AppError::conflict("Username or email already registered"));
        }
        if UserRole::from_id(user.role_id).is_none() {
            return Err(AppError::validation(format!(
                "Unknown role id {}",
                user.role_id
            )));
        }

        let now = Utc::now();
        let created = User {
            id: self.next_user_id.fetch_add(1, Ordering::SeqCst),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role_id: user.role_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get_owner_id(&self, kind: ResourceKind, id: i64) -> AppResult<i64> {
        self.touch();
        match kind {
            ResourceKind::User => self
                .users
                .get(&id)
                .map(|u| u.id)
                .ok_or_else(|| not_found(kind, id)),
            _ => self
                .records
                .get(&(kind, id))
                .map(|r| r.owner_id())
                .ok_or_else(|| not_found(kind, id)),
        }
    }

    async fn list(&self, kind: ResourceKind) -> AppResult<Vec<ResourceRecord>> {
        self.touch();
        Ok(self.collect(kind, None))
    }

    async fn list_owned(&self, kind: ResourceKind, owner_id: i64) -> AppResult<Vec<ResourceRecord>> {
        self.touch();
        Ok(self.collect(kind, Some(owner_id)))
    }

    async fn find(&self, kind: ResourceKind, id: i64) -> AppResult<ResourceRecord> {
        self.touch();
        match kind {
            ResourceKind::User => self
                .users
                .get(&id)
                .map(|u| ResourceRecord::User(u.clone()))
                .ok_or_else(|| not_found(kind, id)),
            _ => self
                .records
                .get(&(kind, id))
                .map(|r| r.clone())
                .ok_or_else(|| not_found(kind, id)),
        }
    }

    async fn insert(&self, payload: &ResourcePayload, owner_id: i64) -> AppResult<ResourceRecord> {
        self.touch();
        let kind = payload.kind();
        let id = self.next_record_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();

        let record = match payload {
            ResourcePayload::Property(p) => ResourceRecord::Property(Property {
                id,
                address: p.address.clone(),
                property_type: p.property_type.clone(),
                price: p.price,
                owner_id,
                status: p.status.clone(),
                created_at: now,
                updated_at: now,
            }),
            ResourcePayload::Sale(s) => ResourceRecord::Sale(Sale {
                id,
                property_id: s.property_id,
                buyer_id: s.buyer_id,
                sale_date: now,
                final_price: s.final_price,
                owner_id,
            }),
            ResourcePayload::Purchase(p) => ResourceRecord::Purchase(Purchase {
                id,
                property_id: p.property_id,
                seller_id: p.seller_id,
                purchase_date: now,
                initial_price: p.initial_price,
                owner_id,
            }),
            ResourcePayload::User(_) => {
                return Err(AppError::validation(format!(
                    "{kind} cannot be created through this endpoint"
                )));
            }
        };

        self.records.insert((kind, id), record.clone());
        Ok(record)
    }

    async fn update(&self, id: i64, payload: &ResourcePayload) -> AppResult<ResourceRecord> {
        self.touch();
        let kind = payload.kind();

        if let ResourcePayload::User(input) = payload {
            let mut user = self.users.get_mut(&id).ok_or_else(|| not_found(kind, id))?;
            user.role_id = input.role.id();
            user.updated_at = Utc::now();
            return Ok(ResourceRecord::User(user.clone()));
        }

        let mut entry = self
            .records
            .get_mut(&(kind, id))
            .ok_or_else(|| not_found(kind, id))?;

        match (entry.value_mut(), payload) {
            (ResourceRecord::Property(row), ResourcePayload::Property(p)) => {
                row.address = p.address.clone();
                row.property_type = p.property_type.clone();
                row.price = p.price;
                row.status = p.status.clone();
                row.updated_at = Utc::now();
            }
            (ResourceRecord::Sale(row), ResourcePayload::Sale(s)) => {
                row.property_id = s.property_id;
                row.buyer_id = s.buyer_id;
                row.final_price = s.final_price;
            }
            (ResourceRecord::Purchase(row), ResourcePayload::Purchase(p)) => {
                row.property_id = p.property_id;
                row.seller_id = p.seller_id;
                row.initial_price = p.initial_price;
            }
            _ => return Err(AppError::internal(format!("Record {id} is not a {kind}"))),
        }

        Ok(entry.value().clone())
    }

    async fn delete(&self, kind: ResourceKind, id: i64) -> AppResult<()> {
        self.touch();
        let removed = match kind {
            ResourceKind::User => self.remove_account(id)?,
            _ => self.records.remove(&(kind, id)).is_some(),
        };
        if removed {
            Ok(())
        } else {
            Err(not_found(kind, id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estatehub_core::ErrorKind;
    use estatehub_entity::UNOWNED;
    use estatehub_entity::property::PropertyInput;

    fn listing(price: f64) -> ResourcePayload {
        ResourcePayload::Property(PropertyInput {
            address: "12 Harbour Rd".to_string(),
            property_type: "apartment".to_string(),
            price,
            status: "available".to_string(),
        })
    }

    #[tokio::test]
    async fn test_login_lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        let alice = store.seed_user("alice", "alice@example.com", "hash", UserRole::User);

        let by_name = store.find_identity_by_login_identifier("ALICE").await.unwrap();
        let by_email = store
            .find_identity_by_login_identifier("Alice@Example.com")
            .await
            .unwrap();
        assert_eq!(by_name.identity.id, alice.id);
        assert_eq!(by_email.identity.role, UserRole::User);

        let err = store.find_identity_by_login_identifier("bob").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicates() {
        let store = MemoryStore::new();
        store.seed_user("alice", "alice@example.com", "hash", UserRole::User);

        let err = store
            .create_user(CreateUser {
                username: "alice2".to_string(),
                email: "ALICE@example.com".to_string(),
                password_hash: "hash".to_string(),
                role_id: UserRole::User.id(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(store.login_taken("Alice", "x@y.z").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_check_folds_non_ascii_case() {
        let store = MemoryStore::new();
        store.seed_user("Émile", "emile@example.com", "hash", UserRole::User);

        assert!(store.login_taken("ÉMILE", "other@example.com").await.unwrap());
        let err = store
            .create_user(CreateUser {
                username: "émile".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
                role_id: UserRole::User.id(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_insert_stamps_owner_and_lists_owned() {
        let store = MemoryStore::new();
        let mine = store.insert(&listing(100.0), 5).await.unwrap();
        store.insert(&listing(200.0), 42).await.unwrap();

        assert_eq!(mine.owner_id(), 5);
        assert_eq!(store.get_owner_id(ResourceKind::Property, mine.id()).await.unwrap(), 5);
        assert_eq!(store.list(ResourceKind::Property).await.unwrap().len(), 2);

        let owned = store.list_owned(ResourceKind::Property, 5).await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id(), mine.id());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_record() {
        let store = MemoryStore::new();
        let err = store.update(99, &listing(1.0)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = store.delete(ResourceKind::Sale, 99).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let created = store.insert(&listing(1.0), 5).await.unwrap();
        let updated = store.update(created.id(), &listing(9.0)).await.unwrap();
        match updated {
            ResourceRecord::Property(p) => {
                assert_eq!(p.price, 9.0);
                assert_eq!(p.owner_id, 5);
            }
            other => panic!("unexpected record {other:?}"),
        }
        store.delete(ResourceKind::Property, created.id()).await.unwrap();
    }

    #[tokio::test]
    async fn test_users_own_themselves() {
        let store = MemoryStore::new();
        let agent = store.seed_user("agent", "agent@example.com", "hash", UserRole::Agent);
        assert_eq!(
            store.get_owner_id(ResourceKind::User, agent.id).await.unwrap(),
            agent.id
        );

        let payload = ResourceKind::User
            .parse_payload(serde_json::json!({"role": "admin"}))
            .unwrap();
        store.update(agent.id, &payload).await.unwrap();
        let identity = store.find_identity_by_id(agent.id).await.unwrap();
        assert_eq!(identity.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_deleting_account_releases_owned_records() {
        let store = MemoryStore::new();
        let agent = store.seed_user("ines", "ines@example.com", "hash", UserRole::Agent);
        let listing = store.insert(&listing(150.0), agent.id).await.unwrap();

        store.delete(ResourceKind::User, agent.id).await.unwrap();
        assert_eq!(
            store.get_owner_id(ResourceKind::Property, listing.id()).await.unwrap(),
            UNOWNED
        );

        let err = store.delete(ResourceKind::User, agent.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_buyer_account_cannot_be_deleted() {
        let store = MemoryStore::new();
        let buyer = store.seed_user("jon", "jon@example.com", "hash", UserRole::User);
        let house = store.insert(&listing(90.0), 7).await.unwrap();
        let sale = ResourceKind::Sale
            .parse_payload(serde_json::json!({
                "property_id": house.id(),
                "buyer_id": buyer.id,
                "final_price": 88.0
            }))
            .unwrap();
        store.insert(&sale, 7).await.unwrap();

        let err = store.delete(ResourceKind::User, buyer.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(store.find_identity_by_id(buyer.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_query_counter() {
        let store = MemoryStore::new();
        assert_eq!(store.query_count(), 0);
        store.list(ResourceKind::Sale).await.unwrap();
        assert_eq!(store.query_count(), 1);
    }
}
