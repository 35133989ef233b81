//! HTTP-level tests driving the router against the in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;

use estatehub_api::{AppState, build_app};
use estatehub_auth::jwt::JwtEncoder;
use estatehub_core::config::AppConfig;
use estatehub_database::MemoryStore;
use estatehub_entity::{Property, Sale};
use estatehub_entity::resource::ResourceRecord;
use estatehub_entity::user::UserRole;

const CONFIG: &str = r#"
    [database]
    url = "postgres://unused@localhost/estatehub"

    [auth]
    jwt_secret = "api-test-secret"
"#;

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    encoder: JwtEncoder,
}

impl TestApp {
    fn new() -> Self {
        let config = AppConfig::from_toml(CONFIG).unwrap();
        let encoder = JwtEncoder::new(&config.auth);
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone(), store.clone());

        Self {
            router: build_app(state),
            store,
            encoder,
        }
    }

    fn token(&self, user_id: i64, role: UserRole) -> String {
        self.encoder.generate_tokens(user_id, role).unwrap().access_token
    }

    fn put_listing(&self, id: i64, owner_id: i64) {
        self.store.put_record(ResourceRecord::Property(Property {
            id,
            address: "5 Elm Row".to_string(),
            property_type: "house".to_string(),
            price: 310_000.0,
            owner_id,
            status: "available".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }));
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.call(request).await
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_login_and_admin_route() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "alice", "email": "alice@x.com", "password": "hunter2"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "user");
    assert!(body.get("password_hash").is_none());

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"identifier": "alice", "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "CREDENTIAL_MISMATCH");

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"identifier": "alice@x.com", "password": "hunter2"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access_token"].as_str().unwrap().to_string();
    assert!(body["refresh_token"].is_string());

    let (status, body) = app.send("GET", "/api/auth/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");

    let (status, body) = app.send("GET", "/api/users", Some(&access), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_register_conflict_and_short_password() {
    let app = TestApp::new();
    let body = json!({"username": "bob", "email": "bob@x.com", "password": "hunter2"});
    let (status, _) = app.send("POST", "/api/auth/register", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send("POST", "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");

    let (status, _) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "carl", "email": "carl@x.com", "password": "12345"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "dana", "email": "not-an-email", "password": "hunter2"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_authorization_header_rules() {
    let app = TestApp::new();

    let (status, body) = app.send("GET", "/api/properties", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "MISSING_AUTH");

    let token = app.token(1, UserRole::User);
    let request = Request::builder()
        .uri("/api/properties")
        .header(header::AUTHORIZATION, format!("bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.call(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "MALFORMED_AUTH");

    let (status, body) = app
        .send("GET", "/api/properties", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "MALFORMED_TOKEN");

    let foreign = JwtEncoder::new(&estatehub_core::config::AuthConfig::with_secret("other"))
        .generate_tokens(1, UserRole::Admin)
        .unwrap();
    let (status, body) = app
        .send("GET", "/api/properties", Some(&foreign.access_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_SIGNATURE");
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = TestApp::new();
    let pair = app.encoder.generate_tokens(1, UserRole::Admin).unwrap();

    let (status, body) = app
        .send("GET", "/api/properties", Some(&pair.refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "MALFORMED_TOKEN");
}

#[tokio::test]
async fn test_refresh_endpoint() {
    let app = TestApp::new();
    let (status, _) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "erin", "email": "erin@x.com", "password": "hunter2"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, tokens) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"identifier": "erin", "password": "hunter2"})),
        )
        .await;

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({"refresh_token": tokens["refresh_token"]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    let (status, _) = app
        .send(
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({"refresh_token": tokens["access_token"]})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_resource_touches_no_store() {
    let app = TestApp::new();
    let token = app.token(1, UserRole::Admin);
    let before = app.store.query_count();

    let (status, body) = app.send("GET", "/api/secrets", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_RESOURCE");

    let (status, _) = app.send("DELETE", "/api/secrets/5", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.query_count(), before);
}

#[tokio::test]
async fn test_owner_gate_over_http() {
    let app = TestApp::new();
    app.put_listing(5, 42);
    let update = json!({"address": "5 Elm Row", "type": "house", "price": 299000.0});

    let owner = app.token(42, UserRole::Agent);
    let (status, body) = app
        .send("PUT", "/api/properties/5", Some(&owner), Some(update.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 299000.0);
    assert_eq!(body["owner_id"], 42);

    let other = app.token(43, UserRole::Agent);
    let (status, _) = app
        .send("PUT", "/api/properties/5", Some(&other), Some(update.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let plain_owner = app.token(42, UserRole::User);
    let (status, _) = app
        .send("DELETE", "/api/properties/5", Some(&plain_owner), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.token(1, UserRole::Admin);
    let (status, _) = app
        .send("PUT", "/api/properties/5", Some(&admin), Some(update))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("DELETE", "/api/properties/99", Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("DELETE", "/api/properties/abc", Some(&owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_list_owned_and_delete() {
    let app = TestApp::new();
    let agent = app.token(7, UserRole::Agent);
    let listing = json!({"address": "1 Main St", "type": "apartment", "price": 125000.0});

    let reader = app.token(8, UserRole::User);
    let (status, _) = app
        .send("POST", "/api/properties", Some(&reader), Some(listing.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app
        .send("POST", "/api/properties", Some(&agent), Some(listing))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["owner_id"], 7);
    assert_eq!(created["status"], "available");
    let id = created["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            "POST",
            "/api/properties",
            Some(&agent),
            Some(json!({"address": "", "type": "house", "price": 1.0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, mine) = app.send("GET", "/api/properties/my", Some(&agent), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, theirs) = app.send("GET", "/api/properties/my", Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(theirs.as_array().unwrap().is_empty());

    let (status, all) = app.send("GET", "/api/properties", Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let uri = format!("/api/properties/{id}");
    let (status, _) = app.send("GET", &uri, Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send("DELETE", &uri, Some(&agent), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = app.send("GET", &uri, Some(&reader), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_administration() {
    let app = TestApp::new();
    let user = app
        .store
        .seed_user("gail", "gail@x.com", "unused", UserRole::User);
    let admin = app.token(999, UserRole::Admin);

    let (status, users) = app.send("GET", "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(users[0].get("password_hash").is_none());

    let (status, _) = app
        .send("POST", "/api/users", Some(&admin), Some(json!({"role": "agent"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("/api/users/{}", user.id);
    let (status, body) = app
        .send("PUT", &uri, Some(&admin), Some(json!({"role": "agent"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role_id"], UserRole::Agent.id());

    let (status, _) = app
        .send("PUT", &uri, Some(&admin), Some(json!({"role": "owner"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleting_a_user_releases_their_listings() {
    let app = TestApp::new();
    let seller = app
        .store
        .seed_user("hana", "hana@x.com", "unused", UserRole::Agent);
    app.put_listing(5, seller.id);
    let admin = app.token(999, UserRole::Admin);

    let uri = format!("/api/users/{}", seller.id);
    let (status, _) = app.send("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send("GET", "/api/properties/5", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner_id"], 0);

    let stranger = app.token(seller.id + 1, UserRole::Agent);
    let (status, _) = app
        .send(
            "PUT",
            "/api/properties/5",
            Some(&stranger),
            Some(json!({"address": "5 Elm Row", "type": "house", "price": 300000.0})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_buyer_account_delete_conflicts() {
    let app = TestApp::new();
    let buyer = app
        .store
        .seed_user("ivan", "ivan@x.com", "unused", UserRole::User);
    app.put_listing(5, 0);
    app.store.put_record(ResourceRecord::Sale(Sale {
        id: 8,
        property_id: 5,
        buyer_id: buyer.id,
        sale_date: Utc::now(),
        final_price: 305_000.0,
        owner_id: 0,
    }));
    let admin = app.token(999, UserRole::Admin);

    let uri = format!("/api/users/{}", buyer.id);
    let (status, body) = app.send("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");

    let (status, _) = app.send("GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
}
