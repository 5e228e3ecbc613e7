#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Requests go through the real router, middleware and listing engine.
//! Persistence is the in-process [`MemoryStore`], seeded directly so tests
//! control ids and timestamps.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use armeta_kernel::config::DEFAULT_LIST_MAX_LIMIT;
use armeta_kernel::models::{
    EngagementEdge, EngagementKind, Item, ItemKind, Lecturer, Principal, Role, Subject, User,
};
use armeta_kernel::routes;
use armeta_kernel::services::TokenService;
use armeta_kernel::services::token::SESSION_TOKEN_LIFETIME;
use armeta_kernel::state::AppState;
use armeta_kernel::store::MemoryStore;

pub const SECRET: &[u8] = b"integration-test-secret-at-least-32-bytes";

/// Fixed base time for seeded content: 2024-05-01 08:00 UTC.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

pub fn minutes_after_base(minutes: i64) -> DateTime<Utc> {
    base_time() + TimeDelta::minutes(minutes)
}

/// Test application wrapping the real router over a memory store.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
    tokens: TokenService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_max_limit(DEFAULT_LIST_MAX_LIMIT)
    }

    pub fn with_max_limit(list_max_limit: u32) -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::new(SECRET);
        let state = AppState::with_store(store.clone(), tokens.clone(), list_max_limit);

        Self {
            router: routes::app(state),
            store,
            tokens,
        }
    }

    /// Create a stored user and return its principal.
    pub fn user(&self, name: &str) -> Principal {
        self.principal(name, Role::User)
    }

    pub fn admin(&self, name: &str) -> Principal {
        self.principal(name, Role::Admin)
    }

    fn principal(&self, name: &str, role: Role) -> Principal {
        let id = Uuid::now_v7();
        let email = format!("{}@campus.test", name.to_lowercase());
        self.store.insert_user(User {
            id,
            name: name.to_string(),
            email: email.clone(),
            image: Some(format!("https://cdn.campus.test/{}.png", name.to_lowercase())),
            role,
            is_banned: false,
            poin: 0,
            created_at: base_time(),
        });
        Principal {
            user_id: id,
            name: name.to_string(),
            email,
            role,
            is_banned: false,
        }
    }

    pub fn token(&self, principal: &Principal) -> String {
        self.tokens
            .issue(principal, SESSION_TOKEN_LIFETIME)
            .expect("failed to issue token")
    }

    pub fn subject(&self, name: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.store.insert_subject(Subject {
            id,
            code: name.to_uppercase().replace(' ', ""),
            name: name.to_string(),
            semester: Some(3),
        });
        id
    }

    pub fn lecturer(&self, name: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.store.insert_lecturer(Lecturer {
            id,
            name: name.to_string(),
            faculty: Some("Computer Science".to_string()),
        });
        id
    }

    /// Store a top-level review and return its id.
    pub fn review(&self, author: &Principal, subject: Uuid, title: &str, minute: i64) -> Uuid {
        let mut item = item(ItemKind::Review, author.user_id, minute);
        item.subject_id = Some(subject);
        item.title = title.to_string();
        self.insert(item)
    }

    /// Store a forum thread and return its id.
    pub fn forum(&self, author: &Principal, subject: Uuid, title: &str, minute: i64) -> Uuid {
        let mut item = item(ItemKind::Forum, author.user_id, minute);
        item.subject_id = Some(subject);
        item.title = title.to_string();
        self.insert(item)
    }

    pub fn insert(&self, item: Item) -> Uuid {
        let id = item.id;
        self.store.insert_item(item);
        id
    }

    pub fn engage(
        &self,
        user: &Principal,
        kind: EngagementKind,
        item_kind: ItemKind,
        item_id: Uuid,
    ) {
        self.store.insert_edge(EngagementEdge {
            user_id: user.user_id,
            kind,
            item_kind,
            item_id,
        });
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.request(request).await
    }
}

/// An item with neutral defaults, created `minute` minutes after [`base_time`].
pub fn item(kind: ItemKind, author_id: Uuid, minute: i64) -> Item {
    let created = minutes_after_base(minute);
    Item {
        kind,
        id: Uuid::now_v7(),
        author_id,
        subject_id: None,
        lecturer_id: None,
        reply_to_id: None,
        forum_id: None,
        title: String::new(),
        body: "body text".to_string(),
        files: vec![],
        is_anonymous: false,
        created_at: created,
        updated_at: created,
    }
}

/// Titles of the `data` array, in response order.
pub fn titles(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .expect("data is not an array")
        .iter()
        .map(|item| item["title"].as_str().unwrap_or_default().to_string())
        .collect()
}
