//! End-to-end tests driving the router in-process over the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{TimeDelta, Utc};
use diary_api::auth::{PendingCode, TokenIssuer};
use diary_api::mail::MemoryMailer;
use diary_api::routes::MAX_BODY_BYTES;
use diary_api::store::{MemoryStore, UserStore};
use diary_api::{router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "http-test-secret-0123456789abcdefghij";
const PASSWORD: &str = "Passw0rd!";

struct TestApp {
    router: Router,
    store: MemoryStore,
    mailer: MemoryMailer,
}

impl TestApp {
    fn new() -> Self {
        let store = MemoryStore::new();
        let mailer = MemoryMailer::new();
        let state = AppState::new(store.clone(), Arc::new(mailer.clone()), TokenIssuer::new(SECRET));
        Self {
            router: router(state),
            store,
            mailer,
        }
    }

    async fn request(
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
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, None, Some(body)).await
    }

    async fn register(&self, username: &str, email: &str) -> (StatusCode, Value) {
        self.post(
            "/register",
            json!({ "username": username, "email": email, "password": PASSWORD }),
        )
        .await
    }

    /// Register, verify with the mailed code and return the bearer token.
    async fn verified_user(&self, username: &str, email: &str) -> String {
        let (status, _) = self.register(username, email).await;
        assert_eq!(status, StatusCode::CREATED);
        let code = self.mailer.last_code_for(email).unwrap();
        let (status, body) = self.post("/verify", json!({ "email": email, "code": code })).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_note(&self, token: &str, title: &str) -> Value {
        let (status, note) = self
            .request(
                Method::POST,
                "/notes",
                Some(token),
                Some(json!({ "title": title, "content": "body", "tag": "daily" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        note
    }
}

#[tokio::test]
async fn test_register_returns_created() {
    let app = TestApp::new();
    let (status, body) = app.register("alice", "Alice@Example.com").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["status"], "verification_pending");
    assert!(body["id"].as_i64().is_some());
    assert!(body.get("password_hash").is_none());
    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_duplicate_register_conflicts() {
    let app = TestApp::new();
    app.register("alice", "alice@example.com").await;
    let (status, body) = app.register("alice", "alice@example.com").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
    assert_eq!(app.store.user_count(), 1);
}

#[tokio::test]
async fn test_weak_password_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/register",
            json!({ "username": "bob", "email": "bob@example.com", "password": "short" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Password"));
    assert_eq!(app.store.user_count(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new();
    let (status, body) = app.post("/register", json!({ "username": "bob" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn test_login_lifecycle() {
    let app = TestApp::new();
    app.register("alice", "alice@example.com").await;

    let creds = json!({ "email": "alice@example.com", "password": PASSWORD });
    let (status, _) = app.post("/login", creds.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let code = app.mailer.last_code_for("alice@example.com").unwrap();
    let (status, body) = app
        .post("/verify", json!({ "email": "alice@example.com", "code": code }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert!(body["message"].is_string());

    let (status, body) = app.post("/login", creds).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, _) = app
        .post("/login", json!({ "username": "alice@example.com", "password": PASSWORD }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.verified_user("alice", "alice@example.com").await;

    let (wrong_status, wrong) = app
        .post("/login", json!({ "email": "alice@example.com", "password": "Wr0ng!pass" }))
        .await;
    let (unknown_status, unknown) = app
        .post("/login", json!({ "email": "ghost@example.com", "password": PASSWORD }))
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn test_verify_errors() {
    let app = TestApp::new();
    app.register("alice", "alice@example.com").await;
    let code = app.mailer.last_code_for("alice@example.com").unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let (status, _) = app
        .post("/verify", json!({ "email": "ghost@example.com", "code": code }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post("/verify", json!({ "email": "alice@example.com", "code": wrong }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/verify", json!({ "email": "alice@example.com", "code": code }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/verify", json!({ "email": "alice@example.com", "code": code }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expired_code_rejected_then_resend_recovers() {
    let app = TestApp::new();
    app.register("alice", "alice@example.com").await;

    let user = app.store.find_by_email("alice@example.com").await.unwrap().unwrap();
    let stale = PendingCode {
        code: "123456".into(),
        expires_at: Utc::now() - TimeDelta::minutes(1),
    };
    assert!(app.store.replace_code(user.id, &stale).await.unwrap());

    let (status, body) = app
        .post("/verify", json!({ "email": "alice@example.com", "code": "123456" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Verification code has expired");

    let (status, body) = app
        .post("/resend-code", json!({ "email": "alice@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    assert_eq!(app.mailer.sent().len(), 2);

    let code = app.mailer.last_code_for("alice@example.com").unwrap();
    let (status, _) = app
        .post("/verify", json!({ "email": "alice@example.com", "code": code }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/resend-code", json!({ "email": "alice@example.com" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/resend-code", json!({ "email": "ghost@example.com" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_notes_crud() {
    let app = TestApp::new();
    let token = app.verified_user("alice", "alice@example.com").await;

    let note = app.create_note(&token, "first").await;
    let id = note["id"].as_i64().unwrap();
    assert_eq!(note["title"], "first");
    assert_eq!(note["tag"], "daily");

    let uri = format!("/notes/{id}");
    let (status, fetched) = app.request(Method::GET, &uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, note);

    let (status, updated) = app
        .request(
            Method::PUT,
            &uri,
            Some(token.as_str()),
            Some(json!({ "title": "edited", "content": "new body", "tag": "work" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "edited");
    assert_eq!(updated["tag"], "work");
    assert_eq!(updated["created_at"], note["created_at"]);

    let (status, body) = app.request(Method::DELETE, &uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app.request(Method::DELETE, &uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.request(Method::GET, &uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_is_newest_first_and_scoped() {
    let app = TestApp::new();
    let alice = app.verified_user("alice", "alice@example.com").await;
    let bob = app.verified_user("bob", "bob@example.com").await;

    for title in ["one", "two", "three"] {
        app.create_note(&alice, title).await;
    }
    app.create_note(&bob, "bob's").await;

    let (status, notes) = app.request(Method::GET, "/notes", Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = notes
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["three", "two", "one"]);
}

#[tokio::test]
async fn test_other_users_note_is_not_found() {
    let app = TestApp::new();
    let alice = app.verified_user("alice", "alice@example.com").await;
    let bob = app.verified_user("bob", "bob@example.com").await;

    let note = app.create_note(&alice, "private").await;
    let uri = format!("/notes/{}", note["id"]);

    let (status, _) = app.request(Method::GET, &uri, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(Method::PUT, &uri, Some(bob.as_str()), Some(json!({ "title": "mine now" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.request(Method::DELETE, &uri, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, still) = app.request(Method::GET, &uri, Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(still["title"], "private");
}

#[tokio::test]
async fn test_invalid_note_id() {
    let app = TestApp::new();
    let token = app.verified_user("alice", "alice@example.com").await;
    let (status, body) = app.request(Method::GET, "/notes/abc", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid note id");
}

#[tokio::test]
async fn test_notes_require_bearer() {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/notes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .uri("/notes")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = app.request(Method::GET, "/notes", Some("not.a.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_or_foreign_token_rejected() {
    let app = TestApp::new();
    app.verified_user("alice", "alice@example.com").await;
    let user = app.store.find_by_email("alice@example.com").await.unwrap().unwrap();

    let stale = TokenIssuer::new(SECRET)
        .issue_at(user.id, Utc::now() - TimeDelta::hours(25))
        .unwrap();
    let (status, _) = app.request(Method::GET, "/notes", Some(stale.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = TokenIssuer::new("another-secret-0123456789abcdefghijkl")
        .issue(user.id)
        .unwrap();
    let (status, _) = app.request(Method::GET, "/notes", Some(foreign.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/notes")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let app = TestApp::new();
    let payload = "x".repeat(MAX_BODY_BYTES + 1);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.store.user_count(), 0);
}
