#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Profile and account moderation tests.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use armeta_kernel::models::{Principal, Role};
use common::TestApp;

// =============================================================================
// Profiles
// =============================================================================

#[tokio::test]
async fn own_profile_registers_a_token_only_user() {
    let app = TestApp::new();
    let newcomer = Principal {
        user_id: Uuid::now_v7(),
        name: "Dewi".into(),
        email: "dewi@campus.test".into(),
        role: Role::User,
        is_banned: false,
    };

    let (status, _) = app.get("/api/users/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .get("/api/users/profile", Some(&app.token(&newcomer)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], newcomer.user_id.to_string());
    assert_eq!(body["data"]["email"], "dewi@campus.test");
    assert_eq!(body["data"]["role"], "user");
    assert_eq!(body["data"]["is_banned"], false);
    assert_eq!(body["data"]["poin"], 0);
}

#[tokio::test]
async fn public_profile_hides_email() {
    let app = TestApp::new();
    let rina = app.user("Rina");

    let (status, body) = app.get(&format!("/api/users/{}", rina.user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Rina");
    assert_eq!(body["data"]["image"], "https://cdn.campus.test/rina.png");
    assert!(body["data"].get("email").is_none());
    assert!(body["data"].get("role").is_none());

    let (status, body) = app.get(&format!("/api/users/{}", Uuid::now_v7()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "user not found");

    let (status, _) = app.get("/api/users/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Admin dashboard
// =============================================================================

#[tokio::test]
async fn stats_count_users_content_and_pending_reports() {
    let app = TestApp::new();
    let rina = app.user("Rina");
    let budi = app.user("Budi");
    let admin = app.admin("Admin");
    let subject = app.subject("Algorithms");
    let review = app.review(&rina, subject, "first", 0);
    app.review(&budi, subject, "second", 1);
    app.forum(&rina, subject, "thread", 2);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/reports",
            Some(&app.token(&budi)),
            Some(json!({ "type": "spam", "id_review": review })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.get("/api/admin/stats", Some(&app.token(&rina))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get("/api/admin/stats", Some(&app.token(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "totalUsers": 3,
            "totalReviews": 2,
            "totalForums": 1,
            "pendingReports": 1
        })
    );
}

#[tokio::test]
async fn admin_lists_every_account() {
    let app = TestApp::new();
    app.user("Rina");
    app.user("Budi");
    let admin = app.admin("Admin");

    let (status, _) = app.get("/api/admin/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/admin/users", Some(&app.token(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 3);
    assert!(
        users
            .iter()
            .any(|u| u["email"] == "budi@campus.test" && u["role"] == "user")
    );
}

// =============================================================================
// Moderation
// =============================================================================

#[tokio::test]
async fn ban_applies_to_existing_tokens_and_can_be_lifted() {
    let app = TestApp::new();
    let troll = app.user("Troll");
    let admin = app.admin("Admin");
    let troll_token = app.token(&troll);
    let admin_token = app.token(&admin);
    let uri = format!("/api/admin/users/{}/ban", troll.user_id);

    let (status, _) = app.send(Method::PATCH, &uri, Some(&troll_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::PATCH, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User banned successfully");
    assert_eq!(body["data"]["is_banned"], true);

    // The token was issued before the ban and still claims a clean account
    let (status, _) = app.get("/api/reviews", Some(&troll_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::PATCH, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User unbanned successfully");

    let (status, _) = app.get("/api/reviews", Some(&troll_token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/admin/users/{}/ban", Uuid::now_v7()),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn role_changes_take_effect_on_next_request() {
    let app = TestApp::new();
    let budi = app.user("Budi");
    let admin = app.admin("Admin");
    let budi_token = app.token(&budi);
    let admin_token = app.token(&admin);
    let uri = format!("/api/admin/users/{}/role", budi.user_id);

    let (status, body) = app
        .send(
            Method::PATCH,
            &uri,
            Some(&admin_token),
            Some(json!({ "role": "moderator" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid role: moderator");

    let (status, _) = app.get("/api/admin/stats", Some(&budi_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PATCH,
            &uri,
            Some(&admin_token),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");

    let (status, _) = app.get("/api/admin/stats", Some(&budi_token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/admin/users/{}/role", admin.user_id),
            Some(&budi_token),
            Some(json!({ "role": "user" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/admin/users", Some(&admin_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn writes_keep_moderation_state() {
    let app = TestApp::new();
    let budi = app.user("Budi");
    let admin = app.admin("Admin");
    let subject = app.subject("Algorithms");

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/admin/users/{}/role", budi.user_id),
            Some(&app.token(&admin)),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Posting upserts the author from a token that still claims "user"
    let (status, _) = app
        .send(
            Method::POST,
            "/api/reviews",
            Some(&app.token(&budi)),
            Some(json!({ "id_subject": subject, "body": "Solid course." })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get("/api/users/profile", Some(&app.token(&budi))).await;
    assert_eq!(body["data"]["role"], "admin");
}
