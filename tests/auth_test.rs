mod common;

use common::*;
use piscinas::{
    auth::{SessionManager, bootstrap_admin},
    config::AdminBootstrap,
    storage::memory::memory_storage,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn admin_login_returns_tokens_and_roles() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    let body = json_body(assert_status(response, 200).await).await;

    assert_eq!(body["username"], ADMIN_USERNAME);
    assert_eq!(body["roles"], json!(["admin"]));
    assert!(!body["accessToken"].as_str().unwrap().is_empty());
    assert!(body["refreshToken"].is_string());
    assert!(body["expiresAt"].is_string());
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_rejected_alike() {
    let app = spawn_app().await;

    for (username, password) in [(ADMIN_USERNAME, "nope"), ("ghost", ADMIN_PASSWORD)] {
        let response = app
            .client
            .post(app.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_error(response, 401, "Invalid username or password").await;
    }
}

#[tokio::test]
async fn protected_routes_need_a_valid_bearer_token() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/auth/me")).send().await.unwrap();
    assert_error(response, 401, "Missing bearer token").await;

    let response = app.get("/auth/me", "not-a-jwt").await;
    assert_error(response, 401, "Invalid token").await;

    let response = app.get("/auth/me", &app.admin.token).await;
    let me = json_body(assert_status(response, 200).await).await;
    assert_eq!(me["uid"], app.admin.uid.as_str());
    assert_eq!(me["roles"], json!(["admin"]));
}

#[tokio::test]
async fn refresh_rotates_the_session_token() {
    let app = spawn_app().await;
    let old = app.admin.refresh_token.clone();

    let response = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "refreshToken": old }))
        .send()
        .await
        .unwrap();
    let body = json_body(assert_status(response, 200).await).await;
    let new = body["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(new, old);

    let response = app.get("/auth/me", body["accessToken"].as_str().unwrap()).await;
    assert_status(response, 200).await;

    let response = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "refreshToken": old }))
        .send()
        .await
        .unwrap();
    assert_error(response, 401, "Invalid refresh token").await;
}

#[tokio::test]
async fn logout_invalidates_the_refresh_token() {
    let app = spawn_app().await;

    let response = app
        .post(
            "/auth/logout",
            &app.admin.token,
            &json!({ "refreshToken": app.admin.refresh_token }),
        )
        .await;
    assert_status(response, 200).await;

    let response = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "refreshToken": app.admin.refresh_token }))
        .send()
        .await
        .unwrap();
    assert_status(response, 401).await;
}

#[tokio::test]
async fn logout_cannot_revoke_another_users_session() {
    let app = spawn_app().await;
    let (worker, _) = app.create_worker("pedro").await;

    let response = app
        .post(
            "/auth/logout",
            &worker.token,
            &json!({ "refreshToken": app.admin.refresh_token }),
        )
        .await;
    assert_status(response, 200).await;

    let response = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "refreshToken": app.admin.refresh_token }))
        .send()
        .await
        .unwrap();
    assert_status(response, 200).await;
}

#[tokio::test]
async fn only_admins_manage_users() {
    let app = spawn_app().await;
    let (worker, _) = app.create_worker("pedro").await;

    let me = json_body(app.get("/auth/me", &worker.token).await).await;
    assert_eq!(me["roles"], json!(["worker"]));

    let response = app
        .post(
            "/api/users",
            &worker.token,
            &json!({ "username": "eve", "password": "secret" }),
        )
        .await;
    assert_error(response, 403, "Administrator role required").await;

    let response = app
        .post(
            "/api/users",
            &app.admin.token,
            &json!({ "username": "laura", "password": "secret", "groups": ["Administradores"] }),
        )
        .await;
    let created = json_body(assert_status(response, 201).await).await;
    assert!(created.get("passwordHash").is_none());

    let laura = app.login("laura", "secret").await;
    let me = json_body(app.get("/auth/me", &laura.token).await).await;
    assert_eq!(me["roles"], json!(["admin"]));

    let response = app
        .post(
            "/api/users",
            &app.admin.token,
            &json!({ "username": "laura", "password": "other" }),
        )
        .await;
    assert_status(response, 409).await;

    let users = json_body(app.get("/api/users", &app.admin.token).await).await;
    assert_eq!(users.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn bootstrap_resets_an_existing_superuser() {
    let storage = memory_storage();
    let first = AdminBootstrap {
        username: "root".to_string(),
        password: "first".to_string(),
        email: None,
    };
    bootstrap_admin(&storage, Some(&first)).await.unwrap();

    let second = AdminBootstrap {
        password: "second".to_string(),
        email: Some("root@example.com".to_string()),
        ..first.clone()
    };
    bootstrap_admin(&storage, Some(&second)).await.unwrap();
    bootstrap_admin(&storage, None).await.unwrap();

    let users = storage.users.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0].is_superuser);
    assert_eq!(users[0].email.as_deref(), Some("root@example.com"));

    let sessions = SessionManager::new("secret", Arc::new(storage));
    assert!(sessions.login("root", "first", "test").await.is_err());
    let login = sessions.login("root", "second", "test").await.unwrap();
    let claims = sessions.verify_access_token(&login.access_token).unwrap();
    assert!(claims.is_admin());
    assert_eq!(claims.username, "root");
}
