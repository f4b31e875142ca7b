mod common;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use common::*;
use serde_json::json;

#[tokio::test]
async fn public_key_is_an_uncompressed_p256_point() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/dashboard/push/public-key"))
        .send()
        .await
        .unwrap();
    let body = json_body(assert_status(response, 200).await).await;
    let key = URL_SAFE_NO_PAD
        .decode(body["publicKey"].as_str().unwrap())
        .unwrap();
    assert_eq!(key.len(), 65);
    assert_eq!(key[0], 0x04);
}

#[tokio::test]
async fn subscribing_twice_updates_the_same_record() {
    let app = spawn_app().await;
    let (worker, _) = app.create_worker("pedro").await;
    let endpoint = "https://push.example.com/device-1";

    let response = app
        .post("/dashboard/push/subscribe", &app.admin.token, &subscription(endpoint))
        .await;
    let first = json_body(assert_status(response, 200).await).await;
    assert_eq!(first["ok"], true);
    assert_eq!(first["created"], true);

    // Same browser, now logged in as someone else.
    let response = app
        .post("/dashboard/push/subscribe", &worker.token, &subscription(endpoint))
        .await;
    let second = json_body(assert_status(response, 200).await).await;
    assert_eq!(second["created"], false);
    assert_eq!(second["id"], first["id"]);

    let report = json_body(
        app.post("/dashboard/push/test", &app.admin.token, &json!({}))
            .await,
    )
    .await;
    assert_eq!(report["attempted"], 0);

    let report = json_body(
        app.post("/dashboard/push/test", &worker.token, &json!({}))
            .await,
    )
    .await;
    assert_eq!(report["sent"], 1);
    assert_eq!(app.push.sent(), vec![endpoint]);
}

#[tokio::test]
async fn incomplete_subscriptions_are_rejected() {
    let app = spawn_app().await;
    let token = &app.admin.token;

    for body in [
        json!({}),
        json!({ "endpoint": "https://push.example.com/x" }),
        json!({ "endpoint": "https://push.example.com/x", "keys": { "p256dh": "abc" } }),
        json!({ "endpoint": " ", "keys": { "p256dh": "abc", "auth": "def" } }),
    ] {
        let response = app.post("/dashboard/push/subscribe", token, &body).await;
        assert_error(response, 400, "Incomplete subscription (endpoint/keys)").await;
    }

    let response = app
        .client
        .post(app.url("/dashboard/push/subscribe"))
        .bearer_auth(token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_status(response, 400).await;
}

#[tokio::test]
async fn subscribing_requires_login() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/dashboard/push/subscribe"))
        .json(&subscription("https://push.example.com/anon"))
        .send()
        .await
        .unwrap();
    assert_status(response, 401).await;
}

#[tokio::test]
async fn gone_endpoints_are_pruned() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    let stale = "https://push.example.com/stale";
    let fresh = "https://push.example.com/fresh";
    app.post("/dashboard/push/subscribe", token, &subscription(stale))
        .await;
    app.post("/dashboard/push/subscribe", token, &subscription(fresh))
        .await;
    app.push.expire(stale);

    let report = json_body(app.post("/dashboard/push/test", token, &json!({})).await).await;
    assert_eq!(
        report,
        json!({ "attempted": 2, "sent": 1, "failed": 0, "pruned": 1 })
    );

    let report = json_body(app.post("/dashboard/push/test", token, &json!({})).await).await;
    assert_eq!(report["attempted"], 1);
    assert_eq!(app.push.sent(), vec![fresh, fresh]);
}

#[tokio::test]
async fn undeliverable_messages_count_as_failed_and_are_kept() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    app.post(
        "/dashboard/push/subscribe",
        token,
        &json!({
            "endpoint": "https://push.example.com/broken",
            "keys": { "p256dh": "bm90LWEta2V5", "auth": "YmFk" }
        }),
    )
    .await;

    for _ in 0..2 {
        let report = json_body(app.post("/dashboard/push/test", token, &json!({})).await).await;
        assert_eq!(report["attempted"], 1);
        assert_eq!(report["failed"], 1);
    }
}

#[tokio::test]
async fn unsubscribe_only_touches_own_endpoints() {
    let app = spawn_app().await;
    let (worker, _) = app.create_worker("pedro").await;
    let endpoint = "https://push.example.com/admin-phone";
    app.post(
        "/dashboard/push/subscribe",
        &app.admin.token,
        &subscription(endpoint),
    )
    .await;

    let response = app
        .post(
            "/dashboard/push/unsubscribe",
            &worker.token,
            &json!({ "endpoint": endpoint }),
        )
        .await;
    let body = json_body(assert_status(response, 200).await).await;
    assert_eq!(body["deleted"], false);

    let response = app
        .post(
            "/dashboard/push/unsubscribe",
            &app.admin.token,
            &json!({ "endpoint": endpoint }),
        )
        .await;
    let body = json_body(assert_status(response, 200).await).await;
    assert_eq!(body, json!({ "ok": true, "deleted": true }));
}

#[tokio::test]
async fn broadcast_by_audience() {
    let app = spawn_app().await;
    let (pedro, _) = app.create_worker("pedro").await;
    app.post(
        "/dashboard/push/subscribe",
        &app.admin.token,
        &subscription("https://push.example.com/admin"),
    )
    .await;
    app.post(
        "/dashboard/push/subscribe",
        &pedro.token,
        &subscription("https://push.example.com/pedro"),
    )
    .await;

    let send = |audience: &str| {
        json!({ "title": "Aviso", "body": "Cambio de horario", "audience": audience })
    };

    let report = json_body(
        app.post("/dashboard/push/send", &app.admin.token, &send("workers"))
            .await,
    )
    .await;
    assert_eq!(report["sent"], 1);
    assert_eq!(app.push.sent(), vec!["https://push.example.com/pedro"]);

    let report = json_body(
        app.post("/dashboard/push/send", &app.admin.token, &send("admins"))
            .await,
    )
    .await;
    assert_eq!(report["sent"], 1);

    let report = json_body(
        app.post("/dashboard/push/send", &app.admin.token, &send("all"))
            .await,
    )
    .await;
    assert_eq!(report["sent"], 2);

    let response = app
        .post("/dashboard/push/send", &app.admin.token, &send("users"))
        .await;
    assert_error(response, 400, "uids is required for audience 'users'").await;

    let mut targeted = send("users");
    targeted["uids"] = json!([pedro.uid]);
    let report = json_body(
        app.post("/dashboard/push/send", &app.admin.token, &targeted)
            .await,
    )
    .await;
    assert_eq!(report["sent"], 1);

    let response = app
        .post("/dashboard/push/send", &pedro.token, &send("all"))
        .await;
    assert_error(response, 403, "Administrator role required").await;
}
