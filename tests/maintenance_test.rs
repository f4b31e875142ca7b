mod common;

use common::*;
use serde_json::json;
use time::Duration;

#[tokio::test]
async fn scheduling_validates_contract_client_and_workers() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    let client_id = app.create_client("Ana Mora").await;
    let other_client = app.create_client("Beto Paz").await;
    let contract_id = app.create_contract(client_id, 80_00).await;
    let date = iso(app.today());

    let response = app
        .post(
            "/api/maintenances",
            token,
            &json!({ "contractId": 9999, "date": date }),
        )
        .await;
    assert_error(response, 400, "Contract does not exist").await;

    let response = app
        .post(
            "/api/maintenances",
            token,
            &json!({ "contractId": contract_id, "clientId": other_client, "date": date }),
        )
        .await;
    assert_error(response, 400, "Client does not match the contract").await;

    let response = app
        .post(
            "/api/maintenances",
            token,
            &json!({ "contractId": contract_id, "date": date, "workerIds": [4242] }),
        )
        .await;
    assert_error(response, 400, "Worker 4242 does not exist").await;

    let response = app
        .post(
            "/api/maintenances",
            token,
            &json!({ "contractId": contract_id, "date": date, "notes": "Portón azul" }),
        )
        .await;
    let visit = json_body(assert_status(response, 201).await).await;
    assert_eq!(visit["clientId"], client_id);
    assert_eq!(visit["status"], "pendiente");
    assert_eq!(visit["notes"], "Portón azul");
}

#[tokio::test]
async fn workers_only_see_their_own_visits() {
    let app = spawn_app().await;
    let (pedro, pedro_id) = app.create_worker("pedro").await;
    let (maria, maria_id) = app.create_worker("maria").await;
    let client_id = app.create_client("Ana Mora").await;
    let contract_id = app.create_contract(client_id, 80_00).await;
    let today = app.today();

    let mine = app.schedule(contract_id, today, &[pedro_id]).await;
    let shared = app
        .schedule(contract_id, today + Duration::days(1), &[pedro_id, maria_id])
        .await;
    let theirs = app.schedule(contract_id, today, &[maria_id]).await;

    let listed = json_body(app.get("/api/maintenances", &pedro.token).await).await;
    assert_eq!(
        ids(&listed),
        vec![mine["id"].as_i64().unwrap(), shared["id"].as_i64().unwrap()]
    );

    let response = app
        .get(
            &format!("/api/maintenances?workerId={}", maria_id),
            &pedro.token,
        )
        .await;
    let listed = json_body(assert_status(response, 200).await).await;
    assert_eq!(ids(&listed).len(), 2);

    let response = app
        .get(&format!("/api/maintenances/{}", theirs["id"]), &pedro.token)
        .await;
    assert_error(response, 403, "Maintenance is not assigned to you").await;

    let response = app
        .get(&format!("/api/maintenances/{}", shared["id"]), &maria.token)
        .await;
    assert_status(response, 200).await;

    let all = json_body(app.get("/api/maintenances", &app.admin.token).await).await;
    assert_eq!(ids(&all).len(), 3);
}

#[tokio::test]
async fn visits_filter_by_date_and_status() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    let today = app.today();
    let (contract_id, first) = app.visit(today, &[]).await;
    let later = app
        .schedule(contract_id, today + Duration::days(7), &[])
        .await;

    let on_day = json_body(
        app.get(&format!("/api/maintenances?date={}", iso(today)), token)
            .await,
    )
    .await;
    assert_eq!(ids(&on_day), vec![first["id"].as_i64().unwrap()]);

    app.post(
        &format!("/api/maintenances/{}/complete", first["id"]),
        token,
        &json!({}),
    )
    .await;

    let pending = json_body(app.get("/api/maintenances?status=pendiente", token).await).await;
    assert_eq!(ids(&pending), vec![later["id"].as_i64().unwrap()]);

    let range = json_body(
        app.get(
            &format!(
                "/api/maintenances?from={}&to={}",
                iso(today + Duration::days(1)),
                iso(today + Duration::days(30))
            ),
            token,
        )
        .await,
    )
    .await;
    assert_eq!(ids(&range), vec![later["id"].as_i64().unwrap()]);
}

#[tokio::test]
async fn assigning_workers_pushes_to_their_devices() {
    let app = spawn_app().await;
    let (pedro, pedro_id) = app.create_worker("pedro").await;
    let (maria, maria_id) = app.create_worker("maria").await;
    app.post(
        "/dashboard/push/subscribe",
        &pedro.token,
        &subscription("https://push.example.com/pedro"),
    )
    .await;
    app.post(
        "/dashboard/push/subscribe",
        &maria.token,
        &subscription("https://push.example.com/maria"),
    )
    .await;

    let (_, visit) = app.visit(app.today(), &[pedro_id]).await;
    assert_eq!(app.push.sent(), vec!["https://push.example.com/pedro"]);

    let response = app
        .put(
            &format!("/api/maintenances/{}", visit["id"]),
            &app.admin.token,
            &json!({ "workerIds": [pedro_id, maria_id] }),
        )
        .await;
    let updated = json_body(assert_status(response, 200).await).await;
    assert_eq!(updated["workerIds"], json!([pedro_id, maria_id]));
    assert_eq!(
        app.push.sent(),
        vec![
            "https://push.example.com/pedro",
            "https://push.example.com/maria"
        ]
    );
}

#[tokio::test]
async fn push_failures_do_not_fail_scheduling() {
    let app = spawn_app().await;
    let (pedro, pedro_id) = app.create_worker("pedro").await;
    app.post(
        "/dashboard/push/subscribe",
        &pedro.token,
        &json!({
            "endpoint": "https://push.example.com/broken",
            "keys": { "p256dh": "not-a-key", "auth": "bad" }
        }),
    )
    .await;

    let (_, visit) = app.visit(app.today(), &[pedro_id]).await;
    assert_eq!(visit["workerIds"], json!([pedro_id]));
    assert!(app.push.sent().is_empty());
}

#[tokio::test]
async fn completing_a_visit_notifies_admins() {
    let app = spawn_app().await;
    let (pedro, pedro_id) = app.create_worker("pedro").await;
    app.post(
        "/dashboard/push/subscribe",
        &app.admin.token,
        &subscription("https://push.example.com/admin"),
    )
    .await;
    let (_, visit) = app.visit(app.today(), &[pedro_id]).await;

    let response = app
        .post(
            &format!("/api/maintenances/{}/complete", visit["id"]),
            &pedro.token,
            &json!({}),
        )
        .await;
    let done = json_body(assert_status(response, 200).await).await;
    assert_eq!(done["status"], "realizado");
    assert_eq!(app.push.sent(), vec!["https://push.example.com/admin"]);
}

#[tokio::test]
async fn only_assigned_workers_complete_visits() {
    let app = spawn_app().await;
    let (maria, _) = app.create_worker("maria").await;
    let (_, visit) = app.visit(app.today(), &[]).await;

    let response = app
        .post(
            &format!("/api/maintenances/{}/complete", visit["id"]),
            &maria.token,
            &json!({}),
        )
        .await;
    assert_status(response, 403).await;

    let response = app
        .put(
            &format!("/api/maintenances/{}", visit["id"]),
            &maria.token,
            &json!({ "notes": "x" }),
        )
        .await;
    assert_error(response, 403, "Administrator role required").await;
}

#[tokio::test]
async fn checklist_items_are_ticked_by_the_assigned_worker() {
    let app = spawn_app().await;
    let (pedro, pedro_id) = app.create_worker("pedro").await;
    let (maria, _) = app.create_worker("maria").await;
    let (_, visit) = app.visit(app.today(), &[pedro_id]).await;

    let response = app
        .post(
            &format!("/api/maintenances/{}/checklist", visit["id"]),
            &app.admin.token,
            &json!({ "description": "Revisar bomba" }),
        )
        .await;
    let item = json_body(assert_status(response, 201).await).await;
    assert_eq!(item["done"], false);

    let path = format!("/api/checklist/{}", item["id"]);
    let response = app
        .patch(&path, &maria.token, &json!({ "done": true }))
        .await;
    assert_status(response, 403).await;

    let response = app
        .patch(
            &path,
            &pedro.token,
            &json!({ "done": true, "notes": "Ruido leve" }),
        )
        .await;
    let ticked = json_body(assert_status(response, 200).await).await;
    assert_eq!(ticked["done"], true);
    assert_eq!(ticked["notes"], "Ruido leve");

    let response = app
        .patch("/api/checklist/9999", &pedro.token, &json!({ "done": true }))
        .await;
    assert_error(response, 404, "Checklist item not found").await;
}

#[tokio::test]
async fn updating_a_missing_visit_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .put(
            "/api/maintenances/9999",
            &app.admin.token,
            &json!({ "notes": "x" }),
        )
        .await;
    assert_error(response, 404, "Maintenance not found").await;

    let response = app
        .delete("/api/maintenances/9999", &app.admin.token)
        .await;
    assert_status(response, 404).await;
}
