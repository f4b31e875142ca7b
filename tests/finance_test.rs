mod common;

use common::*;
use serde_json::json;
use time::Duration;

#[tokio::test]
async fn income_crud_and_date_filter() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    let client_id = app.create_client("Ana Mora").await;

    let mut created = Vec::new();
    for (concept, date) in [("Pago enero", "2024-01-31"), ("Pago febrero", "2024-02-29")] {
        let response = app
            .post(
                "/api/incomes",
                token,
                &json!({ "clientId": client_id, "concept": concept, "totalCents": 80_00, "date": date }),
            )
            .await;
        created.push(
            json_body(assert_status(response, 201).await).await["id"]
                .as_i64()
                .unwrap(),
        );
    }

    let february = json_body(
        app.get("/api/incomes?from=2024-02-01&to=2024-02-29", token)
            .await,
    )
    .await;
    assert_eq!(ids(&february), vec![created[1]]);

    let response = app
        .put(
            &format!("/api/incomes/{}", created[0]),
            token,
            &json!({ "concept": "Pago enero (parcial)", "totalCents": 40_00, "date": "2024-01-31" }),
        )
        .await;
    let updated = json_body(assert_status(response, 200).await).await;
    assert_eq!(updated["totalCents"], 4000);
    assert!(updated["clientId"].is_null());

    let response = app.delete(&format!("/api/incomes/{}", created[0]), token).await;
    assert_status(response, 204).await;
    let response = app.get(&format!("/api/incomes/{}", created[0]), token).await;
    assert_error(response, 404, "Income not found").await;
}

#[tokio::test]
async fn income_validation() {
    let app = spawn_app().await;
    let token = &app.admin.token;

    let response = app
        .post(
            "/api/incomes",
            token,
            &json!({ "clientId": 9999, "concept": "Pago", "totalCents": 100, "date": "2024-01-01" }),
        )
        .await;
    assert_error(response, 400, "Client does not exist").await;

    let response = app
        .post(
            "/api/incomes",
            token,
            &json!({ "concept": " ", "totalCents": 100, "date": "2024-01-01" }),
        )
        .await;
    assert_error(response, 400, "Concept is required").await;

    let response = app
        .post(
            "/api/incomes",
            token,
            &json!({ "concept": "Pago", "totalCents": -5, "date": "2024-01-01" }),
        )
        .await;
    assert_error(response, 400, "Total cannot be negative").await;
}

#[tokio::test]
async fn recurring_movement_crud() {
    let app = spawn_app().await;
    let token = &app.admin.token;

    let response = app
        .post(
            "/api/recurring",
            token,
            &json!({ "kind": "egreso", "concept": "Arriendo bodega", "amountCents": 300_00, "nextDate": "2024-03-05" }),
        )
        .await;
    let movement = json_body(assert_status(response, 201).await).await;
    assert_eq!(movement["frequency"], "mensual");
    assert_eq!(movement["active"], true);
    let path = format!("/api/recurring/{}", movement["id"]);

    let response = app
        .put(
            &path,
            token,
            &json!({
                "kind": "egreso",
                "concept": "Arriendo bodega",
                "amountCents": 320_00,
                "frequency": "semanal",
                "nextDate": "2024-03-05",
                "active": false,
            }),
        )
        .await;
    let updated = json_body(assert_status(response, 200).await).await;
    assert_eq!(updated["frequency"], "semanal");
    assert_eq!(updated["active"], false);

    let listed = json_body(app.get("/api/recurring", token).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = app
        .post(
            "/api/recurring",
            token,
            &json!({ "kind": "ingreso", "concept": "Bono", "amountCents": -1, "nextDate": "2024-03-05" }),
        )
        .await;
    assert_error(response, 400, "Amount cannot be negative").await;

    assert_status(app.delete(&path, token).await, 204).await;
    assert_error(
        app.get(&path, token).await,
        404,
        "Recurring movement not found",
    )
    .await;
}

#[tokio::test]
async fn summary_combines_ledger_incomes_and_projections() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    let today = app.today();
    let to = today + Duration::days(13);

    app.post(
        "/api/incomes",
        token,
        &json!({ "concept": "Pago", "totalCents": 100_00, "date": iso(today) }),
    )
    .await;
    app.post(
        "/api/incomes",
        token,
        &json!({ "concept": "Fuera de rango", "totalCents": 999_00, "date": iso(to + Duration::days(1)) }),
    )
    .await;

    let supply = app.create_supply("Cloro granulado", 10, 4_50).await;
    let (_, visit) = app.visit(today, &[]).await;
    app.post(
        &format!("/api/maintenances/{}/usages", visit["id"]),
        token,
        &json!({ "supplyId": supply, "quantity": 3 }),
    )
    .await;

    app.post(
        "/api/recurring",
        token,
        &json!({ "kind": "ingreso", "concept": "Mantenimiento semanal", "amountCents": 10_00, "frequency": "semanal", "nextDate": iso(today) }),
    )
    .await;
    app.post(
        "/api/recurring",
        token,
        &json!({ "kind": "egreso", "concept": "Arriendo", "amountCents": 50_00, "nextDate": iso(today + Duration::days(1)) }),
    )
    .await;
    app.post(
        "/api/recurring",
        token,
        &json!({ "kind": "egreso", "concept": "Pausado", "amountCents": 70_00, "nextDate": iso(today), "active": false }),
    )
    .await;

    let response = app
        .get(
            &format!("/api/finance/summary?from={}&to={}", iso(today), iso(to)),
            token,
        )
        .await;
    let summary = json_body(assert_status(response, 200).await).await;

    assert_eq!(summary["from"], iso(today));
    assert_eq!(summary["to"], iso(to));
    assert_eq!(summary["incomesCents"], 100_00);
    assert_eq!(summary["expensesCents"], 13_50);
    assert_eq!(summary["recurringIncomeCents"], 20_00);
    assert_eq!(summary["recurringExpenseCents"], 50_00);
    assert_eq!(summary["balanceCents"], 56_50);
}

#[tokio::test]
async fn summary_defaults_to_the_current_month() {
    let app = spawn_app().await;
    let today = app.today();

    let response = app.get("/api/finance/summary", &app.admin.token).await;
    let summary = json_body(assert_status(response, 200).await).await;

    let first = today.replace_day(1).unwrap();
    assert_eq!(summary["from"], iso(first));
    let to = summary["to"].as_str().unwrap().to_string();
    assert!(to >= iso(today));
    assert_eq!(&to[..7], &iso(today)[..7]);
    assert_eq!(summary["balanceCents"], 0);
}

#[tokio::test]
async fn summary_rejects_inverted_ranges() {
    let app = spawn_app().await;

    let response = app
        .get(
            "/api/finance/summary?from=2024-03-10&to=2024-03-01",
            &app.admin.token,
        )
        .await;
    assert_error(response, 400, "'from' must not be after 'to'").await;
}

#[tokio::test]
async fn finance_is_admin_only() {
    let app = spawn_app().await;
    let (worker, _) = app.create_worker("pedro").await;

    for path in ["/api/incomes", "/api/recurring", "/api/finance/summary", "/api/expenses"] {
        assert_status(app.get(path, &worker.token).await, 403).await;
    }
}

#[tokio::test]
async fn oversized_amounts_are_rejected() {
    let app = spawn_app().await;
    let token = &app.admin.token;

    let response = app
        .post(
            "/api/incomes",
            token,
            &json!({ "concept": "Pago", "totalCents": i64::MAX, "date": "2024-01-01" }),
        )
        .await;
    assert_error(response, 400, "Total is out of range").await;

    let response = app
        .post(
            "/api/recurring",
            token,
            &json!({ "kind": "ingreso", "concept": "Bono", "amountCents": i64::MAX, "nextDate": "2024-03-05" }),
        )
        .await;
    assert_error(response, 400, "Amount is out of range").await;
}
