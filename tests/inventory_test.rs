mod common;

use common::*;
use serde_json::json;

#[tokio::test]
async fn supplies_flag_low_stock() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    let chlorine = app.create_supply("Cloro granulado", 10, 4_50).await;
    let acid = app.create_supply("Acido muriatico", 2, 3_00).await;

    let low = json_body(app.get("/api/supplies?lowStock=true", token).await).await;
    assert_eq!(ids(&low), vec![acid]);

    let all = json_body(app.get("/api/supplies", token).await).await;
    let mut all_ids = ids(&all);
    all_ids.sort_unstable();
    assert_eq!(all_ids, vec![chlorine, acid]);

    let response = app
        .post(
            "/api/supplies",
            token,
            &json!({ "name": "", "stock": 1, "priceCents": 100 }),
        )
        .await;
    assert_error(response, 400, "Supply name is required").await;
}

#[tokio::test]
async fn recording_usage_moves_stock_and_books_an_expense() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    let supply = app.create_supply("Cloro granulado", 10, 4_50).await;
    let (_, visit) = app.visit(app.today(), &[]).await;
    let visit_id = visit["id"].as_i64().unwrap();

    let response = app
        .post(
            &format!("/api/maintenances/{}/usages", visit_id),
            token,
            &json!({ "supplyId": supply, "quantity": 3 }),
        )
        .await;
    let usage = json_body(assert_status(response, 201).await).await;
    assert_eq!(usage["quantity"], 3);
    assert_eq!(app.stock(supply).await, 7);

    let expenses = json_body(
        app.get(&format!("/api/expenses?maintenanceId={}", visit_id), token)
            .await,
    )
    .await;
    assert_eq!(ids(&expenses), vec![usage["expenseId"].as_i64().unwrap()]);
    assert_eq!(expenses[0]["unitCostCents"], 450);
    assert_eq!(expenses[0]["totalCents"], 1350);
    assert_eq!(expenses[0]["date"], iso(app.today()));

    let detail = json_body(
        app.get(&format!("/api/maintenances/{}", visit_id), token)
            .await,
    )
    .await;
    assert_eq!(detail["totalExpensesCents"], 1350);
    assert_eq!(detail["usages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn expenses_keep_the_price_paid_at_the_time() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    let supply = app.create_supply("Cloro granulado", 10, 4_50).await;
    let (_, visit) = app.visit(app.today(), &[]).await;
    let visit_id = visit["id"].as_i64().unwrap();

    let usage = json_body(
        app.post(
            &format!("/api/maintenances/{}/usages", visit_id),
            token,
            &json!({ "supplyId": supply, "quantity": 2 }),
        )
        .await,
    )
    .await;

    app.put(
        &format!("/api/supplies/{}", supply),
        token,
        &json!({ "name": "Cloro granulado", "stock": 8, "minStock": 2, "priceCents": 9_00 }),
    )
    .await;

    let response = app
        .put(
            &format!("/api/usages/{}", usage["id"]),
            token,
            &json!({ "quantity": 5 }),
        )
        .await;
    assert_status(response, 200).await;
    assert_eq!(app.stock(supply).await, 5);

    let expenses = json_body(app.get("/api/expenses", token).await).await;
    assert_eq!(expenses[0]["quantity"], 5);
    assert_eq!(expenses[0]["unitCostCents"], 450);
    assert_eq!(expenses[0]["totalCents"], 2250);
}

#[tokio::test]
async fn insufficient_stock_is_a_conflict_and_changes_nothing() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    let supply = app.create_supply("Cloro granulado", 2, 4_50).await;
    let (_, visit) = app.visit(app.today(), &[]).await;
    let path = format!("/api/maintenances/{}/usages", visit["id"]);

    let response = app
        .post(&path, token, &json!({ "supplyId": supply, "quantity": 3 }))
        .await;
    assert_error(response, 409, "Insufficient stock for Cloro granulado").await;
    assert_eq!(app.stock(supply).await, 2);

    let expenses = json_body(app.get("/api/expenses", token).await).await;
    assert!(expenses.as_array().unwrap().is_empty());

    let usage = json_body(
        app.post(&path, token, &json!({ "supplyId": supply, "quantity": 2 }))
            .await,
    )
    .await;
    assert_eq!(app.stock(supply).await, 0);

    let response = app
        .put(
            &format!("/api/usages/{}", usage["id"]),
            token,
            &json!({ "quantity": 3 }),
        )
        .await;
    assert_status(response, 409).await;
    assert_eq!(app.stock(supply).await, 0);
}

#[tokio::test]
async fn quantities_must_be_positive() {
    let app = spawn_app().await;
    let supply = app.create_supply("Cloro granulado", 5, 4_50).await;
    let (_, visit) = app.visit(app.today(), &[]).await;

    for quantity in [0, -2] {
        let response = app
            .post(
                &format!("/api/maintenances/{}/usages", visit["id"]),
                &app.admin.token,
                &json!({ "supplyId": supply, "quantity": quantity }),
            )
            .await;
        assert_error(response, 400, "Quantity must be greater than zero").await;
    }
    assert_eq!(app.stock(supply).await, 5);
}

#[tokio::test]
async fn unknown_supply_or_visit_is_not_found() {
    let app = spawn_app().await;
    let supply = app.create_supply("Cloro granulado", 5, 4_50).await;
    let (_, visit) = app.visit(app.today(), &[]).await;

    let response = app
        .post(
            &format!("/api/maintenances/{}/usages", visit["id"]),
            &app.admin.token,
            &json!({ "supplyId": 9999, "quantity": 1 }),
        )
        .await;
    assert_error(response, 404, "Supply not found").await;

    let response = app
        .post(
            "/api/maintenances/9999/usages",
            &app.admin.token,
            &json!({ "supplyId": supply, "quantity": 1 }),
        )
        .await;
    assert_error(response, 404, "Maintenance not found").await;
}

#[tokio::test]
async fn removing_usage_or_expense_restores_stock() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    let supply = app.create_supply("Cloro granulado", 10, 4_50).await;
    let (_, visit) = app.visit(app.today(), &[]).await;
    let path = format!("/api/maintenances/{}/usages", visit["id"]);

    let first = json_body(
        app.post(&path, token, &json!({ "supplyId": supply, "quantity": 3 }))
            .await,
    )
    .await;
    let second = json_body(
        app.post(&path, token, &json!({ "supplyId": supply, "quantity": 4 }))
            .await,
    )
    .await;
    assert_eq!(app.stock(supply).await, 3);

    let response = app
        .delete(&format!("/api/usages/{}", first["id"]), token)
        .await;
    assert_status(response, 204).await;
    assert_eq!(app.stock(supply).await, 6);

    let response = app
        .delete(&format!("/api/expenses/{}", second["expenseId"]), token)
        .await;
    assert_status(response, 204).await;
    assert_eq!(app.stock(supply).await, 10);

    let response = app
        .delete(&format!("/api/usages/{}", second["id"]), token)
        .await;
    assert_error(response, 404, "Usage not found").await;
    let expenses = json_body(app.get("/api/expenses", token).await).await;
    assert!(expenses.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_visit_restores_stock() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    let supply = app.create_supply("Cloro granulado", 10, 4_50).await;
    let (_, visit) = app.visit(app.today(), &[]).await;

    app.post(
        &format!("/api/maintenances/{}/usages", visit["id"]),
        token,
        &json!({ "supplyId": supply, "quantity": 6 }),
    )
    .await;
    assert_eq!(app.stock(supply).await, 4);

    let response = app
        .delete(&format!("/api/maintenances/{}", visit["id"]), token)
        .await;
    assert_status(response, 204).await;
    assert_eq!(app.stock(supply).await, 10);
}

#[tokio::test]
async fn used_supplies_cannot_be_deleted() {
    let app = spawn_app().await;
    let token = &app.admin.token;
    let supply = app.create_supply("Cloro granulado", 10, 4_50).await;
    let (_, visit) = app.visit(app.today(), &[]).await;
    app.post(
        &format!("/api/maintenances/{}/usages", visit["id"]),
        token,
        &json!({ "supplyId": supply, "quantity": 1 }),
    )
    .await;

    let response = app.delete(&format!("/api/supplies/{}", supply), token).await;
    assert_error(response, 409, "Supply is referenced by expenses").await;

    let unused = app.create_supply("Alguicida", 3, 7_00).await;
    let response = app.delete(&format!("/api/supplies/{}", unused), token).await;
    assert_status(response, 204).await;
}

#[tokio::test]
async fn workers_record_usage_only_on_their_visits() {
    let app = spawn_app().await;
    let (pedro, pedro_id) = app.create_worker("pedro").await;
    let (maria, _) = app.create_worker("maria").await;
    let supply = app.create_supply("Cloro granulado", 10, 4_50).await;
    let (_, visit) = app.visit(app.today(), &[pedro_id]).await;
    let path = format!("/api/maintenances/{}/usages", visit["id"]);

    let response = app
        .post(&path, &maria.token, &json!({ "supplyId": supply, "quantity": 1 }))
        .await;
    assert_error(response, 403, "Maintenance is not assigned to you").await;

    let response = app
        .post(&path, &pedro.token, &json!({ "supplyId": supply, "quantity": 1 }))
        .await;
    assert_status(response, 201).await;
    assert_eq!(app.stock(supply).await, 9);

    let response = app.get("/api/expenses", &pedro.token).await;
    assert_status(response, 403).await;
}

#[tokio::test]
async fn oversized_amounts_are_rejected_without_touching_stock() {
    let app = spawn_app().await;
    let token = &app.admin.token;

    let response = app
        .post(
            "/api/supplies",
            token,
            &json!({ "name": "Cloro", "stock": i64::MAX, "priceCents": 2 }),
        )
        .await;
    assert_error(response, 400, "Stock is out of range").await;

    let response = app
        .post(
            "/api/supplies",
            token,
            &json!({ "name": "Cloro", "stock": 1, "priceCents": i64::MAX }),
        )
        .await;
    assert_error(response, 400, "Price is out of range").await;

    let supply = app.create_supply("Cloro granulado", 10, 2).await;
    let (_, visit) = app.visit(app.today(), &[]).await;
    let response = app
        .post(
            &format!("/api/maintenances/{}/usages", visit["id"]),
            token,
            &json!({ "supplyId": supply, "quantity": 5_000_000_000_000_000_000_i64 }),
        )
        .await;
    assert_error(response, 400, "Quantity is out of range").await;
    assert_eq!(app.stock(supply).await, 10);
}
