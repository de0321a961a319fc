mod common;

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use common::{seed_booth, seed_booth_stock, seed_ingredient, seed_menu_item, seed_user, TestApp, TEST_PASSWORD};
use marketbooth_api::auth::Role;

/// Decimals are serialized as strings on the wire; numbers can still
/// appear after database round trips, so accept both.
fn as_dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("not a decimal string"),
        Value::Number(n) => n.to_string().parse().expect("not a decimal number"),
        other => panic!("expected decimal, got {other}"),
    }
}

#[tokio::test]
async fn login_issues_token_and_cookie() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "admin@test.dev", "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["access_token"].as_str().expect("token missing");
    assert!(!token.is_empty());
    assert_eq!(body["data"]["user"]["role"], "admin");

    // the issued token works against a protected route
    let (status, body) = app.get("/api/v1/auth/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "admin@test.dev");

    // bad password is rejected
    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "admin@test.dev", "password": "nope-nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = TestApp::new().await;
    let (status, _) = app
        .request(Method::GET, "/api/v1/sales", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn staff_sells_at_own_booth_only() {
    let app = TestApp::new().await;

    let noodles =
        seed_ingredient(&app.state, app.brand.id, "noodles", "g", dec!(5000), dec!(0)).await;
    seed_booth_stock(&app.state, app.booth.id, noodles.id, dec!(1000)).await;
    let pad_thai = seed_menu_item(
        &app.state,
        app.brand.id,
        None,
        "Pad Thai",
        dec!(90),
        &[(noodles.id, dec!(150))],
    )
    .await;

    // own booth: accepted, total captured from the menu price
    let (status, body) = app
        .post(
            "/api/v1/sales",
            &app.staff_token,
            json!({
                "booth_id": app.booth.id,
                "items": [{ "menu_item_id": pad_thai.id, "quantity": 2 }],
                "payment_method": "cash",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(as_dec(&body["data"]["total_amount"]), dec!(180));
    assert_eq!(body["data"]["items"][0]["quantity"], 2);

    // reconciliation lands asynchronously
    app.wait_for(|| async {
        app.booth_stock(app.booth.id, noodles.id).await.used == dec!(300)
    })
    .await;

    // another booth: rejected
    let other_booth = seed_booth(&app.state, app.brand.id, "Other Booth").await;
    let (status, _) = app
        .post(
            "/api/v1/sales",
            &app.staff_token,
            json!({
                "booth_id": other_booth.id,
                "items": [{ "menu_item_id": pad_thai.id, "quantity": 1 }],
                "payment_method": "cash",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn staff_cannot_edit_or_delete_sales() {
    let app = TestApp::new().await;

    let noodles =
        seed_ingredient(&app.state, app.brand.id, "noodles", "g", dec!(5000), dec!(0)).await;
    let pad_thai = seed_menu_item(
        &app.state,
        app.brand.id,
        None,
        "Pad Thai",
        dec!(90),
        &[(noodles.id, dec!(150))],
    )
    .await;

    let (status, body) = app
        .post(
            "/api/v1/sales",
            &app.staff_token,
            json!({
                "booth_id": app.booth.id,
                "items": [{ "menu_item_id": pad_thai.id, "quantity": 1 }],
                "payment_method": "card",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let sale_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/v1/sales/{sale_id}"),
            Some(&app.staff_token),
            Some(json!({ "items": [{ "menu_item_id": pad_thai.id, "quantity": 3 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/sales/{sale_id}"),
            Some(&app.staff_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn purchase_and_allocation_flow() {
    let app = TestApp::new().await;

    let noodles =
        seed_ingredient(&app.state, app.brand.id, "noodles", "g", dec!(0), dec!(100)).await;

    // empty warehouse shows up in the low-stock listing
    let (status, body) = app
        .get("/api/v1/ingredients/low-stock", &app.admin_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // allocation without stock is rejected
    let (status, _) = app
        .post(
            &format!("/api/v1/booths/{}/stock/allocate", app.booth.id),
            &app.admin_token,
            json!({ "ingredient_id": noodles.id, "quantity": "500" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // purchase restocks the warehouse and books the expense
    let (status, body) = app
        .post(
            &format!("/api/v1/ingredients/{}/purchase", noodles.id),
            &app.admin_token,
            json!({ "quantity": "2000", "unit_cost": "0.05" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(app.ingredient(noodles.id).await.stock, dec!(2000));

    let (_, body) = app
        .get("/api/v1/accounting/summary", &app.admin_token)
        .await;
    assert_eq!(as_dec(&body["data"]["expense"]), dec!(100));

    // allocation now succeeds and moves stock to the booth
    let (status, body) = app
        .post(
            &format!("/api/v1/booths/{}/stock/allocate", app.booth.id),
            &app.admin_token,
            json!({ "ingredient_id": noodles.id, "quantity": "500" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(app.ingredient(noodles.id).await.stock, dec!(1500));
    let stock = app.booth_stock(app.booth.id, noodles.id).await;
    assert_eq!(stock.allocated, dec!(500));
    assert_eq!(stock.remaining, dec!(500));

    // the movement ledger recorded both steps
    let (_, body) = app
        .get("/api/v1/stock-movements", &app.admin_token)
        .await;
    let movements = body["data"]["items"].as_array().unwrap();
    assert_eq!(movements.len(), 2);
}

#[tokio::test]
async fn brand_isolation_is_enforced() {
    let app = TestApp::new().await;
    let noodles =
        seed_ingredient(&app.state, app.brand.id, "noodles", "g", dec!(100), dec!(0)).await;

    let other_brand = common::seed_brand(&app.state, "Other Brand").await;
    let other_admin = seed_user(
        &app.state,
        Role::Admin,
        Some(other_brand.id),
        None,
        "other@test.dev",
    )
    .await;
    let other_token = app
        .state
        .auth
        .generate_token(&other_admin)
        .unwrap()
        .access_token;

    let (status, _) = app
        .get(&format!("/api/v1/ingredients/{}", noodles.id), &other_token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // and the foreign brand's listing stays empty
    let (_, body) = app.get("/api/v1/ingredients", &other_token).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn sale_revenue_reaches_accounting_summary() {
    let app = TestApp::new().await;

    let noodles =
        seed_ingredient(&app.state, app.brand.id, "noodles", "g", dec!(5000), dec!(0)).await;
    seed_booth_stock(&app.state, app.booth.id, noodles.id, dec!(1000)).await;
    let pad_thai = seed_menu_item(
        &app.state,
        app.brand.id,
        None,
        "Pad Thai",
        dec!(90),
        &[(noodles.id, dec!(150))],
    )
    .await;

    let (status, _) = app
        .post(
            "/api/v1/sales",
            &app.staff_token,
            json!({
                "booth_id": app.booth.id,
                "items": [{ "menu_item_id": pad_thai.id, "quantity": 2 }],
                "payment_method": "qr_code",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    app.wait_for(|| async {
        let (_, body) = app
            .get("/api/v1/accounting/summary", &app.admin_token)
            .await;
        !body["data"]["income"].is_null() && as_dec(&body["data"]["income"]) == dec!(180)
    })
    .await;
}
