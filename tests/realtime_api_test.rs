mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use tower::ServiceExt;
use uuid::Uuid;

use common::{seed_booth, seed_brand, seed_user, TestApp};
use marketbooth_api::{auth::Role, events::RealtimeEvent};

async fn open_stream(
    app: &TestApp,
    uri: &str,
    token: Option<&str>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    app.router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn next_frame(body: &mut Body) -> String {
    let frame = body
        .frame()
        .await
        .expect("stream ended")
        .expect("stream errored");
    let data = frame.into_data().expect("expected data frame");
    String::from_utf8(data.to_vec()).unwrap()
}

#[tokio::test]
async fn stream_requires_authentication() {
    let app = TestApp::new().await;
    let uri = format!("/api/v1/realtime/events?brand_id={}", app.brand.id);

    let response = open_stream(&app, &uri, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.state.events.registry().client_count(), 0);
}

#[tokio::test]
async fn stream_rejects_foreign_brand_and_booth() {
    let app = TestApp::new().await;

    // admin of another brand
    let other_brand = seed_brand(&app.state, "Other Brand").await;
    let other_admin = seed_user(
        &app.state,
        Role::Admin,
        Some(other_brand.id),
        None,
        "other-admin@test.dev",
    )
    .await;
    let other_token = app
        .state
        .auth
        .generate_token(&other_admin)
        .unwrap()
        .access_token;

    let uri = format!("/api/v1/realtime/events?brand_id={}", app.brand.id);
    let response = open_stream(&app, &uri, Some(&other_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // staff must name their own booth
    let no_booth_uri = format!("/api/v1/realtime/events?brand_id={}", app.brand.id);
    let response = open_stream(&app, &no_booth_uri, Some(&app.staff_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let other_booth = seed_booth(&app.state, app.brand.id, "Other Booth").await;
    let wrong_booth_uri = format!(
        "/api/v1/realtime/events?brand_id={}&booth_id={}",
        app.brand.id, other_booth.id
    );
    let response = open_stream(&app, &wrong_booth_uri, Some(&app.staff_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert_eq!(app.state.events.registry().client_count(), 0);
}

#[tokio::test]
async fn stream_delivers_connected_frame_then_broadcasts() {
    let app = TestApp::new().await;
    let uri = format!(
        "/api/v1/realtime/events?brand_id={}&booth_id={}",
        app.brand.id, app.booth.id
    );

    let response = open_stream(&app, &uri, Some(&app.staff_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/event-stream")
    );

    let mut body = response.into_body();
    let first = next_frame(&mut body).await;
    assert!(first.starts_with("data: "));
    assert!(first.contains("\"connected\""));
    assert_eq!(app.state.events.registry().client_count(), 1);

    // A broadcast targeted at the booth reaches the open stream
    app.state.events.broadcast(&RealtimeEvent::stock_update(
        app.brand.id,
        app.booth.id,
        Uuid::new_v4(),
        "noodles",
        dec!(700),
        dec!(550),
    ));
    let frame = next_frame(&mut body).await;
    assert!(frame.contains("stock_update"));
    assert!(frame.contains("noodles"));

    // An event for a different booth does not
    app.state.events.broadcast(&RealtimeEvent::stock_update(
        app.brand.id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        "basil",
        dec!(10),
        dec!(5),
    ));
    // brand key still receives nothing: the client registered under its booth
    app.state.events.broadcast(&RealtimeEvent::stock_update(
        app.brand.id,
        app.booth.id,
        Uuid::new_v4(),
        "garlic",
        dec!(3),
        dec!(2),
    ));
    let frame = next_frame(&mut body).await;
    assert!(frame.contains("garlic"), "basil event must be skipped: {frame}");

    // Dropping the stream unregisters the client
    drop(body);
    app.wait_for(|| async { app.state.events.registry().client_count() == 0 })
        .await;
}

#[tokio::test]
async fn menu_stream_announces_client_id_and_fans_out() {
    let app = TestApp::new().await;
    let uri = format!("/api/v1/realtime/menu-events?brand_id={}", app.brand.id);

    let response = open_stream(&app, &uri, Some(&app.admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body();
    let first = next_frame(&mut body).await;
    assert!(first.contains("\"connected\""));
    assert!(first.contains("clientId"));

    let event = marketbooth_api::events::MenuEvent::menu_update(
        app.booth.id,
        serde_json::json!([{"name": "Pad Thai"}]),
    );
    assert_eq!(app.state.menu_events.broadcast_all(&event), 1);

    let frame = next_frame(&mut body).await;
    assert!(frame.contains("menu_update"));
    assert!(frame.contains("Pad Thai"));
}
