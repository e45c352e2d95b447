mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{checkout_payload, spawn_app, TestApp};

async fn place_order(app: &TestApp, token: &str, product_id: i32) -> i64 {
    let body = app
        .client
        .post(app.url("/orders/checkout"))
        .bearer_auth(token)
        .json(&checkout_payload(json!([{ "product_id": product_id, "quantity": 1 }])))
        .send()
        .await
        .expect("Failed to send checkout request")
        .json::<Value>()
        .await
        .expect("Failed to parse checkout response JSON");

    body["order_id"].as_i64().expect("Order id missing")
}

async fn set_status(app: &TestApp, admin: &str, order_id: i64, status: &str) -> reqwest::Response {
    app.client
        .put(app.url(&format!("/admin/orders/{order_id}/status")))
        .bearer_auth(admin)
        .json(&json!({ "status": status }))
        .send()
        .await
        .expect("Failed to send status request")
}

async fn cancel(app: &TestApp, token: &str, order_id: i64) -> reqwest::Response {
    app.client
        .delete(app.url(&format!("/orders/{order_id}/cancel")))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send cancel request")
}

#[tokio::test]
async fn test_full_lifecycle() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.customer_token("life@shop.test").await;
    let product_id = app.create_product(&admin, "1.00", 5).await;
    let order_id = place_order(&app, &token, product_id).await;

    for status in ["processing", "shipped", "delivered"] {
        let response = set_status(&app, &admin, order_id, status).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.json::<Value>().await.unwrap()["order"]["status"], status);
    }

    let backwards = set_status(&app, &admin, order_id, "processing").await;
    assert_eq!(backwards.status(), StatusCode::CONFLICT);
    assert_eq!(
        backwards.json::<Value>().await.unwrap()["kind"],
        "invalid_status_transition"
    );
}

#[tokio::test]
async fn test_skipping_and_repeating_states_rejected() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.customer_token("skip@shop.test").await;
    let product_id = app.create_product(&admin, "1.00", 5).await;
    let order_id = place_order(&app, &token, product_id).await;

    let skip = set_status(&app, &admin, order_id, "shipped").await;
    assert_eq!(skip.status(), StatusCode::CONFLICT);

    let same = set_status(&app, &admin, order_id, "pending").await;
    assert_eq!(same.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_owner_cancels_pending_order() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.customer_token("cancel@shop.test").await;
    let product_id = app.create_product(&admin, "1.00", 5).await;
    let order_id = place_order(&app, &token, product_id).await;

    let response = cancel(&app, &token, order_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().await.unwrap()["order"]["status"], "cancelled");

    let twice = cancel(&app, &token, order_id).await;
    assert_eq!(twice.status(), StatusCode::CONFLICT);

    let revive = set_status(&app, &admin, order_id, "processing").await;
    assert_eq!(revive.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_processing_order_cannot_be_cancelled() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.customer_token("busy@shop.test").await;
    let product_id = app.create_product(&admin, "1.00", 5).await;
    let order_id = place_order(&app, &token, product_id).await;

    assert_eq!(
        set_status(&app, &admin, order_id, "processing").await.status(),
        StatusCode::OK
    );

    let response = cancel(&app, &token, order_id).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>().await.unwrap()["kind"],
        "invalid_status_transition"
    );
}

#[tokio::test]
async fn test_other_account_cannot_cancel() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let owner = app.customer_token("owner@shop.test").await;
    let other = app.customer_token("other@shop.test").await;
    let product_id = app.create_product(&admin, "1.00", 5).await;
    let order_id = place_order(&app, &owner, product_id).await;

    let response = cancel(&app, &other, order_id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_cannot_set_status() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.customer_token("self@shop.test").await;
    let product_id = app.create_product(&admin, "1.00", 5).await;
    let order_id = place_order(&app, &token, product_id).await;

    let response = set_status(&app, &token, order_id, "processing").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_order_queries() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.customer_token("history@shop.test").await;
    let product_id = app.create_product(&admin, "1.00", 5).await;
    let first = place_order(&app, &token, product_id).await;
    let second = place_order(&app, &token, product_id).await;

    let profile = app
        .client
        .get(app.url("/user/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    let user_id = profile["user"]["id"].as_i64().unwrap();

    let by_user = app
        .client
        .get(app.url(&format!("/admin/orders/user/{user_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    let ids: Vec<i64> = by_user["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second, first]);

    let by_product = app
        .client
        .get(app.url(&format!("/admin/order-items/product/{product_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(by_product["items"].as_array().unwrap().len(), 2);

    let missing = app
        .client
        .get(app.url("/admin/orders/9999"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let deleted = app
        .client
        .delete(app.url(&format!("/admin/users/{user_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::CONFLICT);
}
