#![allow(dead_code)]

use reqwest::StatusCode;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

use shop_api::{
    app,
    config::Config,
    entities::{seed_admin, setup_schema},
};

pub const ADMIN_EMAIL: &str = "admin@shop.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestApp {
    pub base: String,
    pub client: reqwest::Client,
    pub db: Arc<DatabaseConnection>,
}

/// Serves the real router on an ephemeral port over a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_timeout(10).await
}

pub async fn spawn_app_with_timeout(timeout_secs: u64) -> TestApp {
    // One connection keeps every query on the same in-memory database.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");

    setup_schema(&db).await.expect("Failed to create schema");

    let config = Config::from_lookup(|name| match name {
        "DATABASE_URL" => Some("sqlite::memory:".to_owned()),
        "SECRET" => Some("integration-secret".to_owned()),
        "ADMIN_EMAIL" => Some(ADMIN_EMAIL.to_owned()),
        "ADMIN_PASSWORD" => Some(ADMIN_PASSWORD.to_owned()),
        "REQUEST_TIMEOUT_SECS" => Some(timeout_secs.to_string()),
        _ => None,
    })
    .expect("Failed to build test config");

    seed_admin(&db, config.admin.as_ref().expect("Admin seed missing"))
        .await
        .expect("Failed to seed admin");

    let db = Arc::new(db);
    let router = app(db.clone(), &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server failed");
    });

    TestApp {
        base: format!("http://{addr}/api/v1"),
        client: reqwest::Client::new(),
        db,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn signin(&self, email: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/auth/signin"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to send signin request");

        assert_eq!(response.status(), StatusCode::OK);

        let body = response
            .json::<Value>()
            .await
            .expect("Failed to parse signin response JSON");

        body["token"]
            .as_str()
            .expect("Token not found in signin response")
            .to_owned()
    }

    pub async fn admin_token(&self) -> String {
        self.signin(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Registers a fresh customer and returns its token.
    pub async fn customer_token(&self, email: &str) -> String {
        let response = self
            .client
            .post(self.url("/auth/signup"))
            .json(&json!({
                "name": "Customer",
                "email": email,
                "password": "secret-password",
            }))
            .send()
            .await
            .expect("Failed to send signup request");

        assert_eq!(response.status(), StatusCode::CREATED);

        self.signin(email, "secret-password").await
    }

    pub async fn create_product(&self, admin_token: &str, price: &str, stock: i32) -> i32 {
        let response = self
            .client
            .post(self.url("/admin/products"))
            .bearer_auth(admin_token)
            .json(&json!({
                "name": "Baranka",
                "description": "Fresh",
                "price": price,
                "category": "bakery",
                "stock": stock,
            }))
            .send()
            .await
            .expect("Failed to send create product request");

        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response
            .json::<Value>()
            .await
            .expect("Failed to parse create product response JSON");

        body["product"]["id"].as_i64().expect("Product id missing") as i32
    }

    pub async fn product(&self, id: i32) -> Value {
        let body = self
            .client
            .get(self.url(&format!("/products/{id}")))
            .send()
            .await
            .expect("Failed to send get product request")
            .json::<Value>()
            .await
            .expect("Failed to parse product response JSON");

        body["product"].clone()
    }

    pub async fn stock_of(&self, id: i32) -> i64 {
        self.product(id).await["stock"]
            .as_i64()
            .expect("Stock missing")
    }
}

pub fn checkout_payload(items: Value) -> Value {
    json!({
        "shipping_address": {
            "street": "1 Bakery Lane",
            "city": "Tula",
            "state": "Tula Oblast",
            "country": "RU",
            "zip_code": "300000",
        },
        "contact_number": "0123456789",
        "items": items,
    })
}

/// Money comes back as a decimal string; compare numerically.
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("Invalid decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("Invalid decimal number"),
        other => panic!("Not a money value: {other}"),
    }
}
