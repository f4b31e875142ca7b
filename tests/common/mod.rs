#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

use async_trait::async_trait;
use piscinas::{
    AppState, app,
    auth::bootstrap_admin,
    config::{AdminBootstrap, DEFAULT_VAPID_SUBJECT, Settings},
    notifications::{PushFailure, PushSender},
    storage::memory::memory_storage,
};
use serde_json::{Value, json};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};
use tempfile::TempDir;
use time::{Date, UtcOffset};
use tokio::net::TcpListener;
use web_push::WebPushMessage;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const WORKER_PASSWORD: &str = "worker-password";

/// Push sender that records endpoints instead of talking to a push service.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<String>>,
    gone: Mutex<HashSet<String>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Makes the push service answer 410 for `endpoint` from now on.
    pub fn expire(&self, endpoint: &str) {
        self.gone.lock().unwrap().insert(endpoint.to_string());
    }
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn send(&self, endpoint: &str, _message: WebPushMessage) -> Result<(), PushFailure> {
        if self.gone.lock().unwrap().contains(endpoint) {
            return Err(PushFailure::Gone);
        }
        self.sent.lock().unwrap().push(endpoint.to_string());
        Ok(())
    }
}

pub struct TestUser {
    pub username: String,
    pub password: String,
    pub uid: String,
    pub token: String,
    pub refresh_token: String,
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub state: AppState,
    pub push: Arc<RecordingSender>,
    pub admin: TestUser,
    _vapid_dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let vapid_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let admin = AdminBootstrap {
        username: ADMIN_USERNAME.to_string(),
        password: ADMIN_PASSWORD.to_string(),
        email: Some("admin@example.com".to_string()),
    };
    let settings = Settings {
        port,
        listen_addr: "127.0.0.1".to_string(),
        storage_backend: "memory".to_string(),
        database_url: None,
        jwt_secret: "test-jwt-secret".to_string(),
        vapid_private_pem: None,
        vapid_key_path: vapid_dir
            .path()
            .join("vapid_private.pem")
            .to_string_lossy()
            .to_string(),
        vapid_subject: DEFAULT_VAPID_SUBJECT.to_string(),
        utc_offset: UtcOffset::UTC,
        admin: Some(admin.clone()),
    };

    let storage = memory_storage();
    bootstrap_admin(&storage, Some(&admin))
        .await
        .expect("Failed to bootstrap admin");

    let push = Arc::new(RecordingSender::default());
    let state = AppState::new(settings, storage, push.clone())
        .await
        .expect("Failed to build app state");

    let router = app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = reqwest::Client::new();
    let admin = login(&client, &address, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    TestApp {
        address,
        client,
        state,
        push,
        admin,
        _vapid_dir: vapid_dir,
    }
}

pub async fn login(
    client: &reqwest::Client,
    address: &str,
    username: &str,
    password: &str,
) -> TestUser {
    let response = client
        .post(format!("{}/auth/login", address))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to execute login request");
    assert_eq!(response.status().as_u16(), 200, "login failed for {}", username);
    let body: Value = response.json().await.unwrap();

    TestUser {
        username: username.to_string(),
        password: password.to_string(),
        uid: body["uid"].as_str().unwrap().to_string(),
        token: body["accessToken"].as_str().unwrap().to_string(),
        refresh_token: body["refreshToken"].as_str().unwrap().to_string(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn today(&self) -> Date {
        self.state.settings.today()
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str, password: &str) -> TestUser {
        login(&self.client, &self.address, username, password).await
    }

    /// Creates a worker through the API and logs it in; returns the worker id too.
    pub async fn create_worker(&self, username: &str) -> (TestUser, i64) {
        let response = self
            .post(
                "/api/workers",
                &self.admin.token,
                &json!({ "username": username, "password": WORKER_PASSWORD, "phone": "0990000000" }),
            )
            .await;
        let worker = json_body(assert_status(response, 201).await).await;
        let user = self.login(username, WORKER_PASSWORD).await;
        (user, worker["id"].as_i64().unwrap())
    }

    pub async fn create_client(&self, name: &str) -> i64 {
        let response = self
            .post(
                "/api/clients",
                &self.admin.token,
                &client_body(name, "0991234567"),
            )
            .await;
        json_body(assert_status(response, 201).await).await["id"]
            .as_i64()
            .unwrap()
    }

    pub async fn create_contract(&self, client_id: i64, monthly_price_cents: i64) -> i64 {
        let response = self
            .post(
                "/api/contracts",
                &self.admin.token,
                &contract_body(client_id, monthly_price_cents),
            )
            .await;
        json_body(assert_status(response, 201).await).await["id"]
            .as_i64()
            .unwrap()
    }

    pub async fn create_supply(&self, name: &str, stock: i64, price_cents: i64) -> i64 {
        let response = self
            .post(
                "/api/supplies",
                &self.admin.token,
                &json!({ "name": name, "stock": stock, "minStock": 2, "priceCents": price_cents }),
            )
            .await;
        json_body(assert_status(response, 201).await).await["id"]
            .as_i64()
            .unwrap()
    }

    pub async fn schedule(&self, contract_id: i64, date: Date, worker_ids: &[i64]) -> Value {
        let response = self
            .post(
                "/api/maintenances",
                &self.admin.token,
                &json!({
                    "contractId": contract_id,
                    "date": date.to_string(),
                    "workerIds": worker_ids,
                }),
            )
            .await;
        json_body(assert_status(response, 201).await).await
    }

    /// Client, contract and one visit on `date`; returns (contract id, visit).
    pub async fn visit(&self, date: Date, worker_ids: &[i64]) -> (i64, Value) {
        let client_id = self.create_client("Familia Rivas").await;
        let contract_id = self.create_contract(client_id, 80_00).await;
        let visit = self.schedule(contract_id, date, worker_ids).await;
        (contract_id, visit)
    }

    pub async fn stock(&self, supply_id: i64) -> i64 {
        let response = self
            .get(&format!("/api/supplies/{}", supply_id), &self.admin.token)
            .await;
        json_body(assert_status(response, 200).await).await["stock"]
            .as_i64()
            .unwrap()
    }
}
