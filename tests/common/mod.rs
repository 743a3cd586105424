// tests/common/mod.rs

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::net::SocketAddr;

use recipebook::{config::Config, routes, state::AppState};
use serde_json::{Value, json};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

pub fn test_config(allow_self_rating: bool) -> Config {
    Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        allow_self_rating,
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
    }
}

/// Spawns the app on a random port, backed by the in-memory store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(false)).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    spawn_app_on(AppState::in_memory(config)).await
}

/// Serves `state` on a random port.
pub async fn spawn_app_on(state: AppState) -> TestApp {
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a fresh user and returns (token, user id).
    pub async fn signup(&self, prefix: &str) -> (String, i64) {
        let username = format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8]);
        let password = "password123";

        let register = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(register.status().as_u16(), 201);

        let login: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");

        (
            login["token"].as_str().expect("Token not found").to_string(),
            login["user_id"].as_i64().expect("User id not found"),
        )
    }

    pub async fn create_recipe(&self, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/recipes"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Create recipe failed")
    }

    pub async fn update_recipe(&self, token: &str, id: i64, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(&format!("/api/recipes/{}", id)))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Update recipe failed")
    }

    pub async fn get_recipe(&self, token: Option<&str>, id: i64) -> reqwest::Response {
        let mut request = self.client.get(self.url(&format!("/api/recipes/{}", id)));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Get recipe failed")
    }

    pub async fn mark(&self, token: &str, id: i64, mark: i64) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/recipes/{}/marks", id)))
            .bearer_auth(token)
            .json(&json!({ "mark": mark }))
            .send()
            .await
            .expect("Mark failed")
    }
}

pub fn recipe_body(name: &str, is_public: bool) -> Value {
    json!({
        "name": name,
        "description": "Une recette de famille",
        "time": 45,
        "quantity": 6,
        "difficulty": 2,
        "price": 12.5,
        "is_favorite": false,
        "is_public": is_public,
        "ingredients": []
    })
}

pub async fn error_code(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("Error body is not json");
    body["code"].as_str().unwrap_or_default().to_string()
}
