// tests/common/mod.rs
//
// Shared harness: every test gets its own in-memory database and server.

#![allow(dead_code)]

use std::str::FromStr;

use quizles::{config::Config, routes, services::accounts, state::AppState};
use reqwest::{Client, Response};
use serde_json::{Value, json};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub const ADMIN_USERNAME: &str = "admin@quizles.test";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: Client,
}

/// Helper function to spawn the app on a random port for testing.
pub async fn spawn_app() -> TestApp {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Invalid SQLite URL")
        .foreign_keys(true);

    // A single connection that never expires keeps the in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        attempt_token_ttl: 600,
        rust_log: "error".to_string(),
        port: 0,
        admin_username: Some(ADMIN_USERNAME.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
    };

    accounts::seed_admin(&pool, &config)
        .await
        .expect("Failed to seed admin");

    let app = routes::create_router(AppState {
        pool: pool.clone(),
        config,
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: Client::new(),
    }
}

/// The seeded "Algebra Basics" quiz: two questions worth 5 and 10 marks whose
/// correct options are 2 and 4.
pub struct Catalog {
    pub branch_id: i64,
    pub subject_id: i64,
    pub chapter_id: i64,
    pub quiz_id: i64,
    pub q1: i64,
    pub q2: i64,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, token: &str, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, token: &str, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, token: &str, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch(&self, token: &str, path: &str, body: &Value) -> Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, token: &str, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200, "login failed for {username}");

        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    /// Registers a user and returns its login token.
    pub async fn register(&self, username: &str, branch_id: Option<i64>) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": username,
                "password": PASSWORD,
                "confirm_password": PASSWORD,
                "name": "Quiz Taker",
                "dob": "2000-05-17",
                "branch_id": branch_id,
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201, "registration failed for {username}");

        self.login(username, PASSWORD).await
    }

    /// Creates a record through the admin API and returns its id.
    pub async fn create(&self, token: &str, model: &str, body: Value) -> i64 {
        let response = self.post(token, &format!("/api/admin/{model}"), &body).await;
        let status = response.status().as_u16();
        let created: Value = response.json().await.unwrap();
        assert_eq!(status, 201, "creating {model} failed: {created}");
        created["id"].as_i64().unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn seed_catalog(&self, admin: &str) -> Catalog {
        let branch_id = self
            .create(admin, "branches", json!({ "name": "Science", "description": "Sciences" }))
            .await;
        let subject_id = self
            .create(admin, "subjects", json!({ "name": "Mathematics", "branch_id": branch_id }))
            .await;
        let chapter_id = self
            .create(admin, "chapters", json!({ "name": "Algebra", "subject_id": subject_id }))
            .await;
        let quiz_id = self
            .create(
                admin,
                "quizzes",
                json!({ "name": "Algebra Basics", "chapter_id": chapter_id, "question_count": 2, "time_limit": 600 }),
            )
            .await;
        let q1 = self
            .create(admin, "questions", question(quiz_id, "What is 1 + 1?", 2, 5))
            .await;
        let q2 = self
            .create(admin, "questions", question(quiz_id, "What is 2 * 2?", 4, 10))
            .await;

        Catalog {
            branch_id,
            subject_id,
            chapter_id,
            quiz_id,
            q1,
            q2,
        }
    }

    /// Starts and submits one attempt, returning the submission response.
    pub async fn take_quiz(&self, token: &str, quiz_id: i64, answers: Value) -> Value {
        let started: Value = self
            .post(token, &format!("/api/quizzes/{quiz_id}/start"), &json!({}))
            .await
            .json()
            .await
            .unwrap();

        let response = self
            .post(
                token,
                &format!("/api/quizzes/{quiz_id}/submit"),
                &json!({ "attempt_token": started["attempt_token"], "answers": answers }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.unwrap()
    }
}

pub fn question(quiz_id: i64, text: &str, correct_option: i64, marks: i64) -> Value {
    json!({
        "quiz_id": quiz_id,
        "question_text": text,
        "option1": "1",
        "option2": "2",
        "option3": "3",
        "option4": "4",
        "correct_option": correct_option,
        "marks": marks,
    })
}
