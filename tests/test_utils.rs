#![allow(dead_code)]

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use employee_profiles::{
    db::postgres::{create_pool, run_migrations},
    middlewares::auth::AuthMiddleware,
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment},
    AppState,
};
use reqwest::{multipart::Form, Client};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::{net::TcpListener, time::Duration};
use tempfile::TempDir;
use uuid::Uuid;

pub const PASSWORD: &str = "ValidPass123!";

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub client: Client,
    pub config: AppConfig,
    _upload_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let config = test_config(upload_dir.path().to_string_lossy().into_owned());

        let db_pool = create_pool(&config.database_url, config.database_max_connections)
            .await
            .expect("Failed to create test DB pool");

        run_migrations(&db_pool).await.expect("Failed to run migrations");

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let state = web::Data::new(AppState::new(&config, db_pool.clone()));
        let upload_limit = config.max_upload_bytes();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(NormalizePath::trim())
                .wrap(AuthMiddleware)
                .configure(|cfg| configure_routes(cfg, upload_limit))
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(config.worker_count)
        .run();

        tokio::spawn(server);

        let client = Client::new();
        while client.get(format!("{}/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Self {
            address,
            db_pool,
            client,
            config,
            _upload_dir: upload_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_employee(&self, form: Form) -> reqwest::Response {
        self.client
            .post(self.url("/api/employees"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to create employee")
    }

    /// Creates an account and returns its id.
    pub async fn create_default_employee(&self, email: &str) -> Uuid {
        let response = self.create_employee(profile_form(email, PASSWORD)).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: Value = response.json().await.unwrap();
        body["employee_id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/employees/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to login")
    }

    pub async fn token_for(&self, email: &str, password: &str) -> String {
        let body: Value = self.login(email, password).await.json().await.unwrap();
        body["token"].as_str().expect("login returned no token").to_string()
    }

    /// Inserts an account the way the pre-hashing system stored it.
    pub async fn insert_legacy_employee(&self, email: &str, plaintext: &str) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO employees (first_name, last_name, email, password) \
             VALUES ('Legacy', 'Record', $1, $2) RETURNING id",
        )
        .bind(email)
        .bind(plaintext)
        .fetch_one(&self.db_pool)
        .await
        .expect("Failed to insert legacy employee")
    }

    pub async fn stored_password(&self, id: Uuid) -> String {
        sqlx::query_scalar::<_, String>("SELECT password FROM employees WHERE id = $1")
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .unwrap()
    }

    pub async fn edit_employee(&self, id: Uuid, token: &str, form: Form) -> reqwest::Response {
        self.client
            .put(self.url(&format!("/api/employees/{id}")))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Failed to edit employee")
    }

    pub async fn stored_picture(&self, id: Uuid) -> Option<String> {
        sqlx::query_scalar::<_, Option<String>>("SELECT picture FROM employees WHERE id = $1")
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .unwrap()
    }

    pub async fn set_picture(&self, id: Uuid, reference: &str) {
        sqlx::query("UPDATE employees SET picture = $1 WHERE id = $2")
            .bind(reference)
            .bind(id)
            .execute(&self.db_pool)
            .await
            .unwrap();
    }

    pub async fn stored_email(&self, id: Uuid) -> String {
        sqlx::query_scalar::<_, String>("SELECT email FROM employees WHERE id = $1")
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .unwrap()
    }

    pub async fn count_rows(&self, table: &str, employee_id: Uuid) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table} WHERE employee_id = $1"))
            .bind(employee_id)
            .fetch_one(&self.db_pool)
            .await
            .unwrap()
    }

    pub async fn count_accounts(&self, email: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE email = $1")
            .bind(email)
            .fetch_one(&self.db_pool)
            .await
            .unwrap()
    }
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4())
}

/// A profile form with two kept education entries, one blank one and one of each other collection.
pub fn profile_form(email: &str, password: &str) -> Form {
    Form::new()
        .text("first_name", "Abebe")
        .text("last_name", "Kebede")
        .text("email", email.to_string())
        .text("password", password.to_string())
        .text("dob", "1990-04-12")
        .text("nationality", "Ethiopian")
        .text("education", json!([
            { "degree": "BSc", "institution": "AAU", "year_completed": "2012" },
            { "degree": "MSc", "institution": "Jimma University", "year_completed": "2016" },
            { "degree": "", "institution": "", "year_completed": "" }
        ]).to_string())
        .text("trainings", json!([{ "certification_name": "PMP" }]).to_string())
        .text("employment_history", json!([
            { "employer": "Ethio Consult", "position_held": "Engineer", "start_date": "2016-09-01", "end_date": "" }
        ]).to_string())
}

fn test_config(upload_dir: String) -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Employee Profiles Test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        worker_count: 1,
        database_url: std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must point at a disposable Postgres database"),
        database_max_connections: 5,
        cors_allowed_origins: vec!["*".to_string()],
        jwt_secret: "test_jwt_secret_that_is_long_enough_for_hs512_1234567890".into(),
        upload_dir,
        max_upload_size_mb: 1,
    }
}
