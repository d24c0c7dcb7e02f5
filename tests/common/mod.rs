#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use contact_intake::config::{Config, RateLimitConfig};
use contact_intake::db::SubmissionStore;
use contact_intake::email::{MailAddresses, MailSender, Mailer, Notifier, OutgoingMail, TransportError};
use contact_intake::error::StoreError;
use contact_intake::models::{NewSubmission, Submission};
use contact_intake::state::SharedState;

pub const ADMIN_EMAIL: &str = "admin@site.test";
pub const FROM_EMAIL: &str = "noreply@site.test";
pub const SITE_NAME: &str = "Site Team";

// ── In-memory store ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreMode {
    Healthy,
    Outage,
    Conflict,
}

/// Submission store backed by a Vec, with switchable failure modes.
pub struct MemoryStore {
    records: Mutex<Vec<Submission>>,
    mode: StoreMode,
    save_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Self::with_mode(StoreMode::Healthy)
    }

    pub fn with_mode(mode: StoreMode) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            mode,
            save_calls: AtomicUsize::new(0),
        })
    }

    pub fn records(&self) -> Vec<Submission> {
        self.records.lock().unwrap().clone()
    }

    pub fn find(&self, id: &str) -> Option<Submission> {
        self.records()
            .into_iter()
            .find(|s| s.id.to_string() == id)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn save(&self, candidate: NewSubmission) -> Result<Submission, StoreError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);

        let candidate = candidate.validated().map_err(StoreError::Validation)?;

        match self.mode {
            StoreMode::Healthy => {}
            StoreMode::Outage => return Err(StoreError::Unknown("backend unavailable".to_string())),
            StoreMode::Conflict => return Err(StoreError::Conflict("id".to_string())),
        }

        let submission = Submission {
            id: Uuid::now_v7(),
            name: candidate.name,
            email: candidate.email,
            message: candidate.message,
            submitted_at: candidate.submitted_at,
        };
        self.records.lock().unwrap().push(submission.clone());
        Ok(submission)
    }
}

/// Store whose `save` panics, for exercising the panic boundary.
pub struct PanickingStore;

#[async_trait]
impl SubmissionStore for PanickingStore {
    async fn save(&self, _candidate: NewSubmission) -> Result<Submission, StoreError> {
        panic!("store exploded");
    }
}

// ── Postgres test database ──────────────────────────────────────

/// A fresh, migrated database dropped again by `drop_db`.
pub struct TestDb {
    pub pool: PgPool,
    pub db_name: String,
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Create a uniquely named test database and run migrations on it.
///
/// Returns `None` when `DATABASE_URL` is not set so store tests are skipped
/// on machines without Postgres.
pub async fn spawn_db() -> Option<TestDb> {
    let _ = dotenvy::dotenv();

    let Ok(base_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return None;
    };

    let db_name = format!("contact_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    Some(TestDb { pool, db_name })
}

/// Drop the test database.
pub async fn drop_db(db: TestDb) {
    db.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!(
        "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
        db.db_name
    ))
    .execute(&admin_pool)
    .await;

    admin_pool.close().await;
}

// ── Recording mailer ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum MailCall {
    Open,
    Verify,
    Send(OutgoingMail),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailAt {
    Nothing,
    Open,
    Verify,
    /// 1-based index of the send that fails.
    Send(usize),
}

/// Mailer test double that records every call in order.
#[derive(Clone)]
pub struct RecordingMailer {
    calls: Arc<Mutex<Vec<MailCall>>>,
    fail_at: FailAt,
}

impl RecordingMailer {
    pub fn new(fail_at: FailAt) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_at,
        }
    }

    pub fn calls(&self) -> Vec<MailCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MailCall::Send(mail) => Some(mail),
                _ => None,
            })
            .collect()
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(Arc::new(self.clone()), addresses())
    }
}

impl Mailer for RecordingMailer {
    fn open(&self) -> Result<Box<dyn MailSender>, TransportError> {
        self.calls.lock().unwrap().push(MailCall::Open);
        if self.fail_at == FailAt::Open {
            return Err("relay host rejected".into());
        }
        Ok(Box::new(RecordingSender {
            calls: self.calls.clone(),
            fail_at: self.fail_at,
            sends: AtomicUsize::new(0),
        }))
    }
}

struct RecordingSender {
    calls: Arc<Mutex<Vec<MailCall>>>,
    fail_at: FailAt,
    sends: AtomicUsize,
}

#[async_trait]
impl MailSender for RecordingSender {
    async fn verify_connectivity(&self) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(MailCall::Verify);
        if self.fail_at == FailAt::Verify {
            return Err("connection refused".into());
        }
        Ok(())
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(MailCall::Send(mail.clone()));
        let n = self.sends.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at == FailAt::Send(n) {
            return Err("550 mailbox unavailable".into());
        }
        Ok(())
    }
}

pub fn addresses() -> MailAddresses {
    MailAddresses {
        from: FROM_EMAIL.to_string(),
        admin_recipient: ADMIN_EMAIL.to_string(),
        site_name: SITE_NAME.to_string(),
    }
}

// ── Test server ─────────────────────────────────────────────────

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_body_size: 10 * 1024,
        allowed_origins: vec![],
        trusted_proxies: vec![],
        rate_limit: RateLimitConfig {
            max_submissions: 1000,
            window_secs: 60,
        },
        log_level: "warn".to_string(),
        mail: None,
    }
}

/// A running test server instance.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: SharedState,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Submit the contact form as JSON, return (body, status).
    pub async fn submit_json(&self, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/forms/contact"))
            .json(data)
            .send()
            .await
            .expect("submit json failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit the contact form url-encoded, return (body, status).
    pub async fn submit_form(&self, data: &[(&str, &str)]) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/forms/contact"))
            .form(data)
            .send()
            .await
            .expect("submit form failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub async fn spawn_app(store: Arc<dyn SubmissionStore>, notifier: Option<Notifier>) -> TestApp {
    spawn_app_with(test_config(), store, notifier).await
}

pub async fn spawn_app_with(
    config: Config,
    store: Arc<dyn SubmissionStore>,
    notifier: Option<Notifier>,
) -> TestApp {
    let (app, state) = contact_intake::build_app(config, store, notifier);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        state,
    }
}
