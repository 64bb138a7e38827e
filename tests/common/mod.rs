#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use roster::auth::TokenIssuer;
use roster::employee::{
    CreateEmployee, Employee, EmployeeController, EmployeeService, InMemoryEmployeeService,
    PublicLinks, Session, UpdateEmployee,
};
use roster::health::HealthController;
use roster::middleware::authenticate;
use roster::upload::DiskStore;
use roster::{Error, Router, Server};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const BASE_PATH: &str = "http://files.test";

/// Request body cap for the test server; uploads in the tests stay well under.
pub const BODY_LIMIT: usize = 64 * 1024;

/// Counts every call that reaches the wrapped service.
struct Counting {
    inner: InMemoryEmployeeService,
    calls: Arc<AtomicUsize>,
}

impl Counting {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmployeeService for Counting {
    async fn list(&self) -> Result<Vec<Employee>, Error> {
        self.hit();
        self.inner.list().await
    }

    async fn get(&self, id: &str) -> Result<Employee, Error> {
        self.hit();
        self.inner.get(id).await
    }

    async fn create(&self, input: CreateEmployee) -> Result<Employee, Error> {
        self.hit();
        self.inner.create(input).await
    }

    async fn update(&self, id: &str, patch: UpdateEmployee) -> Result<Employee, Error> {
        self.hit();
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<Employee, Error> {
        self.hit();
        self.inner.delete(id).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session, Error> {
        self.hit();
        self.inner.login(username, password).await
    }
}

/// A running server on an ephemeral port with three seeded accounts:
/// `root` (admin), `eng` (Engineer) and `gus` (guest).
pub struct TestApp {
    pub base: String,
    pub client: reqwest::Client,
    /// Directory the disk store writes into.
    pub upload_dir: PathBuf,
    calls: Arc<AtomicUsize>,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<Result<(), Error>>>,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let upload_dir = tmp.path().join("public").join("uploads");
        let strip_prefix_len = format!("{}/public/", tmp.path().display()).len();

        let tokens = TokenIssuer::new(b"integration-secret", Duration::from_secs(300));
        let inner = InMemoryEmployeeService::new(tokens.clone()).with_cost(4);
        inner.seed("Root", "root", "rootpass", "admin").await.unwrap();
        inner.seed("Eng", "eng", "engpass", "Engineer").await.unwrap();
        inner.seed("Gus", "gus", "guestpass", "guest").await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let service = Arc::new(Counting { inner, calls: Arc::clone(&calls) });
        let links = PublicLinks { base_path: BASE_PATH.into(), strip_prefix_len };

        let app = Router::new()
            .layer(authenticate(tokens))
            .mount(HealthController::new())
            .mount(EmployeeController::new(
                "/api",
                service,
                Arc::new(DiskStore::new(&upload_dir)),
                links,
            ));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = format!("http://{addr}");
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(Server::bind(addr).max_body_bytes(BODY_LIMIT).serve_on(
            listener,
            app,
            async move {
                let _ = rx.await;
            },
        ));

        Self {
            base,
            client: reqwest::Client::new(),
            upload_dir,
            calls,
            shutdown: Some(tx),
            server: Some(server),
            _tmp: tmp,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn service_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn token(&self, username: &str, password: &str) -> String {
        let res = self
            .client
            .post(self.url("/api/employees/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200, "login as {username}");
        let body: Value = res.json().await.unwrap();
        body["data"]["token"].as_str().unwrap().to_owned()
    }

    pub async fn create(&self, admin: &str, username: &str) -> Value {
        let res = self
            .client
            .post(self.url("/api/employees"))
            .bearer_auth(admin)
            .json(&serde_json::json!({
                "name": format!("Employee {username}"),
                "username": username,
                "password": "password1",
                "role": "Engineer",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        body["data"].clone()
    }

    /// Signal shutdown and wait for the server to drain.
    pub async fn stop(mut self) -> Result<(), Error> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.server.take() {
            Some(server) => server.await.unwrap(),
            None => Ok(()),
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
