//! # roster
//!
//! A resource-controller HTTP layer, and the employee REST API built on it.
//!
//! A request flows through one pipeline:
//!
//! 1. the radix-tree [`Router`] picks the route binding (literal segments win
//!    over `{param}` segments);
//! 2. global layers, then the route's own middleware chain, run in order and
//!    may attach a caller identity, a validated JSON body or an uploaded file;
//! 3. the handler returns one `Result`; success is wrapped in an
//!    [`Envelope`] and any [`Error`] goes to a single error stage that picks
//!    the status and writes `{error, message, violations?}`.
//!
//! Handlers live on [`Controller`]s that own a path prefix and reach their
//! services through `self`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use roster::auth::TokenIssuer;
//! use roster::employee::{EmployeeController, InMemoryEmployeeService, PublicLinks};
//! use roster::middleware::authenticate;
//! use roster::upload::DiskStore;
//! use roster::{Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), roster::Error> {
//!     let tokens = TokenIssuer::new(b"secret", Duration::from_secs(3600));
//!     let service = Arc::new(InMemoryEmployeeService::new(tokens.clone()));
//!     let links = PublicLinks { base_path: "http://localhost:3000".into(), strip_prefix_len: 7 };
//!
//!     let app = Router::new()
//!         .layer(authenticate(tokens))
//!         .mount(EmployeeController::new("/api", service, Arc::new(DiskStore::new("public/uploads")), links));
//!
//!     Server::bind("0.0.0.0:3000".parse().unwrap()).serve(app).await
//! }
//! ```

mod controller;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod auth;
pub mod config;
pub mod employee;
pub mod envelope;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod upload;

pub use controller::{Controller, Scope};
pub use envelope::Envelope;
pub use error::{Error, Violation};
pub use handler::Handler;
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::{RouteBinding, Router};
pub use server::{Server, shutdown_signal};
pub use status::Status;
