//! Middleware layer.
//!
//! A middleware is a pre-handler stage: it receives the request, may inspect
//! or enrich it, and either passes it on or short-circuits with an [`Error`].
//! Each route carries its own ordered chain; [`Router::layer`](crate::Router::layer)
//! adds stages that run in front of every route's chain.
//!
//! Built-in stages:
//! - [`authenticate`] : bearer token → caller identity
//! - [`authorize`] : caller roles vs. a per-route allow-list
//! - [`validate`] : body shape check and coercion
//! - [`upload::single`] : one multipart file, stored and attached

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::request::Request;

mod authenticate;
mod authorize;
pub mod upload;
mod validate;

pub use authenticate::{Authenticate, authenticate};
pub use authorize::{Authorize, authorize};
pub use validate::{Validate, validate};

/// A stage in front of a route handler.
///
/// Implementations hold no per-request state: the same instance serves every
/// request on its route, concurrently.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Short name used in logs and route listings.
    fn name(&self) -> &str;

    /// Pass the (possibly enriched) request on, or stop the chain.
    async fn handle(&self, req: Request) -> Result<Request, Error>;
}

/// Shared, type-erased middleware as stored in route bindings.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Runs `stages` in order, stopping at the first failure.
pub(crate) async fn run_chain(stages: &[BoxedMiddleware], mut req: Request) -> Result<Request, Error> {
    for stage in stages {
        tracing::trace!(middleware = stage.name(), path = req.path(), "middleware");
        req = stage.handle(req).await?;
    }
    Ok(req)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::method::Method;

    struct Record {
        label: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    #[async_trait]
    impl Middleware for Record {
        fn name(&self) -> &str {
            self.label
        }

        async fn handle(&self, req: Request) -> Result<Request, Error> {
            self.seen.lock().unwrap().push(self.label);
            if self.fail { Err(Error::Forbidden) } else { Ok(req) }
        }
    }

    fn stage(label: &'static str, seen: &Arc<Mutex<Vec<&'static str>>>, fail: bool) -> BoxedMiddleware {
        Arc::new(Record { label, seen: Arc::clone(seen), fail })
    }

    #[tokio::test]
    async fn chain_runs_in_order_and_stops_at_first_failure() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let chain = vec![
            stage("first", &seen, false),
            stage("second", &seen, true),
            stage("third", &seen, false),
        ];

        let result = run_chain(&chain, Request::new(Method::Get, "/")).await;

        assert!(matches!(result, Err(Error::Forbidden)));
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }
}
