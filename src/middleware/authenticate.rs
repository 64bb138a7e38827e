use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{BoxedMiddleware, Middleware};
use crate::auth::{Identity, TokenIssuer};
use crate::error::Error;
use crate::request::Request;

/// Resolves `Authorization: Bearer <token>` into the request's caller identity.
///
/// Requests without a verifiable bearer token pass through anonymous; whether
/// that is acceptable is up to the route's [`authorize`](super::authorize)
/// stage. A stale token therefore never blocks an open route such as login.
pub struct Authenticate {
    tokens: TokenIssuer,
}

pub fn authenticate(tokens: TokenIssuer) -> BoxedMiddleware {
    Arc::new(Authenticate { tokens })
}

impl Authenticate {
    fn resolve(&self, header: &str) -> Result<Identity, Error> {
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(Error::Unauthenticated)?;
        self.tokens.verify(token)
    }
}

#[async_trait]
impl Middleware for Authenticate {
    fn name(&self) -> &str {
        "authenticate"
    }

    async fn handle(&self, mut req: Request) -> Result<Request, Error> {
        let resolved = req.header("authorization").map(|h| self.resolve(h));
        match resolved {
            Some(Ok(identity)) => req.set_identity(identity),
            Some(Err(_)) => debug!(path = req.path(), "unverifiable authorization header, continuing anonymous"),
            None => {}
        }
        Ok(req)
    }
}
