use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{BoxedMiddleware, Middleware};
use crate::error::Error;
use crate::request::Request;

/// Role check against a fixed allow-list.
///
/// No identity on the request → [`Error::Unauthenticated`]; identity whose
/// roles miss the list entirely → [`Error::Forbidden`].
#[derive(Debug)]
pub struct Authorize {
    allowed: BTreeSet<String>,
}

/// `authorize(["admin", "Engineer"])`
pub fn authorize<I, S>(roles: I) -> BoxedMiddleware
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Arc::new(Authorize { allowed: roles.into_iter().map(Into::into).collect() })
}

#[async_trait]
impl Middleware for Authorize {
    fn name(&self) -> &str {
        "authorize"
    }

    async fn handle(&self, req: Request) -> Result<Request, Error> {
        let identity = req.identity().ok_or(Error::Unauthenticated)?;
        if !identity.has_any_role(&self.allowed) {
            debug!(subject = %identity.subject, allowed = ?self.allowed, "caller lacks required role");
            return Err(Error::Forbidden);
        }
        Ok(req)
    }
}
