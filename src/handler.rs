//! Handler trait, type erasure, and the failure adapter.
//!
//! # How async handlers are stored
//!
//! The router holds handlers of *different* types in one table, so each is
//! hidden behind a trait object (`dyn ErasedHandler`):
//!
//! ```text
//! async fn show(req: Request) -> Result<Envelope<_>, Error>   ← user writes this
//!        ↓ scope.get("/{id}", vec![], Self::show)
//! handler.into_boxed_handler()                                 ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(handler))                                 ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req) at request time                            ← one vtable dispatch
//!        ↓
//! catch_unwind(show(req)).await → exactly one Response
//! ```
//!
//! # Failure handling
//!
//! A handler's outcome is a single value. `Ok` becomes the success response,
//! `Err` goes to the error stage through [`IntoResponse`], and a panic while
//! polling the handler is caught here and reported as [`Error::Internal`].
//! There is no path that writes two responses or none.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::FutureExt;

use crate::error::Error;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// Automatically satisfied by any function or closure shaped like
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// which includes `Result<T, Error>` for any `T: IntoResponse`. The trait is
/// sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Holds a concrete handler `F` and implements [`ErasedHandler`] for it.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(out) => out.into_response(),
                Err(panic) => {
                    Error::Internal(format!("handler panicked: {}", panic_message(&*panic)))
                        .into_response()
                }
            }
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::status::Status;

    async fn ok(_req: Request) -> Result<Status, Error> {
        Ok(Status::NoContent)
    }

    async fn missing(_req: Request) -> Result<Status, Error> {
        Err(Error::NotFound("employee 9".into()))
    }

    async fn boom(_req: Request) -> Status {
        panic!("exploded")
    }

    fn req() -> Request {
        Request::new(Method::Get, "/")
    }

    #[tokio::test]
    async fn success_is_written_once() {
        let res = ok.into_boxed_handler().call(req()).await;
        assert_eq!(res.status_code(), 204);
    }

    #[tokio::test]
    async fn failure_goes_to_error_stage() {
        let res = missing.into_boxed_handler().call(req()).await;
        assert_eq!(res.status_code(), 404);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["error"], "NotFound");
    }

    #[tokio::test]
    async fn panic_is_forwarded_as_internal() {
        let res = boom.into_boxed_handler().call(req()).await;
        assert_eq!(res.status_code(), 500);
    }
}
