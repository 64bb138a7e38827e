//! Resource controllers.
//!
//! A controller owns one URL prefix and registers its route bindings against
//! it. Handlers are plain `async fn`s on the controller taking
//! `self: Arc<Self>`, so they reach their collaborators (services, stores)
//! through `self` without any global state:
//!
//! ```rust,ignore
//! impl Controller for WidgetController {
//!     fn path(&self) -> &str { &self.path }
//!
//!     fn routes(scope: &mut Scope<'_, Self>) {
//!         scope
//!             .get("", vec![authorize(["admin"])], Self::list)
//!             .get("/{id}", vec![], Self::show);
//!     }
//! }
//!
//! impl WidgetController {
//!     async fn list(self: Arc<Self>, req: Request) -> Result<Envelope<Vec<Widget>>, Error> {
//!         let widgets = self.service.list().await?;
//!         Ok(self.envelope(&req, widgets))
//!     }
//! }
//!
//! let app = Router::new().mount(WidgetController::new(service));
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::envelope::{self, Envelope};
use crate::method::Method;
use crate::middleware::BoxedMiddleware;
use crate::request::Request;
use crate::response::IntoResponse;
use crate::router::Router;

/// An entity controller: a path prefix plus the routes under it.
pub trait Controller: Send + Sync + Sized + 'static {
    /// URL prefix every route of this controller lives under.
    fn path(&self) -> &str;

    /// Register route bindings, in order. Called once by [`Router::mount`].
    fn routes(scope: &mut Scope<'_, Self>);

    /// Wrap a handler result in the standard envelope, timed from request start.
    fn envelope<T>(&self, req: &Request, data: T) -> Envelope<T> {
        envelope::format(data, req.elapsed_ms(), envelope::OK)
    }
}

/// Registration view handed to [`Controller::routes`].
///
/// Paths given here are relative to the controller's prefix (`""` is the
/// prefix itself). Each binding takes the middleware chain to run, in order,
/// before the handler.
pub struct Scope<'r, C> {
    router: &'r mut Router,
    prefix: String,
    controller: Arc<C>,
}

impl<'r, C: Controller> Scope<'r, C> {
    pub(crate) fn new(router: &'r mut Router, prefix: String, controller: Arc<C>) -> Self {
        Self { router, prefix, controller }
    }

    pub fn controller(&self) -> &Arc<C> {
        &self.controller
    }

    /// Bind `handler` for `method` at `{prefix}{path}`.
    pub fn route<F, Fut, R>(
        &mut self,
        method: Method,
        path: &str,
        middleware: Vec<BoxedMiddleware>,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        let full = format!("{}{}", self.prefix, path);
        let controller = Arc::clone(&self.controller);
        self.router.add(method, &full, middleware, move |req: Request| {
            handler(Arc::clone(&controller), req)
        });
        self
    }

    pub fn get<F, Fut, R>(&mut self, path: &str, middleware: Vec<BoxedMiddleware>, handler: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.route(Method::Get, path, middleware, handler)
    }

    pub fn post<F, Fut, R>(&mut self, path: &str, middleware: Vec<BoxedMiddleware>, handler: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.route(Method::Post, path, middleware, handler)
    }

    pub fn put<F, Fut, R>(&mut self, path: &str, middleware: Vec<BoxedMiddleware>, handler: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.route(Method::Put, path, middleware, handler)
    }

    pub fn delete<F, Fut, R>(&mut self, path: &str, middleware: Vec<BoxedMiddleware>, handler: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.route(Method::Delete, path, middleware, handler)
    }
}
