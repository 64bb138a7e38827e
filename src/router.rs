//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. Each leaf is a route
//! binding: the middleware chain for that route plus its handler. The table
//! is built once at startup and never mutated after [`Server::serve`](crate::Server::serve)
//! takes it.
//!
//! Literal segments always win over `{param}` segments at the same position,
//! whatever the registration order: `/employees/upload` is never matched as
//! `/employees/{id}` with `id = "upload"`.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::controller::{Controller, Scope};
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{self, BoxedMiddleware};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

#[derive(Clone)]
struct Endpoint {
    middleware: Arc<[BoxedMiddleware]>,
    handler: BoxedHandler,
}

/// A registered (method, path, middleware, handler) association, as listed by
/// [`Router::bindings`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteBinding {
    pub method: Method,
    pub path: String,
    /// Middleware names in execution order.
    pub middleware: Vec<String>,
}

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Registration methods return `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Endpoint>>,
    layers: Vec<BoxedMiddleware>,
    bindings: Vec<RouteBinding>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), layers: Vec::new(), bindings: Vec::new() }
    }

    /// Register a handler with no route middleware.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.route(method, path, Vec::new(), handler)
    }

    /// Register a handler behind an ordered middleware chain.
    pub fn route(
        mut self,
        method: Method,
        path: &str,
        middleware: Vec<BoxedMiddleware>,
        handler: impl Handler,
    ) -> Self {
        self.add(method, path, middleware, handler);
        self
    }

    /// Add a stage that runs before every route's own chain.
    pub fn layer(mut self, stage: BoxedMiddleware) -> Self {
        self.layers.push(stage);
        self
    }

    /// Let a controller register its routes under its path prefix.
    pub fn mount<C: Controller>(mut self, controller: C) -> Self {
        let prefix = controller.path().to_owned();
        let mut scope = Scope::new(&mut self, prefix, Arc::new(controller));
        C::routes(&mut scope);
        self
    }

    /// Every binding in registration order.
    pub fn bindings(&self) -> &[RouteBinding] {
        &self.bindings
    }

    /// # Panics
    ///
    /// On a malformed path or a (method, path) pair registered twice. Both are
    /// programming errors caught before the server accepts connections.
    pub(crate) fn add(
        &mut self,
        method: Method,
        path: &str,
        middleware: Vec<BoxedMiddleware>,
        handler: impl Handler,
    ) {
        self.bindings.push(RouteBinding {
            method,
            path: path.to_owned(),
            middleware: middleware.iter().map(|m| m.name().to_owned()).collect(),
        });
        let endpoint = Endpoint {
            middleware: middleware.into(),
            handler: handler.into_boxed_handler(),
        };
        self.routes
            .entry(method)
            .or_default()
            .insert(path, endpoint)
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(Endpoint, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((matched.value.clone(), params))
    }

    fn matches_other_method(&self, method: Method, path: &str) -> bool {
        Method::ALL.iter()
            .filter(|m| **m != method)
            .filter_map(|m| self.routes.get(m))
            .any(|tree| tree.at(path).is_ok())
    }

    /// Route one request through its layers, chain and handler.
    ///
    /// Always produces exactly one response: any middleware failure goes to
    /// the error stage and the handler is never called.
    pub async fn handle(&self, mut req: Request) -> Response {
        let Some((endpoint, params)) = self.lookup(req.method(), req.path()) else {
            let err = if self.matches_other_method(req.method(), req.path()) {
                Error::MethodNotAllowed
            } else {
                Error::NotFound(format!("no route for {} {}", req.method(), req.path()))
            };
            return err.into_response();
        };
        req.params = params;

        let req = match middleware::run_chain(&self.layers, req).await {
            Ok(req) => req,
            Err(err) => return err.into_response(),
        };
        match middleware::run_chain(&endpoint.middleware, req).await {
            Ok(req) => endpoint.handler.call(req).await,
            Err(err) => err.into_response(),
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::middleware::authorize;
    use crate::status::Status;

    async fn by_id(req: Request) -> String {
        format!("id={}", req.param("id").unwrap_or("?"))
    }

    async fn upload(_req: Request) -> &'static str {
        "upload"
    }

    async fn never(_req: Request) -> Status {
        panic!("handler must not run")
    }

    async fn body_text(res: Response) -> String {
        String::from_utf8(res.body().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn literal_segment_beats_parameter_regardless_of_order() {
        let app = Router::new()
            .on(Method::Post, "/employees/{id}", by_id)
            .on(Method::Post, "/employees/upload", upload);

        let res = app.handle(Request::new(Method::Post, "/employees/upload")).await;
        assert_eq!(body_text(res).await, "upload");

        let res = app.handle(Request::new(Method::Post, "/employees/42")).await;
        assert_eq!(body_text(res).await, "id=42");
    }

    #[tokio::test]
    async fn unknown_path_is_404_and_wrong_method_is_405() {
        let app = Router::new().on(Method::Get, "/employees", |_req: Request| async { Status::Ok });

        assert_eq!(app.handle(Request::new(Method::Get, "/nope")).await.status_code(), 404);
        assert_eq!(app.handle(Request::new(Method::Delete, "/employees")).await.status_code(), 405);
    }

    #[tokio::test]
    async fn failing_middleware_skips_handler() {
        let app = Router::new().route(
            Method::Get,
            "/secret",
            vec![authorize(["admin"])],
            never,
        );

        let anon = app.handle(Request::new(Method::Get, "/secret")).await;
        assert_eq!(anon.status_code(), 401);

        let guest = Request::new(Method::Get, "/secret").with_identity(Identity::new("g", ["guest"]));
        assert_eq!(app.handle(guest).await.status_code(), 403);
    }

    #[test]
    fn bindings_keep_registration_order() {
        let app = Router::new()
            .route(Method::Get, "/a", vec![authorize(["admin"])], upload)
            .on(Method::Post, "/b", upload);

        let listed: Vec<_> = app.bindings().iter().map(|b| (b.method, b.path.as_str())).collect();
        assert_eq!(listed, [(Method::Get, "/a"), (Method::Post, "/b")]);
        assert_eq!(app.bindings()[0].middleware, ["authorize"]);
    }

    #[tokio::test]
    async fn layered_routes_run_on_spawned_tasks() {
        let app = Arc::new(
            Router::new()
                .layer(authorize(["admin", "guest"]))
                .route(Method::Get, "/secret", vec![authorize(["admin"])], |_req: Request| async { "in" }),
        );

        let spawn = |roles: &'static [&'static str]| {
            let app = Arc::clone(&app);
            tokio::spawn(async move {
                let req = Request::new(Method::Get, "/secret").with_identity(Identity::new("u", roles.iter().copied()));
                app.handle(req).await.status_code()
            })
        };

        assert_eq!(spawn(&["admin"]).await.unwrap(), 200);
        assert_eq!(spawn(&["guest"]).await.unwrap(), 403);
        assert_eq!(spawn(&["nobody"]).await.unwrap(), 403);
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn duplicate_binding_panics_at_startup() {
        let _ = Router::new()
            .on(Method::Get, "/a", upload)
            .on(Method::Get, "/a", upload);
    }
}
