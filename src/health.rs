//! Kubernetes health probes, mounted at the server root.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! ```rust,no_run
//! use roster::{Router, health::HealthController};
//!
//! let app = Router::new().mount(HealthController::new());
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::controller::{Controller, Scope};
use crate::envelope::Envelope;
use crate::request::Request;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub state: &'static str,
    pub uptime_ms: u64,
}

pub struct HealthController {
    started: Instant,
}

impl HealthController {
    pub fn new() -> Self {
        Self { started: Instant::now() }
    }

    /// Always `200 ok`. No dependencies: if the process answers, it is alive.
    async fn liveness(self: Arc<Self>, _req: Request) -> &'static str {
        "ok"
    }

    async fn readiness(self: Arc<Self>, req: Request) -> Envelope<Readiness> {
        let uptime_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.envelope(&req, Readiness { state: "ready", uptime_ms })
    }
}

impl Default for HealthController {
    fn default() -> Self { Self::new() }
}

impl Controller for HealthController {
    fn path(&self) -> &str {
        ""
    }

    fn routes(scope: &mut Scope<'_, Self>) {
        scope
            .get("/healthz", vec![], Self::liveness)
            .get("/readyz", vec![], Self::readiness);
    }
}
