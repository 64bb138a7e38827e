use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use roster::auth::TokenIssuer;
use roster::config::Settings;
use roster::employee::{EmployeeController, InMemoryEmployeeService, PublicLinks};
use roster::health::HealthController;
use roster::middleware::authenticate;
use roster::upload::DiskStore;
use roster::{Router, Server, logging};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("roster: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&settings.logging) {
        eprintln!("roster: cannot initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<(), roster::Error> {
    let tokens = TokenIssuer::new(
        settings.auth.jwt_secret.as_bytes(),
        Duration::from_secs(settings.auth.token_ttl_secs),
    );

    let employees = InMemoryEmployeeService::new(tokens.clone());
    if let (Some(username), Some(password)) = (&settings.auth.admin_username, &settings.auth.admin_password) {
        employees.seed("Administrator", username, password, "admin").await?;
    }

    let links = PublicLinks {
        base_path: settings.upload.base_path.clone(),
        strip_prefix_len: settings.upload.strip_prefix_len,
    };
    let app = Router::new()
        .layer(authenticate(tokens))
        .mount(HealthController::new())
        .mount(EmployeeController::new(
            &settings.api.prefix,
            Arc::new(employees),
            Arc::new(DiskStore::new(&settings.upload.dir)),
            links,
        ));

    Server::bind(settings.server.addr)
        .max_body_bytes(settings.server.max_body_bytes)
        .serve(app)
        .await
}
