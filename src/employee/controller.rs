use std::sync::Arc;

use tracing::info;

use super::model::{CreateEmployee, Credentials, Employee, Session, UpdateEmployee, UploadedPath};
use super::service::EmployeeService;
use crate::controller::{Controller, Scope};
use crate::envelope::Envelope;
use crate::error::Error;
use crate::middleware::{authorize, upload, validate};
use crate::request::Request;
use crate::status::Status;
use crate::upload::UploadStore;

/// Multipart field the upload route reads.
pub const UPLOAD_FIELD: &str = "file";

/// How a stored upload path becomes a public link.
#[derive(Clone, Debug)]
pub struct PublicLinks {
    /// Public base the relative path is joined to, e.g. `http://localhost:3000`.
    pub base_path: String,
    /// Leading characters of the store's path that are not part of the public
    /// path (`"public/".len()` for the default disk layout).
    pub strip_prefix_len: usize,
}

impl PublicLinks {
    pub fn resolve(&self, stored_path: &str) -> Result<String, Error> {
        let relative = stored_path.get(self.strip_prefix_len..).ok_or_else(|| {
            Error::Internal(format!(
                "stored path `{stored_path}` is shorter than the {}-character storage prefix",
                self.strip_prefix_len
            ))
        })?;
        Ok(format!("{}/{}", self.base_path.trim_end_matches('/'), relative))
    }
}

/// `{api_prefix}/employees`: CRUD, avatar upload and login.
pub struct EmployeeController {
    path: String,
    service: Arc<dyn EmployeeService>,
    store: Arc<dyn UploadStore>,
    links: PublicLinks,
}

impl EmployeeController {
    pub fn new(
        api_prefix: &str,
        service: Arc<dyn EmployeeService>,
        store: Arc<dyn UploadStore>,
        links: PublicLinks,
    ) -> Self {
        Self {
            path: format!("{}/employees", api_prefix.trim_end_matches('/')),
            service,
            store,
            links,
        }
    }

    async fn get_all(self: Arc<Self>, req: Request) -> Result<Envelope<Vec<Employee>>, Error> {
        let data = self.service.list().await?;
        Ok(self.envelope(&req, data))
    }

    async fn get_by_id(self: Arc<Self>, req: Request) -> Result<Envelope<Employee>, Error> {
        let data = self.service.get(employee_id(&req)?).await?;
        Ok(self.envelope(&req, data))
    }

    async fn create(self: Arc<Self>, req: Request) -> Result<Envelope<Employee>, Error> {
        let input: CreateEmployee = req.json()?;
        let data = self.service.create(input).await?;
        info!(id = %data.id, username = %data.username, "employee created");
        Ok(self.envelope(&req, data))
    }

    /// Answers 201 on success.
    async fn update(self: Arc<Self>, req: Request) -> Result<(Status, Envelope<Employee>), Error> {
        let patch: UpdateEmployee = req.json()?;
        let data = self.service.update(employee_id(&req)?, patch).await?;
        Ok((Status::Created, self.envelope(&req, data)))
    }

    /// Answers 201 on success, like update.
    async fn delete(self: Arc<Self>, req: Request) -> Result<(Status, Envelope<Employee>), Error> {
        let data = self.service.delete(employee_id(&req)?).await?;
        info!(id = %data.id, "employee deleted");
        Ok((Status::Created, self.envelope(&req, data)))
    }

    async fn upload_file(self: Arc<Self>, req: Request) -> Result<Envelope<UploadedPath>, Error> {
        let stored = req
            .file()
            .ok_or_else(|| Error::invalid(UPLOAD_FIELD, "no file uploaded under this field"))?;
        let file_path = self.links.resolve(&stored.path)?;
        Ok(self.envelope(&req, UploadedPath { file_path }))
    }

    async fn login(self: Arc<Self>, req: Request) -> Result<Envelope<Session>, Error> {
        let creds: Credentials = req.json()?;
        let data = self.service.login(&creds.username, &creds.password).await?;
        Ok(self.envelope(&req, data))
    }
}

fn employee_id(req: &Request) -> Result<&str, Error> {
    req.param("id").ok_or_else(|| Error::invalid("id", "missing employee id"))
}

impl Controller for EmployeeController {
    fn path(&self) -> &str {
        &self.path
    }

    fn routes(scope: &mut Scope<'_, Self>) {
        let store = Arc::clone(&scope.controller().store);
        scope
            .get("", vec![authorize(["admin", "Engineer"])], Self::get_all)
            .get("/{id}", vec![], Self::get_by_id)
            .post("", vec![validate::<CreateEmployee>(), authorize(["admin"])], Self::create)
            .put("/{id}", vec![], Self::update)
            .delete("/{id}", vec![], Self::delete)
            .post("/upload", vec![upload::single(UPLOAD_FIELD, store)], Self::upload_file)
            .post("/login", vec![], Self::login);
    }
}
