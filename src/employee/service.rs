use async_trait::async_trait;

use super::model::{CreateEmployee, Employee, Session, UpdateEmployee};
use crate::error::Error;

/// Business operations the employee controller calls, one per route.
///
/// Implementations report a missing entity as [`Error::NotFound`] and bad
/// credentials as [`Error::Unauthenticated`]; anything else they raise is
/// passed to the error stage untouched.
#[async_trait]
pub trait EmployeeService: Send + Sync {
    async fn list(&self) -> Result<Vec<Employee>, Error>;

    async fn get(&self, id: &str) -> Result<Employee, Error>;

    async fn create(&self, input: CreateEmployee) -> Result<Employee, Error>;

    async fn update(&self, id: &str, patch: UpdateEmployee) -> Result<Employee, Error>;

    /// Returns the removed employee.
    async fn delete(&self, id: &str) -> Result<Employee, Error>;

    async fn login(&self, username: &str, password: &str) -> Result<Session, Error>;
}
