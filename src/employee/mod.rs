//! The employee resource: API models, the service seam, the HTTP controller
//! and a process-local service implementation.

mod controller;
mod memory;
mod model;
mod service;

pub use controller::{EmployeeController, PublicLinks, UPLOAD_FIELD};
pub use memory::InMemoryEmployeeService;
pub use model::{CreateEmployee, Credentials, Employee, Session, UpdateEmployee, UploadedPath};
pub use service::EmployeeService;
