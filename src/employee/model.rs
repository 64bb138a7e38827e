use serde::{Deserialize, Serialize};
use validator::Validate;

/// An employee as exposed over the API. Credentials never appear here.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub username: String,
    pub role: String,
    pub experience: Option<u32>,
    pub department_id: Option<String>,
    pub status: Option<String>,
}

/// Body of `POST /employees`.
#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,

    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    pub username: String,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,

    #[validate(length(min = 1, message = "role must not be empty"))]
    pub role: String,

    #[serde(default)]
    #[validate(range(max = 80))]
    pub experience: Option<u32>,

    #[serde(default)]
    pub department_id: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `PUT /employees/{id}`; absent fields are left unchanged.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployee {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub experience: Option<u32>,
    pub department_id: Option<String>,
    pub status: Option<String>,
}

/// Body of `POST /employees/login`.
#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// What a successful login returns.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
    pub token: String,
    pub employee: Employee,
}

/// Payload of `POST /employees/upload`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedPath {
    pub file_path: String,
}
