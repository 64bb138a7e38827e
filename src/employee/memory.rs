//! Process-local employee store.
//!
//! Backs the binary when no external persistence is wired in. Passwords are
//! kept as bcrypt hashes; hashing and verification run on the blocking pool.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::model::{CreateEmployee, Employee, Session, UpdateEmployee};
use super::service::EmployeeService;
use crate::auth::{Identity, TokenIssuer};
use crate::error::Error;

struct Record {
    employee: Employee,
    password_hash: String,
}

pub struct InMemoryEmployeeService {
    records: RwLock<HashMap<String, Record>>,
    tokens: TokenIssuer,
    cost: u32,
}

impl InMemoryEmployeeService {
    pub fn new(tokens: TokenIssuer) -> Self {
        Self { records: RwLock::new(HashMap::new()), tokens, cost: bcrypt::DEFAULT_COST }
    }

    /// bcrypt work factor; 4 is the minimum bcrypt accepts.
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// Insert an account directly, bypassing the API. Used to bootstrap the
    /// first admin.
    pub async fn seed(&self, name: &str, username: &str, password: &str, role: &str) -> Result<Employee, Error> {
        let employee = self
            .create(CreateEmployee {
                name: name.to_owned(),
                username: username.to_owned(),
                password: password.to_owned(),
                role: role.to_owned(),
                experience: None,
                department_id: None,
                status: None,
            })
            .await?;
        info!(username, role, "seeded account");
        Ok(employee)
    }

    async fn hash(&self, password: String) -> Result<String, Error> {
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| Error::Internal(format!("hashing task failed: {e}")))?
            .map_err(|e| Error::Internal(format!("bcrypt: {e}")))
    }

    async fn verify(password: String, hash: String) -> Result<bool, Error> {
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| Error::Internal(format!("verification task failed: {e}")))?
            .map_err(|e| Error::Internal(format!("bcrypt: {e}")))
    }
}

fn username_taken(records: &HashMap<String, Record>, username: &str, except: Option<&str>) -> bool {
    records
        .values()
        .any(|r| r.employee.username == username && Some(r.employee.id.as_str()) != except)
}

fn not_found(id: &str) -> Error {
    Error::NotFound(format!("employee {id}"))
}

#[async_trait]
impl EmployeeService for InMemoryEmployeeService {
    async fn list(&self) -> Result<Vec<Employee>, Error> {
        let records = self.records.read().await;
        let mut all: Vec<Employee> = records.values().map(|r| r.employee.clone()).collect();
        all.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(all)
    }

    async fn get(&self, id: &str) -> Result<Employee, Error> {
        self.records
            .read()
            .await
            .get(id)
            .map(|r| r.employee.clone())
            .ok_or_else(|| not_found(id))
    }

    async fn create(&self, input: CreateEmployee) -> Result<Employee, Error> {
        let password_hash = self.hash(input.password).await?;

        let mut records = self.records.write().await;
        if username_taken(&records, &input.username, None) {
            return Err(Error::Conflict(format!("username `{}` already exists", input.username)));
        }
        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            username: input.username,
            role: input.role,
            experience: input.experience,
            department_id: input.department_id,
            status: input.status,
        };
        records.insert(employee.id.clone(), Record { employee: employee.clone(), password_hash });
        Ok(employee)
    }

    async fn update(&self, id: &str, patch: UpdateEmployee) -> Result<Employee, Error> {
        let new_hash = match patch.password {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };

        let mut records = self.records.write().await;
        if let Some(username) = &patch.username {
            if username_taken(&records, username, Some(id)) {
                return Err(Error::Conflict(format!("username `{username}` already exists")));
            }
        }
        let record = records.get_mut(id).ok_or_else(|| not_found(id))?;

        let e = &mut record.employee;
        if let Some(name) = patch.name { e.name = name; }
        if let Some(username) = patch.username { e.username = username; }
        if let Some(role) = patch.role { e.role = role; }
        if patch.experience.is_some() { e.experience = patch.experience; }
        if patch.department_id.is_some() { e.department_id = patch.department_id; }
        if patch.status.is_some() { e.status = patch.status; }
        if let Some(hash) = new_hash { record.password_hash = hash; }

        Ok(record.employee.clone())
    }

    async fn delete(&self, id: &str) -> Result<Employee, Error> {
        self.records
            .write()
            .await
            .remove(id)
            .map(|r| r.employee)
            .ok_or_else(|| not_found(id))
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session, Error> {
        let found = {
            let records = self.records.read().await;
            records
                .values()
                .find(|r| r.employee.username == username)
                .map(|r| (r.employee.clone(), r.password_hash.clone()))
        };
        let Some((employee, hash)) = found else {
            return Err(Error::Unauthenticated);
        };
        if !Self::verify(password.to_owned(), hash).await? {
            return Err(Error::Unauthenticated);
        }

        let token = self.tokens.issue(&Identity::new(employee.id.clone(), [employee.role.clone()]))?;
        Ok(Session { token, employee })
    }
}
