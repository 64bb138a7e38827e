use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{BoxedMiddleware, Middleware};
use crate::error::{Error, Violation};
use crate::request::Request;

/// Checks the JSON body against the shape `T` and stores the coerced value.
///
/// `T` is the shape descriptor: its serde definition fixes field names, types
/// and which fields are required; its `validator` attributes add per-field
/// rules. Every rule violation is reported, not just the first.
pub struct Validate<T> {
    shape: PhantomData<fn() -> T>,
}

/// `validate::<CreateEmployee>()`
pub fn validate<T>() -> BoxedMiddleware
where
    T: DeserializeOwned + Serialize + validator::Validate + Send + 'static,
{
    Arc::new(Validate::<T> { shape: PhantomData })
}

#[async_trait]
impl<T> Middleware for Validate<T>
where
    T: DeserializeOwned + Serialize + validator::Validate + Send + 'static,
{
    fn name(&self) -> &str {
        "validate"
    }

    async fn handle(&self, mut req: Request) -> Result<Request, Error> {
        let coerced = check::<T>(req.body())?;
        req.set_json(coerced);
        Ok(req)
    }
}

fn check<T>(body: &[u8]) -> Result<serde_json::Value, Error>
where
    T: DeserializeOwned + Serialize + validator::Validate,
{
    let raw: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| Error::invalid("body", format!("malformed JSON: {e}")))?;
    let input: T = serde_json::from_value(raw)
        .map_err(|e| Error::ValidationFailed(vec![shape_violation(&e)]))?;
    input.validate().map_err(|errors| Error::ValidationFailed(rule_violations(&errors)))?;
    serde_json::to_value(&input).map_err(|e| Error::Internal(format!("re-encoding validated body: {e}")))
}

/// serde stops at the first structural problem; name the field when it says which.
fn shape_violation(err: &serde_json::Error) -> Violation {
    let message = err.to_string();
    let field = ["missing field `", "unknown field `"]
        .iter()
        .find_map(|prefix| message.strip_prefix(prefix))
        .and_then(|rest| rest.split('`').next())
        .unwrap_or("body")
        .to_owned();
    Violation::new(field, message)
}

fn rule_violations(errors: &validator::ValidationErrors) -> Vec<Violation> {
    let mut out: Vec<Violation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| format!("failed `{}` check", err.code));
                Violation::new(field.to_string(), message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use validator::Validate as _;

    use super::*;
    use crate::method::Method;

    #[derive(Debug, Deserialize, Serialize, validator::Validate)]
    struct Shape {
        #[validate(length(min = 1))]
        name: String,
        #[validate(length(min = 6, message = "must be at least 6 characters"))]
        password: String,
        #[serde(default)]
        #[validate(range(max = 60))]
        years: Option<u32>,
    }

    fn post(body: &str) -> Request {
        Request::new(Method::Post, "/").with_body(body.to_owned())
    }

    #[tokio::test]
    async fn valid_body_is_coerced_and_stored() {
        let req = validate::<Shape>()
            .handle(post(r#"{"name":"Ada","password":"secret1","extra":true}"#))
            .await
            .unwrap();
        let shape: Shape = req.json().unwrap();
        assert_eq!(shape.name, "Ada");
        assert!(shape.validate().is_ok());
    }

    #[tokio::test]
    async fn missing_field_is_named() {
        let err = validate::<Shape>().handle(post(r#"{"password":"secret1"}"#)).await.unwrap_err();
        match err {
            Error::ValidationFailed(v) => assert_eq!(v[0].field, "name"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn every_rule_violation_is_reported() {
        let err = validate::<Shape>()
            .handle(post(r#"{"name":"","password":"123","years":99}"#))
            .await
            .unwrap_err();
        let Error::ValidationFailed(v) = err else { panic!("expected ValidationFailed") };
        let fields: Vec<_> = v.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["name", "password", "years"]);
        assert_eq!(v[1].message, "must be at least 6 characters");
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let err = validate::<Shape>().handle(post("not json")).await.unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(ref v) if v[0].field == "body"));
    }
}
