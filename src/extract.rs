//! Body, query and path extractors whose rejections render as
//! [`ErrorResponse`](crate::schemas::ErrorResponse) payloads.

use crate::error::{ApiError, FieldErrors};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{HeaderMap, header::CONTENT_TYPE, request::Parts},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;
use validator::Validate;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";
pub const NULL: &str = "This field may not be null.";
const NOT_A_STRING: &str = "Not a valid string.";
const NOT_AN_INTEGER: &str = "A valid integer is required.";
const INVALID: &str = "Invalid value.";

/// JSON request body.
///
/// An empty body reads as `{}`. Explicit `null` values and values of the
/// wrong type are reported against their field. Field validation is left to
/// the handler so it runs after the lookup and ownership checks.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = media_type(req.headers());
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            debug!("Failed to read request body: {}", rejection.body_text());
            ApiError::MalformedBody(rejection.body_text())
        })?;

        if bytes.is_empty() {
            return deserialize_object(Map::new()).map(ApiJson);
        }
        match content_type {
            Some(media) if is_json(&media) => {}
            Some(media) => return Err(ApiError::UnsupportedMediaType(media)),
            None => return Err(ApiError::UnsupportedMediaType(String::new())),
        }

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            debug!("Rejected malformed JSON body: {}", e);
            ApiError::MalformedBody(format!("JSON parse error - {}", e))
        })?;

        match value {
            Value::Object(object) => deserialize_object(object).map(ApiJson),
            other => Err(ApiError::field(
                NON_FIELD_ERRORS,
                format!("Invalid data. Expected a dictionary, but got {}.", kind(&other)),
            )),
        }
    }
}

/// Query string deserialized and validated in one step.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();
        let deserializer =
            serde_urlencoded::Deserializer::new(form_urlencoded::parse(query.as_bytes()));

        let value: T = serde_path_to_error::deserialize(deserializer).map_err(|e| {
            debug!("Rejected query parameter {}: {}", e.path(), e.inner());
            ApiError::field(field_name(&e.path().to_string()), invalid_value(&e.inner().to_string()))
        })?;
        value.validate()?;
        Ok(ApiQuery(value))
    }
}

/// Path parameters; a segment that does not parse is an unknown resource.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => {
                debug!("Rejected path {}: {}", parts.uri.path(), rejection.body_text());
                Err(ApiError::NotFound("Resource"))
            }
        }
    }
}

fn deserialize_object<T: DeserializeOwned>(object: Map<String, Value>) -> Result<T, ApiError> {
    let nulls: FieldErrors = object
        .iter()
        .filter(|(_, value)| value.is_null())
        .map(|(field, _)| (field.clone(), vec![NULL.to_string()]))
        .collect();
    if !nulls.is_empty() {
        debug!("Rejected null fields: {:?}", nulls.keys().collect::<Vec<_>>());
        return Err(ApiError::Validation(nulls));
    }

    serde_path_to_error::deserialize(Value::Object(object)).map_err(|e| {
        debug!("Rejected body field {}: {}", e.path(), e.inner());
        ApiError::field(field_name(&e.path().to_string()), invalid_value(&e.inner().to_string()))
    })
}

fn media_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = value.split(';').next().unwrap_or_default().trim();
    Some(essence.to_ascii_lowercase())
}

fn is_json(media: &str) -> bool {
    media == "application/json" || (media.starts_with("application/") && media.ends_with("+json"))
}

fn field_name(path: &str) -> String {
    if path == "." {
        NON_FIELD_ERRORS.to_string()
    } else {
        path.to_string()
    }
}

/// Client message for a value serde could not convert.
fn invalid_value(detail: &str) -> &'static str {
    if detail.contains("expected a string") {
        NOT_A_STRING
    } else if ["expected i", "expected u", "integer", "digit", "number"]
        .iter()
        .any(|hint| detail.contains(hint))
    {
        NOT_AN_INTEGER
    } else {
        INVALID
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
