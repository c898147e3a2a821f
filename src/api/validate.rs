use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult, ErrorCode};

/// A JSON object request body with typed field accessors.
///
/// Accessors report the first problem they find with the given code, so a
/// handler that calls them in order gets first-failure-wins validation.
#[derive(Debug, Clone)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Malformed JSON, a wrong content type and non-object bodies all fail with `INVALID_JSON`
    pub fn from_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Self> {
        match body {
            Ok(Json(Value::Object(map))) => Ok(Self(map)),
            Ok(Json(_)) => Err(ApiError::bad_request(ErrorCode::InvalidJson, "Request body must be a JSON object")),
            Err(rejection) => {
                tracing::debug!("Rejected request body: {}", rejection.body_text());
                Err(ApiError::bad_request(ErrorCode::InvalidJson, "Request body must be valid JSON"))
            }
        }
    }

    pub fn from_value(value: Value) -> ApiResult<Self> {
        Self::from_body(Ok(Json(value)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Present and not null
    pub fn has(&self, field: &str) -> bool {
        !matches!(self.0.get(field), None | Some(Value::Null))
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// A non-blank string, trimmed
    pub fn required_str(&self, field: &str, code: ErrorCode, message: &str) -> ApiResult<String> {
        match self.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            _ => Err(ApiError::bad_request(code, message)),
        }
    }

    /// Required string using the generic `MISSING_FIELD` code
    pub fn require(&self, field: &str) -> ApiResult<String> {
        self.required_str(field, ErrorCode::MissingField, &format!("{} is required", field))
    }

    /// Absent, null and blank all read as None
    pub fn optional_str(&self, field: &str) -> ApiResult<Option<String>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => {
                let s = s.trim();
                Ok(if s.is_empty() { None } else { Some(s.to_string()) })
            }
            Some(_) => Err(invalid_field(field, "must be a string")),
        }
    }

    pub fn optional_int(&self, field: &str, code: ErrorCode) -> ApiResult<Option<i64>> {
        match self.get(field) {
            None => Ok(None),
            Some(v) => as_integer(v)
                .map(Some)
                .ok_or_else(|| ApiError::bad_request(code, format!("{} must be an integer", field))),
        }
    }

    pub fn optional_bool(&self, field: &str) -> ApiResult<Option<bool>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(invalid_field(field, "must be a boolean")),
        }
    }

    /// An array of strings; blank entries are dropped
    pub fn optional_str_list(&self, field: &str) -> ApiResult<Option<Vec<String>>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| v.as_str().map(|s| s.trim().to_string()))
                .collect::<Option<Vec<_>>>()
                .map(|list| Some(list.into_iter().filter(|s| !s.is_empty()).collect()))
                .ok_or_else(|| invalid_field(field, "must be an array of strings")),
            Some(_) => Err(invalid_field(field, "must be an array of strings")),
        }
    }

    /// Service item labels: an array of strings, or a string holding one as JSON
    pub fn item_labels(&self, field: &str) -> ApiResult<Vec<String>> {
        let value = self
            .get(field)
            .ok_or_else(|| ApiError::bad_request(ErrorCode::MissingItems, "Items are required"))?;
        parse_labels(value)
    }

    pub fn email(&self, field: &str) -> ApiResult<String> {
        let raw = self.require(field)?;
        normalize_email(&raw)
    }
}

fn invalid_field(field: &str, problem: &str) -> ApiError {
    ApiError::bad_request(ErrorCode::InvalidField, format!("{} {}", field, problem))
}

fn parse_labels(value: &Value) -> ApiResult<Vec<String>> {
    let parsed;
    let list = match value {
        Value::Array(list) => list,
        Value::String(raw) => {
            parsed = serde_json::from_str::<Value>(raw).map_err(|_| {
                ApiError::bad_request(ErrorCode::InvalidJsonItems, "Items must be an array or a JSON-encoded array")
            })?;
            match &parsed {
                Value::Array(list) => list,
                _ => return Err(items_format_error()),
            }
        }
        _ => return Err(items_format_error()),
    };

    let labels = list
        .iter()
        .map(|v| v.as_str().map(|s| s.trim().to_string()))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(items_format_error)?;
    let labels: Vec<String> = labels.into_iter().filter(|s| !s.is_empty()).collect();

    if labels.is_empty() {
        return Err(ApiError::bad_request(ErrorCode::EmptyItemsArray, "Items must contain at least one entry"));
    }
    Ok(labels)
}

fn items_format_error() -> ApiError {
    ApiError::bad_request(ErrorCode::InvalidItemsFormat, "Items must be an array of strings")
}

/// Integral JSON number, or a string holding one
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Path or query id: a positive integer
pub fn parse_id(raw: &str, code: ErrorCode) -> ApiResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request(code, format!("Invalid id: {}", raw))),
    }
}

/// `?featured=true` style query flags
pub fn parse_flag(field: &str, raw: &str) -> ApiResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid_field(field, "must be true or false")),
    }
}

/// Calendar date in `YYYY-MM-DD` form
pub fn validate_date(field: &str, raw: &str) -> ApiResult<String> {
    chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| invalid_field(field, "must be a date in YYYY-MM-DD form"))
}

/// RFC 3339 timestamp, normalized to UTC with millisecond precision so stored
/// values sort the same as text and as instants
pub fn validate_timestamp(field: &str, raw: &str) -> ApiResult<String> {
    chrono::DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| {
            t.with_timezone(&chrono::Utc)
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        })
        .map_err(|_| invalid_field(field, "must be an RFC 3339 timestamp"))
}

pub fn normalize_email(raw: &str) -> ApiResult<String> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.contains(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(ApiError::bad_request(ErrorCode::InvalidEmail, "A valid email address is required"))
    }
}

/// Lowercase letters, digits and single hyphens
pub fn validate_slug(raw: &str) -> ApiResult<String> {
    let slug = raw.trim();
    let valid = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(slug.to_string())
    } else {
        Err(ApiError::bad_request(
            ErrorCode::InvalidSlug,
            "Slug may only contain lowercase letters, digits and hyphens",
        ))
    }
}
