use serde::Deserialize;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult, ErrorCode};

/// Raw `?limit=&offset=` values. Kept as strings so bad input maps to our own error code
/// instead of axum's query rejection.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Missing limit uses the default; larger limits are clamped to the maximum
    pub fn from_query(query: &PageQuery, api: &ApiConfig) -> ApiResult<Self> {
        let limit = match blank_to_none(&query.limit) {
            None => api.default_list_limit,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n > 0 => n.min(api.max_list_limit),
                _ => return Err(invalid("limit must be a positive integer")),
            },
        };
        let offset = match blank_to_none(&query.offset) {
            None => 0,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 0 => n,
                _ => return Err(invalid("offset must be a non-negative integer")),
            },
        };
        Ok(Self { limit, offset })
    }
}

fn blank_to_none(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn invalid(message: &str) -> ApiError {
    ApiError::bad_request(ErrorCode::InvalidPagination, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn page(limit: Option<&str>, offset: Option<&str>) -> ApiResult<Page> {
        let query = PageQuery { limit: limit.map(String::from), offset: offset.map(String::from) };
        Page::from_query(&query, &AppConfig::development().api)
    }

    #[test]
    fn defaults_and_clamp() {
        assert_eq!(page(None, None).unwrap(), Page { limit: 50, offset: 0 });
        assert_eq!(page(Some("500"), Some("20")).unwrap(), Page { limit: 100, offset: 20 });
        assert_eq!(page(Some(""), None).unwrap().limit, 50);
    }

    #[test]
    fn rejects_bad_values() {
        for (limit, offset) in [(Some("0"), None), (Some("-1"), None), (Some("ten"), None), (None, Some("-5"))] {
            assert_eq!(page(limit, offset).unwrap_err().error_code(), ErrorCode::InvalidPagination);
        }
    }
}
