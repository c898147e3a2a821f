use serde_json::Value;

/// A single WHERE predicate. Predicates in a filter are joined with AND.
#[derive(Debug, Clone)]
pub enum Condition {
    /// `column = value`
    Eq { column: String, value: Value },
    /// Case-insensitive substring match on any of the columns
    Search { columns: Vec<String>, term: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
