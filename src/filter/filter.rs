use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{Condition, FilterOrderInfo, SortDirection, SqlResult};

/// SELECT builder for a single table: AND-ed conditions, ordering, paging
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: String,
    conditions: Vec<Condition>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", table_name)));
        }
        Ok(Self {
            table_name,
            conditions: vec![],
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn where_eq(&mut self, column: &str, value: Value) -> Result<&mut Self, FilterError> {
        Self::validate_column(column)?;
        self.conditions.push(Condition::Eq { column: column.to_string(), value });
        Ok(self)
    }

    /// Case-insensitive substring match against any of `columns`. Blank terms are ignored.
    ///
    /// SQLite only folds ASCII, so the columns must hold text already passed
    /// through [`fold_search`] for non-ASCII letters to match.
    pub fn search(&mut self, columns: &[&str], term: &str) -> Result<&mut Self, FilterError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(self);
        }
        if columns.is_empty() {
            return Err(FilterError::InvalidSearch("search needs at least one column".to_string()));
        }
        for column in columns {
            Self::validate_column(column)?;
        }
        self.conditions.push(Condition::Search {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            term: term.to_string(),
        });
        Ok(self)
    }

    pub fn order(&mut self, column: &str, sort: SortDirection) -> Result<&mut Self, FilterError> {
        Self::validate_column(column)?;
        self.order_data.push(FilterOrderInfo { column: column.to_string(), sort });
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.conditions);
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT * FROM \"{}\"", self.table_name),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.conditions);
        let query = if where_clause.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table_name)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table_name, where_clause)
        };
        SqlResult { query, params }
    }

    fn validate_column(column: &str) -> Result<(), FilterError> {
        if !is_identifier(column) {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
        }
        Ok(())
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

/// Case folding shared by stored search columns and search terms
pub fn fold_search(text: &str) -> String {
    text.to_lowercase()
}

/// ASCII letters, digits and underscores, not starting with a digit
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_full_select() {
        let mut filter = Filter::new("service_items").unwrap();
        filter
            .where_eq("service_id", json!(1))
            .unwrap()
            .search(&["title", "icon"], "seo")
            .unwrap()
            .order("display_order", SortDirection::Asc)
            .unwrap()
            .order("id", SortDirection::Asc)
            .unwrap()
            .limit(50, Some(10))
            .unwrap();

        let sql = filter.to_sql();
        assert!(sql.query.starts_with("SELECT * FROM \"service_items\" WHERE \"service_id\" = ? AND ("));
        assert!(sql.query.ends_with("ORDER BY \"display_order\" ASC, \"id\" ASC LIMIT 50 OFFSET 10"));
        assert_eq!(sql.params.len(), 3);
    }

    #[test]
    fn blank_search_is_ignored() {
        let mut filter = Filter::new("services").unwrap();
        filter.search(&["title"], "   ").unwrap();
        assert_eq!(filter.to_sql().query, "SELECT * FROM \"services\"");
        assert_eq!(filter.to_count_sql().query, "SELECT COUNT(*) AS count FROM \"services\"");
    }

    #[test]
    fn rejects_bad_identifiers() {
        assert!(Filter::new("services; DROP TABLE users").is_err());
        assert!(Filter::new("1services").is_err());
        let mut filter = Filter::new("services").unwrap();
        assert!(filter.where_eq("title\" OR 1=1 --", json!("x")).is_err());
        assert!(filter.order("", SortDirection::Desc).is_err());
    }

    #[test]
    fn rejects_negative_paging() {
        let mut filter = Filter::new("services").unwrap();
        assert!(matches!(filter.limit(-1, None), Err(FilterError::InvalidLimit(_))));
        assert!(matches!(filter.limit(10, Some(-5)), Err(FilterError::InvalidOffset(_))));
    }
}
