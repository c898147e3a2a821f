use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{self, FromRow, Row, Sqlite, SqlitePool};

use crate::database::manager::DatabaseError;
use crate::filter::types::SqlResult;
use crate::filter::{is_identifier, Filter, FilterError};

/// Renders and runs statements for one table. Reads go through a `Filter`;
/// writes take column/value pairs whose names are checked as identifiers.
pub struct QueryBuilder<T> {
    table_name: String,
    filter: Option<Filter>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        let name = table_name.into();
        // Reuse Filter table name validation
        Filter::new(name.as_str())?;
        Ok(Self {
            table_name: name,
            filter: None,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub async fn select_all(self, pool: &SqlitePool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.sql_result();
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_all(pool).await?)
    }

    pub async fn select_optional(self, pool: &SqlitePool) -> Result<Option<T>, DatabaseError> {
        let sql_result = self.sql_result();
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_optional(pool).await?)
    }

    pub async fn count(self, pool: &SqlitePool) -> Result<i64, DatabaseError> {
        let sql_result = match &self.filter {
            Some(filter) => filter.to_count_sql(),
            None => SqlResult {
                query: format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table_name),
                params: vec![],
            },
        };

        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    pub async fn insert(self, pool: &SqlitePool, fields: &[(&str, Value)]) -> Result<T, DatabaseError> {
        let sql = self.insert_sql(fields)?;
        let mut q = sqlx::query_as::<_, T>(&sql);
        for (_, v) in fields {
            q = bind_param_query_as(q, v);
        }
        Ok(q.fetch_one(pool).await?)
    }

    /// Returns the updated row, or None when no row has `id`
    pub async fn update(self, pool: &SqlitePool, id: i64, fields: &[(&str, Value)]) -> Result<Option<T>, DatabaseError> {
        let sql = self.update_sql(fields)?;
        let mut q = sqlx::query_as::<_, T>(&sql);
        for (_, v) in fields {
            q = bind_param_query_as(q, v);
        }
        Ok(q.bind(id).fetch_optional(pool).await?)
    }

    pub async fn delete(self, pool: &SqlitePool, id: i64) -> Result<bool, DatabaseError> {
        let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = ?", self.table_name);
        let result = sqlx::query(&sql).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    fn sql_result(&self) -> SqlResult {
        match &self.filter {
            Some(filter) => filter.to_sql(),
            None => SqlResult { query: format!("SELECT * FROM \"{}\"", self.table_name), params: vec![] },
        }
    }

    fn insert_sql(&self, fields: &[(&str, Value)]) -> Result<String, DatabaseError> {
        let columns = quoted_columns(fields)?;
        let placeholders = vec!["?"; columns.len()].join(", ");
        Ok(format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            self.table_name,
            columns.join(", "),
            placeholders
        ))
    }

    fn update_sql(&self, fields: &[(&str, Value)]) -> Result<String, DatabaseError> {
        let sets: Vec<String> = quoted_columns(fields)?.into_iter().map(|c| format!("{} = ?", c)).collect();
        Ok(format!(
            "UPDATE \"{}\" SET {} WHERE \"id\" = ? RETURNING *",
            self.table_name,
            sets.join(", ")
        ))
    }
}

fn quoted_columns(fields: &[(&str, Value)]) -> Result<Vec<String>, DatabaseError> {
    if fields.is_empty() {
        return Err(DatabaseError::QueryError("no columns to write".to_string()));
    }
    fields
        .iter()
        .map(|(column, _)| {
            if is_identifier(column) {
                Ok(format!("\"{}\"", column))
            } else {
                Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)).into())
            }
        })
        .collect()
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    v: &'q Value,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        // Lists and objects live in TEXT columns as JSON
        Value::Array(_) | Value::Object(_) => q.bind(v.to_string()),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, Sqlite, O, SqliteArguments<'q>>
where
    O: for<'r> FromRow<'r, SqliteRow>,
{
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(sqlx::FromRow)]
    struct Row {
        #[allow(dead_code)]
        id: i64,
    }

    #[test]
    fn renders_insert_and_update() {
        let builder = QueryBuilder::<Row>::new("services").unwrap();
        let fields = [("title", json!("Web")), ("display_order", json!(1))];
        assert_eq!(
            builder.insert_sql(&fields).unwrap(),
            "INSERT INTO \"services\" (\"title\", \"display_order\") VALUES (?, ?) RETURNING *"
        );
        assert_eq!(
            builder.update_sql(&fields).unwrap(),
            "UPDATE \"services\" SET \"title\" = ?, \"display_order\" = ? WHERE \"id\" = ? RETURNING *"
        );
    }

    #[test]
    fn rejects_unsafe_or_empty_columns() {
        let builder = QueryBuilder::<Row>::new("services").unwrap();
        assert!(matches!(
            builder.insert_sql(&[("title) VALUES (1); --", json!("x"))]),
            Err(DatabaseError::Filter(FilterError::InvalidColumn(_)))
        ));
        assert!(matches!(builder.update_sql(&[]), Err(DatabaseError::QueryError(_))));
        assert!(QueryBuilder::<Row>::new("bad table").is_err());
    }
}
