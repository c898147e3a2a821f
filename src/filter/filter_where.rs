use serde_json::Value;

use super::filter::fold_search;
use super::types::Condition;

pub struct FilterWhere;

impl FilterWhere {
    /// Render conditions to a WHERE body with `?` placeholders and the values to bind, in order.
    pub fn generate(conditions: &[Condition]) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let mut parts = Vec::with_capacity(conditions.len());

        for condition in conditions {
            match condition {
                Condition::Eq { column, value } => {
                    if value.is_null() {
                        parts.push(format!("\"{}\" IS NULL", column));
                    } else {
                        parts.push(format!("\"{}\" = ?", column));
                        params.push(value.clone());
                    }
                }
                Condition::Search { columns, term } => {
                    let pattern = format!("%{}%", escape_like(&fold_search(term)));
                    let ors: Vec<String> = columns
                        .iter()
                        .map(|c| {
                            params.push(Value::String(pattern.clone()));
                            format!("\"{}\" LIKE ? ESCAPE '\\'", c)
                        })
                        .collect();
                    parts.push(format!("({})", ors.join(" OR ")));
                }
            }
        }

        (parts.join(" AND "), params)
    }
}

/// Escape LIKE wildcards so user input only ever matches literally
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eq_and_search_are_anded() {
        let conditions = vec![
            Condition::Eq { column: "service_id".into(), value: json!(3) },
            Condition::Search { columns: vec!["title".into(), "icon".into()], term: "Web".into() },
        ];
        let (sql, params) = FilterWhere::generate(&conditions);
        assert_eq!(
            sql,
            "\"service_id\" = ? AND (\"title\" LIKE ? ESCAPE '\\' OR \"icon\" LIKE ? ESCAPE '\\')"
        );
        assert_eq!(params, vec![json!(3), json!("%web%"), json!("%web%")]);
    }

    #[test]
    fn null_eq_becomes_is_null() {
        let (sql, params) = FilterWhere::generate(&[Condition::Eq { column: "cover_image".into(), value: Value::Null }]);
        assert_eq!(sql, "\"cover_image\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn search_term_is_folded_beyond_ascii() {
        let (_, params) = FilterWhere::generate(&[Condition::Search {
            columns: vec!["search_title".into()],
            term: "ÉCOLE".into(),
        }]);
        assert_eq!(params, vec![json!("%école%")]);
    }

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
