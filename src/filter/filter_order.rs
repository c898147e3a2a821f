use super::types::FilterOrderInfo;

pub struct FilterOrder;

impl FilterOrder {
    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::SortDirection;

    #[test]
    fn joins_columns_in_order() {
        let infos = vec![
            FilterOrderInfo { column: "display_order".into(), sort: SortDirection::Asc },
            FilterOrderInfo { column: "id".into(), sort: SortDirection::Desc },
        ];
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"display_order\" ASC, \"id\" DESC");
        assert_eq!(FilterOrder::generate(&[]), "");
    }
}
