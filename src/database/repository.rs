use serde::Serialize;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

use crate::database::manager::{DatabaseError, Store};
use crate::database::query_builder::QueryBuilder;
use crate::filter::{fold_search, Filter};
use crate::types::now_timestamp;

/// A row type backed by one table with an integer `id` and ISO timestamps
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + Serialize {
    const TABLE: &'static str;

    /// `(source, folded)` column pairs. Writes to a source column also store
    /// its [`fold_search`] form, which is what searches compare against.
    const SEARCH_COLUMNS: &'static [(&'static str, &'static str)] = &[];
}

/// Column/value pairs for an insert or update
#[derive(Debug, Default, Clone)]
pub struct Fields(Vec<(&'static str, Value)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Only set when a value is present. Used for partial updates.
    pub fn set_some<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.push(column, v);
        }
        self
    }

    pub fn push(&mut self, column: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.0.push((column, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[(&'static str, Value)] {
        &self.0
    }

    fn get(&self, column: &str) -> Option<&Value> {
        self.0.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    /// Fill the folded copy of every written source column
    fn with_search_columns(mut self, pairs: &[(&'static str, &'static str)]) -> Self {
        for &(source, folded) in pairs {
            let text = match self.get(source) {
                Some(Value::String(s)) => fold_search(s),
                Some(Value::Null) | None => continue,
                Some(other) => fold_search(&other.to_string()),
            };
            self.push(folded, text);
        }
        self
    }
}

/// Table access for one entity. Every call runs under the store deadline.
pub struct Repository<T> {
    store: Store,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Entity> Repository<T> {
    pub fn new(store: &Store) -> Self {
        Self {
            store: store.clone(),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Empty filter on this entity's table
    pub fn filter(&self) -> Result<Filter, DatabaseError> {
        Ok(Filter::new(T::TABLE)?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<T>, DatabaseError> {
        let mut filter = self.filter()?;
        filter.where_eq("id", json!(id))?;
        self.store
            .bounded(QueryBuilder::<T>::new(T::TABLE)?.filter(filter).select_optional(self.store.pool()))
            .await
    }

    pub async fn find_one(&self, mut filter: Filter) -> Result<Option<T>, DatabaseError> {
        filter.limit(1, None)?;
        self.store
            .bounded(QueryBuilder::<T>::new(T::TABLE)?.filter(filter).select_optional(self.store.pool()))
            .await
    }

    pub async fn list(&self, filter: Filter) -> Result<Vec<T>, DatabaseError> {
        self.store
            .bounded(QueryBuilder::<T>::new(T::TABLE)?.filter(filter).select_all(self.store.pool()))
            .await
    }

    pub async fn count(&self, filter: Filter) -> Result<i64, DatabaseError> {
        self.store
            .bounded(QueryBuilder::<T>::new(T::TABLE)?.filter(filter).count(self.store.pool()))
            .await
    }

    pub async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut filter = self.filter()?;
        filter.where_eq("id", json!(id))?;
        Ok(self.count(filter).await? > 0)
    }

    /// Insert and return the stored row, with both timestamps set to now
    pub async fn insert(&self, fields: Fields) -> Result<T, DatabaseError> {
        let now = now_timestamp();
        let fields = fields
            .with_search_columns(T::SEARCH_COLUMNS)
            .set("created_at", now.clone())
            .set("updated_at", now);
        self.store
            .bounded(QueryBuilder::<T>::new(T::TABLE)?.insert(self.store.pool(), fields.as_slice()))
            .await
    }

    /// Apply a partial update and bump `updated_at`. None when `id` is absent.
    pub async fn update(&self, id: i64, fields: Fields) -> Result<Option<T>, DatabaseError> {
        let fields = fields.with_search_columns(T::SEARCH_COLUMNS).set("updated_at", now_timestamp());
        self.store
            .bounded(QueryBuilder::<T>::new(T::TABLE)?.update(self.store.pool(), id, fields.as_slice()))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        self.store
            .bounded(QueryBuilder::<T>::new(T::TABLE)?.delete(self.store.pool(), id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Service;
    use crate::filter::SortDirection;

    fn service(title: &str, order: i64) -> Fields {
        Fields::new()
            .set("icon", "code")
            .set("title", title)
            .set("description", "desc")
            .set("display_order", order)
    }

    #[test]
    fn fields_overwrite_repeated_columns() {
        let fields = Fields::new().set("title", "a").set("title", "b").set_some("icon", None::<String>);
        assert_eq!(fields.as_slice(), &[("title", json!("b"))]);
    }

    #[test]
    fn search_columns_follow_their_source() {
        let pairs = &[("title", "search_title"), ("tags", "search_tags"), ("icon", "search_icon")];
        let fields = Fields::new()
            .set("title", "ÉCOLE Design")
            .set("tags", json!(["Ürban"]))
            .with_search_columns(pairs);
        assert_eq!(fields.get("search_title"), Some(&json!("école design")));
        assert_eq!(fields.get("search_tags"), Some(&json!("[\"ürban\"]")));
        assert_eq!(fields.get("search_icon"), None);
    }

    #[tokio::test]
    async fn insert_get_update_delete() {
        let store = Store::in_memory().await.unwrap();
        let repo = Repository::<Service>::new(&store);

        let created = repo.insert(service("Web", 2)).await.unwrap();
        assert_eq!(created.title, "Web");
        assert!(created.is_active);
        assert_eq!(created.gradient, "");
        assert_eq!(created.created_at, created.updated_at);

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);

        let updated = repo
            .update(created.id, Fields::new().set("title", "Web Design"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Web Design");
        assert!(repo.update(999_999, Fields::new().set("title", "x")).await.unwrap().is_none());

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.exists(created.id).await.unwrap());
        assert!(repo.get(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_honours_filter_order_and_count() {
        let store = Store::in_memory().await.unwrap();
        let repo = Repository::<Service>::new(&store);
        repo.insert(service("Branding", 3)).await.unwrap();
        repo.insert(service("Web", 1)).await.unwrap();
        repo.insert(service("Mobile", 2)).await.unwrap();

        let mut filter = repo.filter().unwrap();
        filter.order("display_order", SortDirection::Asc).unwrap();
        let titles: Vec<String> = repo.list(filter).await.unwrap().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Web", "Mobile", "Branding"]);

        let mut filter = repo.filter().unwrap();
        filter.search(&["title"], "BRAND").unwrap();
        assert_eq!(repo.count(filter).await.unwrap(), 1);
    }
}
