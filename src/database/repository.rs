use serde::Serialize;
use serde_json::{json, Value};
use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::pagination::{PageQuery, Paged};
use crate::database::query_builder::QueryBuilder;
use crate::filter::{FilterData, Projection};

/// A row type stored in its own table, addressable by a text `id`
pub trait Document: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin {
    const TABLE: &'static str;
    /// Columns that list filters and sorts may reference
    const COLUMNS: &'static [&'static str];
}

/// Generic reads and deletes for any [`Document`]
pub struct Repository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Document> Repository<T> {
    pub fn new(pool: &PgPool) -> Self {
        Self {
            pool: pool.clone(),
            _phantom: std::marker::PhantomData,
        }
    }

    fn query(&self) -> Result<QueryBuilder<T>, DatabaseError> {
        QueryBuilder::<T>::new(T::TABLE, T::COLUMNS)
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        self.query()?.filter(filter_data)?.select_all(&self.pool).await
    }

    pub async fn find_one(&self, where_clause: Value) -> Result<Option<T>, DatabaseError> {
        let filter_data = FilterData {
            where_clause: Some(where_clause),
            limit: Some(1),
            ..Default::default()
        };
        self.query()?.filter(filter_data)?.select_optional(&self.pool).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>, DatabaseError> {
        self.find_one(json!({ "_id": id })).await
    }

    pub async fn find_404(&self, id: &str) -> Result<T, DatabaseError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", T::TABLE, id)))
    }

    pub async fn count(&self, where_clause: Value) -> Result<i64, DatabaseError> {
        self.query()?
            .filter(FilterData::with_where(where_clause))?
            .count(&self.pool)
            .await
    }

    pub async fn delete_many(&self, where_clause: Value) -> Result<u64, DatabaseError> {
        self.query()?
            .filter(FilterData::with_where(where_clause))?
            .delete(&self.pool)
            .await
    }

    /// Delete one document, failing with `NotFound` when nothing matched
    pub async fn delete_404(&self, id: &str) -> Result<(), DatabaseError> {
        match self.delete_many(json!({ "_id": id })).await? {
            0 => Err(DatabaseError::NotFound(format!("{} {}", T::TABLE, id))),
            _ => Ok(()),
        }
    }

    /// Count and fetch one page, projecting each serialized document onto `fields`
    pub async fn paged_find(&self, where_clause: Value, page_query: &PageQuery) -> Result<Paged<Value>, DatabaseError> {
        let (limit, page) = page_query.window()?;
        let projection = Projection::from_adapter(page_query.fields.as_deref().unwrap_or_default())?;

        let filter_data = FilterData {
            where_clause: Some(where_clause.clone()),
            order: page_query.sort.clone().map(Value::String),
            limit: Some(limit),
            offset: Some(Paged::<T>::offset(limit, page)),
        };

        let (total, rows) = tokio::try_join!(
            self.count(where_clause),
            self.select_any(filter_data),
        )?;

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            let document = serde_json::to_value(&row)?;
            data.push(match &projection {
                Some(projection) => projection.apply(document),
                None => document,
            });
        }

        Ok(Paged::new(data, total, limit, page))
    }
}
