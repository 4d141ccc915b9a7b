use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{is_valid_identifier, FilterData, FilterOrderInfo, FilterWhereOptions, SqlResult};

/// Builds SELECT / COUNT / DELETE statements against one table from a [`FilterData`]
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: String,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
    options: FilterWhereOptions,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_valid_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(table_name));
        }
        Ok(Self {
            table_name,
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            options: FilterWhereOptions::default(),
        })
    }

    /// Restrict where clauses to the given columns
    pub fn with_columns(mut self, columns: &'static [&'static str]) -> Self {
        self.options.columns = Some(columns);
        self
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause {
            self.where_clause(where_clause)?;
        }
        if let Some(order) = data.order {
            self.order(order)?;
        }
        if let Some(limit) = data.limit {
            self.limit(limit, data.offset)?;
        } else if let Some(offset) = data.offset {
            self.offset(offset)?;
        }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        let order_data = FilterOrder::validate_and_parse(&order_spec)?;
        if let Some(columns) = self.options.columns {
            if let Some(info) = order_data.iter().find(|info| !columns.contains(&info.column.as_str())) {
                return Err(FilterError::InvalidSort(info.column.clone()));
            }
        }
        self.order_data = order_data;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }

        let max_limit = crate::config::config().pagination.max_limit;
        let applied_limit = if limit > max_limit {
            tracing::debug!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied_limit);
        if let Some(offset) = offset {
            self.offset(offset)?;
        }
        Ok(self)
    }

    pub fn offset(&mut self, offset: i64) -> Result<&mut Self, FilterError> {
        if offset < 0 {
            return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
        }
        self.offset = Some(offset);
        Ok(self)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT * FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_result.query),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = match &self.where_data {
            Some(where_data) => FilterWhere::generate(where_data, 0, &self.options)?,
            None => ("1=1".to_string(), vec![]),
        };
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        Ok(SqlResult {
            query: format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table_name, where_result.query),
            params: where_result.params,
        })
    }

    pub fn to_delete_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        Ok(SqlResult {
            query: format!("DELETE FROM \"{}\" WHERE {}", self.table_name, where_result.query),
            params: where_result.params,
        })
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}
