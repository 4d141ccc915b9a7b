use serde_json::{Map, Value};

use super::error::FilterError;
use super::fields::column_for_field;
use super::types::{is_valid_identifier, FilterOp, FilterWhereOptions};

/// Compiles a JSON where-object into a parameterized SQL predicate.
///
/// Parameters are numbered from `starting_param_index + 1` and keep counting
/// through nested `$and`, `$or` and `$not` clauses, so the returned values bind
/// positionally against the returned SQL.
pub struct FilterWhere<'a> {
    param_values: Vec<Value>,
    starting_param_index: usize,
    options: &'a FilterWhereOptions,
}

impl<'a> FilterWhere<'a> {
    fn new(starting_param_index: usize, options: &'a FilterWhereOptions) -> Self {
        Self {
            param_values: vec![],
            starting_param_index,
            options,
        }
    }

    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        options: &FilterWhereOptions,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = FilterWhere::new(starting_param_index, options);
        let sql = filter_where.compile(where_data)?;
        Ok((sql, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn compile(&mut self, where_data: &Value) -> Result<String, FilterError> {
        match where_data {
            Value::Null => Ok("1=1".to_string()),
            Value::Object(obj) => self.compile_object(obj),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn compile_object(&mut self, obj: &Map<String, Value>) -> Result<String, FilterError> {
        let mut conditions = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            let sql = if key.starts_with('$') {
                self.compile_logical(key, value)?
            } else {
                self.compile_field(key, value)?
            };
            conditions.push(sql);
        }
        Ok(match conditions.len() {
            0 => "1=1".to_string(),
            1 => conditions.remove(0),
            _ => conditions.join(" AND "),
        })
    }

    fn compile_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let mut parts = Vec::with_capacity(arr.len());
                for clause in arr {
                    parts.push(format!("({})", self.compile(clause)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", parts.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.compile(value)?)),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn compile_field(&mut self, field: &str, value: &Value) -> Result<String, FilterError> {
        let target = self.resolve(field)?;

        match value {
            Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) && !ops.is_empty() => {
                let mut parts = Vec::with_capacity(ops.len());
                for (op_key, op_val) in ops {
                    let operator = FilterOp::parse(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                    parts.push(self.compile_condition(&target, operator, op_val)?);
                }
                Ok(parts.join(" AND "))
            }
            // Implicit equality: { field: value }
            _ => self.compile_condition(&target, FilterOp::Eq, value),
        }
    }

    /// Turn an API field into a SQL target: a quoted column, or a JSONB path extraction for dotted fields
    fn resolve(&mut self, field: &str) -> Result<Target, FilterError> {
        let column = column_for_field(field);
        let mut segments = column.split('.');
        let root = segments.next().unwrap_or_default().to_string();
        let path: Vec<String> = segments.map(str::to_string).collect();

        if !is_valid_identifier(&root) || path.iter().any(|p| !is_valid_identifier(p)) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }
        if let Some(columns) = self.options.columns {
            if !columns.contains(&root.as_str()) {
                return Err(FilterError::InvalidColumn(field.to_string()));
            }
        }
        Ok(Target { root, path })
    }

    fn compile_condition(&mut self, target: &Target, operator: FilterOp, data: &Value) -> Result<String, FilterError> {
        if operator == FilterOp::Exists {
            return self.compile_exists(target, data);
        }

        let lhs = self.lhs(target);
        match operator {
            FilterOp::Eq if data.is_null() => Ok(format!("{} IS NULL", lhs)),
            FilterOp::Ne if data.is_null() => Ok(format!("{} IS NOT NULL", lhs)),
            FilterOp::Eq => Ok(format!("{} = {}", lhs, self.scalar(target, data)?)),
            FilterOp::Ne => Ok(format!("{} <> {}", lhs, self.scalar(target, data)?)),
            FilterOp::Gt => Ok(format!("{} > {}", lhs, self.scalar(target, data)?)),
            FilterOp::Gte => Ok(format!("{} >= {}", lhs, self.scalar(target, data)?)),
            FilterOp::Lt => Ok(format!("{} < {}", lhs, self.scalar(target, data)?)),
            FilterOp::Lte => Ok(format!("{} <= {}", lhs, self.scalar(target, data)?)),
            FilterOp::Like => Ok(format!("{} LIKE {}", lhs, self.scalar(target, data)?)),
            FilterOp::ILike => Ok(format!("{} ILIKE {}", lhs, self.scalar(target, data)?)),
            FilterOp::In | FilterOp::NIn => {
                let values = data
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$in and $nin require an array".to_string()))?;
                if values.is_empty() {
                    return Ok(if operator == FilterOp::In { "1=0" } else { "1=1" }.to_string());
                }
                let mut params = Vec::with_capacity(values.len());
                for v in values {
                    params.push(self.scalar(target, v)?);
                }
                let keyword = if operator == FilterOp::In { "IN" } else { "NOT IN" };
                Ok(format!("{} {} ({})", lhs, keyword, params.join(", ")))
            }
            FilterOp::Between => match data.as_array().map(Vec::as_slice) {
                Some([low, high]) => Ok(format!(
                    "{} BETWEEN {} AND {}",
                    lhs,
                    self.scalar(target, low)?,
                    self.scalar(target, high)?
                )),
                _ => Err(FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string())),
            },
            FilterOp::Exists => unreachable!("handled above"),
        }
    }

    fn compile_exists(&mut self, target: &Target, data: &Value) -> Result<String, FilterError> {
        let wanted = data
            .as_bool()
            .ok_or_else(|| FilterError::InvalidOperatorData("$exists requires a boolean".to_string()))?;

        let sql = if target.path.is_empty() {
            format!("\"{}\" IS NOT NULL", target.root)
        } else {
            // Nested keys are checked on the JSONB document
            format!("{} IS NOT NULL", self.json_path(target, false))
        };
        Ok(if wanted { sql } else { format!("NOT ({})", sql) })
    }

    fn lhs(&mut self, target: &Target) -> String {
        if target.path.is_empty() {
            format!("\"{}\"", target.root)
        } else {
            self.json_path(target, true)
        }
    }

    fn json_path(&mut self, target: &Target, as_text: bool) -> String {
        let keys: Vec<String> = target
            .path
            .iter()
            .map(|segment| self.param(Value::String(segment.clone())))
            .collect();
        let function = if as_text { "jsonb_extract_path_text" } else { "jsonb_extract_path" };
        format!("{}(\"{}\", {})", function, target.root, keys.join(", "))
    }

    /// Bind a comparison value. JSONB paths compare as text.
    fn scalar(&mut self, target: &Target, value: &Value) -> Result<String, FilterError> {
        match value {
            Value::Array(_) | Value::Object(_) => Err(FilterError::InvalidOperatorData(format!(
                "Expected a scalar value, got {}",
                value
            ))),
            Value::Null => Err(FilterError::InvalidOperatorData("Unexpected null".to_string())),
            _ if !target.path.is_empty() => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Ok(self.param(Value::String(text)))
            }
            _ => Ok(self.param(value.clone())),
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.starting_param_index + self.param_values.len())
    }
}

struct Target {
    root: String,
    path: Vec<String>,
}
