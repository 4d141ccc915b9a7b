use serde_json::Value;

use super::error::FilterError;
use super::fields::column_for_field;
use super::types::{is_valid_identifier, FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        match order {
            Value::Null => Ok(vec![]),
            Value::String(s) => Self::parse_sort_adapter(s),
            Value::Array(arr) => {
                // ["-time", "username"]
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_sort_adapter(s)?),
                        other => return Err(FilterError::InvalidSort(other.to_string())),
                    }
                }
                Ok(out)
            }
            Value::Object(obj) => {
                // { "time": -1, "username": "asc" }
                let mut out = Vec::new();
                for (k, v) in obj {
                    let sort = match v {
                        Value::Number(n) if n.as_i64() == Some(-1) => SortDirection::Desc,
                        Value::String(s) if s.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                        _ => SortDirection::Asc,
                    };
                    out.push(Self::info(k, sort)?);
                }
                Ok(out)
            }
            other => Err(FilterError::InvalidSort(other.to_string())),
        }
    }

    /// Parse `"-time username"`: whitespace separated fields, a leading `-` sorts descending.
    pub fn parse_sort_adapter(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        s.split_whitespace()
            .map(|token| match token.strip_prefix('-') {
                Some(field) => Self::info(field, SortDirection::Desc),
                None => Self::info(token, SortDirection::Asc),
            })
            .collect()
    }

    fn info(field: &str, sort: SortDirection) -> Result<FilterOrderInfo, FilterError> {
        let column = column_for_field(field);
        if !is_valid_identifier(&column) {
            return Err(FilterError::InvalidSort(field.to_string()));
        }
        Ok(FilterOrderInfo { column, sort })
    }

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
    use serde_json::json;

    #[test]
    fn leading_dash_sorts_descending() {
        let infos = FilterOrder::parse_sort_adapter("-timeCreated  username").unwrap();
        assert_eq!(
            infos,
            vec![
                FilterOrderInfo { column: "time_created".into(), sort: SortDirection::Desc },
                FilterOrderInfo { column: "username".into(), sort: SortDirection::Asc },
            ]
        );
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"time_created\" DESC, \"username\" ASC");
    }

    #[test]
    fn id_field_sorts_on_id_column() {
        let infos = FilterOrder::validate_and_parse(&json!("_id")).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"id\" ASC");
    }

    #[test]
    fn object_form_accepts_numeric_direction() {
        let infos = FilterOrder::validate_and_parse(&json!({ "time": -1 })).unwrap();
        assert_eq!(infos[0].sort, SortDirection::Desc);
    }

    #[test]
    fn rejects_injection() {
        assert!(FilterOrder::parse_sort_adapter("name;DROP").is_err());
        assert!(FilterOrder::parse_sort_adapter("-").is_err());
    }

    #[test]
    fn empty_sort_generates_nothing() {
        assert!(FilterOrder::parse_sort_adapter("").unwrap().is_empty());
        assert_eq!(FilterOrder::generate(&[]), "");
    }
}
