use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::is_valid_identifier;

/// Map an API field name to its column: `_id` is `id`, camelCase becomes snake_case.
/// Dotted paths map each segment (`resetPassword.expires` -> `reset_password.expires`).
pub fn column_for_field(field: &str) -> String {
    field
        .split('.')
        .map(|segment| {
            if segment == "_id" {
                return "id".to_string();
            }
            let mut out = String::with_capacity(segment.len() + 4);
            for (i, c) in segment.chars().enumerate() {
                if c.is_ascii_uppercase() {
                    if i > 0 {
                        out.push('_');
                    }
                    out.push(c.to_ascii_lowercase());
                } else {
                    out.push(c);
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Field projection parsed from a whitespace separated list, e.g. `"username email"`.
/// Applied to serialized documents; `_id` always survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    /// Returns `None` when the list names no fields, meaning "everything".
    pub fn from_adapter(fields: &str) -> Result<Option<Self>, FilterError> {
        let fields: Vec<String> = fields.split_whitespace().map(str::to_string).collect();
        if fields.is_empty() {
            return Ok(None);
        }
        for field in &fields {
            if !field.split('.').all(is_valid_identifier) {
                return Err(FilterError::InvalidColumn(field.clone()));
            }
        }
        Ok(Some(Self { fields }))
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn apply(&self, document: Value) -> Value {
        let Value::Object(source) = document else {
            return document;
        };

        let mut projected = Map::new();
        if let Some(id) = source.get("_id") {
            projected.insert("_id".to_string(), id.clone());
        }
        for field in &self.fields {
            let path: Vec<&str> = field.split('.').collect();
            if let Some(value) = lookup(&source, &path) {
                insert_path(&mut projected, &path, value.clone());
            }
        }
        Value::Object(projected)
    }
}

fn lookup<'a>(source: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let value = source.get(*first)?;
    if rest.is_empty() {
        return Some(value);
    }
    match value {
        Value::Object(inner) => lookup(inner, rest),
        _ => None,
    }
}

fn insert_path(target: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        target.insert(first.to_string(), value);
        return;
    }
    let entry = target
        .entry(first.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(inner) = entry {
        insert_path(inner, rest, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_api_fields_to_columns() {
        assert_eq!(column_for_field("_id"), "id");
        assert_eq!(column_for_field("isActive"), "is_active");
        assert_eq!(column_for_field("timeCreated"), "time_created");
        assert_eq!(column_for_field("username"), "username");
        assert_eq!(column_for_field("roles.account"), "roles.account");
        assert_eq!(column_for_field("resetPassword.expires"), "reset_password.expires");
    }

    #[test]
    fn empty_field_list_means_everything() {
        assert_eq!(Projection::from_adapter("").unwrap(), None);
        assert_eq!(Projection::from_adapter("   ").unwrap(), None);
    }

    #[test]
    fn splits_on_any_whitespace() {
        let projection = Projection::from_adapter(" username \t email  ").unwrap().unwrap();
        assert_eq!(projection.fields(), ["username", "email"]);
    }

    #[test]
    fn rejects_malformed_fields() {
        assert!(Projection::from_adapter("username pass\"word").is_err());
    }

    #[test]
    fn keeps_id_and_listed_fields() {
        let projection = Projection::from_adapter("username roles").unwrap().unwrap();
        let doc = json!({
            "_id": "abc",
            "username": "ren",
            "email": "ren@stimpy.show",
            "roles": { "account": { "id": "1", "name": "Ren Hoek" } }
        });
        assert_eq!(
            projection.apply(doc),
            json!({
                "_id": "abc",
                "username": "ren",
                "roles": { "account": { "id": "1", "name": "Ren Hoek" } }
            })
        );
    }

    #[test]
    fn projects_nested_paths() {
        let projection = Projection::from_adapter("name.first missing").unwrap().unwrap();
        let doc = json!({ "_id": "a", "name": { "first": "Ren", "last": "Hoek" } });
        assert_eq!(projection.apply(doc), json!({ "_id": "a", "name": { "first": "Ren" } }));
    }
}
