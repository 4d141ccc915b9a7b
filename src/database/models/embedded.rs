use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Denormalized reference to another document, e.g. `roles.account` or `account.user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<Link>,
}

impl Roles {
    /// Role names present on the user; these become the credential scope
    pub fn scope(&self) -> Vec<String> {
        let mut scope = Vec::new();
        if self.account.is_some() {
            scope.push("account".to_string());
        }
        if self.admin.is_some() {
            scope.push("admin".to_string());
        }
        scope
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub first: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle: Option<String>,
    pub last: String,
}

impl Name {
    /// Split a free-form name. The middle name is only taken when more than
    /// two words remain; everything after it is the last name.
    pub fn parse(input: &str) -> Self {
        let mut parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            return Self::default();
        }
        let first = parts.remove(0).to_string();
        let middle = if parts.len() > 1 {
            Some(parts.remove(0).to_string())
        } else {
            None
        };
        Self {
            first,
            middle,
            last: parts.join(" "),
        }
    }

    pub fn full(&self) -> String {
        format!("{} {}", self.first, self.last).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub id: String,
    pub name: String,
    pub time_created: DateTime<Utc>,
    pub user_created: Link,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEntry {
    pub data: String,
    pub time_created: DateTime<Utc>,
    pub user_created: Link,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<StatusEntry>,
    #[serde(default)]
    pub log: Vec<StatusEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_part_name() {
        let name = Name::parse("Ren Hoek");
        assert_eq!(name.first, "Ren");
        assert_eq!(name.middle, None);
        assert_eq!(name.last, "Hoek");
        assert_eq!(name.full(), "Ren Hoek");
    }

    #[test]
    fn three_part_name_takes_middle() {
        let name = Name::parse("  Stimpson  J   Cat ");
        assert_eq!(name.first, "Stimpson");
        assert_eq!(name.middle.as_deref(), Some("J"));
        assert_eq!(name.last, "Cat");
    }

    #[test]
    fn long_name_joins_remaining_into_last() {
        let name = Name::parse("Juan Carlos de la Vega");
        assert_eq!(name.middle.as_deref(), Some("Carlos"));
        assert_eq!(name.last, "de la Vega");
        assert_eq!(name.full(), "Juan de la Vega");
    }

    #[test]
    fn single_word_name() {
        let name = Name::parse("Cher");
        assert_eq!(name.first, "Cher");
        assert_eq!(name.last, "");
        assert_eq!(name.full(), "Cher");
    }

    #[test]
    fn scope_lists_present_roles() {
        let roles = Roles {
            account: None,
            admin: Some(Link { id: "1".into(), name: "Root Admin".into() }),
        };
        assert_eq!(roles.scope(), vec!["admin".to_string()]);
        assert!(Roles::default().scope().is_empty());
    }

    #[test]
    fn roles_omit_missing_links() {
        let json = serde_json::to_value(Roles::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
