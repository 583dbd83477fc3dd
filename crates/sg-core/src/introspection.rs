//! Raw schema snapshot rows as returned by an introspection backend.
//!
//! These rows are deliberately loose: backends disagree on casing, on
//! whether flags are booleans or `YES`/`NO` strings, and on which fields are
//! populated at all. [`crate::relationship::normalize_foreign_keys`] turns
//! them into fixed-shape records.

use serde::{Deserialize, Serialize};

/// A base table discovered in the target database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    #[serde(alias = "table_schema")]
    pub schema: String,
    #[serde(alias = "tableName")]
    pub table_name: String,
    #[serde(default = "default_table_type", alias = "tableType")]
    pub table_type: String,
}

fn default_table_type() -> String {
    "BASE TABLE".to_string()
}

impl TableInfo {
    pub fn new(schema: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table_name: table_name.into(),
            table_type: default_table_type(),
        }
    }

    /// Whether this relation is a base table (views are not seeded)
    pub fn is_base_table(&self) -> bool {
        let t = self.table_type.to_ascii_uppercase();
        t == "BASE TABLE" || t == "TABLE"
    }
}

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    #[serde(default, alias = "table_schema")]
    pub schema: String,
    #[serde(alias = "tableName")]
    pub table_name: String,
    #[serde(alias = "columnName")]
    pub column_name: String,
    #[serde(default, alias = "isNullable")]
    pub is_nullable: bool,
    #[serde(default, alias = "dataType")]
    pub data_type: String,
    #[serde(default, alias = "isPrimaryKey")]
    pub is_primary_key: bool,
}

impl ColumnInfo {
    pub fn new(
        schema: impl Into<String>,
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        data_type: impl Into<String>,
        is_nullable: bool,
    ) -> Self {
        Self {
            schema: schema.into(),
            table_name: table_name.into(),
            column_name: column_name.into(),
            is_nullable,
            data_type: data_type.into(),
            is_primary_key: false,
        }
    }

    /// Mark this column as part of the primary key
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }
}

/// A boolean-ish flag as sent by catalog queries (`true`, `"YES"`, `"t"`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Text(String),
}

impl FlagValue {
    /// Interpret the flag; unrecognized text is `false`
    pub fn as_bool(&self) -> bool {
        match self {
            FlagValue::Bool(b) => *b,
            FlagValue::Text(s) => matches!(
                s.trim().to_ascii_uppercase().as_str(),
                "YES" | "Y" | "TRUE" | "T" | "1"
            ),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(b: bool) -> Self {
        FlagValue::Bool(b)
    }
}

/// One foreign-key column pair as returned by an introspection query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawForeignKeyRow {
    #[serde(alias = "constraintName")]
    pub constraint_name: Option<String>,
    #[serde(alias = "tableName")]
    pub table_name: Option<String>,
    #[serde(alias = "columnName")]
    pub column_name: Option<String>,
    #[serde(alias = "foreignTableName")]
    pub foreign_table_name: Option<String>,
    #[serde(alias = "foreignColumnName")]
    pub foreign_column_name: Option<String>,
    #[serde(alias = "updateRule")]
    pub update_rule: Option<String>,
    #[serde(alias = "deleteRule")]
    pub delete_rule: Option<String>,
    #[serde(alias = "isDeferrable")]
    pub is_deferrable: Option<FlagValue>,
    #[serde(alias = "initiallyDeferred")]
    pub initially_deferred: Option<FlagValue>,
    #[serde(alias = "tableSchema")]
    pub table_schema: Option<String>,
    #[serde(alias = "foreignTableSchema")]
    pub foreign_table_schema: Option<String>,
    #[serde(alias = "isNullable")]
    pub is_nullable: Option<FlagValue>,
}

impl RawForeignKeyRow {
    /// Shorthand for a fully populated row in a single schema
    pub fn new(
        constraint_name: &str,
        schema: &str,
        table: &str,
        column: &str,
        foreign_table: &str,
        foreign_column: &str,
    ) -> Self {
        Self {
            constraint_name: Some(constraint_name.to_string()),
            table_name: Some(table.to_string()),
            column_name: Some(column.to_string()),
            foreign_table_name: Some(foreign_table.to_string()),
            foreign_column_name: Some(foreign_column.to_string()),
            table_schema: Some(schema.to_string()),
            foreign_table_schema: Some(schema.to_string()),
            ..Self::default()
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.is_nullable = Some(FlagValue::Bool(nullable));
        self
    }

    pub fn deferrable(mut self, deferrable: bool) -> Self {
        self.is_deferrable = Some(FlagValue::Bool(deferrable));
        self
    }

    pub fn on_delete(mut self, rule: &str) -> Self {
        self.delete_rule = Some(rule.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_value_text() {
        assert!(FlagValue::Text("YES".into()).as_bool());
        assert!(FlagValue::Text(" t ".into()).as_bool());
        assert!(!FlagValue::Text("NO".into()).as_bool());
        assert!(!FlagValue::Text("maybe".into()).as_bool());
    }

    #[test]
    fn test_raw_row_camel_case_and_string_flags() {
        let json = r#"{
            "constraintName": "posts_user_id_fkey",
            "tableName": "posts",
            "columnName": "user_id",
            "foreignTableName": "users",
            "foreignColumnName": "id",
            "isDeferrable": "NO",
            "isNullable": true
        }"#;
        let row: RawForeignKeyRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.constraint_name.as_deref(), Some("posts_user_id_fkey"));
        assert_eq!(row.is_deferrable, Some(FlagValue::Text("NO".into())));
        assert_eq!(row.is_nullable, Some(FlagValue::Bool(true)));
        assert!(row.delete_rule.is_none());
    }

    #[test]
    fn test_table_type_filter() {
        assert!(TableInfo::new("public", "users").is_base_table());
        let view = TableInfo {
            table_type: "VIEW".into(),
            ..TableInfo::new("public", "v_users")
        };
        assert!(!view.is_base_table());
    }
}
