//! Foreign-key relationships and the row normalizer

use crate::introspection::{ColumnInfo, RawForeignKeyRow};
use crate::table_name::table_key;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Placeholder used for names an introspection row did not supply
pub const UNKNOWN: &str = "unknown";

/// Referential action on `ON DELETE` / `ON UPDATE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    Restrict,
    #[default]
    NoAction,
    SetDefault,
}

impl ReferentialAction {
    /// Parse a catalog rule string; anything unrecognized is `NO ACTION`
    pub fn parse(rule: Option<&str>) -> Self {
        let Some(rule) = rule else {
            return Self::NoAction;
        };
        let normalized = rule.trim().to_ascii_uppercase().replace('_', " ");
        match normalized.as_str() {
            "CASCADE" => Self::Cascade,
            "SET NULL" => Self::SetNull,
            "RESTRICT" => Self::Restrict,
            "SET DEFAULT" => Self::SetDefault,
            _ => Self::NoAction,
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
            Self::SetDefault => "SET DEFAULT",
        };
        f.write_str(s)
    }
}

/// One foreign-key constraint column pair, normalized
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub constraint_name: String,
    /// Schema of the referencing table
    pub schema: String,
    pub from_table: String,
    pub from_column: String,
    /// Schema of the referenced table
    pub to_schema: String,
    pub to_table: String,
    pub to_column: String,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
    pub is_nullable: bool,
    pub is_deferrable: bool,
    pub initially_deferred: bool,
}

impl RelationshipEdge {
    /// Whether this edge can be left NULL during insert and patched later
    pub fn is_breakable(&self) -> bool {
        self.is_nullable || self.is_deferrable
    }

    /// Whether any identifying part of the edge is a placeholder
    pub fn is_ambiguous(&self) -> bool {
        [
            &self.constraint_name,
            &self.from_table,
            &self.from_column,
            &self.to_table,
            &self.to_column,
        ]
        .iter()
        .any(|s| s.as_str() == UNKNOWN)
    }

    pub fn kind(&self) -> RelationshipKind {
        if self.is_nullable {
            RelationshipKind::Optional
        } else {
            RelationshipKind::Required
        }
    }
}

impl fmt::Display for RelationshipEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}.{} -> {}.{})",
            self.constraint_name, self.from_table, self.from_column, self.to_table, self.to_column
        )
    }
}

/// Whether a dependency must be satisfied before insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Optional,
    Required,
}

/// A table-level dependency backed by one foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDependency {
    pub from_table: String,
    pub to_table: String,
    pub kind: RelationshipKind,
    pub foreign_key: RelationshipEdge,
    pub constraint_name: String,
}

impl TableDependency {
    /// Describe `edge` in terms of table keys relative to `default_schema`
    pub fn from_edge(edge: &RelationshipEdge, default_schema: &str) -> Self {
        Self {
            from_table: table_key(&edge.schema, &edge.from_table, default_schema),
            to_table: table_key(&edge.to_schema, &edge.to_table, default_schema),
            kind: edge.kind(),
            foreign_key: edge.clone(),
            constraint_name: edge.constraint_name.clone(),
        }
    }
}

fn name_or_unknown(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Normalize raw foreign-key rows into relationship edges.
///
/// Never fails: missing names become `"unknown"`, missing rules `NO ACTION`,
/// and a missing nullability is looked up in `columns` (defaulting to
/// required when the column is not listed either).
pub fn normalize_foreign_keys(
    rows: &[RawForeignKeyRow],
    columns: &[ColumnInfo],
) -> Vec<RelationshipEdge> {
    let nullability: HashMap<(&str, &str, &str), bool> = columns
        .iter()
        .map(|c| {
            (
                (
                    c.schema.as_str(),
                    c.table_name.as_str(),
                    c.column_name.as_str(),
                ),
                c.is_nullable,
            )
        })
        .collect();

    rows.iter()
        .map(|row| {
            let schema = name_or_unknown(&row.table_schema);
            let from_table = name_or_unknown(&row.table_name);
            let from_column = name_or_unknown(&row.column_name);
            let to_schema = match row.foreign_table_schema.as_deref().map(str::trim) {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => schema.clone(),
            };

            let is_nullable = match &row.is_nullable {
                Some(flag) => flag.as_bool(),
                None => nullability
                    .get(&(schema.as_str(), from_table.as_str(), from_column.as_str()))
                    .copied()
                    .unwrap_or(false),
            };

            let edge = RelationshipEdge {
                constraint_name: name_or_unknown(&row.constraint_name),
                schema,
                from_table,
                from_column,
                to_schema,
                to_table: name_or_unknown(&row.foreign_table_name),
                to_column: name_or_unknown(&row.foreign_column_name),
                on_delete: ReferentialAction::parse(row.delete_rule.as_deref()),
                on_update: ReferentialAction::parse(row.update_rule.as_deref()),
                is_nullable,
                is_deferrable: row.is_deferrable.as_ref().is_some_and(|f| f.as_bool()),
                initially_deferred: row.initially_deferred.as_ref().is_some_and(|f| f.as_bool()),
            };
            if edge.is_ambiguous() {
                log::debug!("Normalized incomplete foreign key row: {}", edge);
            }
            edge
        })
        .collect()
}

#[cfg(test)]
#[path = "relationship_test.rs"]
mod tests;
