//! Read-only schema snapshot of a Tabular data model.
//!
//! The DAX front end resolves table/column/measure references against a
//! [`Schema`], which the host application builds from its own document model
//! (or deserializes from JSON with [`Schema::from_json`]). The snapshot is
//! never mutated by analysis; it only answers lookups.
//!
//! All name lookups are case-insensitive, matching DAX identifier semantics.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid schema snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate table: {0}")]
    DuplicateTable(String),

    #[error("duplicate column {table}[{column}]")]
    DuplicateColumn { table: String, column: String },

    #[error("duplicate measure {table}[{measure}]")]
    DuplicateMeasure { table: String, measure: String },
}

/// Storage type of a model column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    String,
    Int64,
    Double,
    Decimal,
    Boolean,
    DateTime,
    #[default]
    Variant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaColumn {
    pub name: String,
    #[serde(default)]
    pub data_type: DataType,
}

impl SchemaColumn {
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A measure as the host model carries it: a name plus the DAX expression
/// text. The expression is opaque to lookups; the analyzer re-parses it when
/// it needs to inspect a measure body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMeasure {
    pub name: String,
    #[serde(default)]
    pub expression: String,
}

impl SchemaMeasure {
    #[must_use]
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaTable {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<SchemaColumn>,
    #[serde(default)]
    pub measures: Vec<SchemaMeasure>,
}

impl SchemaTable {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            measures: Vec::new(),
        }
    }

    pub fn add_column(&mut self, column: SchemaColumn) -> SchemaResult<()> {
        if self.column(&column.name).is_some() {
            return Err(SchemaError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn add_measure(&mut self, measure: SchemaMeasure) -> SchemaResult<()> {
        if self.measure(&measure.name).is_some() {
            return Err(SchemaError::DuplicateMeasure {
                table: self.name.clone(),
                measure: measure.name,
            });
        }
        self.measures.push(measure);
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns.iter().find(|c| ident_eq(&c.name, name))
    }

    pub fn measure(&self, name: &str) -> Option<&SchemaMeasure> {
        self.measures.iter().find(|m| ident_eq(&m.name, name))
    }

    /// True when `name` resolves to either a column or a measure on this
    /// table. Qualified references (`'T'[Name]`) accept both.
    pub fn resolves(&self, name: &str) -> bool {
        self.column(name).is_some() || self.measure(name).is_some()
    }
}

/// The full snapshot handed to the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<SchemaTable>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserialize a snapshot from the host's JSON interchange shape:
    /// `{"tables":[{"name":…,"columns":[{"name":…,"dataType":…}],"measures":[…]}]}`.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.check_duplicates()?;
        Ok(schema)
    }

    pub fn add_table(&mut self, table: SchemaTable) -> SchemaResult<()> {
        if self.table(&table.name).is_some() {
            return Err(SchemaError::DuplicateTable(table.name));
        }
        self.tables.push(table);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&SchemaTable> {
        self.tables.iter().find(|t| ident_eq(&t.name, name))
    }

    /// True when any table in the model carries `name` as a measure or
    /// column. Bare `[Name]` references resolve model-wide.
    pub fn resolves_unqualified(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.resolves(name))
    }

    fn check_duplicates(&self) -> SchemaResult<()> {
        let mut seen = HashSet::new();
        for table in &self.tables {
            if !seen.insert(table.name.to_lowercase()) {
                return Err(SchemaError::DuplicateTable(table.name.clone()));
            }
        }
        Ok(())
    }
}

/// DAX identifiers compare case-insensitively; table names can contain
/// non-ASCII letters, so fall back to Unicode lowercasing when the fast
/// ASCII comparison cannot decide.
fn ident_eq(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sales() -> SchemaTable {
        let mut table = SchemaTable::new("Sales");
        table
            .add_column(SchemaColumn::new("Amount", DataType::Double))
            .unwrap();
        table
            .add_measure(SchemaMeasure::new("Total Sales", "SUM(Sales[Amount])"))
            .unwrap();
        table
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let mut schema = Schema::new();
        schema.add_table(sales()).unwrap();

        assert!(schema.table("SALES").is_some());
        assert!(schema.table("sales").is_some());
        let table = schema.table("Sales").unwrap();
        assert!(table.column("amount").is_some());
        assert!(table.measure("total sales").is_some());
        assert!(table.resolves("AMOUNT"));
        assert!(!table.resolves("Amnt"));
    }

    #[test]
    fn unqualified_resolution_scans_all_tables() {
        let mut schema = Schema::new();
        schema.add_table(sales()).unwrap();
        schema.add_table(SchemaTable::new("Dates")).unwrap();

        assert!(schema.resolves_unqualified("Total Sales"));
        assert!(schema.resolves_unqualified("Amount"));
        assert!(!schema.resolves_unqualified("Margin"));
    }

    #[test]
    fn duplicate_table_is_rejected() {
        let mut schema = Schema::new();
        schema.add_table(SchemaTable::new("Sales")).unwrap();
        let err = schema.add_table(SchemaTable::new("SALES")).unwrap_err();
        assert!(err.to_string().contains("duplicate table"));
    }

    #[test]
    fn json_round_trip_uses_camel_case() {
        let json = r#"{
            "tables": [
                {
                    "name": "Sales",
                    "columns": [{"name": "Amount", "dataType": "Double"}],
                    "measures": [{"name": "Total", "expression": "SUM(Sales[Amount])"}]
                }
            ]
        }"#;
        let schema = Schema::from_json(json).unwrap();
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(
            schema.table("Sales").unwrap().column("Amount").unwrap().data_type,
            DataType::Double
        );

        let out = serde_json::to_string(&schema).unwrap();
        assert!(out.contains("\"dataType\""));
        let back = Schema::from_json(&out).unwrap();
        assert_eq!(schema, back);
    }

    #[test]
    fn json_duplicate_tables_are_rejected() {
        let json = r#"{"tables":[{"name":"T"},{"name":"t"}]}"#;
        assert!(Schema::from_json(json).is_err());
    }
}
