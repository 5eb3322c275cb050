//! Warehouse table schemas and row validation.
//!
//! Schemas mirror the explicit column lists handed to the warehouse load
//! jobs: an ordered list of `{name, type, mode}`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SchemaViolation;
use crate::records::{ACCOUNT_COLUMNS, CUSTOMER_COLUMNS, CUST_ACC_COLUMNS};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    String,
    Int64,
    Date,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Int64 => "INT64",
            Self::Date => "DATE",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnMode {
    #[default]
    Nullable,
    Required,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub mode: ColumnMode,
}

impl ColumnSpec {
    pub fn nullable(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            mode: ColumnMode::Nullable,
        }
    }
}

/// A typed cell of a warehouse row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellValue {
    Null,
    String(String),
    Int64(i64),
    Date(NaiveDate),
}

impl CellValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Text form used in CSV exports; `Null` becomes an empty field.
    pub fn to_field(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::String(value) => value.clone(),
            Self::Int64(value) => value.to_string(),
            Self::Date(value) => value.format(DATE_FORMAT).to_string(),
        }
    }
}

pub type Row = Vec<CellValue>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableSchema {
    pub fields: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn new(fields: Vec<ColumnSpec>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&ColumnSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn validate_header<S: AsRef<str>>(
        &self,
        object: &str,
        header: &[S],
    ) -> Result<(), SchemaViolation> {
        let matches = header.len() == self.fields.len()
            && header
                .iter()
                .zip(&self.fields)
                .all(|(found, field)| found.as_ref().trim() == field.name);
        if matches {
            return Ok(());
        }

        Err(SchemaViolation::HeaderMismatch {
            object: object.to_string(),
            expected: self.fields.iter().map(|field| field.name.clone()).collect(),
            found: header.iter().map(|name| name.as_ref().to_string()).collect(),
        })
    }

    /// Parses one delimited data row (1-based `row`) into typed cells.
    pub fn parse_row<S: AsRef<str>>(
        &self,
        object: &str,
        row: usize,
        values: &[S],
    ) -> Result<Row, SchemaViolation> {
        if values.len() != self.fields.len() {
            return Err(SchemaViolation::ColumnCount {
                object: object.to_string(),
                row,
                expected: self.fields.len(),
                found: values.len(),
            });
        }

        self.fields
            .iter()
            .zip(values)
            .map(|(field, raw)| parse_cell(object, row, field, raw.as_ref()))
            .collect()
    }

    /// Checks an already typed row, e.g. a join result, against this schema.
    pub fn check_row(&self, object: &str, row_number: usize, row: &Row) -> Result<(), SchemaViolation> {
        if row.len() != self.fields.len() {
            return Err(SchemaViolation::ColumnCount {
                object: object.to_string(),
                row: row_number,
                expected: self.fields.len(),
                found: row.len(),
            });
        }

        for (field, cell) in self.fields.iter().zip(row) {
            let conforms = match (cell, field.column_type) {
                (CellValue::Null, _) => field.mode == ColumnMode::Nullable,
                (CellValue::String(_), ColumnType::String)
                | (CellValue::Int64(_), ColumnType::Int64)
                | (CellValue::Date(_), ColumnType::Date) => true,
                _ => false,
            };
            if !conforms {
                return Err(SchemaViolation::InvalidValue {
                    object: object.to_string(),
                    row: row_number,
                    column: field.name.clone(),
                    value: cell.to_field(),
                    expected_type: field.column_type.as_str(),
                });
            }
        }

        Ok(())
    }
}

fn parse_cell(
    object: &str,
    row: usize,
    field: &ColumnSpec,
    raw: &str,
) -> Result<CellValue, SchemaViolation> {
    if raw.is_empty() {
        return match field.mode {
            ColumnMode::Nullable => Ok(CellValue::Null),
            ColumnMode::Required => Err(SchemaViolation::MissingValue {
                object: object.to_string(),
                row,
                column: field.name.clone(),
            }),
        };
    }

    let invalid = || SchemaViolation::InvalidValue {
        object: object.to_string(),
        row,
        column: field.name.clone(),
        value: raw.to_string(),
        expected_type: field.column_type.as_str(),
    };

    match field.column_type {
        ColumnType::String => Ok(CellValue::String(raw.to_string())),
        ColumnType::Int64 => raw
            .trim()
            .parse::<i64>()
            .map(CellValue::Int64)
            .map_err(|_| invalid()),
        ColumnType::Date => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map(CellValue::Date)
            .map_err(|_| invalid()),
    }
}

pub fn account_schema() -> TableSchema {
    TableSchema::new(
        ACCOUNT_COLUMNS
            .iter()
            .map(|name| ColumnSpec::nullable(*name, column_type_for(name)))
            .collect(),
    )
}

pub fn customer_schema() -> TableSchema {
    TableSchema::new(
        CUSTOMER_COLUMNS
            .iter()
            .map(|name| ColumnSpec::nullable(*name, column_type_for(name)))
            .collect(),
    )
}

pub fn cust_acc_schema() -> TableSchema {
    TableSchema::new(
        CUST_ACC_COLUMNS
            .iter()
            .map(|name| ColumnSpec::nullable(*name, column_type_for(name)))
            .collect(),
    )
}

fn column_type_for(name: &str) -> ColumnType {
    match name {
        "Credit_Score" => ColumnType::Int64,
        "Opening_Date" | "Date_of_Birth" | "Date_Joined" => ColumnType::Date,
        _ => ColumnType::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_schema_declares_six_typed_columns() {
        let schema = account_schema();
        let types: Vec<ColumnType> = schema.fields.iter().map(|f| f.column_type).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::String,
                ColumnType::String,
                ColumnType::String,
                ColumnType::Date,
                ColumnType::String,
                ColumnType::String,
            ]
        );
    }

    #[test]
    fn customer_schema_declares_nine_typed_columns() {
        let schema = customer_schema();
        let types: Vec<ColumnType> = schema.fields.iter().map(|f| f.column_type).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::String,
                ColumnType::String,
                ColumnType::Int64,
                ColumnType::String,
                ColumnType::Date,
                ColumnType::Date,
                ColumnType::String,
                ColumnType::String,
                ColumnType::String,
            ]
        );
    }

    #[test]
    fn schema_serializes_like_a_load_job_field_list() {
        let json = serde_json::to_value(account_schema().fields[3].clone())
            .expect("column spec should serialize");
        assert_eq!(
            json,
            serde_json::json!({"name": "Opening_Date", "type": "DATE", "mode": "NULLABLE"})
        );
    }

    #[test]
    fn parse_row_types_each_cell() {
        let row = account_schema()
            .parse_row(
                "accounts.csv",
                1,
                &["ACC-1A2B3C4D", "CUST-0001", "Savings", "2012-03-04", "Delhi", ""],
            )
            .expect("row should parse");
        assert_eq!(
            row[3],
            CellValue::Date(NaiveDate::from_ymd_opt(2012, 3, 4).expect("valid date"))
        );
        assert_eq!(row[5], CellValue::Null);
    }

    #[test]
    fn parse_row_rejects_bad_integer() {
        let error = customer_schema()
            .parse_row(
                "customers.csv",
                4,
                &[
                    "CUST-0004",
                    "Asha Rao",
                    "eight hundred",
                    "Pending",
                    "1990-01-01",
                    "2016-05-05",
                    "12 MG Road, Pune",
                    "+91 9876543210",
                    "asharao12@gmail.com",
                ],
            )
            .expect_err("non numeric credit score should fail");
        assert!(matches!(
            error,
            SchemaViolation::InvalidValue { row: 4, ref column, .. } if column == "Credit_Score"
        ));
    }

    #[test]
    fn parse_row_rejects_wrong_column_count() {
        let error = account_schema()
            .parse_row("accounts.csv", 1, &["ACC-1", "CUST-0001"])
            .expect_err("short row should fail");
        assert_eq!(
            error,
            SchemaViolation::ColumnCount {
                object: "accounts.csv".to_string(),
                row: 1,
                expected: 6,
                found: 2,
            }
        );
    }

    #[test]
    fn header_must_match_in_order() {
        let schema = account_schema();
        assert!(schema.validate_header("a.csv", &ACCOUNT_COLUMNS).is_ok());

        let mut swapped = ACCOUNT_COLUMNS;
        swapped.swap(0, 1);
        assert!(schema.validate_header("a.csv", &swapped).is_err());
    }
}
