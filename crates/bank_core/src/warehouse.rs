//! Warehouse job contracts.
//!
//! Load jobs copy delimited objects into a raw-zone table under an explicit
//! schema; query jobs materialize a join into a transformed-zone table.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{TaskError, ValidationError};
use crate::records::{ACCOUNT_COLUMNS, CUSTOMER_COLUMNS};
use crate::schema::{Row, TableSchema};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    /// Parses `project.dataset.table`.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let parts: Vec<&str> = value.split('.').collect();
        match parts.as_slice() {
            [project, dataset, table]
                if !project.is_empty() && !dataset.is_empty() && !table.is_empty() =>
            {
                Ok(Self::new(*project, *dataset, *table))
            }
            _ => Err(ValidationError::new(format!(
                "table reference '{value}' must be project.dataset.table"
            ))),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum WriteDisposition {
    #[default]
    #[serde(rename = "WRITE_APPEND")]
    Append,
    #[serde(rename = "WRITE_TRUNCATE")]
    Truncate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadJobSpec {
    pub source_bucket: String,
    pub source_objects: Vec<String>,
    pub destination: TableRef,
    pub schema: TableSchema,
    #[serde(default)]
    pub write_disposition: WriteDisposition,
    #[serde(default = "default_skip_leading_rows")]
    pub skip_leading_rows: usize,
}

fn default_skip_leading_rows() -> usize {
    1
}

/// Equality join of two tables on a shared key column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinQuery {
    pub left: TableRef,
    pub left_alias: String,
    pub left_columns: Vec<String>,
    pub right: TableRef,
    pub right_alias: String,
    pub right_columns: Vec<String>,
    pub join_key: String,
}

impl JoinQuery {
    pub fn output_columns(&self) -> Vec<&str> {
        self.left_columns
            .iter()
            .chain(&self.right_columns)
            .map(String::as_str)
            .collect()
    }

    /// Standard SQL text for warehouses that execute the query themselves.
    pub fn to_sql(&self) -> String {
        let projection = self
            .left_columns
            .iter()
            .map(|column| format!("{}.{column}", self.left_alias))
            .chain(
                self.right_columns
                    .iter()
                    .map(|column| format!("{}.{column}", self.right_alias)),
            )
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "SELECT {projection}\nFROM `{left}` {la}\nJOIN `{right}` {ra}\nON {la}.{key} = {ra}.{key}",
            left = self.left,
            la = self.left_alias,
            right = self.right,
            ra = self.right_alias,
            key = self.join_key,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryJobSpec {
    pub query: JoinQuery,
    pub destination: TableRef,
    #[serde(default)]
    pub write_disposition: WriteDisposition,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobOutcome {
    pub destination: TableRef,
    pub rows_written: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    pub schema: TableSchema,
    pub rows: Vec<Row>,
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn run_load_job(&self, job: &LoadJobSpec) -> Result<JobOutcome, TaskError>;

    async fn run_query_job(&self, job: &QueryJobSpec) -> Result<JobOutcome, TaskError>;

    async fn read_table(&self, table: &TableRef) -> Result<TableSnapshot, TaskError>;
}

/// Accounts joined to their customers on `Customer_ID`.
pub fn banking_join_query(accounts: TableRef, customers: TableRef) -> JoinQuery {
    JoinQuery {
        left: accounts,
        left_alias: "a".to_string(),
        left_columns: ACCOUNT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        right: customers,
        right_alias: "c".to_string(),
        right_columns: CUSTOMER_COLUMNS[1..].iter().map(|c| c.to_string()).collect(),
        join_key: "Customer_ID".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CUST_ACC_COLUMNS;

    #[test]
    fn table_ref_round_trips_through_display() {
        let table = TableRef::parse("synthetic-nova.Raw_Dataset.accounts").expect("valid ref");
        assert_eq!(table.dataset, "Raw_Dataset");
        assert_eq!(table.to_string(), "synthetic-nova.Raw_Dataset.accounts");
        assert!(TableRef::parse("Raw_Dataset.accounts").is_err());
        assert!(TableRef::parse("a..c").is_err());
    }

    #[test]
    fn banking_join_projects_cust_acc_columns() {
        let query = banking_join_query(
            TableRef::new("p", "Raw_Dataset", "accounts"),
            TableRef::new("p", "Raw_Dataset", "customer"),
        );
        assert_eq!(query.output_columns(), CUST_ACC_COLUMNS.to_vec());
    }

    #[test]
    fn renders_join_sql() {
        let query = banking_join_query(
            TableRef::new("p", "Raw_Dataset", "accounts"),
            TableRef::new("p", "Raw_Dataset", "customer"),
        );
        let sql = query.to_sql();
        assert!(sql.starts_with("SELECT a.Account_ID, a.Customer_ID, a.Account_Type"));
        assert!(sql.contains("FROM `p.Raw_Dataset.accounts` a\nJOIN `p.Raw_Dataset.customer` c"));
        assert!(sql.ends_with("ON a.Customer_ID = c.Customer_ID"));
    }

    #[test]
    fn write_disposition_uses_warehouse_names() {
        let json = serde_json::to_string(&WriteDisposition::Append).expect("serialize");
        assert_eq!(json, "\"WRITE_APPEND\"");
    }
}
