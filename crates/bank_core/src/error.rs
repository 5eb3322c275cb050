use thiserror::Error;

/// Rejected configuration or pipeline definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("object not found: {key}")]
    NotFound { key: String },
    #[error("object store transport error: {0}")]
    Transport(String),
}

/// A source object that does not conform to the destination table schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("header of {object} does not match schema: expected {expected:?}, found {found:?}")]
    HeaderMismatch {
        object: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("row {row} of {object} has {found} columns, expected {expected}")]
    ColumnCount {
        object: String,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row} of {object}: column {column} value {value:?} is not a valid {expected_type}")]
    InvalidValue {
        object: String,
        row: usize,
        column: String,
        value: String,
        expected_type: &'static str,
    },
    #[error("row {row} of {object}: column {column} is required")]
    MissingValue {
        object: String,
        row: usize,
        column: String,
    },
    #[error("malformed csv in {object}: {message}")]
    Malformed { object: String, message: String },
}

/// Failure of a single pipeline task attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("transient transfer failure: {0}")]
    TransientTransferFailure(String),
    #[error("schema violation: {0}")]
    SchemaViolation(#[from] SchemaViolation),
    #[error("table not found: {table}")]
    TableNotFound { table: String },
    #[error("task {task_id} exceeded execution timeout of {timeout_secs}s")]
    TimedOut { task_id: String, timeout_secs: u64 },
    #[error("task {task_id} not started, upstream tasks did not succeed: {}", .unmet.join(", "))]
    DependencyNotMet { task_id: String, unmet: Vec<String> },
}

impl TaskError {
    /// Malformed data and bad arguments are not fixed by reattempting.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransientTransferFailure(_) | Self::TimedOut { .. }
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::TransientTransferFailure(_) => "transient_transfer_failure",
            Self::SchemaViolation(_) => "schema_violation",
            Self::TableNotFound { .. } => "table_not_found",
            Self::TimedOut { .. } => "timed_out",
            Self::DependencyNotMet { .. } => "dependency_not_met",
        }
    }
}

impl From<StoreError> for TaskError {
    fn from(error: StoreError) -> Self {
        Self::TransientTransferFailure(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_object_maps_to_retryable_failure() {
        let error = TaskError::from(StoreError::NotFound {
            key: "bank_data/accounts_data/2026-02-14/accounts.csv".to_string(),
        });
        assert!(error.is_retryable());
        assert_eq!(error.code(), "transient_transfer_failure");
    }

    #[test]
    fn schema_violation_is_not_retryable() {
        let error = TaskError::from(SchemaViolation::ColumnCount {
            object: "accounts.csv".to_string(),
            row: 2,
            expected: 6,
            found: 5,
        });
        assert!(!error.is_retryable());
        assert_eq!(
            error.to_string(),
            "schema violation: row 2 of accounts.csv has 5 columns, expected 6"
        );
    }

    #[test]
    fn dependency_error_lists_unmet_tasks() {
        let error = TaskError::DependencyNotMet {
            task_id: "insert_query_job".to_string(),
            unmet: vec!["load_accounts_csv".to_string(), "load_customer_csv".to_string()],
        };
        assert!(error
            .to_string()
            .ends_with("load_accounts_csv, load_customer_csv"));
    }
}
