use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROOT_PREFIX: &str = "bank_data";
pub const WAREHOUSE_PREFIX: &str = "warehouse";

/// Entity tables shipped by the generator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customers,
    Accounts,
}

impl EntityKind {
    pub fn folder(self) -> &'static str {
        match self {
            Self::Customers => "customer_data",
            Self::Accounts => "accounts_data",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Customers => "customers.csv",
            Self::Accounts => "accounts.csv",
        }
    }
}

pub fn format_run_date(run_date: NaiveDate) -> String {
    run_date.format("%Y-%m-%d").to_string()
}

pub fn partition_prefix(root_prefix: &str, entity: EntityKind, run_date: NaiveDate) -> String {
    let trimmed = root_prefix.trim_matches('/');
    let run_date = format_run_date(run_date);
    if trimmed.is_empty() {
        format!("{}/{run_date}", entity.folder())
    } else {
        format!("{trimmed}/{}/{run_date}", entity.folder())
    }
}

/// `<root>/<entity-folder>/<YYYY-MM-DD>/<entity>.csv`; same-day runs share a key.
pub fn entity_object_key(root_prefix: &str, entity: EntityKind, run_date: NaiveDate) -> String {
    format!(
        "{}/{}",
        partition_prefix(root_prefix, entity, run_date),
        entity.file_name()
    )
}

pub fn warehouse_table_prefix(dataset: &str, table: &str) -> String {
    format!("{WAREHOUSE_PREFIX}/{dataset}/{table}/")
}

pub fn warehouse_part_key(dataset: &str, table: &str, part: usize) -> String {
    format!(
        "{}part-{part:05}.parquet",
        warehouse_table_prefix(dataset, table)
    )
}

/// Part index encoded in a key built by [`warehouse_part_key`].
pub fn parse_part_index(key: &str) -> Option<usize> {
    let file_name = key.rsplit('/').next()?;
    file_name
        .strip_prefix("part-")?
        .strip_suffix(".parquet")?
        .parse()
        .ok()
}

pub fn warehouse_schema_key(dataset: &str, table: &str) -> String {
    format!("{}_schema.json", warehouse_table_prefix(dataset, table))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 14).expect("valid date")
    }

    #[test]
    fn builds_customer_key_with_date_partition() {
        let key = entity_object_key("bank_data/", EntityKind::Customers, run_date());
        assert_eq!(key, "bank_data/customer_data/2026-02-14/customers.csv");
    }

    #[test]
    fn builds_accounts_key_with_date_partition() {
        let key = entity_object_key("/bank_data", EntityKind::Accounts, run_date());
        assert_eq!(key, "bank_data/accounts_data/2026-02-14/accounts.csv");
    }

    #[test]
    fn empty_root_prefix_omits_leading_segment() {
        let key = entity_object_key("", EntityKind::Accounts, run_date());
        assert_eq!(key, "accounts_data/2026-02-14/accounts.csv");
    }

    #[test]
    fn builds_zero_padded_warehouse_part_key() {
        assert_eq!(
            warehouse_part_key("Raw_Dataset", "accounts", 7),
            "warehouse/Raw_Dataset/accounts/part-00007.parquet"
        );
        assert_eq!(
            parse_part_index("warehouse/Raw_Dataset/accounts/part-00007.parquet"),
            Some(7)
        );
        assert_eq!(
            parse_part_index("warehouse/Raw_Dataset/accounts/_schema.json"),
            None
        );
    }
}
