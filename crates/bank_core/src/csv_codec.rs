//! Row-oriented CSV encoding for generated tables.
//!
//! Every table is written with a header row, one line per record and no
//! index column. Dates are ISO 8601 (`YYYY-MM-DD`) and fields containing the
//! delimiter are quoted.

use thiserror::Error;

use crate::records::TableRecord;
use crate::schema::Row;

pub const CONTENT_TYPE: &str = "text/csv";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unexpected csv header: expected {expected:?}, found {found:?}")]
    HeaderMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("failed to flush csv writer: {0}")]
    Flush(String),
}

/// Untyped view of a delimited object: header plus raw field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub records: Vec<Vec<String>>,
}

pub fn write_table<T: TableRecord>(rows: &[T]) -> Result<Vec<u8>, CodecError> {
    // Header is written explicitly so empty tables still carry it.
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(T::COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.into_inner()
        .map_err(|error| CodecError::Flush(error.to_string()))
}

pub fn read_table<T: TableRecord>(bytes: &[u8]) -> Result<Vec<T>, CodecError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let header = rdr.headers()?;
    if header.len() != T::COLUMNS.len()
        || header.iter().zip(T::COLUMNS).any(|(found, expected)| found != *expected)
    {
        return Err(CodecError::HeaderMismatch {
            expected: T::COLUMNS.iter().map(|c| c.to_string()).collect(),
            found: header.iter().map(str::to_string).collect(),
        });
    }

    rdr.deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(CodecError::from)
}

/// Reads any delimited object without enforcing a column count, so schema
/// checks can report the offending row themselves.
pub fn read_raw(bytes: &[u8]) -> Result<RawTable, CodecError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let header = rdr.headers()?.iter().map(str::to_string).collect();
    let mut records = Vec::new();
    for record in rdr.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { header, records })
}

pub fn write_rows(columns: &[&str], rows: &[Row]) -> Result<Vec<u8>, CodecError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(columns)?;
    for row in rows {
        wtr.write_record(row.iter().map(|cell| cell.to_field()))?;
    }
    wtr.into_inner()
        .map_err(|error| CodecError::Flush(error.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::records::{
        AccountRecord, AccountStatus, AccountType, Branch, CustomerRecord, LoanStatus,
    };

    fn sample_customer() -> CustomerRecord {
        CustomerRecord {
            customer_id: "CUST-0001".to_string(),
            name: "Dr. Kavya Iyer".to_string(),
            credit_score: 712,
            loan_status: LoanStatus::NotApplied,
            date_of_birth: NaiveDate::from_ymd_opt(1984, 2, 29).expect("valid date"),
            date_joined: NaiveDate::from_ymd_opt(2019, 7, 1).expect("valid date"),
            address: "H.No. 12, Lal Bagh Road, Bangalore 560027".to_string(),
            phone_number: "+91 9812345678".to_string(),
            email: "dr.kavya42@outlook.com".to_string(),
        }
    }

    #[test]
    fn customer_round_trip_keeps_quoted_address() {
        let rows = vec![sample_customer()];
        let bytes = write_table(&rows).expect("table should serialize");
        let text = String::from_utf8(bytes.clone()).expect("csv should be utf-8");

        assert!(text.starts_with(
            "Customer_ID,Name,Credit_Score,Loan_Status,Date_of_Birth,Date_Joined,Address,Phone_Number,Email\n"
        ));
        assert!(text.contains("\"H.No. 12, Lal Bagh Road, Bangalore 560027\""));
        assert!(text.contains(",1984-02-29,2019-07-01,"));

        let parsed: Vec<CustomerRecord> = read_table(&bytes).expect("table should parse");
        assert_eq!(parsed, rows);
    }

    #[test]
    fn empty_table_still_has_header() {
        let bytes = write_table::<AccountRecord>(&[]).expect("empty table should serialize");
        assert_eq!(
            String::from_utf8(bytes.clone()).expect("csv should be utf-8"),
            "Account_ID,Customer_ID,Account_Type,Opening_Date,Branch,Account_Status\n"
        );
        let parsed: Vec<AccountRecord> = read_table(&bytes).expect("empty table should parse");
        assert!(parsed.is_empty());
    }

    #[test]
    fn account_enum_labels_are_written_verbatim() {
        let rows = vec![AccountRecord {
            account_id: "ACC-0A1B2C3D".to_string(),
            customer_id: "CUST-0001".to_string(),
            account_type: AccountType::RecurringDeposit,
            opening_date: NaiveDate::from_ymd_opt(2010, 1, 1).expect("valid date"),
            branch: Branch::Hyderabad,
            account_status: AccountStatus::Inactive,
        }];
        let bytes = write_table(&rows).expect("table should serialize");
        let text = String::from_utf8(bytes).expect("csv should be utf-8");
        assert!(text.ends_with(
            "ACC-0A1B2C3D,CUST-0001,Recurring deposit account,2010-01-01,Hyderabad,Inactive\n"
        ));
    }

    #[test]
    fn read_table_rejects_foreign_header() {
        let error = read_table::<AccountRecord>(b"id,name\n1,x\n")
            .expect_err("wrong header should fail");
        assert!(matches!(error, CodecError::HeaderMismatch { .. }));
    }

    #[test]
    fn read_raw_tolerates_ragged_rows() {
        let raw = read_raw(b"a,b,c\n1,2,3\n4,5\n").expect("ragged csv should parse");
        assert_eq!(raw.header, vec!["a", "b", "c"]);
        assert_eq!(raw.records[1], vec!["4", "5"]);
    }
}
