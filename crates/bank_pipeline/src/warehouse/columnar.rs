use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Date32Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Date32Type, Field, Int64Type, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use bank_core::schema::{CellValue, ColumnMode, ColumnType, Row, TableSchema};
use bytes::Bytes;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use thiserror::Error;

// 1970-01-01 counted from 0001-01-01 (CE day 1).
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Error)]
pub enum ColumnarError {
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("parquet error: {0}")]
    Parquet(#[from] ParquetError),
    #[error("column {column} is stored as {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: String,
    },
    #[error("date32 value {0} is out of range")]
    DateOutOfRange(i32),
}

fn data_type(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::String => DataType::Utf8,
        ColumnType::Int64 => DataType::Int64,
        ColumnType::Date => DataType::Date32,
    }
}

pub fn arrow_schema(schema: &TableSchema) -> Schema {
    Schema::new(
        schema
            .fields
            .iter()
            .map(|field| {
                Field::new(
                    &field.name,
                    data_type(field.column_type),
                    field.mode == ColumnMode::Nullable,
                )
            })
            .collect::<Vec<_>>(),
    )
}

fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn days_to_date(days: i32) -> Result<NaiveDate, ColumnarError> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or(ColumnarError::DateOutOfRange(days))
}

/// Rows must already conform to `schema`; a mismatched cell is stored as null.
pub fn rows_to_batch(schema: &TableSchema, rows: &[Row]) -> Result<RecordBatch, ColumnarError> {
    let columns: Vec<ArrayRef> = schema
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| column_array(field.column_type, index, rows))
        .collect();

    Ok(RecordBatch::try_new(
        Arc::new(arrow_schema(schema)),
        columns,
    )?)
}

fn column_array(column_type: ColumnType, index: usize, rows: &[Row]) -> ArrayRef {
    let cells = rows.iter().map(|row| row.get(index));
    match column_type {
        ColumnType::String => {
            let mut builder = StringBuilder::new();
            for cell in cells {
                match cell {
                    Some(CellValue::String(value)) => builder.append_value(value),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Int64 => {
            let mut builder = Int64Builder::with_capacity(rows.len());
            for cell in cells {
                match cell {
                    Some(CellValue::Int64(value)) => builder.append_value(*value),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Date => {
            let mut builder = Date32Builder::with_capacity(rows.len());
            for cell in cells {
                match cell {
                    Some(CellValue::Date(value)) => builder.append_value(date_to_days(*value)),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
    }
}

pub fn batch_to_rows(schema: &TableSchema, batch: &RecordBatch) -> Result<Vec<Row>, ColumnarError> {
    let mut rows: Vec<Row> = vec![Vec::with_capacity(schema.len()); batch.num_rows()];

    for (field, column) in schema.fields.iter().zip(batch.columns()) {
        let mismatch = || ColumnarError::TypeMismatch {
            column: field.name.clone(),
            expected: field.column_type.as_str(),
            found: column.data_type().to_string(),
        };

        match field.column_type {
            ColumnType::String => {
                let values = column.as_string_opt::<i32>().ok_or_else(mismatch)?;
                for (row, index) in rows.iter_mut().zip(0..) {
                    row.push(if values.is_null(index) {
                        CellValue::Null
                    } else {
                        CellValue::String(values.value(index).to_string())
                    });
                }
            }
            ColumnType::Int64 => {
                let values = column
                    .as_primitive_opt::<Int64Type>()
                    .ok_or_else(mismatch)?;
                for (row, index) in rows.iter_mut().zip(0..) {
                    row.push(if values.is_null(index) {
                        CellValue::Null
                    } else {
                        CellValue::Int64(values.value(index))
                    });
                }
            }
            ColumnType::Date => {
                let values = column
                    .as_primitive_opt::<Date32Type>()
                    .ok_or_else(mismatch)?;
                for (row, index) in rows.iter_mut().zip(0..) {
                    row.push(if values.is_null(index) {
                        CellValue::Null
                    } else {
                        CellValue::Date(days_to_date(values.value(index))?)
                    });
                }
            }
        }
    }

    Ok(rows)
}

pub fn encode_parquet(batch: &RecordBatch) -> Result<Vec<u8>, ColumnarError> {
    let props = WriterProperties::builder().build();
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(buffer)
}

pub fn decode_parquet(bytes: Vec<u8>) -> Result<Vec<RecordBatch>, ColumnarError> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))?.build()?;
    reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(ColumnarError::from)
}

#[cfg(test)]
mod tests {
    use bank_core::schema::{account_schema, customer_schema};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn date32_offsets_are_days_since_unix_epoch() {
        assert_eq!(date_to_days(date(1970, 1, 1)), 0);
        assert_eq!(date_to_days(date(1970, 1, 2)), 1);
        assert_eq!(days_to_date(-1).expect("in range"), date(1969, 12, 31));
    }

    #[test]
    fn customer_rows_survive_parquet_encoding_with_nulls() {
        let schema = customer_schema();
        let rows = vec![
            vec![
                CellValue::String("CUST-0001".to_string()),
                CellValue::String("Asha Rao".to_string()),
                CellValue::Int64(712),
                CellValue::String("Approved".to_string()),
                CellValue::Date(date(1988, 3, 9)),
                CellValue::Date(date(2019, 7, 1)),
                CellValue::String("12 MG Road, Pune 411001".to_string()),
                CellValue::String("+91 9876543210".to_string()),
                CellValue::String("asharao42@gmail.com".to_string()),
            ],
            vec![
                CellValue::String("CUST-0002".to_string()),
                CellValue::Null,
                CellValue::Null,
                CellValue::String("Pending".to_string()),
                CellValue::Null,
                CellValue::Date(date(2015, 1, 1)),
                CellValue::Null,
                CellValue::Null,
                CellValue::Null,
            ],
        ];

        let batch = rows_to_batch(&schema, &rows).expect("batch builds");
        let bytes = encode_parquet(&batch).expect("parquet encodes");
        let decoded: Vec<Row> = decode_parquet(bytes)
            .expect("parquet decodes")
            .iter()
            .flat_map(|batch| batch_to_rows(&schema, batch).expect("rows decode"))
            .collect();

        assert_eq!(decoded, rows);
    }

    #[test]
    fn reading_with_wrong_schema_reports_type_mismatch() {
        let batch = rows_to_batch(&customer_schema(), &[]).expect("empty batch builds");
        let error = batch_to_rows(&account_schema(), &batch).expect_err("schemas differ");
        assert!(matches!(error, ColumnarError::TypeMismatch { .. }));
    }
}
