//! Streaming parquet scans with column projection.
//!
//! Scans decode only the columns the pipeline needs and hand rows out in
//! bounded batches, so memory stays proportional to the batch size rather
//! than the file. Any unreadable batch surfaces as an error; there is no
//! skipping of undecodable data.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow_array::types::Int32Type;
use arrow_array::{
    Array, ArrayRef, BooleanArray, DictionaryArray, Int16Array, Int32Array, Int64Array,
    Int8Array, LargeStringArray, RecordBatch, StringArray, UInt16Array, UInt32Array, UInt64Array,
    UInt8Array,
};
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ProjectionMask;

use crate::error::{DataError, Result};
use crate::record::{TestRecord, TrainRecord};
use crate::schema::DatasetSchema;

/// Scan over labelled training rows.
pub struct TrainScan {
    reader: ParquetRecordBatchReader,
    schema: DatasetSchema,
    path: PathBuf,
    total_rows: i64,
}

impl TrainScan {
    pub fn open(path: &Path, schema: &DatasetSchema, batch_size: usize) -> Result<Self> {
        let (reader, total_rows) = open_reader(path, &schema.train_columns(), batch_size)?;
        Ok(Self {
            reader,
            schema: schema.clone(),
            path: path.to_path_buf(),
            total_rows,
        })
    }

    /// Row count from parquet metadata, available before any batch decodes.
    pub fn total_rows(&self) -> i64 {
        self.total_rows
    }
}

impl Iterator for TrainScan {
    type Item = Result<Vec<TrainRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self.reader.next()?;
        Some(
            batch
                .map_err(|source| DataError::Batch {
                    path: self.path.clone(),
                    source,
                })
                .and_then(|batch| decode_train(&batch, &self.schema, &self.path)),
        )
    }
}

/// Scan over unlabelled inference rows.
pub struct TestScan {
    reader: ParquetRecordBatchReader,
    schema: DatasetSchema,
    path: PathBuf,
    total_rows: i64,
}

impl TestScan {
    pub fn open(path: &Path, schema: &DatasetSchema, batch_size: usize) -> Result<Self> {
        let (reader, total_rows) = open_reader(path, &schema.test_columns(), batch_size)?;
        Ok(Self {
            reader,
            schema: schema.clone(),
            path: path.to_path_buf(),
            total_rows,
        })
    }

    pub fn total_rows(&self) -> i64 {
        self.total_rows
    }
}

impl Iterator for TestScan {
    type Item = Result<Vec<TestRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self.reader.next()?;
        Some(
            batch
                .map_err(|source| DataError::Batch {
                    path: self.path.clone(),
                    source,
                })
                .and_then(|batch| decode_test(&batch, &self.schema, &self.path)),
        )
    }
}

fn open_reader(
    path: &Path,
    columns: &[&str],
    batch_size: usize,
) -> Result<(ParquetRecordBatchReader, i64)> {
    let file = File::open(path).map_err(|source| DataError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|source| DataError::Parquet {
            path: path.to_path_buf(),
            source,
        })?;
    let total_rows = builder.metadata().file_metadata().num_rows();

    let arrow_schema = builder.schema().clone();
    let mut indices = Vec::with_capacity(columns.len());
    for &name in columns {
        let idx = arrow_schema
            .index_of(name)
            .map_err(|_| DataError::MissingColumn {
                column: name.to_string(),
                path: path.to_path_buf(),
            })?;
        indices.push(idx);
    }

    let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
    let reader = builder
        .with_projection(mask)
        .with_batch_size(batch_size)
        .build()
        .map_err(|source| DataError::Parquet {
            path: path.to_path_buf(),
            source,
        })?;
    Ok((reader, total_rows))
}

fn decode_train(
    batch: &RecordBatch,
    schema: &DatasetSchema,
    path: &Path,
) -> Result<Vec<TrainRecord>> {
    let ids = column(batch, &schema.id, path)?;
    let molecules = column(batch, &schema.molecule, path)?;
    let proteins = column(batch, &schema.protein, path)?;
    let outcomes = column(batch, &schema.outcome, path)?;

    let mut rows = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        rows.push(TrainRecord {
            id: int_value(ids, &schema.id, row)?,
            smiles: string_value(molecules, &schema.molecule, row)?,
            protein: string_value(proteins, &schema.protein, row)?,
            outcome: outcome_value(outcomes, &schema.outcome, row)?,
        });
    }
    Ok(rows)
}

fn decode_test(batch: &RecordBatch, schema: &DatasetSchema, path: &Path) -> Result<Vec<TestRecord>> {
    let ids = column(batch, &schema.id, path)?;
    let molecules = column(batch, &schema.molecule, path)?;
    let proteins = column(batch, &schema.protein, path)?;

    let mut rows = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        rows.push(TestRecord {
            id: int_value(ids, &schema.id, row)?,
            smiles: string_value(molecules, &schema.molecule, row)?,
            protein: string_value(proteins, &schema.protein, row)?,
        });
    }
    Ok(rows)
}

// ── Column access ────────────────────────────────────────────────────────────

fn column<'a>(batch: &'a RecordBatch, name: &str, path: &Path) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DataError::MissingColumn {
            column: name.to_string(),
            path: path.to_path_buf(),
        })
}

fn unsupported(column: &str, col: &ArrayRef) -> DataError {
    DataError::ColumnType {
        column: column.to_string(),
        datatype: col.data_type().to_string(),
    }
}

/// Reads a string cell from a Utf8, LargeUtf8 or dictionary-encoded column.
fn string_value(col: &ArrayRef, column: &str, row: usize) -> Result<String> {
    if col.is_null(row) {
        return Err(DataError::NullValue {
            column: column.to_string(),
            row,
        });
    }
    if let Some(array) = col.as_any().downcast_ref::<StringArray>() {
        return Ok(array.value(row).to_string());
    }
    if let Some(array) = col.as_any().downcast_ref::<LargeStringArray>() {
        return Ok(array.value(row).to_string());
    }
    if let Some(dict) = col.as_any().downcast_ref::<DictionaryArray<Int32Type>>() {
        if let Some(values) = dict.values().as_any().downcast_ref::<StringArray>() {
            let key = dict.keys().value(row) as usize;
            return Ok(values.value(key).to_string());
        }
    }
    Err(unsupported(column, col))
}

/// Reads an integer cell from any primitive integer column.
fn int_value(col: &ArrayRef, column: &str, row: usize) -> Result<i64> {
    if col.is_null(row) {
        return Err(DataError::NullValue {
            column: column.to_string(),
            row,
        });
    }
    if let Some(array) = col.as_any().downcast_ref::<Int64Array>() {
        return Ok(array.value(row));
    }
    if let Some(array) = col.as_any().downcast_ref::<Int32Array>() {
        return Ok(array.value(row) as i64);
    }
    if let Some(array) = col.as_any().downcast_ref::<Int16Array>() {
        return Ok(array.value(row) as i64);
    }
    if let Some(array) = col.as_any().downcast_ref::<Int8Array>() {
        return Ok(array.value(row) as i64);
    }
    if let Some(array) = col.as_any().downcast_ref::<UInt64Array>() {
        let value = array.value(row);
        return i64::try_from(value).map_err(|_| DataError::IdOverflow {
            column: column.to_string(),
            value,
            row,
        });
    }
    if let Some(array) = col.as_any().downcast_ref::<UInt32Array>() {
        return Ok(array.value(row) as i64);
    }
    if let Some(array) = col.as_any().downcast_ref::<UInt16Array>() {
        return Ok(array.value(row) as i64);
    }
    if let Some(array) = col.as_any().downcast_ref::<UInt8Array>() {
        return Ok(array.value(row) as i64);
    }
    Err(unsupported(column, col))
}

/// Reads a binary outcome from an integer or boolean column.
fn outcome_value(col: &ArrayRef, column: &str, row: usize) -> Result<u8> {
    if col.is_null(row) {
        return Err(DataError::NullValue {
            column: column.to_string(),
            row,
        });
    }
    if let Some(array) = col.as_any().downcast_ref::<BooleanArray>() {
        return Ok(array.value(row) as u8);
    }
    match int_value(col, column, row)? {
        0 => Ok(0),
        1 => Ok(1),
        value => Err(DataError::NonBinaryOutcome {
            column: column.to_string(),
            value,
        }),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn train_scan_reads_all_rows_in_bounded_batches() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("train.parquet");
        let rows = vec![
            (1, "CCO", "BRD4", 0),
            (2, "CCN", "BRD4", 1),
            (3, "CCC", "HSA", 0),
            (4, "c1ccccc1", "sEH", 1),
            (5, "CC(C)C", "HSA", 0),
        ];
        fixture::write_train_parquet(&path, &rows);

        let scan = TrainScan::open(&path, &DatasetSchema::default(), 2).unwrap();
        assert_eq!(scan.total_rows(), 5);

        let mut seen = Vec::new();
        for batch in scan {
            let batch = batch.unwrap();
            assert!(batch.len() <= 2);
            seen.extend(batch);
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[0].id, 1);
        assert_eq!(seen[0].smiles, "CCO");
        assert_eq!(seen[3].protein, "sEH");
        assert_eq!(seen[3].outcome, 1);
    }

    #[test]
    fn test_scan_does_not_require_the_outcome_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.parquet");
        fixture::write_test_parquet(&path, &[(10, "CCO", "BRD4"), (11, "CCCl", "HSA")]);

        let scan = TestScan::open(&path, &DatasetSchema::default(), 64).unwrap();
        let rows: Vec<_> = scan.flat_map(|b| b.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], TestRecord {
            id: 11,
            smiles: "CCCl".to_string(),
            protein: "HSA".to_string(),
        });
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.parquet");
        fixture::write_test_parquet(&path, &[(1, "CCO", "BRD4")]);

        let err = TrainScan::open(&path, &DatasetSchema::default(), 64)
            .err()
            .unwrap();
        match err {
            DataError::MissingColumn { column, .. } => assert_eq!(column, "binds"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn boolean_outcomes_decode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("train.parquet");
        fixture::write_train_parquet_bool(&path, &[(1, "CCO", "BRD4", true), (2, "CCN", "HSA", false)]);

        let scan = TrainScan::open(&path, &DatasetSchema::default(), 64).unwrap();
        let rows: Vec<_> = scan.flat_map(|b| b.unwrap()).collect();
        assert_eq!(rows[0].outcome, 1);
        assert_eq!(rows[1].outcome, 0);
    }

    #[test]
    fn non_binary_outcome_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("train.parquet");
        fixture::write_train_parquet(&path, &[(1, "CCO", "BRD4", 3)]);

        let mut scan = TrainScan::open(&path, &DatasetSchema::default(), 64).unwrap();
        let err = scan.next().unwrap().unwrap_err();
        match err {
            DataError::NonBinaryOutcome { value, .. } => assert_eq!(value, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn absent_file_is_reported_with_its_path() {
        let err = TrainScan::open(
            Path::new("/nonexistent/train.parquet"),
            &DatasetSchema::default(),
            64,
        )
        .err()
        .unwrap();
        assert!(matches!(err, DataError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/train.parquet"));
    }
}
