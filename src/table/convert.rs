// src/table/convert.rs

use super::{Table, Value};
use arrow::{
    array::{
        Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
        TimestampMicrosecondArray,
    },
    compute::cast,
    datatypes::{DataType, Field, Schema, TimeUnit},
    error::ArrowError,
    record_batch::{RecordBatch, RecordBatchOptions},
    util::pretty::pretty_format_batches,
};
use chrono::{Datelike, NaiveDate};
use std::{fmt, sync::Arc};

fn downcast<'a, T: 'static>(arr: &'a ArrayRef, want: &str) -> Result<&'a T, ArrowError> {
    arr.as_any().downcast_ref::<T>().ok_or_else(|| {
        ArrowError::CastError(format!("expected {} array, got {:?}", want, arr.data_type()))
    })
}

/// Convert one Arrow column into cells.
///
/// Integer widths collapse to `Int`, float widths to `Float`, both string
/// layouts to `Str`, Date32/Date64 to `Date`, and any timestamp unit to
/// `Timestamp`. Dictionary columns are decoded first. NaN floats become `Null`.
fn column_values(array: &ArrayRef) -> Result<Vec<Value>, ArrowError> {
    let values = match array.data_type() {
        DataType::Null => vec![Value::Null; array.len()],

        DataType::Boolean => downcast::<BooleanArray>(array, "boolean")?
            .iter()
            .map(|v| v.map_or(Value::Null, Value::Bool))
            .collect(),

        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let arr = cast(array, &DataType::Int64)?;
            downcast::<Int64Array>(&arr, "int64")?
                .iter()
                .map(|v| v.map_or(Value::Null, Value::Int))
                .collect()
        }

        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let arr = cast(array, &DataType::Float64)?;
            downcast::<Float64Array>(&arr, "float64")?
                .iter()
                .map(|v| match v {
                    Some(f) if !f.is_nan() => Value::Float(f),
                    _ => Value::Null,
                })
                .collect()
        }

        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let arr = cast(array, &DataType::Utf8)?;
            downcast::<StringArray>(&arr, "utf8")?
                .iter()
                .map(|v| v.map_or(Value::Null, |s| Value::Str(s.to_string())))
                .collect()
        }

        DataType::Date32 | DataType::Date64 => {
            let arr = cast(array, &DataType::Date32)?;
            let dates = downcast::<Date32Array>(&arr, "date32")?;
            (0..dates.len())
                .map(|i| {
                    if dates.is_null(i) {
                        Value::Null
                    } else {
                        dates.value_as_date(i).map_or(Value::Null, Value::Date)
                    }
                })
                .collect()
        }

        DataType::Timestamp(_, _) => {
            let arr = cast(array, &DataType::Timestamp(TimeUnit::Microsecond, None))?;
            let ts = downcast::<TimestampMicrosecondArray>(&arr, "timestamp")?;
            (0..ts.len())
                .map(|i| {
                    if ts.is_null(i) {
                        Value::Null
                    } else {
                        ts.value_as_datetime(i).map_or(Value::Null, Value::Timestamp)
                    }
                })
                .collect()
        }

        DataType::Dictionary(_, value_type) => {
            let decoded = cast(array, value_type)?;
            column_values(&decoded)?
        }

        other => {
            return Err(ArrowError::CastError(format!(
                "unsupported column type {:?}",
                other
            )))
        }
    };
    Ok(values)
}

/// Narrowest Arrow type that holds every non-null value of a column.
/// Ints mixed with floats widen to Float64; any other mix falls back to Utf8.
fn column_type<'a>(values: impl Iterator<Item = &'a Value>) -> DataType {
    let mut current: Option<DataType> = None;
    for v in values {
        let next = match v {
            Value::Null => continue,
            Value::Bool(_) => DataType::Boolean,
            Value::Int(_) => DataType::Int64,
            Value::Float(_) => DataType::Float64,
            Value::Str(_) => DataType::Utf8,
            Value::Date(_) => DataType::Date32,
            Value::Timestamp(_) => DataType::Timestamp(TimeUnit::Microsecond, None),
        };
        current = Some(match current {
            None => next,
            Some(cur) if cur == next => cur,
            Some(DataType::Int64) if next == DataType::Float64 => DataType::Float64,
            Some(DataType::Float64) if next == DataType::Int64 => DataType::Float64,
            Some(_) => return DataType::Utf8,
        });
    }
    current.unwrap_or(DataType::Utf8)
}

/// Days from 0001-01-01 (CE) to 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn days_since_epoch(d: &NaiveDate) -> i32 {
    d.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn build_array<'a>(dt: &DataType, values: impl Iterator<Item = &'a Value>) -> ArrayRef {
    match dt {
        DataType::Boolean => Arc::new(BooleanArray::from(
            values
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Int64 => Arc::new(Int64Array::from(
            values.map(Value::as_i64).collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            values.map(Value::as_f64).collect::<Vec<_>>(),
        )),
        DataType::Date32 => Arc::new(Date32Array::from(
            values
                .map(|v| match v {
                    Value::Date(d) => Some(days_since_epoch(d)),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Timestamp(_, _) => Arc::new(TimestampMicrosecondArray::from(
            values
                .map(|v| match v {
                    Value::Timestamp(ts) => Some(ts.and_utc().timestamp_micros()),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            values
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect::<Vec<_>>(),
        )),
    }
}

impl Table {
    /// Materialise Arrow record batches into a row table. Column names come from `schema`.
    pub fn from_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<Self, ArrowError> {
        let columns: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
        let total: usize = batches.iter().map(RecordBatch::num_rows).sum();
        let mut rows: Vec<Vec<Value>> = Vec::with_capacity(total);

        for batch in batches {
            if batch.num_columns() != columns.len() {
                return Err(ArrowError::SchemaError(format!(
                    "batch has {} columns, schema has {}",
                    batch.num_columns(),
                    columns.len()
                )));
            }
            let start = rows.len();
            rows.extend((0..batch.num_rows()).map(|_| Vec::with_capacity(columns.len())));
            for array in batch.columns() {
                for (offset, value) in column_values(array)?.into_iter().enumerate() {
                    rows[start + offset].push(value);
                }
            }
        }

        Ok(Table { columns, rows })
    }

    /// Single record batch holding the whole table, one nullable field per column.
    pub fn to_batch(&self) -> Result<RecordBatch, ArrowError> {
        let mut fields = Vec::with_capacity(self.columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len());

        for (idx, name) in self.columns.iter().enumerate() {
            let dt = column_type(self.rows.iter().map(|r| &r[idx]));
            arrays.push(build_array(&dt, self.rows.iter().map(|r| &r[idx])));
            fields.push(Field::new(name, dt, true));
        }

        let options = RecordBatchOptions::new().with_row_count(Some(self.rows.len()));
        RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let batch = self.to_batch().map_err(|_| fmt::Error)?;
        let rendered = pretty_format_batches(&[batch]).map_err(|_| fmt::Error)?;
        write!(f, "{}", rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, LargeStringArray};

    #[test]
    fn from_batches_widens_and_keeps_nulls() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int32, true),
            Field::new("name", DataType::LargeUtf8, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema.clone()),
            vec![
                Arc::new(Int32Array::from(vec![Some(1), None])),
                Arc::new(LargeStringArray::from(vec![Some("a"), Some("b")])),
            ],
        )
        .unwrap();

        let table = Table::from_batches(&schema, &[batch.clone(), batch]).unwrap();
        assert_eq!(table.num_rows(), 4);
        assert_eq!(table.rows()[0], vec![Value::Int(1), Value::Str("a".into())]);
        assert_eq!(table.rows()[3], vec![Value::Null, Value::Str("b".into())]);
    }

    #[test]
    fn nan_floats_read_as_null() {
        let schema = Schema::new(vec![Field::new("CPI", DataType::Float32, true)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema.clone()),
            vec![Arc::new(arrow::array::Float32Array::from(vec![
                Some(211.0),
                Some(f32::NAN),
                None,
            ]))],
        )
        .unwrap();
        let table = Table::from_batches(&schema, &[batch]).unwrap();
        let cpi: Vec<_> = table.column("CPI").unwrap().cloned().collect();
        assert_eq!(cpi, vec![Value::Float(211.0), Value::Null, Value::Null]);
    }

    #[test]
    fn to_batch_picks_column_types() {
        let d = NaiveDate::from_ymd_opt(2010, 2, 5).unwrap();
        let table = Table::from_rows(
            vec!["n".into(), "mixed".into(), "when".into(), "odd".into()],
            vec![
                vec![Value::Int(1), Value::Int(2), Value::Date(d), Value::Int(1)],
                vec![Value::Null, Value::Float(2.5), Value::Null, Value::Str("x".into())],
            ],
        )
        .unwrap();

        let batch = table.to_batch().unwrap();
        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(schema.field(2).data_type(), &DataType::Date32);
        assert_eq!(schema.field(3).data_type(), &DataType::Utf8);

        let back = Table::from_batches(&schema, &[batch]).unwrap();
        assert_eq!(back.rows()[0][2], Value::Date(d));
        assert_eq!(back.rows()[1][1], Value::Float(2.5));
        assert_eq!(back.rows()[0][1], Value::Float(2.0));
    }

    #[test]
    fn display_renders_header() {
        let table = Table::from_rows(
            vec!["Month".into(), "Weekly_Sales".into()],
            vec![vec![Value::Int(2), Value::Float(33989.54)]],
        )
        .unwrap();
        let out = table.to_string();
        assert!(out.contains("Month"));
        assert!(out.contains("33989.54"));
    }
}
