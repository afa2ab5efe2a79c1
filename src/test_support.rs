// Shared fixtures for unit tests.
use crate::table::{Table, Value};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub(crate) fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,grocery_etl=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Seven merged rows exercising forward-fill, the null-sales drop and the inclusive floor.
pub(crate) fn reference_raw_table() -> Table {
    let columns = [
        "Unnamed: 0",
        "index",
        "Store_ID",
        "Date",
        "Dept",
        "Weekly_Sales",
        "IsHoliday",
        "Temperature",
        "Fuel_Price",
        "MarkDown1",
        "CPI",
        "Unemployment",
    ];
    let dates = [
        Some("2010-02-05"),
        None,
        Some("2010-03-01"),
        Some("2010-03-01"),
        Some("2010-04-05"),
        Some("2011-02-05"),
        Some("2011-03-01"),
    ];
    let depts = [1, 5, 10, 28, 13, 49, 72];
    let sales = [
        Value::Float(46729.77),
        Value::Float(21249.31),
        Value::Float(11737.12),
        Value::Null,
        Value::Float(19047.05),
        Value::Int(0),
        Value::Float(10000.0),
    ];
    let temps = [19.3, 19.3, 19.3, 25.0, 20.9, 28.7, 29.1];
    let cpi = [
        Some(211.096358),
        Some(211.096358),
        Some(211.096358),
        Some(211.096358),
        Some(211.096358),
        None,
        Some(211.096358),
    ];
    let unemployment = [Some(8.106), None, Some(8.106), None, None, None, Some(8.106)];

    let opt_f = |v: Option<f64>| v.map_or(Value::Null, Value::Float);
    let rows = (0..7)
        .map(|i| {
            vec![
                Value::Int(i as i64),
                Value::Int(i as i64),
                Value::Int(1),
                dates[i].map_or(Value::Null, |d| Value::Str(d.to_string())),
                Value::Int(depts[i]),
                sales[i].clone(),
                Value::Int(0),
                Value::Float(temps[i]),
                Value::Int(0),
                Value::Float(0.0),
                opt_f(cpi[i]),
                opt_f(unemployment[i]),
            ]
        })
        .collect();

    Table::from_rows(columns.iter().map(|c| c.to_string()).collect(), rows)
        .expect("fixture rows match header")
}

/// The reference rows split across a CSV and a Parquet file joined on `index`.
/// Returns `(csv_path, parquet_path)`.
pub(crate) fn write_reference_sources(dir: &Path) -> (PathBuf, PathBuf) {
    let csv_path = dir.join("grocery_sales.csv");
    fs::write(
        &csv_path,
        "\
,index,Store_ID,Date,Dept,Weekly_Sales,IsHoliday
0,0,1,2010-02-05,1,46729.77,0
1,1,1,,5,21249.31,0
2,2,1,2010-03-01,10,11737.12,0
3,3,1,2010-03-01,28,,0
4,4,1,2010-04-05,13,19047.05,0
5,5,1,2011-02-05,49,0,0
6,6,1,2011-03-01,72,10000.0,0
",
    )
    .expect("write csv fixture");

    let schema = Arc::new(Schema::new(vec![
        Field::new("index", DataType::Int64, false),
        Field::new("Temperature", DataType::Float64, true),
        Field::new("CPI", DataType::Float64, true),
        Field::new("Unemployment", DataType::Float64, true),
    ]));
    let c = 211.096358;
    let columns: Vec<ArrayRef> = vec![
        // parquet order differs from the csv on purpose
        Arc::new(Int64Array::from(vec![6, 5, 4, 3, 2, 1, 0])),
        Arc::new(Float64Array::from(vec![29.1, 28.7, 20.9, 25.0, 19.3, 19.3, 19.3])),
        Arc::new(Float64Array::from(vec![
            Some(c),
            None,
            Some(c),
            Some(c),
            Some(c),
            Some(c),
            Some(c),
        ])),
        Arc::new(Float64Array::from(vec![
            Some(8.106),
            None,
            None,
            None,
            Some(8.106),
            None,
            Some(8.106),
        ])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).expect("fixture batch");

    let parquet_path = dir.join("extra_data.parquet");
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let file = File::create(&parquet_path).expect("create parquet fixture");
    let mut writer = ArrowWriter::try_new(file, schema, Some(props)).expect("parquet writer");
    writer.write(&batch).expect("write parquet fixture");
    writer.close().expect("close parquet fixture");

    (csv_path, parquet_path)
}
