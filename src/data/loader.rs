use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::LoadError;
use super::model::{Dataset, Record};

/// Columns every listings file must carry, in [`Record`] field order.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "brand",
    "model",
    "year",
    "price",
    "transmission",
    "mileage",
    "fuel_type",
    "engine_size",
    "condition",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a listings dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – comma-separated with a header row (the primary format)
/// * `.json`    – `[{ "brand": "...", "price": 12000, ... }, ...]`
/// * `.parquet` – one column per field, any integer/float/string types
///
/// Unparsable numeric cells become nulls; only a missing file, a malformed
/// file or a missing required column is an error.
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => read_csv(File::open(path)?)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} listings from {}",
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Cell coercion shared by every format
// ---------------------------------------------------------------------------

/// Text that stands for a missing value in any column, as pandas' default
/// `na_values` treat it. Matched after trimming, case-sensitively.
const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Trimmed cell text, or `None` for blank and NA-token cells.
fn present(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() || NA_TOKENS.contains(&trimmed) {
        None
    } else {
        Some(trimmed)
    }
}

/// A raw cell before it is coerced into a [`Record`] field.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Null,
    Text(String),
    Number(f64),
}

/// Counts of non-empty cells that failed numeric parsing, per numeric field.
#[derive(Debug, Default)]
struct CoercionTally {
    year: usize,
    price: usize,
    mileage: usize,
    engine_size: usize,
}

impl CoercionTally {
    fn report(&self) {
        for (column, n) in [
            ("year", self.year),
            ("price", self.price),
            ("mileage", self.mileage),
            ("engine_size", self.engine_size),
        ] {
            if n > 0 {
                log::warn!("{n} non-numeric '{column}' cells loaded as null");
            }
        }
    }
}

fn text_cell(cell: Cell) -> Option<String> {
    match cell {
        Cell::Null => None,
        Cell::Text(s) => present(&s).map(str::to_string),
        Cell::Number(n) if n.is_nan() => None,
        Cell::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            Some((n as i64).to_string())
        }
        Cell::Number(n) => Some(n.to_string()),
    }
}

/// Parse a numeric cell; NaN and NA tokens count as null, like an empty
/// cell. `failures` is bumped for any other text that does not parse.
fn number_cell(cell: Cell, failures: &mut usize) -> Option<f64> {
    let value = match cell {
        Cell::Null => return None,
        Cell::Number(n) => n,
        Cell::Text(s) => {
            let trimmed = present(&s)?;
            match trimmed.parse::<f64>() {
                Ok(v) => v,
                Err(_) => {
                    *failures += 1;
                    return None;
                }
            }
        }
    };
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Years must be whole numbers; `2019.0` is accepted, `2019.5` is not.
fn year_cell(cell: Cell, failures: &mut usize) -> Option<i64> {
    let value = number_cell(cell, failures)?;
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        *failures += 1;
        None
    }
}

/// Build a record from cells given in [`REQUIRED_COLUMNS`] order.
fn build_record(cells: [Cell; 9], tally: &mut CoercionTally) -> Record {
    let [brand, model, year, price, transmission, mileage, fuel_type, engine_size, condition] =
        cells;
    Record {
        brand: text_cell(brand),
        model: text_cell(model),
        year: year_cell(year, &mut tally.year),
        price: number_cell(price, &mut tally.price),
        transmission: text_cell(transmission),
        mileage: number_cell(mileage, &mut tally.mileage),
        fuel_type: text_cell(fuel_type),
        engine_size: number_cell(engine_size, &mut tally.engine_size),
        condition: text_cell(condition),
    }
}

/// Locate each required column in `headers`.
fn resolve_columns<S: AsRef<str>>(headers: &[S]) -> Result<[usize; 9], LoadError> {
    let mut indices = [0usize; 9];
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.as_ref().trim() == name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;
    }
    Ok(indices)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read comma-separated listings with a header row from any reader.
/// Columns beyond [`REQUIRED_COLUMNS`] are ignored; cells missing from a
/// short row load as null.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let indices = resolve_columns(headers.as_slice())?;

    let mut tally = CoercionTally::default();
    let mut records = Vec::new();

    for result in reader.records() {
        let row = result?;
        let cells = indices.map(|i| Cell::Text(row.get(i).unwrap_or("").to_string()));
        records.push(build_record(cells, &mut tally));
    }

    tally.report();
    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "brand": "Toyota", "model": "Corolla", "year": 2019, "price": 14500.0,
///     "transmission": "Automatic", "mileage": 42000, "fuel_type": "Petrol",
///     "engine_size": 1.8, "condition": "Used" },
///   ...
/// ]
/// ```
///
/// A key absent from some objects loads as null there; a required key
/// absent from every object is a missing column.
fn load_json(path: &Path) -> Result<Dataset, LoadError> {
    let text = std::fs::read_to_string(path)?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let rows = root
        .as_array()
        .ok_or_else(|| LoadError::Malformed("expected a top-level JSON array".to_string()))?;

    let objects = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.as_object().ok_or_else(|| LoadError::InvalidRow {
                row: i,
                reason: "not a JSON object".to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if !objects.is_empty() {
        if let Some(name) = REQUIRED_COLUMNS
            .into_iter()
            .find(|name| !objects.iter().any(|obj| obj.contains_key(*name)))
        {
            return Err(LoadError::MissingColumn(name.to_string()));
        }
    }

    let mut tally = CoercionTally::default();
    let mut records = Vec::with_capacity(objects.len());

    for obj in objects {
        let cells = REQUIRED_COLUMNS.map(|name| obj.get(name).map_or(Cell::Null, json_to_cell));
        records.push(build_record(cells, &mut tally));
    }

    tally.report();
    Ok(Dataset::from_records(records))
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::Null => Cell::Null,
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Number(n) => n.as_f64().map_or(Cell::Null, Cell::Number),
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas (`df.to_parquet()`) or Polars
/// (`df.write_parquet()`). Column types are free: integers and floats feed
/// numeric fields, strings are parsed like CSV cells.
fn load_parquet(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let header_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let indices = resolve_columns(header_names.as_slice())?;
    let reader = builder.build()?;

    let mut tally = CoercionTally::default();
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let columns = indices.map(|i| batch.column(i).clone());

        for row in 0..batch.num_rows() {
            let mut cells: [Cell; 9] = std::array::from_fn(|_| Cell::Null);
            for (cell, col) in cells.iter_mut().zip(&columns) {
                *cell = extract_cell(col, row)?;
            }
            records.push(build_record(cells, &mut tally));
        }
    }

    tally.report();
    Ok(Dataset::from_records(records))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<Cell, LoadError> {
    if col.is_null(row) {
        return Ok(Cell::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => Cell::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Cell::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Cell::Number(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Int64 => Cell::Number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Float32 => Cell::Number(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Cell::Number(col.as_primitive::<Float64Type>().value(row)),
        // Dictionary-encoded categoricals, booleans and the rest.
        _ => Cell::Text(array_value_to_string(col.as_ref(), row)?),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CategoryValue, Dimension};

    const HEADER: &str = "brand,model,year,price,transmission,mileage,fuel_type,engine_size,condition";

    fn csv_of(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text.push('\n');
        text
    }

    #[test]
    fn reads_all_rows_in_order() {
        let text = csv_of(&[
            "Toyota,Corolla,2020,10000,Automatic,30000,Petrol,1.8,Used",
            "Honda,Civic,2019,15000,Manual,45000,Diesel,2.0,New",
        ]);
        let ds = read_csv(text.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        let first = &ds.records()[0];
        assert_eq!(first.brand.as_deref(), Some("Toyota"));
        assert_eq!(first.year, Some(2020));
        assert_eq!(first.price, Some(10000.0));
        assert_eq!(first.engine_size, Some(1.8));
        assert_eq!(ds.records()[1].condition.as_deref(), Some("New"));
    }

    #[test]
    fn unparsable_numbers_become_null() {
        let text = csv_of(&[
            "Toyota,Corolla,unknown,N/A,Automatic,30000,Petrol,1.8,Used",
            "Honda,Civic,2019.0,,Manual,lots,Diesel,2.0,",
        ]);
        let ds = read_csv(text.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);

        let first = &ds.records()[0];
        assert_eq!(first.year, None);
        assert_eq!(first.price, None);
        assert_eq!(first.mileage, Some(30000.0));

        let second = &ds.records()[1];
        assert_eq!(second.year, Some(2019));
        assert_eq!(second.price, None);
        assert_eq!(second.mileage, None);
        assert_eq!(second.condition, None);
    }

    #[test]
    fn na_tokens_are_null_in_every_column() {
        let text = csv_of(&[
            "Toyota,NA,2020,NaN,null,30000,NA,1.8,N/A",
            "Honda,Civic,2019,15000,Manual,n/a,Petrol,None,Used",
        ]);
        let ds = read_csv(text.as_bytes()).unwrap();

        let first = &ds.records()[0];
        assert_eq!(first.model, None);
        assert_eq!(first.price, None);
        assert_eq!(first.transmission, None);
        assert_eq!(first.fuel_type, None);
        assert_eq!(first.condition, None);

        let second = &ds.records()[1];
        assert_eq!(second.mileage, None);
        assert_eq!(second.engine_size, None);

        let conditions: Vec<_> = ds
            .distinct_values(Dimension::Condition)
            .iter()
            .cloned()
            .collect();
        assert_eq!(conditions, vec![CategoryValue::from("Used")]);

        let mut failures = 0;
        assert_eq!(number_cell(Cell::Text(" N/A ".into()), &mut failures), None);
        assert_eq!(failures, 0);
    }

    #[test]
    fn short_rows_pad_with_nulls() {
        let text = csv_of(&[
            "Toyota,Corolla,2020,10000,Automatic,30000,Petrol,1.8",
            "Honda,Civic,2019,15000,Manual,45000,Diesel,2.0,New",
        ]);
        let ds = read_csv(text.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].engine_size, Some(1.8));
        assert_eq!(ds.records()[0].condition, None);
        assert_eq!(ds.records()[1].condition.as_deref(), Some("New"));
    }

    #[test]
    fn csv_error_message_is_not_prefixed_twice() {
        let mut bytes = csv_of(&[]).into_bytes();
        bytes.extend_from_slice(b"Toyota,Corolla,2020,10000,Automatic,30000,Petrol,1.8,\xffUsed\n");
        let err = read_csv(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
        assert!(!err.to_string().contains("CSV error: CSV"));
    }

    #[test]
    fn extra_and_reordered_columns_are_tolerated() {
        let text = "id,condition,price,brand,model,year,colour,transmission,mileage,fuel_type,engine_size\n\
                    7,Used,9999.5,Kia,Rio,2018,red,Manual,12000,Petrol,1.2\n";
        let ds = read_csv(text.as_bytes()).unwrap();
        let r = &ds.records()[0];
        assert_eq!(r.brand.as_deref(), Some("Kia"));
        assert_eq!(r.price, Some(9999.5));
        assert_eq!(r.condition.as_deref(), Some("Used"));
    }

    #[test]
    fn missing_column_is_rejected() {
        let text = "brand,model,year,price\nToyota,Corolla,2020,1000\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "transmission"));
    }

    #[test]
    fn fractional_year_is_null() {
        let mut failures = 0;
        assert_eq!(year_cell(Cell::Text("2019.5".into()), &mut failures), None);
        assert_eq!(failures, 1);
        assert_eq!(year_cell(Cell::Number(2021.0), &mut failures), Some(2021));
        assert_eq!(failures, 1);
    }

    #[test]
    fn nan_and_blank_cells_are_null_without_counting_as_failures() {
        let mut failures = 0;
        assert_eq!(number_cell(Cell::Text("NaN".into()), &mut failures), None);
        assert_eq!(number_cell(Cell::Text("  ".into()), &mut failures), None);
        assert_eq!(number_cell(Cell::Null, &mut failures), None);
        assert_eq!(failures, 0);
    }

    #[test]
    fn numeric_json_cells_become_text_for_categories() {
        assert_eq!(text_cell(Cell::Number(3.0)), Some("3".to_string()));
        assert_eq!(text_cell(Cell::Number(2.5)), Some("2.5".to_string()));
        assert_eq!(text_cell(Cell::Text("  ".into())), None);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("listings.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ref e) if e == "xlsx"));
    }
}
