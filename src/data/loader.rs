use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType as ArrowType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{DataType, Dataset, Field, Row, Schema, Value};
use super::schema::song_schema;
use crate::error::PipelineError;

const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "json", "parquet", "pq"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a song dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one column per schema field
/// * `.json`    – a single record object or `[{...}, ...]`
/// * `.csv`     – header row with schema column names
pub fn load_file(path: &Path, is_train_data: bool) -> crate::error::Result<Dataset> {
    read_file(path, &song_schema(is_train_data)).map_err(PipelineError::DataAccess)
}

/// Load every supported file directly inside `dir` (lexical order) and stack
/// them into one dataset.
pub fn load_dir(dir: &Path, is_train_data: bool) -> crate::error::Result<Dataset> {
    read_dir(dir, &song_schema(is_train_data)).map_err(PipelineError::DataAccess)
}

/// Load a file or, if `path` is a directory, every file in it.
pub fn load_path(path: &Path, is_train_data: bool) -> crate::error::Result<Dataset> {
    if path.is_dir() {
        load_dir(path, is_train_data)
    } else {
        load_file(path, is_train_data)
    }
}

/// Parse songs from an in-memory JSON payload (one object or an array).
pub fn parse_json_str(text: &str, is_train_data: bool) -> crate::error::Result<Dataset> {
    let schema = song_schema(is_train_data);
    serde_json::from_str::<JsonValue>(text)
        .context("parsing JSON")
        .and_then(|root| json_to_dataset(&root, &schema))
        .map_err(PipelineError::DataAccess)
}

fn read_file(path: &Path, schema: &Schema) -> Result<Dataset> {
    let loaded = match extension_of(path).as_str() {
        "parquet" | "pq" => load_parquet(path, schema),
        "json" => load_json(path, schema),
        "csv" => load_csv(path, schema),
        other => bail!("Unsupported file extension: .{other}"),
    };
    loaded.with_context(|| format!("loading {}", path.display()))
}

fn read_dir(dir: &Path, schema: &Schema) -> Result<Dataset> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("listing {}", dir.display()))?;
    files.retain(|p| p.is_file() && SUPPORTED_EXTENSIONS.contains(&extension_of(p).as_str()));
    files.sort();

    if files.is_empty() {
        bail!("No .csv, .json or .parquet files in {}", dir.display());
    }
    log::debug!("Loading {} files from {}", files.len(), dir.display());

    let parts = files
        .iter()
        .map(|p| read_file(p, schema))
        .collect::<Result<Vec<_>>>()?;
    Ok(Dataset::concat(parts)?)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Cell coercion shared by all formats
// ---------------------------------------------------------------------------

/// A cell as read from the source, before it is checked against the schema.
enum RawCell {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

/// Convert a raw cell to the schema type. Integral floats are accepted for
/// integer columns; anything lossy or non-finite is rejected.
fn coerce(raw: RawCell, field: &Field) -> Result<Value> {
    let value = match (raw, field.dtype) {
        (RawCell::Null, _) => Value::Null,
        (RawCell::Int(i), DataType::Integer) => Value::Integer(i),
        (RawCell::Int(i), DataType::Float) => Value::Float(i as f64),
        (RawCell::Float(f), DataType::Float) => {
            if !f.is_finite() {
                bail!("'{}': non-finite value {f}", field.name);
            }
            Value::Float(f)
        }
        (RawCell::Float(f), DataType::Integer) => {
            let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
            if !f.is_finite() || f.fract() != 0.0 || !in_range {
                bail!("'{}': {f} is not an integer", field.name);
            }
            Value::Integer(f as i64)
        }
        (RawCell::Int(i), DataType::Text) => Value::Text(i.to_string()),
        (RawCell::Float(f), DataType::Text) => Value::Text(f.to_string()),
        (RawCell::Text(s), DataType::Text) => Value::Text(s),
        (RawCell::Text(s), _) => bail!("'{}': '{s}' is not a number", field.name),
    };
    Ok(value)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON layout: either one record object or an array of them.
/// Keys missing from a record are read as null.
///
/// ```json
/// { "artist_latitude": 37.16793, "year": 1994, "title": "...", ... }
/// ```
fn load_json(path: &Path, schema: &Schema) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    json_to_dataset(&root, schema)
}

fn json_to_dataset(root: &JsonValue, schema: &Schema) -> Result<Dataset> {
    let records: &[JsonValue] = match root {
        JsonValue::Array(items) => items,
        JsonValue::Object(_) => std::slice::from_ref(root),
        _ => bail!("Expected a JSON object or an array of objects"),
    };

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let row = schema
            .fields()
            .iter()
            .map(|field| {
                let raw = json_to_raw(obj.get(&field.name), field)?;
                coerce(raw, field)
            })
            .collect::<Result<Row>>()
            .with_context(|| format!("Row {i}"))?;
        rows.push(row);
    }

    Ok(Dataset::new(schema.clone(), rows)?)
}

fn json_to_raw(val: Option<&JsonValue>, field: &Field) -> Result<RawCell> {
    let raw = match val {
        None | Some(JsonValue::Null) => RawCell::Null,
        Some(JsonValue::Number(n)) => {
            if let Some(i) = n.as_i64() {
                RawCell::Int(i)
            } else if let Some(f) = n.as_f64() {
                RawCell::Float(f)
            } else {
                bail!("'{}': unrepresentable number {n}", field.name)
            }
        }
        Some(JsonValue::String(s)) => RawCell::Text(s.clone()),
        // Arrays and objects are kept as their serialized text.
        Some(other) if field.dtype == DataType::Text => RawCell::Text(other.to_string()),
        Some(other) => bail!("'{}': expected a number, got {other}", field.name),
    };
    Ok(raw)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names. Columns are matched to the
/// schema by name; extra columns are ignored. Empty cells are nulls.
fn load_csv(path: &Path, schema: &Schema) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let positions = schema
        .fields()
        .iter()
        .map(|field| {
            headers
                .iter()
                .position(|h| *h == field.name)
                .with_context(|| format!("CSV missing '{}' column", field.name))
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let row = schema
            .fields()
            .iter()
            .zip(&positions)
            .map(|(field, &pos)| {
                coerce(parse_csv_cell(record.get(pos).unwrap_or(""), field), field)
            })
            .collect::<Result<Row>>()
            .with_context(|| format!("CSV row {row_no}"))?;
        rows.push(row);
    }

    Ok(Dataset::new(schema.clone(), rows)?)
}

fn parse_csv_cell(s: &str, field: &Field) -> RawCell {
    if s.is_empty() {
        return RawCell::Null;
    }
    if field.dtype == DataType::Text {
        return RawCell::Text(s.to_string());
    }
    let t = s.trim();
    if let Ok(i) = t.parse::<i64>() {
        return RawCell::Int(i);
    }
    if let Ok(f) = t.parse::<f64>() {
        return RawCell::Float(f);
    }
    RawCell::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one column per schema field. Integer columns
/// may be stored as Int32/Int64, float columns as Float32/Float64 (or
/// integers), text columns as Utf8/LargeUtf8.
fn load_parquet(path: &Path, schema: &Schema) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let batch_schema = batch.schema();

        let columns = schema
            .fields()
            .iter()
            .map(|field| {
                batch_schema
                    .index_of(&field.name)
                    .map(|idx| batch.column(idx).clone())
                    .map_err(|_| anyhow::anyhow!("Parquet file missing '{}' column", field.name))
            })
            .collect::<Result<Vec<ArrayRef>>>()?;

        for row in 0..batch.num_rows() {
            let values = schema
                .fields()
                .iter()
                .zip(&columns)
                .map(|(field, col)| coerce(arrow_cell(col, row)?, field))
                .collect::<Result<Row>>()
                .with_context(|| format!("Row {}", rows.len()))?;
            rows.push(values);
        }
    }

    Ok(Dataset::new(schema.clone(), rows)?)
}

// -- Parquet / Arrow helpers --

fn downcast<'a, T: 'static>(col: &'a ArrayRef) -> Result<&'a T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> Result<RawCell> {
    if col.is_null(row) {
        return Ok(RawCell::Null);
    }
    let raw = match col.data_type() {
        ArrowType::Int32 => RawCell::Int(downcast::<Int32Array>(col)?.value(row) as i64),
        ArrowType::Int64 => RawCell::Int(downcast::<Int64Array>(col)?.value(row)),
        ArrowType::Float32 => RawCell::Float(downcast::<Float32Array>(col)?.value(row) as f64),
        ArrowType::Float64 => RawCell::Float(downcast::<Float64Array>(col)?.value(row)),
        ArrowType::Utf8 => RawCell::Text(col.as_string::<i32>().value(row).to_string()),
        ArrowType::LargeUtf8 => RawCell::Text(col.as_string::<i64>().value(row).to_string()),
        other => bail!("Unsupported parquet column type {other:?}"),
    };
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::StringArray;
    use arrow::datatypes::{Field as ArrowField, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::schema::{ARTIST_LATITUDE, SONG_HOTTTNESSS, YEAR};

    fn csv_header(schema: &Schema) -> String {
        schema.names().collect::<Vec<_>>().join(",")
    }

    fn csv_line(schema: &Schema, overrides: &[(&str, &str)]) -> String {
        schema
            .fields()
            .iter()
            .map(|f| {
                if let Some((_, v)) = overrides.iter().find(|(n, _)| *n == f.name) {
                    return v.to_string();
                }
                match f.dtype {
                    DataType::Integer => "1".to_string(),
                    DataType::Float => "0.5".to_string(),
                    DataType::Text => "x".to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn csv_empty_cells_become_nulls() {
        let schema = song_schema(true);
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{}", csv_header(&schema)).unwrap();
        writeln!(file, "{}", csv_line(&schema, &[(ARTIST_LATITUDE, "")])).unwrap();
        writeln!(file, "{}", csv_line(&schema, &[(YEAR, "1994.0")])).unwrap();
        file.flush().unwrap();

        let ds = load_file(file.path(), true).unwrap();
        assert_eq!(ds.len(), 2);
        let lats: Vec<_> = ds.column(ARTIST_LATITUDE).unwrap().cloned().collect();
        assert_eq!(lats, vec![Value::Null, Value::Float(0.5)]);
        let years: Vec<_> = ds.column(YEAR).unwrap().cloned().collect();
        assert_eq!(years[1], Value::Integer(1994));
    }

    #[test]
    fn csv_rejects_text_in_numeric_column() {
        let schema = song_schema(true);
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{}", csv_header(&schema)).unwrap();
        writeln!(file, "{}", csv_line(&schema, &[("tempo", "fast")])).unwrap();
        file.flush().unwrap();

        let err = load_file(file.path(), true).unwrap_err();
        assert!(matches!(err, PipelineError::DataAccess(_)));
        assert!(err.to_string().contains("tempo"));
    }

    #[test]
    fn csv_missing_column_is_a_data_access_error() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "title,year").unwrap();
        writeln!(file, "a,1999").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            load_file(file.path(), false),
            Err(PipelineError::DataAccess(_))
        ));
    }

    #[test]
    fn inference_csv_ignores_score_column() {
        let train = song_schema(true);
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{}", csv_header(&train)).unwrap();
        writeln!(file, "{}", csv_line(&train, &[])).unwrap();
        file.flush().unwrap();

        let ds = load_file(file.path(), false).unwrap();
        assert!(ds.schema().index_of(SONG_HOTTTNESSS).is_none());
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn json_array_and_missing_keys() {
        let ds =
            parse_json_str(r#"[{"year": 2001, "title": "a"}, {"tempo": 99.5}]"#, true).unwrap();
        assert_eq!(ds.len(), 2);
        let tempos: Vec<_> = ds.column("tempo").unwrap().cloned().collect();
        assert_eq!(tempos, vec![Value::Null, Value::Float(99.5)]);
    }

    #[test]
    fn json_array_terms_are_kept_as_text() {
        let ds = parse_json_str(r#"{"artist_terms": ["rock", "pop"]}"#, false).unwrap();
        let terms: Vec<_> = ds.column("artist_terms").unwrap().cloned().collect();
        assert_eq!(terms, vec![Value::Text(r#"["rock","pop"]"#.to_string())]);
    }

    #[test]
    fn integral_floats_fit_integer_columns_only_within_range() {
        let ds = parse_json_str(r#"{"year": 1994.0}"#, false).unwrap();
        let years: Vec<_> = ds.column(YEAR).unwrap().cloned().collect();
        assert_eq!(years, vec![Value::Integer(1994)]);

        let ds = parse_json_str(r#"{"year": -9223372036854775808.0}"#, false).unwrap();
        let years: Vec<_> = ds.column(YEAR).unwrap().cloned().collect();
        assert_eq!(years, vec![Value::Integer(i64::MIN)]);

        for year in ["9223372036854775808.0", "1e19", "-1e19", "1994.5"] {
            assert!(matches!(
                parse_json_str(&format!(r#"{{"year": {year}}}"#), false),
                Err(PipelineError::DataAccess(_))
            ));
        }
    }

    #[test]
    fn json_scalar_root_is_rejected() {
        assert!(matches!(
            parse_json_str("42", false),
            Err(PipelineError::DataAccess(_))
        ));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        assert!(matches!(
            load_file(file.path(), true),
            Err(PipelineError::DataAccess(_))
        ));
    }

    #[test]
    fn directory_loader_concatenates_in_name_order() {
        let schema = song_schema(false);
        let dir = tempfile::tempdir().unwrap();
        for (name, year) in [("b.csv", "2002"), ("a.csv", "2001")] {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            writeln!(f, "{}", csv_header(&schema)).unwrap();
            writeln!(f, "{}", csv_line(&schema, &[(YEAR, year)])).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let ds = load_dir(dir.path(), false).unwrap();
        let years: Vec<_> = ds.column(YEAR).unwrap().cloned().collect();
        assert_eq!(years, vec![Value::Integer(2001), Value::Integer(2002)]);
    }

    #[test]
    fn parquet_columns_are_coerced_to_schema() {
        let schema = song_schema(false);
        let arrow_fields: Vec<ArrowField> = schema
            .fields()
            .iter()
            .map(|f| {
                let ty = match f.dtype {
                    DataType::Integer => ArrowType::Int32,
                    DataType::Float => ArrowType::Float64,
                    DataType::Text => ArrowType::Utf8,
                };
                ArrowField::new(&f.name, ty, true)
            })
            .collect();
        let arrow_schema = Arc::new(ArrowSchema::new(arrow_fields));
        let columns: Vec<ArrayRef> = schema
            .fields()
            .iter()
            .map(|f| -> ArrayRef {
                match f.dtype {
                    DataType::Integer => Arc::new(Int32Array::from(vec![Some(1994), None])),
                    DataType::Float => Arc::new(Float64Array::from(vec![Some(37.16793), None])),
                    DataType::Text => Arc::new(StringArray::from(vec![Some("t"), None])),
                }
            })
            .collect();
        let batch = RecordBatch::try_new(arrow_schema.clone(), columns).unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), arrow_schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path(), false).unwrap();
        assert_eq!(ds.len(), 2);
        let lats: Vec<_> = ds.column(ARTIST_LATITUDE).unwrap().cloned().collect();
        assert_eq!(lats, vec![Value::Float(37.16793), Value::Null]);
        let years: Vec<_> = ds.column(YEAR).unwrap().cloned().collect();
        assert_eq!(years, vec![Value::Integer(1994), Value::Null]);
    }
}
