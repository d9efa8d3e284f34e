use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType as ArrowType, Field as ArrowField, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use song_popularity::data::model::{DataType, Dataset, Field, Row, Value};
use song_popularity::data::schema::{
    song_schema, ARTIST_LATITUDE, ARTIST_LONGITUDE, SONG_HOTTTNESSS, YEAR,
};

/// Write a synthetic song dataset for trying out the pipeline.
#[derive(Parser)]
struct Args {
    /// Output file, .csv or .parquet
    output: PathBuf,
    #[arg(long, default_value_t = 2000)]
    rows: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const TERMS: &[&str] = &["rock", "pop", "hip hop", "jazz", "blues", "electronic", "folk", "soul"];
const PLACES: &[(&str, f64, f64)] = &[
    ("Chicago, IL", 41.88415, -87.63241),
    ("London, England", 51.50632, -0.12714),
    ("Nashville, TN", 36.16778, -86.77836),
    ("Kingston, Jamaica", 17.99702, -76.79358),
    ("Berlin, Germany", 52.51607, 13.37698),
];

/// Box-Muller transform for normal distribution
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn term_list(rng: &mut StdRng) -> String {
    let picked: Vec<String> = TERMS
        .choose_multiple(rng, 3)
        .map(|t| format!("'{t}'"))
        .collect();
    format!("[{}]", picked.join(", "))
}

/// One song. Popularity follows the artist's hotness plus noise; a few rows
/// are old or unlocated so cleaning has something to drop.
fn generate_song(rng: &mut StdRng, fields: &[Field], index: usize) -> Row {
    let (location, lat, lon) = PLACES[rng.gen_range(0..PLACES.len())];
    let artist_hot = rng.gen_range(0.1..0.9);
    let popularity = (0.6 * artist_hot + gauss(rng, 0.15, 0.12)).clamp(0.0, 1.0);
    let duration = gauss(rng, 240.0, 60.0).max(30.0);
    let year = if rng.gen_bool(0.05) { 0 } else { rng.gen_range(1900..2011) };
    let located = !rng.gen_bool(0.04);

    fields
        .iter()
        .map(|field| match field.name.as_str() {
            "artist_familiarity" => {
                Value::Float((artist_hot + gauss(rng, 0.1, 0.1)).clamp(0.0, 1.0))
            }
            "artist_hotttnesss" => Value::Float(artist_hot),
            "artist_id" => Value::Text(format!("AR{:016X}", rng.gen::<u64>())),
            ARTIST_LATITUDE if located => Value::Float(lat + gauss(rng, 0.0, 0.05)),
            ARTIST_LONGITUDE if located => Value::Float(lon + gauss(rng, 0.0, 0.05)),
            ARTIST_LATITUDE | ARTIST_LONGITUDE => Value::Null,
            "artist_location" => Value::Text(location.to_string()),
            "artist_name" => Value::Text(format!("Artist {}", rng.gen_range(1..500))),
            "artist_terms" => Value::Text(term_list(rng)),
            "artist_terms_freq" | "artist_terms_weight" => {
                let weights: Vec<String> =
                    (0..3).map(|_| format!("{:.4}", rng.gen::<f64>())).collect();
                Value::Text(format!("[{}]", weights.join(", ")))
            }
            "duration" => Value::Float(duration),
            "start_of_fade_out" => Value::Float(duration - gauss(rng, 8.0, 3.0).abs()),
            "end_of_fade_in" => Value::Float(gauss(rng, 0.8, 0.6).abs()),
            "key" => Value::Integer(rng.gen_range(0..12)),
            "mode" => Value::Integer(rng.gen_range(0..2)),
            "time_signature" => Value::Integer(*[3, 4, 4, 4, 5].choose(rng).unwrap_or(&4)),
            "loudness" => Value::Float(gauss(rng, -10.0, 4.0)),
            "tempo" => Value::Float(gauss(rng, 120.0, 25.0)),
            SONG_HOTTTNESSS => Value::Float(popularity),
            YEAR => Value::Integer(year),
            "title" => Value::Text(format!("Song {index}")),
            "release" => Value::Text(format!("Release {}", rng.gen_range(1..1000))),
            _ => match field.dtype {
                DataType::Float => Value::Float(rng.gen()),
                DataType::Integer => Value::Integer(rng.gen_range(0..10)),
                DataType::Text => Value::Text(String::new()),
            },
        })
        .collect()
}

fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(dataset.schema().names())?;
    for row in dataset.rows() {
        writer.write_record(row.iter().map(|v| match v {
            Value::Null => String::new(),
            other => other.to_string(),
        }))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(dataset: &Dataset, path: &Path) -> Result<()> {
    let fields = dataset.schema().fields();
    let arrow_schema = Arc::new(ArrowSchema::new(
        fields
            .iter()
            .map(|f| {
                let ty = match f.dtype {
                    DataType::Integer => ArrowType::Int64,
                    DataType::Float => ArrowType::Float64,
                    DataType::Text => ArrowType::Utf8,
                };
                ArrowField::new(&f.name, ty, true)
            })
            .collect::<Vec<_>>(),
    ));

    let columns: Vec<ArrayRef> = fields
        .iter()
        .enumerate()
        .map(|(idx, f)| -> ArrayRef {
            let cells = dataset.rows().iter().map(|row| &row[idx]);
            match f.dtype {
                DataType::Integer => Arc::new(cells.map(Value::as_i64).collect::<Int64Array>()),
                DataType::Float => Arc::new(cells.map(Value::as_f64).collect::<Float64Array>()),
                DataType::Text => Arc::new(
                    cells
                        .map(|v| match v {
                            Value::Text(s) => Some(s.as_str()),
                            _ => None,
                        })
                        .collect::<StringArray>(),
                ),
            }
        })
        .collect();

    let batch =
        RecordBatch::try_new(arrow_schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer =
        ArrowWriter::try_new(file, arrow_schema, None).context("creating parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let schema = song_schema(true);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let rows = (0..args.rows)
        .map(|i| generate_song(&mut rng, schema.fields(), i))
        .collect();
    let dataset = Dataset::new(schema, rows)?;

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => write_csv(&dataset, &args.output)?,
        "parquet" | "pq" => write_parquet(&dataset, &args.output)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    println!("Wrote {} songs to {}", dataset.len(), args.output.display());
    Ok(())
}
