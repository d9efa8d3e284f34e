use super::model::{Dataset, Row, Value};
use super::schema::{ARTIST_LATITUDE, ARTIST_LONGITUDE, YEAR};
use crate::config::CleaningConfig;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Cleaning & filtering
// ---------------------------------------------------------------------------

/// Drop records released at or before the cutoff year or lacking a
/// geolocation, and rebase `year` to "years since cutoff".
///
/// A record is kept when:
/// * `year` is non-null and strictly greater than `cutoff_year`
/// * `artist_latitude` and `artist_longitude` are both non-null
///
/// Nulls in other columns are left alone. Fails only when one of the three
/// columns is missing from the schema.
pub fn clean_songs(dataset: &Dataset, config: &CleaningConfig) -> Result<Dataset> {
    let schema = dataset.schema();
    let year_idx = schema.require_numeric(YEAR)?;
    let lat_idx = schema.require_numeric(ARTIST_LATITUDE)?;
    let lon_idx = schema.require_numeric(ARTIST_LONGITUDE)?;
    let cutoff = config.cutoff_year;

    let rows: Vec<Row> = dataset
        .rows()
        .iter()
        .filter(|row| {
            let after_cutoff = row[year_idx].as_i64().is_some_and(|y| y > cutoff);
            after_cutoff && !row[lat_idx].is_null() && !row[lon_idx].is_null()
        })
        .map(|row| {
            let mut row = row.clone();
            if let Value::Integer(y) = row[year_idx] {
                row[year_idx] = Value::Integer(y - cutoff);
            }
            row
        })
        .collect();

    log::debug!(
        "Cleaning kept {} of {} records (cutoff year {cutoff})",
        rows.len(),
        dataset.len()
    );
    Dataset::new(schema.clone(), rows)
}
