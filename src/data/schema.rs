//! Canonical song record schema.
//!
//! The column order below is the order feature vectors are assembled in, so
//! it must not be shuffled between releases.

use super::model::{DataType, Field, Schema};

pub const ARTIST_LATITUDE: &str = "artist_latitude";
pub const ARTIST_LONGITUDE: &str = "artist_longitude";
pub const YEAR: &str = "year";
/// Continuous popularity score, present only in training data.
pub const SONG_HOTTTNESSS: &str = "song_hotttnesss";
/// Binary label derived from [`SONG_HOTTTNESSS`].
pub const LABEL: &str = "label";

const SONG_COLUMNS: &[(&str, DataType)] = &[
    ("artist_familiarity", DataType::Float),
    ("artist_hotttnesss", DataType::Float),
    ("artist_id", DataType::Text),
    (ARTIST_LATITUDE, DataType::Float),
    ("artist_location", DataType::Text),
    (ARTIST_LONGITUDE, DataType::Float),
    ("artist_name", DataType::Text),
    ("artist_terms", DataType::Text),
    ("artist_terms_freq", DataType::Text),
    ("artist_terms_weight", DataType::Text),
    ("danceability", DataType::Float),
    ("duration", DataType::Float),
    ("end_of_fade_in", DataType::Float),
    ("energy", DataType::Float),
    ("key", DataType::Integer),
    ("key_confidence", DataType::Float),
    ("loudness", DataType::Float),
    ("mode", DataType::Integer),
    ("mode_confidence", DataType::Float),
    ("release", DataType::Text),
    (SONG_HOTTTNESSS, DataType::Float),
    ("start_of_fade_out", DataType::Float),
    ("tempo", DataType::Float),
    ("time_signature", DataType::Integer),
    ("time_signature_confidence", DataType::Float),
    ("title", DataType::Text),
    (YEAR, DataType::Integer),
];

/// Schema of a raw song record. With `is_train_data == false` the popularity
/// score column is left out (inference mode).
pub fn song_schema(is_train_data: bool) -> Schema {
    Schema::new(
        SONG_COLUMNS
            .iter()
            .filter(|(name, _)| is_train_data || *name != SONG_HOTTTNESSS)
            .map(|(name, dtype)| Field::new(name, *dtype))
            .collect(),
    )
}
