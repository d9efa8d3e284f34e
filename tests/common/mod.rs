use std::path::PathBuf;

use song_popularity::data::loader::load_file;
use song_popularity::Dataset;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// 1060 labelled songs; 1000 survive cleaning, 454 of those are at or above
/// the mean popularity.
pub fn training_songs() -> Dataset {
    load_file(&fixture("songs_train.csv"), true).expect("training fixture loads")
}
