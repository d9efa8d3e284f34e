/// Data layer: schema, loading, and cleaning.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet / folder
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + coerce to song_schema → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Schema + Vec<Row>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  year cutoff + geolocation → cleaned Dataset
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
