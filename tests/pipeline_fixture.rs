mod common;

use song_popularity::data::filter::clean_songs;
use song_popularity::data::schema::{
    ARTIST_LATITUDE, ARTIST_LONGITUDE, LABEL, SONG_HOTTTNESSS, YEAR,
};
use song_popularity::features::VectorAssembler;
use song_popularity::label::derive_labels;
use song_popularity::pipeline::{prepare, run_training};
use song_popularity::split::train_test_split;
use song_popularity::train::{train_model, train_model_named};
use song_popularity::{ModelKind, PipelineConfig, Value};

#[test]
fn cleaning_keeps_only_recent_located_songs() {
    let raw = common::training_songs();
    assert_eq!(raw.len(), 1060);

    let cleaned = clean_songs(&raw, &PipelineConfig::default().cleaning).unwrap();
    assert_eq!(cleaned.len(), 1000);
    for value in cleaned.column(YEAR).unwrap() {
        assert!(value.as_i64().unwrap() > 0);
    }
    for column in [ARTIST_LATITUDE, ARTIST_LONGITUDE] {
        assert!(cleaned.column(column).unwrap().all(|v| !v.is_null()));
    }
}

#[test]
fn labelling_marks_454_popular_songs() {
    let config = PipelineConfig::default();
    let cleaned = clean_songs(&common::training_songs(), &config.cleaning).unwrap();
    let labelled = derive_labels(&cleaned).unwrap();

    let positives = labelled
        .column(LABEL)
        .unwrap()
        .filter(|v| **v == Value::Integer(1))
        .count();
    assert_eq!(positives, 454);
}

#[test]
fn feature_vector_has_eighteen_dimensions() {
    let prepared = prepare(&common::training_songs(), true, &PipelineConfig::default()).unwrap();
    assert_eq!(prepared.features.n_features(), 18);
    assert_eq!(prepared.features.n_rows(), 1000);
    assert_eq!(prepared.positive_count(), Some(454));

    let columns = prepared.features.columns();
    assert!(!columns.iter().any(|c| c == SONG_HOTTTNESSS || c == LABEL));
    assert_eq!(columns.first().map(String::as_str), Some("artist_familiarity"));
    assert_eq!(columns.last().map(String::as_str), Some(YEAR));
    assert_eq!(
        columns,
        VectorAssembler::for_schema(prepared.records.schema()).input_columns()
    );
}

#[test]
fn both_families_train_and_evaluate_in_range() {
    let config = PipelineConfig::default();
    let prepared = prepare(&common::training_songs(), true, &config).unwrap();

    for kind in ModelKind::ALL {
        let outcome = train_model(&prepared.features, kind, true, &config).unwrap();
        let eval = outcome.evaluation.expect("evaluation requested");
        for auc in [eval.train_auc, eval.test_auc] {
            assert!(auc > 0.0 && auc < 1.0, "{kind}: auc {auc}");
        }
        assert!(eval.train_auc > 0.5, "{kind}: train auc {}", eval.train_auc);
        assert_eq!(outcome.split.train.len(), 800);
        assert_eq!(outcome.split.test.len(), 200);
    }
}

#[test]
fn training_runs_are_reproducible() {
    let config = PipelineConfig::default();
    let raw = common::training_songs();

    let (_, first) = run_training(&raw, ModelKind::RandomForest, true, &config).unwrap();
    let (_, second) = run_training(&raw, ModelKind::RandomForest, true, &config).unwrap();
    assert_eq!(first.split, second.split);
    assert_eq!(first.evaluation, second.evaluation);
    assert_eq!(first.split, train_test_split(1000, &config.split));
}

#[test]
fn selector_names_from_the_cli_are_honoured() {
    let config = PipelineConfig::default();
    let prepared = prepare(&common::training_songs(), true, &config).unwrap();
    let outcome = train_model_named(
        &prepared.features,
        "Random Forest classifier",
        false,
        &config,
    )
    .unwrap();
    assert_eq!(outcome.model.kind(), ModelKind::RandomForest);
    assert_eq!(outcome.model.feature_columns(), prepared.features.columns());
    assert!(outcome.evaluation.is_none());
}
