//! Controlled vocabulary tests

use std::sync::Arc;

use ddms_meta::error::{ConfigError, DdmsError, UsageError};
use ddms_meta::version::VersionRegistry;
use ddms_meta::vocabulary::{
    ClassificationOrdering, ControlledVocabulary, DirectorySource, VocabularyTable, file_name,
};
use tempfile::TempDir;

use crate::common::mocks::{CountingSource, MockSource, vocabulary_document};

#[test]
fn test_literal_wins_over_patterns() {
    // The pattern would match every token, but is never consulted for literals
    let table = VocabularyTable::new("OwnerProducer", ["USA", "AUS", "GBR"], [".*"]).unwrap();

    for token in ["USA", "AUS", "GBR"] {
        assert!(table.contains(token));
    }
    assert_eq!(table.stats().literal_hits(), 3);
    assert_eq!(table.stats().pattern_evaluations(), 0);

    assert!(table.contains("FVEY"));
    assert_eq!(table.stats().pattern_evaluations(), 1);
}

#[test]
fn test_never_matching_patterns() {
    let table = VocabularyTable::new("RelTo", ["USA"], ["[0-9]{9}"]).unwrap();
    assert!(table.contains("USA"));
    assert!(!table.contains("CAN"));
    assert_eq!(table.stats().pattern_evaluations(), 1);
}

#[test]
fn test_load_from_mock_source() {
    let mut source = MockSource::new();
    source
        .expect_read()
        .withf(|location, key| location == "ism/v9" && key == "classification")
        .times(1)
        .returning(|_, _| Ok(vocabulary_document("classification", &["U", "C", "S", "TS"], &[])));

    let registry = VersionRegistry::builtin().unwrap();
    let v5 = registry.resolve("5.0").unwrap();
    let vocabulary = ControlledVocabulary::new(Arc::new(source));

    let table = vocabulary.load("classification", &v5).unwrap();
    assert_eq!(table.tokens(), &["U", "C", "S", "TS"]);

    // Second load is served from the cache
    vocabulary.load("classification", &v5).unwrap();
    assert!(vocabulary.contains("classification", "TS", &v5).unwrap());
}

#[test]
fn test_missing_and_malformed_tables_are_config_errors() {
    let mut source = MockSource::new();
    source.expect_read().returning(|location, key| match key {
        "Broken" => Ok("<CVE><Enumeration/></CVE>".to_string()),
        _ => Err(ConfigError::VocabularyNotFound {
            key: key.to_string(),
            location: location.to_string(),
        }),
    });

    let registry = VersionRegistry::builtin().unwrap();
    let v5 = registry.resolve("5.0").unwrap();
    let vocabulary = ControlledVocabulary::new(Arc::new(source));

    assert!(matches!(
        vocabulary.load("Missing", &v5),
        Err(ConfigError::VocabularyNotFound { .. })
    ));
    assert!(matches!(
        vocabulary.load("Broken", &v5),
        Err(ConfigError::VocabularyMalformed { .. })
    ));
}

#[test]
fn test_unloaded_key_is_usage_error() {
    let registry = VersionRegistry::builtin().unwrap();
    let v5 = registry.resolve("5.0").unwrap();
    let vocabulary = ControlledVocabulary::embedded();

    assert!(matches!(
        vocabulary.contains("OwnerProducer", "USA", &v5),
        Err(UsageError::UnknownVocabulary { .. })
    ));
    assert!(matches!(
        vocabulary.validate("OwnerProducer", "USA", &v5),
        Err(DdmsError::Usage(_))
    ));
}

#[test]
fn test_validate_miss_is_validation_failure() {
    let registry = VersionRegistry::builtin().unwrap();
    let v5 = registry.resolve("5.0").unwrap();
    let vocabulary = ControlledVocabulary::embedded();
    vocabulary.load("OwnerProducer", &v5).unwrap();

    assert!(vocabulary.validate("OwnerProducer", "USA", &v5).is_ok());
    let error = vocabulary.validate("OwnerProducer", "ZZZ", &v5).unwrap_err();
    assert!(error.is_validation());
    assert!(error.to_string().contains("OwnerProducer"));
}

#[test]
fn test_tables_are_versioned() {
    let registry = VersionRegistry::builtin().unwrap();
    let v2 = registry.resolve("2.0").unwrap();
    let v5 = registry.resolve("5.0").unwrap();
    let source = Arc::new(CountingSource::new());
    let vocabulary = ControlledVocabulary::new(source.clone());

    vocabulary.load("ClassificationAll", &v2).unwrap();
    vocabulary.load("ClassificationAll", &v5).unwrap();
    vocabulary.load("ClassificationAll", &v5).unwrap();
    assert_eq!(source.reads(), 2);
}

#[test]
fn test_directory_source() {
    let temp_dir = TempDir::new().unwrap();
    let location = temp_dir.path().join("ism/v9");
    std::fs::create_dir_all(&location).unwrap();
    std::fs::write(
        location.join(file_name("OwnerProducer")),
        vocabulary_document("OwnerProducer", &["XYZ"], &[]),
    )
    .unwrap();

    let registry = VersionRegistry::builtin().unwrap();
    let v5 = registry.resolve("5.0").unwrap();
    let vocabulary = ControlledVocabulary::new(Arc::new(DirectorySource::new(temp_dir.path())));

    assert!(vocabulary.check("OwnerProducer", "XYZ", &v5).unwrap());
    assert!(!vocabulary.check("OwnerProducer", "USA", &v5).unwrap());
    assert!(matches!(
        vocabulary.load("RelTo", &v5),
        Err(ConfigError::VocabularyNotFound { .. })
    ));
}

#[test]
fn test_classification_index_is_monotonic() {
    let ordering = ClassificationOrdering::default();
    let indexes: Vec<i32> = ordering
        .primary()
        .iter()
        .map(|token| ordering.index(token))
        .collect();
    assert!(indexes.windows(2).all(|pair| pair[0] < pair[1]));

    for token in ordering.primary() {
        assert_eq!(ordering.index(token), ordering.index(token));
    }
}

#[test]
fn test_review_tokens_are_unordered() {
    let vocabulary = ControlledVocabulary::embedded();
    for token in ["R", "CTS-B", "CTS-BALK"] {
        assert_eq!(vocabulary.classification_index(token), -1);
        assert!(vocabulary.needs_review(token).unwrap());
    }
    assert!(!vocabulary.needs_review("CTS").unwrap());
    assert_eq!(vocabulary.classification_index("NU"), 0);
}

#[test]
fn test_needs_review_rejects_blank() {
    let vocabulary = ControlledVocabulary::embedded();
    assert!(matches!(
        vocabulary.needs_review("  "),
        Err(UsageError::BlankArgument { .. })
    ));
    assert_eq!(vocabulary.classification_index(""), -1);
}
