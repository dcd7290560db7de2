//! Staged builders

use ddms_meta::builder::ComponentBuilder;
use ddms_meta::catalog::{self, ALL, DATES, LANGUAGE, SUBJECT_COVERAGE};
use ddms_meta::error::UsageError;

use crate::common::test_helpers::{SUBJECT_COVERAGE_XML, engine};

#[test]
fn test_fresh_builders_are_empty_for_every_type() {
    let engine = engine();
    let session = engine.session("5.0").unwrap();

    for schema in ALL {
        let builder = ComponentBuilder::new(schema);
        assert!(builder.is_empty(), "{} builder not empty", schema.id);
        assert!(builder.commit(&session).unwrap().is_none());
    }
}

#[test]
fn test_is_empty_is_recursive() {
    let mut builder = ComponentBuilder::new(&SUBJECT_COVERAGE);
    builder.child("keyword", 3).unwrap();
    builder.child("category", 0).unwrap().set("label", " ").unwrap();
    assert!(builder.is_empty());

    builder.child("category", 0).unwrap().set("label", "Pine").unwrap();
    assert!(!builder.is_empty());
}

#[test]
fn test_lazy_children_keep_earlier_entries() {
    let mut builder = ComponentBuilder::new(&SUBJECT_COVERAGE);
    builder.child("keyword", 0).unwrap().set("value", "first").unwrap();
    builder.child("keyword", 2).unwrap().set("value", "third").unwrap();

    let keywords = builder.children_mut("keyword").unwrap();
    assert_eq!(keywords.len(), 3);
    assert_eq!(keywords[0].value("value"), Some("first"));
    assert!(keywords[1].is_empty());
    assert_eq!(keywords[2].value("value"), Some("third"));
}

#[test]
fn test_round_trip_through_builder() {
    let engine = engine();
    let coverage = engine.read(SUBJECT_COVERAGE_XML, &SUBJECT_COVERAGE).unwrap();
    let session = engine.session_for(coverage.version().clone());

    let rebuilt = ComponentBuilder::from_component(&coverage)
        .commit(&session)
        .unwrap()
        .unwrap();
    assert_eq!(coverage, rebuilt);
}

#[test]
fn test_builder_edits_then_commits_in_session_version() {
    let engine = engine();
    let coverage = engine.read(SUBJECT_COVERAGE_XML, &SUBJECT_COVERAGE).unwrap();
    let session = engine.session_for(coverage.version().clone());

    let mut builder = ComponentBuilder::from_component(&coverage);
    builder.child("keyword", 2).unwrap().set("value", "added").unwrap();
    let edited = builder.commit(&session).unwrap().unwrap();

    assert_eq!(edited.children("keyword").len(), 3);
    assert_eq!(edited.version().token(), "3.1");
    assert_ne!(edited, coverage);
}

#[test]
fn test_commit_failure_is_located_at_the_child() {
    let engine = engine();
    let session = engine.session("5.0").unwrap();

    let mut builder = ComponentBuilder::new(&SUBJECT_COVERAGE);
    builder.child("category", 0).unwrap().set("code", "C1").unwrap();
    let error = builder.commit(&session).unwrap_err();

    assert!(error.is_validation());
    assert_eq!(error.locator(), Some("/ddms:subjectCoverage/ddms:category"));
}

#[test]
fn test_committing_twice_gives_equal_components() {
    let engine = engine();
    let session = engine.session("4.1").unwrap();

    let mut builder = ComponentBuilder::new(&DATES);
    builder.set("created", "2003").unwrap();
    builder.set("receivedOn", "2012-01-01").unwrap();

    let first = builder.commit(&session).unwrap().unwrap();
    let second = builder.commit(&session).unwrap().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_text_field_kinds() {
    let mut builder = ComponentBuilder::new(&LANGUAGE);
    assert!(matches!(
        builder.children_mut("qualifier"),
        Err(UsageError::FieldKind { .. })
    ));

    let mut person = ComponentBuilder::new(&catalog::PERSON);
    person.push("phone", "703-882-1000").unwrap();
    person.push("phone", "703-885-1000").unwrap();
    assert_eq!(person.values_mut("phone").unwrap().len(), 2);
}
