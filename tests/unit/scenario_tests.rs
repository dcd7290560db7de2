//! The worked scenarios

use std::sync::Arc;

use ddms_meta::catalog::{KEYWORD, PERSON, TITLE};
use ddms_meta::component::RawFields;
use ddms_meta::extensible::ExtensibleAttributes;
use ddms_meta::security::SecurityAttributes;
use ddms_meta::version::VersionRegistry;
use ddms_meta::vocabulary::{ClassificationOrdering, ControlledVocabulary};
use ddms_meta::xml::Attribute;

use crate::common::mocks::{MockSource, vocabulary_document};
use crate::common::test_helpers::{ISM, PERSON_EMPTY_USER_ID_XML, engine};

#[test]
fn test_scenario_a_classification_index() {
    let engine = engine();
    let vocabulary = engine.vocabulary();

    assert_eq!(vocabulary.classification_index("S"), 2);
    assert_eq!(vocabulary.classification_index("Q"), -1);
    assert_eq!(vocabulary.classification_index("CTS"), 7);
    assert_eq!(vocabulary.classification_index("CTS-B"), -1);
}

#[test]
fn test_scenario_a_ordering_from_loaded_table() {
    let mut source = MockSource::new();
    source
        .expect_read()
        .returning(|_, key| Ok(vocabulary_document(key, &["U", "C", "S", "TS"], &[])));

    let registry = VersionRegistry::builtin().unwrap();
    let v5 = registry.resolve("5.0").unwrap();
    let table = ControlledVocabulary::new(Arc::new(source))
        .load("classification", &v5)
        .unwrap();

    let ordering =
        ClassificationOrdering::new(table.tokens().to_vec(), Vec::<String>::new(), Vec::<String>::new())
            .unwrap();
    let engine = engine().with_vocabulary(ControlledVocabulary::embedded().with_ordering(ordering));

    assert_eq!(engine.vocabulary().classification_index("S"), 2);
    assert_eq!(engine.vocabulary().classification_index("CTS"), -1);
    assert!(engine.vocabulary().ordering().secondary().is_empty());
}

#[test]
fn test_scenario_b_required_field_only() {
    let engine = engine();
    let session = engine.session("5.0").unwrap();

    let keyword = session
        .build(&KEYWORD, RawFields::new().text("value", "x"))
        .unwrap();
    assert_eq!(keyword.value("value"), Some("x"));
    assert!(keyword.warnings().is_empty());

    let security = SecurityAttributes::new(session.version(), "U", &["USA"]);
    let title = session
        .build(&TITLE, RawFields::new().text("value", "x").security(security))
        .unwrap();
    assert!(title.warnings().is_empty());
}

#[test]
fn test_scenario_c_empty_optional_child() {
    let engine = engine();
    let person = engine.read(PERSON_EMPTY_USER_ID_XML, &PERSON).unwrap();

    assert_eq!(person.warnings().len(), 1);
    let warning = &person.warnings()[0];
    assert!(warning.severity.is_warning());
    assert_eq!(warning.locator, "/ddms:person");
    assert_eq!(warning.text, "A ddms:userID element was found with no value.");
}

#[test]
fn test_scenario_d_collision_on_write_fails() {
    let engine = engine();
    let session = engine.session("5.0").unwrap();

    let extensible = ExtensibleAttributes::new(
        session.version(),
        vec![Attribute::new("ISM", "resourceElement", ISM, "true")],
    );
    let error = session
        .build(&KEYWORD, RawFields::new().text("value", "x").extensible(extensible))
        .unwrap_err();

    assert!(error.is_validation());
    assert!(error.to_string().contains("ISM:resourceElement"));
    assert_eq!(error.locator(), Some("/ddms:keyword"));
}

#[test]
fn test_scenario_d_collision_on_read_is_dropped() {
    let engine = engine();
    let xml = r#"<ddms:keyword xmlns:ddms="urn:us:mil:ces:metadata:ddms:5" xmlns:ISM="urn:us:gov:ic:ism" xmlns:ext="urn:example:ext" ddms:value="x" ISM:resourceElement="true" ISM:classification="U" ext:relevance="95"/>"#;

    let keyword = engine.read(xml, &KEYWORD).unwrap();
    assert!(keyword.warnings().is_empty());
    assert!(keyword.security_attributes().is_empty());

    let names: Vec<String> = keyword
        .extensible_attributes()
        .attributes()
        .iter()
        .map(Attribute::qualified_name)
        .collect();
    assert_eq!(names, vec!["ext:relevance".to_string()]);
}
