//! Output projections are stable and independent of how a component was built

use ddms_meta::catalog::{CATEGORY, KEYWORD, LANGUAGE, PERSON, SUBJECT_COVERAGE};
use ddms_meta::component::RawFields;
use ddms_meta::config::OutputConfig;
use ddms_meta::render::{OutputFormat, Renderer};
use ddms_meta::security::SecurityAttributes;
use serde_json::json;

use crate::common::test_helpers::{DDMS_5, SUBJECT_COVERAGE_XML, engine};

#[test]
fn test_tree_and_raw_render_identically() {
    let engine = engine();
    let read = engine.read(SUBJECT_COVERAGE_XML, &SUBJECT_COVERAGE).unwrap();

    let session = engine.session("3.1").unwrap();
    let keyword = |value: &str| {
        session
            .build(&KEYWORD, RawFields::new().text("value", value))
            .unwrap()
    };
    let category = session
        .build(
            &CATEGORY,
            RawFields::new()
                .text("qualifier", "urn:example:categories")
                .text("code", "C1")
                .text("label", "Pine"),
        )
        .unwrap();
    let built = session
        .build(
            &SUBJECT_COVERAGE,
            RawFields::new()
                .children("keyword", vec![keyword("DDMS"), keyword("metadata")])
                .child("category", category)
                .security(SecurityAttributes::new(session.version(), "U", &["USA"])),
        )
        .unwrap();

    assert_eq!(read, built);
    let renderer = engine.renderer();
    for format in [OutputFormat::Xml, OutputFormat::Text, OutputFormat::Html, OutputFormat::Json] {
        assert_eq!(renderer.render(&read, format), renderer.render(&built, format));
    }
}

#[test]
fn test_field_order_follows_declaration_not_markup() {
    let engine = engine();
    let xml = format!(
        r#"<ddms:person xmlns:ddms="{}"><ddms:surname>Uri</ddms:surname><ddms:name>Brian</ddms:name></ddms:person>"#,
        DDMS_5
    );
    let person = engine.read(&xml, &PERSON).unwrap();

    let renderer = Renderer::default();
    assert_eq!(renderer.to_text(&person, ""), "person.name: Brian\nperson.surname: Uri\n");
    assert!(person.to_xml().find("ddms:name").unwrap() < person.to_xml().find("ddms:surname").unwrap());

    let language = engine
        .read(
            &format!(
                r#"<ddms:language xmlns:ddms="{}" ddms:value="en" ddms:qualifier="ISO-639"/>"#,
                DDMS_5
            ),
            &LANGUAGE,
        )
        .unwrap();
    assert_eq!(
        renderer.to_json(&language),
        r#"{"qualifier":"ISO-639","value":"en"}"#
    );
}

#[test]
fn test_rendering_twice_is_identical() {
    let engine = engine();
    let coverage = engine.read(SUBJECT_COVERAGE_XML, &SUBJECT_COVERAGE).unwrap();

    for index_level in 0..=2 {
        let renderer = Renderer::new(OutputConfig {
            index_level,
            ..OutputConfig::default()
        });
        assert_eq!(
            renderer.to_text(&coverage, "resource"),
            renderer.to_text(&coverage, "resource")
        );
        assert_eq!(renderer.to_json(&coverage), renderer.to_json(&coverage));
    }
}

#[test]
fn test_repeated_children_in_json() {
    let engine = engine();
    let coverage = engine.read(SUBJECT_COVERAGE_XML, &SUBJECT_COVERAGE).unwrap();

    let value = Renderer::default().to_json_value(&coverage);
    assert_eq!(value["keyword"], json!([{"value": "DDMS"}, {"value": "metadata"}]));
    assert_eq!(value["category"][0]["label"], json!("Pine"));
    assert_eq!(value["securityAttributes"]["ownerProducer"], json!(["USA"]));
}

#[test]
fn test_text_lines_with_indexes() {
    let engine = engine();
    let coverage = engine.read(SUBJECT_COVERAGE_XML, &SUBJECT_COVERAGE).unwrap();

    let renderer = Renderer::new(OutputConfig {
        index_level: 1,
        ..OutputConfig::default()
    });
    let text = renderer.to_text(&coverage, "");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "subjectCoverage.keyword[1]: DDMS");
    assert_eq!(lines[1], "subjectCoverage.keyword[2]: metadata");
    assert!(lines.contains(&"subjectCoverage.classification: U"));
    assert!(lines.contains(&"subjectCoverage.ownerProducer: USA"));
}
