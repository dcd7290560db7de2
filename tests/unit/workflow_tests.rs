//! Discovery, batch processing and reporting end to end

use std::sync::Arc;

use ddms_meta::cli::VerbosityLevel;
use ddms_meta::file_discovery::FileDiscovery;
use ddms_meta::output::Output;
use ddms_meta::processor::{DocumentProcessor, DocumentStatus};
use ddms_meta::render::OutputFormat;

use crate::common::test_helpers::{
    KEYWORD_XML, PERSON_EMPTY_USER_ID_XML, SUBJECT_COVERAGE_XML, UNMARKED_TITLE_XML,
    create_documents, engine,
};

const BATCH: &[(&str, &str)] = &[
    ("a/keyword.xml", KEYWORD_XML),
    ("a/person.xml", PERSON_EMPTY_USER_ID_XML),
    ("b/nested/coverage.XML", SUBJECT_COVERAGE_XML),
    ("b/title.xml", UNMARKED_TITLE_XML),
    ("b/truncated.xml", "<ddms:keyword xmlns:ddms=\"urn:us:mil:ces:metadata:ddms:5\""),
    ("notes.txt", "not a document"),
];

#[test]
fn test_discovery_filters_and_sorts() {
    let (temp_dir, _) = create_documents(BATCH).unwrap();

    let files = FileDiscovery::new().discover_files(temp_dir.path()).unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|path| path.strip_prefix(temp_dir.path()).unwrap().display().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "a/keyword.xml",
            "a/person.xml",
            "b/nested/coverage.XML",
            "b/title.xml",
            "b/truncated.xml",
        ]
    );

    let shallow = FileDiscovery::new()
        .with_max_depth(Some(1))
        .discover_files(temp_dir.path())
        .unwrap();
    assert_eq!(shallow.len(), 4);
}

#[test]
fn test_batch_statuses() {
    let (temp_dir, _) = create_documents(BATCH).unwrap();
    let files = FileDiscovery::new().discover_files(temp_dir.path()).unwrap();

    let processor = DocumentProcessor::new(Arc::new(engine()), OutputFormat::Text).with_threads(2);
    let results = processor.process_files(&files).unwrap();

    assert_eq!(results.total_files, 5);
    assert_eq!(results.valid_files, 2);
    assert_eq!(results.warned_files, 1);
    assert_eq!(results.invalid_files, 1);
    assert_eq!(results.error_files, 1);
    assert!(results.has_errors());
    assert!((results.success_rate() - 60.0).abs() < 1e-9);

    let paths: Vec<_> = results.reports.iter().map(|report| report.path.clone()).collect();
    assert_eq!(paths, files);

    let coverage = &results.reports[2];
    assert_eq!(coverage.status, DocumentStatus::Valid);
    assert_eq!(coverage.version.as_deref(), Some("3.1"));

    let title = &results.reports[3];
    match &title.status {
        DocumentStatus::Invalid { failure } => assert_eq!(failure.locator, "/ddms:title"),
        other => panic!("expected an invalid title, got {:?}", other),
    }
    assert!(results.reports[4].status.is_error());
}

#[test]
fn test_missing_file_is_reported_not_fatal() {
    let (temp_dir, mut files) = create_documents(&[("keyword.xml", KEYWORD_XML)]).unwrap();
    files.push(temp_dir.path().join("gone.xml"));

    let processor = DocumentProcessor::new(Arc::new(engine()), OutputFormat::Xml).with_threads(1);
    let results = processor.process_files(&files).unwrap();

    assert_eq!(results.valid_files, 1);
    assert_eq!(results.error_files, 1);
    assert_eq!(
        results.reports[0].rendered.as_deref(),
        Some(r#"<ddms:keyword xmlns:ddms="urn:us:mil:ces:metadata:ddms:5" ddms:value="DDMS" />"#)
    );
}

#[test]
fn test_report_output() {
    let (temp_dir, _) = create_documents(BATCH).unwrap();
    let files = FileDiscovery::new().discover_files(temp_dir.path()).unwrap();
    let processor = DocumentProcessor::new(Arc::new(engine()), OutputFormat::Text);
    let results = processor.process_files(&files).unwrap();

    let normal = Output::new(VerbosityLevel::Normal)
        .with_colors(false)
        .format_results(&results);
    assert!(normal.contains("✓ VALID"));
    assert!(normal.contains("! WARNED"));
    assert!(normal.contains("keyword: DDMS"));
    assert!(normal.contains("Total files: 5"));
    assert!(normal.contains("Success rate: 60.0%"));

    let quiet = Output::new(VerbosityLevel::Quiet)
        .with_colors(false)
        .format_results(&results);
    assert!(!quiet.contains("✓ VALID"));
    assert!(quiet.contains("✗ INVALID"));
    assert!(quiet.contains("Invalid: 1 Errors: 1"));
}
