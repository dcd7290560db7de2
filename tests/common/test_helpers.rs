use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use tempfile::TempDir;

use ddms_meta::component::Component;
use ddms_meta::engine::Ddms;

pub const DDMS_5: &str = "urn:us:mil:ces:metadata:ddms:5";
pub const DDMS_31: &str = "http://metadata.dod.mil/mdr/ns/DDMS/3.1/";
pub const ISM: &str = "urn:us:gov:ic:ism";

/// A keyword in DDMS 5.0
pub const KEYWORD_XML: &str =
    r#"<ddms:keyword xmlns:ddms="urn:us:mil:ces:metadata:ddms:5" ddms:value="DDMS"/>"#;

/// A 5.0 person whose optional userID element is present but empty
pub const PERSON_EMPTY_USER_ID_XML: &str = r#"<ddms:person xmlns:ddms="urn:us:mil:ces:metadata:ddms:5">
    <ddms:name>Brian</ddms:name>
    <ddms:surname>Uri</ddms:surname>
    <ddms:userID></ddms:userID>
</ddms:person>"#;

/// A 3.1 subject coverage with two keywords and a category
pub const SUBJECT_COVERAGE_XML: &str = r#"<ddms:subjectCoverage xmlns:ddms="http://metadata.dod.mil/mdr/ns/DDMS/3.1/" xmlns:ISM="urn:us:gov:ic:ism" ISM:classification="U" ISM:ownerProducer="USA">
    <ddms:keyword ddms:value="DDMS"/>
    <ddms:keyword ddms:value="metadata"/>
    <ddms:category ddms:qualifier="urn:example:categories" ddms:code="C1" ddms:label="Pine"/>
</ddms:subjectCoverage>"#;

/// A 5.0 title without any security attributes
pub const UNMARKED_TITLE_XML: &str =
    r#"<ddms:title xmlns:ddms="urn:us:mil:ces:metadata:ddms:5">Untitled</ddms:title>"#;

pub fn engine() -> Ddms {
    Ddms::new().expect("built-in configuration is valid")
}

pub fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Renders a component to markup and reads it back
pub fn reread(engine: &Ddms, component: &Component) -> Component {
    engine
        .read(&component.to_xml(), component.schema())
        .unwrap_or_else(|e| panic!("{} did not read back: {}\n{}", component.qualified_name(), e, component.to_xml()))
}

/// Writes `(relative path, content)` pairs below a fresh temporary directory
pub fn create_documents(files: &[(&str, &str)]) -> std::io::Result<(TempDir, Vec<PathBuf>)> {
    let temp_dir = TempDir::new()?;
    let mut paths = Vec::new();
    for (name, content) in files {
        let path = temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        paths.push(path);
    }
    Ok((temp_dir, paths))
}
