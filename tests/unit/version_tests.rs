//! Version registry tests

use ddms_meta::config::{PrefixConfig, RegistryConfig, VersionEntry};
use ddms_meta::error::ConfigError;
use ddms_meta::version::{Subsystem, VersionRegistry};

use crate::common::test_helpers::{DDMS_31, DDMS_5};

#[test]
fn test_resolve_is_stable_for_every_version() {
    let registry = VersionRegistry::builtin().unwrap();
    for token in registry.supported_versions() {
        let first = registry.resolve(token).unwrap();
        let second = registry.resolve(token).unwrap();
        assert_eq!(first.namespace(), second.namespace());
        assert_eq!(first.token(), token);
    }
}

#[test]
fn test_aliases_resolve_to_their_target() {
    let registry = VersionRegistry::builtin().unwrap();
    let aliases: Vec<(String, String)> = registry
        .aliases()
        .map(|(alias, target)| (alias.to_string(), target.to_string()))
        .collect();
    assert!(!aliases.is_empty());

    for (alias, target) in aliases {
        assert_eq!(registry.resolve(&alias).unwrap(), registry.resolve(&target).unwrap());
    }
}

#[test]
fn test_unsupported_version() {
    let registry = VersionRegistry::builtin().unwrap();
    let error = registry.resolve("1.0").unwrap_err();
    assert!(matches!(error, ConfigError::UnsupportedVersion { ref token } if token == "1.0"));
    assert!(!registry.is_supported("1.0"));
}

#[test]
fn test_shared_namespace_resolves_to_latest() {
    let registry = VersionRegistry::builtin().unwrap();
    assert_eq!(
        registry.resolve_for_namespace("urn:us:mil:ces:metadata:ddms:4").unwrap().token(),
        "4.1"
    );
    assert_eq!(registry.resolve_for_namespace(DDMS_5).unwrap().token(), "5.0");
    assert_eq!(registry.resolve_for_namespace(DDMS_31).unwrap().token(), "3.1");
    assert!(matches!(
        registry.resolve_for_namespace("urn:example:none"),
        Err(ConfigError::UnsupportedNamespace { .. })
    ));
}

#[test]
fn test_ambient_version_round_trip() {
    let registry = VersionRegistry::builtin().unwrap();
    assert_eq!(registry.current().token(), "5.0");

    registry.set_current("3.0.1").unwrap();
    assert_eq!(registry.current().token(), "3.0");

    assert!(registry.set_current("9.9").is_err());
    assert_eq!(registry.current().token(), "3.0");

    registry.clear_current();
    assert_eq!(registry.current().token(), "5.0");
}

#[test]
fn test_auxiliary_namespaces_by_version() {
    let registry = VersionRegistry::builtin().unwrap();
    let v2 = registry.resolve("2.0").unwrap();
    let v5 = registry.resolve("5.0").unwrap();

    assert_eq!(v2.namespace_for(Subsystem::Classification), Some("urn:us:gov:ic:ism:v2"));
    assert_eq!(v5.namespace_for(Subsystem::Classification), Some("urn:us:gov:ic:ism"));
    assert!(v2.namespace_for(Subsystem::Access).is_none());
    assert!(v5.namespace_for(Subsystem::Virtual).is_some());
    assert!(v5.is_at_least("4.1"));
    assert!(v2.is_before("3.0"));
}

#[test]
fn test_custom_table() {
    let config = RegistryConfig {
        default_version: "7.0".to_string(),
        aliases: [("7".to_string(), "7.0".to_string())].into_iter().collect(),
        versions: vec![VersionEntry {
            token: "7.0".to_string(),
            namespace: "urn:example:ddms:7".to_string(),
            schema: "/schemas/7.0/ddms.xsd".to_string(),
            vocabulary: "ism/v9".to_string(),
            auxiliary: [(Subsystem::Classification, "urn:us:gov:ic:ism".to_string())]
                .into_iter()
                .collect(),
        }],
    };
    let prefixes = PrefixConfig {
        ddms: "d".to_string(),
        ..PrefixConfig::default()
    };

    let registry = VersionRegistry::new(&config, &prefixes).unwrap();
    let seven = registry.resolve("7").unwrap();
    assert_eq!(seven.prefix(), "d");
    assert_eq!(seven.schema_location(), "/schemas/7.0/ddms.xsd");
    assert_eq!(registry.default_version().token(), "7.0");

    let bad_default = RegistryConfig {
        default_version: "8.0".to_string(),
        ..config
    };
    assert!(VersionRegistry::new(&bad_default, &prefixes).is_err());
}
