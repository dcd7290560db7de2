//! Element descriptors
//!
//! Each static below is pure data interpreted by [`crate::component`]. Adding
//! an element type means adding a descriptor here, not new code.

use crate::schema::{
    COMPLETELY_EMPTY, ComponentSchema, FieldSpec, GroupRule, NO_VALUE, Rule, UNBOUNDED, ValueKind,
};
use crate::version::Subsystem;

const LENGTH_MEASURES: &[&str] = &[
    "Fathom",
    "Foot",
    "Inch",
    "Kilometer",
    "Meter",
    "Mile",
    "Millimeter",
    "NauticalMile",
    "Yard",
];

const VERTICAL_DATUMS: &[&str] = &["AGL", "MSL", "HAE"];

const QUALIFIER_WITHOUT_VALUE: &str =
    "A qualifier has been set without an accompanying value attribute.";

pub static TITLE: ComponentSchema = ComponentSchema {
    id: "title",
    names: &[("2.0", "title")],
    output: "title",
    since: None,
    fields: &[FieldSpec::text().required()],
    security: GroupRule::REQUIRED,
    extensible: GroupRule::FORBIDDEN,
    rules: &[],
};

pub static SUBTITLE: ComponentSchema = ComponentSchema {
    id: "subtitle",
    names: &[("2.0", "subtitle")],
    output: "subtitle",
    since: None,
    fields: &[FieldSpec::text()],
    security: GroupRule::REQUIRED,
    extensible: GroupRule::FORBIDDEN,
    rules: &[Rule::WarnIfEmpty { message: NO_VALUE }],
};

pub static DESCRIPTION: ComponentSchema = ComponentSchema {
    id: "description",
    names: &[("2.0", "description")],
    output: "description",
    since: None,
    fields: &[FieldSpec::text()],
    security: GroupRule::REQUIRED,
    extensible: GroupRule::FORBIDDEN,
    rules: &[Rule::WarnIfEmpty { message: NO_VALUE }],
};

pub static LANGUAGE: ComponentSchema = ComponentSchema {
    id: "language",
    names: &[("2.0", "language")],
    output: "language",
    since: None,
    fields: &[FieldSpec::attribute("qualifier"), FieldSpec::attribute("value")],
    security: GroupRule::FORBIDDEN,
    extensible: GroupRule::FORBIDDEN,
    rules: &[
        Rule::RequiredWith {
            field: "qualifier",
            when: "value",
        },
        Rule::WarnSetWithout {
            field: "qualifier",
            missing: "value",
            message: QUALIFIER_WITHOUT_VALUE,
        },
        Rule::WarnIfEmpty {
            message: "Neither a qualifier nor a value was set on this language.",
        },
    ],
};

pub static EXTENT: ComponentSchema = ComponentSchema {
    id: "extent",
    names: &[("2.0", "extent")],
    output: "extent",
    since: None,
    fields: &[
        FieldSpec::attribute("qualifier").kind(ValueKind::Uri),
        FieldSpec::attribute("value"),
    ],
    security: GroupRule::FORBIDDEN,
    extensible: GroupRule::FORBIDDEN,
    rules: &[
        Rule::RequiredWith {
            field: "qualifier",
            when: "value",
        },
        Rule::WarnSetWithout {
            field: "qualifier",
            missing: "value",
            message: QUALIFIER_WITHOUT_VALUE,
        },
        Rule::WarnIfEmpty {
            message: COMPLETELY_EMPTY,
        },
    ],
};

pub static DATES: ComponentSchema = ComponentSchema {
    id: "dates",
    names: &[("2.0", "dates")],
    output: "dates",
    since: None,
    fields: &[
        FieldSpec::attribute("created").kind(ValueKind::Date),
        FieldSpec::attribute("posted").kind(ValueKind::Date),
        FieldSpec::attribute("validTil").kind(ValueKind::Date),
        FieldSpec::attribute("infoCutOff").kind(ValueKind::Date),
        FieldSpec::attribute("approvedOn")
            .kind(ValueKind::Date)
            .since("3.1"),
        FieldSpec::attribute("receivedOn")
            .kind(ValueKind::Date)
            .since("4.1"),
        FieldSpec::child_text("acquiredOn")
            .kind(ValueKind::Date)
            .bounds(0, UNBOUNDED)
            .since("4.1"),
    ],
    security: GroupRule::FORBIDDEN,
    extensible: GroupRule::FORBIDDEN,
    rules: &[
        Rule::WarnIfEmpty {
            message: COMPLETELY_EMPTY,
        },
        // 4.0.1 and 4.1 share a namespace
        Rule::WarnBefore {
            field: "acquiredOn",
            before: "5.0",
            message: "A {field} element may cause issues for DDMS 4.0.1 records.",
        },
    ],
};

pub static RIGHTS: ComponentSchema = ComponentSchema {
    id: "rights",
    names: &[("2.0", "rights")],
    output: "rights",
    since: None,
    fields: &[
        FieldSpec::attribute("privacyAct").kind(ValueKind::Boolean),
        FieldSpec::attribute("intellectualProperty").kind(ValueKind::Boolean),
        FieldSpec::attribute("copyright").kind(ValueKind::Boolean),
    ],
    security: GroupRule::FORBIDDEN,
    extensible: GroupRule::FORBIDDEN,
    rules: &[],
};

pub static KEYWORD: ComponentSchema = ComponentSchema {
    id: "keyword",
    names: &[("2.0", "keyword")],
    output: "keyword",
    since: None,
    fields: &[FieldSpec::attribute("value").output("").required()],
    security: GroupRule::FORBIDDEN,
    extensible: GroupRule::OPTIONAL.since("3.0"),
    rules: &[],
};

pub static CATEGORY: ComponentSchema = ComponentSchema {
    id: "category",
    names: &[("2.0", "category")],
    output: "category",
    since: None,
    fields: &[
        FieldSpec::attribute("qualifier").kind(ValueKind::Uri),
        FieldSpec::attribute("code"),
        FieldSpec::attribute("label").required(),
    ],
    security: GroupRule::FORBIDDEN,
    extensible: GroupRule::OPTIONAL.since("3.0"),
    rules: &[],
};

pub static SUBJECT_COVERAGE: ComponentSchema = ComponentSchema {
    id: "subjectCoverage",
    names: &[("2.0", "subjectCoverage")],
    output: "subjectCoverage",
    since: None,
    fields: &[
        FieldSpec::child("keyword", &KEYWORD),
        FieldSpec::child("category", &CATEGORY),
    ],
    security: GroupRule::OPTIONAL.since("3.0"),
    extensible: GroupRule::FORBIDDEN,
    rules: &[
        Rule::AtLeastOne {
            fields: &["keyword", "category"],
            message: "At least 1 keyword or category must exist.",
        },
        Rule::WarnDuplicates {
            field: "keyword",
            message: "1 or more keywords have the same value.",
        },
        Rule::WarnDuplicates {
            field: "category",
            message: "1 or more categories have the same value.",
        },
    ],
};

pub static PERSON: ComponentSchema = ComponentSchema {
    id: "person",
    names: &[("2.0", "Person"), ("4.0.1", "person")],
    output: "person",
    since: None,
    fields: &[
        FieldSpec::child_text("name").bounds(1, UNBOUNDED),
        FieldSpec::child_text("surname").required(),
        FieldSpec::child_text("userID").warn_if_empty(),
        FieldSpec::child_text("affiliation")
            .bounds(0, UNBOUNDED)
            .warn_if_empty(),
        FieldSpec::child_text("phone")
            .bounds(0, UNBOUNDED)
            .warn_if_empty(),
        FieldSpec::child_text("email")
            .bounds(0, UNBOUNDED)
            .warn_if_empty(),
    ],
    security: GroupRule::FORBIDDEN,
    extensible: GroupRule::OPTIONAL,
    rules: &[],
};

pub static VERTICAL_EXTENT: ComponentSchema = ComponentSchema {
    id: "verticalExtent",
    names: &[("2.0", "verticalExtent")],
    output: "verticalExtent",
    since: None,
    fields: &[
        FieldSpec::attribute("unitOfMeasure")
            .kind(ValueKind::Token(LENGTH_MEASURES))
            .required(),
        FieldSpec::attribute("datum")
            .kind(ValueKind::Token(VERTICAL_DATUMS))
            .required(),
        FieldSpec::child_text("MinVerticalExtent")
            .output("minimum")
            .kind(ValueKind::Decimal)
            .required(),
        FieldSpec::child_text("MaxVerticalExtent")
            .output("maximum")
            .kind(ValueKind::Decimal)
            .required(),
    ],
    security: GroupRule::FORBIDDEN,
    extensible: GroupRule::FORBIDDEN,
    rules: &[Rule::NotGreater {
        lower: "MinVerticalExtent",
        upper: "MaxVerticalExtent",
        message: "Minimum vertical extent must be less than maximum vertical extent.",
    }],
};

pub static SOURCE: ComponentSchema = ComponentSchema {
    id: "source",
    names: &[("2.0", "source")],
    output: "source",
    since: None,
    fields: &[
        FieldSpec::attribute("qualifier"),
        FieldSpec::attribute("value"),
        FieldSpec::attribute("schemaQualifier"),
        FieldSpec::attribute("schemaHref").kind(ValueKind::Uri),
    ],
    security: GroupRule::OPTIONAL.since("3.0"),
    extensible: GroupRule::FORBIDDEN,
    rules: &[Rule::WarnIfEmpty {
        message: COMPLETELY_EMPTY,
    }],
};

pub static SECURITY: ComponentSchema = ComponentSchema {
    id: "security",
    names: &[("2.0", "security")],
    output: "security",
    since: None,
    fields: &[FieldSpec::foreign_attribute("excludeFromRollup", Subsystem::Classification)
        .kind(ValueKind::Boolean)
        .required()
        .since("3.0")],
    security: GroupRule::REQUIRED,
    extensible: GroupRule::FORBIDDEN,
    rules: &[Rule::Fixed {
        field: "excludeFromRollup",
        value: "true",
    }],
};

/// Every descriptor, for lookup by element name
pub static ALL: &[&ComponentSchema] = &[
    &TITLE,
    &SUBTITLE,
    &DESCRIPTION,
    &LANGUAGE,
    &EXTENT,
    &DATES,
    &RIGHTS,
    &KEYWORD,
    &CATEGORY,
    &SUBJECT_COVERAGE,
    &PERSON,
    &VERTICAL_EXTENT,
    &SOURCE,
    &SECURITY,
];

/// The descriptor whose element uses `local_name` in some version
pub fn find(local_name: &str) -> Option<&'static ComponentSchema> {
    ALL.iter().copied().find(|schema| schema.answers_to(local_name))
}
