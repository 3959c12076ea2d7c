//! Built-in XSD simple types
//!
//! Seeds the XSD namespace of the global maps with the primitive atomic
//! types, the ur-types (`anyType`, `anySimpleType`, `anyAtomicType`), the
//! derived atomic chains and the built-in list types. Runs before user
//! schemas compile; existing entries (a user-supplied meta-schema
//! override) are kept untouched.

use indexmap::IndexMap;

use crate::namespaces::QName;

use super::base::{DerivationSet, SchemaId};
use super::complex_types::{XsdComplexType, XsdType};
use super::facets::{FacetKind, FacetSet};
use super::global_maps::GlobalMaps;
use super::simple_types::{SimpleTypeKind, XsdSimpleType};

/// The nineteen primitive atomic types of XSD 1.0
pub const XSD_PRIMITIVES: &[&str] = &[
    "string",
    "boolean",
    "decimal",
    "float",
    "double",
    "duration",
    "dateTime",
    "time",
    "date",
    "gYearMonth",
    "gYear",
    "gMonthDay",
    "gDay",
    "gMonth",
    "hexBinary",
    "base64Binary",
    "anyURI",
    "QName",
    "NOTATION",
];

// (name, base, range facets applied on top of the base)
type DerivedRow = (&'static str, &'static str, &'static [(FacetKind, &'static str)]);

const DERIVED_ATOMICS: &[DerivedRow] = &[
    ("normalizedString", "string", &[(FacetKind::WhiteSpace, "replace")]),
    ("token", "normalizedString", &[(FacetKind::WhiteSpace, "collapse")]),
    ("language", "token", &[]),
    ("NMTOKEN", "token", &[]),
    ("Name", "token", &[]),
    ("NCName", "Name", &[]),
    ("ID", "NCName", &[]),
    ("IDREF", "NCName", &[]),
    ("ENTITY", "NCName", &[]),
    ("integer", "decimal", &[(FacetKind::FractionDigits, "0")]),
    ("nonPositiveInteger", "integer", &[(FacetKind::MaxInclusive, "0")]),
    ("negativeInteger", "nonPositiveInteger", &[(FacetKind::MaxInclusive, "-1")]),
    ("long", "integer", &[
        (FacetKind::MinInclusive, "-9223372036854775808"),
        (FacetKind::MaxInclusive, "9223372036854775807"),
    ]),
    ("int", "long", &[
        (FacetKind::MinInclusive, "-2147483648"),
        (FacetKind::MaxInclusive, "2147483647"),
    ]),
    ("short", "int", &[
        (FacetKind::MinInclusive, "-32768"),
        (FacetKind::MaxInclusive, "32767"),
    ]),
    ("byte", "short", &[
        (FacetKind::MinInclusive, "-128"),
        (FacetKind::MaxInclusive, "127"),
    ]),
    ("nonNegativeInteger", "integer", &[(FacetKind::MinInclusive, "0")]),
    ("unsignedLong", "nonNegativeInteger", &[(FacetKind::MaxInclusive, "18446744073709551615")]),
    ("unsignedInt", "unsignedLong", &[(FacetKind::MaxInclusive, "4294967295")]),
    ("unsignedShort", "unsignedInt", &[(FacetKind::MaxInclusive, "65535")]),
    ("unsignedByte", "unsignedShort", &[(FacetKind::MaxInclusive, "255")]),
    ("positiveInteger", "nonNegativeInteger", &[(FacetKind::MinInclusive, "1")]),
];

// (list name, item name)
const BUILTIN_LISTS: &[(&str, &str)] = &[
    ("NMTOKENS", "NMTOKEN"),
    ("IDREFS", "IDREF"),
    ("ENTITIES", "ENTITY"),
];

fn atomic(local: &str, schema: SchemaId, facets: FacetSet) -> XsdSimpleType {
    XsdSimpleType {
        name: Some(QName::xsd(local)),
        kind: SimpleTypeKind::Atomic {
            primitive: QName::xsd(local),
        },
        facets,
        final_: DerivationSet::default(),
        annotation: None,
        schema,
        global: true,
        builtin: true,
        redefine: None,
        errors: Vec::new(),
    }
}

/// Seed the XSD namespace with the built-in types
pub(crate) fn xsd_builtin_types_factory(maps: &mut GlobalMaps, schema: SchemaId) {
    let mut built: IndexMap<&str, XsdSimpleType> = IndexMap::new();

    // Ur-types
    built.insert("anySimpleType", atomic("anySimpleType", schema, FacetSet::new()));
    {
        let mut facets = FacetSet::new();
        facets.set(FacetKind::WhiteSpace, "preserve", false);
        built.insert("anyAtomicType", atomic("anyAtomicType", schema, facets));
    }

    // Primitives: string preserves white space, everything else collapses
    for &primitive in XSD_PRIMITIVES {
        let mut facets = FacetSet::new();
        let ws = if primitive == "string" { "preserve" } else { "collapse" };
        facets.set(FacetKind::WhiteSpace, ws, primitive != "string");
        built.insert(primitive, atomic(primitive, schema, facets));
    }

    // Derived atomic chains
    for &(name, base_name, extra_facets) in DERIVED_ATOMICS {
        let base = built
            .get(base_name)
            .expect("derived built-in rows are ordered after their base")
            .clone();

        let mut facets = base.facets.clone();
        for &(kind, value) in extra_facets {
            facets.set(kind, value, kind == FacetKind::FractionDigits);
        }

        built.insert(
            name,
            XsdSimpleType {
                name: Some(QName::xsd(name)),
                kind: SimpleTypeKind::Restriction {
                    base: Box::new(base),
                },
                facets,
                final_: DerivationSet::default(),
                annotation: None,
                schema,
                global: true,
                builtin: true,
                redefine: None,
                errors: Vec::new(),
            },
        );
    }

    // Built-in lists over their singular item types
    for &(name, item_name) in BUILTIN_LISTS {
        let item = built
            .get(item_name)
            .expect("list item built-ins precede their lists")
            .clone();

        let mut facets = FacetSet::new();
        facets.set(FacetKind::WhiteSpace, "collapse", true);
        facets.set(FacetKind::MinLength, "1", false);

        built.insert(
            name,
            XsdSimpleType {
                name: Some(QName::xsd(name)),
                kind: SimpleTypeKind::List {
                    item: Box::new(item),
                },
                facets,
                final_: DerivationSet::default(),
                annotation: None,
                schema,
                global: true,
                builtin: true,
                redefine: None,
                errors: Vec::new(),
            },
        );
    }

    maps.seed_type(
        QName::xsd("anyType"),
        XsdType::Complex(XsdComplexType::any_type(schema)),
    );
    for (local, simple_type) in built {
        maps.seed_type(QName::xsd(local), XsdType::Simple(simple_type));
    }
}
