//! The global declarations loader
//!
//! Walks the direct children of registered schema roots and registers
//! `(qname, node, schema)` descriptors into the global maps, one pass per
//! XSD tag. `<redefine>` children become redefinition chains with
//! duplicate and cycle detection; `<override>` children (XSD 1.1) replace
//! the descriptors of the overridden schema. No parsing happens here
//! beyond reading the `name` attribute.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ErrorKind, Result, SchemaError};
use crate::namespaces::QName;

use super::base::{SchemaId, SourceRef, ValidationMode, XsdVersion};
use super::global_maps::{ComponentKind, GlobalMaps};
use super::schemas::XsdSchema;

/// The load passes, in the order earlier kinds are referenced by later
/// kinds: notations, simple types, attributes, attribute groups, complex
/// types, elements, groups.
pub(crate) const LOAD_PASSES: &[(&str, ComponentKind)] = &[
    ("notation", ComponentKind::Notation),
    ("simpleType", ComponentKind::Type),
    ("attribute", ComponentKind::Attribute),
    ("attributeGroup", ComponentKind::AttributeGroup),
    ("complexType", ComponentKind::Type),
    ("element", ComponentKind::Element),
    ("group", ComponentKind::Group),
];

struct Redefinition {
    qname: QName,
    source: SourceRef,
    /// The redefining schema
    schema: SchemaId,
    /// The schema named by the redefine's `schemaLocation`
    origin: Option<SchemaId>,
}

fn attach_schema_error(
    schemas: &mut [XsdSchema],
    id: SchemaId,
    validation: ValidationMode,
    err: SchemaError,
) -> Result<()> {
    match validation {
        ValidationMode::Strict => Err(err.into()),
        ValidationMode::Lax => {
            schemas[id].errors.push(err);
            Ok(())
        }
        ValidationMode::Skip => Ok(()),
    }
}

/// Register all direct declarations of `tag` from the given schemas
pub(crate) fn load_globals_for_tag(
    maps: &mut GlobalMaps,
    schemas: &mut [XsdSchema],
    ids: &[SchemaId],
    tag: &str,
    kind: ComponentKind,
    validation: ValidationMode,
    version: XsdVersion,
) -> Result<()> {
    let mut redefinitions: Vec<Redefinition> = Vec::new();
    let mut overrides: Vec<(QName, SourceRef, SchemaId)> = Vec::new();

    for &id in ids {
        let target_namespace = schemas[id].target_namespace.clone();
        let root = schemas[id].root.clone();

        // Collect redefine/override descriptors first, then the schema's
        // own direct declarations
        for directive in root.children_by_xsd_tag("redefine") {
            let Some(location) = directive.get("schemaLocation") else {
                continue;
            };
            let origin = schemas[id].includes.get(location).copied();
            for child in directive.children_by_xsd_tag(tag) {
                let Some(name) = child.get("name") else {
                    attach_schema_error(
                        schemas,
                        id,
                        validation,
                        SchemaError::new(
                            ErrorKind::MissingAttribute,
                            format!("redefined {} is missing its 'name' attribute", tag),
                        ),
                    )?;
                    continue;
                };
                redefinitions.push(Redefinition {
                    qname: QName::new(target_namespace.clone(), name.trim()),
                    source: SourceRef {
                        elem: child.clone(),
                        schema: id,
                    },
                    schema: id,
                    origin,
                });
            }
        }

        for directive in root.children_by_xsd_tag("override") {
            // Override is an XSD 1.1 construct; the schema walk already
            // reported it under 1.0
            if version == XsdVersion::V10 || directive.get("schemaLocation").is_none() {
                continue;
            }
            for child in directive.children_by_xsd_tag(tag) {
                let Some(name) = child.get("name") else {
                    attach_schema_error(
                        schemas,
                        id,
                        validation,
                        SchemaError::new(
                            ErrorKind::MissingAttribute,
                            format!("overridden {} is missing its 'name' attribute", tag),
                        ),
                    )?;
                    continue;
                };
                overrides.push((
                    QName::new(target_namespace.clone(), name.trim()),
                    SourceRef {
                        elem: child.clone(),
                        schema: id,
                    },
                    id,
                ));
            }
        }

        for child in root.children_by_xsd_tag(tag) {
            let Some(name) = child.get("name") else {
                attach_schema_error(
                    schemas,
                    id,
                    validation,
                    SchemaError::new(
                        ErrorKind::MissingAttribute,
                        format!("global {} is missing its 'name' attribute", tag),
                    ),
                )?;
                continue;
            };
            let qname = QName::new(target_namespace.clone(), name.trim());
            maps.register(
                kind,
                qname,
                SourceRef {
                    elem: child.clone(),
                    schema: id,
                },
            );
        }
    }

    // Duplicate and cycle detection over the collected redefinitions,
    // before any chain is appended
    let mut counts: HashMap<&QName, usize> = HashMap::new();
    for redef in &redefinitions {
        *counts.entry(&redef.qname).or_default() += 1;
    }

    let mut checked: Vec<&QName> = Vec::new();
    for redef in &redefinitions {
        if counts[&redef.qname] > 1 && !checked.contains(&&redef.qname) {
            checked.push(&redef.qname);

            let same_name: Vec<&Redefinition> = redefinitions
                .iter()
                .filter(|r| r.qname == redef.qname)
                .collect();

            let mut origins: Vec<Option<SchemaId>> =
                same_name.iter().map(|r| r.origin).collect();
            origins.sort();
            let duplicated_origin = origins.windows(2).any(|w| w[0] == w[1]);

            if duplicated_origin {
                attach_schema_error(
                    schemas,
                    redef.schema,
                    validation,
                    SchemaError::new(
                        ErrorKind::MultipleRedefinition,
                        format!("multiple redefinition for {} '{}'", tag, redef.qname),
                    )
                    .with_component(redef.qname.clone()),
                )?;
            } else {
                // Walk the origin -> redefining-schema chain for cycles
                let chain: HashMap<SchemaId, SchemaId> = same_name
                    .iter()
                    .filter_map(|r| r.origin.map(|o| (o, r.schema)))
                    .collect();
                'origins: for (&origin, &start) in chain.iter() {
                    let mut current = start;
                    for _ in 0..=chain.len() {
                        match chain.get(&current) {
                            Some(&next) if next == origin => {
                                attach_schema_error(
                                    schemas,
                                    redef.schema,
                                    validation,
                                    SchemaError::new(
                                        ErrorKind::CircularRedefinition,
                                        format!("circular redefinition for {} '{}'", tag, redef.qname),
                                    )
                                    .with_component(redef.qname.clone()),
                                )?;
                                break 'origins;
                            }
                            Some(&next) => current = next,
                            None => continue 'origins,
                        }
                    }
                }
            }
        }

        match maps.register_redefinition(kind, &redef.qname, redef.source.clone()) {
            Ok(()) => {
                debug!(name = %redef.qname, tag, "registered redefinition");
            }
            Err(err) => attach_schema_error(schemas, redef.schema, validation, err)?,
        }
    }

    for (qname, source, _) in overrides {
        debug!(name = %qname, tag, "override replaces descriptor");
        maps.replace(kind, qname, source);
    }

    Ok(())
}
