//! Simple type components
//!
//! A simple type is atomic, an atomic restriction, a list or a union. The
//! factory in this module parses `xs:simpleType` declarations, resolving
//! base/item/member references through the global maps.

use std::sync::Arc;

use crate::documents::Element;
use crate::error::{ErrorKind, Result, SchemaError};
use crate::namespaces::QName;

use super::base::{
    parse_annotation, BuildContext, DerivationSet, SchemaComponent, SchemaId, XsdAnnotation,
};
use super::facets::{FacetKind, FacetSet, WhiteSpace};
use super::global_maps::{lookup_type_clone, TypeLookup};

/// Variety of a simple type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleVariety {
    /// A single atomic value
    Atomic,
    /// White-space separated list of item values
    List,
    /// Value drawn from one of several member types
    Union,
}

/// The data of each simple type variant
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleTypeKind {
    /// A primitive atomic type; `primitive` names the primitive ancestor
    Atomic {
        /// Primitive ancestor (self, for primitives)
        primitive: QName,
    },
    /// An atomic restriction of a simple base type
    Restriction {
        /// The restricted base type
        base: Box<XsdSimpleType>,
    },
    /// A list over an item type
    List {
        /// The item type (atomic or union of atomics)
        item: Box<XsdSimpleType>,
    },
    /// A union over ordered member types
    Union {
        /// The member types in declaration order
        members: Vec<XsdSimpleType>,
    },
}

/// An XSD simple type definition
#[derive(Debug, Clone, PartialEq)]
pub struct XsdSimpleType {
    /// Type name; `None` for anonymous local types
    pub name: Option<QName>,
    /// Variant data
    pub kind: SimpleTypeKind,
    /// Constraining facets, including inherited ones
    pub facets: FacetSet,
    /// Blocked further derivations
    pub final_: DerivationSet,
    /// Leading annotation
    pub annotation: Option<XsdAnnotation>,
    /// Owning schema document
    pub schema: SchemaId,
    /// True for global declarations
    pub global: bool,
    /// True for types seeded by the built-in factory
    pub builtin: bool,
    /// Pre-redefinition snapshot, when this type was redefined
    pub redefine: Option<Box<XsdSimpleType>>,
    /// Build errors
    pub errors: Vec<SchemaError>,
}

impl XsdSimpleType {
    /// The `xs:anySimpleType` fallback
    pub fn any_simple_type(schema: SchemaId) -> Self {
        Self {
            name: Some(QName::xsd("anySimpleType")),
            kind: SimpleTypeKind::Atomic {
                primitive: QName::xsd("anySimpleType"),
            },
            facets: FacetSet::new(),
            final_: DerivationSet::default(),
            annotation: None,
            schema,
            global: true,
            builtin: true,
            redefine: None,
            errors: Vec::new(),
        }
    }

    /// The variety of this type
    pub fn variety(&self) -> SimpleVariety {
        match &self.kind {
            SimpleTypeKind::Atomic { .. } => SimpleVariety::Atomic,
            SimpleTypeKind::Restriction { base } => base.variety(),
            SimpleTypeKind::List { .. } => SimpleVariety::List,
            SimpleTypeKind::Union { .. } => SimpleVariety::Union,
        }
    }

    /// True for atomic types and atomic restrictions
    pub fn is_atomic(&self) -> bool {
        self.variety() == SimpleVariety::Atomic
    }

    /// The primitive ancestor name, for atomic varieties
    pub fn primitive_name(&self) -> Option<&QName> {
        match &self.kind {
            SimpleTypeKind::Atomic { primitive } => Some(primitive),
            SimpleTypeKind::Restriction { base } => base.primitive_name(),
            _ => None,
        }
    }

    /// The direct base type, for restrictions
    pub fn base_type(&self) -> Option<&XsdSimpleType> {
        match &self.kind {
            SimpleTypeKind::Restriction { base } => Some(base),
            _ => None,
        }
    }

    /// True when this type may be the item type of a list
    pub fn is_valid_list_item(&self) -> bool {
        match self.variety() {
            SimpleVariety::Atomic => true,
            SimpleVariety::Union => match &self.kind {
                SimpleTypeKind::Union { members } => members.iter().all(|m| m.is_atomic()),
                SimpleTypeKind::Restriction { base } => base.is_valid_list_item(),
                _ => false,
            },
            SimpleVariety::List => false,
        }
    }

    /// The effective white space mode
    pub fn white_space(&self) -> WhiteSpace {
        if let Some(ws) = self.facets.white_space() {
            return ws;
        }
        match &self.kind {
            SimpleTypeKind::Restriction { base } => base.white_space(),
            SimpleTypeKind::List { .. } => WhiteSpace::Collapse,
            _ => WhiteSpace::Preserve,
        }
    }

    /// True when `ancestor` occurs in this type's derivation chain
    pub fn is_derived_from(&self, ancestor: &QName) -> bool {
        if self.name.as_ref() == Some(ancestor) {
            return true;
        }
        match &self.kind {
            SimpleTypeKind::Restriction { base } => base.is_derived_from(ancestor),
            SimpleTypeKind::Atomic { primitive } => primitive == ancestor,
            _ => false,
        }
    }

    /// Collect this type's errors and those of nested anonymous types
    pub fn collect_errors<'a>(&'a self, out: &mut Vec<&'a SchemaError>) {
        out.extend(self.errors.iter());
        match &self.kind {
            SimpleTypeKind::Restriction { base } if base.name.is_none() => {
                base.collect_errors(out)
            }
            SimpleTypeKind::List { item } if item.name.is_none() => item.collect_errors(out),
            SimpleTypeKind::Union { members } => {
                for member in members.iter().filter(|m| m.name.is_none()) {
                    member.collect_errors(out);
                }
            }
            _ => {}
        }
    }
}

impl SchemaComponent for XsdSimpleType {
    fn name(&self) -> Option<&QName> {
        self.name.as_ref()
    }

    fn schema(&self) -> SchemaId {
        self.schema
    }

    fn is_global(&self) -> bool {
        self.global
    }

    fn errors(&self) -> &[SchemaError] {
        &self.errors
    }
}

// Primitive names whose value space is numeric; the length facets do not
// apply to these.
const NUMERIC_PRIMITIVES: &[&str] = &["decimal", "double", "float"];

fn length_facets_allowed(base: &XsdSimpleType) -> bool {
    match base.primitive_name() {
        Some(primitive) if primitive.is_xsd() => {
            !NUMERIC_PRIMITIVES.contains(&primitive.local_name.as_str())
        }
        _ => true,
    }
}

/// Build an `xs:simpleType` declaration into a component
///
/// `global` marks top-level declarations; `instance` carries the previous
/// build when a redefinition chain re-enters the factory.
pub(crate) fn xsd_simple_type_factory(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
    global: bool,
    instance: Option<XsdSimpleType>,
) -> Result<XsdSimpleType> {
    let mut errors = Vec::new();

    let name = if global {
        match elem.get("name") {
            Some(n) => Some(QName::new(
                ctx.schema(schema).target_namespace.clone(),
                n.trim(),
            )),
            None => {
                ctx.parse_error(
                    &mut errors,
                    SchemaError::new(
                        ErrorKind::MissingAttribute,
                        "global simpleType requires a 'name' attribute",
                    ),
                )?;
                None
            }
        }
    } else {
        None
    };

    let final_ = match elem.get("final").or(ctx.schema(schema).final_default.as_deref()) {
        Some(v) => DerivationSet::from_str(v).unwrap_or_default(),
        None => DerivationSet::default(),
    };

    let mut simple_type = XsdSimpleType {
        name: name.clone(),
        kind: SimpleTypeKind::Atomic {
            primitive: QName::xsd("anySimpleType"),
        },
        facets: FacetSet::new(),
        final_,
        annotation: parse_annotation(elem),
        schema,
        global,
        builtin: false,
        redefine: instance.map(Box::new),
        errors: Vec::new(),
    };

    match elem.first_xsd_child().cloned() {
        Some(child) if child.is_xsd("restriction") => {
            parse_restriction(ctx, &child, schema, &name, &mut simple_type, &mut errors)?;
        }
        Some(child) if child.is_xsd("list") => {
            parse_list(ctx, &child, schema, &mut simple_type, &mut errors)?;
        }
        Some(child) if child.is_xsd("union") => {
            parse_union(ctx, &child, schema, &mut simple_type, &mut errors)?;
        }
        other => {
            let found = other
                .map(|c| c.tag.to_string())
                .unwrap_or_else(|| "nothing".to_string());
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::InvalidDeclaration,
                    format!("simpleType requires a restriction, list or union child, found {}", found),
                ),
            )?;
        }
    }

    simple_type.errors = errors;
    Ok(simple_type)
}

/// Resolve a simple base type by name, substituting `anySimpleType` on
/// failure (lax mode)
fn resolve_simple_base(
    ctx: &mut BuildContext,
    base_name: &QName,
    context_name: &Option<QName>,
    schema: SchemaId,
    errors: &mut Vec<SchemaError>,
) -> Result<XsdSimpleType> {
    match lookup_type_clone(ctx, base_name)? {
        TypeLookup::Simple(base) => Ok(base),
        TypeLookup::Complex(complex) => match complex.simple_content() {
            // A complex type with simple content contributes its content
            // type when restricted inside simpleContent
            Some(content) => Ok(content.clone()),
            None => {
                ctx.parse_error(
                    errors,
                    SchemaError::new(
                        ErrorKind::BaseTypeMismatch,
                        format!("base type '{}' is a complex type without simple content", base_name),
                    ),
                )?;
                Ok(XsdSimpleType::any_simple_type(schema))
            }
        },
        TypeLookup::Circular => {
            let mut err = SchemaError::new(
                ErrorKind::CircularDerivation,
                format!("circular derivation through base type '{}'", base_name),
            );
            if let Some(name) = context_name {
                err = err.with_component(name.clone());
            }
            ctx.parse_error(errors, err)?;
            Ok(XsdSimpleType::any_simple_type(schema))
        }
        TypeLookup::Missing => {
            ctx.parse_error(
                errors,
                SchemaError::new(
                    ErrorKind::MissingComponent,
                    format!("unknown base type '{}'", base_name),
                ),
            )?;
            Ok(XsdSimpleType::any_simple_type(schema))
        }
    }
}

fn parse_restriction(
    ctx: &mut BuildContext,
    child: &Arc<Element>,
    schema: SchemaId,
    name: &Option<QName>,
    simple_type: &mut XsdSimpleType,
    errors: &mut Vec<SchemaError>,
) -> Result<()> {
    let inline_base = child.children_by_xsd_tag("simpleType").next().cloned();

    let base = match (child.get("base"), inline_base) {
        (Some(base_attr), None) => {
            let fallback = ctx.schema(schema).qname_fallback();
            match child.resolve_qname(base_attr, fallback.as_deref()) {
                Ok(base_name) => resolve_simple_base(ctx, &base_name, name, schema, errors)?,
                Err(e) => {
                    ctx.parse_error(
                        errors,
                        SchemaError::new(ErrorKind::MissingComponent, e.to_string()),
                    )?;
                    XsdSimpleType::any_simple_type(schema)
                }
            }
        }
        (None, Some(inline)) => xsd_simple_type_factory(ctx, &inline, schema, false, None)?,
        (Some(_), Some(_)) => {
            ctx.parse_error(
                errors,
                SchemaError::new(
                    ErrorKind::AmbiguousDeclaration,
                    "restriction has both a 'base' attribute and an inline simpleType",
                ),
            )?;
            XsdSimpleType::any_simple_type(schema)
        }
        (None, None) => {
            ctx.parse_error(
                errors,
                SchemaError::new(
                    ErrorKind::MissingAttribute,
                    "restriction requires a 'base' attribute or an inline simpleType",
                ),
            )?;
            XsdSimpleType::any_simple_type(schema)
        }
    };

    let (mut facets, facet_errors) = FacetSet::parse(child);
    for err in facet_errors {
        ctx.parse_error(errors, err)?;
    }

    if facets.get(FacetKind::Length).is_some()
        || facets.get(FacetKind::MinLength).is_some()
        || facets.get(FacetKind::MaxLength).is_some()
    {
        if !length_facets_allowed(&base) {
            ctx.parse_error(
                errors,
                SchemaError::new(
                    ErrorKind::FacetNotAllowed,
                    "length facets are not applicable to numeric base types",
                ),
            )?;
        }
    }

    for err in facets.inherit(&base.facets) {
        ctx.parse_error(errors, err)?;
    }

    simple_type.facets = facets;
    simple_type.kind = SimpleTypeKind::Restriction { base: Box::new(base) };
    Ok(())
}

fn parse_list(
    ctx: &mut BuildContext,
    child: &Arc<Element>,
    schema: SchemaId,
    simple_type: &mut XsdSimpleType,
    errors: &mut Vec<SchemaError>,
) -> Result<()> {
    let inline_item = child.children_by_xsd_tag("simpleType").next().cloned();

    let item = match (child.get("itemType"), inline_item) {
        (Some(_), Some(_)) => {
            ctx.parse_error(
                errors,
                SchemaError::new(
                    ErrorKind::AmbiguousList,
                    "list has both an 'itemType' attribute and an inline simpleType",
                ),
            )?;
            XsdSimpleType::any_simple_type(schema)
        }
        (Some(item_attr), None) => {
            let fallback = ctx.schema(schema).qname_fallback();
            match child.resolve_qname(item_attr, fallback.as_deref()) {
                Ok(item_name) => {
                    resolve_simple_base(ctx, &item_name, &simple_type.name, schema, errors)?
                }
                Err(e) => {
                    ctx.parse_error(
                        errors,
                        SchemaError::new(ErrorKind::MissingComponent, e.to_string()),
                    )?;
                    XsdSimpleType::any_simple_type(schema)
                }
            }
        }
        (None, Some(inline)) => xsd_simple_type_factory(ctx, &inline, schema, false, None)?,
        (None, None) => {
            ctx.parse_error(
                errors,
                SchemaError::new(
                    ErrorKind::MissingAttribute,
                    "list requires an 'itemType' attribute or an inline simpleType",
                ),
            )?;
            XsdSimpleType::any_simple_type(schema)
        }
    };

    if !item.is_valid_list_item() {
        ctx.parse_error(
            errors,
            SchemaError::new(
                ErrorKind::BaseTypeMismatch,
                "list item type must be atomic or a union of atomics",
            ),
        )?;
    }

    let mut facets = FacetSet::new();
    facets.set(FacetKind::WhiteSpace, "collapse", false);
    simple_type.facets = facets;
    simple_type.kind = SimpleTypeKind::List { item: Box::new(item) };
    Ok(())
}

fn parse_union(
    ctx: &mut BuildContext,
    child: &Arc<Element>,
    schema: SchemaId,
    simple_type: &mut XsdSimpleType,
    errors: &mut Vec<SchemaError>,
) -> Result<()> {
    let mut members = Vec::new();

    // Local member types first, in document order
    for inline in child.children_by_xsd_tag("simpleType") {
        let inline = inline.clone();
        members.push(xsd_simple_type_factory(ctx, &inline, schema, false, None)?);
    }

    // Then the types referenced by memberTypes, in order
    if let Some(member_attr) = child.get("memberTypes") {
        let fallback = ctx.schema(schema).qname_fallback();
        for token in member_attr.split_whitespace() {
            match child.resolve_qname(token, fallback.as_deref()) {
                Ok(member_name) => {
                    members.push(resolve_simple_base(
                        ctx,
                        &member_name,
                        &simple_type.name,
                        schema,
                        errors,
                    )?);
                }
                Err(e) => {
                    ctx.parse_error(
                        errors,
                        SchemaError::new(ErrorKind::MissingComponent, e.to_string()),
                    )?;
                }
            }
        }
    }

    if members.is_empty() {
        ctx.parse_error(
            errors,
            SchemaError::new(
                ErrorKind::MissingUnionMembers,
                "union resolves to zero member types",
            ),
        )?;
    }

    simple_type.kind = SimpleTypeKind::Union { members };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atomic(local: &str) -> XsdSimpleType {
        XsdSimpleType {
            name: Some(QName::xsd(local)),
            kind: SimpleTypeKind::Atomic {
                primitive: QName::xsd(local),
            },
            facets: FacetSet::new(),
            final_: DerivationSet::default(),
            annotation: None,
            schema: 0,
            global: true,
            builtin: true,
            redefine: None,
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_variety() {
        let string = atomic("string");
        assert_eq!(string.variety(), SimpleVariety::Atomic);

        let restricted = XsdSimpleType {
            kind: SimpleTypeKind::Restriction {
                base: Box::new(string.clone()),
            },
            ..atomic("token")
        };
        assert_eq!(restricted.variety(), SimpleVariety::Atomic);
        assert!(restricted.is_atomic());

        let list = XsdSimpleType {
            kind: SimpleTypeKind::List {
                item: Box::new(string.clone()),
            },
            ..atomic("tokens")
        };
        assert_eq!(list.variety(), SimpleVariety::List);
        assert!(!list.is_valid_list_item());
    }

    #[test]
    fn test_union_of_atomics_is_list_item() {
        let union = XsdSimpleType {
            kind: SimpleTypeKind::Union {
                members: vec![atomic("string"), atomic("int")],
            },
            ..atomic("u")
        };
        assert!(union.is_valid_list_item());

        let nested_list = XsdSimpleType {
            kind: SimpleTypeKind::List {
                item: Box::new(atomic("string")),
            },
            ..atomic("l")
        };
        let union_with_list = XsdSimpleType {
            kind: SimpleTypeKind::Union {
                members: vec![atomic("string"), nested_list],
            },
            ..atomic("u2")
        };
        assert!(!union_with_list.is_valid_list_item());
    }

    #[test]
    fn test_is_derived_from() {
        let int = XsdSimpleType {
            kind: SimpleTypeKind::Restriction {
                base: Box::new(atomic("decimal")),
            },
            ..atomic("int")
        };
        assert!(int.is_derived_from(&QName::xsd("decimal")));
        assert!(int.is_derived_from(&QName::xsd("int")));
        assert!(!int.is_derived_from(&QName::xsd("string")));
    }

    #[test]
    fn test_white_space_defaults() {
        let string = atomic("string");
        assert_eq!(string.white_space(), WhiteSpace::Preserve);

        let list = XsdSimpleType {
            kind: SimpleTypeKind::List {
                item: Box::new(string),
            },
            ..atomic("l")
        };
        assert_eq!(list.white_space(), WhiteSpace::Collapse);
    }
}
