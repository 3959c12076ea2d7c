//! Element declaration components
//!
//! Global and local element declarations, element references inside
//! content models, substitution group membership and attached identity
//! constraints.

use std::sync::Arc;

use crate::documents::Element;
use crate::error::{ErrorKind, Result, SchemaError};
use crate::namespaces::QName;

use super::base::{
    parse_annotation, BuildContext, DerivationSet, Form, SchemaComponent, SchemaId, XsdAnnotation,
};
use super::complex_types::{xsd_complex_type_factory, XsdComplexType};
use super::global_maps::{lookup_element_exists, lookup_type_clone, TypeLookup};
use super::identities::{xsd_identity_factory, IdentityCategory, XsdIdentity};
use super::particles::{parse_occurs, Occurs};
use super::simple_types::{xsd_simple_type_factory, XsdSimpleType};

/// The type of an element declaration
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    /// A global type, by name (resolved lazily against the maps)
    Named(QName),
    /// An inline anonymous simple type
    Simple(Box<XsdSimpleType>),
    /// An inline anonymous complex type
    Complex(Box<XsdComplexType>),
    /// `xs:anyType`, the default for empty declarations
    AnyType,
}

impl ElementType {
    /// The referenced type name, for named types
    pub fn type_name(&self) -> Option<&QName> {
        match self {
            ElementType::Named(name) => Some(name),
            _ => None,
        }
    }
}

/// An XSD element declaration, reference or particle
#[derive(Debug, Clone, PartialEq)]
pub struct XsdElement {
    /// Element name (for references, the referenced name)
    pub name: QName,
    /// The element's type
    pub type_: ElementType,
    /// Occurrence bounds at the use site; (1, 1) for global declarations
    pub occurs: Occurs,
    /// True when the name is namespace-qualified
    pub qualified: bool,
    /// `nillable` flag
    pub nillable: bool,
    /// `abstract` flag
    pub abstract_: bool,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
    /// True for `ref=` uses of a global element
    pub is_ref: bool,
    /// Head of the substitution group this element belongs to
    pub substitution_group: Option<QName>,
    /// Attached identity constraints
    pub identities: Vec<XsdIdentity>,
    /// Blocked substitutions/derivations at use sites
    pub block: DerivationSet,
    /// Blocked derivations of this declaration (global only)
    pub final_: DerivationSet,
    /// Leading annotation
    pub annotation: Option<XsdAnnotation>,
    /// Owning schema document
    pub schema: SchemaId,
    /// True for global declarations
    pub global: bool,
    /// Build errors
    pub errors: Vec<SchemaError>,
}

impl XsdElement {
    /// The declared type name, when the type is a named reference
    pub fn type_name(&self) -> Option<&QName> {
        self.type_.type_name()
    }

    /// Collect this element's errors and those of nested components
    pub fn collect_errors<'a>(&'a self, out: &mut Vec<&'a SchemaError>) {
        out.extend(self.errors.iter());
        match &self.type_ {
            ElementType::Simple(inner) => inner.collect_errors(out),
            ElementType::Complex(inner) => inner.collect_errors(out),
            _ => {}
        }
        for identity in &self.identities {
            out.extend(identity.errors.iter());
        }
    }
}

impl SchemaComponent for XsdElement {
    fn name(&self) -> Option<&QName> {
        Some(&self.name)
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

/// Build an `xs:element` declaration, reference or particle
pub(crate) fn xsd_element_factory(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
    global: bool,
    instance: Option<XsdElement>,
) -> Result<XsdElement> {
    let mut errors = Vec::new();
    let _ = instance; // elements are not redefinable

    let occurs = if global {
        if elem.get("minOccurs").is_some() || elem.get("maxOccurs").is_some() {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::InvalidDeclaration,
                    "occurrence bounds are not allowed on a global element",
                ),
            )?;
        }
        Occurs::once()
    } else {
        match parse_occurs(elem) {
            Ok(occurs) => occurs,
            Err(e) => {
                ctx.parse_error(&mut errors, e)?;
                Occurs::once()
            }
        }
    };

    let default = elem.get("default").map(String::from);
    let fixed = elem.get("fixed").map(String::from);
    if default.is_some() && fixed.is_some() {
        ctx.parse_error(
            &mut errors,
            SchemaError::new(
                ErrorKind::AmbiguousDeclaration,
                "'default' and 'fixed' are mutually exclusive",
            ),
        )?;
    }

    let nillable = elem.bool_attribute("nillable", false).unwrap_or(false);
    let abstract_ = elem.bool_attribute("abstract", false).unwrap_or(false);

    let block = match elem.get("block").or(ctx.schema(schema).block_default.as_deref()) {
        Some(v) => DerivationSet::from_str(v).unwrap_or_default(),
        None => DerivationSet::default(),
    };
    let final_ = match elem.get("final").or(ctx.schema(schema).final_default.as_deref()) {
        Some(v) => DerivationSet::from_str(v).unwrap_or_default(),
        None => DerivationSet::default(),
    };

    // Reference form
    if let Some(ref_attr) = elem.get("ref") {
        if global {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::InvalidDeclaration,
                    "a global element cannot be a reference",
                ),
            )?;
        }
        for forbidden in ["name", "type", "form"] {
            if elem.get(forbidden).is_some() {
                ctx.parse_error(
                    &mut errors,
                    SchemaError::new(
                        ErrorKind::AmbiguousDeclaration,
                        format!("element reference cannot carry '{}'", forbidden),
                    ),
                )?;
            }
        }
        if elem.xsd_children().next().is_some() {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::ForbiddenChild,
                    "element reference cannot have content children",
                ),
            )?;
        }

        let fallback = ctx.schema(schema).qname_fallback();
        let ref_name = match elem.resolve_qname(ref_attr, fallback.as_deref()) {
            Ok(name) => name,
            Err(e) => {
                ctx.parse_error(
                    &mut errors,
                    SchemaError::new(ErrorKind::MissingComponent, e.to_string()),
                )?;
                QName::local(ref_attr.trim())
            }
        };

        // Force the referenced declaration to build; absence is re-checked
        // against the final map in the deferred pass
        lookup_element_exists(ctx, &ref_name)?;

        return Ok(XsdElement {
            name: ref_name,
            type_: ElementType::AnyType,
            occurs,
            qualified: true,
            nillable,
            abstract_: false,
            default,
            fixed,
            is_ref: true,
            substitution_group: None,
            identities: Vec::new(),
            block,
            final_: DerivationSet::default(),
            annotation: parse_annotation(elem),
            schema,
            global: false,
            errors,
        });
    }

    // Declaration form
    let local_name = match elem.get("name") {
        Some(n) => n.trim().to_string(),
        None => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::MissingAttribute,
                    "element declaration requires a 'name' attribute",
                ),
            )?;
            String::new()
        }
    };

    let qualified = if global {
        true
    } else {
        match elem.get("form") {
            Some(v) => match Form::from_str(v) {
                Ok(form) => form == Form::Qualified,
                Err(e) => {
                    ctx.parse_error(
                        &mut errors,
                        SchemaError::new(ErrorKind::InvalidDeclaration, e.to_string()),
                    )?;
                    false
                }
            },
            None => ctx.schema(schema).element_form_default == Form::Qualified,
        }
    };

    let name = if qualified {
        QName::new(ctx.schema(schema).target_namespace.clone(), local_name)
    } else {
        QName::local(local_name)
    };

    // Substitution group membership, global declarations only
    let substitution_group = match elem.get("substitutionGroup") {
        Some(head_attr) if global => {
            let fallback = ctx.schema(schema).qname_fallback();
            match elem.resolve_qname(head_attr, fallback.as_deref()) {
                Ok(head) => {
                    ctx.substitution_groups
                        .entry(head.clone())
                        .or_default()
                        .push(name.clone());
                    Some(head)
                }
                Err(e) => {
                    ctx.parse_error(
                        &mut errors,
                        SchemaError::new(ErrorKind::MissingComponent, e.to_string()),
                    )?;
                    None
                }
            }
        }
        Some(_) => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::InvalidDeclaration,
                    "substitutionGroup is only allowed on a global element",
                ),
            )?;
            None
        }
        None => None,
    };

    // Type: attribute reference or inline definition, not both
    let inline_simple = elem.children_by_xsd_tag("simpleType").next().cloned();
    let inline_complex = elem.children_by_xsd_tag("complexType").next().cloned();

    let type_ = match (elem.get("type"), inline_simple, inline_complex) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::AmbiguousDeclaration,
                    "element has both a 'type' attribute and an inline type",
                )
                .with_component(name.clone()),
            )?;
            ElementType::AnyType
        }
        (None, Some(_), Some(_)) => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::AmbiguousDeclaration,
                    "element has both an inline simpleType and complexType",
                )
                .with_component(name.clone()),
            )?;
            ElementType::AnyType
        }
        (Some(type_attr), None, None) => {
            let fallback = ctx.schema(schema).qname_fallback();
            match elem.resolve_qname(type_attr, fallback.as_deref()) {
                Ok(type_name) => match lookup_type_clone(ctx, &type_name)? {
                    TypeLookup::Simple(_) | TypeLookup::Complex(_) | TypeLookup::Circular => {
                        ElementType::Named(type_name)
                    }
                    TypeLookup::Missing => {
                        ctx.parse_error(
                            &mut errors,
                            SchemaError::new(
                                ErrorKind::MissingComponent,
                                format!("unknown type '{}' for element '{}'", type_name, name),
                            )
                            .with_component(name.clone()),
                        )?;
                        ElementType::AnyType
                    }
                },
                Err(e) => {
                    ctx.parse_error(
                        &mut errors,
                        SchemaError::new(ErrorKind::MissingComponent, e.to_string()),
                    )?;
                    ElementType::AnyType
                }
            }
        }
        (None, Some(inline), None) => {
            let inner = xsd_simple_type_factory(ctx, &inline, schema, false, None)?;
            ElementType::Simple(Box::new(inner))
        }
        (None, None, Some(inline)) => {
            let inner = xsd_complex_type_factory(ctx, &inline, schema, false, None)?;
            ElementType::Complex(Box::new(inner))
        }
        (None, None, None) => ElementType::AnyType,
    };

    // Identity constraints
    let mut identities = Vec::new();
    for child in elem.xsd_children() {
        let Some(category) = child.xsd_name().and_then(IdentityCategory::from_tag) else {
            continue;
        };
        let child = child.clone();
        let identity = xsd_identity_factory(ctx, &child, schema, category)?;
        if !identity.name.local_name.is_empty() {
            if ctx.constraints.contains_key(&identity.name) {
                ctx.parse_error(
                    &mut errors,
                    SchemaError::new(
                        ErrorKind::AmbiguousDeclaration,
                        format!("duplicate identity constraint '{}'", identity.name),
                    )
                    .with_component(identity.name.clone()),
                )?;
            } else {
                ctx.constraints
                    .insert(identity.name.clone(), identity.clone());
            }
        }
        identities.push(identity);
    }

    Ok(XsdElement {
        name,
        type_,
        occurs,
        qualified,
        nillable,
        abstract_,
        default,
        fixed,
        is_ref: false,
        substitution_group,
        identities,
        block,
        final_,
        annotation: parse_annotation(elem),
        schema,
        global,
        errors,
    })
}
