//! Attribute and attribute group components
//!
//! Attribute declarations resolve their simple type by reference or inline
//! child; attribute groups are expanded by inclusion, keep declaration
//! order, and admit at most one trailing wildcard.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::documents::Element;
use crate::error::{ErrorKind, Result, SchemaError};
use crate::namespaces::QName;

use super::base::{
    parse_annotation, BuildContext, Form, SchemaComponent, SchemaId, XsdAnnotation,
};
use super::global_maps::{
    lookup_attribute_clone, lookup_attribute_group_clone, lookup_type_clone, RefLookup, TypeLookup,
};
use super::simple_types::XsdSimpleType;
use super::wildcards::XsdAnyAttribute;

/// Attribute use within a complex type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUse {
    /// The attribute may appear
    #[default]
    Optional,
    /// The attribute must appear
    Required,
    /// The attribute must not appear
    Prohibited,
}

impl AttributeUse {
    fn from_str(s: &str) -> std::result::Result<Self, SchemaError> {
        match s {
            "optional" => Ok(AttributeUse::Optional),
            "required" => Ok(AttributeUse::Required),
            "prohibited" => Ok(AttributeUse::Prohibited),
            _ => Err(SchemaError::new(
                ErrorKind::InvalidDeclaration,
                format!("invalid use value '{}'", s),
            )),
        }
    }

    /// True when this use is a legal restriction of `base`
    pub fn restricts(&self, base: &AttributeUse) -> bool {
        match base {
            AttributeUse::Required => *self == AttributeUse::Required,
            AttributeUse::Optional => true,
            AttributeUse::Prohibited => *self == AttributeUse::Prohibited,
        }
    }
}

/// The type of an attribute declaration
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    /// A global simple type, by name (resolved lazily against the maps)
    Named(QName),
    /// An inline anonymous simple type
    Inline(Box<XsdSimpleType>),
    /// `xs:anySimpleType`, the default for empty declarations
    AnySimpleType,
}

impl AttributeType {
    /// The referenced type name, for named types
    pub fn type_name(&self) -> Option<&QName> {
        match self {
            AttributeType::Named(name) => Some(name),
            _ => None,
        }
    }
}

/// An XSD attribute declaration or reference
#[derive(Debug, Clone, PartialEq)]
pub struct XsdAttribute {
    /// Attribute name (for references, the referenced name)
    pub name: QName,
    /// The attribute's simple type
    pub type_: AttributeType,
    /// Use at the declaration site
    pub use_: AttributeUse,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
    /// True when the name is namespace-qualified
    pub qualified: bool,
    /// True for `ref=` uses of a global attribute
    pub is_ref: bool,
    /// Leading annotation
    pub annotation: Option<XsdAnnotation>,
    /// Owning schema document
    pub schema: SchemaId,
    /// True for global declarations
    pub global: bool,
    /// Build errors
    pub errors: Vec<SchemaError>,
}

impl SchemaComponent for XsdAttribute {
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

/// Build an `xs:attribute` declaration or reference
pub(crate) fn xsd_attribute_factory(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
    global: bool,
    instance: Option<XsdAttribute>,
) -> Result<XsdAttribute> {
    let mut errors = Vec::new();
    let _ = instance; // attributes are not redefinable

    let use_ = match elem.get("use") {
        Some(v) if global => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::InvalidDeclaration,
                    format!("'use={}' is not allowed on a global attribute", v),
                ),
            )?;
            AttributeUse::Optional
        }
        Some(v) => match AttributeUse::from_str(v) {
            Ok(u) => u,
            Err(e) => {
                ctx.parse_error(&mut errors, e)?;
                AttributeUse::Optional
            }
        },
        None => AttributeUse::Optional,
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
    if default.is_some() && use_ != AttributeUse::Optional {
        ctx.parse_error(
            &mut errors,
            SchemaError::new(
                ErrorKind::InvalidDeclaration,
                "an attribute with a default value must be optional",
            ),
        )?;
    }

    // Reference form
    if let Some(ref_attr) = elem.get("ref") {
        if global {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::InvalidDeclaration,
                    "a global attribute cannot be a reference",
                ),
            )?;
        }
        for forbidden in ["name", "type", "form"] {
            if elem.get(forbidden).is_some() {
                ctx.parse_error(
                    &mut errors,
                    SchemaError::new(
                        ErrorKind::AmbiguousDeclaration,
                        format!("attribute reference cannot carry '{}'", forbidden),
                    ),
                )?;
            }
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

        let (type_, qualified) = match lookup_attribute_clone(ctx, &ref_name)? {
            RefLookup::Found(target) => (target.type_.clone(), target.qualified),
            RefLookup::Circular => (AttributeType::Named(ref_name.clone()), true),
            RefLookup::Missing => {
                ctx.parse_error(
                    &mut errors,
                    SchemaError::new(
                        ErrorKind::MissingComponent,
                        format!("unknown attribute reference '{}'", ref_name),
                    )
                    .with_component(ref_name.clone()),
                )?;
                (AttributeType::AnySimpleType, true)
            }
        };

        return Ok(XsdAttribute {
            name: ref_name,
            type_,
            use_,
            default,
            fixed,
            qualified,
            is_ref: true,
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
                    "attribute declaration requires a 'name' attribute",
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
            None => ctx.schema(schema).attribute_form_default == Form::Qualified,
        }
    };

    let name = if qualified {
        QName::new(ctx.schema(schema).target_namespace.clone(), local_name)
    } else {
        QName::local(local_name)
    };

    let inline_type = elem.children_by_xsd_tag("simpleType").next().cloned();
    let type_ = match (elem.get("type"), inline_type) {
        (Some(_), Some(_)) => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::AmbiguousDeclaration,
                    "attribute has both a 'type' attribute and an inline simpleType",
                ),
            )?;
            AttributeType::AnySimpleType
        }
        (Some(type_attr), None) => {
            let fallback = ctx.schema(schema).qname_fallback();
            match elem.resolve_qname(type_attr, fallback.as_deref()) {
                Ok(type_name) => match lookup_type_clone(ctx, &type_name)? {
                    TypeLookup::Simple(_) | TypeLookup::Circular => AttributeType::Named(type_name),
                    TypeLookup::Complex(_) => {
                        ctx.parse_error(
                            &mut errors,
                            SchemaError::new(
                                ErrorKind::BaseTypeMismatch,
                                format!("attribute type '{}' is a complex type", type_name),
                            ),
                        )?;
                        AttributeType::AnySimpleType
                    }
                    TypeLookup::Missing => {
                        ctx.parse_error(
                            &mut errors,
                            SchemaError::new(
                                ErrorKind::MissingComponent,
                                format!("unknown attribute type '{}'", type_name),
                            )
                            .with_component(name.clone()),
                        )?;
                        AttributeType::AnySimpleType
                    }
                },
                Err(e) => {
                    ctx.parse_error(
                        &mut errors,
                        SchemaError::new(ErrorKind::MissingComponent, e.to_string()),
                    )?;
                    AttributeType::AnySimpleType
                }
            }
        }
        (None, Some(inline)) => {
            let inline_type =
                super::simple_types::xsd_simple_type_factory(ctx, &inline, schema, false, None)?;
            AttributeType::Inline(Box::new(inline_type))
        }
        (None, None) => AttributeType::AnySimpleType,
    };

    Ok(XsdAttribute {
        name,
        type_,
        use_,
        default,
        fixed,
        qualified,
        is_ref: false,
        annotation: parse_annotation(elem),
        schema,
        global,
        errors,
    })
}

/// An XSD attribute group: named attributes plus an optional wildcard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XsdAttributeGroup {
    /// Group name; `None` for the anonymous attribute set of a complex type
    pub name: Option<QName>,
    /// Attributes by name, in declaration order
    pub attributes: IndexMap<QName, XsdAttribute>,
    /// At most one trailing `anyAttribute` wildcard
    pub wildcard: Option<XsdAnyAttribute>,
    /// Leading annotation
    pub annotation: Option<XsdAnnotation>,
    /// Owning schema document
    pub schema: SchemaId,
    /// True for global declarations
    pub global: bool,
    /// Pre-redefinition snapshot
    pub redefine: Option<Box<XsdAttributeGroup>>,
    /// Build errors
    pub errors: Vec<SchemaError>,
}

impl XsdAttributeGroup {
    /// Number of named attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// True when no attribute and no wildcard is present
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.wildcard.is_none()
    }

    /// The attribute with the given name
    pub fn get(&self, name: &QName) -> Option<&XsdAttribute> {
        self.attributes.get(name)
    }

    /// Merge the base type's attributes for derivation by extension
    ///
    /// The extension may only add attributes the base does not declare.
    pub fn extend_from_base(&mut self, base: &XsdAttributeGroup) -> Vec<SchemaError> {
        let mut errors = Vec::new();
        for (name, attr) in &base.attributes {
            if self.attributes.contains_key(name) {
                errors.push(
                    SchemaError::new(
                        ErrorKind::IllegalExtension,
                        format!("extension re-declares attribute '{}' of the base type", name),
                    )
                    .with_component(name.clone()),
                );
            } else {
                self.attributes.insert(name.clone(), attr.clone());
            }
        }
        if self.wildcard.is_none() {
            self.wildcard = base.wildcard.clone();
        }
        errors
    }

    /// Merge against the base type's attributes for derivation by restriction
    ///
    /// Locals may narrow `use` or prohibit base attributes; declaring an
    /// attribute the base does not have (and no base wildcard admits) is
    /// illegal. Prohibited attributes are removed from the result.
    pub fn restrict_from_base(
        &mut self,
        base: &XsdAttributeGroup,
        target_namespace: Option<&str>,
    ) -> Vec<SchemaError> {
        let mut errors = Vec::new();
        let mut merged = base.attributes.clone();

        for (name, local) in std::mem::take(&mut self.attributes) {
            match merged.get(&name) {
                Some(base_attr) => {
                    if !local.use_.restricts(&base_attr.use_) {
                        errors.push(
                            SchemaError::new(
                                ErrorKind::IllegalRestriction,
                                format!(
                                    "attribute '{}' cannot change use from '{:?}' in a restriction",
                                    name, base_attr.use_
                                ),
                            )
                            .with_component(name.clone()),
                        );
                    }
                    if local.use_ == AttributeUse::Prohibited {
                        merged.shift_remove(&name);
                    } else {
                        merged.insert(name, local);
                    }
                }
                None => {
                    let admitted = base
                        .wildcard
                        .as_ref()
                        .map(|w| w.namespace.admits(name.namespace(), target_namespace))
                        .unwrap_or(false);
                    if admitted {
                        merged.insert(name, local);
                    } else {
                        errors.push(
                            SchemaError::new(
                                ErrorKind::IllegalRestriction,
                                format!("restriction declares attribute '{}' absent from the base type", name),
                            )
                            .with_component(name.clone()),
                        );
                    }
                }
            }
        }

        self.attributes = merged;
        if self.wildcard.is_none() {
            self.wildcard = base.wildcard.clone();
        }
        errors
    }
}

impl SchemaComponent for XsdAttributeGroup {
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

/// Parse attribute/attributeGroup/anyAttribute children into a group
///
/// Shared between the attribute group factory and the complex type factory
/// (which uses it for the trailing attribute declarations of a content
/// model).
pub(crate) fn parse_attribute_declarations(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
    group: &mut XsdAttributeGroup,
    errors: &mut Vec<SchemaError>,
) -> Result<()> {
    for child in elem.xsd_children() {
        let child = child.clone();
        if child.is_xsd("attribute") {
            if group.wildcard.is_some() {
                ctx.parse_error(
                    errors,
                    SchemaError::new(
                        ErrorKind::AttributesAfterWildcard,
                        "attribute declared after an anyAttribute wildcard",
                    ),
                )?;
                continue;
            }
            let attr = xsd_attribute_factory(ctx, &child, schema, false, None)?;
            if group.attributes.contains_key(&attr.name) {
                ctx.parse_error(
                    errors,
                    SchemaError::new(
                        ErrorKind::AmbiguousDeclaration,
                        format!("duplicate attribute '{}'", attr.name),
                    )
                    .with_component(attr.name.clone()),
                )?;
                continue;
            }
            group.attributes.insert(attr.name.clone(), attr);
        } else if child.is_xsd("attributeGroup") {
            if group.wildcard.is_some() {
                ctx.parse_error(
                    errors,
                    SchemaError::new(
                        ErrorKind::AttributesAfterWildcard,
                        "attributeGroup referenced after an anyAttribute wildcard",
                    ),
                )?;
                continue;
            }
            let Some(ref_attr) = child.get("ref") else {
                ctx.parse_error(
                    errors,
                    SchemaError::new(
                        ErrorKind::MissingAttribute,
                        "nested attributeGroup requires a 'ref' attribute",
                    ),
                )?;
                continue;
            };
            let fallback = ctx.schema(schema).qname_fallback();
            let ref_name = match child.resolve_qname(ref_attr, fallback.as_deref()) {
                Ok(name) => name,
                Err(e) => {
                    ctx.parse_error(
                        errors,
                        SchemaError::new(ErrorKind::MissingComponent, e.to_string()),
                    )?;
                    continue;
                }
            };
            match lookup_attribute_group_clone(ctx, &ref_name)? {
                RefLookup::Found(nested) => {
                    // Reference-by-inclusion: expand into this group
                    for (name, attr) in nested.attributes {
                        if group.attributes.contains_key(&name) {
                            ctx.parse_error(
                                errors,
                                SchemaError::new(
                                    ErrorKind::AmbiguousDeclaration,
                                    format!("duplicate attribute '{}' via group '{}'", name, ref_name),
                                )
                                .with_component(name.clone()),
                            )?;
                        } else {
                            group.attributes.insert(name, attr);
                        }
                    }
                    if let Some(wildcard) = nested.wildcard {
                        if group.wildcard.is_none() {
                            group.wildcard = Some(wildcard);
                        }
                    }
                }
                RefLookup::Circular => {
                    ctx.parse_error(
                        errors,
                        SchemaError::new(
                            ErrorKind::ProhibitedReference,
                            format!("circular attribute group reference '{}'", ref_name),
                        )
                        .with_component(ref_name.clone()),
                    )?;
                }
                RefLookup::Missing => {
                    ctx.parse_error(
                        errors,
                        SchemaError::new(
                            ErrorKind::MissingComponent,
                            format!("unknown attribute group '{}'", ref_name),
                        )
                        .with_component(ref_name.clone()),
                    )?;
                }
            }
        } else if child.is_xsd("anyAttribute") {
            if group.wildcard.is_some() {
                ctx.parse_error(
                    errors,
                    SchemaError::new(
                        ErrorKind::AttributesAfterWildcard,
                        "more than one anyAttribute wildcard",
                    ),
                )?;
                continue;
            }
            match XsdAnyAttribute::parse(&child, schema) {
                Ok(wildcard) => group.wildcard = Some(wildcard),
                Err(e) => ctx.parse_error(errors, e)?,
            }
        }
    }
    Ok(())
}

/// Build an `xs:attributeGroup` definition
pub(crate) fn xsd_attribute_group_factory(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
    global: bool,
    instance: Option<XsdAttributeGroup>,
) -> Result<XsdAttributeGroup> {
    let mut errors = Vec::new();

    let name = match elem.get("name") {
        Some(n) => Some(QName::new(
            ctx.schema(schema).target_namespace.clone(),
            n.trim(),
        )),
        None if global => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::MissingAttribute,
                    "global attributeGroup requires a 'name' attribute",
                ),
            )?;
            None
        }
        None => None,
    };

    let mut group = XsdAttributeGroup {
        name,
        attributes: IndexMap::new(),
        wildcard: None,
        annotation: parse_annotation(elem),
        schema,
        global,
        redefine: instance.map(Box::new),
        errors: Vec::new(),
    };

    parse_attribute_declarations(ctx, elem, schema, &mut group, &mut errors)?;
    group.errors = errors;
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_restriction_ordering() {
        use AttributeUse::*;
        assert!(Required.restricts(&Optional));
        assert!(Required.restricts(&Required));
        assert!(Prohibited.restricts(&Optional));
        assert!(!Optional.restricts(&Required));
        assert!(!Optional.restricts(&Prohibited));
    }

    fn attr(name: &str, use_: AttributeUse) -> XsdAttribute {
        XsdAttribute {
            name: QName::local(name),
            type_: AttributeType::AnySimpleType,
            use_,
            default: None,
            fixed: None,
            qualified: false,
            is_ref: false,
            annotation: None,
            schema: 0,
            global: false,
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_extension_merges_base_attributes() {
        let mut base = XsdAttributeGroup::default();
        base.attributes
            .insert(QName::local("a"), attr("a", AttributeUse::Required));

        let mut derived = XsdAttributeGroup::default();
        derived
            .attributes
            .insert(QName::local("b"), attr("b", AttributeUse::Optional));

        let errors = derived.extend_from_base(&base);
        assert!(errors.is_empty());
        assert_eq!(derived.len(), 2);
        assert!(derived.get(&QName::local("a")).is_some());
    }

    #[test]
    fn test_extension_conflict_is_illegal() {
        let mut base = XsdAttributeGroup::default();
        base.attributes
            .insert(QName::local("a"), attr("a", AttributeUse::Optional));

        let mut derived = XsdAttributeGroup::default();
        derived
            .attributes
            .insert(QName::local("a"), attr("a", AttributeUse::Required));

        let errors = derived.extend_from_base(&base);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::IllegalExtension);
    }

    #[test]
    fn test_restriction_narrows_and_prohibits() {
        let mut base = XsdAttributeGroup::default();
        base.attributes
            .insert(QName::local("a"), attr("a", AttributeUse::Optional));
        base.attributes
            .insert(QName::local("b"), attr("b", AttributeUse::Optional));

        let mut derived = XsdAttributeGroup::default();
        derived
            .attributes
            .insert(QName::local("a"), attr("a", AttributeUse::Required));
        derived
            .attributes
            .insert(QName::local("b"), attr("b", AttributeUse::Prohibited));

        let errors = derived.restrict_from_base(&base, None);
        assert!(errors.is_empty());
        assert_eq!(derived.get(&QName::local("a")).unwrap().use_, AttributeUse::Required);
        assert!(derived.get(&QName::local("b")).is_none());
    }

    #[test]
    fn test_restriction_cannot_invent_attributes() {
        let base = XsdAttributeGroup::default();
        let mut derived = XsdAttributeGroup::default();
        derived
            .attributes
            .insert(QName::local("new"), attr("new", AttributeUse::Optional));

        let errors = derived.restrict_from_base(&base, None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::IllegalRestriction);
    }
}
