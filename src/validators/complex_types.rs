//! Complex type components
//!
//! A complex type couples a content type (a model group, or a simple type
//! for simple content) with an attribute group and an optional derivation
//! from a base type. The factory handles the four content forms: empty,
//! direct model group, `simpleContent` and `complexContent`.

use std::sync::Arc;

use crate::documents::Element;
use crate::error::{ErrorKind, Result, SchemaError};
use crate::namespaces::QName;

use super::attributes::{parse_attribute_declarations, XsdAttributeGroup};
use super::base::{
    parse_annotation, BuildContext, DerivationMethod, DerivationSet, SchemaComponent, SchemaId,
    XsdAnnotation, XsdVersion,
};
use super::facets::FacetSet;
use super::global_maps::{lookup_type_clone, TypeLookup};
use super::groups::{parse_model_group, GroupParticle, ModelType, XsdGroup};
use super::particles::{parse_occurs, Occurs};
use super::simple_types::{SimpleTypeKind, XsdSimpleType};
use super::wildcards::XsdAnyElement;

/// The content type of a complex type
#[derive(Debug, Clone, PartialEq)]
pub enum ContentType {
    /// Element content described by a model group
    Group(XsdGroup),
    /// Simple content described by a simple type
    Simple(XsdSimpleType),
}

/// XSD 1.1 open content mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenContentMode {
    /// Wildcard content may interleave with the model
    Interleave,
    /// Wildcard content may follow the model
    Suffix,
    /// Open content is switched off
    None,
}

/// XSD 1.1 `xs:openContent`
#[derive(Debug, Clone, PartialEq)]
pub struct XsdOpenContent {
    /// Open content mode
    pub mode: OpenContentMode,
    /// The wildcard admitted by the open content
    pub wildcard: Option<XsdAnyElement>,
}

/// An XSD 1.1 assertion; the XPath test is carried, not evaluated
#[derive(Debug, Clone, PartialEq)]
pub struct XsdAssert {
    /// The `test` XPath expression
    pub test: String,
    /// Owning schema document
    pub schema: SchemaId,
    /// Build errors
    pub errors: Vec<SchemaError>,
}

/// A global type: simple or complex
///
/// Both kinds share the `types` store of the global maps, exactly as both
/// `xs:simpleType` and `xs:complexType` share one symbol space.
#[derive(Debug, Clone, PartialEq)]
pub enum XsdType {
    /// A simple type
    Simple(XsdSimpleType),
    /// A complex type
    Complex(XsdComplexType),
}

impl XsdType {
    /// The type name
    pub fn name(&self) -> Option<&QName> {
        match self {
            XsdType::Simple(t) => t.name.as_ref(),
            XsdType::Complex(t) => t.name.as_ref(),
        }
    }

    /// True for simple types
    pub fn is_simple(&self) -> bool {
        matches!(self, XsdType::Simple(_))
    }

    /// True for complex types
    pub fn is_complex(&self) -> bool {
        matches!(self, XsdType::Complex(_))
    }

    /// As a simple type
    pub fn as_simple(&self) -> Option<&XsdSimpleType> {
        match self {
            XsdType::Simple(t) => Some(t),
            XsdType::Complex(_) => None,
        }
    }

    /// As a complex type
    pub fn as_complex(&self) -> Option<&XsdComplexType> {
        match self {
            XsdType::Simple(_) => None,
            XsdType::Complex(t) => Some(t),
        }
    }

    /// The direct base type name, when derived
    pub fn base_type_name(&self) -> Option<&QName> {
        match self {
            XsdType::Simple(t) => t.base_type().and_then(|b| b.name.as_ref()),
            XsdType::Complex(t) => t.base_type.as_ref(),
        }
    }

    /// Collect the type's errors and those of nested components
    pub fn collect_errors<'a>(&'a self, out: &mut Vec<&'a SchemaError>) {
        match self {
            XsdType::Simple(t) => t.collect_errors(out),
            XsdType::Complex(t) => t.collect_errors(out),
        }
    }
}

impl SchemaComponent for XsdType {
    fn name(&self) -> Option<&QName> {
        XsdType::name(self)
    }

    fn schema(&self) -> SchemaId {
        match self {
            XsdType::Simple(t) => t.schema,
            XsdType::Complex(t) => t.schema,
        }
    }

    fn is_global(&self) -> bool {
        match self {
            XsdType::Simple(t) => t.global,
            XsdType::Complex(t) => t.global,
        }
    }

    fn errors(&self) -> &[SchemaError] {
        match self {
            XsdType::Simple(t) => &t.errors,
            XsdType::Complex(t) => &t.errors,
        }
    }
}

/// An XSD complex type definition
#[derive(Debug, Clone, PartialEq)]
pub struct XsdComplexType {
    /// Type name; `None` for anonymous local types
    pub name: Option<QName>,
    /// Content type: model group or simple content
    pub content: ContentType,
    /// Attribute declarations, including inherited ones
    pub attributes: XsdAttributeGroup,
    /// Derivation method, when derived
    pub derivation: Option<DerivationMethod>,
    /// Base type name, when derived
    pub base_type: Option<QName>,
    /// `mixed` flag
    pub mixed: bool,
    /// `abstract` flag
    pub abstract_: bool,
    /// Blocked further derivations
    pub final_: DerivationSet,
    /// Blocked derivations at use sites
    pub block: DerivationSet,
    /// XSD 1.1 open content
    pub open_content: Option<XsdOpenContent>,
    /// XSD 1.1 assertions
    pub assertions: Vec<XsdAssert>,
    /// Leading annotation
    pub annotation: Option<XsdAnnotation>,
    /// Owning schema document
    pub schema: SchemaId,
    /// True for global declarations
    pub global: bool,
    /// Pre-redefinition snapshot
    pub redefine: Option<Box<XsdComplexType>>,
    /// Build errors
    pub errors: Vec<SchemaError>,
}

impl XsdComplexType {
    /// The `xs:anyType` fallback: anything, with any attributes
    pub fn any_type(schema: SchemaId) -> Self {
        let mut content = XsdGroup::empty_sequence(schema);
        content.particles.push(GroupParticle::Any(XsdAnyElement {
            namespace: Default::default(),
            process_contents: super::wildcards::ProcessContents::Lax,
            occurs: Occurs::zero_or_more(),
            schema,
        }));

        let mut attributes = XsdAttributeGroup::default();
        attributes.wildcard = Some(super::wildcards::XsdAnyAttribute {
            namespace: Default::default(),
            process_contents: super::wildcards::ProcessContents::Lax,
            schema,
        });

        Self {
            name: Some(QName::xsd("anyType")),
            content: ContentType::Group(content),
            attributes,
            derivation: None,
            base_type: None,
            mixed: true,
            abstract_: false,
            final_: DerivationSet::default(),
            block: DerivationSet::default(),
            open_content: None,
            assertions: Vec::new(),
            annotation: None,
            schema,
            global: true,
            redefine: None,
            errors: Vec::new(),
        }
    }

    /// The simple content type, when content is simple
    pub fn simple_content(&self) -> Option<&XsdSimpleType> {
        match &self.content {
            ContentType::Simple(t) => Some(t),
            ContentType::Group(_) => None,
        }
    }

    /// The content model group, when content is element content
    pub fn content_group(&self) -> Option<&XsdGroup> {
        match &self.content {
            ContentType::Group(g) => Some(g),
            ContentType::Simple(_) => None,
        }
    }

    /// True when the content admits no elements
    pub fn is_empty(&self) -> bool {
        match &self.content {
            ContentType::Group(g) => g.is_empty(),
            ContentType::Simple(_) => false,
        }
    }

    /// Collect the type's errors and those of nested components
    pub fn collect_errors<'a>(&'a self, out: &mut Vec<&'a SchemaError>) {
        out.extend(self.errors.iter());
        match &self.content {
            ContentType::Group(g) => g.collect_errors(out),
            ContentType::Simple(t) => t.collect_errors(out),
        }
        out.extend(self.attributes.errors.iter());
        for attr in self.attributes.attributes.values() {
            out.extend(attr.errors.iter());
        }
        for assertion in &self.assertions {
            out.extend(assertion.errors.iter());
        }
    }
}

impl SchemaComponent for XsdComplexType {
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

/// Build an `xs:complexType` declaration
pub(crate) fn xsd_complex_type_factory(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
    global: bool,
    instance: Option<XsdComplexType>,
) -> Result<XsdComplexType> {
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
                        "global complexType requires a 'name' attribute",
                    ),
                )?;
                None
            }
        }
    } else {
        None
    };

    let mixed = elem.bool_attribute("mixed", false).unwrap_or(false);
    let abstract_ = elem.bool_attribute("abstract", false).unwrap_or(false);
    let final_ = match elem.get("final").or(ctx.schema(schema).final_default.as_deref()) {
        Some(v) => DerivationSet::from_str(v).unwrap_or_default(),
        None => DerivationSet::default(),
    };
    let block = match elem.get("block").or(ctx.schema(schema).block_default.as_deref()) {
        Some(v) => DerivationSet::from_str(v).unwrap_or_default(),
        None => DerivationSet::default(),
    };

    let mut complex_type = XsdComplexType {
        name: name.clone(),
        content: ContentType::Group(XsdGroup::empty_sequence(schema)),
        attributes: XsdAttributeGroup::default(),
        derivation: None,
        base_type: None,
        mixed,
        abstract_,
        final_,
        block,
        open_content: None,
        assertions: Vec::new(),
        annotation: parse_annotation(elem),
        schema,
        global,
        redefine: instance.map(Box::new),
        errors: Vec::new(),
    };

    let first_content = elem.xsd_children().find(|c| {
        !matches!(
            c.xsd_name(),
            Some("attribute") | Some("attributeGroup") | Some("anyAttribute") | Some("assert")
                | Some("openContent")
        )
    });

    match first_content.map(|c| (c.clone(), c.xsd_name().unwrap_or("").to_string())) {
        Some((child, tag)) if tag == "simpleContent" => {
            parse_simple_content(ctx, &child, schema, &mut complex_type, &mut errors)?;
        }
        Some((child, tag)) if tag == "complexContent" => {
            parse_complex_content(ctx, &child, schema, &mut complex_type, &mut errors)?;
        }
        Some((child, tag)) if ModelType::from_tag(&tag).is_some() => {
            let group = parse_model_group(ctx, &child, schema, false)?;
            complex_type.content = ContentType::Group(group);
            parse_own_attributes(ctx, elem, schema, &mut complex_type, &mut errors)?;
        }
        Some((child, tag)) if tag == "group" => {
            let group = parse_group_ref_content(ctx, &child, schema, &mut errors)?;
            complex_type.content = ContentType::Group(group);
            parse_own_attributes(ctx, elem, schema, &mut complex_type, &mut errors)?;
        }
        Some((child, tag)) => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::ForbiddenChild,
                    format!("unexpected child '{}' in complexType", tag),
                ),
            )?;
            let _ = child;
            parse_own_attributes(ctx, elem, schema, &mut complex_type, &mut errors)?;
        }
        None => {
            // Empty or attribute-only content
            parse_own_attributes(ctx, elem, schema, &mut complex_type, &mut errors)?;
        }
    }

    parse_open_content_and_asserts(ctx, elem, schema, &mut complex_type, &mut errors)?;

    complex_type.errors = errors;
    Ok(complex_type)
}

/// Wrap an `xs:group ref=` content child into a content group
fn parse_group_ref_content(
    ctx: &mut BuildContext,
    child: &Arc<Element>,
    schema: SchemaId,
    errors: &mut Vec<SchemaError>,
) -> Result<XsdGroup> {
    let Some(ref_attr) = child.get("ref") else {
        ctx.parse_error(
            errors,
            SchemaError::new(
                ErrorKind::MissingAttribute,
                "a group content child requires a 'ref' attribute",
            ),
        )?;
        return Ok(XsdGroup::empty_sequence(schema));
    };

    let occurs = match parse_occurs(child) {
        Ok(occurs) => occurs,
        Err(e) => {
            ctx.parse_error(errors, e)?;
            Occurs::once()
        }
    };

    let fallback = ctx.schema(schema).qname_fallback();
    let name = match child.resolve_qname(ref_attr, fallback.as_deref()) {
        Ok(name) => name,
        Err(e) => {
            ctx.parse_error(
                errors,
                SchemaError::new(ErrorKind::MissingComponent, e.to_string()),
            )?;
            return Ok(XsdGroup::empty_sequence(schema));
        }
    };

    super::global_maps::lookup_group_exists(ctx, &name)?;

    let mut group = XsdGroup::empty_sequence(schema);
    group.particles.push(GroupParticle::GroupRef { name, occurs });
    Ok(group)
}

/// Parse the attribute declarations owned directly by the complexType
fn parse_own_attributes(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
    complex_type: &mut XsdComplexType,
    errors: &mut Vec<SchemaError>,
) -> Result<()> {
    let mut group = XsdAttributeGroup::default();
    group.schema = schema;
    parse_attribute_declarations(ctx, elem, schema, &mut group, errors)?;
    complex_type.attributes = group;
    Ok(())
}

/// Resolve the `base` attribute of a restriction/extension element
fn resolve_base_name(
    ctx: &mut BuildContext,
    derivation_elem: &Arc<Element>,
    schema: SchemaId,
    errors: &mut Vec<SchemaError>,
) -> Result<Option<QName>> {
    match derivation_elem.get("base") {
        Some(base_attr) => {
            let fallback = ctx.schema(schema).qname_fallback();
            match derivation_elem.resolve_qname(base_attr, fallback.as_deref()) {
                Ok(name) => Ok(Some(name)),
                Err(e) => {
                    ctx.parse_error(
                        errors,
                        SchemaError::new(ErrorKind::MissingComponent, e.to_string()),
                    )?;
                    Ok(None)
                }
            }
        }
        None => {
            ctx.parse_error(
                errors,
                SchemaError::new(
                    ErrorKind::MissingAttribute,
                    "derivation requires a 'base' attribute",
                ),
            )?;
            Ok(None)
        }
    }
}

fn parse_simple_content(
    ctx: &mut BuildContext,
    content_elem: &Arc<Element>,
    schema: SchemaId,
    complex_type: &mut XsdComplexType,
    errors: &mut Vec<SchemaError>,
) -> Result<()> {
    if complex_type.mixed {
        ctx.parse_error(
            errors,
            SchemaError::new(
                ErrorKind::InvalidDeclaration,
                "'mixed' is not allowed with simpleContent",
            ),
        )?;
        complex_type.mixed = false;
    }

    let derivation_elem = content_elem
        .xsd_children()
        .find(|c| matches!(c.xsd_name(), Some("restriction") | Some("extension")))
        .cloned();

    let Some(derivation_elem) = derivation_elem else {
        ctx.parse_error(
            errors,
            SchemaError::new(
                ErrorKind::InvalidDeclaration,
                "simpleContent requires a restriction or extension child",
            ),
        )?;
        return Ok(());
    };

    let method = if derivation_elem.is_xsd("extension") {
        DerivationMethod::Extension
    } else {
        DerivationMethod::Restriction
    };
    complex_type.derivation = Some(method);

    let base_name = resolve_base_name(ctx, &derivation_elem, schema, errors)?;
    complex_type.base_type = base_name.clone();

    // The base must be a simple type or a complex type with simple content
    let (base_simple, base_attributes) = match base_name {
        Some(ref base_name) => match lookup_type_clone(ctx, base_name)? {
            TypeLookup::Simple(simple) => (simple, None),
            TypeLookup::Complex(complex) => match complex.simple_content() {
                Some(content) => (content.clone(), Some(complex.attributes.clone())),
                None => {
                    ctx.parse_error(
                        errors,
                        SchemaError::new(
                            ErrorKind::BaseTypeMismatch,
                            format!(
                                "simpleContent base '{}' is a complex type without simple content",
                                base_name
                            ),
                        ),
                    )?;
                    (XsdSimpleType::any_simple_type(schema), None)
                }
            },
            TypeLookup::Circular => {
                ctx.parse_error(
                    errors,
                    SchemaError::new(
                        ErrorKind::CircularDerivation,
                        format!("circular derivation through base type '{}'", base_name),
                    ),
                )?;
                (XsdSimpleType::any_simple_type(schema), None)
            }
            TypeLookup::Missing => {
                ctx.parse_error(
                    errors,
                    SchemaError::new(
                        ErrorKind::MissingComponent,
                        format!("unknown base type '{}'", base_name),
                    ),
                )?;
                (XsdSimpleType::any_simple_type(schema), None)
            }
        },
        None => (XsdSimpleType::any_simple_type(schema), None),
    };

    let content = match method {
        DerivationMethod::Extension => base_simple,
        DerivationMethod::Restriction => {
            // An inline simpleType child narrows the effective base
            let effective_base = match derivation_elem.children_by_xsd_tag("simpleType").next() {
                Some(inline) => {
                    let inline = inline.clone();
                    super::simple_types::xsd_simple_type_factory(ctx, &inline, schema, false, None)?
                }
                None => base_simple,
            };

            let (mut facets, facet_errors) = FacetSet::parse(&derivation_elem);
            for err in facet_errors {
                ctx.parse_error(errors, err)?;
            }
            for err in facets.inherit(&effective_base.facets) {
                ctx.parse_error(errors, err)?;
            }

            XsdSimpleType {
                name: None,
                kind: SimpleTypeKind::Restriction {
                    base: Box::new(effective_base),
                },
                facets,
                final_: DerivationSet::default(),
                annotation: None,
                schema,
                global: false,
                builtin: false,
                redefine: None,
                errors: Vec::new(),
            }
        }
    };
    complex_type.content = ContentType::Simple(content);

    // Attributes declared on the derivation element, merged with the base's
    let mut own = XsdAttributeGroup::default();
    own.schema = schema;
    parse_attribute_declarations(ctx, &derivation_elem, schema, &mut own, errors)?;
    if let Some(base_attributes) = base_attributes {
        let target = ctx.schema(schema).target_namespace.clone();
        let merge_errors = match method {
            DerivationMethod::Extension => own.extend_from_base(&base_attributes),
            DerivationMethod::Restriction => {
                own.restrict_from_base(&base_attributes, target.as_deref())
            }
        };
        for err in merge_errors {
            ctx.parse_error(errors, err)?;
        }
    }
    complex_type.attributes = own;

    Ok(())
}

fn parse_complex_content(
    ctx: &mut BuildContext,
    content_elem: &Arc<Element>,
    schema: SchemaId,
    complex_type: &mut XsdComplexType,
    errors: &mut Vec<SchemaError>,
) -> Result<()> {
    if let Ok(true) = content_elem.bool_attribute("mixed", false) {
        complex_type.mixed = true;
    }

    let derivation_elem = content_elem
        .xsd_children()
        .find(|c| matches!(c.xsd_name(), Some("restriction") | Some("extension")))
        .cloned();

    let Some(derivation_elem) = derivation_elem else {
        ctx.parse_error(
            errors,
            SchemaError::new(
                ErrorKind::InvalidDeclaration,
                "complexContent requires a restriction or extension child",
            ),
        )?;
        return Ok(());
    };

    let method = if derivation_elem.is_xsd("extension") {
        DerivationMethod::Extension
    } else {
        DerivationMethod::Restriction
    };
    complex_type.derivation = Some(method);

    let base_name = resolve_base_name(ctx, &derivation_elem, schema, errors)?;
    complex_type.base_type = base_name.clone();

    let base = match base_name {
        Some(ref base_name) => match lookup_type_clone(ctx, base_name)? {
            TypeLookup::Complex(complex) => Some(complex),
            TypeLookup::Simple(_) => {
                ctx.parse_error(
                    errors,
                    SchemaError::new(
                        ErrorKind::BaseTypeMismatch,
                        format!("complexContent base '{}' is a simple type", base_name),
                    ),
                )?;
                None
            }
            TypeLookup::Circular => {
                let mut err = SchemaError::new(
                    ErrorKind::CircularDerivation,
                    format!("circular derivation through base type '{}'", base_name),
                );
                if let Some(name) = &complex_type.name {
                    err = err.with_component(name.clone());
                }
                ctx.parse_error(errors, err)?;
                // The anyType fallback keeps the build going in lax mode
                Some(XsdComplexType::any_type(schema))
            }
            TypeLookup::Missing => {
                ctx.parse_error(
                    errors,
                    SchemaError::new(
                        ErrorKind::MissingComponent,
                        format!("unknown base type '{}'", base_name),
                    ),
                )?;
                None
            }
        },
        None => None,
    };

    // The derived content model declared on the derivation element
    let derived_group = {
        let compositor = derivation_elem
            .xsd_children()
            .find(|c| {
                matches!(c.xsd_name(), Some("group"))
                    || c.xsd_name().map(|t| ModelType::from_tag(t).is_some()).unwrap_or(false)
            })
            .cloned();
        match compositor {
            Some(child) if child.is_xsd("group") => {
                Some(parse_group_ref_content(ctx, &child, schema, errors)?)
            }
            Some(child) => Some(parse_model_group(ctx, &child, schema, false)?),
            None => None,
        }
    };

    match method {
        DerivationMethod::Extension => {
            let base_content = base.as_ref().and_then(|b| b.content_group());

            if let Some(base_content) = base_content {
                if base_content.model == ModelType::All
                    && !base_content.is_empty()
                    && ctx.version == XsdVersion::V10
                {
                    ctx.parse_error(
                        errors,
                        SchemaError::new(
                            ErrorKind::IllegalExtension,
                            "XSD 1.0 does not allow extending a type with an 'all' content model",
                        ),
                    )?;
                }
            }
            if let Some(b) = base.as_ref() {
                if b.simple_content().is_some() {
                    ctx.parse_error(
                        errors,
                        SchemaError::new(
                            ErrorKind::BaseTypeMismatch,
                            "complexContent cannot extend a type with simple content",
                        ),
                    )?;
                }
            }

            // The derived content is the base content followed by the
            // extension's own group, wrapped in a sequence
            let content = match (base.as_ref().and_then(|b| b.content_group()), derived_group) {
                (Some(base_content), Some(derived)) if !base_content.is_empty() => {
                    let mut seq = XsdGroup::empty_sequence(schema);
                    seq.particles
                        .push(GroupParticle::Group(Box::new(base_content.clone())));
                    seq.particles.push(GroupParticle::Group(Box::new(derived)));
                    seq
                }
                (_, Some(derived)) => derived,
                (Some(base_content), None) => base_content.clone(),
                (None, None) => XsdGroup::empty_sequence(schema),
            };
            complex_type.content = ContentType::Group(content);

            if let Some(b) = base.as_ref() {
                complex_type.mixed |= b.mixed;
            }
        }
        DerivationMethod::Restriction => {
            complex_type.content =
                ContentType::Group(derived_group.unwrap_or_else(|| XsdGroup::empty_sequence(schema)));
            // Restriction legality against the base group is a post-build
            // check, once every global group is resolvable
        }
    }

    // Attributes declared on the derivation element, merged with the base's
    let mut own = XsdAttributeGroup::default();
    own.schema = schema;
    parse_attribute_declarations(ctx, &derivation_elem, schema, &mut own, errors)?;
    if let Some(base) = base.as_ref() {
        let target = ctx.schema(schema).target_namespace.clone();
        let merge_errors = match method {
            DerivationMethod::Extension => own.extend_from_base(&base.attributes),
            DerivationMethod::Restriction => {
                own.restrict_from_base(&base.attributes, target.as_deref())
            }
        };
        for err in merge_errors {
            ctx.parse_error(errors, err)?;
        }
    }
    complex_type.attributes = own;

    Ok(())
}

/// Parse 1.1 `openContent` and `assert` children; reject them under 1.0
fn parse_open_content_and_asserts(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
    complex_type: &mut XsdComplexType,
    errors: &mut Vec<SchemaError>,
) -> Result<()> {
    for child in elem.xsd_children() {
        let child = child.clone();
        match child.xsd_name() {
            Some("openContent") => {
                if ctx.version == XsdVersion::V10 {
                    ctx.parse_error(
                        errors,
                        SchemaError::new(
                            ErrorKind::ForbiddenChild,
                            "openContent requires XSD 1.1",
                        ),
                    )?;
                    continue;
                }
                let mode = match child.get("mode") {
                    Some("interleave") | None => OpenContentMode::Interleave,
                    Some("suffix") => OpenContentMode::Suffix,
                    Some("none") => OpenContentMode::None,
                    Some(other) => {
                        ctx.parse_error(
                            errors,
                            SchemaError::new(
                                ErrorKind::InvalidDeclaration,
                                format!("invalid openContent mode '{}'", other),
                            ),
                        )?;
                        OpenContentMode::Interleave
                    }
                };
                let wildcard = match child.children_by_xsd_tag("any").next() {
                    Some(any) => match XsdAnyElement::parse(any, schema) {
                        Ok(any) => Some(any),
                        Err(e) => {
                            ctx.parse_error(errors, e)?;
                            None
                        }
                    },
                    None => None,
                };
                complex_type.open_content = Some(XsdOpenContent { mode, wildcard });
            }
            Some("assert") => {
                if ctx.version == XsdVersion::V10 {
                    ctx.parse_error(
                        errors,
                        SchemaError::new(ErrorKind::ForbiddenChild, "assert requires XSD 1.1"),
                    )?;
                    continue;
                }
                let mut assert_errors = Vec::new();
                let test = child.get("test").unwrap_or("").to_string();
                if test.trim().is_empty() {
                    ctx.parse_error(
                        &mut assert_errors,
                        SchemaError::new(
                            ErrorKind::MissingAttribute,
                            "assert requires a non-empty 'test' attribute",
                        ),
                    )?;
                }
                complex_type.assertions.push(XsdAssert {
                    test,
                    schema,
                    errors: assert_errors,
                });
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_type_shape() {
        let any = XsdComplexType::any_type(0);
        assert_eq!(any.name.as_ref().unwrap(), &QName::xsd("anyType"));
        assert!(any.mixed);
        let group = any.content_group().unwrap();
        assert_eq!(group.model, ModelType::Sequence);
        assert_eq!(group.particles.len(), 1);
        assert!(matches!(group.particles[0], GroupParticle::Any(_)));
        assert!(any.attributes.wildcard.is_some());
    }

    #[test]
    fn test_xsd_type_accessors() {
        let complex = XsdType::Complex(XsdComplexType::any_type(0));
        assert!(complex.is_complex());
        assert!(!complex.is_simple());
        assert!(complex.as_complex().is_some());
        assert!(complex.as_simple().is_none());
        assert_eq!(complex.name().unwrap(), &QName::xsd("anyType"));
    }
}
