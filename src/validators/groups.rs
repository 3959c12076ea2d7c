//! Model group components
//!
//! `xs:sequence`, `xs:choice` and `xs:all` compositors, their particles
//! and the factory for global `xs:group` definitions. A `GroupRef`
//! particle wraps a global group by name and is resolved lazily against
//! the maps, which is what makes legal self-referential groups buildable.

use std::fmt;
use std::sync::Arc;

use crate::documents::Element;
use crate::error::{ErrorKind, Result, SchemaError};
use crate::namespaces::QName;

use super::base::{
    parse_annotation, BuildContext, SchemaComponent, SchemaId, XsdAnnotation, XsdVersion,
};
use super::elements::{xsd_element_factory, XsdElement};
use super::global_maps::lookup_group_exists;
use super::particles::{parse_occurs, Occurs};
use super::wildcards::XsdAnyElement;

/// Model group compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelType {
    /// Ordered content
    #[default]
    Sequence,
    /// One alternative
    Choice,
    /// Unordered content
    All,
}

impl ModelType {
    /// Map an XSD element local name to a compositor
    pub fn from_tag(local: &str) -> Option<Self> {
        match local {
            "sequence" => Some(ModelType::Sequence),
            "choice" => Some(ModelType::Choice),
            "all" => Some(ModelType::All),
            _ => None,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::Sequence => write!(f, "sequence"),
            ModelType::Choice => write!(f, "choice"),
            ModelType::All => write!(f, "all"),
        }
    }
}

/// A particle inside a model group
#[derive(Debug, Clone, PartialEq)]
pub enum GroupParticle {
    /// An element declaration or reference
    Element(Box<XsdElement>),
    /// An `xs:any` wildcard
    Any(XsdAnyElement),
    /// A nested inline model group
    Group(Box<XsdGroup>),
    /// A reference to a global group, resolved lazily
    GroupRef {
        /// The referenced group name
        name: QName,
        /// Occurrence bounds taken from the reference site
        occurs: Occurs,
    },
}

impl GroupParticle {
    /// Occurrence bounds of this particle
    pub fn occurs(&self) -> Occurs {
        match self {
            GroupParticle::Element(e) => e.occurs,
            GroupParticle::Any(a) => a.occurs,
            GroupParticle::Group(g) => g.occurs,
            GroupParticle::GroupRef { occurs, .. } => *occurs,
        }
    }

    /// True when the particle may match nothing
    ///
    /// Group references are judged by their bounds only; the referent is
    /// not resolved here.
    pub fn is_emptiable(&self) -> bool {
        match self {
            GroupParticle::Element(e) => e.occurs.is_emptiable(),
            GroupParticle::Any(a) => a.occurs.is_emptiable(),
            GroupParticle::Group(g) => g.is_emptiable(),
            GroupParticle::GroupRef { occurs, .. } => occurs.is_emptiable(),
        }
    }
}

/// An XSD model group
#[derive(Debug, Clone, PartialEq)]
pub struct XsdGroup {
    /// Group name; `None` for the anonymous groups of content models
    pub name: Option<QName>,
    /// Compositor
    pub model: ModelType,
    /// Particles in declaration order
    pub particles: Vec<GroupParticle>,
    /// Occurrence bounds
    pub occurs: Occurs,
    /// Leading annotation
    pub annotation: Option<XsdAnnotation>,
    /// Owning schema document
    pub schema: SchemaId,
    /// True for global definitions
    pub global: bool,
    /// Pre-redefinition snapshot
    pub redefine: Option<Box<XsdGroup>>,
    /// Build errors
    pub errors: Vec<SchemaError>,
}

impl XsdGroup {
    /// An empty `sequence`, the content of empty and attribute-only types
    pub fn empty_sequence(schema: SchemaId) -> Self {
        Self {
            name: None,
            model: ModelType::Sequence,
            particles: Vec::new(),
            occurs: Occurs::once(),
            annotation: None,
            schema,
            global: false,
            redefine: None,
            errors: Vec::new(),
        }
    }

    /// True when the group has no particles
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// True when the group can match no content at all
    pub fn is_emptiable(&self) -> bool {
        if self.occurs.is_emptiable() {
            return true;
        }
        match self.model {
            ModelType::Choice => {
                self.particles.is_empty() || self.particles.iter().any(|p| p.is_emptiable())
            }
            _ => self.particles.iter().all(|p| p.is_emptiable()),
        }
    }

    /// Iterate the element particles directly inside this group tree,
    /// without resolving group references
    pub fn iter_elements(&self) -> impl Iterator<Item = &XsdElement> {
        let mut stack: Vec<&XsdGroup> = vec![self];
        let mut out = Vec::new();
        while let Some(group) = stack.pop() {
            for particle in &group.particles {
                match particle {
                    GroupParticle::Element(e) => out.push(e.as_ref()),
                    GroupParticle::Group(g) => stack.push(g),
                    _ => {}
                }
            }
        }
        out.into_iter()
    }

    /// True when any particle is a reference to the given group name
    pub fn references_group(&self, name: &QName) -> bool {
        self.particles.iter().any(|p| match p {
            GroupParticle::GroupRef { name: n, .. } => n == name,
            GroupParticle::Group(g) => g.references_group(name),
            _ => false,
        })
    }

    /// Collect this group's errors and those of nested particles
    pub fn collect_errors<'a>(&'a self, out: &mut Vec<&'a SchemaError>) {
        out.extend(self.errors.iter());
        for particle in &self.particles {
            match particle {
                GroupParticle::Element(e) => e.collect_errors(out),
                GroupParticle::Group(g) => g.collect_errors(out),
                _ => {}
            }
        }
    }
}

impl SchemaComponent for XsdGroup {
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

/// Parse a compositor element (`sequence`, `choice` or `all`) into a group
pub(crate) fn parse_model_group(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
    nested: bool,
) -> Result<XsdGroup> {
    let mut errors = Vec::new();

    let model = elem
        .xsd_name()
        .and_then(ModelType::from_tag)
        .unwrap_or_default();

    let occurs = match parse_occurs(elem) {
        Ok(occurs) => occurs,
        Err(e) => {
            ctx.parse_error(&mut errors, e)?;
            Occurs::once()
        }
    };

    if model == ModelType::All {
        if nested {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::AllGroupMisuse,
                    "an 'all' group cannot be nested inside another compositor",
                ),
            )?;
        }
        if ctx.version == XsdVersion::V10 && !occurs.is_single() {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::AllGroupMisuse,
                    "an 'all' group must have maxOccurs 1",
                ),
            )?;
        }
    }

    let mut particles = Vec::new();
    for child in elem.xsd_children() {
        let child = child.clone();
        match child.xsd_name() {
            Some("element") => {
                let element = xsd_element_factory(ctx, &child, schema, false, None)?;
                if model == ModelType::All
                    && ctx.version == XsdVersion::V10
                    && !matches!(element.occurs.max, Some(0) | Some(1))
                {
                    ctx.parse_error(
                        &mut errors,
                        SchemaError::new(
                            ErrorKind::AllGroupMisuse,
                            format!(
                                "element '{}' inside an 'all' group must have maxOccurs at most 1",
                                element.name
                            ),
                        ),
                    )?;
                }
                particles.push(GroupParticle::Element(Box::new(element)));
            }
            Some("any") => {
                if model == ModelType::All && ctx.version == XsdVersion::V10 {
                    ctx.parse_error(
                        &mut errors,
                        SchemaError::new(
                            ErrorKind::AllGroupMisuse,
                            "wildcards are not allowed inside an 'all' group in XSD 1.0",
                        ),
                    )?;
                    continue;
                }
                match XsdAnyElement::parse(&child, schema) {
                    Ok(any) => particles.push(GroupParticle::Any(any)),
                    Err(e) => ctx.parse_error(&mut errors, e)?,
                }
            }
            Some("sequence") | Some("choice") | Some("all") => {
                if model == ModelType::All && ctx.version == XsdVersion::V10 {
                    ctx.parse_error(
                        &mut errors,
                        SchemaError::new(
                            ErrorKind::AllGroupMisuse,
                            "only element particles are allowed inside an 'all' group in XSD 1.0",
                        ),
                    )?;
                    continue;
                }
                let inner = parse_model_group(ctx, &child, schema, true)?;
                particles.push(GroupParticle::Group(Box::new(inner)));
            }
            Some("group") => {
                let particle = parse_group_reference(ctx, &child, schema, &mut errors)?;
                if let Some(particle) = particle {
                    if model == ModelType::All && ctx.version == XsdVersion::V10 {
                        ctx.parse_error(
                            &mut errors,
                            SchemaError::new(
                                ErrorKind::AllGroupMisuse,
                                "group references are not allowed inside an 'all' group in XSD 1.0",
                            ),
                        )?;
                        continue;
                    }
                    particles.push(particle);
                }
            }
            Some(other) => {
                ctx.parse_error(
                    &mut errors,
                    SchemaError::new(
                        ErrorKind::ForbiddenChild,
                        format!("unexpected child '{}' in a {} group", other, model),
                    ),
                )?;
            }
            None => {}
        }
    }

    Ok(XsdGroup {
        name: None,
        model,
        particles,
        occurs,
        annotation: parse_annotation(elem),
        schema,
        global: false,
        redefine: None,
        errors,
    })
}

/// Parse an `xs:group ref=` use into a shallow particle
fn parse_group_reference(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
    errors: &mut Vec<SchemaError>,
) -> Result<Option<GroupParticle>> {
    let Some(ref_attr) = elem.get("ref") else {
        ctx.parse_error(
            errors,
            SchemaError::new(
                ErrorKind::MissingAttribute,
                "a group inside a content model requires a 'ref' attribute",
            ),
        )?;
        return Ok(None);
    };

    let occurs = match parse_occurs(elem) {
        Ok(occurs) => occurs,
        Err(e) => {
            ctx.parse_error(errors, e)?;
            Occurs::once()
        }
    };

    let fallback = ctx.schema(schema).qname_fallback();
    let name = match elem.resolve_qname(ref_attr, fallback.as_deref()) {
        Ok(name) => name,
        Err(e) => {
            ctx.parse_error(
                errors,
                SchemaError::new(ErrorKind::MissingComponent, e.to_string()),
            )?;
            return Ok(None);
        }
    };

    // Force the referent to build; a circular re-entry is legal here and
    // is judged later by the model checks
    lookup_group_exists(ctx, &name)?;

    Ok(Some(GroupParticle::GroupRef { name, occurs }))
}

/// Build a global `xs:group` definition
pub(crate) fn xsd_group_factory(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
    instance: Option<XsdGroup>,
) -> Result<XsdGroup> {
    let mut errors = Vec::new();

    let name = match elem.get("name") {
        Some(n) => Some(QName::new(
            ctx.schema(schema).target_namespace.clone(),
            n.trim(),
        )),
        None => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::MissingAttribute,
                    "global group requires a 'name' attribute",
                ),
            )?;
            None
        }
    };

    if elem.get("minOccurs").is_some() || elem.get("maxOccurs").is_some() {
        ctx.parse_error(
            &mut errors,
            SchemaError::new(
                ErrorKind::InvalidDeclaration,
                "occurrence bounds are not allowed on a global group definition",
            ),
        )?;
    }

    let compositor = elem
        .xsd_children()
        .find(|c| {
            c.xsd_name()
                .map(|t| ModelType::from_tag(t).is_some())
                .unwrap_or(false)
        })
        .cloned();

    let mut group = match compositor {
        Some(child) => parse_model_group(ctx, &child, schema, false)?,
        None => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::InvalidDeclaration,
                    "global group requires a sequence, choice or all child",
                ),
            )?;
            XsdGroup::empty_sequence(schema)
        }
    };

    if group.model == ModelType::All && !group.occurs.is_single() && ctx.version == XsdVersion::V10
    {
        ctx.parse_error(
            &mut errors,
            SchemaError::new(ErrorKind::AllGroupMisuse, "an 'all' group must have maxOccurs 1"),
        )?;
    }

    group.name = name;
    group.global = true;
    group.annotation = parse_annotation(elem).or(group.annotation.take());
    group.redefine = instance.map(Box::new);
    group.errors.extend(errors);
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_from_tag() {
        assert_eq!(ModelType::from_tag("sequence"), Some(ModelType::Sequence));
        assert_eq!(ModelType::from_tag("choice"), Some(ModelType::Choice));
        assert_eq!(ModelType::from_tag("all"), Some(ModelType::All));
        assert_eq!(ModelType::from_tag("element"), None);
    }

    #[test]
    fn test_empty_sequence_is_emptiable() {
        let group = XsdGroup::empty_sequence(0);
        assert!(group.is_empty());
        assert!(group.is_emptiable());
    }

    #[test]
    fn test_choice_emptiable_when_any_branch_is() {
        let mut group = XsdGroup::empty_sequence(0);
        group.model = ModelType::Choice;
        group.particles.push(GroupParticle::GroupRef {
            name: QName::local("g"),
            occurs: Occurs::once(),
        });
        group.particles.push(GroupParticle::GroupRef {
            name: QName::local("h"),
            occurs: Occurs::optional(),
        });
        assert!(group.is_emptiable());

        group.model = ModelType::Sequence;
        assert!(!group.is_emptiable());
    }

    #[test]
    fn test_references_group() {
        let mut inner = XsdGroup::empty_sequence(0);
        inner.particles.push(GroupParticle::GroupRef {
            name: QName::local("g"),
            occurs: Occurs::once(),
        });
        let mut outer = XsdGroup::empty_sequence(0);
        outer.particles.push(GroupParticle::Group(Box::new(inner)));

        assert!(outer.references_group(&QName::local("g")));
        assert!(!outer.references_group(&QName::local("other")));
    }
}
