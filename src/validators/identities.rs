//! Identity constraint components
//!
//! `xs:unique`, `xs:key` and `xs:keyref` declared inside elements. The
//! selector and field XPath expressions are carried as text; evaluation
//! belongs to the instance validator. A keyref's `refer` is recorded
//! unresolved and checked after the global build.

use std::sync::Arc;

use crate::documents::Element;
use crate::error::{ErrorKind, Result, SchemaError};
use crate::namespaces::QName;

use super::base::{parse_annotation, BuildContext, SchemaComponent, SchemaId, XsdAnnotation};

/// The category of an identity constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityCategory {
    /// Selected values must be unique when present
    Unique,
    /// Selected values must be unique and present
    Key,
    /// Selected values must match a referred key
    Keyref,
}

impl IdentityCategory {
    /// Map an XSD element local name to a category
    pub fn from_tag(local: &str) -> Option<Self> {
        match local {
            "unique" => Some(IdentityCategory::Unique),
            "key" => Some(IdentityCategory::Key),
            "keyref" => Some(IdentityCategory::Keyref),
            _ => None,
        }
    }
}

/// An identity constraint declaration
#[derive(Debug, Clone, PartialEq)]
pub struct XsdIdentity {
    /// Constraint category
    pub category: IdentityCategory,
    /// Constraint name
    pub name: QName,
    /// The selector XPath expression
    pub selector: String,
    /// The field XPath expressions, in order
    pub fields: Vec<String>,
    /// For keyrefs, the referred key/unique constraint
    pub refer: Option<QName>,
    /// Leading annotation
    pub annotation: Option<XsdAnnotation>,
    /// Owning schema document
    pub schema: SchemaId,
    /// Build errors
    pub errors: Vec<SchemaError>,
}

impl SchemaComponent for XsdIdentity {
    fn name(&self) -> Option<&QName> {
        Some(&self.name)
    }

    fn schema(&self) -> SchemaId {
        self.schema
    }

    fn is_global(&self) -> bool {
        false // owned by the declaring element
    }

    fn errors(&self) -> &[SchemaError] {
        &self.errors
    }
}

/// Build an identity constraint from its declaration element
pub(crate) fn xsd_identity_factory(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
    category: IdentityCategory,
) -> Result<XsdIdentity> {
    let mut errors = Vec::new();

    let name = match elem.get("name") {
        Some(n) => QName::new(ctx.schema(schema).target_namespace.clone(), n.trim()),
        None => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::MissingAttribute,
                    "identity constraint requires a 'name' attribute",
                ),
            )?;
            QName::local("")
        }
    };

    let selector = match elem.children_by_xsd_tag("selector").next() {
        Some(sel) => match sel.get("xpath") {
            Some(xpath) => xpath.to_string(),
            None => {
                ctx.parse_error(
                    &mut errors,
                    SchemaError::new(
                        ErrorKind::MissingAttribute,
                        format!("selector of '{}' requires an 'xpath' attribute", name),
                    )
                    .with_component(name.clone()),
                )?;
                String::new()
            }
        },
        None => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::InvalidDeclaration,
                    format!("identity constraint '{}' requires a selector child", name),
                )
                .with_component(name.clone()),
            )?;
            String::new()
        }
    };

    let fields: Vec<String> = elem
        .children_by_xsd_tag("field")
        .filter_map(|f| f.get("xpath").map(String::from))
        .collect();
    if fields.is_empty() {
        ctx.parse_error(
            &mut errors,
            SchemaError::new(
                ErrorKind::InvalidDeclaration,
                format!("identity constraint '{}' requires at least one field", name),
            )
            .with_component(name.clone()),
        )?;
    }

    let refer = match (category, elem.get("refer")) {
        (IdentityCategory::Keyref, Some(refer_attr)) => {
            let fallback = ctx.schema(schema).qname_fallback();
            match elem.resolve_qname(refer_attr, fallback.as_deref()) {
                Ok(refer) => Some(refer),
                Err(e) => {
                    ctx.parse_error(
                        &mut errors,
                        SchemaError::new(ErrorKind::MissingComponent, e.to_string()),
                    )?;
                    None
                }
            }
        }
        (IdentityCategory::Keyref, None) => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::MissingAttribute,
                    format!("keyref '{}' requires a 'refer' attribute", name),
                )
                .with_component(name.clone()),
            )?;
            None
        }
        (_, Some(_)) => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::InvalidDeclaration,
                    format!("'refer' is only allowed on a keyref, not on '{}'", name),
                )
                .with_component(name.clone()),
            )?;
            None
        }
        (_, None) => None,
    };

    Ok(XsdIdentity {
        category,
        name,
        selector,
        fields,
        refer,
        annotation: parse_annotation(elem),
        schema,
        errors,
    })
}
