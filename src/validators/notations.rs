//! Notation declarations

use std::sync::Arc;

use crate::documents::Element;
use crate::error::{ErrorKind, Result, SchemaError};
use crate::namespaces::QName;

use super::base::{parse_annotation, BuildContext, SchemaComponent, SchemaId, XsdAnnotation};

/// An `xs:notation` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct XsdNotation {
    /// Notation name
    pub name: QName,
    /// Public identifier
    pub public: Option<String>,
    /// System identifier
    pub system: Option<String>,
    /// Leading annotation
    pub annotation: Option<XsdAnnotation>,
    /// Owning schema document
    pub schema: SchemaId,
    /// Build errors
    pub errors: Vec<SchemaError>,
}

impl SchemaComponent for XsdNotation {
    fn name(&self) -> Option<&QName> {
        Some(&self.name)
    }

    fn schema(&self) -> SchemaId {
        self.schema
    }

    fn is_global(&self) -> bool {
        true // notations are always global
    }

    fn errors(&self) -> &[SchemaError] {
        &self.errors
    }
}

/// Build an `xs:notation` declaration
pub(crate) fn xsd_notation_factory(
    ctx: &mut BuildContext,
    elem: &Arc<Element>,
    schema: SchemaId,
) -> Result<XsdNotation> {
    let mut errors = Vec::new();

    let name = match elem.get("name") {
        Some(n) => QName::new(ctx.schema(schema).target_namespace.clone(), n.trim()),
        None => {
            ctx.parse_error(
                &mut errors,
                SchemaError::new(
                    ErrorKind::MissingAttribute,
                    "notation requires a 'name' attribute",
                ),
            )?;
            QName::local("")
        }
    };

    let public = elem.get("public").map(String::from);
    let system = elem.get("system").map(String::from);

    if public.is_none() && system.is_none() {
        ctx.parse_error(
            &mut errors,
            SchemaError::new(
                ErrorKind::MissingAttribute,
                format!("notation '{}' requires a 'public' or 'system' attribute", name),
            )
            .with_component(name.clone()),
        )?;
    }

    Ok(XsdNotation {
        name,
        public,
        system,
        annotation: parse_annotation(elem),
        schema,
        errors,
    })
}
