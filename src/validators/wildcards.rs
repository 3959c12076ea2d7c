//! Wildcard components
//!
//! `xs:any` and `xs:anyAttribute` admit element/attribute names by
//! namespace constraint rather than by declaration.

use crate::documents::Element;
use crate::error::{ErrorKind, SchemaError};
use crate::namespaces::QName;

use super::base::SchemaId;
use super::particles::{parse_occurs, Occurs};

/// How wildcard-matched content is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessContents {
    /// A declaration must be found and validated against
    #[default]
    Strict,
    /// Validate when a declaration can be found
    Lax,
    /// No validation
    Skip,
}

impl ProcessContents {
    fn from_str(s: &str) -> Result<Self, SchemaError> {
        match s {
            "strict" => Ok(ProcessContents::Strict),
            "lax" => Ok(ProcessContents::Lax),
            "skip" => Ok(ProcessContents::Skip),
            _ => Err(SchemaError::new(
                ErrorKind::InvalidDeclaration,
                format!("invalid processContents value '{}'", s),
            )),
        }
    }
}

/// A single item of an explicit namespace list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceItem {
    /// `##targetNamespace`
    TargetNamespace,
    /// `##local`
    Local,
    /// A literal namespace URI
    Uri(String),
}

/// The namespace constraint of a wildcard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamespaceConstraint {
    /// `##any`: any namespace
    #[default]
    Any,
    /// `##other`: any namespace other than the target namespace
    Other,
    /// An explicit list of admitted namespaces
    Items(Vec<NamespaceItem>),
}

impl NamespaceConstraint {
    /// Parse the `namespace` attribute value
    pub fn from_str(s: &str) -> Self {
        match s.trim() {
            "##any" => NamespaceConstraint::Any,
            "##other" => NamespaceConstraint::Other,
            list => {
                let items = list
                    .split_whitespace()
                    .map(|item| match item {
                        "##targetNamespace" => NamespaceItem::TargetNamespace,
                        "##local" => NamespaceItem::Local,
                        uri => NamespaceItem::Uri(uri.to_string()),
                    })
                    .collect();
                NamespaceConstraint::Items(items)
            }
        }
    }

    /// True when a name in `namespace` is admitted, given the wildcard's
    /// own target namespace
    pub fn admits(&self, namespace: Option<&str>, target: Option<&str>) -> bool {
        match self {
            NamespaceConstraint::Any => true,
            NamespaceConstraint::Other => namespace.is_some() && namespace != target,
            NamespaceConstraint::Items(items) => items.iter().any(|item| match item {
                NamespaceItem::TargetNamespace => namespace == target,
                NamespaceItem::Local => namespace.is_none(),
                NamespaceItem::Uri(uri) => namespace == Some(uri.as_str()),
            }),
        }
    }

    /// True when every name this constraint admits is admitted by `other`
    ///
    /// Conservative: explicit lists are compared item-wise; `Any` is only
    /// a subset of `Any`.
    pub fn is_subset(&self, other: &NamespaceConstraint) -> bool {
        match (self, other) {
            (_, NamespaceConstraint::Any) => true,
            (NamespaceConstraint::Any, _) => false,
            (NamespaceConstraint::Other, NamespaceConstraint::Other) => true,
            (NamespaceConstraint::Items(items), NamespaceConstraint::Items(base)) => {
                items.iter().all(|i| base.contains(i))
            }
            (NamespaceConstraint::Items(items), NamespaceConstraint::Other) => {
                // A list is inside ##other when it names neither ##local
                // nor the target namespace
                !items.iter().any(|i| {
                    matches!(i, NamespaceItem::Local | NamespaceItem::TargetNamespace)
                })
            }
            (NamespaceConstraint::Other, NamespaceConstraint::Items(_)) => false,
        }
    }
}

/// An `xs:any` element wildcard particle
#[derive(Debug, Clone, PartialEq)]
pub struct XsdAnyElement {
    /// Namespace constraint
    pub namespace: NamespaceConstraint,
    /// Validation strategy for matched elements
    pub process_contents: ProcessContents,
    /// Occurrence bounds
    pub occurs: Occurs,
    /// Owning schema
    pub schema: SchemaId,
}

impl XsdAnyElement {
    /// Parse an `xs:any` particle
    pub fn parse(elem: &Element, schema: SchemaId) -> Result<Self, SchemaError> {
        Ok(Self {
            namespace: elem
                .get("namespace")
                .map(NamespaceConstraint::from_str)
                .unwrap_or_default(),
            process_contents: elem
                .get("processContents")
                .map(ProcessContents::from_str)
                .transpose()?
                .unwrap_or_default(),
            occurs: parse_occurs(elem)?,
            schema,
        })
    }

    /// True when the wildcard admits an element with this name
    pub fn admits(&self, name: &QName, target: Option<&str>) -> bool {
        self.namespace.admits(name.namespace(), target)
    }
}

/// An `xs:anyAttribute` wildcard
#[derive(Debug, Clone, PartialEq)]
pub struct XsdAnyAttribute {
    /// Namespace constraint
    pub namespace: NamespaceConstraint,
    /// Validation strategy for matched attributes
    pub process_contents: ProcessContents,
    /// Owning schema
    pub schema: SchemaId,
}

impl XsdAnyAttribute {
    /// Parse an `xs:anyAttribute` declaration
    pub fn parse(elem: &Element, schema: SchemaId) -> Result<Self, SchemaError> {
        Ok(Self {
            namespace: elem
                .get("namespace")
                .map(NamespaceConstraint::from_str)
                .unwrap_or_default(),
            process_contents: elem
                .get("processContents")
                .map(ProcessContents::from_str)
                .transpose()?
                .unwrap_or_default(),
            schema,
        })
    }
}
