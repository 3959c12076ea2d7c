//! Base infrastructure for schema components
//!
//! Validation modes, validity states, the common component contract and
//! the context threaded through every factory during a build.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::documents::Element;
use crate::error::{Error, Result, SchemaError};
use crate::limits::Limits;
use crate::namespaces::QName;

use super::global_maps::GlobalMaps;
use super::identities::XsdIdentity;
use super::schemas::XsdSchema;

/// Index of a schema document registered with a coordinator
pub type SchemaId = usize;

/// XSD language version selected at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XsdVersion {
    /// XSD 1.0
    #[default]
    V10,
    /// XSD 1.1
    V11,
}

impl XsdVersion {
    /// Version pragma as written in schema documents
    pub fn as_str(&self) -> &'static str {
        match self {
            XsdVersion::V10 => "1.0",
            XsdVersion::V11 => "1.1",
        }
    }
}

impl fmt::Display for XsdVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validation mode governing error propagation during a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// First error aborts the pipeline
    #[default]
    Strict,
    /// Errors accumulate on components; fallbacks substitute failures
    Lax,
    /// Errors are suppressed
    Skip,
}

impl ValidationMode {
    /// Parse a mode from its string form
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(ValidationMode::Strict),
            "lax" => Ok(ValidationMode::Lax),
            "skip" => Ok(ValidationMode::Skip),
            _ => Err(Error::Value(format!(
                "invalid validation mode '{}', must be 'strict', 'lax' or 'skip'",
                s
            ))),
        }
    }

    /// The mode as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Lax => "lax",
            ValidationMode::Skip => "skip",
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How much of a build was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationAttempted {
    /// Everything was built
    Full,
    /// Some components were built
    Partial,
    /// Nothing was built
    None,
}

/// Validity of a built artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Built with no errors
    Valid,
    /// Built with errors
    Invalid,
    /// Not built, or errors were suppressed
    NotKnown,
}

/// Common contract of every schema component
pub trait SchemaComponent {
    /// Component name; `None` for anonymous/local components
    fn name(&self) -> Option<&QName>;

    /// The schema document the component was declared in
    fn schema(&self) -> SchemaId;

    /// True when the component is a global declaration
    fn is_global(&self) -> bool;

    /// Build errors attached to this component
    fn errors(&self) -> &[SchemaError];

    /// True when any build error is attached
    fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    /// Component validity from its attached errors
    fn validity(&self) -> Validity {
        if self.has_errors() {
            Validity::Invalid
        } else {
            Validity::Valid
        }
    }
}

/// Form of local element/attribute names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Form {
    /// Local names are in no namespace
    #[default]
    Unqualified,
    /// Local names are in the target namespace
    Qualified,
}

impl Form {
    /// Parse a form from its attribute value
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "qualified" => Ok(Form::Qualified),
            "unqualified" => Ok(Form::Unqualified),
            _ => Err(Error::Value(format!(
                "invalid form value '{}', must be 'qualified' or 'unqualified'",
                s
            ))),
        }
    }
}

/// Set of derivation methods, as used by `final` and `block` attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivationSet {
    /// Derivation by extension is blocked/final
    pub extension: bool,
    /// Derivation by restriction is blocked/final
    pub restriction: bool,
    /// Substitution is blocked (elements only)
    pub substitution: bool,
}

impl DerivationSet {
    /// Parse a whitespace-separated derivation set (`#all` selects all)
    pub fn from_str(s: &str) -> Result<Self> {
        let mut set = DerivationSet::default();
        let trimmed = s.trim();
        if trimmed == "#all" {
            return Ok(DerivationSet {
                extension: true,
                restriction: true,
                substitution: true,
            });
        }
        for word in trimmed.split_whitespace() {
            match word {
                "extension" => set.extension = true,
                "restriction" => set.restriction = true,
                "substitution" => set.substitution = true,
                "list" | "union" => {} // simple type finals, accepted and ignored
                _ => {
                    return Err(Error::Value(format!(
                        "invalid derivation control '{}'",
                        word
                    )))
                }
            }
        }
        Ok(set)
    }

    /// True when no method is selected
    pub fn is_empty(&self) -> bool {
        !self.extension && !self.restriction && !self.substitution
    }
}

/// Derivation method of a derived type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationMethod {
    /// Derivation by restriction
    Restriction,
    /// Derivation by extension
    Extension,
}

impl fmt::Display for DerivationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivationMethod::Restriction => write!(f, "restriction"),
            DerivationMethod::Extension => write!(f, "extension"),
        }
    }
}

/// Annotation content captured from `xs:annotation`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XsdAnnotation {
    /// `xs:documentation` texts, in order
    pub documentation: Vec<String>,
    /// `xs:appinfo` texts, in order
    pub appinfo: Vec<String>,
}

/// Parse the leading `xs:annotation` child of a declaration, if present
pub fn parse_annotation(elem: &Element) -> Option<XsdAnnotation> {
    let ann = elem.children.iter().find(|c| c.is_xsd("annotation"))?;
    let mut out = XsdAnnotation::default();
    for child in &ann.children {
        if child.is_xsd("documentation") {
            out.documentation.push(child.text.clone().unwrap_or_default());
        } else if child.is_xsd("appinfo") {
            out.appinfo.push(child.text.clone().unwrap_or_default());
        }
    }
    Some(out)
}

/// A not-yet-built global declaration: source node plus owning schema
#[derive(Debug, Clone)]
pub struct SourceRef {
    /// The declaration element
    pub elem: Arc<Element>,
    /// The schema document that declared it
    pub schema: SchemaId,
}

/// Context threaded through all factories during a build
///
/// Only the coordinator constructs one; factories mutate the maps solely
/// through the lookup functions in `global_maps`.
pub(crate) struct BuildContext<'a> {
    /// The global component maps under construction
    pub maps: &'a mut GlobalMaps,
    /// All registered schema documents, by `SchemaId`
    pub schemas: &'a [XsdSchema],
    /// Substitution group heads to member element names
    pub substitution_groups: &'a mut IndexMap<QName, Vec<QName>>,
    /// Identity constraints by name
    pub constraints: &'a mut IndexMap<QName, XsdIdentity>,
    /// Validation mode for error propagation
    pub validation: ValidationMode,
    /// Selected XSD version
    pub version: XsdVersion,
    /// Compilation limits
    pub limits: &'a Limits,
    /// Coordinator-level errors (wrong-kind entries, loader problems)
    pub errors: &'a mut Vec<SchemaError>,
}

impl BuildContext<'_> {
    /// The schema document with the given id
    pub fn schema(&self, id: SchemaId) -> &XsdSchema {
        &self.schemas[id]
    }

    /// Record a build error according to the validation mode
    ///
    /// In strict mode the error is returned and aborts the pipeline; in
    /// lax mode it is pushed onto `errors`; in skip mode it is dropped.
    pub fn parse_error(&self, errors: &mut Vec<SchemaError>, err: SchemaError) -> Result<()> {
        match self.validation {
            ValidationMode::Strict => Err(err.into()),
            ValidationMode::Lax => {
                errors.push(err);
                Ok(())
            }
            ValidationMode::Skip => Ok(()),
        }
    }

    /// Record a coordinator-level error according to the validation mode
    pub fn global_error(&mut self, err: SchemaError) -> Result<()> {
        match self.validation {
            ValidationMode::Strict => Err(err.into()),
            ValidationMode::Lax => {
                self.errors.push(err);
                Ok(())
            }
            ValidationMode::Skip => Ok(()),
        }
    }
}
