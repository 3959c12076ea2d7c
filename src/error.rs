//! Error types for xsd-compiler
//!
//! The public surface is the [`Error`] enum; schema build problems are
//! carried by [`SchemaError`], which components accumulate during
//! compilation instead of aborting (except in strict validation mode).

use std::fmt;
use thiserror::Error;

use crate::namespaces::QName;

/// Result type alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for schema compilation operations
#[derive(Error, Debug)]
pub enum Error {
    /// Schema build error (strict mode propagation)
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The global maps could not be fully built in strict mode
    #[error("schema not built: {0}")]
    NotBuilt(String),

    /// Invalid argument value
    #[error("value error: {0}")]
    Value(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Coarse error category, one per family of build failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed XSD source (missing attribute, forbidden child, ...)
    Structural,
    /// Unresolved or ill-kinded QName references
    Reference,
    /// Illegal restriction/extension or cyclic derivation
    Derivation,
    /// Content model problems (compositors, particles, depth)
    Model,
    /// Problems with `<redefine>` chains
    Redefinition,
    /// Substitution group problems
    Substitution,
    /// Facet problems on simple types
    Facet,
    /// Surfaced from the resource collaborator
    Resource,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Structural => "structural",
            ErrorCategory::Reference => "reference",
            ErrorCategory::Derivation => "derivation",
            ErrorCategory::Model => "model",
            ErrorCategory::Redefinition => "redefinition",
            ErrorCategory::Substitution => "substitution",
            ErrorCategory::Facet => "facet",
            ErrorCategory::Resource => "resource",
        };
        write!(f, "{}", s)
    }
}

/// Fine-grained error kind attached to every [`SchemaError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // Structural
    /// A required attribute is missing
    MissingAttribute,
    /// A child element is not allowed here
    ForbiddenChild,
    /// Two mutually exclusive declaration forms were both used
    AmbiguousDeclaration,
    /// A `<list>` has both an `itemType` attribute and a child type
    AmbiguousList,
    /// A `<union>` resolves to zero member types
    MissingUnionMembers,
    /// Declarations follow an `<anyAttribute>` wildcard
    AttributesAfterWildcard,
    /// `minOccurs`/`maxOccurs` are out of range or inverted
    InvalidOccurs,
    /// Any other malformed declaration
    InvalidDeclaration,

    // Reference
    /// A QName does not name any global component
    MissingComponent,
    /// A QName names a component of a different kind
    WrongKind,
    /// A reference to a component that is prohibited at this point
    ProhibitedReference,

    // Derivation
    /// A restriction violates the base type rules
    IllegalRestriction,
    /// An extension violates the base type rules
    IllegalExtension,
    /// The base type has the wrong variety for this derivation
    BaseTypeMismatch,
    /// A type is (transitively) its own base
    CircularDerivation,

    // Model
    /// Derived and base compositors are incompatible
    CompositorMismatch,
    /// An `all` group breaks the version's constraints
    AllGroupMisuse,
    /// A particle is not a legal restriction of its base particle
    ParticleRestriction,
    /// The content model walk exceeded the configured depth
    ModelDepthExceeded,
    /// Group-internal inconsistency (cycles, ambiguous particles)
    ModelError,

    // Redefinition
    /// Two redefining documents supply the same QName
    MultipleRedefinition,
    /// The redefinition origin chain contains a cycle
    CircularRedefinition,
    /// A redefined group is not a restriction of the original
    RedefineNotRestriction,
    /// A `<redefine>` child names a component its origin never declared
    NotARedefinition,

    // Substitution
    /// A substitution group head occurs among its own substitutes
    SubstitutionCycle,
    /// A substitute's type is incompatible with its head's type
    IncompatibleSubstitution,

    // Facet
    /// A non-accumulating facet kind appears more than once
    DuplicateFacet,
    /// The facet kind is not applicable to the base type
    FacetNotAllowed,
    /// The facet value is incompatible with the base (or fixed there)
    InvalidFacetValue,

    // Resource
    /// The resource collaborator could not reach a location
    UnreachableLocation,
    /// The fetched document is not well-formed XML
    UnparsableXml,
}

impl ErrorKind {
    /// The category this kind belongs to
    pub fn category(&self) -> ErrorCategory {
        use ErrorKind::*;
        match self {
            MissingAttribute | ForbiddenChild | AmbiguousDeclaration | AmbiguousList
            | MissingUnionMembers | AttributesAfterWildcard | InvalidOccurs
            | InvalidDeclaration => ErrorCategory::Structural,
            MissingComponent | WrongKind | ProhibitedReference => ErrorCategory::Reference,
            IllegalRestriction | IllegalExtension | BaseTypeMismatch | CircularDerivation => {
                ErrorCategory::Derivation
            }
            CompositorMismatch | AllGroupMisuse | ParticleRestriction | ModelDepthExceeded
            | ModelError => ErrorCategory::Model,
            MultipleRedefinition | CircularRedefinition | RedefineNotRestriction
            | NotARedefinition => ErrorCategory::Redefinition,
            SubstitutionCycle | IncompatibleSubstitution => ErrorCategory::Substitution,
            DuplicateFacet | FacetNotAllowed | InvalidFacetValue => ErrorCategory::Facet,
            UnreachableLocation | UnparsableXml => ErrorCategory::Resource,
        }
    }
}

/// A schema build error, attached to the component that raised it
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    /// Fine-grained error kind
    pub kind: ErrorKind,
    /// Error message
    pub message: String,
    /// Name of the component the error belongs to, when known
    pub component: Option<QName>,
    /// Location of the schema document that raised the error
    pub location: Option<String>,
}

impl SchemaError {
    /// Create a new schema error
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            component: None,
            location: None,
        }
    }

    /// Set the component name
    pub fn with_component(mut self, name: QName) -> Self {
        self.component = Some(name);
        self
    }

    /// Set the source location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// The category of this error
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category(), self.message)?;
        if let Some(ref name) = self.component {
            write!(f, " (component {})", name)?;
        }
        if let Some(ref loc) = self.location {
            write!(f, " (in {})", loc)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_categories() {
        assert_eq!(ErrorKind::MissingComponent.category(), ErrorCategory::Reference);
        assert_eq!(ErrorKind::WrongKind.category(), ErrorCategory::Reference);
        assert_eq!(ErrorKind::DuplicateFacet.category(), ErrorCategory::Facet);
        assert_eq!(ErrorKind::CircularRedefinition.category(), ErrorCategory::Redefinition);
        assert_eq!(ErrorKind::AllGroupMisuse.category(), ErrorCategory::Model);
        assert_eq!(ErrorKind::InvalidOccurs.category(), ErrorCategory::Structural);
    }

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::new(ErrorKind::MissingComponent, "missing type 'tns:T'")
            .with_component(QName::namespaced("http://example.com", "T"))
            .with_location("a.xsd");

        let msg = err.to_string();
        assert!(msg.contains("[reference]"));
        assert!(msg.contains("missing type"));
        assert!(msg.contains("{http://example.com}T"));
        assert!(msg.contains("a.xsd"));
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = SchemaError::new(ErrorKind::ModelError, "bad model").into();
        assert!(matches!(err, Error::Schema(_)));
    }
}
