//! # xsd-compiler
//!
//! An XML Schema (XSD 1.0 and XSD 1.1) compiler: it parses XSD documents,
//! resolves their cross-references and produces a validator-ready
//! component graph.
//!
//! The compiler orchestrates multi-document inclusion, import,
//! redefinition and override (with chameleon-namespace rules), resolves
//! qualified-name references across documents with forward references and
//! substitution groups, detects and breaks cycles in type derivation and
//! group composition, seeds the XSD built-in simple types with their
//! facet lattices, and enforces derivation legality.
//!
//! Instance validation, resource transport policy and XPath evaluation
//! are consumed through interfaces and are not part of this crate.
//!
//! ## Example
//!
//! ```rust
//! use xsd_compiler::{ComponentKind, QName, ValidationMode, XsdGlobals, XsdVersion};
//! use xsd_compiler::resources::DenyAllLoader;
//!
//! let mut globals = XsdGlobals::new(XsdVersion::V10, ValidationMode::Strict);
//! globals.add_schema(
//!     r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
//!                   targetNamespace="urn:example">
//!          <xs:element name="title" type="xs:string"/>
//!        </xs:schema>"#,
//!     &DenyAllLoader,
//! )?;
//! globals.build()?;
//!
//! let title = globals.lookup(
//!     ComponentKind::Element,
//!     &QName::namespaced("urn:example", "title"),
//! )?;
//! assert_eq!(title.name().unwrap().local_name, "title");
//! # Ok::<(), xsd_compiler::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;

pub mod names;
pub mod namespaces;

pub mod documents;
pub mod resources;

pub mod validators;

pub use error::{Error, ErrorCategory, ErrorKind, Result, SchemaError};
pub use limits::Limits;
pub use namespaces::{QName, XSD_NAMESPACE};
pub use validators::{
    ComponentKind, ComponentRef, ValidationMode, Validity, XsdGlobals, XsdSchema, XsdVersion,
};

/// Version of the xsd-compiler library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
