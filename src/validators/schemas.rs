//! Schema document objects
//!
//! An [`XsdSchema`] is one parsed XSD source document: the root node, the
//! target namespace and form defaults, the prefix map in scope at the
//! root, and the resolved `include`/`import` relations. Directive walking
//! (fetching included and imported documents) is driven by the
//! coordinator, which owns the schema collection.

use std::sync::Arc;

use indexmap::IndexMap;
use url::Url;

use crate::documents::Element;
use crate::error::{Error, Result, SchemaError};
use crate::namespaces::{NamespaceMap, XSD_NAMESPACE};

use super::base::{Form, SchemaId, ValidationAttempted, Validity};

/// One XSD schema document registered with a coordinator
#[derive(Debug, Clone)]
pub struct XsdSchema {
    /// Index of this schema in the coordinator
    pub id: SchemaId,
    /// Root `xs:schema` element
    pub root: Arc<Element>,
    /// Effective target namespace (adopted from the includer for
    /// chameleon documents)
    pub target_namespace: Option<String>,
    /// Target namespace as written in the document
    pub declared_namespace: Option<String>,
    /// `elementFormDefault`
    pub element_form_default: Form,
    /// `attributeFormDefault`
    pub attribute_form_default: Form,
    /// `blockDefault`, applied when declarations carry no `block`
    pub block_default: Option<String>,
    /// `finalDefault`, applied when declarations carry no `final`
    pub final_default: Option<String>,
    /// The `version` pragma of the document, when present
    pub version: Option<String>,
    /// The location this document was fetched under
    pub location: Option<String>,
    /// Base URL for resolving nested locations
    pub base_url: Option<Url>,
    /// Included and redefined/overridden documents by location
    pub includes: IndexMap<String, SchemaId>,
    /// Imported documents by namespace (empty key for no namespace);
    /// `None` when the import carried no resolvable location
    pub imports: IndexMap<String, Option<SchemaId>>,
    /// True once the loader has collected this document's declarations
    pub loaded: bool,
    /// Schema-level build errors
    pub errors: Vec<SchemaError>,
    /// Schema-level warnings
    pub warnings: Vec<String>,
}

impl XsdSchema {
    /// Parse the document-level attributes of a schema root
    ///
    /// `chameleon_namespace` carries the including schema's namespace when
    /// this document is included without a target namespace of its own.
    pub(crate) fn parse(
        root: Arc<Element>,
        id: SchemaId,
        location: Option<String>,
        base_url: Option<Url>,
        chameleon_namespace: Option<String>,
    ) -> Result<Self> {
        if !root.is_xsd("schema") {
            return Err(Error::Xml(format!(
                "the document root is '{}', expected '{{{}}}schema'",
                root.tag, XSD_NAMESPACE
            )));
        }

        let declared_namespace = root
            .get("targetNamespace")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        // Chameleon inclusion: adopt the including document's namespace
        let target_namespace = declared_namespace.clone().or(chameleon_namespace);

        let element_form_default = root
            .get("elementFormDefault")
            .and_then(|v| Form::from_str(v).ok())
            .unwrap_or_default();
        let attribute_form_default = root
            .get("attributeFormDefault")
            .and_then(|v| Form::from_str(v).ok())
            .unwrap_or_default();

        let block_default = root.get("blockDefault").map(String::from);
        let final_default = root.get("finalDefault").map(String::from);
        let version = root.get("version").map(String::from);

        Ok(Self {
            id,
            root,
            target_namespace,
            declared_namespace,
            element_form_default,
            attribute_form_default,
            block_default,
            final_default,
            version,
            location,
            base_url,
            includes: IndexMap::new(),
            imports: IndexMap::new(),
            loaded: false,
            errors: Vec::new(),
            warnings: Vec::new(),
        })
    }

    /// True for documents that adopted the including schema's namespace
    pub fn is_chameleon(&self) -> bool {
        self.declared_namespace.is_none() && self.target_namespace.is_some()
    }

    /// The namespace unprefixed QName values fall back to in this document
    ///
    /// In a chameleon document unqualified references resolve into the
    /// adopted namespace; everywhere else they stay unqualified unless a
    /// default namespace is in scope (which the element's own map wins).
    pub fn qname_fallback(&self) -> Option<String> {
        if self.is_chameleon() {
            self.target_namespace.clone()
        } else {
            None
        }
    }

    /// The prefix map in scope at the schema root
    pub fn namespaces(&self) -> &NamespaceMap {
        &self.root.namespaces
    }

    /// How much of this document was built
    pub fn validation_attempted(&self) -> ValidationAttempted {
        if self.loaded {
            ValidationAttempted::Full
        } else {
            ValidationAttempted::None
        }
    }

    /// Validity of this document from its attached errors
    pub fn validity(&self) -> Validity {
        if !self.loaded {
            Validity::NotKnown
        } else if self.errors.is_empty() {
            Validity::Valid
        } else {
            Validity::Invalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;

    fn parse(source: &str, chameleon: Option<&str>) -> Result<XsdSchema> {
        let doc = Document::parse(source)?;
        XsdSchema::parse(doc.root, 0, None, None, chameleon.map(String::from))
    }

    #[test]
    fn test_parse_schema_root() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                          targetNamespace="urn:test"
                          elementFormDefault="qualified"/>"#,
            None,
        )
        .unwrap();

        assert_eq!(schema.target_namespace.as_deref(), Some("urn:test"));
        assert_eq!(schema.element_form_default, Form::Qualified);
        assert_eq!(schema.attribute_form_default, Form::Unqualified);
        assert!(!schema.is_chameleon());
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        assert!(parse(r#"<not-a-schema/>"#, None).is_err());
    }

    #[test]
    fn test_chameleon_adoption() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#,
            Some("urn:host"),
        )
        .unwrap();

        assert!(schema.is_chameleon());
        assert_eq!(schema.target_namespace.as_deref(), Some("urn:host"));
        assert_eq!(schema.declared_namespace, None);
        assert_eq!(schema.qname_fallback().as_deref(), Some("urn:host"));
    }

    #[test]
    fn test_empty_target_namespace_is_none() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace=""/>"#,
            None,
        )
        .unwrap();
        assert_eq!(schema.target_namespace, None);
    }
}
