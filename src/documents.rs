//! XML document tree
//!
//! An owned element tree built once from source text and shared by the
//! compiler through `Arc` handles. The compiler only ever reads a node's
//! tag, attributes, ordered children, text and in-scope namespaces, so
//! the underlying parser stays confined to this module.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::namespaces::{NamespaceMap, QName, XSD_NAMESPACE};

/// A parsed XML document
#[derive(Debug, Clone)]
pub struct Document {
    /// Root element
    pub root: Arc<Element>,
}

impl Document {
    /// Parse a document from source text
    pub fn parse(xml: &str) -> Result<Document> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| Error::Xml(format!("malformed XML: {}", e)))?;
        let root = convert(doc.root_element());
        Ok(Document { root })
    }
}

/// An XML element node
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Expanded element name
    pub tag: QName,
    /// Attributes in document order, keyed by local name
    ///
    /// XSD's own attributes are unqualified; namespaced foreign attributes
    /// are stored under their extended name.
    pub attributes: IndexMap<String, String>,
    /// Child elements in document order
    pub children: Vec<Arc<Element>>,
    /// Concatenated text content, when non-whitespace
    pub text: Option<String>,
    /// In-scope namespace declarations (prefix -> URI, "" for default)
    pub namespaces: NamespaceMap,
}

fn convert(node: roxmltree::Node<'_, '_>) -> Arc<Element> {
    let tag = QName::new(node.tag_name().namespace(), node.tag_name().name());

    let mut attributes = IndexMap::new();
    for attr in node.attributes() {
        let key = match attr.namespace() {
            Some(ns) => format!("{{{}}}{}", ns, attr.name()),
            None => attr.name().to_string(),
        };
        attributes.insert(key, attr.value().to_string());
    }

    let mut namespaces = NamespaceMap::new();
    for ns in node.namespaces() {
        namespaces.insert(ns.name().unwrap_or(""), ns.uri());
    }

    let children: Vec<Arc<Element>> = node
        .children()
        .filter(|n| n.is_element())
        .map(convert)
        .collect();

    let text = node
        .children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>();
    let text = if text.trim().is_empty() { None } else { Some(text) };

    Arc::new(Element {
        tag,
        attributes,
        children,
        text,
        namespaces,
    })
}

impl Element {
    /// Attribute value by local name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// True when this element has the given tag in the XSD namespace
    pub fn is_xsd(&self, local: &str) -> bool {
        self.tag.namespace() == Some(XSD_NAMESPACE) && self.tag.local_name == local
    }

    /// Local tag name when the element is in the XSD namespace
    pub fn xsd_name(&self) -> Option<&str> {
        if self.tag.namespace() == Some(XSD_NAMESPACE) {
            Some(&self.tag.local_name)
        } else {
            None
        }
    }

    /// Iterate XSD children, skipping `annotation`
    pub fn xsd_children(&self) -> impl Iterator<Item = &Arc<Element>> {
        self.children
            .iter()
            .filter(|c| c.tag.namespace() == Some(XSD_NAMESPACE))
            .filter(|c| c.tag.local_name != "annotation")
    }

    /// First XSD child, skipping `annotation`
    pub fn first_xsd_child(&self) -> Option<&Arc<Element>> {
        self.xsd_children().next()
    }

    /// Iterate direct children with the given XSD tag
    pub fn children_by_xsd_tag<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Arc<Element>> {
        self.children.iter().filter(move |c| c.is_xsd(local))
    }

    /// Resolve a prefixed QName attribute value in this element's scope
    ///
    /// `fallback` supplies the namespace for unprefixed names when no
    /// default namespace is in scope (chameleon documents).
    pub fn resolve_qname(&self, value: &str, fallback: Option<&str>) -> Result<QName> {
        self.namespaces.resolve(value.trim(), fallback)
    }

    /// Parse a boolean attribute, defaulting when absent
    pub fn bool_attribute(&self, name: &str, default: bool) -> Result<bool> {
        match self.get(name) {
            None => Ok(default),
            Some("true") | Some("1") => Ok(true),
            Some("false") | Some("0") => Ok(false),
            Some(other) => Err(Error::Value(format!(
                "invalid boolean value '{}' for attribute '{}'",
                other, name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   xmlns:tns="urn:test" targetNamespace="urn:test">
            <xs:annotation><xs:documentation>doc</xs:documentation></xs:annotation>
            <xs:element name="a" type="xs:string"/>
            <xs:simpleType name="T">
                <xs:restriction base="xs:int"/>
            </xs:simpleType>
        </xs:schema>"#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert!(doc.root.is_xsd("schema"));
        assert_eq!(doc.root.get("targetNamespace"), Some("urn:test"));
        assert_eq!(doc.root.children.len(), 3);
    }

    #[test]
    fn test_malformed_document() {
        assert!(Document::parse("<a><b></a>").is_err());
    }

    #[test]
    fn test_xsd_children_skip_annotation() {
        let doc = Document::parse(SAMPLE).unwrap();
        let tags: Vec<_> = doc
            .root
            .xsd_children()
            .map(|c| c.tag.local_name.clone())
            .collect();
        assert_eq!(tags, vec!["element", "simpleType"]);
    }

    #[test]
    fn test_resolve_qname_in_scope() {
        let doc = Document::parse(SAMPLE).unwrap();
        let elem = doc.root.children_by_xsd_tag("element").next().unwrap();
        let q = elem.resolve_qname("xs:string", None).unwrap();
        assert_eq!(q, QName::xsd("string"));

        let q = elem.resolve_qname("tns:local", None).unwrap();
        assert_eq!(q.namespace(), Some("urn:test"));
    }

    #[test]
    fn test_bool_attribute() {
        let doc = Document::parse(r#"<a flag="true"/>"#).unwrap();
        assert!(doc.root.bool_attribute("flag", false).unwrap());
        assert!(!doc.root.bool_attribute("missing", false).unwrap());
        let doc = Document::parse(r#"<a flag="maybe"/>"#).unwrap();
        assert!(doc.root.bool_attribute("flag", false).is_err());
    }
}
