//! XML namespace handling
//!
//! Qualified names and namespace prefix maps. A [`QName`] is the pair
//! (namespace URI, local name); its canonical string form is the extended
//! notation `{namespace}local`, or the bare local name when the namespace
//! is absent.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::names::{extended_name, split_extended, split_prefixed};

/// XSD 1.0/1.1 schema namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML namespace (the `xml:` prefix)
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XML Schema instance namespace (`xsi:`)
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Qualified name: namespace URI plus local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI; `None` for names in no namespace
    pub namespace: Option<String>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a QName; an empty namespace string is normalized to `None`
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        let namespace = namespace.map(|s| s.into()).filter(|s| !s.is_empty());
        Self {
            namespace,
            local_name: local_name.into(),
        }
    }

    /// A QName in no namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// A QName in the given namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self::new(Some(namespace), local_name)
    }

    /// A QName in the XSD namespace
    pub fn xsd(local_name: impl Into<String>) -> Self {
        Self::namespaced(XSD_NAMESPACE, local_name)
    }

    /// Parse an extended name `{namespace}local` or bare local name
    pub fn from_extended(name: &str) -> Result<Self> {
        let (ns, local) = split_extended(name)?;
        if local.is_empty() {
            return Err(Error::Value(format!("empty local name in '{}'", name)));
        }
        Ok(Self::new(ns, local))
    }

    /// Namespace URI as a string slice, when present
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// True when the name is in the XSD namespace
    pub fn is_xsd(&self) -> bool {
        self.namespace() == Some(XSD_NAMESPACE)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", extended_name(self.namespace(), &self.local_name))
    }
}

/// Prefix to namespace-URI map, as declared in an XML document scope
///
/// The default namespace is kept under the empty prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespaceMap {
    prefixes: HashMap<String, String>,
}

impl NamespaceMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a prefix; use the empty string for the default namespace
    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Namespace bound to a prefix
    pub fn get(&self, prefix: &str) -> Option<&str> {
        match prefix {
            "xml" => Some(XML_NAMESPACE),
            _ => self.prefixes.get(prefix).map(|s| s.as_str()),
        }
    }

    /// The default namespace, when declared
    pub fn default_namespace(&self) -> Option<&str> {
        self.get("")
    }

    /// Number of declared prefixes
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// True when no prefixes are declared
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Iterate declared (prefix, namespace) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, n)| (p.as_str(), n.as_str()))
    }

    /// Resolve a prefixed name against this map
    ///
    /// Unprefixed names resolve to the default namespace when one is
    /// declared, otherwise to `fallback` (callers pass the effective target
    /// namespace for chameleon documents, or `None`).
    pub fn resolve(&self, prefixed: &str, fallback: Option<&str>) -> Result<QName> {
        match split_prefixed(prefixed) {
            (Some(prefix), local) => {
                let namespace = self.get(prefix).ok_or_else(|| {
                    Error::Value(format!("unknown namespace prefix '{}' in '{}'", prefix, prefixed))
                })?;
                Ok(QName::namespaced(namespace, local))
            }
            (None, local) => match self.default_namespace() {
                Some(ns) => Ok(QName::namespaced(ns, local)),
                None => Ok(QName::new(fallback, local)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_normalization() {
        let q = QName::new(Some(""), "a");
        assert_eq!(q, QName::local("a"));
        assert_eq!(q.to_string(), "a");
    }

    #[test]
    fn test_qname_display() {
        let q = QName::namespaced("http://example.com", "a");
        assert_eq!(q.to_string(), "{http://example.com}a");
        assert!(QName::xsd("string").is_xsd());
    }

    #[test]
    fn test_qname_from_extended() {
        let q = QName::from_extended("{urn:x}a").unwrap();
        assert_eq!(q.namespace(), Some("urn:x"));
        assert_eq!(q.local_name, "a");

        let q = QName::from_extended("a").unwrap();
        assert_eq!(q.namespace(), None);
    }

    #[test]
    fn test_namespace_map_resolution() {
        let mut map = NamespaceMap::new();
        map.insert("xs", XSD_NAMESPACE);

        let q = map.resolve("xs:string", None).unwrap();
        assert_eq!(q, QName::xsd("string"));

        assert!(map.resolve("foo:string", None).is_err());
    }

    #[test]
    fn test_unprefixed_resolution() {
        let mut map = NamespaceMap::new();

        // No default namespace: unprefixed falls back
        let q = map.resolve("a", Some("urn:tns")).unwrap();
        assert_eq!(q.namespace(), Some("urn:tns"));

        let q = map.resolve("a", None).unwrap();
        assert_eq!(q.namespace(), None);

        // Default namespace wins over the fallback
        map.insert("", "urn:default");
        let q = map.resolve("a", Some("urn:tns")).unwrap();
        assert_eq!(q.namespace(), Some("urn:default"));
    }

    #[test]
    fn test_xml_prefix_is_builtin() {
        let map = NamespaceMap::new();
        assert_eq!(map.get("xml"), Some(XML_NAMESPACE));
    }
}
