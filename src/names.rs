//! XML name utilities
//!
//! Lexical checks for NCNames and prefixed QNames, plus helpers for the
//! extended name notation `{namespace}local` used as the canonical string
//! form of qualified names throughout the crate.

use crate::error::{Error, Result};

fn is_ncname_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ncname_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\u{B7}')
}

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_ncname_start(c) => chars.all(is_ncname_char),
        _ => false,
    }
}

/// Check if a string is a valid prefixed or unprefixed QName
pub fn is_qname(name: &str) -> bool {
    match name.split_once(':') {
        Some((prefix, local)) => is_ncname(prefix) && is_ncname(local),
        None => is_ncname(name),
    }
}

/// Validate an NCName, returning an error when invalid
pub fn validate_ncname(name: &str) -> Result<()> {
    if is_ncname(name) {
        Ok(())
    } else {
        Err(Error::Value(format!("invalid NCName: '{}'", name)))
    }
}

/// Split a prefixed name into optional prefix and local name
pub fn split_prefixed(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Build an extended name from a namespace and a local name
pub fn extended_name(namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{{{}}}{}", ns, local),
        _ => local.to_string(),
    }
}

/// Split an extended name `{namespace}local` into its parts
///
/// Names without a leading brace are returned with an empty namespace.
pub fn split_extended(name: &str) -> Result<(Option<&str>, &str)> {
    if let Some(rest) = name.strip_prefix('{') {
        match rest.split_once('}') {
            Some((ns, local)) if !local.is_empty() => Ok((Some(ns), local)),
            _ => Err(Error::Value(format!("invalid extended name: '{}'", name))),
        }
    } else if name.contains('}') {
        Err(Error::Value(format!("invalid extended name: '{}'", name)))
    } else {
        Ok((None, name))
    }
}

/// Local part of an extended name
pub fn local_name(name: &str) -> &str {
    match name.rsplit_once('}') {
        Some((_, local)) => local,
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_is_ncname() {
        assert!(is_ncname("element"));
        assert!(is_ncname("_elem"));
        assert!(is_ncname("my-element.1"));

        assert!(!is_ncname(""));
        assert!(!is_ncname("1abc"));
        assert!(!is_ncname("-abc"));
        assert!(!is_ncname("a:b"));
    }

    #[test]
    fn test_is_qname() {
        assert!(is_qname("element"));
        assert!(is_qname("xs:element"));

        assert!(!is_qname(""));
        assert!(!is_qname(":element"));
        assert!(!is_qname("element:"));
        assert!(!is_qname("a:b:c"));
    }

    #[test]
    fn test_split_prefixed() {
        assert_eq!(split_prefixed("element"), (None, "element"));
        assert_eq!(split_prefixed("xs:element"), (Some("xs"), "element"));
    }

    #[test]
    fn test_extended_names() {
        assert_eq!(extended_name(Some("urn:a"), "x"), "{urn:a}x");
        assert_eq!(extended_name(None, "x"), "x");
        assert_eq!(extended_name(Some(""), "x"), "x");

        assert_eq!(split_extended("{urn:a}x").unwrap(), (Some("urn:a"), "x"));
        assert_eq!(split_extended("x").unwrap(), (None, "x"));
        assert!(split_extended("{urn:a}").is_err());
        assert!(split_extended("urn}x").is_err());
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("{urn:a}x"), "x");
        assert_eq!(local_name("x"), "x");
    }

    proptest! {
        #[test]
        fn extended_name_round_trips(ns in "[a-z][a-z0-9:/.]{0,20}", local in "[A-Za-z_][A-Za-z0-9_.-]{0,15}") {
            let ext = extended_name(Some(&ns), &local);
            let (got_ns, got_local) = split_extended(&ext).unwrap();
            prop_assert_eq!(got_ns, Some(ns.as_str()));
            prop_assert_eq!(got_local, local.as_str());
        }
    }
}
