//! Constraining facets for simple types
//!
//! A [`FacetSet`] keeps one entry per facet kind. `enumeration`, `pattern`
//! and 1.1 `assertion` accumulate values inside their single entry; every
//! other kind may appear at most once per restriction step.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::documents::Element;
use crate::error::{ErrorKind, SchemaError};

// Rough screen for values that can never be an XSD numeric literal, to
// avoid feeding enumeration strings into the decimal parser.
static NUMERIC_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").unwrap());

/// White space handling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Preserve all white space
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace, collapse runs, trim ends
    Collapse,
}

impl WhiteSpace {
    /// Parse from the facet value
    pub fn from_str(s: &str) -> Result<Self, SchemaError> {
        match s {
            "preserve" => Ok(WhiteSpace::Preserve),
            "replace" => Ok(WhiteSpace::Replace),
            "collapse" => Ok(WhiteSpace::Collapse),
            _ => Err(SchemaError::new(
                ErrorKind::InvalidFacetValue,
                format!("invalid whiteSpace value '{}'", s),
            )),
        }
    }
}

/// The facet kinds of XSD 1.0 plus the 1.1 additions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetKind {
    /// Exact length
    Length,
    /// Minimum length
    MinLength,
    /// Maximum length
    MaxLength,
    /// Regular expression pattern (accumulating)
    Pattern,
    /// Enumerated values (accumulating)
    Enumeration,
    /// White space normalization
    WhiteSpace,
    /// Inclusive upper bound
    MaxInclusive,
    /// Exclusive upper bound
    MaxExclusive,
    /// Inclusive lower bound
    MinInclusive,
    /// Exclusive lower bound
    MinExclusive,
    /// Maximum number of digits
    TotalDigits,
    /// Maximum number of fraction digits
    FractionDigits,
    /// XSD 1.1 assertion (accumulating)
    Assertion,
    /// XSD 1.1 timezone requirement
    ExplicitTimezone,
}

impl FacetKind {
    /// Map an XSD element local name to a facet kind
    pub fn from_tag(local: &str) -> Option<Self> {
        match local {
            "length" => Some(FacetKind::Length),
            "minLength" => Some(FacetKind::MinLength),
            "maxLength" => Some(FacetKind::MaxLength),
            "pattern" => Some(FacetKind::Pattern),
            "enumeration" => Some(FacetKind::Enumeration),
            "whiteSpace" => Some(FacetKind::WhiteSpace),
            "maxInclusive" => Some(FacetKind::MaxInclusive),
            "maxExclusive" => Some(FacetKind::MaxExclusive),
            "minInclusive" => Some(FacetKind::MinInclusive),
            "minExclusive" => Some(FacetKind::MinExclusive),
            "totalDigits" => Some(FacetKind::TotalDigits),
            "fractionDigits" => Some(FacetKind::FractionDigits),
            "assertion" => Some(FacetKind::Assertion),
            "explicitTimezone" => Some(FacetKind::ExplicitTimezone),
            _ => None,
        }
    }

    /// The element local name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            FacetKind::Length => "length",
            FacetKind::MinLength => "minLength",
            FacetKind::MaxLength => "maxLength",
            FacetKind::Pattern => "pattern",
            FacetKind::Enumeration => "enumeration",
            FacetKind::WhiteSpace => "whiteSpace",
            FacetKind::MaxInclusive => "maxInclusive",
            FacetKind::MaxExclusive => "maxExclusive",
            FacetKind::MinInclusive => "minInclusive",
            FacetKind::MinExclusive => "minExclusive",
            FacetKind::TotalDigits => "totalDigits",
            FacetKind::FractionDigits => "fractionDigits",
            FacetKind::Assertion => "assertion",
            FacetKind::ExplicitTimezone => "explicitTimezone",
        }
    }

    /// True for kinds whose repeated occurrences accumulate values
    pub fn accumulates(&self) -> bool {
        matches!(
            self,
            FacetKind::Pattern | FacetKind::Enumeration | FacetKind::Assertion
        )
    }
}

/// A facet: kind, value(s) and the fixed flag
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    /// The facet kind
    pub kind: FacetKind,
    /// One value, or all accumulated values for accumulating kinds
    pub values: Vec<String>,
    /// `fixed="true"` on the declaration
    pub fixed: bool,
}

impl Facet {
    /// The single value of a non-accumulating facet
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(|s| s.as_str())
    }
}

/// The facets constraining one simple type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetSet {
    facets: IndexMap<FacetKind, Facet>,
}

impl FacetSet {
    /// Create an empty facet set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of facet entries
    pub fn len(&self) -> usize {
        self.facets.len()
    }

    /// True when no facet is present
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// The facet of a kind, when present
    pub fn get(&self, kind: FacetKind) -> Option<&Facet> {
        self.facets.get(&kind)
    }

    /// The single value of a non-accumulating facet kind
    pub fn value(&self, kind: FacetKind) -> Option<&str> {
        self.get(kind).and_then(|f| f.value())
    }

    /// All values of an accumulating facet kind
    pub fn values(&self, kind: FacetKind) -> &[String] {
        self.get(kind).map(|f| f.values.as_slice()).unwrap_or(&[])
    }

    /// Iterate facets in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Facet> {
        self.facets.values()
    }

    /// The effective white space mode, when constrained
    pub fn white_space(&self) -> Option<WhiteSpace> {
        self.value(FacetKind::WhiteSpace)
            .and_then(|v| WhiteSpace::from_str(v).ok())
    }

    /// Insert a facet value parsed from a declaration
    ///
    /// Accumulating kinds merge into the existing entry; any other repeat
    /// is a `DuplicateFacet` error.
    pub fn insert(&mut self, kind: FacetKind, value: String, fixed: bool) -> Result<(), SchemaError> {
        if let Some(existing) = self.facets.get_mut(&kind) {
            if kind.accumulates() {
                existing.values.push(value);
                existing.fixed |= fixed;
                return Ok(());
            }
            return Err(SchemaError::new(
                ErrorKind::DuplicateFacet,
                format!("facet '{}' appears more than once", kind.as_str()),
            ));
        }
        self.facets.insert(
            kind,
            Facet {
                kind,
                values: vec![value],
                fixed,
            },
        );
        Ok(())
    }

    /// Force-set a facet, used when seeding built-in type lattices
    pub fn set(&mut self, kind: FacetKind, value: impl Into<String>, fixed: bool) {
        let value = value.into();
        match self.facets.get_mut(&kind) {
            Some(existing) if kind.accumulates() => existing.values.push(value),
            _ => {
                self.facets.insert(
                    kind,
                    Facet {
                        kind,
                        values: vec![value],
                        fixed,
                    },
                );
            }
        }
    }

    /// Parse the facet children of a `restriction` element
    ///
    /// Non-facet children are left to the caller. Errors are collected, not
    /// propagated, so a bad facet does not lose the rest of the set.
    pub fn parse(elem: &Element) -> (FacetSet, Vec<SchemaError>) {
        let mut set = FacetSet::new();
        let mut errors = Vec::new();

        for child in elem.xsd_children() {
            let Some(kind) = child.xsd_name().and_then(FacetKind::from_tag) else {
                continue;
            };

            let value = match kind {
                FacetKind::Assertion => child.get("test").unwrap_or("").to_string(),
                _ => match child.get("value") {
                    Some(v) => v.to_string(),
                    None => {
                        errors.push(SchemaError::new(
                            ErrorKind::MissingAttribute,
                            format!("facet '{}' requires a 'value' attribute", kind.as_str()),
                        ));
                        continue;
                    }
                },
            };

            let fixed = match child.bool_attribute("fixed", false) {
                Ok(f) => f,
                Err(e) => {
                    errors.push(SchemaError::new(ErrorKind::InvalidFacetValue, e.to_string()));
                    false
                }
            };

            if kind == FacetKind::WhiteSpace {
                if let Err(e) = WhiteSpace::from_str(&value) {
                    errors.push(e);
                    continue;
                }
            }

            if kind == FacetKind::Pattern {
                if let Err(e) = Regex::new(&value) {
                    errors.push(SchemaError::new(
                        ErrorKind::InvalidFacetValue,
                        format!("pattern '{}' does not compile: {}", value, e),
                    ));
                }
            }

            if let Err(e) = set.insert(kind, value, fixed) {
                errors.push(e);
            }
        }

        errors.extend(set.check_bounds());
        (set, errors)
    }

    /// Inherit facets from the base type's set
    ///
    /// Base facets absent locally are copied; base patterns are kept in
    /// force alongside local ones; a local facet that re-restricts a fixed
    /// base facet to a different value is an error.
    pub fn inherit(&mut self, base: &FacetSet) -> Vec<SchemaError> {
        let mut errors = Vec::new();

        for (kind, base_facet) in &base.facets {
            match self.facets.get_mut(kind) {
                None => {
                    self.facets.insert(*kind, base_facet.clone());
                }
                Some(local) => {
                    if *kind == FacetKind::Pattern {
                        // Patterns from every derivation step stay in force
                        for value in &base_facet.values {
                            if !local.values.contains(value) {
                                local.values.push(value.clone());
                            }
                        }
                    } else if base_facet.fixed && local.values != base_facet.values {
                        errors.push(SchemaError::new(
                            ErrorKind::InvalidFacetValue,
                            format!(
                                "facet '{}' is fixed to '{}' in the base type",
                                kind.as_str(),
                                base_facet.value().unwrap_or_default()
                            ),
                        ));
                    }
                    // Local enumerations replace inherited ones
                }
            }
        }

        errors.extend(self.check_bounds());
        errors
    }

    /// Check numeric coherence of range bounds, when they parse as decimals
    pub fn check_bounds(&self) -> Vec<SchemaError> {
        let mut errors = Vec::new();

        let dec = |kind: FacetKind| -> Option<Decimal> {
            self.value(kind)
                .filter(|v| NUMERIC_SHAPE.is_match(v.trim()))
                .and_then(|v| v.trim().parse().ok())
        };

        let min_in = dec(FacetKind::MinInclusive);
        let min_ex = dec(FacetKind::MinExclusive);
        let max_in = dec(FacetKind::MaxInclusive);
        let max_ex = dec(FacetKind::MaxExclusive);

        let mut bound_error = |msg: String| {
            errors.push(SchemaError::new(ErrorKind::InvalidFacetValue, msg));
        };

        if let (Some(lo), Some(hi)) = (min_in, max_in) {
            if lo > hi {
                bound_error(format!("minInclusive {} exceeds maxInclusive {}", lo, hi));
            }
        }
        if let (Some(lo), Some(hi)) = (min_ex, max_ex) {
            if lo >= hi {
                bound_error(format!("minExclusive {} must be below maxExclusive {}", lo, hi));
            }
        }
        if let (Some(lo), Some(hi)) = (min_in, max_ex) {
            if lo >= hi {
                bound_error(format!("minInclusive {} must be below maxExclusive {}", lo, hi));
            }
        }
        if let (Some(lo), Some(hi)) = (min_ex, max_in) {
            if lo >= hi {
                bound_error(format!("minExclusive {} must be below maxInclusive {}", lo, hi));
            }
        }

        if let (Some(len), Some(max)) = (dec(FacetKind::Length), dec(FacetKind::MaxLength)) {
            if len > max {
                bound_error(format!("length {} exceeds maxLength {}", len, max));
            }
        }
        if let (Some(lo), Some(hi)) = (dec(FacetKind::MinLength), dec(FacetKind::MaxLength)) {
            if lo > hi {
                bound_error(format!("minLength {} exceeds maxLength {}", lo, hi));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;

    fn restriction(facets: &str) -> std::sync::Arc<Element> {
        Document::parse(&format!(
            r#"<xs:restriction xmlns:xs="http://www.w3.org/2001/XMLSchema" base="xs:int">{}</xs:restriction>"#,
            facets
        ))
        .unwrap()
        .root
    }

    #[test]
    fn test_parse_range_facets() {
        let (set, errors) = FacetSet::parse(&restriction(
            r#"<xs:minInclusive value="0"/><xs:maxInclusive value="10"/>"#,
        ));
        assert!(errors.is_empty());
        assert_eq!(set.value(FacetKind::MinInclusive), Some("0"));
        assert_eq!(set.value(FacetKind::MaxInclusive), Some("10"));
    }

    #[test]
    fn test_duplicate_facet() {
        let (_, errors) = FacetSet::parse(&restriction(
            r#"<xs:minLength value="1"/><xs:minLength value="2"/>"#,
        ));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::DuplicateFacet);
    }

    #[test]
    fn test_enumeration_and_pattern_accumulate() {
        let (set, errors) = FacetSet::parse(&restriction(
            r#"<xs:enumeration value="a"/><xs:enumeration value="b"/>
               <xs:pattern value="[a-z]+"/><xs:pattern value="[0-9]*"/>"#,
        ));
        assert!(errors.is_empty());
        assert_eq!(set.values(FacetKind::Enumeration), ["a", "b"]);
        assert_eq!(set.values(FacetKind::Pattern).len(), 2);
    }

    #[test]
    fn test_incoherent_bounds() {
        let (_, errors) = FacetSet::parse(&restriction(
            r#"<xs:minInclusive value="10"/><xs:maxInclusive value="0"/>"#,
        ));
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidFacetValue));
    }

    #[test]
    fn test_inherit_copies_and_keeps_patterns() {
        let (base, _) = FacetSet::parse(&restriction(
            r#"<xs:minInclusive value="0"/><xs:pattern value="[0-9]+"/>"#,
        ));
        let (mut derived, _) = FacetSet::parse(&restriction(
            r#"<xs:maxInclusive value="10"/><xs:pattern value="[1-9][0-9]*"/>"#,
        ));

        let errors = derived.inherit(&base);
        assert!(errors.is_empty());
        assert_eq!(derived.value(FacetKind::MinInclusive), Some("0"));
        assert_eq!(derived.values(FacetKind::Pattern).len(), 2);
    }

    #[test]
    fn test_fixed_facet_cannot_weaken() {
        let mut base = FacetSet::new();
        base.set(FacetKind::FractionDigits, "0", true);

        let (mut derived, _) = FacetSet::parse(&restriction(r#"<xs:fractionDigits value="2"/>"#));
        let errors = derived.inherit(&base);
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidFacetValue));
    }

    #[test]
    fn test_missing_value_attribute() {
        let (_, errors) = FacetSet::parse(&restriction(r#"<xs:minLength/>"#));
        assert_eq!(errors[0].kind, ErrorKind::MissingAttribute);
    }

    #[test]
    fn test_bad_pattern_reported() {
        let (_, errors) = FacetSet::parse(&restriction(r#"<xs:pattern value="[unclosed"/>"#));
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidFacetValue));
    }
}
