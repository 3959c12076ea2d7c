//! Particle occurrence bounds
//!
//! Every use of an element, wildcard or model group inside a content model
//! is a particle with `minOccurs`/`maxOccurs` bounds. `None` for the
//! maximum means unbounded.

use crate::documents::Element;
use crate::error::{ErrorKind, SchemaError};

/// Occurrence bounds of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences
    pub min: u32,
    /// Maximum number of occurrences; `None` means unbounded
    pub max: Option<u32>,
}

impl Occurs {
    /// Bounds (min, max)
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// The default bounds (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// True when the particle may occur zero times
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// True when the particle occurs at most once
    pub fn is_single(&self) -> bool {
        self.max == Some(1)
    }

    /// True when `min <= max` holds (unbounded counts as infinity)
    pub fn is_coherent(&self) -> bool {
        match self.max {
            Some(max) => self.min <= max,
            None => true,
        }
    }

    /// True when these bounds are a valid occurrence restriction of `base`
    ///
    /// The restricted range must lie inside the base range.
    pub fn restricts(&self, base: &Occurs) -> bool {
        if self.min < base.min {
            return false;
        }
        if self.max == Some(0) {
            return true;
        }
        match (self.max, base.max) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a <= b,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl std::fmt::Display for Occurs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "({}, {})", self.min, max),
            None => write!(f, "({}, unbounded)", self.min),
        }
    }
}

/// Parse `minOccurs`/`maxOccurs` from a particle element
///
/// Both default to 1. Returns the structural error for non-numeric values
/// and for inverted bounds.
pub fn parse_occurs(elem: &Element) -> Result<Occurs, SchemaError> {
    let mut occurs = Occurs::once();

    if let Some(value) = elem.get("minOccurs") {
        occurs.min = value.trim().parse::<u32>().map_err(|_| {
            SchemaError::new(
                ErrorKind::InvalidOccurs,
                format!("minOccurs value '{}' is not a non-negative integer", value),
            )
        })?;
    }

    if let Some(value) = elem.get("maxOccurs") {
        let value = value.trim();
        if value == "unbounded" {
            occurs.max = None;
        } else {
            occurs.max = Some(value.parse::<u32>().map_err(|_| {
                SchemaError::new(
                    ErrorKind::InvalidOccurs,
                    format!("maxOccurs value '{}' is not a non-negative integer or 'unbounded'", value),
                )
            })?);
        }
    }

    if !occurs.is_coherent() {
        return Err(SchemaError::new(
            ErrorKind::InvalidOccurs,
            format!("minOccurs > maxOccurs in {}", occurs),
        ));
    }

    Ok(occurs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use proptest::prelude::*;

    fn elem(attrs: &str) -> std::sync::Arc<Element> {
        Document::parse(&format!("<e {}/>", attrs)).unwrap().root
    }

    #[test]
    fn test_parse_defaults() {
        assert_eq!(parse_occurs(&elem("")).unwrap(), Occurs::once());
    }

    #[test]
    fn test_parse_explicit() {
        let occurs = parse_occurs(&elem(r#"minOccurs="0" maxOccurs="unbounded""#)).unwrap();
        assert_eq!(occurs, Occurs::zero_or_more());

        let occurs = parse_occurs(&elem(r#"minOccurs="2" maxOccurs="5""#)).unwrap();
        assert_eq!(occurs, Occurs::new(2, Some(5)));
    }

    #[test]
    fn test_parse_invalid() {
        let err = parse_occurs(&elem(r#"minOccurs="-1""#)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOccurs);

        let err = parse_occurs(&elem(r#"maxOccurs="lots""#)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOccurs);

        // Inverted bounds
        let err = parse_occurs(&elem(r#"minOccurs="3" maxOccurs="2""#)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOccurs);
    }

    #[test]
    fn test_restricts() {
        let base = Occurs::new(0, None);
        assert!(Occurs::new(1, Some(3)).restricts(&base));
        assert!(Occurs::once().restricts(&base));

        let base = Occurs::new(1, Some(3));
        assert!(!Occurs::new(0, Some(3)).restricts(&base)); // widens the minimum
        assert!(!Occurs::new(1, None).restricts(&base)); // widens the maximum
        assert!(Occurs::new(2, Some(2)).restricts(&base));
    }

    proptest! {
        #[test]
        fn restriction_is_reflexive_and_ordered(min in 0u32..10, span in 0u32..10) {
            let occurs = Occurs::new(min, Some(min + span));
            prop_assert!(occurs.restricts(&occurs));
            // Any sub-range restricts the full range
            let narrowed = Occurs::new(min + 1, Some(min + span.max(1)));
            if narrowed.is_coherent() {
                prop_assert!(narrowed.restricts(&occurs) || span == 0);
            }
        }
    }
}
