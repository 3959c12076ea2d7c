//! Limits for schema compilation
//!
//! Guards against pathological schema sources: unbounded include chains,
//! content models that recurse without making progress, and component
//! explosions from machine-generated schemas.

use crate::error::{Error, Result};

/// Compilation limits
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum depth of the content model walk in `check_model`
    pub max_model_depth: usize,

    /// Maximum include/import/redefine nesting depth
    pub max_schema_depth: usize,

    /// Maximum number of global components across all maps
    pub max_components: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_model_depth: 15,
            max_schema_depth: 100,
            max_components: 100_000,
        }
    }
}

impl Limits {
    /// Create limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// More restrictive limits
    pub fn strict() -> Self {
        Self {
            max_model_depth: 10,
            max_schema_depth: 20,
            max_components: 10_000,
        }
    }

    /// Less restrictive limits, use with caution
    pub fn permissive() -> Self {
        Self {
            max_model_depth: 50,
            max_schema_depth: 1_000,
            max_components: 1_000_000,
        }
    }

    /// Check schema nesting depth
    pub fn check_schema_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_schema_depth {
            Err(Error::LimitExceeded(format!(
                "schema nesting depth {} exceeds maximum {}",
                depth, self.max_schema_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check the global component count
    pub fn check_components(&self, count: usize) -> Result<()> {
        if count > self.max_components {
            Err(Error::LimitExceeded(format!(
                "global component count {} exceeds maximum {}",
                count, self.max_components
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert!(limits.check_schema_depth(50).is_ok());
        assert!(limits.check_schema_depth(500).is_err());
        assert!(limits.check_components(99_999).is_ok());
        assert!(limits.check_components(100_001).is_err());
    }

    #[test]
    fn test_presets() {
        assert!(Limits::strict().max_model_depth < Limits::default().max_model_depth);
        assert!(Limits::permissive().max_schema_depth > Limits::default().max_schema_depth);
    }
}
