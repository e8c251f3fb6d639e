//! Field configuration from string properties
//!
//! A component's configuration struct lists its fields through
//! [`FieldBinder::bind`]. Each field is looked up under
//! `<implementation name>.<field name>` and converted from text. Only
//! `String`, `i32` and `i64` fields can be set; binding any other type fails
//! as soon as a value is actually configured for it.
//!
//! Configuration shared with a base type is bound under the base type's own
//! name with [`FieldBinder::scoped`].
//!
//! ```rust
//! use registry::{Configure, FieldBinder, Result};
//!
//! #[derive(Default)]
//! struct PoolConfig {
//!     name: String,
//!     size: i32,
//! }
//!
//! impl Configure for PoolConfig {
//!     fn configure(&mut self, binder: &FieldBinder<'_>) -> Result<()> {
//!         binder.bind("name", &mut self.name)?;
//!         binder.bind("size", &mut self.size)?;
//!         Ok(())
//!     }
//! }
//! ```

use crate::error::{RegistryError, Result};
use properties::PropertySource;
use std::any::Any;

/// Configuration populated from properties before a component is built.
pub trait Configure: Default {
    fn configure(&mut self, binder: &FieldBinder<'_>) -> Result<()>;
}

/// Components without settings.
impl Configure for () {
    fn configure(&mut self, _binder: &FieldBinder<'_>) -> Result<()> {
        Ok(())
    }
}

/// Looks up and converts the configured fields of one type.
#[derive(Debug, Clone, Copy)]
pub struct FieldBinder<'a> {
    properties: &'a PropertySource,
    type_name: &'a str,
}

impl<'a> FieldBinder<'a> {
    pub fn new(properties: &'a PropertySource, type_name: &'a str) -> Self {
        Self {
            properties,
            type_name,
        }
    }

    /// Qualified name the field keys are prefixed with.
    pub fn type_name(&self) -> &str {
        self.type_name
    }

    /// A binder for another type level, sharing the same properties.
    pub fn scoped<'b>(&self, type_name: &'b str) -> FieldBinder<'b>
    where
        'a: 'b,
    {
        FieldBinder {
            properties: self.properties,
            type_name,
        }
    }

    /// Set `slot` from the `<type>.<field>` property if one is configured.
    ///
    /// Returns whether a value was assigned.
    pub fn bind<T: Any>(&self, field: &str, slot: &mut T) -> Result<bool> {
        let key = format!("{}.{}", self.type_name, field);
        let Some(value) = self.properties.get_opt(&key) else {
            return Ok(false);
        };

        let slot: &mut dyn Any = slot;
        if let Some(text) = slot.downcast_mut::<String>() {
            *text = value.to_string();
        } else if let Some(number) = slot.downcast_mut::<i32>() {
            *number = parse_field(&key, value)?;
        } else if let Some(number) = slot.downcast_mut::<i64>() {
            *number = parse_field(&key, value)?;
        } else {
            return Err(RegistryError::UnsupportedFieldType {
                field: key,
                type_name: std::any::type_name::<T>(),
            });
        }

        tracing::trace!(field = %key, "Configured field");
        Ok(true)
    }
}

fn parse_field<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    value
        .trim()
        .parse()
        .map_err(|source| RegistryError::InvalidFieldValue {
            field: key.to_string(),
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> PropertySource {
        PropertySource::from_pairs([
            ("acme.Pool.name", "primary"),
            ("acme.Pool.size", "8"),
            ("acme.Pool.budget", "5000000000"),
            ("acme.Pool.ratio", "0.5"),
            ("acme.Pool.bad", "eight"),
            ("acme.BasePool.label", "base"),
        ])
    }

    #[test]
    fn test_bind_supported_types() {
        let props = props();
        let binder = FieldBinder::new(&props, "acme.Pool");

        let mut name = String::new();
        let mut size = 0i32;
        let mut budget = 0i64;
        assert!(binder.bind("name", &mut name).unwrap());
        assert!(binder.bind("size", &mut size).unwrap());
        assert!(binder.bind("budget", &mut budget).unwrap());

        assert_eq!(name, "primary");
        assert_eq!(size, 8);
        assert_eq!(budget, 5_000_000_000);
    }

    #[test]
    fn test_unconfigured_field_is_untouched() {
        let props = props();
        let binder = FieldBinder::new(&props, "acme.Pool");
        let mut timeout = 30i32;
        assert!(!binder.bind("timeout", &mut timeout).unwrap());
        assert_eq!(timeout, 30);
    }

    #[test]
    fn test_unsupported_type_fails_when_configured() {
        let props = props();
        let binder = FieldBinder::new(&props, "acme.Pool");

        let mut ratio = 0.0f64;
        let err = binder.bind("ratio", &mut ratio).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::UnsupportedFieldType {
                ref field,
                type_name: "f64",
            } if field == "acme.Pool.ratio"
        ));

        let mut missing = 0.0f64;
        assert!(!binder.bind("missing", &mut missing).unwrap());
    }

    #[test]
    fn test_invalid_number() {
        let props = props();
        let binder = FieldBinder::new(&props, "acme.Pool");
        let mut bad = 0i32;
        assert!(matches!(
            binder.bind("bad", &mut bad),
            Err(RegistryError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn test_scoped_binder() {
        let props = props();
        let binder = FieldBinder::new(&props, "acme.Pool");
        let base = binder.scoped("acme.BasePool");
        let mut label = String::new();
        assert!(base.bind("label", &mut label).unwrap());
        assert_eq!(label, "base");
        assert_eq!(base.type_name(), "acme.BasePool");
    }
}
