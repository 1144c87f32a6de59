//! Feature records: an attribute row plus an optional geometry.

use crate::field::{FieldDefn, FieldValue};
use crate::geometry::Geometry;

/// One feature read from, or written to, a layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    /// Identifier scoped to the source layer.
    pub fid: Option<u64>,
    /// Attribute values in field order, keyed by field name.
    pub attributes: Vec<(String, FieldValue)>,
    pub geometry: Option<Geometry>,
}

impl Feature {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fid(mut self, fid: u64) -> Self {
        self.fid = Some(fid);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.set_field(name, value);
        self
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Sets an attribute, replacing an existing value of the same name.
    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Builds a record shaped by `fields`, copying matching values by name.
    ///
    /// Values are converted to the destination field type; values without a
    /// sensible conversion, and fields the source does not carry, become
    /// [`FieldValue::Null`]. Source attributes absent from `fields` are
    /// dropped. Feature id and geometry are carried over unchanged.
    #[must_use]
    pub fn conform_to(&self, fields: &[FieldDefn]) -> Self {
        let attributes = fields
            .iter()
            .map(|defn| {
                let value = self
                    .field(&defn.name)
                    .and_then(|v| v.coerce_to(defn.field_type))
                    .unwrap_or(FieldValue::Null);
                (defn.name.clone(), value)
            })
            .collect();
        Self {
            fid: self.fid,
            attributes,
            geometry: self.geometry.clone(),
        }
    }
}
