//! Destination schema construction for merged layers.

use std::collections::BTreeSet;

use chartmerge_core_common::{FieldDefn, FieldType, Layer};

/// Record-management and linkage attributes dropped from merged products.
pub const DEFAULT_EXCLUDED_FIELDS: [&str; 14] = [
    "RCID",
    "PRIM",
    "GRUP",
    "OBJL",
    "RVER",
    "AGEN",
    "FIDN",
    "FIDS",
    "LNAM",
    "LNAM_REFS",
    "FFPT_RIND",
    "RECIND",
    "RECDAT",
    "SCAMAX",
];

/// Set of field names never written to a destination schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedFields(BTreeSet<String>);

impl ExcludedFields {
    /// An empty set; every field is kept.
    #[must_use]
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Adds further names to the set.
    #[must_use]
    pub fn with<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for ExcludedFields {
    fn default() -> Self {
        Self::none().with(DEFAULT_EXCLUDED_FIELDS)
    }
}

/// Builds destination field lists from source layers.
#[derive(Debug, Clone, Default)]
pub struct SchemaUnifier {
    excluded: ExcludedFields,
}

impl SchemaUnifier {
    #[must_use]
    pub fn new(excluded: ExcludedFields) -> Self {
        Self { excluded }
    }

    #[must_use]
    pub fn excluded(&self) -> &ExcludedFields {
        &self.excluded
    }

    /// Destination fields for `layer`, in source order.
    ///
    /// Excluded names are skipped. List and binary types become `String`;
    /// width and precision are kept as declared.
    #[must_use]
    pub fn build_fields(&self, layer: &dyn Layer) -> Vec<FieldDefn> {
        layer
            .fields()
            .iter()
            .filter(|defn| !self.excluded.contains(&defn.name))
            .map(|defn| FieldDefn {
                name: defn.name.clone(),
                field_type: unified_type(defn.field_type),
                width: defn.width,
                precision: defn.precision,
            })
            .collect()
    }
}

/// Field type used in the flat destination schema.
#[must_use]
pub const fn unified_type(field_type: FieldType) -> FieldType {
    if field_type.is_list_or_binary() {
        FieldType::String
    } else {
        field_type
    }
}
