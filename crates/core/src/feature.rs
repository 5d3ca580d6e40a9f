//! Feature structure for Geodelta stores.
//!
//! This module defines `Feature`, a set of named attribute values under a
//! unique identifier, and the identifier helpers used for not-yet-persisted features.

use crate::geometry::Envelope;
use crate::value::Value;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use hashbrown::HashMap;

/// Attribute name → value.
pub type AttributeValues = BTreeMap<String, Value>;

/// Old identifier → new identifier.
pub type IdMap = HashMap<FeatureId, FeatureId>;

/// Global counter for temporary identifiers.
static NEXT_TEMPORARY_ID: AtomicU64 = AtomicU64::new(1);

/// Marker separating the type name from the counter in temporary identifiers.
const TEMPORARY_MARKER: &str = ".new-";

/// Unique identifier of a feature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this identifier was synthesized for a feature the store has not seen.
    pub fn is_temporary(&self) -> bool {
        self.0.contains(TEMPORARY_MARKER)
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Allocates a temporary identifier (`<type>.new-<n>`) for a queued feature.
pub fn next_temporary_id(type_name: &str) -> FeatureId {
    let n = NEXT_TEMPORARY_ID.fetch_add(1, Ordering::SeqCst);
    FeatureId(format!("{}{}{}", type_name, TEMPORARY_MARKER, n))
}

/// A feature: identifier plus attribute values.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    id: FeatureId,
    attributes: AttributeValues,
}

impl Feature {
    /// Creates a feature with no attributes.
    pub fn new(id: FeatureId) -> Self {
        Self {
            id,
            attributes: AttributeValues::new(),
        }
    }

    /// Creates a feature from existing attributes.
    pub fn with_attributes(id: FeatureId, attributes: AttributeValues) -> Self {
        Self { id, attributes }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[inline]
    pub fn id(&self) -> &FeatureId {
        &self.id
    }

    pub fn set_id(&mut self, id: FeatureId) {
        self.id = id;
    }

    #[inline]
    pub fn attributes(&self) -> &AttributeValues {
        &self.attributes
    }

    /// Gets an attribute value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Gets a mutable reference to an attribute value.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.attributes.get_mut(name)
    }

    /// Sets an attribute value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.attributes.insert(name.into(), value)
    }

    /// Returns the union of the envelopes of every spatial attribute.
    pub fn envelope(&self) -> Option<Envelope> {
        self.attributes
            .values()
            .filter_map(Value::envelope)
            .reduce(|acc, env| acc.union(&env))
    }
}
