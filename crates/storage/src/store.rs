//! The feature store contract.

use crate::listener::{ListenerId, StorageListener};
use geodelta_core::schema::FeatureType;
use geodelta_core::{AttributeValues, Envelope, Feature, FeatureId, Result};
use geodelta_query::{Filter, Query};
use std::sync::{Arc, Weak};

/// A stream of features returned by a read.
pub type FeatureReader = Box<dyn Iterator<Item = Feature> + Send>;

/// A mutable store of features grouped by feature type.
///
/// Writes are bulk operations addressed by type name and filter. Every
/// successful write fires a content event to the registered listeners.
pub trait FeatureStore: Send + Sync {
    /// Returns the feature type named `name`.
    fn feature_type(&self, name: &str) -> Result<Arc<FeatureType>>;

    /// Reads the features selected by `query`, with geometries expressed in the
    /// query's reference system when one is requested.
    fn reader(&self, query: &Query) -> Result<FeatureReader>;

    /// Persists `features` and returns the identifiers assigned, in input order.
    fn add_features(&self, type_name: &str, features: Vec<Feature>) -> Result<Vec<FeatureId>>;

    /// Sets `values` on every feature of `type_name` matching `filter`.
    fn update_features(&self, type_name: &str, filter: &Filter, values: &AttributeValues) -> Result<()>;

    /// Deletes every feature of `type_name` matching `filter`.
    fn remove_features(&self, type_name: &str, filter: &Filter) -> Result<()>;

    /// Counts the features selected by `query`.
    fn count(&self, query: &Query) -> Result<usize> {
        Ok(self.reader(query)?.count())
    }

    /// Returns the bounds of the features selected by `query`.
    fn envelope(&self, query: &Query) -> Result<Option<Envelope>> {
        Ok(envelope_of(self.reader(query)?))
    }

    /// Registers a listener without keeping it alive.
    fn add_storage_listener(&self, listener: Weak<dyn StorageListener>) -> ListenerId;

    /// Unregisters a listener.
    fn remove_storage_listener(&self, id: ListenerId) -> bool;
}

/// Unions the envelopes of every feature in `features`.
pub fn envelope_of(features: impl Iterator<Item = Feature>) -> Option<Envelope> {
    features
        .filter_map(|f| f.envelope())
        .reduce(|acc, env| acc.union(&env))
}
