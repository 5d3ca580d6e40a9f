//! In-memory feature store.
//!
//! This module provides `MemoryStore`, which keeps features per type in
//! insertion order and can snapshot its content under version labels.

use crate::event::{next_source_id, EventKind, EventSource, StorageEvent};
use crate::listener::{ListenerId, ListenerRegistry, StorageListener};
use crate::reproject::reproject_feature;
use crate::store::{FeatureReader, FeatureStore};
use geodelta_core::schema::FeatureType;
use geodelta_core::{
    AttributeValues, Error, Feature, FeatureId, OperationFactory, OperationRegistry, Result,
};
use geodelta_query::{Filter, Query};
use log::{debug, trace};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// Features of one type.
struct TypeStore {
    feature_type: Arc<FeatureType>,
    features: Vec<Feature>,
    next_id: u64,
}

impl TypeStore {
    fn new(feature_type: FeatureType) -> Self {
        Self {
            feature_type: Arc::new(feature_type),
            features: Vec::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> FeatureId {
        let id = FeatureId::new(format!("{}.{}", self.feature_type.name(), self.next_id));
        self.next_id += 1;
        id
    }
}

#[derive(Default)]
struct State {
    /// Type name → features.
    types: BTreeMap<String, TypeStore>,
    /// Version label → type name → features at tagging time.
    versions: BTreeMap<String, BTreeMap<String, Vec<Feature>>>,
}

/// A thread-safe in-memory feature store.
pub struct MemoryStore {
    id: u64,
    state: RwLock<State>,
    operations: Arc<dyn OperationFactory>,
    listeners: ListenerRegistry,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store that can only resolve identity operations.
    pub fn new() -> Self {
        Self::with_operations(Arc::new(OperationRegistry::new()))
    }

    /// Creates an empty store that reprojects through `operations`.
    pub fn with_operations(operations: Arc<dyn OperationFactory>) -> Self {
        Self {
            id: next_source_id(),
            state: RwLock::new(State::default()),
            operations,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Returns this store's event source.
    pub fn source(&self) -> EventSource {
        EventSource::Store(self.id)
    }

    /// Creates a feature type.
    pub fn create_type(&self, feature_type: FeatureType) -> Result<()> {
        let name = feature_type.name().to_string();
        {
            let mut state = self.state.write();
            if state.types.contains_key(&name) {
                return Err(Error::invalid_schema(format!(
                    "Feature type already exists: {}",
                    name
                )));
            }
            state.types.insert(name.clone(), TypeStore::new(feature_type));
        }
        self.fire(EventKind::TypeCreated { type_name: name });
        Ok(())
    }

    /// Drops a feature type and its features.
    pub fn drop_type(&self, name: &str) -> Result<()> {
        if self.state.write().types.remove(name).is_none() {
            return Err(Error::type_not_found(name));
        }
        self.fire(EventKind::TypeDeleted {
            type_name: name.into(),
        });
        Ok(())
    }

    /// Returns all type names.
    pub fn type_names(&self) -> Vec<String> {
        self.state.read().types.keys().cloned().collect()
    }

    /// Snapshots the current content under `label`.
    pub fn tag_version(&self, label: impl Into<String>) -> Result<()> {
        let label = label.into();
        let mut state = self.state.write();
        if state.versions.contains_key(&label) {
            return Err(Error::invalid_argument(format!(
                "Version already exists: {}",
                label
            )));
        }
        let snapshot = state
            .types
            .iter()
            .map(|(name, store)| (name.clone(), store.features.clone()))
            .collect();
        state.versions.insert(label.clone(), snapshot);
        debug!("store {} tagged version {}", self.id, label);
        Ok(())
    }

    /// Returns the number of features currently stored for `type_name`.
    pub fn len(&self, type_name: &str) -> Result<usize> {
        self.state
            .read()
            .types
            .get(type_name)
            .map(|t| t.features.len())
            .ok_or_else(|| Error::type_not_found(type_name))
    }

    fn fire(&self, kind: EventKind) {
        self.listeners.dispatch(&StorageEvent::new(self.source(), kind));
    }
}

impl FeatureStore for MemoryStore {
    fn feature_type(&self, name: &str) -> Result<Arc<FeatureType>> {
        self.state
            .read()
            .types
            .get(name)
            .map(|t| Arc::clone(&t.feature_type))
            .ok_or_else(|| Error::type_not_found(name))
    }

    fn reader(&self, query: &Query) -> Result<FeatureReader> {
        let (feature_type, mut features) = {
            let state = self.state.read();
            let store = state
                .types
                .get(query.type_name())
                .ok_or_else(|| Error::type_not_found(query.type_name()))?;
            let source: &[Feature] = match query.version() {
                None => &store.features,
                Some(version) => state
                    .versions
                    .get(version)
                    .ok_or_else(|| Error::version_not_found(version))?
                    .get(query.type_name())
                    .map(Vec::as_slice)
                    .unwrap_or(&[]),
            };
            let selected: Vec<Feature> = source
                .iter()
                .filter(|f| query.filter().evaluate(f))
                .cloned()
                .collect();
            (Arc::clone(&store.feature_type), selected)
        };

        if let Some(target) = query.crs() {
            for feature in &mut features {
                reproject_feature(feature, &feature_type, target, &*self.operations)?;
            }
        }
        trace!(
            "store {} read {} feature(s) of {}",
            self.id,
            features.len(),
            query.type_name()
        );
        Ok(Box::new(features.into_iter()))
    }

    fn add_features(&self, type_name: &str, features: Vec<Feature>) -> Result<Vec<FeatureId>> {
        let ids = {
            let mut state = self.state.write();
            let store = state
                .types
                .get_mut(type_name)
                .ok_or_else(|| Error::type_not_found(type_name))?;
            for feature in &features {
                for (name, value) in feature.attributes() {
                    store.feature_type.validate(name, value)?;
                }
            }
            let mut ids = Vec::with_capacity(features.len());
            for mut feature in features {
                let id = store.allocate_id();
                feature.set_id(id.clone());
                store.features.push(feature);
                ids.push(id);
            }
            ids
        };
        if !ids.is_empty() {
            self.fire(EventKind::FeaturesAdded {
                type_name: type_name.into(),
                ids: ids.clone(),
            });
        }
        Ok(ids)
    }

    fn update_features(&self, type_name: &str, filter: &Filter, values: &AttributeValues) -> Result<()> {
        let ids = {
            let mut state = self.state.write();
            let store = state
                .types
                .get_mut(type_name)
                .ok_or_else(|| Error::type_not_found(type_name))?;
            for (name, value) in values {
                store.feature_type.validate(name, value)?;
            }
            let mut ids = Vec::new();
            for feature in store.features.iter_mut().filter(|f| filter.evaluate(f)) {
                for (name, value) in values {
                    feature.set(name.clone(), value.clone());
                }
                ids.push(feature.id().clone());
            }
            ids
        };
        if !ids.is_empty() {
            self.fire(EventKind::FeaturesUpdated {
                type_name: type_name.into(),
                ids,
            });
        }
        Ok(())
    }

    fn remove_features(&self, type_name: &str, filter: &Filter) -> Result<()> {
        let ids = {
            let mut state = self.state.write();
            let store = state
                .types
                .get_mut(type_name)
                .ok_or_else(|| Error::type_not_found(type_name))?;
            let mut ids = Vec::new();
            store.features.retain(|f| {
                if filter.evaluate(f) {
                    ids.push(f.id().clone());
                    false
                } else {
                    true
                }
            });
            ids
        };
        if !ids.is_empty() {
            self.fire(EventKind::FeaturesDeleted {
                type_name: type_name.into(),
                ids,
            });
        }
        Ok(())
    }

    fn add_storage_listener(&self, listener: Weak<dyn StorageListener>) -> ListenerId {
        self.listeners.register(listener)
    }

    fn remove_storage_listener(&self, id: ListenerId) -> bool {
        self.listeners.unregister(id)
    }
}
