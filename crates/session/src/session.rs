//! Sessions: a read view of a store with pending changes laid over it.
//!
//! An asynchronous session queues writes as deltas and shows them to its own
//! reads until `commit` applies them to the store. A synchronous session
//! passes writes straight through. A versioned session is read-only.
//!
//! Reads with pending changes go through a two-pass overlay:
//!
//! 1. every delta widens the query in queue order, and the query it saw is recorded
//! 2. the store is read once with the widest query
//! 3. every delta wraps the stream in queue order, using its recorded query
//! 4. the caller's filter, in the query's CRS, is applied to the result

use crate::delta::{AddDelta, Delta, DeltaContext, ModifyDelta, RemoveDelta};
use crate::diff::SessionDiff;
use geodelta_core::{
    AttributeValues, Crs, Envelope, Error, Feature, FeatureId, OperationFactory,
    OperationRegistry, Result,
};
use geodelta_query::{collapse, identifiers, Filter, FilterSimplifier, Query};
use geodelta_storage::reproject::reproject_value;
use geodelta_storage::{
    envelope_of, next_source_id, EventSource, FeatureReader, FeatureStore, ListenerId, ListenerSet,
    StorageEvent, StorageListener,
};
use log::{debug, trace};
use std::borrow::Cow;
use std::sync::{Arc, Weak};

/// Session settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Queue writes until commit instead of passing them through.
    pub asynchronous: bool,
    /// Read this version of the store. Versioned sessions reject writes.
    pub version: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            asynchronous: true,
            version: None,
        }
    }
}

impl SessionConfig {
    pub fn asynchronous(mut self, asynchronous: bool) -> Self {
        self.asynchronous = asynchronous;
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Builder for sessions.
pub struct SessionBuilder {
    store: Arc<dyn FeatureStore>,
    config: SessionConfig,
    operations: Option<Arc<dyn OperationFactory>>,
}

impl SessionBuilder {
    pub fn new(store: Arc<dyn FeatureStore>) -> Self {
        Self {
            store,
            config: SessionConfig::default(),
            operations: None,
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn asynchronous(mut self, asynchronous: bool) -> Self {
        self.config.asynchronous = asynchronous;
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = Some(version.into());
        self
    }

    /// Sets the factory used to reproject queued geometries.
    pub fn operations(mut self, operations: Arc<dyn OperationFactory>) -> Self {
        self.operations = Some(operations);
        self
    }

    /// Creates the session and subscribes it to the store's events.
    pub fn build(self) -> Session {
        let operations = self
            .operations
            .unwrap_or_else(|| Arc::new(OperationRegistry::new()));
        let id = next_source_id();
        let forwarder = Arc::new(EventForwarder {
            source: EventSource::Session(id),
            listeners: ListenerSet::new(),
        });
        let weak: Weak<EventForwarder> = Arc::downgrade(&forwarder);
        let store_listener = self.store.add_storage_listener(weak);
        debug!(
            "session {} opened ({}, version {:?})",
            id,
            if self.config.asynchronous { "async" } else { "sync" },
            self.config.version
        );
        Session {
            id,
            store: self.store,
            operations,
            config: self.config,
            diff: SessionDiff::new(),
            forwarder,
            store_listener,
        }
    }
}

/// Relays store events to the session's listeners.
struct EventForwarder {
    source: EventSource,
    listeners: ListenerSet,
}

impl EventForwarder {
    fn fire(&self, event: &StorageEvent) {
        self.listeners.fire(event);
    }
}

impl StorageListener for EventForwarder {
    fn on_event(&self, event: &StorageEvent) {
        if event.is_content_event() {
            self.fire(&event.with_source(self.source));
        } else {
            self.fire(event);
        }
    }
}

/// A view of a feature store with pending changes.
pub struct Session {
    id: u64,
    store: Arc<dyn FeatureStore>,
    operations: Arc<dyn OperationFactory>,
    config: SessionConfig,
    diff: SessionDiff,
    forwarder: Arc<EventForwarder>,
    store_listener: ListenerId,
}

impl Session {
    /// Opens an asynchronous, unversioned session.
    pub fn new(store: Arc<dyn FeatureStore>) -> Self {
        Self::builder(store).build()
    }

    pub fn builder(store: Arc<dyn FeatureStore>) -> SessionBuilder {
        SessionBuilder::new(store)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the source attached to events this session fires.
    pub fn source(&self) -> EventSource {
        self.forwarder.source
    }

    pub fn store(&self) -> &Arc<dyn FeatureStore> {
        &self.store
    }

    pub fn is_asynchronous(&self) -> bool {
        self.config.asynchronous
    }

    pub fn version(&self) -> Option<&str> {
        self.config.version.as_deref()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.diff.is_empty()
    }

    /// Returns the queued deltas.
    pub fn diff(&self) -> &SessionDiff {
        &self.diff
    }

    // Reads

    /// Reads the features selected by `query`, pending changes included.
    pub fn reader(&self, query: &Query) -> Result<FeatureReader> {
        let query = self.stamp(query);
        if self.diff.is_empty() {
            return self.store.reader(&query);
        }

        let mut current = self.force_crs(&query, false)?;
        let mut recorded = Vec::with_capacity(self.diff.len());
        for delta in self.diff.deltas() {
            let widened = delta.rewrite_query(&current);
            recorded.push(current);
            current = widened;
        }
        trace!(
            "session {} reads {} through {} deltas",
            self.id,
            query.type_name(),
            recorded.len()
        );

        let ctx = DeltaContext::new(Arc::clone(&self.store), Arc::clone(&self.operations));
        let mut stream = self.store.reader(&current)?;
        for (delta, delta_query) in self.diff.deltas().zip(&recorded) {
            stream = delta.rewrite_stream(&ctx, delta_query, stream);
        }

        let selection = match query.crs() {
            Some(target) => self.selection_in(&query, target)?,
            None => query.filter().clone(),
        };
        Ok(Box::new(stream.filter(move |f| selection.evaluate(f))))
    }

    /// The filter of `query` with its spatial literals moved into `target`.
    ///
    /// The store matches literals against stored coordinates, so they are read
    /// in the attribute's declared CRS before moving.
    fn selection_in(&self, query: &Query, target: &Crs) -> Result<Filter> {
        let feature_type = self.store.feature_type(query.type_name())?;
        query.filter().try_map_literals(&mut |attribute, value| {
            match feature_type.crs_of(attribute) {
                Some(declared) if value.is_spatial() => {
                    reproject_value(value, Some(declared), target, &*self.operations)
                }
                _ => Ok(value.clone()),
            }
        })
    }

    /// Counts the features selected by `query`, pending changes included.
    pub fn count(&self, query: &Query) -> Result<usize> {
        if self.diff.is_empty() {
            return self.store.count(&self.stamp(query));
        }
        Ok(self.reader(query)?.count())
    }

    /// Returns the bounds of the features selected by `query`, pending changes included.
    pub fn envelope(&self, query: &Query) -> Result<Option<Envelope>> {
        if self.diff.is_empty() {
            return self.store.envelope(&self.stamp(query));
        }
        Ok(envelope_of(self.reader(query)?))
    }

    /// Attaches the feature type's CRS to the spatial literals of `query`'s filter.
    ///
    /// Untagged literals are tagged without touching their coordinates. Tagged
    /// literals are reprojected into the feature type's CRS when `replace` is
    /// set, and left alone otherwise.
    pub fn force_crs(&self, query: &Query, replace: bool) -> Result<Query> {
        let feature_type = self.store.feature_type(query.type_name())?;
        let filter = query.filter().try_map_literals(&mut |attribute, value| {
            let declared = match feature_type.crs_of(attribute) {
                Some(crs) if value.is_spatial() => crs,
                _ => return Ok(value.clone()),
            };
            match value.crs() {
                None => reproject_value(value, Some(declared), declared, &*self.operations),
                Some(_) if replace => reproject_value(value, None, declared, &*self.operations),
                Some(_) => Ok(value.clone()),
            }
        })?;
        let mut forced = query.clone();
        forced.set_filter(filter);
        Ok(forced)
    }

    // Writes

    /// Adds features and returns their identifiers.
    ///
    /// Asynchronous sessions return temporary identifiers, which the store
    /// replaces on commit.
    pub fn add_features(&mut self, type_name: &str, features: Vec<Feature>) -> Result<Vec<FeatureId>> {
        self.check_version()?;
        let feature_type = self.store.feature_type(type_name)?;
        if !self.config.asynchronous {
            return self.store.add_features(type_name, features);
        }
        if features.is_empty() {
            return Ok(Vec::new());
        }
        for feature in &features {
            for (name, value) in feature.attributes() {
                feature_type.validate(name, value)?;
            }
        }

        let delta = AddDelta::new(type_name, features)?;
        let ids = delta.ids();
        self.diff.add(Delta::Add(delta));
        self.forwarder
            .fire(&StorageEvent::features_added(self.source(), type_name, ids.clone()));
        self.fire_session_changed();
        Ok(ids)
    }

    /// Sets `values` on the features of `type_name` matching `filter`.
    ///
    /// Asynchronous sessions resolve `filter` to identifiers against the
    /// current view and queue the change. Nothing is queued when `values` is
    /// empty or nothing matches.
    pub fn update_features(
        &mut self,
        type_name: &str,
        filter: &Filter,
        values: &AttributeValues,
    ) -> Result<()> {
        self.check_version()?;
        let feature_type = self.store.feature_type(type_name)?;
        if !self.config.asynchronous {
            return self.store.update_features(type_name, filter, values);
        }
        if values.is_empty() {
            trace!("session {} skips update of {} without values", self.id, type_name);
            return Ok(());
        }
        for (name, value) in values {
            feature_type.validate(name, value)?;
        }

        let target = match self.resolve_targets(type_name, filter)? {
            Some(target) => target,
            None => return Ok(()),
        };
        let ids = identifiers(&target);
        self.diff
            .add(Delta::Modify(ModifyDelta::new(type_name, target, values.clone())?));
        self.forwarder
            .fire(&StorageEvent::features_updated(self.source(), type_name, ids));
        self.fire_session_changed();
        Ok(())
    }

    /// Deletes the features of `type_name` matching `filter`.
    pub fn remove_features(&mut self, type_name: &str, filter: &Filter) -> Result<()> {
        self.check_version()?;
        self.store.feature_type(type_name)?;
        if !self.config.asynchronous {
            return self.store.remove_features(type_name, filter);
        }

        let target = match self.resolve_targets(type_name, filter)? {
            Some(target) => target,
            None => return Ok(()),
        };
        let ids = identifiers(&target);
        self.diff
            .add(Delta::Remove(RemoveDelta::new(type_name, target)?));
        self.forwarder
            .fire(&StorageEvent::features_deleted(self.source(), type_name, ids));
        self.fire_session_changed();
        Ok(())
    }

    /// Applies the pending changes to the store in the order they were queued.
    ///
    /// On failure the deltas not yet applied stay pending.
    pub fn commit(&mut self) -> Result<()> {
        self.check_version()?;
        debug!("session {} commits {} deltas", self.id, self.diff.len());
        self.diff.commit(&*self.store)?;
        self.fire_session_changed();
        Ok(())
    }

    /// Discards the pending changes.
    pub fn rollback(&mut self) -> Result<()> {
        self.check_version()?;
        self.diff.rollback();
        self.fire_session_changed();
        Ok(())
    }

    // Listeners

    pub fn add_listener(&self, listener: Arc<dyn StorageListener>) -> ListenerId {
        self.forwarder.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.forwarder.listeners.remove(id)
    }

    fn fire_session_changed(&self) {
        self.forwarder
            .fire(&StorageEvent::session_changed(self.source()));
    }

    fn check_version(&self) -> Result<()> {
        match &self.config.version {
            Some(version) => Err(Error::versioned_session(version.as_str())),
            None => Ok(()),
        }
    }

    /// `query` with this session's version, if any.
    fn stamp<'a>(&self, query: &'a Query) -> Cow<'a, Query> {
        match &self.config.version {
            Some(version) if query.version() != Some(version.as_str()) => {
                Cow::Owned(query.clone().with_version(version.clone()))
            }
            _ => Cow::Borrowed(query),
        }
    }

    /// Freezes `filter` into the identifiers it currently selects.
    ///
    /// Returns `None` when it selects nothing.
    fn resolve_targets(&self, type_name: &str, filter: &Filter) -> Result<Option<Filter>> {
        let simplified = FilterSimplifier::new().simplify(filter.clone());
        if simplified.as_id().is_some() {
            return Ok(Some(simplified));
        }
        if simplified == Filter::Exclude {
            return Ok(None);
        }
        let matches: Vec<Filter> = self
            .reader(&Query::new(type_name).with_filter(simplified))?
            .map(|f| Filter::Id(f.id().clone()))
            .collect();
        if matches.is_empty() {
            trace!("session {} skips write on {}: nothing matches", self.id, type_name);
            return Ok(None);
        }
        Ok(Some(collapse(matches)))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.store.remove_storage_listener(self.store_listener);
        debug!(
            "session {} closed with {} pending deltas",
            self.id,
            self.diff.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geodelta_core::crs::AffineOperation;
    use geodelta_core::schema::FeatureTypeBuilder;
    use geodelta_core::{Crs, DataType, Envelope as Env, Geometry, Value};
    use geodelta_storage::{EventKind, MemoryStore};
    use parking_lot::Mutex;

    fn memory_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store
            .create_type(
                FeatureTypeBuilder::new("road")
                    .unwrap()
                    .add_attribute("status", DataType::String)
                    .unwrap()
                    .add_geometry("geom", Crs::new("EPSG:4326"))
                    .unwrap()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        store
            .add_features(
                "road",
                vec![
                    Feature::new("x".into())
                        .with_attribute("status", "open")
                        .with_attribute("geom", Geometry::point(0.0, 0.0)),
                    Feature::new("x".into())
                        .with_attribute("status", "open")
                        .with_attribute("geom", Geometry::point(5.0, 5.0)),
                ],
            )
            .unwrap();
        Arc::new(store)
    }

    fn status(values: &str) -> AttributeValues {
        let mut map = AttributeValues::new();
        map.insert("status".into(), Value::from(values));
        map
    }

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();
        assert!(config.asynchronous);
        assert_eq!(config.version, None);
        assert_eq!(
            SessionConfig::default().asynchronous(false).version("v1"),
            SessionConfig {
                asynchronous: false,
                version: Some("v1".into())
            }
        );
    }

    #[test]
    fn test_force_crs_tags_untagged_literals() {
        let store = memory_store();
        let session = Session::new(store);
        let query = Query::new("road")
            .with_filter(Filter::intersects("geom", Env::new(0.0, 0.0, 1.0, 1.0)));
        let forced = session.force_crs(&query, false).unwrap();
        assert_eq!(
            forced.filter(),
            &Filter::intersects(
                "geom",
                Env::new(0.0, 0.0, 1.0, 1.0).with_crs(Crs::new("EPSG:4326"))
            )
        );
    }

    #[test]
    fn test_force_crs_replace() {
        let store = memory_store();
        let registry = OperationRegistry::new().with(AffineOperation::translation(
            Crs::new("LOCAL:1"),
            Crs::new("EPSG:4326"),
            1.0,
            2.0,
        ));
        let session = Session::builder(store).operations(Arc::new(registry)).build();
        let literal = Env::new(0.0, 0.0, 1.0, 1.0).with_crs(Crs::new("LOCAL:1"));
        let query = Query::new("road").with_filter(Filter::intersects("geom", literal.clone()));

        let kept = session.force_crs(&query, false).unwrap();
        assert_eq!(kept.filter(), query.filter());

        let replaced = session.force_crs(&query, true).unwrap();
        assert_eq!(
            replaced.filter(),
            &Filter::intersects(
                "geom",
                Env::new(1.0, 2.0, 2.0, 3.0).with_crs(Crs::new("EPSG:4326"))
            )
        );
    }

    #[test]
    fn test_force_crs_leaves_plain_literals() {
        let session = Session::new(memory_store());
        let query = Query::new("road").with_filter(Filter::eq("status", "open"));
        assert_eq!(session.force_crs(&query, true).unwrap(), query);
    }

    #[test]
    fn test_versioned_session_is_read_only() {
        let store = memory_store();
        store.tag_version("v1").unwrap();
        let mut session = Session::builder(store.clone()).version("v1").build();
        assert_eq!(session.version(), Some("v1"));

        let err = session.update_features("road", &Filter::Include, &status("closed"));
        assert!(matches!(err, Err(Error::VersionedSession { .. })));
        // The version guard runs before the unknown type is noticed.
        assert!(matches!(
            session.add_features("nope", vec![]),
            Err(Error::VersionedSession { .. })
        ));
        assert!(matches!(
            session.update_features("nope", &Filter::Include, &status("closed")),
            Err(Error::VersionedSession { .. })
        ));
        assert!(matches!(
            session.remove_features("nope", &Filter::Include),
            Err(Error::VersionedSession { .. })
        ));
        assert!(matches!(session.rollback(), Err(Error::VersionedSession { .. })));
        assert!(matches!(session.commit(), Err(Error::VersionedSession { .. })));
        assert!(!session.has_pending_changes());

        store.remove_features("road", &Filter::Include).unwrap();
        assert_eq!(session.count(&Query::new("road")).unwrap(), 2);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut session = Session::new(memory_store());
        let err = session.remove_features("river", &Filter::Include);
        assert!(matches!(err, Err(Error::TypeNotFound { .. })));
        assert!(session
            .update_features("river", &Filter::Include, &AttributeValues::new())
            .is_err());
    }

    #[test]
    fn test_async_update_validates_values() {
        let mut session = Session::new(memory_store());
        let mut values = AttributeValues::new();
        values.insert("status".into(), Value::Int64(1));
        assert!(session
            .update_features("road", &Filter::Include, &values)
            .is_err());
        assert!(!session.has_pending_changes());
    }

    #[test]
    fn test_single_id_skips_materialization() {
        let mut session = Session::new(memory_store());
        session
            .update_features("road", &Filter::id("road.99"), &status("closed"))
            .unwrap();
        match session.diff().deltas().next() {
            Some(Delta::Modify(d)) => assert_eq!(d.filter(), &Filter::id("road.99")),
            other => panic!("unexpected delta {:?}", other),
        };
    }

    #[test]
    fn test_add_then_read_and_count() {
        let mut session = Session::new(memory_store());
        let ids = session
            .add_features(
                "road",
                vec![Feature::new("x".into())
                    .with_attribute("status", "planned")
                    .with_attribute("geom", Geometry::point(10.0, -1.0))],
            )
            .unwrap();
        assert!(ids[0].is_temporary());

        assert_eq!(session.count(&Query::new("road")).unwrap(), 3);
        let planned = Query::new("road").with_filter(Filter::eq("status", "planned"));
        let found: Vec<Feature> = session.reader(&planned).unwrap().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), &ids[0]);

        let env = session.envelope(&Query::new("road")).unwrap().unwrap();
        assert_eq!((env.min_x, env.min_y, env.max_x, env.max_y), (0.0, -1.0, 10.0, 5.0));
    }

    #[test]
    fn test_update_queued_add_then_commit() {
        let store = memory_store();
        let mut session = Session::new(store.clone());
        let ids = session
            .add_features("road", vec![Feature::new("x".into()).with_attribute("status", "planned")])
            .unwrap();
        session
            .update_features("road", &Filter::eq("status", "planned"), &status("open"))
            .unwrap();
        match session.diff().deltas().nth(1) {
            Some(Delta::Modify(d)) => assert_eq!(d.ids(), ids),
            other => panic!("unexpected delta {:?}", other),
        }

        session.commit().unwrap();
        let open = Query::new("road").with_filter(Filter::eq("status", "open"));
        assert_eq!(store.count(&open).unwrap(), 3);
    }

    #[test]
    fn test_modify_can_make_feature_match() {
        let mut session = Session::new(memory_store());
        session
            .update_features("road", &Filter::id("road.2"), &status("closed"))
            .unwrap();
        let closed = Query::new("road").with_filter(Filter::eq("status", "closed"));
        let ids: Vec<String> = session
            .reader(&closed)
            .unwrap()
            .map(|f| f.id().to_string())
            .collect();
        assert_eq!(ids, vec![String::from("road.2")]);

        let open = Query::new("road").with_filter(Filter::eq("status", "open"));
        assert_eq!(session.count(&open).unwrap(), 1);
    }

    #[test]
    fn test_async_events() {
        let mut session = Session::new(memory_store());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        session.add_listener(Arc::new(move |e: &StorageEvent| sink.lock().push(e.clone())));

        session
            .remove_features("road", &Filter::id("road.1"))
            .unwrap();
        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].kind(),
            &EventKind::FeaturesDeleted {
                type_name: "road".into(),
                ids: vec![FeatureId::new("road.1")],
            }
        );
        assert_eq!(events[1].kind(), &EventKind::SessionChanged);
        assert!(events.iter().all(|e| e.source() == session.source()));
    }

    #[test]
    fn test_store_events_are_forwarded() {
        let store = memory_store();
        let session = Session::new(store.clone());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let id = session.add_listener(Arc::new(move |e: &StorageEvent| sink.lock().push(e.clone())));

        store.remove_features("road", &Filter::id("road.1")).unwrap();
        store
            .create_type(
                FeatureTypeBuilder::new("river")
                    .unwrap()
                    .add_attribute("name", DataType::String)
                    .unwrap()
                    .build()
                    .unwrap(),
            )
            .unwrap();

        {
            let events = events.lock();
            assert_eq!(events.len(), 2);
            assert_eq!(events[0].source(), session.source());
            assert_eq!(events[1].source(), store.source());
        }

        assert!(session.remove_listener(id));
        store.remove_features("road", &Filter::Include).unwrap();
        assert_eq!(events.lock().len(), 2);
    }

    #[test]
    fn test_drop_unregisters_from_store() {
        let store = memory_store();
        let session = Session::new(store.clone());
        let other = Session::new(store.clone());
        drop(session);
        drop(other);
        // Dispatching to no listeners must not fail.
        store.remove_features("road", &Filter::Include).unwrap();
        assert_eq!(store.len("road").unwrap(), 0);
    }
}
