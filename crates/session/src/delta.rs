//! Queued mutations.
//!
//! A `Delta` is one pending add, modify or remove. Besides applying itself
//! to a store on commit, it knows how to make reads reflect it:
//!
//! - `rewrite_query` widens what the store is asked for
//! - `rewrite_stream` wraps the features the store returned
//!
//! Modify and remove targets are canonical filters (see
//! `geodelta_query::canonical`), so queued deltas never re-evaluate a
//! predicate against data that later deltas may have changed.

use geodelta_core::schema::FeatureType;
use geodelta_core::{
    next_temporary_id, AttributeValues, Envelope, Error, Feature, FeatureId, IdMap,
    OperationFactory, Result,
};
use geodelta_query::{identifiers, is_canonical, remap_identifiers, Filter, Query};
use geodelta_storage::reproject::{reproject_feature, reproject_value};
use geodelta_storage::{FeatureReader, FeatureStore};
use log::{debug, warn};
use std::sync::Arc;

/// What a delta needs from its session while rewriting a stream.
#[derive(Clone)]
pub struct DeltaContext {
    pub store: Arc<dyn FeatureStore>,
    pub operations: Arc<dyn OperationFactory>,
}

impl DeltaContext {
    pub fn new(store: Arc<dyn FeatureStore>, operations: Arc<dyn OperationFactory>) -> Self {
        Self { store, operations }
    }
}

/// A queued mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum Delta {
    Add(AddDelta),
    Modify(ModifyDelta),
    Remove(RemoveDelta),
}

impl Delta {
    /// Returns the feature type this delta applies to.
    pub fn type_name(&self) -> &str {
        match self {
            Delta::Add(d) => &d.type_name,
            Delta::Modify(d) => &d.type_name,
            Delta::Remove(d) => &d.type_name,
        }
    }

    /// Returns a short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Delta::Add(_) => "add",
            Delta::Modify(_) => "modify",
            Delta::Remove(_) => "remove",
        }
    }

    /// Returns the query the store must answer for this delta to be reflected.
    pub fn rewrite_query(&self, query: &Query) -> Query {
        match self {
            Delta::Add(_) => query.clone(),
            Delta::Modify(d) => widen(query, &d.type_name, &d.filter),
            Delta::Remove(d) => widen(query, &d.type_name, &d.filter),
        }
    }

    /// Wraps `stream` so it reflects this delta.
    ///
    /// `query` is the query as it was before this delta widened it.
    pub fn rewrite_stream(
        &self,
        ctx: &DeltaContext,
        query: &Query,
        stream: FeatureReader,
    ) -> FeatureReader {
        match self {
            Delta::Add(d) => d.rewrite_stream(ctx, query, stream),
            Delta::Modify(d) => d.rewrite_stream(ctx, query, stream),
            Delta::Remove(d) => d.rewrite_stream(query, stream),
        }
    }

    /// Adjusts a count computed by the store.
    pub fn rewrite_count(&self, query: &Query, count: usize) -> usize {
        match self {
            Delta::Add(d) => d.rewrite_count(query, count),
            Delta::Modify(_) | Delta::Remove(_) => count,
        }
    }

    /// Adjusts bounds computed by the store.
    pub fn rewrite_envelope(&self, query: &Query, envelope: Option<Envelope>) -> Option<Envelope> {
        match self {
            Delta::Add(d) => d.rewrite_envelope(query, envelope),
            Delta::Modify(_) | Delta::Remove(_) => envelope,
        }
    }

    /// Rewrites the identifiers this delta targets.
    pub fn remap_identifiers(&mut self, id_map: &IdMap) {
        match self {
            Delta::Add(_) => {}
            Delta::Modify(d) => d.remap_identifiers(id_map),
            Delta::Remove(d) => d.remap_identifiers(id_map),
        }
    }

    /// Applies this delta to `store`.
    ///
    /// Returns the temporary → permanent identifier map when the store
    /// assigned identifiers.
    pub fn apply_to(&self, store: &dyn FeatureStore) -> Result<Option<IdMap>> {
        match self {
            Delta::Add(d) => d.apply_to(store).map(Some),
            Delta::Modify(d) => store
                .update_features(&d.type_name, &d.filter, &d.values)
                .map(|_| None),
            Delta::Remove(d) => store.remove_features(&d.type_name, &d.filter).map(|_| None),
        }
    }

    /// Discards this delta without applying it.
    pub fn dispose(self) {
        debug!("disposing {} delta on {}", self.kind(), self.type_name());
    }
}

/// `query` with `target` OR-ed into its selection, if it reads `type_name`.
fn widen(query: &Query, type_name: &str, target: &Filter) -> Query {
    if !query.targets(type_name) {
        return query.clone();
    }
    let mut widened = query.clone();
    widened.set_filter(Filter::or(query.filter().clone(), target.clone()));
    widened
}

fn check_type_name(type_name: &str) -> Result<()> {
    if type_name.is_empty() {
        return Err(Error::invalid_argument("type name must not be empty"));
    }
    Ok(())
}

fn check_target(filter: &Filter) -> Result<()> {
    if !is_canonical(filter) {
        return Err(Error::invalid_argument(
            "target filter must be Exclude, an identifier or an OR of identifiers",
        ));
    }
    Ok(())
}

/// Features waiting to be added.
#[derive(Clone, Debug, PartialEq)]
pub struct AddDelta {
    type_name: String,
    features: Vec<Feature>,
}

impl AddDelta {
    /// Queues `features`, giving each one a temporary identifier.
    pub fn new(type_name: impl Into<String>, features: Vec<Feature>) -> Result<Self> {
        let type_name = type_name.into();
        check_type_name(&type_name)?;
        let features = features
            .into_iter()
            .map(|mut f| {
                f.set_id(next_temporary_id(&type_name));
                f
            })
            .collect();
        Ok(Self {
            type_name,
            features,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Returns the temporary identifiers of the queued features.
    pub fn ids(&self) -> Vec<FeatureId> {
        self.features.iter().map(|f| f.id().clone()).collect()
    }

    fn matching<'a>(&'a self, query: &'a Query) -> impl Iterator<Item = &'a Feature> + 'a {
        let targeted = query.targets(&self.type_name);
        self.features
            .iter()
            .filter(move |f| targeted && query.filter().evaluate(f))
    }

    /// Appends the queued features after `stream`.
    ///
    /// Every queued feature of the type is injected: a later delta may change
    /// whether it matches, and the session filters the final stream.
    fn rewrite_stream(&self, ctx: &DeltaContext, query: &Query, stream: FeatureReader) -> FeatureReader {
        if !query.targets(&self.type_name) || self.features.is_empty() {
            return stream;
        }
        let mut injected = self.features.clone();
        if let Some(target) = query.crs() {
            injected = match ctx.store.feature_type(&self.type_name) {
                Ok(feature_type) => injected
                    .into_iter()
                    .filter_map(|mut f| {
                        match reproject_feature(&mut f, &feature_type, target, &*ctx.operations) {
                            Ok(()) => Some(f),
                            Err(e) => {
                                warn!("dropping queued feature {}: {}", f.id(), e);
                                None
                            }
                        }
                    })
                    .collect(),
                Err(e) => {
                    warn!("dropping queued features of {}: {}", self.type_name, e);
                    Vec::new()
                }
            };
        }
        Box::new(stream.chain(injected))
    }

    fn rewrite_count(&self, query: &Query, count: usize) -> usize {
        count + self.matching(query).count()
    }

    fn rewrite_envelope(&self, query: &Query, envelope: Option<Envelope>) -> Option<Envelope> {
        self.matching(query)
            .filter_map(Feature::envelope)
            .fold(envelope, |acc, env| match acc {
                Some(acc) => Some(acc.union(&env)),
                None => Some(env),
            })
    }

    fn apply_to(&self, store: &dyn FeatureStore) -> Result<IdMap> {
        let assigned = store.add_features(&self.type_name, self.features.clone())?;
        Ok(self
            .features
            .iter()
            .map(|f| f.id().clone())
            .zip(assigned)
            .collect())
    }
}

/// Attribute changes waiting to be applied to a fixed set of features.
#[derive(Clone, Debug, PartialEq)]
pub struct ModifyDelta {
    type_name: String,
    filter: Filter,
    values: AttributeValues,
}

impl ModifyDelta {
    /// Fails on an empty type name, a non-canonical `filter` or empty `values`.
    pub fn new(type_name: impl Into<String>, filter: Filter, values: AttributeValues) -> Result<Self> {
        let type_name = type_name.into();
        check_type_name(&type_name)?;
        check_target(&filter)?;
        if values.is_empty() {
            return Err(Error::invalid_argument(
                "a modify delta needs at least one attribute value",
            ));
        }
        Ok(Self {
            type_name,
            filter,
            values,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn values(&self) -> &AttributeValues {
        &self.values
    }

    pub fn ids(&self) -> Vec<FeatureId> {
        identifiers(&self.filter)
    }

    /// Sets the queued values on every targeted feature.
    ///
    /// Geometry values are expressed in the query's CRS when one is requested.
    /// Their coordinates are read in the attribute's declared CRS, and a tag
    /// carried by the value itself is ignored. A feature whose value cannot be
    /// reprojected is logged and dropped.
    fn rewrite_stream(&self, ctx: &DeltaContext, query: &Query, stream: FeatureReader) -> FeatureReader {
        if !query.targets(&self.type_name) {
            return stream;
        }
        let ctx = ctx.clone();
        let target = self.filter.clone();
        let values = self.values.clone();
        let type_name = self.type_name.clone();
        let crs = query.crs().cloned();
        Box::new(stream.filter_map(move |mut feature| {
            if !target.evaluate(&feature) {
                return Some(feature);
            }
            let outcome = match crs.as_ref() {
                Some(crs) => reprojected_values(&ctx, &type_name, &values, crs),
                None => Ok(values.clone()),
            };
            match outcome {
                Ok(values) => {
                    for (name, value) in values {
                        feature.set(name, value);
                    }
                    Some(feature)
                }
                Err(e) => {
                    warn!("dropping feature {} from modified stream: {}", feature.id(), e);
                    None
                }
            }
        }))
    }

    fn remap_identifiers(&mut self, id_map: &IdMap) {
        if id_map.is_empty() {
            return;
        }
        self.filter = remap_identifiers(&self.filter, id_map);
    }
}

/// `values` with every geometry attribute value expressed in `target`.
fn reprojected_values(
    ctx: &DeltaContext,
    type_name: &str,
    values: &AttributeValues,
    target: &geodelta_core::Crs,
) -> Result<AttributeValues> {
    let mut feature_type: Option<Arc<FeatureType>> = None;
    let mut out = AttributeValues::new();
    for (name, value) in values {
        if !value.is_spatial() {
            out.insert(name.clone(), value.clone());
            continue;
        }
        let ft = match &feature_type {
            Some(ft) => Arc::clone(ft),
            None => {
                let ft = ctx.store.feature_type(type_name)?;
                feature_type = Some(Arc::clone(&ft));
                ft
            }
        };
        let reprojected = if ft.attribute(name).map_or(false, |a| a.is_geometry()) {
            reproject_value(value, ft.crs_of(name), target, &*ctx.operations)?
        } else {
            value.clone()
        };
        out.insert(name.clone(), reprojected);
    }
    Ok(out)
}

/// Deletion waiting to be applied to a fixed set of features.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoveDelta {
    type_name: String,
    filter: Filter,
}

impl RemoveDelta {
    /// Fails on an empty type name or a non-canonical `filter`.
    pub fn new(type_name: impl Into<String>, filter: Filter) -> Result<Self> {
        let type_name = type_name.into();
        check_type_name(&type_name)?;
        check_target(&filter)?;
        Ok(Self { type_name, filter })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn ids(&self) -> Vec<FeatureId> {
        identifiers(&self.filter)
    }

    fn rewrite_stream(&self, query: &Query, stream: FeatureReader) -> FeatureReader {
        if !query.targets(&self.type_name) {
            return stream;
        }
        let target = self.filter.clone();
        Box::new(stream.filter(move |f| !target.evaluate(f)))
    }

    fn remap_identifiers(&mut self, id_map: &IdMap) {
        if id_map.is_empty() {
            return;
        }
        self.filter = remap_identifiers(&self.filter, id_map);
    }
}
