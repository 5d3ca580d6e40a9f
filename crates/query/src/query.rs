//! Query definition: what a caller asks a feature store for.

use crate::filter::Filter;
use alloc::string::String;
use geodelta_core::Crs;

/// A feature query against a single feature type.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    /// Target feature type.
    type_name: String,
    /// Selection filter.
    filter: Filter,
    /// Reference system the caller wants geometries expressed in.
    crs: Option<Crs>,
    /// Version label to read from, if the store keeps versions.
    version: Option<String>,
}

impl Query {
    /// Creates a query selecting every feature of `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            filter: Filter::Include,
            crs: None,
            version: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[inline]
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    #[inline]
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    #[inline]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn set_version(&mut self, version: Option<String>) {
        self.version = version;
    }

    /// Returns true if this query targets `type_name`.
    #[inline]
    pub fn targets(&self, type_name: &str) -> bool {
        self.type_name == type_name
    }
}
