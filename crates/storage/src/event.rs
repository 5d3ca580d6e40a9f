//! Storage events fired by stores and sessions.

use geodelta_core::FeatureId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter shared by stores and sessions for source identifiers.
static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates an identifier for a new event source.
pub fn next_source_id() -> u64 {
    NEXT_SOURCE_ID.fetch_add(1, Ordering::SeqCst)
}

/// Who fired an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventSource {
    Store(u64),
    Session(u64),
}

/// What happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Features were added (identifiers may be temporary for session events).
    FeaturesAdded {
        type_name: String,
        ids: Vec<FeatureId>,
    },
    /// Features were updated.
    FeaturesUpdated {
        type_name: String,
        ids: Vec<FeatureId>,
    },
    /// Features were deleted.
    FeaturesDeleted {
        type_name: String,
        ids: Vec<FeatureId>,
    },
    /// The pending changes of a session changed (queued, committed or rolled back).
    SessionChanged,
    /// A feature type was created.
    TypeCreated { type_name: String },
    /// A feature type was dropped.
    TypeDeleted { type_name: String },
}

/// An event delivered to storage listeners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    source: EventSource,
    kind: EventKind,
}

impl StorageEvent {
    pub fn new(source: EventSource, kind: EventKind) -> Self {
        Self { source, kind }
    }

    pub fn features_added(source: EventSource, type_name: &str, ids: Vec<FeatureId>) -> Self {
        Self::new(
            source,
            EventKind::FeaturesAdded {
                type_name: type_name.into(),
                ids,
            },
        )
    }

    pub fn features_updated(source: EventSource, type_name: &str, ids: Vec<FeatureId>) -> Self {
        Self::new(
            source,
            EventKind::FeaturesUpdated {
                type_name: type_name.into(),
                ids,
            },
        )
    }

    pub fn features_deleted(source: EventSource, type_name: &str, ids: Vec<FeatureId>) -> Self {
        Self::new(
            source,
            EventKind::FeaturesDeleted {
                type_name: type_name.into(),
                ids,
            },
        )
    }

    pub fn session_changed(source: EventSource) -> Self {
        Self::new(source, EventKind::SessionChanged)
    }

    #[inline]
    pub fn source(&self) -> EventSource {
        self.source
    }

    #[inline]
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Returns true for the content family: feature additions, updates, deletions
    /// and session changes. Type creation and deletion are management events.
    pub fn is_content_event(&self) -> bool {
        !matches!(
            self.kind,
            EventKind::TypeCreated { .. } | EventKind::TypeDeleted { .. }
        )
    }

    /// Returns a copy attributed to another source.
    pub fn with_source(&self, source: EventSource) -> Self {
        Self {
            source,
            kind: self.kind.clone(),
        }
    }
}
