//! Geodelta Storage - Feature store contract and in-memory store.
//!
//! This crate provides the storage side consumed by sessions:
//!
//! - `FeatureStore`: The store contract (schema lookup, reads, bulk writes, events)
//! - `MemoryStore`: An in-memory reference store with version tags
//! - `StorageEvent`: Content and management events fired by stores and sessions
//! - `ListenerRegistry` / `ListenerSet`: Weak and strong listener collections
//! - `reproject`: Reprojection of attribute values between reference systems
//!
//! # Example
//!
//! ```rust
//! use geodelta_core::schema::FeatureTypeBuilder;
//! use geodelta_core::{DataType, Feature, FeatureId};
//! use geodelta_query::Query;
//! use geodelta_storage::{FeatureStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let road = FeatureTypeBuilder::new("road")
//!     .unwrap()
//!     .add_attribute("status", DataType::String)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! store.create_type(road).unwrap();
//!
//! let feature = Feature::new(FeatureId::new("draft")).with_attribute("status", "open");
//! let ids = store.add_features("road", vec![feature]).unwrap();
//!
//! assert_eq!(ids, vec![FeatureId::new("road.1")]);
//! assert_eq!(store.count(&Query::new("road")).unwrap(), 1);
//! ```

pub mod event;
pub mod listener;
pub mod memory;
pub mod reproject;
pub mod store;

pub use event::{next_source_id, EventKind, EventSource, StorageEvent};
pub use listener::{ListenerId, ListenerRegistry, ListenerSet, StorageListener};
pub use memory::MemoryStore;
pub use store::{envelope_of, FeatureReader, FeatureStore};
