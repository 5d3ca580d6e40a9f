//! Geodelta Session - Pending changes over a feature store.
//!
//! This crate provides:
//!
//! - `Session`: Queues writes and shows them to its own reads until commit
//! - `SessionDiff`: The ordered log of queued deltas, with commit and rollback
//! - `Delta`: One queued add, modify or remove, able to rewrite queries and streams
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use geodelta_core::schema::FeatureTypeBuilder;
//! use geodelta_core::{AttributeValues, DataType, Feature, FeatureId, Value};
//! use geodelta_query::{Filter, Query};
//! use geodelta_session::Session;
//! use geodelta_storage::{FeatureStore, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let road = FeatureTypeBuilder::new("road")
//!     .unwrap()
//!     .add_attribute("status", DataType::String)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! store.create_type(road).unwrap();
//! store
//!     .add_features("road", vec![Feature::new(FeatureId::new("draft")).with_attribute("status", "open")])
//!     .unwrap();
//!
//! let mut session = Session::new(store.clone());
//! let mut values = AttributeValues::new();
//! values.insert("status".into(), Value::from("closed"));
//! session.update_features("road", &Filter::Include, &values).unwrap();
//!
//! let closed = Query::new("road").with_filter(Filter::eq("status", "closed"));
//! assert_eq!(session.count(&closed).unwrap(), 1);
//! assert_eq!(store.count(&closed).unwrap(), 0);
//!
//! session.commit().unwrap();
//! assert_eq!(store.count(&closed).unwrap(), 1);
//! ```

pub mod delta;
pub mod diff;
pub mod session;

pub use delta::{AddDelta, Delta, DeltaContext, ModifyDelta, RemoveDelta};
pub use diff::SessionDiff;
pub use session::{Session, SessionBuilder, SessionConfig};
