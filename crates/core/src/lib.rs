//! Geodelta Core - Core types and schema definitions for Geodelta feature stores.
//!
//! This crate provides the foundational types shared by every other Geodelta crate:
//!
//! - `DataType`: Supported attribute types (Boolean, Int64, Float64, String, Geometry)
//! - `Value`: Runtime attribute values, including geometries and envelopes
//! - `Feature`: A feature with an identifier and named attribute values
//! - `Geometry` / `Envelope`: Planar shapes tagged with an optional `Crs`
//! - `crs`: Coordinate reference systems and coordinate operations
//! - `schema`: Feature type definitions (attributes, default geometry)
//! - `Error`: Error types for store and session operations
//!
//! # Example
//!
//! ```rust
//! use geodelta_core::{Crs, DataType, Feature, FeatureId, Value};
//! use geodelta_core::schema::FeatureTypeBuilder;
//!
//! let road = FeatureTypeBuilder::new("road")
//!     .unwrap()
//!     .add_attribute("name", DataType::String)
//!     .unwrap()
//!     .add_geometry("geom", Crs::new("EPSG:4326"))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let feature = Feature::new(FeatureId::new("road.1"))
//!     .with_attribute("name", Value::from("High Street"));
//!
//! assert_eq!(road.default_geometry(), Some("geom"));
//! assert_eq!(feature.get("name"), Some(&Value::String("High Street".into())));
//! ```

#![no_std]

extern crate alloc;

pub mod crs;
mod error;
mod feature;
mod geometry;
pub mod schema;
mod types;
mod value;

pub use crs::{Crs, OperationFactory, OperationRegistry};
pub use error::{Error, Result};
pub use feature::{next_temporary_id, AttributeValues, Feature, FeatureId, IdMap};
pub use geometry::{Coordinate, Envelope, Geometry, Shape};
pub use types::DataType;
pub use value::Value;
