//! Schema module for Geodelta feature types.
//!
//! This module contains the feature type definition and its attribute descriptors.

mod attribute;
mod feature_type;

pub use attribute::AttributeDescriptor;
pub use feature_type::{FeatureType, FeatureTypeBuilder};
