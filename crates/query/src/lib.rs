//! Geodelta Query - Filter and query model for Geodelta feature stores.
//!
//! This crate provides:
//!
//! - `filter`: The `Filter` tree, its evaluation against features and literal rewriting
//! - `query`: `Query`, the target type + selection + requested CRS sent to a store
//! - `simplify`: Constant folding of include/exclude through logical operators
//! - `canonical`: Identifier-set decomposition of filters (`list`, `collapse`, `remap_identifiers`)

#![no_std]

extern crate alloc;

pub mod canonical;
pub mod filter;
pub mod query;
pub mod simplify;

pub use canonical::{collapse, identifiers, is_canonical, list, remap_identifiers};
pub use filter::{CompareOp, Filter};
pub use query::Query;
pub use simplify::FilterSimplifier;
