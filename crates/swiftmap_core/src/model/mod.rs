//! Resource data model: values, field metadata, tuples, schemes, resources.
//!
//! # Responsibility
//! - Define the typed shapes moved between callers, the adapter and drivers.
//! - Keep every field write behind scheme type coercion.
//!
//! # Invariants
//! - Headers are immutable after scheme declaration.
//! - A tuple is always aligned with its scheme's header order.
//! - A deleted resource is frozen.

pub mod header;
pub mod mapping;
pub mod resource;
pub mod scheme;
pub mod tuple;
pub mod value;
