// rt-core/src/engines/mod.rs
//! Concrete `FilterEngine` implementations.
//!
//! `pipeline` is the declarative stage pipeline every on-disk filter is run
//! through.

pub mod pipeline;
