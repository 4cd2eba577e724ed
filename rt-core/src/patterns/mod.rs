//! Pattern handling shared by every stage of the filter pipeline.
//!
//! `compiler` owns the thread-safe regex cache and the length/size limits that
//! apply to every pattern a filter declares.

pub mod compiler;
