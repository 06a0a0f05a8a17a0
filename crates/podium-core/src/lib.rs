//! Core types and trait definitions for the Podium athlete record store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! It owns the domain model, the per-kind tracking schemas and every
//! validation rule that runs before a store is touched.

pub mod athlete;
pub mod encounter;
pub mod error;
pub mod history;
pub mod store;
pub mod tracking;

pub use error::{Classify, Error, ErrorKind, Result};
