//! Core domain model for the asynchronous chunked-job orchestration system:
//! entities, value objects, ports, and the pure Linguistic Normalizer.
//!
//! This crate has no I/O: everything here is either a plain data type, a
//! trait seam implemented elsewhere, or a pure function.

pub mod constants;
pub mod entities;
pub mod error;
pub mod events;
pub mod normalizer;
pub mod ports;
pub mod value_objects;

pub use error::{Error, Result};
