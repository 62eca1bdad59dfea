//! Interface definitions for reading records.
//!
//! This module defines the abstract `RecordSource` trait consumed by the
//! synchronization pipeline, allowing swappable store implementations.

mod record_source;

pub use record_source::{RecordSource, RecordStream};
