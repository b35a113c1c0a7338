//! Core types shared across apigraph facilities
//!
//! This crate provides foundational types used by the error, logging and
//! analyzer layers:
//!
//! - **Correlation types**: `RequestId` tagging a single analyzer invocation
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::RequestId;
