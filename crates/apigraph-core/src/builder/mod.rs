//! Endpoint Descriptor Builder
//!
//! Produces one [`EndpointDescriptor`] per (method, path) from either a
//! specification document ([`openapi`]) or grouped live samples ([`samples`]).
//! Output never contains duplicate keys; a document that would produce one is
//! rejected as a whole.
//!
//! [`EndpointDescriptor`]: crate::model::EndpointDescriptor

pub mod openapi;
pub mod samples;

pub use openapi::{detect_version, parse_document, BuildOutput, SpecBuilder, SpecVersion};
pub use samples::{template_path, SampleBuilder};
