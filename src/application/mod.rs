//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod sectioned;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::{IoResultExt, ParseResultExt};
pub use sectioned::{parse_sectioned_text, serialize_to_sectioned_text, Formatting, SectionStyle};
