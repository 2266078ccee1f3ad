//! Infrastructure layer: the filesystem boundary and service wiring
//!
//! Services reach the disk only through [`traits::FileSystem`]; the
//! [`di::ServiceContainer`] hands every service the same instance.

pub mod di;
pub mod error;
pub mod traits;

pub use error::{InfraError, InfraResult};
