//! Aircraft sizing data tree, numeric kernel and optimization adapter.
//!
//! Layers, innermost first:
//! - [`domain`]: value tree, typed aircraft schema, numeric kernel, disciplines
//! - [`application`]: sectioned text format, persistence and MDO services
//! - [`infrastructure`]: filesystem boundary and service wiring
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
