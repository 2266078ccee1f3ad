//! Domain layer: the aircraft data tree and the numeric kernel
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod aircraft;
pub mod atmosphere;
pub mod disciplines;
pub mod display;
pub mod error;
pub mod numeric;
pub mod render;
pub mod schema;
pub mod tree;
pub mod units;
pub mod value;

pub use aircraft::Aircraft;
pub use display::TreeNodeConvert;
pub use error::{DomainError, DomainResult};
pub use numeric::{fit_quadratic, interpolate_linear, maximize_1d, LineSearch, Maximum, Quadratic, Table1d};
pub use render::render;
pub use schema::{apply_entity, field_at, field_at_mut, reconstruct, Branch, Reconstruction, TreeField};
pub use tree::{flatten, Entity, FlatMap, Node, TraversalOrder, TreePath};
pub use value::Value;
