//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem) but are themselves
//! concrete structs, not traits.

pub mod mdo;
mod persistence;

pub use mdo::{
    enumerate_paths, finite_difference_jacobian, get_leaf, set_leaf, Constraint, ConstraintKind,
    DesignSpace, DesignVariable, Discipline, DisciplineChain, Evaluation, FnDiscipline, Jacobian,
    MdoService, Scenario,
};
pub use persistence::PersistenceService;
