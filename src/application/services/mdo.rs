//! Optimization adapter: path-addressed access to the aircraft tree for an
//! external MDO engine.
//!
//! The engine sees flat numeric vectors. [`DesignSpace`] maps those vectors
//! onto design variable paths, [`Scenario`] reads the objective and
//! constraints back out, and [`Discipline`]s recompute the tree in between.
//! Paths come from the static schema, so a given path names the same
//! quantity for the lifetime of the process.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, instrument, trace};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::disciplines::{high_speed, propulsion};
use crate::domain::numeric::LineSearch;
use crate::domain::{
    field_at, field_at_mut, Aircraft, Branch, DomainError, DomainResult, Node, Reconstruction,
    TraversalOrder, TreePath, Value,
};

// ============================================================
// Path access
// ============================================================

/// Read the leaf at `path`.
///
/// # Errors
/// - `KeyNotFound` if nothing lives at `path`.
/// - `SchemaMismatch` if `path` names a branch.
pub fn get_leaf(tree: &dyn Branch, path: &TreePath) -> DomainResult<Value> {
    let name = path.name().unwrap_or_default();
    let field = field_at(tree, path).ok_or_else(|| DomainError::KeyNotFound(path.to_string()))?;
    match field.to_node(name) {
        Node::Leaf(v) => Ok(v),
        Node::Entity(_) => Err(DomainError::mismatch(path.to_string(), "leaf", "branch")),
    }
}

/// Overwrite the leaf at `path`; the value must match the leaf's kind.
pub fn set_leaf(tree: &mut dyn Branch, path: &TreePath, value: Value) -> DomainResult<()> {
    let field = field_at_mut(tree, path).ok_or_else(|| DomainError::KeyNotFound(path.to_string()))?;
    field.assign(path, &Node::Leaf(value), &mut Reconstruction::default())
}

/// Every leaf path in declaration order.
pub fn enumerate_paths(tree: &dyn Branch) -> Vec<TreePath> {
    tree.flatten(TraversalOrder::Declaration).keys().cloned().collect()
}

fn get_f64(tree: &dyn Branch, path: &TreePath) -> DomainResult<f64> {
    let value = get_leaf(tree, path)?;
    value
        .as_f64()
        .ok_or_else(|| DomainError::mismatch(path.to_string(), "float", value.kind()))
}

// ============================================================
// Design space
// ============================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DesignVariable {
    pub path: TreePath,
    pub lower: f64,
    pub upper: f64,
    /// Initial value
    pub value: f64,
}

/// Ordered design variables; the order defines the optimizer's vector layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignSpace {
    variables: Vec<DesignVariable>,
}

impl DesignSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable.
    ///
    /// # Errors
    /// `InvalidInput` for a malformed or duplicate path, non-finite bounds,
    /// or an initial value outside `[lower, upper]`.
    pub fn add_variable(&mut self, path: &str, lower: f64, upper: f64, value: f64) -> DomainResult<()> {
        let path: TreePath = path.parse()?;
        if self.variables.iter().any(|v| v.path == path) {
            return Err(DomainError::InvalidInput(format!("duplicate design variable: {}", path)));
        }
        if !(lower.is_finite() && upper.is_finite() && lower <= value && value <= upper) {
            return Err(DomainError::InvalidInput(format!(
                "{}: initial value {} outside bounds [{}, {}]",
                path, value, lower, upper
            )));
        }
        self.variables.push(DesignVariable {
            path,
            lower,
            upper,
            value,
        });
        Ok(())
    }

    pub fn variables(&self) -> &[DesignVariable] {
        &self.variables
    }

    pub fn paths(&self) -> Vec<TreePath> {
        self.variables.iter().map(|v| v.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn initial_values(&self) -> Vec<f64> {
        self.variables.iter().map(|v| v.value).collect()
    }

    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.variables.iter().map(|v| (v.lower, v.upper)).collect()
    }

    /// Current values of the design variables in `tree`.
    pub fn values(&self, tree: &dyn Branch) -> DomainResult<Vec<f64>> {
        self.variables.iter().map(|v| get_f64(tree, &v.path)).collect()
    }

    /// Write `xs` into `tree`, one entry per variable.
    pub fn apply(&self, tree: &mut dyn Branch, xs: &[f64]) -> DomainResult<()> {
        if xs.len() != self.variables.len() {
            return Err(DomainError::InvalidInput(format!(
                "expected {} design values, got {}",
                self.variables.len(),
                xs.len()
            )));
        }
        for (var, x) in self.variables.iter().zip(xs) {
            set_leaf(tree, &var.path, Value::Float(*x))?;
        }
        Ok(())
    }

    /// Write the initial values into `tree`.
    pub fn initialize(&self, tree: &mut dyn Branch) -> DomainResult<()> {
        self.apply(tree, &self.initial_values())
    }

    /// Map `xs` onto `[0, 1]` per variable.
    pub fn normalize(&self, xs: &[f64]) -> Vec<f64> {
        self.variables
            .iter()
            .zip(xs)
            .map(|(v, x)| if v.upper > v.lower { (x - v.lower) / (v.upper - v.lower) } else { 0.0 })
            .collect()
    }

    /// Inverse of [`DesignSpace::normalize`].
    pub fn unnormalize(&self, us: &[f64]) -> Vec<f64> {
        self.variables
            .iter()
            .zip(us)
            .map(|(v, u)| v.lower + u * (v.upper - v.lower))
            .collect()
    }
}

// ============================================================
// Scenario
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Inequality,
    Equality,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub path: TreePath,
    pub kind: ConstraintKind,
    /// Inequality is satisfied when the leaf is non-negative (otherwise
    /// non-positive).
    pub positive: bool,
}

impl Constraint {
    /// Value in the `g <= 0` (inequality) or `h == 0` (equality) convention.
    pub fn normalized(&self, value: f64) -> f64 {
        match (self.kind, self.positive) {
            (ConstraintKind::Inequality, true) => -value,
            _ => value,
        }
    }
}

/// Objective and constraint values in minimization convention.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub objective: f64,
    pub constraints: Vec<f64>,
}

impl Evaluation {
    pub fn is_feasible(&self, scenario: &Scenario, tolerance: f64) -> bool {
        scenario
            .constraints()
            .iter()
            .zip(&self.constraints)
            .all(|(c, g)| match c.kind {
                ConstraintKind::Inequality => *g <= tolerance,
                ConstraintKind::Equality => g.abs() <= tolerance,
            })
    }
}

/// Objective path, direction and constraints of an optimization problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub objective: TreePath,
    pub maximize: bool,
    /// Affine objective transform `(value - offset) * scale`
    pub objective_offset: f64,
    pub objective_scale: f64,
    constraints: Vec<Constraint>,
}

impl Scenario {
    pub fn new(objective: &str, maximize: bool) -> DomainResult<Self> {
        Ok(Self {
            objective: objective.parse()?,
            maximize,
            objective_offset: 0.0,
            objective_scale: 1.0,
            constraints: Vec::new(),
        })
    }

    pub fn with_objective_transform(mut self, offset: f64, scale: f64) -> Self {
        self.objective_offset = offset;
        self.objective_scale = scale;
        self
    }

    pub fn add_constraint(&mut self, path: &str, kind: ConstraintKind, positive: bool) -> DomainResult<()> {
        let path: TreePath = path.parse()?;
        if self.constraints.iter().any(|c| c.path == path) {
            return Err(DomainError::InvalidInput(format!("duplicate constraint: {}", path)));
        }
        self.constraints.push(Constraint { path, kind, positive });
        Ok(())
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Paths the scenario reads, objective first.
    pub fn output_paths(&self) -> Vec<TreePath> {
        std::iter::once(self.objective.clone())
            .chain(self.constraints.iter().map(|c| c.path.clone()))
            .collect()
    }

    /// Read objective and constraints from `tree`.
    pub fn evaluate(&self, tree: &dyn Branch) -> DomainResult<Evaluation> {
        let raw = get_f64(tree, &self.objective)?;
        let transformed = (raw - self.objective_offset) * self.objective_scale;
        let objective = if self.maximize { -transformed } else { transformed };
        let constraints = self
            .constraints
            .iter()
            .map(|c| get_f64(tree, &c.path).map(|v| c.normalized(v)))
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(Evaluation {
            objective,
            constraints,
        })
    }
}

// ============================================================
// Disciplines
// ============================================================

/// A computation that reads some leaves of the aircraft and writes others.
pub trait Discipline: Send + Sync {
    fn name(&self) -> &str;

    fn inputs(&self) -> &[TreePath];

    fn outputs(&self) -> &[TreePath];

    fn execute(&self, aircraft: &mut Aircraft) -> DomainResult<()>;
}

/// Discipline backed by a plain function.
pub struct FnDiscipline<F> {
    name: String,
    inputs: Vec<TreePath>,
    outputs: Vec<TreePath>,
    func: F,
}

impl<F> FnDiscipline<F>
where
    F: Fn(&mut Aircraft) -> DomainResult<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, inputs: &[&str], outputs: &[&str], func: F) -> DomainResult<Self> {
        let parse = |paths: &[&str]| paths.iter().map(|p| p.parse()).collect::<DomainResult<Vec<TreePath>>>();
        Ok(Self {
            name: name.into(),
            inputs: parse(inputs)?,
            outputs: parse(outputs)?,
            func,
        })
    }
}

impl<F> Discipline for FnDiscipline<F>
where
    F: Fn(&mut Aircraft) -> DomainResult<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[TreePath] {
        &self.inputs
    }

    fn outputs(&self) -> &[TreePath] {
        &self.outputs
    }

    fn execute(&self, aircraft: &mut Aircraft) -> DomainResult<()> {
        (self.func)(aircraft)
    }
}

/// Disciplines run in sequence.
///
/// Inputs of the chain are the inputs of its members not produced by an
/// earlier member; outputs are the union of the members' outputs.
#[derive(Default)]
pub struct DisciplineChain {
    members: Vec<Box<dyn Discipline>>,
    inputs: Vec<TreePath>,
    outputs: Vec<TreePath>,
}

impl DisciplineChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, discipline: impl Discipline + 'static) {
        for input in discipline.inputs() {
            if !self.outputs.contains(input) && !self.inputs.contains(input) {
                self.inputs.push(input.clone());
            }
        }
        for output in discipline.outputs() {
            if !self.outputs.contains(output) {
                self.outputs.push(output.clone());
            }
        }
        self.members.push(Box::new(discipline));
    }

    pub fn with(mut self, discipline: impl Discipline + 'static) -> Self {
        self.push(discipline);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|d| d.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Discipline for DisciplineChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn inputs(&self) -> &[TreePath] {
        &self.inputs
    }

    fn outputs(&self) -> &[TreePath] {
        &self.outputs
    }

    fn execute(&self, aircraft: &mut Aircraft) -> DomainResult<()> {
        for member in &self.members {
            trace!(discipline = member.name(), "executing");
            member.execute(aircraft)?;
        }
        Ok(())
    }
}

/// The propulsion discipline with its declared interface.
pub fn propulsion_discipline() -> DomainResult<impl Discipline> {
    FnDiscipline::new(
        "propulsion",
        &[
            "design_driver.cruise_mach",
            "design_driver.ref_cruise_altp",
            "design_driver.top_of_climb_altp",
            "turbofan_engine.n_engine",
            "turbofan_engine.bpr",
            "turbofan_engine.reference_thrust",
            "turbofan_engine.rating_factor",
            "turbofan_engine.core_thrust_ratio",
            "turbofan_nacelle.efficiency_prop",
        ],
        &[
            "propulsion.mto_thrust_ref",
            "propulsion.mcn_thrust_ref",
            "propulsion.mcl_thrust_ref",
            "propulsion.mcr_thrust_ref",
            "propulsion.sfc_cruise_ref",
        ],
        propulsion,
    )
}

/// The high speed performance discipline using `search` for the optimum.
pub fn high_speed_discipline(search: LineSearch) -> DomainResult<impl Discipline> {
    FnDiscipline::new(
        "high_speed",
        &[
            "design_driver.cruise_mach",
            "aerodynamics.cruise_lod_max",
            "aerodynamics.drag_rise_mach",
            "aerodynamics.drag_rise_factor",
        ],
        &[
            "high_speed.best_lod_mach",
            "high_speed.max_mach_lod",
            "high_speed.perfo_constraint_1",
        ],
        move |aircraft: &mut Aircraft| high_speed(aircraft, &search),
    )
}

// ============================================================
// Jacobian
// ============================================================

/// Sensitivities `d output / d input`, one row per output.
#[derive(Debug, Clone, PartialEq)]
pub struct Jacobian {
    pub inputs: Vec<TreePath>,
    pub outputs: Vec<TreePath>,
    pub rows: Vec<Vec<f64>>,
}

impl Jacobian {
    pub fn get(&self, output: &TreePath, input: &TreePath) -> Option<f64> {
        let i = self.outputs.iter().position(|p| p == output)?;
        let j = self.inputs.iter().position(|p| p == input)?;
        Some(self.rows[i][j])
    }
}

/// Forward-difference Jacobian of `discipline` around `model`.
///
/// The perturbation for input `x` is `step * max(|x|, 1)`. Every column is
/// evaluated on its own deep copy of `model`, in parallel on the current
/// rayon pool; `model` itself is never written.
#[instrument(level = "debug", skip_all, fields(discipline = discipline.name(), n_in = inputs.len(), n_out = outputs.len()))]
pub fn finite_difference_jacobian(
    model: &Aircraft,
    inputs: &[TreePath],
    outputs: &[TreePath],
    step: f64,
    discipline: &dyn Discipline,
) -> DomainResult<Jacobian> {
    if !(step.is_finite() && step > 0.0) {
        return Err(DomainError::InvalidInput(format!(
            "finite difference step must be positive, got {}",
            step
        )));
    }
    let read_outputs = |tree: &Aircraft| -> DomainResult<Vec<f64>> {
        outputs.iter().map(|p| get_f64(tree, p)).collect()
    };

    let mut reference = model.clone();
    discipline.execute(&mut reference)?;
    let y0 = read_outputs(&reference)?;

    let columns = inputs
        .par_iter()
        .map(|input| -> DomainResult<Vec<f64>> {
            let mut perturbed = model.clone();
            let x = get_f64(&perturbed, input)?;
            let h = step * x.abs().max(1.0);
            set_leaf(&mut perturbed, input, Value::Float(x + h))?;
            discipline.execute(&mut perturbed)?;
            let y = read_outputs(&perturbed)?;
            Ok(y.iter().zip(&y0).map(|(yi, y0i)| (yi - y0i) / h).collect())
        })
        .collect::<DomainResult<Vec<_>>>()?;

    let rows = (0..outputs.len())
        .map(|i| columns.iter().map(|col| col[i]).collect())
        .collect();
    debug!("jacobian assembled");

    Ok(Jacobian {
        inputs: inputs.to_vec(),
        outputs: outputs.to_vec(),
        rows,
    })
}

// ============================================================
// Service
// ============================================================

/// Evaluates design points on behalf of an optimization engine.
pub struct MdoService {
    settings: Arc<Settings>,
}

impl MdoService {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Propulsion followed by high speed performance.
    pub fn standard_chain(&self) -> ApplicationResult<DisciplineChain> {
        let search = self.settings.numeric.line_search();
        Ok(DisciplineChain::new()
            .with(propulsion_discipline()?)
            .with(high_speed_discipline(search)?))
    }

    /// Apply `xs`, run `discipline`, and read back the scenario values.
    #[instrument(level = "debug", skip_all)]
    pub fn evaluate(
        &self,
        aircraft: &mut Aircraft,
        space: &DesignSpace,
        xs: &[f64],
        discipline: &dyn Discipline,
        scenario: &Scenario,
    ) -> ApplicationResult<Evaluation> {
        space.apply(aircraft, xs)?;
        discipline.execute(aircraft)?;
        let evaluation = scenario.evaluate(aircraft)?;
        debug!(objective = evaluation.objective, "design point evaluated");
        Ok(evaluation)
    }

    /// [`finite_difference_jacobian`] with the configured step and worker count.
    pub fn jacobian(
        &self,
        model: &Aircraft,
        inputs: &[TreePath],
        outputs: &[TreePath],
        discipline: &dyn Discipline,
    ) -> ApplicationResult<Jacobian> {
        let mdo = &self.settings.mdo;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(mdo.jacobian_workers)
            .build()
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("start {} jacobian workers", mdo.jacobian_workers),
                source: Box::new(e),
            })?;
        info!(
            workers = pool.current_num_threads(),
            columns = inputs.len(),
            "computing finite difference jacobian"
        );
        let jacobian =
            pool.install(|| finite_difference_jacobian(model, inputs, outputs, mdo.jacobian_step, discipline))?;
        Ok(jacobian)
    }
}
