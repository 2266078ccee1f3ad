//! High speed performance: the Mach number of best range factor.

use tracing::{debug, instrument};

use crate::domain::aircraft::Aircraft;
use crate::domain::error::DomainResult;
use crate::domain::numeric::{LineSearch, Maximum, Table1d};

/// Mach increment used while bracketing the optimum.
const MACH_STEP: f64 = 0.005;

/// Range factor `mach * L/D` with L/D degraded by the drag rise table.
pub fn mach_lod(aircraft: &Aircraft) -> DomainResult<impl Fn(f64) -> f64> {
    let aero = &aircraft.aerodynamics;
    let drag_rise = Table1d::new(&aero.drag_rise_mach, &aero.drag_rise_factor)?;
    let lod_max = aero.cruise_lod_max;
    Ok(move |mach: f64| mach * lod_max / drag_rise.eval(mach))
}

/// Locate the Mach number maximizing `mach * L/D`, starting from the
/// design cruise Mach.
pub fn best_lod_mach(aircraft: &Aircraft, search: &LineSearch) -> DomainResult<Maximum> {
    let objective = mach_lod(aircraft)?;
    search.maximize(aircraft.design_driver.cruise_mach, MACH_STEP, objective)
}

/// Fill `high_speed.best_lod_mach`, `high_speed.max_mach_lod` and the
/// cruise Mach margin `high_speed.perfo_constraint_1` (non-negative when
/// cruise is at or below the best range Mach).
#[instrument(level = "debug", skip(aircraft, search))]
pub fn high_speed(aircraft: &mut Aircraft, search: &LineSearch) -> DomainResult<()> {
    let best = best_lod_mach(aircraft, search)?;
    let cruise_mach = aircraft.design_driver.cruise_mach;

    let branch = &mut aircraft.high_speed;
    branch.best_lod_mach = best.x;
    branch.max_mach_lod = best.value;
    branch.perfo_constraint_1 = (best.x - cruise_mach) / cruise_mach;
    debug!(mach = best.x, mach_lod = best.value, evaluations = best.evaluations, "best range mach");
    Ok(())
}
