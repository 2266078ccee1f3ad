//! Turbofan engine models: thrust lapse, bucket SFC, nacelle drag.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, instrument};

use crate::domain::aircraft::Aircraft;
use crate::domain::atmosphere::{air_density, atmosphere, reynolds_number, sound_speed};
use crate::domain::error::{DomainError, DomainResult};

/// Engine rating; the discriminant indexes `turbofan_engine.rating_factor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rating {
    /// Maximum take-off
    Mto = 0,
    /// Maximum continuous
    Mcn = 1,
    /// Maximum climb
    Mcl = 2,
    /// Maximum cruise
    Mcr = 3,
    /// Flight idle
    Fid = 4,
}

impl Rating {
    pub const ALL: [Rating; 5] = [Rating::Mto, Rating::Mcn, Rating::Mcl, Rating::Mcr, Rating::Fid];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rating::Mto => "MTO",
            Rating::Mcn => "MCN",
            Rating::Mcl => "MCL",
            Rating::Mcr => "MCR",
            Rating::Fid => "FID",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Rating {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rating::ALL
            .into_iter()
            .find(|r| r.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown rating: {}", s)))
    }
}

/// Ambient conditions and engine setting at which a model is evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightPoint {
    /// Static pressure (Pa)
    pub pamb: f64,
    /// Static temperature (K)
    pub tamb: f64,
    pub mach: f64,
    pub rating: Rating,
    /// Number of inoperative engines
    pub nei: u32,
}

impl FlightPoint {
    /// Flight point in the standard atmosphere at pressure altitude `altp` (m).
    pub fn at_altitude(altp: f64, mach: f64, rating: Rating, nei: u32) -> Self {
        let (pamb, tamb) = atmosphere(altp);
        Self {
            pamb,
            tamb,
            mach,
            rating,
            nei,
        }
    }

    /// Reynolds number per metre at this point, the input of nacelle drag.
    pub fn reynolds_per_metre(&self) -> f64 {
        reynolds_number(self.pamb, self.tamb, self.mach)
    }
}

/// Per-engine thrust split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrustBreakdown {
    pub fn_core: f64,
    pub fn_fan0: f64,
    pub fn0: f64,
    /// Shaft power available to the fan (W)
    pub shaft_power0: f64,
}

/// Bucket specific fuel consumption (kg/N/s); depends on by-pass ratio only.
pub fn turbofan_sfc(aircraft: &Aircraft, _point: &FlightPoint) -> f64 {
    (0.4 + 1.0 / aircraft.turbofan_engine.bpr.powf(0.895)) / 36000.0
}

/// Thrust of all operating engines, plus the breakdown for one engine.
///
/// # Errors
/// `InvalidInput` if every engine is declared inoperative.
pub fn turbofan_thrust(aircraft: &Aircraft, point: &FlightPoint) -> DomainResult<(f64, ThrustBreakdown)> {
    let engine = &aircraft.turbofan_engine;
    let nacelle = &aircraft.turbofan_nacelle;
    if i64::from(point.nei) >= engine.n_engine {
        return Err(DomainError::InvalidInput(format!(
            "{} inoperative engines leave no thrust on a {} engine aircraft",
            point.nei, engine.n_engine
        )));
    }

    let mach = point.mach;
    let bpr = engine.bpr / 10.0;
    let kth = 0.475 * mach.powi(2) + 0.091 * bpr.powi(2) - 0.283 * mach * bpr - 0.633 * mach - 0.081 * bpr
        + 1.192;

    let (_, sigma) = air_density(point.pamb, point.tamb);
    let factor = engine.rating_factor[point.rating.index()];
    let fn0 = factor * kth * engine.reference_thrust * sigma.powf(0.75);

    let fn_core = fn0 * engine.core_thrust_ratio;
    let fn_fan0 = fn0 * (1.0 - engine.core_thrust_ratio);
    let vair = sound_speed(point.tamb) * mach;
    let shaft_power0 = fn_fan0 * vair / nacelle.efficiency_prop;

    let total = fn0 * (engine.n_engine - i64::from(point.nei)) as f64;
    Ok((
        total,
        ThrustBreakdown {
            fn_core,
            fn_fan0,
            fn0,
            shaft_power0,
        },
    ))
}

/// Skin friction drag coefficient and wetted area of all nacelles.
pub fn turbofan_nacelle_drag(aircraft: &Aircraft, reynolds_per_metre: f64, mach: f64) -> (f64, f64) {
    let nacelle = &aircraft.turbofan_nacelle;
    let fac = 1.0 + 0.126 * mach.powi(2);
    let nwa = nacelle.net_wetted_area;
    let cxf = 1.15
        * ((0.455 / fac) * (10f64.ln() / (reynolds_per_metre * nacelle.length).ln()).powf(2.58))
        * nwa
        / aircraft.wing.area;
    (cxf, nwa)
}

/// Drag coefficient increment of one windmilling engine.
pub fn turbofan_oei_drag(aircraft: &Aircraft) -> f64 {
    0.12 * aircraft.turbofan_nacelle.width.powi(2) / aircraft.wing.area
}

/// Fill the `propulsion` branch with reference thrusts at each rating and
/// the cruise SFC.
#[instrument(level = "debug", skip(aircraft))]
pub fn propulsion(aircraft: &mut Aircraft) -> DomainResult<()> {
    if !(aircraft.turbofan_engine.bpr > 0.0) {
        return Err(DomainError::InvalidInput(format!(
            "by-pass ratio must be positive, got {}",
            aircraft.turbofan_engine.bpr
        )));
    }
    let driver = &aircraft.design_driver;
    let take_off = FlightPoint::at_altitude(0.0, 0.25, Rating::Mto, 0);
    let continuous = FlightPoint::at_altitude(driver.ref_cruise_altp, driver.cruise_mach, Rating::Mcn, 1);
    let climb = FlightPoint::at_altitude(driver.top_of_climb_altp, driver.cruise_mach, Rating::Mcl, 0);
    let cruise = FlightPoint::at_altitude(driver.ref_cruise_altp, driver.cruise_mach, Rating::Mcr, 0);

    let (mto, _) = turbofan_thrust(aircraft, &take_off)?;
    let (mcn, _) = turbofan_thrust(aircraft, &continuous)?;
    let (mcl, _) = turbofan_thrust(aircraft, &climb)?;
    let (mcr, _) = turbofan_thrust(aircraft, &cruise)?;
    let sfc = turbofan_sfc(aircraft, &cruise);

    let branch = &mut aircraft.propulsion;
    branch.architecture = "turbofan".to_string();
    branch.mto_thrust_ref = mto;
    branch.mcn_thrust_ref = mcn;
    branch.mcl_thrust_ref = mcl;
    branch.mcr_thrust_ref = mcr;
    branch.sfc_cruise_ref = sfc;
    debug!(mto, mcn, mcl, mcr, sfc, "propulsion updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::atmosphere::{P_SEA_LEVEL, T_SEA_LEVEL};
    use rstest::rstest;

    fn sea_level(mach: f64, rating: Rating, nei: u32) -> FlightPoint {
        FlightPoint {
            pamb: P_SEA_LEVEL,
            tamb: T_SEA_LEVEL,
            mach,
            rating,
            nei,
        }
    }

    #[test]
    fn given_static_sea_level_when_computing_thrust_then_matches_lapse_model() {
        let aircraft = Aircraft::default();
        let (total, one) = turbofan_thrust(&aircraft, &sea_level(0.0, Rating::Mto, 0)).unwrap();

        let b: f64 = 0.9;
        let kth = 0.091 * b * b - 0.081 * b + 1.192;
        let (_, sigma) = air_density(P_SEA_LEVEL, T_SEA_LEVEL);
        let expected = 0.8 * kth * 120000.0 * sigma.powf(0.75);
        assert!((one.fn0 - expected).abs() < 1e-6);
        assert!((total - 2.0 * expected).abs() < 1e-6);
        assert!((one.fn_core + one.fn_fan0 - one.fn0).abs() < 1e-9);
        assert_eq!(one.shaft_power0, 0.0);
    }

    #[test]
    fn given_engine_out_when_computing_thrust_then_one_engine_less() {
        let aircraft = Aircraft::default();
        let (all, one) = turbofan_thrust(&aircraft, &sea_level(0.3, Rating::Mcn, 0)).unwrap();
        let (oei, _) = turbofan_thrust(&aircraft, &sea_level(0.3, Rating::Mcn, 1)).unwrap();
        assert!((all - oei - one.fn0).abs() < 1e-6);
        assert!(turbofan_thrust(&aircraft, &sea_level(0.3, Rating::Mcn, 2)).is_err());
    }

    #[rstest]
    #[case("mto", Rating::Mto)]
    #[case("MCR", Rating::Mcr)]
    #[case(" fid ", Rating::Fid)]
    fn given_rating_name_when_parsing_then_case_insensitive(#[case] text: &str, #[case] expected: Rating) {
        assert_eq!(text.parse::<Rating>().unwrap(), expected);
    }

    #[test]
    fn given_higher_bpr_when_computing_sfc_then_lower() {
        let mut aircraft = Aircraft::default();
        let point = sea_level(0.78, Rating::Mcr, 0);
        let base = turbofan_sfc(&aircraft, &point);
        aircraft.turbofan_engine.bpr = 12.0;
        assert!(turbofan_sfc(&aircraft, &point) < base);
    }

    #[test]
    fn given_default_aircraft_when_running_propulsion_then_ratings_are_ordered() {
        let mut aircraft = Aircraft::default();
        propulsion(&mut aircraft).unwrap();
        let p = &aircraft.propulsion;
        assert!(p.mto_thrust_ref > p.mcl_thrust_ref);
        assert!(p.mcl_thrust_ref > p.mcr_thrust_ref);
        assert!(p.mcn_thrust_ref > 0.0);
        assert!(p.sfc_cruise_ref > 0.0);
    }

    #[test]
    fn given_nacelles_when_computing_drag_then_scales_with_wing_area() {
        let mut aircraft = Aircraft::default();
        let cruise = FlightPoint::at_altitude(aircraft.design_driver.ref_cruise_altp, 0.78, Rating::Mcr, 0);
        let re = cruise.reynolds_per_metre();
        let (cxf, nwa) = turbofan_nacelle_drag(&aircraft, re, cruise.mach);
        assert_eq!(nwa, aircraft.turbofan_nacelle.net_wetted_area);
        assert!(cxf > 0.0);
        aircraft.wing.area *= 2.0;
        let (halved, _) = turbofan_nacelle_drag(&aircraft, re, cruise.mach);
        assert!((halved - cxf / 2.0).abs() < 1e-12);
        assert!(turbofan_oei_drag(&aircraft) > 0.0);
    }
}
