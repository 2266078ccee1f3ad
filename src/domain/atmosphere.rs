//! International Standard Atmosphere helpers.

pub const GAMMA: f64 = 1.4;
/// Specific gas constant of dry air (J/kg/K)
pub const R_AIR: f64 = 287.053;
pub const G0: f64 = 9.80665;
pub const RHO_SEA_LEVEL: f64 = 1.225;
pub const P_SEA_LEVEL: f64 = 101325.0;
pub const T_SEA_LEVEL: f64 = 288.15;

const TROPOPAUSE_ALTP: f64 = 11000.0;
const LAPSE_RATE: f64 = -0.0065;

/// Static pressure (Pa) and temperature (K) at a pressure altitude (m).
///
/// Troposphere and lower stratosphere only; above 20 km the isothermal
/// layer is simply extended.
pub fn atmosphere(altp: f64) -> (f64, f64) {
    let t_tropo = T_SEA_LEVEL + LAPSE_RATE * TROPOPAUSE_ALTP;
    let p_tropo = P_SEA_LEVEL * (t_tropo / T_SEA_LEVEL).powf(-G0 / (R_AIR * LAPSE_RATE));
    if altp <= TROPOPAUSE_ALTP {
        let tamb = T_SEA_LEVEL + LAPSE_RATE * altp;
        let pamb = P_SEA_LEVEL * (tamb / T_SEA_LEVEL).powf(-G0 / (R_AIR * LAPSE_RATE));
        (pamb, tamb)
    } else {
        let pamb = p_tropo * (-G0 / (R_AIR * t_tropo) * (altp - TROPOPAUSE_ALTP)).exp();
        (pamb, t_tropo)
    }
}

/// Air density (kg/m3) and density ratio to sea level.
pub fn air_density(pamb: f64, tamb: f64) -> (f64, f64) {
    let rho = pamb / (R_AIR * tamb);
    (rho, rho / RHO_SEA_LEVEL)
}

pub fn sound_speed(tamb: f64) -> f64 {
    (GAMMA * R_AIR * tamb).sqrt()
}

/// Dynamic viscosity (Pa.s), Sutherland's law.
pub fn gas_viscosity(tamb: f64) -> f64 {
    let mu0 = 1.715e-5;
    let t0 = 273.15;
    let s = 110.4;
    mu0 * (tamb / t0).powf(1.5) * (t0 + s) / (tamb + s)
}

/// Reynolds number per metre of reference length.
pub fn reynolds_number(pamb: f64, tamb: f64, mach: f64) -> f64 {
    let (rho, _) = air_density(pamb, tamb);
    rho * mach * sound_speed(tamb) / gas_viscosity(tamb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_sea_level_when_computing_atmosphere_then_standard_values() {
        let (p, t) = atmosphere(0.0);
        assert_eq!(p, P_SEA_LEVEL);
        assert_eq!(t, T_SEA_LEVEL);
        let (_, sigma) = air_density(p, t);
        assert!((sigma - 1.0).abs() < 1e-3);
        assert!((sound_speed(t) - 340.29).abs() < 0.05);
    }

    #[test]
    fn given_tropopause_when_computing_atmosphere_then_continuous() {
        let below = atmosphere(10999.999);
        let above = atmosphere(11000.001);
        assert!((below.0 - above.0).abs() < 1.0);
        assert!((below.1 - 216.65).abs() < 1e-3);
        assert!((22632.0 - above.0).abs() < 10.0);
    }

    #[test]
    fn given_cruise_conditions_when_computing_reynolds_then_linear_in_mach() {
        let (p, t) = atmosphere(10668.0);
        let re = reynolds_number(p, t, 0.78);
        assert!(re > 5.0e6 && re < 8.0e6, "re = {}", re);
        assert!((reynolds_number(p, t, 0.39) - re / 2.0).abs() < 1e-6 * re);
    }
}
