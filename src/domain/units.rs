//! Unit conversions. `x_y` converts a value expressed in `y` into `x`.

pub fn m_nm(nm: f64) -> f64 {
    nm * 1852.0
}

pub fn nm_m(m: f64) -> f64 {
    m / 1852.0
}

pub fn m_ft(ft: f64) -> f64 {
    ft * 0.3048
}

pub fn ft_m(m: f64) -> f64 {
    m / 0.3048
}

pub fn mps_kt(kt: f64) -> f64 {
    kt * 1852.0 / 3600.0
}

pub fn kt_mps(mps: f64) -> f64 {
    mps * 3600.0 / 1852.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_round_trip_conversions_then_identity() {
        assert!((nm_m(m_nm(3000.0)) - 3000.0).abs() < 1e-9);
        assert!((ft_m(m_ft(35000.0)) - 35000.0).abs() < 1e-9);
        assert!((kt_mps(mps_kt(137.0)) - 137.0).abs() < 1e-9);
        assert_eq!(m_nm(1.0), 1852.0);
    }
}
