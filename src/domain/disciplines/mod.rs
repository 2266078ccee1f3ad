//! Sizing disciplines: functions that read the aircraft tree and write
//! derived values into named branches.

pub mod performance;
pub mod turbofan;

pub use performance::{best_lod_mach, high_speed, mach_lod};
pub use turbofan::{
    propulsion, turbofan_nacelle_drag, turbofan_oei_drag, turbofan_sfc, turbofan_thrust,
    FlightPoint, Rating, ThrustBreakdown,
};
