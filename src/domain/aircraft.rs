//! Aircraft data model: every branch the sizing disciplines read or write.
//!
//! Values default to a 150-seat, twin turbofan, 3000 NM design. All
//! quantities are SI unless stated otherwise.

use crate::data_branch;
use crate::domain::schema::Branch;
use crate::domain::tree::Entity;
use crate::domain::units;

data_branch! {
    /// Top level requirements driving the design
    pub struct DesignDriver {
        design_range: f64 = units::m_nm(3000.0),
        cruise_mach: f64 = 0.78,
        /// Reference cruise pressure altitude (m)
        ref_cruise_altp: f64 = units::m_ft(35000.0),
        top_of_climb_altp: f64 = units::m_ft(31000.0),
        n_pax_ref: i64 = 150,
    }
}

data_branch! {
    pub struct Aerodynamics {
        cruise_lod_max: f64 = 17.5,
        cz_cruise_lod_max: f64 = 0.52,
        cx_correction: f64 = 0.0,
        /// Mach knots of the compressibility drag table
        drag_rise_mach: [f64; 4] = [0.60, 0.75, 0.80, 0.85],
        /// Drag multiplier at each Mach knot
        drag_rise_factor: [f64; 4] = [1.00, 1.02, 1.08, 1.30],
    }
}

data_branch! {
    /// Installed thrust and consumption at reference ratings
    pub struct Propulsion {
        architecture: String = "turbofan".to_string(),
        mto_thrust_ref: f64 = 0.0,
        mcn_thrust_ref: f64 = 0.0,
        mcl_thrust_ref: f64 = 0.0,
        mcr_thrust_ref: f64 = 0.0,
        sfc_cruise_ref: f64 = 0.0,
    }
}

data_branch! {
    pub struct Weights {
        mtow: f64 = 77000.0,
        mzfw: f64 = 62500.0,
        mlw: f64 = 66000.0,
        owe: f64 = 42000.0,
        mfw: f64 = 19000.0,
        mass_constraint_1: f64 = 0.0,
        mass_constraint_2: f64 = 0.0,
        mass_constraint_3: f64 = 0.0,
    }
}

data_branch! {
    pub struct CenterOfGravity {
        max_fwd_req_cg: f64 = 15.8,
        max_bwd_req_cg: f64 = 17.2,
        cg_constraint_1: f64 = 0.0,
        cg_constraint_2: f64 = 0.0,
        cg_constraint_3: f64 = 0.0,
    }
}

data_branch! {
    pub struct Wing {
        area: f64 = 122.0,
        span: f64 = 34.1,
        aspect_ratio: f64 = 9.5,
        /// Quarter chord sweep (rad)
        sweep: f64 = 0.4363,
        x_root: f64 = 13.0,
        mac: f64 = 4.2,
    }
}

data_branch! {
    pub struct HorizontalTail {
        area: f64 = 35.0,
        span: f64 = 12.5,
        lever_arm: f64 = 17.0,
        volume: f64 = 0.94,
    }
}

data_branch! {
    pub struct VerticalTail {
        area: f64 = 25.0,
        height: f64 = 6.3,
        lever_arm: f64 = 15.5,
        volume: f64 = 0.41,
    }
}

data_branch! {
    pub struct TurbofanEngine {
        n_engine: i64 = 2,
        bpr: f64 = 9.0,
        /// Sea level static thrust of one engine (N)
        reference_thrust: f64 = 120000.0,
        /// Thrust fraction of each rating: MTO, MCN, MCL, MCR, FID
        rating_factor: [f64; 5] = [0.800, 0.688, 0.624, 0.560, 0.100],
        core_thrust_ratio: f64 = 0.13,
    }
}

data_branch! {
    pub struct TurbofanNacelle {
        width: f64 = 2.3,
        length: f64 = 4.3,
        net_wetted_area: f64 = 24.0,
        efficiency_prop: f64 = 0.82,
    }
}

data_branch! {
    pub struct HighSpeed {
        best_lod_mach: f64 = 0.0,
        max_mach_lod: f64 = 0.0,
        perfo_constraint_1: f64 = 0.0,
        perfo_constraint_2: f64 = 0.0,
        perfo_constraint_3: f64 = 0.0,
    }
}

data_branch! {
    pub struct LowSpeed {
        req_tofl: f64 = 2300.0,
        req_app_speed: f64 = units::mps_kt(137.0),
        perfo_constraint_1: f64 = 0.0,
        perfo_constraint_2: f64 = 0.0,
        perfo_constraint_3: f64 = 0.0,
    }
}

data_branch! {
    pub struct Economics {
        /// Fuel price ($/L)
        fuel_price: f64 = 0.53,
        labor_cost: f64 = 120.0,
        direct_operating_cost: f64 = 0.0,
        cash_operating_cost: f64 = 0.0,
    }
}

data_branch! {
    /// Root of the data tree; branches are built once, fully, at construction
    pub struct Aircraft {
        name: String = "Aircraft".to_string(),
        design_driver: DesignDriver = DesignDriver::default(),
        aerodynamics: Aerodynamics = Aerodynamics::default(),
        propulsion: Propulsion = Propulsion::default(),
        weights: Weights = Weights::default(),
        center_of_gravity: CenterOfGravity = CenterOfGravity::default(),
        wing: Wing = Wing::default(),
        horizontal_tail: HorizontalTail = HorizontalTail::default(),
        vertical_tail: VerticalTail = VerticalTail::default(),
        turbofan_engine: TurbofanEngine = TurbofanEngine::default(),
        turbofan_nacelle: TurbofanNacelle = TurbofanNacelle::default(),
        high_speed: HighSpeed = HighSpeed::default(),
        low_speed: LowSpeed = LowSpeed::default(),
        economics: Economics = Economics::default(),
    }
}

impl Aircraft {
    /// Name of the top-level section in persisted files.
    pub const SECTION: &'static str = "Aircraft";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Snapshot as an untyped tree rooted at [`Aircraft::SECTION`].
    pub fn to_tree(&self) -> Entity {
        self.to_entity(Self::SECTION)
    }
}
