//! Model switches and constants for a `PacejkaTire`.
// pac_tire/config.rs

use serde::{Deserialize, Serialize};

use crate::pac_tire::error::TireError;

/// Which vertical-load formula the tire uses while in contact.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalLoadModel {
    /// `Fz = k * depth - c * v_n`
    #[default]
    SpringDamper,
    /// Stiffness scaled by spin speed, previous Fx/Fy and camber, plus a
    /// quadratic deflection term.
    LoadTransfer,
}

/// Magnitude limits for the output safety net.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputThresholds {
    pub fz: f64,       // N
    pub fx: f64,       // N
    pub fy: f64,       // N
    pub mx: f64,       // N*m
    pub my: f64,       // N*m
    pub mz: f64,       // N*m
    pub enforce: bool, // rescale offenders (false = report only)
}

impl Default for OutputThresholds {
    fn default() -> Self {
        let fz = 30_000.0;
        let fx = 20_000.0;
        Self {
            fz,
            fx,
            fy: 20_000.0,
            mx: fz / 20.0,
            my: fx / 20.0,
            mz: fz / 20.0,
            enforce: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TireConfig {
    // ----- integration -----
    pub step: f64,                 // s, native RK4 step
    pub use_transient_slip: bool,  // false = kinematic slips feed the curves

    // ----- low speed -----
    pub v_x_threshold: f64,        // m/s, floor on |Vx| in slip divisions
    pub v_low: f64,                // m/s, Besselink band upper edge
    pub besselink_damping: f64,    // N*s/m

    // ----- relaxation -----
    pub eps_gamma: f64,            // camber reduction in the turn-slip ODE
    pub c_fx_ref: f64,             // N, longitudinal carcass stiffness
    pub c_fy_ref: f64,             // N, lateral carcass stiffness

    // ----- vertical -----
    pub vertical_load: VerticalLoadModel,
    pub vertical_load_override: Option<f64>, // N

    pub thresholds: OutputThresholds,
}

impl Default for TireConfig {
    fn default() -> Self {
        Self {
            step: 0.01,
            use_transient_slip: true,
            v_x_threshold: 0.2,
            v_low: 2.5,
            besselink_damping: 550.0,
            eps_gamma: 0.6,
            c_fx_ref: 161_000.0,
            c_fy_ref: 144_000.0,
            vertical_load: VerticalLoadModel::SpringDamper,
            vertical_load_override: None,
            thresholds: OutputThresholds::default(),
        }
    }
}

impl TireConfig {
    pub fn validate(&self) -> Result<(), TireError> {
        if !(self.step > 0.0 && self.step.is_finite()) {
            return Err(TireError::config(format!("native step must be positive, got {}", self.step)));
        }
        if !(self.v_x_threshold > 0.0) {
            return Err(TireError::config(format!(
                "v_x_threshold must be positive, got {}",
                self.v_x_threshold
            )));
        }
        if !(self.v_low > 0.0) {
            return Err(TireError::config(format!("v_low must be positive, got {}", self.v_low)));
        }
        if self.besselink_damping < 0.0 {
            return Err(TireError::config("besselink_damping must not be negative"));
        }
        if !(self.c_fx_ref > 0.0 && self.c_fy_ref > 0.0) {
            return Err(TireError::config("reference carcass stiffnesses must be positive"));
        }
        if let Some(fz) = self.vertical_load_override {
            if !(fz >= 0.0 && fz.is_finite()) {
                return Err(TireError::config(format!("vertical load override must be >= 0, got {fz}")));
            }
        }

        let t = &self.thresholds;
        for (name, v) in [("fz", t.fz), ("fx", t.fx), ("fy", t.fy), ("mx", t.mx), ("my", t.my), ("mz", t.mz)] {
            if !(v > 0.0) {
                return Err(TireError::config(format!("threshold {name} must be positive, got {v}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        TireConfig::default().validate().unwrap();
        let t = OutputThresholds::default();
        assert_eq!(t.mx, 1500.0);
        assert_eq!(t.my, 1000.0);
    }

    #[test]
    fn rejects_zero_step() {
        let cfg = TireConfig { step: 0.0, ..TireConfig::default() };
        assert!(matches!(cfg.validate(), Err(TireError::InvalidConfig { .. })));
    }

    #[test]
    fn rejects_negative_threshold() {
        let mut cfg = TireConfig::default();
        cfg.thresholds.fy = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: TireConfig =
            serde_json::from_str(r#"{ "step": 0.005, "vertical_load": "load_transfer" }"#).unwrap();
        assert_eq!(cfg.step, 0.005);
        assert_eq!(cfg.vertical_load, VerticalLoadModel::LoadTransfer);
        assert_eq!(cfg.c_fy_ref, 144_000.0);
        assert!(cfg.thresholds.enforce);
    }
}
