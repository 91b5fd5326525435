// ==============================================================================
// relaxation.rs — CARCASS STIFFNESSES + RELAXATION LENGTHS
// ------------------------------------------------------------------------------
// Derived from the current load every integration step:
//
//   C_Fα = |pky1 Fz0 sin(2 atan(Fz / (pky2 Fz0))) λKy|      σα = C_Fα / C_Fy,ref
//   C_Fκ = |Fz (pkx1 + pkx2 dFz) exp(pkx3 dFz) λKx|         σκ = C_Fκ / C_Fx,ref
//   C_Fγ = |Fz (0.92 + 0.24 dFz) λγy|
//   C_Fφ = 2 C_Fγ R0
//
// All stiffnesses are taken by magnitude: a negative one would turn the
// deflection ODEs unstable. Lengths are floored so |V|/σ stays finite at
// vanishing load.
// ==============================================================================

use crate::pac_tire::config::TireConfig;
use crate::pac_tire::params::CoefficientTable;

const P_KY4: f64 = 2.0;
const P_KY6: f64 = 0.92;
const P_KY7: f64 = 0.24;
const TURN_SLIP_EPS: f64 = 0.5;

const SIGMA_MIN: f64 = 1e-4; // m
const STIFFNESS_MIN: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relaxation {
    pub c_falpha: f64,    // N/rad, cornering stiffness
    pub sigma_alpha: f64, // m
    pub c_fkappa: f64,    // N, longitudinal slip stiffness
    pub sigma_kappa: f64, // m
    pub c_fgamma: f64,    // N/rad, camber stiffness
    pub c_fphi: f64,      // N*m/rad, turn-slip stiffness
}

impl Relaxation {
    pub fn compute(params: &CoefficientTable, config: &TireConfig, fz: f64, dfz: f64) -> Self {
        let lat = &params.lateral;
        let lon = &params.longitudinal;
        let s = &params.scaling;
        let fz0 = params.fz_nominal();

        let c_falpha = (lat.pky1 * fz0 * (P_KY4 * (fz / (lat.pky2 * fz0)).atan()).sin() * s.lky)
            .abs()
            .max(STIFFNESS_MIN);
        let c_fkappa = (fz * (lon.pkx1 + lon.pkx2 * dfz) * (lon.pkx3 * dfz).exp() * s.lkx)
            .abs()
            .max(STIFFNESS_MIN);
        let c_fgamma = (fz * (P_KY6 + P_KY7 * dfz) * s.lgay).abs().max(STIFFNESS_MIN);
        let c_fphi = c_fgamma * params.r0() / (1.0 - TURN_SLIP_EPS);

        Self {
            c_falpha,
            sigma_alpha: (c_falpha / config.c_fy_ref * s.lsgal).max(SIGMA_MIN),
            c_fkappa,
            sigma_kappa: (c_fkappa / config.c_fx_ref * s.lsgkp).max(SIGMA_MIN),
            c_fgamma,
            c_fphi,
        }
    }
}
