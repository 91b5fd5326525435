// ==============================================================================
// vertical.rs — VERTICAL LOAD + ROLLING RADII
// ------------------------------------------------------------------------------
// Normal force from penetration depth and approach speed, and the radii the
// slip calculations need:
//
//   spring_damper:  Fz = k * depth - c * v_n
//   load_transfer:  Fz = (1 + q_v2 |ω| R0 / V0 - (q_Fcx Fx / Fz0)² - (q_Fcy Fy / Fz0)²
//                        + q_FcG γ'²) * (k * depth + q_Fz2 * depth²) - c * v_n
//
// v_n is the wheel-vs-terrain velocity at the contact point projected on the
// terrain normal (positive = separating), so damping always opposes the motion.
// The result is clamped from below at the table's fzmin.
//
//   R_l   = R0 - depth           (R0 - Fz / k when the load is overridden)
//   dFz   = (Fz - Fz0) / Fz0
//   R_eff = R0 + qV1 R0 (ωR0/V0)² - ρ_Fz0 (D atan(B ρ_d) + F ρ_d),  R_eff <= R0
// ==============================================================================

use crate::pac_tire::params::CoefficientTable;
use crate::pac_tire::types::{Pos3, Vec3, WheelState};

// Load-transfer shape constants (not part of the PAC2002 table).
const Q_V2: f64 = 2.0;
const Q_FCX: f64 = 0.2;
const Q_FCY: f64 = 0.35;
const Q_FCG: f64 = 0.001;
const Q_FZ2: f64 = 500.0;

// Centrifugal radius growth.
const Q_V1: f64 = 0.000071;

/// Force and moment history the load-transfer formula scales with.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadTransferInputs {
    pub fx: f64,       // N, previous cycle
    pub fy: f64,       // N, previous cycle
    pub gamma_p: f64,  // previous cycle primed camber
}

/// Load and radii for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalLoad {
    pub fz: f64,     // N
    pub dfz: f64,    // -
    pub r_l: f64,    // m, statically loaded radius
    pub r_eff: f64,  // m, effective rolling radius
}

/// Wheel velocity relative to the (static) terrain, along the contact normal.
pub fn normal_approach_speed(wheel: &WheelState, contact_point: &Pos3, normal: &Vec3) -> f64 {
    let arm = contact_point - wheel.pos;
    let v = wheel.lin_vel + wheel.ang_vel.cross(&arm);
    v.dot(normal)
}

pub fn spring_damper(params: &CoefficientTable, depth: f64, v_n: f64) -> f64 {
    let v = &params.vertical;
    let fz = v.vertical_stiffness * depth - v.vertical_damping * v_n;
    fz.max(params.ranges.fzmin)
}

pub fn load_transfer(
    params: &CoefficientTable,
    depth: f64,
    v_n: f64,
    omega: f64,
    prev: &LoadTransferInputs,
) -> f64 {
    let v = &params.vertical;
    let fz0 = params.fz_nominal();

    let speed_term = Q_V2 * omega.abs() * params.r0() / params.model.longvl;
    let fx_term = (Q_FCX * prev.fx / fz0).powi(2);
    let fy_term = (Q_FCY * prev.fy / fz0).powi(2);
    let camber_term = Q_FCG * prev.gamma_p.powi(2);
    let force_term = 1.0 + speed_term - fx_term - fy_term + camber_term;

    let rho_term = v.vertical_stiffness * depth + Q_FZ2 * depth * depth;

    let fz = force_term * rho_term - v.vertical_damping * v_n;
    fz.max(params.ranges.fzmin)
}

#[inline]
pub fn load_ratio(params: &CoefficientTable, fz: f64) -> f64 {
    let fz0 = params.fz_nominal();
    (fz - fz0) / fz0
}

pub fn effective_rolling_radius(params: &CoefficientTable, omega: f64, r_l: f64) -> f64 {
    let r0 = params.r0();
    let v = &params.vertical;

    let k1 = (omega * r0 / params.model.longvl).powi(2);
    let growth = Q_V1 * r0 * k1;

    let rho_fz0 = params.fz_nominal() / v.vertical_stiffness;
    let rho = (r0 - r_l + growth).max(0.0);
    let rho_d = rho / rho_fz0;

    let r_eff = r0 + growth - rho_fz0 * (v.dreff * (v.breff * rho_d).atan() + v.freff * rho_d);
    r_eff.min(r0)
}

impl VerticalLoad {
    /// Wheel out of contact: no load, undeformed radius.
    pub fn unloaded(params: &CoefficientTable, omega: f64) -> Self {
        let r0 = params.r0();
        Self {
            fz: 0.0,
            dfz: load_ratio(params, 0.0),
            r_l: r0,
            r_eff: effective_rolling_radius(params, omega, r0),
        }
    }

    pub fn from_depth(params: &CoefficientTable, fz: f64, depth: f64, omega: f64) -> Self {
        let r_l = params.r0() - depth;
        Self {
            fz,
            dfz: load_ratio(params, fz),
            r_l,
            r_eff: effective_rolling_radius(params, omega, r_l),
        }
    }

    /// Externally imposed load; deflection follows from the stiffness.
    pub fn overridden(params: &CoefficientTable, fz: f64, omega: f64) -> Self {
        let fz = fz.max(params.ranges.fzmin);
        let r_l = params.r0() - fz / params.vertical.vertical_stiffness;
        Self {
            fz,
            dfz: load_ratio(params, fz),
            r_l,
            r_eff: effective_rolling_radius(params, omega, r_l),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn table() -> CoefficientTable {
        CoefficientTable::reference().unwrap()
    }

    #[test]
    fn spring_term_at_rest() {
        let p = table();
        assert_relative_eq!(spring_damper(&p, 0.02, 0.0), 0.02 * 2e5, epsilon = 1e-9);
    }

    #[test]
    fn damping_opposes_separation() {
        let p = table();
        assert!(spring_damper(&p, 0.02, 0.5) < spring_damper(&p, 0.02, 0.0));
        assert!(spring_damper(&p, 0.02, -0.5) > spring_damper(&p, 0.02, 0.0));
    }

    #[test]
    fn never_below_fzmin() {
        let p = table();
        assert_eq!(spring_damper(&p, 1e-6, 100.0), p.ranges.fzmin);
        assert_eq!(load_transfer(&p, 1e-6, 100.0, 0.0, &LoadTransferInputs::default()), p.ranges.fzmin);
    }

    #[test]
    fn load_is_monotonic_in_depth() {
        let p = table();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let v_n = rng.gen_range(-1.0..1.0);
            let d0 = rng.gen_range(0.0..0.05);
            let d1 = d0 + rng.gen_range(0.0..0.01);
            assert!(spring_damper(&p, d1, v_n) >= spring_damper(&p, d0, v_n));
            let prev = LoadTransferInputs::default();
            assert!(load_transfer(&p, d1, v_n, 30.0, &prev) >= load_transfer(&p, d0, v_n, 30.0, &prev));
        }
    }

    #[test]
    fn load_transfer_drops_with_previous_forces() {
        let p = table();
        let calm = load_transfer(&p, 0.02, 0.0, 0.0, &LoadTransferInputs::default());
        let busy = load_transfer(&p, 0.02, 0.0, 0.0, &LoadTransferInputs { fx: 3000.0, fy: 3000.0, gamma_p: 0.0 });
        assert!(busy < calm);
    }

    #[test]
    fn rolling_radius_never_exceeds_r0() {
        let p = table();
        for omega in [0.0, 10.0, 50.0, 200.0] {
            for depth in [0.0, 0.01, 0.03] {
                let r = effective_rolling_radius(&p, omega, p.r0() - depth);
                assert!(r <= p.r0());
            }
        }
        // loaded wheel rolls on a smaller radius than it is tall
        assert!(effective_rolling_radius(&p, 30.0, p.r0() - 0.02) < p.r0());
    }

    #[test]
    fn approach_speed_includes_rotation() {
        let w = WheelState {
            pos: Pos3::new(0.0, 0.0, 0.3),
            ang_vel: Vec3::new(0.0, 10.0, 0.0),
            ..WheelState::default()
        };
        // ω × r at the bottom of a spinning wheel is horizontal
        let v_n = normal_approach_speed(&w, &Pos3::origin(), &Vec3::z());
        assert_relative_eq!(v_n, 0.0, epsilon = 1e-12);

        let falling = WheelState { lin_vel: Vec3::new(0.0, 0.0, -1.0), ..w };
        assert_relative_eq!(normal_approach_speed(&falling, &Pos3::origin(), &Vec3::z()), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn override_sets_deflection_from_stiffness() {
        let p = table();
        let l = VerticalLoad::overridden(&p, 4000.0, 0.0);
        assert_relative_eq!(l.r_l, p.r0() - 0.02, epsilon = 1e-12);
        assert_relative_eq!(l.dfz, 0.0, epsilon = 1e-12);
    }
}
