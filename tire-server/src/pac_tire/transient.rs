// ==============================================================================
// transient.rs — CONTACT-PATCH DEFLECTION ODEs (TRANSIENT SLIP)
// ------------------------------------------------------------------------------
// SlipState is the only state a tire carries from one cycle to the next.
//
// Four first-order deflection ODEs, each advanced with classic RK4:
//   du/dt       = -V_sx - |V_cx| / σκ * u
//   dv_α/dt     = -V_sy - |V_cx| / σα * v_α
//   dv_γ/dt     =  (C_Fγ / C_Fα) |V_cx| γ' - |V_cx| / σα * v_γ
//   dv_φ/dt     = -(C_Fφ / C_Fα) sgn(V_cx) (ψ̇ - (1 - ε_γ) ω sin γ') - |V_cx| / σα * v_φ
//
// Low-speed freeze: below v_low, once the equivalent residual slip angle is
// past α_sl = 3 D_y / C_Fα, u and v_α only move when the step would shrink
// them (sliding contact patch cannot wind up further).
//
// Primed slips from the deflections (Besselink damping below v_low):
//   κ' = u / σκ - d_vlow V_sx / C_Fκ
//   α' = -v_α / σα + d_vlow V_sy / C_Fα
//   γ' = C_Fα v_γ / (C_Fγ σα)
//   φ' = C_Fα v_φ / (C_Fφ σα)
//   φt = -ψ̇ / V_cx (floored)
// ==============================================================================

use std::f64::consts::PI;

use serde::Serialize;

use crate::pac_tire::config::TireConfig;
use crate::pac_tire::kinematics::KinematicSlip;
use crate::pac_tire::relaxation::Relaxation;
use crate::pac_tire::types::{floor_magnitude, sign_nonneg};

// RK4 amplification stays in (0, 1) for h*k below ~2.78
const RK4_MAX_DECAY: f64 = 2.0;
const MAX_SPLITS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SlipState {
    // ----- kinematic -----
    pub kappa: f64,
    pub alpha: f64,
    pub alpha_star: f64,
    pub gamma: f64,

    // ----- deflections (m) -----
    pub u: f64,
    pub v_alpha: f64,
    pub v_gamma: f64,
    pub v_phi: f64,

    // ----- last RK4 increments -----
    pub du: f64,
    pub dv_alpha: f64,
    pub dv_gamma: f64,
    pub dv_phi: f64,

    // ----- primed (what the force curves see) -----
    pub kappa_p: f64,
    pub alpha_p: f64,
    pub gamma_p: f64,
    pub phi_p: f64,
    pub phi_t: f64,

    // ----- velocities -----
    pub v_cx: f64,
    pub v_cy: f64,
    pub v_sx: f64,
    pub v_sy: f64,
    pub psi_dot: f64,
    pub omega: f64,
    pub cos_prime: f64,
}

/// Previous-cycle quantities the low-speed freeze looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreezeCheck {
    pub alpha_r_eq: f64, // rad, combined-slip equivalent residual slip angle
    pub d_y: f64,        // N, pure lateral peak
}

impl SlipState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Stores the cycle's kinematic slips; primed slips follow them directly
    /// until the integrator overwrites them.
    pub fn set_kinematic(&mut self, k: &KinematicSlip, v_x_threshold: f64) {
        self.store_velocities(k);
        self.kappa = k.kappa;
        self.alpha = k.alpha;
        self.alpha_star = k.alpha_star;
        self.gamma = k.gamma;

        self.kappa_p = k.kappa;
        self.alpha_p = k.alpha_star;
        self.gamma_p = k.gamma.sin();
        self.phi_p = 0.0;
        self.phi_t = -k.psi_dot / floor_magnitude(k.v_cx, v_x_threshold);
    }

    pub fn store_velocities(&mut self, k: &KinematicSlip) {
        self.v_cx = k.v_cx;
        self.v_cy = k.v_cy;
        self.v_sx = k.v_sx;
        self.v_sy = k.v_sy;
        self.psi_dot = k.psi_dot;
        self.omega = k.omega;
        self.cos_prime = k.cos_prime;
    }

    /// Advances all four deflections over `h`, then refreshes the primed slips.
    /// Expects `set_kinematic` to have run for this step.
    ///
    /// `h` is split further when `h |V_cx| / σ` leaves the region where RK4
    /// decays without overshoot (short relaxation length at speed).
    pub fn integrate(&mut self, relax: &Relaxation, freeze: &FreezeCheck, config: &TireConfig, h: f64) {
        let v_abs = self.v_cx.abs();
        let gamma_p = self.gamma_p;

        let alpha_sl = 3.0 * freeze.d_y / relax.c_falpha;
        let frozen_zone = freeze.alpha_r_eq.abs() > alpha_sl && v_abs < config.v_low;

        let g0 = relax.c_fgamma / relax.c_falpha * v_abs * gamma_p;
        let g1 = v_abs / relax.sigma_alpha;
        let p0 = relax.c_fphi / relax.c_falpha
            * sign_nonneg(self.v_cx)
            * (self.psi_dot - (1.0 - config.eps_gamma) * self.omega * gamma_p.sin());

        let decay = v_abs / relax.sigma_alpha.min(relax.sigma_kappa);
        let splits = ((h * decay / RK4_MAX_DECAY).ceil() as usize).clamp(1, MAX_SPLITS);
        let hs = h / splits as f64;

        self.du = 0.0;
        self.dv_alpha = 0.0;
        self.dv_gamma = 0.0;
        self.dv_phi = 0.0;

        for _ in 0..splits {
            // u
            let may_move_u = !frozen_zone
                || (self.v_sx + v_abs * self.u / relax.sigma_kappa) * self.u >= 0.0;
            if may_move_u {
                let du = rk4_deflection(self.v_sx, relax.sigma_kappa, self.v_cx, hs, self.u);
                self.u += du;
                self.du += du;
            }

            // v_alpha
            let may_move_v = !frozen_zone
                || (self.v_sy + v_abs * self.v_alpha / relax.sigma_alpha) * self.v_alpha >= 0.0;
            if may_move_v {
                let dv = rk4_deflection(self.v_sy, relax.sigma_alpha, self.v_cx, hs, self.v_alpha);
                self.v_alpha += dv;
                self.dv_alpha += dv;
            }

            // v_gamma
            let dg = rk4(hs, self.v_gamma, |x| g0 - g1 * x);
            self.v_gamma += dg;
            self.dv_gamma += dg;

            // v_phi
            let dp = rk4(hs, self.v_phi, |x| -p0 - g1 * x);
            self.v_phi += dp;
            self.dv_phi += dp;
        }

        self.update_primed(relax, config);
    }

    fn update_primed(&mut self, relax: &Relaxation, config: &TireConfig) {
        let d_vlow = besselink_damping(self.v_cx.abs(), config);

        self.kappa_p = self.u / relax.sigma_kappa - d_vlow * self.v_sx / relax.c_fkappa;
        self.alpha_p = -self.v_alpha / relax.sigma_alpha + d_vlow * self.v_sy / relax.c_falpha;
        self.gamma_p = relax.c_falpha * self.v_gamma / (relax.c_fgamma * relax.sigma_alpha);
        self.phi_p = relax.c_falpha * self.v_phi / (relax.c_fphi * relax.sigma_alpha);
        self.phi_t = -self.psi_dot / floor_magnitude(self.v_cx, config.v_x_threshold);
    }
}

/// Low-speed damping coefficient, fading from 2c at standstill to 0 at v_low.
#[inline]
pub fn besselink_damping(v_abs: f64, config: &TireConfig) -> f64 {
    if v_abs <= config.v_low {
        config.besselink_damping * (1.0 + (PI * v_abs / config.v_low).cos())
    } else {
        0.0
    }
}

/// Increment of `dx/dt = -V_s - |V_cx| / σ * x` over one step.
#[inline]
pub fn rk4_deflection(v_s: f64, sigma: f64, v_cx: f64, h: f64, x: f64) -> f64 {
    let k = v_cx.abs() / sigma;
    rk4(h, x, |x| -v_s - k * x)
}

/// Classic fourth-order Runge-Kutta increment for an autonomous scalar ODE.
#[inline]
pub fn rk4(h: f64, x: f64, f: impl Fn(f64) -> f64) -> f64 {
    let k1 = f(x);
    let k2 = f(x + 0.5 * h * k1);
    let k3 = f(x + 0.5 * h * k2);
    let k4 = f(x + h * k3);
    h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn relax(sigma_alpha: f64, sigma_kappa: f64) -> Relaxation {
        Relaxation {
            c_falpha: 70_000.0,
            sigma_alpha,
            c_fkappa: 89_000.0,
            sigma_kappa,
            c_fgamma: 3_700.0,
            c_fphi: 2_300.0,
        }
    }

    fn no_freeze() -> FreezeCheck {
        FreezeCheck { alpha_r_eq: 0.0, d_y: 4000.0 }
    }

    fn kinematic(kappa: f64, alpha_star: f64, v_cx: f64) -> KinematicSlip {
        let omega_r = kappa * v_cx.abs() + v_cx;
        KinematicSlip {
            kappa,
            alpha: alpha_star.atan(),
            alpha_star,
            v_cx,
            v_cy: alpha_star * v_cx.abs(),
            v_sx: v_cx - omega_r,
            v_sy: alpha_star * v_cx.abs(),
            omega: omega_r / 0.3,
            cos_prime: 1.0,
            ..KinematicSlip::default()
        }
    }

    #[test]
    fn rk4_matches_exponential_decay() {
        // dx/dt = -x from x = 1 over one step
        let dx = rk4(0.1, 1.0, |x| -x);
        assert_relative_eq!(1.0 + dx, (-0.1f64).exp(), epsilon = 1e-6);
    }

    #[test]
    fn besselink_fades_out() {
        let cfg = TireConfig::default();
        assert_relative_eq!(besselink_damping(0.0, &cfg), 1100.0, epsilon = 1e-9);
        assert_relative_eq!(besselink_damping(2.5, &cfg), 0.0, epsilon = 1e-9);
        assert_eq!(besselink_damping(10.0, &cfg), 0.0);
    }

    #[test]
    fn primed_slip_converges_to_kinematic() {
        let cfg = TireConfig::default();
        let r = relax(0.5, 0.55);
        let k = kinematic(0.05, 0.04, 10.0);
        let mut s = SlipState::default();
        for _ in 0..400 {
            s.set_kinematic(&k, cfg.v_x_threshold);
            s.integrate(&r, &no_freeze(), &cfg, 0.01);
        }
        assert_relative_eq!(s.kappa_p, 0.05, epsilon = 1e-6);
        assert_relative_eq!(s.alpha_p, 0.04, epsilon = 1e-6);
    }

    #[test]
    fn camber_deflection_converges_to_sin_gamma() {
        let cfg = TireConfig::default();
        let r = relax(0.5, 0.55);
        let gamma = 0.05_f64;
        let k = KinematicSlip { gamma, ..kinematic(0.0, 0.0, 20.0) };
        let mut s = SlipState::default();
        for _ in 0..200 {
            s.set_kinematic(&k, cfg.v_x_threshold);
            s.integrate(&r, &no_freeze(), &cfg, 0.01);
        }
        assert_relative_eq!(s.gamma_p, gamma.sin(), epsilon = 1e-6);
    }

    #[test]
    fn turn_slip_deflection_settles_at_yaw_rate_over_speed() {
        let cfg = TireConfig::default();
        let r = relax(0.5, 0.55);
        let (psi_dot, v) = (0.3, 15.0);
        let k = KinematicSlip { psi_dot, ..kinematic(0.0, 0.0, v) };
        let mut s = SlipState::default();
        for _ in 0..200 {
            s.set_kinematic(&k, cfg.v_x_threshold);
            s.integrate(&r, &no_freeze(), &cfg, 0.01);
        }
        assert_relative_eq!(s.phi_p, -psi_dot / v, epsilon = 1e-6);
        assert_relative_eq!(s.phi_t, -psi_dot / v, epsilon = 1e-12);
    }

    #[test]
    fn response_is_delayed_not_instant() {
        let cfg = TireConfig::default();
        let r = relax(0.5, 0.55);
        let k = kinematic(0.0, 0.05, 10.0);
        let mut s = SlipState::default();
        s.set_kinematic(&k, cfg.v_x_threshold);
        s.integrate(&r, &no_freeze(), &cfg, 0.01);
        assert!(s.alpha_p > 0.0 && s.alpha_p < 0.05);
    }

    #[test]
    fn never_grows_for_random_positive_lengths() {
        let cfg = TireConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let r = relax(rng.gen_range(0.05..2.0), rng.gen_range(0.05..2.0));
            let target = rng.gen_range(-0.2..0.2);
            let k = kinematic(0.0, target, rng.gen_range(3.0..40.0));
            let mut s = SlipState::default();
            let mut last_err = f64::INFINITY;
            for _ in 0..300 {
                s.set_kinematic(&k, cfg.v_x_threshold);
                s.integrate(&r, &no_freeze(), &cfg, 0.01);
                let err = (s.alpha_p - target).abs();
                assert!(err <= last_err + 1e-12);
                last_err = err;
            }
        }
    }

    #[test]
    fn freeze_blocks_windup_at_low_speed() {
        let cfg = TireConfig::default();
        let r = relax(0.5, 0.55);
        let saturated = FreezeCheck { alpha_r_eq: 1.0, d_y: 4000.0 };

        let mut s = SlipState { v_alpha: -0.05, ..SlipState::default() };
        // slip velocity pushes v_alpha further negative
        let k = kinematic(0.0, 0.5, 1.0);
        s.set_kinematic(&k, cfg.v_x_threshold);
        s.integrate(&r, &saturated, &cfg, 0.01);
        assert_eq!(s.dv_alpha, 0.0);
        assert_eq!(s.v_alpha, -0.05);

        // opposite slip velocity unwinds it
        let k = kinematic(0.0, -0.5, 1.0);
        s.set_kinematic(&k, cfg.v_x_threshold);
        s.integrate(&r, &saturated, &cfg, 0.01);
        assert!(s.v_alpha > -0.05);
    }

    #[test]
    fn turn_slip_uses_floored_speed() {
        let cfg = TireConfig::default();
        let k = KinematicSlip { psi_dot: 0.4, ..KinematicSlip::default() };
        let mut s = SlipState::default();
        s.set_kinematic(&k, cfg.v_x_threshold);
        assert_relative_eq!(s.phi_t, -2.0, epsilon = 1e-12);
    }
}
