// ==============================================================================
// kinematics.rs — KINEMATIC SLIP IN THE TIRE FRAME
// ------------------------------------------------------------------------------
// Projects the wheel state into the tire frame and derives the instantaneous
// (steady-state) slip quantities:
//
//   V       = frame^-1 * lin_vel             (Vx forward, Vy left)
//   alpha   = atan(Vy / |Vx|)
//   gamma   = atan2(n_z, n_y)                (n = wheel axis in the tire frame)
//   kappa   = (R_eff ω - Vx') / |Vx'|        (Vx' = Vx floored at v_x_threshold)
//   alpha*  = Vy / |Vx'|
//   V_sx    = Vx - ω R_eff,  V_sy = Vy
//   psi_dot = tire-frame angular velocity about Z (turn slip)
//
// The floor keeps the sign of Vx, so slow reversing stays reversing.
// ==============================================================================

use crate::pac_tire::frame::TireFrame;
use crate::pac_tire::types::{WheelState, floor_magnitude};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KinematicSlip {
    // ----- slips -----
    pub kappa: f64,
    pub alpha: f64,       // rad
    pub alpha_star: f64,  // tan(alpha) with floored Vx
    pub gamma: f64,       // rad

    // ----- velocities -----
    pub v_cx: f64,        // m/s, wheel center, tire frame
    pub v_cy: f64,        // m/s
    pub v_sx: f64,        // m/s, longitudinal slip velocity
    pub v_sy: f64,        // m/s, lateral slip velocity
    pub psi_dot: f64,     // rad/s, turn rate
    pub omega: f64,       // rad/s, wheel spin
    pub cos_prime: f64,   // Vx / |V|
}

impl KinematicSlip {
    pub fn compute(frame: &TireFrame, wheel: &WheelState, r_eff: f64, v_x_threshold: f64) -> Self {
        let mut k = Self::velocities_only(frame, wheel, r_eff);

        let n = frame.to_local(&wheel.wheel_normal());
        k.gamma = n.z.atan2(n.y);
        k.alpha = k.v_cy.atan2(k.v_cx.abs());

        let vx_floor = floor_magnitude(k.v_cx, v_x_threshold);
        k.kappa = (r_eff * wheel.omega - vx_floor) / vx_floor.abs();
        k.alpha_star = k.v_cy / vx_floor.abs();

        k
    }

    /// Out of contact: slips stay zero, center velocities and turn rate are kept.
    pub fn velocities_only(frame: &TireFrame, wheel: &WheelState, r_eff: f64) -> Self {
        let v = frame.to_local(&wheel.lin_vel);
        let w = frame.to_local(&wheel.ang_vel);

        let speed = v.x.hypot(v.y);
        let cos_prime = if speed > 0.0 { v.x / speed } else { 1.0 };

        Self {
            v_cx: v.x,
            v_cy: v.y,
            v_sx: v.x - wheel.omega * r_eff,
            v_sy: v.y,
            psi_dot: w.z,
            omega: wheel.omega,
            cos_prime,
            ..Self::default()
        }
    }
}
