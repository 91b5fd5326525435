//! Core shared types for `pac_tire` (engine-agnostic).
// pac_tire/types.rs
use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

pub type Vec3 = Vector3<f64>;
pub type Pos3 = Point3<f64>;
pub type Quat = UnitQuaternion<f64>;

/// Floors |x| at `min` while keeping the sign of `x` (zero counts as positive).
#[inline]
pub fn floor_magnitude(x: f64, min: f64) -> f64 {
    if x.abs() >= min {
        x
    } else if x < 0.0 {
        -min
    } else {
        min
    }
}

/// Sign with `sgn(0) = +1`, as used by the Magic Formula curvature terms.
#[inline]
pub fn sign_nonneg(x: f64) -> f64 {
    if x >= 0.0 { 1.0 } else { -1.0 }
}

// ============================================
// Wheel side
// ============================================

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TireSide {
    #[default]
    Left,
    Right,
}

// ============================================
// ----- wheel state (input) ------------------
// ============================================

/// Kinematic state of the wheel spindle, supplied once per cycle by whoever
/// owns the wheel body. Global frame, Z up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelState {
    pub pos: Pos3,      // wheel center
    pub rot: Quat,      // wheel orientation, local +Y is the spin axis
    pub lin_vel: Vec3,  // m/s
    pub ang_vel: Vec3,  // rad/s
    pub omega: f64,     // rad/s, spin about the wheel axis
}

impl Default for WheelState {
    fn default() -> Self {
        Self {
            pos: Pos3::origin(),
            rot: Quat::identity(),
            lin_vel: Vec3::zeros(),
            ang_vel: Vec3::zeros(),
            omega: 0.0,
        }
    }
}

impl WheelState {
    /// Wheel axis (disc normal) in the global frame.
    #[inline]
    pub fn wheel_normal(&self) -> Vec3 {
        self.rot * Vec3::y()
    }

    /// Builds a wheel state whose kinematic slips are (kappa, alpha, gamma).
    ///
    /// The wheel sits at the origin and travels along global +X at `vx`. It is
    /// yawed by -alpha and then rolled by gamma, and spun so that
    /// `(r_eff * omega - V_cx) / |V_cx| == kappa` with `V_cx = vx * cos(alpha)`.
    pub fn from_slips(kappa: f64, alpha: f64, gamma: f64, vx: f64, r_eff: f64) -> Self {
        let rot = Quat::from_axis_angle(&Vec3::z_axis(), -alpha)
            * Quat::from_axis_angle(&Vec3::x_axis(), gamma);

        let v_cx = vx * alpha.cos();
        let omega = (kappa * v_cx.abs() + v_cx) / r_eff;

        Self {
            pos: Pos3::origin(),
            rot,
            lin_vel: Vec3::new(vx, 0.0, 0.0),
            ang_vel: rot * Vec3::new(0.0, omega, 0.0),
            omega,
        }
    }
}

// ============================================
// ----- tire force (output) ------------------
// ============================================

/// Force and moment the tire applies to the wheel hub.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TireForce {
    pub point: Pos3,   // application point
    pub force: Vec3,   // N
    pub moment: Vec3,  // N*m
}

impl Default for TireForce {
    fn default() -> Self {
        Self { point: Pos3::origin(), force: Vec3::zeros(), moment: Vec3::zeros() }
    }
}

impl TireForce {
    pub fn is_zero(&self) -> bool {
        self.force == Vec3::zeros() && self.moment == Vec3::zeros()
    }
}

/// Which output variant to read back from a tire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceFrame {
    Local,
    Global,
}
