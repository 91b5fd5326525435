// ==============================================================================
// frame.rs — TIRE-CENTERED COORDINATE FRAME
// ------------------------------------------------------------------------------
// TireFrame is rebuilt every update from the wheel state and a terrain normal:
//   Z = terrain normal (up)
//   X = normalize(wheel_normal × Z)   (heading, in the ground plane)
//   Y = Z × X                         (lateral, left of heading)
//
// When the wheel axis is parallel to the ground normal (wheel lying flat) the
// cross product degenerates; X then falls back to the wheel's own +X projected
// into the ground plane, and to global +X after that.
//
// The same construction at the contact point gives the contact frame.
// ==============================================================================

use nalgebra::{Matrix3, Rotation3};

use crate::pac_tire::types::{Pos3, Quat, Vec3};

const DEGENERATE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TireFrame {
    pub origin: Pos3,
    pub rot: Quat,
}

impl Default for TireFrame {
    fn default() -> Self {
        Self { origin: Pos3::origin(), rot: Quat::identity() }
    }
}

impl TireFrame {
    /// `wheel_rot` is only consulted for the degenerate fallback.
    pub fn new(origin: Pos3, wheel_normal: Vec3, up: Vec3, wheel_rot: &Quat) -> Self {
        let z = up.try_normalize(DEGENERATE).unwrap_or_else(Vec3::z);

        let x = wheel_normal
            .cross(&z)
            .try_normalize(DEGENERATE)
            .or_else(|| project_onto_plane(wheel_rot * Vec3::x(), z))
            .or_else(|| project_onto_plane(Vec3::x(), z))
            .or_else(|| project_onto_plane(Vec3::y(), z))
            .unwrap_or_else(Vec3::x);

        let y = z.cross(&x);

        let basis = Matrix3::from_columns(&[x, y, z]);
        let rot = Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis));
        Self { origin, rot }
    }

    #[inline] pub fn x_axis(&self) -> Vec3 { self.rot * Vec3::x() }
    #[inline] pub fn y_axis(&self) -> Vec3 { self.rot * Vec3::y() }
    #[inline] pub fn z_axis(&self) -> Vec3 { self.rot * Vec3::z() }

    /// Global direction -> frame coordinates.
    #[inline]
    pub fn to_local(&self, v: &Vec3) -> Vec3 {
        self.rot.inverse_transform_vector(v)
    }

    /// Frame coordinates -> global direction.
    #[inline]
    pub fn to_global(&self, v: &Vec3) -> Vec3 {
        self.rot * v
    }
}

fn project_onto_plane(v: Vec3, n: Vec3) -> Option<Vec3> {
    (v - n * n.dot(&v)).try_normalize(DEGENERATE)
}
