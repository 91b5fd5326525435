// ==============================================================================
// contact.rs — DISC / TERRAIN CONTACT RESOLVER
// ------------------------------------------------------------------------------
// disc_terrain_contact(terrain, center, normal, radius):
// - No contact if the disc center is below the terrain, or higher above it
//   than the radius
// - No contact if the disc is (near-)horizontal: |normal × Z|² < 1e-3, there is
//   no unique lowest point
// - Lowest point on the rim: center + R * normalize(normal × (normal × Z))
// - No contact if that point is above the terrain under it
// - Otherwise the terrain is taken as the plane through (x_low, y_low, h) with
//   the queried normal; depth = (P_terrain - P_low) . n  (must be > 0)
//
// Degenerate geometry is "no contact", never an error.
// ==============================================================================

use crate::pac_tire::frame::TireFrame;
use crate::pac_tire::terrain::Terrain;
use crate::pac_tire::types::{Pos3, Quat, Vec3};

const HORIZONTAL_DISC: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscContact {
    pub point: Pos3,   // on the terrain surface
    pub normal: Vec3,  // terrain normal at the contact
    pub depth: f64,    // m, > 0
}

pub fn disc_terrain_contact(
    terrain: &dyn Terrain,
    center: &Pos3,
    disc_normal: &Vec3,
    radius: f64,
) -> Option<DiscContact> {
    let hc = terrain.height(center.x, center.y);
    if center.z <= hc || center.z >= hc + radius {
        return None;
    }

    let side = disc_normal.cross(&Vec3::z());
    let side_sq = side.norm_squared();
    if side_sq < HORIZONTAL_DISC {
        return None;
    }
    let down = disc_normal.cross(&(side / side_sq.sqrt()));
    let lowest = center + down * radius;

    let hp = terrain.height(lowest.x, lowest.y);
    if lowest.z > hp {
        return None;
    }

    let normal = terrain.normal(lowest.x, lowest.y);
    let on_surface = Pos3::new(lowest.x, lowest.y, hp);
    let depth = (on_surface - lowest).dot(&normal);
    if depth <= 0.0 {
        return None;
    }

    Some(DiscContact { point: lowest + normal * depth, normal, depth })
}

// ============================================
// ----- per-cycle contact state -------------
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactState {
    pub in_contact: bool,
    pub frame: TireFrame, // origin at the contact point, Z along the terrain normal
    pub depth: f64,       // m, 0 when out of contact
}

impl ContactState {
    pub fn resolve(
        terrain: &dyn Terrain,
        center: &Pos3,
        wheel_normal: &Vec3,
        wheel_rot: &Quat,
        radius: f64,
    ) -> Self {
        match disc_terrain_contact(terrain, center, wheel_normal, radius) {
            Some(c) => Self {
                in_contact: true,
                frame: TireFrame::new(c.point, *wheel_normal, c.normal, wheel_rot),
                depth: c.depth,
            },
            None => Self::default(),
        }
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.frame.z_axis()
    }
}
