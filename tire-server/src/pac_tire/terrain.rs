//! Terrain queries the tire needs: height and surface normal under (x, y). Z up.

use crate::pac_tire::types::{Pos3, Vec3};

pub trait Terrain {
    fn height(&self, x: f64, y: f64) -> f64;
    /// Unit surface normal.
    fn normal(&self, x: f64, y: f64) -> Vec3;
}

/// Horizontal ground at a fixed height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatTerrain {
    pub height: f64,
}

impl FlatTerrain {
    pub fn new(height: f64) -> Self {
        Self { height }
    }
}

impl Default for FlatTerrain {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Terrain for FlatTerrain {
    fn height(&self, _x: f64, _y: f64) -> f64 {
        self.height
    }

    fn normal(&self, _x: f64, _y: f64) -> Vec3 {
        Vec3::z()
    }
}

/// Inclined plane through `point` with unit `normal`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneTerrain {
    point: Pos3,
    normal: Vec3,
}

impl PlaneTerrain {
    /// Returns `None` for a normal that cannot describe a height field
    /// (zero length or no upward component).
    pub fn new(point: Pos3, normal: Vec3) -> Option<Self> {
        let n = normal.try_normalize(1e-12)?;
        if n.z <= 1e-6 {
            return None;
        }
        Some(Self { point, normal: n })
    }
}

impl Terrain for PlaneTerrain {
    fn height(&self, x: f64, y: f64) -> f64 {
        // n . (p - p0) = 0 solved for z
        let n = self.normal;
        self.point.z - (n.x * (x - self.point.x) + n.y * (y - self.point.y)) / n.z
    }

    fn normal(&self, _x: f64, _y: f64) -> Vec3 {
        self.normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn plane_contains_its_anchor_point() {
        let p = PlaneTerrain::new(Pos3::new(1.0, 2.0, 0.5), Vec3::new(0.1, -0.2, 1.0)).unwrap();
        assert_relative_eq!(p.height(1.0, 2.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(p.normal(0.0, 0.0).norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn plane_rises_against_its_normal() {
        // normal tilted toward -x: ground climbs along +x
        let p = PlaneTerrain::new(Pos3::origin(), Vec3::new(-0.1, 0.0, 1.0)).unwrap();
        assert!(p.height(1.0, 0.0) > 0.0);
        assert_relative_eq!(p.height(1.0, 0.0), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn vertical_plane_is_rejected() {
        assert!(PlaneTerrain::new(Pos3::origin(), Vec3::x()).is_none());
        assert!(PlaneTerrain::new(Pos3::origin(), Vec3::zeros()).is_none());
    }
}
