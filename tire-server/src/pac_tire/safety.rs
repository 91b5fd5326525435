// ==============================================================================
// safety.rs — OUTPUT SAFETY NET
// ------------------------------------------------------------------------------
// The empirical curves are only trustworthy inside the calibrated slip range.
// After every evaluation each of Fx, Fy, Mx, My, Mz (tire frame) is compared
// against its threshold:
// - always reported (tracing::warn!, and returned as a Violation)
// - rescaled to the threshold, sign kept, when `enforce` is on
//
// The vertical load fed to the curves is capped the same way.
// ==============================================================================

use std::fmt;

use serde::Serialize;

use crate::pac_tire::config::OutputThresholds;
use crate::pac_tire::types::Vec3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Component {
    Fz,
    Fx,
    Fy,
    Mx,
    My,
    Mz,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Component::Fz => "Fz",
            Component::Fx => "Fx",
            Component::Fy => "Fy",
            Component::Mx => "Mx",
            Component::My => "My",
            Component::Mz => "Mz",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Violation {
    pub component: Component,
    pub value: f64,     // as computed
    pub threshold: f64,
}

/// `value` limited to `±threshold`, sign kept.
#[inline]
pub fn clamp_magnitude(value: f64, threshold: f64) -> f64 {
    if value.abs() > threshold {
        threshold.copysign(value)
    } else {
        value
    }
}

fn check(
    out: &mut Vec<Violation>,
    component: Component,
    value: &mut f64,
    threshold: f64,
    enforce: bool,
    tire: &str,
) {
    if value.abs() <= threshold {
        return;
    }
    tracing::warn!(
        tire,
        %component,
        value = *value,
        threshold,
        enforced = enforce,
        "tire output exceeded threshold"
    );
    out.push(Violation { component, value: *value, threshold });
    if enforce {
        *value = clamp_magnitude(*value, threshold);
    }
}

/// Checks one force/moment pair in place; returns what was out of range.
pub fn apply(force: &mut Vec3, moment: &mut Vec3, limits: &OutputThresholds, tire: &str) -> Vec<Violation> {
    let mut out = Vec::new();
    check(&mut out, Component::Fx, &mut force.x, limits.fx, limits.enforce, tire);
    check(&mut out, Component::Fy, &mut force.y, limits.fy, limits.enforce, tire);
    check(&mut out, Component::Mx, &mut moment.x, limits.mx, limits.enforce, tire);
    check(&mut out, Component::My, &mut moment.y, limits.my, limits.enforce, tire);
    check(&mut out, Component::Mz, &mut moment.z, limits.mz, limits.enforce, tire);
    out
}

/// Load the curves are evaluated at; a load above the threshold is reported
/// and always capped.
pub fn cap_load(fz: f64, limits: &OutputThresholds, tire: &str, out: &mut Vec<Violation>) -> f64 {
    let mut capped = fz;
    check(out, Component::Fz, &mut capped, limits.fz, true, tire);
    capped
}
