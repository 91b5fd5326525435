//! Overturning (Mx) and rolling-resistance (My) moments.
//!
//! `Mx = Fz R0 (qsx1 - qsx2 γ - qsx3 Fy / Fz0) λMx`
//! `My = -Fz R0 (qsy1 atan(Vr / V0) + qsy2 Fx / Fz0 + qsy3 |Vr / V0| + qsy4 (Vr / V0)⁴) λMy`
//!
//! Both are zero out of contact; callers pass `fz = 0` in that case.

use crate::pac_tire::params::CoefficientTable;

pub fn overturning_moment(p: &CoefficientTable, fz: f64, gamma: f64, fy: f64) -> f64 {
    let o = &p.overturning;
    fz * p.r0() * (o.qsx1 - o.qsx2 * gamma - o.qsx3 * fy / p.fz_nominal()) * p.scaling.lmx
}

/// `omega * r_eff` is the rolling speed Vr.
pub fn rolling_resistance_moment(p: &CoefficientTable, fz: f64, omega: f64, r_eff: f64, fx: f64) -> f64 {
    let r = &p.rolling;
    let vr = omega * r_eff / p.model.longvl;
    -fz * p.r0()
        * (r.qsy1 * vr.atan() + r.qsy2 * fx / p.fz_nominal() + r.qsy3 * vr.abs() + r.qsy4 * vr.powi(4))
        * p.scaling.lmy
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_load_gives_zero_moments() {
        let p = CoefficientTable::reference().unwrap();
        assert_eq!(overturning_moment(&p, 0.0, 0.1, 2000.0), 0.0);
        assert_eq!(rolling_resistance_moment(&p, 0.0, 50.0, 0.3, 1000.0), 0.0);
    }

    #[test]
    fn rolling_resistance_opposes_rolling() {
        let p = CoefficientTable::reference().unwrap();
        let forward = rolling_resistance_moment(&p, 4000.0, 30.0, 0.3, 0.0);
        let reverse = rolling_resistance_moment(&p, 4000.0, -30.0, 0.3, 0.0);
        assert!(forward < 0.0);
        assert_relative_eq!(forward, -reverse, epsilon = 1e-12);
    }

    #[test]
    fn overturning_follows_lateral_force_and_camber() {
        let mut p = CoefficientTable::reference().unwrap();
        p.overturning.qsx2 = 0.5;
        p.overturning.qsx3 = 0.1;
        let mx = overturning_moment(&p, 4000.0, 0.02, 1000.0);
        let expected = 4000.0 * p.r0() * (-0.5 * 0.02 - 0.1 * 1000.0 / 4000.0);
        assert_relative_eq!(mx, expected, epsilon = 1e-9);
    }
}
