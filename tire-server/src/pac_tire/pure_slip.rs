// ==============================================================================
// pure_slip.rs — MAGIC FORMULA, PURE SLIP (PAC2002)
// ------------------------------------------------------------------------------
// Each channel assumes the other slip is zero:
//   Fx(κ)  = Dx sin(Cx atan(Bx κx - Ex (Bx κx - atan(Bx κx)))) + S_Vx,  κx = κ + S_Hx
//   Fy(α)  = Dy sin(Cy atan(By αy - Ey (By αy - atan(By αy)))) + S_Vy,  αy = α + S_Hy
//   Mz(α)  = -t(α_t) Fy + Mzr(α_r)
//
// Every intermediate (B, C, D, E, shifts, stiffnesses) is returned alongside
// the force; the combined-slip stage and the transient freeze reuse them.
// ==============================================================================

use std::f64::consts::PI;

use crate::pac_tire::params::CoefficientTable;
use crate::pac_tire::types::sign_nonneg;

/// `D sin(C atan(B x - E (B x - atan(B x))))`
#[inline]
pub fn magic_formula(b: f64, c: f64, d: f64, e: f64, x: f64) -> f64 {
    let bx = b * x;
    d * (c * (bx - e * (bx - bx.atan())).atan()).sin()
}

/// `cos(C atan(B x - E (B x - atan(B x))))`, the cosine form used by the trail
/// and the combined-slip weights.
#[inline]
pub fn cosine_formula(b: f64, c: f64, e: f64, x: f64) -> f64 {
    let bx = b * x;
    (c * (bx - e * (bx - bx.atan())).atan()).cos()
}

/// Load and (primed) slips one force evaluation runs on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SlipInputs {
    pub fz: f64,        // N
    pub dfz: f64,       // -
    pub kappa: f64,     // κ'
    pub alpha: f64,     // tan α' (small-angle)
    pub gamma: f64,     // γ'
    pub cos_prime: f64, // Vx / |V|
}

// ============================================
// ----- longitudinal -------------------------
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PureLongitudinal {
    pub s_hx: f64,
    pub kappa_x: f64,
    pub mu_x: f64,
    pub k_x: f64, // N, slip stiffness
    pub b_x: f64,
    pub c_x: f64,
    pub d_x: f64,
    pub e_x: f64,
    pub s_vx: f64,
    pub fx: f64,
}

pub fn pure_longitudinal(p: &CoefficientTable, s: &SlipInputs) -> PureLongitudinal {
    let lon = &p.longitudinal;
    let sc = &p.scaling;
    let (fz, dfz, gamma) = (s.fz, s.dfz, s.gamma);

    let s_hx = (lon.phx1 + lon.phx2 * dfz) * sc.lhx;
    let kappa_x = s.kappa + s_hx;

    let mu_x = (lon.pdx1 + lon.pdx2 * dfz) * (1.0 - lon.pdx3 * gamma * gamma) * sc.lmux;
    let k_x = fz * (lon.pkx1 + lon.pkx2 * dfz) * (lon.pkx3 * dfz).exp() * sc.lkx;
    let c_x = lon.pcx1 * sc.lcx;
    let d_x = mu_x * fz;
    let b_x = if d_x != 0.0 { k_x / (c_x * d_x) } else { 0.0 };
    let e_x = (lon.pex1 + lon.pex2 * dfz + lon.pex3 * dfz * dfz)
        * (1.0 - lon.pex4 * sign_nonneg(kappa_x))
        * sc.lex;
    let s_vx = fz * (lon.pvx1 + lon.pvx2 * dfz) * sc.lvx * sc.lmux;

    let fx = magic_formula(b_x, c_x, d_x, e_x, kappa_x) + s_vx;

    PureLongitudinal { s_hx, kappa_x, mu_x, k_x, b_x, c_x, d_x, e_x, s_vx, fx }
}

// ============================================
// ----- lateral ------------------------------
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PureLateral {
    pub s_hy: f64,
    pub alpha_y: f64,
    pub mu_y: f64,
    pub k_y: f64, // N/rad, cornering stiffness (magnitude)
    pub b_y: f64,
    pub c_y: f64,
    pub d_y: f64,
    pub e_y: f64,
    pub s_vy: f64,
    pub fy: f64,
}

pub fn pure_lateral(p: &CoefficientTable, s: &SlipInputs) -> PureLateral {
    let lat = &p.lateral;
    let sc = &p.scaling;
    let (fz, dfz, gamma) = (s.fz, s.dfz, s.gamma);
    let fz0 = p.fz_nominal();

    let c_y = lat.pcy1 * sc.lcy;
    let mu_y = (lat.pdy1 + lat.pdy2 * dfz) * (1.0 - lat.pdy3 * gamma * gamma) * sc.lmuy;
    let d_y = mu_y * fz;

    let k_y = (lat.pky1 * fz0 * (2.0 * (fz / (lat.pky2 * fz0)).atan()).sin()
        * (1.0 - lat.pky3 * gamma.abs())
        * sc.lky)
        .abs();
    // positive slip angle gives negative side force
    let b_y = if d_y != 0.0 { -k_y / (c_y * d_y) } else { 0.0 };

    let s_hy = (lat.phy1 + lat.phy2 * dfz) * sc.lhy + lat.phy3 * gamma;
    let alpha_y = s.alpha + s_hy;

    let e_y = (lat.pey1 + lat.pey2 * dfz)
        * (1.0 - (lat.pey3 + lat.pey4 * gamma) * sign_nonneg(alpha_y))
        * sc.ley;
    let s_vy = fz * ((lat.pvy1 + lat.pvy2 * dfz) * sc.lvy + (lat.pvy3 + lat.pvy4 * dfz) * gamma) * sc.lmuy;

    let fy = magic_formula(b_y, c_y, d_y, e_y, alpha_y) + s_vy;

    PureLateral { s_hy, alpha_y, mu_y, k_y, b_y, c_y, d_y, e_y, s_vy, fy }
}

// ============================================
// ----- aligning moment ----------------------
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PureAligning {
    pub s_hf: f64,
    pub alpha_r: f64,
    pub s_ht: f64,
    pub alpha_t: f64,
    // residual torque
    pub b_r: f64,
    pub c_r: f64,
    pub d_r: f64,
    // pneumatic trail
    pub b_t: f64,
    pub c_t: f64,
    pub d_t: f64,
    pub e_t: f64,
    pub t: f64,
    pub mz_trail: f64, // -t Fy
    pub mz_r: f64,
    pub mz: f64,
}

pub fn pure_aligning(p: &CoefficientTable, s: &SlipInputs, lat: &PureLateral) -> PureAligning {
    let a = &p.aligning;
    let sc = &p.scaling;
    let (fz, dfz, gamma) = (s.fz, s.dfz, s.gamma);
    let r0 = p.r0();

    let s_hf = lat.s_hy + if lat.k_y != 0.0 { lat.s_vy / lat.k_y } else { 0.0 };
    let alpha_r = s.alpha + s_hf;
    let s_ht = a.qhz1 + a.qhz2 * dfz + (a.qhz3 + a.qhz4 * dfz) * gamma;
    let alpha_t = s.alpha + s_ht;

    let b_r = a.qbz9 * sc.lky / sc.lmuy + a.qbz10 * lat.b_y * lat.c_y;
    let c_r = 1.0;
    let d_r = fz * r0 * ((a.qdz6 + a.qdz7 * dfz) * sc.lres + (a.qdz8 + a.qdz9 * dfz) * gamma) * sc.lmuy;

    let b_t = (a.qbz1 + a.qbz2 * dfz + a.qbz3 * dfz * dfz)
        * (1.0 + a.qbz4 * gamma + a.qbz5 * gamma.abs())
        * sc.lvyka
        / sc.lmuy;
    let c_t = a.qcz1;
    let d_t0 = fz * (r0 / p.fz_nominal()) * (a.qdz1 + a.qdz2 * dfz);
    let d_t = d_t0 * (1.0 + a.qdz3 * gamma + a.qdz4 * gamma * gamma) * sc.ltr;
    let e_t = (a.qez1 + a.qez2 * dfz + a.qez3 * dfz * dfz)
        * (1.0 + (a.qez4 + a.qez5 * gamma) * (2.0 / PI) * (b_t * c_t * alpha_t).atan());

    let t = d_t * cosine_formula(b_t, c_t, e_t, alpha_t) * s.cos_prime;
    let mz_trail = -t * lat.fy;
    let mz_r = d_r * (c_r * (b_r * alpha_r).atan()).cos();

    PureAligning {
        s_hf, alpha_r, s_ht, alpha_t,
        b_r, c_r, d_r,
        b_t, c_t, d_t, e_t, t,
        mz_trail, mz_r,
        mz: mz_trail + mz_r,
    }
}

/// All three pure-slip channels for one set of inputs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PureSlip {
    pub long: PureLongitudinal,
    pub lat: PureLateral,
    pub align: PureAligning,
}

pub fn pure_slip(p: &CoefficientTable, s: &SlipInputs) -> PureSlip {
    let long = pure_longitudinal(p, s);
    let lat = pure_lateral(p, s);
    let align = pure_aligning(p, s, &lat);
    PureSlip { long, lat, align }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> CoefficientTable {
        CoefficientTable::reference().unwrap()
    }

    fn nominal(kappa: f64, alpha: f64, gamma: f64) -> SlipInputs {
        SlipInputs { fz: 4000.0, dfz: 0.0, kappa, alpha, gamma, cos_prime: 1.0 }
    }

    fn without_shifts() -> CoefficientTable {
        let mut p = table();
        p.longitudinal.phx1 = 0.0;
        p.longitudinal.phx2 = 0.0;
        p.lateral.phy1 = 0.0;
        p.lateral.phy2 = 0.0;
        p.lateral.phy3 = 0.0;
        p
    }

    #[test]
    fn zero_slip_without_horizontal_shift_is_pure_vertical_shift() {
        let p = without_shifts();
        let s = nominal(0.0, 0.0, 0.0);
        let long = pure_longitudinal(&p, &s);
        let lat = pure_lateral(&p, &s);
        assert_eq!(long.fx, long.s_vx);
        assert_eq!(lat.fy, lat.s_vy);
        // at nominal load: S_Vx = Fz * pvx1, S_Vy = Fz * pvy1
        assert_relative_eq!(long.s_vx, 4000.0 * -8.8098e-6, epsilon = 1e-12);
        assert_relative_eq!(lat.s_vy, 4000.0 * 0.037318, epsilon = 1e-9);
    }

    #[test]
    fn zero_slip_with_shifts_matches_hand_evaluation() {
        let p = table();
        let s = nominal(0.0, 0.0, 0.0);
        let long = pure_longitudinal(&p, &s);

        // written out independently at dFz = 0, gamma = 0
        let s_hx = 0.0012297_f64;
        let c = 1.6411_f64;
        let d = 1.1739 * 4000.0;
        let b = 4000.0 * 22.303 / (c * d);
        let e = 0.46403 * (1.0 - -3.7604e-5);
        let bx = b * s_hx;
        let expected = d * (c * (bx - e * (bx - bx.atan())).atan()).sin() + 4000.0 * -8.8098e-6;
        assert_relative_eq!(long.fx, expected, epsilon = 1e-9);
    }

    /// Fy at kappa = alpha = 0, nominal load, written out from the bundled table.
    fn hand_fy_at_zero_slip(gamma: f64) -> f64 {
        let fz = 4000.0_f64;
        let c = 1.3507;
        let d = 1.0489 * (1.0 + 2.8821 * gamma * gamma) * fz;
        let k = (21.92 * fz * (2.0 * (1.0 / 2.0012_f64).atan()).sin() * (1.0 + 0.024778 * gamma.abs())).abs();
        let b = -k / (c * d);
        let s_hy = 0.0026747 + 0.031415 * gamma;
        let sgn = if s_hy >= 0.0 { 1.0 } else { -1.0 };
        let e = -0.0074722 * (1.0 - (-9.9935 - 760.14 * gamma) * sgn);
        let s_vy = fz * (0.037318 - 0.32931 * gamma);
        let by = b * s_hy;
        d * (c * (by - e * (by - by.atan())).atan()).sin() + s_vy
    }

    #[test]
    fn lateral_zero_slip_with_camber_matches_hand_evaluation() {
        let p = table();
        for gamma in [0.0, 0.02, -0.03] {
            let lat = pure_lateral(&p, &nominal(0.0, 0.0, gamma));
            assert_relative_eq!(lat.fy, hand_fy_at_zero_slip(gamma), max_relative = 1e-9);
        }
    }

    #[test]
    fn aligning_zero_slip_matches_hand_evaluation() {
        let p = table();
        let al = pure_slip(&p, &nominal(0.0, 0.0, 0.0)).align;

        let fz = 4000.0_f64;
        let r0 = 0.3135;
        let fy = hand_fy_at_zero_slip(0.0);
        let k_y = 21.92 * fz * (2.0 * (1.0 / 2.0012_f64).atan()).sin();

        // pneumatic trail at alpha_t = S_Ht = qhz1
        let s_ht = 0.0047326_f64;
        let (b_t, c_t) = (10.904_f64, 1.2136_f64);
        let d_t = fz * (r0 / 4000.0) * 0.093509;
        let e_t = -1.5697 * (1.0 + 0.26711 * (2.0 / PI) * (b_t * c_t * s_ht).atan());
        let bt = b_t * s_ht;
        let t = d_t * (c_t * (bt - e_t * (bt - bt.atan())).atan()).cos();

        // residual torque at alpha_r = S_Hf = S_Hy + S_Vy / K_y
        let s_hf = 0.0026747 + fz * 0.037318 / k_y;
        let d_r = fz * r0 * -0.0067783;
        let mz_r = d_r * (8.9846 * s_hf).atan().cos();

        assert_relative_eq!(al.t, t, max_relative = 1e-9);
        assert_relative_eq!(al.mz_r, mz_r, max_relative = 1e-9);
        assert_relative_eq!(al.mz, -t * fy + mz_r, max_relative = 1e-9);
    }

    #[test]
    fn forces_oppose_slip() {
        let p = table();
        assert!(pure_longitudinal(&p, &nominal(0.05, 0.0, 0.0)).fx > 0.0);
        assert!(pure_longitudinal(&p, &nominal(-0.05, 0.0, 0.0)).fx < 0.0);
        assert!(pure_lateral(&p, &nominal(0.0, 0.05, 0.0)).fy < 0.0);
        assert!(pure_lateral(&p, &nominal(0.0, -0.05, 0.0)).fy > 0.0);
    }

    #[test]
    fn peak_force_near_friction_limit() {
        let p = table();
        let peak = (1..100)
            .map(|i| pure_longitudinal(&p, &nominal(i as f64 * 0.005, 0.0, 0.0)).fx)
            .fold(f64::MIN, f64::max);
        // mu_x = pdx1 at nominal load
        assert!(peak <= 1.1739 * 4000.0 + 1.0);
        assert!(peak > 0.9 * 1.1739 * 4000.0);
    }

    #[test]
    fn small_slip_slope_is_slip_stiffness() {
        let p = without_shifts();
        let h = 1e-6;
        let f1 = pure_longitudinal(&p, &nominal(h, 0.0, 0.0));
        let f0 = pure_longitudinal(&p, &nominal(0.0, 0.0, 0.0));
        assert_relative_eq!((f1.fx - f0.fx) / h, f0.k_x, max_relative = 1e-3);
    }

    #[test]
    fn aligning_moment_self_aligns_at_small_slip() {
        let p = table();
        let s = nominal(0.0, 0.03, 0.0);
        let lat = pure_lateral(&p, &s);
        let al = pure_aligning(&p, &s, &lat);
        // Fy < 0 for alpha > 0; trail behind the contact centre turns it back
        assert!(al.mz_trail > 0.0);
    }
}
