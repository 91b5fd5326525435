// ==============================================================================
// combined_slip.rs — COMBINED SLIP WEIGHTING (PAC2002)
// ------------------------------------------------------------------------------
// Scales the pure-slip results for simultaneous κ and α:
//   Fx_c = G_xα(α) / G_xα(0) * Fx                    (G normalised at α = 0)
//   Fy_c = G_yκ(κ) / G_yκ(0) * Fy + S_Vyκ(κ)          (S_Vyκ(0) = 0)
//   Mz_c = -t(α_t,eq) (Fy_c - S_Vyκ) + Mzr(α_r,eq) + s Fx_c
//
// α_eq folds κ into the slip angle: sgn(α) sqrt(α² + (Kx / Ky)² κ²).
// ==============================================================================

use crate::pac_tire::params::CoefficientTable;
use crate::pac_tire::pure_slip::{PureSlip, SlipInputs, cosine_formula};
use crate::pac_tire::types::sign_nonneg;

// Camber term of the Fx weighting slope (absent from the PAC2002 table).
const RBX3: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CombinedLongitudinal {
    pub s_hxa: f64,
    pub alpha_s: f64,
    pub b_xa: f64,
    pub c_xa: f64,
    pub e_xa: f64,
    pub g_xa0: f64,
    pub g_xa: f64, // normalised weight
    pub fx: f64,
}

pub fn combined_longitudinal(p: &CoefficientTable, s: &SlipInputs, pure: &PureSlip) -> CombinedLongitudinal {
    let lon = &p.longitudinal;

    let s_hxa = lon.rhx1;
    let alpha_s = s.alpha + s_hxa;
    let b_xa = (lon.rbx1 + RBX3 * s.gamma * s.gamma) * (lon.rbx2 * s.kappa).atan().cos() * p.scaling.lxal;
    let c_xa = lon.rcx1;
    let e_xa = lon.rex1 + lon.rex2 * s.dfz;

    let g_xa0 = cosine_formula(b_xa, c_xa, e_xa, s_hxa);
    let g_xa = cosine_formula(b_xa, c_xa, e_xa, alpha_s) / g_xa0;

    CombinedLongitudinal { s_hxa, alpha_s, b_xa, c_xa, e_xa, g_xa0, g_xa, fx: g_xa * pure.long.fx }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CombinedLateral {
    pub s_hyk: f64,
    pub kappa_s: f64,
    pub b_yk: f64,
    pub c_yk: f64,
    pub e_yk: f64,
    pub d_vyk: f64,
    pub s_vyk: f64, // N, κ-induced side force
    pub g_yk0: f64,
    pub g_yk: f64,
    pub fy: f64,
}

pub fn combined_lateral(p: &CoefficientTable, s: &SlipInputs, pure: &PureSlip) -> CombinedLateral {
    let lat = &p.lateral;
    let (fz, dfz) = (s.fz, s.dfz);

    let s_hyk = lat.rhy1 + lat.rhy2 * dfz;
    let kappa_s = s.kappa + s_hyk;
    let b_yk = lat.rby1 * (lat.rby2 * (s.alpha - lat.rby3)).atan().cos() * p.scaling.lyka;
    let c_yk = lat.rcy1;
    let e_yk = lat.rey1 + lat.rey2 * dfz;

    let d_vyk = pure.lat.mu_y * fz * (lat.rvy1 + lat.rvy2 * dfz + lat.rvy3 * s.gamma)
        * (lat.rvy4 * s.alpha).atan().cos();
    let s_vyk = d_vyk * (lat.rvy5 * (lat.rvy6 * s.kappa).atan()).sin() * p.scaling.lvyka;

    let g_yk0 = cosine_formula(b_yk, c_yk, e_yk, s_hyk);
    let g_yk = cosine_formula(b_yk, c_yk, e_yk, kappa_s) / g_yk0;

    CombinedLateral {
        s_hyk, kappa_s, b_yk, c_yk, e_yk, d_vyk, s_vyk, g_yk0, g_yk,
        fy: g_yk * pure.lat.fy + s_vyk,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CombinedAligning {
    pub fy_prime: f64,   // Fy_c without the κ-induced part
    pub s: f64,          // m, Fx lever arm
    pub alpha_t_eq: f64,
    pub alpha_r_eq: f64,
    pub t: f64,
    pub mz_r: f64,
    pub mz_x: f64,       // s Fx_c
    pub mz_y: f64,       // -t Fy'
    pub mz: f64,
}

pub fn combined_aligning(
    p: &CoefficientTable,
    s: &SlipInputs,
    pure: &PureSlip,
    fx_c: &CombinedLongitudinal,
    fy_c: &CombinedLateral,
) -> CombinedAligning {
    let a = &p.aligning;
    let al = &pure.align;

    let fy_prime = fy_c.fy - fy_c.s_vyk;
    let lever = p.r0()
        * (a.ssz1 + a.ssz2 * (fy_c.fy / p.fz_nominal()) + (a.ssz3 + a.ssz4 * s.dfz) * s.gamma)
        * p.scaling.ls;

    let kx_ky = if pure.lat.k_y != 0.0 { pure.long.k_x / pure.lat.k_y } else { 0.0 };
    let fold = (kx_ky * s.kappa).powi(2);
    let alpha_t_eq = sign_nonneg(al.alpha_t) * (al.alpha_t.powi(2) + fold).sqrt();
    let alpha_r_eq = sign_nonneg(al.alpha_r) * (al.alpha_r.powi(2) + fold).sqrt();

    let mz_r = al.d_r * (al.c_r * (al.b_r * alpha_r_eq).atan()).cos() * s.cos_prime;
    let t = al.d_t * cosine_formula(al.b_t, al.c_t, al.e_t, alpha_t_eq) * s.cos_prime;

    let mz_y = -t * fy_prime;
    let mz_x = lever * fx_c.fx;

    CombinedAligning {
        fy_prime,
        s: lever,
        alpha_t_eq,
        alpha_r_eq,
        t,
        mz_r,
        mz_x,
        mz_y,
        mz: mz_y + mz_r + mz_x,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CombinedSlip {
    pub long: CombinedLongitudinal,
    pub lat: CombinedLateral,
    pub align: CombinedAligning,
}

pub fn combined_slip(p: &CoefficientTable, s: &SlipInputs, pure: &PureSlip) -> CombinedSlip {
    let long = combined_longitudinal(p, s, pure);
    let lat = combined_lateral(p, s, pure);
    let align = combined_aligning(p, s, pure, &long, &lat);
    CombinedSlip { long, lat, align }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac_tire::pure_slip::pure_slip;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn inputs(kappa: f64, alpha: f64, gamma: f64) -> SlipInputs {
        SlipInputs { fz: 4000.0, dfz: 0.0, kappa, alpha, gamma, cos_prime: 1.0 }
    }

    #[test]
    fn no_lateral_slip_keeps_pure_fx() {
        let p = CoefficientTable::reference().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let s = inputs(rng.gen_range(-0.5..0.5), 0.0, rng.gen_range(-0.1..0.1));
            let pure = pure_slip(&p, &s);
            let c = combined_longitudinal(&p, &s, &pure);
            assert_relative_eq!(c.g_xa, 1.0, epsilon = 1e-12);
            assert_relative_eq!(c.fx, pure.long.fx, epsilon = 1e-9);
        }
    }

    #[test]
    fn no_longitudinal_slip_keeps_pure_fy() {
        let p = CoefficientTable::reference().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let s = inputs(0.0, rng.gen_range(-0.3..0.3), rng.gen_range(-0.1..0.1));
            let pure = pure_slip(&p, &s);
            let c = combined_lateral(&p, &s, &pure);
            assert_eq!(c.s_vyk, 0.0);
            assert_relative_eq!(c.fy, pure.lat.fy, epsilon = 1e-9);
        }
    }

    #[test]
    fn braking_costs_side_force() {
        let p = CoefficientTable::reference().unwrap();
        let free = inputs(0.0, 0.05, 0.0);
        let braking = inputs(-0.2, 0.05, 0.0);
        let fy_free = combined_slip(&p, &free, &pure_slip(&p, &free)).lat.fy;
        let fy_braking = combined_slip(&p, &braking, &pure_slip(&p, &braking)).lat.fy;
        assert!(fy_braking.abs() < fy_free.abs());
    }

    #[test]
    fn cornering_costs_traction() {
        let p = CoefficientTable::reference().unwrap();
        let straight = inputs(0.1, 0.0, 0.0);
        let turning = inputs(0.1, 0.1, 0.0);
        let fx_straight = combined_slip(&p, &straight, &pure_slip(&p, &straight)).long.fx;
        let fx_turning = combined_slip(&p, &turning, &pure_slip(&p, &turning)).long.fx;
        assert!(fx_turning < fx_straight);
    }

    #[test]
    fn aligning_sums_its_parts() {
        let p = CoefficientTable::reference().unwrap();
        let s = inputs(0.05, 0.04, 0.02);
        let c = combined_slip(&p, &s, &pure_slip(&p, &s));
        assert_relative_eq!(c.align.mz, c.align.mz_y + c.align.mz_r + c.align.mz_x, epsilon = 1e-9);
        assert!(c.align.alpha_t_eq.abs() >= pure_slip(&p, &s).align.alpha_t.abs());
    }
}
