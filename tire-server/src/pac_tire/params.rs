// ==============================================================================
// params.rs — PAC2002 COEFFICIENT TABLE (IMMUTABLE CALIBRATION DATA)
// ------------------------------------------------------------------------------
// Calibration coefficients grouped by physical category, the same sections a
// PAC2002 property file carries:
//   model, dimension, vertical, ranges, scaling,
//   longitudinal, overturning, lateral, rolling, aligning
//
// The table is loaded once (JSON via serde) and shared read-only between every
// tire built from it (Arc<CoefficientTable>). Nothing in the tire writes to it.
//
// validate() runs at tire construction and rejects tables the model cannot
// produce forces from (non-positive radius / stiffness / nominal load / shape
// factors, inverted ranges, NaN). Everything else is taken as-is.
// ==============================================================================

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pac_tire::error::TireError;
use crate::pac_tire::types::TireSide;

const REFERENCE_TABLE: &str = include_str!("../../data/pac2002_205_60R15.json");

/// Declares a flat all-`f64` coefficient section and a name/value listing used
/// by validation.
macro_rules! coefficient_section {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $field:ident ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
        $(#[$meta])*
        pub struct $name {
            $( pub $field: f64, )*
        }

        impl $name {
            pub const SECTION: &'static str = $label;

            pub fn entries(&self) -> Vec<(&'static str, f64)> {
                vec![ $( (stringify!($field), self.$field), )* ]
            }
        }
    };
}

// ============================================
// ----- sections -----------------------------
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSection {
    pub longvl: f64,               // m/s, reference velocity
    #[serde(default)]
    pub tyreside: TireSide,
}

coefficient_section! {
    #[serde(default)]
    DimensionSection, "DIMENSION" {
        unloaded_radius,  // m
        width,            // m
        aspect_ratio,     // -
        rim_radius,       // m
        rim_width,        // m
    }
}

impl Default for DimensionSection {
    fn default() -> Self {
        Self { unloaded_radius: 0.0, width: 0.0, aspect_ratio: 0.0, rim_radius: 0.0, rim_width: 0.0 }
    }
}

coefficient_section! {
    VerticalSection, "VERTICAL" {
        vertical_stiffness,  // N/m
        vertical_damping,    // N*s/m
        breff,               // low-load stiffness of effective rolling radius
        dreff,               // peak value of effective rolling radius
        freff,               // high-load stiffness of effective rolling radius
        fnomin,              // N, nominal wheel load
    }
}

coefficient_section! {
    RangeSection, "RANGES" {
        kpumin, kpumax,   // valid longitudinal slip
        alpmin, alpmax,   // valid slip angle (rad)
        cammin, cammax,   // valid camber (rad)
        fzmin, fzmax,     // allowed wheel load (N)
    }
}

coefficient_section! {
    #[serde(default)]
    ScalingSection, "SCALING_COEFFICIENTS" {
        lfzo,   // rated load
        lcx,    // Fx shape
        lmux,   // Fx peak friction
        lex,    // Fx curvature
        lkx,    // Fx slip stiffness
        lhx,    // Fx horizontal shift
        lvx,    // Fx vertical shift
        lgax,   // Fx camber
        lcy,    // Fy shape
        lmuy,   // Fy peak friction
        ley,    // Fy curvature
        lky,    // Fy cornering stiffness
        lhy,    // Fy horizontal shift
        lvy,    // Fy vertical shift
        lgay,   // Fy camber
        ltr,    // peak pneumatic trail
        lres,   // residual torque offset
        lgaz,   // Mz camber
        lxal,   // alpha influence on Fx
        lyka,   // kappa influence on Fy
        lvyka,  // kappa induced Fy
        ls,     // Mz moment arm of Fx
        lsgkp,  // Fx relaxation length
        lsgal,  // Fy relaxation length
        lgyr,   // gyroscopic torque
        lmx,    // overturning couple
        lvmx,   // Mx vertical shift
        lmy,    // rolling resistance torque
    }
}

impl Default for ScalingSection {
    fn default() -> Self {
        Self {
            lfzo: 1.0, lcx: 1.0, lmux: 1.0, lex: 1.0, lkx: 1.0, lhx: 1.0, lvx: 1.0,
            lgax: 1.0, lcy: 1.0, lmuy: 1.0, ley: 1.0, lky: 1.0, lhy: 1.0, lvy: 1.0,
            lgay: 1.0, ltr: 1.0, lres: 1.0, lgaz: 1.0, lxal: 1.0, lyka: 1.0, lvyka: 1.0,
            ls: 1.0, lsgkp: 1.0, lsgal: 1.0, lgyr: 1.0, lmx: 1.0, lvmx: 1.0, lmy: 1.0,
        }
    }
}

coefficient_section! {
    LongitudinalSection, "LONGITUDINAL_COEFFICIENTS" {
        pcx1,                // shape factor C_fx
        pdx1, pdx2, pdx3,    // friction mu_x at Fz_nom, vs load, vs camber^2
        pex1, pex2, pex3,    // curvature E_fx at Fz_nom, vs load, vs load^2
        pex4,                // E_fx while driving
        pkx1, pkx2, pkx3,    // slip stiffness K_fx/Fz, vs load, exponent vs load
        phx1, phx2,          // horizontal shift S_hx, vs load
        pvx1, pvx2,          // vertical shift S_vx/Fz, vs load
        rbx1, rbx2,          // combined: slope, slope vs kappa
        rcx1,                // combined: shape
        rex1, rex2,          // combined: curvature, vs load
        rhx1,                // combined: shift
        ptx1, ptx2, ptx3,    // relaxation length sigma_kappa0/Fz
    }
}

coefficient_section! {
    OverturningSection, "OVERTURNING_COEFFICIENTS" {
        qsx1,  // vertical shift of Mx
        qsx2,  // camber induced Mx
        qsx3,  // Fy induced Mx
    }
}

coefficient_section! {
    LateralSection, "LATERAL_COEFFICIENTS" {
        pcy1,                    // shape factor C_fy
        pdy1, pdy2, pdy3,        // friction mu_y, vs load, vs camber^2
        pey1, pey2, pey3, pey4,  // curvature E_fy, vs load, camber terms
        pky1, pky2, pky3,        // cornering stiffness peak, load at peak, vs camber
        phy1, phy2, phy3,        // horizontal shift S_hy, vs load, vs camber
        pvy1, pvy2, pvy3, pvy4,  // vertical shift S_vy/Fz, vs load, vs camber (and load)
        rby1, rby2, rby3,        // combined: slope, vs alpha, alpha shift
        rcy1,                    // combined: shape
        rey1, rey2,              // combined: curvature, vs load
        rhy1, rhy2,              // combined: shift, vs load
        rvy1, rvy2, rvy3,        // kappa-induced side force peak, vs load, vs camber
        rvy4, rvy5, rvy6,        // ... vs alpha, vs kappa, vs atan(kappa)
        pty1, pty2,              // relaxation length peak / R0, load at peak
    }
}

coefficient_section! {
    RollingSection, "ROLLING_COEFFICIENTS" {
        qsy1,  // rolling resistance torque
        qsy2,  // ... vs Fx
        qsy3,  // ... vs speed
        qsy4,  // ... vs speed^4
    }
}

coefficient_section! {
    AligningSection, "ALIGNING_COEFFICIENTS" {
        qbz1, qbz2, qbz3, qbz4, qbz5,  // trail slope B_pt, vs load, load^2, camber, |camber|
        qbz9, qbz10,                   // residual torque slope B_r
        qcz1,                          // trail shape C_pt
        qdz1, qdz2, qdz3, qdz4,        // peak trail D_pt, vs load, camber, camber^2
        qdz6, qdz7, qdz8, qdz9,        // peak residual torque D_mr, vs load, camber, camber*load
        qez1, qez2, qez3, qez4, qez5,  // trail curvature E_pt
        qhz1, qhz2, qhz3, qhz4,        // trail horizontal shift S_ht
        ssz1, ssz2, ssz3, ssz4,        // Fx moment arm s/R0
        qtz1,                          // gyration torque constant
        mbelt,                         // kg, belt mass
    }
}

// ============================================
// ----- the table ----------------------------
// ============================================

/// Immutable PAC2002 calibration table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientTable {
    pub model: ModelSection,
    #[serde(default)]
    pub dimension: DimensionSection,
    pub vertical: VerticalSection,
    pub ranges: RangeSection,
    #[serde(default)]
    pub scaling: ScalingSection,
    pub longitudinal: LongitudinalSection,
    pub overturning: OverturningSection,
    pub lateral: LateralSection,
    pub rolling: RollingSection,
    pub aligning: AligningSection,
}

impl CoefficientTable {
    /// Bundled 205/60R15 passenger-car table.
    pub fn reference() -> Result<Self, TireError> {
        Self::from_json_str(REFERENCE_TABLE)
    }

    pub fn from_json_str(text: &str) -> Result<Self, TireError> {
        let table: CoefficientTable = serde_json::from_str(text)?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TireError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TireError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Unloaded tire radius R0.
    #[inline]
    pub fn r0(&self) -> f64 {
        self.dimension.unloaded_radius
    }

    /// Nominal load Fz0 (scaled by `lfzo`).
    #[inline]
    pub fn fz_nominal(&self) -> f64 {
        self.vertical.fnomin * self.scaling.lfzo
    }

    /// Rejects tables the model cannot produce forces from.
    pub fn validate(&self) -> Result<(), TireError> {
        let sections: [(&'static str, Vec<(&'static str, f64)>); 9] = [
            (DimensionSection::SECTION, self.dimension.entries()),
            (VerticalSection::SECTION, self.vertical.entries()),
            (RangeSection::SECTION, self.ranges.entries()),
            (ScalingSection::SECTION, self.scaling.entries()),
            (LongitudinalSection::SECTION, self.longitudinal.entries()),
            (OverturningSection::SECTION, self.overturning.entries()),
            (LateralSection::SECTION, self.lateral.entries()),
            (RollingSection::SECTION, self.rolling.entries()),
            (AligningSection::SECTION, self.aligning.entries()),
        ];
        for (section, entries) in sections {
            for (name, value) in entries {
                if !value.is_finite() {
                    return Err(TireError::InvalidCoefficient { section, name, value, reason: "must be finite" });
                }
            }
        }

        positive("MODEL", "longvl", self.model.longvl)?;
        positive(DimensionSection::SECTION, "unloaded_radius", self.dimension.unloaded_radius)?;
        positive(VerticalSection::SECTION, "vertical_stiffness", self.vertical.vertical_stiffness)?;
        positive(VerticalSection::SECTION, "fnomin", self.vertical.fnomin)?;
        positive(ScalingSection::SECTION, "lfzo", self.scaling.lfzo)?;
        positive(ScalingSection::SECTION, "lmuy", self.scaling.lmuy)?;
        // shape scalings divide B = K / (C D)
        positive(ScalingSection::SECTION, "lcx", self.scaling.lcx)?;
        positive(ScalingSection::SECTION, "lcy", self.scaling.lcy)?;
        positive(LongitudinalSection::SECTION, "pcx1", self.longitudinal.pcx1)?;
        positive(LongitudinalSection::SECTION, "pdx1", self.longitudinal.pdx1)?;
        positive(LateralSection::SECTION, "pcy1", self.lateral.pcy1)?;
        positive(LateralSection::SECTION, "pdy1", self.lateral.pdy1)?;

        if self.vertical.vertical_damping < 0.0 {
            return Err(TireError::InvalidCoefficient {
                section: VerticalSection::SECTION,
                name: "vertical_damping",
                value: self.vertical.vertical_damping,
                reason: "must not be negative",
            });
        }
        if self.lateral.pky2 == 0.0 {
            return Err(TireError::InvalidCoefficient {
                section: LateralSection::SECTION,
                name: "pky2",
                value: 0.0,
                reason: "must be non-zero",
            });
        }
        if self.ranges.fzmin < 0.0 {
            return Err(TireError::InvalidCoefficient {
                section: RangeSection::SECTION,
                name: "fzmin",
                value: self.ranges.fzmin,
                reason: "must not be negative",
            });
        }

        let r = &self.ranges;
        for (name, lo, hi) in [
            ("kpumax", r.kpumin, r.kpumax),
            ("alpmax", r.alpmin, r.alpmax),
            ("cammax", r.cammin, r.cammax),
            ("fzmax", r.fzmin, r.fzmax),
        ] {
            if hi <= lo {
                return Err(TireError::InvalidCoefficient {
                    section: RangeSection::SECTION,
                    name,
                    value: hi,
                    reason: "range maximum must exceed its minimum",
                });
            }
        }

        Ok(())
    }
}

fn positive(section: &'static str, name: &'static str, value: f64) -> Result<(), TireError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(TireError::InvalidCoefficient { section, name, value, reason: "must be positive" })
    }
}
