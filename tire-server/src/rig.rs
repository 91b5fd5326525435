// ==============================================================================
// rig.rs — TIRE TEST RIG (SLIP SWEEPS ON FLAT GROUND)
// ------------------------------------------------------------------------------
// Drives three PacejkaTire instances through prescribed slip histories at a
// fixed forward speed and imposed vertical load:
// - longitudinal: κ ramps -κ_lim -> +κ_lim, α = 0
// - lateral:      α ramps -α_lim -> +α_lim, κ = 0
// - combined:     κ ramps as above, α = α_lim sin(2π t / t_end)  (powered lane change)
//
// step():
//   builds each wheel state from its target slips, runs update + advance once,
//   and returns a RigSnapshot (one TireSample per channel).
//   The sweep restarts from t = 0 after t_end.
// ==============================================================================

use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pac_tire::terrain::FlatTerrain;
use crate::pac_tire::vertical::effective_rolling_radius;
use crate::pac_tire::{CoefficientTable, PacejkaTire, TireConfig, TireError, TireSample, WheelState};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    // ----- server -----
    pub bind_addr: String,
    pub tick_ms: u64,

    // ----- sweep -----
    pub sim_step: f64,   // s per tick
    pub t_end: f64,      // s
    pub kappa_lim: f64,  // -
    pub alpha_lim: f64,  // rad
    pub fz: f64,         // N, imposed load
    pub vx: f64,         // m/s

    /// PAC2002 table as JSON; the bundled 205/60R15 table when absent.
    pub coefficients: Option<PathBuf>,
    pub tire: TireConfig,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9001".to_string(),
            tick_ms: 16,
            sim_step: 0.01,
            t_end: 10.0,
            kappa_lim: 0.3,
            alpha_lim: 0.2,
            fz: 4000.0,
            vx: 10.0,
            coefficients: None,
            tire: TireConfig::default(),
        }
    }
}

impl RigConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TireError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TireError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    fn validate(&self) -> Result<(), TireError> {
        if !(self.sim_step > 0.0) || !(self.t_end > self.sim_step) {
            return Err(TireError::config("rig needs 0 < sim_step < t_end"));
        }
        if !(self.fz > 0.0) || !(self.vx > 0.0) {
            return Err(TireError::config("rig load and speed must be positive"));
        }
        if self.tick_ms == 0 {
            return Err(TireError::config("rig tick_ms must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sweep {
    Longitudinal,
    Lateral,
    Combined,
}

impl Sweep {
    pub fn label(self) -> &'static str {
        match self {
            Sweep::Longitudinal => "longitudinal",
            Sweep::Lateral => "lateral",
            Sweep::Combined => "combined",
        }
    }

    /// Target (kappa, alpha) at time `t`.
    pub fn slips(self, t: f64, cfg: &RigConfig) -> (f64, f64) {
        let ramp = -1.0 + 2.0 * (t / cfg.t_end).clamp(0.0, 1.0);
        match self {
            Sweep::Longitudinal => (ramp * cfg.kappa_lim, 0.0),
            Sweep::Lateral => (0.0, ramp * cfg.alpha_lim),
            Sweep::Combined => (ramp * cfg.kappa_lim, cfg.alpha_lim * (2.0 * PI * t / cfg.t_end).sin()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RigChannel {
    pub sweep: Sweep,
    pub target_kappa: f64,
    pub target_alpha: f64,
    pub violations: usize,
    pub sample: TireSample,
}

#[derive(Clone, Debug, Serialize)]
pub struct RigSnapshot {
    pub tick: u64,
    pub time: f64,
    pub fz: f64,
    pub channels: Vec<RigChannel>,
}

pub struct TireRig {
    config: RigConfig,
    params: Arc<CoefficientTable>,
    tires: Vec<(Sweep, PacejkaTire)>,
    tick: u64,
    time: f64,
}

impl TireRig {
    pub fn new(config: RigConfig) -> Result<Self, TireError> {
        config.validate()?;

        let params = Arc::new(match &config.coefficients {
            Some(path) => CoefficientTable::from_json_file(path)?,
            None => CoefficientTable::reference()?,
        });

        let mut rig = Self { config, params, tires: Vec::new(), tick: 0, time: 0.0 };
        rig.build_tires()?;

        tracing::info!(
            fz = rig.config.fz,
            vx = rig.config.vx,
            t_end = rig.config.t_end,
            "🛞 tire rig ready"
        );
        Ok(rig)
    }

    fn build_tires(&mut self) -> Result<(), TireError> {
        let ground = Arc::new(FlatTerrain::new(0.0));
        let mut tire_cfg = self.config.tire;
        tire_cfg.vertical_load_override = Some(self.config.fz);

        self.tires = [Sweep::Longitudinal, Sweep::Lateral, Sweep::Combined]
            .into_iter()
            .map(|sweep| {
                let name = format!("rig-{}", sweep.label());
                PacejkaTire::new(name, Arc::clone(&self.params), ground.clone(), tire_cfg).map(|t| (sweep, t))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(())
    }

    pub fn config(&self) -> &RigConfig { &self.config }
    pub fn time(&self) -> f64 { self.time }
    pub fn tick(&self) -> u64 { self.tick }

    pub fn tires(&self) -> impl Iterator<Item = (Sweep, &PacejkaTire)> {
        self.tires.iter().map(|(s, t)| (*s, t))
    }

    /// Restarts the sweep with fresh tire state.
    pub fn reset(&mut self) -> Result<(), TireError> {
        self.time = 0.0;
        self.build_tires()?;
        tracing::info!("🔁 tire rig reset");
        Ok(())
    }

    /// Changes the imposed load for every channel from the next step on.
    pub fn set_load(&mut self, fz: f64) -> Result<(), TireError> {
        if !(fz > 0.0 && fz.is_finite()) {
            return Err(TireError::config(format!("rig load must be positive, got {fz}")));
        }
        self.config.fz = fz;
        for (_, tire) in &mut self.tires {
            tire.set_vertical_load(fz);
        }
        tracing::info!(fz, "rig load changed");
        Ok(())
    }

    pub fn step(&mut self) -> RigSnapshot {
        let dt = self.config.sim_step;
        if self.time + dt > self.config.t_end + 1e-9 {
            self.time = 0.0;
            tracing::info!(tick = self.tick, "sweep finished, restarting");
        }

        let p = self.params.as_ref();
        let r_l = p.r0() - self.config.fz / p.vertical.vertical_stiffness;

        let mut channels = Vec::with_capacity(self.tires.len());
        for (sweep, tire) in &mut self.tires {
            let (kappa, alpha) = sweep.slips(self.time, &self.config);
            let r_eff = commanded_rolling_radius(p, kappa, self.config.vx * alpha.cos(), r_l);
            let mut wheel = WheelState::from_slips(kappa, alpha, 0.0, self.config.vx, r_eff);
            wheel.pos.z = r_l;

            tire.update(self.time, &wheel);
            tire.advance(dt);

            channels.push(RigChannel {
                sweep: *sweep,
                target_kappa: kappa,
                target_alpha: alpha,
                violations: tire.last_violations().len(),
                sample: tire.sample(),
            });
        }

        let snapshot = RigSnapshot { tick: self.tick, time: self.time, fz: self.config.fz, channels };
        self.tick += 1;
        self.time += dt;
        snapshot
    }
}

/// Effective rolling radius at the spin that produces `kappa`.
/// R_eff depends on ω only through a small centrifugal growth term, so the
/// fixed point settles in a few passes.
fn commanded_rolling_radius(p: &CoefficientTable, kappa: f64, v_cx: f64, r_l: f64) -> f64 {
    let mut r_eff = r_l;
    for _ in 0..8 {
        let omega = (kappa * v_cx.abs() + v_cx) / r_eff;
        r_eff = effective_rolling_radius(p, omega, r_l);
    }
    r_eff
}
