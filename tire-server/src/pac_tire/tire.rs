// ==============================================================================
// tire.rs — PACEJKA TIRE (UPDATE / ADVANCE CYCLE)
// ------------------------------------------------------------------------------
// One PacejkaTire per simulated wheel. Per outer step the owner calls:
//
//   update(time, wheel_state)
//     - caches the wheel state, rebuilds the tire frame from the terrain normal
//     - resolves disc/terrain contact
//     - zeroes this cycle's outputs
//
//   advance(step)
//     - transient: fixed native RK4 steps, one partial step at the end; every
//       step recomputes vertical load -> kinematic slip -> deflection ODEs
//     - kinematic only: load, kinematic slip and relaxation once, primed = kinematic
//     - pure slip -> combined slip -> Mx / My -> safety net
//     - local results are rotated into the global frame
//
// Only SlipState and the previous-cycle memory survive between cycles.
// update/advance never fail; construction validates everything up front.
// ==============================================================================

use std::sync::Arc;

use serde::Serialize;

use crate::pac_tire::combined_slip::{CombinedSlip, combined_slip};
use crate::pac_tire::config::{TireConfig, VerticalLoadModel};
use crate::pac_tire::contact::ContactState;
use crate::pac_tire::error::TireError;
use crate::pac_tire::frame::TireFrame;
use crate::pac_tire::kinematics::KinematicSlip;
use crate::pac_tire::moments::{overturning_moment, rolling_resistance_moment};
use crate::pac_tire::params::CoefficientTable;
use crate::pac_tire::pure_slip::{PureSlip, SlipInputs, pure_slip};
use crate::pac_tire::relaxation::Relaxation;
use crate::pac_tire::safety::{self, Violation};
use crate::pac_tire::terrain::Terrain;
use crate::pac_tire::transient::{FreezeCheck, SlipState};
use crate::pac_tire::types::{ForceFrame, Pos3, TireForce, Vec3, WheelState};
use crate::pac_tire::vertical::{
    LoadTransferInputs, VerticalLoad, effective_rolling_radius, load_ratio, load_transfer,
    normal_approach_speed, spring_damper,
};

/// What the next cycle needs from this one.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CycleMemory {
    fx: f64,         // N, combined
    fy: f64,         // N, combined
    alpha_r_eq: f64, // rad
    d_y: f64,        // N
}

pub struct PacejkaTire {
    name: String,
    params: Arc<CoefficientTable>,
    terrain: Arc<dyn Terrain + Send + Sync>,
    config: TireConfig,

    // ----- cycle inputs -----
    time: f64,
    wheel: WheelState,
    frame: TireFrame,
    contact: ContactState,

    // ----- derived -----
    load: VerticalLoad,
    relax: Relaxation,
    slip: SlipState,
    pure: PureSlip,
    combined: CombinedSlip,
    memory: CycleMemory,

    // ----- outputs (local = tire frame, point relative to wheel center) -----
    pure_local: TireForce,
    pure_global: TireForce,
    combined_local: TireForce,
    combined_global: TireForce,
    violations: Vec<Violation>,
}

impl PacejkaTire {
    pub fn new(
        name: impl Into<String>,
        params: Arc<CoefficientTable>,
        terrain: Arc<dyn Terrain + Send + Sync>,
        config: TireConfig,
    ) -> Result<Self, TireError> {
        params.validate()?;
        config.validate()?;

        let load = VerticalLoad::unloaded(&params, 0.0);
        let relax = Relaxation::compute(&params, &config, 0.0, load.dfz);
        let memory = CycleMemory { fx: 0.0, fy: 0.0, alpha_r_eq: 0.0, d_y: params.fz_nominal() };

        Ok(Self {
            name: name.into(),
            params,
            terrain,
            config,
            time: 0.0,
            wheel: WheelState::default(),
            frame: TireFrame::default(),
            contact: ContactState::default(),
            load,
            relax,
            slip: SlipState::default(),
            pure: PureSlip::default(),
            combined: CombinedSlip::default(),
            memory,
            pure_local: TireForce::default(),
            pure_global: TireForce::default(),
            combined_local: TireForce::default(),
            combined_global: TireForce::default(),
            violations: Vec::new(),
        })
    }

    // ============================================
    // ----- cycle --------------------------------
    // ============================================

    pub fn update(&mut self, time: f64, wheel: &WheelState) {
        self.time = time;
        self.wheel = *wheel;

        let terrain = self.terrain.as_ref();
        let normal = wheel.wheel_normal();
        let up = terrain.normal(wheel.pos.x, wheel.pos.y);
        self.frame = TireFrame::new(wheel.pos, normal, up, &wheel.rot);

        self.contact = ContactState::resolve(terrain, &wheel.pos, &normal, &wheel.rot, self.params.r0());

        // an imposed load keeps the tire on the ground
        if let Some(fz) = self.config.vertical_load_override {
            if !self.contact.in_contact {
                let depth = fz.max(self.params.ranges.fzmin) / self.params.vertical.vertical_stiffness;
                let point = wheel.pos - self.frame.z_axis() * (self.params.r0() - depth);
                self.contact = ContactState {
                    in_contact: true,
                    frame: TireFrame::new(point, normal, up, &wheel.rot),
                    depth,
                };
            }
        }

        let origin = self.application_point();
        let zero = TireForce { point: origin, ..TireForce::default() };
        self.pure_global = zero;
        self.combined_global = zero;
        let local_zero = TireForce { point: self.local_point(&origin), ..TireForce::default() };
        self.pure_local = local_zero;
        self.combined_local = local_zero;
        self.violations.clear();
    }

    pub fn advance(&mut self, step: f64) {
        if self.config.use_transient_slip {
            let native = self.config.step;
            let mut remaining = step;
            let mut substeps = 1usize;
            while remaining > native {
                self.advance_step(native);
                remaining -= native;
                substeps += 1;
            }
            self.advance_step(remaining);
            tracing::debug!(tire = %self.name, step, substeps, "transient slip advanced");
        } else {
            self.update_load();
            self.update_kinematics();
            if self.contact.in_contact {
                let (fz, dfz) = self.curve_load();
                self.relax = Relaxation::compute(&self.params, &self.config, fz, dfz);
            }
        }

        self.evaluate();
    }

    fn advance_step(&mut self, h: f64) {
        self.update_load();
        self.update_kinematics();
        if !self.contact.in_contact {
            return;
        }

        let (fz, dfz) = self.curve_load();
        self.relax = Relaxation::compute(&self.params, &self.config, fz, dfz);
        let freeze = FreezeCheck { alpha_r_eq: self.memory.alpha_r_eq, d_y: self.memory.d_y };
        self.slip.integrate(&self.relax, &freeze, &self.config, h);
    }

    fn update_load(&mut self) {
        let p = self.params.as_ref();
        let omega = self.wheel.omega;

        self.load = if let Some(fz) = self.config.vertical_load_override {
            VerticalLoad::overridden(p, fz, omega)
        } else if self.contact.in_contact {
            let v_n = normal_approach_speed(&self.wheel, &self.contact.frame.origin, &self.contact.normal());
            let fz = match self.config.vertical_load {
                VerticalLoadModel::SpringDamper => spring_damper(p, self.contact.depth, v_n),
                VerticalLoadModel::LoadTransfer => {
                    let prev = LoadTransferInputs {
                        fx: self.memory.fx,
                        fy: self.memory.fy,
                        gamma_p: self.slip.gamma_p,
                    };
                    load_transfer(p, self.contact.depth, v_n, omega, &prev)
                }
            };
            VerticalLoad::from_depth(p, fz, self.contact.depth, omega)
        } else {
            VerticalLoad::unloaded(p, omega)
        };
    }

    fn update_kinematics(&mut self) {
        if self.contact.in_contact {
            let k = KinematicSlip::compute(&self.frame, &self.wheel, self.load.r_eff, self.config.v_x_threshold);
            self.slip.set_kinematic(&k, self.config.v_x_threshold);
        } else {
            // deflections relax instantly off the ground; keep the velocities
            let k = KinematicSlip::velocities_only(&self.frame, &self.wheel, self.load.r_eff);
            self.slip.reset();
            self.slip.store_velocities(&k);
        }
    }

    /// Load the curves see: capped at the Fz threshold.
    fn curve_load(&self) -> (f64, f64) {
        let fz = self.load.fz.min(self.config.thresholds.fz);
        (fz, load_ratio(&self.params, fz))
    }

    fn evaluate(&mut self) {
        if !self.contact.in_contact {
            self.pure = PureSlip::default();
            self.combined = CombinedSlip::default();
            self.memory.fx = 0.0;
            self.memory.fy = 0.0;
            self.memory.alpha_r_eq = 0.0;
            return;
        }

        let p = self.params.as_ref();
        let limits = self.config.thresholds;

        let fz = safety::cap_load(self.load.fz, &limits, &self.name, &mut self.violations);
        let inputs = SlipInputs {
            fz,
            dfz: load_ratio(p, fz),
            kappa: self.slip.kappa_p,
            alpha: self.slip.alpha_p,
            gamma: self.slip.gamma_p,
            cos_prime: self.slip.cos_prime,
        };

        self.pure = pure_slip(p, &inputs);
        self.combined = combined_slip(p, &inputs, &self.pure);

        let mx = overturning_moment(p, fz, inputs.gamma, self.combined.lat.fy);
        let my = rolling_resistance_moment(p, fz, self.wheel.omega, self.load.r_eff, self.combined.long.fx);

        let mut pure_f = Vec3::new(self.pure.long.fx, self.pure.lat.fy, fz);
        let mut pure_m = Vec3::new(mx, my, self.pure.align.mz);
        let mut comb_f = Vec3::new(self.combined.long.fx, self.combined.lat.fy, fz);
        let mut comb_m = Vec3::new(mx, my, self.combined.align.mz);

        let pure_v = safety::apply(&mut pure_f, &mut pure_m, &limits, &self.name);
        let comb_v = safety::apply(&mut comb_f, &mut comb_m, &limits, &self.name);
        self.violations.extend(pure_v);
        self.violations.extend(comb_v);

        let point = self.application_point();
        let local_point = self.local_point(&point);

        self.pure_local = TireForce { point: local_point, force: pure_f, moment: pure_m };
        self.combined_local = TireForce { point: local_point, force: comb_f, moment: comb_m };
        self.pure_global = self.to_global(&self.pure_local, point);
        self.combined_global = self.to_global(&self.combined_local, point);

        self.memory = CycleMemory {
            fx: comb_f.x,
            fy: comb_f.y,
            alpha_r_eq: self.combined.align.alpha_r_eq,
            d_y: self.pure.lat.d_y,
        };
    }

    fn application_point(&self) -> Pos3 {
        if self.contact.in_contact { self.contact.frame.origin } else { self.wheel.pos }
    }

    fn local_point(&self, global: &Pos3) -> Pos3 {
        Pos3::from(self.frame.to_local(&(global - self.frame.origin)))
    }

    fn to_global(&self, local: &TireForce, point: Pos3) -> TireForce {
        TireForce {
            point,
            force: self.frame.to_global(&local.force),
            moment: self.frame.to_global(&local.moment),
        }
    }

    // ============================================
    // ----- outputs ------------------------------
    // ============================================

    /// Combined-slip result, the one a vehicle model applies.
    pub fn get_tire_force(&self, frame: ForceFrame) -> TireForce {
        self.get_tire_force_combined_slip(frame)
    }

    pub fn get_tire_force_pure_slip(&self, frame: ForceFrame) -> TireForce {
        match frame {
            ForceFrame::Local => self.pure_local,
            ForceFrame::Global => self.pure_global,
        }
    }

    pub fn get_tire_force_combined_slip(&self, frame: ForceFrame) -> TireForce {
        match frame {
            ForceFrame::Local => self.combined_local,
            ForceFrame::Global => self.combined_global,
        }
    }

    /// Imposes the vertical load from now on, bypassing the contact model.
    pub fn set_vertical_load(&mut self, fz: f64) {
        self.config.vertical_load_override = Some(fz.max(0.0));
    }

    pub fn clear_vertical_load(&mut self) {
        self.config.vertical_load_override = None;
    }

    /// Kinematic (kappa, alpha, gamma) this tire would see for `wheel` on its
    /// terrain, at the current loaded radius.
    pub fn slips_from_state(&self, wheel: &WheelState) -> (f64, f64, f64) {
        let up = self.terrain.normal(wheel.pos.x, wheel.pos.y);
        let frame = TireFrame::new(wheel.pos, wheel.wheel_normal(), up, &wheel.rot);
        let r_eff = effective_rolling_radius(&self.params, wheel.omega, self.load.r_l);
        let k = KinematicSlip::compute(&frame, wheel, r_eff, self.config.v_x_threshold);
        (k.kappa, k.alpha, k.gamma)
    }

    // ============================================
    // ----- accessors ----------------------------
    // ============================================

    pub fn name(&self) -> &str { &self.name }
    pub fn time(&self) -> f64 { self.time }
    pub fn params(&self) -> &CoefficientTable { &self.params }
    pub fn config(&self) -> &TireConfig { &self.config }

    pub fn kappa(&self) -> f64 { self.slip.kappa }
    pub fn alpha(&self) -> f64 { self.slip.alpha }
    pub fn gamma(&self) -> f64 { self.slip.gamma }
    pub fn kappa_prime(&self) -> f64 { self.slip.kappa_p }
    pub fn alpha_prime(&self) -> f64 { self.slip.alpha_p }
    pub fn gamma_prime(&self) -> f64 { self.slip.gamma_p }

    pub fn rolling_radius(&self) -> f64 { self.load.r_eff }
    pub fn vertical_load(&self) -> f64 { self.load.fz }
    pub fn slip_state(&self) -> &SlipState { &self.slip }
    pub fn relaxation(&self) -> &Relaxation { &self.relax }
    pub fn contact(&self) -> &ContactState { &self.contact }
    pub fn frame(&self) -> &TireFrame { &self.frame }
    pub fn pure_slip(&self) -> &PureSlip { &self.pure }
    pub fn combined_slip(&self) -> &CombinedSlip { &self.combined }
    pub fn last_violations(&self) -> &[Violation] { &self.violations }

    pub fn long_slip_range(&self) -> (f64, f64) {
        (self.params.ranges.kpumin, self.params.ranges.kpumax)
    }

    pub fn lat_slip_range(&self) -> (f64, f64) {
        (self.params.ranges.alpmin, self.params.ranges.alpmax)
    }

    pub fn longvl(&self) -> f64 { self.params.model.longvl }

    pub fn step_size(&self) -> f64 { self.config.step }

    pub fn set_step_size(&mut self, step: f64) -> Result<(), TireError> {
        if !(step > 0.0 && step.is_finite()) {
            return Err(TireError::config(format!("native step must be positive, got {step}")));
        }
        self.config.step = step;
        Ok(())
    }

    /// One telemetry row for the current cycle.
    pub fn sample(&self) -> TireSample {
        let s = &self.slip;
        let pure = &self.pure_local;
        let comb = &self.combined_local;
        TireSample {
            time: self.time,
            kappa: s.kappa,
            alpha: s.alpha,
            gamma: s.gamma,
            kappa_p: s.kappa_p,
            alpha_p: s.alpha_p,
            gamma_p: s.gamma_p,
            vx: s.v_cx,
            vy: s.v_cy,
            fx: pure.force.x,
            fy: pure.force.y,
            fz: pure.force.z,
            mx: pure.moment.x,
            my: pure.moment.y,
            mz: pure.moment.z,
            fx_c: comb.force.x,
            fy_c: comb.force.y,
            mz_c: comb.moment.z,
            mz_x: self.combined.align.mz_x,
            mz_y: self.combined.align.mz_y,
            contact: self.contact.in_contact,
            load: self.load.fz,
            dfz: self.load.dfz,
            u: s.u,
            v_alpha: s.v_alpha,
            v_gamma: s.v_gamma,
            v_phi: s.v_phi,
            du: s.du,
            dv_alpha: s.dv_alpha,
            dv_gamma: s.dv_gamma,
            dv_phi: s.dv_phi,
        }
    }
}

/// Flat per-cycle telemetry (tire frame forces).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TireSample {
    pub time: f64,
    pub kappa: f64,
    pub alpha: f64,
    pub gamma: f64,
    pub kappa_p: f64,
    pub alpha_p: f64,
    pub gamma_p: f64,
    pub vx: f64,
    pub vy: f64,
    // pure
    pub fx: f64,
    pub fy: f64,
    pub fz: f64,
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
    // combined
    pub fx_c: f64,
    pub fy_c: f64,
    pub mz_c: f64,
    pub mz_x: f64,
    pub mz_y: f64,
    pub contact: bool,
    pub load: f64,
    pub dfz: f64,
    pub u: f64,
    pub v_alpha: f64,
    pub v_gamma: f64,
    pub v_phi: f64,
    pub du: f64,
    pub dv_alpha: f64,
    pub dv_gamma: f64,
    pub dv_phi: f64,
}
