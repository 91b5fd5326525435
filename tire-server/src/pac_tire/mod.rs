//! pac_tire - PAC2002 Magic Formula tire (contact, load, transient slip, forces)

pub mod types;
pub mod error;
pub mod params;
pub mod config;
pub mod terrain;
pub mod frame;
pub mod contact;
pub mod vertical;
pub mod kinematics;
pub mod relaxation;
pub mod transient;
pub mod pure_slip;
pub mod combined_slip;
pub mod moments;
pub mod safety;
pub mod tire;

pub use types::*;
pub use error::TireError;
pub use params::CoefficientTable;
pub use config::{OutputThresholds, TireConfig, VerticalLoadModel};
pub use terrain::{FlatTerrain, PlaneTerrain, Terrain};
pub use transient::SlipState;
pub use tire::{PacejkaTire, TireSample};
