pub mod net;
pub mod pac_tire;
pub mod rig;
pub mod state;
