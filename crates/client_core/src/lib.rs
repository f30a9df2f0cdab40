//! Client-side analysis flow: upload intake, the run controller and its
//! state container, settings, and text renderers for the display layer.

pub mod config;
mod controller;
pub mod display;
pub mod intake;
pub mod session;

pub use config::{load_settings, ControllerSettings};
pub use controller::{ControllerEvent, ProgressController};
pub use intake::{IntakeError, IntakeOutcome, UploadIntake};
pub use session::{RunPhase, RunSession, SessionSnapshot};
