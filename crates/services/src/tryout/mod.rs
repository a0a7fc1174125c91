mod run;
mod timer;
mod workflow;

// Public API of the tryout subsystem.
pub use crate::error::TryoutError;
pub use run::TryoutRun;
pub use timer::{CountdownHandle, TICK_PERIOD};
pub use workflow::TryoutLoopService;
