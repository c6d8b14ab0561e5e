//! Review orchestration.
//!
//! The [`ResumeLoop`] drives any [`ExecutionSurface`] through repeated
//! pause → review → resume cycles. [`ReplaySurface`] is the scripted
//! surface used by the CLI and the end-to-end tests.

mod replay;
mod resume_loop;
mod surface;

pub use replay::{load_script, parse_script, ExecutedCall, ReplaySurface, ScriptError};
pub use resume_loop::{
    LoopError, LoopOutcome, LoopReport, LoopState, ResolvedRequest, ResumeLoop,
};
pub use surface::{ExecutionSurface, PendingRequest, SurfaceError};
