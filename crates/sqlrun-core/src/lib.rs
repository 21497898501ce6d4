//! sqlrun core - shared types and driver traits
//!
//! Everything the other sqlrun crates agree on lives here:
//!
//! - `Driver` / `Session` - the boundary a database backend implements
//! - `ConnectionParams`, `ScriptSource`, `Script`, `Unit` - inputs to a run
//! - `UnitResult`, `ScriptOutcome`, `RunSummary`, `RunReport` - outputs
//! - `Decision` / `DecisionRequest` - the failure-handling protocol
//! - `SqlRunError` - the error type

mod error;
mod params;
mod run;
mod script;
mod session;

pub use error::*;
pub use params::*;
pub use run::*;
pub use script::*;
pub use session::*;
