//! Hermes visibility kernel: exponential decay of profile visibility and a
//! time-of-day boost, wrapped by a snapshot-based engine.

pub mod config;
pub mod decay;
pub mod engine;
pub mod metrics;
pub mod time_of_day;
pub mod types;

pub use config::{HermesConfig, HermesConfigPatch};
pub use engine::{EngineSnapshot, HermesEngine, ScoredVisibility, TimeImpact};
pub use types::{DecayConstant, ElapsedHours, HermesError, Hour, SystemLoad, VisibilityReport};
