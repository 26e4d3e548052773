pub mod benchmark;
pub mod boosts;
pub mod calibration;
pub mod config;
pub mod distributions;
pub mod engine;
pub mod odds;
pub mod simulation;
pub mod types;
pub mod value;

pub use config::EngineConfig;
pub use engine::{EngineError, SimulationEngine};
pub use types::{MatchContext, SimulationResponse};
