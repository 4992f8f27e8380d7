pub mod config;
pub mod validation;

pub use config::{Bounds, Coefficients, EvaluationMode, Schedule, SwarmConfig};
pub use validation::{validate_config, validate_dimensions};
