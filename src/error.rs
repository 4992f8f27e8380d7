//! Error types for swarm optimization.

use std::fmt;

/// Result type for swarm optimization operations.
pub type SwarmResult<T> = Result<T, SwarmError>;

/// Errors that can occur while configuring or running the optimizer.
///
/// Cancellation is not an error: a cancelled run returns a normal result
/// carrying the best solution found so far.
#[derive(Debug, Clone, PartialEq)]
pub enum SwarmError {
    /// A configuration value was rejected before any evaluation took place.
    InvalidConfig { parameter: String, message: String },

    /// The cost function reported a failure.
    CostFunction { iteration: Option<u32>, message: String },

    /// The cost function returned NaN for the given position.
    NonNumericCost {
        iteration: Option<u32>,
        particle: usize,
        position: Vec<f64>,
    },

    /// An iteration was requested before the swarm was initialized.
    NotInitialized,

    /// The progress callback reported a failure.
    Callback { iteration: u32, message: String },

    /// The configuration could not be read or parsed.
    ConfigLoad(String),
}

impl SwarmError {
    pub(crate) fn invalid(parameter: &str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }
}

fn phase(iteration: &Option<u32>) -> String {
    match iteration {
        Some(i) => format!("iteration {}", i),
        None => "initialization".to_string(),
    }
}

impl fmt::Display for SwarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { parameter, message } => {
                write!(f, "Invalid parameter '{}': {}", parameter, message)
            }
            Self::CostFunction { iteration, message } => {
                write!(
                    f,
                    "Cost function failed during {}: {}",
                    phase(iteration),
                    message
                )
            }
            Self::NonNumericCost {
                iteration,
                particle,
                position,
            } => {
                write!(
                    f,
                    "Cost function returned NaN during {} for particle {} at {:?}",
                    phase(iteration),
                    particle,
                    position
                )
            }
            Self::NotInitialized => write!(f, "Swarm stepped before initialization"),
            Self::Callback { iteration, message } => {
                write!(f, "Progress callback failed at iteration {}: {}", iteration, message)
            }
            Self::ConfigLoad(msg) => write!(f, "Failed to load configuration: {}", msg),
        }
    }
}

impl std::error::Error for SwarmError {}

impl From<serde_json::Error> for SwarmError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigLoad(err.to_string())
    }
}

impl From<std::io::Error> for SwarmError {
    fn from(err: std::io::Error) -> Self {
        Self::ConfigLoad(err.to_string())
    }
}
