//! Particle swarm optimization for black-box cost functions.
//!
//! A swarm of particles searches a real vector space for the position with
//! the lowest cost. The cost function is opaque: in practice it scores the
//! weight vector of a neural network, but anything implementing [`Problem`]
//! works. Progress reporting and cancellation go through an
//! [`OptimizationCallback`].
//!
//! ```no_run
//! use swarm_optimizer::{FnProblem, ParticleOptimizer, SwarmConfig};
//!
//! let problem = FnProblem::new(2, |x: &[f64]| x.iter().map(|v| v * v).sum());
//! let mut pso = ParticleOptimizer::new(SwarmConfig::new().with_seed(1)).unwrap();
//! let result = pso.optimize(&problem).unwrap();
//! println!("best {:?} -> {}", result.params, result.cost);
//! ```

mod core;
mod error;
mod optimization;

#[cfg(feature = "python")]
mod optimizer;
#[cfg(feature = "python")]
mod types;

pub use crate::core::*;
pub use error::{SwarmError, SwarmResult};
pub use optimization::*;

#[cfg(feature = "python")]
pub use optimizer::Optimizer;
#[cfg(feature = "python")]
pub use types::OptimizationResult;

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn swarm_optimizer(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Main optimizer
    m.add_class::<Optimizer>()?;

    // Output results
    m.add_class::<OptimizationResult>()?;

    Ok(())
}
