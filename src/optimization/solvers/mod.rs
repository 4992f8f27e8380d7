mod particle;
mod shared_best;
pub mod traits;

pub use particle::{GlobalBest, Particle, ParticleOptimizer, RunState};
pub use shared_best::SharedBest;
pub use traits::{NoopCallback, OptimizationCallback, Problem, RunStatus, Solver, SolverResult};
