pub mod callback;
pub mod problem;
pub mod solvers;

pub use callback::{
    CancellationToken, ConsoleCallback, HistoryCallback, IterationResult, StopCheck,
};
pub use problem::{ArgminCost, FnProblem, TryFnProblem};
pub use solvers::{GlobalBest, Particle, ParticleOptimizer, RunState, SharedBest};
pub use solvers::{NoopCallback, OptimizationCallback, Problem, RunStatus, Solver, SolverResult};
