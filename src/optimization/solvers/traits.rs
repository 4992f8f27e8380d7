use crate::error::SwarmResult;

/// How a run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The full iteration budget was spent
    Completed,
    /// The callback asked to stop before the budget ran out
    Cancelled,
}

#[derive(Clone, Debug)]
pub struct SolverResult {
    pub status: RunStatus,
    /// Global best cost
    pub cost: f64,
    /// Iterations actually performed
    pub iterations: u32,
    pub message: String,
    /// Global best position
    pub params: Vec<f64>,
    pub cost_evals: usize,
}

impl SolverResult {
    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }
}

/// Callback interface for optimization progress
pub trait OptimizationCallback {
    /// Called after each iteration with the 0-based iteration index and the
    /// current global best
    fn on_iteration(&mut self, iteration: u32, params: &[f64], cost: f64) -> Result<(), String>;

    /// Polled before each iteration; `true` ends the run early
    fn should_stop(&self) -> bool {
        false
    }
}

/// Cost function being minimized. Lower is better.
///
/// `Sync` so that particles can be evaluated from a thread pool.
pub trait Problem: Sync {
    /// Evaluate cost at `params`
    fn cost(&self, params: &[f64]) -> Result<f64, String>;

    /// Number of variables
    fn num_params(&self) -> usize;
}

/// Solver interface - takes problem and callback
pub trait Solver {
    fn name(&self) -> &str;

    /// Solve the optimization problem with callback for progress tracking
    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> SwarmResult<SolverResult>;
}

/// Callback that never reports and never stops
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCallback;

impl OptimizationCallback for NoopCallback {
    fn on_iteration(&mut self, _iteration: u32, _params: &[f64], _cost: f64) -> Result<(), String> {
        Ok(())
    }
}
