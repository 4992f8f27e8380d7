use crate::optimization::{RunStatus, SolverResult};
use pyo3::prelude::*;

// ===== OUTPUT TYPES =====

#[pyclass]
#[derive(Clone, Debug)]
pub struct OptimizationResult {
    #[pyo3(get)]
    pub position: Vec<f64>,
    #[pyo3(get)]
    pub cost: f64,
    #[pyo3(get)]
    pub iterations: u32,
    #[pyo3(get)]
    pub cost_evals: usize,
    #[pyo3(get)]
    pub cancelled: bool,
    #[pyo3(get)]
    pub message: String,
}

#[pymethods]
impl OptimizationResult {
    fn __repr__(&self) -> String {
        format!(
            "OptimizationResult(cost={:.6e}, iterations={}, cost_evals={}, cancelled={})",
            self.cost, self.iterations, self.cost_evals, self.cancelled
        )
    }
}

impl From<SolverResult> for OptimizationResult {
    fn from(result: SolverResult) -> Self {
        Self {
            cancelled: result.status == RunStatus::Cancelled,
            position: result.params,
            cost: result.cost,
            iterations: result.iterations,
            cost_evals: result.cost_evals,
            message: result.message,
        }
    }
}
