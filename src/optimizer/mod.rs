mod problem;

pub use problem::{PyCallback, PyProblem};

use crate::core::{EvaluationMode, SwarmConfig};
use crate::error::SwarmError;
use crate::optimization::{ParticleOptimizer, Solver};
use crate::types::OptimizationResult;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn to_py_err(err: SwarmError) -> PyErr {
    match err {
        SwarmError::InvalidConfig { .. } | SwarmError::ConfigLoad(_) => {
            PyValueError::new_err(err.to_string())
        }
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

#[pyclass]
pub struct Optimizer {
    #[pyo3(get, set)]
    pub num_var: usize,
    #[pyo3(get, set)]
    pub num_particles: usize,
    #[pyo3(get, set)]
    pub iter_max: u32,
    #[pyo3(get, set)]
    pub var_min: f64,
    #[pyo3(get, set)]
    pub var_max: f64,
    #[pyo3(get, set)]
    pub wi: f64,
    #[pyo3(get, set)]
    pub wf: f64,
    #[pyo3(get, set)]
    pub cpi: f64,
    #[pyo3(get, set)]
    pub cpf: f64,
    #[pyo3(get, set)]
    pub csi: f64,
    #[pyo3(get, set)]
    pub csf: f64,
    #[pyo3(get, set)]
    pub seed: Option<u64>,
    #[pyo3(get, set)]
    pub parallel: bool,
    #[pyo3(get, set)]
    pub verbose: bool,
}

#[pymethods]
impl Optimizer {
    #[new]
    #[pyo3(signature = (num_var, num_particles=30, iter_max=100, var_min=-10.0, var_max=10.0, wi=0.9, wf=0.4, cpi=2.5, cpf=0.5, csi=0.5, csf=2.5, seed=None, parallel=false, verbose=false))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        num_var: usize,
        num_particles: usize,
        iter_max: u32,
        var_min: f64,
        var_max: f64,
        wi: f64,
        wf: f64,
        cpi: f64,
        cpf: f64,
        csi: f64,
        csf: f64,
        seed: Option<u64>,
        parallel: bool,
        verbose: bool,
    ) -> PyResult<Self> {
        let optimizer = Self {
            num_var,
            num_particles,
            iter_max,
            var_min,
            var_max,
            wi,
            wf,
            cpi,
            cpf,
            csi,
            csf,
            seed,
            parallel,
            verbose,
        };
        // Fail at construction, not halfway through a run
        optimizer.validate()?;
        Ok(optimizer)
    }

    /// Minimize `cost_function` and return the best position found.
    ///
    /// `progress(iteration, cost, position)` is called after every iteration;
    /// `stopped()` is polled before each one and a truthy value ends the run
    /// with the best result so far. An exception from `stopped()` also ends
    /// the run and is raised here.
    #[pyo3(signature = (cost_function, progress=None, stopped=None))]
    fn optimize(
        &self,
        py: Python<'_>,
        cost_function: PyObject,
        progress: Option<PyObject>,
        stopped: Option<PyObject>,
    ) -> PyResult<Py<OptimizationResult>> {
        self.validate()?;
        let config = self.config();

        if self.verbose {
            println!("\n=== OPTIMIZATION START ===");
            println!(
                "Variables: {}, particles: {}, iterations: {}",
                self.num_var, self.num_particles, self.iter_max
            );
        }

        let problem = PyProblem::new(self.num_var, cost_function);
        let mut callback = PyCallback::new(progress, stopped, self.verbose, self.iter_max);
        let mut solver = ParticleOptimizer::new(config).map_err(to_py_err)?;

        // Worker threads need the GIL to call back into Python
        let result = py
            .allow_threads(|| solver.solve(&problem, &mut callback))
            .map_err(to_py_err)?;

        if let Some(err) = callback.take_stop_error() {
            return Err(err);
        }

        if self.verbose {
            callback
                .console()
                .print_summary(!result.is_cancelled(), &result.message);
        }

        Py::new(py, OptimizationResult::from(result))
    }

    /// Current settings as a JSON document
    fn config_json(&self) -> PyResult<String> {
        self.config().to_json_string().map_err(to_py_err)
    }
}

impl Optimizer {
    fn config(&self) -> SwarmConfig {
        let evaluation = if self.parallel {
            EvaluationMode::Parallel { threads: 0 }
        } else {
            EvaluationMode::Sequential
        };

        let mut config = SwarmConfig::new()
            .with_particles(self.num_particles)
            .with_iterations(self.iter_max)
            .with_bounds(self.var_min, self.var_max)
            .with_inertia(self.wi, self.wf)
            .with_cognitive(self.cpi, self.cpf)
            .with_social(self.csi, self.csf)
            .with_evaluation(evaluation)
            .with_verbose(self.verbose);
        config.seed = self.seed;
        config
    }

    fn validate(&self) -> PyResult<()> {
        let config = self.config();
        config.validate().map_err(to_py_err)?;
        crate::core::validate_dimensions(&config, self.num_var).map_err(to_py_err)
    }
}
