use crate::optimization::{ConsoleCallback, OptimizationCallback, Problem, StopCheck};
use pyo3::prelude::*;

/// Cost function implemented by a Python callable taking a list of floats
pub struct PyProblem {
    num_params: usize,
    function: PyObject,
}

impl PyProblem {
    pub fn new(num_params: usize, function: PyObject) -> Self {
        Self {
            num_params,
            function,
        }
    }
}

impl Problem for PyProblem {
    fn cost(&self, params: &[f64]) -> Result<f64, String> {
        Python::with_gil(|py| {
            let value = self
                .function
                .bind(py)
                .call1((params.to_vec(),))
                .map_err(|e| e.to_string())?;
            value
                .extract::<f64>()
                .map_err(|e| format!("cost function must return a float: {}", e))
        })
    }

    fn num_params(&self) -> usize {
        self.num_params
    }
}

/// Forwards progress to optional Python callables.
///
/// `progress(iteration, cost, position)` is called after every iteration and
/// `stopped()` is polled before each one. Ctrl+C also stops the run. If
/// `stopped()` raises, the run stops and the exception is kept for
/// [`PyCallback::take_stop_error`].
pub struct PyCallback {
    progress: Option<PyObject>,
    stopped: Option<PyObject>,
    console: ConsoleCallback,
    interrupted: bool,
    stop_check: StopCheck<PyErr>,
}

impl PyCallback {
    pub fn new(
        progress: Option<PyObject>,
        stopped: Option<PyObject>,
        verbose: bool,
        max_iterations: u32,
    ) -> Self {
        Self {
            progress,
            stopped,
            console: ConsoleCallback::new(verbose, max_iterations),
            interrupted: false,
            stop_check: StopCheck::new(),
        }
    }

    pub fn console(&self) -> &ConsoleCallback {
        &self.console
    }

    /// Exception raised by `stopped()`, if any
    pub fn take_stop_error(&mut self) -> Option<PyErr> {
        self.stop_check.take_failure()
    }
}

impl OptimizationCallback for PyCallback {
    fn on_iteration(&mut self, iteration: u32, params: &[f64], cost: f64) -> Result<(), String> {
        self.console.on_iteration(iteration, params, cost)?;

        Python::with_gil(|py| {
            if py.check_signals().is_err() {
                self.interrupted = true;
            }
            if let Some(progress) = &self.progress {
                progress
                    .bind(py)
                    .call1((iteration, cost, params.to_vec()))
                    .map_err(|e| e.to_string())?;
            }
            Ok(())
        })
    }

    fn should_stop(&self) -> bool {
        if self.interrupted {
            return true;
        }
        match &self.stopped {
            Some(stopped) => Python::with_gil(|py| {
                let outcome = stopped.bind(py).call0().and_then(|flag| flag.is_truthy());
                if let Err(e) = &outcome {
                    eprintln!("Warning: stop check failed, stopping: {}", e);
                }
                self.stop_check.poll(outcome)
            }),
            None => false,
        }
    }
}
