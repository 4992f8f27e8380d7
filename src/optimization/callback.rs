use super::solvers::traits::OptimizationCallback;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Iteration result for tracking optimization progress
#[derive(Debug, Clone, PartialEq)]
pub struct IterationResult {
    pub iteration: u32,
    pub params: Vec<f64>,
    pub cost: f64,
}

/// Shared stop flag. Clones observe the same flag, so a front end can keep
/// one and hand another to the callback driving the run.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    stopped: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Latches the first failure of an external stop check.
///
/// A check that fails counts as a stop request; the failure is kept for the
/// caller to surface once the run returns.
#[derive(Debug)]
pub struct StopCheck<E> {
    failure: Mutex<Option<E>>,
}

impl<E> Default for StopCheck<E> {
    fn default() -> Self {
        Self {
            failure: Mutex::new(None),
        }
    }
}

impl<E> StopCheck<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one check outcome into a stop decision
    pub fn poll(&self, outcome: Result<bool, E>) -> bool {
        match outcome {
            Ok(stop) => stop || self.failed(),
            Err(err) => {
                let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
                if failure.is_none() {
                    *failure = Some(err);
                }
                true
            }
        }
    }

    pub fn failed(&self) -> bool {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn take_failure(&mut self) -> Option<E> {
        self.failure
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Records every report; stops when its token is cancelled
#[derive(Debug, Default)]
pub struct HistoryCallback {
    history: Vec<IterationResult>,
    token: Option<CancellationToken>,
}

impl HistoryCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            history: Vec::new(),
            token: Some(token),
        }
    }

    /// Get iteration history
    pub fn history(&self) -> &[IterationResult] {
        &self.history
    }
}

impl OptimizationCallback for HistoryCallback {
    fn on_iteration(&mut self, iteration: u32, params: &[f64], cost: f64) -> Result<(), String> {
        self.history.push(IterationResult {
            iteration,
            params: params.to_vec(),
            cost,
        });
        Ok(())
    }

    fn should_stop(&self) -> bool {
        self.token.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// Callback for tracking and displaying optimization progress on stdout
pub struct ConsoleCallback {
    verbose: bool,
    max_iterations: u32,
    history: HistoryCallback,
}

impl ConsoleCallback {
    pub fn new(verbose: bool, max_iterations: u32) -> Self {
        Self {
            verbose,
            max_iterations,
            history: HistoryCallback::new(),
        }
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.history.token = Some(token);
        self
    }

    pub fn history(&self) -> &[IterationResult] {
        self.history.history()
    }

    /// Percent of the iteration budget spent after 0-based `iteration`
    pub fn progress(&self, iteration: u32) -> f64 {
        (iteration + 1) as f64 / self.max_iterations as f64 * 100.0
    }

    /// Line printed for one iteration
    pub fn format_iteration(&self, iteration: u32, cost: f64) -> String {
        format!(
            "Iteration {}: Cost Function Value = {} ({:.0}%)",
            iteration + 1,
            cost,
            self.progress(iteration)
        )
    }

    /// Print optimization summary
    pub fn print_summary(&self, success: bool, stop_reason: &str) {
        println!("\n{}", "=".repeat(80));
        println!("OPTIMIZATION SUMMARY");
        println!("{}", "=".repeat(80));

        println!(
            "\nStatus: {}",
            if success { "✓ COMPLETED" } else { "✗ STOPPED" }
        );
        println!("Stop Reason: {}", stop_reason);
        println!("Total Iterations: {}", self.history().len());

        if let Some(final_result) = self.history().last() {
            println!("\nFinal Cost: {:.6e}", final_result.cost);
            println!("\nBest Position:");
            for (i, value) in final_result.params.iter().enumerate() {
                println!("  x[{}] = {:.6e}", i, value);
            }
        }

        println!("\n{}\n", "=".repeat(80));
    }
}

impl OptimizationCallback for ConsoleCallback {
    fn on_iteration(&mut self, iteration: u32, params: &[f64], cost: f64) -> Result<(), String> {
        self.history.on_iteration(iteration, params, cost)?;

        if self.verbose {
            println!("{}", self.format_iteration(iteration, cost));
        }
        Ok(())
    }

    fn should_stop(&self) -> bool {
        self.history.should_stop()
    }
}
