use super::solvers::traits::Problem;
use argmin::core::CostFunction;

/// Problem backed by an infallible closure
pub struct FnProblem<F> {
    num_params: usize,
    f: F,
}

impl<F> FnProblem<F>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    pub fn new(num_params: usize, f: F) -> Self {
        Self { num_params, f }
    }
}

impl<F> Problem for FnProblem<F>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    fn cost(&self, params: &[f64]) -> Result<f64, String> {
        Ok((self.f)(params))
    }

    fn num_params(&self) -> usize {
        self.num_params
    }
}

/// Problem backed by a closure that can fail, e.g. a network evaluation
/// that may diverge or a remote oracle
pub struct TryFnProblem<F> {
    num_params: usize,
    f: F,
}

impl<F> TryFnProblem<F>
where
    F: Fn(&[f64]) -> Result<f64, String> + Sync,
{
    pub fn new(num_params: usize, f: F) -> Self {
        Self { num_params, f }
    }
}

impl<F> Problem for TryFnProblem<F>
where
    F: Fn(&[f64]) -> Result<f64, String> + Sync,
{
    fn cost(&self, params: &[f64]) -> Result<f64, String> {
        (self.f)(params)
    }

    fn num_params(&self) -> usize {
        self.num_params
    }
}

/// Adapter for cost functions written against argmin.
///
/// argmin does not carry dimensionality on the cost function, so it is
/// supplied alongside.
pub struct ArgminCost<C> {
    num_params: usize,
    inner: C,
}

impl<C> ArgminCost<C>
where
    C: CostFunction<Param = Vec<f64>, Output = f64> + Sync,
{
    pub fn new(num_params: usize, inner: C) -> Self {
        Self { num_params, inner }
    }
}

impl<C> Problem for ArgminCost<C>
where
    C: CostFunction<Param = Vec<f64>, Output = f64> + Sync,
{
    fn cost(&self, params: &[f64]) -> Result<f64, String> {
        self.inner
            .cost(&params.to_vec())
            .map_err(|e| e.to_string())
    }

    fn num_params(&self) -> usize {
        self.num_params
    }
}
