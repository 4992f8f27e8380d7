use super::shared_best::SharedBest;
use super::traits::{
    NoopCallback, OptimizationCallback, Problem, RunStatus, Solver, SolverResult,
};
use crate::core::{validate_dimensions, Coefficients, EvaluationMode, SwarmConfig};
use crate::error::{SwarmError, SwarmResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPool;

/// One candidate solution with its velocity and personal best
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    /// Cost at `position`
    pub cost: f64,
    pub best_position: Vec<f64>,
    pub best_cost: f64,
}

impl Particle {
    /// Particle at rest at an already evaluated position
    pub fn new(position: Vec<f64>, cost: f64) -> Self {
        Self {
            velocity: vec![0.0; position.len()],
            best_position: position.clone(),
            position,
            cost,
            best_cost: cost,
        }
    }

    /// Velocity and position update. `r1` and `r2` hold one uniform
    /// `[0, 1)` draw per dimension.
    #[inline]
    fn accelerate(&mut self, guide: &[f64], c: &Coefficients, r1: &[f64], r2: &[f64]) {
        for d in 0..self.position.len() {
            let x = self.position[d];
            self.velocity[d] = c.inertia * self.velocity[d]
                + c.cognitive * r1[d] * (self.best_position[d] - x)
                + c.social * r2[d] * (guide[d] - x);
            self.position[d] = x + self.velocity[d];
        }
    }

    /// Record the cost of the current position. Returns `true` when it beats
    /// the personal best.
    #[inline]
    fn record(&mut self, cost: f64) -> bool {
        self.cost = cost;
        if cost < self.best_cost {
            self.best_cost = cost;
            self.best_position.clone_from(&self.position);
            true
        } else {
            false
        }
    }
}

/// Best solution seen by any particle
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalBest {
    pub position: Vec<f64>,
    pub cost: f64,
}

impl Default for GlobalBest {
    fn default() -> Self {
        Self {
            position: Vec::new(),
            cost: f64::INFINITY,
        }
    }
}

impl GlobalBest {
    /// Adopt `position` if `cost` is strictly lower
    #[inline]
    pub fn offer(&mut self, position: &[f64], cost: f64) -> bool {
        if cost < self.cost {
            self.cost = cost;
            self.position.clear();
            self.position.extend_from_slice(position);
            true
        } else {
            false
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Uninitialized,
    Running,
    Completed,
    Cancelled,
}

/// Particle Swarm Optimization with linearly annealed coefficients.
///
/// Particles are updated one after another and each one steers toward the
/// global best as it stands at that moment, including improvements made
/// earlier in the same iteration. Positions are never clamped after
/// initialization.
pub struct ParticleOptimizer {
    config: SwarmConfig,
    rng: StdRng,
    pool: Option<ThreadPool>,
    particles: Vec<Particle>,
    global_best: GlobalBest,
    state: RunState,
    cost_evals: usize,
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Evaluate and reject NaN. `iteration` is `None` during initialization.
fn evaluate(
    problem: &dyn Problem,
    position: &[f64],
    iteration: Option<u32>,
    particle: usize,
) -> SwarmResult<f64> {
    let cost = problem
        .cost(position)
        .map_err(|message| SwarmError::CostFunction { iteration, message })?;

    if cost.is_nan() {
        return Err(SwarmError::NonNumericCost {
            iteration,
            particle,
            position: position.to_vec(),
        });
    }
    Ok(cost)
}

impl ParticleOptimizer {
    /// Build an optimizer, rejecting invalid configurations up front
    pub fn new(config: SwarmConfig) -> SwarmResult<Self> {
        config.validate()?;

        let pool = match config.evaluation {
            EvaluationMode::Sequential => None,
            EvaluationMode::Parallel { threads } => {
                let threads = if threads == 0 { num_cpus::get() } else { threads };
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| SwarmError::invalid("evaluation", e.to_string()))?;
                Some(pool)
            }
        };

        Ok(Self {
            rng: seeded_rng(config.seed),
            pool,
            particles: Vec::new(),
            global_best: GlobalBest::default(),
            state: RunState::Uninitialized,
            cost_evals: 0,
            config,
        })
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn global_best(&self) -> &GlobalBest {
        &self.global_best
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn cost_evals(&self) -> usize {
        self.cost_evals
    }

    /// Run to completion without progress reporting
    pub fn optimize(&mut self, problem: &dyn Problem) -> SwarmResult<SolverResult> {
        self.solve(problem, &mut NoopCallback)
    }

    /// Sample the swarm uniformly within the bounds and evaluate it once.
    ///
    /// Calling this again starts a fresh run; the random source is reseeded
    /// from the configured seed.
    pub fn initialize(&mut self, problem: &dyn Problem) -> SwarmResult<()> {
        let n = problem.num_params();
        validate_dimensions(&self.config, n)?;

        self.rng = seeded_rng(self.config.seed);
        self.particles.clear();
        self.global_best = GlobalBest::default();
        self.cost_evals = 0;
        self.state = RunState::Uninitialized;

        let positions: Vec<Vec<f64>> = (0..self.config.num_particles)
            .map(|_| {
                (0..n)
                    .map(|d| {
                        let (min, max) = self.config.bounds.range(d);
                        self.rng.gen_range(min..max)
                    })
                    .collect()
            })
            .collect();

        let costs: Vec<f64> = match &self.pool {
            None => positions
                .iter()
                .enumerate()
                .map(|(i, p)| evaluate(problem, p, None, i))
                .collect::<SwarmResult<_>>()?,
            Some(pool) => pool.install(|| {
                positions
                    .par_iter()
                    .enumerate()
                    .map(|(i, p)| evaluate(problem, p, None, i))
                    .collect::<SwarmResult<_>>()
            })?,
        };
        self.cost_evals += costs.len();

        for (position, cost) in positions.into_iter().zip(costs) {
            let particle = Particle::new(position, cost);
            self.global_best
                .offer(&particle.best_position, particle.best_cost);
            self.particles.push(particle);
        }

        // Every initial cost was +inf; point at some particle rather than nowhere
        if self.global_best.position.is_empty() {
            self.global_best.position = self.particles[0].best_position.clone();
        }

        self.state = RunState::Running;

        if self.config.verbose {
            println!(
                "✓ Swarm initialized: {} particles, {} variables, best cost {:.6e}",
                self.particles.len(),
                n,
                self.global_best.cost
            );
        }

        Ok(())
    }

    /// Perform iteration `iteration` (0-based) on an initialized swarm
    pub fn step(&mut self, problem: &dyn Problem, iteration: u32) -> SwarmResult<()> {
        if self.state != RunState::Running {
            return Err(SwarmError::NotInitialized);
        }

        let coefficients = self.config.coefficients(iteration);
        match self.pool {
            None => self.step_sequential(problem, iteration, &coefficients),
            Some(_) => self.step_parallel(problem, iteration, &coefficients),
        }
    }

    fn step_sequential(
        &mut self,
        problem: &dyn Problem,
        iteration: u32,
        coefficients: &Coefficients,
    ) -> SwarmResult<()> {
        let n = self.global_best.position.len();
        let mut r1 = vec![0.0; n];
        let mut r2 = vec![0.0; n];

        for (i, particle) in self.particles.iter_mut().enumerate() {
            r1.iter_mut().for_each(|r| *r = self.rng.gen());
            r2.iter_mut().for_each(|r| *r = self.rng.gen());

            particle.accelerate(&self.global_best.position, coefficients, &r1, &r2);

            let cost = evaluate(problem, &particle.position, Some(iteration), i)?;
            self.cost_evals += 1;

            if particle.record(cost) {
                self.global_best
                    .offer(&particle.best_position, particle.best_cost);
            }
        }

        Ok(())
    }

    fn step_parallel(
        &mut self,
        problem: &dyn Problem,
        iteration: u32,
        coefficients: &Coefficients,
    ) -> SwarmResult<()> {
        let n = self.global_best.position.len();

        // Draw in swarm order so the random stream does not depend on scheduling
        let draws: Vec<(Vec<f64>, Vec<f64>)> = (0..self.particles.len())
            .map(|_| {
                let r1: Vec<f64> = (0..n).map(|_| self.rng.gen()).collect();
                let r2: Vec<f64> = (0..n).map(|_| self.rng.gen()).collect();
                (r1, r2)
            })
            .collect();

        let shared = SharedBest::new(std::mem::take(&mut self.global_best));
        let particles = &mut self.particles;

        let outcome = match &self.pool {
            Some(pool) => pool.install(|| {
                particles
                    .par_iter_mut()
                    .zip(draws.par_iter())
                    .enumerate()
                    .try_for_each(|(i, (particle, (r1, r2)))| -> SwarmResult<()> {
                        let guide = shared.position();
                        particle.accelerate(&guide, coefficients, r1, r2);

                        let cost = evaluate(problem, &particle.position, Some(iteration), i)?;
                        if particle.record(cost) {
                            shared.offer(&particle.best_position, particle.best_cost);
                        }
                        Ok(())
                    })
            }),
            None => Ok(()),
        };

        self.global_best = shared.into_inner();
        outcome?;
        self.cost_evals += self.particles.len();
        Ok(())
    }

    fn result(&self, status: RunStatus, iterations: u32, message: &str) -> SolverResult {
        SolverResult {
            status,
            cost: self.global_best.cost,
            iterations,
            message: message.into(),
            params: self.global_best.position.clone(),
            cost_evals: self.cost_evals,
        }
    }
}

impl Solver for ParticleOptimizer {
    fn name(&self) -> &str {
        "PSO"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> SwarmResult<SolverResult> {
        self.initialize(problem)?;

        for iteration in 0..self.config.iter_max {
            if callback.should_stop() {
                self.state = RunState::Cancelled;
                if self.config.verbose {
                    println!(
                        "✗ Stopped before iteration {} (best cost {:.6e})",
                        iteration + 1,
                        self.global_best.cost
                    );
                }
                return Ok(self.result(RunStatus::Cancelled, iteration, "Stopped by callback"));
            }

            self.step(problem, iteration)?;

            callback
                .on_iteration(iteration, &self.global_best.position, self.global_best.cost)
                .map_err(|message| SwarmError::Callback { iteration, message })?;
        }

        self.state = RunState::Completed;
        if self.config.verbose {
            println!(
                "✓ Completed {} iterations: best cost {:.6e}, {} cost evaluations",
                self.config.iter_max, self.global_best.cost, self.cost_evals
            );
        }

        Ok(self.result(
            RunStatus::Completed,
            self.config.iter_max,
            "Max iterations reached",
        ))
    }
}

// Tests at the bottom:

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::callback::HistoryCallback;
    use crate::optimization::problem::{FnProblem, TryFnProblem};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sphere(x: &[f64]) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    fn assert_swarm_invariants(pso: &ParticleOptimizer) {
        let best = pso.global_best();
        for p in pso.particles() {
            assert!(p.best_cost <= p.cost, "{} > {}", p.best_cost, p.cost);
            assert!(best.cost <= p.best_cost, "{} > {}", best.cost, p.best_cost);
        }
    }

    #[test]
    fn particle_starts_at_rest() {
        let p = Particle::new(vec![1.0, -2.0], 5.0);
        assert_eq!(p.velocity, vec![0.0, 0.0]);
        assert_eq!(p.best_position, p.position);
        assert_eq!(p.best_cost, 5.0);
    }

    #[test]
    fn particle_update_follows_pso_equation() {
        let mut p = Particle::new(vec![1.0, 2.0], 5.0);
        p.velocity = vec![0.5, -0.5];
        p.best_position = vec![0.0, 0.0];
        let c = Coefficients {
            inertia: 0.5,
            cognitive: 2.0,
            social: 1.0,
        };
        p.accelerate(&[3.0, 3.0], &c, &[0.5, 0.25], &[0.1, 1.0]);
        // v0 = 0.25 + 2*0.5*(0-1) + 1*0.1*(3-1) = -0.55
        // v1 = -0.25 + 2*0.25*(0-2) + 1*1.0*(3-2) = -0.25
        assert!((p.velocity[0] + 0.55).abs() < 1e-12);
        assert!((p.velocity[1] + 0.25).abs() < 1e-12);
        assert!((p.position[0] - 0.45).abs() < 1e-12);
        assert!((p.position[1] - 1.75).abs() < 1e-12);
    }

    #[test]
    fn personal_best_only_moves_on_strict_improvement() {
        let mut p = Particle::new(vec![1.0], 2.0);
        p.position = vec![3.0];
        assert!(!p.record(2.0));
        assert_eq!(p.best_position, vec![1.0]);
        assert_eq!(p.cost, 2.0);

        p.position = vec![4.0];
        assert!(p.record(1.0));
        assert_eq!(p.best_position, vec![4.0]);
        assert_eq!(p.best_cost, 1.0);
    }

    #[test]
    fn rejects_invalid_config_at_construction() {
        assert!(ParticleOptimizer::new(SwarmConfig::new().with_particles(0)).is_err());
        assert!(ParticleOptimizer::new(SwarmConfig::new().with_iterations(0)).is_err());
        assert!(ParticleOptimizer::new(SwarmConfig::new().with_bounds(3.0, 3.0)).is_err());
    }

    #[test]
    fn rejects_zero_variables_before_evaluating() {
        let calls = AtomicUsize::new(0);
        let problem = FnProblem::new(0, |_x: &[f64]| {
            calls.fetch_add(1, Ordering::SeqCst);
            0.0
        });
        let mut pso = ParticleOptimizer::new(SwarmConfig::new()).unwrap();
        let err = pso.optimize(&problem).unwrap_err();
        assert!(matches!(err, SwarmError::InvalidConfig { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn initialization_evaluates_each_particle_once_within_bounds() {
        let calls = AtomicUsize::new(0);
        let problem = FnProblem::new(3, |x: &[f64]| {
            calls.fetch_add(1, Ordering::SeqCst);
            sphere(x)
        });
        let config = SwarmConfig::new()
            .with_particles(25)
            .with_dimension_bounds(vec![(-1.0, 1.0), (2.0, 3.0), (-100.0, -50.0)])
            .with_seed(7);
        let mut pso = ParticleOptimizer::new(config.clone()).unwrap();
        pso.initialize(&problem).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 25);
        assert_eq!(pso.cost_evals(), 25);
        assert_eq!(pso.state(), RunState::Running);
        for p in pso.particles() {
            assert!(config.bounds.contains(&p.position));
            assert!(p.velocity.iter().all(|&v| v == 0.0));
            assert_eq!(p.cost, sphere(&p.position));
            assert_eq!(p.best_position, p.position);
        }
    }

    #[test]
    fn initial_global_best_is_the_best_particle() {
        let problem = FnProblem::new(2, sphere);
        let mut pso =
            ParticleOptimizer::new(SwarmConfig::new().with_particles(40).with_seed(3)).unwrap();
        pso.initialize(&problem).unwrap();

        let best = pso
            .particles()
            .iter()
            .min_by(|a, b| a.best_cost.total_cmp(&b.best_cost))
            .unwrap();
        assert_eq!(pso.global_best().cost, best.best_cost);
        assert_eq!(pso.global_best().position, best.best_position);
    }

    #[test]
    fn all_infinite_costs_still_yield_a_position() {
        let problem = FnProblem::new(2, |_x: &[f64]| f64::INFINITY);
        let config = SwarmConfig::new().with_particles(5).with_iterations(3);
        let result = ParticleOptimizer::new(config).unwrap().optimize(&problem).unwrap();
        assert_eq!(result.params.len(), 2);
        assert_eq!(result.cost, f64::INFINITY);
    }

    #[test]
    fn step_requires_initialization() {
        let problem = FnProblem::new(2, sphere);
        let mut pso = ParticleOptimizer::new(SwarmConfig::new()).unwrap();
        assert_eq!(pso.step(&problem, 0), Err(SwarmError::NotInitialized));
    }

    #[test]
    fn invariants_hold_after_every_step() {
        let problem = FnProblem::new(4, |x: &[f64]| {
            x.iter().map(|v| v * v - 10.0 * (2.0 * std::f64::consts::PI * v).cos() + 10.0).sum()
        });
        let config = SwarmConfig::new()
            .with_particles(15)
            .with_iterations(40)
            .with_seed(11);
        let mut pso = ParticleOptimizer::new(config).unwrap();
        pso.initialize(&problem).unwrap();
        assert_swarm_invariants(&pso);

        let mut previous = pso.global_best().cost;
        for t in 0..40 {
            pso.step(&problem, t).unwrap();
            assert_swarm_invariants(&pso);
            assert!(pso.global_best().cost <= previous);
            previous = pso.global_best().cost;
        }
        assert_eq!(pso.cost_evals(), 15 + 15 * 40);
    }

    #[test]
    fn converges_on_sphere() {
        let problem = FnProblem::new(2, sphere);
        let config = SwarmConfig::new()
            .with_particles(20)
            .with_iterations(50)
            .with_seed(2024);
        let mut pso = ParticleOptimizer::new(config).unwrap();
        let result = pso.optimize(&problem).unwrap();

        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(pso.state(), RunState::Completed);
        assert_eq!(result.iterations, 50);
        assert_eq!(result.cost_evals, 20 + 20 * 50);
        assert!(result.cost < 1e-3, "cost = {}", result.cost);
        assert_eq!(result.cost, sphere(&result.params));
    }

    #[test]
    fn global_best_is_non_increasing_across_reports() {
        let problem = FnProblem::new(5, sphere);
        let config = SwarmConfig::new().with_iterations(60).with_seed(5);
        let mut history = HistoryCallback::new();
        ParticleOptimizer::new(config)
            .unwrap()
            .solve(&problem, &mut history)
            .unwrap();

        let costs: Vec<f64> = history.history().iter().map(|r| r.cost).collect();
        assert_eq!(costs.len(), 60);
        assert!(costs.windows(2).all(|w| w[1] <= w[0]));
        assert!(history.history().iter().enumerate().all(|(i, r)| r.iteration == i as u32));
    }

    #[test]
    fn later_particles_follow_a_best_found_earlier_in_the_iteration() {
        let problem = FnProblem::new(1, |x: &[f64]| (x[0] - 5.0).powi(2));
        let config = SwarmConfig::new().with_particles(2).with_seed(42);
        let mut pso = ParticleOptimizer::new(config).unwrap();
        pso.initialize(&problem).unwrap();

        // Particle 0 drifts toward the minimum; particle 1 sits still at its own best
        pso.particles = vec![Particle::new(vec![0.0], 25.0), Particle::new(vec![10.0], 25.0)];
        pso.particles[0].velocity = vec![4.0];
        pso.global_best = GlobalBest {
            position: vec![0.0],
            cost: 25.0,
        };

        let mut replay = pso.rng.clone();
        let _: (f64, f64) = (replay.gen(), replay.gen());
        let (r1, r2): (f64, f64) = (replay.gen(), replay.gen());
        let c = pso.config().coefficients(0);

        pso.step(&problem, 0).unwrap();

        let leader = pso.particles()[0].position[0];
        assert!(pso.particles()[0].best_cost < 25.0);
        assert_eq!(pso.global_best().position, vec![leader]);

        let expected =
            10.0 + (c.inertia * 0.0 + c.cognitive * r1 * 0.0 + c.social * r2 * (leader - 10.0));
        let stale = 10.0 + c.social * r2 * (0.0 - 10.0);
        let moved = pso.particles()[1].position[0];
        assert!((moved - expected).abs() < 1e-12, "{} != {}", moved, expected);
        assert!((moved - stale).abs() > 1e-6);
    }

    #[test]
    fn particles_may_leave_the_initial_domain() {
        // Minimum outside the sampling box
        let problem = FnProblem::new(1, |x: &[f64]| (x[0] - 3.0).powi(2));
        let config = SwarmConfig::new()
            .with_bounds(-1.0, 1.0)
            .with_iterations(200)
            .with_seed(9);
        let result = ParticleOptimizer::new(config).unwrap().optimize(&problem).unwrap();
        assert!(result.params[0] > 1.0, "best x = {}", result.params[0]);
    }

    struct StopAfter {
        remaining: u32,
        reports: u32,
    }

    impl OptimizationCallback for StopAfter {
        fn on_iteration(&mut self, _iteration: u32, _params: &[f64], _cost: f64) -> Result<(), String> {
            self.reports += 1;
            self.remaining = self.remaining.saturating_sub(1);
            Ok(())
        }

        fn should_stop(&self) -> bool {
            self.remaining == 0
        }
    }

    #[test]
    fn cancellation_before_first_iteration_returns_initial_best() {
        let calls = AtomicUsize::new(0);
        let problem = FnProblem::new(3, |x: &[f64]| {
            calls.fetch_add(1, Ordering::SeqCst);
            sphere(x)
        });
        let config = SwarmConfig::new().with_particles(10).with_seed(1);

        let mut reference = ParticleOptimizer::new(config.clone()).unwrap();
        reference.initialize(&problem).unwrap();
        let initial = reference.global_best().clone();
        calls.store(0, Ordering::SeqCst);

        let mut pso = ParticleOptimizer::new(config).unwrap();
        let mut stop = StopAfter {
            remaining: 0,
            reports: 0,
        };
        let result = pso.solve(&problem, &mut stop).unwrap();

        assert!(result.is_cancelled());
        assert_eq!(pso.state(), RunState::Cancelled);
        assert_eq!(result.iterations, 0);
        assert_eq!(stop.reports, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert_eq!(result.params, initial.position);
        assert_eq!(result.cost, initial.cost);
    }

    #[test]
    fn cancellation_mid_run_keeps_best_so_far() {
        let problem = FnProblem::new(2, sphere);
        let mut pso = ParticleOptimizer::new(SwarmConfig::new().with_seed(8)).unwrap();
        let mut stop = StopAfter {
            remaining: 7,
            reports: 0,
        };
        let result = pso.solve(&problem, &mut stop).unwrap();

        assert_eq!(result.status, RunStatus::Cancelled);
        assert_eq!(result.iterations, 7);
        assert_eq!(stop.reports, 7);
        assert_eq!(result.cost_evals, 30 + 30 * 7);
        assert_eq!(result.cost, pso.global_best().cost);
    }

    #[test]
    fn same_seed_gives_identical_trajectories() {
        let problem = FnProblem::new(3, sphere);
        let config = SwarmConfig::new().with_iterations(30).with_seed(123);

        let run = |config: SwarmConfig| {
            let mut history = HistoryCallback::new();
            ParticleOptimizer::new(config)
                .unwrap()
                .solve(&problem, &mut history)
                .unwrap();
            history
                .history()
                .iter()
                .map(|r| r.params.iter().map(|v| v.to_bits()).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        };

        let first = run(config.clone());
        let second = run(config.clone());
        assert_eq!(first, second);

        let other = run(config.with_seed(124));
        assert_ne!(first, other);
    }

    #[test]
    fn rerunning_an_optimizer_restarts_from_the_seed() {
        let problem = FnProblem::new(2, sphere);
        let mut pso =
            ParticleOptimizer::new(SwarmConfig::new().with_iterations(10).with_seed(77)).unwrap();
        let a = pso.optimize(&problem).unwrap();
        let b = pso.optimize(&problem).unwrap();
        assert_eq!(a.params, b.params);
        assert_eq!(a.cost_evals, b.cost_evals);
    }

    #[test]
    fn nan_cost_is_reported_not_swallowed() {
        let calls = AtomicUsize::new(0);
        let problem = FnProblem::new(2, |x: &[f64]| {
            // Fine during initialization, NaN on the first move
            if calls.fetch_add(1, Ordering::SeqCst) >= 10 {
                f64::NAN
            } else {
                sphere(x)
            }
        });
        let config = SwarmConfig::new().with_particles(10).with_seed(4);
        let err = ParticleOptimizer::new(config).unwrap().optimize(&problem).unwrap_err();
        match err {
            SwarmError::NonNumericCost {
                iteration,
                particle,
                position,
            } => {
                assert_eq!(iteration, Some(0));
                assert_eq!(particle, 0);
                assert_eq!(position.len(), 2);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn nan_during_initialization_is_reported() {
        let problem = FnProblem::new(2, |_x: &[f64]| f64::NAN);
        let err = ParticleOptimizer::new(SwarmConfig::new())
            .unwrap()
            .optimize(&problem)
            .unwrap_err();
        assert!(matches!(
            err,
            SwarmError::NonNumericCost { iteration: None, particle: 0, .. }
        ));
    }

    #[test]
    fn cost_function_failure_propagates() {
        let problem = TryFnProblem::new(2, |x: &[f64]| {
            if x[0] > 0.0 {
                Err("network diverged".to_string())
            } else {
                Ok(sphere(x))
            }
        });
        let err = ParticleOptimizer::new(SwarmConfig::new().with_seed(6))
            .unwrap()
            .optimize(&problem)
            .unwrap_err();
        match err {
            SwarmError::CostFunction { message, .. } => assert_eq!(message, "network diverged"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    struct FailingCallback;

    impl OptimizationCallback for FailingCallback {
        fn on_iteration(&mut self, _iteration: u32, _params: &[f64], _cost: f64) -> Result<(), String> {
            Err("display closed".into())
        }
    }

    #[test]
    fn callback_failure_propagates() {
        let problem = FnProblem::new(2, sphere);
        let err = ParticleOptimizer::new(SwarmConfig::new())
            .unwrap()
            .solve(&problem, &mut FailingCallback)
            .unwrap_err();
        assert_eq!(
            err,
            SwarmError::Callback {
                iteration: 0,
                message: "display closed".into()
            }
        );
    }

    #[test]
    fn increasing_inertia_schedule_is_accepted() {
        let problem = FnProblem::new(2, sphere);
        let config = SwarmConfig::new()
            .with_inertia(0.2, 0.8)
            .with_cognitive(0.5, 2.0)
            .with_social(2.0, 0.5)
            .with_iterations(20)
            .with_seed(10);
        let result = ParticleOptimizer::new(config).unwrap().optimize(&problem).unwrap();
        assert_eq!(result.status, RunStatus::Completed);
        assert!(result.cost.is_finite());
    }

    #[test]
    fn parallel_mode_converges_and_keeps_invariants() {
        let calls = AtomicUsize::new(0);
        let problem = FnProblem::new(2, |x: &[f64]| {
            calls.fetch_add(1, Ordering::SeqCst);
            sphere(x)
        });
        let config = SwarmConfig::new()
            .with_particles(20)
            .with_iterations(60)
            .with_seed(31)
            .with_evaluation(EvaluationMode::Parallel { threads: 4 });
        let mut pso = ParticleOptimizer::new(config).unwrap();

        pso.initialize(&problem).unwrap();
        let mut previous = pso.global_best().cost;
        for t in 0..60 {
            pso.step(&problem, t).unwrap();
            assert_swarm_invariants(&pso);
            assert!(pso.global_best().cost <= previous);
            previous = pso.global_best().cost;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 20 + 20 * 60);
        assert_eq!(pso.cost_evals(), 20 + 20 * 60);
        assert!(pso.global_best().cost < 1e-2, "cost = {}", pso.global_best().cost);
    }

    #[test]
    fn parallel_initialization_matches_sequential() {
        let problem = FnProblem::new(3, sphere);
        let base = SwarmConfig::new().with_particles(12).with_seed(99);

        let mut sequential = ParticleOptimizer::new(base.clone()).unwrap();
        sequential.initialize(&problem).unwrap();

        let mut parallel = ParticleOptimizer::new(
            base.with_evaluation(EvaluationMode::Parallel { threads: 0 }),
        )
        .unwrap();
        parallel.initialize(&problem).unwrap();

        assert_eq!(sequential.particles(), parallel.particles());
        assert_eq!(sequential.global_best(), parallel.global_best());
    }

    #[test]
    fn parallel_mode_propagates_cost_failures() {
        let problem = TryFnProblem::new(2, |_x: &[f64]| Err("oracle offline".to_string()));
        let config = SwarmConfig::new().with_evaluation(EvaluationMode::Parallel { threads: 2 });
        let err = ParticleOptimizer::new(config).unwrap().optimize(&problem).unwrap_err();
        assert!(matches!(err, SwarmError::CostFunction { iteration: None, .. }));
    }
}
