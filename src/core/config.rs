use crate::error::{SwarmError, SwarmResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ===== SEARCH DOMAIN =====

/// Initial sampling domain for particle positions.
///
/// Bounds only shape initialization. Particles are free to leave the
/// domain once the swarm starts moving.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bounds {
    /// Same `[min, max]` for every dimension
    Uniform { min: f64, max: f64 },
    /// One `(min, max)` pair per dimension
    PerDimension(Vec<(f64, f64)>),
}

impl Bounds {
    /// Sampling range for dimension `dim`
    #[inline]
    pub fn range(&self, dim: usize) -> (f64, f64) {
        match self {
            Self::Uniform { min, max } => (*min, *max),
            Self::PerDimension(ranges) => ranges[dim],
        }
    }

    /// Number of dimensions the bounds are pinned to, if any
    pub fn dimensions(&self) -> Option<usize> {
        match self {
            Self::Uniform { .. } => None,
            Self::PerDimension(ranges) => Some(ranges.len()),
        }
    }

    /// Whether `position` lies inside the domain. A position whose length
    /// differs from pinned per-dimension bounds is never contained.
    pub fn contains(&self, position: &[f64]) -> bool {
        let inside = |x: f64, (min, max): (f64, f64)| x >= min && x <= max;
        match self {
            Self::Uniform { min, max } => position.iter().all(|&x| inside(x, (*min, *max))),
            Self::PerDimension(ranges) => {
                ranges.len() == position.len()
                    && position.iter().zip(ranges).all(|(&x, &range)| inside(x, range))
            }
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::Uniform {
            min: -10.0,
            max: 10.0,
        }
    }
}

// ===== COEFFICIENT SCHEDULE =====

/// Linear schedule for one PSO coefficient.
///
/// Either direction is allowed: `initial` may be above or below `final`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub initial: f64,
    #[serde(rename = "final")]
    pub final_value: f64,
}

impl Schedule {
    pub const fn new(initial: f64, final_value: f64) -> Self {
        Self {
            initial,
            final_value,
        }
    }

    /// Value at 0-based `iteration` of a run lasting `iter_max` iterations.
    ///
    /// `at(0) == initial`. The last iteration (`iter_max - 1`) stops one step
    /// short of `final`.
    #[inline]
    pub fn at(&self, iteration: u32, iter_max: u32) -> f64 {
        let remaining = (iter_max as f64 - iteration as f64) / iter_max as f64;
        self.final_value + (self.initial - self.final_value) * remaining
    }
}

/// The three coefficients in effect for one iteration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    pub inertia: f64,
    pub cognitive: f64,
    pub social: f64,
}

// ===== EVALUATION STRATEGY =====

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// One particle after another, in swarm order. Reproducible under a seed.
    #[default]
    Sequential,
    /// Particles of one iteration evaluated on a thread pool.
    /// `threads == 0` uses one thread per logical CPU.
    Parallel { threads: usize },
}

// ===== RUN CONFIGURATION =====

/// Tunable parameters for one optimization run.
///
/// Missing fields in a JSON document fall back to the defaults: 30 particles,
/// 100 iterations, domain `[-10, 10]`, inertia 0.9 → 0.4, cognitive 2.5 → 0.5,
/// social 0.5 → 2.5.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub num_particles: usize,
    pub iter_max: u32,
    pub bounds: Bounds,
    pub inertia: Schedule,
    pub cognitive: Schedule,
    pub social: Schedule,
    pub seed: Option<u64>,
    pub evaluation: EvaluationMode,
    pub verbose: bool,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            num_particles: 30,
            iter_max: 100,
            bounds: Bounds::default(),
            inertia: Schedule::new(0.9, 0.4),
            cognitive: Schedule::new(2.5, 0.5),
            social: Schedule::new(0.5, 2.5),
            seed: None,
            evaluation: EvaluationMode::Sequential,
            verbose: false,
        }
    }
}

impl SwarmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> SwarmResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> SwarmResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SwarmError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> SwarmResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Configure swarm size (default: 30)
    pub fn with_particles(mut self, num_particles: usize) -> Self {
        self.num_particles = num_particles;
        self
    }

    /// Configure iteration budget (default: 100)
    pub fn with_iterations(mut self, iter_max: u32) -> Self {
        self.iter_max = iter_max;
        self
    }

    /// Same sampling range on every dimension (default: [-10, 10])
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.bounds = Bounds::Uniform { min, max };
        self
    }

    pub fn with_dimension_bounds(mut self, ranges: Vec<(f64, f64)>) -> Self {
        self.bounds = Bounds::PerDimension(ranges);
        self
    }

    pub fn with_inertia(mut self, initial: f64, final_value: f64) -> Self {
        self.inertia = Schedule::new(initial, final_value);
        self
    }

    pub fn with_cognitive(mut self, initial: f64, final_value: f64) -> Self {
        self.cognitive = Schedule::new(initial, final_value);
        self
    }

    pub fn with_social(mut self, initial: f64, final_value: f64) -> Self {
        self.social = Schedule::new(initial, final_value);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_evaluation(mut self, evaluation: EvaluationMode) -> Self {
        self.evaluation = evaluation;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Coefficients for 0-based `iteration`
    pub fn coefficients(&self, iteration: u32) -> Coefficients {
        Coefficients {
            inertia: self.inertia.at(iteration, self.iter_max),
            cognitive: self.cognitive.at(iteration, self.iter_max),
            social: self.social.at(iteration, self.iter_max),
        }
    }

    /// Check everything that does not depend on the problem
    pub fn validate(&self) -> SwarmResult<()> {
        super::validation::validate_config(self)
    }
}

// Tests at the bottom:
