use super::config::{Bounds, Schedule, SwarmConfig};
use crate::error::{SwarmError, SwarmResult};

fn validate_range(parameter: &str, min: f64, max: f64) -> SwarmResult<()> {
    if !min.is_finite() || !max.is_finite() {
        return Err(SwarmError::invalid(
            parameter,
            format!("bounds must be finite, got [{}, {}]", min, max),
        ));
    }
    if min >= max {
        return Err(SwarmError::invalid(
            parameter,
            format!("var_min must be below var_max, got [{}, {}]", min, max),
        ));
    }
    // Sampling needs the width itself to be representable
    if !(max - min).is_finite() {
        return Err(SwarmError::invalid(
            parameter,
            format!("bounds are too wide to sample, got [{}, {}]", min, max),
        ));
    }
    Ok(())
}

fn validate_schedule(parameter: &str, schedule: &Schedule) -> SwarmResult<()> {
    if !schedule.initial.is_finite() || !schedule.final_value.is_finite() {
        return Err(SwarmError::invalid(
            parameter,
            format!(
                "schedule endpoints must be finite, got {} -> {}",
                schedule.initial, schedule.final_value
            ),
        ));
    }
    Ok(())
}

/// Validate the problem-independent part of a configuration
///
/// Rejects an empty swarm, a zero iteration budget, empty or inverted
/// bounds, and non-finite coefficient endpoints.
pub fn validate_config(config: &SwarmConfig) -> SwarmResult<()> {
    if config.num_particles == 0 {
        return Err(SwarmError::invalid(
            "num_particles",
            "swarm needs at least one particle",
        ));
    }
    if config.iter_max == 0 {
        return Err(SwarmError::invalid(
            "iter_max",
            "iteration budget must be positive",
        ));
    }

    match &config.bounds {
        Bounds::Uniform { min, max } => validate_range("bounds", *min, *max)?,
        Bounds::PerDimension(ranges) => {
            if ranges.is_empty() {
                return Err(SwarmError::invalid(
                    "bounds",
                    "per-dimension bounds are empty",
                ));
            }
            for (d, &(min, max)) in ranges.iter().enumerate() {
                validate_range(&format!("bounds[{}]", d), min, max)?;
            }
        }
    }

    validate_schedule("inertia", &config.inertia)?;
    validate_schedule("cognitive", &config.cognitive)?;
    validate_schedule("social", &config.social)?;

    Ok(())
}

/// Validate a configuration against the dimensionality of a problem
pub fn validate_dimensions(config: &SwarmConfig, num_var: usize) -> SwarmResult<()> {
    if num_var == 0 {
        return Err(SwarmError::invalid(
            "num_var",
            "problem must have at least one variable",
        ));
    }
    if let Some(dims) = config.bounds.dimensions() {
        if dims != num_var {
            return Err(SwarmError::invalid(
                "bounds",
                format!("{} ranges given for {} variables", dims, num_var),
            ));
        }
    }
    Ok(())
}
