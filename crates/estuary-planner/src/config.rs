//! Planner configuration.

/// Environment variable forcing a fraction of read-only ad-hoc queries
/// through the large-query path, for test coverage.
pub const LARGE_MODE_RATIO_ENV: &str = "LARGE_MODE_RATIO";

/// Tunables for the planner facade.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Probability in `[0, 1]` that a non-large query is sampled into
    /// large mode. Zero disables sampling.
    pub large_mode_ratio: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            large_mode_ratio: 0.0,
        }
    }
}

impl PlannerConfig {
    /// Read the configuration from the environment.
    pub fn from_env() -> Self {
        let raw = std::env::var(LARGE_MODE_RATIO_ENV).ok();
        Self {
            large_mode_ratio: parse_ratio(raw.as_deref()),
        }
    }

    #[must_use]
    pub fn with_large_mode_ratio(mut self, ratio: f64) -> Self {
        self.large_mode_ratio = ratio.clamp(0.0, 1.0);
        self
    }
}

/// Parse a sampling ratio. Missing values, the `-1` "unset" marker used by
/// test launchers, and anything unparsable all mean "disabled".
fn parse_ratio(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else { return 0.0 };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-1" {
        return 0.0;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|ratio| ratio.is_finite())
        .map_or(0.0, |ratio| ratio.clamp(0.0, 1.0))
}
