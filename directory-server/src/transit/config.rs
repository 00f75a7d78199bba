//! Transit matching configuration.

/// Configuration parameters for transit route matching.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitConfig {
    /// Walking radius used when a request doesn't give one (miles).
    pub default_max_walk_miles: f64,

    /// Upper bound on any requested walking radius (miles).
    /// Larger requests are clamped to this.
    pub max_walk_miles_cap: f64,

    /// Maximum number of options returned over HTTP.
    pub max_results: usize,
}

impl TransitConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(default_max_walk_miles: f64, max_walk_miles_cap: f64, max_results: usize) -> Self {
        Self {
            default_max_walk_miles,
            max_walk_miles_cap,
            max_results,
        }
    }

    /// Set the default walking radius.
    pub fn with_default_max_walk(mut self, miles: f64) -> Self {
        self.default_max_walk_miles = miles;
        self
    }

    /// Effective walking radius for a request.
    ///
    /// Missing values use the default; values above the cap are clamped.
    /// Zero, negative and NaN pass through and yield no candidate stops.
    pub fn walk_radius(&self, requested: Option<f64>) -> f64 {
        let miles = requested.unwrap_or(self.default_max_walk_miles);
        if miles > self.max_walk_miles_cap {
            self.max_walk_miles_cap
        } else {
            miles
        }
    }
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            default_max_walk_miles: 0.5,
            max_walk_miles_cap: 5.0,
            max_results: 50,
        }
    }
}
