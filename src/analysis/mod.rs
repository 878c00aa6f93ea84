//! Solver options

use serde::{Deserialize, Serialize};

/// Constitutive law used for a stringer's axial response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StringerLaw {
    /// Tension stiffening with 0.6·σsr, compression peak at ec1
    #[default]
    Default,
    /// Hyperbolic tension stiffening, compression peak at -2·fcm/Eci
    Classic,
}

/// Options for the membrane fixed-point iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Maximum iterations before the membrane is stopped
    pub max_iterations: usize,
    /// Convergence tolerance on the largest stiffness entry change
    pub tolerance: f64,
    /// Trace every iteration through the `log` facade
    pub log: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-4,
            log: false,
        }
    }
}

impl SolverOptions {
    /// Enable per-iteration logging
    pub fn with_logging(mut self) -> Self {
        self.log = true;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set convergence tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SolverOptions::default();
        assert_eq!(options.max_iterations, 1000);
        assert_eq!(options.tolerance, 1e-4);
        assert!(!options.log);
    }

    #[test]
    fn test_builder() {
        let options = SolverOptions::default().with_max_iter(5).with_tolerance(1e-2);
        assert_eq!(options.max_iterations, 5);
        assert_eq!(options.tolerance, 1e-2);
        assert!(!options.log);
        assert!(options.with_logging().log);
    }
}
