//! Membrane state - MCFT stress/strain state of one panel

use serde::{Deserialize, Serialize};

use super::material::{Concrete, Steel};
use crate::error::{FEAError, FEAResult};
use crate::math::{principal_direction, strain_transformation, Mat3, Vec3};

/// Load step at which a limit state first occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LimitState {
    #[default]
    Unset,
    SetAtStep(usize),
}

impl LimitState {
    /// Record the load step if nothing was recorded yet.
    ///
    /// Returns true when this call set the marker.
    pub fn record(&mut self, load_step: usize) -> bool {
        match self {
            LimitState::Unset => {
                *self = LimitState::SetAtStep(load_step);
                true
            }
            LimitState::SetAtStep(_) => false,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, LimitState::SetAtStep(_))
    }

    /// Load step as stored by drawing layers: 0 when not reached
    pub fn step(&self) -> usize {
        match self {
            LimitState::Unset => 0,
            LimitState::SetAtStep(step) => *step,
        }
    }
}

/// Limit-state markers of a membrane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitStates {
    pub crack: LimitState,
    pub yield_x: LimitState,
    pub yield_y: LimitState,
    pub peak: LimitState,
}

/// Which reinforcement direction governs the stress at a crack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dominance {
    X,
    Y,
}

/// Crack-check outcome of the latest iteration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CrackState {
    /// Average tensile softening limit
    pub f1a: f64,
    /// Biaxial yield limit
    pub f1b: f64,
    /// X reinforcement limit with interface shear
    pub f1c: f64,
    /// Y reinforcement limit with interface shear
    pub f1d: f64,
    /// Governing tensile stress, the smallest candidate
    pub f1: f64,
    /// Average crack spacing along θ in mm
    pub spacing: f64,
    /// Crack width in mm
    pub width: f64,
    /// Maximum interface shear
    pub vci_max: f64,
    /// Interface shear carried at the crack
    pub vci: f64,
    pub dominance: Dominance,
    /// Reinforcement stress at the crack, x direction
    pub fsx_crack: f64,
    /// Reinforcement stress at the crack, y direction
    pub fsy_crack: f64,
}

/// MCFT membrane of a reinforced concrete panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membrane {
    pub concrete: Concrete,
    pub steel: Steel,
    /// Reinforcement ratio in x
    pub rho_x: f64,
    /// Reinforcement ratio in y
    pub rho_y: f64,
    /// Average crack spacing of x reinforcement in mm
    pub sm_x: f64,
    /// Average crack spacing of y reinforcement in mm
    pub sm_y: f64,

    /// Applied stress [σx, σy, τxy]
    pub stress: Vec3,
    /// Average strain [εx, εy, γxy]
    pub strain: Vec3,
    /// Principal tensile strain
    pub e1: f64,
    /// Principal compressive strain
    pub e2: f64,
    /// Principal strain angle in [0, π/2)
    pub theta: f64,
    /// Slope of x reinforcement relative to the principal axes
    pub theta_x: f64,
    /// Slope of y reinforcement relative to the principal axes
    pub theta_y: f64,
    /// Principal tensile concrete stress
    pub fc1: f64,
    /// Principal compressive concrete stress
    pub fc2: f64,
    /// Average reinforcement stress in x
    pub fsx: f64,
    /// Average reinforcement stress in y
    pub fsy: f64,
    /// Latest crack check, None while uncracked
    pub crack: Option<CrackState>,

    pub concrete_stiffness: Mat3,
    pub steel_stiffness: Mat3,
    /// Combined secant stiffness, concrete + steel
    pub stiffness: Mat3,

    pub limit_states: LimitStates,
    /// Iterations used by the latest solve
    pub iterations: usize,
    pub stop: bool,
    pub stop_message: Option<String>,
}

impl Membrane {
    /// Create an unloaded, uncracked membrane.
    ///
    /// The steel secant matrix starts at zero and is only formed from the
    /// first strain estimate, so the first iteration sees plain concrete.
    pub fn new(
        concrete: Concrete,
        steel: Steel,
        rho: (f64, f64),
        crack_spacing: (f64, f64),
    ) -> FEAResult<Self> {
        concrete.validate()?;
        steel.validate()?;
        let (rho_x, rho_y) = rho;
        if !(rho_x >= 0.0 && rho_y >= 0.0) {
            return Err(FEAError::InvalidInput(format!(
                "reinforcement ratios must be non-negative, got ({rho_x}, {rho_y})"
            )));
        }
        let (sm_x, sm_y) = crack_spacing;
        if !(sm_x > 0.0 && sm_y > 0.0) {
            return Err(FEAError::InvalidInput(format!(
                "crack spacings must be positive, got ({sm_x}, {sm_y})"
            )));
        }

        let eci = concrete.eci;
        let concrete_stiffness = Mat3::from_diagonal(&Vec3::new(eci, eci, eci / 2.0));

        Ok(Self {
            concrete,
            steel,
            rho_x,
            rho_y,
            sm_x,
            sm_y,
            stress: Vec3::zeros(),
            strain: Vec3::zeros(),
            e1: 0.0,
            e2: 0.0,
            theta: 0.0,
            theta_x: 0.0,
            theta_y: -std::f64::consts::FRAC_PI_2,
            fc1: 0.0,
            fc2: 0.0,
            fsx: 0.0,
            fsy: 0.0,
            crack: None,
            concrete_stiffness,
            steel_stiffness: Mat3::zeros(),
            stiffness: concrete_stiffness,
            limit_states: LimitStates::default(),
            iterations: 0,
            stop: false,
            stop_message: None,
        })
    }

    pub fn is_cracked(&self) -> bool {
        self.limit_states.crack.is_set()
    }

    /// Turn a stopped solve into an error
    pub fn check(&self) -> FEAResult<()> {
        if self.stop {
            return Err(FEAError::NonConvergence {
                iterations: self.iterations,
                message: self
                    .stop_message
                    .clone()
                    .unwrap_or_else(|| "membrane stopped".to_string()),
            });
        }
        Ok(())
    }

    /// Average stress resisted by concrete and reinforcement [σx, σy, τxy]
    pub fn average_stress(&self) -> Vec3 {
        let psi = principal_direction(self.strain[0], self.strain[1], self.strain[2]);
        let t = strain_transformation(psi);
        let concrete = t.transpose() * Vec3::new(self.fc1, self.fc2, 0.0);
        let steel = Vec3::new(self.rho_x * self.fsx, self.rho_y * self.fsy, 0.0);
        concrete + steel
    }

    pub(crate) fn halt(&mut self, iterations: usize, message: String) {
        log::warn!("membrane stopped after {iterations} iterations: {message}");
        self.iterations = iterations;
        self.stop = true;
        self.stop_message = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membrane() -> Membrane {
        Membrane::new(
            Concrete::from_fcm(30.0, 16.0),
            Steel::b500(),
            (0.01, 0.01),
            (150.0, 150.0),
        )
        .unwrap()
    }

    #[test]
    fn test_limit_state_write_once() {
        let mut ls = LimitState::default();
        assert_eq!(ls.step(), 0);
        assert!(ls.record(3));
        assert!(!ls.record(5));
        assert_eq!(ls, LimitState::SetAtStep(3));
        assert_eq!(ls.step(), 3);
    }

    #[test]
    fn test_new_membrane_is_plain_concrete() {
        let m = membrane();
        let eci = m.concrete.eci;
        assert_eq!(m.stiffness[(0, 0)], eci);
        assert_eq!(m.stiffness[(2, 2)], eci / 2.0);
        assert_eq!(m.steel_stiffness, Mat3::zeros());
        assert!(!m.is_cracked());
        assert!(m.check().is_ok());
    }

    #[test]
    fn test_missing_material_rejected() {
        let result = Membrane::new(
            Concrete::new(0.0, 0.0, 0.0, 0.0, 0.0),
            Steel::b500(),
            (0.01, 0.01),
            (150.0, 150.0),
        );
        assert!(matches!(
            result,
            Err(FEAError::MissingMaterialParameters(_))
        ));
    }

    #[test]
    fn test_check_reports_stop() {
        let mut m = membrane();
        m.halt(1000, "no convergence".to_string());
        match m.check() {
            Err(FEAError::NonConvergence { iterations, message }) => {
                assert_eq!(iterations, 1000);
                assert_eq!(message, "no convergence");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
