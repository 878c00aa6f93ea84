//! Panel element - quadrilateral membrane between stringers

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::material::{Concrete, Steel};
use super::membrane::Membrane;
use super::node::global_indexes_of;
use crate::analysis::SolverOptions;
use crate::error::{FEAError, FEAResult};
use crate::math::{mcft, Vec3};

/// Smeared reinforcement of one direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reinforcement {
    /// Bar diameter in mm
    pub diameter: f64,
    /// Bar spacing in mm
    pub spacing: f64,
    /// Concrete cover in mm
    pub cover: f64,
}

impl Reinforcement {
    pub fn new(diameter: f64, spacing: f64, cover: f64) -> Self {
        Self {
            diameter,
            spacing,
            cover,
        }
    }

    /// Reinforcement ratio for a panel of the given width (thickness)
    pub fn ratio(&self, width: f64) -> f64 {
        if self.diameter <= 0.0 || self.spacing <= 0.0 {
            return 0.0;
        }
        PI * self.diameter.powi(2) / 4.0 / (self.spacing * width)
    }

    /// Average crack spacing, infinite without reinforcement
    pub fn crack_spacing(&self, width: f64) -> f64 {
        let rho = self.ratio(width);
        if rho <= 0.0 {
            return f64::INFINITY;
        }
        2.0 * (self.cover + self.spacing / 10.0) + 0.1 * self.diameter / rho
    }
}

/// A four-node reinforced concrete panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    pub number: usize,
    /// Corner node numbers, counter-clockwise
    pub nodes: [usize; 4],
    /// Panel width (thickness) in mm
    pub width: f64,
    pub reinforcement_x: Reinforcement,
    pub reinforcement_y: Reinforcement,

    #[serde(skip)]
    pub(crate) membrane: Option<Membrane>,
}

impl Panel {
    pub fn new(number: usize, nodes: [usize; 4], width: f64) -> Self {
        Self {
            number,
            nodes,
            width,
            reinforcement_x: Reinforcement::default(),
            reinforcement_y: Reinforcement::default(),
            membrane: None,
        }
    }

    pub fn with_reinforcement(mut self, x: Reinforcement, y: Reinforcement) -> Self {
        self.reinforcement_x = x;
        self.reinforcement_y = y;
        self
    }

    /// Corner DoF indices in corner order
    pub fn global_indexes(&self) -> FEAResult<Vec<usize>> {
        global_indexes_of(&self.nodes)
    }

    pub fn membrane(&self) -> Option<&Membrane> {
        self.membrane.as_ref()
    }

    /// Build a fresh, uncracked membrane for this panel
    pub fn init_membrane(&mut self, concrete: &Concrete, steel: &Steel) -> FEAResult<()> {
        if !(self.width > 0.0) {
            return Err(FEAError::InvalidInput(format!(
                "panel {} width must be positive, got {}",
                self.number, self.width
            )));
        }
        let rho = (
            self.reinforcement_x.ratio(self.width),
            self.reinforcement_y.ratio(self.width),
        );
        let spacing = (
            self.reinforcement_x.crack_spacing(self.width),
            self.reinforcement_y.crack_spacing(self.width),
        );
        self.membrane = Some(Membrane::new(*concrete, *steel, rho, spacing)?);
        Ok(())
    }

    /// Solve the panel's membrane for one load step
    pub fn solve(&mut self, stress: Vec3, load_step: usize, options: &SolverOptions) -> FEAResult<&Membrane> {
        let membrane = self.membrane.take().ok_or_else(|| {
            FEAError::InvalidInput(format!("panel {} has no membrane", self.number))
        })?;
        let membrane = self.membrane.insert(mcft::solve(membrane, stress, load_step, options));
        membrane.check()?;
        Ok(membrane)
    }
}
