//! Result types read back from the core

use serde::{Deserialize, Serialize};

use crate::elements::{LimitStates, Membrane};

/// Displacement results at a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeDisplacement {
    pub number: usize,
    /// Displacement in X direction
    pub ux: f64,
    /// Displacement in Y direction
    pub uy: f64,
}

impl NodeDisplacement {
    /// Create from array [UX, UY]
    pub fn from_array(number: usize, arr: [f64; 2]) -> Self {
        Self {
            number,
            ux: arr[0],
            uy: arr[1],
        }
    }

    /// Length of the displacement vector
    pub fn magnitude(&self) -> f64 {
        (self.ux.powi(2) + self.uy.powi(2)).sqrt()
    }
}

/// Normal forces at the ends of a stringer (positive = tension)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StringerForces {
    /// Normal force at the start node
    pub n1: f64,
    /// Normal force at the end node
    pub n3: f64,
}

impl StringerForces {
    /// Larger of |N1| and |N3|
    pub fn max_abs(&self) -> f64 {
        self.n1.abs().max(self.n3.abs())
    }
}

/// Limit states of one panel, as load-step indices (0 = not reached)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitStateSummary {
    pub panel: usize,
    pub crack: usize,
    pub yield_x: usize,
    pub yield_y: usize,
    pub peak: usize,
}

impl LimitStateSummary {
    pub fn from_limit_states(panel: usize, states: &LimitStates) -> Self {
        Self {
            panel,
            crack: states.crack.step(),
            yield_x: states.yield_x.step(),
            yield_y: states.yield_y.step(),
            peak: states.peak.step(),
        }
    }
}

/// Stress and strain state of a panel membrane for rendering
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MembraneResult {
    pub panel: usize,
    /// Applied stress [σx, σy, τxy]
    pub stress: [f64; 3],
    /// Average strain [εx, εy, γxy]
    pub strain: [f64; 3],
    pub e1: f64,
    pub e2: f64,
    pub theta: f64,
    pub fc1: f64,
    pub fc2: f64,
    pub fsx: f64,
    pub fsy: f64,
    pub crack_width: Option<f64>,
}

impl MembraneResult {
    pub fn from_membrane(panel: usize, m: &Membrane) -> Self {
        Self {
            panel,
            stress: [m.stress[0], m.stress[1], m.stress[2]],
            strain: [m.strain[0], m.strain[1], m.strain[2]],
            e1: m.e1,
            e2: m.e2,
            theta: m.theta,
            fc1: m.fc1,
            fc2: m.fc2,
            fsx: m.fsx,
            fsy: m.fsy,
            crack_width: m.crack.map(|c| c.width),
        }
    }
}
