//! Node element - a numbered point in the panel plane

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Whether a node lies on the outer boundary of the structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeType {
    #[default]
    External,
    Internal,
}

/// A 2D node with two translational DoFs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// 1-based node number
    pub number: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    pub kind: NodeType,
    /// Restrained in X translation
    pub fixed_x: bool,
    /// Restrained in Y translation
    pub fixed_y: bool,
    /// Applied external force in X
    pub fx: f64,
    /// Applied external force in Y
    pub fy: f64,

    /// Displacement from the latest solve [ux, uy]
    #[serde(skip)]
    pub(crate) displacement: Option<[f64; 2]>,
}

impl Node {
    /// Create a new free, unloaded node
    pub fn new(number: usize, x: f64, y: f64) -> Self {
        Self {
            number,
            x,
            y,
            kind: NodeType::External,
            fixed_x: false,
            fixed_y: false,
            fx: 0.0,
            fy: 0.0,
            displacement: None,
        }
    }

    pub fn internal(mut self) -> Self {
        self.kind = NodeType::Internal;
        self
    }

    /// Restrain translations
    pub fn with_support(mut self, fixed_x: bool, fixed_y: bool) -> Self {
        self.fixed_x = fixed_x;
        self.fixed_y = fixed_y;
        self
    }

    /// Apply an external force
    pub fn with_force(mut self, fx: f64, fy: f64) -> Self {
        self.fx = fx;
        self.fy = fy;
        self
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Global DoF indices (ux, uy) of this node
    pub fn global_indexes(&self) -> FEAResult<(usize, usize)> {
        global_indexes(self.number)
    }

    /// Displacement [ux, uy] from the latest extraction
    pub fn displacement(&self) -> Option<[f64; 2]> {
        self.displacement
    }

    /// Read this node's displacement pair from a global solution vector.
    ///
    /// Values are rounded to 6 decimals before being stored.
    pub fn extract_displacement(&mut self, u: &[f64]) -> FEAResult<[f64; 2]> {
        let (ix, iy) = self.global_indexes()?;
        if iy >= u.len() {
            return Err(FEAError::IndexOutOfRange {
                index: iy,
                len: u.len(),
            });
        }
        let disp = [round_to(u[ix], 6), round_to(u[iy], 6)];
        self.displacement = Some(disp);
        Ok(disp)
    }
}

/// Global DoF indices for a 1-based node number: (2n-2, 2n-1)
pub fn global_indexes(number: usize) -> FEAResult<(usize, usize)> {
    if number == 0 {
        return Err(FEAError::InvalidInput(
            "node numbers are 1-based, got 0".to_string(),
        ));
    }
    Ok((2 * number - 2, 2 * number - 1))
}

/// Flattened DoF indices for a list of node numbers, in the given order
pub fn global_indexes_of(numbers: &[usize]) -> FEAResult<Vec<usize>> {
    let mut indexes = Vec::with_capacity(numbers.len() * 2);
    for &number in numbers {
        let (ix, iy) = global_indexes(number)?;
        indexes.push(ix);
        indexes.push(iy);
    }
    Ok(indexes)
}

/// Round to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
