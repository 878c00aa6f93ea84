//! Stringer element - 3-node axial member along panel edges

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::material::{Concrete, Steel};
use super::node::{global_indexes_of, Node};
use crate::analysis::StringerLaw;
use crate::error::{FEAError, FEAResult};
use crate::math::stringer::{stringer_elastic_stiffness, stringer_local_stiffness, AxialSection};
use crate::math::{direction_cosines, Mat3, Mat36, Mat6};
use crate::results::StringerForces;

/// A stringer with start, mid and end nodes on one line.
///
/// The normal force varies linearly from N1 at the start to N3 at the end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stringer {
    pub number: usize,
    /// Start node number
    pub start: usize,
    /// Mid node number
    pub mid: usize,
    /// End node number
    pub end: usize,
    /// Concrete area in mm²
    pub concrete_area: f64,
    pub bar_count: u32,
    /// Bar diameter in mm
    pub bar_diameter: f64,
    pub law: StringerLaw,

    #[serde(skip)]
    pub(crate) length: Option<f64>,

    /// Angle of the start-to-end direction with the x axis
    #[serde(skip)]
    pub(crate) angle: Option<f64>,

    #[serde(skip)]
    pub(crate) forces: Option<StringerForces>,

    /// Local 3x3 stiffness from the latest derivation
    #[serde(skip)]
    pub(crate) stiffness: Option<Mat3>,
}

impl Stringer {
    /// Create a new unreinforced stringer with the default law
    pub fn new(number: usize, start: usize, mid: usize, end: usize, concrete_area: f64) -> Self {
        Self {
            number,
            start,
            mid,
            end,
            concrete_area,
            bar_count: 0,
            bar_diameter: 0.0,
            law: StringerLaw::Default,
            length: None,
            angle: None,
            forces: None,
            stiffness: None,
        }
    }

    /// Set longitudinal reinforcement
    pub fn with_bars(mut self, count: u32, diameter: f64) -> Self {
        self.bar_count = count;
        self.bar_diameter = diameter;
        self
    }

    pub fn with_law(mut self, law: StringerLaw) -> Self {
        self.law = law;
        self
    }

    /// Steel area in mm², zero without bars
    pub fn steel_area(&self) -> f64 {
        if self.bar_count == 0 || self.bar_diameter <= 0.0 {
            return 0.0;
        }
        self.bar_count as f64 * PI * self.bar_diameter.powi(2) / 4.0
    }

    pub fn section(&self) -> AxialSection {
        AxialSection::new(self.concrete_area, self.steel_area())
    }

    /// Node numbers in element order
    pub fn nodes(&self) -> [usize; 3] {
        [self.start, self.mid, self.end]
    }

    /// Global DoF indices of start, mid and end node
    pub fn global_indexes(&self) -> FEAResult<Vec<usize>> {
        global_indexes_of(&self.nodes())
    }

    pub fn length(&self) -> Option<f64> {
        self.length
    }

    pub fn angle(&self) -> Option<f64> {
        self.angle
    }

    /// End forces from the latest read-back
    pub fn forces(&self) -> Option<StringerForces> {
        self.forces
    }

    pub fn stiffness(&self) -> Option<Mat3> {
        self.stiffness
    }

    /// Derive length and angle from the node positions
    pub(crate) fn set_geometry(&mut self, start: &Node, mid: &Node, end: &Node) -> FEAResult<()> {
        let length = start.distance_to(end);
        if length < 1e-10 {
            return Err(FEAError::InvalidInput(format!(
                "stringer {} has zero length",
                self.number
            )));
        }
        let to_mid = start.distance_to(mid) + mid.distance_to(end);
        if (to_mid - length).abs() > 1e-6 * length {
            return Err(FEAError::InvalidInput(format!(
                "mid node {} of stringer {} is not between its end nodes",
                self.mid, self.number
            )));
        }
        self.length = Some(length);
        self.angle = Some((end.y - start.y).atan2(end.x - start.x));
        Ok(())
    }

    fn geometry(&self) -> FEAResult<(f64, f64)> {
        match (self.length, self.angle) {
            (Some(length), Some(angle)) => Ok((length, angle)),
            _ => Err(FEAError::InvalidInput(format!(
                "stringer {} has no geometry, validate the model first",
                self.number
            ))),
        }
    }

    /// Uncracked stiffness, for the first load step
    pub fn elastic_stiffness(&self, concrete: &Concrete, steel: &Steel) -> FEAResult<Mat3> {
        let (length, _) = self.geometry()?;
        stringer_elastic_stiffness(length, &self.section(), concrete, steel)
    }

    /// Secant stiffness for the current end forces
    pub fn local_stiffness(&self, concrete: &Concrete, steel: &Steel) -> FEAResult<Mat3> {
        let (length, _) = self.geometry()?;
        let forces = self.forces.unwrap_or_default();
        stringer_local_stiffness(forces.n1, forces.n3, length, self.law, &self.section(), concrete, steel)
    }

    /// Recompute and store the stiffness. Uses the uncracked stiffness
    /// until a nonzero end force has been read back.
    pub fn update_stiffness(&mut self, concrete: &Concrete, steel: &Steel) -> FEAResult<Mat3> {
        let k = match self.forces {
            Some(f) if f.n1 != 0.0 || f.n3 != 0.0 => self.local_stiffness(concrete, steel)?,
            _ => self.elastic_stiffness(concrete, steel)?,
        };
        self.stiffness = Some(k);
        Ok(k)
    }

    /// Maps the 6 global DoFs to the 3 axial displacements
    pub fn transformation_matrix(&self) -> FEAResult<Mat36> {
        let (_, angle) = self.geometry()?;
        let (c, s) = direction_cosines(angle);
        let mut t = Mat36::zeros();
        for i in 0..3 {
            t[(i, 2 * i)] = c;
            t[(i, 2 * i + 1)] = s;
        }
        Ok(t)
    }

    /// Stored stiffness in global coordinates, ordered as [`Self::global_indexes`]
    pub fn global_stiffness(&self) -> FEAResult<Mat6> {
        let k = self.stiffness.ok_or_else(|| {
            FEAError::InvalidInput(format!("stringer {} has no stiffness yet", self.number))
        })?;
        let t = self.transformation_matrix()?;
        Ok(t.transpose() * k * t)
    }

    /// Read end forces back from a global displacement vector
    pub fn update_forces(&mut self, u: &[f64]) -> FEAResult<StringerForces> {
        let k = self.stiffness.ok_or_else(|| {
            FEAError::InvalidInput(format!("stringer {} has no stiffness yet", self.number))
        })?;
        let t = self.transformation_matrix()?;
        let indexes = self.global_indexes()?;

        let mut u_global = nalgebra::SVector::<f64, 6>::zeros();
        for (slot, &index) in indexes.iter().enumerate() {
            u_global[slot] = *u.get(index).ok_or(FEAError::IndexOutOfRange {
                index,
                len: u.len(),
            })?;
        }
        let nodal = k * (t * u_global);
        let forces = StringerForces {
            n1: -nodal[0],
            n3: nodal[2],
        };
        self.forces = Some(forces);
        Ok(forces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stringer_on_x() -> Stringer {
        let mut s = Stringer::new(1, 1, 2, 3, 40_000.0).with_bars(4, 12.0);
        s.set_geometry(
            &Node::new(1, 0.0, 0.0),
            &Node::new(2, 500.0, 0.0),
            &Node::new(3, 1000.0, 0.0),
        )
        .unwrap();
        s
    }

    #[test]
    fn test_steel_area() {
        let s = Stringer::new(1, 1, 2, 3, 40_000.0).with_bars(4, 12.0);
        assert_relative_eq!(s.steel_area(), 4.0 * PI * 36.0);
        assert_eq!(Stringer::new(1, 1, 2, 3, 1.0).with_bars(0, 12.0).steel_area(), 0.0);
        assert_eq!(Stringer::new(1, 1, 2, 3, 1.0).with_bars(4, 0.0).steel_area(), 0.0);
    }

    #[test]
    fn test_geometry() {
        let s = stringer_on_x();
        assert_relative_eq!(s.length().unwrap(), 1000.0);
        assert_relative_eq!(s.angle().unwrap(), 0.0);
        assert_eq!(s.global_indexes().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_mid_node_off_line_rejected() {
        let mut s = Stringer::new(1, 1, 2, 3, 40_000.0);
        let result = s.set_geometry(
            &Node::new(1, 0.0, 0.0),
            &Node::new(2, 500.0, 100.0),
            &Node::new(3, 1000.0, 0.0),
        );
        assert!(matches!(result, Err(FEAError::InvalidInput(_))));
    }

    #[test]
    fn test_unloaded_stringer() {
        let mut s = stringer_on_x();
        let (c, st) = (Concrete::from_fcm(30.0, 16.0), Steel::b500());
        s.forces = Some(StringerForces { n1: 0.0, n3: 0.0 });
        assert!(matches!(
            s.local_stiffness(&c, &st),
            Err(FEAError::SingularFlexibility(_))
        ));
        // update falls back to the uncracked stiffness
        let k = s.update_stiffness(&c, &st).unwrap();
        assert_eq!(k, s.elastic_stiffness(&c, &st).unwrap());
    }

    #[test]
    fn test_force_readback_uniform_stretch() {
        let mut s = stringer_on_x();
        let (c, st) = (Concrete::from_fcm(30.0, 16.0), Steel::b500());
        s.update_stiffness(&c, &st).unwrap();

        let delta = 0.01;
        let u = [0.0, 0.0, delta / 2.0, 0.0, delta, 0.0];
        let forces = s.update_forces(&u).unwrap();
        let ea = s.section().uncracked_stiffness(&c, &st);
        assert_relative_eq!(forces.n1, ea * delta / 1000.0, max_relative = 1e-9);
        assert_relative_eq!(forces.n3, ea * delta / 1000.0, max_relative = 1e-9);

        // the stiffness now follows the read-back forces
        let k = s.update_stiffness(&c, &st).unwrap();
        assert!(k[(0, 0)] > 0.0);
    }

    #[test]
    fn test_vertical_global_stiffness() {
        let mut s = Stringer::new(1, 1, 2, 3, 40_000.0);
        s.set_geometry(
            &Node::new(1, 0.0, 0.0),
            &Node::new(2, 0.0, 500.0),
            &Node::new(3, 0.0, 1000.0),
        )
        .unwrap();
        s.update_stiffness(&Concrete::from_fcm(30.0, 16.0), &Steel::b500())
            .unwrap();
        let k = s.global_stiffness().unwrap();
        // x DoFs carry nothing for a vertical stringer
        for i in 0..6 {
            assert_eq!(k[(0, i)], 0.0);
            assert_eq!(k[(i, 2)], 0.0);
        }
        assert!(k[(1, 1)] > 0.0);
    }
}
