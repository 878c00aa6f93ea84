//! Stringer-panel model - the analysis input aggregate

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::analysis::SolverOptions;
use crate::elements::{global_indexes, Concrete, Membrane, Node, Panel, Steel, Stringer};
use crate::error::{FEAError, FEAResult};
use crate::math::{Mat6, Vec3};
use crate::results::{LimitStateSummary, MembraneResult, NodeDisplacement, StringerForces};

/// Nodes, stringers, panels and materials of one analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelModel {
    /// Nodes by number
    pub nodes: BTreeMap<usize, Node>,
    /// Stringers by number
    pub stringers: BTreeMap<usize, Stringer>,
    /// Panels by number
    pub panels: BTreeMap<usize, Panel>,
    pub concrete: Option<Concrete>,
    pub steel: Option<Steel>,

    /// Geometry derived and membranes built
    #[serde(skip)]
    prepared: bool,
}

impl PanelModel {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::default()
    }

    // ========================
    // Model Building Methods
    // ========================

    pub fn add_node(&mut self, node: Node) -> FEAResult<()> {
        if node.number == 0 {
            return Err(FEAError::InvalidInput(
                "node numbers are 1-based, got 0".to_string(),
            ));
        }
        if self.nodes.contains_key(&node.number) {
            return Err(FEAError::DuplicateNumber(node.number));
        }
        self.nodes.insert(node.number, node);
        self.prepared = false;
        Ok(())
    }

    pub fn add_stringer(&mut self, stringer: Stringer) -> FEAResult<()> {
        if stringer.number == 0 {
            return Err(FEAError::InvalidInput(
                "stringer numbers are 1-based, got 0".to_string(),
            ));
        }
        for number in stringer.nodes() {
            if !self.nodes.contains_key(&number) {
                return Err(FEAError::NodeNotFound(number));
            }
        }
        if self.stringers.contains_key(&stringer.number) {
            return Err(FEAError::DuplicateNumber(stringer.number));
        }
        self.stringers.insert(stringer.number, stringer);
        self.prepared = false;
        Ok(())
    }

    pub fn add_panel(&mut self, panel: Panel) -> FEAResult<()> {
        if panel.number == 0 {
            return Err(FEAError::InvalidInput(
                "panel numbers are 1-based, got 0".to_string(),
            ));
        }
        for number in panel.nodes {
            if !self.nodes.contains_key(&number) {
                return Err(FEAError::NodeNotFound(number));
            }
        }
        if self.panels.contains_key(&panel.number) {
            return Err(FEAError::DuplicateNumber(panel.number));
        }
        self.panels.insert(panel.number, panel);
        self.prepared = false;
        Ok(())
    }

    /// Replace the concrete parameters.
    ///
    /// Panels that have not been loaded pick the change up on the next
    /// `prepare`; a loaded panel keeps the materials of its history.
    pub fn set_concrete(&mut self, concrete: Concrete) {
        self.concrete = Some(concrete);
        self.prepared = false;
    }

    /// Replace the steel parameters, see [`PanelModel::set_concrete`]
    pub fn set_steel(&mut self, steel: Steel) {
        self.steel = Some(steel);
        self.prepared = false;
    }

    /// Material parameters, refusing to continue without them
    pub fn materials(&self) -> FEAResult<(Concrete, Steel)> {
        let concrete = self.concrete.ok_or_else(|| {
            FEAError::MissingMaterialParameters("concrete parameters not set".to_string())
        })?;
        let steel = self.steel.ok_or_else(|| {
            FEAError::MissingMaterialParameters("steel parameters not set".to_string())
        })?;
        concrete.validate()?;
        steel.validate()?;
        Ok((concrete, steel))
    }

    /// Check node, stringer and panel numbering is 1-based and contiguous
    pub fn validate(&self) -> FEAResult<()> {
        if self.nodes.is_empty() {
            return Err(FEAError::InvalidInput("model has no nodes".to_string()));
        }
        check_numbering("node", self.nodes.iter().map(|(&key, n)| (key, n.number)))?;
        check_numbering("stringer", self.stringers.iter().map(|(&key, s)| (key, s.number)))?;
        check_numbering("panel", self.panels.iter().map(|(&key, p)| (key, p.number)))?;
        Ok(())
    }

    /// Validate input, derive stringer geometry and build panel membranes.
    ///
    /// Membranes that carry load history are kept so limit states survive
    /// between steps. Unloaded membranes are rebuilt when the materials
    /// changed; changing materials under a loaded panel is refused.
    pub fn prepare(&mut self) -> FEAResult<()> {
        let (concrete, steel) = self.materials()?;
        self.validate()?;

        for stringer in self.stringers.values_mut() {
            let [start, mid, end] = stringer.nodes();
            let node = |n: usize| self.nodes.get(&n).ok_or(FEAError::NodeNotFound(n));
            stringer.set_geometry(node(start)?, node(mid)?, node(end)?)?;
        }
        for panel in self.panels.values_mut() {
            let (stale, loaded) = match panel.membrane() {
                Some(m) => (m.concrete != concrete || m.steel != steel, m.iterations > 0),
                None => (true, false),
            };
            if stale && loaded {
                return Err(FEAError::InvalidInput(format!(
                    "panel {} has been loaded, its materials cannot change",
                    panel.number
                )));
            }
            if stale {
                panel.init_membrane(&concrete, &steel)?;
            }
        }

        log::debug!(
            "prepared model: {} nodes, {} stringers, {} panels",
            self.nodes.len(),
            self.stringers.len(),
            self.panels.len()
        );
        self.prepared = true;
        Ok(())
    }

    fn ensure_prepared(&mut self) -> FEAResult<()> {
        if !self.prepared {
            self.prepare()?;
        }
        Ok(())
    }

    // ========================
    // Global Indexing
    // ========================

    /// Total number of DoFs (two per node)
    pub fn num_dofs(&self) -> usize {
        self.nodes.len() * 2
    }

    /// Global DoF indices of a node, checked against the model
    pub fn global_indexes(&self, number: usize) -> FEAResult<(usize, usize)> {
        if !self.nodes.contains_key(&number) {
            return Err(FEAError::NodeNotFound(number));
        }
        global_indexes(number)
    }

    /// Flattened DoF indices of a list of nodes, in the given order
    pub fn global_indexes_of(&self, numbers: &[usize]) -> FEAResult<Vec<usize>> {
        let mut indexes = Vec::with_capacity(numbers.len() * 2);
        for &number in numbers {
            let (ix, iy) = self.global_indexes(number)?;
            indexes.push(ix);
            indexes.push(iy);
        }
        Ok(indexes)
    }

    /// Applied nodal forces as a global vector
    pub fn load_vector(&self) -> FEAResult<Vec<f64>> {
        let mut p = vec![0.0; self.num_dofs()];
        for node in self.nodes.values() {
            let (ix, iy) = node.global_indexes()?;
            if iy >= p.len() {
                return Err(FEAError::IndexOutOfRange { index: iy, len: p.len() });
            }
            p[ix] = node.fx;
            p[iy] = node.fy;
        }
        Ok(p)
    }

    /// Restrained DoF indices, ascending
    pub fn restrained_dofs(&self) -> FEAResult<Vec<usize>> {
        let mut dofs = Vec::new();
        for node in self.nodes.values() {
            let (ix, iy) = node.global_indexes()?;
            if node.fixed_x {
                dofs.push(ix);
            }
            if node.fixed_y {
                dofs.push(iy);
            }
        }
        Ok(dofs)
    }

    // ========================
    // Element State
    // ========================

    /// Solve one panel's membrane for an applied stress
    pub fn solve_panel(
        &mut self,
        number: usize,
        stress: Vec3,
        load_step: usize,
        options: &SolverOptions,
    ) -> FEAResult<&Membrane> {
        self.ensure_prepared()?;
        let panel = self.panels.get_mut(&number).ok_or_else(|| {
            FEAError::InvalidInput(format!("panel {number} not found in model"))
        })?;
        panel.solve(stress, load_step, options)
    }

    /// Solve every listed panel for one load step.
    ///
    /// Stops at the first panel whose membrane does not converge.
    pub fn solve_panels(
        &mut self,
        stresses: &[(usize, Vec3)],
        load_step: usize,
        options: &SolverOptions,
    ) -> FEAResult<()> {
        for &(number, stress) in stresses {
            self.solve_panel(number, stress, load_step, options)?;
        }
        log::debug!("load step {load_step}: solved {} panels", stresses.len());
        Ok(())
    }

    /// Recompute every stringer stiffness from its current end forces
    pub fn update_stringer_stiffnesses(&mut self) -> FEAResult<()> {
        self.ensure_prepared()?;
        let (concrete, steel) = self.materials()?;
        for stringer in self.stringers.values_mut() {
            stringer.update_stiffness(&concrete, &steel)?;
        }
        Ok(())
    }

    /// Global stiffness blocks of all stringers with their DoF indices
    pub fn stringer_stiffnesses(&self) -> FEAResult<Vec<(Vec<usize>, Mat6)>> {
        self.stringers
            .values()
            .map(|s| Ok((s.global_indexes()?, s.global_stiffness()?)))
            .collect()
    }

    // ========================
    // Result Read-back
    // ========================

    /// Store the displacement pair of every node from a global solution
    pub fn extract_displacements(&mut self, u: &[f64]) -> FEAResult<Vec<NodeDisplacement>> {
        if u.len() < self.num_dofs() {
            return Err(FEAError::IndexOutOfRange {
                index: self.num_dofs() - 1,
                len: u.len(),
            });
        }
        self.nodes
            .values_mut()
            .map(|node| {
                let disp = node.extract_displacement(u)?;
                Ok(NodeDisplacement::from_array(node.number, disp))
            })
            .collect()
    }

    /// Read stringer end forces from a global solution
    pub fn update_stringer_forces(&mut self, u: &[f64]) -> FEAResult<Vec<(usize, StringerForces)>> {
        self.stringers
            .values_mut()
            .map(|s| Ok((s.number, s.update_forces(u)?)))
            .collect()
    }

    pub fn node_displacement(&self, number: usize) -> FEAResult<NodeDisplacement> {
        let node = self
            .nodes
            .get(&number)
            .ok_or(FEAError::NodeNotFound(number))?;
        let disp = node.displacement().ok_or_else(|| {
            FEAError::InvalidInput(format!("node {number} has no displacement yet"))
        })?;
        Ok(NodeDisplacement::from_array(number, disp))
    }

    /// Limit-state markers of every panel with a membrane
    pub fn limit_state_summary(&self) -> Vec<LimitStateSummary> {
        self.panels
            .values()
            .filter_map(|p| {
                p.membrane()
                    .map(|m| LimitStateSummary::from_limit_states(p.number, &m.limit_states))
            })
            .collect()
    }

    pub fn membrane_results(&self) -> Vec<MembraneResult> {
        self.panels
            .values()
            .filter_map(|p| p.membrane().map(|m| MembraneResult::from_membrane(p.number, m)))
            .collect()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }
}

/// Keys must run 1, 2, .. n and match the number stored with each entry
fn check_numbering(kind: &str, entries: impl Iterator<Item = (usize, usize)>) -> FEAResult<()> {
    for (expected, (key, number)) in (1..).zip(entries) {
        if key != expected {
            return Err(FEAError::InvalidInput(format!(
                "{kind} numbering must be contiguous from 1, expected {expected} but found {key}"
            )));
        }
        if key != number {
            return Err(FEAError::InvalidInput(format!(
                "{kind} stored under {key} is numbered {number}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Reinforcement;

    fn square_model() -> PanelModel {
        let mut model = PanelModel::new();
        let coords = [
            (0.0, 0.0),
            (500.0, 0.0),
            (1000.0, 0.0),
            (1000.0, 500.0),
            (1000.0, 1000.0),
            (500.0, 1000.0),
            (0.0, 1000.0),
            (0.0, 500.0),
        ];
        for (i, &(x, y)) in coords.iter().enumerate() {
            model.add_node(Node::new(i + 1, x, y)).unwrap();
        }
        model
            .add_stringer(Stringer::new(1, 1, 2, 3, 40_000.0).with_bars(4, 12.0))
            .unwrap();
        model
            .add_stringer(Stringer::new(2, 3, 4, 5, 40_000.0).with_bars(4, 12.0))
            .unwrap();
        let r = Reinforcement::new(10.0, 150.0, 25.0);
        model
            .add_panel(Panel::new(1, [1, 3, 5, 7], 200.0).with_reinforcement(r, r))
            .unwrap();
        model
    }

    #[test]
    fn test_duplicate_node() {
        let mut model = PanelModel::new();
        model.add_node(Node::new(1, 0.0, 0.0)).unwrap();
        assert_eq!(
            model.add_node(Node::new(1, 1.0, 0.0)),
            Err(FEAError::DuplicateNumber(1))
        );
        assert!(model.add_node(Node::new(0, 1.0, 0.0)).is_err());
    }

    #[test]
    fn test_missing_node_reference() {
        let mut model = PanelModel::new();
        model.add_node(Node::new(1, 0.0, 0.0)).unwrap();
        let result = model.add_stringer(Stringer::new(1, 1, 2, 3, 100.0));
        assert_eq!(result, Err(FEAError::NodeNotFound(2)));
    }

    #[test]
    fn test_non_contiguous_numbering() {
        let mut model = PanelModel::new();
        model.add_node(Node::new(1, 0.0, 0.0)).unwrap();
        model.add_node(Node::new(3, 1.0, 0.0)).unwrap();
        assert!(matches!(model.validate(), Err(FEAError::InvalidInput(_))));
    }

    #[test]
    fn test_element_numbers_checked() {
        let mut model = square_model();
        assert!(matches!(
            model.add_stringer(Stringer::new(0, 1, 2, 3, 40_000.0)),
            Err(FEAError::InvalidInput(_))
        ));
        assert!(matches!(
            model.add_panel(Panel::new(0, [1, 3, 5, 7], 200.0)),
            Err(FEAError::InvalidInput(_))
        ));
        assert_eq!(model.stringers.len(), 2);
        assert_eq!(model.panels.len(), 1);
        model.validate().unwrap();
    }

    #[test]
    fn test_stringer_gap_refused() {
        let mut model = square_model();
        model.set_concrete(Concrete::from_fcm(30.0, 16.0));
        model.set_steel(Steel::b500());
        model
            .add_stringer(Stringer::new(7, 5, 6, 7, 40_000.0))
            .unwrap();
        assert!(matches!(model.validate(), Err(FEAError::InvalidInput(_))));
        assert!(matches!(model.prepare(), Err(FEAError::InvalidInput(_))));
        assert!(!model.is_prepared());
    }

    #[test]
    fn test_panel_gap_refused() {
        let mut model = square_model();
        model.set_concrete(Concrete::from_fcm(30.0, 16.0));
        model.set_steel(Steel::b500());
        model
            .add_panel(Panel::new(3, [1, 3, 5, 7], 200.0))
            .unwrap();
        assert!(matches!(model.prepare(), Err(FEAError::InvalidInput(_))));

        // renumbered behind the map key
        let mut model = square_model();
        let mut stringer = model.stringers.remove(&2).unwrap();
        stringer.number = 5;
        model.stringers.insert(2, stringer);
        assert!(matches!(model.validate(), Err(FEAError::InvalidInput(_))));
    }

    #[test]
    fn test_material_change_reaches_unloaded_panels() {
        let mut model = square_model();
        model.set_concrete(Concrete::from_fcm(30.0, 16.0));
        model.set_steel(Steel::b500());
        model.prepare().unwrap();

        model.set_concrete(Concrete::from_fcm(40.0, 16.0));
        model.set_steel(Steel::new(550.0, 200_000.0));
        model.prepare().unwrap();
        let membrane = model.panels[&1].membrane().unwrap();
        assert_eq!(membrane.concrete.fcm, 40.0);
        assert_eq!(membrane.steel.fy, 550.0);
        assert_eq!(membrane.stiffness[(0, 0)], membrane.concrete.eci);

        // once loaded the panel keeps its materials
        model
            .solve_panel(1, Vec3::new(1.0, 0.0, 0.0), 1, &SolverOptions::default())
            .unwrap();
        model.set_concrete(Concrete::from_fcm(50.0, 16.0));
        assert!(matches!(model.prepare(), Err(FEAError::InvalidInput(_))));
        assert_eq!(model.panels[&1].membrane().unwrap().concrete.fcm, 40.0);

        // restoring the materials of the loaded panel is accepted
        model.set_concrete(Concrete::from_fcm(40.0, 16.0));
        model.prepare().unwrap();
        assert!(model.panels[&1].membrane().unwrap().iterations > 0);
    }

    #[test]
    fn test_missing_materials_refused() {
        let mut model = square_model();
        let result = model.solve_panel(1, Vec3::new(1.0, 0.0, 0.0), 1, &SolverOptions::default());
        assert!(matches!(result, Err(FEAError::MissingMaterialParameters(_))));

        model.set_concrete(Concrete::from_fcm(30.0, 16.0));
        assert!(matches!(
            model.prepare(),
            Err(FEAError::MissingMaterialParameters(_))
        ));
    }

    #[test]
    fn test_prepare_and_solve() {
        let mut model = square_model();
        model.set_concrete(Concrete::from_fcm(30.0, 16.0));
        model.set_steel(Steel::b500());
        model.prepare().unwrap();
        assert!(model.is_prepared());

        model
            .solve_panels(&[(1, Vec3::new(1.0, 0.5, 0.2))], 1, &SolverOptions::default())
            .unwrap();
        let summary = model.limit_state_summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].crack, 0);

        model.update_stringer_stiffnesses().unwrap();
        let blocks = model.stringer_stiffnesses().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].0, vec![4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_load_vector_and_supports() {
        let mut model = PanelModel::new();
        model
            .add_node(Node::new(1, 0.0, 0.0).with_support(true, true))
            .unwrap();
        model
            .add_node(Node::new(2, 1.0, 0.0).with_force(10.0, -5.0).with_support(false, true))
            .unwrap();
        assert_eq!(model.load_vector().unwrap(), vec![0.0, 0.0, 10.0, -5.0]);
        assert_eq!(model.restrained_dofs().unwrap(), vec![0, 1, 3]);
    }

    #[test]
    fn test_extract_displacements() {
        let mut model = PanelModel::new();
        model.add_node(Node::new(1, 0.0, 0.0)).unwrap();
        model.add_node(Node::new(2, 1.0, 0.0)).unwrap();
        let disps = model
            .extract_displacements(&[0.0, 0.0, 0.0000012, 0.5])
            .unwrap();
        assert_eq!(disps[1].ux, 0.000001);
        assert_eq!(model.node_displacement(2).unwrap().uy, 0.5);
        assert!(model.extract_displacements(&[0.0; 3]).is_err());
    }
}
