//! Stringer-Panel - nonlinear element core for reinforced concrete walls
//!
//! The structure is idealised as stringers (axial members along the
//! edges) connected by panels (membranes in pure shear and in-plane
//! normal stress). This crate provides the element-level nonlinear
//! behaviour that a global load-stepping driver iterates on:
//! - Panel membranes solved with the Modified Compression Field Theory
//! - Stringer axial laws and secant stiffness via the flexibility method
//! - Global DoF index mapping and displacement read-back
//!
//! Units are N, mm and MPa throughout. Compressive strains are negative.
//!
//! ## Example
//! ```rust
//! use stringer_panel::prelude::*;
//!
//! let concrete = Concrete::from_fcm(30.0, 16.0);
//! let steel = Steel::b500();
//! let membrane = Membrane::new(concrete, steel, (0.01, 0.01), (200.0, 200.0)).unwrap();
//!
//! let solved = mcft::solve(membrane, Vec3::new(1.0, 0.0, 0.5), 1, &SolverOptions::default());
//! assert!(!solved.stop);
//! assert!(!solved.limit_states.crack.is_set());
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod math;
pub mod model;
pub mod results;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{SolverOptions, StringerLaw};
    pub use crate::elements::{
        global_indexes, global_indexes_of, Concrete, CrackState, Dominance, LimitState, LimitStates,
        Membrane, Node, NodeType, Panel, Reinforcement, Steel, Stringer,
    };
    pub use crate::error::{FEAError, FEAResult};
    pub use crate::math::stringer::{
        stringer_elastic_stiffness, stringer_local_stiffness, AxialLaw, AxialSection,
    };
    pub use crate::math::{mcft, Mat3, Mat6, Vec3};
    pub use crate::model::PanelModel;
    pub use crate::results::{LimitStateSummary, MembraneResult, NodeDisplacement, StringerForces};
}
