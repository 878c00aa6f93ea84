//! Structural elements module

mod material;
mod membrane;
mod node;
mod panel;
mod stringer;

pub use material::{Concrete, Steel};
pub use membrane::{CrackState, Dominance, LimitState, LimitStates, Membrane};
pub use node::{global_indexes, global_indexes_of, round_to, Node, NodeType};
pub use panel::{Panel, Reinforcement};
pub use stringer::Stringer;
