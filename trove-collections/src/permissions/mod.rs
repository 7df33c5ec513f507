//! Permission graph commands and the access gate

mod gate;
mod graph;

pub use gate::AccessGate;
pub use graph::{GetPermissionGraph, ReplacePermissionGraph};
