//! Road networks and the searches and traffic that run over them.

pub use graph::*;
pub use network::*;

mod graph;
mod network;
pub mod search;
pub mod traffic;
