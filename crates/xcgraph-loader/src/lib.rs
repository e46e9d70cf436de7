//! Graph loading: from project declarations to a validated [`Graph`]
//!
//! [`Graph`]: xcgraph_core::Graph

pub mod cycles;
pub mod error;
pub mod loader;


pub use cycles::{CycleDetector, CycleNode};
pub use error::GraphLoadingError;
pub use loader::GraphLoader;
