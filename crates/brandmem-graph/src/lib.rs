//! brandmem Graph Store
//!
//! Per-namespace directed multigraphs of brand entities, one edge per
//! knowledge-graph triplet, with bounded-hop neighbor expansion and simple
//! path search.

pub mod graph;
pub mod store;

pub use graph::NamespaceGraph;
pub use store::BrandGraphStore;
