pub mod neighbors;

pub use neighbors::{build_neighbor_graph, Neighbor, NeighborGraph};
