//! Grid pathfinding: reachability for ranges and shortest paths for movement.
mod mesh;
mod node;

use crate::state::Position;

pub use mesh::NavMesh;
pub use node::{FrontierEdge, Path, SearchNode};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("search source {position} is not part of the tile graph")]
    UnknownSource { position: Position },
}
