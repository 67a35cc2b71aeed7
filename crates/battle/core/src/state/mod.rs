//! Plain value types shared by every core module.
mod common;

pub use common::{Position, TeamId, Tick, UnitId};
