//! Built-in action providers.
mod skirmish;

pub use skirmish::SkirmishProvider;
