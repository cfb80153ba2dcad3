//! Optimistic mutation of cached documents.

mod engine;
mod locks;
mod state;

pub use engine::MutationEngine;
pub use locks::ScopeLocks;
pub use state::{MutationPhase, MutationStates, MutationStatus};
