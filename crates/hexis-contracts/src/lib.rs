//! Shared data contracts for the Hexis dashboard: the typed shapes read out of the
//! agent's store and served to dashboard clients. Nothing in here performs I/O.

mod action;
mod drive;
mod goals;
mod health;
mod heartbeat;
mod inbox;
pub mod lenient;
mod maintenance;
mod memory;

pub use action::*;
pub use drive::*;
pub use goals::*;
pub use health::*;
pub use heartbeat::*;
pub use inbox::*;
pub use maintenance::*;
pub use memory::*;

/// Shared error type for contract validation routines.
#[derive(thiserror::Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Invalid(&'static str),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Lightweight semantic validation performed after deserialization, before a
/// request is allowed to touch the store.
pub trait Validate {
    fn validate(&self) -> Result<(), ContractError>;
}
