//! Domain model and moderation state machine for the campus lost & found client.
//!
//! This crate is pure: no I/O, no HTTP, no async. The console crate layers
//! the REST client and view model on top of it.

pub mod model;
pub mod moderation;

pub use model::{
    Claim, ClaimId, ClaimStatus, InvalidStatus, Item, ItemId, ItemStatus, ItemType, UserId,
};
pub use moderation::{
    BackendCall, ClaimAction, ClaimApproval, ClaimDecision, ItemAction, ItemDecision,
    TransitionError, VerifyAction,
};
