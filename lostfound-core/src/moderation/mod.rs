//! Moderation state machine for items and claims.
//!
//! This module is the single source of truth for which lifecycle transition
//! is legal given an entity's current state and a requested action. The
//! design separates:
//! - **Status**: what the entity is (`ItemStatus`, `ClaimStatus`)
//! - **Actions**: what was asked for (`ItemAction`, `ClaimAction`)
//! - **Calls**: what to send to the backend (`BackendCall`)
//! - **Transition**: pure functions `(status, action) -> next status`
//!
//! Everything here is a pure computation. The console issues the produced
//! [`BackendCall`] and commits the staged local updates only once the
//! backend confirms, so a failed network call never mutates the view model.

pub mod action;
pub mod claim;
pub mod effect;
pub mod item;

pub use action::{ClaimAction, ItemAction};
pub use effect::{BackendCall, ClaimApproval, ClaimDecision, ItemDecision, VerifyAction};

use std::fmt;

use crate::model::{ClaimId, ClaimStatus, ItemId, ItemStatus};

/// Why a requested moderation transition was refused.
///
/// Illegal pairs are a normal, reportable outcome: the UI surfaces them as
/// a disabled control or a rejection message and never retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The action is not in the item transition table for this status.
    IllegalItem {
        current: ItemStatus,
        action: ItemAction,
    },
    /// The action is not in the claim transition table for this status.
    IllegalClaim {
        current: ClaimStatus,
        action: ClaimAction,
    },
    /// Claim approval found the referenced item no longer `verified`; the
    /// compound operation aborts with neither entity changed. Typically a
    /// race with another admin session against a stale snapshot.
    ItemNotVerified { item_id: ItemId, status: ItemStatus },
    /// Claim approval was handed an item that is not the claim's referent.
    WrongItem {
        claim_id: ClaimId,
        expected: ItemId,
        got: ItemId,
    },
    /// `ItemAction::Claim` was requested directly. The verified -> claimed
    /// edge is driven only by approving a claim, never by an item intent.
    CoupledAction { item_id: ItemId },
}

impl TransitionError {
    /// True for failures of a compound operation's precondition, where the
    /// right remedy is refreshing the local snapshot and re-reading state.
    pub fn is_precondition_failure(&self) -> bool {
        matches!(self, Self::ItemNotVerified { .. } | Self::WrongItem { .. })
    }
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalItem { current, action } => write!(
                f,
                "action '{}' is not valid for an item in status '{}'",
                action, current
            ),
            Self::IllegalClaim { current, action } => write!(
                f,
                "action '{}' is not valid for a claim in status '{}'",
                action, current
            ),
            Self::ItemNotVerified { item_id, status } => write!(
                f,
                "item #{} is no longer verified (currently '{}'); refresh and try again",
                item_id, status
            ),
            Self::WrongItem {
                claim_id,
                expected,
                got,
            } => write!(
                f,
                "claim #{} references item #{}, not item #{}; refresh and try again",
                claim_id, expected, got
            ),
            Self::CoupledAction { item_id } => write!(
                f,
                "item #{} can only become claimed by approving a claim against it",
                item_id
            ),
        }
    }
}

impl std::error::Error for TransitionError {}
