//! Claim lifecycle transitions, including the compound approval that
//! couples a claim to its referenced item.
//!
//! The transition table:
//!
//! | current | action  | next     |
//! |---------|---------|----------|
//! | pending | approve | approved |
//! | pending | reject  | rejected |
//!
//! Approving a claim additionally moves the referenced item from
//! `verified` to `claimed`. That is the only trigger for the item's
//! `claim` edge, and the two updates commit together or not at all. Because
//! an approved claim leaves its item in `claimed` (no longer `verified`),
//! at most one claim per item can ever reach `approved`; later approvals
//! fail the precondition.

use super::action::{ClaimAction, ItemAction};
use super::effect::{BackendCall, ClaimApproval, ClaimDecision};
use super::{item, TransitionError};
use crate::model::{Claim, ClaimStatus, Item, ItemStatus};

/// Next status per the transition table, or `None` for an illegal pair.
pub fn next_status(current: ClaimStatus, action: ClaimAction) -> Option<ClaimStatus> {
    match (current, action) {
        (ClaimStatus::Pending, ClaimAction::Approve) => Some(ClaimStatus::Approved),
        (ClaimStatus::Pending, ClaimAction::Reject) => Some(ClaimStatus::Rejected),
        _ => None,
    }
}

/// True iff `action` is legal from `current`.
pub fn can_transition(current: ClaimStatus, action: ClaimAction) -> bool {
    next_status(current, action).is_some()
}

/// The actions legal from `current`, for control gating.
pub fn enabled_actions(current: ClaimStatus) -> &'static [ClaimAction] {
    match current {
        ClaimStatus::Pending => &[ClaimAction::Approve, ClaimAction::Reject],
        ClaimStatus::Approved | ClaimStatus::Rejected => &[],
    }
}

/// Apply `action` to the claim alone. The item coupling lives in
/// [`approve`]; this is the bare table lookup.
pub fn apply(claim: &Claim, action: ClaimAction) -> Result<Claim, TransitionError> {
    let next = next_status(claim.status, action).ok_or(TransitionError::IllegalClaim {
        current: claim.status,
        action,
    })?;

    let mut updated = claim.clone();
    updated.status = next;
    Ok(updated)
}

/// Validate approving `claim` against its referenced `item` and stage both
/// updates atomically.
///
/// Preconditions, checked before anything is staged:
/// - `item` must be the claim's referent;
/// - the claim must be `pending`;
/// - the item must currently be `verified`.
///
/// A non-verified item is a `PreconditionFailed`-class outcome
/// ([`TransitionError::ItemNotVerified`]): typically the snapshot went
/// stale under a concurrent admin decision, and the fix is to refresh.
pub fn approve(claim: &Claim, item: &Item) -> Result<ClaimApproval, TransitionError> {
    if item.item_id != claim.item_id {
        return Err(TransitionError::WrongItem {
            claim_id: claim.claim_id,
            expected: claim.item_id,
            got: item.item_id,
        });
    }

    let updated_claim = apply(claim, ClaimAction::Approve)?;

    if item.status != ItemStatus::Verified {
        return Err(TransitionError::ItemNotVerified {
            item_id: item.item_id,
            status: item.status,
        });
    }
    let updated_item = item::apply(item, ItemAction::Claim)?;

    Ok(ClaimApproval {
        call: BackendCall::ApproveClaim {
            claim_id: claim.claim_id,
        },
        claim: updated_claim,
        item: updated_item,
    })
}

/// Validate rejecting `claim`. No item coupling: the item stays verified
/// and remains claimable by others.
pub fn reject(claim: &Claim) -> Result<ClaimDecision, TransitionError> {
    let staged = apply(claim, ClaimAction::Reject)?;
    Ok(ClaimDecision {
        call: BackendCall::RejectClaim {
            claim_id: claim.claim_id,
        },
        staged,
    })
}
