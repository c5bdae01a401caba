//! Backend calls as data.
//!
//! A legal moderation decision produces a [`BackendCall`] describing the
//! REST request to issue, paired with the locally staged entity updates.
//! The calls are pure data - the console executes them against the real
//! API. This separation lets the transition logic be tested without any
//! HTTP in sight, and makes "commit only after the backend confirms" the
//! only way to apply a decision.

use serde::Serialize;

use crate::model::{Claim, ClaimId, Item, ItemId, ItemStatus};

/// Wire value for the item verification endpoint's `action` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyAction {
    Approve,
    Reject,
}

/// The REST call a moderation decision requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// `PUT /admin/items/{item_id}/verify` with an approve/reject action.
    VerifyItem {
        item_id: ItemId,
        action: VerifyAction,
    },
    /// `PUT /admin/items/{item_id}/status` with an explicit target status.
    UpdateItemStatus { item_id: ItemId, status: ItemStatus },
    /// `PUT /admin/claims/{claim_id}/approve`. The server moves the claim
    /// to approved and the referenced item to claimed in one handler.
    ApproveClaim { claim_id: ClaimId },
    /// `PUT /admin/claims/{claim_id}/reject`.
    RejectClaim { claim_id: ClaimId },
}

/// A validated item decision: issue `call`, then commit `staged` once the
/// backend confirms. The server-returned entity is authoritative over the
/// staged guess.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDecision {
    pub call: BackendCall,
    pub staged: Item,
}

/// A validated claim decision (rejection).
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimDecision {
    pub call: BackendCall,
    pub staged: Claim,
}

/// Atomic result of approving a claim: the claim moves to approved and the
/// referenced item to claimed as one unit. The caller commits both updates
/// or neither.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimApproval {
    pub call: BackendCall,
    pub claim: Claim,
    pub item: Item,
}
