//! Moderation actions: the fixed vocabulary of things an admin (or the
//! claim-approval coupling) can ask for.

use std::fmt;

/// Actions against an item's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemAction {
    /// Verify a pending item, making it publicly listed and claimable.
    Approve,
    /// Reject a pending item.
    Reject,
    /// Send a verified or rejected item back for re-review.
    RevertToPending,
    /// Move a verified item to claimed. Only ever triggered by approving a
    /// claim against the item, never issued directly.
    Claim,
    /// Close out a claimed item once it is handed back to the owner.
    MarkReturned,
}

impl ItemAction {
    /// All actions, for exhaustive table checks in tests.
    pub const ALL: [ItemAction; 5] = [
        Self::Approve,
        Self::Reject,
        Self::RevertToPending,
        Self::Claim,
        Self::MarkReturned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::RevertToPending => "revert-to-pending",
            Self::Claim => "claim",
            Self::MarkReturned => "mark-returned",
        }
    }
}

impl fmt::Display for ItemAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions against a claim's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimAction {
    /// Approve the claim, which also moves the referenced item to claimed.
    Approve,
    /// Reject the claim; the item stays verified and claimable by others.
    Reject,
}

impl ClaimAction {
    /// All actions, for exhaustive table checks in tests.
    pub const ALL: [ClaimAction; 2] = [Self::Approve, Self::Reject];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for ClaimAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
