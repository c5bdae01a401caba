//! Entity model for lost & found items and claims.
//!
//! Statuses are closed enums so that illegal states are unrepresentable and
//! the transition tables in [`crate::moderation`] can be matched
//! exhaustively. Unknown status strings coming off the wire fail at decode
//! time with [`InvalidStatus`] rather than leaking into the state machine.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Newtype for server-assigned item IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Newtype for server-assigned claim IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimId(pub u64);

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ClaimId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Newtype for user IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Whether an item was lost or found by its reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Lost,
    Found,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Found => "found",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lost" => Ok(Self::Lost),
            "found" => Ok(Self::Found),
            other => Err(InvalidStatus {
                entity: "item type",
                value: other.to_string(),
            }),
        }
    }
}

/// An unknown string was encountered where a closed enum was expected.
/// This is a decode/programmer error, not a moderation outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStatus {
    pub entity: &'static str,
    pub value: String,
}

impl fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} {:?}", self.entity, self.value)
    }
}

impl std::error::Error for InvalidStatus {}

/// Lifecycle state of an item. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Reported, awaiting admin review.
    Pending,
    /// Approved by an admin; visible in the public listing and claimable.
    Verified,
    /// Rejected by an admin; can be sent back for re-review.
    Rejected,
    /// A claim against the item was approved.
    Claimed,
    /// Handed back to the owner. Terminal.
    Returned,
}

impl ItemStatus {
    /// All statuses, for exhaustive table checks in tests.
    pub const ALL: [ItemStatus; 5] = [
        Self::Pending,
        Self::Verified,
        Self::Rejected,
        Self::Claimed,
        Self::Returned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Claimed => "claimed",
            Self::Returned => "returned",
        }
    }

    /// Derived verification flag: true iff the item passed admin review at
    /// some point (verified, claimed, or returned).
    ///
    /// The backend stores this as a separate column; here it is always
    /// computed from the status so the two can never disagree.
    pub fn is_verified(self) -> bool {
        matches!(self, Self::Verified | Self::Claimed | Self::Returned)
    }

    /// Terminal statuses are not revisited except via explicit re-review
    /// (`rejected`) or not at all (`returned`).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Returned)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            "claimed" => Ok(Self::Claimed),
            "returned" => Ok(Self::Returned),
            other => Err(InvalidStatus {
                entity: "item status",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle state of a claim. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    /// Submitted, awaiting admin review.
    Pending,
    /// Approved; the referenced item moved to `claimed` in the same step.
    Approved,
    /// Rejected by an admin. Terminal.
    Rejected,
}

impl ClaimStatus {
    /// All statuses, for exhaustive table checks in tests.
    pub const ALL: [ClaimStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// A settled claim has been decided either way and takes no further
    /// moderation actions.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(InvalidStatus {
                entity: "claim status",
                value: other.to_string(),
            }),
        }
    }
}

/// A reported lost or found item as the backend serves it.
///
/// The wire format also carries an `is_verified` column; it is ignored on
/// decode and recomputed from `status` via [`Item::is_verified`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub item_type: ItemType,
    #[serde(default)]
    pub photo_path: Option<String>,
    pub status: ItemStatus,
    /// When the item was lost/found, per the reporter.
    pub date: NaiveDateTime,
    pub location: String,
    /// The reporting user. Admins moderate but never own.
    pub user_id: UserId,
    pub created_at: NaiveDateTime,
}

impl Item {
    pub fn is_verified(&self) -> bool {
        self.status.is_verified()
    }
}

/// A claim a user has submitted against an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: ClaimId,
    pub item_id: ItemId,
    pub user_id: UserId,
    pub claim_date: NaiveDateTime,
    pub status: ClaimStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}
