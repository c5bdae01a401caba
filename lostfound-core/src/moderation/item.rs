//! Item lifecycle transitions.
//!
//! The transition table, per current status and action:
//!
//! | current  | action            | next     |
//! |----------|-------------------|----------|
//! | pending  | approve           | verified |
//! | pending  | reject            | rejected |
//! | verified | revert-to-pending | pending  |
//! | rejected | revert-to-pending | pending  |
//! | verified | claim             | claimed  |
//! | claimed  | mark-returned     | returned |
//!
//! Any pair not listed is illegal. The functions here are pure and have no
//! side effects.

use super::action::ItemAction;
use super::effect::{BackendCall, ItemDecision, VerifyAction};
use super::TransitionError;
use crate::model::{Item, ItemStatus};

/// Next status per the transition table, or `None` for an illegal pair.
pub fn next_status(current: ItemStatus, action: ItemAction) -> Option<ItemStatus> {
    match (current, action) {
        (ItemStatus::Pending, ItemAction::Approve) => Some(ItemStatus::Verified),
        (ItemStatus::Pending, ItemAction::Reject) => Some(ItemStatus::Rejected),
        (ItemStatus::Verified, ItemAction::RevertToPending) => Some(ItemStatus::Pending),
        (ItemStatus::Rejected, ItemAction::RevertToPending) => Some(ItemStatus::Pending),
        (ItemStatus::Verified, ItemAction::Claim) => Some(ItemStatus::Claimed),
        (ItemStatus::Claimed, ItemAction::MarkReturned) => Some(ItemStatus::Returned),
        _ => None,
    }
}

/// True iff `action` is legal from `current`. Never errors for a
/// well-formed pair; illegal is an ordinary outcome.
pub fn can_transition(current: ItemStatus, action: ItemAction) -> bool {
    next_status(current, action).is_some()
}

/// The actions legal from `current`, for annotating rendered rows with
/// which controls to enable.
pub fn enabled_actions(current: ItemStatus) -> &'static [ItemAction] {
    match current {
        ItemStatus::Pending => &[ItemAction::Approve, ItemAction::Reject],
        ItemStatus::Verified => &[ItemAction::RevertToPending, ItemAction::Claim],
        ItemStatus::Rejected => &[ItemAction::RevertToPending],
        ItemStatus::Claimed => &[ItemAction::MarkReturned],
        ItemStatus::Returned => &[],
    }
}

/// Apply `action` to `item`, returning the updated item. Only the status
/// field changes. Illegal pairs fail with `IllegalItem`.
pub fn apply(item: &Item, action: ItemAction) -> Result<Item, TransitionError> {
    let next = next_status(item.status, action).ok_or(TransitionError::IllegalItem {
        current: item.status,
        action,
    })?;

    let mut updated = item.clone();
    updated.status = next;
    Ok(updated)
}

/// Validate a direct admin intent against `item` and produce the backend
/// call plus the staged local update.
///
/// `ItemAction::Claim` is refused here even though the verified -> claimed
/// edge is in the table: that edge belongs to claim approval
/// ([`super::claim::approve`]), which stages both entities atomically.
pub fn moderate(item: &Item, action: ItemAction) -> Result<ItemDecision, TransitionError> {
    let call = match action {
        ItemAction::Approve => BackendCall::VerifyItem {
            item_id: item.item_id,
            action: VerifyAction::Approve,
        },
        ItemAction::Reject => BackendCall::VerifyItem {
            item_id: item.item_id,
            action: VerifyAction::Reject,
        },
        ItemAction::RevertToPending => BackendCall::UpdateItemStatus {
            item_id: item.item_id,
            status: ItemStatus::Pending,
        },
        ItemAction::MarkReturned => BackendCall::UpdateItemStatus {
            item_id: item.item_id,
            status: ItemStatus::Returned,
        },
        ItemAction::Claim => {
            return Err(TransitionError::CoupledAction {
                item_id: item.item_id,
            })
        }
    };

    let staged = apply(item, action)?;
    Ok(ItemDecision { call, staged })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{ItemId, ItemType, UserId};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    pub(crate) fn test_item(status: ItemStatus) -> Item {
        let noon = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Item {
            item_id: ItemId(7),
            title: "Black backpack".to_string(),
            description: "Left in the library".to_string(),
            category: "accessories".to_string(),
            item_type: ItemType::Found,
            photo_path: Some("uploads/bag.jpg".to_string()),
            status,
            date: noon,
            location: "Main library".to_string(),
            user_id: UserId(3),
            created_at: noon,
        }
    }

    #[test]
    fn every_table_edge_produces_the_specified_next_status() {
        let edges = [
            (ItemStatus::Pending, ItemAction::Approve, ItemStatus::Verified),
            (ItemStatus::Pending, ItemAction::Reject, ItemStatus::Rejected),
            (
                ItemStatus::Verified,
                ItemAction::RevertToPending,
                ItemStatus::Pending,
            ),
            (
                ItemStatus::Rejected,
                ItemAction::RevertToPending,
                ItemStatus::Pending,
            ),
            (ItemStatus::Verified, ItemAction::Claim, ItemStatus::Claimed),
            (
                ItemStatus::Claimed,
                ItemAction::MarkReturned,
                ItemStatus::Returned,
            ),
        ];

        for (current, action, next) in edges {
            assert!(can_transition(current, action), "{current} --{action}");
            assert_eq!(next_status(current, action), Some(next));
            let updated = apply(&test_item(current), action).unwrap();
            assert_eq!(updated.status, next);
        }
    }

    #[test]
    fn pairs_outside_the_table_are_illegal() {
        // Spot checks called out in the design; the exhaustive sweep below
        // covers the rest.
        assert!(!can_transition(ItemStatus::Pending, ItemAction::Claim));
        assert!(!can_transition(
            ItemStatus::Verified,
            ItemAction::MarkReturned
        ));
        assert!(!can_transition(ItemStatus::Returned, ItemAction::RevertToPending));
        // An already-resolved status cannot take the same action twice.
        assert!(!can_transition(ItemStatus::Verified, ItemAction::Approve));

        let err = apply(&test_item(ItemStatus::Pending), ItemAction::MarkReturned).unwrap_err();
        assert_eq!(
            err,
            TransitionError::IllegalItem {
                current: ItemStatus::Pending,
                action: ItemAction::MarkReturned,
            }
        );
    }

    #[test]
    fn enabled_actions_agree_with_the_table_for_all_pairs() {
        for status in ItemStatus::ALL {
            for action in ItemAction::ALL {
                assert_eq!(
                    enabled_actions(status).contains(&action),
                    can_transition(status, action),
                    "disagreement at ({status}, {action})"
                );
            }
        }
    }

    #[test]
    fn revert_round_trip_restores_pending_and_clears_verification() {
        let pending = test_item(ItemStatus::Pending);
        let verified = apply(&pending, ItemAction::Approve).unwrap();
        assert!(verified.is_verified());

        let reverted = apply(&verified, ItemAction::RevertToPending).unwrap();
        assert_eq!(reverted, pending);
        assert!(!reverted.is_verified());
    }

    #[test]
    fn rejected_items_can_be_re_reviewed() {
        let pending = test_item(ItemStatus::Pending);
        let rejected = apply(&pending, ItemAction::Reject).unwrap();
        let re_reviewed = apply(&rejected, ItemAction::RevertToPending).unwrap();
        assert_eq!(re_reviewed.status, ItemStatus::Pending);
    }

    #[test]
    fn moderate_maps_actions_to_the_right_backend_calls() {
        let pending = test_item(ItemStatus::Pending);
        let decision = moderate(&pending, ItemAction::Approve).unwrap();
        assert_eq!(
            decision.call,
            BackendCall::VerifyItem {
                item_id: ItemId(7),
                action: VerifyAction::Approve,
            }
        );
        assert_eq!(decision.staged.status, ItemStatus::Verified);

        let decision = moderate(&pending, ItemAction::Reject).unwrap();
        assert_eq!(
            decision.call,
            BackendCall::VerifyItem {
                item_id: ItemId(7),
                action: VerifyAction::Reject,
            }
        );

        let rejected = test_item(ItemStatus::Rejected);
        let decision = moderate(&rejected, ItemAction::RevertToPending).unwrap();
        assert_eq!(
            decision.call,
            BackendCall::UpdateItemStatus {
                item_id: ItemId(7),
                status: ItemStatus::Pending,
            }
        );

        let claimed = test_item(ItemStatus::Claimed);
        let decision = moderate(&claimed, ItemAction::MarkReturned).unwrap();
        assert_eq!(
            decision.call,
            BackendCall::UpdateItemStatus {
                item_id: ItemId(7),
                status: ItemStatus::Returned,
            }
        );
    }

    #[test]
    fn moderate_refuses_direct_claim_even_from_verified() {
        let verified = test_item(ItemStatus::Verified);
        // Legal in the table, but only reachable through claim approval.
        assert!(can_transition(ItemStatus::Verified, ItemAction::Claim));
        assert_eq!(
            moderate(&verified, ItemAction::Claim).unwrap_err(),
            TransitionError::CoupledAction {
                item_id: ItemId(7)
            }
        );
    }

    #[test]
    fn moderate_propagates_illegal_transitions() {
        let returned = test_item(ItemStatus::Returned);
        assert_eq!(
            moderate(&returned, ItemAction::Approve).unwrap_err(),
            TransitionError::IllegalItem {
                current: ItemStatus::Returned,
                action: ItemAction::Approve,
            }
        );
    }

    fn arb_status() -> impl Strategy<Value = ItemStatus> {
        prop::sample::select(ItemStatus::ALL.to_vec())
    }

    fn arb_action() -> impl Strategy<Value = ItemAction> {
        prop::sample::select(ItemAction::ALL.to_vec())
    }

    proptest! {
        /// For every pair outside the table, can_transition is false and
        /// apply fails with exactly the illegal-transition error.
        #[test]
        fn illegal_pairs_never_transition(status in arb_status(), action in arb_action()) {
            if next_status(status, action).is_none() {
                prop_assert!(!can_transition(status, action));
                let err = apply(&test_item(status), action).unwrap_err();
                prop_assert_eq!(err, TransitionError::IllegalItem { current: status, action });
            }
        }

        /// A successful apply changes the status field and nothing else.
        #[test]
        fn apply_mutates_only_the_status(
            status in arb_status(),
            action in arb_action(),
            title in ".{0,40}",
            location in ".{0,40}",
            item_id in 1u64..10_000,
            user_id in 1u64..10_000,
        ) {
            let mut item = test_item(status);
            item.item_id = crate::model::ItemId(item_id);
            item.user_id = crate::model::UserId(user_id);
            item.title = title;
            item.location = location;

            if let Ok(updated) = apply(&item, action) {
                prop_assert_eq!(Some(updated.status), next_status(status, action));
                let mut expected = item.clone();
                expected.status = updated.status;
                prop_assert_eq!(updated, expected);
            }
        }
    }
}
