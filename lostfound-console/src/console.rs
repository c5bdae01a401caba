//! Admin moderation console view model.
//!
//! Tab-scoped store over the admin dashboard: pending items, verified
//! items, pending claims, claimed items, rejected items. Dispatching an
//! action runs the pure state machine first, issues the resulting backend
//! call through the [`ModerationBackend`] seam, and commits to the local
//! model only once the server confirms - the server-returned entity is
//! authoritative over the locally staged guess. Failed calls leave the
//! model untouched.
//!
//! One request per entity may be in flight at a time; overlapping
//! dispatches are refused so a double-clicked control cannot race itself.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use lostfound_core::model::{Claim, ClaimId, Item, ItemId, ItemStatus};
use lostfound_core::moderation::{
    claim as claim_machine, item as item_machine, BackendCall, ClaimAction, ItemAction,
    TransitionError, VerifyAction,
};

use crate::api::{AdminClaim, ApiClient, ApiError, ItemQuery};
use crate::session::Session;

/// The admin dashboard tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Pending,
    Verified,
    Claims,
    Claimed,
    Rejected,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Self::Pending,
        Self::Verified,
        Self::Claims,
        Self::Claimed,
        Self::Rejected,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending items",
            Self::Verified => "verified items",
            Self::Claims => "pending claims",
            Self::Claimed => "claimed items",
            Self::Rejected => "rejected items",
        }
    }

    /// The item status this tab shows, or `None` for the claims tab.
    fn item_status(self) -> Option<ItemStatus> {
        match self {
            Self::Pending => Some(ItemStatus::Pending),
            Self::Verified => Some(ItemStatus::Verified),
            Self::Claimed => Some(ItemStatus::Claimed),
            Self::Rejected => Some(ItemStatus::Rejected),
            Self::Claims => None,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Key for the in-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Item(ItemId),
    Claim(ClaimId),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(id) => write!(f, "item #{}", id),
            Self::Claim(id) => write!(f, "claim #{}", id),
        }
    }
}

/// Canonical entity the server confirmed for an executed call.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmed {
    Item(Item),
    Claim(Claim),
}

impl Confirmed {
    fn into_item(self) -> Result<Item, ApiError> {
        match self {
            Self::Item(item) => Ok(item),
            Self::Claim(_) => Err(ApiError::Decode(
                "server confirmed a claim for an item call".to_string(),
            )),
        }
    }

    fn into_claim(self) -> Result<Claim, ApiError> {
        match self {
            Self::Claim(claim) => Ok(claim),
            Self::Item(_) => Err(ApiError::Decode(
                "server confirmed an item for a claim call".to_string(),
            )),
        }
    }
}

/// Backend operations the console needs. Implemented over REST by
/// [`RestBackend`], and by an in-memory fake in tests.
#[async_trait]
pub trait ModerationBackend: Send + Sync {
    async fn pending_items(&self) -> Result<Vec<Item>, ApiError>;

    /// The public item listing, used for the verified/claimed/rejected
    /// tabs, which filter it by status client-side.
    async fn listed_items(&self) -> Result<Vec<Item>, ApiError>;

    async fn pending_claims(&self) -> Result<Vec<AdminClaim>, ApiError>;

    /// Execute a moderation call, returning the canonical entity state
    /// confirmed by the server.
    async fn execute(&self, call: &BackendCall) -> Result<Confirmed, ApiError>;
}

/// REST-backed implementation carrying the admin's bearer token.
pub struct RestBackend {
    api: ApiClient,
    token: String,
}

impl RestBackend {
    pub fn new(api: ApiClient, session: &Session) -> Self {
        Self {
            api,
            token: session.token.clone(),
        }
    }
}

#[async_trait]
impl ModerationBackend for RestBackend {
    async fn pending_items(&self) -> Result<Vec<Item>, ApiError> {
        Ok(self.api.pending_items(&self.token).await?.items)
    }

    async fn listed_items(&self) -> Result<Vec<Item>, ApiError> {
        let mut query = ItemQuery {
            per_page: Some(100),
            ..ItemQuery::default()
        };
        let mut items = Vec::new();
        loop {
            let page = self.api.list_items(&query).await?;
            let next = page.next_page();
            items.extend(page.items);
            match next {
                Some(next) => query.page = Some(next),
                None => break,
            }
        }
        Ok(items)
    }

    async fn pending_claims(&self) -> Result<Vec<AdminClaim>, ApiError> {
        Ok(self.api.pending_claims(&self.token).await?.claims)
    }

    async fn execute(&self, call: &BackendCall) -> Result<Confirmed, ApiError> {
        match call {
            BackendCall::VerifyItem { item_id, action } => Ok(Confirmed::Item(
                self.api.verify_item(&self.token, *item_id, *action).await?.item,
            )),
            BackendCall::UpdateItemStatus { item_id, status } => Ok(Confirmed::Item(
                self.api
                    .update_item_status(&self.token, *item_id, *status)
                    .await?
                    .item,
            )),
            BackendCall::ApproveClaim { claim_id } => Ok(Confirmed::Claim(
                self.api.approve_claim(&self.token, *claim_id).await?.claim,
            )),
            BackendCall::RejectClaim { claim_id } => Ok(Confirmed::Claim(
                self.api.reject_claim(&self.token, *claim_id).await?.claim,
            )),
        }
    }
}

/// Why a dispatched action did not go through.
#[derive(Debug)]
pub enum DispatchError {
    /// The entity is not in the currently loaded tab.
    UnknownItem(ItemId),
    UnknownClaim(ClaimId),
    /// A request for this entity is already in flight.
    InFlight(EntityKey),
    /// The state machine refused the action.
    Transition(TransitionError),
    /// The backend call failed; nothing was committed locally.
    Api(ApiError),
    /// The claim carries no embedded item snapshot to check the approval
    /// precondition against.
    MissingItemSnapshot(ClaimId),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownItem(id) => {
                write!(f, "item #{} is not in the current view; reload the tab", id)
            }
            Self::UnknownClaim(id) => {
                write!(f, "claim #{} is not in the current view; reload the tab", id)
            }
            Self::InFlight(key) => write!(f, "a request for {} is still in flight", key),
            Self::Transition(err) => err.fmt(f),
            Self::Api(err) => err.fmt(f),
            Self::MissingItemSnapshot(id) => write!(
                f,
                "claim #{} has no item details attached; reload the claims tab",
                id
            ),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transition(err) => Some(err),
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransitionError> for DispatchError {
    fn from(err: TransitionError) -> Self {
        Self::Transition(err)
    }
}

impl From<ApiError> for DispatchError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

#[derive(Debug)]
struct ConsoleState {
    tab: Tab,
    items: Vec<Item>,
    claims: Vec<AdminClaim>,
}

impl ConsoleState {
    /// Fold a confirmed item into the current tab: replace it in place if
    /// it still belongs here, drop it if its new status moved it to
    /// another tab.
    fn commit_item(&mut self, item: Item) {
        let belongs = self.tab.item_status() == Some(item.status);
        if let Some(pos) = self.items.iter().position(|i| i.item_id == item.item_id) {
            if belongs {
                self.items[pos] = item;
            } else {
                self.items.remove(pos);
            }
        } else if belongs {
            self.items.push(item);
        }
    }

    /// A settled claim leaves the pending-claims tab.
    fn commit_claim_resolution(&mut self, claim_id: ClaimId) {
        self.claims.retain(|c| c.claim.claim_id != claim_id);
    }

    /// Keep embedded item snapshots in remaining claims consistent with a
    /// committed item update, so a rival claim against a freshly claimed
    /// item is refused locally instead of round-tripping.
    fn refresh_claim_items(&mut self, item: &Item) {
        for claim in &mut self.claims {
            if let Some(embedded) = &mut claim.item {
                if embedded.item_id == item.item_id {
                    *embedded = item.clone();
                }
            }
        }
    }
}

/// A read-only copy of the console's current contents, annotated for
/// rendering.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tab: Tab,
    pub items: Vec<Item>,
    pub claims: Vec<AdminClaim>,
}

impl Snapshot {
    /// Items with the controls to enable for each, per the transition
    /// tables.
    pub fn item_rows(&self) -> impl Iterator<Item = (&Item, &'static [ItemAction])> {
        self.items
            .iter()
            .map(|item| (item, item_machine::enabled_actions(item.status)))
    }

    /// Claims with the controls to enable for each.
    pub fn claim_rows(&self) -> impl Iterator<Item = (&AdminClaim, &'static [ClaimAction])> {
        self.claims
            .iter()
            .map(|claim| (claim, claim_machine::enabled_actions(claim.claim.status)))
    }
}

pub struct ModerationConsole<B> {
    backend: B,
    state: RwLock<ConsoleState>,
    in_flight: Mutex<HashSet<EntityKey>>,
}

impl<B: ModerationBackend> ModerationConsole<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: RwLock::new(ConsoleState {
                tab: Tab::Pending,
                items: Vec::new(),
                claims: Vec::new(),
            }),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Switch to `tab` and replace its contents wholesale from the
    /// backend.
    pub async fn load(&self, tab: Tab) -> Result<(), ApiError> {
        match tab {
            Tab::Pending => {
                let items = self.backend.pending_items().await?;
                let mut state = self.state.write().await;
                state.tab = tab;
                state.items = items;
            }
            Tab::Claims => {
                let claims = self.backend.pending_claims().await?;
                let mut state = self.state.write().await;
                state.tab = tab;
                state.claims = claims;
            }
            Tab::Verified | Tab::Claimed | Tab::Rejected => {
                let listed = self.backend.listed_items().await?;
                let mut state = self.state.write().await;
                state.tab = tab;
                state.items = listed
                    .into_iter()
                    .filter(|item| Some(item.status) == tab.item_status())
                    .collect();
            }
        }
        info!("loaded {}", tab);
        Ok(())
    }

    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.read().await;
        Snapshot {
            tab: state.tab,
            items: state.items.clone(),
            claims: state.claims.clone(),
        }
    }

    /// Dispatch a direct item moderation action.
    ///
    /// Returns the canonical item the server confirmed, already folded
    /// into the local model.
    pub async fn moderate_item(
        &self,
        item_id: ItemId,
        action: ItemAction,
    ) -> Result<Item, DispatchError> {
        let decision = {
            let state = self.state.read().await;
            let item = state
                .items
                .iter()
                .find(|i| i.item_id == item_id)
                .ok_or(DispatchError::UnknownItem(item_id))?;
            item_machine::moderate(item, action)?
        };

        let key = EntityKey::Item(item_id);
        self.begin(key).await?;
        let result = self.backend.execute(&decision.call).await;
        self.finish(key).await;

        let confirmed = result?.into_item()?;
        let mut state = self.state.write().await;
        state.commit_item(confirmed.clone());
        state.refresh_claim_items(&confirmed);
        info!("item #{}: '{}' applied", item_id, action);
        Ok(confirmed)
    }

    /// Approve a claim: one backend call, two coupled local updates.
    ///
    /// The claim comes back canonical from the server; the coupled item
    /// update is the staged transition, which the next tab reload makes
    /// canonical as well.
    pub async fn approve_claim(
        &self,
        claim_id: ClaimId,
    ) -> Result<(Claim, Item), DispatchError> {
        let approval = {
            let state = self.state.read().await;
            let admin_claim = state
                .claims
                .iter()
                .find(|c| c.claim.claim_id == claim_id)
                .ok_or(DispatchError::UnknownClaim(claim_id))?;
            let item = admin_claim
                .item
                .as_ref()
                .ok_or(DispatchError::MissingItemSnapshot(claim_id))?;
            claim_machine::approve(&admin_claim.claim, item)?
        };

        let key = EntityKey::Claim(claim_id);
        self.begin(key).await?;
        let result = self.backend.execute(&approval.call).await;
        self.finish(key).await;

        let confirmed_claim = result?.into_claim()?;
        let mut state = self.state.write().await;
        state.commit_claim_resolution(claim_id);
        state.commit_item(approval.item.clone());
        state.refresh_claim_items(&approval.item);
        info!(
            "claim #{} approved; item #{} now claimed",
            claim_id, approval.item.item_id
        );
        Ok((confirmed_claim, approval.item))
    }

    /// Reject a claim. The referenced item is untouched.
    pub async fn reject_claim(&self, claim_id: ClaimId) -> Result<Claim, DispatchError> {
        let decision = {
            let state = self.state.read().await;
            let admin_claim = state
                .claims
                .iter()
                .find(|c| c.claim.claim_id == claim_id)
                .ok_or(DispatchError::UnknownClaim(claim_id))?;
            claim_machine::reject(&admin_claim.claim)?
        };

        let key = EntityKey::Claim(claim_id);
        self.begin(key).await?;
        let result = self.backend.execute(&decision.call).await;
        self.finish(key).await;

        let confirmed = result?.into_claim()?;
        let mut state = self.state.write().await;
        state.commit_claim_resolution(claim_id);
        info!("claim #{} rejected", claim_id);
        Ok(confirmed)
    }

    async fn begin(&self, key: EntityKey) -> Result<(), DispatchError> {
        let mut in_flight = self.in_flight.lock().await;
        if !in_flight.insert(key) {
            warn!("refusing overlapping request for {}", key);
            return Err(DispatchError::InFlight(key));
        }
        Ok(())
    }

    async fn finish(&self, key: EntityKey) {
        let mut in_flight = self.in_flight.lock().await;
        in_flight.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Profile, Role};
    use chrono::NaiveDate;
    use lostfound_core::model::{ClaimStatus, ItemType, UserId};
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    fn test_item(id: u64, status: ItemStatus) -> Item {
        let noon = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Item {
            item_id: ItemId(id),
            title: format!("item {}", id),
            description: "desc".to_string(),
            category: "others".to_string(),
            item_type: ItemType::Found,
            photo_path: None,
            status,
            date: noon,
            location: "cafeteria".to_string(),
            user_id: UserId(3),
            created_at: noon,
        }
    }

    fn test_claim(id: u64, item_id: u64) -> Claim {
        let ten = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        Claim {
            claim_id: ClaimId(id),
            item_id: ItemId(item_id),
            user_id: UserId(9),
            claim_date: ten,
            status: ClaimStatus::Pending,
            notes: None,
            created_at: ten,
        }
    }

    fn claimer() -> Profile {
        Profile {
            user_id: UserId(9),
            name: "Grace".to_string(),
            email: "grace@campus.example".to_string(),
            role: Role::User,
        }
    }

    /// In-memory stand-in for the REST backend. Mirrors the real server's
    /// handlers: moderation calls set statuses unconditionally and return
    /// the resulting rows.
    struct FakeBackend {
        items: Mutex<Vec<Item>>,
        claims: Mutex<Vec<Claim>>,
        calls: Mutex<Vec<BackendCall>>,
        fail: Mutex<bool>,
        gate: Option<Arc<Semaphore>>,
    }

    impl FakeBackend {
        fn new(items: Vec<Item>, claims: Vec<Claim>) -> Self {
            Self {
                items: Mutex::new(items),
                claims: Mutex::new(claims),
                calls: Mutex::new(Vec::new()),
                fail: Mutex::new(false),
                gate: None,
            }
        }

        fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        async fn set_fail(&self, fail: bool) {
            *self.fail.lock().await = fail;
        }

        async fn calls(&self) -> Vec<BackendCall> {
            self.calls.lock().await.clone()
        }

        async fn set_item_status(&self, item_id: ItemId, status: ItemStatus) -> Item {
            let mut items = self.items.lock().await;
            let item = items
                .iter_mut()
                .find(|i| i.item_id == item_id)
                .expect("fake backend: unknown item");
            item.status = status;
            item.clone()
        }
    }

    #[async_trait]
    impl ModerationBackend for FakeBackend {
        async fn pending_items(&self) -> Result<Vec<Item>, ApiError> {
            let items = self.items.lock().await;
            Ok(items
                .iter()
                .filter(|i| i.status == ItemStatus::Pending)
                .cloned()
                .collect())
        }

        async fn listed_items(&self) -> Result<Vec<Item>, ApiError> {
            Ok(self.items.lock().await.clone())
        }

        async fn pending_claims(&self) -> Result<Vec<AdminClaim>, ApiError> {
            let claims = self.claims.lock().await;
            let items = self.items.lock().await;
            Ok(claims
                .iter()
                .filter(|c| c.status == ClaimStatus::Pending)
                .map(|c| AdminClaim {
                    claim: c.clone(),
                    item: items.iter().find(|i| i.item_id == c.item_id).cloned(),
                    claimer: Some(claimer()),
                    item_reporter: None,
                })
                .collect())
        }

        async fn execute(&self, call: &BackendCall) -> Result<Confirmed, ApiError> {
            if let Some(gate) = &self.gate {
                let permit = gate.acquire().await.expect("gate closed");
                permit.forget();
            }
            if *self.fail.lock().await {
                return Err(ApiError::Backend {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    message: "database error".to_string(),
                });
            }
            self.calls.lock().await.push(call.clone());

            match call {
                BackendCall::VerifyItem { item_id, action } => {
                    let status = match action {
                        VerifyAction::Approve => ItemStatus::Verified,
                        VerifyAction::Reject => ItemStatus::Rejected,
                    };
                    Ok(Confirmed::Item(self.set_item_status(*item_id, status).await))
                }
                BackendCall::UpdateItemStatus { item_id, status } => {
                    Ok(Confirmed::Item(self.set_item_status(*item_id, *status).await))
                }
                BackendCall::ApproveClaim { claim_id } => {
                    let mut claims = self.claims.lock().await;
                    let claim = claims
                        .iter_mut()
                        .find(|c| c.claim_id == *claim_id)
                        .expect("fake backend: unknown claim");
                    claim.status = ClaimStatus::Approved;
                    let claim = claim.clone();
                    drop(claims);
                    self.set_item_status(claim.item_id, ItemStatus::Claimed).await;
                    Ok(Confirmed::Claim(claim))
                }
                BackendCall::RejectClaim { claim_id } => {
                    let mut claims = self.claims.lock().await;
                    let claim = claims
                        .iter_mut()
                        .find(|c| c.claim_id == *claim_id)
                        .expect("fake backend: unknown claim");
                    claim.status = ClaimStatus::Rejected;
                    Ok(Confirmed::Claim(claim.clone()))
                }
            }
        }
    }

    #[tokio::test]
    async fn load_replaces_tab_contents_wholesale() {
        let backend = FakeBackend::new(
            vec![
                test_item(1, ItemStatus::Pending),
                test_item(2, ItemStatus::Verified),
                test_item(3, ItemStatus::Claimed),
            ],
            vec![test_claim(10, 2)],
        );
        let console = ModerationConsole::new(backend);

        console.load(Tab::Pending).await.unwrap();
        let snapshot = console.snapshot().await;
        assert_eq!(snapshot.tab, Tab::Pending);
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].item_id, ItemId(1));

        console.load(Tab::Claimed).await.unwrap();
        let snapshot = console.snapshot().await;
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].item_id, ItemId(3));

        console.load(Tab::Claims).await.unwrap();
        let snapshot = console.snapshot().await;
        assert_eq!(snapshot.claims.len(), 1);
        assert_eq!(snapshot.claims[0].claim.claim_id, ClaimId(10));
    }

    #[tokio::test]
    async fn approving_a_pending_item_commits_and_leaves_the_tab() {
        let console = ModerationConsole::new(FakeBackend::new(
            vec![test_item(1, ItemStatus::Pending)],
            vec![],
        ));
        console.load(Tab::Pending).await.unwrap();

        let confirmed = console
            .moderate_item(ItemId(1), ItemAction::Approve)
            .await
            .unwrap();
        assert_eq!(confirmed.status, ItemStatus::Verified);

        // Verified items do not belong on the pending tab.
        let snapshot = console.snapshot().await;
        assert!(snapshot.items.is_empty());
    }

    #[tokio::test]
    async fn illegal_action_is_refused_before_any_backend_call() {
        let console = ModerationConsole::new(FakeBackend::new(
            vec![test_item(1, ItemStatus::Pending)],
            vec![],
        ));
        console.load(Tab::Pending).await.unwrap();

        let err = console
            .moderate_item(ItemId(1), ItemAction::MarkReturned)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Transition(TransitionError::IllegalItem { .. })
        ));
        assert!(console.backend.calls().await.is_empty());

        let err = console
            .moderate_item(ItemId(99), ItemAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownItem(ItemId(99))));
    }

    #[tokio::test]
    async fn backend_failure_commits_nothing() {
        let console = ModerationConsole::new(FakeBackend::new(
            vec![test_item(1, ItemStatus::Pending)],
            vec![],
        ));
        console.load(Tab::Pending).await.unwrap();
        console.backend.set_fail(true).await;

        let err = console
            .moderate_item(ItemId(1), ItemAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Api(ApiError::Backend { .. })));

        // Local model untouched, and the entity is no longer in flight.
        let snapshot = console.snapshot().await;
        assert_eq!(snapshot.items[0].status, ItemStatus::Pending);

        console.backend.set_fail(false).await;
        let confirmed = console
            .moderate_item(ItemId(1), ItemAction::Approve)
            .await
            .unwrap();
        assert_eq!(confirmed.status, ItemStatus::Verified);
    }

    #[tokio::test]
    async fn claim_approval_commits_both_updates_together() {
        let console = ModerationConsole::new(FakeBackend::new(
            vec![test_item(7, ItemStatus::Verified)],
            vec![test_claim(12, 7), test_claim(13, 7)],
        ));
        console.load(Tab::Claims).await.unwrap();

        let (claim, item) = console.approve_claim(ClaimId(12)).await.unwrap();
        assert_eq!(claim.status, ClaimStatus::Approved);
        assert_eq!(item.status, ItemStatus::Claimed);

        // The settled claim left the tab; the rival claim's embedded item
        // snapshot was refreshed to claimed.
        let snapshot = console.snapshot().await;
        assert_eq!(snapshot.claims.len(), 1);
        let rival = &snapshot.claims[0];
        assert_eq!(rival.claim.claim_id, ClaimId(13));
        assert_eq!(rival.item.as_ref().map(|i| i.status), Some(ItemStatus::Claimed));

        // Approving the rival now fails the precondition locally, without
        // reaching the backend again.
        let calls_before = console.backend.calls().await.len();
        let err = console.approve_claim(ClaimId(13)).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Transition(TransitionError::ItemNotVerified {
                item_id: ItemId(7),
                status: ItemStatus::Claimed,
            })
        ));
        assert_eq!(console.backend.calls().await.len(), calls_before);
    }

    #[tokio::test]
    async fn claim_rejection_leaves_the_item_alone() {
        let console = ModerationConsole::new(FakeBackend::new(
            vec![test_item(7, ItemStatus::Verified)],
            vec![test_claim(12, 7)],
        ));
        console.load(Tab::Claims).await.unwrap();

        let claim = console.reject_claim(ClaimId(12)).await.unwrap();
        assert_eq!(claim.status, ClaimStatus::Rejected);

        let snapshot = console.snapshot().await;
        assert!(snapshot.claims.is_empty());

        let items = console.backend.items.lock().await;
        assert_eq!(items[0].status, ItemStatus::Verified);
    }

    #[tokio::test]
    async fn overlapping_dispatch_on_the_same_entity_is_refused() {
        let gate = Arc::new(Semaphore::new(0));
        let backend = FakeBackend::new(vec![test_item(1, ItemStatus::Pending)], vec![])
            .with_gate(gate.clone());
        let console = Arc::new(ModerationConsole::new(backend));
        console.load(Tab::Pending).await.unwrap();

        let first = {
            let console = console.clone();
            tokio::spawn(
                async move { console.moderate_item(ItemId(1), ItemAction::Approve).await },
            )
        };
        // Let the first dispatch reach the backend and park on the gate.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let err = console
            .moderate_item(ItemId(1), ItemAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InFlight(EntityKey::Item(ItemId(1)))
        ));

        gate.add_permits(1);
        let confirmed = first.await.unwrap().unwrap();
        assert_eq!(confirmed.status, ItemStatus::Verified);

        // The guard is released once the request completes.
        assert!(console.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn rows_are_annotated_with_enabled_actions() {
        let console = ModerationConsole::new(FakeBackend::new(
            vec![test_item(1, ItemStatus::Pending)],
            vec![test_claim(12, 1)],
        ));
        console.load(Tab::Pending).await.unwrap();

        let snapshot = console.snapshot().await;
        let rows: Vec<_> = snapshot.item_rows().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, &[ItemAction::Approve, ItemAction::Reject]);
    }
}
