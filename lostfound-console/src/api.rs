//! REST client for the lost & found backend.
//!
//! Thin, typed wrapper over the HTTP API: request/response shapes live
//! here, transport and backend failures are split into [`ApiError`]
//! variants, and backend error messages are surfaced verbatim. No retries;
//! a failed call is reported and the caller decides what to do.

use std::fmt;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use lostfound_core::model::{Claim, ClaimId, ClaimStatus, Item, ItemId, ItemStatus, ItemType};
use lostfound_core::moderation::VerifyAction;

use crate::session::Profile;

/// Why an API call failed. No variant mutates any local state.
#[derive(Debug)]
pub enum ApiError {
    /// The request never completed: connection, timeout, or an unreadable
    /// response body.
    Transport(reqwest::Error),
    /// The backend answered with a non-success status. `message` is the
    /// server's own error text, surfaced to the user verbatim.
    Backend { status: StatusCode, message: String },
    /// A success response whose body did not match the expected shape.
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "request failed: {}", err),
            Self::Backend { status, message } => write!(f, "{} (HTTP {})", message, status.as_u16()),
            Self::Decode(msg) => write!(f, "unexpected response from server: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct ClaimRequest<'a> {
    notes: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct VerifyRequest {
    action: VerifyAction,
}

#[derive(Debug, Serialize)]
struct StatusRequest {
    status: ItemStatus,
}

#[derive(Debug, Serialize)]
struct NotesRequest<'a> {
    notes: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: Profile,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: Profile,
}

#[derive(Debug, Deserialize)]
pub struct ReportResponse {
    pub message: String,
    pub item: Item,
}

#[derive(Debug, Deserialize)]
pub struct ClaimSubmitted {
    pub message: String,
    pub claim: Claim,
}

/// A page of the public (verified-only) item listing.
#[derive(Debug, Deserialize)]
pub struct ItemPage {
    pub total: u64,
    pub pages: u64,
    pub current_page: u64,
    pub per_page: u64,
    pub items: Vec<Item>,
}

impl ItemPage {
    /// The page number to fetch after this one, or `None` on the last
    /// page (and for an empty listing, where `pages` is 0).
    pub fn next_page(&self) -> Option<u32> {
        if self.current_page < self.pages {
            Some(self.current_page as u32 + 1)
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ItemList {
    pub total: u64,
    pub items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimList {
    pub total: u64,
    pub claims: Vec<Claim>,
}

#[derive(Debug, Deserialize)]
pub struct MyClaim {
    pub claim: Option<Claim>,
}

/// A claim as the admin endpoints serve it: the claim itself plus embedded
/// snapshots of the referenced item and the people involved.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdminClaim {
    #[serde(flatten)]
    pub claim: Claim,
    pub item: Option<Item>,
    pub claimer: Option<Profile>,
    pub item_reporter: Option<Profile>,
}

#[derive(Debug, Deserialize)]
pub struct AdminClaimList {
    pub total: u64,
    pub claims: Vec<AdminClaim>,
}

#[derive(Debug, Deserialize)]
pub struct ItemUpdated {
    pub message: String,
    pub item: Item,
}

#[derive(Debug, Deserialize)]
pub struct ClaimUpdated {
    pub message: String,
    pub claim: Claim,
}

/// Filters for the public item listing.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub category: Option<String>,
    pub item_type: Option<ItemType>,
    pub search: Option<String>,
    pub location: Option<String>,
    /// Only items dated on or after this day.
    pub date_from: Option<NaiveDate>,
    /// Only items dated on or before this day.
    pub date_to: Option<NaiveDate>,
    /// Sort column, e.g. `date` or `created_at`.
    pub sort: Option<String>,
    /// `asc` or `desc`.
    pub order: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ItemQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            params.push(("per_page", per_page.to_string()));
        }
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(item_type) = self.item_type {
            params.push(("item_type", item_type.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("q", search.clone()));
        }
        if let Some(location) = &self.location {
            params.push(("location", location.clone()));
        }
        if let Some(date_from) = self.date_from {
            params.push(("date_from", date_from.format("%Y-%m-%d").to_string()));
        }
        if let Some(date_to) = self.date_to {
            params.push(("date_to", date_to.format("%Y-%m-%d").to_string()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(order) = &self.order {
            params.push(("order", order.clone()));
        }
        params
    }
}

/// A new item report, uploaded as multipart form data with its photo.
/// The caller reads the photo file; this client only ships the bytes.
#[derive(Debug, Clone)]
pub struct NewItemReport {
    pub title: String,
    pub description: String,
    pub category: String,
    pub item_type: ItemType,
    pub date: NaiveDateTime,
    pub location: String,
    pub photo_name: String,
    pub photo_bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode a success body, or turn a failure into the
    /// matching [`ApiError`]. Error bodies are `{"error": "..."}`; anything
    /// else falls back to the bare HTTP status.
    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await?;
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            warn!("backend refused request: {} ({})", message, status);
            return Err(ApiError::Backend { status, message });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    // =========================================================================
    // Auth
    // =========================================================================

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse, ApiError> {
        let request = self.client.post(self.url("/auth/register")).json(&RegisterRequest {
            name,
            email,
            password,
        });
        self.execute(request).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .client
            .post(self.url("/auth/login"))
            .json(&LoginRequest { email, password });
        self.execute(request).await
    }

    pub async fn profile(&self, token: &str) -> Result<Profile, ApiError> {
        let request = self.client.get(self.url("/auth/profile")).bearer_auth(token);
        self.execute(request).await
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub async fn report_item(
        &self,
        token: &str,
        report: &NewItemReport,
    ) -> Result<ReportResponse, ApiError> {
        let form = reqwest::multipart::Form::new()
            .text("title", report.title.clone())
            .text("description", report.description.clone())
            .text("category", report.category.clone())
            .text("item_type", report.item_type.as_str())
            .text("date", report.date.format("%Y-%m-%dT%H:%M:%S").to_string())
            .text("location", report.location.clone())
            .part(
                "photo",
                reqwest::multipart::Part::bytes(report.photo_bytes.clone())
                    .file_name(report.photo_name.clone()),
            );

        let request = self
            .client
            .post(self.url("/items/report"))
            .bearer_auth(token)
            .multipart(form);
        self.execute(request).await
    }

    pub async fn list_items(&self, query: &ItemQuery) -> Result<ItemPage, ApiError> {
        let request = self.client.get(self.url("/items")).query(&query.params());
        self.execute(request).await
    }

    pub async fn get_item(&self, item_id: ItemId) -> Result<Item, ApiError> {
        let request = self.client.get(self.url(&format!("/items/{}", item_id)));
        self.execute(request).await
    }

    /// URL of an item's photo, for display alongside its card.
    pub fn photo_url(&self, item_id: ItemId) -> String {
        self.url(&format!("/items/{}/photo", item_id))
    }

    pub async fn claim_item(
        &self,
        token: &str,
        item_id: ItemId,
        notes: Option<&str>,
    ) -> Result<ClaimSubmitted, ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/items/{}/claim", item_id)))
            .bearer_auth(token)
            .json(&ClaimRequest { notes });
        self.execute(request).await
    }

    pub async fn my_items(&self, token: &str) -> Result<ItemList, ApiError> {
        let request = self
            .client
            .get(self.url("/items/my-items"))
            .bearer_auth(token);
        self.execute(request).await
    }

    pub async fn my_claim(&self, token: &str, item_id: ItemId) -> Result<MyClaim, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/items/{}/my-claim", item_id)))
            .bearer_auth(token);
        self.execute(request).await
    }

    pub async fn my_claims(&self, token: &str) -> Result<ClaimList, ApiError> {
        let request = self
            .client
            .get(self.url("/items/claims/my-claims"))
            .bearer_auth(token);
        self.execute(request).await
    }

    // =========================================================================
    // Admin moderation
    // =========================================================================

    pub async fn pending_items(&self, token: &str) -> Result<ItemList, ApiError> {
        let request = self
            .client
            .get(self.url("/admin/items/pending"))
            .bearer_auth(token);
        self.execute(request).await
    }

    pub async fn verify_item(
        &self,
        token: &str,
        item_id: ItemId,
        action: VerifyAction,
    ) -> Result<ItemUpdated, ApiError> {
        info!("verifying item #{} ({:?})", item_id, action);
        let request = self
            .client
            .put(self.url(&format!("/admin/items/{}/verify", item_id)))
            .bearer_auth(token)
            .json(&VerifyRequest { action });
        self.execute(request).await
    }

    pub async fn update_item_status(
        &self,
        token: &str,
        item_id: ItemId,
        status: ItemStatus,
    ) -> Result<ItemUpdated, ApiError> {
        info!("updating item #{} status to '{}'", item_id, status);
        let request = self
            .client
            .put(self.url(&format!("/admin/items/{}/status", item_id)))
            .bearer_auth(token)
            .json(&StatusRequest { status });
        self.execute(request).await
    }

    pub async fn pending_claims(&self, token: &str) -> Result<AdminClaimList, ApiError> {
        let request = self
            .client
            .get(self.url("/admin/claims/pending"))
            .bearer_auth(token);
        self.execute(request).await
    }

    pub async fn all_claims(
        &self,
        token: &str,
        status: Option<ClaimStatus>,
    ) -> Result<AdminClaimList, ApiError> {
        let mut request = self
            .client
            .get(self.url("/admin/claims/all"))
            .bearer_auth(token);
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        self.execute(request).await
    }

    pub async fn approve_claim(&self, token: &str, claim_id: ClaimId) -> Result<ClaimUpdated, ApiError> {
        info!("approving claim #{}", claim_id);
        let request = self
            .client
            .put(self.url(&format!("/admin/claims/{}/approve", claim_id)))
            .bearer_auth(token)
            .json(&serde_json::json!({}));
        self.execute(request).await
    }

    pub async fn reject_claim(&self, token: &str, claim_id: ClaimId) -> Result<ClaimUpdated, ApiError> {
        info!("rejecting claim #{}", claim_id);
        let request = self
            .client
            .put(self.url(&format!("/admin/claims/{}/reject", claim_id)))
            .bearer_auth(token)
            .json(&serde_json::json!({}));
        self.execute(request).await
    }

    pub async fn update_claim_notes(
        &self,
        token: &str,
        claim_id: ClaimId,
        notes: &str,
    ) -> Result<ClaimUpdated, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/admin/claims/{}/notes", claim_id)))
            .bearer_auth(token)
            .json(&NotesRequest { notes });
        self.execute(request).await
    }
}
