//! `lostfound`: console client for the campus lost & found service.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use tracing::Level;

use lostfound_console::api::{AdminClaim, ApiClient, ItemQuery, NewItemReport};
use lostfound_console::config::Config;
use lostfound_console::console::{DispatchError, ModerationConsole, RestBackend, Tab};
use lostfound_console::session::{Session, SessionStore};
use lostfound_core::model::{ClaimId, ClaimStatus, Item, ItemId, ItemType};
use lostfound_core::moderation::ItemAction;

#[derive(Parser)]
#[command(
    name = "lostfound",
    version,
    about = "Console client for the campus lost & found service"
)]
struct Cli {
    /// Log backend requests as they happen.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account.
    Register {
        name: String,
        email: String,
        password: String,
    },
    /// Log in and save the session.
    Login { email: String, password: String },
    /// Forget the saved session.
    Logout,
    /// Show who is logged in.
    Whoami,
    /// Browse the public listing of verified items.
    Browse {
        #[arg(long)]
        category: Option<String>,
        /// Filter by "lost" or "found".
        #[arg(long = "type")]
        item_type: Option<ItemType>,
        /// Free-text search over titles and descriptions.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Only items dated on or after this day, as YYYY-MM-DD.
        #[arg(long)]
        date_from: Option<NaiveDate>,
        /// Only items dated on or before this day, as YYYY-MM-DD.
        #[arg(long)]
        date_to: Option<NaiveDate>,
        /// Sort column, e.g. "date" or "created_at".
        #[arg(long)]
        sort: Option<String>,
        /// "asc" or "desc".
        #[arg(long)]
        order: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Show one item in full.
    Show { item_id: u64 },
    /// Report a lost or found item.
    Report {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: String,
        /// "lost" or "found".
        #[arg(long = "type")]
        item_type: ItemType,
        /// When the item was lost or found, as YYYY-MM-DD.
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        location: String,
        /// Photo to upload with the report.
        #[arg(long)]
        photo: PathBuf,
    },
    /// Claim a verified item as yours.
    Claim {
        item_id: u64,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List the items you reported.
    MyItems,
    /// List the claims you filed.
    MyClaims,
    /// Admin moderation commands.
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Items awaiting review.
    Pending,
    /// Verified items.
    Verified,
    /// Claimed items awaiting handover.
    Claimed,
    /// Rejected items.
    Rejected,
    /// Claims awaiting review.
    Claims,
    /// Every claim, optionally filtered by status.
    AllClaims {
        #[arg(long)]
        status: Option<ClaimStatus>,
    },
    /// Attach admin notes to a claim.
    Note { claim_id: u64, notes: String },
    /// Approve a pending item.
    ApproveItem { item_id: u64 },
    /// Reject a pending item.
    RejectItem { item_id: u64 },
    /// Send a verified or rejected item back for review.
    RevertItem { item_id: u64 },
    /// Mark a claimed item as handed back to its owner.
    MarkReturned { item_id: u64 },
    /// Approve a claim; the item becomes claimed with it.
    ApproveClaim { claim_id: u64 },
    /// Reject a claim; the item stays claimable.
    RejectClaim { claim_id: u64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::INFO } else { Level::WARN };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = Config::from_env()?;
    let api = ApiClient::new(
        config.api_base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let store = SessionStore::new(config.session_path());

    match cli.command {
        Command::Register {
            name,
            email,
            password,
        } => {
            let response = api.register(&name, &email, &password).await?;
            println!("{} (user #{})", response.message, response.user.user_id);
        }
        Command::Login { email, password } => {
            let response = api.login(&email, &password).await?;
            let session = Session {
                token: response.token,
                user: response.user,
            };
            store.save(&session)?;
            println!("logged in as {} ({})", session.user.name, session.user.role);
        }
        Command::Logout => {
            store.clear()?;
            println!("logged out");
        }
        Command::Whoami => match store.load()? {
            Some(session) => println!(
                "{} <{}> ({})",
                session.user.name, session.user.email, session.user.role
            ),
            None => println!("not logged in"),
        },
        Command::Browse {
            category,
            item_type,
            search,
            location,
            date_from,
            date_to,
            sort,
            order,
            page,
        } => {
            let query = ItemQuery {
                category,
                item_type,
                search,
                location,
                date_from,
                date_to,
                sort,
                order,
                page,
                per_page: None,
            };
            let page = api.list_items(&query).await?;
            for item in &page.items {
                println!("{}", item_line(item));
            }
            println!(
                "page {}/{}, {} items",
                page.current_page, page.pages, page.total
            );
        }
        Command::Show { item_id } => {
            let item = api.get_item(ItemId(item_id)).await?;
            print_item_detail(&api, &item);
            if let Some(session) = store.load()? {
                let mine = api.my_claim(&session.token, ItemId(item_id)).await?;
                if let Some(claim) = mine.claim {
                    println!("your claim: #{} [{}]", claim.claim_id, claim.status);
                }
            }
        }
        Command::Report {
            title,
            description,
            category,
            item_type,
            date,
            location,
            photo,
        } => {
            let photo_bytes = fs::read(&photo)
                .with_context(|| format!("failed to read photo {}", photo.display()))?;
            let photo_name = photo
                .file_name()
                .and_then(|name| name.to_str())
                .context("photo path has no usable file name")?
                .to_string();
            let report = NewItemReport {
                title,
                description,
                category,
                item_type,
                date: date.and_time(NaiveTime::MIN),
                location,
                photo_name,
                photo_bytes,
            };
            let session = store.require()?;
            let response = api.report_item(&session.token, &report).await?;
            println!("{} (item #{})", response.message, response.item.item_id);
            println!("your report is pending admin review");
        }
        Command::Claim { item_id, notes } => {
            let session = store.require()?;
            let response = api
                .claim_item(&session.token, ItemId(item_id), notes.as_deref())
                .await?;
            println!("{} (claim #{})", response.message, response.claim.claim_id);
        }
        Command::MyItems => {
            let session = store.require()?;
            let list = api.my_items(&session.token).await?;
            if list.items.is_empty() {
                println!("you have not reported any items");
            }
            for item in &list.items {
                println!("{}", item_line(item));
            }
        }
        Command::MyClaims => {
            let session = store.require()?;
            let list = api.my_claims(&session.token).await?;
            if list.claims.is_empty() {
                println!("you have not filed any claims");
            }
            for claim in &list.claims {
                println!(
                    "claim #{} on item #{} [{}] filed {}",
                    claim.claim_id,
                    claim.item_id,
                    claim.status,
                    claim.claim_date.format("%Y-%m-%d")
                );
            }
        }
        Command::Admin(command) => run_admin(&api, &store, command).await?,
    }

    Ok(())
}

async fn run_admin(api: &ApiClient, store: &SessionStore, command: AdminCommand) -> Result<()> {
    let session = store.require()?;
    session.require_admin()?;
    let console = ModerationConsole::new(RestBackend::new(api.clone(), &session));

    match command {
        AdminCommand::Pending => show_tab(&console, Tab::Pending).await,
        AdminCommand::Verified => show_tab(&console, Tab::Verified).await,
        AdminCommand::Claimed => show_tab(&console, Tab::Claimed).await,
        AdminCommand::Rejected => show_tab(&console, Tab::Rejected).await,
        AdminCommand::Claims => show_tab(&console, Tab::Claims).await,
        AdminCommand::AllClaims { status } => {
            let list = api.all_claims(&session.token, status).await?;
            if list.claims.is_empty() {
                println!("no claims");
            }
            for admin_claim in &list.claims {
                println!("{}", claim_line(admin_claim));
            }
            Ok(())
        }
        AdminCommand::Note { claim_id, notes } => {
            let updated = api
                .update_claim_notes(&session.token, ClaimId(claim_id), &notes)
                .await?;
            println!("claim #{} notes updated", updated.claim.claim_id);
            Ok(())
        }
        AdminCommand::ApproveItem { item_id } => {
            moderate_from(&console, Tab::Pending, ItemId(item_id), ItemAction::Approve).await
        }
        AdminCommand::RejectItem { item_id } => {
            moderate_from(&console, Tab::Pending, ItemId(item_id), ItemAction::Reject).await
        }
        AdminCommand::RevertItem { item_id } => revert_item(&console, ItemId(item_id)).await,
        AdminCommand::MarkReturned { item_id } => {
            moderate_from(
                &console,
                Tab::Claimed,
                ItemId(item_id),
                ItemAction::MarkReturned,
            )
            .await
        }
        AdminCommand::ApproveClaim { claim_id } => {
            console.load(Tab::Claims).await?;
            let (claim, item) = console.approve_claim(ClaimId(claim_id)).await?;
            println!(
                "claim #{} approved; item #{} is now {}",
                claim.claim_id, item.item_id, item.status
            );
            Ok(())
        }
        AdminCommand::RejectClaim { claim_id } => {
            console.load(Tab::Claims).await?;
            let claim = console.reject_claim(ClaimId(claim_id)).await?;
            println!("claim #{} rejected", claim.claim_id);
            Ok(())
        }
    }
}

async fn show_tab(console: &ModerationConsole<RestBackend>, tab: Tab) -> Result<()> {
    console.load(tab).await?;
    let snapshot = console.snapshot().await;

    if tab == Tab::Claims {
        if snapshot.claims.is_empty() {
            println!("no pending claims");
            return Ok(());
        }
        for (admin_claim, actions) in snapshot.claim_rows() {
            println!("{}", claim_line(admin_claim));
            if let Some(notes) = &admin_claim.claim.notes {
                println!("    notes: {}", notes);
            }
            println!("    actions: {}", join(actions));
        }
    } else {
        if snapshot.items.is_empty() {
            println!("no {}", tab);
            return Ok(());
        }
        for (item, actions) in snapshot.item_rows() {
            println!("{}", item_line(item));
            if !actions.is_empty() {
                println!("    actions: {}", join(actions));
            }
        }
    }
    Ok(())
}

async fn moderate_from(
    console: &ModerationConsole<RestBackend>,
    tab: Tab,
    item_id: ItemId,
    action: ItemAction,
) -> Result<()> {
    console.load(tab).await?;
    let item = console.moderate_item(item_id, action).await?;
    println!("item #{} is now {}", item.item_id, item.status);
    Ok(())
}

/// Revert works from both the verified and rejected tabs; try verified
/// first and fall back if the item is not there.
async fn revert_item(console: &ModerationConsole<RestBackend>, item_id: ItemId) -> Result<()> {
    console.load(Tab::Verified).await?;
    let result = console
        .moderate_item(item_id, ItemAction::RevertToPending)
        .await;
    let item = match result {
        Err(DispatchError::UnknownItem(_)) => {
            console.load(Tab::Rejected).await?;
            console
                .moderate_item(item_id, ItemAction::RevertToPending)
                .await?
        }
        other => other?,
    };
    println!("item #{} is now {}", item.item_id, item.status);
    Ok(())
}

fn item_line(item: &Item) -> String {
    format!(
        "#{} [{}] {} ({}, {}) at {}, {}",
        item.item_id,
        item.status,
        item.title,
        item.item_type,
        item.category,
        item.location,
        item.date.format("%Y-%m-%d")
    )
}

fn claim_line(admin_claim: &AdminClaim) -> String {
    let claim = &admin_claim.claim;
    let title = admin_claim
        .item
        .as_ref()
        .map(|item| item.title.as_str())
        .unwrap_or("(item unavailable)");
    let claimer = admin_claim
        .claimer
        .as_ref()
        .map(|profile| profile.name.as_str())
        .unwrap_or("unknown");
    format!(
        "claim #{} on item #{} \"{}\" by {} [{}]",
        claim.claim_id, claim.item_id, title, claimer, claim.status
    )
}

fn print_item_detail(api: &ApiClient, item: &Item) {
    println!("{}", item_line(item));
    println!("{}", item.description);
    if item.photo_path.is_some() {
        println!("photo: {}", api.photo_url(item.item_id));
    }
    println!("reported by user #{} on {}", item.user_id, item.created_at.format("%Y-%m-%d"));
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
