//! Console client for the campus lost & found service.
//!
//! Wraps the REST backend with a typed [`api::ApiClient`], an explicit
//! [`session::Session`] context, and the admin moderation view model in
//! [`console`], which drives the pure state machine from `lostfound-core`.

pub mod api;
pub mod config;
pub mod console;
pub mod session;

pub use api::ApiClient;
pub use config::Config;
pub use console::ModerationConsole;
pub use session::Session;
