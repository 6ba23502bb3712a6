//! ga_reports - A CLI tool for Google Analytics unsampled reports.
//!
//! This library provides functionality to:
//! - Authenticate with a service account or an installed-app authorization code
//! - Resolve a reporting view from the account → property → view hierarchy
//! - List, get and delete unsampled reports, and query the sessions metric
//! - List Drive files and download them to the local filesystem
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//!
//! use ga_reports::auth::{authenticate, Access, Api, Scope};
//! use ga_reports::client::{build_client, ClientOptions};
//! use ga_reports::locator::{resolve_default_view, Selection};
//! use ga_reports::reports::list_reports;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scopes = [Scope::new(Api::Analytics, Access::Read)];
//!     let credentials = authenticate(
//!         None,
//!         Path::new("service-account.json"),
//!         &scopes,
//!         Duration::from_secs(30),
//!     )
//!     .await?;
//!     let service = build_client(credentials, "analytics", "v3", &ClientOptions::default()).await?;
//!
//!     let view = resolve_default_view(&service, &Selection::default()).await?;
//!     for report in list_reports(&service, &view).await? {
//!         println!("{}", report);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod ids;
pub mod locator;
pub mod models;
pub mod presenter;
pub mod prompt;
pub mod reports;
pub mod retry;

// Re-exports for convenience
pub use auth::{Credentials, Scope};
pub use client::{build_client, ServiceHandle};
pub use config::Config;
pub use error::{ReportError, Result};
pub use locator::{ResourceRef, Selection};
pub use models::ReportRecord;
