//! # Request Ledger HTTP
//!
//! reqwest-backed transport for the request ledger.
//!
//! ## Example
//!
//! ```no_run
//! use request_ledger_core::params;
//! use request_ledger_http::{HttpLedger, HttpTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ledger = HttpLedger::new(HttpTransport::from_env()?);
//!     let id = ledger.create_unique_id("repos");
//!
//!     ledger
//!         .get("https://api.github.com/orgs/rust-lang/repos", &id, params!["per_page", 5])
//!         .await?;
//!
//!     if let Some(response) = ledger.response(&id)? {
//!         println!("{}: {} bytes", response.status, response.body.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod response;
pub mod transport;

use request_ledger_core::Ledger;

// Re-export main types for convenience
pub use config::HttpConfig;
pub use error::HttpError;
pub use response::HttpResponse;
pub use transport::HttpTransport;

/// A ledger dispatching real HTTP requests.
pub type HttpLedger = Ledger<HttpTransport>;
