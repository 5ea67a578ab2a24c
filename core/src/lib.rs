//! # Request Ledger Core
//!
//! Dispatch HTTP requests under an identifier, carry on with other work, and
//! collect each request's outcome later, exactly once.
//!
//! ## Core Concepts
//!
//! - **Identifier**: Opaque key naming one request lifecycle ([`RequestId`])
//! - **Ledger**: Owns the identifier table, the id serial counter and the options ([`Ledger`])
//! - **Transport**: Injected collaborator that performs the network call ([`Transport`])
//! - **Outcome**: Success payload or failure value stored per identifier ([`Outcome`])
//!
//! ## Example
//!
//! ```ignore
//! use request_ledger_core::{Ledger, params};
//!
//! let ledger = Ledger::new(transport);
//! let id = ledger.create_unique_id("search");
//!
//! // The request starts running here; keep working
//! let completion = ledger.dispatch(Method::Get, url, &id, None, params!["q", "rust"])?;
//!
//! // ... later (or never: the outcome is recorded either way)
//! completion.await?;
//! let payload = ledger.response(&id)?;
//! ```

pub mod config;
pub mod environment;
pub mod error;
pub mod id;
pub mod ledger;
pub mod metrics;
pub mod options;
pub mod params;
pub mod transport;

// Re-export commonly used types
pub use config::{ConfigError, LedgerConfig};
pub use environment::{Clock, SystemClock};
pub use error::LedgerError;
pub use id::{IdGenerator, RequestId};
pub use ledger::{Completion, Ledger, Outcome, RequestStatus};
pub use options::{LedgerOptions, OptionsPatch};
pub use params::{ParamArgs, Params, UnbalancedParameters};
pub use transport::{Method, Transport, TransportRequest};
