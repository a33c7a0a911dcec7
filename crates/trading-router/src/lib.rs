//! Trade router.
//!
//! Consumes trade triggers, selects every credential of the trigger's
//! account, dispatches one order per credential concurrently and publishes a
//! normalized broker response per outcome.

pub mod dedupe;
pub mod error;
pub mod report;
pub mod router;
pub mod secrets;
pub mod sizing;

pub use dedupe::DedupeLedger;
pub use error::RouterError;
pub use report::{DispatchOutcome, OutcomeRecord, RouteReport};
pub use router::{RouterConfig, TradeRouter};
pub use secrets::{EnvSecretStore, FileSecretStore, InMemorySecretStore};
pub use sizing::{resolve_size, validate_levels};
