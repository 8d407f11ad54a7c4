//! Core of the allowance ledger.
//!
//! Holds the allowance table and the nonce registry, verifies signed approval
//! requests and applies them through the [`AuthorizationEngine`].

pub mod allowance;
pub mod builder;
pub mod clock;
pub mod engine;
pub mod nonce;
pub mod signature;

pub use allowance::{AllowanceError, AllowanceLedger};
pub use builder::{BuilderError, LedgerBuilder, LedgerFactories};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{event_bus::EventBus, AuthorizationEngine, AuthorizationError};
pub use nonce::{NonceError, NonceRecord, NonceRegistry};
pub use signature::{recover_signer, SignatureError};
