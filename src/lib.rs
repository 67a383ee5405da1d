//! Macaroons: bearer authorization tokens with attenuating caveats.
//!
//! A [`Macaroon`] carries an HMAC-SHA3-256 signature chained over its id and
//! every caveat. First-party caveats are checked by the target service through
//! a [`checker::FirstPartyChecker`]; third-party caveats must be discharged by
//! another service (see [`discharge::Discharger`]) whose discharge macaroons
//! are bound to the root macaroon and verified alongside it.

pub mod caveat;
pub mod checker;
pub mod condition;
pub mod crypto;
pub mod discharge;
pub mod error;
pub mod macaroon;
pub mod serialization;
pub mod third_party;

pub use caveat::Caveat;
pub use error::MacaroonError;
pub use macaroon::{DischargeMap, Macaroon, discharges_by_id};
pub use third_party::{ThirdPartyCaveatId, decrypt_third_party_caveat_id};

/// Result type for macaroon operations
pub type Result<T> = std::result::Result<T, MacaroonError>;
