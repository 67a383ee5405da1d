//! Discharging third-party caveats.
//!
//! A [`Discharger`] runs at the third party. Given the caveat id a client
//! presents, it decodes the id, checks the embedded condition and mints a
//! discharge macaroon. Each step is a pluggable capability so the same
//! orchestration works with any key management or policy.

use crate::crypto::{CAVEAT_KEY_SIZE, random_bytes};
use crate::third_party::{ThirdPartyCaveatId, decrypt_third_party_caveat_id};
use crate::{Macaroon, MacaroonError, Result};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A caveat to be attached to a newly minted macaroon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaveatSpec {
    /// Third-party location; empty for a first-party caveat
    pub location: String,
    pub condition: String,
}

impl CaveatSpec {
    pub fn first_party(condition: impl Into<String>) -> Self {
        Self {
            location: String::new(),
            condition: condition.into(),
        }
    }

    pub fn third_party(location: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            condition: condition.into(),
        }
    }

    pub fn is_third_party(&self) -> bool {
        !self.location.is_empty()
    }
}

/// Recovers the discharge root key and condition from a caveat id
pub trait CaveatIdDecoder {
    fn decode_caveat_id(&self, caveat_id: &str) -> Result<ThirdPartyCaveatId>;
}

/// Decides whether a third-party condition holds
///
/// On success returns the caveats to attach to the discharge macaroon (empty
/// for an unconditional discharge). Any error aborts the discharge, whether
/// the condition is false or could not be checked.
pub trait ThirdPartyChecker {
    fn check_third_party_caveat(&self, condition: &str) -> Result<Vec<CaveatSpec>>;
}

/// Mints a macaroon with the given id and root key and attaches `caveats`
///
/// Implementations should use a random id when `id` is empty and a random
/// root key when `root_key` is empty.
pub trait MacaroonMinter {
    fn new_macaroon(&self, id: &str, root_key: &[u8], caveats: &[CaveatSpec]) -> Result<Macaroon>;
}

impl<F> CaveatIdDecoder for F
where
    F: Fn(&str) -> Result<ThirdPartyCaveatId>,
{
    fn decode_caveat_id(&self, caveat_id: &str) -> Result<ThirdPartyCaveatId> {
        self(caveat_id)
    }
}

impl<F> ThirdPartyChecker for F
where
    F: Fn(&str) -> Result<Vec<CaveatSpec>>,
{
    fn check_third_party_caveat(&self, condition: &str) -> Result<Vec<CaveatSpec>> {
        self(condition)
    }
}

impl<F> MacaroonMinter for F
where
    F: Fn(&str, &[u8], &[CaveatSpec]) -> Result<Macaroon>,
{
    fn new_macaroon(&self, id: &str, root_key: &[u8], caveats: &[CaveatSpec]) -> Result<Macaroon> {
        self(id, root_key, caveats)
    }
}

/// Decodes caveat ids encrypted under this third party's own secret
#[derive(Clone)]
pub struct SecretDecoder {
    secret: Vec<u8>,
}

impl SecretDecoder {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl CaveatIdDecoder for SecretDecoder {
    fn decode_caveat_id(&self, caveat_id: &str) -> Result<ThirdPartyCaveatId> {
        decrypt_third_party_caveat_id(&self.secret, caveat_id)
    }
}

/// Mints macaroons directly from the supplied root key
///
/// An empty `id` is replaced by a random hex id and an empty `root_key` by a
/// random key. Third-party caveat specs are encrypted with the secret registered for their
/// location via [`RootKeyMinter::with_third_party`].
#[derive(Clone, Default)]
pub struct RootKeyMinter {
    location: String,
    third_party_secrets: HashMap<String, Vec<u8>>,
}

impl RootKeyMinter {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            third_party_secrets: HashMap::new(),
        }
    }

    /// Registers the secret shared with the third party at `location`
    pub fn with_third_party(mut self, location: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        self.third_party_secrets.insert(location.into(), secret.into());
        self
    }
}

impl MacaroonMinter for RootKeyMinter {
    fn new_macaroon(&self, id: &str, root_key: &[u8], caveats: &[CaveatSpec]) -> Result<Macaroon> {
        let id = match id {
            "" => hex::encode(random_bytes::<16>()),
            id => id.to_string(),
        };
        let random_key: [u8; CAVEAT_KEY_SIZE];
        let root_key = if root_key.is_empty() {
            random_key = random_bytes();
            &random_key[..]
        } else {
            root_key
        };

        let mut m = Macaroon::new(root_key, id, self.location.as_str());
        for caveat in caveats {
            if caveat.is_third_party() {
                let secret = self
                    .third_party_secrets
                    .get(&caveat.location)
                    .ok_or_else(|| MacaroonError::UnknownThirdPartyLocation(caveat.location.clone()))?;
                m.add_third_party_caveat(secret, caveat.condition.as_str(), caveat.location.as_str())?;
            } else {
                m.add_first_party_caveat(caveat.condition.as_str());
            }
        }
        Ok(m)
    }
}

/// Discharges third-party caveats
///
/// Stateless; every call is independent. It is safe to share across threads
/// when its three capabilities are.
pub struct Discharger<D, C, M> {
    /// Decodes the caveat id
    pub decoder: D,

    /// Checks the caveat's condition
    pub checker: C,

    /// Creates the discharge macaroon
    pub minter: M,
}

impl<D, C, M> Discharger<D, C, M>
where
    D: CaveatIdDecoder,
    C: ThirdPartyChecker,
    M: MacaroonMinter,
{
    pub fn new(decoder: D, checker: C, minter: M) -> Self {
        Self {
            decoder,
            checker,
            minter,
        }
    }

    /// Creates a macaroon that discharges the third-party caveat with the given id
    ///
    /// The returned macaroon has `caveat_id` as its id and is signed with the
    /// root key embedded in the id. It is not bound: the client must call
    /// [`Macaroon::bind`] with the root macaroon's signature before use.
    ///
    /// # Example
    /// ```
    /// use macaroon::Macaroon;
    /// use macaroon::discharge::{CaveatSpec, Discharger, RootKeyMinter, SecretDecoder};
    /// use macaroon::checker::AcceptAllChecker;
    /// use macaroon::discharges_by_id;
    ///
    /// let mut root = Macaroon::new(b"root-key", "account-1", "svc");
    /// let caveat_id = root.add_third_party_caveat(b"auth-secret", "is-member", "auth").unwrap();
    ///
    /// let discharger = Discharger::new(
    ///     SecretDecoder::new(b"auth-secret".to_vec()),
    ///     |_: &str| -> macaroon::Result<Vec<CaveatSpec>> { Ok(Vec::new()) },
    ///     RootKeyMinter::new("auth"),
    /// );
    /// let discharge = discharger.discharge(&caveat_id).unwrap();
    ///
    /// let discharges = discharges_by_id([root.bind_discharge(&discharge)]);
    /// assert!(root.verify(b"root-key", &AcceptAllChecker, &discharges).is_ok());
    /// ```
    pub fn discharge(&self, caveat_id: &str) -> Result<Macaroon> {
        debug!(caveat_id = %caveat_id, "attempting to discharge");

        let payload = self
            .decoder
            .decode_caveat_id(caveat_id)
            .map_err(|e| MacaroonError::CannotDecodeCaveatId(e.to_string()))?;

        let caveats = self
            .checker
            .check_third_party_caveat(&payload.condition)
            .inspect_err(|e| warn!(condition = %payload.condition, error = %e, "refusing to discharge"))?;

        self.minter.new_macaroon(caveat_id, &payload.root_key, &caveats)
    }
}
