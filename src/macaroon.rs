use crate::caveat::Caveat;
use crate::checker::FirstPartyChecker;
use crate::crypto::{
    self, CAVEAT_KEY_SIZE, Signature, bind_for_request, chain_caveat, hmac_sha3, random_bytes,
    signatures_equal,
};
use crate::serialization::MacaroonDoc;
use crate::third_party::{ThirdPartyCaveatId, encrypt_third_party_caveat_id};
use crate::{MacaroonError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Discharge macaroons supplied to [`Macaroon::verify`], keyed by macaroon id
pub type DischargeMap = HashMap<String, Macaroon>;

/// A macaroon is a bearer token with embedded, attenuating caveats.
///
/// The signature is an HMAC-SHA3-256 chain over the root key, the id and every
/// caveat in order. Adding a caveat mutates the macaroon in place, so clone
/// before handing a copy to code that may attenuate it independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MacaroonDoc", into = "MacaroonDoc")]
pub struct Macaroon {
    pub(crate) location: String,
    pub(crate) id: String,
    pub(crate) caveats: Vec<Caveat>,
    pub(crate) signature: Signature,
}

impl Macaroon {
    /// Creates a new macaroon (minting operation)
    ///
    /// # Arguments
    /// * `root_key` - The secret root key known only to the issuer
    /// * `id` - A public identifier for this macaroon
    /// * `location` - Location hint for the target service; not authenticated
    ///
    /// # Example
    /// ```
    /// use macaroon::Macaroon;
    ///
    /// let root_key = b"this is our super secret key; only we should know it";
    /// let m = Macaroon::new(root_key, "we used our secret key", "http://mybank/");
    /// assert_eq!(m.id(), "we used our secret key");
    /// ```
    pub fn new(root_key: &[u8], id: impl Into<String>, location: impl Into<String>) -> Self {
        let id = id.into();
        let signature = hmac_sha3(root_key, id.as_bytes());
        trace!(id = %id, "minted macaroon");

        Self {
            location: location.into(),
            id,
            caveats: Vec::new(),
            signature,
        }
    }

    /// Returns the location hint. This is not verified as part of the macaroon.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the macaroon id, which may hold arbitrary information
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the current head of the signature chain
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    /// Returns the number of caveats in this macaroon
    pub fn caveat_count(&self) -> usize {
        self.caveats.len()
    }

    /// Returns true if this macaroon has no caveats
    pub fn is_unrestricted(&self) -> bool {
        self.caveats.is_empty()
    }

    fn add_caveat(&mut self, caveat: Caveat) {
        self.signature = chain_caveat(
            &self.signature,
            &caveat.verification_id,
            caveat.caveat_id.as_bytes(),
        );
        self.caveats.push(caveat);
    }

    /// Adds a caveat that will be checked by the target service
    ///
    /// # Example
    /// ```
    /// use macaroon::Macaroon;
    ///
    /// let mut m = Macaroon::new(b"secret", "account-1", "svc");
    /// m.add_first_party_caveat("account = alice");
    /// m.add_first_party_caveat("time < 2030-01-01");
    /// assert_eq!(m.caveat_count(), 2);
    /// ```
    pub fn add_first_party_caveat(&mut self, condition: impl Into<String>) {
        self.add_caveat(Caveat::first_party(condition));
    }

    /// Adds a caveat that must be discharged by a third party
    ///
    /// A fresh random root key is generated for the discharge macaroon. It is
    /// sealed together with `condition` under `third_party_secret` to form the
    /// caveat id, and sealed under the current signature to form the
    /// verification id.
    ///
    /// # Returns
    /// The text-encoded caveat id, to be sent to the third party out of band.
    pub fn add_third_party_caveat(
        &mut self,
        third_party_secret: &[u8],
        condition: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<String> {
        let root_key: [u8; CAVEAT_KEY_SIZE] = random_bytes();
        let payload = ThirdPartyCaveatId::new(root_key, condition);

        let caveat_id = encrypt_third_party_caveat_id(third_party_secret, &payload)?;
        let verification_id = crypto::encrypt(&self.signature, &root_key)?;

        let location = location.into();
        debug!(macaroon = %self.id, location = %location, "added third-party caveat");
        self.add_caveat(Caveat::third_party(
            caveat_id.clone(),
            verification_id,
            location,
        ));
        Ok(caveat_id)
    }

    /// Binds this discharge macaroon to the signature of the root macaroon it
    /// will accompany. Must be called before the discharge is passed to
    /// [`Macaroon::verify`].
    pub fn bind(&mut self, root_signature: &Signature) {
        self.signature = bind_for_request(root_signature, &self.signature);
    }

    /// Returns a copy of `discharge` bound to this macaroon's signature
    pub fn bind_discharge(&self, discharge: &Macaroon) -> Macaroon {
        let mut bound = discharge.clone();
        bound.bind(&self.signature);
        bound
    }

    /// Prepares this macaroon for a request by binding all discharge macaroons
    ///
    /// # Returns
    /// A vector with this macaroon first, followed by the bound discharges
    pub fn prepare_for_request(&self, discharges: impl IntoIterator<Item = Macaroon>) -> Vec<Macaroon> {
        std::iter::once(self.clone())
            .chain(discharges.into_iter().map(|mut d| {
                d.bind(&self.signature);
                d
            }))
            .collect()
    }

    /// Verifies this macaroon against its root key
    ///
    /// The signature chain is rebuilt from `root_key` and compared in constant
    /// time before any caveat is evaluated. Then every first-party condition is
    /// passed to `checker` and every third-party caveat is checked by
    /// recursively verifying its discharge from `discharges` (which must
    /// already be bound to this macaroon).
    ///
    /// # Returns
    /// * `Ok(())` if the macaroon is valid and every caveat is satisfied
    /// * `Err(CaveatNotSatisfied)` if a first-party condition does not hold
    /// * any other error if validity could not be established; treat it as
    ///   not authorized
    ///
    /// # Example
    /// ```
    /// use macaroon::{Macaroon, MacaroonError, checker::AcceptAllChecker};
    /// use std::collections::HashMap;
    ///
    /// let mut m = Macaroon::new(b"secret", "account-1", "svc");
    /// m.add_first_party_caveat("time < 2030-01-01");
    ///
    /// assert!(m.verify(b"secret", &AcceptAllChecker, &HashMap::new()).is_ok());
    /// assert_eq!(
    ///     m.verify(b"wrong", &AcceptAllChecker, &HashMap::new()),
    ///     Err(MacaroonError::SignatureMismatch)
    /// );
    /// ```
    pub fn verify(
        &self,
        root_key: &[u8],
        checker: &impl FirstPartyChecker,
        discharges: &DischargeMap,
    ) -> Result<()> {
        let mut path = Vec::new();
        let result = self.verify_bound(&self.signature, root_key, checker, discharges, &mut path);
        if let Err(ref e) = result {
            debug!(macaroon = %self.id, error = %e, "verification failed");
        }
        result
    }

    fn verify_bound<'a>(
        &'a self,
        root_signature: &Signature,
        root_key: &[u8],
        checker: &impl FirstPartyChecker,
        discharges: &'a DischargeMap,
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        // Step 1: rebuild the chain, remembering the signature each caveat was
        // added under; it is the key of that caveat's verification id.
        let mut caveat_signature = hmac_sha3(root_key, self.id.as_bytes());
        let mut signatures = Vec::with_capacity(self.caveats.len());
        for caveat in &self.caveats {
            signatures.push(caveat_signature);
            caveat_signature = chain_caveat(
                &caveat_signature,
                &caveat.verification_id,
                caveat.caveat_id.as_bytes(),
            );
        }

        // Step 2: compare against the stored signature
        let bound = bind_for_request(root_signature, &caveat_signature);
        if !signatures_equal(&bound, &self.signature) {
            return Err(MacaroonError::SignatureMismatch);
        }

        // Step 3: check every caveat
        path.push(&self.id);
        for (caveat, signature) in self.caveats.iter().zip(&signatures) {
            if caveat.is_third_party() {
                self.verify_third_party_caveat(
                    caveat,
                    signature,
                    root_signature,
                    checker,
                    discharges,
                    path,
                )?;
            } else {
                check_condition(checker, &caveat.caveat_id)?;
            }
        }
        path.pop();

        Ok(())
    }

    fn verify_third_party_caveat<'a>(
        &self,
        caveat: &Caveat,
        caveat_signature: &Signature,
        root_signature: &Signature,
        checker: &impl FirstPartyChecker,
        discharges: &'a DischargeMap,
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        let discharge_key = crypto::decrypt(caveat_signature, &caveat.verification_id)?;

        let (id, discharge) = discharges
            .get_key_value(&caveat.caveat_id)
            .ok_or_else(|| MacaroonError::DischargeNotFound {
                caveat_id: caveat.caveat_id.clone(),
            })?;

        // A discharge that (transitively) requires itself would recurse forever.
        if path.contains(&id.as_str()) {
            return Err(MacaroonError::RecursiveDischarge(id.clone()));
        }

        discharge.verify_bound(root_signature, &discharge_key, checker, discharges, path)
    }
}

fn check_condition(checker: &impl FirstPartyChecker, condition: &str) -> Result<()> {
    match checker.check_first_party_caveat(condition) {
        Ok(true) => Ok(()),
        Ok(false) => Err(MacaroonError::CaveatNotSatisfied(condition.to_string())),
        Err(e) => Err(MacaroonError::CheckerIndeterminate {
            condition: condition.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Collects discharge macaroons into a map keyed by their ids
pub fn discharges_by_id(discharges: impl IntoIterator<Item = Macaroon>) -> DischargeMap {
    discharges
        .into_iter()
        .map(|d| (d.id.clone(), d))
        .collect()
}
