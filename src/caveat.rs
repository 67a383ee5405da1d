use crate::{MacaroonError, Result};
use serde::{Deserialize, Serialize};

/// A caveat represents a restriction on the authorization granted by a macaroon.
///
/// A caveat is third-party exactly when it carries a non-empty verification id;
/// there is no separate tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CaveatDoc", into = "CaveatDoc")]
pub struct Caveat {
    /// Location hint of the third party; empty for first-party caveats
    pub location: String,

    /// The condition (first-party) or the encoded third-party caveat id
    pub caveat_id: String,

    /// The discharge root key encrypted under the running signature at the
    /// point the caveat was added; empty for first-party caveats
    pub verification_id: Vec<u8>,
}

/// Serializable form of a caveat. Field names are part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaveatDoc {
    pub location: String,
    pub cid: String,
    /// Hex-encoded verification id, empty for first-party caveats
    pub vid: String,
}

impl Caveat {
    /// Creates a new first-party caveat
    pub fn first_party(condition: impl Into<String>) -> Self {
        Self {
            location: String::new(),
            caveat_id: condition.into(),
            verification_id: Vec::new(),
        }
    }

    /// Creates a new third-party caveat
    pub fn third_party(
        caveat_id: impl Into<String>,
        verification_id: impl Into<Vec<u8>>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            caveat_id: caveat_id.into(),
            verification_id: verification_id.into(),
        }
    }

    /// Returns true if this caveat must be discharged by a third party
    pub fn is_third_party(&self) -> bool {
        !self.verification_id.is_empty()
    }

    /// Returns true if this caveat is checked by the target service
    pub fn is_first_party(&self) -> bool {
        !self.is_third_party()
    }

    /// Converts this caveat into its serializable form
    pub fn to_doc(&self) -> CaveatDoc {
        self.clone().into()
    }
}

impl From<Caveat> for CaveatDoc {
    fn from(caveat: Caveat) -> Self {
        Self {
            vid: hex::encode(&caveat.verification_id),
            location: caveat.location,
            cid: caveat.caveat_id,
        }
    }
}

impl TryFrom<CaveatDoc> for Caveat {
    type Error = MacaroonError;

    fn try_from(doc: CaveatDoc) -> Result<Self> {
        let verification_id = hex::decode(&doc.vid).map_err(|e| {
            MacaroonError::DeserializationError(format!(
                "cannot decode verification id {:?}: {e}",
                doc.vid
            ))
        })?;

        Ok(Self {
            location: doc.location,
            caveat_id: doc.cid,
            verification_id,
        })
    }
}
