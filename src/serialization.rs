use crate::caveat::{Caveat, CaveatDoc};
use crate::crypto::SIGNATURE_SIZE;
use crate::{Macaroon, MacaroonError, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

/// Serializable document form of a macaroon
///
/// Every encoding below goes through this document, so the field names and
/// the hex encoding of `signature` and each caveat's `vid` are stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacaroonDoc {
    pub location: String,
    pub identifier: String,
    /// Hex-encoded signature
    pub signature: String,
    pub caveats: Vec<CaveatDoc>,
}

impl From<Macaroon> for MacaroonDoc {
    fn from(m: Macaroon) -> Self {
        Self {
            location: m.location,
            identifier: m.id,
            signature: hex::encode(m.signature),
            caveats: m.caveats.into_iter().map(CaveatDoc::from).collect(),
        }
    }
}

impl TryFrom<MacaroonDoc> for Macaroon {
    type Error = MacaroonError;

    fn try_from(doc: MacaroonDoc) -> Result<Self> {
        let mut signature = [0u8; SIGNATURE_SIZE];
        hex::decode_to_slice(&doc.signature, &mut signature).map_err(|e| {
            MacaroonError::DeserializationError(format!(
                "cannot decode macaroon signature {:?}: {e}",
                doc.signature
            ))
        })?;

        let caveats = doc
            .caveats
            .into_iter()
            .map(Caveat::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            location: doc.location,
            id: doc.identifier,
            caveats,
            signature,
        })
    }
}

impl Macaroon {
    /// Converts this macaroon into its document form
    pub fn to_doc(&self) -> MacaroonDoc {
        self.clone().into()
    }

    /// Serializes this macaroon to JSON
    ///
    /// # Example
    /// ```
    /// use macaroon::Macaroon;
    ///
    /// let mut m = Macaroon::new(b"secret", "my-identifier", "http://example.com/");
    /// m.add_first_party_caveat("account = alice");
    ///
    /// let json = m.to_json().unwrap();
    /// assert!(json.contains("\"cid\":\"account = alice\""));
    /// ```
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| MacaroonError::DeserializationError(e.to_string()))
    }

    /// Serializes this macaroon to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MacaroonError::DeserializationError(e.to_string()))
    }

    /// Deserializes a macaroon from JSON
    ///
    /// # Example
    /// ```
    /// use macaroon::Macaroon;
    ///
    /// let original = Macaroon::new(b"secret", "my-identifier", "http://example.com/");
    /// let json = original.to_json().unwrap();
    ///
    /// let deserialized = Macaroon::from_json(&json).unwrap();
    /// assert_eq!(original, deserialized);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MacaroonError::DeserializationError(e.to_string()))
    }

    /// Serializes this macaroon to MessagePack binary format
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| MacaroonError::DeserializationError(e.to_string()))
    }

    /// Deserializes a macaroon from MessagePack binary format
    pub fn from_msgpack(data: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(data).map_err(|e| MacaroonError::DeserializationError(e.to_string()))
    }

    /// Serializes this macaroon to URL-safe base64 (no padding) over MessagePack,
    /// suitable for HTTP headers and cookies
    pub fn to_base64(&self) -> Result<String> {
        let msgpack = self.to_msgpack()?;
        Ok(URL_SAFE_NO_PAD.encode(&msgpack))
    }

    /// Deserializes a macaroon from the output of [`Macaroon::to_base64`]
    pub fn from_base64(b64: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(b64.as_bytes())
            .map_err(|e| MacaroonError::DeserializationError(e.to_string()))?;
        Self::from_msgpack(&bytes)
    }

    /// Serializes this macaroon to a hex string over MessagePack
    pub fn to_hex(&self) -> Result<String> {
        let msgpack = self.to_msgpack()?;
        Ok(hex::encode(&msgpack))
    }

    /// Deserializes a macaroon from the output of [`Macaroon::to_hex`]
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let msgpack = hex::decode(hex_str)
            .map_err(|e| MacaroonError::DeserializationError(e.to_string()))?;
        Self::from_msgpack(&msgpack)
    }
}
