use thiserror::Error;

/// Errors that can occur when minting, attenuating, verifying or discharging macaroons
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MacaroonError {
    /// Authenticated decryption failed (wrong key or tampered ciphertext)
    #[error("Cannot decrypt: authentication failed")]
    DecryptError,

    /// Authenticated encryption failed
    #[error("Cannot encrypt")]
    EncryptError,

    /// A text-encoded value could not be decoded
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// A decrypted third-party caveat id payload is structurally invalid
    #[error("Invalid third-party caveat payload: {0}")]
    PayloadFormatError(String),

    /// No discharge macaroon was supplied for a third-party caveat
    #[error("Cannot find discharge macaroon for caveat {caveat_id:?}")]
    DischargeNotFound { caveat_id: String },

    /// A first-party caveat condition does not hold
    #[error("Caveat not satisfied: {0}")]
    CaveatNotSatisfied(String),

    /// A first-party caveat condition could not be evaluated
    #[error("Cannot check caveat {condition:?}: {reason}")]
    CheckerIndeterminate { condition: String, reason: String },

    /// A discharge macaroon transitively requires itself
    #[error("Discharge macaroon {0:?} is used recursively")]
    RecursiveDischarge(String),

    /// The recomputed signature chain does not match the macaroon's signature
    #[error("Signature mismatch after caveat verification")]
    SignatureMismatch,

    /// A discharger was handed a caveat id it cannot decode
    #[error("Discharger cannot decode caveat id: {0}")]
    CannotDecodeCaveatId(String),

    /// No shared secret is known for a third-party location
    #[error("No third-party secret for location {0:?}")]
    UnknownThirdPartyLocation(String),

    /// A caveat condition is not of the form `key op value`
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    /// Failed to serialize or deserialize a macaroon
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}
