//! Error types for the signing core.
//!
//! Codes are stable across the host boundary. Messages are terse: the host
//! learns which class of failure occurred, not where in the payload.

use alloc::string::{String, ToString};
use core::fmt;
use num_derive::{FromPrimitive, ToPrimitive};
use rkyv::{Archive, Deserialize, Serialize};

/// Error codes for the signing core.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[archive(check_bytes)]
#[repr(u32)]
pub enum SignError {
    /// User pressed cancel on a confirmation prompt.
    RejectedByUser = 0x01,

    /// A device policy forbids the operation (e.g. advanced mode is off).
    PolicyDisabled = 0x02,

    /// A field is malformed or out of range.
    InvalidData = 0x04,

    /// Payload is shorter than a field offset requires.
    BufferTooShort = 0x05,

    /// Derivation path is not acceptable for this chain.
    InvalidDerivationPath = 0x0C,

    /// Key derivation failed or produced an invalid key.
    KeyDerivationFailed = 0x0D,

    /// No usable signature could be produced.
    SigningFailed = 0x0E,

    /// Transaction fields are inconsistent.
    InvalidTransaction = 0x0F,

    /// Typed-data document rejected by the hasher.
    InvalidTypedData = 0x12,

    /// Operation not valid in the current session state.
    InvalidState = 0x13,

    /// A length cap was exceeded.
    BufferOverflow = 0x15,

    /// Confirmation collaborator failed.
    UiError = 0x19,

    /// Point decoding or key recovery failed.
    CryptoError = 0x1A,

    /// Ticker matches more than one registry entry.
    AmbiguousTicker = 0x20,

    /// Ticker matches no registry entry.
    TickerNotFound = 0x21,

    /// Nesting exceeds the recursion limit.
    RecursionLimit = 0x22,

    /// Too many user-defined types referenced.
    TooManyUserTypes = 0x23,

    /// Address failed to decode or does not match.
    InvalidAddress = 0x24,

    /// Action is recognized but has no decoder.
    UnsupportedAction = 0x26,
}

impl SignError {
    /// Stable numeric code.
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Returns true if this is a user-initiated rejection.
    #[inline]
    pub fn is_user_rejection(self) -> bool {
        matches!(self, SignError::RejectedByUser)
    }

    /// Returns true if the payload itself was bad.
    #[inline]
    pub fn is_malformed_input(self) -> bool {
        matches!(
            self,
            SignError::InvalidData
                | SignError::BufferTooShort
                | SignError::InvalidTransaction
                | SignError::InvalidTypedData
                | SignError::InvalidAddress
                | SignError::InvalidDerivationPath
        )
    }

    /// Returns true if a fixed resource bound was hit.
    #[inline]
    pub fn is_resource_exhaustion(self) -> bool {
        matches!(
            self,
            SignError::BufferOverflow
                | SignError::RecursionLimit
                | SignError::TooManyUserTypes
                | SignError::AmbiguousTicker
        )
    }
}

impl fmt::Display for SignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignError::RejectedByUser => write!(f, "Signing cancelled by user"),
            SignError::PolicyDisabled => write!(f, "Policy disabled"),
            SignError::InvalidData => write!(f, "Invalid data"),
            SignError::BufferTooShort => write!(f, "Buffer too short"),
            SignError::InvalidDerivationPath => write!(f, "Invalid derivation path"),
            SignError::KeyDerivationFailed => write!(f, "Failed to derive private key"),
            SignError::SigningFailed => write!(f, "Signing failed"),
            SignError::InvalidTransaction => write!(f, "Invalid transaction"),
            SignError::InvalidTypedData => write!(f, "Invalid typed data"),
            SignError::InvalidState => write!(f, "Not in signing mode"),
            SignError::BufferOverflow => write!(f, "Buffer overflow"),
            SignError::UiError => write!(f, "UI error"),
            SignError::CryptoError => write!(f, "Crypto error"),
            SignError::AmbiguousTicker => write!(f, "Ambiguous ticker"),
            SignError::TickerNotFound => write!(f, "Unknown ticker"),
            SignError::RecursionLimit => write!(f, "Nesting too deep"),
            SignError::TooManyUserTypes => write!(f, "Too many user types"),
            SignError::InvalidAddress => write!(f, "Invalid address"),
            SignError::UnsupportedAction => write!(f, "Unsupported action"),
        }
    }
}

// =============================================================================
// Host-visible failure
// =============================================================================

/// Failure class reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
#[repr(u8)]
pub enum FailureType {
    /// The human (or a policy acting for them) said no.
    ActionCancelled = 1,
    /// The data was bad.
    SyntaxError = 2,
    /// Anything else.
    Other = 3,
}

/// The single failure message the host sees.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct Failure {
    pub kind: FailureType,
    pub message: String,
}

impl From<SignError> for Failure {
    fn from(err: SignError) -> Self {
        let kind = if err.is_user_rejection() || err == SignError::PolicyDisabled {
            FailureType::ActionCancelled
        } else if err.is_malformed_input() || err.is_resource_exhaustion() {
            FailureType::SyntaxError
        } else {
            FailureType::Other
        };
        Failure {
            kind,
            message: err.to_string(),
        }
    }
}
