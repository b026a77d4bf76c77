//! Transaction parsing and signing-digest construction.
//!
//! The host sends already-decoded messages; this crate decides what the
//! user is shown, asks for approval through [`confirm::Confirm`], and
//! builds the exact bytes that get hashed and signed:
//!
//! - [`contracts`]: recognizers for known Ethereum contract calls
//! - [`eip712`]: typed structured-data hashing
//! - [`tendermint`]: Cosmos-family amino JSON, streamed into sha256
//! - [`eos`]: `fc::raw` serialization, streamed into sha256
//!
//! Everything that touches a private key goes through [`crypto::HdNode`].

pub mod abi;
pub mod bignum;
pub mod coins;
pub mod confirm;
pub mod contracts;
pub mod crypto;
pub mod eip712;
pub mod eos;
pub mod format;
pub mod registry;
pub mod tendermint;
pub mod thorchain;

pub use confirm::{ButtonRequest, Confirm};
pub use crypto::HdNode;
pub use txsign_common::{Policies, SignError};
