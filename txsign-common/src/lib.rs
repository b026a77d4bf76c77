//! Shared types for the transaction signing core.
//!
//! Everything here is decoded from host messages and therefore
//! untrusted; validation happens in `txsign` at the point of use.

#![no_std]

extern crate alloc;

pub mod error;
pub mod types;

pub use error::{Failure, FailureType, SignError};
pub use types::*;
