//! ABI calldata reader.
//!
//! Calldata is a 4-byte selector followed by 32-byte words. Every read
//! here is bounds-checked and returns `None` past the end of the buffer,
//! so decoders follow a guard-then-read pattern without ever indexing
//! raw slices themselves.
//!
//! A *proxy call* wraps another call: `execute(address,bytes)`
//! (`0x1cff79cd`) carries the target in word 0, the offset of the
//! payload (always 64) in word 1, the payload length in word 2, and the
//! inner call itself after that. [`Calldata::param`] and
//! [`Calldata::is_method`] transparently look through one level of it.

use hex_literal::hex;
use txsign_common::{EthAddress, EthereumSignTx, Selector};

use crate::bignum::U256;

pub const SELECTOR_LEN: usize = 4;
pub const WORD_LEN: usize = 32;

/// `execute(address,bytes)`
pub const PROXY_CALL_SELECTOR: Selector = hex!("1cff79cd");

/// Byte offset of the inner selector in a proxy call.
const PROXIED_SELECTOR_OFFSET: usize = SELECTOR_LEN + 3 * WORD_LEN;

/// Read-only view over the calldata of a transaction.
#[derive(Debug, Clone, Copy)]
pub struct Calldata<'a> {
    data: &'a [u8],
}

impl<'a> Calldata<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn of(msg: &'a EthereumSignTx) -> Self {
        Self::new(&msg.data_initial_chunk)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// `len` bytes at `offset`, if they are all inside the buffer.
    pub fn bytes(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        let end = offset.checked_add(len)?;
        self.data.get(offset..end)
    }

    fn array<const N: usize>(&self, offset: usize) -> Option<&'a [u8; N]> {
        self.bytes(offset, N)?.try_into().ok()
    }

    /// The 32-byte word at a byte offset.
    pub fn word_at(&self, offset: usize) -> Option<&'a [u8; 32]> {
        self.array::<32>(offset)
    }

    pub fn selector(&self) -> Option<&'a Selector> {
        self.array::<4>(0)
    }

    pub fn selector_is(&self, selector: &Selector) -> bool {
        self.selector() == Some(selector)
    }

    /// Word `idx` of the outer call, ignoring any proxy wrapping.
    pub fn raw_param(&self, idx: usize) -> Option<&'a [u8; 32]> {
        self.word_at(param_offset(0, idx)?)
    }

    /// Exactly `count` words follow the selector.
    pub fn has_params(&self, count: usize) -> bool {
        param_offset(0, count) == Some(self.data.len())
    }

    /// Outer call is `execute(address,bytes)` with a well-formed payload header.
    pub fn is_proxy_call(&self) -> bool {
        if !self.selector_is(&PROXY_CALL_SELECTOR) {
            return false;
        }
        let offset = match self.raw_param(1).and_then(word_to_u32) {
            Some(v) => v,
            None => return false,
        };
        if offset != 64 {
            return false;
        }
        let length = match self.raw_param(2).and_then(word_to_u32) {
            Some(v) => v as usize,
            None => return false,
        };
        length >= SELECTOR_LEN
            && PROXIED_SELECTOR_OFFSET
                .checked_add(length)
                .map_or(false, |end| end <= self.data.len())
    }

    pub fn proxied_selector(&self) -> Option<&'a Selector> {
        self.array::<4>(PROXIED_SELECTOR_OFFSET)
    }

    /// At least `count` words follow the inner selector, all inside the
    /// declared payload length. Bytes past that length are padding.
    pub fn has_proxied_params(&self, count: usize) -> bool {
        let length = match self.raw_param(2).and_then(word_to_u32) {
            Some(v) => v as usize,
            None => return false,
        };
        param_offset(0, count).map_or(false, |needed| needed <= length)
    }

    /// Word `idx` of the effective call: the inner call for a proxy
    /// call, the outer one otherwise.
    pub fn param(&self, idx: usize) -> Option<&'a [u8; 32]> {
        if self.is_proxy_call() {
            self.word_at(param_offset(PROXIED_SELECTOR_OFFSET, idx)?)
        } else {
            self.raw_param(idx)
        }
    }

    /// The effective call has this selector and `count` arguments.
    ///
    /// A direct call must be exactly `4 + 32 * count` bytes; a proxied
    /// one must have at least that many inner words.
    pub fn is_method(&self, selector: &Selector, count: usize) -> bool {
        if self.is_proxy_call() {
            self.has_proxied_params(count) && self.proxied_selector() == Some(selector)
        } else {
            self.has_params(count) && self.selector_is(selector)
        }
    }

    /// Start and length field of the dynamic value whose offset sits in
    /// outer word `idx`.
    fn tail(&self, idx: usize) -> Option<(usize, usize)> {
        let offset = word_to_u32(self.raw_param(idx)?)? as usize;
        let len_at = SELECTOR_LEN.checked_add(offset)?;
        let len = word_to_u32(self.word_at(len_at)?)? as usize;
        Some((len_at.checked_add(WORD_LEN)?, len))
    }

    /// The `bytes` argument referenced by word `idx`, if wholly present.
    pub fn dynamic_bytes(&self, idx: usize) -> Option<&'a [u8]> {
        let (start, len) = self.tail(idx)?;
        self.bytes(start, len)
    }

    /// The elements of the static-word array referenced by word `idx`,
    /// if all of them are present.
    pub fn dynamic_words(&self, idx: usize) -> Option<Vec<&'a [u8; 32]>> {
        let (start, len) = self.tail(idx)?;
        self.bytes(start, len.checked_mul(WORD_LEN)?)?;
        (0..len)
            .map(|i| self.word_at(start + i * WORD_LEN))
            .collect()
    }
}

/// Byte offset of word `idx` after a selector at `base`.
fn param_offset(base: usize, idx: usize) -> Option<usize> {
    idx.checked_mul(WORD_LEN)?
        .checked_add(base)?
        .checked_add(SELECTOR_LEN)
}

/// The address in a word, if the 12 padding bytes are zero.
pub fn word_to_address(word: &[u8; 32]) -> Option<&EthAddress> {
    if word[..12].iter().any(|&b| b != 0) {
        return None;
    }
    word[12..].try_into().ok()
}

/// The low 20 bytes of a word, without checking the padding.
pub fn word_low_address(word: &[u8; 32]) -> EthAddress {
    let mut out = [0u8; 20];
    out.copy_from_slice(&word[12..]);
    out
}

/// The word as u32 if its value fits in 32 bits.
pub fn word_to_u32(word: &[u8; 32]) -> Option<u32> {
    U256::from_be_bytes(word).to_u32()
}

pub fn word_to_u256(word: &[u8; 32]) -> U256 {
    U256::from_be_bytes(word)
}

/// Left-pads a big-endian value of at most 32 bytes.
pub fn value_to_u256(value: &[u8]) -> Option<U256> {
    U256::from_be_slice(value)
}

/// The 20-byte `to` of a transaction, if it has one.
pub fn to_address(msg: &EthereumSignTx) -> Option<&EthAddress> {
    msg.to.as_slice().try_into().ok()
}
