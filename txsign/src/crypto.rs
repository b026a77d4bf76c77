//! Cryptographic primitives used by the signers.
//!
//! This module provides:
//! - Keccak256, SHA-256 and HASH160 digests
//! - BIP32 key derivation into an [`HdNode`]
//! - Deterministic ECDSA over secp256k1, with a retry loop for chains
//!   that accept only a subset of signatures
//! - EIP-55 / RSKIP-60 address checksums
//!
//! # Security
//!
//! - Private keys live only inside [`HdNode`] and [`Seed`], both zeroized on drop
//! - Signing is RFC6979 deterministic; no RNG is consulted

use k256::{
    ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
    FieldBytes,
};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use tiny_keccak::{Hasher as KeccakHasher, Keccak};
use txsign_common::{Bip32Path, EthAddress, Hash256, SignError};
use zeroize::Zeroize;

/// Upper bound on nonce retries in [`HdNode::sign_digest_canonical`].
pub const MAX_SIGN_ATTEMPTS: u32 = 256;

// =============================================================================
// Digests
// =============================================================================

/// Keccak256 hash function as used by Ethereum.
pub fn keccak256(data: &[u8]) -> Hash256 {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Streaming Keccak256 hasher.
pub struct Keccak256Hasher {
    inner: Keccak,
}

impl Keccak256Hasher {
    pub fn new() -> Self {
        Self {
            inner: Keccak::v256(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    pub fn finalize(self) -> Hash256 {
        let mut output = [0u8; 32];
        self.inner.finalize(&mut output);
        output
    }
}

impl Default for Keccak256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

pub fn sha256(data: &[u8]) -> Hash256 {
    Sha256::digest(data).into()
}

/// RIPEMD160(SHA256(data)), the Bitcoin-style public key hash.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

// =============================================================================
// Key Derivation
// =============================================================================

/// BIP39 seed for key derivation.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Seed([u8; 64]);

impl Seed {
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(*bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// Anything that can hand out a derived node for a path.
///
/// Implemented by [`Seed`]; a secure element or remote keystore would
/// implement it the same way.
pub trait KeySource {
    fn derive_node(&self, path: &Bip32Path) -> Result<HdNode, SignError>;
}

impl KeySource for Seed {
    fn derive_node(&self, path: &Bip32Path) -> Result<HdNode, SignError> {
        use bip32::{ChildNumber, XPrv};

        let mut xprv = XPrv::new(self.as_bytes()).map_err(|_| SignError::KeyDerivationFailed)?;

        for &component in path.as_slice() {
            let hardened = component & Bip32Path::HARDENED != 0;
            let child = ChildNumber::new(component & !Bip32Path::HARDENED, hardened)
                .map_err(|_| SignError::InvalidDerivationPath)?;
            xprv = xprv
                .derive_child(child)
                .map_err(|_| SignError::KeyDerivationFailed)?;
        }

        let mut private_key: [u8; 32] = xprv.private_key().to_bytes().into();
        let node = HdNode::from_private_key(&private_key);
        private_key.zeroize();
        node
    }
}

/// A derived secp256k1 key pair.
///
/// The signing key zeroizes itself on drop.
#[derive(Clone)]
pub struct HdNode {
    signing_key: SigningKey,
    public_key: [u8; 33],
}

impl HdNode {
    /// Builds a node from a raw 32-byte private key.
    ///
    /// Zero and out-of-range keys are rejected.
    pub fn from_private_key(bytes: &[u8; 32]) -> Result<Self, SignError> {
        let signing_key = SigningKey::from_bytes(FieldBytes::from_slice(bytes))
            .map_err(|_| SignError::KeyDerivationFailed)?;
        let encoded = signing_key.verifying_key().to_encoded_point(true);
        let mut public_key = [0u8; 33];
        public_key.copy_from_slice(encoded.as_bytes());
        Ok(Self {
            signing_key,
            public_key,
        })
    }

    /// Compressed SEC1 public key.
    pub fn public_key(&self) -> &[u8; 33] {
        &self.public_key
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// keccak256(uncompressed_pubkey[1..])[12..]
    pub fn ethereum_address(&self) -> EthAddress {
        verifying_key_to_address(self.verifying_key())
    }

    /// Signs a 32-byte digest. Returns (r || s, recovery id).
    pub fn sign_digest(&self, digest: &Hash256) -> Result<([u8; 64], u8), SignError> {
        self.sign_digest_canonical(digest, |_| true)
    }

    /// Signs a digest, retrying with fresh RFC6979 additional data until
    /// `is_canonical` accepts the signature.
    ///
    /// The first attempt uses no additional data, so for an always-true
    /// predicate the result equals plain RFC6979.
    pub fn sign_digest_canonical<F>(
        &self,
        digest: &Hash256,
        is_canonical: F,
    ) -> Result<([u8; 64], u8), SignError>
    where
        F: Fn(&[u8; 64]) -> bool,
    {
        use k256::ecdsa::hazmat::SignPrimitive;

        let scalar: &k256::Scalar = self.signing_key.as_nonzero_scalar().as_ref();
        let z = FieldBytes::clone_from_slice(digest);

        for attempt in 0..MAX_SIGN_ATTEMPTS {
            let counter = attempt.to_be_bytes();
            let ad: &[u8] = if attempt == 0 { &[] } else { &counter };

            let (sig, recid) = scalar
                .try_sign_prehashed_rfc6979::<Sha256>(&z, ad)
                .map_err(|_| SignError::SigningFailed)?;
            let recid = recid.ok_or(SignError::SigningFailed)?;

            let mut compact = [0u8; 64];
            compact.copy_from_slice(&sig.to_bytes());
            if is_canonical(&compact) {
                return Ok((compact, recid.to_byte()));
            }
            log::debug!("signature attempt {} not canonical, retrying", attempt);
        }

        Err(SignError::SigningFailed)
    }
}

/// Ethereum address of a public key.
pub fn verifying_key_to_address(key: &VerifyingKey) -> EthAddress {
    let encoded = key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Recovers the signer address of a digest from r || s and a recovery id.
pub fn recover_address(
    digest: &Hash256,
    compact: &[u8; 64],
    recid: u8,
) -> Result<EthAddress, SignError> {
    let sig = K256Signature::from_slice(compact).map_err(|_| SignError::CryptoError)?;
    let recid = RecoveryId::from_byte(recid).ok_or(SignError::CryptoError)?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recid)
        .map_err(|_| SignError::CryptoError)?;
    Ok(verifying_key_to_address(&key))
}

// =============================================================================
// Address Formatting
// =============================================================================

/// EIP-55 checksummed hex of an address, without the `0x` prefix.
///
/// RSK mainnet (30) and testnet (31) mix the chain id into the hashed
/// text per RSKIP-60.
pub fn checksum_address(address: &EthAddress, chain_id: u32) -> String {
    let hex_lower = hex::encode(address);
    let hash = match chain_id {
        30 | 31 => keccak256(format!("{}0x{}", chain_id, hex_lower).as_bytes()),
        _ => keccak256(hex_lower.as_bytes()),
    };

    hex_lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0F
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

/// `0x` + [`checksum_address`].
pub fn format_address(address: &EthAddress, chain_id: u32) -> String {
    format!("0x{}", checksum_address(address, chain_id))
}
