//! Message types consumed by the signing core.
//!
//! These arrive already decoded from the host. They cross a trust
//! boundary, so nothing here is assumed valid: every field is checked by
//! the component that reads it.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use rkyv::{Archive, Deserialize, Serialize};
use zeroize::Zeroize;

/// Deepest derivation path the device accepts.
pub const MAX_BIP32_PATH_DEPTH: usize = 10;

/// Maximum size of the first calldata chunk of an Ethereum transaction.
pub const MAX_DATA_INITIAL_CHUNK: usize = 9216;

/// Ethereum address (20 bytes).
pub type EthAddress = [u8; 20];

/// Keccak256 or SHA-256 digest (32 bytes).
pub type Hash256 = [u8; 32];

/// Function selector (4 bytes).
pub type Selector = [u8; 4];

// =============================================================================
// BIP32 Path
// =============================================================================

/// BIP32 derivation path.
///
/// Hardened indices have the 0x80000000 bit set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize, Zeroize)]
#[archive(check_bytes)]
pub struct Bip32Path {
    /// Child indices, root first.
    pub components: Vec<u32>,
}

impl Bip32Path {
    /// Bit 31.
    pub const HARDENED: u32 = 0x80000000;

    /// `m`.
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    pub fn from_slice(path: &[u32]) -> Self {
        Self {
            components: path.to_vec(),
        }
    }

    /// Creates a BIP44 path m/44'/coin'/account'/0/index.
    pub fn bip44(coin_type: u32, account: u32, index: u32) -> Self {
        Self {
            components: vec![
                44 | Self::HARDENED,
                coin_type | Self::HARDENED,
                account | Self::HARDENED,
                0,
                index,
            ],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.components
    }

    /// Checks m/44'/coin'/account'/0/x, the Cosmos-SDK account layout.
    ///
    /// `coin_path` is the hardened BIP44 coin component. With
    /// `zero_index` the last component must be exactly 0, otherwise it
    /// only has to be non-hardened.
    pub fn matches_cosmos_layout(&self, coin_path: u32, zero_index: bool) -> bool {
        let p = self.as_slice();
        if p.len() != 5 {
            return false;
        }
        if p[0] != (44 | Self::HARDENED) || p[1] != coin_path {
            return false;
        }
        if p[2] & Self::HARDENED == 0 || p[3] != 0 {
            return false;
        }
        if zero_index {
            p[4] == 0
        } else {
            p[4] & Self::HARDENED == 0
        }
    }
}

// =============================================================================
// Signature
// =============================================================================

/// Recoverable ECDSA signature (v, r, s).
///
/// `v` carries whatever offset the target chain expects
/// (27 + recid for EIP-712, 31 + recid for EOS, unused for Tendermint).
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize, Zeroize)]
#[archive(check_bytes)]
pub struct Signature {
    pub v: u8,
    pub r: [u8; 32],
    /// Low-S.
    pub s: [u8; 32],
}

impl Signature {
    /// Returns r || s.
    pub fn compact(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..].copy_from_slice(&self.s);
        bytes
    }

    /// `r || s || v`.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&self.compact());
        bytes[64] = self.v;
        bytes
    }

    /// Inverse of [`Signature::to_bytes`].
    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Self {
            v: bytes[64],
            r,
            s,
        }
    }
}

// =============================================================================
// Policies
// =============================================================================

/// Device policies consulted by the signing core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct Policies {
    /// Allows signing EOS actions that have no decoder.
    pub advanced_mode: bool,
    /// Makes `init` on an open session an error instead of an implicit abort.
    pub strict_session_init: bool,
}

// =============================================================================
// Ethereum
// =============================================================================

/// The part of an Ethereum transaction the contract decoders look at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct EthereumSignTx {
    pub address_n: Bip32Path,
    /// Destination; 20 bytes for a contract call, empty for deployment.
    pub to: Vec<u8>,
    /// Big-endian value in wei, at most 32 bytes.
    pub value: Vec<u8>,
    pub data_initial_chunk: Vec<u8>,
    /// Total calldata length announced by the host.
    pub data_length: u32,
    pub chain_id: u32,
    pub has_chain_id: bool,
}

// =============================================================================
// Tendermint / Cosmos
// =============================================================================

/// Opens a Tendermint-family signing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct TendermintSignTx {
    pub address_n: Bip32Path,
    pub account_number: u64,
    pub chain_id: String,
    pub fee_amount: u64,
    pub gas: u64,
    pub memo: String,
    pub sequence: u64,
    pub msg_count: u32,
    /// Selects the testnet address prefix where the chain has one.
    pub testnet: bool,
}

/// One message of a Tendermint-family transaction.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub enum TendermintMsg {
    Send {
        to_address: String,
        amount: u64,
    },
    Delegate {
        delegator_address: String,
        validator_address: String,
        amount: u64,
    },
    Undelegate {
        delegator_address: String,
        validator_address: String,
        amount: u64,
    },
    Redelegate {
        delegator_address: String,
        validator_src_address: String,
        validator_dst_address: String,
        amount: u64,
    },
    Rewards {
        delegator_address: String,
        validator_address: String,
        amount: Option<u64>,
    },
    IbcTransfer {
        sender: String,
        receiver: String,
        source_channel: String,
        source_port: String,
        revision_height: String,
        revision_number: String,
        denom: String,
        amount: u64,
    },
}

// =============================================================================
// EOS
// =============================================================================

/// EOS transaction header, in `fc::raw` field order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct EosTxHeader {
    /// Seconds since the Unix epoch, UTC.
    pub expiration: u32,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    /// 0 means unlimited.
    pub max_net_usage_words: u32,
    /// 0 means unlimited.
    pub max_cpu_usage_ms: u8,
    pub delay_sec: u32,
}

/// Opens an EOS signing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct EosSignTx {
    pub address_n: Bip32Path,
    pub chain_id: [u8; 32],
    pub header: EosTxHeader,
    pub num_actions: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct EosPermissionLevel {
    pub actor: u64,
    pub permission: u64,
}

/// Account, action name and authorizations shared by every action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct EosActionCommon {
    pub account: u64,
    pub name: u64,
    pub authorization: Vec<EosPermissionLevel>,
}

/// Amount plus symbol; the low byte of `symbol` is the precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct EosAsset {
    pub amount: i64,
    pub symbol: u64,
}

/// One key of an authority. Exactly one of `key` (33 compressed bytes)
/// and `address_n` (a key the device derives itself) is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct EosAuthorizationKey {
    /// `fc::static_variant` tag of the key; only 0 (K1) is accepted.
    pub key_type: u32,
    pub key: Vec<u8>,
    pub address_n: Bip32Path,
    pub weight: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct EosAuthorizationAccount {
    pub account: EosPermissionLevel,
    pub weight: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct EosAuthorizationWait {
    pub wait_sec: u32,
    pub weight: u16,
}

/// `eosio::authority`: weighted keys, accounts and delays against a
/// threshold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct EosAuthorization {
    pub threshold: u32,
    pub keys: Vec<EosAuthorizationKey>,
    pub accounts: Vec<EosAuthorizationAccount>,
    pub waits: Vec<EosAuthorizationWait>,
}

/// Action payloads the core knows how to decode, plus the opaque
/// fallback streamed in chunks.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub enum EosActionPayload {
    Transfer {
        sender: u64,
        receiver: u64,
        quantity: EosAsset,
        memo: String,
    },
    DelegateBw {
        sender: u64,
        receiver: u64,
        net_quantity: EosAsset,
        cpu_quantity: EosAsset,
        transfer: bool,
    },
    UndelegateBw {
        sender: u64,
        receiver: u64,
        net_quantity: EosAsset,
        cpu_quantity: EosAsset,
    },
    Refund {
        owner: u64,
    },
    BuyRam {
        payer: u64,
        receiver: u64,
        quantity: EosAsset,
    },
    BuyRamBytes {
        payer: u64,
        receiver: u64,
        bytes: u32,
    },
    SellRam {
        account: u64,
        bytes: u64,
    },
    VoteProducer {
        voter: u64,
        /// 0 when voting for producers directly.
        proxy: u64,
        producers: Vec<u64>,
    },
    UpdateAuth {
        account: u64,
        permission: u64,
        parent: u64,
        auth: EosAuthorization,
    },
    DeleteAuth {
        account: u64,
        permission: u64,
    },
    LinkAuth {
        account: u64,
        code: u64,
        link_type: u64,
        requirement: u64,
    },
    UnlinkAuth {
        account: u64,
        code: u64,
        link_type: u64,
    },
    NewAccount {
        creator: u64,
        name: u64,
        owner: EosAuthorization,
        active: EosAuthorization,
    },
    Unknown {
        /// Size of the whole serialized payload across all chunks.
        data_size: u32,
        data_chunk: Vec<u8>,
    },
}

/// One action of an EOS transaction.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct EosTxAction {
    pub common: EosActionCommon,
    pub payload: EosActionPayload,
}
