//! EOSIO names, assets and public keys as text.

use ripemd::{Digest, Ripemd160};
use txsign_common::{EosAsset, SignError};

pub const ACCOUNT_EOSIO: u64 = 0x5530ea0000000000;
pub const ACCOUNT_EOSIO_TOKEN: u64 = 0x5530ea033482a600;

pub const ACTION_TRANSFER: u64 = 0xcdcd3c2d57000000;
pub const ACTION_DELEGATEBW: u64 = 0x4aa2a61b2a3f0000;
pub const ACTION_UNDELEGATEBW: u64 = 0xd4d2a8a986ca8fc0;
pub const ACTION_REFUND: u64 = 0xba97a9a400000000;
pub const ACTION_BUYRAM: u64 = 0x3ebd734800000000;
pub const ACTION_BUYRAMBYTES: u64 = 0x3ebd7348fecab000;
pub const ACTION_SELLRAM: u64 = 0xc2a31b9a40000000;
pub const ACTION_VOTEPRODUCER: u64 = 0xdd32aade89d21570;
pub const ACTION_UPDATEAUTH: u64 = 0xd5526ca8dacb4000;
pub const ACTION_DELETEAUTH: u64 = 0x4aa2aca8dacb4000;
pub const ACTION_LINKAUTH: u64 = 0x8ba7036b2d000000;
pub const ACTION_UNLINKAUTH: u64 = 0xd4e2e9c0dacb4000;
pub const ACTION_NEWACCOUNT: u64 = 0x9ab864229a9e4000;

pub const PERMISSION_OWNER: u64 = 0xa726ab8000000000;
pub const PERMISSION_ACTIVE: u64 = 0x3232eda800000000;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Renders a name, dropping trailing dots.
pub fn format_name(name: u64) -> String {
    let mut out = [b'.'; 13];
    let mut tmp = name;
    for i in 0..13 {
        let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
        out[12 - i] = CHARMAP[(tmp & mask) as usize];
        tmp >>= shift;
    }
    let len = out.iter().rposition(|&c| c != b'.').map_or(0, |i| i + 1);
    out[..len].iter().map(|&c| char::from(c)).collect()
}

fn symbol_value(c: u8) -> Option<u64> {
    match c {
        b'.' => Some(0),
        b'1'..=b'5' => Some(u64::from(c - b'1') + 1),
        b'a'..=b'z' => Some(u64::from(c - b'a') + 6),
        _ => None,
    }
}

/// Parses a name. The thirteenth character only has four bits.
pub fn parse_name(s: &str) -> Option<u64> {
    let bytes = s.as_bytes();
    if bytes.len() > 13 {
        return None;
    }
    let mut value = 0u64;
    for (i, &c) in bytes.iter().enumerate() {
        let v = symbol_value(c)?;
        if i < 12 {
            value |= (v & 0x1f) << (64 - 5 * (i + 1));
        } else {
            if v > 0x0f {
                return None;
            }
            value |= v;
        }
    }
    Some(value)
}

/// Renders an asset as `"<amount> <SYMBOL>"`, e.g. `1.0000 EOS`.
///
/// The low byte of the symbol is the precision, the other seven bytes
/// are the upper-case code, zero padded.
pub fn format_asset(asset: &EosAsset) -> Result<String, SignError> {
    let precision = (asset.symbol & 0xff) as usize;

    let mut code = String::new();
    for i in 1..8 {
        let c = (asset.symbol >> (8 * i)) as u8;
        match c {
            0 => {}
            b'A'..=b'Z' => code.push(char::from(c)),
            _ => return Err(SignError::InvalidData),
        }
    }

    let mut digits = asset.amount.unsigned_abs().to_string();
    if precision > 0 {
        if digits.len() <= precision {
            digits = format!("{:0>width$}", digits, width = precision + 1);
        }
        digits.insert(digits.len() - precision, '.');
    }

    let sign = if asset.amount < 0 { "-" } else { "" };
    Ok(format!("{}{} {}", sign, digits, code))
}

/// Text form of a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicKeyKind {
    /// `EOS...`
    Eos,
    /// `EOS_K1_...`
    EosK1,
}

/// Prefix + base58(key || ripemd160(key)[..4]).
pub fn public_key_to_wif(public_key: &[u8; 33], kind: PublicKeyKind) -> String {
    let prefix = match kind {
        PublicKeyKind::Eos => "EOS",
        PublicKeyKind::EosK1 => "EOS_K1_",
    };
    let checksum = Ripemd160::digest(public_key);
    let mut payload = Vec::with_capacity(37);
    payload.extend_from_slice(public_key);
    payload.extend_from_slice(&checksum[..4]);
    format!("{}{}", prefix, bs58::encode(payload).into_string())
}
