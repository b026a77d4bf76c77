//! Coin metadata table.

use txsign_common::Bip32Path;

use crate::bignum::U256;

const H: u32 = Bip32Path::HARDENED;

/// Per-coin constants needed for path checks, address encoding and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinType {
    pub coin_name: &'static str,
    pub coin_shortcut: &'static str,
    pub address_type: Option<u32>,
    pub address_type_p2sh: Option<u32>,
    pub signed_message_header: Option<&'static str>,
    /// Hardened BIP44 coin component.
    pub bip44_account_path: u32,
    pub forkid: Option<u32>,
    pub decimals: u8,
    pub contract_address: Option<[u8; 20]>,
    pub curve_name: &'static str,
    pub bech32_prefix: Option<&'static str>,
}

const fn coin(
    coin_name: &'static str,
    coin_shortcut: &'static str,
    bip44: u32,
    decimals: u8,
    bech32_prefix: Option<&'static str>,
) -> CoinType {
    CoinType {
        coin_name,
        coin_shortcut,
        address_type: None,
        address_type_p2sh: None,
        signed_message_header: None,
        bip44_account_path: bip44 | H,
        forkid: None,
        decimals,
        contract_address: None,
        curve_name: "secp256k1",
        bech32_prefix,
    }
}

pub static COINS: &[CoinType] = &[
    CoinType {
        address_type: Some(0),
        address_type_p2sh: Some(5),
        signed_message_header: Some("Bitcoin Signed Message:\n"),
        ..coin("Bitcoin", "BTC", 0, 8, Some("bc"))
    },
    CoinType {
        address_type: Some(48),
        address_type_p2sh: Some(50),
        signed_message_header: Some("Litecoin Signed Message:\n"),
        ..coin("Litecoin", "LTC", 2, 8, Some("ltc"))
    },
    CoinType {
        forkid: Some(1),
        ..coin("Ethereum", "ETH", 60, 18, None)
    },
    CoinType {
        forkid: Some(61),
        ..coin("Ethereum Classic", "ETC", 61, 18, None)
    },
    coin("Cosmos", "ATOM", 118, 6, Some("cosmos")),
    coin("THORChain", "RUNE", 931, 8, Some("thor")),
    coin("Osmosis", "OSMO", 118, 6, Some("osmo")),
    coin("Kujira", "KUJI", 118, 6, Some("kujira")),
    coin("EOS", "EOS", 194, 4, None),
];

pub fn coin_by_name(name: &str) -> Option<&'static CoinType> {
    COINS.iter().find(|c| c.coin_name == name)
}

pub fn coin_by_shortcut(shortcut: &str) -> Option<&'static CoinType> {
    COINS.iter().find(|c| c.coin_shortcut == shortcut)
}

/// "<amount> <shortcut>" with the coin's decimals.
pub fn coin_amount_to_string(coin: &CoinType, amount: u64) -> String {
    format!(
        "{} {}",
        U256::from_u64(amount).to_fixed_point(coin.decimals as u32),
        coin.coin_shortcut
    )
}
