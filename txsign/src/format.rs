//! Display formatting for amounts, words and timestamps.

use chrono::DateTime;
use txsign_common::Bip32Path;

use crate::bignum::U256;
use crate::registry::TokenType;

/// Native amounts below this many wei are shown in wei.
const WEI_DISPLAY_THRESHOLD: u64 = 1_000_000_000;

/// Ticker suffix for the native currency of an EVM chain.
pub fn native_suffix(chain_id: u32) -> &'static str {
    match chain_id {
        1 => " ETH",
        2 => " EXP",
        3 => " tROP",
        4 => " tRIN",
        8 => " UBQ",
        20 => " EOSC",
        28 => " ETSC",
        30 => " RBTC",
        31 => " tRBTC",
        42 => " tKOV",
        61 => " ETC",
        62 => " tETC",
        64 => " ELLA",
        820 => " CLO",
        1987 => " EGEM",
        _ => " UNKN",
    }
}

/// Formats an amount for display.
///
/// `None` means the chain's native currency (18 decimals, or wei for tiny
/// values). The unknown-token sentinel renders as "Unknown token value",
/// since its decimals are meaningless.
pub fn format_amount(amount: &U256, token: Option<&TokenType>, chain_id: u32) -> String {
    match token {
        Some(t) if t.is_unknown() => "Unknown token value".to_string(),
        Some(t) => format!("{}{}", amount.to_fixed_point(t.decimals as u32), t.ticker),
        None if *amount < U256::from_u64(WEI_DISPLAY_THRESHOLD) => {
            format!("{} Wei", amount.to_decimal())
        }
        None => format!("{}{}", amount.to_fixed_point(18), native_suffix(chain_id)),
    }
}

/// True for the all-0xFF word used as an "unlimited" allowance.
pub fn is_full_balance(word: &[u8; 32]) -> bool {
    word.iter().all(|&b| b == 0xff)
}

/// Renders seconds since the epoch the way C `ctime` does, minus the
/// trailing newline. Values chrono cannot represent fall back to the number.
pub fn format_ctime(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|dt| dt.format("%a %b %e %H:%M:%S %Y").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// `m/48'/4'/0'`, hardened components marked with `'`.
pub fn format_path(path: &Bip32Path) -> String {
    let mut out = String::from("m");
    for &c in path.as_slice() {
        out.push_str(&format!("/{}", c & !Bip32Path::HARDENED));
        if c & Bip32Path::HARDENED != 0 {
            out.push('\'');
        }
    }
    out
}

/// Check if a string contains only printable ASCII.
pub fn is_printable_ascii(s: &[u8]) -> bool {
    s.iter().all(|&b| (0x20..=0x7e).contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn test_native_amounts() {
        assert_eq!(format_amount(&U256::from_u64(12), None, 1), "12 Wei");
        assert_eq!(
            format_amount(&U256::from_u64(1_500_000_000_000_000_000), None, 1),
            "1.5 ETH"
        );
        assert_eq!(
            format_amount(&U256::from_u64(2_000_000_000_000_000_000), None, 61),
            "2 ETC"
        );
        assert_eq!(
            format_amount(&U256::from_u64(1_000_000_000), None, 9999),
            "0.000000001 UNKN"
        );
    }

    #[test]
    fn test_token_amounts() {
        let reg = Registry::new();
        let usdc = reg.by_ticker(1, "USDC").unwrap();
        assert_eq!(format_amount(&U256::from_u64(1_250_000), Some(usdc), 1), "1.25 USDC");
        assert_eq!(
            format_amount(&U256::from_u64(5), Some(reg.unknown()), 1),
            "Unknown token value"
        );
    }

    #[test]
    fn test_full_balance() {
        assert!(is_full_balance(&[0xff; 32]));
        let mut almost = [0xff; 32];
        almost[31] = 0xfe;
        assert!(!is_full_balance(&almost));
    }

    #[test]
    fn test_ctime() {
        assert_eq!(format_ctime(0), "Thu Jan  1 00:00:00 1970");
        assert_eq!(format_ctime(1_600_000_000), "Sun Sep 13 12:26:40 2020");
        assert_eq!(format_ctime(u64::MAX), u64::MAX.to_string());
    }

    #[test]
    fn test_path_string() {
        let path = Bip32Path::from_slice(&[48 | Bip32Path::HARDENED, 4 | Bip32Path::HARDENED, 0, 7]);
        assert_eq!(format_path(&path), "m/48'/4'/0/7");
        assert_eq!(format_path(&Bip32Path::new()), "m");
    }

    #[test]
    fn test_printable_ascii() {
        assert!(is_printable_ascii(b"abc ~"));
        assert!(!is_printable_ascii(b"\x00"));
    }
}
