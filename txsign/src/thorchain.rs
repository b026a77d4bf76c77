//! THORChain memo interpretation.
//!
//! Memos have the shape `tx:chain.asset:dest:limit`, e.g.
//! `SWAP:ETH.USDT-0xdac1...:0x41e5...:420`. Swaps, liquidity adds and
//! liquidity withdrawals are shown field by field; anything else is
//! reported as not understood so the caller can fall back to showing the
//! raw memo.

use txsign_common::SignError;

use crate::confirm::{require, ButtonRequest, Confirm};

/// Longest memo accepted for parsing.
pub const MAX_MEMO_SIZE: usize = 256;

const SWAP_TITLE: &str = "Thorchain swap";
const ADD_TITLE: &str = "Thorchain add liquidity";
const WITHDRAW_TITLE: &str = "Thorchain withdraw liquidity";

/// What a memo asks THORChain to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoAction<'a> {
    Swap {
        chain: &'a str,
        asset: &'a str,
        destination: &'a str,
        limit: &'a str,
    },
    AddLiquidity {
        chain: &'a str,
        asset: &'a str,
        pool: Option<&'a str>,
    },
    Withdraw {
        chain: &'a str,
        asset: &'a str,
        basis_points: i32,
    },
}

/// `strtok`-style cursor: skips leading delimiters, returns the next run
/// of non-delimiters with its byte offset, and steps over one delimiter.
struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn next(&mut self, delims: &[u8]) -> Option<(usize, &'a str)> {
        let bytes = self.src.as_bytes();
        let mut start = self.pos;
        while start < bytes.len() && delims.contains(&bytes[start]) {
            start += 1;
        }
        if start >= bytes.len() {
            self.pos = bytes.len();
            return None;
        }
        let mut end = start;
        while end < bytes.len() && !delims.contains(&bytes[end]) {
            end += 1;
        }
        self.pos = if end < bytes.len() { end + 1 } else { end };
        // Delimiters are ASCII, so both ends sit on char boundaries.
        self.src.get(start..end).map(|tok| (start, tok))
    }
}

/// Leading integer of `s` in the manner of C `atoi`; 0 when there is none.
fn leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (neg, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i32 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i32::from(b - b'0'));
    }
    if neg {
        value.saturating_neg()
    } else {
        value
    }
}

/// Cuts `memo` to the parse window without splitting a character.
fn window(memo: &str) -> &str {
    let mut end = memo.len().min(MAX_MEMO_SIZE - 1);
    while !memo.is_char_boundary(end) {
        end -= 1;
    }
    &memo[..end]
}

/// Parses a memo. `None` means it is not a recognized THORChain intent.
pub fn parse_memo(memo: &str) -> Option<MemoAction<'_>> {
    if memo.len() > MAX_MEMO_SIZE {
        return None;
    }
    let memo = window(memo);
    let mut tokens = Tokens::new(memo);

    let (_, tx) = tokens.next(b":")?;
    let (_, chain) = tokens.next(b":.")?;
    let (asset_at, asset) = tokens.next(b":.")?;
    let rest = tokens.next(b":.");

    if tx.starts_with("SWAP") || tx.starts_with('s') || tx.starts_with('=') {
        let mut destination = "self";
        let mut limit = "none";
        let mut tok = rest;
        if let Some((at, dest)) = tok {
            // An empty destination field collapses, so the next token is
            // only the destination if it directly follows the asset.
            if at == asset_at + asset.len() + 1 {
                destination = dest;
                tok = tokens.next(b":");
            }
        }
        if let Some((_, l)) = tok {
            limit = l;
        }
        return Some(MemoAction::Swap {
            chain,
            asset,
            destination,
            limit,
        });
    }

    if tx.starts_with("ADD") || tx.starts_with('a') || tx.starts_with('+') {
        return Some(MemoAction::AddLiquidity {
            chain,
            asset,
            pool: rest.map(|(_, p)| p),
        });
    }

    if tx.starts_with("WITHDRAW") || tx.starts_with("wd") || tx.starts_with('-') {
        let (_, bps) = rest?;
        return Some(MemoAction::Withdraw {
            chain,
            asset,
            basis_points: leading_int(bps),
        });
    }

    None
}

/// Shows the parsed intent of a memo.
///
/// Returns `Ok(false)` when the memo is not recognized, so nothing was
/// shown. A cancel on any screen is [`SignError::RejectedByUser`].
pub fn confirm_memo<C: Confirm + ?Sized>(ui: &mut C, memo: &str) -> Result<bool, SignError> {
    let action = match parse_memo(memo) {
        Some(a) => a,
        None => {
            log::debug!("memo is not a thorchain intent");
            return Ok(false);
        }
    };
    let kind = ButtonRequest::ConfirmOutput;

    match action {
        MemoAction::Swap {
            chain,
            asset,
            destination,
            limit,
        } => {
            require(
                ui,
                kind,
                SWAP_TITLE,
                &format!("Confirm swap asset {}\n on chain {}", asset, chain),
            )?;
            require(ui, kind, SWAP_TITLE, &format!("Confirm to {}", destination))?;
            require(ui, kind, SWAP_TITLE, &format!("Confirm limit {}", limit))?;
        }
        MemoAction::AddLiquidity { chain, asset, pool } => {
            require(
                ui,
                kind,
                ADD_TITLE,
                &format!("Confirm add asset {}\n on chain {} pool", asset, chain),
            )?;
            if let Some(pool) = pool {
                require(ui, kind, ADD_TITLE, &format!("Confirm to {}", pool))?;
            }
        }
        MemoAction::Withdraw {
            chain,
            asset,
            basis_points,
        } => {
            let percent = f64::from(basis_points) / 100.0;
            require(
                ui,
                kind,
                WITHDRAW_TITLE,
                &format!(
                    "Confirm withdraw {:3.2}% of asset {} on chain {}",
                    percent, asset, chain
                ),
            )?;
        }
    }
    Ok(true)
}
