//! ERC-20 token registry.
//!
//! A static table plus a small runtime-appendable table, looked up by
//! (chain id, contract address) or by ticker. Address lookup never fails:
//! it returns the `" UNKN"` sentinel, which callers must test for with
//! [`TokenType::is_unknown`]. Ticker lookup fails, and distinguishes
//! "no such ticker" from "more than one token has it".

use hex_literal::hex;
use txsign_common::{EthAddress, SignError};

/// Capacity of the registry, static and runtime entries together.
pub const TOKENS_COUNT: usize = 64;

/// Ticker of the "not in the registry" sentinel.
pub const UNKNOWN_TICKER: &str = " UNKN";

/// An ERC-20 token.
///
/// `ticker` carries a leading space so it can be appended to a number
/// directly ("1.5 DAI").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenType {
    pub chain_id: u8,
    pub address: EthAddress,
    pub ticker: String,
    pub decimals: u8,
}

impl TokenType {
    pub fn new(chain_id: u8, address: EthAddress, symbol: &str, decimals: u8) -> Self {
        Self {
            chain_id,
            address,
            ticker: format!(" {}", symbol),
            decimals,
        }
    }

    /// The ticker without the display space.
    pub fn symbol(&self) -> &str {
        self.ticker.strip_prefix(' ').unwrap_or(&self.ticker)
    }

    /// True for the sentinel returned by a failed address lookup.
    pub fn is_unknown(&self) -> bool {
        self.ticker == UNKNOWN_TICKER
    }
}

/// (chain, address, symbol, decimals)
type TokenRow = (u8, EthAddress, &'static str, u8);

const STATIC_TOKENS: &[TokenRow] = &[
    (1, hex!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"), "WETH", 18),
    (1, hex!("6b175474e89094c44da98b954eedeac495271d0f"), "DAI", 18),
    (1, hex!("89d24a6b4ccb1b6faa2625fe562bdd9a23260359"), "SAI", 18),
    (1, hex!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"), "USDC", 6),
    (1, hex!("dac17f958d2ee523a2206206994597c13d831ec7"), "USDT", 6),
    (1, hex!("0d8775f648430679a709e98d2b0cb6250d2887ef"), "BAT", 18),
    (1, hex!("e41d2489571d322189246dafa5ebde1f4699f498"), "ZRX", 18),
    (1, hex!("1985365e9f78359a9b6ad760e32412f4a445e862"), "REP", 18),
    (1, hex!("221657776846890989a759ba2973e427dff5c9bb"), "REP", 18),
    (1, hex!("1f9840a85d5af5bf1d1762f925bdaddc4201f984"), "UNI", 18),
    (1, hex!("514910771af9ca656af840dff83e8264ecf986ca"), "LINK", 18),
    (1, hex!("2260fac5e5542a773aa44fbcfedf7c193bc2c599"), "WBTC", 8),
    (1, hex!("c770eefad204b5180df6a14ee197d99d808ee52d"), "FOX", 18),
    (42, hex!("c4375b7de8af5a38a93548eb8453a498222c4ff2"), "DAI", 18),
];

/// Referenced unconditionally by the contract decoders, so they resolve
/// even when a trimmed table leaves them out.
const FALLBACK_TOKENS: &[TokenRow] = &[
    (1, hex!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"), "WETH", 18),
    (1, hex!("6b175474e89094c44da98b954eedeac495271d0f"), "DAI", 18),
    (3, hex!("c778417e063141139fce010982780140aa0cd5ab"), "WETH", 18),
];

/// Token lookup tables.
#[derive(Debug, Clone)]
pub struct Registry {
    tokens: Vec<TokenType>,
    fallbacks: Vec<TokenType>,
    unknown: TokenType,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Loads the static table.
    pub fn new() -> Self {
        let load = |rows: &[TokenRow]| {
            rows.iter()
                .map(|&(chain, address, symbol, decimals)| {
                    TokenType::new(chain, address, symbol, decimals)
                })
                .collect::<Vec<_>>()
        };
        Self {
            tokens: load(STATIC_TOKENS),
            fallbacks: load(FALLBACK_TOKENS),
            unknown: TokenType {
                chain_id: 1,
                address: [0u8; 20],
                ticker: UNKNOWN_TICKER.to_string(),
                decimals: 0,
            },
        }
    }

    /// Registry with no static entries; used by tests that need exact control.
    pub fn empty() -> Self {
        Self {
            tokens: Vec::new(),
            ..Self::new()
        }
    }

    /// Appends a runtime entry.
    pub fn add_token(&mut self, token: TokenType) -> Result<(), SignError> {
        if self.tokens.len() >= TOKENS_COUNT {
            log::warn!("token table full");
            return Err(SignError::BufferOverflow);
        }
        log::debug!("registering token{} on chain {}", token.ticker, token.chain_id);
        self.tokens.push(token);
        Ok(())
    }

    pub fn unknown(&self) -> &TokenType {
        &self.unknown
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenType> {
        self.tokens.iter()
    }

    /// Finds a token by contract address; returns the sentinel when absent.
    pub fn by_chain_address(&self, chain_id: u32, address: &EthAddress) -> &TokenType {
        self.tokens
            .iter()
            .chain(self.fallbacks.iter())
            .find(|t| u32::from(t.chain_id) == chain_id && &t.address == address)
            .unwrap_or(&self.unknown)
    }

    /// Finds the single token on `chain_id` whose symbol is `symbol`.
    pub fn by_ticker(&self, chain_id: u32, symbol: &str) -> Result<&TokenType, SignError> {
        let mut found: Option<&TokenType> = None;
        for token in self.tokens.iter() {
            if u32::from(token.chain_id) != chain_id || token.symbol() != symbol {
                continue;
            }
            if found.is_some() {
                log::warn!("ticker {} is ambiguous on chain {}", symbol, chain_id);
                return Err(SignError::AmbiguousTicker);
            }
            found = Some(token);
        }

        if let Some(token) = found {
            return Ok(token);
        }

        self.fallbacks
            .iter()
            .find(|t| u32::from(t.chain_id) == chain_id && t.symbol() == symbol)
            .ok_or(SignError::TickerNotFound)
    }
}
