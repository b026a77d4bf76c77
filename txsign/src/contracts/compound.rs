//! Compound v2 cToken and Comptroller calls.
//!
//! cETH and the cERC20 markets share most method names but not their
//! signatures (cETH takes its amount as the transaction value), so each
//! action is recognized by selector, arity and whether the target market
//! is cETH.

use hex_literal::hex;
use txsign_common::{EthAddress, EthereumSignTx, Selector, SignError};

use super::{data_is_complete, ContractContext};
use crate::abi::{self, Calldata};
use crate::bignum::U256;
use crate::confirm::{require, ButtonRequest, Confirm};
use crate::crypto::format_address;
use crate::format::{format_amount, is_full_balance};
use crate::registry::TokenType;

const TITLE: &str = "Compound";

/// All markets live on mainnet.
const MARKET_CHAIN: u32 = 1;

pub const COMPTROLLER: EthAddress = hex!("3d9819210a31b4961b30ef54be2aed79b9c9cd3b");

const MINT_CETHER: Selector = hex!("1249c58b");
const MINT_CERC20: Selector = hex!("a0712d68");
const REDEEM: Selector = hex!("db006a75");
const REDEEM_UNDERLYING: Selector = hex!("852a12e3");
const BORROW: Selector = hex!("c5ebeaec");
const REPAY_BORROW_CERC20: Selector = hex!("0e752702");
const REPAY_BORROW_CETHER: Selector = hex!("4e4d9fea");
const REPAY_BORROW_BEHALF_CERC20: Selector = hex!("2608f818");
const REPAY_BORROW_BEHALF_CETHER: Selector = hex!("e5974619");
const LIQUIDATE_BORROW_CERC20: Selector = hex!("f5e3c462");
const LIQUIDATE_BORROW_CETHER: Selector = hex!("aae40a2a");
const ENTER_MARKETS: Selector = hex!("c2998238");
const EXIT_MARKET: Selector = hex!("ede4edd0");

/// An underlying asset and its cToken.
#[derive(Debug)]
pub struct Market {
    pub symbol: &'static str,
    pub address: EthAddress,
    pub decimals: u8,
    pub csymbol: &'static str,
    pub caddress: EthAddress,
    pub cdecimals: u8,
}

pub static MARKETS: &[Market] = &[
    Market {
        symbol: "ETH",
        address: [0u8; 20],
        decimals: 18,
        csymbol: "cETH",
        caddress: hex!("4ddc2d193948926d02f9b1fe9e1daa0718270ed5"),
        cdecimals: 8,
    },
    Market {
        symbol: "BAT",
        address: hex!("0d8775f648430679a709e98d2b0cb6250d2887ef"),
        decimals: 18,
        csymbol: "cBAT",
        caddress: hex!("6c8c6b02e7b2be14d4fa6022dfd6d75921d90e4e"),
        cdecimals: 8,
    },
    Market {
        symbol: "DAI",
        address: hex!("89d24a6b4ccb1b6faa2625fe562bdd9a23260359"),
        decimals: 18,
        csymbol: "cDAI",
        caddress: hex!("f5dce57282a584d2746faf1593d3121fcac444dc"),
        cdecimals: 8,
    },
    Market {
        symbol: "REP",
        address: hex!("1985365e9f78359a9b6ad760e32412f4a445e862"),
        decimals: 18,
        csymbol: "cREP",
        caddress: hex!("158079ee67fce2f58472a96584a73c7ab9ac95c1"),
        cdecimals: 8,
    },
    Market {
        symbol: "USDC",
        address: hex!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
        decimals: 6,
        csymbol: "cUSDC",
        caddress: hex!("39aa39c021dfbae8fac545936693ac917d5e7563"),
        cdecimals: 6,
    },
    Market {
        symbol: "ZRX",
        address: hex!("e41d2489571d322189246dafa5ebde1f4699f498"),
        decimals: 18,
        csymbol: "cZRX",
        caddress: hex!("b3319f5d18bc0d84dd1b4825dcde5d5f7266d407"),
        cdecimals: 8,
    },
];

impl Market {
    pub fn is_ceth(&self) -> bool {
        self.csymbol == "cETH"
    }

    fn token(&self) -> TokenType {
        TokenType::new(MARKET_CHAIN as u8, self.address, self.symbol, self.decimals)
    }

    fn ctoken(&self) -> TokenType {
        TokenType::new(MARKET_CHAIN as u8, self.caddress, self.csymbol, self.cdecimals)
    }
}

pub fn market_by_ctoken(address: &EthAddress) -> Option<&'static Market> {
    MARKETS.iter().find(|m| &m.caddress == address)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    MintCEther,
    MintCErc20,
    Redeem,
    RedeemUnderlying,
    Borrow,
    RepayBorrowCErc20,
    RepayBorrowBehalfCErc20,
    RepayBorrowCEther,
    RepayBorrowBehalfCEther,
    LiquidateBorrowCErc20,
    LiquidateBorrowCEther,
    EnterMarkets,
    ExitMarket,
}

/// (action, selector, arity, market must be cETH: Some(bool) or either)
const CTOKEN_ACTIONS: &[(Action, Selector, usize, Option<bool>)] = &[
    (Action::MintCEther, MINT_CETHER, 0, Some(true)),
    (Action::MintCErc20, MINT_CERC20, 1, Some(false)),
    (Action::Redeem, REDEEM, 1, None),
    (Action::RedeemUnderlying, REDEEM_UNDERLYING, 1, None),
    (Action::Borrow, BORROW, 1, None),
    (Action::RepayBorrowCErc20, REPAY_BORROW_CERC20, 1, Some(false)),
    (Action::RepayBorrowBehalfCErc20, REPAY_BORROW_BEHALF_CERC20, 2, Some(false)),
    (Action::RepayBorrowCEther, REPAY_BORROW_CETHER, 1, Some(true)),
    (Action::RepayBorrowBehalfCEther, REPAY_BORROW_BEHALF_CETHER, 1, Some(true)),
    (Action::LiquidateBorrowCErc20, LIQUIDATE_BORROW_CERC20, 3, Some(false)),
    (Action::LiquidateBorrowCEther, LIQUIDATE_BORROW_CETHER, 2, Some(true)),
];

fn target_market(msg: &EthereumSignTx) -> Option<&'static Market> {
    abi::to_address(msg).and_then(market_by_ctoken)
}

fn ctoken_action(msg: &EthereumSignTx) -> Option<Action> {
    if !data_is_complete(msg) || msg.chain_id != MARKET_CHAIN {
        return None;
    }
    let market = target_market(msg)?;
    let cd = Calldata::of(msg);
    CTOKEN_ACTIONS
        .iter()
        .find(|(_, selector, arity, ceth)| {
            cd.is_method(selector, *arity) && ceth.map_or(true, |c| c == market.is_ceth())
        })
        .map(|(action, ..)| *action)
}

/// `enterMarkets(address[])` with the array as the only argument.
fn is_enter_markets(cd: &Calldata<'_>) -> bool {
    cd.selector_is(&ENTER_MARKETS)
        && cd.raw_param(0).and_then(abi::word_to_u32) == Some(32)
        && cd.dynamic_words(0).is_some()
}

fn exit_market(cd: &Calldata<'_>) -> Option<&'static Market> {
    if !cd.is_method(&EXIT_MARKET, 1) {
        return None;
    }
    cd.param(0)
        .and_then(abi::word_to_address)
        .and_then(market_by_ctoken)
}

fn action(msg: &EthereumSignTx) -> Option<Action> {
    if !msg.has_chain_id {
        return None;
    }
    let cd = Calldata::of(msg);
    if cd.is_proxy_call() {
        return None;
    }
    if let Some(action) = ctoken_action(msg) {
        return Some(action);
    }
    if is_enter_markets(&cd) {
        return Some(Action::EnterMarkets);
    }
    if exit_market(&cd).is_some() && data_is_complete(msg) {
        return Some(Action::ExitMarket);
    }
    None
}

pub fn is_compound(msg: &EthereumSignTx, _ctx: &ContractContext<'_>) -> bool {
    action(msg).is_some()
}

fn checksummed(word: &[u8; 32], chain_id: u32) -> String {
    format_address(&abi::word_low_address(word), chain_id)
}

pub fn confirm_compound<C: Confirm + ?Sized>(
    ui: &mut C,
    msg: &EthereumSignTx,
    _ctx: &ContractContext<'_>,
) -> Result<(), SignError> {
    let action = action(msg).ok_or(SignError::InvalidData)?;
    let cd = Calldata::of(msg);
    let chain_id = msg.chain_id;
    let kind = ButtonRequest::ConfirmOutput;
    let param = |i| cd.param(i).ok_or(SignError::InvalidData);
    let eth_value = || abi::value_to_u256(&msg.value).ok_or(SignError::InvalidData);

    if action == Action::EnterMarkets {
        let to = abi::to_address(msg).ok_or(SignError::InvalidData)?;
        if *to != COMPTROLLER {
            require(
                ui,
                kind,
                TITLE,
                &format!("Confirm Comptroller:\n{}", format_address(to, chain_id)),
            )?;
        }
        let count = cd.dynamic_words(0).map(|w| w.len()).unwrap_or(0);
        return require(ui, kind, TITLE, &format!("Enter {} markets?", count));
    }

    if action == Action::ExitMarket {
        let market = exit_market(&cd).ok_or(SignError::InvalidData)?;
        return require(ui, kind, TITLE, &format!("Exit {} market?", market.csymbol));
    }

    let market = target_market(msg).ok_or(SignError::InvalidData)?;
    let token = market.token();
    let underlying = |amount: &U256| {
        if market.is_ceth() {
            format_amount(amount, None, chain_id)
        } else {
            format_amount(amount, Some(&token), chain_id)
        }
    };

    let body = match action {
        Action::MintCEther => format!("Mint cETH from {}?", underlying(&eth_value()?)),
        Action::MintCErc20 => format!(
            "Mint {} from {}?",
            market.csymbol,
            underlying(&abi::word_to_u256(param(0)?))
        ),
        Action::Redeem => format!(
            "Redeem {} for {}?",
            format_amount(&abi::word_to_u256(param(0)?), Some(&market.ctoken()), chain_id),
            market.symbol
        ),
        Action::RedeemUnderlying => format!(
            "Redeem {} for {}?",
            market.csymbol,
            underlying(&abi::word_to_u256(param(0)?))
        ),
        Action::Borrow => format!(
            "Borrow {} against {}?",
            underlying(&abi::word_to_u256(param(0)?)),
            market.csymbol
        ),
        Action::RepayBorrowCErc20 => {
            let amount = param(0)?;
            if is_full_balance(amount) {
                format!("Repay full {} debt?", market.symbol)
            } else {
                format!("Repay {} debt?", underlying(&abi::word_to_u256(amount)))
            }
        }
        Action::RepayBorrowCEther => format!("Repay {} debt?", underlying(&eth_value()?)),
        Action::RepayBorrowBehalfCErc20 => {
            let borrower = checksummed(param(0)?, chain_id);
            let amount = param(1)?;
            if is_full_balance(amount) {
                format!("Repay full {} debt on behalf of {}?", market.symbol, borrower)
            } else {
                format!(
                    "Repay {} debt on behalf of {}?",
                    underlying(&abi::word_to_u256(amount)),
                    borrower
                )
            }
        }
        Action::RepayBorrowBehalfCEther => format!(
            "Repay {} debt on behalf of {}?",
            underlying(&eth_value()?),
            checksummed(param(0)?, chain_id)
        ),
        Action::LiquidateBorrowCErc20 => format!(
            "Liquidate {} debt on {} taking collateral from {}?",
            underlying(&abi::word_to_u256(param(1)?)),
            checksummed(param(0)?, chain_id),
            checksummed(param(2)?, chain_id)
        ),
        Action::LiquidateBorrowCEther => format!(
            "Liquidate {} debt on {} taking collateral from {}?",
            underlying(&eth_value()?),
            checksummed(param(0)?, chain_id),
            checksummed(param(1)?, chain_id)
        ),
        Action::EnterMarkets | Action::ExitMarket => return Err(SignError::InvalidState),
    };

    require(ui, kind, TITLE, &body)
}
