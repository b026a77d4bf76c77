//! ERC-20 `approve` of a Uniswap v2 liquidity token to the router.
//!
//! The liquidity token is the pair contract itself, so the transaction's
//! `to` is a pair address. It is matched against the CREATE2 address of
//! every (token, WETH) pair the registry knows to name the pool.

use hex_literal::hex;
use txsign_common::{EthAddress, EthereumSignTx, Selector, SignError};

use super::zxliquidity::UNISWAP_ROUTER;
use super::ContractContext;
use crate::abi::{self, Calldata};
use crate::confirm::{require, ButtonRequest, Confirm};
use crate::crypto::{keccak256, Keccak256Hasher};
use crate::format::is_full_balance;
use crate::registry::TokenType;

const APPROVE: Selector = hex!("095ea7b3");

/// Uniswap v2 factory.
const UNISWAP_FACTORY: EthAddress = hex!("5c69bee701ef814a2b6a3edd4b1652cb9cc5aa6f");

/// keccak256 of the pair contract's init code.
const PAIR_INIT_CODE_HASH: [u8; 32] =
    hex!("96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f");

const TITLE: &str = "uniswap approve liquidity";

pub fn is_approve_liquidity(msg: &EthereumSignTx) -> bool {
    let cd = Calldata::of(msg);
    cd.selector_is(&APPROVE)
        && cd
            .raw_param(0)
            .map_or(false, |w| abi::word_low_address(w) == UNISWAP_ROUTER)
}

/// CREATE2 address of the Uniswap v2 pair for two tokens.
pub fn pair_address(a: &EthAddress, b: &EthAddress) -> EthAddress {
    let (token0, token1) = if a < b { (a, b) } else { (b, a) };
    let mut salt_input = [0u8; 40];
    salt_input[..20].copy_from_slice(token0);
    salt_input[20..].copy_from_slice(token1);
    let salt = keccak256(&salt_input);

    let mut hasher = Keccak256Hasher::new();
    hasher.update(&[0xff]);
    hasher.update(&UNISWAP_FACTORY);
    hasher.update(&salt);
    hasher.update(&PAIR_INIT_CODE_HASH);
    let digest = hasher.finalize();
    abi::word_low_address(&digest)
}

fn find_pool<'r>(
    ctx: &ContractContext<'r>,
    weth: &TokenType,
    pair: &EthAddress,
) -> Option<&'r TokenType> {
    ctx.registry
        .iter()
        .find(|t| pair_address(&t.address, &weth.address) == *pair)
}

pub fn confirm_approve_liquidity<C: Confirm + ?Sized>(
    ui: &mut C,
    msg: &EthereumSignTx,
    ctx: &ContractContext<'_>,
) -> Result<(), SignError> {
    let pair = abi::to_address(msg).ok_or(SignError::InvalidData)?;
    let allowance = Calldata::of(msg)
        .raw_param(1)
        .ok_or(SignError::InvalidData)?;
    let weth = ctx.registry.by_ticker(msg.chain_id, "WETH")?;

    let amount = if is_full_balance(allowance) {
        "full balance".to_string()
    } else {
        abi::word_to_u256(allowance).to_decimal()
    };
    let pool = match find_pool(ctx, weth, pair) {
        Some(token) => format!("{} {}", token.symbol(), super::hex_lower(pair)),
        None => super::hex_lower(pair),
    };

    let kind = ButtonRequest::ConfirmOutput;
    require(ui, kind, TITLE, &format!("Amount: {}", amount))?;
    require(ui, kind, TITLE, &format!("approve for pool {}", pool))
}
