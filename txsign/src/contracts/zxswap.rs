//! 0x exchange proxy `sellToUniswap(address[],uint256,uint256,bool)`.

use hex_literal::hex;
use txsign_common::{EthAddress, EthereumSignTx, Selector, SignError};

use super::ContractContext;
use crate::abi::{self, Calldata};
use crate::confirm::{require, ButtonRequest, Confirm};

/// 0x exchange proxy.
pub const ZX_PROXY: EthAddress = hex!("def1c0ded9bec7f1a1670819833240f027b25eff");

const SELL_TO_UNISWAP: Selector = hex!("d9627aa4");

pub fn is_zx_swap(msg: &EthereumSignTx) -> bool {
    abi::to_address(msg) == Some(&ZX_PROXY) && Calldata::of(msg).selector_is(&SELL_TO_UNISWAP)
}

pub fn confirm_zx_swap<C: Confirm + ?Sized>(
    ui: &mut C,
    msg: &EthereumSignTx,
    ctx: &ContractContext<'_>,
) -> Result<(), SignError> {
    let path = Calldata::of(msg)
        .dynamic_words(0)
        .ok_or(SignError::InvalidData)?;
    let (first, last) = match (path.first(), path.last()) {
        (Some(f), Some(l)) if path.len() >= 2 => (f, l),
        _ => return Err(SignError::InvalidData),
    };
    let from = ctx
        .registry
        .by_chain_address(msg.chain_id, &abi::word_low_address(first));
    let to = ctx
        .registry
        .by_chain_address(msg.chain_id, &abi::word_low_address(last));

    require(
        ui,
        ButtonRequest::ConfirmOutput,
        "Uniswap",
        &format!("Confirm Uniswap Swap:\n{} for {}", from.symbol(), to.symbol()),
    )
}
