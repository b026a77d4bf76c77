//! 0x exchange proxy `transformERC20`.

use hex_literal::hex;
use txsign_common::{EthereumSignTx, Selector, SignError};

use super::zxswap::ZX_PROXY;
use super::ContractContext;
use crate::abi::{self, Calldata};
use crate::confirm::{require, ButtonRequest, Confirm};
use crate::format::format_amount;

const TRANSFORM_ERC20: Selector = hex!("415565b0");

pub fn is_transform_erc20(msg: &EthereumSignTx) -> bool {
    abi::to_address(msg) == Some(&ZX_PROXY) && Calldata::of(msg).selector_is(&TRANSFORM_ERC20)
}

pub fn confirm_transform_erc20<C: Confirm + ?Sized>(
    ui: &mut C,
    msg: &EthereumSignTx,
    ctx: &ContractContext<'_>,
) -> Result<(), SignError> {
    let cd = Calldata::of(msg);
    let param = |i| cd.raw_param(i).ok_or(SignError::InvalidData);

    let input = ctx
        .registry
        .by_chain_address(msg.chain_id, &abi::word_low_address(param(0)?));
    let output = ctx
        .registry
        .by_chain_address(msg.chain_id, &abi::word_low_address(param(1)?));
    let input_amount = abi::word_to_u256(param(2)?);
    let output_amount = abi::word_to_u256(param(3)?);

    require(
        ui,
        ButtonRequest::ConfirmOutput,
        "Transform ERC20",
        &format!(
            "Input {}\nOutput {}",
            format_amount(&input_amount, Some(input), msg.chain_id),
            format_amount(&output_amount, Some(output), msg.chain_id)
        ),
    )
}
