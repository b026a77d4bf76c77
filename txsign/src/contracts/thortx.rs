//! THORChain router `deposit(address,address,uint256,string)`.

use hex_literal::hex;
use txsign_common::{EthAddress, EthereumSignTx, SignError};

use super::ContractContext;
use crate::abi::{self, Calldata};
use crate::confirm::{require, ButtonRequest, Confirm};
use crate::format::format_amount;
use crate::thorchain::{self, MAX_MEMO_SIZE};

/// Selector followed by the 12 zero bytes padding the vault address.
const DEPOSIT_PREFIX: [u8; 16] = hex!("1fece7b4000000000000000000000000");

pub const THORCHAIN_ROUTER: EthAddress = hex!("42a5ed456650a09dc10ebc6361a7480fdd61f27b");

const TITLE: &str = "Thorchain data";

pub fn is_thorchain_tx(msg: &EthereumSignTx) -> bool {
    abi::to_address(msg).is_some()
        && Calldata::of(msg).bytes(0, DEPOSIT_PREFIX.len()) == Some(&DEPOSIT_PREFIX[..])
}

/// The memo string argument, if present and printable as text.
fn memo_arg<'a>(cd: &Calldata<'a>) -> Result<&'a str, SignError> {
    let bytes = cd.dynamic_bytes(3).ok_or(SignError::InvalidData)?;
    if bytes.len() > MAX_MEMO_SIZE {
        return Err(SignError::InvalidData);
    }
    core::str::from_utf8(bytes).map_err(|_| SignError::InvalidData)
}

pub fn confirm_thorchain_tx<C: Confirm + ?Sized>(
    ui: &mut C,
    msg: &EthereumSignTx,
    ctx: &ContractContext<'_>,
) -> Result<(), SignError> {
    let to = abi::to_address(msg).ok_or(SignError::InvalidData)?;
    let cd = Calldata::of(msg);
    let param = |i| cd.raw_param(i).ok_or(SignError::InvalidData);
    let vault = abi::word_low_address(param(0)?);
    let asset = abi::word_low_address(param(1)?);
    let amount = abi::word_to_u256(param(2)?);
    let memo = memo_arg(&cd)?;

    let kind = ButtonRequest::ConfirmOutput;
    let router = if *to == THORCHAIN_ROUTER {
        "Thorchain router".to_string()
    } else {
        super::hex_lower(to)
    };
    require(ui, kind, TITLE, &format!("Routing through {}", router))?;
    require(
        ui,
        kind,
        TITLE,
        &format!("Using Asgard vault {}", super::hex_lower(&vault)),
    )?;

    if asset == [0u8; 20] {
        require(
            ui,
            kind,
            TITLE,
            &format!("Confirm sending {}", format_amount(&amount, None, msg.chain_id)),
        )?;
    } else {
        let token = ctx.registry.by_chain_address(msg.chain_id, &asset);
        if token.is_unknown() {
            // Decimals unknown: show the raw integer.
            require(
                ui,
                kind,
                TITLE,
                &format!("from asset {}", super::hex_lower(&asset)),
            )?;
            require(
                ui,
                kind,
                TITLE,
                &format!("amount {} unformatted", amount.to_decimal()),
            )?;
        } else {
            require(
                ui,
                kind,
                TITLE,
                &format!(
                    "Confirm sending {}",
                    format_amount(&amount, Some(token), msg.chain_id)
                ),
            )?;
        }
    }

    if !thorchain::confirm_memo(ui, memo)? {
        log::warn!("malformed thorchain swap data");
        return Err(SignError::InvalidData);
    }
    Ok(())
}
