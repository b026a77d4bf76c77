//! Uniswap v2 router `addLiquidityETH` / `removeLiquidityETH`.

use hex_literal::hex;
use txsign_common::{EthAddress, EthereumSignTx, Selector, SignError};

use super::ContractContext;
use crate::abi::{self, Calldata};
use crate::confirm::{require, ButtonRequest, Confirm};
use crate::format::{format_amount, format_ctime};

/// Uniswap v2 router 02.
pub const UNISWAP_ROUTER: EthAddress = hex!("7a250d5630b4cf539739df2c5dacb4c659f2488d");

const ADD_LIQUIDITY_ETH: Selector = hex!("f305d719");
const REMOVE_LIQUIDITY_ETH: Selector = hex!("02751cec");

fn title(cd: &Calldata<'_>) -> Option<&'static str> {
    if cd.selector_is(&ADD_LIQUIDITY_ETH) {
        Some("uniswap add liquidity")
    } else if cd.selector_is(&REMOVE_LIQUIDITY_ETH) {
        Some("uniswap remove liquidity")
    } else {
        None
    }
}

pub fn is_liquidity_tx(msg: &EthereumSignTx) -> bool {
    abi::to_address(msg) == Some(&UNISWAP_ROUTER) && title(&Calldata::of(msg)).is_some()
}

/// Both calls share the argument layout
/// `(token, tokenAmount, tokenMin, ethMin, to, deadline)`.
pub fn confirm_liquidity_tx<C: Confirm + ?Sized>(
    ui: &mut C,
    msg: &EthereumSignTx,
    ctx: &ContractContext<'_>,
) -> Result<(), SignError> {
    let cd = Calldata::of(msg);
    let title = title(&cd).ok_or(SignError::InvalidData)?;
    let param = |i| cd.raw_param(i).ok_or(SignError::InvalidData);

    let token = ctx
        .registry
        .by_chain_address(msg.chain_id, &abi::word_low_address(param(0)?));
    let token_amount = abi::word_to_u256(param(1)?);
    let token_min = abi::word_to_u256(param(2)?);
    let eth_min = abi::word_to_u256(param(3)?);
    let recipient = abi::word_low_address(param(4)?);
    let mut deadline = [0u8; 8];
    deadline.copy_from_slice(&param(5)?[24..]);
    let deadline = u64::from_be_bytes(deadline);

    let kind = ButtonRequest::ConfirmOutput;
    require(
        ui,
        kind,
        title,
        &format!(
            "{}\nMinimum {}",
            format_amount(&token_amount, Some(token), msg.chain_id),
            format_amount(&token_min, Some(token), msg.chain_id)
        ),
    )?;

    let owner = if recipient == ctx.my_address {
        "self"
    } else {
        "NOT this wallet"
    };
    require(
        ui,
        kind,
        title,
        &format!(
            "Confirming ETH address is {}: 0x{}",
            owner,
            super::hex_lower(&recipient)
        ),
    )?;

    require(
        ui,
        kind,
        title,
        &format!("Minimum {}", format_amount(&eth_min, None, msg.chain_id)),
    )?;
    require(ui, kind, title, &format!("Deadline {}", format_ctime(deadline)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::MockUi;
    use crate::contracts::testutil::*;
    use crate::registry::Registry;

    const FOX: EthAddress = hex!("c770eefad204b5180df6a14ee197d99d808ee52d");

    fn add_liquidity(recipient: &EthAddress) -> Vec<u8> {
        calldata(
            ADD_LIQUIDITY_ETH,
            &[
                addr_word(&FOX),
                word(10_000_000_000_000_000_000),
                word(9_000_000_000_000_000_000),
                word(500_000_000_000_000_000),
                addr_word(recipient),
                word(1_600_000_000),
            ],
        )
    }

    #[test]
    fn test_add_liquidity_prompts() {
        let me = [0x5a; 20];
        let reg = Registry::new();
        let ctx = ContractContext {
            my_address: me,
            registry: &reg,
        };
        let msg = tx(UNISWAP_ROUTER, 500_000_000_000_000_000, add_liquidity(&me));
        assert!(is_liquidity_tx(&msg));

        let mut ui = MockUi::new();
        confirm_liquidity_tx(&mut ui, &msg, &ctx).unwrap();
        assert_eq!(
            ui.bodies(),
            vec![
                "10 FOX\nMinimum 9 FOX",
                "Confirming ETH address is self: 0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a",
                "Minimum 0.5 ETH",
                "Deadline Sun Sep 13 12:26:40 2020",
            ]
        );
        assert!(ui.prompts.iter().all(|p| p.title == "uniswap add liquidity"));
    }

    #[test]
    fn test_foreign_recipient_is_flagged() {
        let reg = Registry::new();
        let ctx = ContractContext {
            my_address: [0x5a; 20],
            registry: &reg,
        };
        let msg = tx(UNISWAP_ROUTER, 0, add_liquidity(&[0x11; 20]));
        let mut ui = MockUi::new();
        confirm_liquidity_tx(&mut ui, &msg, &ctx).unwrap();
        assert!(ui.prompts[1].body.starts_with("Confirming ETH address is NOT this wallet"));
    }

    #[test]
    fn test_each_prompt_can_cancel() {
        let reg = Registry::new();
        let ctx = ContractContext {
            my_address: [0x5a; 20],
            registry: &reg,
        };
        let msg = tx(UNISWAP_ROUTER, 0, add_liquidity(&[0x5a; 20]));
        for cancel_at in 0..4 {
            let mut script = vec![true; cancel_at];
            script.push(false);
            let mut ui = MockUi::scripted(&script);
            assert_eq!(
                confirm_liquidity_tx(&mut ui, &msg, &ctx),
                Err(SignError::RejectedByUser)
            );
            assert_eq!(ui.confirm_count(), cancel_at + 1);
        }
    }
}
