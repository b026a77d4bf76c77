//! Gnosis Safe `execTransaction`.
//!
//! Head layout, one word each: `to, value, data (offset), operation,
//! safeTxGas, baseGas, gasPrice, gasToken, refundReceiver,
//! signatures (offset)`. The known Safe proxy gets the Safe wording; any
//! other contract exposing the same function gets the generic wording,
//! with the gas limits converted to fees.

use hex_literal::hex;
use txsign_common::{EthAddress, EthereumSignTx, Selector, SignError};

use super::ContractContext;
use crate::abi::{self, Calldata};
use crate::bignum::U256;
use crate::confirm::{require, ButtonRequest, Confirm};
use crate::format::format_amount;

pub const GNOSIS_PROXY: EthAddress = hex!("c8fff0d944406a40475a0a8264328aac8d64927b");

const EXEC_TRANSACTION: Selector = hex!("6a761202");

/// Signatures are 65 bytes each and shown one per screen.
const SIGNATURE_CHUNK: usize = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStyle {
    /// The known Safe proxy.
    Safe,
    /// Any contract with an `execTransaction` of the same shape.
    Generic,
}

impl ExecStyle {
    fn title(self) -> &'static str {
        match self {
            ExecStyle::Safe => "Gnosis exec_tx",
            ExecStyle::Generic => "contract func exec_tx",
        }
    }

    fn data_label(self) -> &'static str {
        match self {
            ExecStyle::Safe => "Data bytes",
            ExecStyle::Generic => "Data payload",
        }
    }

    fn data_chunk(self) -> usize {
        match self {
            ExecStyle::Safe => 20,
            ExecStyle::Generic => 39,
        }
    }
}

pub fn is_gnosis_proxy(msg: &EthereumSignTx) -> bool {
    abi::to_address(msg) == Some(&GNOSIS_PROXY) && is_exec_transaction(msg)
}

pub fn is_exec_transaction(msg: &EthereumSignTx) -> bool {
    Calldata::of(msg).selector_is(&EXEC_TRANSACTION)
}

fn operation_name(word: &[u8; 32]) -> &'static str {
    match abi::word_to_u32(word) {
        Some(0) => "Call",
        Some(1) => "DelegateCall",
        _ => "Unknown",
    }
}

/// Shows `bytes` as hex, `chunk` bytes per screen. An empty value still
/// gets one (empty) screen.
fn confirm_chunked<C: Confirm + ?Sized>(
    ui: &mut C,
    title: &str,
    label: &str,
    bytes: &[u8],
    chunk: usize,
) -> Result<(), SignError> {
    if bytes.is_empty() {
        return require(ui, ButtonRequest::ConfirmOutput, title, &format!("{} 1: ", label));
    }
    for (n, piece) in bytes.chunks(chunk).enumerate() {
        require(
            ui,
            ButtonRequest::ConfirmOutput,
            title,
            &format!("{} {}: {}", label, n + 1, super::hex_lower(piece)),
        )?;
    }
    Ok(())
}

pub fn confirm_exec<C: Confirm + ?Sized>(
    ui: &mut C,
    msg: &EthereumSignTx,
    ctx: &ContractContext<'_>,
    style: ExecStyle,
) -> Result<(), SignError> {
    let cd = Calldata::of(msg);
    let param = |i| cd.raw_param(i).ok_or(SignError::InvalidData);
    let title = style.title();
    let kind = ButtonRequest::ConfirmOutput;
    let chain_id = msg.chain_id;

    let target = abi::word_low_address(param(0)?);
    let value = abi::word_to_u256(param(1)?);
    let data = cd.dynamic_bytes(2).ok_or(SignError::InvalidData)?;
    let operation = operation_name(param(3)?);
    let safe_tx_gas = abi::word_to_u256(param(4)?);
    let base_gas = abi::word_to_u256(param(5)?);
    let gas_price = abi::word_to_u256(param(6)?);
    let gas_token = param(7)?;
    let refund_receiver = param(8)?;
    let signatures = cd.dynamic_bytes(9).ok_or(SignError::InvalidData)?;

    require(
        ui,
        kind,
        title,
        &format!("Sending to {}", super::hex_lower(&target)),
    )?;
    require(
        ui,
        kind,
        title,
        &format!("amount {}", format_amount(&value, None, chain_id)),
    )?;
    confirm_chunked(ui, title, style.data_label(), data, style.data_chunk())?;
    require(ui, kind, title, &format!("Operation: {}", operation))?;

    let gas_token = if U256::from_be_bytes(gas_token).is_zero() {
        "ETH".to_string()
    } else {
        let address = abi::word_low_address(gas_token);
        let token = ctx.registry.by_chain_address(chain_id, &address);
        if token.is_unknown() {
            super::hex_lower(&address)
        } else {
            token.symbol().to_string()
        }
    };
    let refund = if U256::from_be_bytes(refund_receiver).is_zero() {
        "tx origin".to_string()
    } else {
        super::hex_lower(&abi::word_low_address(refund_receiver))
    };

    match style {
        ExecStyle::Safe => {
            require(
                ui,
                kind,
                title,
                &format!(
                    "Safe tx gas: {}\nBase gas: {}",
                    format_amount(&safe_tx_gas, None, chain_id),
                    format_amount(&base_gas, None, chain_id)
                ),
            )?;
            require(
                ui,
                kind,
                title,
                &format!("Gas price: {}", format_amount(&gas_price, None, chain_id)),
            )?;
            require(ui, kind, title, &format!("Gas payment token: {}", gas_token))?;
            require(ui, kind, title, &format!("Gas refund address: {}", refund))?;
        }
        ExecStyle::Generic => {
            let safe_fee = safe_tx_gas
                .checked_mul(&gas_price)
                .ok_or(SignError::InvalidData)?;
            let base_fee = base_gas
                .checked_mul(&gas_price)
                .ok_or(SignError::InvalidData)?;
            require(
                ui,
                kind,
                title,
                &format!(
                    "Safe tx gas: {}\nBase gas: {}\nGas price: {}",
                    format_amount(&safe_fee, None, chain_id),
                    format_amount(&base_fee, None, chain_id),
                    format_amount(&gas_price, None, chain_id)
                ),
            )?;
            require(
                ui,
                kind,
                title,
                &format!(
                    "Gas payment token: {}\nGas refund address: {}",
                    gas_token, refund
                ),
            )?;
        }
    }

    confirm_chunked(ui, title, "Signature", signatures, SIGNATURE_CHUNK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::MockUi;
    use crate::contracts::testutil::*;
    use crate::registry::Registry;

    fn padded(bytes: &[u8]) -> Vec<u8> {
        let mut out = word(bytes.len() as u64).to_vec();
        out.extend_from_slice(bytes);
        out.extend(core::iter::repeat(0u8).take((32 - bytes.len() % 32) % 32));
        out
    }

    /// execTransaction with `data` and `sigs` as the two tails.
    fn exec(data: &[u8], gas_token: &EthAddress, sigs: &[u8]) -> Vec<u8> {
        let data_tail = padded(data);
        let sig_offset = 10 * 32 + data_tail.len() as u64;
        let mut out = calldata(
            EXEC_TRANSACTION,
            &[
                addr_word(&[0xab; 20]),
                word(2_000_000_000_000_000_000),
                word(320),
                word(1),
                word(50_000),
                word(21_000),
                word(1_000_000_000),
                addr_word(gas_token),
                addr_word(&[0; 20]),
                word(sig_offset),
            ],
        );
        out.extend_from_slice(&data_tail);
        out.extend_from_slice(&padded(sigs));
        out
    }

    fn ctx(reg: &Registry) -> ContractContext<'_> {
        ContractContext {
            my_address: [0; 20],
            registry: reg,
        }
    }

    #[test]
    fn test_safe_prompts() {
        let reg = Registry::new();
        let msg = tx(GNOSIS_PROXY, 0, exec(&[0x11; 25], &[0; 20], &[0x22; 65]));
        assert!(is_gnosis_proxy(&msg));
        let mut ui = MockUi::new();
        confirm_exec(&mut ui, &msg, &ctx(&reg), ExecStyle::Safe).unwrap();
        assert_eq!(
            ui.bodies(),
            vec![
                format!("Sending to {}", "ab".repeat(20)),
                "amount 2 ETH".to_string(),
                format!("Data bytes 1: {}", "11".repeat(20)),
                format!("Data bytes 2: {}", "11".repeat(5)),
                "Operation: DelegateCall".to_string(),
                "Safe tx gas: 50000 Wei\nBase gas: 21000 Wei".to_string(),
                "Gas price: 0.000000001 ETH".to_string(),
                "Gas payment token: ETH".to_string(),
                "Gas refund address: tx origin".to_string(),
                format!("Signature 1: {}", "22".repeat(65)),
            ]
        );
        assert!(ui.prompts.iter().all(|p| p.title == "Gnosis exec_tx"));
    }

    #[test]
    fn test_generic_multiplies_gas_by_price() {
        let reg = Registry::new();
        let dai = hex!("6b175474e89094c44da98b954eedeac495271d0f");
        let msg = tx([0x42; 20], 0, exec(&[], &dai, &[0x22; 130]));
        assert!(is_exec_transaction(&msg));
        assert!(!is_gnosis_proxy(&msg));

        let mut ui = MockUi::new();
        confirm_exec(&mut ui, &msg, &ctx(&reg), ExecStyle::Generic).unwrap();
        let bodies = ui.bodies();
        assert_eq!(bodies[2], "Data payload 1: ");
        assert_eq!(
            bodies[4],
            "Safe tx gas: 0.00005 ETH\nBase gas: 0.000021 ETH\nGas price: 0.000000001 ETH"
        );
        assert_eq!(bodies[5], "Gas payment token: DAI\nGas refund address: tx origin");
        assert_eq!(bodies.len(), 8);
    }

    #[test]
    fn test_data_tail_past_end_fails_closed() {
        let reg = Registry::new();
        let mut data = exec(&[0x11; 40], &[0; 20], &[]);
        data.truncate(10 * 32 + 4 + 40);
        let msg = tx(GNOSIS_PROXY, 0, data);
        let mut ui = MockUi::new();
        assert_eq!(
            confirm_exec(&mut ui, &msg, &ctx(&reg), ExecStyle::Safe),
            Err(SignError::InvalidData)
        );
        assert!(ui.prompts.is_empty());
    }
}
