//! Smart-contract call classifiers.
//!
//! Each submodule recognizes one family of contract calls with a pure
//! `is_*` predicate and walks the user through it with a `confirm_*`
//! function. [`classify`] tries the predicates in [`PRIORITY`] order
//! exactly once and returns a [`ContractCall`] tag; [`ContractCall::confirm`]
//! then runs the matching confirmation for that tag without re-testing
//! any predicate.
//!
//! # Security
//!
//! Calldata comes from the host. Predicates never assume a previous
//! guard ran and read only through [`crate::abi::Calldata`], which
//! bounds-checks every access.

pub mod compound;
pub mod erc721;
pub mod gnosis;
pub mod makerdao;
pub mod sablier;
pub mod thortx;
pub mod zxapprove;
pub mod zxliquidity;
pub mod zxswap;
pub mod zxtransform;

use txsign_common::{EthAddress, EthereumSignTx, SignError};

use crate::confirm::Confirm;
use crate::registry::Registry;

/// What a classifier may consult besides the message itself.
#[derive(Debug, Clone, Copy)]
pub struct ContractContext<'a> {
    /// Address of the key the transaction will be signed with.
    pub my_address: EthAddress,
    pub registry: &'a Registry,
}

/// A recognized contract call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractCall {
    ZxSwap,
    ZxTransformErc20,
    ZxLiquidity,
    ZxApproveLiquidity,
    Thorchain,
    Sablier,
    GnosisExec,
    ContractFuncExec,
    Erc721,
    Compound,
    MakerDao,
}

/// Classifier order. Some calldata satisfies more than one predicate;
/// the first entry that matches wins.
pub const PRIORITY: &[ContractCall] = &[
    ContractCall::ZxSwap,
    ContractCall::ZxTransformErc20,
    ContractCall::ZxLiquidity,
    ContractCall::ZxApproveLiquidity,
    ContractCall::Thorchain,
    ContractCall::Sablier,
    ContractCall::GnosisExec,
    ContractCall::ContractFuncExec,
    ContractCall::Erc721,
    ContractCall::Compound,
    ContractCall::MakerDao,
];

impl ContractCall {
    pub fn name(self) -> &'static str {
        match self {
            ContractCall::ZxSwap => "0x swap",
            ContractCall::ZxTransformErc20 => "0x transformERC20",
            ContractCall::ZxLiquidity => "uniswap liquidity",
            ContractCall::ZxApproveLiquidity => "uniswap approve liquidity",
            ContractCall::Thorchain => "thorchain router",
            ContractCall::Sablier => "sablier",
            ContractCall::GnosisExec => "gnosis safe",
            ContractCall::ContractFuncExec => "execTransaction",
            ContractCall::Erc721 => "erc721",
            ContractCall::Compound => "compound",
            ContractCall::MakerDao => "makerdao",
        }
    }

    /// The classifier predicate for this tag.
    pub fn matches(self, msg: &EthereumSignTx, ctx: &ContractContext<'_>) -> bool {
        match self {
            ContractCall::ZxSwap => zxswap::is_zx_swap(msg),
            ContractCall::ZxTransformErc20 => zxtransform::is_transform_erc20(msg),
            ContractCall::ZxLiquidity => zxliquidity::is_liquidity_tx(msg),
            ContractCall::ZxApproveLiquidity => zxapprove::is_approve_liquidity(msg),
            ContractCall::Thorchain => thortx::is_thorchain_tx(msg),
            ContractCall::Sablier => sablier::is_withdraw_from_salary(msg),
            ContractCall::GnosisExec => gnosis::is_gnosis_proxy(msg),
            ContractCall::ContractFuncExec => gnosis::is_exec_transaction(msg),
            ContractCall::Erc721 => erc721::is_erc721(msg, ctx),
            ContractCall::Compound => compound::is_compound(msg, ctx),
            ContractCall::MakerDao => makerdao::is_makerdao(msg),
        }
    }

    /// Runs the confirmation flow for an already classified call.
    pub fn confirm<C: Confirm + ?Sized>(
        self,
        ui: &mut C,
        msg: &EthereumSignTx,
        ctx: &ContractContext<'_>,
    ) -> Result<(), SignError> {
        log::debug!("confirming {} call", self.name());
        match self {
            ContractCall::ZxSwap => zxswap::confirm_zx_swap(ui, msg, ctx),
            ContractCall::ZxTransformErc20 => zxtransform::confirm_transform_erc20(ui, msg, ctx),
            ContractCall::ZxLiquidity => zxliquidity::confirm_liquidity_tx(ui, msg, ctx),
            ContractCall::ZxApproveLiquidity => {
                zxapprove::confirm_approve_liquidity(ui, msg, ctx)
            }
            ContractCall::Thorchain => thortx::confirm_thorchain_tx(ui, msg, ctx),
            ContractCall::Sablier => sablier::confirm_withdraw_from_salary(ui, msg),
            ContractCall::GnosisExec => gnosis::confirm_exec(ui, msg, ctx, gnosis::ExecStyle::Safe),
            ContractCall::ContractFuncExec => {
                gnosis::confirm_exec(ui, msg, ctx, gnosis::ExecStyle::Generic)
            }
            ContractCall::Erc721 => erc721::confirm_erc721(ui, msg, ctx),
            ContractCall::Compound => compound::confirm_compound(ui, msg, ctx),
            ContractCall::MakerDao => makerdao::confirm_makerdao(ui, msg, ctx),
        }
    }
}

/// Finds the first classifier in [`PRIORITY`] that accepts the message.
pub fn classify(msg: &EthereumSignTx, ctx: &ContractContext<'_>) -> Option<ContractCall> {
    let found = PRIORITY.iter().copied().find(|call| call.matches(msg, ctx));
    if let Some(call) = found {
        log::debug!("calldata classified as {}", call.name());
    }
    found
}

/// Classifies the message and, if some classifier owns it, confirms it.
///
/// `Ok(None)` means no classifier applies and the caller must fall back
/// to its generic data confirmation.
pub fn handle<C: Confirm + ?Sized>(
    ui: &mut C,
    msg: &EthereumSignTx,
    ctx: &ContractContext<'_>,
) -> Result<Option<ContractCall>, SignError> {
    match classify(msg, ctx) {
        Some(call) => {
            call.confirm(ui, msg, ctx)?;
            Ok(Some(call))
        }
        None => Ok(None),
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// The host announced exactly the calldata it sent.
pub(crate) fn data_is_complete(msg: &EthereumSignTx) -> bool {
    msg.data_length as usize == msg.data_initial_chunk.len()
}

/// Lowercase hex without a prefix.
pub(crate) fn hex_lower(bytes: &[u8]) -> String {
    hex::encode(bytes)
}


#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;
    use crate::confirm::MockUi;
    use hex_literal::hex;

    const CETH: [u8; 20] = hex!("4ddc2d193948926d02f9b1fe9e1daa0718270ed5");

    #[test]
    fn test_priority_lists_every_classifier_once() {
        assert_eq!(PRIORITY.len(), 11);
        for (i, a) in PRIORITY.iter().enumerate() {
            assert!(!PRIORITY[i + 1..].contains(a));
        }
        assert_eq!(PRIORITY.last(), Some(&ContractCall::MakerDao));
    }

    #[test]
    fn test_unrecognized_calldata_is_not_handled() {
        let reg = Registry::new();
        let ctx = ContractContext {
            my_address: [0; 20],
            registry: &reg,
        };
        let msg = tx([0x11; 20], 0, calldata(hex!("deadbeef"), &[word(1)]));
        let mut ui = MockUi::new();
        assert_eq!(handle(&mut ui, &msg, &ctx), Ok(None));
        assert!(ui.prompts.is_empty());
    }

    #[test]
    fn test_handle_confirms_the_classified_call() {
        let reg = Registry::new();
        let ctx = ContractContext {
            my_address: [0; 20],
            registry: &reg,
        };
        let msg = tx(CETH, 1_000_000_000_000_000_000, hex!("1249c58b").to_vec());
        let mut ui = MockUi::new();
        assert_eq!(handle(&mut ui, &msg, &ctx), Ok(Some(ContractCall::Compound)));
        assert_eq!(ui.confirm_count(), 1);

        let mut ui = MockUi::scripted(&[false]);
        assert_eq!(handle(&mut ui, &msg, &ctx), Err(SignError::RejectedByUser));
    }
}
