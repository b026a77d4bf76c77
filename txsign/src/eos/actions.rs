//! Decoders for the `eosio` and `eosio.token` actions the device can
//! show in plain words.
//!
//! Each decoder checks the action is addressed where it belongs, asks
//! the user, and only then serializes it into the preimage.

use txsign_common::{EosActionCommon, EosActionPayload, EosAsset, SignError};

use super::auth::compile_auth;
use super::names::*;
use super::Preimage;
use crate::confirm::{require, ButtonRequest, Confirm};
use crate::crypto::KeySource;
use crate::format::is_printable_ascii;
use crate::thorchain::MAX_MEMO_SIZE;

/// Producers per voting screen.
const PRODUCERS_PER_PAGE: usize = 6;

/// Actions with a decoder here. These can never be signed as opaque
/// data.
pub fn is_supported_action(common: &EosActionCommon) -> bool {
    if common.account != ACCOUNT_EOSIO && common.account != ACCOUNT_EOSIO_TOKEN {
        return false;
    }
    matches!(
        common.name,
        ACTION_TRANSFER
            | PERMISSION_OWNER
            | PERMISSION_ACTIVE
            | ACTION_DELEGATEBW
            | ACTION_UNDELEGATEBW
            | ACTION_REFUND
            | ACTION_BUYRAM
            | ACTION_BUYRAMBYTES
            | ACTION_SELLRAM
            | ACTION_VOTEPRODUCER
            | ACTION_UPDATEAUTH
            | ACTION_DELETEAUTH
            | ACTION_LINKAUTH
            | ACTION_UNLINKAUTH
            | ACTION_NEWACCOUNT
    )
}

/// Where a payload may be sent: its action name, and whether only
/// `eosio.token` is accepted. System actions take either system account.
fn expected_target(payload: &EosActionPayload) -> Option<(u64, bool)> {
    let target = match payload {
        EosActionPayload::Transfer { .. } => (ACTION_TRANSFER, true),
        EosActionPayload::DelegateBw { .. } => (ACTION_DELEGATEBW, false),
        EosActionPayload::UndelegateBw { .. } => (ACTION_UNDELEGATEBW, false),
        EosActionPayload::Refund { .. } => (ACTION_REFUND, false),
        EosActionPayload::BuyRam { .. } => (ACTION_BUYRAM, false),
        EosActionPayload::BuyRamBytes { .. } => (ACTION_BUYRAMBYTES, false),
        EosActionPayload::SellRam { .. } => (ACTION_SELLRAM, false),
        EosActionPayload::VoteProducer { .. } => (ACTION_VOTEPRODUCER, false),
        EosActionPayload::UpdateAuth { .. } => (ACTION_UPDATEAUTH, false),
        EosActionPayload::DeleteAuth { .. } => (ACTION_DELETEAUTH, false),
        EosActionPayload::LinkAuth { .. } => (ACTION_LINKAUTH, false),
        EosActionPayload::UnlinkAuth { .. } => (ACTION_UNLINKAUTH, false),
        EosActionPayload::NewAccount { .. } => (ACTION_NEWACCOUNT, false),
        EosActionPayload::Unknown { .. } => return None,
    };
    Some(target)
}

pub(super) fn confirm_action<C: Confirm + ?Sized>(
    ui: &mut C,
    title: &str,
    body: &str,
) -> Result<(), SignError> {
    require(ui, ButtonRequest::ConfirmEosAction, title, body)
}

/// Shows a decoded action and appends `common` plus its payload to the
/// preimage. `Unknown` payloads are not handled here.
///
/// Keys an authority names by path are derived from `keys`.
pub fn compile_known<C: Confirm + ?Sized, K: KeySource + ?Sized>(
    ui: &mut C,
    keys: &K,
    preimage: &mut Preimage,
    common: &EosActionCommon,
    payload: &EosActionPayload,
) -> Result<(), SignError> {
    let (name, token_only) = expected_target(payload).ok_or(SignError::InvalidState)?;
    let account_ok = common.account == ACCOUNT_EOSIO_TOKEN
        || (!token_only && common.account == ACCOUNT_EOSIO);
    if !account_ok || common.name != name {
        log::warn!(
            "{} payload sent to {}:{}",
            format_name(name),
            format_name(common.account),
            format_name(common.name)
        );
        return Err(SignError::InvalidData);
    }
    if common.authorization.is_empty() {
        return Err(SignError::InvalidData);
    }

    match payload {
        EosActionPayload::Transfer {
            sender,
            receiver,
            quantity,
            memo,
        } => {
            if memo.len() > MAX_MEMO_SIZE {
                return Err(SignError::InvalidData);
            }
            confirm_action(
                ui,
                "Transfer",
                &format!(
                    "Do you want to send {} from {} to {}?",
                    format_asset(quantity)?,
                    format_name(*sender),
                    format_name(*receiver)
                ),
            )?;
            let shown = if is_printable_ascii(memo.as_bytes()) {
                memo.clone()
            } else {
                hex::encode(memo.as_bytes())
            };
            require(
                ui,
                ButtonRequest::ConfirmMemo,
                &format!("Confirm Memo ({} bytes)", memo.len()),
                &shown,
            )?;

            let memo_len = memo.len() as u64;
            preimage.action_common(common);
            preimage.varuint(8 + 8 + 16 + Preimage::varuint_len(memo_len) + memo_len);
            preimage.u64(*sender);
            preimage.u64(*receiver);
            preimage.asset(quantity);
            preimage.varuint(memo_len);
            preimage.bytes(memo.as_bytes());
        }

        EosActionPayload::DelegateBw {
            sender,
            receiver,
            net_quantity,
            cpu_quantity,
            transfer,
        } => {
            let verb = if *transfer { "Transfer" } else { "Delegate" };
            confirm_action(
                ui,
                "Delegate",
                &format!(
                    "{} {} CPU and {} NET from {} to {}?",
                    verb,
                    format_asset(cpu_quantity)?,
                    format_asset(net_quantity)?,
                    format_name(*sender),
                    format_name(*receiver)
                ),
            )?;
            preimage.action_common(common);
            preimage.varuint(8 + 8 + 16 + 16 + 1);
            preimage.u64(*sender);
            preimage.u64(*receiver);
            preimage.asset(net_quantity);
            preimage.asset(cpu_quantity);
            preimage.bytes(&[u8::from(*transfer)]);
        }

        EosActionPayload::UndelegateBw {
            sender,
            receiver,
            net_quantity,
            cpu_quantity,
        } => {
            confirm_action(
                ui,
                "Undelegate",
                &format!(
                    "Revoke delegation of {} CPU and {} NET from {} to {}?",
                    format_asset(cpu_quantity)?,
                    format_asset(net_quantity)?,
                    format_name(*sender),
                    format_name(*receiver)
                ),
            )?;
            preimage.action_common(common);
            preimage.varuint(8 + 8 + 16 + 16);
            preimage.u64(*sender);
            preimage.u64(*receiver);
            preimage.asset(net_quantity);
            preimage.asset(cpu_quantity);
        }

        EosActionPayload::Refund { owner } => {
            confirm_action(
                ui,
                "Refund",
                &format!(
                    "Do you want to reclaim all pending unstaked tokens from your {} account?",
                    format_name(*owner)
                ),
            )?;
            preimage.action_common(common);
            preimage.varuint(8);
            preimage.u64(*owner);
        }

        EosActionPayload::BuyRam {
            payer,
            receiver,
            quantity,
        } => {
            confirm_action(
                ui,
                "Buy Ram",
                &format!(
                    "Using your {} account, buy {} worth of RAM for {} at market price?",
                    format_name(*payer),
                    format_asset(quantity)?,
                    format_name(*receiver)
                ),
            )?;
            preimage.action_common(common);
            preimage.varuint(8 + 8 + 16);
            preimage.u64(*payer);
            preimage.u64(*receiver);
            preimage.asset(quantity);
        }

        EosActionPayload::BuyRamBytes {
            payer,
            receiver,
            bytes,
        } => {
            confirm_action(
                ui,
                "Buy Ram Bytes",
                &format!(
                    "Using your {} account, buy {} bytes of RAM for {}?",
                    format_name(*payer),
                    bytes,
                    format_name(*receiver)
                ),
            )?;
            preimage.action_common(common);
            preimage.varuint(8 + 8 + 4);
            preimage.u64(*payer);
            preimage.u64(*receiver);
            preimage.bytes(&bytes.to_le_bytes());
        }

        EosActionPayload::SellRam { account, bytes } => {
            confirm_action(
                ui,
                "Sell Ram",
                &format!(
                    "Using your {} account, sell {} bytes of RAM at market price?",
                    format_name(*account),
                    bytes
                ),
            )?;
            preimage.action_common(common);
            preimage.varuint(8 + 8);
            preimage.u64(*account);
            preimage.u64(*bytes);
        }

        EosActionPayload::VoteProducer {
            voter,
            proxy,
            producers,
        } => compile_vote(ui, preimage, common, *voter, *proxy, producers)?,

        EosActionPayload::UpdateAuth { .. }
        | EosActionPayload::DeleteAuth { .. }
        | EosActionPayload::LinkAuth { .. }
        | EosActionPayload::UnlinkAuth { .. }
        | EosActionPayload::NewAccount { .. } => {
            compile_auth(ui, keys, preimage, common, payload)?
        }

        EosActionPayload::Unknown { .. } => return Err(SignError::InvalidState),
    }

    log::debug!("compiled {}:{}", format_name(common.account), format_name(common.name));
    Ok(())
}

fn compile_vote<C: Confirm + ?Sized>(
    ui: &mut C,
    preimage: &mut Preimage,
    common: &EosActionCommon,
    voter: u64,
    proxy: u64,
    producers: &[u64],
) -> Result<(), SignError> {
    let voter_name = format_name(voter);

    if proxy != 0 {
        confirm_action(
            ui,
            "Vote Producer",
            &format!(
                "Using your {} account, vote for {} as your proxy?",
                voter_name,
                format_name(proxy)
            ),
        )?;
    } else if !producers.is_empty() {
        // The contract rejects unsorted or repeated votes too.
        if producers.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SignError::InvalidData);
        }
        let pages = 1 + producers.len().div_ceil(PRODUCERS_PER_PAGE);
        confirm_action(
            ui,
            &format!("Vote Producer 1/{}", pages),
            &format!(
                "Using your {} account, vote for the following producers?",
                voter_name
            ),
        )?;
        for (i, chunk) in producers.chunks(PRODUCERS_PER_PAGE).enumerate() {
            let names: Vec<String> = chunk.iter().map(|p| format_name(*p)).collect();
            confirm_action(
                ui,
                &format!("Vote Producer {}/{}", i + 2, pages),
                &names.join(", "),
            )?;
        }
    } else {
        confirm_action(
            ui,
            "Vote Producer",
            &format!(
                "Using your {} account, do you want to cancel your vote?",
                voter_name
            ),
        )?;
    }

    // A proxy vote carries no producers and vice versa.
    let producers: &[u64] = if proxy != 0 { &[] } else { producers };
    let count = producers.len() as u64;
    preimage.action_common(common);
    preimage.varuint(8 + 8 + Preimage::varuint_len(count) + 8 * count);
    preimage.u64(voter);
    preimage.u64(proxy);
    preimage.varuint(count);
    for producer in producers {
        preimage.u64(*producer);
    }
    Ok(())
}
