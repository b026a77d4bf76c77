//! Amino-JSON signing for Tendermint chains (Cosmos Hub, Kujira,
//! Thorchain, Osmosis).
//!
//! The sign document is never materialized. Each fragment is formatted
//! straight into a running SHA-256, so memory use does not depend on
//! the number of messages:
//!
//! ```text
//! {"account_number":"N","chain_id":"..","fee":{"amount":[{"amount":"F","denom":"D"}],"gas":"G"},
//!  "memo":"..","msgs":[MSG,MSG,...],"sequence":"S"}
//! ```
//!
//! Field order is the chain's canonical order and must not change.
//! Host-supplied strings are escaped for `"` and `\` only.

use core::fmt::{self, Write};

use sha2::{Digest, Sha256};
use txsign_common::{
    Bip32Path, Hash256, Policies, SignError, TendermintMsg, TendermintSignTx,
};

use crate::coins::{coin_amount_to_string, coin_by_shortcut};
use crate::confirm::{require, ButtonRequest, Confirm};
use crate::crypto::{hash160, HdNode};
use crate::thorchain::{self, MAX_MEMO_SIZE};

/// Longest fee/amount denomination.
pub const MAX_DENOM_LEN: usize = 9;
/// Longest amino message type prefix.
pub const MAX_MSG_TYPE_PREFIX_LEN: usize = 24;
/// Longest bech32 human-readable part.
pub const MAX_CHAINSTR_LEN: usize = 14;

/// How the account path is checked before signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathCheck {
    /// m/44'/coin'/account'/0/index with a non-hardened index.
    Layout,
    /// Same layout, index must be 0.
    ZeroIndex,
    None,
}

/// Per-chain constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainProfile {
    /// Used in the final prompt.
    pub name: &'static str,
    pub coin_shortcut: &'static str,
    pub bip44_coin: u32,
    pub address_prefix: &'static str,
    pub testnet_prefix: Option<&'static str>,
    pub denom: &'static str,
    pub msg_type_prefix: &'static str,
    pub path_check: PathCheck,
}

impl ChainProfile {
    pub fn prefix(&self, testnet: bool) -> &'static str {
        match (testnet, self.testnet_prefix) {
            (true, Some(prefix)) => prefix,
            _ => self.address_prefix,
        }
    }

    fn is_thorchain(&self) -> bool {
        self.coin_shortcut == "RUNE"
    }
}

pub static COSMOS: ChainProfile = ChainProfile {
    name: "Cosmos",
    coin_shortcut: "ATOM",
    bip44_coin: 118,
    address_prefix: "cosmos",
    testnet_prefix: None,
    denom: "uatom",
    msg_type_prefix: "cosmos-sdk",
    path_check: PathCheck::Layout,
};

pub static KUJIRA: ChainProfile = ChainProfile {
    name: "Kujira",
    coin_shortcut: "KUJI",
    bip44_coin: 118,
    address_prefix: "kujira",
    testnet_prefix: None,
    denom: "uatom",
    msg_type_prefix: "kujira-sdk",
    path_check: PathCheck::ZeroIndex,
};

pub static THORCHAIN: ChainProfile = ChainProfile {
    name: "THORChain",
    coin_shortcut: "RUNE",
    bip44_coin: 931,
    address_prefix: "thor",
    testnet_prefix: Some("tthor"),
    denom: "rune",
    msg_type_prefix: "thorchain",
    path_check: PathCheck::ZeroIndex,
};

pub static OSMOSIS: ChainProfile = ChainProfile {
    name: "Osmosis",
    coin_shortcut: "OSMO",
    bip44_coin: 118,
    address_prefix: "osmo",
    testnet_prefix: None,
    denom: "uosmo",
    msg_type_prefix: "cosmos-sdk",
    path_check: PathCheck::None,
};

// =============================================================================
// Addresses
// =============================================================================

/// bech32(prefix, ripemd160(sha256(compressed pubkey))).
pub fn tendermint_address(public_key: &[u8; 33], prefix: &str) -> Result<String, SignError> {
    if prefix.len() > MAX_CHAINSTR_LEN {
        return Err(SignError::InvalidAddress);
    }
    let hrp = bech32::Hrp::parse(prefix).map_err(|_| SignError::InvalidAddress)?;
    bech32::encode::<bech32::Bech32>(hrp, &hash160(public_key))
        .map_err(|_| SignError::InvalidAddress)
}

fn check_bech32(address: &str) -> Result<(), SignError> {
    bech32::decode(address).map(|_| ()).map_err(|_| {
        log::warn!("rejecting malformed bech32 address");
        SignError::InvalidAddress
    })
}

pub fn path_mismatched(profile: &ChainProfile, path: &Bip32Path) -> bool {
    let coin = profile.bip44_coin | Bip32Path::HARDENED;
    match profile.path_check {
        PathCheck::Layout => !path.matches_cosmos_layout(coin, false),
        PathCheck::ZeroIndex => !path.matches_cosmos_layout(coin, true),
        PathCheck::None => false,
    }
}

// =============================================================================
// Streaming JSON
// =============================================================================

/// `fmt::Write` sink feeding a SHA-256.
struct HashWriter(Sha256);

impl Write for HashWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.update(s.as_bytes());
        Ok(())
    }
}

/// Formats as a JSON string body, escaping `"` and `\`.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(i) = rest.find(['"', '\\']) {
            f.write_str(&rest[..i])?;
            f.write_str(if rest.as_bytes()[i] == b'"' { "\\\"" } else { "\\\\" })?;
            rest = &rest[i + 1..];
        }
        f.write_str(rest)
    }
}

/// `{"amount":"A","denom":"D"}`
struct Coin<'a>(u64, &'a str);

impl fmt::Display for Coin<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"amount\":\"{}\",\"denom\":\"{}\"}}",
            self.0,
            Escaped(self.1)
        )
    }
}

fn emit(out: &mut HashWriter, args: fmt::Arguments<'_>) -> Result<(), SignError> {
    out.write_fmt(args).map_err(|_| SignError::InvalidState)
}

fn write_msg(
    out: &mut HashWriter,
    prefix: &str,
    denom: &str,
    from_address: &str,
    msg: &TendermintMsg,
) -> Result<(), SignError> {
    match msg {
        TendermintMsg::Send { to_address, amount } => emit(
            out,
            format_args!(
                "{{\"type\":\"{}/MsgSend\",\"value\":{{\"amount\":[{}],\"from_address\":\"{}\",\"to_address\":\"{}\"}}}}",
                prefix,
                Coin(*amount, denom),
                Escaped(from_address),
                Escaped(to_address)
            ),
        ),
        TendermintMsg::Delegate {
            delegator_address,
            validator_address,
            amount,
        }
        | TendermintMsg::Undelegate {
            delegator_address,
            validator_address,
            amount,
        } => {
            let name = if matches!(msg, TendermintMsg::Delegate { .. }) {
                "MsgDelegate"
            } else {
                "MsgUndelegate"
            };
            emit(
                out,
                format_args!(
                    "{{\"type\":\"{}/{}\",\"value\":{{\"amount\":{},\"delegator_address\":\"{}\",\"validator_address\":\"{}\"}}}}",
                    prefix,
                    name,
                    Coin(*amount, denom),
                    Escaped(delegator_address),
                    Escaped(validator_address)
                ),
            )
        }
        TendermintMsg::Redelegate {
            delegator_address,
            validator_src_address,
            validator_dst_address,
            amount,
        } => emit(
            out,
            format_args!(
                "{{\"type\":\"{}/MsgBeginRedelegate\",\"value\":{{\"amount\":{},\"delegator_address\":\"{}\",\"validator_dst_address\":\"{}\",\"validator_src_address\":\"{}\"}}}}",
                prefix,
                Coin(*amount, denom),
                Escaped(delegator_address),
                Escaped(validator_dst_address),
                Escaped(validator_src_address)
            ),
        ),
        TendermintMsg::Rewards {
            delegator_address,
            validator_address,
            amount,
        } => {
            emit(
                out,
                format_args!(
                    "{{\"type\":\"{}/MsgWithdrawDelegationReward\",\"value\":{{",
                    prefix
                ),
            )?;
            if let Some(amount) = amount {
                emit(out, format_args!("\"amount\":{},", Coin(*amount, denom)))?;
            }
            emit(
                out,
                format_args!(
                    "\"delegator_address\":\"{}\",\"validator_address\":\"{}\"}}}}",
                    Escaped(delegator_address),
                    Escaped(validator_address)
                ),
            )
        }
        TendermintMsg::IbcTransfer {
            sender,
            receiver,
            source_channel,
            source_port,
            revision_height,
            revision_number,
            denom: token_denom,
            amount,
        } => emit(
            out,
            format_args!(
                "{{\"type\":\"{}/MsgTransfer\",\"value\":{{\"receiver\":\"{}\",\"sender\":\"{}\",\"source_channel\":\"{}\",\"source_port\":\"{}\",\"timeout_height\":{{\"revision_height\":\"{}\",\"revision_number\":\"{}\"}},\"token\":{}}}}}",
                prefix,
                Escaped(receiver),
                Escaped(sender),
                Escaped(source_channel),
                Escaped(source_port),
                Escaped(revision_height),
                Escaped(revision_number),
                Coin(*amount, token_denom)
            ),
        ),
    }
}

// =============================================================================
// Session
// =============================================================================

/// Public key and signature over the sign document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TendermintSignature {
    pub public_key: [u8; 33],
    pub signature: [u8; 64],
    /// SHA-256 of the sign document.
    pub digest: Hash256,
}

struct Active {
    node: HdNode,
    profile: &'static ChainProfile,
    json: HashWriter,
    from_address: String,
    chain_id: String,
    memo: String,
    fee_amount: u64,
    gas: u64,
    sequence: u64,
    msgs_remaining: u32,
    has_message: bool,
}

/// A Tendermint signing session: `init`, one `update_msg` per message,
/// then `finalize`. `abort` is valid in any state.
///
/// Any error aborts the session, dropping (and zeroizing) the key.
#[derive(Default)]
pub struct TendermintSession {
    active: Option<Active>,
}

impl TendermintSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// True once every announced message has been added.
    pub fn is_finished(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.msgs_remaining == 0)
    }

    pub fn abort(&mut self) {
        if self.active.take().is_some() {
            log::debug!("tendermint session aborted");
        }
    }

    /// Opens a session and hashes everything up to `"msgs":[`.
    ///
    /// An open session is aborted first, or refused with
    /// [`SignError::InvalidState`] under `strict_session_init`.
    pub fn init<C: Confirm + ?Sized>(
        &mut self,
        ui: &mut C,
        policies: &Policies,
        profile: &'static ChainProfile,
        node: HdNode,
        msg: &TendermintSignTx,
    ) -> Result<(), SignError> {
        if self.active.is_some() {
            if policies.strict_session_init {
                log::warn!("tendermint init while a session is open");
                return Err(SignError::InvalidState);
            }
            self.abort();
        }

        let active = Self::open(ui, profile, node, msg)?;
        log::info!(
            "{} signing session opened, {} messages",
            profile.name,
            msg.msg_count
        );
        self.active = Some(active);
        Ok(())
    }

    fn open<C: Confirm + ?Sized>(
        ui: &mut C,
        profile: &'static ChainProfile,
        node: HdNode,
        msg: &TendermintSignTx,
    ) -> Result<Active, SignError> {
        if profile.denom.len() > MAX_DENOM_LEN
            || profile.msg_type_prefix.len() > MAX_MSG_TYPE_PREFIX_LEN
        {
            return Err(SignError::InvalidData);
        }
        if msg.memo.len() > MAX_MEMO_SIZE {
            return Err(SignError::BufferOverflow);
        }

        if path_mismatched(profile, &msg.address_n) {
            require(
                ui,
                ButtonRequest::Other,
                "WARNING",
                "Wrong address path for selected coin. Continue at your own risk!",
            )?;
        }

        let from_address = tendermint_address(node.public_key(), profile.prefix(msg.testnet))?;

        let mut json = HashWriter(Sha256::new());
        emit(
            &mut json,
            format_args!(
                "{{\"account_number\":\"{}\",\"chain_id\":\"{}\",\"fee\":{{\"amount\":[{}],\"gas\":\"{}\"}},\"memo\":\"{}\",\"msgs\":[",
                msg.account_number,
                Escaped(&msg.chain_id),
                Coin(msg.fee_amount, profile.denom),
                msg.gas,
                Escaped(&msg.memo)
            ),
        )?;

        Ok(Active {
            node,
            profile,
            json,
            from_address,
            chain_id: msg.chain_id.clone(),
            memo: msg.memo.clone(),
            fee_amount: msg.fee_amount,
            gas: msg.gas,
            sequence: msg.sequence,
            msgs_remaining: msg.msg_count,
            has_message: false,
        })
    }

    /// Confirms one message with the user and appends it to the document.
    pub fn update_msg<C: Confirm + ?Sized>(
        &mut self,
        ui: &mut C,
        msg: &TendermintMsg,
    ) -> Result<(), SignError> {
        let result = self.try_update(ui, msg);
        if result.is_err() {
            self.abort();
        }
        result
    }

    fn try_update<C: Confirm + ?Sized>(
        &mut self,
        ui: &mut C,
        msg: &TendermintMsg,
    ) -> Result<(), SignError> {
        let active = self.active.as_mut().ok_or(SignError::InvalidState)?;
        if active.msgs_remaining == 0 {
            log::warn!("more messages than announced");
            return Err(SignError::InvalidState);
        }

        validate_msg(msg)?;
        confirm_msg(ui, active.profile, msg)?;

        if active.has_message {
            emit(&mut active.json, format_args!(","))?;
        }
        write_msg(
            &mut active.json,
            active.profile.msg_type_prefix,
            active.profile.denom,
            &active.from_address,
            msg,
        )?;

        active.has_message = true;
        active.msgs_remaining -= 1;
        log::debug!("message added, {} remaining", active.msgs_remaining);
        Ok(())
    }

    /// Confirms the memo and the fee, closes the document and signs it.
    /// The session ends whatever the outcome.
    pub fn finalize<C: Confirm + ?Sized>(
        &mut self,
        ui: &mut C,
    ) -> Result<TendermintSignature, SignError> {
        let mut active = self.active.take().ok_or(SignError::InvalidState)?;
        if active.msgs_remaining != 0 {
            log::warn!("finalize with {} messages outstanding", active.msgs_remaining);
            return Err(SignError::InvalidState);
        }

        if !active.memo.is_empty() {
            let shown = active.profile.is_thorchain() && thorchain::confirm_memo(ui, &active.memo)?;
            if !shown {
                require(ui, ButtonRequest::ConfirmMemo, "Memo", &active.memo)?;
            }
        }

        let body = if active.profile.is_thorchain() {
            format!(
                "Sign this RUNE transaction on {}? Additional network fees apply.",
                active.chain_id
            )
        } else {
            format!(
                "Sign {} transaction on {}? It includes a fee of {} {} and {} gas.",
                active.profile.name,
                active.chain_id,
                active.fee_amount,
                active.profile.denom,
                active.gas
            )
        };
        require(ui, ButtonRequest::SignTx, "Transaction", &body)?;

        emit(
            &mut active.json,
            format_args!("],\"sequence\":\"{}\"}}", active.sequence),
        )?;
        let digest: Hash256 = active.json.0.finalize().into();
        let (signature, _) = active.node.sign_digest(&digest)?;

        log::info!("{} transaction signed", active.profile.name);
        Ok(TendermintSignature {
            public_key: *active.node.public_key(),
            signature,
            digest,
        })
    }
}

fn validate_msg(msg: &TendermintMsg) -> Result<(), SignError> {
    match msg {
        TendermintMsg::Send { to_address, .. } => check_bech32(to_address),
        TendermintMsg::Delegate {
            delegator_address, ..
        }
        | TendermintMsg::Undelegate {
            delegator_address, ..
        }
        | TendermintMsg::Redelegate {
            delegator_address, ..
        }
        | TendermintMsg::Rewards {
            delegator_address, ..
        } => check_bech32(delegator_address),
        TendermintMsg::IbcTransfer {
            receiver, denom, ..
        } => {
            if denom.len() > MAX_DENOM_LEN {
                return Err(SignError::InvalidData);
            }
            check_bech32(receiver)
        }
    }
}

fn confirm_msg<C: Confirm + ?Sized>(
    ui: &mut C,
    profile: &ChainProfile,
    msg: &TendermintMsg,
) -> Result<(), SignError> {
    let coin = coin_by_shortcut(profile.coin_shortcut).ok_or(SignError::InvalidState)?;
    let amount = |value: u64| coin_amount_to_string(coin, value);
    let kind = ButtonRequest::ConfirmOutput;

    match msg {
        TendermintMsg::Send { to_address, amount: value } => {
            require(ui, kind, "Send", &format!("Send {} to {}?", amount(*value), to_address))
        }
        TendermintMsg::Delegate {
            validator_address,
            amount: value,
            ..
        } => require(
            ui,
            kind,
            "Delegate",
            &format!("Delegate {} to {}?", amount(*value), validator_address),
        ),
        TendermintMsg::Undelegate {
            validator_address,
            amount: value,
            ..
        } => require(
            ui,
            kind,
            "Undelegate",
            &format!("Undelegate {} from {}?", amount(*value), validator_address),
        ),
        TendermintMsg::Redelegate {
            validator_src_address,
            validator_dst_address,
            amount: value,
            ..
        } => require(
            ui,
            kind,
            "Redelegate",
            &format!(
                "Redelegate {} from {} to {}?",
                amount(*value),
                validator_src_address,
                validator_dst_address
            ),
        ),
        TendermintMsg::Rewards {
            validator_address,
            amount: value,
            ..
        } => {
            let what = value.map_or_else(|| "rewards".to_string(), amount);
            require(
                ui,
                kind,
                "Claim Rewards",
                &format!("Claim {} from {}?", what, validator_address),
            )
        }
        TendermintMsg::IbcTransfer {
            receiver,
            source_channel,
            denom,
            amount: value,
            ..
        } => require(
            ui,
            kind,
            "IBC Transfer",
            &format!(
                "Transfer {} {} to {} on {}?",
                value, denom, receiver, source_channel
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::MockUi;
    use hex_literal::hex;

    const PRIVATE_KEY: [u8; 32] =
        hex!("04dec0cc013cd8ab7087ca14960b768c3d83452448aa0064dae6fb04b5d93476");
    const TO: &str = "cosmos18vhdczjut44gpsy804crfhnd5nq003nz0nf20v";

    fn node() -> HdNode {
        HdNode::from_private_key(&PRIVATE_KEY).unwrap()
    }

    fn sign_tx(chain_id: &str, memo: &str, msg_count: u32) -> TendermintSignTx {
        TendermintSignTx {
            address_n: Bip32Path::bip44(118, 0, 0),
            account_number: 0,
            chain_id: chain_id.to_string(),
            fee_amount: 5000,
            gas: 200000,
            memo: memo.to_string(),
            sequence: 1,
            msg_count,
            testnet: false,
        }
    }

    fn sha(s: &str) -> Hash256 {
        Sha256::digest(s.as_bytes()).into()
    }

    #[test]
    fn test_address() {
        let pubkey = hex!("03b7329f678e0ac1214b7723575466219c77fedbdd955c33291a74f18bf5c8a4e2");
        assert_eq!(
            tendermint_address(&pubkey, "cosmos").unwrap(),
            "cosmos1am058pdux3hyulcmfgj4m3hhrlfn8nzm88u80q"
        );
        assert_eq!(
            tendermint_address(&pubkey, "thor").unwrap(),
            "thor1am058pdux3hyulcmfgj4m3hhrlfn8nzmpq9u6l"
        );
        assert!(tendermint_address(&pubkey, "averyveryverylongprefix").is_err());
    }

    #[test]
    fn test_escaping() {
        assert_eq!(Escaped(r#"a"b\c"#).to_string(), r#"a\"b\\c"#);
        assert_eq!(Escaped("plain").to_string(), "plain");
        assert_eq!(Escaped("\"\"").to_string(), "\\\"\\\"");
    }

    #[test]
    fn test_streamed_send_matches_document() {
        let signer = node();
        let from = tendermint_address(signer.public_key(), "cosmos").unwrap();
        let mut session = TendermintSession::new();
        let mut ui = MockUi::new();

        session
            .init(&mut ui, &Policies::default(), &COSMOS, signer, &sign_tx("cosmoshub-2", "", 1))
            .unwrap();
        session
            .update_msg(&mut ui, &TendermintMsg::Send { to_address: TO.to_string(), amount: 100000 })
            .unwrap();
        assert!(session.is_finished());
        let sig = session.finalize(&mut ui).unwrap();

        let expected = format!(
            "{{\"account_number\":\"0\",\"chain_id\":\"cosmoshub-2\",\"fee\":{{\"amount\":[{{\"amount\":\"5000\",\"denom\":\"uatom\"}}],\"gas\":\"200000\"}},\"memo\":\"\",\"msgs\":[{{\"type\":\"cosmos-sdk/MsgSend\",\"value\":{{\"amount\":[{{\"amount\":\"100000\",\"denom\":\"uatom\"}}],\"from_address\":\"{}\",\"to_address\":\"{}\"}}}}],\"sequence\":\"1\"}}",
            from, TO
        );
        assert_eq!(sig.digest, sha(&expected));
        assert!(!session.is_active());

        assert_eq!(ui.bodies()[0], format!("Send 0.1 ATOM to {}?", TO));
        assert_eq!(
            ui.bodies()[1],
            "Sign Cosmos transaction on cosmoshub-2? It includes a fee of 5000 uatom and 200000 gas."
        );
    }

    #[test]
    fn test_messages_are_comma_separated() {
        let mut session = TendermintSession::new();
        let mut ui = MockUi::new();
        session
            .init(&mut ui, &Policies::default(), &COSMOS, node(), &sign_tx("c\"x", "m\\", 2))
            .unwrap();
        let delegator = tendermint_address(node().public_key(), "cosmos").unwrap();
        session
            .update_msg(
                &mut ui,
                &TendermintMsg::Delegate {
                    delegator_address: delegator.clone(),
                    validator_address: "val".to_string(),
                    amount: 7,
                },
            )
            .unwrap();
        session
            .update_msg(
                &mut ui,
                &TendermintMsg::Rewards {
                    delegator_address: delegator.clone(),
                    validator_address: "val".to_string(),
                    amount: None,
                },
            )
            .unwrap();
        let sig = session.finalize(&mut ui).unwrap();

        let expected = format!(
            "{{\"account_number\":\"0\",\"chain_id\":\"c\\\"x\",\"fee\":{{\"amount\":[{{\"amount\":\"5000\",\"denom\":\"uatom\"}}],\"gas\":\"200000\"}},\"memo\":\"m\\\\\",\"msgs\":[{{\"type\":\"cosmos-sdk/MsgDelegate\",\"value\":{{\"amount\":{{\"amount\":\"7\",\"denom\":\"uatom\"}},\"delegator_address\":\"{d}\",\"validator_address\":\"val\"}}}},{{\"type\":\"cosmos-sdk/MsgWithdrawDelegationReward\",\"value\":{{\"delegator_address\":\"{d}\",\"validator_address\":\"val\"}}}}],\"sequence\":\"1\"}}",
            d = delegator
        );
        assert_eq!(sig.digest, sha(&expected));
        assert!(ui.bodies().contains(&"Claim rewards from val?"));
        assert!(ui.bodies().contains(&"m\\"));
    }

    #[test]
    fn test_finalize_before_all_messages_fails() {
        let mut session = TendermintSession::new();
        let mut ui = MockUi::new();
        session
            .init(&mut ui, &Policies::default(), &COSMOS, node(), &sign_tx("cosmoshub-4", "", 2))
            .unwrap();
        session
            .update_msg(&mut ui, &TendermintMsg::Send { to_address: TO.to_string(), amount: 1 })
            .unwrap();
        assert_eq!(session.finalize(&mut ui), Err(SignError::InvalidState));
        assert!(!session.is_active());
    }

    #[test]
    fn test_update_after_abort_fails() {
        let mut session = TendermintSession::new();
        let mut ui = MockUi::new();
        session
            .init(&mut ui, &Policies::default(), &COSMOS, node(), &sign_tx("cosmoshub-4", "", 1))
            .unwrap();
        session.abort();
        let send = TendermintMsg::Send { to_address: TO.to_string(), amount: 1 };
        assert_eq!(session.update_msg(&mut ui, &send), Err(SignError::InvalidState));
    }

    #[test]
    fn test_extra_message_and_bad_address_abort() {
        let mut session = TendermintSession::new();
        let mut ui = MockUi::new();
        session
            .init(&mut ui, &Policies::default(), &COSMOS, node(), &sign_tx("cosmoshub-4", "", 1))
            .unwrap();
        let bad = TendermintMsg::Send { to_address: "cosmos1notbech32".to_string(), amount: 1 };
        assert_eq!(session.update_msg(&mut ui, &bad), Err(SignError::InvalidAddress));
        assert!(!session.is_active());
    }

    #[test]
    fn test_reinit_policy() {
        let mut ui = MockUi::new();
        let mut session = TendermintSession::new();
        let tx = sign_tx("cosmoshub-4", "", 1);

        session.init(&mut ui, &Policies::default(), &COSMOS, node(), &tx).unwrap();
        session.init(&mut ui, &Policies::default(), &COSMOS, node(), &tx).unwrap();
        assert!(session.is_active());

        let strict = Policies {
            strict_session_init: true,
            ..Policies::default()
        };
        assert_eq!(
            session.init(&mut ui, &strict, &COSMOS, node(), &tx),
            Err(SignError::InvalidState)
        );
        assert!(session.is_active());
    }

    #[test]
    fn test_wrong_path_warns() {
        let mut tx = sign_tx("kaiyo-1", "", 0);
        tx.address_n = Bip32Path::bip44(118, 0, 3);
        let mut ui = MockUi::scripted(&[false]);
        let mut session = TendermintSession::new();
        assert_eq!(
            session.init(&mut ui, &Policies::default(), &KUJIRA, node(), &tx),
            Err(SignError::RejectedByUser)
        );
        assert_eq!(ui.prompts[0].title, "WARNING");
        assert!(!session.is_active());

        let mut ui = MockUi::new();
        session.init(&mut ui, &Policies::default(), &COSMOS, node(), &tx).unwrap();
        assert_eq!(ui.prompts.len(), 0);
    }

    #[test]
    fn test_thorchain_memo_and_fee_prompt() {
        let mut tx = sign_tx("thorchain", "SWAP:BTC.BTC:bc1qxyz", 0);
        tx.address_n = Bip32Path::bip44(931, 0, 0);
        let mut ui = MockUi::new();
        let mut session = TendermintSession::new();
        session.init(&mut ui, &Policies::default(), &THORCHAIN, node(), &tx).unwrap();
        session.finalize(&mut ui).unwrap();

        let bodies = ui.bodies();
        assert!(!bodies.contains(&"SWAP:BTC.BTC:bc1qxyz"));
        assert_eq!(
            *bodies.last().unwrap(),
            "Sign this RUNE transaction on thorchain? Additional network fees apply."
        );
    }

    #[test]
    fn test_plain_memo_is_shown_verbatim() {
        let mut ui = MockUi::new();
        let mut session = TendermintSession::new();
        session
            .init(&mut ui, &Policies::default(), &OSMOSIS, node(), &sign_tx("osmosis-1", "hello", 0))
            .unwrap();
        session.finalize(&mut ui).unwrap();
        assert_eq!(ui.prompts[0].kind, ButtonRequest::ConfirmMemo);
        assert_eq!(ui.prompts[0].body, "hello");
    }

    #[test]
    fn test_thorchain_testnet_prefix() {
        assert_eq!(THORCHAIN.prefix(true), "tthor");
        assert_eq!(THORCHAIN.prefix(false), "thor");
        assert_eq!(COSMOS.prefix(true), "cosmos");
    }
}
