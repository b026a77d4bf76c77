//! EOS transaction signing.
//!
//! The host streams the header, then one message per action. Each
//! action is confirmed and folded into a running sha256 of the
//! `fc::raw` serialization. Nothing is buffered except the digest
//! state, so arbitrarily long transactions fit.
//!
//! Opaque actions arrive in chunks and feed a second hasher whose
//! digest is shown to the user as a fingerprint once the last chunk
//! is in.

pub mod actions;
pub mod auth;
pub mod names;

use sha2::{Digest, Sha256};
use txsign_common::{
    EosActionCommon, EosActionPayload, EosAsset, EosSignTx, EosTxAction, EosTxHeader, Hash256,
    Policies, SignError, Signature,
};

use crate::confirm::{require, ButtonRequest, Confirm};
use crate::crypto::{HdNode, KeySource};
use crate::format::format_ctime;

use self::actions::{compile_known, is_supported_action};
use self::names::{format_name, public_key_to_wif, PublicKeyKind};

const ADVANCED_MODE_WARNING: &str = "Signing of arbitrary EOS actions is recommended only for \
                                     experienced users. Enable 'AdvancedMode' policy to dismiss.";

// =============================================================================
// fc::raw preimage
// =============================================================================

/// Running sha256 over little-endian `fc::raw` fields.
pub struct Preimage(Sha256);

impl Preimage {
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn bytes(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    pub fn u64(&mut self, value: u64) {
        self.0.update(value.to_le_bytes());
    }

    /// LEB128, as `fc::unsigned_int`.
    pub fn varuint(&mut self, mut value: u64) {
        loop {
            let mut b = (value & 0x7f) as u8;
            value >>= 7;
            if value > 0 {
                b |= 0x80;
            }
            self.0.update([b]);
            if value == 0 {
                break;
            }
        }
    }

    /// Encoded size of [`Preimage::varuint`].
    pub fn varuint_len(mut value: u64) -> u64 {
        let mut n = 1;
        while value >= 0x80 {
            value >>= 7;
            n += 1;
        }
        n
    }

    pub fn asset(&mut self, asset: &EosAsset) {
        self.0.update(asset.amount.to_le_bytes());
        self.u64(asset.symbol);
    }

    /// Account, action name and authorization list.
    pub fn action_common(&mut self, common: &EosActionCommon) {
        self.u64(common.account);
        self.u64(common.name);
        self.varuint(common.authorization.len() as u64);
        for auth in &common.authorization {
            self.u64(auth.actor);
            self.u64(auth.permission);
        }
    }

    fn header(&mut self, chain_id: &[u8; 32], header: &EosTxHeader, num_actions: u32) {
        self.bytes(chain_id);
        self.bytes(&header.expiration.to_le_bytes());
        self.bytes(&header.ref_block_num.to_le_bytes());
        self.bytes(&header.ref_block_prefix.to_le_bytes());
        self.varuint(u64::from(header.max_net_usage_words));
        self.bytes(&[header.max_cpu_usage_ms]);
        self.varuint(u64::from(header.delay_sec));
        // context_free_actions
        self.varuint(0);
        self.varuint(u64::from(num_actions));
    }

    pub fn finish(self) -> Hash256 {
        self.0.finalize().into()
    }
}

impl Default for Preimage {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects signatures whose r or s would need a leading zero byte or
/// be read as negative.
pub fn is_canonic(signature: &[u8; 64]) -> bool {
    let half_ok = |hi: u8, next: u8| hi & 0x80 == 0 && !(hi == 0 && next & 0x80 == 0);
    half_ok(signature[0], signature[1]) && half_ok(signature[32], signature[33])
}

/// `EOS...` text form of the node's public key.
pub fn eos_public_key(node: &HdNode, kind: PublicKeyKind) -> String {
    public_key_to_wif(node.public_key(), kind)
}

// =============================================================================
// Session
// =============================================================================

/// Digest and signature over a finished transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EosSignedTx {
    pub hash: Hash256,
    /// `v` is `27 + recovery id + 4` (compressed key).
    pub signature: Signature,
}

struct UnknownAction {
    common: EosActionCommon,
    total: u32,
    remaining: u32,
    hasher: Sha256,
}

struct Active {
    node: HdNode,
    header: EosTxHeader,
    preimage: Preimage,
    actions_remaining: u32,
    unknown: Option<UnknownAction>,
}

/// One EOS transaction in flight.
#[derive(Default)]
pub struct EosSession {
    active: Option<Active>,
}

impl EosSession {
    pub fn new() -> Self {
        Self { active: None }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Every announced action has been added and no opaque action is
    /// waiting for more chunks.
    pub fn is_finished(&self) -> bool {
        self.active
            .as_ref()
            .map_or(false, |a| a.actions_remaining == 0 && a.unknown.is_none())
    }

    pub fn actions_remaining(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.actions_remaining)
    }

    /// Drops all state, including the key.
    pub fn abort(&mut self) {
        if self.active.take().is_some() {
            log::debug!("eos session aborted");
        }
    }

    /// Starts a transaction. `node` must already be derived for
    /// `msg.address_n`.
    pub fn init(&mut self, policies: &Policies, node: HdNode, msg: &EosSignTx) -> Result<(), SignError> {
        if self.active.is_some() {
            if policies.strict_session_init {
                return Err(SignError::InvalidState);
            }
            self.abort();
        }
        if msg.num_actions == 0 {
            return Err(SignError::InvalidTransaction);
        }

        let mut preimage = Preimage::new();
        preimage.header(&msg.chain_id, &msg.header, msg.num_actions);

        log::info!(
            "eos signing started, {} action(s), expiration {}",
            msg.num_actions,
            msg.header.expiration
        );
        self.active = Some(Active {
            node,
            header: msg.header,
            preimage,
            actions_remaining: msg.num_actions,
            unknown: None,
        });
        Ok(())
    }

    /// Confirms and hashes one action (or one chunk of an opaque one).
    /// `keys` derives any authority key given as a path. Any error ends
    /// the session.
    pub fn add_action<C: Confirm + ?Sized, K: KeySource + ?Sized>(
        &mut self,
        ui: &mut C,
        policies: &Policies,
        keys: &K,
        action: &EosTxAction,
    ) -> Result<(), SignError> {
        let active = self.active.as_mut().ok_or(SignError::InvalidState)?;
        let result = Self::add(active, ui, policies, keys, action);
        if result.is_err() {
            self.abort();
        }
        result
    }

    fn add<C: Confirm + ?Sized, K: KeySource + ?Sized>(
        active: &mut Active,
        ui: &mut C,
        policies: &Policies,
        keys: &K,
        action: &EosTxAction,
    ) -> Result<(), SignError> {
        if active.actions_remaining == 0 {
            return Err(SignError::InvalidState);
        }

        match &action.payload {
            EosActionPayload::Unknown {
                data_size,
                data_chunk,
            } => Self::add_unknown(active, ui, policies, &action.common, *data_size, data_chunk),
            payload => {
                if active.unknown.is_some() {
                    return Err(SignError::InvalidState);
                }
                compile_known(ui, keys, &mut active.preimage, &action.common, payload)?;
                active.actions_remaining -= 1;
                Ok(())
            }
        }
    }

    fn add_unknown<C: Confirm + ?Sized>(
        active: &mut Active,
        ui: &mut C,
        policies: &Policies,
        common: &EosActionCommon,
        data_size: u32,
        chunk: &[u8],
    ) -> Result<(), SignError> {
        if is_supported_action(common) {
            return Err(SignError::InvalidData);
        }
        if !policies.advanced_mode {
            ui.review(ButtonRequest::Other, "Warning", ADVANCED_MODE_WARNING)?;
            return Err(SignError::PolicyDisabled);
        }

        match &active.unknown {
            Some(unknown) => {
                if unknown.total != data_size || unknown.common != *common {
                    log::warn!("opaque action changed shape mid-stream");
                    return Err(SignError::InvalidData);
                }
            }
            None => {
                if common.authorization.is_empty() {
                    return Err(SignError::InvalidData);
                }
                active.preimage.action_common(common);
                active.preimage.varuint(u64::from(data_size));
                active.unknown = Some(UnknownAction {
                    common: common.clone(),
                    total: data_size,
                    remaining: data_size,
                    hasher: Sha256::new(),
                });
            }
        }
        let unknown = active.unknown.as_mut().ok_or(SignError::InvalidState)?;

        let len = u32::try_from(chunk.len()).map_err(|_| SignError::InvalidData)?;
        if len > unknown.remaining {
            return Err(SignError::InvalidData);
        }
        unknown.hasher.update(chunk);
        active.preimage.bytes(chunk);
        unknown.remaining -= len;

        if unknown.remaining > 0 {
            return Ok(());
        }

        let done = active.unknown.take().ok_or(SignError::InvalidState)?;
        let fingerprint: Hash256 = done.hasher.finalize().into();
        require(
            ui,
            ButtonRequest::ConfirmEosAction,
            &format!(
                "{}:{}",
                format_name(done.common.account),
                format_name(done.common.name)
            ),
            &format!(
                "{} bytes with fingerprint:\n{}\n{}",
                done.total,
                hex::encode(&fingerprint[..16]),
                hex::encode(&fingerprint[16..])
            ),
        )?;
        active.actions_remaining -= 1;
        Ok(())
    }

    /// Shows the budget and expiry, then signs the transaction digest.
    /// The session is consumed either way.
    pub fn sign<C: Confirm + ?Sized>(&mut self, ui: &mut C) -> Result<EosSignedTx, SignError> {
        if !self.is_finished() {
            self.abort();
            return Err(SignError::InvalidState);
        }
        let mut active = self.active.take().ok_or(SignError::InvalidState)?;

        // transaction_extensions, then the empty context_free_data digest
        active.preimage.varuint(0);
        active.preimage.bytes(&[0u8; 32]);

        let header = &active.header;
        let net = match header.max_net_usage_words {
            0 => "Unlimited NET".to_string(),
            words => format!("At most {} bytes NET", u64::from(words) * 8),
        };
        let cpu = match header.max_cpu_usage_ms {
            0 => "Unlimited CPU".to_string(),
            ms => format!("At most {} ms CPU", ms),
        };
        require(
            ui,
            ButtonRequest::ConfirmEosBudget,
            "Confirm Budget",
            &format!("You may be billed for up to:\n{}\n{}", net, cpu),
        )?;

        let delay = header.delay_sec;
        require(
            ui,
            ButtonRequest::SignTx,
            "Sign Transaction",
            &format!(
                "Do you want to sign this EOS transaction?\nExpiry: {} UTC\nDelay: {}h{:02}m{:02}s",
                format_ctime(u64::from(header.expiration)),
                delay / 3600,
                (delay / 60) % 60,
                delay % 60
            ),
        )?;

        let hash = active.preimage.finish();
        let (sig, recid) = active.node.sign_digest_canonical(&hash, is_canonic)?;

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&sig[..32]);
        s.copy_from_slice(&sig[32..]);
        log::info!("eos transaction signed");

        Ok(EosSignedTx {
            hash,
            signature: Signature {
                v: 27 + recid + 4,
                r,
                s,
            },
        })
    }
}
