//! `eosio` permission management: updateauth, deleteauth, linkauth,
//! unlinkauth and newaccount.
//!
//! An authority is shown key by key, account by account and delay by
//! delay before anything reaches the preimage. Keys the host names by
//! derivation path are derived here, so the digest always covers the
//! key the device itself would sign with.

use txsign_common::{Bip32Path, EosActionCommon, EosActionPayload, EosAuthorization, SignError};

use super::actions::confirm_action;
use super::names::{format_name, public_key_to_wif, PublicKeyKind, PERMISSION_ACTIVE, PERMISSION_OWNER};
use super::{eos_public_key, Preimage};
use crate::coins::coin_by_name;
use crate::confirm::Confirm;
use crate::crypto::KeySource;
use crate::format::format_path;

const H: u32 = Bip32Path::HARDENED;

/// SLIP-48 network index of EOS.
const SLIP48_NETWORK_EOS: u32 = 4;

/// K1 tag of `fc::crypto::public_key`.
const KEY_TYPE_K1: u32 = 0;

/// SLIP-48 role of a permission: 0 for owner, 1 for active.
pub fn slip48_role(permission: u64) -> Option<u32> {
    match permission {
        PERMISSION_OWNER => Some(0),
        PERMISSION_ACTIVE => Some(1),
        _ => None,
    }
}

/// `m/48'/4'/role'/account'/index'`, every component hardened.
pub fn is_slip48(path: &Bip32Path, role: u32) -> bool {
    let p = path.as_slice();
    p.len() == 5
        && p.iter().all(|c| c & H != 0)
        && p[0] == 48 | H
        && p[1] == SLIP48_NETWORK_EOS | H
        && p[2] == role | H
}

/// One derived key of weight 1 against a threshold of 1, and nothing
/// else that could sign.
pub fn is_device_controlled(auth: &EosAuthorization) -> bool {
    auth.threshold == 1
        && auth.keys.len() == 1
        && auth.keys[0].key.is_empty()
        && !auth.keys[0].address_n.is_empty()
        && auth.keys[0].weight == 1
        && auth.accounts.is_empty()
        && auth.waits.is_empty()
}

/// "EOS Account #n" for a BIP44 EOS path, the path itself otherwise.
fn path_label(path: &Bip32Path) -> Result<String, SignError> {
    let coin = coin_by_name("EOS").ok_or(SignError::InvalidState)?;
    let p = path.as_slice();
    if p.len() == 5 && p[0] == 44 | H && p[1] == coin.bip44_account_path && p[2] & H != 0 {
        return Ok(format!("{} Account #{}", coin.coin_name, p[2] & !H));
    }
    Ok(format_path(path))
}

struct ResolvedKey {
    public_key: [u8; 33],
    shown: String,
}

/// An authority whose keys are checked and resolved to compressed bytes.
pub struct Authority<'a> {
    auth: &'a EosAuthorization,
    keys: Vec<ResolvedKey>,
}

impl<'a> Authority<'a> {
    pub fn resolve<K: KeySource + ?Sized>(
        keys: &K,
        auth: &'a EosAuthorization,
    ) -> Result<Self, SignError> {
        let mut resolved = Vec::with_capacity(auth.keys.len());
        for key in &auth.keys {
            if key.key_type != KEY_TYPE_K1 {
                return Err(SignError::InvalidData);
            }
            let entry = match (key.key.len(), key.address_n.is_empty()) {
                (33, true) => {
                    let mut public_key = [0u8; 33];
                    public_key.copy_from_slice(&key.key);
                    ResolvedKey {
                        public_key,
                        shown: public_key_to_wif(&public_key, PublicKeyKind::Eos),
                    }
                }
                (0, false) => {
                    let node = keys.derive_node(&key.address_n)?;
                    ResolvedKey {
                        public_key: *node.public_key(),
                        shown: format!(
                            "{}\n{}",
                            path_label(&key.address_n)?,
                            eos_public_key(&node, PublicKeyKind::Eos)
                        ),
                    }
                }
                _ => return Err(SignError::InvalidData),
            };
            resolved.push(entry);
        }
        Ok(Self {
            auth,
            keys: resolved,
        })
    }

    /// Encoded size of [`Authority::write`].
    pub fn serialized_len(&self) -> u64 {
        let a = self.auth;
        let mut n = 4 + Preimage::varuint_len(a.keys.len() as u64);
        for key in &a.keys {
            n += Preimage::varuint_len(u64::from(key.key_type)) + 33 + 2;
        }
        n += Preimage::varuint_len(a.accounts.len() as u64) + 18 * a.accounts.len() as u64;
        n += Preimage::varuint_len(a.waits.len() as u64) + 6 * a.waits.len() as u64;
        n
    }

    pub fn write(&self, preimage: &mut Preimage) {
        let a = self.auth;
        preimage.bytes(&a.threshold.to_le_bytes());
        preimage.varuint(a.keys.len() as u64);
        for (key, resolved) in a.keys.iter().zip(&self.keys) {
            preimage.varuint(u64::from(key.key_type));
            preimage.bytes(&resolved.public_key);
            preimage.bytes(&key.weight.to_le_bytes());
        }
        preimage.varuint(a.accounts.len() as u64);
        for account in &a.accounts {
            preimage.u64(account.account.actor);
            preimage.u64(account.account.permission);
            preimage.bytes(&account.weight.to_le_bytes());
        }
        preimage.varuint(a.waits.len() as u64);
        for wait in &a.waits {
            preimage.bytes(&wait.wait_sec.to_le_bytes());
            preimage.bytes(&wait.weight.to_le_bytes());
        }
    }

    /// Shows the authority under `title`. A device-controlled key on the
    /// SLIP-48 path for `role` gets a single summary screen.
    pub fn confirm<C: Confirm + ?Sized>(
        &self,
        ui: &mut C,
        title: &str,
        role: Option<u32>,
    ) -> Result<(), SignError> {
        let a = self.auth;
        if is_device_controlled(a) {
            let path = &a.keys[0].address_n;
            if role.map_or(false, |r| is_slip48(path, r)) {
                return confirm_action(
                    ui,
                    title,
                    &format!(
                        "Do you want to assign signing auth for\n{} to\n{}?",
                        title,
                        path_label(path)?
                    ),
                );
            }
        }

        confirm_action(
            ui,
            title,
            &format!("Require an authorization threshold of {}?", a.threshold),
        )?;
        for (i, (key, resolved)) in a.keys.iter().zip(&self.keys).enumerate() {
            confirm_action(
                ui,
                title,
                &format!("Key #{}:\n{}\nWeight: {}", i + 1, resolved.shown, key.weight),
            )?;
        }
        for (i, account) in a.accounts.iter().enumerate() {
            confirm_action(
                ui,
                title,
                &format!(
                    "Account #{}:\nDo you want to assign {} permission to {} with weight {}?",
                    i + 1,
                    format_name(account.account.permission),
                    format_name(account.account.actor),
                    account.weight
                ),
            )?;
        }
        for (i, wait) in a.waits.iter().enumerate() {
            confirm_action(
                ui,
                title,
                &format!(
                    "Delay #{}:\nDo you want to require a delay of {}s with weight {}?",
                    i + 1,
                    wait.wait_sec,
                    wait.weight
                ),
            )?;
        }
        Ok(())
    }
}

/// Confirms one permission-management action and appends it to the
/// preimage. Other payloads are an `InvalidState`.
pub fn compile_auth<C: Confirm + ?Sized, K: KeySource + ?Sized>(
    ui: &mut C,
    keys: &K,
    preimage: &mut Preimage,
    common: &EosActionCommon,
    payload: &EosActionPayload,
) -> Result<(), SignError> {
    match payload {
        EosActionPayload::UpdateAuth {
            account,
            permission,
            parent,
            auth,
        } => {
            let authority = Authority::resolve(keys, auth)?;
            let account_name = format_name(*account);
            let permission_name = format_name(*permission);
            confirm_action(
                ui,
                &format!("Update Auth: {}", account_name),
                &format!(
                    "Update auth for {} with {} permission and {} parent?",
                    account_name,
                    permission_name,
                    format_name(*parent)
                ),
            )?;
            authority.confirm(
                ui,
                &format!("{}@{}", account_name, permission_name),
                slip48_role(*permission),
            )?;

            preimage.action_common(common);
            preimage.varuint(8 + 8 + 8 + authority.serialized_len());
            preimage.u64(*account);
            preimage.u64(*permission);
            preimage.u64(*parent);
            authority.write(preimage);
        }

        EosActionPayload::DeleteAuth {
            account,
            permission,
        } => {
            confirm_action(
                ui,
                "Delete Auth",
                &format!(
                    "Remove {} permission from {}?",
                    format_name(*permission),
                    format_name(*account)
                ),
            )?;
            preimage.action_common(common);
            preimage.varuint(8 + 8);
            preimage.u64(*account);
            preimage.u64(*permission);
        }

        EosActionPayload::LinkAuth {
            account,
            code,
            link_type,
            requirement,
        } => {
            confirm_action(
                ui,
                "Link Auth",
                &format!(
                    "Grant {} permission for the {} contract to {}@{}?",
                    format_name(*link_type),
                    format_name(*code),
                    format_name(*account),
                    format_name(*requirement)
                ),
            )?;
            preimage.action_common(common);
            preimage.varuint(8 + 8 + 8 + 8);
            preimage.u64(*account);
            preimage.u64(*code);
            preimage.u64(*link_type);
            preimage.u64(*requirement);
        }

        EosActionPayload::UnlinkAuth {
            account,
            code,
            link_type,
        } => {
            confirm_action(
                ui,
                "Unlink Auth",
                &format!(
                    "Unlink {} from auth to {} for {}?",
                    format_name(*account),
                    format_name(*code),
                    format_name(*link_type)
                ),
            )?;
            preimage.action_common(common);
            preimage.varuint(8 + 8 + 8);
            preimage.u64(*account);
            preimage.u64(*code);
            preimage.u64(*link_type);
        }

        EosActionPayload::NewAccount {
            creator,
            name,
            owner,
            active,
        } => {
            // A new account must start out controlled by this device.
            if !is_device_controlled(owner) || !is_device_controlled(active) {
                log::warn!("newaccount with foreign owner or active authority");
                return Err(SignError::InvalidData);
            }
            let owner = Authority::resolve(keys, owner)?;
            let active = Authority::resolve(keys, active)?;
            let new_name = format_name(*name);
            confirm_action(
                ui,
                "New Account",
                &format!(
                    "Using your {} account, create a new account named {}?",
                    format_name(*creator),
                    new_name
                ),
            )?;
            owner.confirm(ui, &format!("{}@owner", new_name), slip48_role(PERMISSION_OWNER))?;
            active.confirm(ui, &format!("{}@active", new_name), slip48_role(PERMISSION_ACTIVE))?;

            preimage.action_common(common);
            preimage.varuint(8 + 8 + owner.serialized_len() + active.serialized_len());
            preimage.u64(*creator);
            preimage.u64(*name);
            owner.write(preimage);
            active.write(preimage);
        }

        _ => return Err(SignError::InvalidState),
    }
    Ok(())
}
