//! ERC-721 `transferFrom` and `approve` on well-known NFT contracts.

use hex_literal::hex;
use txsign_common::{EthAddress, EthereumSignTx, Selector, SignError};

use super::{data_is_complete, ContractContext};
use crate::abi::{self, Calldata};
use crate::confirm::{require, ButtonRequest, Confirm};
use crate::crypto::format_address;

const TRANSFER_FROM: Selector = hex!("23b872dd");
const APPROVE: Selector = hex!("095ea7b3");

pub struct Erc721Token {
    pub name: &'static str,
    pub contract: EthAddress,
}

const fn nft(name: &'static str, contract: EthAddress) -> Erc721Token {
    Erc721Token { name, contract }
}

pub static ERC721_TOKENS: &[Erc721Token] = &[
    nft("CryptoKities", hex!("06012c8cf97bead5deae237070f9587f8e7a266d")),
    nft("Gods Unchained", hex!("6ebeaf8e8e946f0716e6533a6f2cefc83f60e8ab")),
    nft("LucidSight-MLB-NFT", hex!("8c9b261faef3b3c2e64ab5e58e04615f8c788099")),
    nft("MARBLE-NFT", hex!("1d963688fe2209a98db35c67a041524822cf04ff")),
    nft("MyCryptoHeroes:Land", hex!("617913dd43dbdf4236b85ec7bdf9adfd7e35b340")),
    nft("Spheroid SPACE", hex!("7b00ae36c7485b678fe945c2dd9349eb5baf7b6b")),
    nft("CryptoFlowers", hex!("8bc67d00253fd60b1afcce88b78820413139f4c6")),
    nft("MyCryptoHeroes:Hero", hex!("273f7f8e6489682df756151f5525576e322d51a3")),
    nft("MyCryptoHeroes:Extension", hex!("dceaf1652a131f32a821468dc03a92df0edd86ea")),
    nft("EtheremonMonster", hex!("5d00d312e171be5342067c09bae883f9bcb2003b")),
    nft("Flowerpatch", hex!("4f41d10f7e67fd16bde916b4a6dc3dd101c57394")),
    nft("Evolution Land Objects", hex!("14a4123da9ad21b2215dc0ab6984ec1e89842c6d")),
    nft("Guarda Token", hex!("9effec6d600ea9ac54757882da1accd79e292e50")),
    nft("Decentraland LAND", hex!("f87e31492faf9a91b02ee0deaad50d51d56d5d4d")),
    nft("EtheremonAdventure", hex!("bfde6246df72d3ca86419628cac46a9d2b60393c")),
];

pub fn erc721_by_contract(contract: &EthAddress) -> Option<&'static Erc721Token> {
    ERC721_TOKENS.iter().find(|t| &t.contract == contract)
}

fn known_token(msg: &EthereumSignTx) -> Option<&'static Erc721Token> {
    abi::to_address(msg).and_then(erc721_by_contract)
}

/// `transferFrom(from, me, id)`; only transfers into this wallet are
/// handled.
pub fn is_transfer_from(msg: &EthereumSignTx, ctx: &ContractContext<'_>) -> bool {
    let cd = Calldata::of(msg);
    if !data_is_complete(msg) || !cd.has_params(3) || !cd.selector_is(&TRANSFER_FROM) {
        return false;
    }
    let from_ok = cd.raw_param(0).and_then(abi::word_to_address).is_some();
    let to = cd.raw_param(1).and_then(abi::word_to_address);
    from_ok && to == Some(&ctx.my_address)
}

pub fn is_approve(msg: &EthereumSignTx) -> bool {
    let cd = Calldata::of(msg);
    data_is_complete(msg)
        && cd.has_params(2)
        && cd.selector_is(&APPROVE)
        && cd.raw_param(0).and_then(abi::word_to_address).is_some()
}

pub fn is_erc721(msg: &EthereumSignTx, ctx: &ContractContext<'_>) -> bool {
    known_token(msg).is_some() && (is_transfer_from(msg, ctx) || is_approve(msg))
}

pub fn confirm_erc721<C: Confirm + ?Sized>(
    ui: &mut C,
    msg: &EthereumSignTx,
    ctx: &ContractContext<'_>,
) -> Result<(), SignError> {
    let token = known_token(msg).ok_or(SignError::InvalidData)?;
    let cd = Calldata::of(msg);

    if is_transfer_from(msg, ctx) {
        let id = cd.raw_param(2).ok_or(SignError::InvalidData)?;
        return require(
            ui,
            ButtonRequest::ConfirmOutput,
            "Transfer",
            &format!(
                "Take ownership of {} token with id {}?",
                token.name,
                super::hex_lower(id)
            ),
        );
    }

    let spender = cd
        .raw_param(0)
        .and_then(abi::word_to_address)
        .ok_or(SignError::InvalidData)?;
    let id = cd.raw_param(1).ok_or(SignError::InvalidData)?;
    require(
        ui,
        ButtonRequest::ConfirmOutput,
        "Approve",
        &format!(
            "Grant {} permission to take {} token with id {}?",
            format_address(spender, msg.chain_id),
            token.name,
            super::hex_lower(id)
        ),
    )
}
