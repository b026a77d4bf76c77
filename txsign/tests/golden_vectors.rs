//! Golden vector tests for the signing core.
//!
//! These tests verify correctness against known test vectors from:
//! - The EIP-712 reference example (`Mail`)
//! - Cosmos SDK bech32 addresses
//! - EOSIO name and asset encodings
//!
//! Run with: cargo test --test golden_vectors

use hex_literal::hex;

use txsign::confirm::MockUi;
use txsign::crypto::HdNode;

const PRIVATE_KEY: [u8; 32] =
    hex!("04dec0cc013cd8ab7087ca14960b768c3d83452448aa0064dae6fb04b5d93476");

fn node() -> HdNode {
    HdNode::from_private_key(&PRIVATE_KEY).unwrap()
}

fn init_logging() {
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, Default::default());
}

// =============================================================================
// EIP-712
// =============================================================================

mod eip712 {
    use super::*;
    use txsign::eip712::{
        hash_typed_data, sign_typed_data, verify_typed_data, Eip712Error, TypedData,
    };
    use txsign::SignError;

    const MAIL: &str = r#"{
        "types": {
            "EIP712Domain": [
                {"name": "name", "type": "string"},
                {"name": "version", "type": "string"},
                {"name": "chainId", "type": "uint256"},
                {"name": "verifyingContract", "type": "address"}
            ],
            "Person": [
                {"name": "name", "type": "string"},
                {"name": "wallet", "type": "address"}
            ],
            "Mail": [
                {"name": "from", "type": "Person"},
                {"name": "to", "type": "Person"},
                {"name": "contents", "type": "string"}
            ]
        },
        "primaryType": "Mail",
        "domain": {
            "name": "Ether Mail",
            "version": "1",
            "chainId": 1,
            "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
        },
        "message": {
            "from": {"name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"},
            "to": {"name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"},
            "contents": "Hello, Bob!"
        }
    }"#;

    #[test]
    fn test_mail_reference_hashes() {
        let data = TypedData::parse(MAIL).unwrap();
        let hash = hash_typed_data(&data).unwrap();
        assert_eq!(
            hash.domain_separator,
            hex!("f2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f")
        );
        assert_eq!(
            hash.message_hash,
            Some(hex!("c52c0ee5d84264471806290a3f2c4cecfc5490626bf912d01f240d7a274b371e"))
        );
        assert_eq!(
            hash.digest(),
            hex!("be609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2")
        );
    }

    #[test]
    fn test_sign_then_verify() {
        init_logging();
        let signer = node();
        let mut ui = MockUi::new();
        let (hash, signature) = sign_typed_data(&mut ui, &signer, MAIL).unwrap();

        assert_eq!(
            hash.digest(),
            hex!("be609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2")
        );
        assert!(signature.v == 27 || signature.v == 28);
        assert!(verify_typed_data(MAIL, &signature, &signer.ethereum_address()).unwrap());
        assert!(!verify_typed_data(MAIL, &signature, &[0x11; 20]).unwrap());

        // domain, then the five message values
        assert_eq!(ui.prompts.len(), 6);
        assert_eq!(ui.prompts.last().unwrap().body, "Hello, Bob!");
    }

    #[test]
    fn test_mutually_recursive_types_are_cut_off() {
        let mut message = String::from("{}");
        for _ in 0..20 {
            message = format!("{{\"next\":{}}}", message);
        }
        let json = format!(
            r#"{{
                "types": {{
                    "EIP712Domain": [{{"name": "name", "type": "string"}}],
                    "A": [{{"name": "next", "type": "B"}}],
                    "B": [{{"name": "next", "type": "A"}}]
                }},
                "primaryType": "A",
                "domain": {{"name": "Loop"}},
                "message": {}
            }}"#,
            message
        );

        let data = TypedData::parse(&json).unwrap();
        assert_eq!(hash_typed_data(&data).err(), Some(Eip712Error::RecursionError));

        let mut ui = MockUi::new();
        assert_eq!(
            sign_typed_data(&mut ui, &node(), &json).err(),
            Some(SignError::RecursionLimit)
        );
        assert!(ui.prompts.is_empty());
    }
}

// =============================================================================
// Tendermint addresses
// =============================================================================

mod tendermint {
    use txsign::tendermint::{tendermint_address, COSMOS, KUJIRA, OSMOSIS, THORCHAIN};

    const PUBKEY: [u8; 33] =
        hex_literal::hex!("03b7329f678e0ac1214b7723575466219c77fedbdd955c33291a74f18bf5c8a4e2");

    #[test]
    fn test_bech32_addresses() {
        let cases = [
            (COSMOS.prefix(false), "cosmos1am058pdux3hyulcmfgj4m3hhrlfn8nzm88u80q"),
            (THORCHAIN.prefix(false), "thor1am058pdux3hyulcmfgj4m3hhrlfn8nzmpq9u6l"),
            (THORCHAIN.prefix(true), "tthor1am058pdux3hyulcmfgj4m3hhrlfn8nzm9h5vr6"),
            (KUJIRA.prefix(false), "kujira1am058pdux3hyulcmfgj4m3hhrlfn8nzmk07lz2"),
            (OSMOSIS.prefix(false), "osmo1am058pdux3hyulcmfgj4m3hhrlfn8nzm0u0hej"),
        ];
        for (prefix, expected) in cases {
            assert_eq!(tendermint_address(&PUBKEY, prefix).unwrap(), expected);
        }
    }
}

// =============================================================================
// EOS encodings
// =============================================================================

mod eos {
    use super::*;
    use txsign::eos::names::{format_asset, format_name, parse_name, ACCOUNT_EOSIO, ACTION_REFUND};
    use txsign::crypto::Seed;
    use txsign::eos::EosSession;
    use txsign_common::{
        Bip32Path, EosActionCommon, EosActionPayload, EosAsset, EosPermissionLevel, EosSignTx,
        EosTxAction, EosTxHeader, Policies,
    };

    #[test]
    fn test_name_encoding() {
        let cases = [
            ("eosio", 0x5530ea0000000000u64),
            ("eosio.token", 0x5530ea033482a600),
            ("transfer", 0xcdcd3c2d57000000),
            ("active", 0x3232eda800000000),
            ("alice", 0x345c850000000000),
        ];
        for (name, value) in cases {
            assert_eq!(parse_name(name), Some(value));
            assert_eq!(format_name(value), name);
        }
    }

    #[test]
    fn test_asset_encoding() {
        // precision 4, "EOS"
        let asset = EosAsset {
            amount: 12345,
            symbol: 0x534f4504,
        };
        assert_eq!(format_asset(&asset).unwrap(), "1.2345 EOS");
    }

    #[test]
    fn test_refund_session() {
        init_logging();
        let alice = parse_name("alice").unwrap();
        let msg = EosSignTx {
            address_n: Bip32Path::bip44(194, 0, 0),
            chain_id: [0x42; 32],
            header: EosTxHeader {
                expiration: 1_600_000_000,
                ref_block_num: 1,
                ref_block_prefix: 2,
                max_net_usage_words: 0,
                max_cpu_usage_ms: 0,
                delay_sec: 0,
            },
            num_actions: 1,
        };
        let refund = EosTxAction {
            common: EosActionCommon {
                account: ACCOUNT_EOSIO,
                name: ACTION_REFUND,
                authorization: vec![EosPermissionLevel {
                    actor: alice,
                    permission: parse_name("active").unwrap(),
                }],
            },
            payload: EosActionPayload::Refund { owner: alice },
        };

        let mut session = EosSession::new();
        let mut ui = MockUi::new();
        session.init(&Policies::default(), node(), &msg).unwrap();
        let keys = Seed::from_bytes(&[7u8; 64]);
        session.add_action(&mut ui, &Policies::default(), &keys, &refund).unwrap();
        let signed = session.sign(&mut ui).unwrap();

        assert!((31..=34).contains(&signed.signature.v));
        assert_eq!(
            ui.bodies()[0],
            "Do you want to reclaim all pending unstaked tokens from your alice account?"
        );
        assert_eq!(
            ui.bodies()[2],
            "Do you want to sign this EOS transaction?\nExpiry: Sun Sep 13 12:26:40 2020 UTC\nDelay: 0h00m00s"
        );
    }
}

// =============================================================================
// Contract calls
// =============================================================================

mod contracts {
    use super::*;
    use txsign::contracts::{classify, handle, ContractCall, ContractContext};
    use txsign::registry::Registry;
    use txsign_common::EthereumSignTx;

    const CETH: [u8; 20] = hex!("4ddc2d193948926d02f9b1fe9e1daa0718270ed5");

    fn mint_ceth() -> EthereumSignTx {
        // 0.5 ETH
        EthereumSignTx {
            to: CETH.to_vec(),
            value: hex!("06f05b59d3b20000").to_vec(),
            data_initial_chunk: hex!("1249c58b").to_vec(),
            data_length: 4,
            chain_id: 1,
            has_chain_id: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_compound_mint_ceth() {
        let registry = Registry::new();
        let ctx = ContractContext {
            my_address: node().ethereum_address(),
            registry: &registry,
        };
        let mut ui = MockUi::new();
        let call = handle(&mut ui, &mint_ceth(), &ctx).unwrap();
        assert_eq!(call, Some(ContractCall::Compound));
        assert_eq!(ui.bodies(), vec!["Mint cETH from 0.5 ETH?"]);
    }

    #[test]
    fn test_classify_once_matches_handle() {
        let registry = Registry::new();
        let ctx = ContractContext {
            my_address: [0u8; 20],
            registry: &registry,
        };
        let msg = mint_ceth();
        let tag = classify(&msg, &ctx).unwrap();

        let mut direct = MockUi::new();
        tag.confirm(&mut direct, &msg, &ctx).unwrap();
        let mut handled = MockUi::new();
        handle(&mut handled, &msg, &ctx).unwrap();
        assert_eq!(direct.prompts, handled.prompts);

        let mut plain = msg;
        plain.data_initial_chunk = hex!("deadbeef").to_vec();
        assert_eq!(classify(&plain, &ctx), None);
    }
}
