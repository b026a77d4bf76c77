//! MakerDAO single-collateral DAI proxy actions (SaiProxy).
//!
//! The calls go either straight to a SaiProxyCreateAndExecute contract or
//! through a DSProxy `execute(address,bytes)` whose target is one. Every
//! contract address the call names (the proxy target, the TUB, the proxy
//! registry, an OTC provider) is trusted silently when it is on the
//! per-chain allowlist and otherwise shown to the user for confirmation.

use hex_literal::hex;
use txsign_common::{EthAddress, EthereumSignTx, Selector, SignError};

use super::{data_is_complete, ContractContext};
use crate::abi::{self, Calldata};
use crate::bignum::U256;
use crate::confirm::{require, ButtonRequest, Confirm};
use crate::crypto::format_address;
use crate::format::format_amount;

const TITLE: &str = "MakerDAO";

const TUBS: &[(u32, EthAddress)] = &[
    (1, hex!("448a5065aebb8e423f0896e6c5d525c040f59af3")),
    (42, hex!("a71937147b55deb8a530c7229c442fd3f31b7db2")),
];

const OASIS_DEX: &[(u32, EthAddress)] = &[
    (1, hex!("39755357759ce0d7f32dc8dc45414cca409ae24e")),
    (42, hex!("4a6bc4e803c62081ffebcc8d227b5a87a58f1f8f")),
];

const PROXY_REGISTRIES: &[(u32, EthAddress)] = &[
    (1, hex!("4678f0a6958e4d2bc4f1baf7bc52e8f3564f3fe4")),
    (42, hex!("64a436ae831c1672ae81f674cab8b6775df3475c")),
];

const SAI_PROXIES: &[(u32, EthAddress)] = &[
    (1, hex!("526af336d614ade5cc252a407062b8861af998f5")),
    (1, hex!("190c2cfc69e68a8e8d5e2b9e2b9cc3332caff77b")),
    (42, hex!("96fc005a8ba82b84b11e0ff211a2a1362f107ef0")),
];

fn allowed(list: &[(u32, EthAddress)], chain_id: u32, address: &EthAddress) -> bool {
    list.iter().any(|(c, a)| *c == chain_id && a == address)
}

pub fn is_oasis_dex(address: &EthAddress, chain_id: u32) -> bool {
    allowed(OASIS_DEX, chain_id, address)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Open,
    Shut,
    ShutVia,
    Give,
    LockAndDraw2,
    CreateOpenLockAndDraw,
    Lock,
    Draw,
    LockAndDraw3,
    Free,
    Wipe,
    WipeVia,
    WipeAndFree,
    WipeAndFreeVia,
}

struct Shape {
    method: Method,
    selector: Selector,
    arity: usize,
    /// Param 1 is a cup id.
    cup: bool,
    /// The call must not carry ETH.
    no_value: bool,
}

const fn shape(method: Method, selector: Selector, arity: usize, cup: bool, no_value: bool) -> Shape {
    Shape {
        method,
        selector,
        arity,
        cup,
        no_value,
    }
}

/// Tried in order; the first match wins. A proxied call only needs at
/// least `arity` words, so the wider overloads come first.
const METHODS: &[Shape] = &[
    // open(address)
    shape(Method::Open, hex!("c74073a1"), 1, false, false),
    // shut(address,bytes32,address)
    shape(Method::ShutVia, hex!("792037e3"), 3, true, true),
    // shut(address,bytes32)
    shape(Method::Shut, hex!("bc244c11"), 2, true, true),
    // give(address,bytes32,address)
    shape(Method::Give, hex!("da93dfcf"), 3, true, true),
    // lockAndDraw(address,uint256)
    shape(Method::LockAndDraw2, hex!("516e9aec"), 2, false, false),
    // createOpenLockAndDraw(address,address,uint256)
    shape(Method::CreateOpenLockAndDraw, hex!("d3140a65"), 3, false, false),
    // lock(address,bytes32)
    shape(Method::Lock, hex!("bc25a810"), 2, true, false),
    // draw(address,bytes32,uint256)
    shape(Method::Draw, hex!("0344a36f"), 3, true, true),
    // lockAndDraw(address,bytes32,uint256)
    shape(Method::LockAndDraw3, hex!("1edf0c1e"), 3, true, false),
    // free(address,bytes32,uint256)
    shape(Method::Free, hex!("f9ef04be"), 3, true, true),
    // wipe(address,bytes32,uint256,address)
    shape(Method::WipeVia, hex!("8a9fc475"), 4, true, true),
    // wipe(address,bytes32,uint256)
    shape(Method::Wipe, hex!("a3dc65a7"), 3, true, true),
    // wipeAndFree(address,bytes32,uint256,uint256,address)
    shape(Method::WipeAndFreeVia, hex!("1b968160"), 5, true, true),
    // wipeAndFree(address,bytes32,uint256,uint256)
    shape(Method::WipeAndFree, hex!("faed77ab"), 4, true, true),
];

fn cup_id(word: &[u8; 32]) -> Option<u32> {
    abi::word_to_u32(word)
}

fn eth_value(msg: &EthereumSignTx) -> Option<U256> {
    abi::value_to_u256(&msg.value)
}

fn method(msg: &EthereumSignTx) -> Option<Method> {
    let cd = Calldata::of(msg);
    let value_is_zero = eth_value(msg).map_or(false, |v| v.is_zero());
    METHODS
        .iter()
        .find(|s| {
            cd.is_method(&s.selector, s.arity)
                && (!s.cup || cd.param(1).and_then(cup_id).is_some())
                && (!s.no_value || value_is_zero)
        })
        .map(|s| s.method)
}

pub fn is_makerdao(msg: &EthereumSignTx) -> bool {
    msg.has_chain_id && data_is_complete(msg) && method(msg).is_some()
}

/// Shows `label` with the address unless it is allowlisted.
fn confirm_listed<C: Confirm + ?Sized>(
    ui: &mut C,
    list: &[(u32, EthAddress)],
    label: &str,
    address: &EthAddress,
    chain_id: u32,
) -> Result<(), SignError> {
    if allowed(list, chain_id, address) {
        return Ok(());
    }
    require(
        ui,
        ButtonRequest::ConfirmOutput,
        TITLE,
        &format!("Confirm {}:\n{}", label, format_address(address, chain_id)),
    )
}

/// Non-zero padding is malformed.
fn padded_address(word: &[u8; 32]) -> Result<&EthAddress, SignError> {
    abi::word_to_address(word).ok_or(SignError::InvalidData)
}

/// Suffix naming the OTC provider; an unlisted one is confirmed first.
fn confirm_otc<C: Confirm + ?Sized>(
    ui: &mut C,
    word: &[u8; 32],
    chain_id: u32,
) -> Result<&'static str, SignError> {
    let address = padded_address(word)?;
    if is_oasis_dex(address, chain_id) {
        return Ok(" via OasisDEX");
    }
    confirm_listed(ui, &[], "OTC", address, chain_id)?;
    Ok("")
}

pub fn confirm_makerdao<C: Confirm + ?Sized>(
    ui: &mut C,
    msg: &EthereumSignTx,
    ctx: &ContractContext<'_>,
) -> Result<(), SignError> {
    let method = method(msg).ok_or(SignError::InvalidData)?;
    let cd = Calldata::of(msg);
    let chain_id = msg.chain_id;
    let param = |i| cd.param(i).ok_or(SignError::InvalidData);

    // Resolve everything before the first prompt.
    let proxy_target = if cd.is_proxy_call() {
        let word = cd.raw_param(0).ok_or(SignError::InvalidData)?;
        *padded_address(word)?
    } else {
        *abi::to_address(msg).ok_or(SignError::InvalidData)?
    };
    let first = *padded_address(param(0)?)?;
    let cup = || param(1).and_then(|w| cup_id(w).ok_or(SignError::InvalidData));
    let deposit = format_amount(
        &eth_value(msg).ok_or(SignError::InvalidData)?,
        None,
        chain_id,
    );
    let dai = |w: &[u8; 32]| -> Result<String, SignError> {
        let token = ctx.registry.by_ticker(chain_id, "DAI")?;
        Ok(format_amount(&abi::word_to_u256(w), Some(token), chain_id))
    };
    let ether = |w: &[u8; 32]| format_amount(&abi::word_to_u256(w), None, chain_id);

    confirm_listed(ui, SAI_PROXIES, "SaiProxyCreateAndExecute", &proxy_target, chain_id)?;

    if method == Method::CreateOpenLockAndDraw {
        confirm_listed(ui, PROXY_REGISTRIES, "Proxy Registry", &first, chain_id)?;
        let tub = padded_address(param(1)?)?;
        confirm_listed(ui, TUBS, "TUB", tub, chain_id)?;
        let body = format!(
            "Create proxy, create CDP, deposit {}, and generate {} from it?",
            deposit,
            dai(param(2)?)?
        );
        return require(ui, ButtonRequest::ConfirmOutput, TITLE, &body);
    }

    confirm_listed(ui, TUBS, "TUB", &first, chain_id)?;

    let body = match method {
        Method::Open => "Open CDP?".to_string(),
        Method::Shut => format!("Close CDP {}?", cup()?),
        Method::ShutVia => {
            let id = cup()?;
            let otc = confirm_otc(ui, param(2)?, chain_id)?;
            format!("Close CDP {}{}?", id, otc)
        }
        Method::Give => {
            let new_owner = padded_address(param(2)?)?;
            format!("Move CDP {} to {}?", cup()?, format_address(new_owner, chain_id))
        }
        Method::LockAndDraw2 => format!(
            "Create CDP, deposit {}, and generate {} from it?",
            deposit,
            dai(param(1)?)?
        ),
        Method::Lock => format!("Deposit {} into CDP {}?", deposit, cup()?),
        Method::Draw => format!("Generate {} from CDP {}?", dai(param(2)?)?, cup()?),
        Method::LockAndDraw3 => format!(
            "Deposit {} into CDP {} and generate {}?",
            deposit,
            cup()?,
            dai(param(2)?)?
        ),
        Method::Free => format!("Withdraw {} from CDP {}?", ether(param(2)?), cup()?),
        Method::Wipe => format!("Payback {} into CDP {}?", dai(param(2)?)?, cup()?),
        Method::WipeVia => {
            let (amount, id) = (dai(param(2)?)?, cup()?);
            let otc = confirm_otc(ui, param(3)?, chain_id)?;
            format!("Payback {} into CDP {}{}?", amount, id, otc)
        }
        Method::WipeAndFree | Method::WipeAndFreeVia => {
            let (payback, withdraw, id) = (dai(param(2)?)?, ether(param(3)?), cup()?);
            let otc = if method == Method::WipeAndFreeVia {
                confirm_otc(ui, param(4)?, chain_id)?
            } else {
                ""
            };
            format!(
                "Payback {} and withdraw {} from CDP {}{}?",
                payback, withdraw, id, otc
            )
        }
        Method::CreateOpenLockAndDraw => return Err(SignError::InvalidState),
    };

    require(ui, ButtonRequest::ConfirmOutput, TITLE, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::MockUi;
    use crate::contracts::testutil::*;
    use crate::registry::Registry;

    const SAI_PROXY: EthAddress = hex!("526af336d614ade5cc252a407062b8861af998f5");
    const TUB: EthAddress = hex!("448a5065aebb8e423f0896e6c5d525c040f59af3");
    const OASIS: EthAddress = hex!("39755357759ce0d7f32dc8dc45414cca409ae24e");
    const REGISTRY: EthAddress = hex!("4678f0a6958e4d2bc4f1baf7bc52e8f3564f3fe4");
    const ETH: u64 = 1_000_000_000_000_000_000;

    fn run(msg: &EthereumSignTx) -> Result<Vec<String>, SignError> {
        let reg = Registry::new();
        let ctx = ContractContext {
            my_address: [0; 20],
            registry: &reg,
        };
        let mut ui = MockUi::new();
        confirm_makerdao(&mut ui, msg, &ctx)?;
        assert!(ui.prompts.iter().all(|p| p.title == "MakerDAO"));
        Ok(ui.prompts.into_iter().map(|p| p.body).collect())
    }

    /// DSProxy `execute(target, data)` wrapping `inner`.
    fn via_dsproxy(target: &EthAddress, inner: &[u8]) -> Vec<u8> {
        let mut data = calldata(
            hex!("1cff79cd"),
            &[addr_word(target), word(64), word(inner.len() as u64)],
        );
        data.extend_from_slice(inner);
        data.extend(core::iter::repeat(0u8).take((32 - inner.len() % 32) % 32));
        data
    }

    #[test]
    fn test_open_on_allowlisted_contracts() {
        let msg = tx(SAI_PROXY, 0, calldata(hex!("c74073a1"), &[addr_word(&TUB)]));
        assert!(is_makerdao(&msg));
        assert_eq!(run(&msg).unwrap(), vec!["Open CDP?"]);
    }

    #[test]
    fn test_unlisted_addresses_are_confirmed() {
        let other_tub = [0x44; 20];
        let msg = tx([0x52; 20], 0, calldata(hex!("c74073a1"), &[addr_word(&other_tub)]));
        let bodies = run(&msg).unwrap();
        assert_eq!(bodies.len(), 3);
        assert!(bodies[0].starts_with("Confirm SaiProxyCreateAndExecute:\n0x5252"));
        assert!(bodies[1].starts_with("Confirm TUB:\n0x4444"));
        assert_eq!(bodies[2], "Open CDP?");
    }

    #[test]
    fn test_proxied_lock_and_draw() {
        let inner = calldata(hex!("1edf0c1e"), &[addr_word(&TUB), word(42), word(15 * ETH)]);
        let msg = tx([0x99; 20], 2 * ETH, via_dsproxy(&SAI_PROXY, &inner));
        assert!(is_makerdao(&msg));
        assert_eq!(
            run(&msg).unwrap(),
            vec!["Deposit 2 ETH into CDP 42 and generate 15 DAI?"]
        );
    }

    #[test]
    fn test_proxied_shut_ignores_bytes_past_payload() {
        let inner = calldata(hex!("bc244c11"), &[addr_word(&TUB), word(7)]);
        let mut data = via_dsproxy(&SAI_PROXY, &inner);
        data.extend_from_slice(&addr_word(&OASIS));
        let msg = tx([0x99; 20], 0, data);
        assert_eq!(method(&msg), Some(Method::Shut));
        assert_eq!(run(&msg).unwrap(), vec!["Close CDP 7?"]);
    }

    #[test]
    fn test_create_open_lock_and_draw() {
        let data = calldata(
            hex!("d3140a65"),
            &[addr_word(&REGISTRY), addr_word(&TUB), word(ETH / 2)],
        );
        let msg = tx(SAI_PROXY, 3 * ETH, data);
        assert_eq!(
            run(&msg).unwrap(),
            vec!["Create proxy, create CDP, deposit 3 ETH, and generate 0.5 DAI from it?"]
        );
    }

    #[test]
    fn test_shut_via_oasis() {
        let data = calldata(hex!("792037e3"), &[addr_word(&TUB), word(7), addr_word(&OASIS)]);
        assert_eq!(
            run(&tx(SAI_PROXY, 0, data)).unwrap(),
            vec!["Close CDP 7 via OasisDEX?"]
        );

        let data = calldata(hex!("792037e3"), &[addr_word(&TUB), word(7), addr_word(&[0x33; 20])]);
        let bodies = run(&tx(SAI_PROXY, 0, data)).unwrap();
        assert!(bodies[0].starts_with("Confirm OTC:\n0x3333"));
        assert_eq!(bodies[1], "Close CDP 7?");
    }

    #[test]
    fn test_wipe_and_free_shows_both_amounts() {
        let data = calldata(
            hex!("1b968160"),
            &[addr_word(&TUB), word(3), word(10 * ETH), word(ETH), addr_word(&OASIS)],
        );
        assert_eq!(
            run(&tx(SAI_PROXY, 0, data)).unwrap(),
            vec!["Payback 10 DAI and withdraw 1 ETH from CDP 3 via OasisDEX?"]
        );
    }

    #[test]
    fn test_wipe_via_reads_provider_from_last_param() {
        let data = calldata(
            hex!("8a9fc475"),
            &[addr_word(&TUB), word(3), word(5 * ETH), addr_word(&OASIS)],
        );
        assert_eq!(
            run(&tx(SAI_PROXY, 0, data)).unwrap(),
            vec!["Payback 5 DAI into CDP 3 via OasisDEX?"]
        );
    }

    #[test]
    fn test_give_and_free() {
        let owner = hex!("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        let data = calldata(hex!("da93dfcf"), &[addr_word(&TUB), word(9), addr_word(&owner)]);
        assert_eq!(
            run(&tx(SAI_PROXY, 0, data)).unwrap(),
            vec!["Move CDP 9 to 0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed?"]
        );

        let data = calldata(hex!("f9ef04be"), &[addr_word(&TUB), word(9), word(ETH)]);
        assert_eq!(
            run(&tx(SAI_PROXY, 0, data)).unwrap(),
            vec!["Withdraw 1 ETH from CDP 9?"]
        );
    }

    #[test]
    fn test_value_and_cup_guards() {
        // draw must not carry ETH
        let data = calldata(hex!("0344a36f"), &[addr_word(&TUB), word(1), word(ETH)]);
        assert!(!is_makerdao(&tx(SAI_PROXY, 1, data.clone())));
        assert!(is_makerdao(&tx(SAI_PROXY, 0, data)));

        // cup id wider than 32 bits
        let mut big = [0u8; 32];
        big[27] = 1;
        let data = calldata(hex!("bc25a810"), &[addr_word(&TUB), big]);
        assert!(!is_makerdao(&tx(SAI_PROXY, ETH, data)));
    }

    #[test]
    fn test_unrecognized_or_incomplete() {
        let msg = tx(SAI_PROXY, 0, calldata(hex!("deadbeef"), &[word(1)]));
        assert!(!is_makerdao(&msg));

        let mut msg = tx(SAI_PROXY, 0, calldata(hex!("c74073a1"), &[addr_word(&TUB)]));
        msg.data_length += 1;
        assert!(!is_makerdao(&msg));

        let mut msg = tx(SAI_PROXY, 0, calldata(hex!("c74073a1"), &[addr_word(&TUB)]));
        msg.has_chain_id = false;
        assert!(!is_makerdao(&msg));
    }

    #[test]
    fn test_padded_tub_is_malformed() {
        let mut tub = addr_word(&TUB);
        tub[0] = 1;
        let msg = tx(SAI_PROXY, 0, calldata(hex!("c74073a1"), &[tub]));
        assert_eq!(run(&msg), Err(SignError::InvalidData));
    }

    #[test]
    fn test_cancel_on_address_confirm() {
        let reg = Registry::new();
        let ctx = ContractContext {
            my_address: [0; 20],
            registry: &reg,
        };
        let msg = tx([0x52; 20], 0, calldata(hex!("c74073a1"), &[addr_word(&TUB)]));
        let mut ui = MockUi::scripted(&[false]);
        assert_eq!(
            confirm_makerdao(&mut ui, &msg, &ctx),
            Err(SignError::RejectedByUser)
        );
        assert_eq!(ui.prompts.len(), 1);
    }
}
