//! Sablier salary proxy `withdrawFromSalary(uint256,uint256)`.

use hex_literal::hex;
use txsign_common::{EthAddress, EthereumSignTx, Selector, SignError};

use crate::abi::{self, Calldata};
use crate::confirm::{require, ButtonRequest, Confirm};

pub const SABLIER_PROXY: EthAddress = hex!("bd6a40bb904aea5a49c59050b5395f7484a4203d");

const WITHDRAW_FROM_SALARY: Selector = hex!("fea7c53f");

pub fn is_withdraw_from_salary(msg: &EthereumSignTx) -> bool {
    abi::to_address(msg) == Some(&SABLIER_PROXY)
        && Calldata::of(msg).selector_is(&WITHDRAW_FROM_SALARY)
}

/// Both numbers are shown raw; the stream's token is not in the calldata.
pub fn confirm_withdraw_from_salary<C: Confirm + ?Sized>(
    ui: &mut C,
    msg: &EthereumSignTx,
) -> Result<(), SignError> {
    let cd = Calldata::of(msg);
    let salary_id = cd.raw_param(0).ok_or(SignError::InvalidData)?;
    let amount = cd.raw_param(1).ok_or(SignError::InvalidData)?;

    let kind = ButtonRequest::ConfirmOutput;
    require(
        ui,
        kind,
        "Sablier",
        &format!("Salary ID {}", abi::word_to_u256(salary_id).to_decimal()),
    )?;
    require(
        ui,
        kind,
        "Sablier",
        &format!(
            "Withdraw Amount {} Token Units",
            abi::word_to_u256(amount).to_decimal()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::MockUi;
    use crate::contracts::testutil::*;

    #[test]
    fn test_salary_withdraw() {
        let msg = tx(
            SABLIER_PROXY,
            0,
            calldata(WITHDRAW_FROM_SALARY, &[word(1234), word(5_000_000)]),
        );
        assert!(is_withdraw_from_salary(&msg));
        let mut ui = MockUi::new();
        confirm_withdraw_from_salary(&mut ui, &msg).unwrap();
        assert_eq!(
            ui.bodies(),
            vec!["Salary ID 1234", "Withdraw Amount 5000000 Token Units"]
        );
    }

    #[test]
    fn test_missing_amount() {
        let msg = tx(SABLIER_PROXY, 0, calldata(WITHDRAW_FROM_SALARY, &[word(1)]));
        let mut ui = MockUi::new();
        assert_eq!(
            confirm_withdraw_from_salary(&mut ui, &msg),
            Err(SignError::InvalidData)
        );
        assert!(ui.prompts.is_empty());
    }
}
