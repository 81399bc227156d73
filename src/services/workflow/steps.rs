// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! The on-chain legs of the workflow: approve, swap, approve, stake.
//!
//! Every leg is submit-then-await with no resubmission. A failed leg carries
//! its sub-cause as a [`TxFailure`] inside the leg's own error variant, so the
//! caller can tell rejection, revert, and confirmation timeout apart without
//! string matching.

use alloy::primitives::{
    Address, B256, U256,
    aliases::{U24, U160},
};
use alloy::sol_types::SolCall;

use crate::common::error::{AppError, TxFailure};
use crate::domain::gateway::{ChainGateway, ReceiptOutcome};
use crate::infrastructure::data::contracts::{ERC20, StakingPool, UniV3Router};

/// One fully-specified exact-input swap, built once after pool resolution.
///
/// There is deliberately no minimum-output or price-limit field: this tool
/// accepts whatever the pool quotes at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapIntent {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
    pub deadline: u64,
    pub amount_in: U256,
}

pub async fn approve<G>(
    gateway: &G,
    token: Address,
    spender: Address,
    amount: U256,
    gas_limit: u64,
) -> Result<B256, AppError>
where
    G: ChainGateway + ?Sized,
{
    run_step(
        gateway,
        token,
        approve_calldata(spender, amount),
        gas_limit,
        AppError::ApprovalFailed,
    )
    .await
}

pub async fn swap<G>(
    gateway: &G,
    router: Address,
    intent: &SwapIntent,
    gas_limit: u64,
) -> Result<B256, AppError>
where
    G: ChainGateway + ?Sized,
{
    run_step(
        gateway,
        router,
        swap_calldata(intent),
        gas_limit,
        AppError::SwapFailed,
    )
    .await
}

pub async fn stake<G>(
    gateway: &G,
    staking: Address,
    pool_id: u64,
    amount: U256,
    gas_limit: u64,
) -> Result<B256, AppError>
where
    G: ChainGateway + ?Sized,
{
    run_step(
        gateway,
        staking,
        stake_calldata(pool_id, amount),
        gas_limit,
        AppError::StakeFailed,
    )
    .await
}

fn approve_calldata(spender: Address, amount: U256) -> Vec<u8> {
    ERC20::approveCall { spender, amount }.abi_encode()
}

fn swap_calldata(intent: &SwapIntent) -> Vec<u8> {
    let params = UniV3Router::ExactInputSingleParams {
        tokenIn: intent.token_in,
        tokenOut: intent.token_out,
        fee: U24::from(intent.fee),
        recipient: intent.recipient,
        deadline: U256::from(intent.deadline),
        amountIn: intent.amount_in,
        // Unlimited slippage: any output amount and any execution price is
        // accepted. No minimum is estimated or enforced.
        amountOutMinimum: U256::ZERO,
        sqrtPriceLimitX96: U160::ZERO,
    };
    UniV3Router::exactInputSingleCall { params }.abi_encode()
}

fn stake_calldata(pool_id: u64, amount: U256) -> Vec<u8> {
    StakingPool::depositCall {
        pid: U256::from(pool_id),
        amount,
    }
    .abi_encode()
}

/// Submit one call and block on its receipt.
///
/// The submission happens exactly once. Whatever goes wrong afterwards, the
/// transaction is never resent; the outcome is reported through `wrap`.
async fn run_step<G>(
    gateway: &G,
    to: Address,
    calldata: Vec<u8>,
    gas_limit: u64,
    wrap: fn(TxFailure) -> AppError,
) -> Result<B256, AppError>
where
    G: ChainGateway + ?Sized,
{
    let hash = match gateway.submit(to, calldata, gas_limit).await {
        Ok(hash) => hash,
        Err(e) => return Err(wrap(TxFailure::Rejected(e.to_string()))),
    };

    tracing::info!(
        target: "workflow",
        hash = %format!("{:#x}", hash),
        to = %to,
        "Step submitted; awaiting receipt"
    );

    match gateway.await_receipt(hash).await {
        Ok(ReceiptOutcome::Confirmed) => Ok(hash),
        Ok(ReceiptOutcome::Reverted) => Err(wrap(TxFailure::Reverted { hash })),
        Ok(ReceiptOutcome::TimedOut { waited_ms }) => {
            Err(wrap(TxFailure::ConfirmationTimeout { hash, waited_ms }))
        }
        // A transport breakdown while tracking confirmation is not one of the
        // three transaction sub-causes; surface it unchanged.
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_calldata_targets_spender_with_exact_amount() {
        let spender = Address::repeat_byte(0x11);
        let amount = U256::from(123_456u64);
        let encoded = approve_calldata(spender, amount);

        assert_eq!(&encoded[..4], ERC20::approveCall::SELECTOR);
        let decoded = ERC20::approveCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded.spender, spender);
        assert_eq!(decoded.amount, amount);
    }

    #[test]
    fn swap_calldata_pins_zero_minimum_and_no_price_limit() {
        let intent = SwapIntent {
            token_in: Address::repeat_byte(0x01),
            token_out: Address::repeat_byte(0x02),
            fee: 3000,
            recipient: Address::repeat_byte(0xAA),
            deadline: 1_700_000_000,
            amount_in: U256::from(5_000_000u64),
        };
        let encoded = swap_calldata(&intent);

        let decoded = UniV3Router::exactInputSingleCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded.params.tokenIn, intent.token_in);
        assert_eq!(decoded.params.tokenOut, intent.token_out);
        assert_eq!(decoded.params.fee, U24::from(3000u32));
        assert_eq!(decoded.params.recipient, intent.recipient);
        assert_eq!(decoded.params.deadline, U256::from(1_700_000_000u64));
        assert_eq!(decoded.params.amountIn, intent.amount_in);
        assert_eq!(decoded.params.amountOutMinimum, U256::ZERO);
        assert_eq!(decoded.params.sqrtPriceLimitX96, U160::ZERO);
    }

    #[test]
    fn stake_calldata_carries_pool_slot_and_amount() {
        let encoded = stake_calldata(7, U256::from(42u64));

        let decoded = StakingPool::depositCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded.pid, U256::from(7u64));
        assert_eq!(decoded.amount, U256::from(42u64));
    }
}
