// SPDX-License-Identifier: MIT
// End-to-end workflow runs against a scripted in-memory gateway: no RPC, no
// signing. Each test drives the real runner/steps/pool code and asserts on
// the exact calldata the workflow would have broadcast.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use alloy::primitives::{
    Address, B256, U256,
    aliases::{U24, U160},
};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use stakezap::domain::error::AppError;
use stakezap::domain::gateway::{ChainGateway, PoolRecord, ReceiptOutcome};
use stakezap::infrastructure::data::contracts::{ERC20, StakingPool, UniV3Router};
use stakezap::infrastructure::data::tokens::TokenDescriptor;
use stakezap::services::workflow::{
    ErrorKind, WorkflowPlan, WorkflowResult, WorkflowRunner, WorkflowStep,
};

const FACTORY: Address = Address::repeat_byte(0xFA);
const ROUTER: Address = Address::repeat_byte(0x22);
const STAKING: Address = Address::repeat_byte(0x33);
const TOKEN_IN: Address = Address::repeat_byte(0x01);
const TOKEN_OUT: Address = Address::repeat_byte(0x02);
const POOL: Address = Address::repeat_byte(0x77);
const SENDER: Address = Address::repeat_byte(0xAA);

/// What the gateway should do for each leg, in order. `RejectSubmit` is
/// consumed at submission time; the rest at receipt time.
enum StepScript {
    Confirm,
    RejectSubmit(&'static str),
    Revert,
    TimeOut(u64),
}

struct ScriptedGateway {
    pool: Address,
    record: PoolRecord,
    script: Mutex<VecDeque<StepScript>>,
    submissions: Arc<Mutex<Vec<(Address, Vec<u8>)>>>,
}

impl ScriptedGateway {
    fn with_script(pool: Address, script: Vec<StepScript>) -> Self {
        Self {
            pool,
            record: PoolRecord {
                token0: TOKEN_IN,
                token1: TOKEN_OUT,
                fee: 3000,
            },
            script: Mutex::new(script.into()),
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn happy() -> Self {
        Self::with_script(
            POOL,
            vec![
                StepScript::Confirm,
                StepScript::Confirm,
                StepScript::Confirm,
                StepScript::Confirm,
            ],
        )
    }

    fn submission_log(&self) -> Arc<Mutex<Vec<(Address, Vec<u8>)>>> {
        self.submissions.clone()
    }
}

#[async_trait]
impl ChainGateway for ScriptedGateway {
    fn sender(&self) -> Address {
        SENDER
    }

    async fn pool_for(
        &self,
        _factory: Address,
        _token_a: Address,
        _token_b: Address,
        _fee: u32,
    ) -> Result<Address, AppError> {
        Ok(self.pool)
    }

    async fn pool_record(&self, _pool: Address) -> Result<PoolRecord, AppError> {
        Ok(self.record)
    }

    async fn erc20_balance(&self, _token: Address, _owner: Address) -> Result<U256, AppError> {
        Ok(U256::from(1_000_000_000_000_000_000u128))
    }

    async fn submit(
        &self,
        to: Address,
        calldata: Vec<u8>,
        _gas_limit: u64,
    ) -> Result<B256, AppError> {
        {
            let mut script = self.script.lock().unwrap();
            if matches!(script.front(), Some(StepScript::RejectSubmit(_))) {
                let Some(StepScript::RejectSubmit(msg)) = script.pop_front() else {
                    unreachable!()
                };
                return Err(AppError::Connection(msg.to_string()));
            }
        }
        let mut subs = self.submissions.lock().unwrap();
        subs.push((to, calldata));
        Ok(B256::repeat_byte(subs.len() as u8))
    }

    async fn await_receipt(&self, hash: B256) -> Result<ReceiptOutcome, AppError> {
        match self.script.lock().unwrap().pop_front() {
            Some(StepScript::Confirm) | None => Ok(ReceiptOutcome::Confirmed),
            Some(StepScript::Revert) => Ok(ReceiptOutcome::Reverted),
            Some(StepScript::TimeOut(waited_ms)) => Ok(ReceiptOutcome::TimedOut { waited_ms }),
            Some(StepScript::RejectSubmit(_)) => {
                panic!("rejection for {hash:#x} should have been consumed at submit time")
            }
        }
    }
}

fn descriptor(address: Address, symbol: &str, decimals: u8) -> TokenDescriptor {
    TokenDescriptor {
        chain_id: 1,
        address,
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        decimals,
    }
}

fn plan(token_in_decimals: u8, token_out_decimals: u8) -> WorkflowPlan {
    WorkflowPlan {
        factory: FACTORY,
        router: ROUTER,
        staking: STAKING,
        token_in: descriptor(TOKEN_IN, "USDC", token_in_decimals),
        token_out: descriptor(TOKEN_OUT, "WETH", token_out_decimals),
        fee_tier: 3000,
        deadline_secs: 300,
        approve_gas_limit: 120_000,
        swap_gas_limit: 420_000,
        stake_gas_limit: 320_000,
    }
}

fn expect_failure(result: WorkflowResult) -> (WorkflowStep, ErrorKind, String, Vec<WorkflowStep>) {
    match result {
        WorkflowResult::Failure {
            failed_step,
            error_kind,
            detail,
            confirmed_steps_so_far,
        } => (failed_step, error_kind, detail, confirmed_steps_so_far),
        other => panic!("Expected failure, got {other:?}"),
    }
}

/// Happy path: four legs, four distinct hashes in submission order, and the
/// exact calldata each contract should have received.
#[tokio::test]
async fn full_run_reports_four_ordered_hashes() {
    let gw = ScriptedGateway::happy();
    let log = gw.submission_log();
    let runner = WorkflowRunner::new(gw, plan(6, 18), CancellationToken::new());

    let result = runner.run("1.5", "0.25", 7).await;

    match result {
        WorkflowResult::Success {
            approve_swap_tx_hash,
            swap_tx_hash,
            approve_stake_tx_hash,
            stake_tx_hash,
        } => {
            assert_eq!(approve_swap_tx_hash, B256::repeat_byte(1));
            assert_eq!(swap_tx_hash, B256::repeat_byte(2));
            assert_eq!(approve_stake_tx_hash, B256::repeat_byte(3));
            assert_eq!(stake_tx_hash, B256::repeat_byte(4));
        }
        other => panic!("Expected success, got {other:?}"),
    }

    let subs = log.lock().unwrap();
    assert_eq!(subs.len(), 4);
    assert_eq!(subs[0].0, TOKEN_IN);
    assert_eq!(subs[1].0, ROUTER);
    assert_eq!(subs[2].0, TOKEN_OUT);
    assert_eq!(subs[3].0, STAKING);

    // Swap approval: router spender, amount in the input token's base units.
    let approve = ERC20::approveCall::abi_decode(&subs[0].1).unwrap();
    assert_eq!(approve.spender, ROUTER);
    assert_eq!(approve.amount, U256::from(1_500_000u64));

    let swap = UniV3Router::exactInputSingleCall::abi_decode(&subs[1].1).unwrap();
    assert_eq!(swap.params.tokenIn, TOKEN_IN);
    assert_eq!(swap.params.tokenOut, TOKEN_OUT);
    assert_eq!(swap.params.fee, U24::from(3000u32));
    assert_eq!(swap.params.recipient, SENDER);
    assert_eq!(swap.params.amountIn, U256::from(1_500_000u64));
    assert_eq!(swap.params.amountOutMinimum, U256::ZERO);
    assert_eq!(swap.params.sqrtPriceLimitX96, U160::ZERO);

    // Stake approval and deposit: output token's 18 decimals, not the input
    // token's 6.
    let approve_stake = ERC20::approveCall::abi_decode(&subs[2].1).unwrap();
    assert_eq!(approve_stake.spender, STAKING);
    assert_eq!(
        approve_stake.amount,
        U256::from(250_000_000_000_000_000u128)
    );

    let deposit = StakingPool::depositCall::abi_decode(&subs[3].1).unwrap();
    assert_eq!(deposit.pid, U256::from(7u64));
    assert_eq!(deposit.amount, U256::from(250_000_000_000_000_000u128));
}

/// Stake units always come from the output token's decimals, also when the
/// input token is the higher-precision one.
#[tokio::test]
async fn stake_units_use_the_output_tokens_decimals() {
    let gw = ScriptedGateway::happy();
    let log = gw.submission_log();
    let runner = WorkflowRunner::new(gw, plan(18, 6), CancellationToken::new());

    let result = runner.run("1.0", "0.5", 0).await;
    assert!(result.is_success());

    let subs = log.lock().unwrap();
    let deposit = StakingPool::depositCall::abi_decode(&subs[3].1).unwrap();
    assert_eq!(deposit.amount, U256::from(500_000u64));
    let swap = UniV3Router::exactInputSingleCall::abi_decode(&subs[1].1).unwrap();
    assert_eq!(swap.params.amountIn, U256::from(1_000_000_000_000_000_000u128));
}

/// A swap revert is terminal: the stake approval and the deposit are never
/// attempted, and the report names the swap with the first approval already
/// confirmed.
#[tokio::test]
async fn swap_revert_stops_the_pipeline() {
    let gw = ScriptedGateway::with_script(POOL, vec![StepScript::Confirm, StepScript::Revert]);
    let log = gw.submission_log();
    let runner = WorkflowRunner::new(gw, plan(6, 18), CancellationToken::new());

    let result = runner.run("1.0", "0.5", 3).await;
    let (failed_step, error_kind, detail, confirmed) = expect_failure(result);

    assert_eq!(failed_step, WorkflowStep::Swap);
    assert_eq!(error_kind, ErrorKind::SwapFailed);
    assert!(detail.contains("reverted"), "detail: {detail}");
    assert_eq!(confirmed, vec![WorkflowStep::ApproveSwap]);
    assert_eq!(log.lock().unwrap().len(), 2);
}

/// A zero factory answer fails the run before anything is submitted.
#[tokio::test]
async fn missing_pool_short_circuits() {
    let gw = ScriptedGateway::with_script(Address::ZERO, vec![]);
    let log = gw.submission_log();
    let runner = WorkflowRunner::new(gw, plan(6, 18), CancellationToken::new());

    let result = runner.run("1.0", "0.5", 3).await;
    let (failed_step, error_kind, _, confirmed) = expect_failure(result);

    assert_eq!(failed_step, WorkflowStep::Prepare);
    assert_eq!(error_kind, ErrorKind::PoolNotFound);
    assert!(confirmed.is_empty());
    assert!(log.lock().unwrap().is_empty());
}

/// Sub-base-unit dust in an amount is rejected during prepare, not rounded.
#[tokio::test]
async fn fractional_dust_fails_before_any_submission() {
    let gw = ScriptedGateway::happy();
    let log = gw.submission_log();
    let runner = WorkflowRunner::new(gw, plan(6, 18), CancellationToken::new());

    let result = runner.run("1.0000001", "0.5", 3).await;
    let (failed_step, error_kind, _, confirmed) = expect_failure(result);

    assert_eq!(failed_step, WorkflowStep::Prepare);
    assert_eq!(error_kind, ErrorKind::InvalidAmount);
    assert!(confirmed.is_empty());
    assert!(log.lock().unwrap().is_empty());
}

/// A node rejection on the first approval leaves nothing confirmed and
/// nothing broadcast.
#[tokio::test]
async fn rejected_submission_confirms_nothing() {
    let gw = ScriptedGateway::with_script(
        POOL,
        vec![StepScript::RejectSubmit(
            "insufficient funds for gas * price + value",
        )],
    );
    let log = gw.submission_log();
    let runner = WorkflowRunner::new(gw, plan(6, 18), CancellationToken::new());

    let result = runner.run("1.0", "0.5", 3).await;
    let (failed_step, error_kind, detail, confirmed) = expect_failure(result);

    assert_eq!(failed_step, WorkflowStep::ApproveSwap);
    assert_eq!(error_kind, ErrorKind::ApprovalFailed);
    assert!(detail.contains("node rejected submission"), "detail: {detail}");
    assert!(detail.contains("insufficient funds"), "detail: {detail}");
    assert!(confirmed.is_empty());
    assert!(log.lock().unwrap().is_empty());
}

/// A confirmation timeout on the deposit is terminal with the three prior
/// legs confirmed; the transaction is not resubmitted.
#[tokio::test]
async fn stake_timeout_is_terminal() {
    let gw = ScriptedGateway::with_script(
        POOL,
        vec![
            StepScript::Confirm,
            StepScript::Confirm,
            StepScript::Confirm,
            StepScript::TimeOut(180_000),
        ],
    );
    let log = gw.submission_log();
    let runner = WorkflowRunner::new(gw, plan(6, 18), CancellationToken::new());

    let result = runner.run("1.0", "0.5", 3).await;
    let (failed_step, error_kind, detail, confirmed) = expect_failure(result);

    assert_eq!(failed_step, WorkflowStep::Stake);
    assert_eq!(error_kind, ErrorKind::StakeFailed);
    assert!(detail.contains("unconfirmed after"), "detail: {detail}");
    assert_eq!(
        confirmed,
        vec![
            WorkflowStep::ApproveSwap,
            WorkflowStep::Swap,
            WorkflowStep::ApproveStake
        ]
    );
    assert_eq!(log.lock().unwrap().len(), 4);
}

/// Cancellation before the first leg stops the run with zero submissions.
#[tokio::test]
async fn cancellation_before_first_step() {
    let gw = ScriptedGateway::happy();
    let log = gw.submission_log();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let runner = WorkflowRunner::new(gw, plan(6, 18), cancel);

    let result = runner.run("1.0", "0.5", 3).await;
    let (failed_step, error_kind, _, confirmed) = expect_failure(result);

    assert_eq!(failed_step, WorkflowStep::ApproveSwap);
    assert_eq!(error_kind, ErrorKind::Canceled);
    assert!(confirmed.is_empty());
    assert!(log.lock().unwrap().is_empty());
}

/// Every run starts with its own approval: a second run repeats the full
/// four-leg sequence with identical approval calldata.
#[tokio::test]
async fn rerun_issues_a_fresh_approval() {
    let gw = ScriptedGateway::with_script(
        POOL,
        (0..8).map(|_| StepScript::Confirm).collect(),
    );
    let log = gw.submission_log();
    let runner = WorkflowRunner::new(gw, plan(6, 18), CancellationToken::new());

    assert!(runner.run("1.5", "0.25", 7).await.is_success());
    assert!(runner.run("1.5", "0.25", 7).await.is_success());

    let subs = log.lock().unwrap();
    assert_eq!(subs.len(), 8);
    assert_eq!(subs[4].0, TOKEN_IN);
    assert_eq!(subs[0].1, subs[4].1, "second run must re-approve identically");
}
