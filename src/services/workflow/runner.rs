// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! Single-shot orchestration of the approve/swap/approve/stake pipeline.
//!
//! The runner walks a fixed state machine, fails fast on the first error, and
//! never rolls back: confirmed transactions stay confirmed. One run produces
//! exactly one [`WorkflowResult`].

use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::{Address, B256};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::common::error::AppError;
use crate::common::units::{format_base_units, to_base_units};
use crate::domain::gateway::ChainGateway;
use crate::infrastructure::data::tokens::TokenDescriptor;
use crate::services::workflow::pool;
use crate::services::workflow::steps::{self, SwapIntent};

/// Where the runner currently is. `Done` and `Failed` are terminal; there are
/// no other exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    ApprovingSwap,
    Swapping,
    ApprovingStake,
    Staking,
    Done,
    Failed,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::ApprovingSwap => "approving_swap",
            WorkflowState::Swapping => "swapping",
            WorkflowState::ApprovingStake => "approving_stake",
            WorkflowState::Staking => "staking",
            WorkflowState::Done => "done",
            WorkflowState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One reportable leg of a run, in execution order. `Prepare` covers
/// everything before the first submission: amount conversion, metadata
/// lookups, and pool resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowStep {
    Prepare,
    ApproveSwap,
    Swap,
    ApproveStake,
    Stake,
}

impl WorkflowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::Prepare => "prepare",
            WorkflowStep::ApproveSwap => "approveSwap",
            WorkflowStep::Swap => "swap",
            WorkflowStep::ApproveStake => "approveStake",
            WorkflowStep::Stake => "stake",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidAmount,
    PoolNotFound,
    ApprovalFailed,
    SwapFailed,
    StakeFailed,
    Canceled,
    Other,
}

/// Final report of one run, shaped for both operators and machines.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum WorkflowResult {
    #[serde(rename_all = "camelCase")]
    Success {
        approve_swap_tx_hash: B256,
        swap_tx_hash: B256,
        approve_stake_tx_hash: B256,
        stake_tx_hash: B256,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        failed_step: WorkflowStep,
        error_kind: ErrorKind,
        detail: String,
        confirmed_steps_so_far: Vec<WorkflowStep>,
    },
}

impl WorkflowResult {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowResult::Success { .. })
    }
}

/// Everything fixed before the first submission.
#[derive(Debug, Clone)]
pub struct WorkflowPlan {
    pub factory: Address,
    pub router: Address,
    pub staking: Address,
    pub token_in: TokenDescriptor,
    pub token_out: TokenDescriptor,
    pub fee_tier: u32,
    pub deadline_secs: u64,
    pub approve_gas_limit: u64,
    pub swap_gas_limit: u64,
    pub stake_gas_limit: u64,
}

pub struct WorkflowRunner<G: ChainGateway> {
    gateway: G,
    plan: WorkflowPlan,
    cancel: CancellationToken,
}

impl<G: ChainGateway> WorkflowRunner<G> {
    pub fn new(gateway: G, plan: WorkflowPlan, cancel: CancellationToken) -> Self {
        Self {
            gateway,
            plan,
            cancel,
        }
    }

    /// Run the pipeline once. Never panics; every outcome is a report.
    ///
    /// `swap_amount` is denominated in the input token, `stake_amount` in the
    /// swap's output token. Each converts with its own token's decimals.
    pub async fn run(
        &self,
        swap_amount: &str,
        stake_amount: &str,
        pool_id: u64,
    ) -> WorkflowResult {
        let mut state = WorkflowState::Idle;
        let mut confirmed: Vec<WorkflowStep> = Vec::new();

        tracing::info!(
            target: "workflow",
            swap_amount,
            stake_amount,
            pool_id,
            token_in = %self.plan.token_in.symbol,
            token_out = %self.plan.token_out.symbol,
            "Workflow starting"
        );

        // Prepare phase: nothing is signed or submitted until this block is
        // done.
        let amount_in = match to_base_units(swap_amount, self.plan.token_in.decimals) {
            Ok(v) => v,
            Err(e) => return self.fail(&mut state, WorkflowStep::Prepare, &e, &confirmed),
        };
        let stake_units = match to_base_units(stake_amount, self.plan.token_out.decimals) {
            Ok(v) => v,
            Err(e) => return self.fail(&mut state, WorkflowStep::Prepare, &e, &confirmed),
        };

        self.log_balances().await;

        let pool = match pool::resolve_pool(
            &self.gateway,
            self.plan.factory,
            self.plan.token_in.address,
            self.plan.token_out.address,
            self.plan.fee_tier,
        )
        .await
        {
            Ok(p) => p,
            Err(e) => return self.fail(&mut state, WorkflowStep::Prepare, &e, &confirmed),
        };

        let intent = SwapIntent {
            token_in: self.plan.token_in.address,
            token_out: self.plan.token_out.address,
            fee: pool.fee,
            recipient: self.gateway.sender(),
            deadline: current_unix().saturating_add(self.plan.deadline_secs),
            amount_in,
        };

        // Leg 1: approve the input token for the router. Always a fresh
        // approval; existing allowances are ignored.
        if let Some(stop) = self.stop_if_canceled(&mut state, WorkflowStep::ApproveSwap, &confirmed)
        {
            return stop;
        }
        self.advance(&mut state, WorkflowState::ApprovingSwap);
        let approve_swap_tx = match steps::approve(
            &self.gateway,
            self.plan.token_in.address,
            self.plan.router,
            amount_in,
            self.plan.approve_gas_limit,
        )
        .await
        {
            Ok(h) => h,
            Err(e) => return self.fail(&mut state, WorkflowStep::ApproveSwap, &e, &confirmed),
        };
        confirmed.push(WorkflowStep::ApproveSwap);

        // Leg 2: the swap itself.
        if let Some(stop) = self.stop_if_canceled(&mut state, WorkflowStep::Swap, &confirmed) {
            return stop;
        }
        self.advance(&mut state, WorkflowState::Swapping);
        let swap_tx = match steps::swap(
            &self.gateway,
            self.plan.router,
            &intent,
            self.plan.swap_gas_limit,
        )
        .await
        {
            Ok(h) => h,
            Err(e) => return self.fail(&mut state, WorkflowStep::Swap, &e, &confirmed),
        };
        confirmed.push(WorkflowStep::Swap);

        // Leg 3: approve the output token for the staking contract.
        if let Some(stop) =
            self.stop_if_canceled(&mut state, WorkflowStep::ApproveStake, &confirmed)
        {
            return stop;
        }
        self.advance(&mut state, WorkflowState::ApprovingStake);
        let approve_stake_tx = match steps::approve(
            &self.gateway,
            self.plan.token_out.address,
            self.plan.staking,
            stake_units,
            self.plan.approve_gas_limit,
        )
        .await
        {
            Ok(h) => h,
            Err(e) => return self.fail(&mut state, WorkflowStep::ApproveStake, &e, &confirmed),
        };
        confirmed.push(WorkflowStep::ApproveStake);

        // Leg 4: deposit into the numbered staking pool.
        if let Some(stop) = self.stop_if_canceled(&mut state, WorkflowStep::Stake, &confirmed) {
            return stop;
        }
        self.advance(&mut state, WorkflowState::Staking);
        let stake_tx = match steps::stake(
            &self.gateway,
            self.plan.staking,
            pool_id,
            stake_units,
            self.plan.stake_gas_limit,
        )
        .await
        {
            Ok(h) => h,
            Err(e) => return self.fail(&mut state, WorkflowStep::Stake, &e, &confirmed),
        };
        confirmed.push(WorkflowStep::Stake);

        self.advance(&mut state, WorkflowState::Done);
        tracing::info!(
            target: "workflow",
            approve_swap = %format!("{:#x}", approve_swap_tx),
            swap = %format!("{:#x}", swap_tx),
            approve_stake = %format!("{:#x}", approve_stake_tx),
            stake = %format!("{:#x}", stake_tx),
            "Workflow complete"
        );

        WorkflowResult::Success {
            approve_swap_tx_hash: approve_swap_tx,
            swap_tx_hash: swap_tx,
            approve_stake_tx_hash: approve_stake_tx,
            stake_tx_hash: stake_tx,
        }
    }

    fn advance(&self, state: &mut WorkflowState, next: WorkflowState) {
        tracing::info!(target: "workflow", from = %state, to = %next, "State transition");
        *state = next;
    }

    /// Cancellation is only observed here, between legs. A leg that has
    /// already submitted runs to its receipt regardless.
    fn stop_if_canceled(
        &self,
        state: &mut WorkflowState,
        next_step: WorkflowStep,
        confirmed: &[WorkflowStep],
    ) -> Option<WorkflowResult> {
        if self.cancel.is_cancelled() {
            return Some(self.fail(state, next_step, &AppError::Canceled, confirmed));
        }
        None
    }

    fn fail(
        &self,
        state: &mut WorkflowState,
        step: WorkflowStep,
        error: &AppError,
        confirmed: &[WorkflowStep],
    ) -> WorkflowResult {
        // `Failed` is only entered from an active state; a run that dies
        // before the first leg never started the machine.
        if *state != WorkflowState::Idle {
            self.advance(state, WorkflowState::Failed);
        }
        let failed_tx = match error {
            AppError::ApprovalFailed(f) | AppError::SwapFailed(f) | AppError::StakeFailed(f) => {
                f.tx_hash()
            }
            _ => None,
        };
        tracing::error!(
            target: "workflow",
            step = step.as_str(),
            error = %error,
            failed_tx = ?failed_tx,
            confirmed = confirmed.len(),
            "Workflow failed"
        );
        WorkflowResult::Failure {
            failed_step: step,
            error_kind: classify(error),
            detail: error.to_string(),
            confirmed_steps_so_far: confirmed.to_vec(),
        }
    }

    async fn log_balances(&self) {
        let owner = self.gateway.sender();
        for token in [&self.plan.token_in, &self.plan.token_out] {
            match self.gateway.erc20_balance(token.address, owner).await {
                Ok(balance) => tracing::info!(
                    target: "workflow",
                    token = %token.symbol,
                    balance = %format_base_units(balance, token.decimals),
                    "Wallet balance"
                ),
                Err(e) => tracing::debug!(
                    target: "workflow",
                    token = %token.symbol,
                    error = %e,
                    "Balance read skipped"
                ),
            }
        }
    }
}

fn classify(error: &AppError) -> ErrorKind {
    match error {
        AppError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
        AppError::PoolNotFound { .. } => ErrorKind::PoolNotFound,
        AppError::ApprovalFailed(_) => ErrorKind::ApprovalFailed,
        AppError::SwapFailed(_) => ErrorKind::SwapFailed,
        AppError::StakeFailed(_) => ErrorKind::StakeFailed,
        AppError::Canceled => ErrorKind::Canceled,
        _ => ErrorKind::Other,
    }
}

fn current_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
