// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;

use crate::domain::error::AppError;

/// A pool's own record of its pair and fee tier, in the order the pool
/// contract reports them. Callers get token0/token1 verbatim and must not
/// assume it matches their query order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolRecord {
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
}

/// Terminal outcome of waiting on one submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptOutcome {
    /// Included and successful at the configured confirmation depth.
    Confirmed,
    /// Included but reverted. The gas is spent; the call had no effect.
    Reverted,
    /// No conclusive receipt inside the timeout window. The transaction may
    /// still land later; the workflow treats this as terminal.
    TimedOut { waited_ms: u64 },
}

/// Node-facing seam for the workflow.
///
/// Submission and confirmation are deliberately two operations: every step
/// first obtains a pending hash, then blocks on its receipt. Implementations
/// must never retry a submission.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Address whose key signs every submission.
    fn sender(&self) -> Address;

    /// Ask a factory for the pool of an unordered pair at one fee tier.
    /// Returns the zero address when no such pool exists.
    async fn pool_for(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> Result<Address, AppError>;

    /// Read token0/token1/fee from the pool contract itself.
    async fn pool_record(&self, pool: Address) -> Result<PoolRecord, AppError>;

    /// ERC-20 balance of `owner`, read-only.
    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256, AppError>;

    /// Sign and broadcast one call to `to`. Returns the pending hash; the
    /// transaction is not yet confirmed when this returns.
    async fn submit(
        &self,
        to: Address,
        calldata: Vec<u8>,
        gas_limit: u64,
    ) -> Result<B256, AppError>;

    /// Block until the hash confirms, reverts, or the bounded timeout lapses.
    async fn await_receipt(&self, hash: B256) -> Result<ReceiptOutcome, AppError>;
}
