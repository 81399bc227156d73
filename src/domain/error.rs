// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::B256;
use thiserror::Error;

/// How a submitted transaction failed to become a confirmed success.
///
/// Every on-chain step wraps one of these three sub-causes: the node refused
/// the submission, the chain included it but reverted, or the receipt never
/// reached the configured confirmation depth inside the timeout window.
#[derive(Error, Debug)]
pub enum TxFailure {
    #[error("node rejected submission: {0}")]
    Rejected(String),

    #[error("transaction {hash} reverted on-chain")]
    Reverted { hash: B256 },

    #[error("transaction {hash} unconfirmed after {waited_ms} ms")]
    ConfirmationTimeout { hash: B256, waited_ms: u64 },
}

impl TxFailure {
    /// Hash of the submitted transaction, when one exists.
    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            TxFailure::Rejected(_) => None,
            TxFailure::Reverted { hash } | TxFailure::ConfirmationTimeout { hash, .. } => {
                Some(*hash)
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Invalid amount {amount:?}: {reason}")]
    InvalidAmount { amount: String, reason: String },

    #[error("No pool for {token_a}/{token_b} at fee tier {fee_tier}")]
    PoolNotFound {
        token_a: String,
        token_b: String,
        fee_tier: u32,
    },

    #[error("Approval failed: {0}")]
    ApprovalFailed(TxFailure),

    #[error("Swap failed: {0}")]
    SwapFailed(TxFailure),

    #[error("Stake failed: {0}")]
    StakeFailed(TxFailure),

    #[error("Workflow canceled before submission")]
    Canceled,

    #[error("Address {0} is invalid or not checksummed")]
    InvalidAddress(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
