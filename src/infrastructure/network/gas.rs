// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::constants::DEFAULT_PRIORITY_FEE_GWEI;
use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::network::provider::HttpProvider;
use alloy::providers::Provider;
use alloy::rpc::types::BlockNumberOrTag;
use alloy::rpc::types::eth::FeeHistory;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub struct GasOracle {
    provider: HttpProvider,
    last_good: Arc<Mutex<Option<GasFees>>>,
}

#[derive(Debug, Clone)]
pub struct GasFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub next_base_fee_per_gas: u128,
    pub base_fee_per_gas: u128,
}

impl GasOracle {
    pub fn new(provider: HttpProvider) -> Self {
        Self {
            provider,
            last_good: Arc::new(Mutex::new(None)),
        }
    }

    /// Price the next transaction: fee history first, then the last good
    /// estimate, then a conservative single-block fallback.
    pub async fn estimate_eip1559_fees(&self) -> Result<GasFees, AppError> {
        match self.with_retry_history().await {
            Ok(history) => {
                let fees = Self::fees_from_history(history)?;
                if let Ok(mut guard) = self.last_good.lock() {
                    *guard = Some(fees.clone());
                }
                Ok(fees)
            }
            Err(_) => {
                if let Ok(guard) = self.last_good.lock()
                    && let Some(fees) = guard.clone()
                {
                    return Ok(fees);
                }
                self.fallback_estimate().await
            }
        }
    }

    async fn with_retry_history(&self) -> Result<FeeHistory, AppError> {
        let provider = self.provider.clone();
        retry_async(
            move |_| {
                let provider = provider.clone();
                async move {
                    provider
                        .get_fee_history(5, BlockNumberOrTag::Latest, &[50.0f64])
                        .await
                }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Fee History failed: {}", e)))
    }

    fn fees_from_history(history: FeeHistory) -> Result<GasFees, AppError> {
        let latest_base_fee = history
            .latest_block_base_fee()
            .or_else(|| history.base_fee_per_gas.iter().rev().nth(1).copied())
            .ok_or_else(|| AppError::Connection("No base fee history".into()))?;

        let raw_next_base = history.next_block_base_fee().unwrap_or(latest_base_fee);

        // 12.5% buffer for nodes that return zeroes in the next-block slot.
        let next_base_fee = if raw_next_base == 0 {
            (latest_base_fee.saturating_mul(1125)) / 1000
        } else {
            raw_next_base
        };

        // Average p50 tip over the sampled blocks.
        let mut tip_sum = 0u128;
        let mut tip_count = 0u128;
        if let Some(rewards) = &history.reward {
            for block_reward in rewards {
                if let Some(r) = block_reward.first() {
                    tip_sum = tip_sum.saturating_add(*r);
                    tip_count = tip_count.saturating_add(1);
                }
            }
        }
        let tip = if tip_count > 0 {
            tip_sum / tip_count
        } else {
            DEFAULT_PRIORITY_FEE_GWEI as u128 * 1_000_000_000
        };

        Ok(GasFees {
            max_fee_per_gas: next_base_fee.saturating_add(tip),
            max_priority_fee_per_gas: tip,
            next_base_fee_per_gas: next_base_fee,
            base_fee_per_gas: latest_base_fee,
        })
    }

    /// For nodes that disable feeHistory (common on some public RPCs).
    async fn fallback_estimate(&self) -> Result<GasFees, AppError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| AppError::Connection(format!("Latest block fetch failed: {}", e)))?;

        let base: u128 = block
            .as_ref()
            .and_then(|b| b.header.base_fee_per_gas)
            .map(|v| v as u128)
            .unwrap_or(1_500_000_000u128); // 1.5 gwei conservative default

        let priority: u128 = self
            .provider
            .get_max_priority_fee_per_gas()
            .await
            .unwrap_or(DEFAULT_PRIORITY_FEE_GWEI as u128 * 1_000_000_000);

        let next_base = (base.saturating_mul(1125)) / 1000;

        Ok(GasFees {
            max_fee_per_gas: next_base + priority,
            max_priority_fee_per_gas: priority,
            next_base_fee_per_gas: next_base,
            base_fee_per_gas: base,
        })
    }
}
