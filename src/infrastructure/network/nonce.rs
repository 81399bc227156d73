// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::network::provider::HttpProvider;
use alloy::primitives::Address;
use alloy::providers::Provider;
use std::time::Duration;

#[derive(Clone)]
pub struct NonceManager {
    provider: HttpProvider,
    address: Address,
}

impl NonceManager {
    pub fn new(provider: HttpProvider, address: Address) -> Self {
        Self { provider, address }
    }

    /// Pending-count nonce for the next submission.
    ///
    /// Every step confirms before the next one submits, so a fresh pending
    /// query is exact and there is no local counter to drift.
    pub async fn next_nonce(&self) -> Result<u64, AppError> {
        let provider = self.provider.clone();
        let address = self.address;
        let on_chain_nonce: u64 = retry_async(
            move |_| {
                let provider = provider.clone();
                async move { provider.get_transaction_count(address).pending().await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Failed to fetch nonce: {}", e)))?;

        tracing::debug!(target: "gateway", nonce = on_chain_nonce, "Pending nonce fetched");
        Ok(on_chain_nonce)
    }
}
