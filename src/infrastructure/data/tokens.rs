// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::collections::HashMap;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::Provider;
use dashmap::DashMap;

use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::infrastructure::data::contracts::ERC20;
use crate::network::provider::HttpProvider;

/// Resolved metadata for one token on one chain.
///
/// `decimals` feeds amount conversion, so it is never guessed: it comes from
/// an operator override or the token's own `decimals()`, or resolution fails.
/// `symbol` and `name` are display-only and degrade to an address-derived
/// label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDescriptor {
    pub chain_id: u64,
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

#[derive(Debug, Clone)]
pub struct TokenDirectory {
    provider: HttpProvider,
    chain_id: u64,
    decimals_overrides: HashMap<Address, u8>,
    cache: DashMap<Address, TokenDescriptor>,
}

impl TokenDirectory {
    pub fn new(provider: HttpProvider, chain_id: u64) -> Self {
        Self {
            provider,
            chain_id,
            decimals_overrides: HashMap::new(),
            cache: DashMap::new(),
        }
    }

    /// Pin a token's decimals, overriding the on-chain readback.
    pub fn with_decimals_override(mut self, address: Address, decimals: Option<u8>) -> Self {
        if let Some(d) = decimals {
            self.decimals_overrides.insert(address, d);
        }
        self
    }

    pub async fn describe(&self, address: Address) -> Result<TokenDescriptor, AppError> {
        if let Some(hit) = self.cache.get(&address) {
            return Ok(hit.clone());
        }

        let provider = self.provider.clone();
        let code = retry_async(
            move |_| {
                let p = provider.clone();
                async move { p.get_code_at(address).await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Bytecode check failed for {address}: {e}")))?;
        if code.is_empty() {
            return Err(AppError::Config(format!(
                "No contract bytecode at token address {address} on chain {}",
                self.chain_id
            )));
        }

        let erc20 = ERC20::new(address, self.provider.clone());
        let decimals = match self.decimals_overrides.get(&address) {
            Some(d) => *d,
            None => {
                let c = erc20.clone();
                retry_async(
                    move |_| {
                        let c = c.clone();
                        async move { c.decimals().call().await }
                    },
                    3,
                    Duration::from_millis(100),
                )
                .await
                .map_err(|e| {
                    AppError::Connection(format!("decimals() read failed for {address}: {e}"))
                })?
            }
        };

        // Symbol and name failures degrade to a short address label; decimals
        // never do.
        let symbol = match erc20.symbol().call().await {
            Ok(s) if !s.trim().is_empty() => s,
            _ => short_label(address),
        };
        let name = match erc20.name().call().await {
            Ok(n) if !n.trim().is_empty() => n,
            _ => symbol.clone(),
        };

        let descriptor = TokenDescriptor {
            chain_id: self.chain_id,
            address,
            symbol,
            name,
            decimals,
        };
        tracing::info!(
            target: "tokens",
            token = %address,
            symbol = %descriptor.symbol,
            name = %descriptor.name,
            decimals = descriptor.decimals,
            "Token resolved"
        );
        self.cache.insert(address, descriptor.clone());
        Ok(descriptor)
    }
}

fn short_label(address: Address) -> String {
    let hex = format!("{address:#x}");
    format!("TKN-{}", hex[2..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::provider::ConnectionFactory;

    #[test]
    fn short_label_is_stable_and_prefixed() {
        let addr = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
            .parse::<Address>()
            .unwrap();
        assert_eq!(short_label(addr), "TKN-A0B869");
    }

    #[test]
    fn override_builder_keeps_only_set_values() {
        let provider = ConnectionFactory::http("http://127.0.0.1:8545").unwrap();
        let dir = TokenDirectory::new(provider, 1)
            .with_decimals_override(Address::repeat_byte(0x11), Some(6))
            .with_decimals_override(Address::repeat_byte(0x22), None);

        assert_eq!(dir.decimals_overrides.len(), 1);
        assert_eq!(
            dir.decimals_overrides.get(&Address::repeat_byte(0x11)),
            Some(&6)
        );
    }
}
