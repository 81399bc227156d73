// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use alloy::network::Ethereum;
use alloy::providers::RootProvider;
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;
pub type WsProvider = RootProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    /// Dispatch on URL scheme: ws(s) endpoints get a pubsub connection,
    /// anything else is treated as HTTP.
    pub async fn connect(rpc_url: &str) -> Result<HttpProvider, AppError> {
        let scheme = Url::parse(rpc_url)
            .map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?
            .scheme()
            .to_ascii_lowercase();
        match scheme.as_str() {
            "ws" | "wss" => Self::ws(rpc_url).await,
            _ => Self::http(rpc_url),
        }
    }

    pub fn http(rpc_url: &str) -> Result<HttpProvider, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;

        let provider = RootProvider::new_http(url);
        Ok(provider)
    }

    pub async fn ws(ws_url: &str) -> Result<WsProvider, AppError> {
        let provider = RootProvider::connect(ws_url)
            .await
            .map_err(|e| AppError::Connection(format!("WS Connection failed: {}", e)))?;

        Ok(provider)
    }
}
