// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants;
use crate::domain::error::AppError;
use alloy::primitives::Address;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,
    /// Expected chain id. Auto-detected from the node when absent; when both
    /// are present and disagree, startup fails.
    pub chain_id: Option<u64>,

    // Identity
    pub wallet_key: String,
    /// Optional cross-check: the key must derive exactly this address.
    pub wallet_address: Option<String>,

    // Endpoints
    pub rpc_url: Option<String>,

    // Workflow contracts
    pub token_in: String,
    pub token_out: String,
    pub token_in_decimals: Option<u8>,
    pub token_out_decimals: Option<u8>,
    #[serde(default = "default_fee_tier")]
    pub fee_tier: u32,
    pub factory_address: Option<String>,
    pub router_address: Option<String>,
    pub staking_address: String,
    pub staking_pool_id: Option<u64>,

    // Transaction
    #[serde(default = "default_max_gas")]
    pub max_gas_price_gwei: u64,
    #[serde(default = "default_approve_gas_limit")]
    pub approve_gas_limit: u64,
    #[serde(default = "default_swap_gas_limit")]
    pub swap_gas_limit: u64,
    #[serde(default = "default_stake_gas_limit")]
    pub stake_gas_limit: u64,
    #[serde(default = "default_swap_deadline_secs")]
    pub swap_deadline_secs: u64,

    // Receipts
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
    #[serde(default = "default_receipt_confirm_blocks")]
    pub receipt_confirm_blocks: u64,
}

// Defaults
fn default_debug() -> bool {
    false
}
fn default_fee_tier() -> u32 {
    3000
}
fn default_max_gas() -> u64 {
    500
}
fn default_approve_gas_limit() -> u64 {
    constants::DEFAULT_APPROVE_GAS_LIMIT
}
fn default_swap_gas_limit() -> u64 {
    constants::DEFAULT_SWAP_GAS_LIMIT
}
fn default_stake_gas_limit() -> u64 {
    constants::DEFAULT_STAKE_GAS_LIMIT
}
fn default_swap_deadline_secs() -> u64 {
    300
}
fn default_receipt_poll_ms() -> u64 {
    500
}
fn default_receipt_timeout_ms() -> u64 {
    180_000
}
fn default_receipt_confirm_blocks() -> u64 {
    1
}

impl Settings {
    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let selected_config = resolve_config_path(path);
        let mut builder = Config::builder();

        if let Some(ref selected_path) = selected_config {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Deterministic precedence: CLI (in main) > env/.env > selected profile file.
        builder = builder.add_source(Environment::default());

        let settings: Settings = builder.build()?.try_deserialize()?;

        // Basic Validation
        if settings.wallet_key.trim().is_empty() {
            return Err(AppError::Config("WALLET_KEY is missing".to_string()));
        }
        let token_in = settings.token_in_address()?;
        let token_out = settings.token_out_address()?;
        if token_in == token_out {
            return Err(AppError::Config(
                "token_in and token_out must be different tokens".to_string(),
            ));
        }
        settings.staking_address_value()?;
        if settings.fee_tier >= 1 << 24 {
            return Err(AppError::Config(format!(
                "fee_tier {} does not fit the factory's uint24 argument",
                settings.fee_tier
            )));
        }

        Ok(settings)
    }

    // --- Typed address accessors -------------------------------------------

    pub fn token_in_address(&self) -> Result<Address, AppError> {
        parse_address_field(&self.token_in, "token_in")
    }

    pub fn token_out_address(&self) -> Result<Address, AppError> {
        parse_address_field(&self.token_out, "token_out")
    }

    pub fn staking_address_value(&self) -> Result<Address, AppError> {
        parse_address_field(&self.staking_address, "staking_address")
    }

    pub fn wallet_address_value(&self) -> Result<Option<Address>, AppError> {
        match self.wallet_address.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_address_field(raw, "wallet_address").map(Some),
        }
    }

    /// Factory for the target chain: explicit config wins, then the known
    /// deployment table.
    pub fn factory_address_for(&self, chain_id: u64) -> Result<Address, AppError> {
        if let Some(raw) = self.factory_address.as_deref()
            && !raw.trim().is_empty()
        {
            return parse_address_field(raw, "factory_address");
        }
        constants::default_factory_for_chain(chain_id).ok_or_else(|| {
            AppError::Config(format!(
                "No known V3 factory for chain {chain_id}; set factory_address"
            ))
        })
    }

    pub fn router_address_for(&self, chain_id: u64) -> Result<Address, AppError> {
        if let Some(raw) = self.router_address.as_deref()
            && !raw.trim().is_empty()
        {
            return parse_address_field(raw, "router_address");
        }
        constants::default_router_for_chain(chain_id).ok_or_else(|| {
            AppError::Config(format!(
                "No known V3 swap router for chain {chain_id}; set router_address"
            ))
        })
    }

    // --- Endpoint lookup ----------------------------------------------------

    /// RPC URL: config field (already env-merged), then legacy env names.
    pub fn rpc_url_value(&self) -> Result<String, AppError> {
        if let Some(url) = self.rpc_url.as_deref()
            && !url.trim().is_empty()
        {
            return Ok(url.trim().to_string());
        }

        let candidates = ["RPC_URL", "HTTP_PROVIDER"];
        for key in candidates {
            if let Ok(v) = std::env::var(key) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Ok(trimmed.to_string());
                }
            }
        }

        Err(AppError::Config(
            "No RPC URL configured; set rpc_url or RPC_URL".to_string(),
        ))
    }

    // --- Floored / clamped tuning accessors --------------------------------

    pub fn fee_tier_value(&self) -> u32 {
        if !constants::is_known_fee_tier(self.fee_tier) {
            tracing::warn!(
                target: "config",
                fee_tier = self.fee_tier,
                "Fee tier outside the known V3 set; the factory lookup decides"
            );
        }
        self.fee_tier
    }

    pub fn max_gas_price_wei(&self) -> u128 {
        u128::from(self.max_gas_price_gwei).saturating_mul(1_000_000_000)
    }

    pub fn approve_gas_limit_value(&self) -> u64 {
        clamp_gas_limit(self.approve_gas_limit)
    }

    pub fn swap_gas_limit_value(&self) -> u64 {
        clamp_gas_limit(self.swap_gas_limit)
    }

    pub fn stake_gas_limit_value(&self) -> u64 {
        clamp_gas_limit(self.stake_gas_limit)
    }

    pub fn swap_deadline_secs_value(&self) -> u64 {
        self.swap_deadline_secs.max(30)
    }

    pub fn receipt_poll_ms_value(&self) -> u64 {
        self.receipt_poll_ms.max(100)
    }

    pub fn receipt_timeout_ms_value(&self) -> u64 {
        self.receipt_timeout_ms.max(self.receipt_poll_ms_value())
    }

    pub fn receipt_confirm_blocks_value(&self) -> u64 {
        self.receipt_confirm_blocks.max(1)
    }
}

fn clamp_gas_limit(raw: u64) -> u64 {
    raw.clamp(constants::MIN_STEP_GAS_LIMIT, constants::MAX_GAS_LIMIT)
}

fn parse_address_field(raw: &str, field: &str) -> Result<Address, AppError> {
    Address::from_str(raw.trim()).map_err(|_| AppError::InvalidAddress(format!("{field} -> {raw}")))
}

fn resolve_config_path(path: Option<&str>) -> Option<String> {
    if let Some(path) = path {
        return Some(path.to_string());
    }
    detect_active_config_file()
}

fn detect_active_config_file() -> Option<String> {
    // Check common config.*.toml files first
    let priority_files = [
        "config.prod.toml",
        "config.dev.toml",
        "config.testnet.toml",
        "config.example.toml",
        "config.toml",
    ];

    for file in priority_files.iter() {
        if let Some(true) = config_has_active_flag(file) {
            return Some((*file).to_string());
        }
    }

    // Fallback: scan current dir for config.*.toml with THIS_ACTIVE = true
    if let Ok(entries) = fs::read_dir(".") {
        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str())
                && name.starts_with("config.")
                && name.ends_with(".toml")
                && let Some(true) = config_has_active_flag(name)
            {
                return Some(name.to_string());
            }
        }
    }

    None
}

fn config_has_active_flag(path: &str) -> Option<bool> {
    let p = Path::new(path);
    if !p.exists() {
        return None;
    }

    Config::builder()
        .add_source(File::from(p))
        .build()
        .ok()?
        .get_bool("THIS_ACTIVE")
        .ok()
}
