// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::{Address, address};
use lazy_static::lazy_static;
use std::collections::HashMap;

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_ETHEREUM: u64 = 1;
pub const CHAIN_OPTIMISM: u64 = 10;
pub const CHAIN_BSC: u64 = 56;
pub const CHAIN_POLYGON: u64 = 137;
pub const CHAIN_ARBITRUM: u64 = 42161;

// =============================================================================
// GAS & TRANSACTION CONSTANTS
// =============================================================================

pub const DEFAULT_APPROVE_GAS_LIMIT: u64 = 120_000;
pub const DEFAULT_SWAP_GAS_LIMIT: u64 = 420_000;
pub const DEFAULT_STAKE_GAS_LIMIT: u64 = 320_000;
pub const MIN_STEP_GAS_LIMIT: u64 = 60_000;
pub const MAX_GAS_LIMIT: u64 = 8_000_000;
pub const DEFAULT_PRIORITY_FEE_GWEI: u64 = 2;

// =============================================================================
// POOL CONSTANTS
// =============================================================================

// Fee tiers with known deployments across Uniswap V3 and its forks, in
// hundredths of a basis point (3000 = 0.30%).
pub const KNOWN_FEE_TIERS: [u32; 5] = [100, 500, 2500, 3000, 10_000];

lazy_static! {
    // V3 factory deployments. Uniswap uses one address on every chain it
    // deployed to; BSC is PancakeSwap V3.
    pub static ref V3_FACTORY_BY_CHAIN: HashMap<u64, Address> = {
        let mut m = HashMap::new();

        // Uniswap V3
        m.insert(CHAIN_ETHEREUM, address!("1F98431c8aD98523631AE4a59f267346ea31F984"));
        m.insert(CHAIN_OPTIMISM, address!("1F98431c8aD98523631AE4a59f267346ea31F984"));
        m.insert(CHAIN_POLYGON, address!("1F98431c8aD98523631AE4a59f267346ea31F984"));
        m.insert(CHAIN_ARBITRUM, address!("1F98431c8aD98523631AE4a59f267346ea31F984"));

        // PancakeSwap V3
        m.insert(CHAIN_BSC, address!("0BFbCF9fa4f9C56B0F40a671Ad40E0805A091865"));

        m
    };

    // Matching SwapRouter deployments (the deadline-in-params router, not
    // SwapRouter02 whose exact-input struct differs).
    pub static ref V3_SWAP_ROUTER_BY_CHAIN: HashMap<u64, Address> = {
        let mut m = HashMap::new();

        // Uniswap V3 SwapRouter
        m.insert(CHAIN_ETHEREUM, address!("E592427A0AEce92De3Edee1F18E0157C05861564"));
        m.insert(CHAIN_OPTIMISM, address!("E592427A0AEce92De3Edee1F18E0157C05861564"));
        m.insert(CHAIN_POLYGON, address!("E592427A0AEce92De3Edee1F18E0157C05861564"));
        m.insert(CHAIN_ARBITRUM, address!("E592427A0AEce92De3Edee1F18E0157C05861564"));

        // PancakeSwap V3 SwapRouter
        m.insert(CHAIN_BSC, address!("1b81D678ffb9C0263b24A97847620C99d213eB14"));

        m
    };
}

// =============================================================================
// LOGGING DEFAULTS
// =============================================================================

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub fn default_factory_for_chain(chain_id: u64) -> Option<Address> {
    V3_FACTORY_BY_CHAIN.get(&chain_id).copied()
}

pub fn default_router_for_chain(chain_id: u64) -> Option<Address> {
    V3_SWAP_ROUTER_BY_CHAIN.get(&chain_id).copied()
}

pub fn is_known_fee_tier(fee_tier: u32) -> bool {
    KNOWN_FEE_TIERS.contains(&fee_tier)
}
