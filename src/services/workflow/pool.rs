// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::Address;

use crate::common::error::AppError;
use crate::domain::gateway::ChainGateway;

/// A pool confirmed to exist, carrying the pair exactly as the pool contract
/// reports it. `token0`/`token1` may be in either order relative to the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolIdentity {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
}

/// Ask the factory for the pair's pool at one fee tier, then read the pair
/// back from the pool contract itself.
///
/// A zero factory answer fails the run before anything is signed or
/// submitted.
pub async fn resolve_pool<G>(
    gateway: &G,
    factory: Address,
    token_a: Address,
    token_b: Address,
    fee_tier: u32,
) -> Result<PoolIdentity, AppError>
where
    G: ChainGateway + ?Sized,
{
    let pool = gateway.pool_for(factory, token_a, token_b, fee_tier).await?;
    if pool == Address::ZERO {
        return Err(AppError::PoolNotFound {
            token_a: format!("{token_a:#x}"),
            token_b: format!("{token_b:#x}"),
            fee_tier,
        });
    }

    let record = gateway.pool_record(pool).await?;
    if record.fee != fee_tier {
        tracing::warn!(
            target: "workflow",
            pool = %pool,
            requested = fee_tier,
            reported = record.fee,
            "Pool reports a different fee tier than requested"
        );
    }

    tracing::info!(
        target: "workflow",
        pool = %pool,
        token0 = %record.token0,
        token1 = %record.token1,
        fee = record.fee,
        "Pool resolved"
    );

    Ok(PoolIdentity {
        address: pool,
        token0: record.token0,
        token1: record.token1,
        fee: record.fee,
    })
}
