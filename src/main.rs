// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::providers::Provider;
use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use stakezap::app::config::Settings;
use stakezap::app::logging::setup_logging;
use stakezap::domain::constants::DEFAULT_LOG_LEVEL;
use stakezap::domain::error::AppError;
use stakezap::infrastructure::data::tokens::TokenDirectory;
use stakezap::infrastructure::network::gateway::{EthereumGateway, TxTuning};
use stakezap::infrastructure::network::provider::ConnectionFactory;
use stakezap::services::workflow::{WorkflowPlan, WorkflowRunner};
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about = "stakezap: swap once, stake the proceeds")]
struct Cli {
    /// Path to config file (default: config.{toml,...})
    #[arg(long)]
    config: Option<String>,

    /// Human-readable amount of the input token to swap (e.g. "1.5")
    #[arg(long)]
    swap_amount: String,

    /// Human-readable amount of the swap's output token to stake (e.g. "0.75")
    #[arg(long)]
    stake_amount: String,

    /// Staking pool slot (overrides config/env)
    #[arg(long)]
    pool_id: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = Settings::load_with_path(cli.config.as_deref())?;
    setup_logging(
        if settings.debug {
            "debug"
        } else {
            DEFAULT_LOG_LEVEL
        },
        cli.json_logs,
    );

    let signer = PrivateKeySigner::from_str(&settings.wallet_key)
        .map_err(|e| AppError::Config(format!("Invalid wallet key: {}", e)))?;
    if let Some(expected) = settings.wallet_address_value()?
        && expected != signer.address()
    {
        return Err(AppError::Config(format!(
            "wallet_address {} does not match wallet_key address {}",
            expected,
            signer.address()
        )));
    }

    let rpc_url = settings.rpc_url_value()?;
    let provider = ConnectionFactory::connect(&rpc_url).await?;

    // Auto-detect the chain when not pinned; refuse a pinned chain the RPC
    // disagrees with.
    let onchain = provider
        .get_chain_id()
        .await
        .map_err(|e| AppError::Connection(format!("chain_id detect failed: {e}")))?;
    let chain_id = match settings.chain_id {
        Some(configured) => {
            if configured != onchain {
                return Err(AppError::Config(format!(
                    "Configured chain_id {configured} but RPC answers for chain {onchain}"
                )));
            }
            configured
        }
        None => {
            tracing::info!(
                target: "config",
                detected_chain = onchain,
                rpc = %rpc_url,
                "Auto-detected chain_id from RPC"
            );
            onchain
        }
    };

    let factory = settings.factory_address_for(chain_id)?;
    let router = settings.router_address_for(chain_id)?;
    let staking = settings.staking_address_value()?;

    let directory = TokenDirectory::new(provider.clone(), chain_id)
        .with_decimals_override(settings.token_in_address()?, settings.token_in_decimals)
        .with_decimals_override(settings.token_out_address()?, settings.token_out_decimals);
    let token_in = directory.describe(settings.token_in_address()?).await?;
    let token_out = directory.describe(settings.token_out_address()?).await?;

    let pool_id = cli.pool_id.or(settings.staking_pool_id).ok_or_else(|| {
        AppError::Config("Staking pool id required (--pool-id or STAKING_POOL_ID)".into())
    })?;

    let tuning = TxTuning {
        max_fee_cap_wei: settings.max_gas_price_wei(),
        receipt_poll_ms: settings.receipt_poll_ms_value(),
        receipt_timeout_ms: settings.receipt_timeout_ms_value(),
        receipt_confirm_blocks: settings.receipt_confirm_blocks_value(),
    };
    let gateway = EthereumGateway::new(provider, signer, chain_id, tuning);

    let plan = WorkflowPlan {
        factory,
        router,
        staking,
        token_in,
        token_out,
        fee_tier: settings.fee_tier_value(),
        deadline_secs: settings.swap_deadline_secs_value(),
        approve_gas_limit: settings.approve_gas_limit_value(),
        swap_gas_limit: settings.swap_gas_limit_value(),
        stake_gas_limit: settings.stake_gas_limit_value(),
    };

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(target: "workflow", "Ctrl-C received; stopping before the next step");
            ctrl_c_token.cancel();
        }
    });

    let runner = WorkflowRunner::new(gateway, plan, cancel);
    let result = runner
        .run(&cli.swap_amount, &cli.stake_amount, pool_id)
        .await;

    let report = serde_json::to_string_pretty(&result)
        .map_err(|e| AppError::Unknown(anyhow::anyhow!("Report serialization failed: {e}")))?;
    println!("{report}");

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
