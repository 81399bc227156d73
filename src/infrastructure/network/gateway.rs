// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! Signing JSON-RPC gateway behind the [`ChainGateway`] seam.
//!
//! Read paths (factory lookup, pool metadata, balances) retry transient
//! transport errors. The write path signs locally, broadcasts exactly once,
//! and polls for the receipt up to a bounded timeout.

use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::domain::gateway::{ChainGateway, PoolRecord, ReceiptOutcome};
use crate::infrastructure::data::contracts::{ERC20, UniV3Factory, UniV3Pool};
use crate::network::gas::{GasFees, GasOracle};
use crate::network::nonce::NonceManager;
use crate::network::provider::HttpProvider;
use alloy::consensus::{SignableTransaction, TxEip1559};
use alloy::eips::eip2718::Encodable2718;
use alloy::eips::eip2930::AccessList;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256, TxKind, U256, aliases::U24};
use alloy::providers::Provider;
use alloy::signers::local::PrivateKeySigner;
use alloy_consensus::TxEnvelope;
use async_trait::async_trait;
use std::time::Duration;

const READ_RETRY_ATTEMPTS: usize = 3;
const READ_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Write-path knobs. The config layer floors these before they get here.
#[derive(Debug, Clone, Copy)]
pub struct TxTuning {
    /// Refuse to broadcast when the fee estimate exceeds this (wei/gas).
    /// Zero disables the cap.
    pub max_fee_cap_wei: u128,
    pub receipt_poll_ms: u64,
    pub receipt_timeout_ms: u64,
    pub receipt_confirm_blocks: u64,
}

pub struct EthereumGateway {
    provider: HttpProvider,
    signer: PrivateKeySigner,
    chain_id: u64,
    nonces: NonceManager,
    gas: GasOracle,
    tuning: TxTuning,
}

impl EthereumGateway {
    pub fn new(
        provider: HttpProvider,
        signer: PrivateKeySigner,
        chain_id: u64,
        tuning: TxTuning,
    ) -> Self {
        let nonces = NonceManager::new(provider.clone(), signer.address());
        let gas = GasOracle::new(provider.clone());
        Self {
            provider,
            signer,
            chain_id,
            nonces,
            gas,
            tuning,
        }
    }

    fn sign_eip1559(
        &self,
        nonce: u64,
        to: Address,
        gas_limit: u64,
        fees: &GasFees,
        calldata: Vec<u8>,
    ) -> Result<(Vec<u8>, B256), AppError> {
        let mut tx = TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            max_fee_per_gas: fees.max_fee_per_gas,
            gas_limit,
            to: TxKind::Call(to),
            value: U256::ZERO,
            access_list: AccessList::default(),
            input: calldata.into(),
        };

        let sig = TxSignerSync::sign_transaction_sync(&self.signer, &mut tx)
            .map_err(|e| AppError::Unknown(anyhow::anyhow!("Sign tx failed: {}", e)))?;
        let signed: TxEnvelope = tx.into_signed(sig).into();
        let raw = signed.encoded_2718();
        Ok((raw, *signed.tx_hash()))
    }

    fn fee_exceeds_cap(max_fee_per_gas: u128, cap_wei: u128) -> bool {
        cap_wei > 0 && max_fee_per_gas > cap_wei
    }

    fn receipt_is_confirmed(current_head: u64, receipt_block: u64, confirm_blocks: u64) -> bool {
        let needed_head = receipt_block.saturating_add(confirm_blocks.saturating_sub(1));
        current_head >= needed_head
    }
}

#[async_trait]
impl ChainGateway for EthereumGateway {
    fn sender(&self) -> Address {
        self.signer.address()
    }

    async fn pool_for(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> Result<Address, AppError> {
        // The factory takes a uint24 tier; anything wider cannot name a pool.
        let fee = U24::try_from(fee)
            .map_err(|_| AppError::Config(format!("Fee tier {fee} does not fit uint24")))?;
        let contract = UniV3Factory::new(factory, self.provider.clone());
        let pool: Address = retry_async(
            move |_| {
                let c = contract.clone();
                async move { c.getPool(token_a, token_b, fee).call().await }
            },
            READ_RETRY_ATTEMPTS,
            READ_RETRY_DELAY,
        )
        .await
        .map_err(|e| AppError::Connection(format!("getPool lookup failed: {}", e)))?;
        Ok(pool)
    }

    async fn pool_record(&self, pool: Address) -> Result<PoolRecord, AppError> {
        let contract = UniV3Pool::new(pool, self.provider.clone());
        let contract_for_token0 = contract.clone();
        let contract_for_token1 = contract.clone();
        let contract_for_fee = contract;

        let token0: Address = retry_async(
            move |_| {
                let c = contract_for_token0.clone();
                async move { c.token0().call().await }
            },
            READ_RETRY_ATTEMPTS,
            READ_RETRY_DELAY,
        )
        .await
        .map_err(|e| AppError::Connection(format!("token0() read failed: {}", e)))?;

        let token1: Address = retry_async(
            move |_| {
                let c = contract_for_token1.clone();
                async move { c.token1().call().await }
            },
            READ_RETRY_ATTEMPTS,
            READ_RETRY_DELAY,
        )
        .await
        .map_err(|e| AppError::Connection(format!("token1() read failed: {}", e)))?;

        let fee = retry_async(
            move |_| {
                let c = contract_for_fee.clone();
                async move { c.fee().call().await }
            },
            READ_RETRY_ATTEMPTS,
            READ_RETRY_DELAY,
        )
        .await
        .map_err(|e| AppError::Connection(format!("fee() read failed: {}", e)))?;

        Ok(PoolRecord {
            token0,
            token1,
            fee: fee.to::<u32>(),
        })
    }

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256, AppError> {
        let contract = ERC20::new(token, self.provider.clone());
        let balance: U256 = retry_async(
            move |_| {
                let c = contract.clone();
                async move { c.balanceOf(owner).call().await }
            },
            READ_RETRY_ATTEMPTS,
            READ_RETRY_DELAY,
        )
        .await
        .map_err(|e| AppError::Connection(format!("balanceOf read failed: {}", e)))?;
        Ok(balance)
    }

    async fn submit(
        &self,
        to: Address,
        calldata: Vec<u8>,
        gas_limit: u64,
    ) -> Result<B256, AppError> {
        let fees = self.gas.estimate_eip1559_fees().await?;
        if Self::fee_exceeds_cap(fees.max_fee_per_gas, self.tuning.max_fee_cap_wei) {
            return Err(AppError::Unknown(anyhow::anyhow!(
                "Estimated max fee {} wei/gas exceeds the configured cap {} wei/gas; transaction withheld",
                fees.max_fee_per_gas,
                self.tuning.max_fee_cap_wei
            )));
        }

        let nonce = self.nonces.next_nonce().await?;
        let (raw, hash) = self.sign_eip1559(nonce, to, gas_limit, &fees, calldata)?;

        match self.provider.send_raw_transaction(raw.as_slice()).await {
            Ok(_) => {}
            Err(e) => return Err(AppError::Connection(format!("Tx send failed: {}", e))),
        }

        tracing::info!(
            target: "gateway",
            hash = %format!("{:#x}", hash),
            to = %to,
            nonce,
            gas_limit,
            max_fee_per_gas = fees.max_fee_per_gas,
            "Transaction submitted"
        );
        Ok(hash)
    }

    async fn await_receipt(&self, hash: B256) -> Result<ReceiptOutcome, AppError> {
        let timeout = Duration::from_millis(self.tuning.receipt_timeout_ms.max(1));
        let poll = Duration::from_millis(self.tuning.receipt_poll_ms.max(1));
        let started = std::time::Instant::now();

        loop {
            if started.elapsed() >= timeout {
                break;
            }

            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(rcpt)) => {
                    if !rcpt.status() {
                        return Ok(ReceiptOutcome::Reverted);
                    }

                    if let Some(receipt_block) = rcpt.block_number {
                        let current_head = self.provider.get_block_number().await.unwrap_or(0);
                        if Self::receipt_is_confirmed(
                            current_head.max(receipt_block),
                            receipt_block,
                            self.tuning.receipt_confirm_blocks.max(1),
                        ) {
                            return Ok(ReceiptOutcome::Confirmed);
                        }
                    } else {
                        return Ok(ReceiptOutcome::Confirmed);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        target: "gateway",
                        error = %e,
                        hash = %format!("{:#x}", hash),
                        "Receipt lookup error; retrying"
                    );
                }
            }

            tokio::time::sleep(poll).await;
        }

        Ok(ReceiptOutcome::TimedOut {
            waited_ms: started.elapsed().as_millis() as u64,
        })
    }
}
