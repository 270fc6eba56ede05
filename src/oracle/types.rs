//! Persisted entities of the oracle view.
//!
//! These are the queryable output of the indexer: one `PriceOracle`
//! singleton, one `PriceOracleAsset` per tracked asset, the aggregator
//! reference table and the migration flag. Nodes are created lazily and
//! never deleted; every mutation is an overwrite.

use std::collections::HashSet;

use alloy_primitives::{address, Address, U256};
use serde::{Deserialize, Serialize};

/// Reserved pseudo-asset marking "priced against USD" in sub-token lists,
/// and the mock address probed on legacy fallback oracles for the USD rate.
pub const MOCK_USD_ADDRESS: Address = address!("4d6e79013212f10a026a1fb0b926c9fd0432b96c");

/// How an asset derives its ETH price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssetType {
    /// Priced directly from one aggregator's latest answer.
    #[default]
    Simple,
    /// Priced as a function of sub-token assets; never needs fallback.
    Composite,
}

/// Singleton describing the oracle deployment as a whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceOracle {
    pub proxy_price_provider: Address,
    pub fallback_price_oracle: Address,
    pub usd_price_eth_main_source: Address,
    /// Last known USD/ETH rate, WAD-scaled.
    pub usd_price_eth: U256,
    pub usd_price_eth_fallback_required: bool,
    /// Composite assets whose sub-token list names the USD pseudo-asset.
    pub usd_dependent_assets: HashSet<Address>,
    /// Assets currently relying on the fallback oracle: exactly those with
    /// `is_fallback_required` set or a zero `price_source`.
    pub tokens_with_fallback: HashSet<Address>,
    pub last_updated_timestamp: u64,
}

/// Per-asset node of the dependency graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceOracleAsset {
    pub asset_type: AssetType,
    /// Aggregator currently backing this asset; zero means none.
    pub price_source: Address,
    /// Last known value, WAD-scaled. Stale values are kept on failure.
    pub price_in_eth: U256,
    pub is_fallback_required: bool,
    /// Back-edges: composite assets whose sub-token list contains this one.
    pub dependent_assets: HashSet<Address>,
    /// Provenance: claimed by the legacy sources registry.
    pub from_chainlink_sources_registry: bool,
    pub last_update_timestamp: u64,
}

/// One-way switch selecting which registration protocol is authoritative.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MigrationState {
    pub activated: bool,
}

/// Metadata of the reference asset (wrapped native currency).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseAsset {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub updated_timestamp: u64,
    pub updated_block_number: u64,
}
