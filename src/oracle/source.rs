//! Outbound queries to on-chain price sources.
//!
//! Every call is synchronous and independently fallible: a source either
//! answers or the call reverts. `Reverted` is always recoverable locally —
//! handlers degrade state (stale value, fallback flag) instead of aborting.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An external contract call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("call reverted")]
pub struct Reverted;

pub type CallResult<T> = Result<T, Reverted>;

/// Token type reported by an extended price aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Simple,
    Composite,
}

/// The full outbound query surface of the indexer.
pub trait SourceGateway {
    /// Current price of `asset` as seen by the given price provider
    /// (proxy provider or fallback oracle).
    fn get_asset_price(&self, provider: Address, asset: Address) -> CallResult<U256>;

    /// Classify a candidate source.
    fn get_token_type(&self, source: Address) -> CallResult<TokenType>;

    /// Sub-token list of a composite source.
    fn get_sub_tokens(&self, source: Address) -> CallResult<Vec<Address>>;

    /// Latest answer of a simple aggregator.
    fn latest_answer(&self, source: Address) -> CallResult<U256>;

    /// Dev-network USD/ETH accessor on a fallback oracle. Mainnet-style
    /// oracles revert here; callers then probe `get_asset_price` with the
    /// mock USD address instead.
    fn get_eth_usd_price(&self, oracle: Address) -> CallResult<U256>;
}

/// Table-driven gateway: a missing entry reverts.
///
/// Loadable from JSON for the replay binary; tests program it directly.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FixtureGateway {
    /// Asset → price, independent of which provider is asked.
    #[serde(default)]
    pub asset_prices: HashMap<Address, U256>,
    #[serde(default)]
    pub token_types: HashMap<Address, TokenType>,
    #[serde(default)]
    pub sub_tokens: HashMap<Address, Vec<Address>>,
    #[serde(default)]
    pub latest_answers: HashMap<Address, U256>,
    #[serde(default)]
    pub eth_usd_price: Option<U256>,
}

impl SourceGateway for FixtureGateway {
    fn get_asset_price(&self, _provider: Address, asset: Address) -> CallResult<U256> {
        self.asset_prices.get(&asset).copied().ok_or(Reverted)
    }

    fn get_token_type(&self, source: Address) -> CallResult<TokenType> {
        self.token_types.get(&source).copied().ok_or(Reverted)
    }

    fn get_sub_tokens(&self, source: Address) -> CallResult<Vec<Address>> {
        self.sub_tokens.get(&source).cloned().ok_or(Reverted)
    }

    fn latest_answer(&self, source: Address) -> CallResult<U256> {
        self.latest_answers.get(&source).copied().ok_or(Reverted)
    }

    fn get_eth_usd_price(&self, _oracle: Address) -> CallResult<U256> {
        self.eth_usd_price.ok_or(Reverted)
    }
}
