//! In-memory entity store with load-or-initialize semantics.
//!
//! Stands in for the external persistence layer: read-your-writes within a
//! notification, no partial commit visible across notifications (the engine
//! processes strictly sequentially). Relations are true sets — membership
//! is insert-if-absent / remove-if-present, never ordered.

use std::collections::HashMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use super::types::{BaseAsset, MigrationState, PriceOracle, PriceOracleAsset};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OracleStore {
    price_oracle: PriceOracle,
    assets: HashMap<Address, PriceOracleAsset>,
    /// Aggregator address → the single asset it currently backs.
    aggregator_refs: HashMap<Address, Address>,
    migration: MigrationState,
    base_asset: Option<BaseAsset>,
}

impl OracleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn price_oracle(&self) -> &PriceOracle {
        &self.price_oracle
    }

    pub fn price_oracle_mut(&mut self) -> &mut PriceOracle {
        &mut self.price_oracle
    }

    pub fn asset(&self, id: Address) -> Option<&PriceOracleAsset> {
        self.assets.get(&id)
    }

    /// Load the node, creating it with defaults on first reference.
    pub fn asset_or_init(&mut self, id: Address) -> &mut PriceOracleAsset {
        self.assets.entry(id).or_default()
    }

    pub fn assets(&self) -> impl Iterator<Item = (&Address, &PriceOracleAsset)> {
        self.assets.iter()
    }

    pub fn aggregator_ref(&self, aggregator: Address) -> Option<Address> {
        self.aggregator_refs.get(&aggregator).copied()
    }

    /// 1 aggregator : 1 asset at any time; re-registration overwrites.
    pub fn set_aggregator_ref(&mut self, aggregator: Address, asset: Address) {
        self.aggregator_refs.insert(aggregator, asset);
    }

    pub fn migration(&self) -> MigrationState {
        self.migration
    }

    pub fn migration_mut(&mut self) -> &mut MigrationState {
        &mut self.migration
    }

    pub fn base_asset(&self) -> Option<&BaseAsset> {
        self.base_asset.as_ref()
    }

    pub fn set_base_asset(&mut self, base: BaseAsset) {
        self.base_asset = Some(base);
    }

    /// Re-derive an asset's `tokens_with_fallback` membership from its node
    /// state, keeping the singleton's invariant: member iff the fallback
    /// flag is set or the price source is unset.
    pub fn reconcile_fallback_membership(&mut self, id: Address) {
        let needs = self
            .assets
            .get(&id)
            .map(|a| a.is_fallback_required || a.price_source.is_zero())
            .unwrap_or(false);
        if needs {
            self.price_oracle.tokens_with_fallback.insert(id);
        } else {
            self.price_oracle.tokens_with_fallback.remove(&id);
        }
    }
}
