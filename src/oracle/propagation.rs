//! Price propagation across the dependency graph.
//!
//! Setting a node's price triggers revaluation of every transitive
//! dependent, each visited at most once per propagation. The composite
//! valuation formula itself lives in the proxy price provider; this engine
//! only asks it for the refreshed value. A dependent whose revaluation
//! reverts is flagged for fallback and the walk continues — failure stays
//! local.

use std::collections::{HashSet, VecDeque};

use alloy_primitives::{Address, U256};
use tracing::warn;

use super::events::EventCtx;
use super::source::SourceGateway;
use super::store::OracleStore;

/// Set `price_in_eth` on the node and cascade to all dependents.
pub fn generic_price_update<G: SourceGateway>(
    store: &mut OracleStore,
    gateway: &G,
    asset: Address,
    price: U256,
    ctx: &EventCtx,
) {
    let node = store.asset_or_init(asset);
    node.price_in_eth = price;
    node.last_update_timestamp = ctx.timestamp;
    update_dependent_assets(store, gateway, asset, ctx);
}

/// Breadth-first walk of the back-edges starting at `root`. Terminates
/// because the dependency relation is acyclic and each node is visited
/// once; idempotent because every write is an overwrite.
fn update_dependent_assets<G: SourceGateway>(
    store: &mut OracleStore,
    gateway: &G,
    root: Address,
    ctx: &EventCtx,
) {
    let mut visited: HashSet<Address> = HashSet::from([root]);
    let mut queue: VecDeque<Address> = store
        .asset(root)
        .map(|a| a.dependent_assets.iter().copied().collect())
        .unwrap_or_default();

    while let Some(dep) = queue.pop_front() {
        if !visited.insert(dep) {
            continue;
        }
        let provider = store.price_oracle().proxy_price_provider;
        match gateway.get_asset_price(provider, dep) {
            Ok(value) => {
                let node = store.asset_or_init(dep);
                node.price_in_eth = value;
                node.last_update_timestamp = ctx.timestamp;
                queue.extend(node.dependent_assets.iter().copied());
            }
            Err(_) => {
                warn!(
                    "dependent revaluation reverted | asset={dep} provider={provider} root={root}"
                );
                // The walk keeps going: dependents further out are
                // revalued independently through the proxy provider.
                let node = store.asset_or_init(dep);
                node.is_fallback_required = true;
                queue.extend(node.dependent_assets.iter().copied());
                store.reconcile_fallback_membership(dep);
            }
        }
    }
}

/// Store a new USD/ETH rate and re-value every USD-dependent asset.
pub fn usd_eth_price_update<G: SourceGateway>(
    store: &mut OracleStore,
    gateway: &G,
    price: U256,
    ctx: &EventCtx,
) {
    let oracle = store.price_oracle_mut();
    oracle.usd_price_eth = price;
    oracle.last_updated_timestamp = ctx.timestamp;

    let usd_dependents: Vec<Address> =
        store.price_oracle().usd_dependent_assets.iter().copied().collect();
    for asset in usd_dependents {
        let provider = store.price_oracle().proxy_price_provider;
        match gateway.get_asset_price(provider, asset) {
            Ok(value) => generic_price_update(store, gateway, asset, value, ctx),
            Err(_) => {
                warn!("usd-dependent revaluation reverted | asset={asset} provider={provider}");
                store.asset_or_init(asset).is_fallback_required = true;
                store.reconcile_fallback_membership(asset);
            }
        }
    }
}

/// Convert a Chainlink-format ETH/USD answer (8 decimals) into a
/// WAD-scaled USD price in ETH. Zero-guarded: a zero answer yields zero
/// rather than dividing by it.
pub fn format_usd_eth_chainlink_price(price: U256) -> U256 {
    if price.is_zero() {
        return U256::ZERO;
    }
    // 1e18 * 1e8 = 1e26
    let scale = U256::from(10u8).pow(U256::from(26u8));
    scale / price
}
