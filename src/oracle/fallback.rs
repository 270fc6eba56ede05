//! Fallback failover controller.
//!
//! An asset is either DIRECT (its primary source answers) or FALLBACK
//! (source unset, or its answers revert / come back non-positive); the
//! flag and `tokens_with_fallback` membership carry that state. When the
//! global fallback oracle changes, every asset currently in fallback gets
//! one refresh attempt through the proxy provider — no retries here, the
//! next relevant notification retries naturally.

use alloy_primitives::{Address, U256};
use tracing::{error, info, warn};

use super::events::EventCtx;
use super::propagation::{format_usd_eth_chainlink_price, generic_price_update, usd_eth_price_update};
use super::source::SourceGateway;
use super::store::OracleStore;
use super::types::MOCK_USD_ADDRESS;

/// Handle a `FallbackSourceChanged` notification.
pub fn fallback_source_changed<G: SourceGateway>(
    store: &mut OracleStore,
    gateway: &G,
    fallback: Address,
    ctx: &EventCtx,
) {
    store.price_oracle_mut().fallback_price_oracle = fallback;
    if fallback.is_zero() {
        return;
    }
    info!("fallback oracle updated | fallback={fallback}");

    refresh_fallback_assets(store, gateway, fallback, ctx);

    // Global USD/ETH rate: dev-network accessor first, then the mainnet
    // probe against the reserved mock USD address.
    let eth_usd = match gateway.get_eth_usd_price(fallback) {
        Ok(v) => Some(v),
        Err(_) => match gateway.get_asset_price(fallback, MOCK_USD_ADDRESS) {
            Ok(answer) => Some(format_usd_eth_chainlink_price(answer)),
            Err(_) => {
                warn!("usd/eth probe reverted on both accessors | fallback={fallback}");
                None
            }
        },
    };

    if let Some(rate) = eth_usd {
        let oracle = store.price_oracle();
        if oracle.usd_price_eth_fallback_required || oracle.usd_price_eth_main_source.is_zero() {
            usd_eth_price_update(store, gateway, rate, ctx);
        }
    }
}

/// One refresh attempt per asset currently relying on the fallback path,
/// queried through the oracle that sent the notification (it may predate
/// any recorded proxy provider). Success propagates the fresh value;
/// failure logs and leaves it stale.
fn refresh_fallback_assets<G: SourceGateway>(
    store: &mut OracleStore,
    gateway: &G,
    fallback: Address,
    ctx: &EventCtx,
) {
    let members: Vec<Address> = store
        .price_oracle()
        .tokens_with_fallback
        .iter()
        .copied()
        .collect();

    for token in members {
        let needs_refresh = store
            .asset(token)
            .map(|a| a.price_source.is_zero() || a.is_fallback_required)
            .unwrap_or(false);
        if !needs_refresh {
            continue;
        }
        let provider = ctx.emitter;
        match gateway.get_asset_price(provider, token) {
            Ok(price) => generic_price_update(store, gateway, token, price, ctx),
            Err(_) => {
                error!(
                    "fallback refresh reverted | asset={token} provider={provider} fallback={fallback}"
                );
            }
        }
    }
}
