//! Registration & classification of price sources.
//!
//! Two generations of registration protocol share these primitives:
//!
//! * `aggregator_source_updated` — the full legacy path. Authoritative
//!   before migration for both notification streams.
//! * `price_provider_updated` — the full current-protocol path, run for
//!   `PrimarySourceChanged` once the system has migrated.
//! * `register_simple_source` — simple-asset registration, shared by the
//!   current path and by the degraded post-migration legacy pass-through.

use alloy_primitives::{Address, U256};
use tracing::{info, warn};

use super::events::EventCtx;
use super::propagation::{format_usd_eth_chainlink_price, generic_price_update, usd_eth_price_update};
use super::source::{SourceGateway, TokenType};
use super::store::OracleStore;
use super::types::{AssetType, MOCK_USD_ADDRESS};

impl From<TokenType> for AssetType {
    fn from(t: TokenType) -> Self {
        match t {
            TokenType::Simple => AssetType::Simple,
            TokenType::Composite => AssetType::Composite,
        }
    }
}

/// Guard against one historically malformed on-chain submission: an asset
/// address whose fixed-width hex form carries an excessive run of zero
/// digits. Threshold preserved exactly; not a general validation rule.
pub fn is_malformed_asset_address(asset: Address) -> bool {
    let hex_form = format!("0x{}", hex::encode(asset));
    hex_form.bytes().filter(|b| *b == b'0').count() >= 38
}

/// Full current-protocol registration: classify, then register.
pub fn price_provider_updated<G: SourceGateway>(
    store: &mut OracleStore,
    gateway: &G,
    asset: Address,
    source: Address,
    ctx: &EventCtx,
) {
    let token_type = match gateway.get_token_type(source) {
        Ok(t) => t,
        Err(_) => {
            // Classification indeterminate: keep the previous type, change
            // nothing else.
            warn!("token type query reverted | source={source} asset={asset}");
            return;
        }
    };

    match token_type {
        TokenType::Simple => {
            store.asset_or_init(asset).asset_type = AssetType::Simple;
            register_simple_source(store, gateway, asset, source, ctx);
        }
        TokenType::Composite => {
            let node = store.asset_or_init(asset);
            node.asset_type = AssetType::Composite;
            // Composites resolve through their sub-tokens and never need
            // the fallback oracle, whatever the sub-token query says.
            node.is_fallback_required = false;
            node.price_source = source;
            node.last_update_timestamp = ctx.timestamp;
            wire_sub_tokens(store, gateway, asset, source);
            store.set_aggregator_ref(source, asset);
            store.reconcile_fallback_membership(asset);
        }
    }
}

/// Register a simple source: point the asset at the aggregator, take its
/// latest answer if one is available, and propagate. A reverted or zero
/// answer flags the asset for fallback and leaves the old price stale.
pub fn register_simple_source<G: SourceGateway>(
    store: &mut OracleStore,
    gateway: &G,
    asset: Address,
    aggregator: Address,
    ctx: &EventCtx,
) {
    {
        let node = store.asset_or_init(asset);
        node.price_source = aggregator;
        node.last_update_timestamp = ctx.timestamp;
    }

    match gateway.latest_answer(aggregator) {
        Ok(answer) if answer > U256::ZERO => {
            store.asset_or_init(asset).is_fallback_required = false;
            generic_price_update(store, gateway, asset, answer, ctx);
        }
        _ => {
            warn!("latest answer unavailable | aggregator={aggregator} asset={asset}");
            store.asset_or_init(asset).is_fallback_required = true;
        }
    }

    store.set_aggregator_ref(aggregator, asset);
    if asset != MOCK_USD_ADDRESS {
        store.reconcile_fallback_membership(asset);
    }
}

/// Full legacy-path registration, shared by both notification streams
/// before migration.
pub fn aggregator_source_updated<G: SourceGateway>(
    store: &mut OracleStore,
    gateway: &G,
    asset: Address,
    source: Address,
    ctx: &EventCtx,
) {
    // Needed because of one wrong source registration deployed on mainnet:
    // the proxy's view of the asset, zero if it reverts.
    let provider = store.price_oracle().proxy_price_provider;
    let price_from_proxy = gateway.get_asset_price(provider, asset).unwrap_or(U256::ZERO);

    store.asset_or_init(asset).is_fallback_required = true;

    if !source.is_zero() {
        match gateway.get_token_type(source) {
            Ok(t) => store.asset_or_init(asset).asset_type = t.into(),
            Err(_) => {
                warn!("token type query reverted | source={source} asset={asset}");
            }
        }

        if store.asset_or_init(asset).asset_type == AssetType::Simple {
            // Fallback not required while the aggregator answers sanely.
            let healthy = matches!(gateway.latest_answer(source), Ok(v) if v > U256::ZERO);
            store.asset_or_init(asset).is_fallback_required = !healthy;
        } else {
            store.asset_or_init(asset).is_fallback_required = false;
            wire_sub_tokens(store, gateway, asset, source);
        }

        store.set_aggregator_ref(source, asset);
    }

    store.asset_or_init(asset).price_source = source;

    if asset == MOCK_USD_ADDRESS {
        let fallback_required = store.asset_or_init(asset).is_fallback_required;
        let oracle = store.price_oracle_mut();
        oracle.usd_price_eth_fallback_required = fallback_required;
        oracle.usd_price_eth_main_source = source;
        let rate = format_usd_eth_chainlink_price(price_from_proxy);
        usd_eth_price_update(store, gateway, rate, ctx);
    } else {
        store.reconcile_fallback_membership(asset);
        generic_price_update(store, gateway, asset, price_from_proxy, ctx);
    }
}

/// Connect a composite asset to its sub-tokens: the USD pseudo-asset goes
/// into the singleton's USD-dependent set, everything else gets a
/// back-edge. Insert-if-absent throughout, so replays accumulate nothing.
/// A reverted sub-token query keeps whatever edges were known before.
fn wire_sub_tokens<G: SourceGateway>(
    store: &mut OracleStore,
    gateway: &G,
    asset: Address,
    source: Address,
) {
    let sub_tokens = match gateway.get_sub_tokens(source) {
        Ok(list) => list,
        Err(_) => {
            warn!("sub-token query reverted | source={source} asset={asset}");
            return;
        }
    };

    for sub in sub_tokens {
        if sub == MOCK_USD_ADDRESS {
            store.price_oracle_mut().usd_dependent_assets.insert(asset);
        } else {
            store.asset_or_init(sub).dependent_assets.insert(asset);
        }
    }
    info!("composite wired | asset={asset} source={source}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::source::FixtureGateway;
    use alloy_primitives::address;

    const PROVIDER: Address = address!("00000000000000000000000000000000000000f0");
    const ASSET: Address = address!("00000000000000000000000000000000000000a1");
    const SUB_A: Address = address!("00000000000000000000000000000000000000b1");
    const SUB_B: Address = address!("00000000000000000000000000000000000000b2");
    const AGG: Address = address!("00000000000000000000000000000000000000e1");

    fn ctx() -> EventCtx {
        EventCtx {
            emitter: PROVIDER,
            block_number: 5,
            timestamp: 500,
        }
    }

    fn store_with_provider() -> OracleStore {
        let mut store = OracleStore::new();
        store.price_oracle_mut().proxy_price_provider = PROVIDER;
        store
    }

    #[test]
    fn test_malformed_address_heuristic() {
        // zero address: 40 zero nibbles + the prefix zero
        assert!(is_malformed_asset_address(Address::ZERO));
        assert!(!is_malformed_asset_address(address!(
            "1111111111111111111111111111111111111111"
        )));
        // 37 zeros in total stays below the threshold
        assert!(!is_malformed_asset_address(address!(
            "1111000000000000000000000000000000000000"
        )));
        // exactly 38 (counting the prefix zero) already trips it
        assert!(is_malformed_asset_address(address!(
            "1110000000000000000000000000000000000000"
        )));
        assert!(is_malformed_asset_address(address!(
            "1100000000000000000000000000000000000000"
        )));
    }

    #[test]
    fn test_simple_registration_happy_path() {
        let mut store = store_with_provider();
        let mut gw = FixtureGateway::default();
        gw.latest_answers.insert(AGG, U256::from(1234));

        register_simple_source(&mut store, &gw, ASSET, AGG, &ctx());

        let node = store.asset(ASSET).unwrap();
        assert_eq!(node.price_source, AGG);
        assert_eq!(node.price_in_eth, U256::from(1234));
        assert!(!node.is_fallback_required);
        assert_eq!(store.aggregator_ref(AGG), Some(ASSET));
        assert!(!store.price_oracle().tokens_with_fallback.contains(&ASSET));
    }

    #[test]
    fn test_simple_registration_reverted_answer_flags_fallback() {
        let mut store = store_with_provider();
        store.asset_or_init(ASSET).price_in_eth = U256::from(77);
        let gw = FixtureGateway::default(); // answer reverts

        register_simple_source(&mut store, &gw, ASSET, AGG, &ctx());

        let node = store.asset(ASSET).unwrap();
        assert!(node.is_fallback_required);
        assert_eq!(node.price_in_eth, U256::from(77)); // stale, kept
        assert!(store.price_oracle().tokens_with_fallback.contains(&ASSET));
    }

    #[test]
    fn test_simple_registration_zero_answer_flags_fallback() {
        let mut store = store_with_provider();
        let mut gw = FixtureGateway::default();
        gw.latest_answers.insert(AGG, U256::ZERO);

        register_simple_source(&mut store, &gw, ASSET, AGG, &ctx());
        assert!(store.asset(ASSET).unwrap().is_fallback_required);
    }

    #[test]
    fn test_fallback_round_trip() {
        let mut store = store_with_provider();
        let mut gw = FixtureGateway::default();

        register_simple_source(&mut store, &gw, ASSET, AGG, &ctx());
        assert!(store.price_oracle().tokens_with_fallback.contains(&ASSET));

        // Re-registration with a healthy answer clears flag and membership.
        gw.latest_answers.insert(AGG, U256::from(9));
        register_simple_source(&mut store, &gw, ASSET, AGG, &ctx());
        let node = store.asset(ASSET).unwrap();
        assert!(!node.is_fallback_required);
        assert!(!store.price_oracle().tokens_with_fallback.contains(&ASSET));
    }

    #[test]
    fn test_composite_classification_wires_back_edges() {
        let mut store = store_with_provider();
        let mut gw = FixtureGateway::default();
        gw.token_types.insert(AGG, TokenType::Composite);
        gw.sub_tokens
            .insert(AGG, vec![SUB_A, SUB_B, MOCK_USD_ADDRESS]);

        price_provider_updated(&mut store, &gw, ASSET, AGG, &ctx());

        let node = store.asset(ASSET).unwrap();
        assert_eq!(node.asset_type, AssetType::Composite);
        assert!(!node.is_fallback_required);
        assert!(store.asset(SUB_A).unwrap().dependent_assets.contains(&ASSET));
        assert!(store.asset(SUB_B).unwrap().dependent_assets.contains(&ASSET));
        assert!(store.price_oracle().usd_dependent_assets.contains(&ASSET));

        // Replaying the same registration accumulates nothing.
        price_provider_updated(&mut store, &gw, ASSET, AGG, &ctx());
        assert_eq!(store.asset(SUB_A).unwrap().dependent_assets.len(), 1);
        assert_eq!(store.price_oracle().usd_dependent_assets.len(), 1);
    }

    #[test]
    fn test_composite_never_fallback_even_if_sub_token_query_reverts() {
        let mut store = store_with_provider();
        store.asset_or_init(ASSET).is_fallback_required = true;
        let mut gw = FixtureGateway::default();
        gw.token_types.insert(AGG, TokenType::Composite);
        // no sub_tokens entry → query reverts

        price_provider_updated(&mut store, &gw, ASSET, AGG, &ctx());
        assert!(!store.asset(ASSET).unwrap().is_fallback_required);
    }

    #[test]
    fn test_classification_failure_keeps_previous_type() {
        let mut store = store_with_provider();
        store.asset_or_init(ASSET).asset_type = AssetType::Composite;
        let gw = FixtureGateway::default(); // type query reverts

        price_provider_updated(&mut store, &gw, ASSET, AGG, &ctx());

        let node = store.asset(ASSET).unwrap();
        assert_eq!(node.asset_type, AssetType::Composite);
        // nothing else moved
        assert_eq!(node.price_source, Address::ZERO);
        assert_eq!(store.aggregator_ref(AGG), None);
    }

    #[test]
    fn test_legacy_path_simple_with_healthy_aggregator() {
        let mut store = store_with_provider();
        let mut gw = FixtureGateway::default();
        gw.asset_prices.insert(ASSET, U256::from(42));
        gw.token_types.insert(AGG, TokenType::Simple);
        gw.latest_answers.insert(AGG, U256::from(41));

        aggregator_source_updated(&mut store, &gw, ASSET, AGG, &ctx());

        let node = store.asset(ASSET).unwrap();
        assert_eq!(node.price_source, AGG);
        // the legacy path prices from the proxy provider, not the aggregator
        assert_eq!(node.price_in_eth, U256::from(42));
        assert!(!node.is_fallback_required);
        assert_eq!(store.aggregator_ref(AGG), Some(ASSET));
    }

    #[test]
    fn test_legacy_path_zero_source_needs_fallback() {
        let mut store = store_with_provider();
        let mut gw = FixtureGateway::default();
        gw.asset_prices.insert(ASSET, U256::from(42));

        aggregator_source_updated(&mut store, &gw, ASSET, Address::ZERO, &ctx());

        let node = store.asset(ASSET).unwrap();
        assert!(node.is_fallback_required);
        assert_eq!(node.price_source, Address::ZERO);
        assert!(store.price_oracle().tokens_with_fallback.contains(&ASSET));
    }

    #[test]
    fn test_legacy_path_usd_asset_updates_global_rate() {
        let mut store = store_with_provider();
        let mut gw = FixtureGateway::default();
        // proxy reports the Chainlink-format ETH/USD answer for the pseudo-asset
        let answer = U256::from(4000u64) * U256::from(100_000_000u64);
        gw.asset_prices.insert(MOCK_USD_ADDRESS, answer);
        gw.token_types.insert(AGG, TokenType::Simple);
        gw.latest_answers.insert(AGG, U256::from(1));

        aggregator_source_updated(&mut store, &gw, MOCK_USD_ADDRESS, AGG, &ctx());

        let oracle = store.price_oracle();
        assert_eq!(oracle.usd_price_eth_main_source, AGG);
        assert!(!oracle.usd_price_eth_fallback_required);
        assert_eq!(oracle.usd_price_eth, U256::from(250_000_000_000_000u64));
        // the pseudo-asset never enters the fallback set
        assert!(!oracle.tokens_with_fallback.contains(&MOCK_USD_ADDRESS));
    }
}
