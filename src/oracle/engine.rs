//! Sequential indexer actor.
//!
//! One consumer drains the notification channel in block order; each
//! notification is handled synchronously end-to-end, so the store never
//! sees a half-applied notification. `apply` is the whole dispatch table —
//! including the migration gate that decides which registration protocol
//! is authoritative — and is callable directly from tests without the
//! channel plumbing.

use alloy_primitives::Address;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::events::{EventCtx, OracleEvent};
use super::fallback;
use super::registration;
use super::source::SourceGateway;
use super::store::OracleStore;
use super::types::BaseAsset;

// ─────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────

/// Deployment-specific knobs. Everything else is protocol constants.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Metadata recorded for the reference asset on `BaseAssetRegistered`.
    pub base_asset_name: String,
    pub base_asset_symbol: String,
    pub base_asset_decimals: u8,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            base_asset_name: "WEthereum".to_string(),
            base_asset_symbol: "WETH".to_string(),
            base_asset_decimals: 18,
        }
    }
}

impl IndexerConfig {
    /// Load overrides from environment variables (if set).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("ORACLE_BASE_ASSET_NAME") {
            cfg.base_asset_name = v;
        }
        if let Ok(v) = std::env::var("ORACLE_BASE_ASSET_SYMBOL") {
            cfg.base_asset_symbol = v;
        }
        if let Ok(v) = std::env::var("ORACLE_BASE_ASSET_DECIMALS") {
            if let Ok(d) = v.parse::<u8>() {
                cfg.base_asset_decimals = d;
            }
        }
        cfg
    }
}

#[derive(Debug, Default)]
struct Stats {
    events: u64,
    dropped_malformed: u64,
    legacy_full: u64,
    legacy_passthrough: u64,
    current_full: u64,
    deferred_claimed: u64,
    fallback_changes: u64,
}

// ─────────────────────────────────────────────────────────
// Actor
// ─────────────────────────────────────────────────────────

pub struct OracleIndexer<G: SourceGateway> {
    cfg: IndexerConfig,
    store: OracleStore,
    gateway: G,
    stats: Stats,
}

impl<G: SourceGateway> OracleIndexer<G> {
    pub fn new(cfg: IndexerConfig, gateway: G) -> Self {
        Self::with_store(cfg, gateway, OracleStore::new())
    }

    /// Resume over previously persisted state.
    pub fn with_store(cfg: IndexerConfig, gateway: G, store: OracleStore) -> Self {
        Self {
            cfg,
            store,
            gateway,
            stats: Stats::default(),
        }
    }

    pub fn store(&self) -> &OracleStore {
        &self.store
    }

    pub fn into_store(self) -> OracleStore {
        self.store
    }

    /// Actor main loop. Runs until the notification channel is closed and
    /// hands back the final state.
    pub async fn run(mut self, mut rx: mpsc::Receiver<OracleEvent>) -> OracleStore {
        info!(
            "oracle indexer started | base_asset={} migrated={}",
            self.cfg.base_asset_symbol,
            self.store.migration().activated,
        );

        while let Some(event) = rx.recv().await {
            self.apply(&event);
        }

        info!(
            "oracle indexer shutdown | events={} dropped={} legacy(full={} passthrough={}) current={} deferred={} fallback={}",
            self.stats.events, self.stats.dropped_malformed,
            self.stats.legacy_full, self.stats.legacy_passthrough,
            self.stats.current_full, self.stats.deferred_claimed,
            self.stats.fallback_changes,
        );
        self.store
    }

    /// Synchronous dispatch of one notification.
    pub fn apply(&mut self, event: &OracleEvent) {
        self.stats.events += 1;
        match *event {
            OracleEvent::FallbackSourceChanged { fallback, ref ctx } => {
                self.stats.fallback_changes += 1;
                fallback::fallback_source_changed(&mut self.store, &self.gateway, fallback, ctx);
            }
            OracleEvent::PrimarySourceChanged {
                asset,
                source,
                ref ctx,
            } => self.on_primary_source_changed(asset, source, ctx),
            OracleEvent::AggregatorRegistered {
                asset,
                aggregator,
                ref ctx,
            } => self.on_aggregator_registered(asset, aggregator, ctx),
            OracleEvent::BaseAssetRegistered {
                base_asset,
                ref ctx,
            } => self.on_base_asset_registered(base_asset, ctx),
            OracleEvent::SystemMigrated { .. } => self.on_system_migrated(),
        }
    }

    /// Current-protocol notification. Authoritative after migration;
    /// before it, routed through the legacy path unless the legacy
    /// registry already claimed the asset.
    fn on_primary_source_changed(&mut self, asset: Address, source: Address, ctx: &EventCtx) {
        if registration::is_malformed_asset_address(asset) {
            warn!("skipping malformed asset registration | asset={asset}");
            self.stats.dropped_malformed += 1;
            return;
        }

        if self.store.price_oracle().proxy_price_provider.is_zero() {
            self.store.price_oracle_mut().proxy_price_provider = ctx.emitter;
        }

        if self.store.migration().activated {
            self.stats.current_full += 1;
            registration::price_provider_updated(&mut self.store, &self.gateway, asset, source, ctx);
        } else if !self
            .store
            .asset_or_init(asset)
            .from_chainlink_sources_registry
        {
            self.stats.legacy_full += 1;
            registration::aggregator_source_updated(
                &mut self.store,
                &self.gateway,
                asset,
                source,
                ctx,
            );
        } else {
            self.stats.deferred_claimed += 1;
        }
    }

    /// Legacy-registry notification. Full registration before migration;
    /// afterwards a pass-through that only refreshes source, value and the
    /// aggregator reference — the dependency graph is the current
    /// protocol's business by then.
    fn on_aggregator_registered(&mut self, asset: Address, aggregator: Address, ctx: &EventCtx) {
        self.store.asset_or_init(asset).from_chainlink_sources_registry = true;

        if self.store.migration().activated {
            self.stats.legacy_passthrough += 1;
            registration::register_simple_source(
                &mut self.store,
                &self.gateway,
                asset,
                aggregator,
                ctx,
            );
        } else {
            self.stats.legacy_full += 1;
            registration::aggregator_source_updated(
                &mut self.store,
                &self.gateway,
                asset,
                aggregator,
                ctx,
            );
        }
    }

    fn on_base_asset_registered(&mut self, base_asset: Address, ctx: &EventCtx) {
        self.store.set_base_asset(BaseAsset {
            address: base_asset,
            name: self.cfg.base_asset_name.clone(),
            symbol: self.cfg.base_asset_symbol.clone(),
            decimals: self.cfg.base_asset_decimals,
            updated_timestamp: ctx.timestamp,
            updated_block_number: ctx.block_number,
        });
        info!("base asset registered | address={base_asset}");
    }

    fn on_system_migrated(&mut self) {
        let migration = self.store.migration_mut();
        if migration.activated {
            warn!("migration notification replayed; flag already set");
            return;
        }
        migration.activated = true;
        info!("oracle system migrated: current protocol now authoritative");
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────
