//! Derived, queryable view of a decentralized price-oracle network.
//!
//! Ingests a block-ordered stream of registration notifications, maintains
//! the asset dependency graph with fallback failover, and exposes the
//! resulting entities as the queryable output. Prices are scaled integers:
//! WAD for values, RAY for rates.

pub mod incentives;
pub mod oracle;
pub mod wadray;

pub use oracle::engine::{IndexerConfig, OracleIndexer};
pub use oracle::events::{EventCtx, OracleEvent};
pub use oracle::source::{FixtureGateway, Reverted, SourceGateway, TokenType};
pub use oracle::store::OracleStore;
pub use oracle::types::{AssetType, PriceOracle, PriceOracleAsset, MOCK_USD_ADDRESS};
