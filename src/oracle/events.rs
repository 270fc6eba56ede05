//! Inbound notification types.
//!
//! The delivery mechanism (out of scope here) guarantees a strictly
//! block-ordered, at-least-once, replayable stream. Every handler must
//! therefore be idempotent: re-applying an event with the same external
//! query outcomes reaches the same state.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Chain context attached to every notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCtx {
    /// Contract that emitted the event.
    pub emitter: Address,
    pub block_number: u64,
    pub timestamp: u64,
}

/// Domain notifications, in the order the chain produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OracleEvent {
    /// The global fallback oracle was replaced.
    FallbackSourceChanged { fallback: Address, ctx: EventCtx },
    /// Current-protocol source registration for an asset.
    PrimarySourceChanged {
        asset: Address,
        source: Address,
        ctx: EventCtx,
    },
    /// Legacy sources-registry registration for an asset.
    AggregatorRegistered {
        asset: Address,
        aggregator: Address,
        ctx: EventCtx,
    },
    /// Establishes the reference asset (wrapped native currency).
    BaseAssetRegistered { base_asset: Address, ctx: EventCtx },
    /// One-way cutover to the current registration protocol.
    SystemMigrated { ctx: EventCtx },
}

impl OracleEvent {
    pub fn ctx(&self) -> &EventCtx {
        match self {
            OracleEvent::FallbackSourceChanged { ctx, .. }
            | OracleEvent::PrimarySourceChanged { ctx, .. }
            | OracleEvent::AggregatorRegistered { ctx, .. }
            | OracleEvent::BaseAssetRegistered { ctx, .. }
            | OracleEvent::SystemMigrated { ctx } => ctx,
        }
    }
}
