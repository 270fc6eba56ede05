// ─── Derived oracle view: graph store + ingestion engine ───
pub mod engine;
pub mod events;
pub mod fallback;
pub mod propagation;
pub mod registration;
pub mod source;
pub mod store;
pub mod types;
