//! Purpose: Shared library crate behind the `rdfstore` CLI and tests.
//! Exports: `core` (nodes, statements, streams, backends, storage handles, errors).
//! Exports: `query` (driver contract, classification, query context, graph rows).
//! Exports: `backends` (bundled in-memory backends), `api` (stable re-exports).
//! Invariants: No hidden global state; registries and pools are explicit values.
pub mod api;
pub mod backends;
pub mod core;
pub mod query;
