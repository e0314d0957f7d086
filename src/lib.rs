//! siteaudit - content audit analytics backend.
//!
//! Loads a tabular content-audit dataset from a spreadsheet-hosted
//! source, caches it behind a long TTL, applies session-scoped filters
//! through a commit-invalidated light cache, and serves metrics, chart
//! tables, and exports over a JSON API and CLI.

pub mod cache;
pub mod cli;
pub mod config;
pub mod export;
pub mod filter;
pub mod models;
pub mod server;
pub mod session;
pub mod sheets;
pub mod stats;
