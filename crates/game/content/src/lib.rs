//! Static game content for the crawler.
//!
//! This crate houses the shipped data tables (items, consumables, spells,
//! monsters) and implements `crawl-core`'s [`ContentOracle`] seam on top of
//! them. Content never appears in game state; the engine only ever sees
//! values handed out through the oracle.

pub mod oracle;
pub mod tables;

pub use crawl_core::content::ContentOracle;
pub use oracle::StaticContent;
