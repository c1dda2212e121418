//! Stat modifier engine.
//!
//! Two pieces live here:
//! - [`specials`]: the closed set of special modifier kinds and the
//!   accumulator that merges passive, floor and equipment sources into a
//!   single queryable value per kind.
//! - [`dynamic`]: shrine-granted percentage-of-current-value effects that
//!   stay consistent while the underlying base moves (level-ups, equip
//!   changes).

pub mod dynamic;
pub mod specials;

pub use dynamic::{ShrineEffect, ShrineEffectKind, StatAttribute};
pub use specials::{SpecialKind, Specials};
