//! Deterministic combat and progression rules for the crawler.
//!
//! `crawl-core` defines the canonical game rules (characters, items, magic,
//! combat) as pure APIs: every mutation flows through explicit operations
//! that take an injected [`rng::RngSource`] and [`config::BalanceConfig`],
//! so any frontend can drive a fight and any test can script one. Static
//! content (spell and monster tables, loot pools) is consumed through the
//! [`content::ContentOracle`] trait and lives in a separate crate.
pub mod character;
pub mod combat;
pub mod config;
pub mod content;
pub mod error;
pub mod items;
pub mod magic;
pub mod monster;
pub mod player;
pub mod rng;
pub mod stats;
pub mod summon;
pub mod view;

pub use character::Character;
pub use combat::{
    compute_damage, step, AttackMods, CombatAction, CombatActionError, CombatEvent, CombatOutcome,
    CombatState, TurnReport, VictoryRewards,
};
pub use config::BalanceConfig;
pub use content::ContentOracle;
pub use error::{ErrorSeverity, GameError};
pub use items::{
    Consumable, ConsumableEffect, ConsumableStack, Equipment, FragmentKey, Item, ItemSlot, Rarity,
};
pub use magic::{
    cast_explore_spell, on_floor_transition, CastError, ExploreOutcome, Spell, SpellId, SpellKind,
};
pub use monster::{scale_monster, EncounterKind, MonsterDef, MonsterKind, ScaledMonster};
pub use player::{
    ClassKind, ConsumableError, ConsumableUse, FragmentBuffs, InventoryError, Player, TempBuff,
    UpgradeError, UpgradeOutcome,
};
pub use rng::RngSource;
pub use stats::{ShrineEffect, SpecialKind, Specials};
pub use summon::{Summon, SummonKind};
pub use view::{run_encounter, ActionSource, CombatView};
