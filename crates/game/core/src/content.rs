//! Content access seam.
//!
//! The engine never owns item, spell or monster tables; it asks a
//! [`ContentOracle`] for them. The content crate implements this against
//! static tables, tests plug in stubs.

use crate::items::{Consumable, Item};
use crate::magic::{Spell, SpellId};
use crate::monster::{MonsterDef, MonsterKind};
use crate::rng::RngSource;

/// Supplies static content and depth-aware random rolls.
pub trait ContentOracle {
    /// Static data for a spell.
    fn spell(&self, id: SpellId) -> &Spell;

    /// Base definition for a monster species.
    fn monster_def(&self, kind: MonsterKind) -> &MonsterDef;

    /// Rolls an equipment drop for the given depth.
    fn roll_item(&self, depth: u32, rng: &mut dyn RngSource) -> Item;

    /// Rolls a consumable drop for the given depth.
    fn roll_consumable(&self, depth: u32, rng: &mut dyn RngSource) -> Consumable;

    /// Rolls a spell scroll drop for the given depth, skipping spells the
    /// player already owns. `None` when the eligible pool is empty.
    fn roll_spell_scroll(
        &self,
        depth: u32,
        known: &[SpellId],
        rng: &mut dyn RngSource,
    ) -> Option<SpellId>;

    /// Picks a monster species for the given depth.
    fn roll_monster(&self, depth: u32, rng: &mut dyn RngSource) -> MonsterKind;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::items::{ConsumableEffect, ItemSlot, Rarity};

    /// Fixed-table oracle for engine tests. Spell powers and monster
    /// statlines mirror the shipped content so formula tests stay
    /// meaningful.
    pub struct StubContent {
        spells: Vec<Spell>,
        monsters: Vec<MonsterDef>,
    }

    impl StubContent {
        pub fn new() -> Self {
            use SpellId::*;
            let spell = Spell::new;
            let spells = vec![
                spell(Pulse, "Pulse", Rarity::Common, 4.0),
                spell(Clairvoyance, "Clairvoyance", Rarity::Common, 1.0),
                spell(WardingMist, "Warding Mist", Rarity::Common, 1.0),
                spell(Mending, "Mending", Rarity::Common, 12.0),
                spell(Spark, "Spark", Rarity::Rare, 6.0),
                spell(Frostbind, "Frostbind", Rarity::Rare, 4.0),
                spell(WitheringHex, "Withering Hex", Rarity::Rare, 3.0),
                spell(SunderWard, "Sunder Ward", Rarity::Rare, 3.0),
                spell(Arcbolt, "Arcbolt", Rarity::Rare, 6.0),
                spell(ArcaneSkin, "Arcane Skin", Rarity::Rare, 1.0),
                spell(GildTouch, "Gilded Touch", Rarity::Rare, 18.0),
                spell(SummonSlime, "Summon: Slime", Rarity::Rare, 1.0),
                spell(GreaterMending, "Greater Mending", Rarity::Rare, 24.0),
                spell(Siphon, "Night Siphon", Rarity::Epic, 6.0),
                spell(Rift, "Short Rift", Rarity::Epic, 8.0),
                spell(SummonSkeleton, "Summon: Skeleton", Rarity::Epic, 2.0),
                spell(SummonAfterimage, "Summon: Afterimage", Rarity::Epic, 1.0),
                spell(CallOfDead, "Call of the Dead", Rarity::Epic, 0.0),
                spell(Prospection, "Prospection", Rarity::Epic, 24.0),
                spell(FocusSigil, "Focus Sigil", Rarity::Epic, 1.0),
                spell(Teleport, "Translocation", Rarity::Epic, 0.0),
                spell(Nova, "Runic Nova", Rarity::Legendary, 12.0),
                spell(Comet, "Astral Comet", Rarity::Legendary, 10.0),
                spell(SummonDragon, "Summon: Drake", Rarity::Legendary, 4.0),
            ];
            let m = MonsterDef::new;
            let monsters = vec![
                m(MonsterKind::Slime, "Slime", 12, 3, 1, 0.02, 6, 3),
                m(MonsterKind::Bat, "Bat", 10, 4, 0, 0.03, 5, 2),
                m(MonsterKind::Goblin, "Goblin", 18, 6, 2, 0.04, 10, 6),
                m(MonsterKind::Skeleton, "Skeleton", 22, 7, 2, 0.05, 12, 8),
                m(MonsterKind::Wraith, "Wraith", 28, 9, 3, 0.06, 18, 12),
                m(MonsterKind::Devil, "Devil", 40, 12, 5, 0.06, 28, 22),
                m(MonsterKind::Dragon, "Dragon", 60, 16, 6, 0.08, 45, 40),
            ];
            Self { spells, monsters }
        }
    }

    impl ContentOracle for StubContent {
        fn spell(&self, id: SpellId) -> &Spell {
            self.spells
                .iter()
                .find(|s| s.id == id)
                .expect("stub covers every spell")
        }

        fn monster_def(&self, kind: MonsterKind) -> &MonsterDef {
            self.monsters
                .iter()
                .find(|m| m.kind == kind)
                .expect("stub covers every species")
        }

        fn roll_item(&self, _depth: u32, _rng: &mut dyn RngSource) -> Item {
            Item::new("Plain Blade", ItemSlot::Weapon, 0, 2, 0, 0.0, Rarity::Common)
        }

        fn roll_consumable(&self, _depth: u32, _rng: &mut dyn RngSource) -> Consumable {
            Consumable::new("Potion", ConsumableEffect::Heal(12), Rarity::Common)
        }

        fn roll_spell_scroll(
            &self,
            _depth: u32,
            known: &[SpellId],
            _rng: &mut dyn RngSource,
        ) -> Option<SpellId> {
            (!known.contains(&SpellId::Spark)).then_some(SpellId::Spark)
        }

        fn roll_monster(&self, _depth: u32, _rng: &mut dyn RngSource) -> MonsterKind {
            MonsterKind::Skeleton
        }
    }
}
