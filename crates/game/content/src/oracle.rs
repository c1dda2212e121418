//! The shipped [`ContentOracle`] implementation.
//!
//! Drop rolls follow depth-scaled rarity weights: every rarity has a base
//! weight, a per-depth gain and a minimum depth below which its weight is
//! zeroed. When a picked rarity has no candidates the roll falls back to
//! the whole pool rather than failing.

use crawl_core::content::ContentOracle;
use crawl_core::items::{Consumable, Item, Rarity};
use crawl_core::magic::{Spell, SpellId};
use crawl_core::monster::{MonsterDef, MonsterKind};
use crawl_core::rng::RngSource;

use crate::tables;

const RARITY_ORDER: [Rarity; 4] = [Rarity::Common, Rarity::Rare, Rarity::Epic, Rarity::Legendary];

/// Item rarity weighting: (base, per-depth gain, minimum depth).
const ITEM_RARITY_WEIGHTS: [(f64, f64, u32); 4] = [
    (88.0, 0.0, 0),
    (8.0, 1.5, 1),
    (0.0, 0.8, 4),
    (0.0, 0.35, 9),
];

/// High-tier potions and gem fragments join the consumable pool here.
const DEEP_LOOT_DEPTH: u32 = 10;

/// Scroll drops shift toward high rarities from this depth.
const DEEP_SCROLL_DEPTH: u32 = 12;

/// Devils and dragons appear as regular encounters from this depth.
const HEAVY_MONSTER_DEPTH: u32 = 7;
const HEAVY_MONSTER_CHANCE: f64 = 0.04;

/// Static tables behind the [`ContentOracle`] seam.
pub struct StaticContent {
    spells: Vec<Spell>,
    monsters: Vec<MonsterDef>,
    items: Vec<Item>,
    base_consumables: Vec<Consumable>,
    high_tier_potions: Vec<Consumable>,
    fragment_shards: Vec<Consumable>,
}

impl StaticContent {
    pub fn new() -> Self {
        Self {
            spells: tables::spells(),
            monsters: tables::monsters(),
            items: tables::items(),
            base_consumables: tables::base_consumables(),
            high_tier_potions: tables::high_tier_potions(),
            fragment_shards: tables::fragment_shards(),
        }
    }

    fn roll_rarity(&self, depth: u32, rng: &mut dyn RngSource) -> Rarity {
        let mut weights = [0.0f64; 4];
        for (idx, (base, gain, min_depth)) in ITEM_RARITY_WEIGHTS.iter().enumerate() {
            if depth >= *min_depth {
                weights[idx] = base + depth as f64 * gain;
            }
        }
        let picked = weighted_index(&weights, rng);
        picked.map_or(Rarity::Common, |idx| RARITY_ORDER[idx])
    }
}

impl Default for StaticContent {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentOracle for StaticContent {
    fn spell(&self, id: SpellId) -> &Spell {
        self.spells
            .iter()
            .find(|s| s.id == id)
            .expect("spell table covers every id")
    }

    fn monster_def(&self, kind: MonsterKind) -> &MonsterDef {
        self.monsters
            .iter()
            .find(|m| m.kind == kind)
            .expect("monster table covers every kind")
    }

    fn roll_item(&self, depth: u32, rng: &mut dyn RngSource) -> Item {
        let rarity = self.roll_rarity(depth, rng);
        let pool: Vec<&Item> = self.items.iter().filter(|i| i.rarity == rarity).collect();
        if pool.is_empty() {
            return self.items[rng.index(self.items.len())].clone();
        }
        pool[rng.index(pool.len())].clone()
    }

    fn roll_consumable(&self, depth: u32, rng: &mut dyn RngSource) -> Consumable {
        let mut pool: Vec<&Consumable> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        for c in &self.base_consumables {
            pool.push(c);
            weights.push(if c.rarity == Rarity::Common { 24.0 } else { 11.0 });
        }
        if depth >= DEEP_LOOT_DEPTH {
            for c in &self.high_tier_potions {
                pool.push(c);
                weights.push(match c.effect {
                    crawl_core::items::ConsumableEffect::SummonFullHeal => 1.0,
                    _ => 2.0,
                });
            }
            for c in &self.fragment_shards {
                pool.push(c);
                weights.push(match c.rarity {
                    Rarity::Common => 4.0,
                    Rarity::Rare => 2.0,
                    _ => 1.0,
                });
            }
        }
        let idx = weighted_index(&weights, rng).unwrap_or(0);
        pool[idx].clone()
    }

    fn roll_spell_scroll(
        &self,
        depth: u32,
        known: &[SpellId],
        rng: &mut dyn RngSource,
    ) -> Option<SpellId> {
        let candidates: Vec<&Spell> = self
            .spells
            .iter()
            .filter(|s| !known.contains(&s.id))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let rarity_weight = |rarity: Rarity| -> f64 {
            if depth >= DEEP_SCROLL_DEPTH {
                match rarity {
                    Rarity::Common => 32.0,
                    Rarity::Rare => 36.0,
                    Rarity::Epic => 22.0,
                    Rarity::Legendary => 10.0,
                }
            } else {
                match rarity {
                    Rarity::Common => 58.0,
                    Rarity::Rare => 30.0,
                    Rarity::Epic => 10.0,
                    Rarity::Legendary => 2.0,
                }
            }
        };
        // Summon scrolls are deliberately scarce relative to their rarity.
        let summon_mult = |id: SpellId| -> f64 {
            match id {
                SpellId::SummonSlime => 0.45,
                SpellId::SummonSkeleton => 0.28,
                SpellId::SummonAfterimage => 0.22,
                SpellId::SummonDragon => 0.12,
                _ => 1.0,
            }
        };
        let weights: Vec<f64> = candidates
            .iter()
            .map(|s| rarity_weight(s.rarity) * summon_mult(s.id))
            .collect();
        weighted_index(&weights, rng).map(|idx| candidates[idx].id)
    }

    fn roll_monster(&self, depth: u32, rng: &mut dyn RngSource) -> MonsterKind {
        if depth >= HEAVY_MONSTER_DEPTH {
            let chance = if depth < 10 {
                HEAVY_MONSTER_CHANCE * 0.5
            } else {
                HEAVY_MONSTER_CHANCE
            };
            if rng.chance(chance) {
                let heavy = [MonsterKind::Devil, MonsterKind::Dragon];
                return heavy[rng.index(heavy.len())];
            }
        }
        let pool: &[MonsterKind] = if depth <= 1 {
            &[MonsterKind::Slime, MonsterKind::Bat, MonsterKind::Goblin]
        } else if depth <= 3 {
            &[
                MonsterKind::Slime,
                MonsterKind::Bat,
                MonsterKind::Goblin,
                MonsterKind::Skeleton,
            ]
        } else {
            &[
                MonsterKind::Slime,
                MonsterKind::Bat,
                MonsterKind::Goblin,
                MonsterKind::Skeleton,
                MonsterKind::Wraith,
            ]
        };
        pool[rng.index(pool.len())]
    }
}

/// Weighted pick over `weights`; `None` when every weight is zero.
fn weighted_index(weights: &[f64], rng: &mut dyn RngSource) -> Option<usize> {
    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let roll = rng.next_u32() as f64 / (u32::MAX as f64 + 1.0) * total;
    let mut acc = 0.0;
    for (idx, w) in weights.iter().enumerate() {
        acc += w.max(0.0);
        if roll < acc {
            return Some(idx);
        }
    }
    Some(weights.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawl_core::items::ConsumableEffect;
    use crawl_core::rng::PcgRng;
    use strum::IntoEnumIterator;

    #[test]
    fn depth_zero_items_are_always_common() {
        let content = StaticContent::new();
        let mut rng = PcgRng::new(11);
        for _ in 0..200 {
            assert_eq!(content.roll_item(0, &mut rng).rarity, Rarity::Common);
        }
    }

    #[test]
    fn legendaries_never_drop_before_their_floor() {
        let content = StaticContent::new();
        let mut rng = PcgRng::new(12);
        for _ in 0..500 {
            assert_ne!(content.roll_item(8, &mut rng).rarity, Rarity::Legendary);
        }
    }

    #[test]
    fn deep_floors_unlock_high_rarities() {
        let content = StaticContent::new();
        let mut rng = PcgRng::new(13);
        let mut seen_epic = false;
        let mut seen_legendary = false;
        for _ in 0..3000 {
            match content.roll_item(20, &mut rng).rarity {
                Rarity::Epic => seen_epic = true,
                Rarity::Legendary => seen_legendary = true,
                _ => {}
            }
        }
        assert!(seen_epic && seen_legendary);
    }

    #[test]
    fn shallow_consumables_come_from_the_base_pool() {
        let content = StaticContent::new();
        let mut rng = PcgRng::new(14);
        for _ in 0..200 {
            let c = content.roll_consumable(5, &mut rng);
            assert!(!c.is_fragment());
            assert!(!matches!(c.effect, ConsumableEffect::SummonFullHeal));
        }
    }

    #[test]
    fn deep_consumables_include_fragments() {
        let content = StaticContent::new();
        let mut rng = PcgRng::new(15);
        let seen_fragment = (0..500).any(|_| content.roll_consumable(12, &mut rng).is_fragment());
        assert!(seen_fragment);
    }

    #[test]
    fn scroll_roll_skips_known_spells() {
        let content = StaticContent::new();
        let mut rng = PcgRng::new(16);
        let known = [SpellId::Pulse, SpellId::Spark];
        for _ in 0..300 {
            let id = content.roll_spell_scroll(3, &known, &mut rng).unwrap();
            assert!(!known.contains(&id));
        }
    }

    #[test]
    fn scroll_roll_with_everything_known_is_none() {
        let content = StaticContent::new();
        let mut rng = PcgRng::new(17);
        let known: Vec<SpellId> = SpellId::iter().collect();
        assert_eq!(content.roll_spell_scroll(3, &known, &mut rng), None);
    }

    #[test]
    fn first_floors_spawn_only_weak_species() {
        let content = StaticContent::new();
        let mut rng = PcgRng::new(18);
        for _ in 0..300 {
            let kind = content.roll_monster(1, &mut rng);
            assert!(matches!(
                kind,
                MonsterKind::Slime | MonsterKind::Bat | MonsterKind::Goblin
            ));
        }
    }

    #[test]
    fn heavies_only_appear_deep() {
        let content = StaticContent::new();
        let mut rng = PcgRng::new(19);
        for _ in 0..500 {
            let kind = content.roll_monster(6, &mut rng);
            assert!(!matches!(kind, MonsterKind::Devil | MonsterKind::Dragon));
        }
        let seen_heavy =
            (0..5000).any(|_| {
                matches!(
                    content.roll_monster(15, &mut rng),
                    MonsterKind::Devil | MonsterKind::Dragon
                )
            });
        assert!(seen_heavy);
    }

    #[test]
    fn weighted_index_ignores_zeroed_entries() {
        let mut rng = PcgRng::new(20);
        for _ in 0..100 {
            let idx = weighted_index(&[0.0, 5.0, 0.0], &mut rng);
            assert_eq!(idx, Some(1));
        }
        assert_eq!(weighted_index(&[0.0, 0.0], &mut rng), None);
    }
}
