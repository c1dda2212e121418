//! Static content tables.
//!
//! Raw item stats are authored generously and then normalized by
//! [`rebalance`], which clamps every statline and special to per-rarity
//! caps. Authoring stays readable and the shipped numbers stay inside the
//! progression curve.

use crawl_core::items::{Consumable, ConsumableEffect, FragmentKey, Item, ItemSlot, Rarity};
use crawl_core::magic::{Spell, SpellId};
use crawl_core::monster::{MonsterDef, MonsterKind};
use crawl_core::stats::SpecialKind;
use strum::IntoEnumIterator;

/// The full spellbook, one entry per [`SpellId`].
pub fn spells() -> Vec<Spell> {
    use SpellId::*;
    let s = Spell::new;
    vec![
        s(Pulse, "Pulse", Rarity::Common, 4.0),
        s(Clairvoyance, "Clairvoyance", Rarity::Common, 1.0),
        s(WardingMist, "Warding Mist", Rarity::Common, 1.0),
        s(Mending, "Mending", Rarity::Common, 12.0),
        s(Spark, "Spark", Rarity::Rare, 6.0),
        s(Frostbind, "Frostbind", Rarity::Rare, 4.0),
        s(WitheringHex, "Withering Hex", Rarity::Rare, 3.0),
        s(SunderWard, "Sunder Ward", Rarity::Rare, 3.0),
        s(Arcbolt, "Arcbolt", Rarity::Rare, 6.0),
        s(ArcaneSkin, "Arcane Skin", Rarity::Rare, 1.0),
        s(GildTouch, "Gilded Touch", Rarity::Rare, 18.0),
        s(SummonSlime, "Summon: Slime", Rarity::Rare, 1.0),
        s(GreaterMending, "Greater Mending", Rarity::Rare, 24.0),
        s(Siphon, "Night Siphon", Rarity::Epic, 6.0),
        s(Rift, "Short Rift", Rarity::Epic, 8.0),
        s(SummonSkeleton, "Summon: Skeleton", Rarity::Epic, 2.0),
        s(SummonAfterimage, "Summon: Afterimage", Rarity::Epic, 1.0),
        s(CallOfDead, "Call of the Dead", Rarity::Epic, 0.0),
        s(Prospection, "Prospection", Rarity::Epic, 24.0),
        s(FocusSigil, "Focus Sigil", Rarity::Epic, 1.0),
        s(Teleport, "Translocation", Rarity::Epic, 0.0),
        s(Nova, "Runic Nova", Rarity::Legendary, 12.0),
        s(Comet, "Astral Comet", Rarity::Legendary, 10.0),
        s(SummonDragon, "Summon: Drake", Rarity::Legendary, 4.0),
    ]
}

/// Base monster definitions, one per [`MonsterKind`].
pub fn monsters() -> Vec<MonsterDef> {
    let m = MonsterDef::new;
    vec![
        m(MonsterKind::Slime, "Slime", 12, 3, 1, 0.02, 6, 3),
        m(MonsterKind::Bat, "Bat", 10, 4, 0, 0.03, 5, 2),
        m(MonsterKind::Goblin, "Goblin", 18, 6, 2, 0.04, 10, 6),
        m(MonsterKind::Skeleton, "Skeleton", 22, 7, 2, 0.05, 12, 8),
        m(MonsterKind::Wraith, "Wraith", 28, 9, 3, 0.06, 18, 12),
        m(MonsterKind::Devil, "Devil", 40, 12, 5, 0.06, 28, 22),
        m(MonsterKind::Dragon, "Dragon", 60, 16, 6, 0.08, 45, 40),
    ]
}

/// Every droppable item, already normalized.
pub fn items() -> Vec<Item> {
    let mut all = common_items();
    all.extend(rare_items());
    all.extend(epic_items());
    all.extend(legendary_items());
    all.into_iter().map(rebalance).collect()
}

fn common_items() -> Vec<Item> {
    use ItemSlot::*;
    use Rarity::Common;
    let i = Item::new;
    vec![
        i("Rusty Sword", Weapon, 0, 2, 0, 0.0, Common),
        i("Wooden Shield", Armor, 4, 0, 2, 0.0, Common),
        i("Dull Ring", Accessory, 3, 1, 0, 0.0, Common),
        i("Blunt Knife", Weapon, 0, 1, 0, 0.0, Common),
        i("Light Mallet", Weapon, 0, 2, 0, 0.0, Common),
        i("Cracked Staff", Weapon, 0, 2, 0, 0.01, Common),
        i("Cloth Chestpiece", Armor, 3, 0, 1, 0.0, Common),
        i("Leather Harness", Armor, 5, 0, 1, 0.0, Common),
        i("Rough Gloves", Accessory, 2, 1, 0, 0.0, Common),
        i("Worn Boots", Accessory, 3, 0, 0, 0.0, Common),
        i("Tarnished Brooch", Accessory, 2, 0, 0, 0.01, Common),
        i("Dented Shield", Armor, 6, 0, 2, 0.0, Common),
        i("Short Pavise", Armor, 4, 0, 2, 0.0, Common),
        i("Short Blade", Weapon, 0, 2, 0, 0.02, Common),
        i("Peasant Spear", Weapon, 0, 3, 0, 0.0, Common),
        i("Felt Hat", Accessory, 1, 0, 0, 0.01, Common),
        i("Rope Bracelet", Accessory, 2, 0, 0, 0.0, Common),
        i("Thick Belt", Accessory, 4, 0, 0, 0.0, Common),
    ]
}

fn rare_items() -> Vec<Item> {
    use ItemSlot::*;
    use Rarity::Rare;
    use SpecialKind::*;
    let i = Item::new;
    vec![
        i("Balanced Sword", Weapon, 0, 5, 0, 0.02, Rare),
        i("Studded Cuirass", Armor, 8, 0, 3, 0.0, Rare),
        i("Ring of Might", Accessory, 0, 3, 0, 0.0, Rare),
        i("Shadow Cloak", Armor, 0, 0, 1, 0.20, Rare),
        i("Balanced Axe", Weapon, 0, 6, 0, 0.0, Rare),
        i("Fine Rapier", Weapon, 0, 5, 0, 0.03, Rare),
        i("Spiked Club", Weapon, 0, 6, 0, 0.0, Rare),
        i("Riveted Mail", Armor, 9, 0, 3, 0.0, Rare),
        i("Round Shield", Armor, 10, 0, 3, 0.0, Rare),
        i("Steel Bracers", Armor, 6, 0, 2, 0.0, Rare),
        i("Amulet of Finesse", Accessory, 0, 2, 0, 0.04, Rare),
        i("Salve Ring", Accessory, 6, 0, 0, 0.0, Rare),
        i("Reinforced Boots", Accessory, 5, 0, 1, 0.0, Rare),
        i("Ribbed Targe", Armor, 8, 0, 4, 0.0, Rare),
        i("Broad Sword", Weapon, 0, 6, 0, 0.01, Rare),
        i("Runed Staff", Weapon, 0, 5, 0, 0.04, Rare),
        i("Hooded Cloak", Armor, 4, 0, 2, 0.03, Rare),
        i("Sturdy Girdle", Accessory, 8, 0, 0, 0.0, Rare),
        i("Polished Medallion", Accessory, 4, 1, 0, 0.02, Rare),
        i("Flux Staff", Weapon, 0, 3, 0, 0.01, Rare)
            .with_special(&[(Pouv, 3.0), (SpellPower, 0.12)]),
        i("Prismatic Talisman", Accessory, 3, 0, 1, 0.01, Rare)
            .with_special(&[(Pouv, 2.0), (SpellCrit, 0.02)]),
        i("Enchanter's Veil", Armor, 5, 0, 2, 0.0, Rare)
            .with_special(&[(Pouv, 2.0), (SpellDefense, 2.0)]),
        i("Ring of Sparks", Accessory, 1, 1, 0, 0.01, Rare)
            .with_special(&[(Pouv, 2.0), (SpellDamage, 2.0)]),
        i("Apprentice Seal", Accessory, 3, 0, 1, 0.01, Rare)
            .with_special(&[(Pouv, 1.0), (SpellPower, 0.10)]),
        i("Vigil Staff", Weapon, 0, 3, 0, 0.01, Rare)
            .with_special(&[(Pouv, 2.0), (SpellDamage, 1.0)]),
        i("Runeweave Mantle", Armor, 6, 0, 2, 0.0, Rare)
            .with_special(&[(Pouv, 1.0), (SpellDefense, 1.0)]),
        i("Ring of Focus", Accessory, 4, 1, 0, 0.01, Rare)
            .with_special(&[(Pouv, 2.0), (SpellPower, 0.12)]),
        i("Watcher's Orb", Accessory, 2, 0, 1, 0.02, Rare)
            .with_special(&[(Pouv, 1.0), (SpellSlots, 1.0)]),
        i("Fragmented Codex", Accessory, 3, 0, 1, 0.01, Rare)
            .with_special(&[(Pouv, 2.0), (SpellSlots, 1.0), (SpellPower, 0.08)]),
        i("Ironbound Grimoire", Armor, 7, 0, 3, 0.0, Rare)
            .with_special(&[(Pouv, 2.0), (SpellDefense, 1.0), (SpellSlots, 1.0)]),
        i("Pyromancer's Band", Accessory, 0, 2, 0, 0.02, Rare)
            .with_special(&[(Pouv, 3.0), (SpellDamage, 2.0), (SpellPower, 0.06)]),
    ]
}

fn epic_items() -> Vec<Item> {
    use ItemSlot::*;
    use Rarity::Epic;
    use SpecialKind::*;
    let i = Item::new;
    vec![
        i("Wind Sword", Weapon, 0, 7, 0, 0.06, Epic).with_special(&[(Dodge, 0.05)]),
        i("Runic Armor", Armor, 16, 0, 6, 0.02, Epic).with_special(&[(Regen, 5.0)]),
        i("Claw of Fate", Accessory, 0, 0, 0, 0.10, Epic),
        i("Vampiric Blade", Weapon, 0, 6, 0, 0.0, Epic).with_special(&[(Lifesteal, 0.20)]),
        i("Storm Sword", Weapon, 0, 8, 0, 0.06, Epic).with_special(&[(Dodge, 0.03)]),
        i("Sandblade", Weapon, 0, 7, 0, 0.08, Epic),
        i("Telluric Hammer", Weapon, 0, 9, 0, 0.0, Epic),
        i("Scale Armor", Armor, 14, 0, 7, 0.01, Epic),
        i("Blessed Hauberk", Armor, 18, 0, 5, 0.02, Epic).with_special(&[(Regen, 3.0)]),
        i("Solar Shield", Armor, 10, 0, 8, 0.0, Epic).with_special(&[(Thorns, 2.0)]),
        i("Lightning Ring", Accessory, 0, 4, 0, 0.06, Epic),
        i("Amulet of Vigor", Accessory, 14, 0, 0, 0.02, Epic),
        i("Predator Gloves", Accessory, 0, 5, 0, 0.0, Epic),
        i("Polar Sword", Weapon, 0, 7, 0, 0.05, Epic),
        i("Granite Greaves", Armor, 12, 0, 6, 0.0, Epic),
        i("Stalker Cape", Armor, 8, 0, 4, 0.05, Epic).with_special(&[(Dodge, 0.04)]),
        i("Obsidian Claw", Accessory, 0, 0, 0, 0.12, Epic),
        i("Vital Pendant", Accessory, 18, 0, 0, 0.0, Epic).with_special(&[(Regen, 2.0)]),
        i("Wind Boots", Accessory, 6, 0, 3, 0.0, Epic).with_special(&[(Dodge, 0.03)]),
        i("Astral Scepter", Weapon, 0, 4, 0, 0.03, Epic)
            .with_special(&[(Pouv, 4.0), (SpellPower, 0.18), (SpellDamage, 2.0)]),
        i("Comet Mantle", Armor, 8, 0, 3, 0.01, Epic)
            .with_special(&[(Pouv, 3.0), (SpellDefense, 3.0), (SpellSlots, 1.0)]),
        i("Thaumaturge Sigil", Accessory, 6, 0, 1, 0.03, Epic)
            .with_special(&[(Pouv, 4.0), (SpellCrit, 0.03), (SpellPower, 0.12)]),
        i("Resonant Orb", Accessory, 2, 0, 1, 0.02, Epic)
            .with_special(&[(Pouv, 3.0), (SpellDamage, 3.0)]),
    ]
}

fn legendary_items() -> Vec<Item> {
    use ItemSlot::*;
    use Rarity::Legendary;
    use SpecialKind::*;
    let i = Item::new;
    vec![
        i("Spiked Bulwark", Armor, 8, 0, 6, 0.0, Legendary).with_special(&[(Thorns, 3.0)]),
        i("Master's Sword", Weapon, 0, 11, 0, 0.05, Legendary),
        i("Sunrender", Weapon, 0, 12, 0, 0.02, Legendary),
        i("Hammer of Kings", Weapon, 0, 13, 0, 0.0, Legendary),
        i("Dawn Helm", Armor, 16, 0, 8, 0.02, Legendary),
        i("Sanctified Cuirass", Armor, 20, 0, 9, 0.01, Legendary).with_special(&[(Regen, 4.0)]),
        i("Scarlet Aegis", Armor, 14, 0, 10, 0.0, Legendary).with_special(&[(Thorns, 4.0)]),
        i("Phoenix Ring", Accessory, 10, 3, 2, 0.06, Legendary),
        i("Royal Seal", Accessory, 15, 2, 3, 0.05, Legendary),
        i("Astral Boots", Accessory, 10, 0, 5, 0.02, Legendary).with_special(&[(Dodge, 0.05)]),
        i("Howling Blade", Weapon, 0, 10, 0, 0.08, Legendary),
        i("Colossus Plate", Armor, 24, 0, 10, 0.0, Legendary),
        i("Shield of Thorns", Armor, 12, 0, 9, 0.0, Legendary).with_special(&[(Thorns, 5.0)]),
        i("Amulet of Destiny", Accessory, 8, 0, 0, 0.12, Legendary),
        i("Zenith Crown", Accessory, 22, 3, 3, 0.05, Legendary),
        i("Sword of Millennia", Weapon, 0, 14, 0, 0.04, Legendary),
        i("Archon Staff", Weapon, 0, 5, 0, 0.04, Legendary)
            .with_special(&[(Pouv, 6.0), (SpellPower, 0.25), (SpellDamage, 4.0)]),
        i("Aegis of Living Runes", Armor, 12, 0, 5, 0.02, Legendary)
            .with_special(&[(Pouv, 5.0), (SpellDefense, 4.0), (SpellSlots, 1.0)]),
        i("Crown of the Dark Scholar", Accessory, 8, 1, 1, 0.05, Legendary)
            .with_special(&[(Pouv, 7.0), (SpellCrit, 0.05), (SpellPower, 0.20)]),
    ]
}

/// Always-available consumables.
pub fn base_consumables() -> Vec<Consumable> {
    use ConsumableEffect::*;
    let c = Consumable::new;
    vec![
        c("Healing Potion", Heal(24), Rarity::Common),
        c("Major Elixir", Heal(65), Rarity::Rare),
        c(
            "Rage Potion",
            BuffAtk {
                amount: 4,
                turns: 3,
            },
            Rarity::Rare,
        ),
        c("Recall Stone", FleeStone, Rarity::Rare),
    ]
}

/// Strong potions that join the loot pool in the deep floors.
pub fn high_tier_potions() -> Vec<Consumable> {
    use ConsumableEffect::*;
    let c = Consumable::new;
    vec![
        c("Sovereign Panacea", Heal(120), Rarity::Epic),
        c(
            "Colossus Tonic",
            BuffAtk {
                amount: 8,
                turns: 4,
            },
            Rarity::Legendary,
        ),
        c("Philosopher's Dust", SummonFullHeal, Rarity::Legendary),
    ]
}

/// Gem fragments granting next-fight percentage buffs.
pub fn fragment_shards() -> Vec<Consumable> {
    use FragmentKey::*;
    let frag = |name: &str, key, amount, fights, rarity| {
        Consumable::new(
            name,
            ConsumableEffect::Fragment {
                key,
                amount,
                fights,
            },
            rarity,
        )
    };
    vec![
        frag("Garnet Shard", AtkPct, 0.06, 2, Rarity::Common),
        frag("Quartz Shard", DefPct, 0.06, 2, Rarity::Common),
        frag("Opal Shard", SpellPct, 0.08, 2, Rarity::Common),
        frag("Pearl Shard", CritFlat, 0.01, 1, Rarity::Common),
        frag("Ruby Fragment", AtkPct, 0.12, 3, Rarity::Rare),
        frag("Sapphire Fragment", DefPct, 0.12, 3, Rarity::Rare),
        frag("Amethyst Fragment", SpellPct, 0.15, 3, Rarity::Epic),
        frag("Diamond Fragment", CritFlat, 0.03, 2, Rarity::Epic),
    ]
}

// ===== item normalization =====

fn stat_mult(rarity: Rarity) -> f64 {
    match rarity {
        Rarity::Common => 1.05,
        Rarity::Rare => 0.94,
        Rarity::Epic => 0.82,
        Rarity::Legendary => 0.74,
    }
}

/// (hp, atk, def, crit) ceilings per rarity.
fn stat_caps(rarity: Rarity) -> (i32, i32, i32, f64) {
    match rarity {
        Rarity::Common => (6, 3, 2, 0.03),
        Rarity::Rare => (10, 6, 4, 0.06),
        Rarity::Epic => (16, 9, 7, 0.09),
        Rarity::Legendary => (21, 11, 9, 0.11),
    }
}

fn special_cap(kind: SpecialKind, rarity: Rarity) -> Option<f64> {
    use Rarity::*;
    use SpecialKind::*;
    let cap = match (kind, rarity) {
        (Regen, Rare) => 2.0,
        (Regen, Epic) => 3.0,
        (Regen, Legendary) => 4.0,
        (Thorns, Epic) => 2.0,
        (Thorns, Legendary) => 4.0,
        (Lifesteal, Epic) => 0.14,
        (Lifesteal, Legendary) => 0.16,
        (Dodge, Rare) => 0.04,
        (Dodge, Epic) => 0.05,
        (Dodge, Legendary) => 0.06,
        (Pouv, Rare) => 3.0,
        (Pouv, Epic) => 5.0,
        (Pouv, Legendary) => 7.0,
        (SpellPower, Rare) => 0.12,
        (SpellPower, Epic) => 0.18,
        (SpellPower, Legendary) => 0.25,
        (SpellDamage, Rare) => 2.0,
        (SpellDamage, Epic) => 3.0,
        (SpellDamage, Legendary) => 4.0,
        (SpellDefense, Rare) => 2.0,
        (SpellDefense, Epic) => 3.0,
        (SpellDefense, Legendary) => 4.0,
        (SpellSlots, Rare) => 1.0,
        (SpellSlots, Epic) => 1.0,
        (SpellSlots, Legendary) => 2.0,
        (SpellCrit, Rare) => 0.02,
        (SpellCrit, Epic) => 0.03,
        (SpellCrit, Legendary) => 0.05,
        _ => return None,
    };
    Some(cap)
}

/// Normalizes an authored item into its shipped statline.
fn rebalance(mut item: Item) -> Item {
    let mult = stat_mult(item.rarity);
    let (hp_cap, atk_cap, def_cap, crit_cap) = stat_caps(item.rarity);

    let scale = |v: i32, cap: i32| {
        if v <= 0 {
            v
        } else {
            ((v as f64 * mult).round().max(1.0) as i32).min(cap)
        }
    };
    item.hp_bonus = scale(item.hp_bonus, hp_cap);
    item.atk_bonus = scale(item.atk_bonus, atk_cap);
    item.def_bonus = scale(item.def_bonus, def_cap);
    if item.crit_bonus > 0.0 {
        item.crit_bonus = ((item.crit_bonus * mult * 100.0).round() / 100.0).min(crit_cap);
    }

    // Commons must stay useful early.
    if item.rarity == Rarity::Common {
        match item.slot {
            ItemSlot::Weapon => item.atk_bonus = item.atk_bonus.max(2),
            ItemSlot::Armor => {
                item.hp_bonus = item.hp_bonus.max(4);
                item.def_bonus = item.def_bonus.max(1);
            }
            ItemSlot::Accessory => {
                let total = item.hp_bonus + item.atk_bonus + item.def_bonus;
                if total < 3 && item.crit_bonus <= 0.0 {
                    item.hp_bonus = item.hp_bonus.max(2);
                    item.atk_bonus = item.atk_bonus.max(1);
                }
            }
        }
    }

    for kind in SpecialKind::iter() {
        if !item.special.is_set(kind) {
            continue;
        }
        if let Some(cap) = special_cap(kind, item.rarity) {
            item.special.set(kind, item.special.get(kind).min(cap));
        }
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_spell_id_has_an_entry() {
        let table = spells();
        for id in SpellId::iter() {
            assert!(
                table.iter().any(|s| s.id == id),
                "missing spell entry for {id:?}"
            );
        }
        assert_eq!(table.len(), SpellId::iter().count());
    }

    #[test]
    fn every_monster_kind_has_an_entry() {
        let table = monsters();
        for kind in MonsterKind::iter() {
            assert!(table.iter().any(|m| m.kind == kind));
        }
    }

    #[test]
    fn rebalanced_items_respect_rarity_caps() {
        for item in items() {
            let (hp, atk, def, crit) = stat_caps(item.rarity);
            assert!(item.hp_bonus <= hp, "{} hp over cap", item.name);
            assert!(item.atk_bonus <= atk, "{} atk over cap", item.name);
            assert!(item.def_bonus <= def, "{} def over cap", item.name);
            assert!(item.crit_bonus <= crit + 1e-9, "{} crit over cap", item.name);
            for kind in SpecialKind::iter() {
                if let (true, Some(cap)) =
                    (item.special.is_set(kind), special_cap(kind, item.rarity))
                {
                    assert!(item.special.get(kind) <= cap + 1e-9, "{}", item.name);
                }
            }
        }
    }

    #[test]
    fn common_equipment_stays_useful() {
        for item in items().iter().filter(|i| i.rarity == Rarity::Common) {
            match item.slot {
                ItemSlot::Weapon => assert!(item.atk_bonus >= 2),
                ItemSlot::Armor => {
                    assert!(item.hp_bonus >= 4);
                    assert!(item.def_bonus >= 1);
                }
                ItemSlot::Accessory => {
                    let useful = item.hp_bonus + item.atk_bonus + item.def_bonus >= 3
                        || item.crit_bonus > 0.0;
                    assert!(useful, "{} is a dead accessory", item.name);
                }
            }
        }
    }

    #[test]
    fn shadow_cloak_crit_is_clamped() {
        let cloak = items().into_iter().find(|i| i.name == "Shadow Cloak").unwrap();
        assert_eq!(cloak.crit_bonus, 0.06);
    }

    #[test]
    fn fragment_shards_cover_all_keys() {
        let shards = fragment_shards();
        for key in [
            FragmentKey::AtkPct,
            FragmentKey::DefPct,
            FragmentKey::SpellPct,
            FragmentKey::CritFlat,
        ] {
            assert!(shards.iter().any(|s| matches!(
                s.effect,
                ConsumableEffect::Fragment { key: k, .. } if k == key
            )));
        }
    }
}
