//! Items, consumables and equipment slots.
//!
//! Items are static content: the core only reads their bonus fields and
//! special map. Equipment slots are explicit options so empty/occupied is
//! checked by the compiler, not by convention.

use strum::IntoEnumIterator;

use crate::stats::{SpecialKind, Specials};

/// Content rarity tiers, shared by items, consumables and spells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// The three equipment slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemSlot {
    Weapon,
    Armor,
    Accessory,
}

/// A piece of equipment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    pub name: String,
    pub slot: ItemSlot,
    pub hp_bonus: i32,
    pub atk_bonus: i32,
    pub def_bonus: i32,
    pub crit_bonus: f64,
    pub rarity: Rarity,
    pub special: Specials,
    /// Number of `+1` upgrades already applied.
    pub upgrade_level: u8,
}

impl Item {
    pub fn new(
        name: impl Into<String>,
        slot: ItemSlot,
        hp_bonus: i32,
        atk_bonus: i32,
        def_bonus: i32,
        crit_bonus: f64,
        rarity: Rarity,
    ) -> Self {
        Self {
            name: name.into(),
            slot,
            hp_bonus,
            atk_bonus,
            def_bonus,
            crit_bonus,
            rarity,
            special: Specials::new(),
            upgrade_level: 0,
        }
    }

    pub fn with_special(mut self, pairs: &[(SpecialKind, f64)]) -> Self {
        self.special = Specials::from_pairs(pairs);
        self
    }

    /// True when the item carries any magic special; the Mage class
    /// multiplier only applies to these.
    pub fn is_magic(&self) -> bool {
        [
            SpecialKind::Pouv,
            SpecialKind::SpellPower,
            SpecialKind::SpellDamage,
            SpecialKind::SpellDefense,
            SpecialKind::SpellCrit,
            SpecialKind::SpellSlots,
        ]
        .iter()
        .any(|&k| self.special.is_set(k))
    }

    /// Maximum upgrade count for this rarity; `None` means unlimited.
    pub fn upgrade_limit(&self) -> Option<u8> {
        match self.rarity {
            Rarity::Common => Some(0),
            Rarity::Rare => Some(1),
            Rarity::Epic => Some(2),
            Rarity::Legendary => None,
        }
    }

    pub fn can_upgrade(&self) -> bool {
        match self.upgrade_limit() {
            None => true,
            Some(cap) => self.upgrade_level < cap,
        }
    }

    /// Builds the `+1` version of this item, or `None` at the cap.
    ///
    /// Each flat bonus grows by 20% (at least 1), crit by 0.01 capped at
    /// 0.25, integer specials by 1 and fractional specials by 0.01.
    pub fn upgraded(&self) -> Option<Item> {
        if !self.can_upgrade() {
            return None;
        }
        let grow = |b: i32| b + ((b.max(1) as f64) * 0.20).round().max(1.0) as i32;
        let mut special = self.special.clone();
        for kind in SpecialKind::iter() {
            if !self.special.is_set(kind) {
                continue;
            }
            if kind.is_integer() {
                special.set(kind, self.special.get(kind) + 1.0);
            } else {
                special.set(kind, ((self.special.get(kind) + 0.01) * 100.0).round() / 100.0);
            }
        }
        Some(Item {
            name: format!("{} +{}", self.base_name(), self.upgrade_level + 1),
            slot: self.slot,
            hp_bonus: grow(self.hp_bonus),
            atk_bonus: grow(self.atk_bonus),
            def_bonus: grow(self.def_bonus),
            crit_bonus: (((self.crit_bonus + 0.01) * 100.0).round() / 100.0).clamp(0.0, 0.25),
            rarity: self.rarity,
            special,
            upgrade_level: self.upgrade_level + 1,
        })
    }

    fn base_name(&self) -> &str {
        match self.name.rfind(" +") {
            Some(pos) if self.upgrade_level > 0 => &self.name[..pos],
            _ => &self.name,
        }
    }
}

/// Keys a fragment buff can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FragmentKey {
    AtkPct,
    DefPct,
    SpellPct,
    CritFlat,
}

/// What a consumable does when used.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConsumableEffect {
    /// Restores hp.
    Heal(i32),
    /// Temporary attack buff for a number of combat turns.
    BuffAtk { amount: i32, turns: u8 },
    /// Percentage buff active for the next few fights.
    Fragment {
        key: FragmentKey,
        amount: f64,
        fights: u8,
    },
    /// Fully heals the active summon.
    SummonFullHeal,
    /// Guaranteed flee, combat only.
    FleeStone,
}

/// A stackable consumable.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Consumable {
    pub name: String,
    pub effect: ConsumableEffect,
    pub rarity: Rarity,
}

impl Consumable {
    pub fn new(name: impl Into<String>, effect: ConsumableEffect, rarity: Rarity) -> Self {
        Self {
            name: name.into(),
            effect,
            rarity,
        }
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.effect, ConsumableEffect::Fragment { .. })
    }
}

/// A stack of identical consumables.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsumableStack {
    pub item: Consumable,
    pub qty: u8,
}

/// The player's three equipment slots.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Equipment {
    pub weapon: Option<Item>,
    pub armor: Option<Item>,
    pub accessory: Option<Item>,
}

impl Equipment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn slot(&self, slot: ItemSlot) -> Option<&Item> {
        match slot {
            ItemSlot::Weapon => self.weapon.as_ref(),
            ItemSlot::Armor => self.armor.as_ref(),
            ItemSlot::Accessory => self.accessory.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: ItemSlot) -> &mut Option<Item> {
        match slot {
            ItemSlot::Weapon => &mut self.weapon,
            ItemSlot::Armor => &mut self.armor,
            ItemSlot::Accessory => &mut self.accessory,
        }
    }

    /// Places `item` in its slot, returning the displaced item if any.
    pub fn place(&mut self, item: Item) -> Option<Item> {
        self.slot_mut(item.slot).replace(item)
    }

    /// Iterates over equipped items.
    pub fn equipped(&self) -> impl Iterator<Item = &Item> {
        [
            self.weapon.as_ref(),
            self.armor.as_ref(),
            self.accessory.as_ref(),
        ]
        .into_iter()
        .flatten()
    }
}
