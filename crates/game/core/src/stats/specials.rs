//! Closed modifier vocabulary and its accumulator.
//!
//! Every bonus an item, shrine or exploration spell can grant is one of the
//! [`SpecialKind`] variants below. Merging sources is a fold over known
//! variants into a fixed array, so a typo'd key is a compile error rather
//! than a silently ignored map entry.

use strum::EnumCount;

/// All special modifier kinds recognized by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumCount, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpecialKind {
    // ===== magic =====
    /// Magic power driving spell and summon scaling.
    Pouv,
    /// Additive bonus to the spell utility/power multiplier.
    SpellPower,
    /// Flat bonus added to damaging spells.
    SpellDamage,
    /// Flat magical damage reduction on incoming hits.
    SpellDefense,
    /// Additive spell critical chance.
    SpellCrit,
    /// Extra spell slots per floor.
    SpellSlots,

    // ===== combat passives =====
    /// Flat hp restored per combat turn (capped by the regen rules).
    Regen,
    /// Flat damage reflected when the monster lands a hit.
    Thorns,
    /// Chance to fully evade a monster hit.
    Dodge,
    /// Fraction of dealt attack damage returned as healing.
    Lifesteal,
    /// Basic attacks poison the monster.
    PoisonOnHit,
    /// Damage bonus fraction while at or below half hp.
    Berserk,
    /// Bonus fraction on gold rewards.
    Greed,
    /// Multiplier on the special attack's hp cost.
    SpecialCostMult,
    /// Multiplier on the special attack's damage.
    SpecialDamageMult,

    // ===== exploration =====
    /// Field-of-view radius bonus (consumed by the map layer).
    FovBonus,
    /// Extra fights granted to fragment buffs.
    FragDurationBonus,

    // ===== permanent fragment conversions =====
    PermFragAtkPct,
    PermFragDefPct,
    PermFragSpellPct,
    PermFragCritFlat,
}

impl SpecialKind {
    pub const COUNT: usize = <Self as EnumCount>::COUNT;

    #[inline]
    pub(crate) fn as_index(self) -> usize {
        self as usize
    }

    /// Kinds whose values are whole numbers; the Mage item multiplier
    /// rounds these after scaling.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Pouv
                | Self::SpellDamage
                | Self::SpellDefense
                | Self::SpellSlots
                | Self::Regen
                | Self::Thorns
                | Self::FovBonus
                | Self::FragDurationBonus
        )
    }

    /// Magic-utility subset boosted on magic items for the Mage class.
    ///
    /// Deliberately excludes `SpellPower`/`SpellDamage`: the class already
    /// scales spell output through its POUV formula, and stacking a class
    /// multiplier on top of item damage bonuses double-counts.
    pub fn is_mage_magic_utility(self) -> bool {
        matches!(
            self,
            Self::Pouv | Self::SpellDefense | Self::SpellSlots | Self::SpellCrit
        )
    }
}

/// Accumulated special values, indexed by [`SpecialKind`].
///
/// Numeric kinds sum across sources. Multiplier kinds
/// (`SpecialCostMult`, `SpecialDamageMult`) read as 1.0 while unset.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Specials {
    values: [f64; SpecialKind::COUNT],
    set: [bool; SpecialKind::COUNT],
}

impl Specials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an accumulator from `(kind, value)` pairs.
    pub fn from_pairs(pairs: &[(SpecialKind, f64)]) -> Self {
        let mut specials = Self::new();
        for &(kind, value) in pairs {
            specials.add(kind, value);
        }
        specials
    }

    /// Adds `value` to a kind (summing semantics).
    pub fn add(&mut self, kind: SpecialKind, value: f64) {
        self.values[kind.as_index()] += value;
        self.set[kind.as_index()] = true;
    }

    /// Sets a kind to `value`, replacing any prior contribution.
    pub fn set(&mut self, kind: SpecialKind, value: f64) {
        self.values[kind.as_index()] = value;
        self.set[kind.as_index()] = true;
    }

    /// Keeps the larger of the current and offered value.
    ///
    /// Exploration spells refresh this way: re-casting never stacks, it
    /// only raises the floor bonus.
    pub fn raise_to(&mut self, kind: SpecialKind, value: f64) {
        let idx = kind.as_index();
        if !self.set[idx] || value > self.values[idx] {
            self.values[idx] = value;
            self.set[idx] = true;
        }
    }

    /// Accumulated value for a kind, 0.0 if never set.
    pub fn get(&self, kind: SpecialKind) -> f64 {
        self.values[kind.as_index()]
    }

    /// Value for a multiplier kind, 1.0 if never set.
    pub fn mult_or_one(&self, kind: SpecialKind) -> f64 {
        if self.set[kind.as_index()] {
            self.values[kind.as_index()]
        } else {
            1.0
        }
    }

    pub fn is_set(&self, kind: SpecialKind) -> bool {
        self.set[kind.as_index()]
    }

    /// Folds another accumulator into this one.
    pub fn merge(&mut self, other: &Specials) {
        for idx in 0..SpecialKind::COUNT {
            if other.set[idx] {
                self.values[idx] += other.values[idx];
                self.set[idx] = true;
            }
        }
    }

    /// Folds another accumulator, scaling the given subset by `mult`.
    ///
    /// Integer-valued kinds are rounded after scaling.
    pub fn merge_scaled(
        &mut self,
        other: &Specials,
        mult: f64,
        scale_if: impl Fn(SpecialKind) -> bool,
    ) {
        use strum::IntoEnumIterator;
        for kind in SpecialKind::iter() {
            let idx = kind.as_index();
            if !other.set[idx] {
                continue;
            }
            let mut value = other.values[idx];
            if scale_if(kind) {
                value *= mult;
                if kind.is_integer() {
                    value = value.round();
                }
            }
            self.values[idx] += value;
            self.set[idx] = true;
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.set.iter().any(|s| *s)
    }

    /// Clears every kind.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_across_sources() {
        let mut acc = Specials::new();
        acc.add(SpecialKind::Pouv, 3.0);
        acc.merge(&Specials::from_pairs(&[(SpecialKind::Pouv, 2.0)]));
        assert_eq!(acc.get(SpecialKind::Pouv), 5.0);
    }

    #[test]
    fn unset_kind_reads_zero_and_mult_reads_one() {
        let acc = Specials::new();
        assert_eq!(acc.get(SpecialKind::Thorns), 0.0);
        assert_eq!(acc.mult_or_one(SpecialKind::SpecialCostMult), 1.0);
    }

    #[test]
    fn scaled_merge_rounds_integer_kinds() {
        let mut acc = Specials::new();
        let item = Specials::from_pairs(&[
            (SpecialKind::Pouv, 3.0),
            (SpecialKind::SpellCrit, 0.02),
            (SpecialKind::SpellDamage, 2.0),
        ]);
        // Mage multiplier hits Pouv (3 * 1.35 = 4.05 -> 4) and SpellCrit,
        // but never SpellDamage.
        acc.merge_scaled(&item, 1.35, SpecialKind::is_mage_magic_utility);
        assert_eq!(acc.get(SpecialKind::Pouv), 4.0);
        assert!((acc.get(SpecialKind::SpellCrit) - 0.027).abs() < 1e-12);
        assert_eq!(acc.get(SpecialKind::SpellDamage), 2.0);
    }

    #[test]
    fn raise_to_never_lowers() {
        let mut acc = Specials::new();
        acc.raise_to(SpecialKind::FovBonus, 3.0);
        acc.raise_to(SpecialKind::FovBonus, 2.0);
        assert_eq!(acc.get(SpecialKind::FovBonus), 3.0);
    }
}
