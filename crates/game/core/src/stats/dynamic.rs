//! Percentage-of-current-value shrine effects.
//!
//! Shrine blessings and curses grant "+X% of the current stat". The catch
//! is that the underlying base keeps moving: level-ups and equip changes
//! alter the very value the percentage was taken from. This module keeps
//! all such effects consistent by recomputing them from scratch against a
//! reconstructed base whenever anything changes.
//!
//! The recompute is idempotent (running it twice with no new effects is a
//! no-op) and conserving: for each attribute, the sum of the effects'
//! `applied` fields always equals the distance between the current value
//! and the value the attribute would have with no effects at all.

use crate::character::Character;
use crate::config::BalanceConfig;

/// Attribute a shrine effect can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatAttribute {
    MaxHp,
    Atk,
    Defense,
    Crit,
}

impl StatAttribute {
    /// Crit is the only fractional attribute; the others round to whole
    /// numbers on every recompute.
    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Crit)
    }

    fn get(self, character: &Character) -> f64 {
        match self {
            Self::MaxHp => character.max_hp as f64,
            Self::Atk => character.atk as f64,
            Self::Defense => character.defense,
            Self::Crit => character.crit,
        }
    }

    fn set(self, character: &mut Character, value: f64) {
        match self {
            Self::MaxHp => character.max_hp = value as i32,
            Self::Atk => character.atk = value as i32,
            Self::Defense => character.defense = value,
            Self::Crit => character.crit = value,
        }
    }
}

/// Whether an effect raises or lowers its attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShrineEffectKind {
    Gain,
    Loss,
}

impl ShrineEffectKind {
    fn sign(self) -> f64 {
        match self {
            Self::Gain => 1.0,
            Self::Loss => -1.0,
        }
    }
}

/// One shrine blessing or curse.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShrineEffect {
    pub attribute: StatAttribute,
    pub kind: ShrineEffectKind,
    /// Fraction of the reconstructed base.
    pub percentage: f64,
    /// The delta is never smaller than this, whatever the base.
    pub min_delta: f64,
    /// Lower bound both for the percentage base and the final value.
    pub floor_value: f64,
    /// Delta currently realized on the attribute. Maintained by
    /// [`recompute`]; do not write elsewhere.
    pub applied: f64,
}

impl ShrineEffect {
    pub fn gain(attribute: StatAttribute, percentage: f64, min_delta: f64) -> Self {
        Self::new(attribute, ShrineEffectKind::Gain, percentage, min_delta)
    }

    pub fn loss(attribute: StatAttribute, percentage: f64, min_delta: f64) -> Self {
        Self::new(attribute, ShrineEffectKind::Loss, percentage, min_delta)
    }

    fn new(
        attribute: StatAttribute,
        kind: ShrineEffectKind,
        percentage: f64,
        min_delta: f64,
    ) -> Self {
        Self {
            attribute,
            kind,
            percentage,
            min_delta,
            floor_value: 0.0,
            applied: 0.0,
        }
    }

    pub fn with_floor(mut self, floor_value: f64) -> Self {
        self.floor_value = floor_value;
        self
    }
}

/// Adds an effect and immediately recomputes. Returns the delta the new
/// effect realized.
pub fn add_effect(
    character: &mut Character,
    effects: &mut Vec<ShrineEffect>,
    effect: ShrineEffect,
) -> f64 {
    effects.push(effect);
    recompute(character, effects);
    effects.last().map(|e| e.applied).unwrap_or(0.0)
}

/// Removes the effect at `index`, unwinding its realized delta before
/// re-normalizing the remaining effects.
pub fn remove_effect(
    character: &mut Character,
    effects: &mut Vec<ShrineEffect>,
    index: usize,
) -> Option<ShrineEffect> {
    if index >= effects.len() {
        return None;
    }
    let removed = effects.remove(index);
    let attr = removed.attribute;
    let stripped = attr.get(character) - removed.applied;
    attr.set(character, stripped);
    character.clamp_hp();
    recompute(character, effects);
    Some(removed)
}

/// Recomputes every effect against the current attribute values.
///
/// For each affected attribute:
/// 1. strip all previously applied deltas to recover the base,
/// 2. compute each effect's target delta from that base,
/// 3. clamp the resulting value (attribute floor; crit capped),
/// 4. redistribute the realized total back over the effects in proportion
///    to their targets, pushing integer rounding drift onto the last one.
pub fn recompute(character: &mut Character, effects: &mut [ShrineEffect]) {
    use strum::IntoEnumIterator;

    if effects.is_empty() {
        return;
    }
    for attr in StatAttribute::iter() {
        let indices: Vec<usize> = effects
            .iter()
            .enumerate()
            .filter(|(_, e)| e.attribute == attr)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            continue;
        }

        let current = attr.get(character);
        let prev_total: f64 = indices.iter().map(|&i| effects[i].applied).sum();
        let base = current - prev_total;

        let mut attr_floor = 0.0_f64;
        let mut targets = Vec::with_capacity(indices.len());
        for &i in &indices {
            let e = &effects[i];
            attr_floor = attr_floor.max(e.floor_value);
            let calc_base = base.max(e.floor_value);
            let mut delta = (calc_base * e.percentage).max(e.min_delta);
            if attr.is_integer() {
                delta = delta.round();
            }
            targets.push(e.kind.sign() * delta);
        }
        let target_total: f64 = targets.iter().sum();

        let new_value = if attr == StatAttribute::Crit {
            let raw = base + target_total;
            (round3(raw)).clamp(0.0, BalanceConfig::CRIT_CAP)
        } else {
            (base + target_total).round().max(attr_floor)
        };
        attr.set(character, new_value);

        let realized_total = attr.get(character) - base;
        if target_total.abs() < 1e-9 {
            for &i in &indices {
                effects[i].applied = 0.0;
            }
            continue;
        }
        let ratio = realized_total / target_total;
        if attr == StatAttribute::Crit {
            for (k, &i) in indices.iter().enumerate() {
                effects[i].applied = round3(targets[k] * ratio);
            }
        } else {
            let mut shares: Vec<i64> = targets.iter().map(|t| (t * ratio).round() as i64).collect();
            let drift = realized_total.round() as i64 - shares.iter().sum::<i64>();
            if drift != 0 {
                if let Some(last) = shares.last_mut() {
                    *last += drift;
                }
            }
            for (k, &i) in indices.iter().enumerate() {
                effects[i].applied = shares[k] as f64;
            }
        }
    }
    character.clamp_hp();
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
