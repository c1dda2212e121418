//! Base combatant stats shared by the player, monsters and summons.

use crate::config::BalanceConfig;

/// A combatant's core statistics.
///
/// `hp` is always within `0..=max_hp`; reaching 0 means dead. `defense`
/// stays fractional because level growth accrues in half points; damage
/// math rounds it at the point of use.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Character {
    pub name: String,
    pub max_hp: i32,
    pub hp: i32,
    pub atk: i32,
    pub defense: f64,
    pub crit: f64,
}

impl Character {
    pub fn new(name: impl Into<String>, hp: i32, atk: i32, defense: f64, crit: f64) -> Self {
        Self {
            name: name.into(),
            max_hp: hp,
            hp,
            atk,
            defense,
            crit: crit.clamp(0.0, BalanceConfig::CRIT_CAP),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Applies damage, flooring hp at 0.
    pub fn take_damage(&mut self, amount: i32) {
        self.hp = (self.hp - amount.max(0)).max(0);
    }

    /// Restores hp up to `max_hp`; returns the amount actually healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
        self.hp - before
    }

    /// Re-clamps hp after a max-hp change.
    pub fn clamp_hp(&mut self) {
        self.hp = self.hp.clamp(0, self.max_hp.max(1));
    }

    /// Defense as the integer used by damage calculations.
    pub fn defense_value(&self) -> i32 {
        self.defense.round().max(0.0) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hp_floors_at_zero() {
        let mut c = Character::new("slime", 12, 3, 1.0, 0.02);
        c.take_damage(50);
        assert_eq!(c.hp, 0);
        assert!(!c.is_alive());
    }

    #[test]
    fn heal_never_exceeds_max() {
        let mut c = Character::new("slime", 12, 3, 1.0, 0.02);
        c.take_damage(5);
        assert_eq!(c.heal(100), 5);
        assert_eq!(c.hp, 12);
    }

    #[test]
    fn crit_is_capped_at_construction() {
        let c = Character::new("odd", 10, 1, 0.0, 2.0);
        assert_eq!(c.crit, BalanceConfig::CRIT_CAP);
    }
}
