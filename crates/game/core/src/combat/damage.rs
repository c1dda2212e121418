//! The shared physical damage roll.

use crate::character::Character;
use crate::config::BalanceConfig;
use crate::rng::RngSource;

/// Optional attacker-side modifiers to a physical roll.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttackMods {
    /// Additive critical chance on top of the attacker's own.
    pub bonus_crit: f64,
    /// Flat penetration subtracted from the defender's defense.
    pub flat_def_pen: i32,
}

/// One physical damage roll: `max(0, atk - def)` plus a small variance,
/// then the critical multiplier. Returns the damage and whether it crit.
pub fn compute_damage(
    attacker: &Character,
    defender: &Character,
    mods: AttackMods,
    rng: &mut dyn RngSource,
) -> (i32, bool) {
    let eff_def = (defender.defense_value() - mods.flat_def_pen.max(0)).max(0);
    let base = (attacker.atk - eff_def).max(0);
    let variance = rng.range_i32(-2, 3);
    let mut dmg = (base + variance).max(0);
    let crit_chance = (attacker.crit + mods.bonus_crit).max(0.0);
    let is_crit = rng.chance(crit_chance);
    if is_crit {
        dmg = ((dmg as f64 * BalanceConfig::CRIT_MULT) as i32).max(1);
    }
    (dmg, is_crit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::testing::NeverRng;

    fn fighter(atk: i32, def: f64) -> Character {
        Character::new("f", 36, atk, def, 0.0)
    }

    #[test]
    fn zero_variance_roll_is_atk_minus_def() {
        // NeverRng yields the range minimum (-2) and never crits.
        let (dmg, crit) = compute_damage(
            &fighter(10, 0.0),
            &fighter(1, 3.0),
            AttackMods::default(),
            &mut NeverRng,
        );
        assert_eq!(dmg, 5); // 10 - 3 - 2
        assert!(!crit);
    }

    #[test]
    fn damage_floors_at_zero_against_heavy_armor() {
        let (dmg, _) = compute_damage(
            &fighter(3, 0.0),
            &fighter(1, 30.0),
            AttackMods::default(),
            &mut NeverRng,
        );
        assert_eq!(dmg, 0);
    }

    #[test]
    fn penetration_ignores_part_of_defense() {
        let mods = AttackMods {
            flat_def_pen: 3,
            ..Default::default()
        };
        let (dmg, _) = compute_damage(&fighter(10, 0.0), &fighter(1, 5.0), mods, &mut NeverRng);
        assert_eq!(dmg, 6); // 10 - (5-3) - 2
    }
}
