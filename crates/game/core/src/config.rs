//! Balance configuration and tunable parameters.
//!
//! Every scaling, economy and combat function takes a [`BalanceConfig`] by
//! reference instead of reading process-wide constants, so tests can run
//! against alternate tunings deterministically.

/// Per-stat coefficient triple used by monster scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatTriple {
    pub hp: f64,
    pub atk: f64,
    pub def: f64,
}

impl StatTriple {
    pub const fn new(hp: f64, atk: f64, def: f64) -> Self {
        Self { hp, atk, def }
    }
}

/// Monster scaling parameters (level softcap, depth ramp, elite/boss tuning).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonsterScaling {
    /// Per-level growth fractions, applied to player level minus one.
    pub per_level: StatTriple,
    /// Per-depth growth fractions.
    pub per_depth: StatTriple,
    /// Levels past this threshold grow at a reduced rate.
    pub softcap_level: u32,
    /// Growth multiplier past the softcap.
    pub softcap_mult: f64,
    /// Elite stat bonus fractions.
    pub elite_bonus: StatTriple,
    /// Global boss dampening multipliers.
    pub boss_stat_mult: StatTriple,
    /// Boss nerf fades linearly to zero at this depth.
    pub early_boss_nerf_until_depth: u32,
    /// Maximum boss nerf fractions (at depth 0).
    pub early_boss_nerf: StatTriple,
    /// Monster atk may not exceed this fraction of the player's max hp.
    pub max_atk_vs_player_hp: f64,
    /// Monster def may not exceed this fraction of the player's atk + buff.
    pub max_def_vs_player_atk: f64,
    /// Boss reward multipliers on base xp / gold.
    pub boss_xp_mult: f64,
    pub boss_gold_mult: f64,
}

/// Player level-up growth.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Progression {
    pub level_xp_threshold: i64,
    pub level_hp_gain: i32,
    pub level_atk_gain: i32,
    pub level_def_gain: f64,
    /// Fraction of max hp restored on level-up.
    pub level_heal_ratio: f64,
    pub mage_pouv_gain_every_levels: u32,
    pub mage_level_pouv_gain: f64,
}

/// Per-turn regeneration rules.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegenRules {
    /// Hard per-turn cap.
    pub cap_flat: i32,
    /// Cap as a fraction of max hp.
    pub cap_frac: f64,
    /// Multiplier applied when the player took damage this turn.
    pub on_hit_mult: f64,
    /// Regeneration fires only every Nth turn.
    pub every_n_turns: u32,
}

/// Soft cap on POUV-driven scaling: `mult = 1 / (1 + excess * per_point)`,
/// clamped to `[floor_mult, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Softcap {
    pub start: f64,
    pub per_point: f64,
    pub floor_mult: f64,
}

impl Softcap {
    /// Multiplier for a given POUV value.
    pub fn mult(&self, pouv: f64) -> f64 {
        let excess = (pouv - self.start.max(0.0)).max(0.0);
        let mult = 1.0 / (1.0 + excess * self.per_point.max(0.0));
        mult.clamp(self.floor_mult, 1.0)
    }
}

/// Spell economy and magic-power tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MagicTuning {
    pub mage_start_spell_slots: u32,
    pub mage_spell_slot_every_levels: u32,
    pub summon_spell_cooldown_floors: u8,
    pub afterimage_cooldown_floors: u8,
    /// Mage multiplier on magic-utility specials carried by magic items.
    pub mage_magic_item_mult: f64,
    pub mage_pouv_stat_pct: f64,
    pub mage_pouv_per_level: f64,
    pub spell_damage_base_lvl_coeff: f64,
    pub spell_damage_base_pouv_coeff: f64,
    pub spell_damage_mult_pouv_coeff: f64,
    pub spell_heal_base_lvl_coeff: f64,
    pub spell_heal_base_pouv_coeff: f64,
    pub spell_heal_mult_pouv_coeff: f64,
    pub heal_softcap: Softcap,
    pub summon_softcap: Softcap,
    pub mage_special_pouv_coeff: f64,
    pub mage_special_damage_mult: f64,
    pub knight_special_pouv_coeff: f64,
}

/// Summon stat coefficients (POUV scaling).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummonTuning {
    pub pouv_hp: f64,
    pub pouv_atk: f64,
    pub pouv_def: f64,
    pub afterimage_pouv_hp: f64,
    pub afterimage_pouv_def: f64,
    pub horde_member_pouv_hp: f64,
    pub horde_member_pouv_atk: f64,
    pub horde_member_pouv_def: f64,
    pub horde_conversion_base: f64,
    pub horde_conversion_pouv_coeff: f64,
    pub horde_conversion_size_penalty: f64,
    pub horde_conversion_cap: f64,
}

/// Post-combat reward and drop tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RewardTuning {
    pub combat_xp_mult: f64,
    pub combat_gold_mult: f64,
    pub spell_drop_base_chance: f64,
    pub spell_drop_depth_bonus: f64,
    pub spell_drop_cap: f64,
    pub mage_spell_drop_mult: f64,
    pub mage_spell_drop_cap: f64,
    pub normal_key_drop_chance: f64,
    pub boss_bonus_key_chance: f64,
}

/// Full balance table, injected into every rules function.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BalanceConfig {
    pub monsters: MonsterScaling,
    pub progression: Progression,
    pub regen: RegenRules,
    pub magic: MagicTuning,
    pub summons: SummonTuning,
    pub rewards: RewardTuning,
}

impl BalanceConfig {
    // ===== compile-time structural caps =====
    /// Hard ceiling on critical chance.
    pub const CRIT_CAP: f64 = 0.9;
    /// Critical hits multiply damage by this factor.
    pub const CRIT_MULT: f64 = 1.8;
    /// Spell criticals use a reduced factor.
    pub const SPELL_CRIT_MULT: f64 = 1.65;
    /// Ordinary consumables stack up to this count per slot.
    pub const CONSUMABLE_STACK_MAX: u8 = 3;
    /// Fragment consumables stack higher.
    pub const FRAGMENT_STACK_MAX: u8 = 5;
    /// Equipment inventory slots.
    pub const INVENTORY_LIMIT: usize = 14;
    /// Consumable bag slots.
    pub const CONSUMABLE_SLOTS: usize = 10;
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            monsters: MonsterScaling {
                per_level: StatTriple::new(0.11, 0.09, 0.05),
                per_depth: StatTriple::new(0.14, 0.12, 0.07),
                softcap_level: 8,
                softcap_mult: 0.45,
                elite_bonus: StatTriple::new(0.40, 0.25, 0.20),
                boss_stat_mult: StatTriple::new(0.90, 0.92, 0.92),
                early_boss_nerf_until_depth: 10,
                early_boss_nerf: StatTriple::new(0.18, 0.14, 0.12),
                max_atk_vs_player_hp: 0.45,
                max_def_vs_player_atk: 0.85,
                boss_xp_mult: 1.35,
                boss_gold_mult: 1.40,
            },
            progression: Progression {
                level_xp_threshold: 40,
                level_hp_gain: 3,
                level_atk_gain: 1,
                level_def_gain: 0.5,
                level_heal_ratio: 0.40,
                mage_pouv_gain_every_levels: 2,
                mage_level_pouv_gain: 1.0,
            },
            regen: RegenRules {
                cap_flat: 5,
                cap_frac: 0.05,
                on_hit_mult: 0.5,
                every_n_turns: 1,
            },
            magic: MagicTuning {
                mage_start_spell_slots: 3,
                mage_spell_slot_every_levels: 2,
                summon_spell_cooldown_floors: 5,
                afterimage_cooldown_floors: 2,
                mage_magic_item_mult: 1.35,
                mage_pouv_stat_pct: 0.055,
                mage_pouv_per_level: 0.60,
                spell_damage_base_lvl_coeff: 0.24,
                spell_damage_base_pouv_coeff: 0.62,
                spell_damage_mult_pouv_coeff: 0.020,
                spell_heal_base_lvl_coeff: 0.30,
                spell_heal_base_pouv_coeff: 0.55,
                spell_heal_mult_pouv_coeff: 0.015,
                heal_softcap: Softcap {
                    start: 8.0,
                    per_point: 0.045,
                    floor_mult: 0.40,
                },
                summon_softcap: Softcap {
                    start: 8.0,
                    per_point: 0.035,
                    floor_mult: 0.45,
                },
                mage_special_pouv_coeff: 0.010,
                mage_special_damage_mult: 0.62,
                knight_special_pouv_coeff: 0.03,
            },
            summons: SummonTuning {
                pouv_hp: 1.30,
                pouv_atk: 0.24,
                pouv_def: 0.14,
                afterimage_pouv_hp: 1.20,
                afterimage_pouv_def: 0.10,
                horde_member_pouv_hp: 1.10,
                horde_member_pouv_atk: 0.26,
                horde_member_pouv_def: 0.12,
                horde_conversion_base: 0.42,
                horde_conversion_pouv_coeff: 0.007,
                horde_conversion_size_penalty: 0.03,
                horde_conversion_cap: 0.60,
            },
            rewards: RewardTuning {
                combat_xp_mult: 0.60,
                combat_gold_mult: 0.70,
                spell_drop_base_chance: 0.012,
                spell_drop_depth_bonus: 0.0012,
                spell_drop_cap: 0.08,
                mage_spell_drop_mult: 1.55,
                mage_spell_drop_cap: 0.12,
                normal_key_drop_chance: 0.06,
                boss_bonus_key_chance: 0.10,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softcap_is_identity_below_start() {
        let cap = Softcap {
            start: 8.0,
            per_point: 0.045,
            floor_mult: 0.40,
        };
        assert_eq!(cap.mult(0.0), 1.0);
        assert_eq!(cap.mult(8.0), 1.0);
    }

    #[test]
    fn softcap_decays_and_floors() {
        let cap = Softcap {
            start: 8.0,
            per_point: 0.045,
            floor_mult: 0.40,
        };
        // excess 10 -> 1 / 1.45
        let m = cap.mult(18.0);
        assert!((m - 1.0 / 1.45).abs() < 1e-12);
        // absurd pouv hits the floor
        assert_eq!(cap.mult(10_000.0), 0.40);
    }
}
