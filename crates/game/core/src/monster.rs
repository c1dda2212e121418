//! Monster definitions and encounter scaling.
//!
//! Content supplies flat base definitions; [`scale_monster`] turns one
//! into a concrete opponent for the current player level, depth and
//! encounter kind, with guardrails so no roll can one-shot the player or
//! become unhittable.

use crate::character::Character;
use crate::config::{BalanceConfig, StatTriple};
use crate::player::Player;

/// Monster species the content layer can define.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MonsterKind {
    Slime,
    Bat,
    Goblin,
    Skeleton,
    Wraith,
    Devil,
    Dragon,
}

/// Base (unscaled) monster stats and rewards.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonsterDef {
    pub kind: MonsterKind,
    pub name: String,
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
    pub crit: f64,
    pub xp: i64,
    pub gold: i64,
}

impl MonsterDef {
    pub fn new(
        kind: MonsterKind,
        name: impl Into<String>,
        hp: i32,
        atk: i32,
        def: i32,
        crit: f64,
        xp: i64,
        gold: i64,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            hp,
            atk,
            def,
            crit,
            xp,
            gold,
        }
    }
}

/// How the monster was encountered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EncounterKind {
    Normal,
    Elite,
    Boss,
}

/// A fully scaled opponent with its (pre-combat-multiplier) rewards.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScaledMonster {
    pub kind: MonsterKind,
    pub encounter: EncounterKind,
    pub character: Character,
    pub xp: i64,
    pub gold: i64,
}

fn level_factor(levels: f64, per: f64, softcap_level: f64, softcap_mult: f64) -> f64 {
    let capped = levels.min(softcap_level);
    let excess = (levels - softcap_level).max(0.0);
    1.0 + capped * per + excess * per * softcap_mult
}

/// Scales a base definition for the current encounter.
///
/// Level growth softcaps past a threshold and depth growth ramps in over
/// the first floors, so early bosses do not spike. Two guardrails bind
/// the result to the player: monster atk is capped against the player's
/// max hp, monster def against the player's (buffed) atk.
pub fn scale_monster(
    def: &MonsterDef,
    player: &Player,
    depth: u32,
    encounter: EncounterKind,
    balance: &BalanceConfig,
) -> ScaledMonster {
    let m = &balance.monsters;
    let levels = player.level.saturating_sub(1) as f64;
    let depth_f = depth as f64;
    let ramp = (0.35 + depth_f * 0.09).min(1.0);
    let softcap_level = m.softcap_level as f64;

    let stat_mult = |per_level: f64, per_depth: f64| {
        level_factor(levels, per_level, softcap_level, m.softcap_mult)
            * (1.0 + depth_f * per_depth * ramp)
    };
    let mut hp_mult = stat_mult(m.per_level.hp, m.per_depth.hp);
    let mut atk_mult = stat_mult(m.per_level.atk, m.per_depth.atk);
    let mut def_mult = stat_mult(m.per_level.def, m.per_depth.def);

    if encounter != EncounterKind::Normal {
        hp_mult *= 1.0 + m.elite_bonus.hp;
        atk_mult *= 1.0 + m.elite_bonus.atk;
        def_mult *= 1.0 + m.elite_bonus.def;
    }
    if encounter == EncounterKind::Boss {
        let nerf = boss_nerf(depth, m.early_boss_nerf_until_depth, &m.early_boss_nerf);
        hp_mult *= m.boss_stat_mult.hp * (1.0 - nerf.hp);
        atk_mult *= m.boss_stat_mult.atk * (1.0 - nerf.atk);
        def_mult *= m.boss_stat_mult.def * (1.0 - nerf.def);
    }

    let hp = ((def.hp as f64 * hp_mult).round() as i32).max(1);
    let mut atk = ((def.atk as f64 * atk_mult).round() as i32).max(1);
    let mut defense = ((def.def as f64 * def_mult).round() as i32).max(0);

    atk = atk.min((player.character.max_hp as f64 * m.max_atk_vs_player_hp) as i32);
    let buffed_atk = player.character.atk + player.temp_buff.map_or(0, |b| b.atk);
    defense =
        defense.min(((buffed_atk as f64 * m.max_def_vs_player_atk).max(0.0)) as i32);

    let (xp, gold) = if encounter == EncounterKind::Boss {
        (
            (def.xp as f64 * m.boss_xp_mult) as i64,
            (def.gold as f64 * m.boss_gold_mult) as i64,
        )
    } else {
        (def.xp, def.gold)
    };

    ScaledMonster {
        kind: def.kind,
        encounter,
        character: Character::new(def.name.clone(), hp, atk, defense as f64, def.crit),
        xp,
        gold,
    }
}

/// Boss nerf fractions fading linearly to zero by the cutoff depth.
fn boss_nerf(depth: u32, until_depth: u32, max_nerf: &StatTriple) -> StatTriple {
    if depth > until_depth {
        return StatTriple::new(0.0, 0.0, 0.0);
    }
    let fade = (1.0 - depth as f64 / until_depth as f64).max(0.0);
    StatTriple::new(
        max_nerf.hp * fade,
        max_nerf.atk * fade,
        max_nerf.def * fade,
    )
}
