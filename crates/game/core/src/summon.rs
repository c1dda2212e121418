//! Persistent summons: guardian creatures, the afterimage and the horde.
//!
//! A summon lives on the player across fights and floors until it dies.
//! It guards a fraction of incoming monster damage and, when offensive,
//! strikes after the player each turn.

use crate::character::Character;
use crate::config::BalanceConfig;
use crate::content::ContentOracle;
use crate::magic::{self, SpellId};
use crate::monster::MonsterKind;
use crate::player::Player;

/// What was summoned.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SummonKind {
    /// A guardian creature derived from a monster definition.
    Creature(MonsterKind),
    /// Defensive clone: never attacks, intercepts most damage.
    Afterimage,
    /// Converted skeletons fighting as one unit.
    Horde { members: u32 },
}

/// An active summon.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summon {
    pub kind: SummonKind,
    pub character: Character,
    pub can_attack: bool,
    /// Fraction of incoming monster damage intercepted by the summon.
    pub guard_ratio: f64,
}

impl Summon {
    pub fn is_horde(&self) -> bool {
        matches!(self.kind, SummonKind::Horde { .. })
    }

    pub fn horde_members(&self) -> u32 {
        match self.kind {
            SummonKind::Horde { members } => members,
            _ => 0,
        }
    }
}

fn creature_kind(id: SpellId) -> MonsterKind {
    match id {
        SpellId::SummonSlime => MonsterKind::Slime,
        SpellId::SummonSkeleton => MonsterKind::Skeleton,
        SpellId::SummonDragon => MonsterKind::Dragon,
        _ => unreachable!("not a creature summon spell"),
    }
}

/// Builds the summon for a summon spell.
///
/// Creature stats derive from the species' base definition plus
/// POUV-scaled bonuses; the softcap keeps extreme POUV from stacking a
/// second health bar on the player.
pub fn summon_from_spell(
    player: &Player,
    content: &dyn ContentOracle,
    id: SpellId,
    balance: &BalanceConfig,
) -> Summon {
    let pouv = magic::pouv(player, balance).max(0) as f64;
    let pouv_eff = pouv * magic::summon_softcap_mult(player, balance);
    let s = &balance.summons;

    if id == SpellId::SummonAfterimage {
        let hp = ((player.character.max_hp as f64 * 0.45) as i32
            + 8
            + (pouv_eff * s.afterimage_pouv_hp) as i32)
            .max(18);
        let def = ((player.character.defense * 0.25) as i32
            + (pouv_eff * s.afterimage_pouv_def) as i32)
            .max(0);
        return Summon {
            kind: SummonKind::Afterimage,
            character: Character::new("Afterimage", hp, 0, def as f64, 0.0),
            can_attack: false,
            guard_ratio: 0.80,
        };
    }

    let kind = creature_kind(id);
    let def = content.monster_def(kind);
    let base = |stat: i32| (stat as f64 * 0.55) as i32;
    let hp = (base(def.hp) + 6 + (pouv_eff * s.pouv_hp) as i32).max(8);
    let atk = (base(def.atk) + 1 + (pouv_eff * s.pouv_atk) as i32).max(1);
    let defense = (base(def.def) + (pouv_eff * s.pouv_def) as i32).max(0);
    let crit = (0.03 + pouv_eff * 0.003).min(0.30);
    Summon {
        kind: SummonKind::Creature(kind),
        character: Character::new(def.name.clone(), hp, atk, defense as f64, crit),
        can_attack: true,
        guard_ratio: 0.50,
    }
}

fn horde_member_stats(pouv_eff: f64, balance: &BalanceConfig) -> (i32, i32, i32, f64) {
    let s = &balance.summons;
    let hp = (12 + (pouv_eff * s.horde_member_pouv_hp) as i32).max(8);
    let atk = (3 + (pouv_eff * s.horde_member_pouv_atk) as i32).max(1);
    let def = (1 + (pouv_eff * s.horde_member_pouv_def) as i32).max(0);
    let crit = (0.02 + pouv_eff * 0.002).min(0.30);
    (hp, atk, def, crit)
}

/// Chance to convert an enemy skeleton into horde member number
/// `new_count`. Grows with POUV, shrinks with each existing member.
pub fn conversion_chance(player: &Player, new_count: u32, balance: &BalanceConfig) -> f64 {
    let s = &balance.summons;
    let pouv = magic::pouv(player, balance).max(0) as f64;
    let chance = s.horde_conversion_base + pouv * s.horde_conversion_pouv_coeff
        - (new_count.saturating_sub(1)) as f64 * s.horde_conversion_size_penalty;
    chance.clamp(0.05, s.horde_conversion_cap)
}

/// Starts a fresh one-member horde.
pub fn create_horde(player: &Player, balance: &BalanceConfig) -> Summon {
    build_horde(player, 1, 1.0, balance)
}

/// Adds a member to an existing horde, preserving the hp ratio.
pub fn grow_horde(summon: &Summon, player: &Player, balance: &BalanceConfig) -> Summon {
    let members = summon.horde_members() + 1;
    let ratio = if summon.character.max_hp > 0 {
        summon.character.hp as f64 / summon.character.max_hp as f64
    } else {
        1.0
    };
    build_horde(player, members, ratio, balance)
}

fn build_horde(player: &Player, members: u32, hp_ratio: f64, balance: &BalanceConfig) -> Summon {
    let pouv = magic::pouv(player, balance).max(0) as f64;
    let pouv_eff = pouv * magic::summon_softcap_mult(player, balance);
    let (m_hp, m_atk, m_def, crit) = horde_member_stats(pouv_eff, balance);
    let max_hp = m_hp * members as i32;
    let mut character = Character::new(
        "Skeleton Horde",
        max_hp,
        m_atk * members as i32,
        (m_def + (members as f64 * 0.12) as i32) as f64,
        crit,
    );
    character.hp = ((max_hp as f64 * hp_ratio).round() as i32).clamp(1, max_hp);
    Summon {
        kind: SummonKind::Horde { members },
        character,
        can_attack: true,
        guard_ratio: 0.45,
    }
}
