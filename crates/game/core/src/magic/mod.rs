//! Spell identities, the per-floor casting economy and exploration casts.
//!
//! Spells are identified by a closed enum; names, rarities and power
//! values come from the content layer through [`ContentOracle`]. Slots
//! reset on floor transition, so the cast budget is a per-floor resource
//! rather than a mana pool.

pub mod economy;

use crate::config::BalanceConfig;
use crate::content::ContentOracle;
use crate::items::Rarity;
use crate::player::Player;
use crate::stats::SpecialKind;
use crate::summon;

pub use economy::{
    cast_limit, casts_left, damage_base, damage_mult, explore_spell_duration, heal_base,
    heal_mult, heal_softcap_mult, pouv, pouv_breakdown, power_mult, slot_cost,
    summon_softcap_mult, teleport_cooldown_duration, PouvBreakdown,
};

/// Every spell the engine knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellId {
    // ===== common =====
    Pulse,
    Clairvoyance,
    WardingMist,
    Mending,
    // ===== rare =====
    Spark,
    Frostbind,
    WitheringHex,
    SunderWard,
    Arcbolt,
    ArcaneSkin,
    GildTouch,
    SummonSlime,
    GreaterMending,
    // ===== epic =====
    Siphon,
    Rift,
    SummonSkeleton,
    SummonAfterimage,
    CallOfDead,
    Prospection,
    FocusSigil,
    Teleport,
    // ===== legendary =====
    Nova,
    Comet,
    SummonDragon,
}

/// Where a spell can be cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellKind {
    Combat,
    Explore,
}

impl SpellId {
    pub fn kind(self) -> SpellKind {
        match self {
            Self::Clairvoyance
            | Self::WardingMist
            | Self::ArcaneSkin
            | Self::GildTouch
            | Self::Prospection
            | Self::FocusSigil
            | Self::Teleport => SpellKind::Explore,
            _ => SpellKind::Combat,
        }
    }

    /// Persistent-summon spells. `CallOfDead` converts instead of
    /// summoning, so it is excluded here.
    pub fn is_summon(self) -> bool {
        matches!(
            self,
            Self::SummonSlime | Self::SummonSkeleton | Self::SummonDragon | Self::SummonAfterimage
        )
    }

    /// Cantrips cost no slots.
    pub fn is_cantrip(self) -> bool {
        matches!(self, Self::Pulse)
    }

    /// Healing spells usable both in and out of combat.
    pub fn is_heal(self) -> bool {
        matches!(self, Self::Mending | Self::GreaterMending)
    }

    /// Floor cooldown after a successful summon cast.
    pub fn summon_cooldown(self, balance: &BalanceConfig) -> u8 {
        match self {
            Self::SummonAfterimage => balance.magic.afterimage_cooldown_floors,
            _ => balance.magic.summon_spell_cooldown_floors,
        }
    }

    /// The exploration effect stays non-stacking for these spells.
    fn is_floor_effect(self) -> bool {
        matches!(
            self,
            Self::Clairvoyance | Self::WardingMist | Self::ArcaneSkin | Self::FocusSigil
        )
    }
}

/// Static spell data supplied by the content layer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spell {
    pub id: SpellId,
    pub name: String,
    pub rarity: Rarity,
    pub power: f64,
}

impl Spell {
    pub fn new(id: SpellId, name: impl Into<String>, rarity: Rarity, power: f64) -> Self {
        Self {
            id,
            name: name.into(),
            rarity,
            power,
        }
    }

    pub fn kind(&self) -> SpellKind {
        self.id.kind()
    }
}

/// Reasons a cast is refused. None of these mutate the player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CastError {
    #[error("no grimoire")]
    GrimoireLocked,
    #[error("spell not in the grimoire")]
    NotKnown,
    #[error("not enough spell slots (cost {cost}, {left} left)")]
    NotEnoughSlots { cost: u32, left: u32 },
    #[error("a summon is already active")]
    SummonActive,
    #[error("summon spell recharging for {floors} more floor(s)")]
    SummonOnCooldown { floors: u8 },
    #[error("teleport recharging for {floors} more floor(s)")]
    TeleportOnCooldown { floors: u8 },
    #[error("that effect is already active")]
    AlreadyActive,
    #[error("this spell can only be cast in combat")]
    CombatOnly,
    #[error("this spell cannot be cast in combat")]
    ExploreOnly,
    #[error("this spell can only target a skeleton in combat")]
    NoValidTarget,
}

/// What an out-of-combat cast did.
#[derive(Debug, Clone, PartialEq)]
pub enum ExploreOutcome {
    Summoned { name: String, hp: i32 },
    Healed(i32),
    GoldGained(i64),
    EffectActivated { spell: SpellId, floors: u8 },
    Teleported { cooldown: u8 },
}

/// Checks whether the player can pay a spell's slot cost right now.
pub fn can_pay(player: &Player, spell: &Spell, balance: &BalanceConfig) -> bool {
    let cost = slot_cost(spell);
    cost == 0 || casts_left(player, balance) >= cost
}

/// Books the slot cost of a cast.
pub fn spend(player: &mut Player, spell: &Spell) {
    player.spells_cast_this_floor += slot_cost(spell);
}

fn ensure_payable(player: &Player, spell: &Spell, balance: &BalanceConfig) -> Result<(), CastError> {
    if can_pay(player, spell, balance) {
        Ok(())
    } else {
        Err(CastError::NotEnoughSlots {
            cost: slot_cost(spell),
            left: casts_left(player, balance),
        })
    }
}

/// Casts a spell outside combat.
///
/// Summons and heals work anywhere; pure combat spells are refused with
/// [`CastError::CombatOnly`]. Slot costs are only spent once every
/// precondition has passed.
pub fn cast_explore_spell(
    player: &mut Player,
    content: &dyn ContentOracle,
    id: SpellId,
    balance: &BalanceConfig,
) -> Result<ExploreOutcome, CastError> {
    if !player.spellbook_unlocked {
        return Err(CastError::GrimoireLocked);
    }
    if !player.knows_spell(id) {
        return Err(CastError::NotKnown);
    }
    let spell = content.spell(id).clone();
    ensure_payable(player, &spell, balance)?;

    if id.is_summon() {
        if player.summon.is_some() {
            return Err(CastError::SummonActive);
        }
        let cd = player.summon_cooldown_left(id);
        if cd > 0 {
            return Err(CastError::SummonOnCooldown { floors: cd });
        }
        let summon = summon::summon_from_spell(player, content, id, balance);
        let (name, hp) = (summon.character.name.clone(), summon.character.hp);
        player.summon = Some(summon);
        player.set_summon_cooldown(id, id.summon_cooldown(balance));
        spend(player, &spell);
        tracing::debug!(spell = %id, %name, "summon called");
        return Ok(ExploreOutcome::Summoned { name, hp });
    }

    if id.is_heal() {
        let ratio = if id == SpellId::GreaterMending { 1.15 } else { 0.95 };
        let amount = economy::heal_amount(player, spell.power, ratio, balance);
        let healed = player.character.heal(amount);
        spend(player, &spell);
        return Ok(ExploreOutcome::Healed(healed));
    }

    if spell.kind() != SpellKind::Explore {
        return Err(CastError::CombatOnly);
    }

    match id {
        SpellId::Prospection | SpellId::GildTouch => {
            let gain = (spell.power * power_mult(player, balance)) as i64;
            player.gold += gain;
            spend(player, &spell);
            Ok(ExploreOutcome::GoldGained(gain))
        }
        SpellId::Teleport => {
            if player.teleport_cooldown > 0 {
                return Err(CastError::TeleportOnCooldown {
                    floors: player.teleport_cooldown,
                });
            }
            let cooldown = teleport_cooldown_duration(player, balance);
            player.teleport_cooldown = cooldown;
            spend(player, &spell);
            Ok(ExploreOutcome::Teleported { cooldown })
        }
        _ if id.is_floor_effect() => {
            if player
                .active_explore_spells
                .iter()
                .any(|(sid, rem)| *sid == id && *rem > 0)
            {
                return Err(CastError::AlreadyActive);
            }
            let floors = explore_spell_duration(player, balance);
            let _ = player.active_explore_spells.try_push((id, floors));
            rebuild_floor_specials(player, content, balance);
            spend(player, &spell);
            Ok(ExploreOutcome::EffectActivated { spell: id, floors })
        }
        _ => Err(CastError::CombatOnly),
    }
}

/// Effective bonus values for the stat-granting exploration spells.
///
/// POUV scales each one, so the same scroll is stronger in a Mage's
/// hands.
pub fn explore_stat_values(
    player: &Player,
    spell: &Spell,
    balance: &BalanceConfig,
) -> Vec<(SpecialKind, f64)> {
    let pouv = pouv(player, balance).max(0) as f64;
    match spell.id {
        SpellId::ArcaneSkin | SpellId::WardingMist => {
            let pouv_mult = 1.0 + (pouv * 0.015).min(0.50);
            let bonus = (spell.power * power_mult(player, balance) * pouv_mult)
                .round()
                .max(1.0);
            vec![(SpecialKind::SpellDefense, bonus)]
        }
        SpellId::FocusSigil => {
            let crit_gain = round3(0.01 + (pouv * 0.0015).min(0.05));
            let power_gain = round3(0.10 + (pouv * 0.01).min(0.30));
            vec![
                (SpecialKind::SpellCrit, crit_gain),
                (SpecialKind::SpellPower, power_gain),
            ]
        }
        _ => Vec::new(),
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Rebuilds floor specials from the currently active exploration spells.
///
/// The accumulator is cleared first; re-application uses max semantics so
/// overlapping sources never stack.
pub fn rebuild_floor_specials(
    player: &mut Player,
    content: &dyn ContentOracle,
    balance: &BalanceConfig,
) {
    player.floor_specials.clear();
    let active: Vec<SpellId> = player
        .active_explore_spells
        .iter()
        .filter(|(_, rem)| *rem > 0)
        .map(|(id, _)| *id)
        .collect();
    for id in active {
        let spell = content.spell(id).clone();
        match id {
            SpellId::Clairvoyance => {
                let bonus = (spell.power * power_mult(player, balance)).round().max(0.0);
                player.floor_specials.raise_to(SpecialKind::FovBonus, bonus);
            }
            _ => {
                for (kind, value) in explore_stat_values(player, &spell, balance) {
                    player.floor_specials.raise_to(kind, value);
                }
            }
        }
    }
}

/// Advances the magic economy across a floor transition.
///
/// Resets the cast budget, ticks the teleport and summon cooldowns and
/// expires exploration spells, then rebuilds floor specials from the
/// survivors.
pub fn on_floor_transition(
    player: &mut Player,
    content: &dyn ContentOracle,
    balance: &BalanceConfig,
) {
    player.spells_cast_this_floor = 0;
    if player.teleport_cooldown > 0 {
        player.teleport_cooldown -= 1;
    }
    player.summon_cooldowns.retain(|(_, cd)| {
        *cd = cd.saturating_sub(1);
        *cd > 0
    });
    player.active_explore_spells.retain(|(_, rem)| {
        *rem = rem.saturating_sub(1);
        *rem > 0
    });
    rebuild_floor_specials(player, content, balance);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::testing::StubContent;
    use crate::player::ClassKind;

    fn mage() -> Player {
        Player::new("Mira", ClassKind::Mage)
    }

    fn balance() -> BalanceConfig {
        BalanceConfig::default()
    }

    #[test]
    fn unknown_spell_is_refused() {
        let (content, b) = (StubContent::new(), balance());
        let mut p = mage();
        let err = cast_explore_spell(&mut p, &content, SpellId::Comet, &b).unwrap_err();
        assert_eq!(err, CastError::NotKnown);
    }

    #[test]
    fn combat_spell_refused_out_of_combat() {
        let (content, b) = (StubContent::new(), balance());
        let mut p = mage();
        p.learn_spell(SpellId::Spark);
        let err = cast_explore_spell(&mut p, &content, SpellId::Spark, &b).unwrap_err();
        assert_eq!(err, CastError::CombatOnly);
        assert_eq!(p.spells_cast_this_floor, 0);
    }

    #[test]
    fn slot_budget_blocks_casts_without_spending() {
        let (content, b) = (StubContent::new(), balance());
        let mut p = mage();
        p.learn_spell(SpellId::Prospection);
        p.spells_cast_this_floor = cast_limit(&p, &b);
        let err = cast_explore_spell(&mut p, &content, SpellId::Prospection, &b).unwrap_err();
        assert!(matches!(err, CastError::NotEnoughSlots { cost: 2, .. }));
        assert_eq!(p.gold, 0);
    }

    #[test]
    fn cantrip_costs_nothing_even_at_zero_slots() {
        let (content, b) = (StubContent::new(), balance());
        let mut p = mage();
        p.spells_cast_this_floor = cast_limit(&p, &b);
        assert!(can_pay(&p, content.spell(SpellId::Pulse), &b));
    }

    #[test]
    fn gold_transmutation_pays_out_and_spends() {
        let (content, b) = (StubContent::new(), balance());
        let mut p = mage();
        p.learn_spell(SpellId::GildTouch);
        let outcome = cast_explore_spell(&mut p, &content, SpellId::GildTouch, &b).unwrap();
        let ExploreOutcome::GoldGained(gain) = outcome else {
            panic!("expected gold outcome");
        };
        assert!(gain > 0);
        assert_eq!(p.gold, gain);
        assert_eq!(p.spells_cast_this_floor, 1);
    }

    #[test]
    fn floor_effect_cannot_stack() {
        let (content, b) = (StubContent::new(), balance());
        let mut p = mage();
        p.learn_spell(SpellId::WardingMist);
        cast_explore_spell(&mut p, &content, SpellId::WardingMist, &b).unwrap();
        assert!(p.floor_specials.get(SpecialKind::SpellDefense) >= 1.0);
        let err = cast_explore_spell(&mut p, &content, SpellId::WardingMist, &b).unwrap_err();
        assert_eq!(err, CastError::AlreadyActive);
    }

    #[test]
    fn floor_transition_resets_budget_and_expires_effects() {
        let (content, b) = (StubContent::new(), balance());
        let mut p = mage();
        p.learn_spell(SpellId::WardingMist);
        cast_explore_spell(&mut p, &content, SpellId::WardingMist, &b).unwrap();
        let floors = p.active_explore_spells[0].1;
        p.spells_cast_this_floor = 3;
        for _ in 0..floors {
            on_floor_transition(&mut p, &content, &b);
        }
        assert_eq!(p.spells_cast_this_floor, 0);
        assert!(p.active_explore_spells.is_empty());
        assert!(p.floor_specials.is_empty());
    }

    #[test]
    fn summon_cast_sets_cooldown_and_blocks_second_summon() {
        let (content, b) = (StubContent::new(), balance());
        let mut p = mage();
        p.learn_spell(SpellId::SummonSlime);
        p.learn_spell(SpellId::SummonSkeleton);
        let outcome = cast_explore_spell(&mut p, &content, SpellId::SummonSlime, &b).unwrap();
        assert!(matches!(outcome, ExploreOutcome::Summoned { .. }));
        assert_eq!(
            p.summon_cooldown_left(SpellId::SummonSlime),
            b.magic.summon_spell_cooldown_floors
        );
        let err = cast_explore_spell(&mut p, &content, SpellId::SummonSkeleton, &b).unwrap_err();
        assert_eq!(err, CastError::SummonActive);
    }

    #[test]
    fn teleport_respects_its_cooldown() {
        let (content, b) = (StubContent::new(), balance());
        let mut p = mage();
        p.learn_spell(SpellId::Teleport);
        let outcome = cast_explore_spell(&mut p, &content, SpellId::Teleport, &b).unwrap();
        let ExploreOutcome::Teleported { cooldown } = outcome else {
            panic!("expected teleport outcome");
        };
        assert!(cooldown >= 1);
        let err = cast_explore_spell(&mut p, &content, SpellId::Teleport, &b).unwrap_err();
        assert!(matches!(err, CastError::TeleportOnCooldown { .. }));
    }
}
