//! In-combat spell resolution.

use crate::config::BalanceConfig;
use crate::content::ContentOracle;
use crate::magic::{self, CastError, Spell, SpellId, SpellKind};
use crate::monster::MonsterKind;
use crate::player::Player;
use crate::rng::RngSource;
use crate::stats::SpecialKind;
use crate::summon;

use super::{CombatEvent, CombatState};

/// What kind of turn a successful cast was; damage casts trigger the
/// summon's follow-up strike.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum SpellAction {
    Damage,
    Utility,
    Summon,
    Convert,
}

/// Variance window and scaling coefficient per damaging spell.
struct DamageProfile {
    coeff: f64,
    var_min: i32,
    var_max: i32,
    /// Flat +1 carried by the heavy impact spells.
    impact_bonus: i32,
    /// Whether the flat `SpellDamage` special applies.
    takes_bonus: bool,
}

fn damage_profile(id: SpellId) -> Option<DamageProfile> {
    let p = |coeff, var_min, var_max, impact_bonus, takes_bonus| DamageProfile {
        coeff,
        var_min,
        var_max,
        impact_bonus,
        takes_bonus,
    };
    Some(match id {
        SpellId::Pulse => p(0.62, 0, 1, 0, true),
        SpellId::Spark => p(0.92, 0, 3, 0, true),
        SpellId::Frostbind => p(0.80, 0, 3, 0, false),
        SpellId::WitheringHex => p(0.72, 0, 2, 0, false),
        SpellId::SunderWard => p(0.72, 0, 2, 0, false),
        SpellId::Arcbolt => p(1.05, 0, 6, 0, true),
        SpellId::Siphon => p(0.90, 0, 4, 0, false),
        SpellId::Rift => p(1.18, 1, 5, 1, true),
        SpellId::Nova => p(1.32, 1, 6, 1, true),
        SpellId::Comet => p(1.40, 1, 7, 1, true),
        _ => return None,
    })
}

fn damage_roll(
    player: &Player,
    power: f64,
    profile: &DamageProfile,
    rng: &mut dyn RngSource,
    balance: &BalanceConfig,
) -> i32 {
    let base = magic::damage_base(player, power, balance);
    let scaled = (base * profile.coeff * magic::damage_mult(player, balance)) as i32;
    (scaled + rng.range_i32(profile.var_min, profile.var_max)).max(1)
}

pub(super) fn resolve_combat_spell(
    state: &mut CombatState,
    player: &mut Player,
    content: &dyn ContentOracle,
    id: SpellId,
    rng: &mut dyn RngSource,
    balance: &BalanceConfig,
    events: &mut Vec<CombatEvent>,
) -> Result<SpellAction, CastError> {
    if !player.spellbook_unlocked {
        return Err(CastError::GrimoireLocked);
    }
    if !player.knows_spell(id) {
        return Err(CastError::NotKnown);
    }
    if id.kind() != SpellKind::Combat {
        return Err(CastError::ExploreOnly);
    }
    let spell = content.spell(id).clone();
    if !magic::can_pay(player, &spell, balance) {
        return Err(CastError::NotEnoughSlots {
            cost: magic::slot_cost(&spell),
            left: magic::casts_left(player, balance),
        });
    }

    if id == SpellId::CallOfDead {
        return convert_skeleton(state, player, &spell, rng, balance, events);
    }
    if id.is_summon() {
        return summon_in_combat(player, content, &spell, balance, events);
    }
    if id.is_heal() {
        let ratio = if id == SpellId::GreaterMending { 1.15 } else { 0.95 };
        let amount = magic::economy::heal_amount(player, spell.power, ratio, balance);
        let healed = player.character.heal(amount);
        magic::spend(player, &spell);
        events.push(CombatEvent::SpellHeal { spell: id, healed });
        return Ok(SpellAction::Utility);
    }

    damage_cast(state, player, &spell, rng, balance, events)
}

fn damage_cast(
    state: &mut CombatState,
    player: &mut Player,
    spell: &Spell,
    rng: &mut dyn RngSource,
    balance: &BalanceConfig,
    events: &mut Vec<CombatEvent>,
) -> Result<SpellAction, CastError> {
    let id = spell.id;
    let profile = damage_profile(id).expect("every remaining combat spell deals damage");
    let specs = player.all_specials(balance);
    let flat_bonus = if profile.takes_bonus {
        specs.get(SpecialKind::SpellDamage).round() as i32
    } else {
        0
    };
    let spell_mult = state.frag_spell_mult();
    let crit_chance = (player.character.crit * 0.65
        + specs.get(SpecialKind::SpellCrit).max(0.0))
    .clamp(0.0, BalanceConfig::CRIT_CAP);
    let crit = rng.chance(crit_chance);

    let roll = damage_roll(player, spell.power, &profile, rng, balance);
    let mut dmg = ((roll + profile.impact_bonus + flat_bonus) as f64 * spell_mult) as i32;
    if crit {
        dmg = ((dmg as f64 * BalanceConfig::SPELL_CRIT_MULT) as i32).max(1);
    }
    state.monster.character.take_damage(dmg);

    let pouv = magic::pouv(player, balance) as f64;
    match id {
        SpellId::Frostbind => {
            let weaken = ((1.0 + pouv * 0.16) as i32).max(1);
            state.apply_weaken(weaken, 2);
            events.push(CombatEvent::SpellDamage { spell: id, damage: dmg, crit });
            events.push(CombatEvent::EnemyWeakened { amount: weaken, turns: 2 });
        }
        SpellId::WitheringHex => {
            let weaken = ((2.0 + pouv * 0.22) as i32).max(1);
            state.apply_weaken(weaken, 3);
            events.push(CombatEvent::SpellDamage { spell: id, damage: dmg, crit });
            events.push(CombatEvent::EnemyWeakened { amount: weaken, turns: 3 });
        }
        SpellId::SunderWard => {
            let shred = ((1.0 + pouv * 0.20) as i32).max(1);
            state.apply_shred(shred, 3);
            events.push(CombatEvent::SpellDamage { spell: id, damage: dmg, crit });
            events.push(CombatEvent::EnemyDefShredded { amount: shred, turns: 3 });
        }
        SpellId::Siphon => {
            let healed = player.character.heal(((dmg as f64 * 0.25) as i32).max(1));
            events.push(CombatEvent::SpellDrain { spell: id, damage: dmg, healed, crit });
        }
        _ => {
            events.push(CombatEvent::SpellDamage { spell: id, damage: dmg, crit });
        }
    }
    magic::spend(player, spell);
    Ok(SpellAction::Damage)
}

fn summon_in_combat(
    player: &mut Player,
    content: &dyn ContentOracle,
    spell: &Spell,
    balance: &BalanceConfig,
    events: &mut Vec<CombatEvent>,
) -> Result<SpellAction, CastError> {
    if player.summon.is_some() {
        return Err(CastError::SummonActive);
    }
    let cd = player.summon_cooldown_left(spell.id);
    if cd > 0 {
        return Err(CastError::SummonOnCooldown { floors: cd });
    }
    let summon = summon::summon_from_spell(player, content, spell.id, balance);
    let name = summon.character.name.clone();
    player.summon = Some(summon);
    player.set_summon_cooldown(spell.id, spell.id.summon_cooldown(balance));
    magic::spend(player, spell);
    events.push(CombatEvent::SummonCalled { name });
    Ok(SpellAction::Summon)
}

/// Attempts to fold the enemy skeleton into the player's horde.
///
/// The slot is spent on the attempt itself; a failed roll is a wasted
/// turn and the monster answers normally.
fn convert_skeleton(
    state: &mut CombatState,
    player: &mut Player,
    spell: &Spell,
    rng: &mut dyn RngSource,
    balance: &BalanceConfig,
    events: &mut Vec<CombatEvent>,
) -> Result<SpellAction, CastError> {
    if state.monster.kind != MonsterKind::Skeleton {
        return Err(CastError::NoValidTarget);
    }
    if player.summon.as_ref().is_some_and(|s| !s.is_horde()) {
        return Err(CastError::SummonActive);
    }
    let current = player.summon.as_ref().map_or(0, |s| s.horde_members());
    let chance = summon::conversion_chance(player, current + 1, balance);
    magic::spend(player, spell);
    if rng.chance(chance) {
        let horde = match player.summon.as_ref() {
            Some(existing) => summon::grow_horde(existing, player, balance),
            None => summon::create_horde(player, balance),
        };
        let members = horde.horde_members();
        player.summon = Some(horde);
        state.monster.character.hp = 0;
        events.push(CombatEvent::HordeConverted { chance, members });
        Ok(SpellAction::Convert)
    } else {
        events.push(CombatEvent::HordeConversionFailed { chance });
        Ok(SpellAction::Utility)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{step, CombatAction, CombatActionError, CombatOutcome};
    use crate::content::testing::StubContent;
    use crate::monster::{scale_monster, EncounterKind};
    use crate::player::ClassKind;
    use crate::rng::testing::{NeverRng, ScriptedRng};

    fn balance() -> BalanceConfig {
        BalanceConfig::default()
    }

    fn mage() -> Player {
        Player::new("Mira", ClassKind::Mage)
    }

    fn fight(player: &Player, kind: MonsterKind, b: &BalanceConfig) -> CombatState {
        let content = StubContent::new();
        let def = content.monster_def(kind).clone();
        let scaled = scale_monster(&def, player, 0, EncounterKind::Normal, b);
        CombatState::new(player, scaled, 0, b)
    }

    const NO: u32 = u32::MAX;

    #[test]
    fn rare_spell_needs_a_slot_and_spends_one() {
        let b = balance();
        let content = StubContent::new();
        let mut p = mage();
        p.learn_spell(SpellId::Spark);
        let mut state = fight(&p, MonsterKind::Goblin, &b);
        // crit no, variance min 0, then riposte variance/crit
        let mut rng = ScriptedRng::new(vec![NO, 0, 2, NO]);
        let hp_before = state.monster.character.hp;
        step(&mut state, &mut p, &content, CombatAction::CastSpell(SpellId::Spark), &mut rng, &b)
            .unwrap();
        assert!(state.monster.character.hp < hp_before);
        assert_eq!(p.spells_cast_this_floor, 1);
    }

    #[test]
    fn exhausted_slots_refuse_the_cast_without_mutation() {
        let b = balance();
        let content = StubContent::new();
        let mut p = mage();
        p.learn_spell(SpellId::Spark);
        p.spells_cast_this_floor = magic::cast_limit(&p, &b);
        let mut state = fight(&p, MonsterKind::Goblin, &b);
        let hp = state.monster.character.hp;
        let err = step(
            &mut state,
            &mut p,
            &content,
            CombatAction::CastSpell(SpellId::Spark),
            &mut NeverRng,
            &b,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CombatActionError::Cast(CastError::NotEnoughSlots { cost: 1, .. })
        ));
        assert_eq!(state.monster.character.hp, hp);
        assert_eq!(state.turn, 0);
    }

    #[test]
    fn explore_spell_is_refused_in_combat() {
        let b = balance();
        let content = StubContent::new();
        let mut p = mage();
        p.learn_spell(SpellId::Clairvoyance);
        let mut state = fight(&p, MonsterKind::Goblin, &b);
        let err = step(
            &mut state,
            &mut p,
            &content,
            CombatAction::CastSpell(SpellId::Clairvoyance),
            &mut NeverRng,
            &b,
        )
        .unwrap_err();
        assert_eq!(err, CombatActionError::Cast(CastError::ExploreOnly));
    }

    #[test]
    fn frostbind_weakens_the_riposte() {
        let b = balance();
        let content = StubContent::new();
        let mut p = mage();
        p.learn_spell(SpellId::Frostbind);
        let mut state = fight(&p, MonsterKind::Goblin, &b);
        // spell crit no, spell variance 0; riposte variance 0, crit no
        let mut rng = ScriptedRng::new(vec![NO, 0, 2, NO]);
        let report = step(
            &mut state,
            &mut p,
            &content,
            CombatAction::CastSpell(SpellId::Frostbind),
            &mut rng,
            &b,
        )
        .unwrap();
        let weaken = report
            .events
            .iter()
            .find_map(|e| match e {
                CombatEvent::EnemyWeakened { amount, .. } => Some(*amount),
                _ => None,
            })
            .expect("weaken applied");
        // goblin atk 6 - mage def 2 = 4, minus the weaken amount
        let hit = report
            .events
            .iter()
            .find_map(|e| match e {
                CombatEvent::MonsterHit { damage, .. } => Some(*damage),
                _ => None,
            })
            .unwrap();
        assert_eq!(hit, (4 - weaken).max(0));
    }

    #[test]
    fn conversion_only_works_on_skeletons() {
        let b = balance();
        let content = StubContent::new();
        let mut p = mage();
        p.learn_spell(SpellId::CallOfDead);
        let mut state = fight(&p, MonsterKind::Goblin, &b);
        let err = step(
            &mut state,
            &mut p,
            &content,
            CombatAction::CastSpell(SpellId::CallOfDead),
            &mut NeverRng,
            &b,
        )
        .unwrap_err();
        assert_eq!(err, CombatActionError::Cast(CastError::NoValidTarget));
        assert_eq!(p.spells_cast_this_floor, 0);
    }

    #[test]
    fn successful_conversion_wins_the_fight_with_a_horde() {
        let b = balance();
        let content = StubContent::new();
        let mut p = mage();
        p.learn_spell(SpellId::CallOfDead);
        let mut state = fight(&p, MonsterKind::Skeleton, &b);
        // conversion roll passes, then victory rolls all miss
        let mut rng = ScriptedRng::new(vec![0, 0, NO, NO, NO, NO]);
        let report = step(
            &mut state,
            &mut p,
            &content,
            CombatAction::CastSpell(SpellId::CallOfDead),
            &mut rng,
            &b,
        )
        .unwrap();
        assert!(matches!(report.outcome, Some(CombatOutcome::Victory(_))));
        let horde = p.summon.as_ref().expect("horde summoned");
        assert_eq!(horde.horde_members(), 1);
        assert_eq!(p.spells_cast_this_floor, 2);
    }

    #[test]
    fn failed_conversion_wastes_the_turn_and_monster_answers() {
        let b = balance();
        let content = StubContent::new();
        let mut p = mage();
        p.learn_spell(SpellId::CallOfDead);
        let mut state = fight(&p, MonsterKind::Skeleton, &b);
        // conversion roll fails; riposte variance 0, crit no
        let mut rng = ScriptedRng::new(vec![NO, 2, NO]);
        let hp_before = p.character.hp;
        let report = step(
            &mut state,
            &mut p,
            &content,
            CombatAction::CastSpell(SpellId::CallOfDead),
            &mut rng,
            &b,
        )
        .unwrap();
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, CombatEvent::HordeConversionFailed { .. })));
        assert!(p.summon.is_none());
        // skeleton atk 7 - mage def 2 = 5
        assert_eq!(p.character.hp, hp_before - 5);
        // the slot is still gone
        assert_eq!(p.spells_cast_this_floor, 2);
    }

    #[test]
    fn siphon_heals_a_quarter_of_its_damage() {
        let b = balance();
        let content = StubContent::new();
        let mut p = mage();
        p.learn_spell(SpellId::Siphon);
        p.character.hp = 10;
        let mut state = fight(&p, MonsterKind::Goblin, &b);
        let mut rng = ScriptedRng::new(vec![NO, 0, 2, NO]);
        let report = step(
            &mut state,
            &mut p,
            &content,
            CombatAction::CastSpell(SpellId::Siphon),
            &mut rng,
            &b,
        )
        .unwrap();
        let (damage, healed) = report
            .events
            .iter()
            .find_map(|e| match e {
                CombatEvent::SpellDrain { damage, healed, .. } => Some((*damage, *healed)),
                _ => None,
            })
            .expect("drain event");
        assert_eq!(healed, ((damage as f64 * 0.25) as i32).max(1));
    }
}
