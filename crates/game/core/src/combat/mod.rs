//! Turn-based combat as an explicit state machine.
//!
//! A fight is a [`CombatState`] advanced by [`step`] with one
//! [`CombatAction`] per turn. The function owns the whole turn pipeline:
//! player action, poison tick, monster riposte, buff decay, regeneration
//! and outcome resolution. Rendering and input live entirely outside the
//! engine (see [`crate::view`]).
//!
//! Refused actions return a [`CombatActionError`] and mutate nothing, so
//! a driver can simply re-prompt.

pub mod damage;
mod spells;

use crate::config::BalanceConfig;
use crate::content::ContentOracle;
use crate::items::{Consumable, Item};
use crate::magic::{CastError, SpellId};
use crate::monster::{EncounterKind, ScaledMonster};
use crate::player::{ClassKind, ConsumableError, ConsumableUse, Player};
use crate::rng::RngSource;
use crate::stats::SpecialKind;

pub use damage::{compute_damage, AttackMods};

/// One player decision per combat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombatAction {
    Attack,
    /// Hp-fueled burst attack.
    Special,
    CastSpell(SpellId),
    /// Index into the player's consumable stacks.
    UseConsumable(usize),
    Flee,
}

/// Refused actions. The fight state and the player are untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CombatActionError {
    #[error("the fight is already over")]
    FightOver,
    #[error("not enough hp for the special attack (costs {cost})")]
    NotEnoughHp { cost: i32 },
    #[error(transparent)]
    Cast(#[from] CastError),
    #[error(transparent)]
    Consumable(#[from] ConsumableError),
}

/// Everything notable that happened during one turn, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum CombatEvent {
    PlayerAttack { damage: i32, crit: bool },
    SpecialAttack { cost: i32, damage: i32 },
    SpellDamage { spell: SpellId, damage: i32, crit: bool },
    SpellHeal { spell: SpellId, healed: i32 },
    SpellDrain { spell: SpellId, damage: i32, healed: i32, crit: bool },
    EnemyWeakened { amount: i32, turns: u8 },
    EnemyDefShredded { amount: i32, turns: u8 },
    SummonCalled { name: String },
    HordeConverted { chance: f64, members: u32 },
    HordeConversionFailed { chance: f64 },
    SummonStrike { damage: i32, crit: bool },
    PoisonTick { damage: i32 },
    MonsterHit { damage: i32, crit: bool },
    Dodged,
    SummonIntercept { absorbed: i32, taken: i32 },
    SummonDestroyed { name: String },
    ThornsReflect { damage: i32 },
    Regenerated { amount: i32 },
    ConsumableUsed { name: String, result: ConsumableUse },
    FleeFailed,
}

/// Post-victory spoils.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VictoryRewards {
    pub xp: i64,
    pub gold: i64,
    pub levels_gained: u32,
    pub item: Option<Item>,
    /// False when the drop rolled but the inventory was full.
    pub item_kept: bool,
    pub consumable: Option<Consumable>,
    pub consumable_kept: bool,
    pub scroll: Option<SpellId>,
    pub boss_key: bool,
    pub normal_key: bool,
}

/// How the fight ended.
#[derive(Clone, Debug, PartialEq)]
pub enum CombatOutcome {
    Victory(VictoryRewards),
    Fled,
    Dead,
}

/// What one call to [`step`] produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnReport {
    pub events: Vec<CombatEvent>,
    pub outcome: Option<CombatOutcome>,
}

/// Live fight state.
///
/// Fragment multipliers are snapshotted at fight start; specials are
/// re-read every turn so equipment swaps mid-fight (through consumable
/// flows) stay honest.
#[derive(Clone, Debug)]
pub struct CombatState {
    pub monster: ScaledMonster,
    pub depth: u32,
    pub turn: u32,
    poison_turns: u8,
    weaken_turns: u8,
    weaken_amount: i32,
    shred_turns: u8,
    shred_amount: i32,
    frag_atk_mult: f64,
    frag_spell_mult: f64,
    frag_def_reduct: f64,
    frag_crit_bonus: f64,
    frag_active: bool,
    over: bool,
}

impl CombatState {
    pub fn new(player: &Player, monster: ScaledMonster, depth: u32, balance: &BalanceConfig) -> Self {
        Self {
            monster,
            depth,
            turn: 0,
            poison_turns: 0,
            weaken_turns: 0,
            weaken_amount: 0,
            shred_turns: 0,
            shred_amount: 0,
            frag_atk_mult: player.fragment_attack_mult(balance),
            frag_spell_mult: player.fragment_spell_mult(balance),
            frag_def_reduct: player.fragment_defense_reduction(balance),
            frag_crit_bonus: player.fragment_crit_flat(balance),
            frag_active: player.fragment_buffs.is_active(),
            over: false,
        }
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub(crate) fn frag_spell_mult(&self) -> f64 {
        self.frag_spell_mult
    }

    pub(crate) fn shred_penetration(&self) -> i32 {
        if self.shred_turns > 0 {
            self.shred_amount
        } else {
            0
        }
    }

    pub(crate) fn apply_weaken(&mut self, amount: i32, turns: u8) {
        self.weaken_turns = self.weaken_turns.max(turns);
        self.weaken_amount = self.weaken_amount.max(amount);
    }

    pub(crate) fn apply_shred(&mut self, amount: i32, turns: u8) {
        self.shred_turns = self.shred_turns.max(turns);
        self.shred_amount = self.shred_amount.max(amount);
    }

    fn finalize(&mut self, player: &mut Player) {
        self.over = true;
        if self.frag_active {
            player.consume_fragment_charge();
        }
    }
}

/// Advances the fight by one player turn.
pub fn step(
    state: &mut CombatState,
    player: &mut Player,
    content: &dyn ContentOracle,
    action: CombatAction,
    rng: &mut dyn RngSource,
    balance: &BalanceConfig,
) -> Result<TurnReport, CombatActionError> {
    if state.over {
        return Err(CombatActionError::FightOver);
    }
    let mut events = Vec::new();
    let specs = player.all_specials(balance);
    let hp_before = player.character.hp;

    let mut strikes = false;
    match action {
        CombatAction::Attack => {
            player_attack(state, player, &specs, rng, &mut events);
            strikes = true;
        }
        CombatAction::Special => {
            special_attack(state, player, &specs, rng, balance, &mut events)?;
            strikes = true;
        }
        CombatAction::CastSpell(id) => {
            let spell_action =
                spells::resolve_combat_spell(state, player, content, id, rng, balance, &mut events)?;
            strikes = spell_action == spells::SpellAction::Damage;
        }
        CombatAction::UseConsumable(idx) => {
            let stack_name = player
                .consumables
                .get(idx)
                .map(|st| st.item.name.clone())
                .ok_or(ConsumableError::NoSuchStack)?;
            let result = player.use_consumable(idx, true, balance)?;
            events.push(CombatEvent::ConsumableUsed {
                name: stack_name,
                result,
            });
            if result == ConsumableUse::Fled {
                state.finalize(player);
                return Ok(TurnReport {
                    events,
                    outcome: Some(CombatOutcome::Fled),
                });
            }
        }
        CombatAction::Flee => {
            if rng.chance(0.5) {
                state.finalize(player);
                return Ok(TurnReport {
                    events,
                    outcome: Some(CombatOutcome::Fled),
                });
            }
            events.push(CombatEvent::FleeFailed);
        }
    }
    state.turn += 1;

    if strikes {
        summon_strike(state, player, rng, &mut events);
    }

    // poison ticks after the player's action
    if state.poison_turns > 0 && state.monster.character.is_alive() {
        let dot = (1 + state.depth as i32 / 2).max(1);
        state.monster.character.take_damage(dot);
        state.poison_turns -= 1;
        events.push(CombatEvent::PoisonTick { damage: dot });
    }

    if state.monster.character.is_alive() {
        riposte(state, player, &specs, rng, &mut events);
    }

    tick_effects(state, player);
    let took_damage = player.character.hp < hp_before;
    regenerate(state, player, &specs, took_damage, balance, &mut events);

    let outcome = if !player.character.is_alive() {
        state.finalize(player);
        Some(CombatOutcome::Dead)
    } else if !state.monster.character.is_alive() {
        let rewards = victory(state, player, content, &specs, rng, balance);
        state.finalize(player);
        Some(CombatOutcome::Victory(rewards))
    } else {
        None
    };
    Ok(TurnReport { events, outcome })
}

fn player_attack(
    state: &mut CombatState,
    player: &mut Player,
    specs: &crate::stats::Specials,
    rng: &mut dyn RngSource,
    events: &mut Vec<CombatEvent>,
) {
    let mods = AttackMods {
        bonus_crit: specs.get(SpecialKind::SpellCrit).max(0.0) + state.frag_crit_bonus,
        flat_def_pen: state.shred_penetration(),
    };
    let (roll, crit) = compute_damage(&player.character, &state.monster.character, mods, rng);
    let mut dmg = roll + player.temp_buff.map_or(0, |b| b.atk);
    dmg = ((dmg as f64 * state.frag_atk_mult).round() as i32).max(1);
    if player.character.hp <= player.character.max_hp / 2 {
        let berserk = specs.get(SpecialKind::Berserk);
        if berserk > 0.0 {
            dmg = (dmg as f64 * (1.0 + berserk)) as i32;
        }
    }
    state.monster.character.take_damage(dmg);
    events.push(CombatEvent::PlayerAttack { damage: dmg, crit });

    let lifesteal = specs.get(SpecialKind::Lifesteal);
    if lifesteal > 0.0 {
        player.character.heal((dmg as f64 * lifesteal) as i32);
    }
    if specs.get(SpecialKind::PoisonOnHit) > 0.0 {
        state.poison_turns = state.poison_turns.max(2);
    }
}

fn special_attack(
    state: &mut CombatState,
    player: &mut Player,
    specs: &crate::stats::Specials,
    rng: &mut dyn RngSource,
    balance: &BalanceConfig,
    events: &mut Vec<CombatEvent>,
) -> Result<(), CombatActionError> {
    let base_cost = (player.character.max_hp / 8 + 2).max(1);
    let cost = (base_cost as f64 * specs.mult_or_one(SpecialKind::SpecialCostMult)) as i32;
    if player.character.hp <= cost {
        return Err(CombatActionError::NotEnoughHp { cost });
    }
    let (pouv_coeff, class_mult) = match player.class {
        ClassKind::Mage => (
            balance.magic.mage_special_pouv_coeff,
            balance.magic.mage_special_damage_mult,
        ),
        ClassKind::Knight => (balance.magic.knight_special_pouv_coeff, 1.0),
    };
    let pouv = crate::magic::pouv(player, balance) as f64;
    let dmg_mult = specs.mult_or_one(SpecialKind::SpecialDamageMult)
        * (1.0 + pouv * pouv_coeff)
        * class_mult;

    player.character.take_damage(cost);
    let buffed = player.character.atk + player.temp_buff.map_or(0, |b| b.atk);
    let raw = ((buffed * 2 + rng.range_i32(0, 6)) as f64 * dmg_mult) as i32;
    let burst = ((raw as f64 * state.frag_atk_mult).round() as i32).max(1);
    state.monster.character.take_damage(burst);
    events.push(CombatEvent::SpecialAttack { cost, damage: burst });
    Ok(())
}

fn summon_strike(
    state: &mut CombatState,
    player: &Player,
    rng: &mut dyn RngSource,
    events: &mut Vec<CombatEvent>,
) {
    let Some(summon) = player.summon.as_ref() else {
        return;
    };
    if !state.monster.character.is_alive() || !summon.can_attack || summon.character.atk <= 0 {
        return;
    }
    let mods = AttackMods {
        bonus_crit: 0.0,
        flat_def_pen: state.shred_penetration(),
    };
    let (dmg, crit) = compute_damage(&summon.character, &state.monster.character, mods, rng);
    if dmg > 0 {
        state.monster.character.take_damage(dmg);
        events.push(CombatEvent::SummonStrike { damage: dmg, crit });
    }
}

fn riposte(
    state: &mut CombatState,
    player: &mut Player,
    specs: &crate::stats::Specials,
    rng: &mut dyn RngSource,
    events: &mut Vec<CombatEvent>,
) {
    let (roll, crit) =
        compute_damage(&state.monster.character, &player.character, AttackMods::default(), rng);
    let mut dmg = roll;
    if state.weaken_turns > 0 {
        dmg = (dmg - state.weaken_amount).max(0);
    }
    dmg = (dmg - specs.get(SpecialKind::SpellDefense) as i32).max(0);
    if state.frag_def_reduct > 0.0 {
        dmg = ((dmg as f64 * (1.0 - state.frag_def_reduct)).round() as i32).max(0);
    }
    if rng.chance(specs.get(SpecialKind::Dodge)) {
        events.push(CombatEvent::Dodged);
        return;
    }
    if dmg > 0 {
        if let Some(summon) = player.summon.as_mut() {
            let guard = summon.guard_ratio.clamp(0.0, 1.0);
            let absorb_raw = ((dmg as f64 * guard).ceil() as i32).max(1);
            let player_part = (dmg - absorb_raw).max(0);
            let absorb_real = (absorb_raw - summon.character.defense_value()).max(0);
            summon.character.take_damage(absorb_real);
            events.push(CombatEvent::SummonIntercept {
                absorbed: absorb_raw,
                taken: absorb_real,
            });
            if !summon.character.is_alive() {
                let name = summon.character.name.clone();
                player.summon = None;
                events.push(CombatEvent::SummonDestroyed { name });
            }
            dmg = player_part;
        }
    }
    player.character.take_damage(dmg);
    events.push(CombatEvent::MonsterHit { damage: dmg, crit });
    let thorns = specs.get(SpecialKind::Thorns) as i32;
    if thorns > 0 && dmg > 0 {
        state.monster.character.take_damage(thorns);
        events.push(CombatEvent::ThornsReflect { damage: thorns });
    }
}

fn tick_effects(state: &mut CombatState, player: &mut Player) {
    if let Some(buff) = player.temp_buff.as_mut() {
        if buff.turns > 0 {
            buff.turns -= 1;
        }
        if buff.turns == 0 {
            player.temp_buff = None;
        }
    }
    if state.weaken_turns > 0 {
        state.weaken_turns -= 1;
        if state.weaken_turns == 0 {
            state.weaken_amount = 0;
        }
    }
    if state.shred_turns > 0 {
        state.shred_turns -= 1;
        if state.shred_turns == 0 {
            state.shred_amount = 0;
        }
    }
}

fn regenerate(
    state: &CombatState,
    player: &mut Player,
    specs: &crate::stats::Specials,
    took_damage: bool,
    balance: &BalanceConfig,
    events: &mut Vec<CombatEvent>,
) {
    let raw = specs.get(SpecialKind::Regen) as i32;
    if raw <= 0 || !player.character.is_alive() {
        return;
    }
    let r = &balance.regen;
    if state.turn % r.every_n_turns.max(1) != 0 {
        return;
    }
    let frac_cap = (player.character.max_hp as f64 * r.cap_frac) as i32;
    let cap = r.cap_flat.min(frac_cap).max(1);
    let mut amount = raw.min(cap);
    if took_damage {
        amount = (amount as f64 * r.on_hit_mult) as i32;
    }
    if amount > 0 {
        let healed = player.character.heal(amount);
        if healed > 0 {
            events.push(CombatEvent::Regenerated { amount: healed });
        }
    }
}

fn item_drop_chance(depth: u32) -> f64 {
    match depth {
        0..=2 => 0.18,
        3..=5 => 0.23,
        6..=9 => 0.28,
        10..=14 => 0.34,
        _ => 0.40,
    }
}

fn consumable_drop_chance(depth: u32) -> f64 {
    match depth {
        0..=5 => 0.28,
        6..=11 => 0.30,
        _ => 0.34,
    }
}

fn victory(
    state: &CombatState,
    player: &mut Player,
    content: &dyn ContentOracle,
    specs: &crate::stats::Specials,
    rng: &mut dyn RngSource,
    balance: &BalanceConfig,
) -> VictoryRewards {
    let r = &balance.rewards;
    let monster_max_hp = state.monster.character.max_hp as i64;
    let xp = ((state.monster.xp + monster_max_hp / 4) as f64 * r.combat_xp_mult) as i64;
    let gold_variance = rng.range_i32(0, ((monster_max_hp / 6).max(1)) as i32) as i64;
    let mut gold = ((state.monster.gold + gold_variance) as f64 * r.combat_gold_mult) as i64;
    let greed = specs.get(SpecialKind::Greed).max(0.0);
    if greed > 0.0 {
        gold = (gold as f64 * (1.0 + greed)) as i64;
    }
    let levels_gained = player.gain_xp(xp, balance);
    player.gold += gold;

    let mut rewards = VictoryRewards {
        xp,
        gold,
        levels_gained,
        ..Default::default()
    };

    if rng.chance(item_drop_chance(state.depth)) {
        let item = content.roll_item(state.depth, rng);
        rewards.item_kept = player.add_item(item.clone()).is_ok();
        rewards.item = Some(item);
    }
    if rng.chance(consumable_drop_chance(state.depth)) {
        let consumable = content.roll_consumable(state.depth, rng);
        rewards.consumable_kept = player.add_consumable(consumable.clone()).is_ok();
        rewards.consumable = Some(consumable);
    }

    let mut scroll_chance =
        r.spell_drop_base_chance + state.depth as f64 * r.spell_drop_depth_bonus;
    let mut scroll_cap = r.spell_drop_cap;
    if player.class == ClassKind::Mage {
        scroll_chance *= r.mage_spell_drop_mult;
        scroll_cap = r.mage_spell_drop_cap;
    }
    if rng.chance(scroll_chance.min(scroll_cap)) {
        if let Some(id) = content.roll_spell_scroll(state.depth, &player.spell_scrolls, rng) {
            player.learn_spell(id);
            rewards.scroll = Some(id);
        }
    }

    let boss = state.monster.encounter == EncounterKind::Boss;
    let mut key_bonus = 0.0;
    if boss {
        player.boss_keys += 1;
        rewards.boss_key = true;
        key_bonus = r.boss_bonus_key_chance;
    }
    let key_chance =
        r.normal_key_drop_chance + key_bonus + (state.depth as f64 * 0.002).min(0.03);
    if rng.chance(key_chance) {
        player.normal_keys += 1;
        rewards.normal_key = true;
    }
    tracing::debug!(
        xp = rewards.xp,
        gold = rewards.gold,
        boss,
        "fight won"
    );
    rewards
}
