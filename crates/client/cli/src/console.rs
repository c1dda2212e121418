//! Stdin/stdout implementations of the engine's presentation seams.

use std::io::{self, BufRead, Write};

use crawl_core::combat::{CombatAction, CombatActionError, CombatEvent, CombatOutcome, CombatState};
use crawl_core::player::{ConsumableUse, Player};
use crawl_core::view::{ActionSource, CombatView};

/// Line-based prompt and render loop over the standard streams.
pub struct Console;

impl Console {
    pub fn new() -> Self {
        Self
    }
}

pub fn read_line(prompt: &str) -> String {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return String::new();
    }
    line.trim().to_string()
}

impl CombatView for Console {
    fn turn_start(&mut self, state: &CombatState, player: &Player) {
        let m = &state.monster.character;
        let p = &player.character;
        println!();
        println!(
            "-- turn {} -- {} {}/{} hp  vs  {} {}/{} hp",
            state.turn + 1,
            p.name,
            p.hp,
            p.max_hp,
            m.name,
            m.hp,
            m.max_hp
        );
    }

    fn events(&mut self, events: &[CombatEvent]) {
        for event in events {
            println!("  {}", describe(event));
        }
    }

    fn refused(&mut self, err: &CombatActionError) {
        println!("  cannot do that: {err}");
    }

    fn finished(&mut self, outcome: &CombatOutcome) {
        match outcome {
            CombatOutcome::Victory(_) => println!("  the enemy falls."),
            CombatOutcome::Fled => println!("  you slip away."),
            CombatOutcome::Dead => println!("  you collapse."),
        }
    }
}

impl ActionSource for Console {
    fn next_action(&mut self, _state: &CombatState, player: &Player) -> CombatAction {
        loop {
            let choice = read_line("[a]ttack  [s]pecial  [c]ast  [i]tem  [f]lee > ");
            match choice.as_str() {
                "a" | "" => return CombatAction::Attack,
                "s" => return CombatAction::Special,
                "f" => return CombatAction::Flee,
                "c" => {
                    if player.spell_scrolls.is_empty() {
                        println!("  no spells known.");
                        continue;
                    }
                    for (idx, id) in player.spell_scrolls.iter().enumerate() {
                        println!("  {}. {id}", idx + 1);
                    }
                    let picked = read_line("spell number > ");
                    match picked.parse::<usize>() {
                        Ok(n) if (1..=player.spell_scrolls.len()).contains(&n) => {
                            return CombatAction::CastSpell(player.spell_scrolls[n - 1]);
                        }
                        _ => println!("  no such spell."),
                    }
                }
                "i" => {
                    if player.consumables.is_empty() {
                        println!("  the satchel is empty.");
                        continue;
                    }
                    for (idx, stack) in player.consumables.iter().enumerate() {
                        println!("  {}. {} x{}", idx + 1, stack.item.name, stack.qty);
                    }
                    let picked = read_line("item number > ");
                    match picked.parse::<usize>() {
                        Ok(n) if (1..=player.consumables.len()).contains(&n) => {
                            return CombatAction::UseConsumable(n - 1);
                        }
                        _ => println!("  no such item."),
                    }
                }
                _ => println!("  unknown command."),
            }
        }
    }
}

fn describe(event: &CombatEvent) -> String {
    match event {
        CombatEvent::PlayerAttack { damage, crit } => {
            format!("you hit for {damage}{}", crit_tag(*crit))
        }
        CombatEvent::SpecialAttack { cost, damage } => {
            format!("you burn {cost} hp and burst for {damage}")
        }
        CombatEvent::SpellDamage { spell, damage, crit } => {
            format!("{spell} strikes for {damage}{}", crit_tag(*crit))
        }
        CombatEvent::SpellHeal { spell, healed } => format!("{spell} restores {healed} hp"),
        CombatEvent::SpellDrain {
            spell,
            damage,
            healed,
            crit,
        } => format!("{spell} drains {damage}{} and restores {healed} hp", crit_tag(*crit)),
        CombatEvent::EnemyWeakened { amount, turns } => {
            format!("enemy attack weakened by {amount} for {turns} turns")
        }
        CombatEvent::EnemyDefShredded { amount, turns } => {
            format!("enemy defense shredded by {amount} for {turns} turns")
        }
        CombatEvent::SummonCalled { name } => format!("{name} answers the call"),
        CombatEvent::HordeConverted { chance, members } => format!(
            "the skeleton joins your horde ({members} strong, {:.0}% chance)",
            chance * 100.0
        ),
        CombatEvent::HordeConversionFailed { chance } => {
            format!("the conversion fizzles ({:.0}% chance)", chance * 100.0)
        }
        CombatEvent::SummonStrike { damage, crit } => {
            format!("your summon hits for {damage}{}", crit_tag(*crit))
        }
        CombatEvent::PoisonTick { damage } => format!("poison gnaws for {damage}"),
        CombatEvent::MonsterHit { damage, crit } => {
            format!("the enemy hits you for {damage}{}", crit_tag(*crit))
        }
        CombatEvent::Dodged => "you dodge the blow".to_string(),
        CombatEvent::SummonIntercept { absorbed, taken } => {
            format!("your summon absorbs {absorbed}, you take {taken}")
        }
        CombatEvent::SummonDestroyed { name } => format!("{name} is destroyed"),
        CombatEvent::ThornsReflect { damage } => format!("thorns reflect {damage}"),
        CombatEvent::Regenerated { amount } => format!("you regenerate {amount} hp"),
        CombatEvent::ConsumableUsed { name, result } => {
            format!("you use {name}: {}", describe_use(result))
        }
        CombatEvent::FleeFailed => "you fail to escape".to_string(),
    }
}

pub fn describe_use(result: &ConsumableUse) -> String {
    match result {
        ConsumableUse::Healed(hp) => format!("{hp} hp restored"),
        ConsumableUse::Buffed { atk, turns } => format!("+{atk} atk for {turns} turns"),
        ConsumableUse::FragmentGranted { key } => format!("{key:?} fragment buff armed"),
        ConsumableUse::SummonHealed(hp) => format!("summon restored {hp} hp"),
        ConsumableUse::Fled => "the stone pulls you out".to_string(),
    }
}

fn crit_tag(crit: bool) -> &'static str {
    if crit {
        " (critical)"
    } else {
        ""
    }
}
