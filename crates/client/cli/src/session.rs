//! The descent loop: encounters, camp actions and floor transitions.

use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use crawl_content::StaticContent;
use crawl_core::combat::{CombatOutcome, CombatState, VictoryRewards};
use crawl_core::config::BalanceConfig;
use crawl_core::content::ContentOracle;
use crawl_core::magic::{cast_explore_spell, on_floor_transition, ExploreOutcome, SpellKind};
use crawl_core::monster::{scale_monster, EncounterKind};
use crawl_core::player::{ClassKind, Player, UpgradeOutcome};
use crawl_core::rng::PcgRng;
use crawl_core::view::run_encounter;

use crate::console::{read_line, Console};

const FIGHTS_PER_FLOOR: u32 = 3;
const BOSS_EVERY: u32 = 5;
const UPGRADE_COST_BASE: i64 = 30;
const UPGRADE_COST_PER_LEVEL: i64 = 5;
const UPGRADE_BREAK_CHANCE: f64 = 0.04;

pub struct SessionConfig {
    pub seed: u64,
    pub class: ClassKind,
    pub name: String,
}

impl SessionConfig {
    /// Seed from `CRAWL_SEED` (entropy otherwise), class and name from the
    /// command line: `crawl [knight|mage] [name]`.
    pub fn from_env_and_args() -> Self {
        let seed = std::env::var("CRAWL_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| {
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(0)
            });
        let mut args = std::env::args().skip(1);
        let class = match args.next().as_deref() {
            Some("mage") => ClassKind::Mage,
            _ => ClassKind::Knight,
        };
        let name = args.next().unwrap_or_else(|| {
            match class {
                ClassKind::Knight => "Aldric",
                ClassKind::Mage => "Maelis",
            }
            .to_string()
        });
        Self { seed, class, name }
    }
}

pub fn run(config: SessionConfig) -> Result<ExitCode> {
    tracing::info!(seed = config.seed, class = ?config.class, "starting descent");
    let balance = BalanceConfig::default();
    let content = StaticContent::new();
    let mut rng = PcgRng::new(config.seed);
    let mut player = Player::new(config.name.clone(), config.class);
    let mut view = Console::new();
    let mut input = Console::new();

    println!("{} the {:?} enters the dungeon.", config.name, config.class);

    for depth in 1u32.. {
        println!();
        println!("=== floor {depth} ===");
        for fight in 0..FIGHTS_PER_FLOOR {
            if fight > 0 && camp(&mut player, &content, &mut rng, &balance) == CampOutcome::Quit {
                println!("you climb back to the surface with {} gold.", player.gold);
                return Ok(ExitCode::SUCCESS);
            }
            let encounter = if depth % BOSS_EVERY == 0 && fight == FIGHTS_PER_FLOOR - 1 {
                EncounterKind::Boss
            } else {
                EncounterKind::Normal
            };
            let kind = content.roll_monster(depth, &mut rng);
            let def = content.monster_def(kind);
            let monster = scale_monster(def, &player, depth, encounter, &balance);
            if encounter == EncounterKind::Boss {
                println!("a boss blocks the stairs: {}!", monster.character.name);
            } else {
                println!("a {} appears!", monster.character.name);
            }
            let mut state = CombatState::new(&player, monster, depth, &balance);
            let outcome = run_encounter(
                &mut state,
                &mut player,
                &content,
                &mut input,
                &mut view,
                &mut rng,
                &balance,
            );
            match outcome {
                CombatOutcome::Victory(rewards) => print_rewards(&rewards),
                CombatOutcome::Fled => println!("the {} keeps its floor.", state.monster.character.name),
                CombatOutcome::Dead => {
                    println!();
                    println!(
                        "{} dies on floor {depth} with {} gold and level {}.",
                        player.character.name, player.gold, player.level
                    );
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        on_floor_transition(&mut player, &content, &balance);
        println!("you descend the stairs.");
    }
    unreachable!("the descent loop only exits by return")
}

#[derive(PartialEq)]
enum CampOutcome {
    Continue,
    Quit,
}

/// Between-fight actions: items, exploration spells, gear.
fn camp(
    player: &mut Player,
    content: &StaticContent,
    rng: &mut PcgRng,
    balance: &BalanceConfig,
) -> CampOutcome {
    loop {
        let prompt = format!(
            "[{} {}/{} hp, {} gold] [c]ontinue  [i]tem  [s]pell  [e]quip  [u]pgrade  [q]uit > ",
            player.character.name, player.character.hp, player.character.max_hp, player.gold
        );
        match read_line(&prompt).as_str() {
            "c" | "" => return CampOutcome::Continue,
            "q" => return CampOutcome::Quit,
            "i" => use_consumable(player, balance),
            "s" => cast_spell(player, content, balance),
            "e" => equip_from_inventory(player),
            "u" => upgrade_gear(player, rng),
            _ => println!("  unknown command."),
        }
    }
}

fn use_consumable(player: &mut Player, balance: &BalanceConfig) {
    if player.consumables.is_empty() {
        println!("  the satchel is empty.");
        return;
    }
    for (idx, stack) in player.consumables.iter().enumerate() {
        println!("  {}. {} x{}", idx + 1, stack.item.name, stack.qty);
    }
    let picked = read_line("item number > ");
    let Ok(n) = picked.parse::<usize>() else {
        println!("  no such item.");
        return;
    };
    if n == 0 || n > player.consumables.len() {
        println!("  no such item.");
        return;
    }
    match player.use_consumable(n - 1, false, balance) {
        Ok(result) => println!("  {}", crate::console::describe_use(&result)),
        Err(err) => println!("  cannot use that: {err}"),
    }
}

fn cast_spell(player: &mut Player, content: &StaticContent, balance: &BalanceConfig) {
    let explore: Vec<_> = player
        .spell_scrolls
        .iter()
        .copied()
        .filter(|id| id.kind() == SpellKind::Explore)
        .collect();
    if explore.is_empty() {
        println!("  no exploration spells known.");
        return;
    }
    for (idx, id) in explore.iter().enumerate() {
        println!("  {}. {id}", idx + 1);
    }
    let picked = read_line("spell number > ");
    let Ok(n) = picked.parse::<usize>() else {
        println!("  no such spell.");
        return;
    };
    if n == 0 || n > explore.len() {
        println!("  no such spell.");
        return;
    }
    match cast_explore_spell(player, content, explore[n - 1], balance) {
        Ok(outcome) => match outcome {
            ExploreOutcome::Summoned { name, hp } => println!("  {name} rises ({hp} hp)"),
            ExploreOutcome::Healed(hp) => println!("  restored {hp} hp"),
            ExploreOutcome::GoldGained(gold) => println!("  transmuted {gold} gold"),
            ExploreOutcome::EffectActivated { spell, floors } => {
                println!("  {spell} active for {floors} floors")
            }
            ExploreOutcome::Teleported { cooldown } => {
                println!("  the floor folds around you ({cooldown} floors to recharge)")
            }
        },
        Err(err) => println!("  the spell refuses: {err}"),
    }
}

fn equip_from_inventory(player: &mut Player) {
    if player.inventory.is_empty() {
        println!("  the pack is empty.");
        return;
    }
    for (idx, item) in player.inventory.iter().enumerate() {
        println!(
            "  {}. {} ({:?} {:?}) +{}hp +{}atk +{}def",
            idx + 1,
            item.name,
            item.rarity,
            item.slot,
            item.hp_bonus,
            item.atk_bonus,
            item.def_bonus
        );
    }
    let picked = read_line("item number > ");
    let Ok(n) = picked.parse::<usize>() else {
        println!("  no such item.");
        return;
    };
    if n == 0 || n > player.inventory.len() {
        println!("  no such item.");
        return;
    }
    let item = player.inventory.remove(n - 1);
    let name = item.name.clone();
    if let Some(old) = player.equip(item) {
        println!("  {name} equipped, {} stowed.", old.name);
        player.inventory.push(old);
    } else {
        println!("  {name} equipped.");
    }
}

fn upgrade_gear(player: &mut Player, rng: &mut PcgRng) {
    use crawl_core::items::ItemSlot;
    let cost = UPGRADE_COST_BASE + player.level as i64 * UPGRADE_COST_PER_LEVEL;
    println!(
        "  forging costs {cost} gold with a {:.0}% chance to break the item.",
        UPGRADE_BREAK_CHANCE * 100.0
    );
    let slot = match read_line("[w]eapon  [a]rmor  [t]rinket > ").as_str() {
        "w" => ItemSlot::Weapon,
        "a" => ItemSlot::Armor,
        "t" => ItemSlot::Accessory,
        _ => {
            println!("  no such slot.");
            return;
        }
    };
    match player.upgrade_equipped(slot, cost, UPGRADE_BREAK_CHANCE, rng) {
        Ok(UpgradeOutcome::Upgraded { name }) => println!("  the forge yields {name}."),
        Ok(UpgradeOutcome::Broke { name }) => println!("  {name} shatters on the anvil."),
        Err(err) => println!("  the forge refuses: {err}"),
    }
}

fn print_rewards(rewards: &VictoryRewards) {
    println!("  +{} xp, +{} gold", rewards.xp, rewards.gold);
    if rewards.levels_gained > 0 {
        println!("  you grow stronger (+{} levels)", rewards.levels_gained);
    }
    if let Some(item) = &rewards.item {
        if rewards.item_kept {
            println!("  loot: {} ({:?})", item.name, item.rarity);
        } else {
            println!("  {} slips away, your pack is full", item.name);
        }
    }
    if let Some(consumable) = &rewards.consumable {
        if rewards.consumable_kept {
            println!("  loot: {}", consumable.name);
        } else {
            println!("  {} is left behind, no room", consumable.name);
        }
    }
    if let Some(scroll) = rewards.scroll {
        println!("  a scroll of {scroll} joins your grimoire");
    }
    if rewards.boss_key {
        println!("  the boss drops its key");
    }
    if rewards.normal_key {
        println!("  a small key glints in the remains");
    }
}
