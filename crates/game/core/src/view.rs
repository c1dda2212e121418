//! Presentation seams for the combat loop.
//!
//! The engine never blocks on input or writes to a terminal. Frontends
//! implement [`CombatView`] (one-way event reporting) and [`ActionSource`]
//! (turn decisions) and hand both to [`run_encounter`], which owns the
//! prompt/step/report cycle until the fight resolves.

use crate::combat::{
    step, CombatAction, CombatActionError, CombatEvent, CombatOutcome, CombatState,
};
use crate::config::BalanceConfig;
use crate::content::ContentOracle;
use crate::player::Player;
use crate::rng::RngSource;

/// Receives everything worth showing during a fight.
///
/// Implementations must not mutate game state; they only observe.
pub trait CombatView {
    /// Called before each prompt with the current standings.
    fn turn_start(&mut self, state: &CombatState, player: &Player);

    /// The ordered events of one resolved turn.
    fn events(&mut self, events: &[CombatEvent]);

    /// An action was refused. The fight state is unchanged and the
    /// driver will prompt again.
    fn refused(&mut self, err: &CombatActionError);

    /// The fight is over.
    fn finished(&mut self, outcome: &CombatOutcome);
}

/// Supplies one [`CombatAction`] per prompt.
pub trait ActionSource {
    fn next_action(&mut self, state: &CombatState, player: &Player) -> CombatAction;
}

/// Drives a fight to completion.
///
/// Loops prompt, step, report until [`step`] yields an outcome. Refused
/// actions are reported through [`CombatView::refused`] and the same turn
/// is prompted again, so a source that can only ever produce illegal
/// actions will loop forever; interactive frontends satisfy this trivially.
pub fn run_encounter(
    state: &mut CombatState,
    player: &mut Player,
    content: &dyn ContentOracle,
    source: &mut dyn ActionSource,
    view: &mut dyn CombatView,
    rng: &mut dyn RngSource,
    balance: &BalanceConfig,
) -> CombatOutcome {
    loop {
        view.turn_start(state, player);
        let action = source.next_action(state, player);
        match step(state, player, content, action, rng, balance) {
            Ok(report) => {
                view.events(&report.events);
                if let Some(outcome) = report.outcome {
                    tracing::debug!(turn = state.turn, ?outcome, "encounter resolved");
                    view.finished(&outcome);
                    return outcome;
                }
            }
            Err(err) => {
                tracing::debug!(%err, "combat action refused");
                view.refused(&err);
            }
        }
    }
}
