//! The built-in opcode tables.
//!
//! Each pack parses the commands it knows into a typed action, then performs
//! it against the battle. Commands a pack does not recognise go further down
//! the [`PackChain`](crate::interpreter::PackChain).

mod base;
mod camera;
mod cooldown;
mod effects;
mod motion;

pub use base::*;
pub use camera::*;
pub use cooldown::*;
pub use effects::*;
pub use motion::*;

use crate::{
    battle::{Battle, BattlerId},
    host::{Audio, Stage, StageRequest},
    interpreter::ActionContext,
    target,
};

/// Resolves a target argument against the current roster.
fn targets<S: Stage, A: Audio>(
    battle: &Battle<S, A>,
    context: &ActionContext,
    spec: Option<&str>,
) -> Vec<BattlerId> {
    target::resolve(spec, context, &battle.roster)
}

/// Writes a result line about `target` to the battle log.
fn show_result<S: Stage, A: Audio>(battle: &mut Battle<S, A>, target: BattlerId, message: String) {
    battle
        .stage
        .request(StageRequest::DisplayResults { target, message });
}

/// The display name of a battler, falling back to its slot.
fn name_of<S: Stage, A: Audio>(battle: &Battle<S, A>, battler: BattlerId) -> String {
    battle
        .roster
        .get(battler)
        .map(|b| b.name.clone())
        .unwrap_or_else(|| battler.to_string())
}
